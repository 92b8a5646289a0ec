//! Answer-Table Aligner.
//!
//! The question paper and its answer table are segmented by two
//! independent, heuristic extractors, so their structures can disagree: a
//! marker missed on one side, an extra row on the other. Exact pairing is
//! the common case and must stay cheap; disagreement must degrade
//! gracefully instead of cascading wrong assignments.
//!
//! Two strategies:
//!
//! - **Strict** pairs the flattened leaf sequence positionally with the
//!   row sequence and verifies every pair's decoded key against the leaf's
//!   path before writing anything. Any disagreement abandons the strategy
//!   wholesale — a positional pairing that is wrong once is wrong for
//!   every row after it.
//! - **Tolerant** sorts node paths and decoded rows independently and
//!   merges them with two pointers, skipping (and logging) whichever side
//!   runs ahead. This is the minimal algorithm that tolerates missing
//!   entries on both sides without quadratic re-matching.
//!
//! Per-row problems are diagnostics, never errors; a batch of documents
//! must survive one bad table.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::paper::ast::{AnswerKey, Paper};
use crate::paper::diagnostics::Diagnostic;
use crate::paper::source::ImageRef;

/// One row of the externally extracted answer table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerRow {
    /// Composite key, e.g. `"4(b)(ii)"`.
    pub key: String,
    /// Free-text answer.
    pub value: String,
    /// Mark weight; extractors emit 0 when the table's marks cell is
    /// empty.
    #[serde(default)]
    pub weight: u32,
    /// Optional image handle extracted alongside the row.
    #[serde(default)]
    pub image: Option<ImageRef>,
}

impl AnswerRow {
    pub fn new(key: impl Into<String>, value: impl Into<String>, weight: u32) -> Self {
        AnswerRow {
            key: key.into(),
            value: value.into(),
            weight,
            image: None,
        }
    }
}

/// Which strategy chain to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StrategyChoice {
    /// Try strict positional pairing, fall back to the tolerant merge.
    StrictFirst,
    /// Skip the strict attempt entirely (known-unreliable sources).
    TolerantOnly,
}

impl Default for StrategyChoice {
    fn default() -> Self {
        StrategyChoice::StrictFirst
    }
}

/// Assign every row to the node its key decodes to.
///
/// Returns the diagnostics gathered along the way; the tree is annotated
/// in place. Zero successful assignments (with any rows present) is an
/// [`Diagnostic::AlignmentFailure`] on the document — the caller still
/// gets the unannotated tree.
pub fn align(paper: &mut Paper, rows: &[AnswerRow], strategy: StrategyChoice) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();

    // Decode once up front; undecodable keys never participate.
    let mut decoded: Vec<(AnswerKey, &AnswerRow)> = Vec::new();
    for row in rows {
        match AnswerKey::parse(&row.key) {
            Ok(key) => decoded.push((key, row)),
            Err(err) => {
                warn!(key = %row.key, "skipping answer row: {}", err);
                diagnostics.push(Diagnostic::KeyDecodeFailed {
                    key: row.key.clone(),
                });
            }
        }
    }

    if decoded.is_empty() {
        if !rows.is_empty() {
            diagnostics.push(Diagnostic::AlignmentFailure);
        }
        return diagnostics;
    }

    let assignments = match strategy {
        StrategyChoice::StrictFirst => match align_strict(paper, &decoded) {
            Some(count) => count,
            None => {
                debug!("strict alignment failed, falling back to tolerant merge");
                align_tolerant(paper, &decoded, &mut diagnostics)
            }
        },
        StrategyChoice::TolerantOnly => align_tolerant(paper, &decoded, &mut diagnostics),
    };

    if assignments == 0 {
        warn!("alignment produced no assignments");
        diagnostics.push(Diagnostic::AlignmentFailure);
    }
    diagnostics
}

/// Positional pairing of rows against the flattened leaf sequence.
///
/// Returns `None` — without having written anything — unless the counts
/// match and every pair's decoded key equals the leaf's path.
fn align_strict(paper: &mut Paper, decoded: &[(AnswerKey, &AnswerRow)]) -> Option<usize> {
    let leaves = paper.leaf_keys();
    if leaves.len() != decoded.len() {
        return None;
    }
    let agrees = leaves
        .iter()
        .zip(decoded)
        .all(|(leaf, (key, _))| leaf == key);
    if !agrees {
        return None;
    }

    for (key, row) in decoded {
        // The leaf sequence came from the tree, so resolution cannot miss.
        if let Some(mut node) = paper.node_mut(key) {
            node.assign(&row.value, row.weight, row.image.as_ref());
        }
    }
    Some(decoded.len())
}

/// Sorted two-pointer merge over all node paths and decoded rows.
fn align_tolerant(
    paper: &mut Paper,
    decoded: &[(AnswerKey, &AnswerRow)],
    diagnostics: &mut Vec<Diagnostic>,
) -> usize {
    let mut node_keys = paper.all_keys();
    node_keys.sort();
    let leaves = paper.leaf_keys();
    let mut rows: Vec<&(AnswerKey, &AnswerRow)> = decoded.iter().collect();
    rows.sort_by_key(|(key, _)| *key);

    let mut assignments = 0usize;
    let mut node_index = 0usize;
    let mut row_index = 0usize;

    while node_index < node_keys.len() && row_index < rows.len() {
        let node_key = node_keys[node_index];
        let (row_key, row) = rows[row_index];

        if node_key == *row_key {
            if let Some(mut node) = paper.node_mut(&node_key) {
                node.assign(&row.value, row.weight, row.image.as_ref());
                assignments += 1;
            }
            node_index += 1;
            row_index += 1;
        } else if node_key < *row_key {
            // Interior nodes routinely have no row of their own; only
            // leaves left dry are worth surfacing.
            if leaves.contains(&node_key) {
                warn!(path = %node_key, "question node has no answer in the table");
                diagnostics.push(Diagnostic::UnansweredNode {
                    path: node_key.to_string(),
                });
            }
            node_index += 1;
        } else {
            warn!(key = %row_key, "answer row has no matching question node");
            diagnostics.push(Diagnostic::AssignmentMiss {
                key: row_key.to_string(),
            });
            row_index += 1;
        }
    }

    for (row_key, _) in rows[row_index..].iter() {
        warn!(key = %row_key, "answer row has no matching question node");
        diagnostics.push(Diagnostic::AssignmentMiss {
            key: row_key.to_string(),
        });
    }
    for node_key in node_keys[node_index..].iter() {
        if leaves.contains(node_key) {
            warn!(path = %node_key, "question node has no answer in the table");
            diagnostics.push(Diagnostic::UnansweredNode {
                path: node_key.to_string(),
            });
        }
    }

    assignments
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paper::ast::{Question, SubQuestion, SubSubQuestion};

    fn nested_paper() -> Paper {
        let mut question = Question::new(1, "1 Intro");
        let mut sub_a = SubQuestion::new('a', "(a) lead-in");
        sub_a.subsubquestions.push(SubSubQuestion::new("i", "(i) X"));
        sub_a.subsubquestions.push(SubSubQuestion::new("ii", "(ii) Y"));
        question.subquestions.push(sub_a);
        question.subquestions.push(SubQuestion::new('b', "(b) Z"));
        Paper::Structured(vec![question])
    }

    fn answer(paper: &mut Paper, key: &str) -> Option<String> {
        let key = AnswerKey::parse(key).unwrap();
        paper.node_mut(&key).and_then(|node| node.answer().map(String::from))
    }

    #[test]
    fn strict_assigns_in_leaf_order() {
        let mut paper = nested_paper();
        let rows = vec![
            AnswerRow::new("1(a)(i)", "A", 1),
            AnswerRow::new("1(a)(ii)", "B", 2),
            AnswerRow::new("1(b)", "C", 3),
        ];
        let diagnostics = align(&mut paper, &rows, StrategyChoice::StrictFirst);
        assert!(diagnostics.is_empty());
        assert_eq!(answer(&mut paper, "1(a)(i)").as_deref(), Some("A"));
        assert_eq!(answer(&mut paper, "1(a)(ii)").as_deref(), Some("B"));
        assert_eq!(answer(&mut paper, "1(b)").as_deref(), Some("C"));
    }

    #[test]
    fn strict_mismatch_falls_back_without_partial_writes() {
        let mut paper = nested_paper();
        // Same count, but the second row names a path that disagrees with
        // the leaf sequence: strict must write nothing and the tolerant
        // merge must take over.
        let rows = vec![
            AnswerRow::new("1(a)(i)", "A", 1),
            AnswerRow::new("1(a)(x)", "B", 2),
            AnswerRow::new("1(b)", "C", 3),
        ];
        let diagnostics = align(&mut paper, &rows, StrategyChoice::StrictFirst);
        assert_eq!(answer(&mut paper, "1(a)(i)").as_deref(), Some("A"));
        assert_eq!(answer(&mut paper, "1(a)(ii)"), None);
        assert_eq!(answer(&mut paper, "1(b)").as_deref(), Some("C"));
        assert!(diagnostics
            .iter()
            .any(|d| matches!(d, Diagnostic::AssignmentMiss { key } if key == "1(a)(x)")));
        assert!(diagnostics
            .iter()
            .any(|d| matches!(d, Diagnostic::UnansweredNode { path } if path == "1(a)(ii)")));
    }

    #[test]
    fn tolerant_skips_both_sides_and_reports() {
        let mut questions = Vec::new();
        for number in 1..=3 {
            questions.push(Question::new(number, format!("{} body", number)));
        }
        let mut paper = Paper::Structured(questions);
        let rows = vec![AnswerRow::new("2", "two", 1), AnswerRow::new("4", "four", 1)];
        let diagnostics = align(&mut paper, &rows, StrategyChoice::TolerantOnly);

        assert_eq!(answer(&mut paper, "1"), None);
        assert_eq!(answer(&mut paper, "2").as_deref(), Some("two"));
        assert_eq!(answer(&mut paper, "3"), None);
        assert!(diagnostics
            .iter()
            .any(|d| matches!(d, Diagnostic::AssignmentMiss { key } if key == "4")));
        assert_eq!(
            diagnostics
                .iter()
                .filter(|d| matches!(d, Diagnostic::UnansweredNode { .. }))
                .count(),
            2
        );
        assert!(!diagnostics.contains(&Diagnostic::AlignmentFailure));
    }

    #[test]
    fn bare_question_key_targets_the_interior_node() {
        let mut paper = nested_paper();
        let rows = vec![AnswerRow::new("1", "all of it", 6)];
        align(&mut paper, &rows, StrategyChoice::TolerantOnly);
        assert_eq!(answer(&mut paper, "1").as_deref(), Some("all of it"));
    }

    #[test]
    fn undecodable_keys_are_skipped_with_diagnostics() {
        let mut paper = nested_paper();
        let rows = vec![
            AnswerRow::new("not-a-key", "junk", 0),
            AnswerRow::new("1(b)", "C", 3),
        ];
        let diagnostics = align(&mut paper, &rows, StrategyChoice::TolerantOnly);
        assert!(diagnostics
            .iter()
            .any(|d| matches!(d, Diagnostic::KeyDecodeFailed { key } if key == "not-a-key")));
        assert_eq!(answer(&mut paper, "1(b)").as_deref(), Some("C"));
    }

    #[test]
    fn zero_assignments_surface_alignment_failure() {
        let mut paper = Paper::Structured(vec![Question::new(1, "1 body")]);
        let rows = vec![AnswerRow::new("7", "stray", 1)];
        let diagnostics = align(&mut paper, &rows, StrategyChoice::TolerantOnly);
        assert!(diagnostics.contains(&Diagnostic::AlignmentFailure));
    }

    #[test]
    fn strict_is_idempotent() {
        let mut paper = nested_paper();
        let rows = vec![
            AnswerRow::new("1(a)(i)", "A", 1),
            AnswerRow::new("1(a)(ii)", "B", 2),
            AnswerRow::new("1(b)", "C", 3),
        ];
        align(&mut paper, &rows, StrategyChoice::StrictFirst);
        let snapshot = paper.clone();
        align(&mut paper, &rows, StrategyChoice::StrictFirst);
        assert_eq!(paper, snapshot);
    }

    #[test]
    fn carries_weight_and_image() {
        let mut paper = nested_paper();
        let mut row = AnswerRow::new("1(b)", "C", 3);
        row.image = Some(ImageRef::new("ms/1b.png"));
        align(&mut paper, &[row], StrategyChoice::TolerantOnly);
        match paper.node_mut(&AnswerKey::parse("1(b)").unwrap()).unwrap() {
            crate::paper::ast::NodeMut::SubQuestion(sub) => {
                assert_eq!(sub.marks, 3);
                assert_eq!(sub.answer_image.as_ref().unwrap().0, "ms/1b.png");
            }
            _ => panic!("expected sub-question"),
        }
    }
}
