//! Answer Aggregator.
//!
//! Mark schemes usually record answers at the deepest level only. One
//! bottom-up pass after alignment synthesizes the missing parents: a
//! sub-question's answer becomes its children's answers labeled by
//! numeral, a question's answer its sub-questions' labeled by letter, and
//! marks sum upward (absent marks count 0). A directly assigned answer is
//! never overwritten, which also makes the pass idempotent.

use crate::paper::ast::{Paper, Question, SubQuestion};

/// Run the bottom-up synthesis over the whole paper. Multiple-choice
/// papers have no nesting, so they pass through untouched.
pub fn aggregate(paper: &mut Paper) {
    if let Paper::Structured(questions) = paper {
        for question in questions {
            aggregate_question(question);
        }
    }
}

fn aggregate_question(question: &mut Question) {
    for sub in &mut question.subquestions {
        aggregate_subquestion(sub);
    }
    if question.answer.is_some() || question.subquestions.is_empty() {
        return;
    }
    let lines: Vec<String> = question
        .subquestions
        .iter()
        .filter_map(|sub| {
            sub.answer
                .as_ref()
                .map(|answer| format!("({}) {}", sub.letter, answer))
        })
        .collect();
    if lines.is_empty() {
        return;
    }
    question.answer = Some(lines.join("\n"));
    question.marks = question.subquestions.iter().map(|sub| sub.marks).sum();
}

fn aggregate_subquestion(sub: &mut SubQuestion) {
    if sub.answer.is_some() || sub.subsubquestions.is_empty() {
        return;
    }
    let lines: Vec<String> = sub
        .subsubquestions
        .iter()
        .filter_map(|subsub| {
            subsub
                .answer
                .as_ref()
                .map(|answer| format!("({}) {}", subsub.roman, answer))
        })
        .collect();
    if lines.is_empty() {
        return;
    }
    sub.answer = Some(lines.join("\n"));
    sub.marks = sub.subsubquestions.iter().map(|subsub| subsub.marks).sum();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paper::ast::SubSubQuestion;

    fn assigned(roman: &str, answer: &str, marks: u32) -> SubSubQuestion {
        let mut subsub = SubSubQuestion::new(roman, format!("({}) text", roman));
        subsub.answer = Some(answer.to_string());
        subsub.marks = marks;
        subsub
    }

    fn spec_scenario() -> Question {
        let mut question = Question::new(1, "1 Intro");
        let mut sub_a = SubQuestion::new('a', "(a) lead-in");
        sub_a.subsubquestions.push(assigned("i", "A", 1));
        sub_a.subsubquestions.push(assigned("ii", "B", 2));
        question.subquestions.push(sub_a);
        let mut sub_b = SubQuestion::new('b', "(b) Z");
        sub_b.answer = Some("C".to_string());
        sub_b.marks = 3;
        question.subquestions.push(sub_b);
        question
    }

    #[test]
    fn synthesizes_both_levels() {
        let mut paper = Paper::Structured(vec![spec_scenario()]);
        aggregate(&mut paper);
        let Paper::Structured(questions) = &paper else {
            unreachable!()
        };
        let question = &questions[0];
        assert_eq!(
            question.subquestions[0].answer.as_deref(),
            Some("(i) A\n(ii) B")
        );
        assert_eq!(question.subquestions[0].marks, 3);
        assert_eq!(
            question.answer.as_deref(),
            Some("(a) (i) A\n(ii) B\n(b) C")
        );
        assert_eq!(question.marks, 6);
    }

    #[test]
    fn running_twice_changes_nothing() {
        let mut paper = Paper::Structured(vec![spec_scenario()]);
        aggregate(&mut paper);
        let snapshot = paper.clone();
        aggregate(&mut paper);
        assert_eq!(paper, snapshot);
    }

    #[test]
    fn direct_answers_are_never_overwritten() {
        let mut question = spec_scenario();
        question.answer = Some("examiner's own".to_string());
        question.marks = 9;
        let mut paper = Paper::Structured(vec![question]);
        aggregate(&mut paper);
        let Paper::Structured(questions) = &paper else {
            unreachable!()
        };
        assert_eq!(questions[0].answer.as_deref(), Some("examiner's own"));
        assert_eq!(questions[0].marks, 9);
        // Children still aggregate below the pinned parent.
        assert_eq!(
            questions[0].subquestions[0].answer.as_deref(),
            Some("(i) A\n(ii) B")
        );
    }

    #[test]
    fn partial_children_still_synthesize() {
        let mut sub = SubQuestion::new('a', "(a) lead-in");
        sub.subsubquestions.push(assigned("i", "A", 1));
        sub.subsubquestions.push(SubSubQuestion::new("ii", "(ii) dry"));
        let mut question = Question::new(1, "1 Intro");
        question.subquestions.push(sub);
        let mut paper = Paper::Structured(vec![question]);
        aggregate(&mut paper);
        let Paper::Structured(questions) = &paper else {
            unreachable!()
        };
        // The unanswered child contributes no line but its zero marks.
        assert_eq!(questions[0].subquestions[0].answer.as_deref(), Some("(i) A"));
        assert_eq!(questions[0].subquestions[0].marks, 1);
    }

    #[test]
    fn fully_unanswered_children_leave_the_parent_untouched() {
        let mut question = Question::new(1, "1 Intro");
        question
            .subquestions
            .push(SubQuestion::new('a', "(a) dry"));
        let mut paper = Paper::Structured(vec![question]);
        aggregate(&mut paper);
        let Paper::Structured(questions) = &paper else {
            unreachable!()
        };
        assert_eq!(questions[0].answer, None);
        assert_eq!(questions[0].marks, 0);
    }
}
