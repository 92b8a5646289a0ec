//! Output formats for the annotated tree.
//!
//! JSON is the interchange format consumed by persistence; YAML is the
//! human-edited variant; the outline format is a quick terminal rendering
//! of the hierarchy for eyeballing a segmentation run.

use crate::paper::ast::Paper;

const SEPARATOR_WIDTH: usize = 80;

/// Serialize the tree as pretty-printed JSON.
pub fn to_json(paper: &Paper) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(paper)
}

/// Serialize the tree as YAML.
pub fn to_yaml(paper: &Paper) -> Result<String, serde_yaml::Error> {
    serde_yaml::to_string(paper)
}

/// Render the hierarchy as an indented outline, one dashed separator
/// between questions.
pub fn to_outline(paper: &Paper) -> String {
    let mut output = String::new();
    let separator = "-".repeat(SEPARATOR_WIDTH);

    match paper {
        Paper::Structured(questions) => {
            for question in questions {
                output.push_str(question.text.trim());
                output.push('\n');
                for sub in &question.subquestions {
                    output.push_str(&format!("\n    {}\n", sub.text.trim()));
                    for subsub in &sub.subsubquestions {
                        output.push_str(&format!("\n        {}\n", subsub.text.trim()));
                    }
                }
                output.push_str(&format!("\n{}\n", separator));
            }
        }
        Paper::MultipleChoice(questions) => {
            for question in questions {
                output.push_str(question.text.trim());
                output.push('\n');
                if !question.options.is_empty() {
                    let options: Vec<&str> =
                        question.options.iter().map(|option| option.trim()).collect();
                    output.push_str(&format!("Options: {}\n", options.join(", ")));
                }
                output.push_str(&format!("\n{}\n", separator));
            }
        }
    }

    output.trim().to_string()
}
