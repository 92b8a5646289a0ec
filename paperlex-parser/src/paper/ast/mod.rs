//! The annotated question tree.
//!
//! A closed set of node kinds: the three-level structured hierarchy
//! (question → sub-question → sub-sub-question) and the flat
//! multiple-choice variant. A document produces exactly one of the two
//! forms, captured by [`Paper`]. All dispatch is a match over these types;
//! there is no open inheritance anywhere in the tree.
//!
//! Lifecycle: built once by the tree builder, mutated only by the aligner
//! (which assigns `answer`/`marks`/`answer_image` to exactly the node a
//! key decodes to) and the aggregator (which backfills ancestors), then
//! frozen.

pub mod key;

pub use key::{AnswerKey, KeyDecodeError, RomanNumeral};

use serde::{Deserialize, Serialize};

use crate::paper::source::ImageRef;

/// A top-level structured question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub number: u32,
    pub text: String,
    pub subquestions: Vec<SubQuestion>,
    pub marks: u32,
    pub answer: Option<String>,
    /// Whole-question captures rendered by the builder, one per page the
    /// question's span touches.
    pub images: Vec<ImageRef>,
    /// Image handle carried by the matching answer row, if any.
    pub answer_image: Option<ImageRef>,
}

impl Question {
    pub fn new(number: u32, text: impl Into<String>) -> Self {
        Question {
            number,
            text: text.into(),
            subquestions: Vec::new(),
            marks: 0,
            answer: None,
            images: Vec::new(),
            answer_image: None,
        }
    }

    pub fn key(&self) -> AnswerKey {
        AnswerKey::question(self.number)
    }
}

/// A lettered sub-question, reset to 'a' under each question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubQuestion {
    pub letter: char,
    pub text: String,
    pub subsubquestions: Vec<SubSubQuestion>,
    pub marks: u32,
    pub answer: Option<String>,
    pub answer_image: Option<ImageRef>,
}

impl SubQuestion {
    pub fn new(letter: char, text: impl Into<String>) -> Self {
        SubQuestion {
            letter,
            text: text.into(),
            subsubquestions: Vec::new(),
            marks: 0,
            answer: None,
            answer_image: None,
        }
    }
}

/// A roman-numbered sub-sub-question, reset to 'i' under each
/// sub-question and capped at 'x'.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubSubQuestion {
    pub roman: String,
    pub text: String,
    pub marks: u32,
    pub answer: Option<String>,
    pub answer_image: Option<ImageRef>,
}

impl SubSubQuestion {
    pub fn new(roman: impl Into<String>, text: impl Into<String>) -> Self {
        SubSubQuestion {
            roman: roman.into(),
            text: text.into(),
            marks: 0,
            answer: None,
            answer_image: None,
        }
    }
}

/// A flat multiple-choice question; options are always leaves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultipleChoiceQuestion {
    pub number: u32,
    pub text: String,
    pub options: Vec<String>,
    pub marks: u32,
    pub answer: Option<String>,
    pub images: Vec<ImageRef>,
    pub answer_image: Option<ImageRef>,
}

impl MultipleChoiceQuestion {
    pub fn new(number: u32, text: impl Into<String>) -> Self {
        MultipleChoiceQuestion {
            number,
            text: text.into(),
            options: Vec::new(),
            marks: 0,
            answer: None,
            images: Vec::new(),
            answer_image: None,
        }
    }

    pub fn key(&self) -> AnswerKey {
        AnswerKey::question(self.number)
    }
}

/// One document's question forest: nested or multiple-choice, never both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Paper {
    Structured(Vec<Question>),
    MultipleChoice(Vec<MultipleChoiceQuestion>),
}

impl Paper {
    pub fn question_count(&self) -> usize {
        match self {
            Paper::Structured(questions) => questions.len(),
            Paper::MultipleChoice(questions) => questions.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.question_count() == 0
    }

    /// Keys of every node in document order, parents before children.
    pub fn all_keys(&self) -> Vec<AnswerKey> {
        let mut keys = Vec::new();
        match self {
            Paper::Structured(questions) => {
                for question in questions {
                    keys.push(question.key());
                    for sub in &question.subquestions {
                        let sub_key = question.key().with_letter(sub.letter);
                        keys.push(sub_key);
                        for subsub in &sub.subsubquestions {
                            if let Some(roman) = RomanNumeral::parse(&subsub.roman) {
                                keys.push(sub_key.with_roman(roman));
                            }
                        }
                    }
                }
            }
            Paper::MultipleChoice(questions) => {
                for question in questions {
                    keys.push(question.key());
                }
            }
        }
        keys
    }

    /// Keys of the leaf nodes only, in document order. Leaves are where
    /// strict alignment pairs answer rows positionally.
    pub fn leaf_keys(&self) -> Vec<AnswerKey> {
        let mut keys = Vec::new();
        match self {
            Paper::Structured(questions) => {
                for question in questions {
                    if question.subquestions.is_empty() {
                        keys.push(question.key());
                        continue;
                    }
                    for sub in &question.subquestions {
                        let sub_key = question.key().with_letter(sub.letter);
                        if sub.subsubquestions.is_empty() {
                            keys.push(sub_key);
                            continue;
                        }
                        for subsub in &sub.subsubquestions {
                            if let Some(roman) = RomanNumeral::parse(&subsub.roman) {
                                keys.push(sub_key.with_roman(roman));
                            }
                        }
                    }
                }
            }
            Paper::MultipleChoice(questions) => {
                for question in questions {
                    keys.push(question.key());
                }
            }
        }
        keys
    }

    /// Resolve a decoded key to its node, if the path exists.
    pub fn node_mut(&mut self, key: &AnswerKey) -> Option<NodeMut<'_>> {
        match self {
            Paper::Structured(questions) => {
                let question = questions
                    .iter_mut()
                    .find(|question| question.number == key.question)?;
                let Some(letter) = key.letter else {
                    return Some(NodeMut::Question(question));
                };
                let sub = question
                    .subquestions
                    .iter_mut()
                    .find(|sub| sub.letter == letter)?;
                let Some(roman) = key.roman else {
                    return Some(NodeMut::SubQuestion(sub));
                };
                let subsub = sub
                    .subsubquestions
                    .iter_mut()
                    .find(|subsub| subsub.roman == roman.as_str())?;
                Some(NodeMut::SubSubQuestion(subsub))
            }
            Paper::MultipleChoice(questions) => {
                if key.letter.is_some() || key.roman.is_some() {
                    return None;
                }
                questions
                    .iter_mut()
                    .find(|question| question.number == key.question)
                    .map(NodeMut::Choice)
            }
        }
    }
}

/// Mutable handle to one node of either paper form, used by the aligner.
#[derive(Debug)]
pub enum NodeMut<'a> {
    Question(&'a mut Question),
    SubQuestion(&'a mut SubQuestion),
    SubSubQuestion(&'a mut SubSubQuestion),
    Choice(&'a mut MultipleChoiceQuestion),
}

impl NodeMut<'_> {
    /// Record an answer row's payload on this node.
    pub fn assign(&mut self, answer: &str, marks: u32, image: Option<&ImageRef>) {
        match self {
            NodeMut::Question(node) => {
                node.answer = Some(answer.to_string());
                node.marks = marks;
                node.answer_image = image.cloned();
            }
            NodeMut::SubQuestion(node) => {
                node.answer = Some(answer.to_string());
                node.marks = marks;
                node.answer_image = image.cloned();
            }
            NodeMut::SubSubQuestion(node) => {
                node.answer = Some(answer.to_string());
                node.marks = marks;
                node.answer_image = image.cloned();
            }
            NodeMut::Choice(node) => {
                node.answer = Some(answer.to_string());
                node.marks = marks;
                node.answer_image = image.cloned();
            }
        }
    }

    pub fn answer(&self) -> Option<&str> {
        match self {
            NodeMut::Question(node) => node.answer.as_deref(),
            NodeMut::SubQuestion(node) => node.answer.as_deref(),
            NodeMut::SubSubQuestion(node) => node.answer.as_deref(),
            NodeMut::Choice(node) => node.answer.as_deref(),
        }
    }
}
