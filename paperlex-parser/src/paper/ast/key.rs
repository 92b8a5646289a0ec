//! Composite answer keys.
//!
//! Answer tables identify their target node with a key of up to three
//! components, e.g. `"4"`, `"4(b)"`, `"4(b)(ii)"`. The same triple doubles
//! as a node's path within the tree, so keys carry the total order used by
//! the tolerant aligner: `(question, letter, roman)` with a missing
//! component ordering before any present one.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

/// The ten roman numerals the sub-sub-question level can use, in order.
pub const ROMAN_NUMERALS: [&str; 10] =
    ["i", "ii", "iii", "iv", "v", "vi", "vii", "viii", "ix", "x"];

static KEY_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d+)(?:\(([a-z]+)\))?(?:\(([ivx]+)\))?$").expect("key pattern is valid")
});

/// One of the ten sub-sub-question numerals, ordered by value ('i' < 'ii'
/// < … < 'x') rather than lexicographically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RomanNumeral(u8);

impl RomanNumeral {
    pub fn from_index(index: usize) -> Option<Self> {
        if index < ROMAN_NUMERALS.len() {
            Some(RomanNumeral(index as u8))
        } else {
            None
        }
    }

    pub fn parse(text: &str) -> Option<Self> {
        ROMAN_NUMERALS
            .iter()
            .position(|&numeral| numeral == text)
            .map(|index| RomanNumeral(index as u8))
    }

    pub fn index(&self) -> usize {
        self.0 as usize
    }

    pub fn as_str(&self) -> &'static str {
        ROMAN_NUMERALS[self.0 as usize]
    }
}

impl fmt::Display for RomanNumeral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Decoded composite key / node path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AnswerKey {
    pub question: u32,
    pub letter: Option<char>,
    pub roman: Option<RomanNumeral>,
}

impl AnswerKey {
    pub fn question(number: u32) -> Self {
        AnswerKey {
            question: number,
            letter: None,
            roman: None,
        }
    }

    pub fn with_letter(mut self, letter: char) -> Self {
        self.letter = Some(letter);
        self
    }

    pub fn with_roman(mut self, roman: RomanNumeral) -> Self {
        self.roman = Some(roman);
        self
    }

    /// Decode a composite key string.
    ///
    /// The letter group is grammatically `[a-z]+` but sibling letters are
    /// bounded at 'z', so anything longer than one letter cannot name a
    /// node and is rejected. Likewise a roman group outside the first ten
    /// numerals (e.g. "xi", or the malformed "ixi") is rejected.
    pub fn parse(key: &str) -> Result<Self, KeyDecodeError> {
        let trimmed = key.trim();
        let captures = KEY_PATTERN
            .captures(trimmed)
            .ok_or_else(|| KeyDecodeError::new(key))?;

        let question: u32 = captures[1]
            .parse()
            .map_err(|_| KeyDecodeError::new(key))?;

        let letter = match captures.get(2) {
            None => None,
            Some(group) => {
                let mut chars = group.as_str().chars();
                match (chars.next(), chars.next()) {
                    (Some(letter), None) => Some(letter),
                    _ => return Err(KeyDecodeError::new(key)),
                }
            }
        };

        let roman = match captures.get(3) {
            None => None,
            Some(group) => Some(
                RomanNumeral::parse(group.as_str()).ok_or_else(|| KeyDecodeError::new(key))?,
            ),
        };

        Ok(AnswerKey {
            question,
            letter,
            roman,
        })
    }
}

impl fmt::Display for AnswerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.question)?;
        if let Some(letter) = self.letter {
            write!(f, "({})", letter)?;
        }
        if let Some(roman) = self.roman {
            write!(f, "({})", roman)?;
        }
        Ok(())
    }
}

/// An answer row's key does not match the composite-key grammar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyDecodeError {
    pub key: String,
}

impl KeyDecodeError {
    fn new(key: &str) -> Self {
        KeyDecodeError {
            key: key.to_string(),
        }
    }
}

impl fmt::Display for KeyDecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "key {:?} does not match the composite-key grammar", self.key)
    }
}

impl std::error::Error for KeyDecodeError {}
