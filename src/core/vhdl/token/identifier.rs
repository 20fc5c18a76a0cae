use super::char_set;
use super::VhdlToken;
use crate::core::lexer::TrainCar;
use crate::util::strcmp;
use serde::de;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::hash::Hash;
use std::hash::Hasher;
use std::str::FromStr;

#[derive(Debug, Clone)]
pub enum Identifier {
    Basic(String),
    Extended(String),
}

impl std::cmp::Eq for Identifier {}

impl Identifier {
    /// Creates a new basic identifier for the implicit working library: `work`.
    pub fn new_working() -> Self {
        Self::Basic(String::from("work"))
    }

    /// Returns the reference to the inner `String` struct.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Basic(id) => id.as_ref(),
            Self::Extended(id) => id.as_ref(),
        }
    }

    /// Checks if `self` is an extended identifier or not.
    fn is_extended(&self) -> bool {
        match self {
            Self::Extended(_) => true,
            Self::Basic(_) => false,
        }
    }

    /// Produces the case-folded form used for map keys and sort keys.
    ///
    /// Extended identifiers are case-sensitive and fold to themselves.
    pub fn to_folded(&self) -> String {
        match self {
            Self::Basic(id) => strcmp::fold(id),
            Self::Extended(id) => id.clone(),
        }
    }
}

impl Hash for Identifier {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            Self::Basic(id) => strcmp::fold(id).hash(state),
            Self::Extended(id) => id.hash(state),
        }
    }
}

#[derive(Debug, PartialEq)]
pub enum IdentifierError {
    Empty,
    InvalidFirstChar(char),
    CharsAfterDelimiter(String),
    MissingClosingDelimiter,
}

impl std::error::Error for IdentifierError {}

impl Display for IdentifierError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "empty identifier"),
            Self::CharsAfterDelimiter(s) => write!(
                f,
                "characters \'{}\' found following closing extended backslash",
                s
            ),
            Self::InvalidFirstChar(c) => {
                write!(f, "first character must be letter but found \'{}\'", c)
            }
            Self::MissingClosingDelimiter => {
                write!(f, "missing closing backslash for extended identifier")
            }
        }
    }
}

impl FromStr for Identifier {
    type Err = IdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = TrainCar::new(s.chars());
        match chars.consume() {
            // check what type of identifier it is
            Some(c) => Ok(match c {
                '\\' => {
                    let result = Self::Extended(
                        VhdlToken::consume_literal(&mut chars, &char_set::BACKSLASH)
                            .ok_or(Self::Err::MissingClosingDelimiter)?,
                    );
                    // gather remaining characters
                    let mut rem = String::new();
                    while let Some(c) = chars.consume() {
                        rem.push(c);
                    }
                    match rem.is_empty() {
                        true => result,
                        false => return Err(Self::Err::CharsAfterDelimiter(rem)),
                    }
                }
                _ => {
                    // verify the first character was a letter
                    match char_set::is_letter(&c) {
                        true => Self::Basic(VhdlToken::consume_value_pattern(
                            &mut chars,
                            Some(c),
                            char_set::is_letter_or_digit,
                        )),
                        false => return Err(Self::Err::InvalidFirstChar(c)),
                    }
                }
            }),
            None => Err(Self::Err::Empty),
        }
    }
}

impl std::cmp::PartialEq for Identifier {
    fn eq(&self, other: &Self) -> bool {
        // instantly not equal if they are not of same type
        if self.is_extended() != other.is_extended() {
            return false;
        };
        // compare with case sensitivity
        if self.is_extended() == true {
            self.as_str() == other.as_str()
        // compare without case sensitivity
        } else {
            strcmp::cmp_ignore_case(self.as_str(), other.as_str())
        }
    }
}

impl Display for Identifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Basic(id) => write!(f, "{}", id),
            Self::Extended(id) => write!(f, "\\{}\\", id.replace('\\', r#"\\"#)),
        }
    }
}

impl Serialize for Identifier {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Identifier {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::from_str(&s).map_err(de::Error::custom)
    }
}
