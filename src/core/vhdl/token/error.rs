use std::fmt::Display;

/// A construct the tokenizer rejected while scanning source code.
#[derive(Debug, PartialEq, Clone)]
pub enum VhdlTokenError {
    UnclosedString,
    UnclosedDelimitedComment,
    UnclosedExtendedIdentifier,
}

impl std::error::Error for VhdlTokenError {}

impl Display for VhdlTokenError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnclosedString => write!(f, "missing closing double quote for string literal"),
            Self::UnclosedDelimitedComment => {
                write!(f, "missing closing */ for delimited comment")
            }
            Self::UnclosedExtendedIdentifier => {
                write!(f, "missing closing backslash for extended identifier")
            }
        }
    }
}
