pub mod comment;
pub mod delimiter;
pub mod error;
pub mod identifier;
pub mod keyword;

pub use comment::Comment;
pub use delimiter::Delimiter;
pub use error::VhdlTokenError;
pub use identifier::Identifier;
pub use keyword::Keyword;

use crate::core::lexer::{Token, TokenError, Tokenize, TrainCar};
use std::fmt::Display;

pub mod char_set {
    pub const DOUBLE_QUOTE: char = '\"';
    pub const BACKSLASH: char = '\\';
    pub const DASH: char = '-';
    pub const FWDSLASH: char = '/';
    pub const STAR: char = '*';
    pub const UNDERLINE: char = '_';
    pub const SINGLE_QUOTE: char = '\'';
    pub const HASH: char = '#';
    pub const DOT: char = '.';

    /// Checks if `c` is a digit according to VHDL-2008 LRM p225.
    pub fn is_digit(c: &char) -> bool {
        match c {
            '0'..='9' => true,
            _ => false,
        }
    }

    /// Checks if `c` is an upper-case letter according to VHDL-2019 LRM p257.
    pub fn is_upper(c: &char) -> bool {
        match c {
            '\u{00D7}' => false, // reject multiplication sign
            'A'..='Z' | 'À'..='Þ' => true,
            _ => false,
        }
    }

    /// Checks if `c` is a lower-case letter according to VHDL-2019 LRM p257.
    pub fn is_lower(c: &char) -> bool {
        match c {
            '\u{00F7}' => false, // reject division sign
            'a'..='z' | 'ß'..='ÿ' => true,
            _ => false,
        }
    }

    /// Checks if `c` is a letter.
    pub fn is_letter(c: &char) -> bool {
        is_lower(&c) || is_upper(&c)
    }

    /// Checks if `c` belongs in an identifier or abstract literal after its
    /// first character.
    pub fn is_letter_or_digit(c: &char) -> bool {
        is_letter(&c) || is_digit(&c) || c == &UNDERLINE
    }

    /// Checks if `c` can continue an abstract literal (covers based literals
    /// and real points).
    pub fn is_numeric(c: &char) -> bool {
        is_letter_or_digit(&c) || c == &DOT || c == &HASH
    }
}

/// The lexical elements the dependency scanner recognizes.
///
/// Every other piece of text is consumed as trivia and never surfaces as a
/// token. This is intentionally far from a full VHDL tokenizer; it captures
/// just enough to locate design-unit declarations and references.
#[derive(Debug, PartialEq, Clone)]
pub enum VhdlToken {
    Comment(Comment),
    Identifier(Identifier),
    Keyword(Keyword),
    Delimiter(Delimiter),
}

impl VhdlToken {
    /// Checks if the current token type `self` is a particular keyword `kw`.
    pub fn check_keyword(&self, kw: &Keyword) -> bool {
        match self {
            Self::Keyword(k) => k == kw,
            _ => false,
        }
    }

    /// Checks if the current token type `self` is a particular delimiter `d`.
    pub fn check_delimiter(&self, d: &Delimiter) -> bool {
        match self {
            Self::Delimiter(t) => t == d,
            _ => false,
        }
    }

    /// Casts into an identifier, if `self` is one.
    pub fn as_identifier(&self) -> Option<&Identifier> {
        match self {
            Self::Identifier(id) => Some(id),
            _ => None,
        }
    }

    /// Transforms into an identifier, if `self` is one.
    pub fn take_identifier(self) -> Option<Identifier> {
        match self {
            Self::Identifier(id) => Some(id),
            _ => None,
        }
    }

    /// Casts into a comment, if `self` is one.
    pub fn as_comment(&self) -> Option<&Comment> {
        match self {
            Self::Comment(c) => Some(c),
            _ => None,
        }
    }

    /// Walks through the stream to gather a `String` until finding the
    /// exit character `brk`.
    ///
    /// An exit character is included in the `String` if it is impeded by a
    /// second `brk` character (doubled escape). Returns `None` if the stream
    /// ends before the exit character is found.
    pub fn consume_literal(
        train: &mut TrainCar<impl Iterator<Item = char>>,
        brk: &char,
    ) -> Option<String> {
        let mut result = String::new();
        while let Some(c) = train.consume() {
            if &c != brk {
                result.push(c);
            } else {
                match train.peek() {
                    Some(d) => {
                        if d == brk {
                            // the escape char must be consumed to not retrigger
                            result.push(train.consume().unwrap());
                        } else {
                            return Some(result);
                        }
                    }
                    None => return Some(result),
                }
            }
        }
        None
    }

    /// Walks through the stream to gather a `String` while characters
    /// satisfy the `eval` predicate.
    ///
    /// If `c0` is set, it is the first character of the result.
    pub fn consume_value_pattern(
        train: &mut TrainCar<impl Iterator<Item = char>>,
        c0: Option<char>,
        eval: fn(&char) -> bool,
    ) -> String {
        let mut result = match c0 {
            Some(c) => String::from(c),
            None => String::new(),
        };
        while let Some(c) = train.peek() {
            if eval(&c) == true {
                result.push(train.consume().unwrap());
            } else {
                break;
            }
        }
        result
    }
}

impl Display for VhdlToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Comment(c) => write!(f, "{}", c),
            Self::Identifier(id) => write!(f, "{}", id),
            Self::Keyword(kw) => write!(f, "{}", kw),
            Self::Delimiter(d) => write!(f, "{}", d),
        }
    }
}

/// Splits VHDL source code into the reduced token stream.
///
/// Strings, character literals, and abstract literals are elided during the
/// scan; comments are kept so pragmas can be lifted from them later.
#[derive(Debug, PartialEq)]
pub struct VhdlTokenizer {
    tokens: Vec<Token<VhdlToken>>,
    anomalies: Vec<TokenError<VhdlTokenError>>,
}

impl Tokenize for VhdlTokenizer {
    type TokenType = VhdlToken;
    type Err = VhdlTokenError;

    fn tokenize(s: &str) -> Vec<Result<Token<Self::TokenType>, TokenError<Self::Err>>> {
        let mut train = TrainCar::new(s.chars());
        // store results here as we consume the characters
        let mut symbols: Vec<Result<Token<Self::TokenType>, TokenError<Self::Err>>> = Vec::new();

        while let Some(c) = train.consume() {
            let loc = train.locate().clone();
            if c.is_whitespace() == true {
                continue;
            }
            if c == char_set::DASH {
                // a second dash opens a single-line comment
                if train.peek() == Some(&char_set::DASH) {
                    train.consume();
                    let note = VhdlToken::consume_value_pattern(&mut train, None, |c| c != &'\n');
                    symbols.push(Ok(Token::new(
                        VhdlToken::Comment(Comment::Single(note)),
                        loc,
                    )));
                }
            } else if c == char_set::FWDSLASH {
                // a star opens a delimited comment (VHDL-2008)
                if train.peek() == Some(&char_set::STAR) {
                    train.consume();
                    match Self::consume_delimited_comment(&mut train) {
                        Some(note) => symbols.push(Ok(Token::new(
                            VhdlToken::Comment(Comment::Delimited(note)),
                            loc,
                        ))),
                        None => symbols.push(Err(TokenError::new(
                            VhdlTokenError::UnclosedDelimitedComment,
                            loc,
                        ))),
                    }
                }
            } else if char_set::is_letter(&c) == true {
                symbols.push(Ok(Token::new(Self::consume_word(&mut train, c), loc)));
            } else if char_set::is_digit(&c) == true {
                // elide abstract literals
                VhdlToken::consume_value_pattern(&mut train, None, char_set::is_numeric);
            } else if c == char_set::DOUBLE_QUOTE {
                // elide string and bit-string literals
                if VhdlToken::consume_literal(&mut train, &char_set::DOUBLE_QUOTE).is_none() {
                    symbols.push(Err(TokenError::new(VhdlTokenError::UnclosedString, loc)));
                }
            } else if c == char_set::SINGLE_QUOTE {
                // elide character literals; a lone tick is attribute trivia
                if let Some(c1) = train.consume() {
                    if train.peek() == Some(&char_set::SINGLE_QUOTE) {
                        train.consume();
                    } else if char_set::is_letter(&c1) == true {
                        // the consumed char was the start of a word (x'range)
                        let loc = train.locate().clone();
                        symbols.push(Ok(Token::new(Self::consume_word(&mut train, c1), loc)));
                    } else if char_set::is_digit(&c1) == true {
                        VhdlToken::consume_value_pattern(&mut train, None, char_set::is_numeric);
                    } else if let Some(d) = Delimiter::transform(&c1) {
                        symbols.push(Ok(Token::new(
                            VhdlToken::Delimiter(d),
                            train.locate().clone(),
                        )));
                    }
                }
            } else if c == char_set::BACKSLASH {
                match VhdlToken::consume_literal(&mut train, &char_set::BACKSLASH) {
                    Some(id) => symbols.push(Ok(Token::new(
                        VhdlToken::Identifier(Identifier::Extended(id)),
                        loc,
                    ))),
                    None => symbols.push(Err(TokenError::new(
                        VhdlTokenError::UnclosedExtendedIdentifier,
                        loc,
                    ))),
                }
            } else if let Some(d) = Delimiter::transform(&c) {
                symbols.push(Ok(Token::new(VhdlToken::Delimiter(d), loc)));
            }
            // all other characters are trivia
        }
        symbols
    }
}

impl VhdlTokenizer {
    pub fn from_source_code(s: &str) -> Self {
        let mut tokens = Vec::new();
        let mut anomalies = Vec::new();
        for symbol in Self::tokenize(s) {
            match symbol {
                Ok(token) => tokens.push(token),
                Err(anomaly) => anomalies.push(anomaly),
            }
        }
        Self {
            tokens: tokens,
            anomalies: anomalies,
        }
    }

    /// Transforms the tokenizer into its full token stream.
    pub fn into_tokens(self) -> Vec<Token<VhdlToken>> {
        self.tokens
    }

    /// References the constructs rejected during the scan.
    pub fn get_anomalies(&self) -> &Vec<TokenError<VhdlTokenError>> {
        &self.anomalies
    }

    /// Decomposes into the token stream and the rejected constructs.
    pub fn into_parts(self) -> (Vec<Token<VhdlToken>>, Vec<TokenError<VhdlTokenError>>) {
        (self.tokens, self.anomalies)
    }

    /// Collects a word starting with `c0` and classifies it as a keyword or
    /// a basic identifier.
    fn consume_word(train: &mut TrainCar<impl Iterator<Item = char>>, c0: char) -> VhdlToken {
        let word = VhdlToken::consume_value_pattern(train, Some(c0), char_set::is_letter_or_digit);
        match Keyword::match_keyword(&word) {
            Some(kw) => VhdlToken::Keyword(kw),
            None => VhdlToken::Identifier(Identifier::Basic(word)),
        }
    }

    /// Collects a delimited comment until the closing `*/` sequence.
    ///
    /// Returns `None` if the stream ends before the comment closes.
    fn consume_delimited_comment(
        train: &mut TrainCar<impl Iterator<Item = char>>,
    ) -> Option<String> {
        let mut note = String::new();
        while let Some(c) = train.consume() {
            if c == char_set::STAR && train.peek() == Some(&char_set::FWDSLASH) {
                train.consume();
                return Some(note);
            }
            note.push(c);
        }
        None
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn types(tokens: &Vec<Token<VhdlToken>>) -> Vec<&VhdlToken> {
        tokens.iter().map(|t| t.as_type()).collect()
    }

    #[test]
    fn entity_declaration() {
        let s = "entity nor_gate is port(a: in bit); end entity;";
        let tokens = VhdlTokenizer::from_source_code(&s).into_tokens();
        assert_eq!(
            types(&tokens),
            vec![
                &VhdlToken::Keyword(Keyword::Entity),
                &VhdlToken::Identifier(Identifier::Basic(String::from("nor_gate"))),
                &VhdlToken::Keyword(Keyword::Is),
                &VhdlToken::Identifier(Identifier::Basic(String::from("port"))),
                &VhdlToken::Delimiter(Delimiter::ParenL),
                &VhdlToken::Identifier(Identifier::Basic(String::from("a"))),
                &VhdlToken::Delimiter(Delimiter::Colon),
                &VhdlToken::Identifier(Identifier::Basic(String::from("in"))),
                &VhdlToken::Identifier(Identifier::Basic(String::from("bit"))),
                &VhdlToken::Delimiter(Delimiter::ParenR),
                &VhdlToken::Delimiter(Delimiter::Terminator),
                &VhdlToken::Keyword(Keyword::End),
                &VhdlToken::Keyword(Keyword::Entity),
                &VhdlToken::Delimiter(Delimiter::Terminator),
            ]
        );
    }

    #[test]
    fn comments_are_kept() {
        let s = "-- pragma vhdeps ignore component foo\nuse work.pkg.all;";
        let tokens = VhdlTokenizer::from_source_code(&s).into_tokens();
        assert_eq!(
            tokens.first().unwrap().as_type(),
            &VhdlToken::Comment(Comment::Single(String::from(
                " pragma vhdeps ignore component foo"
            )))
        );
        // delimited comments also survive
        let s = "/* multi\nline */ entity";
        let tokens = VhdlTokenizer::from_source_code(&s).into_tokens();
        assert_eq!(
            types(&tokens),
            vec![
                &VhdlToken::Comment(Comment::Delimited(String::from(" multi\nline "))),
                &VhdlToken::Keyword(Keyword::Entity),
            ]
        );
    }

    #[test]
    fn strings_and_chars_are_elided() {
        let s = "x <= \"0011\"; y <= '1'; assert false report \"-- not a comment\";";
        let tokens = VhdlTokenizer::from_source_code(&s).into_tokens();
        assert_eq!(
            types(&tokens),
            vec![
                &VhdlToken::Identifier(Identifier::Basic(String::from("x"))),
                &VhdlToken::Delimiter(Delimiter::Terminator),
                &VhdlToken::Identifier(Identifier::Basic(String::from("y"))),
                &VhdlToken::Delimiter(Delimiter::Terminator),
                &VhdlToken::Identifier(Identifier::Basic(String::from("assert"))),
                &VhdlToken::Identifier(Identifier::Basic(String::from("false"))),
                &VhdlToken::Identifier(Identifier::Basic(String::from("report"))),
                &VhdlToken::Delimiter(Delimiter::Terminator),
            ]
        );
    }

    #[test]
    fn attributes_survive_the_tick() {
        let s = "wait until clk'event;";
        let tokens = VhdlTokenizer::from_source_code(&s).into_tokens();
        assert_eq!(
            types(&tokens),
            vec![
                &VhdlToken::Identifier(Identifier::Basic(String::from("wait"))),
                &VhdlToken::Identifier(Identifier::Basic(String::from("until"))),
                &VhdlToken::Identifier(Identifier::Basic(String::from("clk"))),
                &VhdlToken::Identifier(Identifier::Basic(String::from("event"))),
                &VhdlToken::Delimiter(Delimiter::Terminator),
            ]
        );
    }

    #[test]
    fn unclosed_string_is_an_anomaly() {
        let s = "x <= \"0011";
        let tokenizer = VhdlTokenizer::from_source_code(&s);
        assert_eq!(tokenizer.get_anomalies().len(), 1);
        assert_eq!(
            tokenizer.get_anomalies().first().unwrap().as_err(),
            &VhdlTokenError::UnclosedString
        );
    }

    #[test]
    fn extended_identifier() {
        let s = "entity \\Weird.Name\\ is";
        let tokens = VhdlTokenizer::from_source_code(&s).into_tokens();
        assert_eq!(
            types(&tokens),
            vec![
                &VhdlToken::Keyword(Keyword::Entity),
                &VhdlToken::Identifier(Identifier::Extended(String::from("Weird.Name"))),
                &VhdlToken::Keyword(Keyword::Is),
            ]
        );
    }

    #[test]
    fn abstract_literals_are_elided() {
        let s = "g : natural := 16#ff#; w : real := 1.5e6;";
        let tokens = VhdlTokenizer::from_source_code(&s).into_tokens();
        assert_eq!(
            types(&tokens),
            vec![
                &VhdlToken::Identifier(Identifier::Basic(String::from("g"))),
                &VhdlToken::Delimiter(Delimiter::Colon),
                &VhdlToken::Identifier(Identifier::Basic(String::from("natural"))),
                &VhdlToken::Delimiter(Delimiter::Terminator),
                &VhdlToken::Identifier(Identifier::Basic(String::from("w"))),
                &VhdlToken::Delimiter(Delimiter::Colon),
                &VhdlToken::Identifier(Identifier::Basic(String::from("real"))),
                &VhdlToken::Delimiter(Delimiter::Terminator),
            ]
        );
    }
}
