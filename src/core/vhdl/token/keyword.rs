use std::fmt::Display;

/// The subset of VHDL reserved words that drive the dependency scanner.
///
/// Any other reserved word tokenizes as a plain identifier; the scanner only
/// keys off the words that can open or reference a design unit.
#[derive(Debug, PartialEq, Clone, Copy)]
pub enum Keyword {
    All,
    Architecture,
    Body,
    Component,
    Configuration,
    End,
    Entity,
    Is,
    Library,
    Of,
    Package,
    Use,
}

impl Keyword {
    /// Attempts to match the string `s` to a recognized reserved word.
    ///
    /// Matching is case-insensitive per the LRM; `s` is expected to already be
    /// a full word.
    pub fn match_keyword(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_ref() {
            "all" => Some(Self::All),
            "architecture" => Some(Self::Architecture),
            "body" => Some(Self::Body),
            "component" => Some(Self::Component),
            "configuration" => Some(Self::Configuration),
            "end" => Some(Self::End),
            "entity" => Some(Self::Entity),
            "is" => Some(Self::Is),
            "library" => Some(Self::Library),
            "of" => Some(Self::Of),
            "package" => Some(Self::Package),
            "use" => Some(Self::Use),
            _ => None,
        }
    }

    fn as_str(&self) -> &str {
        match self {
            Self::All => "all",
            Self::Architecture => "architecture",
            Self::Body => "body",
            Self::Component => "component",
            Self::Configuration => "configuration",
            Self::End => "end",
            Self::Entity => "entity",
            Self::Is => "is",
            Self::Library => "library",
            Self::Of => "of",
            Self::Package => "package",
            Self::Use => "use",
        }
    }
}

impl Display for Keyword {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn matching() {
        assert_eq!(Keyword::match_keyword("entity"), Some(Keyword::Entity));
        assert_eq!(Keyword::match_keyword("ENTITY"), Some(Keyword::Entity));
        assert_eq!(Keyword::match_keyword("EnTiTy"), Some(Keyword::Entity));
        // reserved words outside the scanner's subset are plain identifiers
        assert_eq!(Keyword::match_keyword("signal"), None);
        assert_eq!(Keyword::match_keyword("entity2"), None);
    }
}
