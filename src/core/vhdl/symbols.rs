use std::iter::Peekable;

use super::token::{Delimiter, Identifier, Keyword, VhdlToken, VhdlTokenizer};
use crate::core::lexer::{Position, Token, TokenError};
use crate::core::unit::{DesignUnit, Pragma, Requirement};
use crate::core::vhdl::token::VhdlTokenError;

/// Libraries satisfied by fiat; references into them never become edges.
const BUILT_IN_LIBRARIES: [&str; 2] = ["std", "ieee"];

/// Checks if the library `lib` is externally provided by every toolchain.
pub fn is_builtin_library(lib: &Identifier) -> bool {
    BUILT_IN_LIBRARIES
        .iter()
        .find(|b| lib == &Identifier::Basic(b.to_string()))
        .is_some()
}

type TokenStream = Peekable<std::vec::IntoIter<Token<VhdlToken>>>;

/// Lexically scans one VHDL file for the design units it declares, the units
/// it references, and the pragmas attached to it.
///
/// This is a single pass over the reduced token stream; no syntax tree is
/// built. See the recognized patterns on each `scan_*` helper.
#[derive(Debug, PartialEq)]
pub struct VhdlParser {
    provides: Vec<DesignUnit>,
    requires: Vec<Requirement>,
    pragmas: Vec<Pragma>,
    anomalies: Vec<TokenError<VhdlTokenError>>,
}

impl VhdlParser {
    pub fn read(s: &str) -> Self {
        let (tokens, anomalies) = VhdlTokenizer::from_source_code(s).into_parts();
        let mut parser = Self {
            provides: Vec::new(),
            requires: Vec::new(),
            pragmas: Vec::new(),
            anomalies: anomalies,
        };
        parser.scan(tokens);
        parser
    }

    pub fn get_provides(&self) -> &Vec<DesignUnit> {
        &self.provides
    }

    pub fn get_requires(&self) -> &Vec<Requirement> {
        &self.requires
    }

    pub fn get_pragmas(&self) -> &Vec<Pragma> {
        &self.pragmas
    }

    pub fn get_anomalies(&self) -> &Vec<TokenError<VhdlTokenError>> {
        &self.anomalies
    }

    /// Decomposes the parser into (provides, requires, pragmas, anomalies).
    pub fn into_parts(
        self,
    ) -> (
        Vec<DesignUnit>,
        Vec<Requirement>,
        Vec<Pragma>,
        Vec<TokenError<VhdlTokenError>>,
    ) {
        (self.provides, self.requires, self.pragmas, self.anomalies)
    }

    fn scan(&mut self, tokens: Vec<Token<VhdlToken>>) {
        // libraries brought into scope by `library` clauses, in declaration order
        let mut scope: Vec<Identifier> = Vec::new();
        // component declarations seen so far in this file
        let mut components: Vec<Identifier> = Vec::new();

        let mut tokens: TokenStream = tokens.into_iter().peekable();

        while let Some(t) = tokens.next() {
            let pos = t.locate().clone();
            match t.take() {
                VhdlToken::Comment(note) => {
                    if let Some(pragma) = Pragma::parse(note.as_str()) {
                        self.pragmas.push(pragma);
                    }
                }
                VhdlToken::Keyword(Keyword::Library) => {
                    Self::scan_library_clause(&mut tokens, &mut scope);
                }
                VhdlToken::Keyword(Keyword::Use) => {
                    self.scan_use_clause(&mut tokens, pos);
                }
                VhdlToken::Keyword(Keyword::Entity) => {
                    // `entity NAME is` opens a declaration; `end entity NAME;`
                    // has no trailing `is` and falls through
                    if let Some(name) = Self::accept_identifier(&mut tokens) {
                        if Self::accept_keyword(&mut tokens, &Keyword::Is) == true {
                            self.provides.push(DesignUnit::Entity {
                                name: name,
                                pos: pos,
                            });
                        }
                    }
                }
                VhdlToken::Keyword(Keyword::Architecture) => {
                    if let Some((name, entity)) = Self::accept_secondary_header(&mut tokens) {
                        self.push_require(Requirement::architecture_of(entity.clone(), pos.clone()));
                        self.provides.push(DesignUnit::Architecture {
                            name: name,
                            entity: entity,
                            pos: pos,
                        });
                    }
                }
                VhdlToken::Keyword(Keyword::Package) => {
                    let body = match tokens.peek() {
                        Some(t) => t.as_type().check_keyword(&Keyword::Body),
                        None => false,
                    };
                    if body == true {
                        tokens.next();
                    }
                    if let Some(name) = Self::accept_identifier(&mut tokens) {
                        if Self::accept_keyword(&mut tokens, &Keyword::Is) == true {
                            match body {
                                true => {
                                    self.push_require(Requirement::body_of(
                                        name.clone(),
                                        pos.clone(),
                                    ));
                                    self.provides.push(DesignUnit::PackageBody {
                                        package: name,
                                        pos: pos,
                                    });
                                }
                                false => {
                                    self.provides.push(DesignUnit::Package {
                                        name: name,
                                        pos: pos,
                                    });
                                }
                            }
                        }
                    }
                }
                VhdlToken::Keyword(Keyword::Configuration) => {
                    if let Some((name, entity)) = Self::accept_secondary_header(&mut tokens) {
                        self.push_require(Requirement::entity_instance(
                            None,
                            entity.clone(),
                            None,
                            pos.clone(),
                        ));
                        self.provides.push(DesignUnit::Configuration {
                            name: name,
                            entity: entity,
                            pos: pos,
                        });
                    }
                }
                VhdlToken::Keyword(Keyword::Component) => {
                    // a component declaration: `component NAME [is]`
                    if let Some(name) = Self::accept_identifier(&mut tokens) {
                        Self::accept_keyword(&mut tokens, &Keyword::Is);
                        if components.contains(&name) == false {
                            components.push(name);
                        }
                    }
                }
                VhdlToken::Delimiter(Delimiter::Colon) => {
                    self.scan_instantiation(&mut tokens, &scope, &components, pos);
                }
                _ => (),
            }
        }
    }

    /// Reads `library L1, L2, ...;` and extends the visible scope.
    ///
    /// `library work;` is a no-op per the LRM.
    fn scan_library_clause(tokens: &mut TokenStream, scope: &mut Vec<Identifier>) {
        while let Some(name) = Self::accept_identifier(tokens) {
            if name != Identifier::new_working() && scope.contains(&name) == false {
                scope.push(name);
            }
            // continue only over a comma-separated list
            match tokens.peek() {
                Some(t) if t.as_type().check_delimiter(&Delimiter::Comma) => {
                    tokens.next();
                }
                _ => break,
            }
        }
    }

    /// Reads the clause following a `use` keyword.
    ///
    /// `use L.N...` requires package (L, N) unless `L` is a built-in library.
    /// The binding-indication forms `use entity L.E[(A)]` and
    /// `use configuration L.C` require the named unit directly.
    fn scan_use_clause(&mut self, tokens: &mut TokenStream, pos: Position) {
        loop {
            match tokens.peek() {
                Some(t) if t.as_type().check_keyword(&Keyword::Entity) => {
                    tokens.next();
                    if let Some((library, name)) = Self::split_selected_name(tokens) {
                        let arch = Self::accept_architecture_suffix(tokens);
                        self.push_require(Requirement::entity_instance(
                            library,
                            name,
                            arch,
                            pos.clone(),
                        ));
                    }
                }
                Some(t) if t.as_type().check_keyword(&Keyword::Configuration) => {
                    tokens.next();
                    if let Some((library, name)) = Self::split_selected_name(tokens) {
                        self.push_require(Requirement::configuration_instance(
                            library,
                            name,
                            pos.clone(),
                        ));
                    }
                }
                Some(t) if t.as_type().as_identifier().is_some() => {
                    let parts = Self::compose_name(tokens);
                    if parts.len() >= 2 {
                        let mut parts = parts.into_iter();
                        let library = parts.next().unwrap();
                        let name = parts.next().unwrap();
                        if is_builtin_library(&library) == false {
                            self.push_require(Requirement::package_use(
                                library,
                                name,
                                pos.clone(),
                            ));
                        }
                    }
                }
                _ => break,
            }
            // a use clause may import several selected names
            match tokens.peek() {
                Some(t) if t.as_type().check_delimiter(&Delimiter::Comma) => {
                    tokens.next();
                }
                _ => break,
            }
        }
    }

    /// Reads the unit reference following a label's colon, if one is present.
    ///
    /// Recognizes `: entity L.E[(A)]`, `: configuration L.C`, `: component C`,
    /// and a bare `: C` whose `C` was declared as a component in this file.
    fn scan_instantiation(
        &mut self,
        tokens: &mut TokenStream,
        scope: &Vec<Identifier>,
        components: &Vec<Identifier>,
        pos: Position,
    ) {
        match tokens.peek() {
            Some(t) if t.as_type().check_keyword(&Keyword::Entity) => {
                tokens.next();
                if let Some((library, name)) = Self::split_selected_name(tokens) {
                    let arch = Self::accept_architecture_suffix(tokens);
                    self.push_require(Requirement::entity_instance(library, name, arch, pos));
                }
            }
            Some(t) if t.as_type().check_keyword(&Keyword::Configuration) => {
                tokens.next();
                if let Some((library, name)) = Self::split_selected_name(tokens) {
                    self.push_require(Requirement::configuration_instance(library, name, pos));
                }
            }
            Some(t) if t.as_type().check_keyword(&Keyword::Component) => {
                tokens.next();
                if let Some(name) = Self::accept_identifier(tokens) {
                    self.push_require(Requirement::component_instance(name, scope.clone(), pos));
                }
            }
            Some(t) if t.as_type().as_identifier().is_some() => {
                // only a name previously declared as a component counts; any
                // other identifier is a type mark in an object declaration
                let declared = components.contains(t.as_type().as_identifier().unwrap());
                if declared == true {
                    let name = tokens.next().unwrap().take().take_identifier().unwrap();
                    self.push_require(Requirement::component_instance(name, scope.clone(), pos));
                }
            }
            _ => (),
        }
    }

    /// Consumes the next token if it is an identifier.
    fn accept_identifier(tokens: &mut TokenStream) -> Option<Identifier> {
        match tokens.peek() {
            Some(t) if t.as_type().as_identifier().is_some() => {
                Some(tokens.next().unwrap().take().take_identifier().unwrap())
            }
            _ => None,
        }
    }

    /// Consumes the next token if it is the keyword `kw`.
    fn accept_keyword(tokens: &mut TokenStream, kw: &Keyword) -> bool {
        match tokens.peek() {
            Some(t) if t.as_type().check_keyword(kw) => {
                tokens.next();
                true
            }
            _ => false,
        }
    }

    /// Reads `NAME of OWNER is`, the header shared by architectures and
    /// configurations.
    fn accept_secondary_header(tokens: &mut TokenStream) -> Option<(Identifier, Identifier)> {
        let name = Self::accept_identifier(tokens)?;
        if Self::accept_keyword(tokens, &Keyword::Of) == false {
            return None;
        }
        let owner = Self::accept_identifier(tokens)?;
        match Self::accept_keyword(tokens, &Keyword::Is) {
            true => Some((name, owner)),
            false => None,
        }
    }

    /// Collects a dot-separated selected name, stopping at a trailing `all`.
    fn compose_name(tokens: &mut TokenStream) -> Vec<Identifier> {
        let mut parts = Vec::new();
        match Self::accept_identifier(tokens) {
            Some(id) => parts.push(id),
            None => return parts,
        }
        loop {
            match tokens.peek() {
                Some(t) if t.as_type().check_delimiter(&Delimiter::Dot) => {
                    tokens.next();
                    if Self::accept_keyword(tokens, &Keyword::All) == true {
                        break;
                    }
                    match Self::accept_identifier(tokens) {
                        Some(id) => parts.push(id),
                        None => break,
                    }
                }
                _ => break,
            }
        }
        parts
    }

    /// Collects a selected name and splits it into an optional library prefix
    /// and the unit name.
    fn split_selected_name(tokens: &mut TokenStream) -> Option<(Option<Identifier>, Identifier)> {
        let parts = Self::compose_name(tokens);
        let mut parts = parts.into_iter();
        match (parts.next(), parts.next()) {
            (Some(library), Some(name)) => Some((Some(library), name)),
            (Some(name), None) => Some((None, name)),
            _ => None,
        }
    }

    /// Consumes a `(ARCH)` suffix directly following an entity name in a
    /// binding or instantiation, if present.
    fn accept_architecture_suffix(tokens: &mut TokenStream) -> Option<Identifier> {
        match tokens.peek() {
            Some(t) if t.as_type().check_delimiter(&Delimiter::ParenL) => {
                tokens.next();
                let arch = Self::accept_identifier(tokens);
                match tokens.peek() {
                    Some(t) if t.as_type().check_delimiter(&Delimiter::ParenR) => {
                        tokens.next();
                    }
                    _ => (),
                }
                arch
            }
            _ => None,
        }
    }

    /// Records a requirement unless an equivalent reference was already seen.
    fn push_require(&mut self, req: Requirement) {
        let dupe = self.requires.iter().find(|r| {
            r.get_kind() == req.get_kind()
                && r.get_library() == req.get_library()
                && r.get_name() == req.get_name()
                && r.get_arch() == req.get_arch()
        });
        if dupe.is_none() {
            self.requires.push(req);
        }
    }
}
