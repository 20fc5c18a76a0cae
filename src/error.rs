//
//  Copyright (C) 2022-2024  Chase Ruskin
//
//  This program is free software: you can redistribute it and/or modify
//  it under the terms of the GNU General Public License as published by
//  the Free Software Foundation, either version 3 of the License, or
//  (at your option) any later version.
//
//  This program is distributed in the hope that it will be useful,
//  but WITHOUT ANY WARRANTY; without even the implied warranty of
//  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
//  GNU General Public License for more details.
//
//  You should have received a copy of the GNU General Public License
//  along with this program.  If not, see <http://www.gnu.org/licenses/>.
//

use colored::Colorize;
use std::{fmt::Display, path::PathBuf};

use crate::core::lexer::Position;
use crate::util::filesystem;

#[derive(Debug, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("{0}")]
    Custom(String),
    #[error("failed to access path {0:?}: {1}")]
    IoFailure(PathBuf, LastError),
    #[error("failed to scan file {0:?}{1}: {2}")]
    ParseAnomaly(PathBuf, Position, LastError),
    #[error("duplicate providers for {0}\n\nlocation 1: {1:?}\nlocation 2: {2:?}{3}")]
    DuplicateProvider(String, PathBuf, PathBuf, Hint),
    #[error("unresolved reference to {0} in file {1:?}{2}{3}")]
    UnresolvedReference(String, PathBuf, Position, Hint),
    #[error("unresolved reference to {0} in file {1:?}{2}: candidate provider {3:?} was dropped due to parse anomalies")]
    UnresolvedReferenceDropped(String, PathBuf, Position, PathBuf),
    #[error("dependency cycle detected:\n{0}")]
    Cycle(CyclePath),
    #[error("no top-level units matched the patterns [{0}]{1}")]
    NoTop(String, Hint),
    #[error("file {0:?} must define exactly one entity or one package, found {1} entities and {2} packages{3}")]
    StyleOneUnit(PathBuf, usize, usize, Hint),
    #[error("package \"{1}\" in file {0:?} must carry the \"_pkg\" suffix")]
    StylePackageSuffix(PathBuf, String),
    #[error("file {0:?} must be named after the primary unit \"{1}\" it defines")]
    StyleFilenameMismatch(PathBuf, String),
    #[error("conflicting library assignment for file {0:?}: keeping \"{1}\", a later directive assigns \"{2}\"")]
    LibraryConflict(PathBuf, String, String),
    #[error("no source files were discovered")]
    EmptyDiscovery,
    #[error("internal index inconsistency: {0}")]
    InconsistentIndex(String),
}

#[derive(Debug, PartialEq)]
pub struct LastError(pub String);

impl Display for LastError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", Error::lowerize(self.0.to_string()))
    }
}

impl Error {
    pub fn lowerize(s: String) -> String {
        if s.is_empty() == true {
            return s;
        }
        // get the first word
        let first_word = s.split_whitespace().into_iter().next().unwrap_or("");
        // retain punctuation if the first word is all-caps and longer than 1 character
        if first_word.len() > 1
            && first_word
                .chars()
                .find(|c| c.is_ascii_lowercase() == true)
                .is_none()
        {
            s.to_string()
        } else {
            s.char_indices()
                .map(|(i, c)| if i == 0 { c.to_ascii_lowercase() } else { c })
                .collect()
        }
    }
}

/// The file path sequence forming an illegal dependency cycle.
///
/// The first file is repeated at the end when displayed to close the loop.
#[derive(Debug, PartialEq)]
pub struct CyclePath(Vec<PathBuf>);

impl CyclePath {
    pub fn new(path: Vec<PathBuf>) -> Self {
        Self(path)
    }

    pub fn inner(&self) -> &Vec<PathBuf> {
        &self.0
    }
}

impl Display for CyclePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut chain = self.0.iter();
        while let Some(p) = chain.next() {
            write!(f, "  {} ->\n", filesystem::into_std_str(p.clone()))?;
        }
        // close the loop back at the start
        if let Some(p) = self.0.first() {
            write!(f, "  {}", filesystem::into_std_str(p.clone()))?;
        }
        Ok(())
    }
}

#[derive(Debug, PartialEq)]
pub enum Hint {
    AllowBlackBox,
    TopPattern,
    ResolveDuplicates,
    SplitUnits,
}

impl Display for Hint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let message = match self {
            Self::AllowBlackBox => {
                "mark the file's inclusion directive as black-box or add an ignore pragma to suppress the reference"
            }
            Self::TopPattern => "adjust the top patterns or include a file in top mode",
            Self::ResolveDuplicates => {
                "rename one of the units or restrict the files to disjoint vhdl versions"
            }
            Self::SplitUnits => "move each primary design unit into its own file",
        };
        write!(
            f,
            "\n\n{}: {}",
            "hint".green(),
            Error::lowerize(message.to_string())
        )
    }
}

/// How a diagnostic affects the outcome of a resolution.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Severity {
    Warning,
    Fatal,
}

impl Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Warning => write!(f, "{}", "warning".yellow()),
            Self::Fatal => write!(f, "{}", "error".red()),
        }
    }
}

/// One diagnosed condition carrying its consequence for the run.
#[derive(Debug, PartialEq)]
pub struct Diagnostic {
    severity: Severity,
    error: Error,
}

impl Diagnostic {
    pub fn warning(error: Error) -> Self {
        Self {
            severity: Severity::Warning,
            error: error,
        }
    }

    pub fn fatal(error: Error) -> Self {
        Self {
            severity: Severity::Fatal,
            error: error,
        }
    }

    pub fn is_fatal(&self) -> bool {
        self.severity == Severity::Fatal
    }

    pub fn get_error(&self) -> &Error {
        &self.error
    }
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.severity, self.error)
    }
}

/// The accumulated diagnostics of a pipeline stage or a whole run.
///
/// Each stage runs to completion before its diagnostics are surfaced, so a
/// single pass reports every finding at once.
#[derive(Debug, PartialEq)]
pub struct DiagnosticList(Vec<Diagnostic>);

impl DiagnosticList {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn push(&mut self, diag: Diagnostic) -> () {
        self.0.push(diag);
    }

    pub fn append(&mut self, other: &mut Self) -> () {
        self.0.append(&mut other.0);
    }

    pub fn has_fatal(&self) -> bool {
        self.0.iter().find(|d| d.is_fatal() == true).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.0.iter()
    }

    pub fn into_inner(self) -> Vec<Diagnostic> {
        self.0
    }
}

impl std::error::Error for DiagnosticList {}

impl Display for DiagnosticList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut diags = self.0.iter();
        while let Some(d) = diags.next() {
            write!(f, "{}\n", d)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn lowerize() {
        assert_eq!(
            Error::lowerize(String::from("Failed to read")),
            "failed to read"
        );
        // all-caps first words are acronyms and keep their case
        assert_eq!(Error::lowerize(String::from("IO error")), "IO error");
        assert_eq!(Error::lowerize(String::new()), "");
    }

    #[test]
    fn cycle_path_closes_loop() {
        let cycle = CyclePath::new(vec![PathBuf::from("/a.vhd"), PathBuf::from("/b.vhd")]);
        assert_eq!(cycle.to_string(), "  /a.vhd ->\n  /b.vhd ->\n  /a.vhd");
    }

    #[test]
    fn fatality() {
        let mut list = DiagnosticList::new();
        assert_eq!(list.has_fatal(), false);
        list.push(Diagnostic::warning(Error::EmptyDiscovery));
        assert_eq!(list.has_fatal(), false);
        list.push(Diagnostic::fatal(Error::Custom(String::from("boom"))));
        assert_eq!(list.has_fatal(), true);
        assert_eq!(list.len(), 2);
    }
}
