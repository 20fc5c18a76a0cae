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

use crate::core::lexer::TokenError;
use crate::core::unit::{DesignUnit, Pragma, Requirement};
use crate::core::version::VersionSet;
use crate::core::vhdl::symbols::VhdlParser;
use crate::core::vhdl::token::{Identifier, VhdlTokenError};
use crate::util::anyerror::Fault;
use serde_derive::{Deserialize, Serialize};
use std::fmt::Display;
use std::path::PathBuf;

/// The tool context a file is restricted to by its filename tags.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum SourceContext {
    Universal,
    SimOnly,
    SynOnly,
}

/// The tool context a resolution is performed for.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ResolveContext {
    Simulation,
    Synthesis,
}

impl SourceContext {
    /// Checks if a file in this context may participate in a resolution for
    /// the given tool context `ctx`.
    pub fn is_eligible(&self, ctx: &ResolveContext) -> bool {
        match self {
            Self::Universal => true,
            Self::SimOnly => ctx == &ResolveContext::Simulation,
            Self::SynOnly => ctx == &ResolveContext::Synthesis,
        }
    }

    /// Checks if two contexts can both be active for some tool context.
    pub fn overlaps(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::SimOnly, Self::SynOnly) | (Self::SynOnly, Self::SimOnly) => false,
            _ => true,
        }
    }
}

impl Display for ResolveContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Simulation => write!(f, "simulation"),
            Self::Synthesis => write!(f, "synthesis"),
        }
    }
}

/// How a file entered the file set, ordered weakest to strongest.
///
/// When the same file is matched by several inclusion directives the
/// strongest mode wins. `Top` behaves like `Normal` except that the file's
/// entities are promoted to top candidates.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy)]
pub enum IncludeMode {
    Normal,
    Top,
    Strict,
    BlackBox,
}

impl Display for IncludeMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Normal => write!(f, "normal"),
            Self::Top => write!(f, "top"),
            Self::Strict => write!(f, "strict"),
            Self::BlackBox => write!(f, "black-box"),
        }
    }
}

/// The provided/required records of one parsed file, in a serializable shape.
#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct UnitRecords {
    pub provides: Vec<DesignUnit>,
    pub requires: Vec<Requirement>,
}

/// One candidate VHDL file, created at discovery and immutable after parsing.
///
/// Identity is the absolute `path`.
#[derive(Debug, PartialEq)]
pub struct SourceFile {
    path: PathBuf,
    /// basename with tags and extension removed
    stem: String,
    library: Identifier,
    versions: VersionSet,
    context: SourceContext,
    mode: IncludeMode,
    listed_top: bool,
    provides: Vec<DesignUnit>,
    requires: Vec<Requirement>,
    pragmas: Vec<Pragma>,
    anomalies: Vec<TokenError<VhdlTokenError>>,
}

impl SourceFile {
    pub fn new(
        path: PathBuf,
        stem: String,
        library: Identifier,
        versions: VersionSet,
        context: SourceContext,
        mode: IncludeMode,
    ) -> Self {
        Self {
            path: path,
            stem: stem,
            library: library,
            versions: versions,
            context: context,
            mode: mode,
            listed_top: mode == IncludeMode::Top,
            provides: Vec::new(),
            requires: Vec::new(),
            pragmas: Vec::new(),
            anomalies: Vec::new(),
        }
    }

    /// Reads the file from disk and scans it for design units and references.
    pub fn parse(&mut self) -> Result<(), Fault> {
        let contents = std::fs::read_to_string(&self.path)?;
        self.load_source(&contents);
        Ok(())
    }

    /// Scans the given source code `s` and stores its records on this file.
    pub fn load_source(&mut self, s: &str) -> () {
        let (provides, requires, pragmas, anomalies) = VhdlParser::read(s).into_parts();
        self.provides = provides;
        self.requires = requires;
        self.pragmas = pragmas;
        self.anomalies = anomalies;
    }

    pub fn get_path(&self) -> &PathBuf {
        &self.path
    }

    pub fn get_stem(&self) -> &str {
        &self.stem
    }

    pub fn get_library(&self) -> &Identifier {
        &self.library
    }

    pub fn get_versions(&self) -> &VersionSet {
        &self.versions
    }

    pub fn get_context(&self) -> &SourceContext {
        &self.context
    }

    pub fn get_mode(&self) -> &IncludeMode {
        &self.mode
    }

    /// Raises the inclusion mode if `mode` is stronger than the current one.
    pub fn escalate_mode(&mut self, mode: IncludeMode) -> () {
        if mode == IncludeMode::Top {
            self.listed_top = true;
        }
        if mode > self.mode {
            self.mode = mode;
        }
    }

    pub fn is_strict(&self) -> bool {
        self.mode == IncludeMode::Strict
    }

    pub fn is_black_box(&self) -> bool {
        self.mode == IncludeMode::BlackBox
    }

    /// Checks if the file was explicitly listed as a top candidate.
    pub fn is_listed_top(&self) -> bool {
        self.listed_top
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

    /// Checks if the tokenizer rejected any construct in this file.
    ///
    /// Files with anomalies are dropped from the unit index.
    pub fn has_anomalies(&self) -> bool {
        self.anomalies.is_empty() == false
    }

    /// Checks if a pragma marks the given requirement as satisfied.
    pub fn is_suppressed(&self, req: &Requirement) -> bool {
        self.pragmas.iter().find(|p| p.suppresses(req)).is_some()
    }

    /// References the simulation timeout literal, if a pragma set one.
    pub fn get_timeout(&self) -> Option<&String> {
        self.pragmas.iter().find_map(|p| match p {
            Pragma::Timeout(literal) => Some(literal),
            _ => None,
        })
    }

    /// Clones the provided/required records into a serializable value.
    pub fn to_records(&self) -> UnitRecords {
        UnitRecords {
            provides: self.provides.clone(),
            requires: self.requires.clone(),
        }
    }

    /// Serializes the provided/required records as a JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.to_records())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::str::FromStr;

    fn blank() -> SourceFile {
        SourceFile::new(
            PathBuf::from("/proj/rtl/alu.vhd"),
            String::from("alu"),
            Identifier::from_str("work").unwrap(),
            VersionSet::new(),
            SourceContext::Universal,
            IncludeMode::Normal,
        )
    }

    #[test]
    fn records_survive_serialization() {
        let mut file = blank();
        file.load_source(
            "library ieee;
            use ieee.std_logic_1164.all;
            use work.util_pkg.all;
            entity alu is end entity;
            architecture rtl of alu is begin
                u0 : entity work.adder(fast);
            end architecture;",
        );
        let records = file.to_records();
        let json = file.to_json().unwrap();
        let reread: UnitRecords = serde_json::from_str(&json).unwrap();
        assert_eq!(reread, records);
        // and the records are not trivially empty
        assert_eq!(records.provides.len(), 2);
        assert_eq!(records.requires.len(), 3);
    }

    #[test]
    fn mode_escalation() {
        let mut file = blank();
        file.escalate_mode(IncludeMode::Strict);
        assert_eq!(file.get_mode(), &IncludeMode::Strict);
        // weaker modes do not lower the current mode
        file.escalate_mode(IncludeMode::Normal);
        assert_eq!(file.get_mode(), &IncludeMode::Strict);
        file.escalate_mode(IncludeMode::BlackBox);
        assert_eq!(file.get_mode(), &IncludeMode::BlackBox);
        // listing as top keeps the stronger mode but remembers the listing
        assert_eq!(file.is_listed_top(), false);
        file.escalate_mode(IncludeMode::Top);
        assert_eq!(file.get_mode(), &IncludeMode::BlackBox);
        assert_eq!(file.is_listed_top(), true);
    }

    #[test]
    fn timeout_pragma_passes_through() {
        let mut file = blank();
        file.load_source(
            "-- pragma simulation timeout 2 us
            entity alu_tc is end entity;",
        );
        assert_eq!(file.get_timeout(), Some(&String::from("2 us")));
    }

    #[test]
    fn contexts() {
        assert_eq!(
            SourceContext::Universal.is_eligible(&ResolveContext::Simulation),
            true
        );
        assert_eq!(
            SourceContext::SynOnly.is_eligible(&ResolveContext::Simulation),
            false
        );
        assert_eq!(
            SourceContext::SimOnly.is_eligible(&ResolveContext::Simulation),
            true
        );
        assert_eq!(
            SourceContext::SimOnly.overlaps(&SourceContext::SynOnly),
            false
        );
        assert_eq!(
            SourceContext::Universal.overlaps(&SourceContext::SynOnly),
            true
        );
    }
}
