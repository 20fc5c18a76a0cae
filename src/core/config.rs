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

use crate::core::discover::{self, Include};
use crate::core::index::{Query, UnitIndex};
use crate::core::resolver::{Outcome, Resolver};
use crate::core::source::{IncludeMode, ResolveContext};
use crate::core::style;
use crate::core::version::VhdlVersion;
use crate::core::vhdl::token::Identifier;
use crate::error::{Diagnostic, DiagnosticList};
use crate::util::anyerror::{AnyError, Fault};
use serde_derive::Deserialize;
use std::ffi::OsStr;
use std::path::PathBuf;
use std::str::FromStr;

/// Additional include roots appended from the environment, separated by the
/// platform's path separator.
pub const INCLUDE_PATH_ENV: &str = "VHDLORDER_INCLUDE_PATH";

/// The default glob matched against provided entity names to pick tops.
pub const DEFAULT_TOP_PATTERN: &str = "*_tc";

/// A full description of one dependency-resolution run: where to look, what
/// to elaborate, and under which language/tool constraints.
pub struct Project {
    includes: Vec<Include>,
    tops: Vec<glob::Pattern>,
    desired_version: VhdlVersion,
    required_version: Option<VhdlVersion>,
    context: ResolveContext,
    external_libraries: Vec<Identifier>,
    style_as_warnings: bool,
}

impl Project {
    pub fn new() -> Self {
        Self {
            includes: Vec::new(),
            tops: Vec::new(),
            desired_version: VhdlVersion::V2008,
            required_version: None,
            context: ResolveContext::Simulation,
            external_libraries: Vec::new(),
            style_as_warnings: false,
        }
    }

    /// Appends an inclusion directive.
    pub fn include(mut self, inc: Include) -> Self {
        self.includes.push(inc);
        self
    }

    /// Appends a glob matched against entity names to pick top units.
    ///
    /// Without any explicit pattern the default `*_tc` applies.
    pub fn top(mut self, pattern: &str) -> Result<Self, glob::PatternError> {
        self.tops.push(glob::Pattern::new(pattern)?);
        Ok(self)
    }

    /// Sets the preferred VHDL revision for provider selection.
    pub fn desired_version(mut self, v: VhdlVersion) -> Self {
        self.desired_version = v;
        self
    }

    /// Pins the resolution to exactly the given revision.
    pub fn required_version(mut self, v: VhdlVersion) -> Self {
        self.required_version = Some(v);
        self
    }

    /// Sets the tool context (simulation by default).
    pub fn context(mut self, ctx: ResolveContext) -> Self {
        self.context = ctx;
        self
    }

    /// Declares a library satisfied by fiat, like `ieee` and `std`.
    pub fn external_library(mut self, lib: Identifier) -> Self {
        self.external_libraries.push(lib);
        self
    }

    /// Demotes strict-mode style violations from errors to warnings.
    pub fn style_as_warnings(mut self, b: bool) -> Self {
        self.style_as_warnings = b;
        self
    }

    /// Runs the whole pipeline: discover, parse, style-check, index, resolve.
    ///
    /// Each stage runs to completion before its findings are surfaced, so a
    /// failing run reports everything it found at once. A fatal diagnostic
    /// anywhere suppresses the compile orders.
    pub fn resolve(&self) -> Result<Outcome, DiagnosticList> {
        let mut diags = DiagnosticList::new();

        // [1] expand the directives (plus the environment's) into files
        let mut includes: Vec<Include> = Vec::new();
        includes.extend(self.includes.iter().map(|i| i.clone()));
        if let Some(value) = std::env::var_os(INCLUDE_PATH_ENV) {
            includes.extend(includes_from_env_value(&value));
        }
        let (mut files, mut found_diags) = match discover::discover(&includes) {
            Ok(result) => result,
            Err(e) => {
                diags.push(Diagnostic::fatal(e));
                return Err(diags);
            }
        };
        diags.append(&mut found_diags);

        // [2] scan every file; filesystem failures abort immediately
        if let Err(e) = discover::parse_all(&mut files) {
            diags.push(Diagnostic::fatal(e));
            return Err(diags);
        }

        // [3] style rules for strict files
        let mut style_diags = style::check(&files, self.style_as_warnings);
        diags.append(&mut style_diags);

        // [4] build the unit index
        let (index, mut index_diags) = UnitIndex::build(&files);
        diags.append(&mut index_diags);
        if diags.has_fatal() == true {
            return Err(diags);
        }

        // [5] trace from the tops and linearize
        let resolver = Resolver::new(&files, &index, self.to_query(), &self.external_libraries);
        match resolver.resolve(&self.effective_tops()) {
            Ok(outcome) => {
                let (orders, mut warnings) = outcome.into_parts();
                diags.append(&mut warnings);
                Ok(Outcome::new(orders, diags))
            }
            Err(mut e) => {
                diags.append(&mut e);
                Err(diags)
            }
        }
    }

    /// Derives the index query from the version options.
    fn to_query(&self) -> Query {
        match self.required_version {
            Some(required) => Query::new(self.context, required, true),
            None => Query::new(self.context, self.desired_version, false),
        }
    }

    fn effective_tops(&self) -> Vec<glob::Pattern> {
        match self.tops.is_empty() {
            true => vec![glob::Pattern::new(DEFAULT_TOP_PATTERN).unwrap()],
            false => self.tops.clone(),
        }
    }

    /// Loads a project description from a TOML file, resolving relative
    /// include roots against the file's directory.
    pub fn from_file(path: &PathBuf) -> Result<Self, Fault> {
        let text = std::fs::read_to_string(&path)?;
        let mut project = Self::from_str(&text)?;
        if let Some(base) = path.parent() {
            let base = base.to_path_buf();
            project.includes.iter_mut().for_each(|i| i.rebase(&base));
        }
        Ok(project)
    }
}

/// Interprets a path-separator-delimited environment value as recursive
/// normal-mode includes.
pub fn includes_from_env_value(value: &OsStr) -> Vec<Include> {
    std::env::split_paths(value)
        .filter(|p| p.as_os_str().is_empty() == false)
        .map(|p| Include::new(p))
        .collect()
}

#[derive(Deserialize, Debug, PartialEq)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct ProjectFile {
    project: Option<ProjectTable>,
    include: Option<Vec<IncludeTable>>,
}

#[derive(Deserialize, Debug, PartialEq)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct ProjectTable {
    desired_version: Option<u16>,
    required_version: Option<u16>,
    context: Option<String>,
    external_libraries: Option<Vec<String>>,
    tops: Option<Vec<String>>,
    style_as_warnings: Option<bool>,
}

#[derive(Deserialize, Debug, PartialEq)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct IncludeTable {
    path: String,
    recursive: Option<bool>,
    mode: Option<String>,
    library: Option<String>,
    pattern: Option<String>,
}

impl FromStr for Project {
    type Err = AnyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw: ProjectFile =
            toml::from_str(s).map_err(|e| AnyError(e.to_string().trim().to_string()))?;

        let mut project = Project::new();
        if let Some(table) = raw.project {
            if let Some(v) = table.desired_version {
                project.desired_version = VhdlVersion::from_str(&v.to_string())
                    .map_err(|e| AnyError(e.to_string()))?;
            }
            if let Some(v) = table.required_version {
                project.required_version = Some(
                    VhdlVersion::from_str(&v.to_string()).map_err(|e| AnyError(e.to_string()))?,
                );
            }
            if let Some(ctx) = table.context {
                project.context = match ctx.as_ref() {
                    "simulation" => ResolveContext::Simulation,
                    "synthesis" => ResolveContext::Synthesis,
                    _ => return Err(AnyError(format!("unknown context '{}'", ctx))),
                };
            }
            for lib in table.external_libraries.unwrap_or(Vec::new()) {
                project.external_libraries
                    .push(Identifier::from_str(&lib).map_err(|e| AnyError(e.to_string()))?);
            }
            for pattern in table.tops.unwrap_or(Vec::new()) {
                project.tops.push(
                    glob::Pattern::new(&pattern).map_err(|e| AnyError(e.to_string()))?,
                );
            }
            if let Some(b) = table.style_as_warnings {
                project.style_as_warnings = b;
            }
        }
        for entry in raw.include.unwrap_or(Vec::new()) {
            let mut inc = Include::new(entry.path);
            if let Some(r) = entry.recursive {
                inc = inc.recursive(r);
            }
            if let Some(mode) = entry.mode {
                inc = inc.mode(match mode.as_ref() {
                    "normal" => IncludeMode::Normal,
                    "strict" => IncludeMode::Strict,
                    "black-box" | "blackbox" => IncludeMode::BlackBox,
                    "top" => IncludeMode::Top,
                    _ => return Err(AnyError(format!("unknown include mode '{}'", mode))),
                });
            }
            if let Some(lib) = entry.library {
                inc = inc.library(Identifier::from_str(&lib).map_err(|e| AnyError(e.to_string()))?);
            }
            if let Some(pattern) = entry.pattern {
                inc = inc.pattern(&pattern).map_err(|e| AnyError(e.to_string()))?;
            }
            project.includes.push(inc);
        }
        Ok(project)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn parse_project_file() {
        let s = r#"
[project]
desired-version = 1993
context = "synthesis"
external-libraries = ["unisim"]
tops = ["*_tb"]

[[include]]
path = "rtl"
mode = "strict"
library = "gates"

[[include]]
path = "sim"
recursive = false
"#;
        let project = Project::from_str(s).unwrap();
        assert_eq!(project.desired_version, VhdlVersion::V1993);
        assert_eq!(project.required_version, None);
        assert_eq!(project.context, ResolveContext::Synthesis);
        assert_eq!(project.external_libraries.len(), 1);
        assert_eq!(project.tops.len(), 1);
        assert_eq!(project.includes.len(), 2);
    }

    #[test]
    fn reject_unknown_keys() {
        let s = "[project]\nbogus = 1\n";
        assert_eq!(Project::from_str(s).is_err(), true);

        let s = "[project]\ndesired-version = 1881\n";
        assert_eq!(Project::from_str(s).is_err(), true);
    }

    #[test]
    fn env_value_expansion() {
        let joined = std::env::join_paths([
            PathBuf::from("/a/rtl"),
            PathBuf::from("/b/sim"),
        ])
        .unwrap();
        let includes = includes_from_env_value(&joined);
        assert_eq!(includes.len(), 2);
        assert_eq!(includes[0].get_root(), &PathBuf::from("/a/rtl"));
    }

    #[test]
    fn full_pipeline() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("a_pkg.vhd"),
            "package a_pkg is end package;",
        )
        .unwrap();
        fs::write(
            dir.path().join("b_tc.vhd"),
            "use work.a_pkg.all; entity b_tc is end entity;",
        )
        .unwrap();

        let project = Project::new().include(Include::new(dir.path()));
        let outcome = project.resolve().unwrap();
        assert_eq!(outcome.get_orders().len(), 1);
        let order = &outcome.get_orders()[0];
        assert_eq!(order.get_steps().len(), 2);
        assert_eq!(order.get_steps()[0].get_path().ends_with("a_pkg.vhd"), true);
        assert_eq!(order.get_steps()[1].get_path().ends_with("b_tc.vhd"), true);
    }

    #[test]
    fn resolving_a_resolved_order_is_idempotent() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("a_pkg.vhd"),
            "package a_pkg is end package;",
        )
        .unwrap();
        fs::write(
            dir.path().join("b_tc.vhd"),
            "use work.a_pkg.all; entity b_tc is end entity;",
        )
        .unwrap();

        let first = Project::new()
            .include(Include::new(dir.path()))
            .resolve()
            .unwrap();
        let order = &first.get_orders()[0];

        // feed the emitted files back in, as single-file directives in order
        let mut again = Project::new();
        for step in order.get_steps() {
            again = again.include(Include::new(step.get_path().clone()));
        }
        let second = again.resolve().unwrap();
        assert_eq!(second.get_orders(), first.get_orders());
    }

    #[test]
    fn strict_style_fails_pipeline() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("u.vhd"), "package util is end package;").unwrap();
        fs::write(dir.path().join("u_tc.vhd"), "entity u_tc is end entity;").unwrap();

        let project = Project::new().include(Include::new(dir.path()).mode(IncludeMode::Strict));
        assert_eq!(project.resolve().is_err(), true);

        // the same set succeeds when style findings are demoted
        let project = Project::new()
            .include(Include::new(dir.path()).mode(IncludeMode::Strict))
            .style_as_warnings(true);
        let outcome = project.resolve().unwrap();
        assert_eq!(outcome.get_warnings().is_empty(), false);
    }
}
