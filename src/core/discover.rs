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

use crate::core::source::{IncludeMode, SourceContext, SourceFile};
use crate::core::version::{VersionSet, VhdlVersion};
use crate::core::vhdl::token::Identifier;
use crate::error::{Diagnostic, DiagnosticList, Error, LastError};
use crate::util::filesystem;
use crate::util::strcmp;
use ignore::Walk;
use std::collections::HashMap;
use std::path::PathBuf;

/// One inclusion directive: a root to expand into candidate files.
#[derive(Debug, Clone)]
pub struct Include {
    root: PathBuf,
    recursive: bool,
    pattern: Option<glob::Pattern>,
    mode: IncludeMode,
    library: Identifier,
}

impl Include {
    /// Creates a new directive rooted at `root` with recursive expansion,
    /// normal mode, the default filename patterns, and the `work` library.
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self {
            root: root.into(),
            recursive: true,
            pattern: None,
            mode: IncludeMode::Normal,
            library: Identifier::new_working(),
        }
    }

    /// Sets whether directories are walked recursively.
    pub fn recursive(mut self, b: bool) -> Self {
        self.recursive = b;
        self
    }

    /// Sets the inclusion mode.
    pub fn mode(mut self, m: IncludeMode) -> Self {
        self.mode = m;
        self
    }

    /// Sets the target library for matched files.
    pub fn library(mut self, lib: Identifier) -> Self {
        self.library = lib;
        self
    }

    /// Overrides the default `*.vhd`/`*.vhdl` filename patterns.
    pub fn pattern(mut self, p: &str) -> Result<Self, glob::PatternError> {
        self.pattern = Some(glob::Pattern::new(p)?);
        Ok(self)
    }

    pub fn get_root(&self) -> &PathBuf {
        &self.root
    }

    /// Anchors a relative root underneath `base`.
    pub fn rebase(&mut self, base: &PathBuf) -> () {
        if self.root.is_relative() == true {
            self.root = base.join(&self.root);
        }
    }

    pub fn get_mode(&self) -> &IncludeMode {
        &self.mode
    }

    /// Checks if the given filename belongs to this directive's file set.
    fn matches(&self, file_name: &str) -> bool {
        match &self.pattern {
            Some(p) => {
                let opts = glob::MatchOptions {
                    case_sensitive: false,
                    require_literal_separator: false,
                    require_literal_leading_dot: false,
                };
                p.matches_with(file_name, opts)
            }
            None => is_vhdl(file_name),
        }
    }
}

/// Checks if the filename carries a VHDL extension.
pub fn is_vhdl(file_name: &str) -> bool {
    strcmp::ends_with_ignore_case(file_name, ".vhd")
        || strcmp::ends_with_ignore_case(file_name, ".vhdl")
}

/// Splits a filename into its stem and its dot-separated tags.
///
/// Every segment except the first (stem) and last (extension) is a tag. Tags
/// shaped like two digits select a compatible VHDL revision; `sim`/`syn`
/// restrict the tool context; anything else is reserved and skipped.
pub fn parse_tags(file_name: &str) -> (String, VersionSet, SourceContext) {
    let parts: Vec<&str> = file_name.split('.').collect();
    let stem = parts.first().unwrap_or(&"").to_string();
    let mut versions = VersionSet::new();
    let mut sim = false;
    let mut syn = false;
    if parts.len() > 2 {
        for tag in &parts[1..parts.len() - 1] {
            if let Some(version) = VhdlVersion::from_tag(tag) {
                versions.insert(version);
            } else if VhdlVersion::is_tag(tag) == true {
                // a reserved two-digit tag; silently skip
            } else if strcmp::cmp_ignore_case(tag, "sim") == true {
                sim = true;
            } else if strcmp::cmp_ignore_case(tag, "syn") == true {
                syn = true;
            }
        }
    }
    let context = match (sim, syn) {
        (true, false) => SourceContext::SimOnly,
        (false, true) => SourceContext::SynOnly,
        // both or neither restricts nothing
        _ => SourceContext::Universal,
    };
    (stem, versions, context)
}

/// Expands the ordered `includes` directives into the candidate file set.
///
/// The same file may be matched by several directives: the strongest mode
/// wins, while the library of the first matching directive sticks (later
/// conflicting assignments are warned about). A missing root is fatal.
pub fn discover(includes: &Vec<Include>) -> Result<(Vec<SourceFile>, DiagnosticList), Error> {
    let mut warnings = DiagnosticList::new();
    let mut table: HashMap<PathBuf, SourceFile> = HashMap::new();

    for inc in includes {
        let root = filesystem::to_absolute(inc.root.clone())
            .map_err(|e| Error::IoFailure(inc.root.clone(), LastError(e.to_string())))?;
        if root.exists() == false {
            return Err(Error::IoFailure(
                root,
                LastError(String::from("path does not exist")),
            ));
        }
        for path in expand_root(&root, inc.recursive)? {
            let file_name = match path.file_name().and_then(|s| s.to_str()) {
                Some(name) => name.to_string(),
                None => continue,
            };
            // a root given as a file bypasses the filename pattern
            if root.is_file() == false && inc.matches(&file_name) == false {
                continue;
            }
            match table.get_mut(&path) {
                Some(existing) => {
                    existing.escalate_mode(*inc.get_mode());
                    if existing.get_library() != &inc.library {
                        warnings.push(Diagnostic::warning(Error::LibraryConflict(
                            path.clone(),
                            existing.get_library().to_string(),
                            inc.library.to_string(),
                        )));
                    }
                }
                None => {
                    let (stem, versions, context) = parse_tags(&file_name);
                    table.insert(
                        path.clone(),
                        SourceFile::new(
                            path,
                            stem,
                            inc.library.clone(),
                            versions,
                            context,
                            *inc.get_mode(),
                        ),
                    );
                }
            }
        }
    }

    if table.is_empty() == true {
        warnings.push(Diagnostic::warning(Error::EmptyDiscovery));
    }

    // sort by path for reproducibility purposes
    let mut files: Vec<SourceFile> = table.into_values().collect();
    files.sort_by(|a, b| a.get_path().cmp(b.get_path()));
    Ok((files, warnings))
}

/// Expands a single root into its concrete file list.
fn expand_root(root: &PathBuf, recursive: bool) -> Result<Vec<PathBuf>, Error> {
    if root.is_file() == true {
        return Ok(vec![root.clone()]);
    }
    let mut paths = match recursive {
        // walks the directory while honoring ignore files
        true => Walk::new(root)
            .filter_map(|result| match result {
                Ok(entry) => match entry.path().is_file() {
                    true => Some(entry.into_path()),
                    false => None,
                },
                Err(_) => None,
            })
            .collect::<Vec<PathBuf>>(),
        // only the immediate files
        false => std::fs::read_dir(root)
            .map_err(|e| Error::IoFailure(root.clone(), LastError(e.to_string())))?
            .filter_map(|result| match result {
                Ok(entry) => match entry.path().is_file() {
                    true => Some(entry.path()),
                    false => None,
                },
                Err(_) => None,
            })
            .collect::<Vec<PathBuf>>(),
    };
    paths.sort();
    Ok(paths)
}

/// Reads and scans every discovered file.
///
/// Filesystem errors abort immediately; lexical anomalies are collected on
/// each file record instead.
pub fn parse_all(files: &mut Vec<SourceFile>) -> Result<(), Error> {
    for file in files {
        file.parse()
            .map_err(|e| Error::IoFailure(file.get_path().clone(), LastError(e.to_string())))?;
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use std::fs;
    use std::str::FromStr;
    use tempfile::tempdir;

    fn iden(s: &str) -> Identifier {
        Identifier::from_str(s).unwrap()
    }

    #[test]
    fn filename_tags() {
        let (stem, versions, context) = parse_tags("ram.08.vhd");
        assert_eq!(stem, "ram");
        assert_eq!(versions.contains(&VhdlVersion::V2008), true);
        assert_eq!(versions.contains(&VhdlVersion::V1993), false);
        assert_eq!(context, SourceContext::Universal);

        let (stem, versions, context) = parse_tags("ram.93.08.sim.vhd");
        assert_eq!(stem, "ram");
        assert_eq!(versions.contains(&VhdlVersion::V1993), true);
        assert_eq!(versions.contains(&VhdlVersion::V2008), true);
        assert_eq!(context, SourceContext::SimOnly);

        // both contexts cancel out
        let (_, _, context) = parse_tags("ram.sim.syn.vhd");
        assert_eq!(context, SourceContext::Universal);

        // reserved tags are skipped without effect
        let (stem, versions, _) = parse_tags("ram.77.foo.vhdl");
        assert_eq!(stem, "ram");
        assert_eq!(versions.is_universal(), true);

        // no tags at all
        let (stem, versions, context) = parse_tags("ram.vhd");
        assert_eq!(stem, "ram");
        assert_eq!(versions.is_universal(), true);
        assert_eq!(context, SourceContext::Universal);
    }

    #[test]
    fn vhdl_extensions() {
        assert_eq!(is_vhdl("top.vhd"), true);
        assert_eq!(is_vhdl("top.VHDL"), true);
        assert_eq!(is_vhdl("top.v"), false);
        assert_eq!(is_vhdl("top.vhd.bak"), false);
    }

    #[test]
    fn discovers_recursively() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("a.vhd"), "entity a is end;").unwrap();
        fs::write(dir.path().join("nested/b.vhdl"), "entity b is end;").unwrap();
        fs::write(dir.path().join("notes.txt"), "skip me").unwrap();

        let includes = vec![Include::new(dir.path())];
        let (files, warnings) = discover(&includes).unwrap();
        assert_eq!(files.len(), 2);
        assert_eq!(warnings.is_empty(), true);

        // non-recursive keeps only the immediate files
        let includes = vec![Include::new(dir.path()).recursive(false)];
        let (files, _) = discover(&includes).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].get_stem(), "a");
    }

    #[test]
    fn strongest_mode_wins_first_library_sticks() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.vhd"), "entity a is end;").unwrap();

        let includes = vec![
            Include::new(dir.path()).library(iden("gates")),
            Include::new(dir.path())
                .mode(IncludeMode::BlackBox)
                .library(iden("other")),
        ];
        let (files, warnings) = discover(&includes).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].get_library(), &iden("gates"));
        assert_eq!(files[0].is_black_box(), true);
        // the conflicting library assignment is diagnosed
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings.has_fatal(), false);
    }

    #[test]
    fn missing_root_is_fatal() {
        let result = discover(&vec![Include::new("/definitely/not/here")]);
        assert_eq!(result.is_err(), true);
    }

    #[test]
    fn empty_discovery_warns() {
        let dir = tempdir().unwrap();
        let (files, warnings) = discover(&vec![Include::new(dir.path())]).unwrap();
        assert_eq!(files.len(), 0);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings.has_fatal(), false);
    }

    #[test]
    fn file_root_bypasses_pattern() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("weird.ext");
        fs::write(&path, "entity a is end;").unwrap();
        let (files, _) = discover(&vec![Include::new(path)]).unwrap();
        assert_eq!(files.len(), 1);
    }

    #[test]
    fn custom_pattern() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a_tc.vhd"), "").unwrap();
        fs::write(dir.path().join("a.vhd"), "").unwrap();
        let includes = vec![Include::new(dir.path()).pattern("*_tc.vhd").unwrap()];
        let (files, _) = discover(&includes).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].get_stem(), "a_tc");
    }
}
