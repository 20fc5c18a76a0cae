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

use crate::core::source::SourceFile;
use crate::core::unit::DesignUnit;
use crate::error::{Diagnostic, DiagnosticList, Error, Hint};
use crate::util::strcmp;

/// Checks every strict-mode file against the style rules.
///
/// The rules are: (1) exactly one entity or exactly one package per file,
/// (2) package names carry the `_pkg` suffix, (3) the filename stem matches
/// the primary unit's name. Violations are fatal unless `as_warnings` demotes
/// them.
pub fn check(files: &Vec<SourceFile>, as_warnings: bool) -> DiagnosticList {
    let mut diags = DiagnosticList::new();
    let report = |e: Error| match as_warnings {
        true => Diagnostic::warning(e),
        false => Diagnostic::fatal(e),
    };

    for file in files.iter().filter(|f| f.is_strict() == true) {
        let entities: Vec<&DesignUnit> = file
            .get_provides()
            .iter()
            .filter(|u| matches!(u, DesignUnit::Entity { .. }))
            .collect();
        let packages: Vec<&DesignUnit> = file
            .get_provides()
            .iter()
            .filter(|u| matches!(u, DesignUnit::Package { .. }))
            .collect();

        // (1) one entity or one package, never both, never several
        let primary = match (entities.len(), packages.len()) {
            (1, 0) => entities.first().unwrap(),
            (0, 1) => packages.first().unwrap(),
            (e, p) => {
                diags.push(report(Error::StyleOneUnit(
                    file.get_path().clone(),
                    e,
                    p,
                    Hint::SplitUnits,
                )));
                continue;
            }
        };

        // (2) packages advertise themselves through their suffix
        if let DesignUnit::Package { name, .. } = primary {
            if strcmp::ends_with_ignore_case(&name.to_string(), "_pkg") == false {
                diags.push(report(Error::StylePackageSuffix(
                    file.get_path().clone(),
                    name.to_string(),
                )));
            }
        }

        // (3) the filename stem names the primary unit
        if strcmp::cmp_ignore_case(file.get_stem(), primary.get_name().as_str()) == false {
            diags.push(report(Error::StyleFilenameMismatch(
                file.get_path().clone(),
                primary.get_name().to_string(),
            )));
        }
    }
    diags
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::core::source::{IncludeMode, SourceContext};
    use crate::core::version::VersionSet;
    use crate::core::vhdl::token::Identifier;
    use std::path::PathBuf;
    use std::str::FromStr;

    fn strict_file(stem: &str, code: &str) -> SourceFile {
        let mut f = SourceFile::new(
            PathBuf::from(format!("/proj/{}.vhd", stem)),
            stem.to_string(),
            Identifier::from_str("work").unwrap(),
            VersionSet::new(),
            SourceContext::Universal,
            IncludeMode::Strict,
        );
        f.load_source(code);
        f
    }

    #[test]
    fn conforming_entity_file() {
        let files = vec![strict_file(
            "alu",
            "entity alu is end entity; architecture rtl of alu is begin end;",
        )];
        assert_eq!(check(&files, false).is_empty(), true);
    }

    #[test]
    fn conforming_package_file() {
        let files = vec![strict_file(
            "util_pkg",
            "package util_pkg is end package; package body util_pkg is end;",
        )];
        assert_eq!(check(&files, false).is_empty(), true);
    }

    #[test]
    fn too_many_units() {
        let files = vec![strict_file(
            "alu",
            "entity alu is end entity; entity alu2 is end entity;",
        )];
        let diags = check(&files, false);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags.has_fatal(), true);
    }

    #[test]
    fn entity_and_package_violate() {
        let files = vec![strict_file(
            "alu",
            "package alu_pkg is end package; entity alu is end entity;",
        )];
        assert_eq!(check(&files, false).len(), 1);
    }

    #[test]
    fn missing_pkg_suffix() {
        let files = vec![strict_file("util", "package util is end package;")];
        let diags = check(&files, false);
        assert_eq!(diags.len(), 1);
        match diags.iter().next().unwrap().get_error() {
            Error::StylePackageSuffix(_, name) => assert_eq!(name, "util"),
            e => panic!("unexpected diagnostic {:?}", e),
        }
    }

    #[test]
    fn filename_must_match_unit() {
        let files = vec![strict_file("top", "entity alu is end entity;")];
        let diags = check(&files, false);
        assert_eq!(diags.len(), 1);
        match diags.iter().next().unwrap().get_error() {
            Error::StyleFilenameMismatch(_, name) => assert_eq!(name, "alu"),
            e => panic!("unexpected diagnostic {:?}", e),
        }
        // matching is case-insensitive
        let files = vec![strict_file("ALU", "entity alu is end entity;")];
        assert_eq!(check(&files, false).is_empty(), true);
    }

    #[test]
    fn non_strict_files_are_exempt() {
        let mut f = SourceFile::new(
            PathBuf::from("/proj/top.vhd"),
            String::from("top"),
            Identifier::from_str("work").unwrap(),
            VersionSet::new(),
            SourceContext::Universal,
            IncludeMode::Normal,
        );
        f.load_source("entity alu is end entity; entity b is end entity;");
        assert_eq!(check(&vec![f], false).is_empty(), true);
    }

    #[test]
    fn demoted_to_warnings() {
        let files = vec![strict_file("util", "package util is end package;")];
        let diags = check(&files, true);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags.has_fatal(), false);
    }
}
