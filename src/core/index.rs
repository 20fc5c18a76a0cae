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

use crate::core::source::{ResolveContext, SourceFile};
use crate::core::unit::{DesignUnit, UnitKey, UnitKind};
use crate::core::version::VhdlVersion;
use crate::core::vhdl::token::Identifier;
use crate::error::{Diagnostic, DiagnosticList, Error, Hint, LastError};
use crate::util::filesystem;
use std::collections::HashMap;
use std::path::PathBuf;

/// Points at the design unit `unit` within the file at position `file` of the
/// discovered file list.
#[derive(Debug, PartialEq, Clone, Copy)]
pub struct Provider {
    file: usize,
    unit: usize,
}

impl Provider {
    pub fn get_file_index(&self) -> usize {
        self.file
    }

    /// References the design unit behind this provider.
    pub fn get_unit<'a>(&self, files: &'a Vec<SourceFile>) -> &'a DesignUnit {
        &files[self.file].get_provides()[self.unit]
    }
}

/// The parameters one resolution selects providers under.
#[derive(Debug, PartialEq, Clone, Copy)]
pub struct Query {
    context: ResolveContext,
    requested: VhdlVersion,
    /// an exact revision requirement forbids the version-range fallback
    pinned: bool,
}

impl Query {
    pub fn new(context: ResolveContext, requested: VhdlVersion, pinned: bool) -> Self {
        Self {
            context: context,
            requested: requested,
            pinned: pinned,
        }
    }

    pub fn get_context(&self) -> &ResolveContext {
        &self.context
    }

    pub fn get_requested(&self) -> &VhdlVersion {
        &self.requested
    }
}

/// Maps every case-folded (library, kind, name) tuple to the files providing
/// it. Built once after parsing; read-only afterwards.
#[derive(Debug, PartialEq)]
pub struct UnitIndex {
    map: HashMap<UnitKey, Vec<Provider>>,
    /// units whose providers were dropped because their file failed to scan
    dropped: HashMap<UnitKey, PathBuf>,
}

impl UnitIndex {
    /// Builds the index over all parsed `files`.
    ///
    /// Files with lexical anomalies contribute no providers; their units are
    /// remembered so later unresolved references can point at the cause.
    /// Overlapping duplicate providers are diagnosed here as fatal.
    pub fn build(files: &Vec<SourceFile>) -> (Self, DiagnosticList) {
        let mut diags = DiagnosticList::new();
        let mut map: HashMap<UnitKey, Vec<Provider>> = HashMap::new();
        let mut dropped: HashMap<UnitKey, PathBuf> = HashMap::new();

        for (i, file) in files.iter().enumerate() {
            if file.has_anomalies() == true {
                for anomaly in file.get_anomalies() {
                    diags.push(Diagnostic::warning(Error::ParseAnomaly(
                        file.get_path().clone(),
                        anomaly.locate().clone(),
                        LastError(anomaly.as_err().to_string()),
                    )));
                }
                for unit in file.get_provides() {
                    dropped.insert(unit.to_key(file.get_library()), file.get_path().clone());
                }
                continue;
            }
            for (j, unit) in file.get_provides().iter().enumerate() {
                map.entry(unit.to_key(file.get_library()))
                    .or_insert(Vec::new())
                    .push(Provider { file: i, unit: j });
            }
        }

        let index = Self {
            map: map,
            dropped: dropped,
        };
        index.check_duplicates(files, &mut diags);
        (index, diags)
    }

    /// Diagnoses pairs of distinct files providing the same unit for
    /// overlapping contexts and version sets.
    fn check_duplicates(&self, files: &Vec<SourceFile>, diags: &mut DiagnosticList) -> () {
        // iterate the keys in a stable order for reproducible reporting
        let mut keys: Vec<&UnitKey> = self.map.keys().collect();
        keys.sort_by_key(|k| k.to_string().to_lowercase());

        for key in keys {
            let providers = self.map.get(key).unwrap();
            for (x, a) in providers.iter().enumerate() {
                for b in &providers[x + 1..] {
                    let fa = &files[a.get_file_index()];
                    let fb = &files[b.get_file_index()];
                    // the same path defining a unit twice is not a conflict
                    if fa.get_path() == fb.get_path() {
                        continue;
                    }
                    // architectures of one entity conflict only on equal names
                    if key.get_kind() == &UnitKind::Architecture
                        && a.get_unit(files).get_name() != b.get_unit(files).get_name()
                    {
                        continue;
                    }
                    if fa.get_context().overlaps(fb.get_context()) == true
                        && fa.get_versions().overlaps(fb.get_versions()) == true
                    {
                        diags.push(Diagnostic::fatal(Error::DuplicateProvider(
                            key.to_string(),
                            fa.get_path().clone(),
                            fb.get_path().clone(),
                            Hint::ResolveDuplicates,
                        )));
                    }
                }
            }
        }
    }

    /// References all providers for `key`, regardless of eligibility.
    pub fn get(&self, key: &UnitKey) -> Option<&Vec<Provider>> {
        self.map.get(key)
    }

    /// Checks if a provider for `key` was dropped due to parse anomalies.
    pub fn get_dropped(&self, key: &UnitKey) -> Option<&PathBuf> {
        self.dropped.get(key)
    }

    /// Selects at most one provider for `key` under the query's context and
    /// version preference.
    ///
    /// Selection: filter by tool context, then by revision compatibility
    /// (exact match first, falling back to the permitted range when the
    /// requirement is not pinned), then prefer the highest compatible
    /// revision, a top-listed file, and finally the lexicographically first
    /// path.
    pub fn lookup(
        &self,
        files: &Vec<SourceFile>,
        key: &UnitKey,
        query: &Query,
    ) -> Option<&Provider> {
        self.select(files, self.map.get(key)?.iter().collect(), query)
    }

    /// Selects the provider for a particular architecture `arch` of the
    /// entity addressed by `key`.
    pub fn lookup_architecture(
        &self,
        files: &Vec<SourceFile>,
        key: &UnitKey,
        arch: &Identifier,
        query: &Query,
    ) -> Option<&Provider> {
        let candidates: Vec<&Provider> = self
            .map
            .get(key)?
            .iter()
            .filter(|p| p.get_unit(files).get_name() == arch)
            .collect();
        self.select(files, candidates, query)
    }

    fn select<'a>(
        &self,
        files: &Vec<SourceFile>,
        candidates: Vec<&'a Provider>,
        query: &Query,
    ) -> Option<&'a Provider> {
        // 1. filter by tool context
        let eligible: Vec<&Provider> = candidates
            .into_iter()
            .filter(|p| {
                files[p.get_file_index()]
                    .get_context()
                    .is_eligible(&query.context)
            })
            .collect();

        // 2. filter by revision compatibility
        let compatible: Vec<&Provider> = {
            let exact: Vec<&Provider> = eligible
                .iter()
                .filter(|p| {
                    files[p.get_file_index()]
                        .get_versions()
                        .contains(&query.requested)
                })
                .copied()
                .collect();
            if exact.is_empty() == true && query.pinned == false {
                eligible
                    .into_iter()
                    .filter(|p| {
                        files[p.get_file_index()]
                            .get_versions()
                            .intersects_at_most(&query.requested)
                    })
                    .collect()
            } else {
                exact
            }
        };

        // 3. order by preference and take the front
        let mut compatible = compatible;
        compatible.sort_by(|a, b| {
            let fa = &files[a.get_file_index()];
            let fb = &files[b.get_file_index()];
            // higher explicit revision first (universal ranks last)
            let va = fa.get_versions().highest_at_most(&query.requested);
            let vb = fb.get_versions().highest_at_most(&query.requested);
            vb.cmp(&va)
                // then files explicitly listed as tops
                .then(fb.is_listed_top().cmp(&fa.is_listed_top()))
                // then the stable lexicographical order on the path
                .then(
                    filesystem::into_std_str(fa.get_path().clone())
                        .cmp(&filesystem::into_std_str(fb.get_path().clone())),
                )
        });
        compatible.into_iter().next()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::core::source::{IncludeMode, SourceContext};
    use crate::core::version::VersionSet;
    use crate::core::vhdl::token::Identifier;
    use std::str::FromStr;

    fn iden(s: &str) -> Identifier {
        Identifier::from_str(s).unwrap()
    }

    fn file(path: &str, versions: &[VhdlVersion], context: SourceContext, code: &str) -> SourceFile {
        let mut set = VersionSet::new();
        for v in versions {
            set.insert(*v);
        }
        let name = PathBuf::from(path)
            .file_name()
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        let stem = name.split('.').next().unwrap().to_string();
        let mut f = SourceFile::new(
            PathBuf::from(path),
            stem,
            iden("work"),
            set,
            context,
            IncludeMode::Normal,
        );
        f.load_source(code);
        f
    }

    fn sim_query(requested: VhdlVersion) -> Query {
        Query::new(ResolveContext::Simulation, requested, false)
    }

    #[test]
    fn version_disambiguation() {
        // two providers over disjoint revisions both stay in the index
        let files = vec![
            file(
                "/p/u.08.vhd",
                &[VhdlVersion::V2008],
                SourceContext::Universal,
                "package u is end package;",
            ),
            file(
                "/p/u.93.vhd",
                &[VhdlVersion::V1993],
                SourceContext::Universal,
                "package u is end package;",
            ),
        ];
        let (index, diags) = UnitIndex::build(&files);
        assert_eq!(diags.has_fatal(), false);
        let key = UnitKey::new(iden("work"), UnitKind::Package, iden("u"));
        assert_eq!(index.get(&key).unwrap().len(), 2);

        // the requested revision picks its provider
        let hit = index
            .lookup(&files, &key, &sim_query(VhdlVersion::V2008))
            .unwrap();
        assert_eq!(hit.get_file_index(), 0);
        let hit = index
            .lookup(&files, &key, &sim_query(VhdlVersion::V1993))
            .unwrap();
        assert_eq!(hit.get_file_index(), 1);
        // an intermediate revision falls back to the highest below it
        let hit = index
            .lookup(&files, &key, &sim_query(VhdlVersion::V2002))
            .unwrap();
        assert_eq!(hit.get_file_index(), 1);
    }

    #[test]
    fn overlapping_duplicate_is_fatal() {
        let files = vec![
            file(
                "/p/a.vhd",
                &[],
                SourceContext::Universal,
                "package u is end package;",
            ),
            file(
                "/p/b.vhd",
                &[],
                SourceContext::Universal,
                "package u is end package;",
            ),
        ];
        let (_, diags) = UnitIndex::build(&files);
        assert_eq!(diags.has_fatal(), true);
    }

    #[test]
    fn sim_and_syn_providers_coexist() {
        let files = vec![
            file(
                "/p/ram.sim.vhd",
                &[],
                SourceContext::SimOnly,
                "entity ram is end entity;",
            ),
            file(
                "/p/ram.syn.vhd",
                &[],
                SourceContext::SynOnly,
                "entity ram is end entity;",
            ),
        ];
        let (index, diags) = UnitIndex::build(&files);
        assert_eq!(diags.has_fatal(), false);

        let key = UnitKey::new(iden("work"), UnitKind::Entity, iden("ram"));
        let hit = index
            .lookup(&files, &key, &sim_query(VhdlVersion::V2008))
            .unwrap();
        assert_eq!(hit.get_file_index(), 0);
        let hit = index
            .lookup(
                &files,
                &key,
                &Query::new(ResolveContext::Synthesis, VhdlVersion::V2008, false),
            )
            .unwrap();
        assert_eq!(hit.get_file_index(), 1);
    }

    #[test]
    fn pinned_revision_never_falls_back() {
        let files = vec![file(
            "/p/u.93.vhd",
            &[VhdlVersion::V1993],
            SourceContext::Universal,
            "package u is end package;",
        )];
        let (index, _) = UnitIndex::build(&files);
        let key = UnitKey::new(iden("work"), UnitKind::Package, iden("u"));
        // unpinned falls back to the permitted range
        assert_eq!(
            index
                .lookup(&files, &key, &sim_query(VhdlVersion::V2008))
                .is_some(),
            true
        );
        // pinned must match exactly
        assert_eq!(
            index
                .lookup(
                    &files,
                    &key,
                    &Query::new(ResolveContext::Simulation, VhdlVersion::V2008, true)
                )
                .is_none(),
            true
        );
    }

    #[test]
    fn anomalous_files_are_dropped() {
        let files = vec![file(
            "/p/broken.vhd",
            &[],
            SourceContext::Universal,
            "package u is end package;\nconstant s : string := \"unterminated",
        )];
        let (index, diags) = UnitIndex::build(&files);
        // dropping the file is a warning, not fatal
        assert_eq!(diags.is_empty(), false);
        assert_eq!(diags.has_fatal(), false);

        let key = UnitKey::new(iden("work"), UnitKind::Package, iden("u"));
        assert_eq!(index.get(&key).is_none(), true);
        assert_eq!(
            index.get_dropped(&key),
            Some(&PathBuf::from("/p/broken.vhd"))
        );
    }

    #[test]
    fn architecture_lookup_by_name() {
        let files = vec![
            file(
                "/p/alu.vhd",
                &[],
                SourceContext::Universal,
                "entity alu is end entity;",
            ),
            file(
                "/p/alu_fast.vhd",
                &[],
                SourceContext::Universal,
                "architecture fast of alu is begin end;",
            ),
            file(
                "/p/alu_small.vhd",
                &[],
                SourceContext::Universal,
                "architecture small of alu is begin end;",
            ),
        ];
        let (index, diags) = UnitIndex::build(&files);
        // two architectures of different names do not conflict
        assert_eq!(diags.has_fatal(), false);

        let key = UnitKey::new(iden("work"), UnitKind::Architecture, iden("alu"));
        assert_eq!(index.get(&key).unwrap().len(), 2);
        let hit = index
            .lookup_architecture(&files, &key, &iden("small"), &sim_query(VhdlVersion::V2008))
            .unwrap();
        assert_eq!(hit.get_file_index(), 2);
    }

    use std::path::PathBuf;
}
