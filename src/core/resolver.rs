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

use crate::core::index::{Provider, Query, UnitIndex};
use crate::core::order::{self, CompileOrder};
use crate::core::source::SourceFile;
use crate::core::unit::{DesignUnit, RefKind, Requirement, UnitKey, UnitKind};
use crate::core::vhdl::token::Identifier;
use crate::error::{CyclePath, Diagnostic, DiagnosticList, Error, Hint};
use crate::util::graphmap::GraphMap;
use std::collections::{HashSet, VecDeque};
use std::path::PathBuf;

/// The successful result of a resolution: one compile order per top unit,
/// plus everything worth warning about along the way.
#[derive(Debug, PartialEq)]
pub struct Outcome {
    orders: Vec<CompileOrder>,
    warnings: DiagnosticList,
}

impl Outcome {
    pub fn new(orders: Vec<CompileOrder>, warnings: DiagnosticList) -> Self {
        Self {
            orders: orders,
            warnings: warnings,
        }
    }

    pub fn get_orders(&self) -> &Vec<CompileOrder> {
        &self.orders
    }

    pub fn get_warnings(&self) -> &DiagnosticList {
        &self.warnings
    }

    pub fn into_parts(self) -> (Vec<CompileOrder>, DiagnosticList) {
        (self.orders, self.warnings)
    }
}

/// Performs reverse reachability from the top units over the unit index.
///
/// The resolver borrows only immutable state, so independent resolutions may
/// run against the same index concurrently.
pub struct Resolver<'a> {
    files: &'a Vec<SourceFile>,
    index: &'a UnitIndex,
    query: Query,
    externals: &'a Vec<Identifier>,
}

/// Per-top working state while tracing the reference relation.
struct Trace {
    graph: GraphMap<PathBuf, usize, RefKind>,
    pending: VecDeque<usize>,
    seen: HashSet<usize>,
}

impl Trace {
    fn new() -> Self {
        Self {
            graph: GraphMap::new(),
            pending: VecDeque::new(),
            seen: HashSet::new(),
        }
    }
}

impl<'a> Resolver<'a> {
    pub fn new(
        files: &'a Vec<SourceFile>,
        index: &'a UnitIndex,
        query: Query,
        externals: &'a Vec<Identifier>,
    ) -> Self {
        Self {
            files: files,
            index: index,
            query: query,
            externals: externals,
        }
    }

    /// Computes one compile order per top entity matching the `top_patterns`
    /// globs (or living in a top-listed file).
    ///
    /// Diagnostics accumulate across all tops; a fatal finding anywhere turns
    /// the whole resolution into an `Err` carrying every diagnostic at once.
    pub fn resolve(&self, top_patterns: &Vec<glob::Pattern>) -> Result<Outcome, DiagnosticList> {
        let mut diags = DiagnosticList::new();

        let tops = self.find_tops(top_patterns);
        if tops.is_empty() == true {
            let patterns = top_patterns
                .iter()
                .map(|p| p.to_string())
                .collect::<Vec<String>>()
                .join(", ");
            diags.push(Diagnostic::fatal(Error::NoTop(patterns, Hint::TopPattern)));
            return Err(diags);
        }

        let mut orders = Vec::new();
        for (key, provider) in &tops {
            if let Some(order) = self.resolve_top(key, provider, &mut diags) {
                orders.push(order);
            }
        }

        match diags.has_fatal() {
            true => Err(diags),
            false => Ok(Outcome {
                orders: orders,
                warnings: diags,
            }),
        }
    }

    /// Collects the top entities in a stable (name, library) order and
    /// selects one provider for each.
    fn find_tops(&self, patterns: &Vec<glob::Pattern>) -> Vec<(UnitKey, Provider)> {
        let opts = glob::MatchOptions {
            case_sensitive: false,
            require_literal_separator: false,
            require_literal_leading_dot: false,
        };
        let mut keys: Vec<UnitKey> = Vec::new();
        for file in self.files {
            if file.get_context().is_eligible(self.query.get_context()) == false
                || file.has_anomalies() == true
            {
                continue;
            }
            for unit in file.get_provides() {
                if let DesignUnit::Entity { name, .. } = unit {
                    let hit = file.is_listed_top()
                        || patterns
                            .iter()
                            .find(|p| p.matches_with(&name.to_folded(), opts))
                            .is_some();
                    if hit == true {
                        let key =
                            UnitKey::new(file.get_library().clone(), UnitKind::Entity, name.clone());
                        if keys.contains(&key) == false {
                            keys.push(key);
                        }
                    }
                }
            }
        }
        keys.sort_by_key(|k| (k.get_name().to_folded(), k.get_library().to_folded()));
        keys.into_iter()
            .filter_map(|k| {
                let provider = self.index.lookup(self.files, &k, &self.query).copied();
                provider.map(|p| (k, p))
            })
            .collect()
    }

    /// Traces the full dependency closure of one top entity and linearizes it.
    ///
    /// Returns `None` when the trace produced fatal diagnostics.
    fn resolve_top(
        &self,
        key: &UnitKey,
        provider: &Provider,
        diags: &mut DiagnosticList,
    ) -> Option<CompileOrder> {
        let mut local = DiagnosticList::new();
        let mut trace = Trace::new();

        // the top-role files are the selected architectures of the top
        // entity; an entity without separate architectures carries the role
        let mut top_files: HashSet<usize> = self
            .architectures_of(key)
            .into_iter()
            .map(|p| p.get_file_index())
            .collect();
        if top_files.is_empty() == true {
            top_files.insert(provider.get_file_index());
        }

        self.enqueue(&mut trace, provider.get_file_index());
        let seeds: Vec<usize> = top_files.iter().copied().collect();
        for seed in seeds {
            self.enqueue(&mut trace, seed);
        }

        while let Some(current) = trace.pending.pop_front() {
            self.process_requirements(current, &mut trace, &mut local);
            self.complete_file(current, &mut trace);
        }

        // cycles between distinct files are always illegal; the legal
        // entity/architecture and package/body pairs inside one file never
        // form an edge in the file graph
        if let Some(cycle) = trace.graph.get_graph().find_cycle() {
            let path = cycle
                .into_iter()
                .map(|i| trace.graph.get_key_by_index(i).unwrap().clone())
                .collect();
            local.push(Diagnostic::fatal(Error::Cycle(CyclePath::new(path))));
        }

        let failed = local.has_fatal();
        diags.append(&mut local);
        if failed == true {
            return None;
        }

        match order::linearize(
            &trace.graph,
            self.files,
            &top_files,
            key.get_name().clone(),
            self.query.get_requested(),
        ) {
            Ok(order) => Some(order),
            Err(e) => {
                diags.push(Diagnostic::fatal(e));
                None
            }
        }
    }

    /// Resolves every requirement of the file at `current` into graph edges.
    fn process_requirements(&self, current: usize, trace: &mut Trace, diags: &mut DiagnosticList) {
        let consumer = &self.files[current];
        for req in consumer.get_requires() {
            if consumer.is_suppressed(req) == true {
                continue;
            }
            // `work` and missing prefixes land in the consumer's library
            let lib = match req.get_library() {
                Some(l) if l != &Identifier::new_working() => l.clone(),
                _ => consumer.get_library().clone(),
            };
            match req.get_kind() {
                RefKind::PackageUse => {
                    if self.is_external(&lib) == true {
                        continue;
                    }
                    let key = UnitKey::new(lib, UnitKind::Package, req.get_name().clone());
                    self.link(current, &key, req, trace, diags);
                }
                RefKind::EntityInstance => {
                    if self.is_external(&lib) == true {
                        continue;
                    }
                    let key =
                        UnitKey::new(lib.clone(), UnitKind::Entity, req.get_name().clone());
                    let hit = self.link(current, &key, req, trace, diags);
                    // a named architecture must also be pulled in
                    if hit == true {
                        if let Some(arch) = req.get_arch() {
                            let arch_key = UnitKey::new(
                                lib,
                                UnitKind::Architecture,
                                req.get_name().clone(),
                            );
                            match self.index.lookup_architecture(
                                self.files,
                                &arch_key,
                                arch,
                                &self.query,
                            ) {
                                Some(p) => {
                                    let p = *p;
                                    self.connect(current, &p, req, trace);
                                }
                                None => self.report_unresolved(current, req, &arch_key, diags),
                            }
                        }
                    }
                }
                RefKind::ConfigurationInstance => {
                    if self.is_external(&lib) == true {
                        continue;
                    }
                    let key =
                        UnitKey::new(lib, UnitKind::Configuration, req.get_name().clone());
                    self.link(current, &key, req, trace, diags);
                }
                RefKind::ArchitectureOf => {
                    let key = UnitKey::new(lib, UnitKind::Entity, req.get_name().clone());
                    self.link(current, &key, req, trace, diags);
                }
                RefKind::BodyOf => {
                    let key = UnitKey::new(lib, UnitKind::Package, req.get_name().clone());
                    self.link(current, &key, req, trace, diags);
                }
                RefKind::ComponentInstance => {
                    // try each library in scope in declaration order
                    let mut scope = vec![consumer.get_library().clone()];
                    for l in req.get_scope() {
                        if scope.contains(l) == false {
                            scope.push(l.clone());
                        }
                    }
                    let mut found = false;
                    for l in scope {
                        let key = UnitKey::new(l, UnitKind::Entity, req.get_name().clone());
                        if let Some(p) = self.index.lookup(self.files, &key, &self.query) {
                            let p = *p;
                            self.connect(current, &p, req, trace);
                            found = true;
                            break;
                        }
                    }
                    if found == false {
                        // a black box: report against the consumer's library
                        let key = UnitKey::new(
                            consumer.get_library().clone(),
                            UnitKind::Entity,
                            req.get_name().clone(),
                        );
                        self.report_unresolved(current, req, &key, diags);
                    }
                }
            }
        }
    }

    /// Pulls in the implicit companions of the units the file provides: all
    /// architectures of its entities and the bodies of its packages.
    fn complete_file(&self, current: usize, trace: &mut Trace) {
        let file = &self.files[current];
        for unit in file.get_provides() {
            match unit {
                DesignUnit::Entity { name, .. } => {
                    let key = UnitKey::new(
                        file.get_library().clone(),
                        UnitKind::Entity,
                        name.clone(),
                    );
                    for p in self.architectures_of(&key) {
                        self.enqueue(trace, p.get_file_index());
                    }
                }
                DesignUnit::Package { name, .. } => {
                    let key = UnitKey::new(
                        file.get_library().clone(),
                        UnitKind::PackageBody,
                        name.clone(),
                    );
                    if let Some(p) = self.index.lookup(self.files, &key, &self.query) {
                        self.enqueue(trace, p.get_file_index());
                    }
                }
                _ => (),
            }
        }
    }

    /// Selects one provider per distinct architecture name of the entity
    /// addressed by `key` (an entity-kind key).
    fn architectures_of(&self, key: &UnitKey) -> Vec<Provider> {
        let arch_key = UnitKey::new(
            key.get_library().clone(),
            UnitKind::Architecture,
            key.get_name().clone(),
        );
        let providers = match self.index.get(&arch_key) {
            Some(list) => list,
            None => return Vec::new(),
        };
        let mut names: Vec<&Identifier> = Vec::new();
        for p in providers {
            let name = p.get_unit(self.files).get_name();
            if names.contains(&name) == false {
                names.push(name);
            }
        }
        names
            .into_iter()
            .filter_map(|n| {
                self.index
                    .lookup_architecture(self.files, &arch_key, n, &self.query)
                    .copied()
            })
            .collect()
    }

    /// Looks up `key` and connects consumer to provider on a hit, otherwise
    /// reports the reference as unresolved. Returns whether the lookup hit.
    fn link(
        &self,
        current: usize,
        key: &UnitKey,
        req: &Requirement,
        trace: &mut Trace,
        diags: &mut DiagnosticList,
    ) -> bool {
        match self.index.lookup(self.files, key, &self.query) {
            Some(p) => {
                let p = *p;
                self.connect(current, &p, req, trace);
                true
            }
            None => {
                self.report_unresolved(current, req, key, diags);
                false
            }
        }
    }

    /// Adds the provider file to the closure and draws the dependency edge
    /// provider -> consumer.
    fn connect(&self, current: usize, provider: &Provider, req: &Requirement, trace: &mut Trace) {
        self.enqueue(trace, provider.get_file_index());
        trace.graph.add_edge_by_key(
            self.files[provider.get_file_index()].get_path(),
            self.files[current].get_path(),
            *req.get_kind(),
        );
    }

    fn enqueue(&self, trace: &mut Trace, file_index: usize) {
        if trace.seen.insert(file_index) == true {
            trace
                .graph
                .add_node(self.files[file_index].get_path().clone(), file_index);
            trace.pending.push_back(file_index);
        }
    }

    fn is_external(&self, lib: &Identifier) -> bool {
        self.externals.iter().find(|e| e == &lib).is_some()
    }

    /// Records an unresolved reference with the severity the consumer's mode
    /// grants it, pointing at a dropped provider when one explains the miss.
    fn report_unresolved(
        &self,
        current: usize,
        req: &Requirement,
        key: &UnitKey,
        diags: &mut DiagnosticList,
    ) {
        let consumer = &self.files[current];
        let error = match self.index.get_dropped(key) {
            Some(cause) => Error::UnresolvedReferenceDropped(
                req.to_string(),
                consumer.get_path().clone(),
                req.get_position().clone(),
                cause.clone(),
            ),
            None => Error::UnresolvedReference(
                req.to_string(),
                consumer.get_path().clone(),
                req.get_position().clone(),
                Hint::AllowBlackBox,
            ),
        };
        match consumer.is_black_box() {
            true => diags.push(Diagnostic::warning(error)),
            false => diags.push(Diagnostic::fatal(error)),
        }
    }
}
