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
use crate::core::unit::RefKind;
use crate::core::version::VhdlVersion;
use crate::core::vhdl::token::Identifier;
use crate::error::{CyclePath, Error};
use crate::util::filesystem;
use crate::util::graphmap::GraphMap;
use std::collections::HashSet;
use std::fmt::Display;
use std::io::Write;
use std::path::PathBuf;

/// Marks whether a compile step belongs to the initial top set or is a
/// dependency pulled in by traversal.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Role {
    Dep,
    Top,
}

impl Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Dep => write!(f, "dep"),
            Self::Top => write!(f, "top"),
        }
    }
}

/// One compile step of the emitted order.
///
/// Renders in the frozen line format: `<role> <library> <version> <path>`,
/// where the version column is the four-digit chosen revision or `----` for
/// universal files.
#[derive(Debug, PartialEq)]
pub struct CompileStep {
    role: Role,
    library: Identifier,
    version: Option<VhdlVersion>,
    path: PathBuf,
}

impl CompileStep {
    pub fn get_role(&self) -> &Role {
        &self.role
    }

    pub fn get_library(&self) -> &Identifier {
        &self.library
    }

    pub fn get_version(&self) -> Option<&VhdlVersion> {
        self.version.as_ref()
    }

    pub fn get_path(&self) -> &PathBuf {
        &self.path
    }
}

impl Display for CompileStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let version = match &self.version {
            Some(v) => v.to_string(),
            None => String::from("----"),
        };
        write!(
            f,
            "{} {} {} {}",
            self.role,
            self.library,
            version,
            filesystem::into_std_str(self.path.clone())
        )
    }
}

/// A linear compile order for one top unit, honoring the dependency partial
/// order plus the entity/architecture and package/body rules.
#[derive(Debug, PartialEq)]
pub struct CompileOrder {
    top: Identifier,
    steps: Vec<CompileStep>,
    timeout: Option<String>,
}

impl CompileOrder {
    /// References the name of the top unit this order elaborates.
    pub fn get_top(&self) -> &Identifier {
        &self.top
    }

    pub fn get_steps(&self) -> &Vec<CompileStep> {
        &self.steps
    }

    /// References the simulation timeout pragma of the top set, if any.
    pub fn get_timeout(&self) -> Option<&String> {
        self.timeout.as_ref()
    }

    /// Writes the line-oriented order to the given writer.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        write!(writer, "{}", self)
    }
}

impl Display for CompileOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut steps = self.steps.iter();
        while let Some(step) = steps.next() {
            write!(f, "{}\n", step)?;
        }
        Ok(())
    }
}

/// Linearizes the file dependency graph into a stable compile order.
///
/// Kahn-style layering: each layer of ready files is emitted in
/// (library, path) order so two runs over the same filesystem produce
/// identical output. Every edge is then re-verified against the final
/// positions; a violation means the index handed out inconsistent providers.
pub fn linearize(
    graph: &GraphMap<PathBuf, usize, RefKind>,
    files: &Vec<SourceFile>,
    top_files: &HashSet<usize>,
    top_name: Identifier,
    requested: &VhdlVersion,
) -> Result<CompileOrder, Error> {
    let n = graph.node_count();
    let inner = graph.get_graph();

    let mut indegree: Vec<usize> = (0..n).map(|i| inner.in_degree(i)).collect();
    let mut layer: Vec<usize> = (0..n).filter(|i| indegree[*i] == 0).collect();
    let mut linear: Vec<usize> = Vec::with_capacity(n);

    let sort_key = |node: &usize| -> (String, String) {
        let file = &files[*graph.get_node_by_index(*node).unwrap().as_ref()];
        (
            file.get_library().to_folded(),
            filesystem::into_std_str(file.get_path().clone()),
        )
    };

    while layer.is_empty() == false {
        layer.sort_by_key(sort_key);
        let mut next_layer: Vec<usize> = Vec::new();
        for node in layer {
            linear.push(node);
            for succ in inner.successors(node) {
                indegree[succ] -= 1;
                if indegree[succ] == 0 {
                    next_layer.push(succ);
                }
            }
        }
        layer = next_layer;
    }

    // nodes left behind can only be caught in a cycle
    if linear.len() != n {
        let cycle = inner
            .find_cycle()
            .unwrap_or(Vec::new())
            .into_iter()
            .map(|i| graph.get_key_by_index(i).unwrap().clone())
            .collect();
        return Err(Error::Cycle(CyclePath::new(cycle)));
    }

    // verify every dependency precedes its dependent
    let mut rank: Vec<usize> = vec![0; n];
    for (position, node) in linear.iter().enumerate() {
        rank[*node] = position;
    }
    for node in 0..n {
        for succ in inner.successors(node) {
            if rank[node] >= rank[succ] {
                return Err(Error::InconsistentIndex(format!(
                    "file {:?} must precede {:?}",
                    graph.get_key_by_index(node).unwrap(),
                    graph.get_key_by_index(succ).unwrap()
                )));
            }
        }
    }

    let mut timeout: Option<String> = None;
    let steps = linear
        .into_iter()
        .map(|node| {
            let file_index = *graph.get_node_by_index(node).unwrap().as_ref();
            let file = &files[file_index];
            let role = match top_files.contains(&file_index) {
                true => {
                    if timeout.is_none() {
                        timeout = file.get_timeout().cloned();
                    }
                    Role::Top
                }
                false => Role::Dep,
            };
            CompileStep {
                role: role,
                library: file.get_library().clone(),
                version: file.get_versions().highest_at_most(requested),
                path: file.get_path().clone(),
            }
        })
        .collect();

    Ok(CompileOrder {
        top: top_name,
        steps: steps,
        timeout: timeout,
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::core::source::{IncludeMode, SourceContext};
    use crate::core::version::VersionSet;
    use std::str::FromStr;

    fn iden(s: &str) -> Identifier {
        Identifier::from_str(s).unwrap()
    }

    fn file(path: &str, lib: &str, versions: &[VhdlVersion]) -> SourceFile {
        let mut set = VersionSet::new();
        for v in versions {
            set.insert(*v);
        }
        SourceFile::new(
            PathBuf::from(path),
            String::new(),
            iden(lib),
            set,
            SourceContext::Universal,
            IncludeMode::Normal,
        )
    }

    /// Builds a graph where `edges` point from dependency to dependent.
    fn build_graph(
        files: &Vec<SourceFile>,
        edges: &[(usize, usize)],
    ) -> GraphMap<PathBuf, usize, RefKind> {
        let mut graph = GraphMap::new();
        for (i, f) in files.iter().enumerate() {
            graph.add_node(f.get_path().clone(), i);
        }
        for (src, dst) in edges {
            graph.add_edge_by_key(
                files[*src].get_path(),
                files[*dst].get_path(),
                RefKind::PackageUse,
            );
        }
        graph
    }

    #[test]
    fn dependencies_come_first() {
        let files = vec![
            file("/p/top.vhd", "work", &[]),
            file("/p/a_pkg.vhd", "work", &[]),
            file("/p/b_pkg.vhd", "work", &[]),
        ];
        // top depends on both packages; b_pkg depends on a_pkg
        let graph = build_graph(&files, &[(1, 0), (2, 0), (1, 2)]);
        let tops = HashSet::from([0]);
        let order = linearize(
            &graph,
            &files,
            &tops,
            iden("top"),
            &VhdlVersion::V2008,
        )
        .unwrap();
        let paths: Vec<&PathBuf> = order.get_steps().iter().map(|s| s.get_path()).collect();
        assert_eq!(
            paths,
            vec![
                &PathBuf::from("/p/a_pkg.vhd"),
                &PathBuf::from("/p/b_pkg.vhd"),
                &PathBuf::from("/p/top.vhd"),
            ]
        );
        assert_eq!(order.get_steps()[2].get_role(), &Role::Top);
        assert_eq!(order.get_steps()[0].get_role(), &Role::Dep);
    }

    #[test]
    fn layers_break_ties_on_library_then_path() {
        let files = vec![
            file("/p/z.vhd", "work", &[]),
            file("/p/a.vhd", "work", &[]),
            file("/p/m.vhd", "aaa", &[]),
        ];
        // no edges at all: one layer, fully tie-broken
        let graph = build_graph(&files, &[]);
        let order = linearize(
            &graph,
            &files,
            &HashSet::new(),
            iden("top"),
            &VhdlVersion::V2008,
        )
        .unwrap();
        let paths: Vec<&PathBuf> = order.get_steps().iter().map(|s| s.get_path()).collect();
        assert_eq!(
            paths,
            vec![
                &PathBuf::from("/p/m.vhd"),
                &PathBuf::from("/p/a.vhd"),
                &PathBuf::from("/p/z.vhd"),
            ]
        );
    }

    #[test]
    fn version_column() {
        let files = vec![
            file("/p/u.93.08.vhd", "work", &[VhdlVersion::V1993, VhdlVersion::V2008]),
            file("/p/t.vhd", "work", &[]),
        ];
        let graph = build_graph(&files, &[(0, 1)]);
        let order = linearize(
            &graph,
            &files,
            &HashSet::from([1]),
            iden("t"),
            &VhdlVersion::V2008,
        )
        .unwrap();
        assert_eq!(
            order.to_string(),
            "dep work 2008 /p/u.93.08.vhd\ntop work ---- /p/t.vhd\n"
        );

        // a lower requested revision changes the chosen version
        let order = linearize(
            &graph,
            &files,
            &HashSet::from([1]),
            iden("t"),
            &VhdlVersion::V1993,
        )
        .unwrap();
        assert_eq!(
            order.get_steps()[0].get_version(),
            Some(&VhdlVersion::V1993)
        );
    }

    #[test]
    fn leftover_cycle_is_reported() {
        let files = vec![file("/p/a.vhd", "work", &[]), file("/p/b.vhd", "work", &[])];
        let graph = build_graph(&files, &[(0, 1), (1, 0)]);
        let result = linearize(
            &graph,
            &files,
            &HashSet::new(),
            iden("t"),
            &VhdlVersion::V2008,
        );
        match result {
            Err(Error::Cycle(path)) => assert_eq!(path.inner().len(), 2),
            r => panic!("expected a cycle, got {:?}", r),
        }
    }
}
