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

use crate::core::lexer::Position;
use crate::core::vhdl::token::Identifier;
use serde_derive::{Deserialize, Serialize};
use std::fmt::Display;

/// Discriminant for addressing design units in the index.
///
/// Secondary units are keyed under the name of their primary unit so that all
/// architectures of an entity (and all bodies of a package) share one slot.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UnitKind {
    Entity,
    Architecture,
    Package,
    PackageBody,
    Configuration,
}

impl Display for UnitKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Entity => write!(f, "entity"),
            Self::Architecture => write!(f, "architecture"),
            Self::Package => write!(f, "package"),
            Self::PackageBody => write!(f, "package body"),
            Self::Configuration => write!(f, "configuration"),
        }
    }
}

/// Addresses one slot of the unit index: a case-folded (library, kind, name)
/// tuple.
#[derive(Debug, PartialEq, Eq, Hash, Clone)]
pub struct UnitKey {
    library: Identifier,
    kind: UnitKind,
    name: Identifier,
}

impl UnitKey {
    pub fn new(library: Identifier, kind: UnitKind, name: Identifier) -> Self {
        Self {
            library: library,
            kind: kind,
            name: name,
        }
    }

    pub fn get_library(&self) -> &Identifier {
        &self.library
    }

    pub fn get_kind(&self) -> &UnitKind {
        &self.kind
    }

    pub fn get_name(&self) -> &Identifier {
        &self.name
    }
}

impl Display for UnitKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}.{}", self.kind, self.library, self.name)
    }
}

/// A design unit declared by a source file.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DesignUnit {
    Entity {
        name: Identifier,
        pos: Position,
    },
    Architecture {
        name: Identifier,
        entity: Identifier,
        pos: Position,
    },
    Package {
        name: Identifier,
        pos: Position,
    },
    PackageBody {
        package: Identifier,
        pos: Position,
    },
    Configuration {
        name: Identifier,
        entity: Identifier,
        pos: Position,
    },
}

impl DesignUnit {
    /// Checks if the unit is a primary design unit (named at library scope).
    pub fn is_primary(&self) -> bool {
        match self {
            Self::Entity { .. } | Self::Package { .. } | Self::Configuration { .. } => true,
            Self::Architecture { .. } | Self::PackageBody { .. } => false,
        }
    }

    /// References the unit's own declared name.
    ///
    /// A package body is anonymous and answers with its package's name.
    pub fn get_name(&self) -> &Identifier {
        match self {
            Self::Entity { name, .. } => name,
            Self::Architecture { name, .. } => name,
            Self::Package { name, .. } => name,
            Self::PackageBody { package, .. } => package,
            Self::Configuration { name, .. } => name,
        }
    }

    /// References the starting location of the declaration in its file.
    pub fn get_position(&self) -> &Position {
        match self {
            Self::Entity { pos, .. } => pos,
            Self::Architecture { pos, .. } => pos,
            Self::Package { pos, .. } => pos,
            Self::PackageBody { pos, .. } => pos,
            Self::Configuration { pos, .. } => pos,
        }
    }

    /// Derives the index key for this unit under the target library `lib`.
    pub fn to_key(&self, lib: &Identifier) -> UnitKey {
        match self {
            Self::Entity { name, .. } => {
                UnitKey::new(lib.clone(), UnitKind::Entity, name.clone())
            }
            Self::Architecture { entity, .. } => {
                UnitKey::new(lib.clone(), UnitKind::Architecture, entity.clone())
            }
            Self::Package { name, .. } => {
                UnitKey::new(lib.clone(), UnitKind::Package, name.clone())
            }
            Self::PackageBody { package, .. } => {
                UnitKey::new(lib.clone(), UnitKind::PackageBody, package.clone())
            }
            Self::Configuration { name, .. } => {
                UnitKey::new(lib.clone(), UnitKind::Configuration, name.clone())
            }
        }
    }
}

impl Display for DesignUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Entity { name, .. } => write!(f, "entity {}", name),
            Self::Architecture { name, entity, .. } => {
                write!(f, "architecture {} of {}", name, entity)
            }
            Self::Package { name, .. } => write!(f, "package {}", name),
            Self::PackageBody { package, .. } => write!(f, "package body of {}", package),
            Self::Configuration { name, entity, .. } => {
                write!(f, "configuration {} of {}", name, entity)
            }
        }
    }
}

/// Classifies how a file references a design unit it does not declare.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RefKind {
    /// `: entity lib.name[(arch)]`
    EntityInstance,
    /// `: configuration lib.name`
    ConfigurationInstance,
    /// `: component name` (or an instantiated declared component)
    ComponentInstance,
    /// `use lib.name. ...`
    PackageUse,
    /// implicit edge from an architecture to its entity
    ArchitectureOf,
    /// implicit edge from a package body to its package
    BodyOf,
}

impl Display for RefKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EntityInstance => write!(f, "entity instantiation"),
            Self::ConfigurationInstance => write!(f, "configuration instantiation"),
            Self::ComponentInstance => write!(f, "component instantiation"),
            Self::PackageUse => write!(f, "package use"),
            Self::ArchitectureOf => write!(f, "architecture's entity"),
            Self::BodyOf => write!(f, "package body's package"),
        }
    }
}

/// One reference edge from a consumer file to a required design unit.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Requirement {
    kind: RefKind,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    library: Option<Identifier>,
    name: Identifier,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    arch: Option<Identifier>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    scope: Vec<Identifier>,
    pos: Position,
}

impl Requirement {
    pub fn entity_instance(
        library: Option<Identifier>,
        name: Identifier,
        arch: Option<Identifier>,
        pos: Position,
    ) -> Self {
        Self {
            kind: RefKind::EntityInstance,
            library: library,
            name: name,
            arch: arch,
            scope: Vec::new(),
            pos: pos,
        }
    }

    pub fn configuration_instance(
        library: Option<Identifier>,
        name: Identifier,
        pos: Position,
    ) -> Self {
        Self {
            kind: RefKind::ConfigurationInstance,
            library: library,
            name: name,
            arch: None,
            scope: Vec::new(),
            pos: pos,
        }
    }

    pub fn component_instance(name: Identifier, scope: Vec<Identifier>, pos: Position) -> Self {
        Self {
            kind: RefKind::ComponentInstance,
            library: None,
            name: name,
            arch: None,
            scope: scope,
            pos: pos,
        }
    }

    pub fn package_use(library: Identifier, name: Identifier, pos: Position) -> Self {
        Self {
            kind: RefKind::PackageUse,
            library: Some(library),
            name: name,
            arch: None,
            scope: Vec::new(),
            pos: pos,
        }
    }

    pub fn architecture_of(entity: Identifier, pos: Position) -> Self {
        Self {
            kind: RefKind::ArchitectureOf,
            library: None,
            name: entity,
            arch: None,
            scope: Vec::new(),
            pos: pos,
        }
    }

    pub fn body_of(package: Identifier, pos: Position) -> Self {
        Self {
            kind: RefKind::BodyOf,
            library: None,
            name: package,
            arch: None,
            scope: Vec::new(),
            pos: pos,
        }
    }

    pub fn get_kind(&self) -> &RefKind {
        &self.kind
    }

    /// References the explicit library prefix, if the reference carried one.
    ///
    /// `work` prefixes are preserved here; the resolver maps them onto the
    /// consumer's target library.
    pub fn get_library(&self) -> Option<&Identifier> {
        self.library.as_ref()
    }

    pub fn get_name(&self) -> &Identifier {
        &self.name
    }

    pub fn get_arch(&self) -> Option<&Identifier> {
        self.arch.as_ref()
    }

    /// References the libraries declared in scope at the reference's location.
    pub fn get_scope(&self) -> &Vec<Identifier> {
        &self.scope
    }

    pub fn get_position(&self) -> &Position {
        &self.pos
    }
}

impl Display for Requirement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.library {
            Some(lib) => write!(f, "{} {}.{}", self.kind, lib, self.name),
            None => write!(f, "{} {}", self.kind, self.name),
        }
    }
}

/// An inline tool directive lifted from a source file's comments.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Pragma {
    IgnorePackage(Identifier),
    IgnoreComponent(Identifier),
    IgnoreEntity(Identifier),
    /// `pragma simulation timeout <time-literal>`, passed through verbatim.
    Timeout(String),
}

impl Pragma {
    /// Attempts to interpret a comment's contents as a pragma.
    ///
    /// Unknown pragmas and plain comments return `None`.
    pub fn parse(note: &str) -> Option<Self> {
        let mut words = note.split_whitespace();
        if words.next() != Some("pragma") {
            return None;
        }
        match words.next() {
            Some("vhdeps") => {
                if words.next() != Some("ignore") {
                    return None;
                }
                let target = words.next()?;
                let name = words.next()?.parse::<Identifier>().ok()?;
                match target {
                    "package" => Some(Self::IgnorePackage(name)),
                    "component" => Some(Self::IgnoreComponent(name)),
                    "entity" => Some(Self::IgnoreEntity(name)),
                    _ => None,
                }
            }
            Some("simulation") => {
                if words.next() != Some("timeout") {
                    return None;
                }
                let literal = words.collect::<Vec<&str>>().join(" ");
                match literal.is_empty() {
                    true => None,
                    false => Some(Self::Timeout(literal)),
                }
            }
            _ => None,
        }
    }

    /// Checks if this pragma marks the given requirement as satisfied.
    pub fn suppresses(&self, req: &Requirement) -> bool {
        match self {
            Self::IgnorePackage(name) => {
                req.get_kind() == &RefKind::PackageUse && req.get_name() == name
            }
            Self::IgnoreComponent(name) => {
                req.get_kind() == &RefKind::ComponentInstance && req.get_name() == name
            }
            Self::IgnoreEntity(name) => {
                req.get_kind() == &RefKind::EntityInstance && req.get_name() == name
            }
            Self::Timeout(_) => false,
        }
    }
}
