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

use serde::de;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt::Display;
use std::str::FromStr;

/// A revision of the IEEE 1076 standard.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Hash)]
pub enum VhdlVersion {
    V1987,
    V1993,
    V2002,
    V2008,
    V2019,
}

impl VhdlVersion {
    /// Interprets a two-digit filename tag as a standard revision.
    ///
    /// Tags that are two digits but do not name a known revision return `None`
    /// (they are reserved by the tag grammar and skipped by callers).
    pub fn from_tag(tag: &str) -> Option<Self> {
        if tag.len() != 2 || tag.chars().find(|c| c.is_ascii_digit() == false).is_some() {
            return None;
        }
        match tag {
            "87" => Some(Self::V1987),
            "93" => Some(Self::V1993),
            "02" => Some(Self::V2002),
            "08" => Some(Self::V2008),
            "19" => Some(Self::V2019),
            _ => None,
        }
    }

    /// Checks if the given `tag` has the shape of a version tag (two digits),
    /// regardless if it names a known revision.
    pub fn is_tag(tag: &str) -> bool {
        tag.len() == 2 && tag.chars().find(|c| c.is_ascii_digit() == false).is_none()
    }

    /// Returns the four-digit year of the revision.
    pub fn year(&self) -> u16 {
        match self {
            Self::V1987 => 1987,
            Self::V1993 => 1993,
            Self::V2002 => 2002,
            Self::V2008 => 2008,
            Self::V2019 => 2019,
        }
    }
}

impl Display for VhdlVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.year())
    }
}

#[derive(Debug, PartialEq)]
pub struct VersionError(String);

impl std::error::Error for VersionError {}

impl Display for VersionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown vhdl revision '{}'", self.0)
    }
}

impl FromStr for VhdlVersion {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "87" | "1987" => Ok(Self::V1987),
            "93" | "1993" => Ok(Self::V1993),
            "02" | "2002" => Ok(Self::V2002),
            "08" | "2008" => Ok(Self::V2008),
            "19" | "2019" => Ok(Self::V2019),
            _ => Err(VersionError(s.to_string())),
        }
    }
}

impl Serialize for VhdlVersion {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_u16(self.year())
    }
}

impl<'de> Deserialize<'de> for VhdlVersion {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let year = u16::deserialize(deserializer)?;
        Self::from_str(&year.to_string()).map_err(de::Error::custom)
    }
}

/// The set of standard revisions a source file is compatible with.
///
/// The empty set is interpreted as _universal_: the file is assumed valid
/// under every revision.
#[derive(Debug, PartialEq, Clone, Default)]
pub struct VersionSet(BTreeSet<VhdlVersion>);

impl VersionSet {
    pub fn new() -> Self {
        Self(BTreeSet::new())
    }

    pub fn insert(&mut self, version: VhdlVersion) -> bool {
        self.0.insert(version)
    }

    pub fn is_universal(&self) -> bool {
        self.0.is_empty()
    }

    /// Checks if the given `version` is an acceptable revision for this set.
    pub fn contains(&self, version: &VhdlVersion) -> bool {
        self.is_universal() == true || self.0.contains(version)
    }

    /// Checks if any revision at or below `ceiling` is acceptable.
    pub fn intersects_at_most(&self, ceiling: &VhdlVersion) -> bool {
        self.is_universal() == true || self.0.iter().find(|v| *v <= ceiling).is_some()
    }

    /// Returns the highest explicit revision at or below `ceiling`, if any.
    ///
    /// A universal set has no explicit revisions and returns `None`.
    pub fn highest_at_most(&self, ceiling: &VhdlVersion) -> Option<VhdlVersion> {
        self.0.iter().rev().find(|v| *v <= ceiling).copied()
    }

    /// Checks if two sets can both be selected for some common revision.
    pub fn overlaps(&self, other: &Self) -> bool {
        if self.is_universal() == true || other.is_universal() == true {
            return true;
        }
        self.0.iter().find(|v| other.0.contains(v)).is_some()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn from_tag() {
        assert_eq!(VhdlVersion::from_tag("93"), Some(VhdlVersion::V1993));
        assert_eq!(VhdlVersion::from_tag("08"), Some(VhdlVersion::V2008));
        // reserved two-digit tags are not versions
        assert_eq!(VhdlVersion::from_tag("77"), None);
        assert_eq!(VhdlVersion::is_tag("77"), true);
        // not a tag at all
        assert_eq!(VhdlVersion::from_tag("sim"), None);
        assert_eq!(VhdlVersion::is_tag("sim"), false);
        assert_eq!(VhdlVersion::from_tag("1993"), None);
    }

    #[test]
    fn displays_year() {
        assert_eq!(VhdlVersion::V1987.to_string(), "1987");
        assert_eq!(VhdlVersion::V2008.to_string(), "2008");
    }

    #[test]
    fn ordering() {
        assert_eq!(VhdlVersion::V1987 < VhdlVersion::V1993, true);
        assert_eq!(VhdlVersion::V2019 > VhdlVersion::V2008, true);
    }

    #[test]
    fn sets() {
        let mut set = VersionSet::new();
        assert_eq!(set.is_universal(), true);
        assert_eq!(set.contains(&VhdlVersion::V2008), true);
        assert_eq!(set.highest_at_most(&VhdlVersion::V2019), None);

        set.insert(VhdlVersion::V1993);
        set.insert(VhdlVersion::V2008);
        assert_eq!(set.is_universal(), false);
        assert_eq!(set.contains(&VhdlVersion::V2002), false);
        assert_eq!(set.contains(&VhdlVersion::V1993), true);
        assert_eq!(
            set.highest_at_most(&VhdlVersion::V2002),
            Some(VhdlVersion::V1993)
        );
        assert_eq!(
            set.highest_at_most(&VhdlVersion::V2019),
            Some(VhdlVersion::V2008)
        );
        assert_eq!(set.intersects_at_most(&VhdlVersion::V1987), false);

        let mut other = VersionSet::new();
        other.insert(VhdlVersion::V2002);
        assert_eq!(set.overlaps(&other), false);
        other.insert(VhdlVersion::V2008);
        assert_eq!(set.overlaps(&other), true);
        assert_eq!(set.overlaps(&VersionSet::new()), true);
    }
}
