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

/// Compares two string references `s0` and `s1` with case conversion.
///
/// Returns `true` if they are deemed equivalent without regarding case sensivity.
pub fn cmp_ignore_case(s0: &str, s1: &str) -> bool {
    if s0.len() != s1.len() {
        return false;
    }
    let mut s0 = s0.chars();
    let mut s1 = s1.chars();
    while let Some(c) = s0.next() {
        if c.to_lowercase().cmp(s1.next().unwrap().to_lowercase()) != std::cmp::Ordering::Equal {
            return false;
        }
    }
    true
}

/// Folds `s` into its lower-case form for hashing and ordering purposes.
///
/// VHDL identifiers are case-insensitive, so any map key or sort key derived
/// from an identifier must go through this fold.
pub fn fold(s: &str) -> String {
    s.chars().flat_map(|c| c.to_lowercase()).collect()
}

/// Checks if `s` ends with the `suffix` without regarding case sensitivity.
pub fn ends_with_ignore_case(s: &str, suffix: &str) -> bool {
    if suffix.len() > s.len() || s.is_char_boundary(s.len() - suffix.len()) == false {
        return false;
    }
    cmp_ignore_case(&s[s.len() - suffix.len()..], suffix)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn it_works() {
        let s0 = "ABC";
        let s1 = "abc";
        assert_eq!(cmp_ignore_case(s0, s1), true);

        // negative case: different lengths
        let s0 = "ABCD";
        let s1 = "abc";
        assert_eq!(cmp_ignore_case(s0, s1), false);

        // negative case: different letter order
        let s0 = "cba";
        let s1 = "abc";
        assert_eq!(cmp_ignore_case(s0, s1), false);

        // VHDL-2008 LRM p226
        let s0 = "ABCDEFGHIJKLMNOPQRSTUVWXYZÀÁÂÃÄÅÆÇÈÉÊËÌÍÎÏÐÑÒÓÔÕÖØÙÚÛÜÝÞ";
        let s1 = "abcdefghijklmnopqrstuvwxyzàáâãäåæçèéêëìíîïðñòóôõöøùúûüýþ";
        assert_eq!(cmp_ignore_case(s0, s1), true);
    }

    #[test]
    fn folding() {
        assert_eq!(fold("Full_Adder"), "full_adder");
        assert_eq!(fold("já"), "já");
    }

    #[test]
    fn suffix() {
        assert_eq!(ends_with_ignore_case("util_PKG", "_pkg"), true);
        assert_eq!(ends_with_ignore_case("util", "_pkg"), false);
        assert_eq!(ends_with_ignore_case("pkg", "_pkg"), false);
    }
}
