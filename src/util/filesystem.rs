use std::env::current_dir;
use std::path::{Component, PathBuf};

use super::anyerror::Fault;

/// Replaces '\' characters with single '/' character and converts the [PathBuf] into a [String].
pub fn into_std_str(path: PathBuf) -> String {
    let mut s = path.display().to_string().replace(r"\", "/");
    if s.ends_with("/") == true {
        s.pop().unwrap();
    }
    s
}

/// Removes common path components from `full` if they are found in `base` on
/// the same iterations.
pub fn remove_base(base: &PathBuf, full: &PathBuf) -> PathBuf {
    let mut b_comps = base.iter();
    let mut f_comps = full.iter();

    let result = loop {
        match f_comps.next() {
            Some(full_c) => match b_comps.next() {
                Some(base_c) => {
                    if full_c == base_c {
                        continue;
                    } else {
                        break PathBuf::from(full_c);
                    }
                }
                None => break PathBuf::from(full_c),
            },
            None => break PathBuf::new(),
        }
    };

    // append remaining components
    result.join(f_comps.as_path())
}

/// Ensures the path `p` is in absolute form, resolving any relativity against
/// the current working directory.
///
/// The returned path also has intermediate '.' and '..' components collapsed
/// so that the same file always maps to the same key.
pub fn to_absolute(p: PathBuf) -> Result<PathBuf, Fault> {
    let p = if p.is_relative() == true {
        current_dir()?.join(p)
    } else {
        p
    };
    Ok(collapse(p))
}

/// Collapses intermediate '.' and '..' components without touching the
/// filesystem.
pub fn collapse(p: PathBuf) -> PathBuf {
    let mut result = PathBuf::new();
    for c in p.components() {
        match c {
            Component::CurDir => (),
            Component::ParentDir => {
                // do not pop past the root of the path
                match result.components().last() {
                    Some(Component::Normal(_)) => {
                        result.pop();
                    }
                    _ => result.push(c),
                }
            }
            _ => result.push(c),
        }
    }
    result
}
