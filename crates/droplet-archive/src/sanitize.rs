use std::path::{Component, Path, PathBuf};

use crate::error::{Error, Result};

/// The entry name as a clean relative path (zip-slip prevention).
///
/// Both `/` and `\` count as separators. Absolute names, drive prefixes and
/// `..` components that climb above the archive root are rejected.
pub fn sanitize_entry_path(entry: &str) -> Result<PathBuf> {
    normalize_relative(entry).ok_or_else(|| Error::UnsafePath {
        entry: entry.to_string(),
    })
}

/// Check a symlink target against the destination root.
///
/// `link_relative` is the link's own path relative to the root. Returns the
/// target unchanged when, resolved from the link's directory, it stays inside.
/// `is_link` reports whether a path relative to the root is itself a link;
/// the target may end at one but never step through one.
pub fn check_symlink_target(
    entry: &str,
    link_relative: &Path,
    target: &str,
    is_link: impl Fn(&Path) -> bool,
) -> Result<PathBuf> {
    let unsafe_target = || Error::UnsafeSymlink {
        entry: entry.to_string(),
        target: PathBuf::from(target),
    };

    if target.is_empty()
        || target.starts_with('/')
        || target.starts_with('\\')
        || target.contains('\0')
    {
        return Err(unsafe_target());
    }

    let joined = match link_relative.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            format!("{}/{}", parent.to_string_lossy(), target)
        }
        _ => target.to_string(),
    };
    let unified = joined.replace('\\', "/");
    let components: Vec<Component> = Path::new(&unified).components().collect();

    let mut resolved = PathBuf::new();
    for (position, component) in components.iter().enumerate() {
        match component {
            Component::Normal(part) => {
                resolved.push(part);
                if position + 1 < components.len() && is_link(&resolved) {
                    return Err(unsafe_target());
                }
            }
            Component::CurDir => {}
            Component::ParentDir => {
                if !resolved.pop() {
                    return Err(unsafe_target());
                }
            }
            Component::RootDir | Component::Prefix(_) => return Err(unsafe_target()),
        }
    }

    Ok(PathBuf::from(target))
}

/// Reject a relative path whose containing directories include a link.
pub fn check_no_linked_parent(
    entry: &str,
    relative: &Path,
    is_link: impl Fn(&Path) -> bool,
) -> Result<()> {
    let linked = relative
        .ancestors()
        .skip(1)
        .filter(|ancestor| !ancestor.as_os_str().is_empty())
        .any(is_link);
    if linked {
        return Err(Error::LinkedParent {
            entry: entry.to_string(),
        });
    }
    Ok(())
}

fn normalize_relative(name: &str) -> Option<PathBuf> {
    if name.contains('\0') {
        return None;
    }

    let unified = name.replace('\\', "/");
    let mut parts: Vec<&std::ffi::OsStr> = Vec::new();

    for component in Path::new(&unified).components() {
        match component {
            Component::Normal(part) => parts.push(part),
            Component::CurDir => {}
            Component::ParentDir => {
                parts.pop()?;
            }
            Component::RootDir | Component::Prefix(_) => return None,
        }
    }

    Some(parts.into_iter().collect())
}
