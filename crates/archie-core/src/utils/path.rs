use std::io;
use std::path::{Component, Path, PathBuf};

/// Resolve a sequence of path segments into a single absolute location.
///
/// Segments are joined left to right; an absolute segment discards
/// everything joined before it. A result that is still relative is taken
/// relative to the current working directory. The result is normalized
/// lexically, so `.` components vanish and `..` pops the previous component
/// without touching the filesystem.
pub fn resolve_location<I, P>(segments: I) -> io::Result<PathBuf>
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    let mut joined = PathBuf::new();
    for segment in segments {
        let segment = segment.as_ref();
        if segment.as_os_str().is_empty() {
            continue;
        }
        // PathBuf::push replaces the buffer when `segment` is absolute
        joined.push(segment);
    }
    if !joined.is_absolute() {
        joined = std::env::current_dir()?.join(joined);
    }
    Ok(normalize_lexically(&joined))
}

/// Remove `.` and resolve `..` components without consulting the filesystem.
///
/// `..` at the root of an absolute path is dropped; at the start of a
/// relative path it is kept.
pub fn normalize_lexically(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(prefix) => normalized.push(prefix.as_os_str()),
            Component::RootDir => normalized.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                let can_pop = matches!(
                    normalized.components().next_back(),
                    Some(Component::Normal(_))
                );
                if can_pop {
                    normalized.pop();
                } else if !normalized.has_root() {
                    normalized.push("..");
                }
            }
            Component::Normal(part) => normalized.push(part),
        }
    }
    normalized
}
