//! Current-reference switching and the version marker file
//!
//! Switching removes whatever sits at the reference path and creates a fresh
//! symlink. The two steps are not atomic together: an interruption between
//! them leaves no current reference, and the next successful run recreates it.

use std::path::{Component, Path, PathBuf};

use tokio::fs;
use tracing::debug;

use crate::errors::{SwitchError, SwitchResult};

/// Point `link` at `target`, replacing any existing file or link
///
/// Relative arguments are taken against the working directory. The link
/// stores a path relative to its own directory when one can be computed,
/// otherwise the absolute target.
///
/// # Errors
///
/// Returns `SwitchError::Io` if the old reference cannot be removed, the
/// link directory cannot be created, or the symlink cannot be created.
pub async fn point_reference(link: &Path, target: &Path) -> SwitchResult<()> {
    let io_err = |path: &Path, source: std::io::Error| SwitchError::Io {
        path: path.to_path_buf(),
        source,
    };

    let link_dir = link.parent().filter(|dir| !dir.as_os_str().is_empty());

    if let Some(dir) = link_dir {
        fs::create_dir_all(dir).await.map_err(|e| io_err(dir, e))?;
    }

    // symlink_metadata so a dangling link is still removed
    match fs::symlink_metadata(link).await {
        Ok(_) => fs::remove_file(link).await.map_err(|e| io_err(link, e))?,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(io_err(link, e)),
    }

    let cwd = std::env::current_dir().map_err(|e| io_err(link, e))?;
    let stored = link_contents(&cwd, link, target);

    create_symlink(&stored, link)
        .await
        .map_err(|e| io_err(link, e))?;

    debug!("Linked {} -> {}", link.display(), stored.display());
    Ok(())
}

/// Path to store in `link` so that it resolves to `target`
fn link_contents(base: &Path, link: &Path, target: &Path) -> PathBuf {
    let link = base.join(link);
    let target = base.join(target);

    link.parent()
        .and_then(|dir| relative_path(dir, &target))
        .unwrap_or(target)
}

#[cfg(unix)]
async fn create_symlink(original: &Path, link: &Path) -> std::io::Result<()> {
    fs::symlink(original, link).await
}

#[cfg(windows)]
async fn create_symlink(original: &Path, link: &Path) -> std::io::Result<()> {
    fs::symlink_file(original, link).await
}

/// Lexical path from directory `from` to `to`
///
/// Both paths must be absolute and free of `..` components; otherwise `None`.
pub fn relative_path(from: &Path, to: &Path) -> Option<PathBuf> {
    if !from.is_absolute() || !to.is_absolute() {
        return None;
    }

    let from: Vec<Component> = normalized(from)?;
    let to: Vec<Component> = normalized(to)?;

    // different roots (e.g. drive prefixes) have no relative path
    if from.first() != to.first() {
        return None;
    }

    let common = from
        .iter()
        .zip(to.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut relative = PathBuf::new();
    for _ in common..from.len() {
        relative.push("..");
    }
    for component in &to[common..] {
        relative.push(component.as_os_str());
    }

    if relative.as_os_str().is_empty() {
        None
    } else {
        Some(relative)
    }
}

fn normalized(path: &Path) -> Option<Vec<Component<'_>>> {
    let mut components = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => return None,
            other => components.push(other),
        }
    }
    Some(components)
}

/// Write `VERSION=<version>` to the marker file
pub async fn write_version_marker(path: &Path, version: &str) -> std::io::Result<()> {
    fs::write(path, format!("VERSION={}\n", version)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_relative_path_siblings() {
        assert_eq!(
            relative_path(Path::new("/a/b"), Path::new("/a/b/file")),
            Some(PathBuf::from("file"))
        );
        assert_eq!(
            relative_path(Path::new("/a/bin"), Path::new("/a/cursor/file")),
            Some(PathBuf::from("../cursor/file"))
        );
        assert_eq!(
            relative_path(Path::new("/x/y/z"), Path::new("/a/file")),
            Some(PathBuf::from("../../../a/file"))
        );
    }

    #[test]
    fn test_relative_path_not_computable() {
        assert_eq!(relative_path(Path::new("a/b"), Path::new("/a/file")), None);
        assert_eq!(relative_path(Path::new("/a/b"), Path::new("file")), None);
        assert_eq!(relative_path(Path::new("/a/../b"), Path::new("/a/file")), None);
    }

    #[test]
    fn test_link_contents_from_relative_arguments() {
        let base = Path::new("/home/user");
        assert_eq!(
            link_contents(
                base,
                Path::new("bin/Cursor.AppImage"),
                Path::new("dl/Cursor-1.0.0.AppImage")
            ),
            PathBuf::from("../dl/Cursor-1.0.0.AppImage")
        );
        assert_eq!(
            link_contents(base, Path::new("Cursor.AppImage"), Path::new("./Cursor-1.0.0.AppImage")),
            PathBuf::from("Cursor-1.0.0.AppImage")
        );
        // absolute paths ignore the base
        assert_eq!(
            link_contents(base, Path::new("/opt/bin/Cursor.AppImage"), Path::new("/opt/dl/a")),
            PathBuf::from("../dl/a")
        );
    }

    #[test]
    fn test_link_contents_falls_back_to_absolute_target() {
        let base = Path::new("/home/user");
        assert_eq!(
            link_contents(base, Path::new("bin/Cursor.AppImage"), Path::new("../dl/a")),
            PathBuf::from("/home/user/../dl/a")
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_point_reference_with_working_directory_relative_paths() {
        // relative to the cwd, with link and artifact in sibling directories
        let temp_dir = TempDir::new_in(".").unwrap();
        let root = temp_dir.path();
        assert!(root.is_relative());

        let target = root.join("dl").join("Cursor-1.0.0-x86_64.AppImage");
        std::fs::create_dir_all(target.parent().unwrap()).unwrap();
        std::fs::write(&target, "v1").unwrap();
        let link = root.join("bin").join("Cursor.AppImage");

        point_reference(&link, &target).await.unwrap();

        assert_eq!(
            std::fs::read_link(&link).unwrap(),
            PathBuf::from("../dl/Cursor-1.0.0-x86_64.AppImage")
        );
        assert_eq!(std::fs::read_to_string(&link).unwrap(), "v1");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_point_reference_creates_relative_link() {
        let temp_dir = TempDir::new().unwrap();
        let target = temp_dir.path().join("store").join("Cursor-1.0.0-x86_64.AppImage");
        std::fs::create_dir_all(target.parent().unwrap()).unwrap();
        std::fs::write(&target, "v1").unwrap();
        let link = temp_dir.path().join("bin").join("Cursor.AppImage");

        point_reference(&link, &target).await.unwrap();

        let stored = std::fs::read_link(&link).unwrap();
        assert_eq!(stored, PathBuf::from("../store/Cursor-1.0.0-x86_64.AppImage"));
        assert_eq!(std::fs::read_to_string(&link).unwrap(), "v1");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_point_reference_replaces_existing() {
        let temp_dir = TempDir::new().unwrap();
        let old = temp_dir.path().join("Cursor-1.0.0-x86_64.AppImage");
        let new = temp_dir.path().join("Cursor-1.1.0-x86_64.AppImage");
        std::fs::write(&old, "old").unwrap();
        std::fs::write(&new, "new").unwrap();
        let link = temp_dir.path().join("Cursor.AppImage");

        // plain file copy in place of a link
        std::fs::write(&link, "old").unwrap();
        point_reference(&link, &new).await.unwrap();
        assert_eq!(std::fs::read_to_string(&link).unwrap(), "new");

        point_reference(&link, &old).await.unwrap();
        assert_eq!(
            std::fs::read_link(&link).unwrap(),
            PathBuf::from("Cursor-1.0.0-x86_64.AppImage")
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_point_reference_replaces_dangling_link() {
        let temp_dir = TempDir::new().unwrap();
        let link = temp_dir.path().join("Cursor.AppImage");
        std::os::unix::fs::symlink(temp_dir.path().join("gone"), &link).unwrap();
        let target = temp_dir.path().join("Cursor-2.0.0-x86_64.AppImage");
        std::fs::write(&target, "v2").unwrap();

        point_reference(&link, &target).await.unwrap();
        assert_eq!(std::fs::read_to_string(&link).unwrap(), "v2");
    }

    #[tokio::test]
    async fn test_version_marker() {
        let temp_dir = TempDir::new().unwrap();
        let marker = temp_dir.path().join(".cursor-version");
        write_version_marker(&marker, "1.4.5").await.unwrap();
        assert_eq!(std::fs::read_to_string(&marker).unwrap(), "VERSION=1.4.5\n");
    }
}
