//! Filesystem primitives applied to the replica.

use std::fs::{self, File};
use std::io;
use std::path::Path;

/// Copy the content of `source` over `dest`, creating missing parents.
///
/// The source is opened before the destination is truncated, so a source
/// that vanished mid-scan leaves the replica untouched. A symbolic link at
/// `dest` is replaced, never written through. Returns bytes written.
pub fn copy_file(source: &Path, dest: &Path) -> io::Result<u64> {
    let mut reader = File::open(source)?;

    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }
    remove_symlink(dest)?;

    let mut writer = File::create(dest)?;
    io::copy(&mut reader, &mut writer)
}

/// Make sure `path` is a directory. Returns `true` if it had to be created.
pub fn ensure_directory(path: &Path) -> io::Result<bool> {
    match fs::metadata(path) {
        Ok(metadata) if metadata.is_dir() => Ok(false),
        Ok(_) => Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            "a non-directory occupies the path",
        )),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            fs::create_dir_all(path)?;
            Ok(true)
        }
        Err(e) => Err(e),
    }
}

/// Remove `path` if it is a symbolic link. Returns `true` if one was removed.
pub fn remove_symlink(path: &Path) -> io::Result<bool> {
    match fs::symlink_metadata(path) {
        Ok(metadata) if metadata.file_type().is_symlink() => remove_file(path),
        Ok(_) => Ok(false),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}

/// Remove a file. Returns `false` if it was already gone.
pub fn remove_file(path: &Path) -> io::Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_copy_creates_parents_and_overwrites() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("a.txt");
        let dest = temp.path().join("out/nested/a.txt");
        fs::write(&source, "new content").unwrap();

        assert_eq!(copy_file(&source, &dest).unwrap(), 11);
        assert_eq!(fs::read_to_string(&dest).unwrap(), "new content");

        fs::write(&source, "x").unwrap();
        assert_eq!(copy_file(&source, &dest).unwrap(), 1);
        assert_eq!(fs::read_to_string(&dest).unwrap(), "x");
    }

    #[test]
    fn test_copy_missing_source_leaves_dest() {
        let temp = TempDir::new().unwrap();
        let dest = temp.path().join("dest.txt");
        fs::write(&dest, "keep me").unwrap();

        let err = copy_file(&temp.path().join("gone.txt"), &dest).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
        assert_eq!(fs::read_to_string(&dest).unwrap(), "keep me");
    }

    #[test]
    fn test_ensure_directory() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("a/b/c");

        assert!(ensure_directory(&dir).unwrap());
        assert!(!ensure_directory(&dir).unwrap());
        assert!(dir.is_dir());

        let file = temp.path().join("file");
        fs::write(&file, "").unwrap();
        assert!(ensure_directory(&file).is_err());
    }

    #[test]
    fn test_remove_file() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("stale.txt");
        fs::write(&file, "y").unwrap();

        assert!(remove_file(&file).unwrap());
        assert!(!remove_file(&file).unwrap());
    }

    #[cfg(unix)]
    #[test]
    fn test_copy_replaces_link_instead_of_following_it() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("a.txt");
        let target = temp.path().join("target.txt");
        let dest = temp.path().join("link.txt");
        fs::write(&source, "fresh").unwrap();
        fs::write(&target, "untouched").unwrap();
        std::os::unix::fs::symlink(&target, &dest).unwrap();

        copy_file(&source, &dest).unwrap();

        assert!(!fs::symlink_metadata(&dest).unwrap().file_type().is_symlink());
        assert_eq!(fs::read_to_string(&dest).unwrap(), "fresh");
        assert_eq!(fs::read_to_string(&target).unwrap(), "untouched");
    }

    #[cfg(unix)]
    #[test]
    fn test_remove_symlink_leaves_regular_files() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("plain.txt");
        let link = temp.path().join("link");
        fs::write(&file, "p").unwrap();
        std::os::unix::fs::symlink(temp.path().join("missing"), &link).unwrap();

        assert!(!remove_symlink(&file).unwrap());
        assert!(file.exists());
        assert!(remove_symlink(&link).unwrap());
        assert!(fs::symlink_metadata(&link).is_err());
        assert!(!remove_symlink(&link).unwrap());
    }
}
