//! Destination folder handling.

use std::path::Path;

use crate::error::{Error, Result};

/// Ensure a directory exists, creating it if necessary.
pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}

/// Check that `path` is an existing, writable directory.
///
/// Creating the folder is the caller's job; a run never creates it.
pub fn validate_destination(path: &Path) -> Result<()> {
    let metadata = std::fs::metadata(path).map_err(|e| {
        Error::Destination(format!("{}: {}", path.display(), e))
    })?;

    if !metadata.is_dir() {
        return Err(Error::Destination(format!(
            "{} is not a directory",
            path.display()
        )));
    }
    if metadata.permissions().readonly() {
        return Err(Error::Destination(format!(
            "{} is read-only",
            path.display()
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_ensure_dir_creates_nested() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("a").join("b");
        ensure_dir(&nested).unwrap();
        assert!(nested.is_dir());
        // Idempotent
        ensure_dir(&nested).unwrap();
    }

    #[test]
    fn test_validate_destination() {
        let dir = TempDir::new().unwrap();
        assert!(validate_destination(dir.path()).is_ok());

        let missing = dir.path().join("missing");
        assert!(matches!(
            validate_destination(&missing),
            Err(Error::Destination(_))
        ));

        let file = dir.path().join("file.txt");
        std::fs::write(&file, b"x").unwrap();
        assert!(matches!(
            validate_destination(&file),
            Err(Error::Destination(_))
        ));
    }
}
