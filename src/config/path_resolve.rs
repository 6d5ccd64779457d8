// src/config/path_resolve.rs

use crate::errors::{Error, Result};
use std::path::PathBuf;

/// Resolves the project path to an absolute, canonical directory.
pub(super) fn resolve_project_path(project: &str) -> Result<PathBuf> {
    let path = PathBuf::from(project);
    let resolved = path
        .canonicalize()
        .map_err(|e| Error::Config(format!("Failed to resolve project path '{project}': {e}")))?;
    if !resolved.is_dir() {
        return Err(Error::Config(format!(
            "Project path '{project}' is not a directory"
        )));
    }
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_resolve_existing_dir() -> anyhow::Result<()> {
        let temp = tempdir()?;
        let resolved = resolve_project_path(&temp.path().to_string_lossy())?;
        assert!(resolved.is_absolute());
        assert!(resolved.is_dir());
        Ok(())
    }

    #[test]
    fn test_file_is_rejected() -> anyhow::Result<()> {
        let temp = tempdir()?;
        let file = temp.path().join("App.java");
        fs::write(&file, "class App {}")?;
        let err = resolve_project_path(&file.to_string_lossy()).unwrap_err();
        assert!(err.to_string().contains("not a directory"));
        Ok(())
    }

    #[test]
    fn test_missing_path_is_rejected() {
        let err = resolve_project_path("/definitely/not/a/project").unwrap_err();
        assert!(matches!(err, Error::Config(msg) if msg.contains("Failed to resolve")));
    }
}
