//! Safety utilities to prevent overwriting an input table.
//!
//! Every binary reads one or more tables and writes one; these checks run
//! before any row is processed so a mistyped output path cannot clobber a
//! source.

use anyhow::{bail, Result};
use std::path::{Path, PathBuf};

/// Path used for comparison: canonical if it exists, otherwise as given.
fn comparable(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

/// Validates that an output path is safe to create or overwrite.
///
/// Checks:
/// - Output must not be an existing directory
/// - Output cannot be the same file as any of the provided source paths
///   (compared literally and after resolving symlinks / relative segments)
pub fn validate_output_path(output: &Path, source_paths: &[&Path]) -> Result<()> {
    if output.is_dir() {
        bail!(
            "Safety check failed: output '{}' is a directory",
            output.display()
        );
    }

    let resolved_output = comparable(output);
    for source in source_paths {
        if output == *source || resolved_output == comparable(source) {
            bail!(
                "Safety check failed: output '{}' cannot be the same as source '{}'",
                output.display(),
                source.display()
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_valid_output() {
        let output = PathBuf::from("/tmp/lyrics_enriched_tracks.csv");
        let source = PathBuf::from("/data/charts.csv");
        assert!(validate_output_path(&output, &[&source]).is_ok());
    }

    #[test]
    fn test_output_equals_source() {
        let path = PathBuf::from("/data/charts.csv");
        let result = validate_output_path(&path, &[&path]);
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("cannot be the same as source"));
    }

    #[test]
    fn test_output_equals_source_after_resolving() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("charts.csv");
        fs::write(&source, "track_name,artist_names\n").unwrap();
        let output = dir.path().join(".").join("charts.csv");
        assert!(validate_output_path(&output, &[&source]).is_err());
    }

    #[test]
    fn test_output_directory_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("charts.csv");
        let result = validate_output_path(dir.path(), &[&source]);
        assert!(result.unwrap_err().to_string().contains("is a directory"));
    }

    #[test]
    fn test_any_of_several_sources() {
        let a = PathBuf::from("/data/a.csv");
        let b = PathBuf::from("/data/b.csv");
        assert!(validate_output_path(&b, &[&a, &b]).is_err());
    }
}
