//! Input file handling and path utilities.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};

/// Supported image extensions for batch processing
pub const SUPPORTED_EXTENSIONS: &[&str] = &["tif", "tiff", "png"];

/// Expand a list of inputs (files and directories) into a list of image files.
///
/// Directories are scanned for supported image files. If `recursive` is
/// true, subdirectories are also scanned. The result is sorted.
pub fn expand_inputs(inputs: &[PathBuf], recursive: bool) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for input in inputs {
        if input.is_dir() {
            collect_images_from_dir(input, recursive, &mut files)?;
        } else if input.is_file() {
            files.push(input.clone());
        } else {
            bail!("path not found: {}", input.display());
        }
    }

    files.sort();
    Ok(files)
}

fn collect_images_from_dir(dir: &Path, recursive: bool, files: &mut Vec<PathBuf>) -> Result<()> {
    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory {}", dir.display()))?;

    for entry in entries {
        let path = entry.context("error reading directory entry")?.path();

        if path.is_dir() && recursive {
            collect_images_from_dir(&path, recursive, files)?;
        } else if path.is_file() && has_supported_extension(&path) {
            files.push(path);
        }
    }
    Ok(())
}

fn has_supported_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|ext| SUPPORTED_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Directory outputs for `input` go to: `out` if given, else next to the input.
pub fn output_dir_for(input: &Path, out: Option<&Path>) -> PathBuf {
    match out {
        Some(dir) => dir.to_path_buf(),
        None => input
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."))
            .to_path_buf(),
    }
}

/// `<dir>/<stem><suffix>`
pub fn derived_path(input: &Path, dir: &Path, suffix: &str) -> Result<PathBuf> {
    let stem = input
        .file_stem()
        .ok_or_else(|| anyhow!("invalid input filename: {}", input.display()))?
        .to_string_lossy();
    Ok(dir.join(format!("{}{}", stem, suffix)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_expand_inputs_filters_and_sorts() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("b.tif"), b"").unwrap();
        fs::write(dir.path().join("a.PNG"), b"").unwrap();
        fs::write(dir.path().join("notes.txt"), b"").unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("nested").join("c.tiff"), b"").unwrap();

        let flat = expand_inputs(&[dir.path().to_path_buf()], false).unwrap();
        let names: Vec<_> = flat
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.PNG", "b.tif"]);

        let deep = expand_inputs(&[dir.path().to_path_buf()], true).unwrap();
        assert_eq!(deep.len(), 3);
    }

    #[test]
    fn test_expand_inputs_missing_path() {
        let err = expand_inputs(&[PathBuf::from("/definitely/not/here.tif")], false).unwrap_err();
        assert!(err.to_string().contains("path not found"));
    }

    #[test]
    fn test_output_paths() {
        let input = Path::new("/scans/chest_01.tif");
        assert_eq!(output_dir_for(input, None), PathBuf::from("/scans"));
        assert_eq!(
            output_dir_for(input, Some(Path::new("/out"))),
            PathBuf::from("/out")
        );
        assert_eq!(
            derived_path(input, Path::new("/out"), "_enhanced.tif").unwrap(),
            PathBuf::from("/out/chest_01_enhanced.tif")
        );
        assert_eq!(output_dir_for(Path::new("bare.tif"), None), PathBuf::from("."));
    }
}
