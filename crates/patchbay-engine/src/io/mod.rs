use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum IoError {
    #[error("File not found: {0}")]
    NotFound(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid patch directory: {0}")]
    InvalidDirectory(String),
}

/// Decode patch text. Pd writes whatever bytes the symbols contain, so
/// anything that is not valid UTF-8 is read as Latin-1.
pub fn decode_text(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => bytes.iter().map(|&b| char::from(b)).collect(),
    }
}

/// Read a patch file as raw bytes. Text formats go through [`decode_text`]
/// later; snapshots are binary, and the cache hashes the bytes as read.
pub fn read_patch_file(path: &Path) -> Result<Vec<u8>, IoError> {
    if !path.is_file() {
        return Err(IoError::NotFound(path.to_path_buf()));
    }
    Ok(fs::read(path)?)
}

/// Write converted output
pub fn write_output(path: &Path, content: &[u8]) -> Result<(), IoError> {
    // Create parent directories if they don't exist
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(IoError::Io)?;
    }

    fs::write(path, content).map_err(IoError::Io)
}

/// Every file under `root` with the given extension, sorted
pub fn scan_patch_files(root: &Path, extension: &str) -> Result<Vec<PathBuf>, IoError> {
    if !root.is_dir() {
        return Err(IoError::InvalidDirectory(format!(
            "{} is not a directory",
            root.display()
        )));
    }

    let mut files = Vec::new();
    scan_directory_recursive(root, extension, &mut files)?;
    files.sort();
    Ok(files)
}

fn scan_directory_recursive(
    dir: &Path,
    extension: &str,
    files: &mut Vec<PathBuf>,
) -> Result<(), IoError> {
    let entries = fs::read_dir(dir).map_err(IoError::Io)?;

    for entry in entries {
        let entry = entry.map_err(IoError::Io)?;
        let path = entry.path();

        if path.is_dir() {
            scan_directory_recursive(&path, extension, files)?;
        } else if let Some(ext) = path.extension()
            && ext == extension
        {
            files.push(path);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_scan_nested_directories() {
        // Given a directory with patches at two levels and a stray file
        let dir = TempDir::new().unwrap();
        create_test_file(&dir, "b.pd", "#N canvas 0 50 450 300 12;");
        create_test_file(&dir, "sub/a.pd", "#N canvas 0 50 450 300 12;");
        create_test_file(&dir, "notes.txt", "not a patch");

        // When scanning for patches
        let files = scan_patch_files(dir.path(), "pd").unwrap();

        // Then both patches are found, sorted, and nothing else
        assert_eq!(files, vec![dir.path().join("b.pd"), dir.path().join("sub/a.pd")]);
    }

    #[test]
    fn test_handle_invalid_directory() {
        let result = scan_patch_files(Path::new("/this/path/does/not/exist"), "pd");

        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("not a directory"));
    }

    #[test]
    fn test_latin1_fallback() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("old.pd");
        fs::write(&path, b"#X text 10 10 caf\xe9;").unwrap();

        let bytes = read_patch_file(&path).unwrap();

        assert_eq!(bytes, b"#X text 10 10 caf\xe9;");
        assert_eq!(decode_text(&bytes), "#X text 10 10 café;");
    }

    #[test]
    fn test_directory_is_not_a_patch_file() {
        let dir = TempDir::new().unwrap();

        let result = read_patch_file(dir.path());

        assert!(matches!(result, Err(IoError::NotFound(_))));
    }

    #[test]
    fn test_missing_file() {
        let result = read_patch_file(Path::new("/no/such/patch.pd"));

        assert!(matches!(result, Err(IoError::NotFound(_))));
    }

    #[test]
    fn test_write_creates_parent_directories() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out/deep/patch.json");

        write_output(&path, b"{}").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "{}");
    }
}
