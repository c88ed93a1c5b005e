//! Document input, script output, and working directory management.

use crate::error::{NarrationError, Result};
use std::fs;
use std::path::{Path, PathBuf};

const UTF8_BOM: char = '\u{feff}';

/// Read a whole document as UTF-8. A leading BOM is dropped.
pub fn read_document(path: &Path) -> Result<String> {
    let content = fs::read_to_string(path).map_err(|e| NarrationError::io("read", path, e))?;

    Ok(match content.strip_prefix(UTF8_BOM) {
        Some(stripped) => stripped.to_string(),
        None => content,
    })
}

/// Create `dir` if needed and remove everything inside it.
pub fn prepare_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).map_err(|e| NarrationError::io("create directory", dir, e))?;

    let entries = fs::read_dir(dir).map_err(|e| NarrationError::io("list directory", dir, e))?;
    for entry in entries {
        let path = entry
            .map_err(|e| NarrationError::io("list directory", dir, e))?
            .path();
        let removed = if path.is_dir() {
            fs::remove_dir_all(&path)
        } else {
            fs::remove_file(&path)
        };
        removed.map_err(|e| NarrationError::io("remove", &path, e))?;
    }

    Ok(())
}

/// All `*.txt` documents directly inside `dir`, sorted by path.
pub fn scan_documents(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(dir).map_err(|e| NarrationError::io("list directory", dir, e))?;

    let mut documents = Vec::new();
    for entry in entries {
        let path = entry
            .map_err(|e| NarrationError::io("list directory", dir, e))?
            .path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "txt") {
            documents.push(path);
        }
    }

    documents.sort();
    Ok(documents)
}

/// Write script lines to `path`, one per line.
pub fn write_script(lines: &[String], path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| NarrationError::io("create directory", parent, e))?;
    }

    let mut content = String::with_capacity(lines.iter().map(|l| l.len() + 1).sum());
    for line in lines {
        content.push_str(line);
        content.push('\n');
    }

    fs::write(path, content).map_err(|e| NarrationError::io("write", path, e))
}

/// File name without directory or extension, used to name outputs.
pub fn document_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string())
}
