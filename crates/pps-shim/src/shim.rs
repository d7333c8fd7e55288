use std::fmt::Write as _;
use std::fs;
use std::io::Write as _;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::markers::{ANCHOR, BOOTSTRAP, IDENTIFIER};

#[derive(Error, Debug)]
pub enum ShimError {
    #[error("No line starting with 'def main(' found in {0}")]
    AnchorNotFound(PathBuf),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// pip's entry module, held in memory between computing and applying edits.
pub struct PipMainFile {
    pub path: PathBuf,
    pub content: String,
}

impl PipMainFile {
    /// Read an existing file. The file is never created.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, ShimError> {
        let path = path.into();
        let content = fs::read_to_string(&path)?;
        Ok(Self { path, content })
    }

    #[must_use]
    pub fn is_inserted(&self) -> bool {
        self.content.contains(IDENTIFIER)
    }

    pub fn insert_edit(&self) -> Result<ShimEdit, ShimError> {
        if self.is_inserted() {
            return Ok(ShimEdit::unchanged(&self.content));
        }

        let lines: Vec<&str> = self.content.split_inclusive('\n').collect();
        let anchor = lines
            .iter()
            .position(|line| line.starts_with(ANCHOR))
            .ok_or_else(|| ShimError::AnchorNotFound(self.path.clone()))?;

        let terminator = if lines[anchor].ends_with("\r\n") {
            "\r\n"
        } else {
            "\n"
        };

        let mut modified = String::with_capacity(self.content.len() + BOOTSTRAP.len() + 64);
        modified.push_str(&lines[..anchor].concat());
        modified.push_str(IDENTIFIER);
        modified.push_str(terminator);
        for line in BOOTSTRAP.lines() {
            modified.push_str(line);
            modified.push_str(terminator);
        }
        modified.push_str(&lines[anchor..].concat());

        Ok(ShimEdit {
            original: self.content.clone(),
            modified,
            changes: vec![format!("Insert shim above line {}", anchor + 1)],
        })
    }

    /// Delete everything from the identifier line up to, not including, the
    /// anchor line that follows it.
    pub fn remove_edit(&self) -> Result<ShimEdit, ShimError> {
        if !self.is_inserted() {
            return Ok(ShimEdit::unchanged(&self.content));
        }

        let lines: Vec<&str> = self.content.split_inclusive('\n').collect();
        let mut bounds = lines
            .iter()
            .enumerate()
            .filter(|(_, line)| line.starts_with(IDENTIFIER) || line.starts_with(ANCHOR))
            .map(|(idx, _)| idx);

        let (Some(start), Some(end)) = (bounds.next(), bounds.next()) else {
            return Err(ShimError::AnchorNotFound(self.path.clone()));
        };

        let mut modified = lines[..start].concat();
        modified.push_str(&lines[end..].concat());

        Ok(ShimEdit {
            original: self.content.clone(),
            modified,
            changes: vec![format!("Remove shim from lines {}-{}", start + 1, end)],
        })
    }

    pub fn apply_edit(&mut self, edit: &ShimEdit) -> Result<(), ShimError> {
        if !edit.has_changes() {
            return Ok(());
        }

        write_atomic(&self.path, edit.modified.as_bytes())?;
        self.content.clone_from(&edit.modified);

        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShimEdit {
    pub original: String,
    pub modified: String,
    pub changes: Vec<String>,
}

impl ShimEdit {
    fn unchanged(content: &str) -> Self {
        Self {
            original: content.to_string(),
            modified: content.to_string(),
            changes: vec![],
        }
    }

    #[must_use]
    pub fn has_changes(&self) -> bool {
        !self.changes.is_empty()
    }

    #[must_use]
    pub fn diff_preview(&self) -> String {
        if !self.has_changes() {
            return "No changes needed.".to_string();
        }

        let mut preview = String::new();

        for change in &self.changes {
            let _ = writeln!(preview, "+ {change}");
        }

        preview
    }
}

// The temporary file lives next to the target so the final rename never
// crosses filesystems; the target is either fully replaced or untouched.
// Symlinks are resolved first so the file they point to is the one replaced.
fn write_atomic(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let path = &fs::canonicalize(path)?;
    let parent = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let permissions = fs::metadata(path)?.permissions();

    let mut temp = tempfile::Builder::new()
        .prefix(".pytorch-pip-shim.")
        .suffix(".tmp")
        .tempfile_in(parent)?;
    temp.write_all(data)?;
    temp.as_file().sync_all()?;
    temp.as_file().set_permissions(permissions)?;

    temp.persist(path).map_err(|error| error.error)?;
    Ok(())
}

pub fn is_inserted(path: &Path) -> Result<bool, ShimError> {
    Ok(PipMainFile::load(path)?.is_inserted())
}

/// Insert the shim above pip's `main`. Does nothing if already inserted.
pub fn insert(path: &Path) -> Result<(), ShimError> {
    let mut file = PipMainFile::load(path)?;
    let edit = file.insert_edit()?;
    if !edit.has_changes() {
        log::debug!("Shim already inserted into {}", path.display());
        return Ok(());
    }

    file.apply_edit(&edit)?;
    log::info!("Inserted shim into {}", path.display());
    Ok(())
}

/// Remove a previously inserted shim. Does nothing if none is present.
pub fn remove(path: &Path) -> Result<(), ShimError> {
    let mut file = PipMainFile::load(path)?;
    let edit = file.remove_edit()?;
    if !edit.has_changes() {
        log::debug!("No shim to remove from {}", path.display());
        return Ok(());
    }

    file.apply_edit(&edit)?;
    log::info!("Removed shim from {}", path.display());
    Ok(())
}
