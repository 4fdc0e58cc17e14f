//! File-based storage for learned commands

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::application::errors::StorageError;
use crate::domain::traits::{CannedCommands, CommandStore};

/// JSON file store: `{ "name": ["line", "line"] }`, two-space indented.
///
/// Writes go to a temporary file next to the target which is then renamed
/// over it, so readers only ever see a complete document.
pub struct JsonStore {
    path: PathBuf,
}

impl JsonStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn dir(&self) -> &Path {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }
}

impl CommandStore for JsonStore {
    fn read(&self) -> Result<CannedCommands, StorageError> {
        let file = File::open(&self.path)?;
        let content = serde_json::from_reader(BufReader::new(file))?;
        Ok(content)
    }

    fn write(&self, commands: &CannedCommands) -> Result<(), StorageError> {
        let mut file = NamedTempFile::new_in(self.dir())?;
        {
            let mut writer = BufWriter::new(&mut file);
            serde_json::to_writer_pretty(&mut writer, commands)?;
            writer.write_all(b"\n")?;
            writer.flush()?;
        }
        file.as_file().sync_all()?;
        file.persist(&self.path).map_err(|e| e.error)?;
        tracing::debug!("Wrote {} commands to {}", commands.len(), self.path.display());
        Ok(())
    }
}
