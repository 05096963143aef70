//! Per-chat append-only message archive.
//!
//! Layout on disk:
//! - `<archive_dir>/<chat_id>.json`: one raw message JSON object per line
//! - `<export_dir>/<chat_id>.zip`: export artifact holding `<chat_id>.json`

use std::{
    fs::{self, File, OpenOptions},
    io::{self, Write},
    path::{Path, PathBuf},
};

use serde_json::Value;
use zip::{write::FileOptions, CompressionMethod, ZipWriter};

use crate::{domain::ChatId, errors::Error, Result};

/// Archive storage port.
pub trait ArchiveStore: Send + Sync {
    /// Append one raw message record to the chat's log, creating the log if needed.
    fn append(&self, chat_id: ChatId, record: &Value) -> Result<()>;

    /// Remove the chat's whole log. Deleting an absent log succeeds.
    fn delete(&self, chat_id: ChatId) -> Result<()>;

    /// Build a fresh export artifact for the chat and return its path.
    fn export(&self, chat_id: ChatId) -> Result<PathBuf>;
}

/// JSON-lines file archive.
#[derive(Clone, Debug)]
pub struct FileArchive {
    archive_dir: PathBuf,
    export_dir: PathBuf,
}

impl FileArchive {
    pub fn new(archive_dir: impl Into<PathBuf>, export_dir: impl Into<PathBuf>) -> Self {
        Self {
            archive_dir: archive_dir.into(),
            export_dir: export_dir.into(),
        }
    }

    pub fn record_file_name(chat_id: ChatId) -> String {
        format!("{}.json", chat_id.0)
    }

    pub fn record_path(&self, chat_id: ChatId) -> PathBuf {
        self.archive_dir.join(Self::record_file_name(chat_id))
    }

    pub fn export_path(&self, chat_id: ChatId) -> PathBuf {
        self.export_dir.join(format!("{}.zip", chat_id.0))
    }
}

impl ArchiveStore for FileArchive {
    fn append(&self, chat_id: ChatId, record: &Value) -> Result<()> {
        let line = serde_json::to_string(record)?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.record_path(chat_id))?;
        writeln!(file, "{line}")?;
        Ok(())
    }

    fn delete(&self, chat_id: ChatId) -> Result<()> {
        match fs::remove_file(self.record_path(chat_id)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::Io(e)),
        }
    }

    fn export(&self, chat_id: ChatId) -> Result<PathBuf> {
        let src_path = self.record_path(chat_id);
        let mut src = match File::open(&src_path) {
            Ok(f) => f,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(Error::ArchiveMissing {
                    chat_id: chat_id.0,
                    path: src_path,
                })
            }
            Err(e) => return Err(Error::Io(e)),
        };

        let out_path = self.export_path(chat_id);
        write_single_entry_zip(&out_path, &Self::record_file_name(chat_id), &mut src)?;
        Ok(out_path)
    }
}

/// Write `entry_name` with the contents of `src` as the only entry of a new zip at `out`.
///
/// Any existing file at `out` is replaced.
fn write_single_entry_zip(out: &Path, entry_name: &str, src: &mut impl io::Read) -> Result<()> {
    let f = File::create(out)?;
    let mut zw = ZipWriter::new(f);
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

    zw.start_file(entry_name, options)
        .map_err(|e| Error::External(format!("zip error: {e}")))?;
    io::copy(src, &mut zw)?;
    zw.finish()
        .map_err(|e| Error::External(format!("zip error: {e}")))?;
    Ok(())
}
