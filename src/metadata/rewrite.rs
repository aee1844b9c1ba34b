// Copyright 2025 Brian Langenberger
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Rewriting FLAC files through a sibling temporary file
//!
//! Edits which change the total size of a file's metadata
//! cannot be performed in place, so the updated file is
//! assembled in a temporary file beside the original and
//! renamed over it in one step.  A failure at any point
//! removes the temporary file and leaves the original alone.

use std::fs::{File, FileTimes, OpenOptions, Permissions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

const TEMPFILE_SUFFIX: &str = ".metadata_edit";

/// A temporary file beside the one being rewritten
///
/// Dropping the value without calling [`Tempfile::persist`]
/// removes the temporary file from disk.
pub struct Tempfile {
    file: File,
    path: PathBuf,
    persisted: bool,
}

impl Tempfile {
    /// Creates temporary file alongside the given original
    ///
    /// The temporary file must live in the same directory
    /// as the original so that the final rename never
    /// crosses filesystems.
    pub fn create(original: &Path) -> std::io::Result<Self> {
        let mut path = original.as_os_str().to_owned();
        path.push(TEMPFILE_SUFFIX);
        let path = PathBuf::from(path);

        Ok(Self {
            file: OpenOptions::new()
                .read(true)
                .write(true)
                .create(true)
                .truncate(true)
                .open(&path)?,
            path,
            persisted: false,
        })
    }

    /// The file being assembled
    pub fn writer(&mut self) -> &mut File {
        &mut self.file
    }

    /// Copies an exact number of bytes from the reader
    pub fn copy_from<R: Read>(&mut self, r: &mut R, bytes: u64) -> std::io::Result<()> {
        match std::io::copy(&mut r.by_ref().take(bytes), &mut self.file)? {
            copied if copied == bytes => Ok(()),
            _ => Err(std::io::ErrorKind::UnexpectedEof.into()),
        }
    }

    /// Copies all remaining bytes from the reader
    pub fn copy_to_end<R: Read>(&mut self, r: &mut R) -> std::io::Result<u64> {
        std::io::copy(r, &mut self.file)
    }

    /// Updates the `last` flag of the block header at the given offset
    ///
    /// The flag is the high bit of the byte at that offset.
    pub fn set_last_flag(&mut self, offset: u64, last: bool) -> std::io::Result<()> {
        let mut byte = [0];
        self.file.seek(SeekFrom::Start(offset))?;
        self.file.read_exact(&mut byte)?;

        if last {
            byte[0] |= 0x80;
        } else {
            byte[0] &= 0x7f;
        }

        self.file.seek(SeekFrom::Start(offset))?;
        self.file.write_all(&byte)
    }

    /// Renames the temporary file over the original
    pub fn persist(mut self, original: &Path) -> std::io::Result<()> {
        self.file.flush()?;
        std::fs::rename(&self.path, original)?;
        self.persisted = true;
        Ok(())
    }
}

impl Drop for Tempfile {
    fn drop(&mut self) {
        if !self.persisted {
            let _ = std::fs::remove_file(&self.path);
        }
    }
}

/// A file's saved permissions and timestamps
///
/// Rewriting a file through a rename replaces its metadata
/// along with its contents, so callers who want the edit to
/// be invisible beyond the blocks themselves capture the
/// stats beforehand and reapply them afterwards.
pub struct FileStats {
    permissions: Permissions,
    accessed: SystemTime,
    modified: SystemTime,
}

impl FileStats {
    /// Captures the file's current permissions and timestamps
    pub fn capture(path: &Path) -> std::io::Result<Self> {
        let metadata = std::fs::metadata(path)?;
        Ok(Self {
            permissions: metadata.permissions(),
            accessed: metadata.accessed()?,
            modified: metadata.modified()?,
        })
    }

    /// Reapplies the captured permissions and timestamps
    pub fn apply(&self, path: &Path) -> std::io::Result<()> {
        std::fs::set_permissions(path, self.permissions.clone())?;
        OpenOptions::new().write(true).open(path)?.set_times(
            FileTimes::new()
                .set_accessed(self.accessed)
                .set_modified(self.modified),
        )
    }
}
