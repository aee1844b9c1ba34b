// Copyright 2025 Brian Langenberger
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Editing metadata blocks directly on disk
//!
//! [`SimpleIterator`] walks a FLAC file's metadata blocks
//! one at a time while keeping at most one block in memory,
//! and its editing operations prefer overwriting blocks in
//! place over rewriting the whole file whenever the geometry
//! allows it, often by resizing a neighboring PADDING block.

use super::{
    Block, BlockHeader, BlockSize, BlockType, Padding, read_block_body, read_flac_tag,
    rewrite::{FileStats, Tempfile},
};
use crate::Error;
use arrayvec::ArrayVec;
use bitstream_io::{BigEndian, BitRead, BitReader, BitWrite, BitWriter};
use std::cmp::Ordering;
use std::fs::{File, OpenOptions};
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

/// Most deeply nested position bookmarks supported
const MAX_PUSH_DEPTH: usize = 5;

/// A cursor over the metadata blocks of a FLAC file on disk
///
/// The iterator is always positioned at some block,
/// beginning at the file's STREAMINFO block,
/// and only that block's header is held in memory.
/// Fetching or replacing a block's contents happens
/// at the current position.
///
/// Whole-file rewrites happen through a temporary file
/// beside the original, renamed over it in a single step,
/// so an edit either completes or leaves the file unchanged.
pub struct SimpleIterator {
    file: File,
    path: PathBuf,
    writable: bool,
    stats: Option<FileStats>,
    first_offset: u64,
    offset: u64,
    pushed: ArrayVec<u64, MAX_PUSH_DEPTH>,
    header: BlockHeader,
}

impl SimpleIterator {
    /// Opens the FLAC file at the given path
    /// and positions ourself at its STREAMINFO block
    ///
    /// Unless `read_only` is set, the file is opened for
    /// both reading and writing, quietly falling back to
    /// read-only access if we lack write permission.
    /// If `preserve_stats` is set, the file's permissions
    /// and timestamps are captured at open time and
    /// reapplied after any whole-file rewrite.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingFlacTag`] if the file does not
    /// begin with a `"fLaC"` tag (possibly after an ID3v2 tag),
    /// [`Error::MissingStreaminfo`] if its first metadata block
    /// is not STREAMINFO, or any I/O error from opening the file.
    pub fn open<P: AsRef<Path>>(
        path: P,
        read_only: bool,
        preserve_stats: bool,
    ) -> Result<Self, Error> {
        let path = path.as_ref().to_path_buf();

        let (mut file, writable) = if read_only {
            (File::open(&path)?, false)
        } else {
            match OpenOptions::new().read(true).write(true).open(&path) {
                Ok(file) => (file, true),
                Err(err) if err.kind() == std::io::ErrorKind::PermissionDenied => {
                    (File::open(&path)?, false)
                }
                Err(err) => return Err(err.into()),
            }
        };

        let stats = (preserve_stats && writable)
            .then(|| FileStats::capture(&path))
            .transpose()?;

        read_flac_tag(&mut file)?;
        let first_offset = file.stream_position()?;
        let header = Self::header_at(&mut file, first_offset)?;

        if header.block_type != BlockType::Streaminfo {
            return Err(Error::MissingStreaminfo);
        }

        Ok(Self {
            file,
            path,
            writable,
            stats,
            first_offset,
            offset: first_offset,
            pushed: ArrayVec::new(),
            header,
        })
    }

    /// Whether the file was opened with write access
    pub fn is_writable(&self) -> bool {
        self.writable
    }

    /// The type of the block at the current position
    pub fn block_type(&self) -> BlockType {
        self.header.block_type
    }

    /// The size of the current block's contents, in bytes,
    /// not including its header
    pub fn block_length(&self) -> BlockSize {
        self.header.size
    }

    /// Whether the current block is the file's final metadata block
    pub fn is_last(&self) -> bool {
        self.header.last
    }

    /// The current block's offset in the file, in bytes,
    /// measured to the start of its header
    pub fn block_offset(&self) -> u64 {
        self.offset
    }

    /// Advances to the next block, if any
    ///
    /// Returns `Ok(false)` if already at the final block,
    /// in which case our position is unchanged.
    pub fn next(&mut self) -> Result<bool, Error> {
        if self.header.last {
            Ok(false)
        } else {
            self.offset = self.next_offset();
            self.read_header()?;
            Ok(true)
        }
    }

    /// Retreats to the previous block, if any
    ///
    /// Because block headers hold no backwards pointers,
    /// this rescans headers forward from the first block.
    /// Returns `Ok(false)` if already at the first block,
    /// in which case our position is unchanged.
    pub fn prev(&mut self) -> Result<bool, Error> {
        if self.offset == self.first_offset {
            Ok(false)
        } else {
            self.seek_before(self.offset)?;
            Ok(true)
        }
    }

    /// Returns the entire block at the current position
    pub fn get_block(&mut self) -> Result<Block, Error> {
        self.file.seek(SeekFrom::Start(self.body_offset()))?;
        read_block_body(BufReader::new(&mut self.file), &self.header)
    }

    /// Returns the current APPLICATION block's ID
    /// without reading the rest of its contents
    ///
    /// Returns `Ok(None)` if the current block is not
    /// an APPLICATION block.
    pub fn application_id(&mut self) -> Result<Option<u32>, Error> {
        match self.header.block_type {
            BlockType::Application => {
                self.file.seek(SeekFrom::Start(self.body_offset()))?;
                let mut id = [0; 4];
                self.file.read_exact(&mut id)?;
                Ok(Some(u32::from_be_bytes(id)))
            }
            _ => Ok(None),
        }
    }

    /// Replaces the block at the current position
    ///
    /// A block of unchanged size is overwritten in place.
    /// If `use_padding` is set, size changes are absorbed
    /// by shrinking, growing or creating an adjacent
    /// PADDING block when the geometry allows,
    /// leaving the rest of the file untouched.
    /// Otherwise the whole file is rewritten.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotWritable`] if the file was opened
    /// without write access,
    /// [`Error::MissingStreaminfo`] if attempting to replace
    /// the first block with something other than STREAMINFO,
    /// [`Error::MultipleStreaminfo`] if attempting to place
    /// a STREAMINFO block anywhere else,
    /// or any I/O error from rewriting the file.
    pub fn set_block(&mut self, block: &Block, use_padding: bool) -> Result<(), Error> {
        self.check_writable()?;
        self.check_streaminfo_position(block)?;

        let current = self.header.size;
        let new_size = block.size()?;

        match new_size.cmp(&current) {
            Ordering::Equal => {
                let last = self.header.last;
                self.write_stationary(block, last)
            }
            Ordering::Less => {
                // a PADDING block takes up the slack,
                // if there's room for its header
                match use_padding
                    .then(|| new_size.checked_add(BlockHeader::SIZE))
                    .flatten()
                    .and_then(|used| current.checked_sub(used))
                {
                    Some(size) => {
                        let last = self.header.last;
                        self.write_stationary_with_padding(block, Padding { size }, last)
                    }
                    None => self.rewrite_whole_file(Some(block), false),
                }
            }
            Ordering::Greater => {
                match ((use_padding && !self.header.last), new_size.checked_sub(current)) {
                    (true, Some(extra)) => self.grow_into_padding(block, extra),
                    _ => self.rewrite_whole_file(Some(block), false),
                }
            }
        }
    }

    /// Inserts a new block following the current position
    /// and leaves ourself positioned at the new block
    ///
    /// If `use_padding` is set and the next block is a
    /// PADDING block large enough to hold the new block,
    /// the new block takes its place or its leading bytes.
    /// Otherwise the whole file is rewritten.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotWritable`] if the file was opened
    /// without write access,
    /// [`Error::MultipleStreaminfo`] if the new block is
    /// a STREAMINFO block,
    /// or any I/O error from rewriting the file.
    pub fn insert_block_after(&mut self, block: &Block, use_padding: bool) -> Result<(), Error> {
        self.check_writable()?;

        if matches!(block, Block::Streaminfo(_)) {
            return Err(Error::MultipleStreaminfo);
        }

        let new_size = block.size()?;

        if use_padding && !self.header.last {
            self.push();
            self.next()?;
            let next = self.header;

            if next.block_type == BlockType::Padding {
                if next.size == new_size {
                    // new block takes over the PADDING block outright
                    self.pushed.pop();
                    return self.write_stationary(block, next.last);
                } else if let Some(size) = next
                    .size
                    .checked_sub(new_size)
                    .and_then(|s| s.checked_sub(BlockHeader::SIZE))
                {
                    // new block takes the front of the PADDING block
                    self.pushed.pop();
                    return self.write_stationary_with_padding(block, Padding { size }, next.last);
                }
            }

            self.pop()?;
        }

        self.rewrite_whole_file(Some(block), true)?;
        self.next().map(|_| ())
    }

    /// Removes the block at the current position
    /// and leaves ourself positioned at the previous block
    ///
    /// If `use_padding` is set, the block is overwritten
    /// with a PADDING block of the same total size,
    /// leaving the rest of the file untouched.
    /// Otherwise the whole file is rewritten.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotWritable`] if the file was opened
    /// without write access,
    /// [`Error::MissingStreaminfo`] if attempting to remove
    /// the STREAMINFO block,
    /// or any I/O error from rewriting the file.
    pub fn delete_block(&mut self, use_padding: bool) -> Result<(), Error> {
        self.check_writable()?;

        if self.offset == self.first_offset {
            return Err(Error::MissingStreaminfo);
        }

        if use_padding {
            let size = self.header.size;
            self.set_block(&Block::Padding(Padding { size }), false)?;
            self.prev().map(|_| ())
        } else {
            self.rewrite_whole_file(None, false)
        }
    }

    fn check_writable(&self) -> Result<(), Error> {
        self.writable.then_some(()).ok_or(Error::NotWritable)
    }

    fn check_streaminfo_position(&self, block: &Block) -> Result<(), Error> {
        match (self.offset == self.first_offset, block) {
            (true, Block::Streaminfo(_)) => Ok(()),
            (true, _) => Err(Error::MissingStreaminfo),
            (false, Block::Streaminfo(_)) => Err(Error::MultipleStreaminfo),
            (false, _) => Ok(()),
        }
    }

    /// Offset of the current block's contents
    fn body_offset(&self) -> u64 {
        self.offset + u64::from(BlockHeader::SIZE)
    }

    /// Offset of the header which follows the current block
    fn next_offset(&self) -> u64 {
        self.body_offset() + u64::from(self.header.size)
    }

    fn header_at(file: &mut File, offset: u64) -> Result<BlockHeader, Error> {
        file.seek(SeekFrom::Start(offset))?;
        BitReader::endian(&mut *file, BigEndian).parse()
    }

    fn read_header(&mut self) -> Result<(), Error> {
        self.header = Self::header_at(&mut self.file, self.offset)?;
        Ok(())
    }

    /// Repositions ourself at the block whose successor
    /// starts at `target`, by scanning headers forward
    /// from the first block
    fn seek_before(&mut self, target: u64) -> Result<(), Error> {
        self.offset = self.first_offset;
        self.read_header()?;
        while self.next_offset() < target {
            self.offset = self.next_offset();
            self.read_header()?;
        }
        Ok(())
    }

    /// Bookmarks the current position
    fn push(&mut self) {
        self.pushed.push(self.offset);
    }

    /// Returns to the most recent bookmark, if any
    fn pop(&mut self) -> Result<(), Error> {
        if let Some(offset) = self.pushed.pop() {
            self.offset = offset;
            self.read_header()?;
        }
        Ok(())
    }

    /// Overwrites the current block in place
    fn write_stationary(&mut self, block: &Block, last: bool) -> Result<(), Error> {
        self.file.seek(SeekFrom::Start(self.offset))?;
        BitWriter::endian(&mut self.file, BigEndian).build_using(block, last)?;
        self.read_header()
    }

    /// Overwrites the current block in place,
    /// followed immediately by a PADDING block
    fn write_stationary_with_padding(
        &mut self,
        block: &Block,
        padding: Padding,
        last: bool,
    ) -> Result<(), Error> {
        self.file.seek(SeekFrom::Start(self.offset))?;
        let mut w = BitWriter::endian(&mut self.file, BigEndian);
        w.build_using(block, false)?;
        w.build_using(&Block::Padding(padding), last)?;
        self.read_header()
    }

    /// Grows the current block by `extra` bytes
    /// at the expense of a PADDING block which follows it,
    /// falling back to a whole-file rewrite if the next
    /// block is not a sufficiently large PADDING block
    fn grow_into_padding(&mut self, block: &Block, extra: BlockSize) -> Result<(), Error> {
        self.push();
        self.next()?;
        let next = self.header;
        self.pop()?;

        if next.block_type == BlockType::Padding {
            if next.size.checked_add(BlockHeader::SIZE) == Some(extra) {
                // the whole PADDING block is consumed
                self.write_stationary(block, next.last)
            } else if let Some(size) = next.size.checked_sub(extra) {
                // the front of the PADDING block is consumed
                self.write_stationary_with_padding(block, Padding { size }, next.last)
            } else {
                self.rewrite_whole_file(Some(block), false)
            }
        } else {
            self.rewrite_whole_file(Some(block), false)
        }
    }

    /// Rebuilds the file in a sibling temporary file
    /// and renames it over the original
    ///
    /// `Some(block)` replaces the current block,
    /// or follows it if `append` is also set,
    /// while `None` removes it.
    /// Afterwards we are positioned back at our original
    /// block, or at its predecessor if it was removed.
    fn rewrite_whole_file(&mut self, block: Option<&Block>, append: bool) -> Result<(), Error> {
        let save_offset = self.offset;
        let body_end = self.next_offset();
        let last = self.header.last;

        // where a header's "last" flag needs adjusting, if anywhere
        let fixup = if append && last {
            // the appended block becomes the new last block
            Some((save_offset, false))
        } else if block.is_none() && last {
            // removing the last block makes its predecessor last
            self.push();
            self.prev()?;
            let prev_offset = self.offset;
            self.pop()?;
            Some((prev_offset, true))
        } else {
            None
        };

        let mut tempfile = Tempfile::create(&self.path)?;
        self.file.seek(SeekFrom::Start(0))?;
        tempfile.copy_from(&mut self.file, if append { body_end } else { save_offset })?;

        if let Some(block) = block {
            BitWriter::endian(tempfile.writer(), BigEndian).build_using(block, last)?;
        }

        self.file.seek(SeekFrom::Start(body_end))?;
        tempfile.copy_to_end(&mut self.file)?;

        if let Some((offset, last)) = fixup {
            tempfile.set_last_flag(offset, last)?;
        }

        tempfile.persist(&self.path)?;

        if let Some(stats) = &self.stats {
            stats.apply(&self.path)?;
        }

        self.file = OpenOptions::new()
            .read(true)
            .write(self.writable)
            .open(&self.path)?;

        if block.is_some() {
            self.offset = save_offset;
            self.read_header()
        } else {
            self.seek_before(save_offset)
        }
    }
}
