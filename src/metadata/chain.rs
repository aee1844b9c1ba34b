// Copyright 2025 Brian Langenberger
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Editing a file's metadata blocks as an in-memory batch
//!
//! [`Chain`] reads all of a file's metadata blocks at once,
//! lets them be edited freely through [`ChainIterator`],
//! and writes them back in a single operation.
//! When the edited blocks come out the same total size
//! as the originals, possibly after adjusting a trailing
//! PADDING block to soak up the difference, the metadata
//! region is overwritten in place and the rest of the
//! file is never touched.

use super::{
    Block, BlockHeader, BlockSize, BlockType, Padding, read_block_body, read_flac_tag,
    rewrite::{FileStats, Tempfile},
    write_block_list, write_blocks,
};
use crate::Error;
use bitstream_io::{BigEndian, BitRead, BitReader};
use std::cmp::Ordering;
use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// All of a FLAC file's metadata blocks, held in memory
///
/// A chain always contains at least one block,
/// the STREAMINFO block, which remains first.
pub struct Chain {
    path: Option<PathBuf>,
    blocks: Vec<Block>,
    first_offset: u64,
    last_offset: u64,
    initial_length: u64,
}

impl Chain {
    /// Reads all metadata blocks from the FLAC file
    /// at the given path
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingFlacTag`] if the file does not
    /// begin with a `"fLaC"` tag (possibly after an ID3v2 tag),
    /// [`Error::MissingStreaminfo`] if its first metadata block
    /// is not STREAMINFO,
    /// [`Error::MultipleStreaminfo`] if STREAMINFO occurs again,
    /// or any error from reading the individual blocks.
    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let mut chain = Self::read_from(BufReader::new(File::open(path.as_ref())?))?;
        chain.path = Some(path.as_ref().to_path_buf());
        Ok(chain)
    }

    /// Reads all metadata blocks from the given FLAC stream
    ///
    /// A chain read this way has no file to write back to,
    /// so [`Chain::write`] will fail with [`Error::NotWritable`],
    /// though [`Chain::write_to`] remains available.
    pub fn read_from<R: Read + Seek>(mut r: R) -> Result<Self, Error> {
        read_flac_tag(&mut r)?;
        let first_offset = r.stream_position()?;

        let mut blocks = Vec::new();

        loop {
            let header: BlockHeader = BitReader::endian(&mut r, BigEndian).parse()?;

            match (blocks.is_empty(), header.block_type) {
                (true, BlockType::Streaminfo) => {}
                (true, _) => return Err(Error::MissingStreaminfo),
                (false, BlockType::Streaminfo) => return Err(Error::MultipleStreaminfo),
                (false, _) => {}
            }

            blocks.push(read_block_body(&mut r, &header)?);

            if header.last {
                break;
            }
        }

        let last_offset = r.stream_position()?;

        Ok(Self {
            path: None,
            blocks,
            first_offset,
            last_offset,
            initial_length: last_offset - first_offset,
        })
    }

    /// Our blocks, in file order
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Returns a cursor over our blocks for editing,
    /// positioned at the STREAMINFO block
    pub fn iter(&mut self) -> ChainIterator<'_> {
        ChainIterator {
            chain: self,
            index: 0,
        }
    }

    /// Merges each run of adjacent PADDING blocks
    /// into a single PADDING block
    ///
    /// The merged block also absorbs the freed headers,
    /// so the blocks' total size is unchanged.
    /// A run whose combined size would overflow the
    /// 24-bit size field is left in multiple pieces.
    pub fn merge_padding(&mut self) {
        let mut merged = Vec::with_capacity(self.blocks.len());

        for block in self.blocks.drain(..) {
            match (merged.last_mut(), block) {
                (Some(Block::Padding(prev)), Block::Padding(next)) => {
                    match prev
                        .size
                        .checked_add(BlockHeader::SIZE)
                        .and_then(|size| size.checked_add(next.size))
                    {
                        Some(size) => prev.size = size,
                        None => merged.push(Block::Padding(next)),
                    }
                }
                (_, block) => merged.push(block),
            }
        }

        self.blocks = merged;
    }

    /// Moves all PADDING blocks to the end of the chain
    /// and merges them into a single PADDING block
    pub fn sort_padding(&mut self) {
        let (padding, rest): (Vec<_>, Vec<_>) = self
            .blocks
            .drain(..)
            .partition(|block| matches!(block, Block::Padding(_)));
        self.blocks = rest;
        self.blocks.extend(padding);
        self.merge_padding();
    }

    /// Whether [`Chain::write`] would need to rewrite
    /// the whole file through a temporary file,
    /// rather than overwriting the metadata region in place
    ///
    /// This performs the same size arithmetic as `write`,
    /// including any PADDING adjustment `use_padding`
    /// would allow, without modifying the chain.
    pub fn check_if_tempfile_needed(&self, use_padding: bool) -> Result<bool, Error> {
        Ok(self.fitted_length(use_padding)? != self.initial_length)
    }

    /// Writes our blocks back to the file we were read from
    ///
    /// If `use_padding` is set and our blocks' total size
    /// differs from the size of the file's metadata region,
    /// a trailing PADDING block is grown, shrunk, created
    /// or removed to make up the difference where possible.
    /// If the sizes then match, the metadata region is
    /// overwritten in place.  Otherwise the whole file is
    /// rebuilt through a temporary file beside the original
    /// and renamed over it in a single step.
    ///
    /// If `preserve_stats` is set, the file's permissions
    /// and timestamps are reapplied after writing.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotWritable`] if we were read from
    /// a raw stream rather than a file,
    /// [`Error::ExcessiveBlockSize`] if any block's contents
    /// have grown beyond what its header can describe,
    /// or any I/O error from writing.
    pub fn write(&mut self, use_padding: bool, preserve_stats: bool) -> Result<(), Error> {
        let path = self.path.clone().ok_or(Error::NotWritable)?;

        let stats = preserve_stats.then(|| FileStats::capture(&path)).transpose()?;

        if use_padding {
            self.fit_padding();
        }

        // all blocks must be writable before the file is touched
        for block in &self.blocks {
            block.size()?;
        }

        let current = self.length()?;

        if current == self.initial_length {
            let mut file = OpenOptions::new().read(true).write(true).open(&path)?;
            file.seek(SeekFrom::Start(self.first_offset))?;
            let mut w = BufWriter::new(&mut file);
            write_block_list(&mut w, &self.blocks)?;
            w.flush().map_err(Error::Io)?;
        } else {
            let mut original = File::open(&path)?;
            let mut tempfile = Tempfile::create(&path)?;
            tempfile.copy_from(&mut original, self.first_offset)?;
            write_block_list(tempfile.writer(), &self.blocks)?;
            original.seek(SeekFrom::Start(self.last_offset))?;
            tempfile.copy_to_end(&mut original)?;
            tempfile.persist(&path)?;

            self.last_offset = self.first_offset + current;
            self.initial_length = current;
        }

        if let Some(stats) = &stats {
            stats.apply(&path)?;
        }

        Ok(())
    }

    /// Writes our blocks to the given writer,
    /// preceded by the `"fLaC"` tag
    pub fn write_to<W: Write>(&self, w: W) -> Result<(), Error> {
        write_blocks(w, &self.blocks)
    }

    /// Total size of our blocks, in bytes, including headers
    fn length(&self) -> Result<u64, Error> {
        self.blocks
            .iter()
            .map(|block| {
                block
                    .size()
                    .map(|size| u64::from(size) + u64::from(BlockHeader::SIZE))
            })
            .sum()
    }

    /// Size of our trailing PADDING block, if we have one
    fn tail_padding(&self) -> Option<BlockSize> {
        match self.blocks.last() {
            Some(Block::Padding(padding)) => Some(padding.size),
            _ => None,
        }
    }

    /// Total size our blocks would have after the PADDING
    /// adjustments `use_padding` allows, without making them
    fn fitted_length(&self, use_padding: bool) -> Result<u64, Error> {
        let current = self.length()?;

        if !use_padding {
            return Ok(current);
        }

        match current.cmp(&self.initial_length) {
            Ordering::Equal => Ok(current),
            Ordering::Less => {
                // blocks have shrunk
                let delta = self.initial_length - current;

                match self.tail_padding() {
                    Some(size) => {
                        let grown = (u64::from(size) + delta).min(BlockSize::MAX.into());
                        Ok(current + (grown - u64::from(size)))
                    }
                    None => Ok(match appended_padding(delta) {
                        Some(size) => {
                            current + u64::from(BlockHeader::SIZE) + u64::from(size)
                        }
                        None => current,
                    }),
                }
            }
            Ordering::Greater => {
                // blocks have grown
                let delta = current - self.initial_length;

                match self.tail_padding() {
                    Some(size) if u64::from(size) + u64::from(BlockHeader::SIZE) == delta => {
                        Ok(self.initial_length)
                    }
                    Some(size) if shrunk_padding(size, delta).is_some() => Ok(self.initial_length),
                    _ => Ok(current),
                }
            }
        }
    }

    /// Adjusts a trailing PADDING block so that our total
    /// size matches the file's metadata region, if possible
    fn fit_padding(&mut self) {
        let current = match self.length() {
            Ok(current) => current,
            // oversized blocks are caught before writing
            Err(_) => return,
        };

        match current.cmp(&self.initial_length) {
            Ordering::Equal => {}
            Ordering::Less => {
                let delta = self.initial_length - current;

                match self.blocks.last_mut() {
                    Some(Block::Padding(padding)) => {
                        // grow the trailing PADDING block,
                        // up to its 24-bit size limit
                        padding.size = BlockSize::try_from(u64::from(padding.size) + delta)
                            .unwrap_or(BlockSize::MAX);
                    }
                    _ => {
                        // append a PADDING block filling the gap,
                        // if there's room for its header
                        if let Some(size) = appended_padding(delta) {
                            self.blocks.push(Block::Padding(Padding { size }));
                        }
                    }
                }
            }
            Ordering::Greater => {
                let delta = current - self.initial_length;

                if let Some(Block::Padding(padding)) = self.blocks.last_mut() {
                    if u64::from(padding.size) + u64::from(BlockHeader::SIZE) == delta {
                        // the whole trailing PADDING block is consumed
                        self.blocks.pop();
                    } else if let Some(size) = shrunk_padding(padding.size, delta) {
                        padding.size = size;
                    }
                }
            }
        }
    }
}

/// Size of a PADDING block filling a gap of `delta` bytes,
/// clamped to its 24-bit size limit,
/// or `None` if the gap has no room for the block's header
fn appended_padding(delta: u64) -> Option<BlockSize> {
    delta
        .checked_sub(u64::from(BlockHeader::SIZE))
        .map(|size| BlockSize::try_from(size).unwrap_or(BlockSize::MAX))
}

/// Size of a PADDING block of `size` bytes shrunk by `delta`,
/// or `None` if it has fewer than `delta` bytes to give
fn shrunk_padding(size: BlockSize, delta: u64) -> Option<BlockSize> {
    BlockSize::try_from(delta)
        .ok()
        .and_then(|delta| size.checked_sub(delta))
}

/// A cursor over a [`Chain`]'s blocks
///
/// The cursor is always positioned at some block
/// and starts at the STREAMINFO block.
/// Edits only touch the blocks in memory;
/// nothing reaches the file until [`Chain::write`].
pub struct ChainIterator<'c> {
    chain: &'c mut Chain,
    index: usize,
}

impl ChainIterator<'_> {
    /// Advances to the next block, if any
    ///
    /// Returns `false` if already at the final block,
    /// in which case our position is unchanged.
    pub fn next(&mut self) -> bool {
        if self.index + 1 < self.chain.blocks.len() {
            self.index += 1;
            true
        } else {
            false
        }
    }

    /// Retreats to the previous block, if any
    ///
    /// Returns `false` if already at the first block,
    /// in which case our position is unchanged.
    pub fn prev(&mut self) -> bool {
        if self.index > 0 {
            self.index -= 1;
            true
        } else {
            false
        }
    }

    /// The block at the current position
    pub fn block(&self) -> &Block {
        &self.chain.blocks[self.index]
    }

    /// The block at the current position, for editing in place
    pub fn block_mut(&mut self) -> &mut Block {
        &mut self.chain.blocks[self.index]
    }

    /// Replaces the block at the current position
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingStreaminfo`] if attempting to
    /// replace the first block with something other than
    /// STREAMINFO, or [`Error::MultipleStreaminfo`] if
    /// attempting to place a STREAMINFO block anywhere else.
    pub fn set_block(&mut self, block: Block) -> Result<(), Error> {
        match (self.index == 0, &block) {
            (true, Block::Streaminfo(_)) => {}
            (true, _) => return Err(Error::MissingStreaminfo),
            (false, Block::Streaminfo(_)) => return Err(Error::MultipleStreaminfo),
            (false, _) => {}
        }

        self.chain.blocks[self.index] = block;
        Ok(())
    }

    /// Inserts a new block ahead of the current position
    /// and leaves ourself positioned at the new block
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingStreaminfo`] if positioned at
    /// the STREAMINFO block, which nothing may precede,
    /// or [`Error::MultipleStreaminfo`] if the new block is
    /// a STREAMINFO block.
    pub fn insert_block_before(&mut self, block: Block) -> Result<(), Error> {
        if self.index == 0 {
            Err(Error::MissingStreaminfo)
        } else if matches!(block, Block::Streaminfo(_)) {
            Err(Error::MultipleStreaminfo)
        } else {
            self.chain.blocks.insert(self.index, block);
            Ok(())
        }
    }

    /// Inserts a new block following the current position
    /// and leaves ourself positioned at the new block
    ///
    /// # Errors
    ///
    /// Returns [`Error::MultipleStreaminfo`] if the new block
    /// is a STREAMINFO block.
    pub fn insert_block_after(&mut self, block: Block) -> Result<(), Error> {
        if matches!(block, Block::Streaminfo(_)) {
            Err(Error::MultipleStreaminfo)
        } else {
            self.chain.blocks.insert(self.index + 1, block);
            self.index += 1;
            Ok(())
        }
    }

    /// Removes the block at the current position
    /// and leaves ourself positioned at the previous block
    ///
    /// If `replace_with_padding` is set, the block is replaced
    /// by a PADDING block of the same total size instead of
    /// being removed outright, which makes it more likely
    /// the chain can later be written back in place.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingStreaminfo`] if positioned at
    /// the STREAMINFO block, which may not be removed,
    /// or [`Error::ExcessiveBlockSize`] if the block's
    /// contents have grown beyond what a PADDING block
    /// can replace.
    pub fn delete_block(&mut self, replace_with_padding: bool) -> Result<(), Error> {
        if self.index == 0 {
            return Err(Error::MissingStreaminfo);
        }

        if replace_with_padding {
            let size = self.chain.blocks[self.index].size()?;
            self.chain.blocks[self.index] = Block::Padding(Padding { size });
        } else {
            self.chain.blocks.remove(self.index);
        }

        self.index -= 1;
        Ok(())
    }
}
