// Copyright 2025 Brian Langenberger
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! For handling a FLAC file's metadata blocks
//!
//! Many items are capitalized simply because they were capitalized
//! in the original FLAC format documentation.
//!
//! # Metadata Blocks
//!
//! FLAC defines seven metadata block types
//!
//! | Block Type | Purpose |
//! |-----------:|---------|
//! | [STREAMINFO](`Streaminfo`) | stream information such as sample rate, channel count, etc. |
//! | [PADDING](`Padding`) | empty data which can easily be resized as needed |
//! | [APPLICATION](`Application`) | application-specific data such as foreign RIFF WAVE chunks |
//! | [SEEKTABLE](`SeekTable`) | to allow for more efficient seeking within a FLAC file |
//! | [VORBIS_COMMENT](`VorbisComment`) | textual metadata such as track title, artist name, album name, etc. |
//! | [CUESHEET](`Cuesheet`) | the original disc's layout, for CD images |
//! | [PICTURE](`Picture`) | embedded image files such as cover art |
//!
//! Block types 7 through 126 are not yet defined by the format,
//! but files containing them remain legal FLAC files.
//! Such blocks are carried through editing as opaque
//! [`Unknown`] blocks, byte for byte.

use crate::Error;
use bitstream_io::{
    BigEndian, BitRead, BitReader, BitWrite, BitWriter, FromBitStream, FromBitStreamUsing,
    FromBitStreamWith, LittleEndian, ToBitStream, ToBitStreamUsing,
};
use std::fs::File;
use std::io::BufReader;
use std::num::NonZero;
use std::path::Path;

mod chain;
/// Types related to the CUESHEET metadata block
pub mod cuesheet;
mod rewrite;
mod simple;

pub use chain::{Chain, ChainIterator};
pub use cuesheet::{Cuesheet, CuesheetIndex, CuesheetTrack};
pub use simple::SimpleIterator;

const FLAC_TAG: &[u8; 4] = b"fLaC";

/// Advances the reader past any leading ID3v2 tag to the `"fLaC"` tag
///
/// Although ID3v2 tags are not part of the FLAC format,
/// tools sometimes deposit them at the front of FLAC files
/// and the files remain playable, so we step over them
/// when hunting for the stream's first metadata block.
///
/// # Errors
///
/// Returns [`Error::MissingFlacTag`] if no `"fLaC"` tag is
/// found where one is expected, or any I/O error from reading.
pub fn read_flac_tag<R: std::io::Read>(r: &mut R) -> Result<(), Error> {
    let mut tag = [0; 4];
    r.read_exact(&mut tag)?;

    if tag.starts_with(b"ID3") {
        // the remainder of the 10-byte ID3v2 header:
        // one version byte (consumed along with "ID3"),
        // another version byte, a flags byte,
        // then a 4-byte length in base 128
        let mut version_flags = [0; 2];
        r.read_exact(&mut version_flags)?;

        let mut size = [0; 4];
        r.read_exact(&mut size)?;

        let mut tag_length: u32 = 0;
        for byte in size {
            if byte & 0x80 != 0 {
                return Err(Error::MissingFlacTag);
            }
            tag_length = (tag_length << 7) | u32::from(byte & 0x7f);
        }

        std::io::copy(
            &mut std::io::Read::take(&mut *r, tag_length.into()),
            &mut std::io::sink(),
        )?;

        r.read_exact(&mut tag)?;
    }

    match &tag {
        FLAC_TAG => Ok(()),
        _ => Err(Error::MissingFlacTag),
    }
}

/// A FLAC metadata block header
///
/// | Bits | Field | Meaning |
/// |-----:|------:|---------|
/// | 1    | `last` | final metadata block in file |
/// | 7    | `block_type` | type of block |
/// | 24   | `size` | block size, in bytes |
///
/// # Example
/// ```
/// use bitstream_io::{BitReader, BitRead, BigEndian};
/// use flac_metaedit::metadata::{BlockHeader, BlockType};
///
/// let data: &[u8] = &[0b1_0000000, 0x00, 0x00, 0x22];
/// let mut r = BitReader::endian(data, BigEndian);
/// assert_eq!(
///     r.parse::<BlockHeader>().unwrap(),
///     BlockHeader {
///         last: true,                         // 0b1
///         block_type: BlockType::Streaminfo,  // 0b0000000
///         size: 0x00_00_22u16.into(),         // 0x00, 0x00, 0x22
///     },
/// );
/// ```
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct BlockHeader {
    /// Whether we are the final block
    pub last: bool,
    /// Our block type
    pub block_type: BlockType,
    /// Our block size, in bytes
    pub size: BlockSize,
}

impl BlockHeader {
    pub(crate) const SIZE: BlockSize = BlockSize((1 + 7 + 24) / 8);
}

impl FromBitStream for BlockHeader {
    type Error = Error;

    fn from_reader<R: BitRead + ?Sized>(r: &mut R) -> Result<Self, Self::Error> {
        Ok(Self {
            last: r.read::<1, _>()?,
            block_type: r.parse()?,
            size: r.parse()?,
        })
    }
}

impl ToBitStream for BlockHeader {
    type Error = Error;

    fn to_writer<W: BitWrite + ?Sized>(&self, w: &mut W) -> Result<(), Self::Error> {
        w.write::<1, _>(self.last)?;
        w.build(&self.block_type)?;
        w.build(&self.size)?;
        Ok(())
    }
}

/// A type of FLAC metadata block
#[derive(Copy, Clone, Debug, Ord, PartialOrd, Eq, PartialEq)]
pub enum BlockType {
    /// The STREAMINFO block
    Streaminfo,
    /// The PADDING block
    Padding,
    /// The APPLICATION block
    Application,
    /// The SEEKTABLE block
    SeekTable,
    /// The VORBIS_COMMENT block
    VorbisComment,
    /// The CUESHEET block
    Cuesheet,
    /// The PICTURE block
    Picture,
    /// A block type not yet defined by the format (7 through 126)
    Unknown(u8),
}

impl std::fmt::Display for BlockType {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::Streaminfo => "STREAMINFO".fmt(f),
            Self::Padding => "PADDING".fmt(f),
            Self::Application => "APPLICATION".fmt(f),
            Self::SeekTable => "SEEKTABLE".fmt(f),
            Self::VorbisComment => "VORBIS_COMMENT".fmt(f),
            Self::Cuesheet => "CUESHEET".fmt(f),
            Self::Picture => "PICTURE".fmt(f),
            Self::Unknown(code) => write!(f, "UNKNOWN ({code})"),
        }
    }
}

impl FromBitStream for BlockType {
    type Error = Error;

    fn from_reader<R: BitRead + ?Sized>(r: &mut R) -> Result<Self, Self::Error> {
        match r.read::<7, u8>()? {
            0 => Ok(Self::Streaminfo),
            1 => Ok(Self::Padding),
            2 => Ok(Self::Application),
            3 => Ok(Self::SeekTable),
            4 => Ok(Self::VorbisComment),
            5 => Ok(Self::Cuesheet),
            6 => Ok(Self::Picture),
            code @ 7..=126 => Ok(Self::Unknown(code)),
            _ => Err(Error::InvalidMetadataBlock),
        }
    }
}

impl ToBitStream for BlockType {
    type Error = Error;

    fn to_writer<W: BitWrite + ?Sized>(&self, w: &mut W) -> Result<(), Self::Error> {
        w.write::<7, u8>(match self {
            Self::Streaminfo => 0,
            Self::Padding => 1,
            Self::Application => 2,
            Self::SeekTable => 3,
            Self::VorbisComment => 4,
            Self::Cuesheet => 5,
            Self::Picture => 6,
            Self::Unknown(code @ 7..=126) => *code,
            Self::Unknown(_) => return Err(Error::InvalidMetadataBlock),
        })
        .map_err(Error::Io)
    }
}

/// A 24-bit block size value, with safeguards against overflow
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq, Ord, PartialOrd)]
pub struct BlockSize(u32);

impl BlockSize {
    /// A value of 0
    pub const ZERO: BlockSize = BlockSize(0);

    /// The largest possible block size (2²⁴ - 1 bytes)
    pub const MAX: BlockSize = BlockSize((1 << 24) - 1);

    /// Our current value as a u32
    pub(crate) fn get(&self) -> u32 {
        self.0
    }

    /// Conditionally add `BlockSize` to ourself
    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0
            .checked_add(rhs.0)
            .filter(|s| *s <= Self::MAX.0)
            .map(Self)
    }

    /// Conditionally subtract `BlockSize` from ourself
    pub fn checked_sub(self, rhs: Self) -> Option<Self> {
        self.0.checked_sub(rhs.0).map(Self)
    }
}

impl std::fmt::Display for BlockSize {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl FromBitStream for BlockSize {
    type Error = std::io::Error;

    fn from_reader<R: BitRead + ?Sized>(r: &mut R) -> Result<Self, Self::Error> {
        r.read::<24, _>().map(Self)
    }
}

impl ToBitStream for BlockSize {
    type Error = std::io::Error;

    fn to_writer<W: BitWrite + ?Sized>(&self, w: &mut W) -> Result<(), Self::Error> {
        w.write::<24, _>(self.0)
    }
}

impl From<u8> for BlockSize {
    fn from(u: u8) -> Self {
        Self(u.into())
    }
}

impl From<u16> for BlockSize {
    fn from(u: u16) -> Self {
        Self(u.into())
    }
}

impl TryFrom<u32> for BlockSize {
    type Error = BlockSizeOverflow;

    fn try_from(u: u32) -> Result<Self, BlockSizeOverflow> {
        (u <= Self::MAX.0)
            .then_some(Self(u))
            .ok_or(BlockSizeOverflow)
    }
}

impl TryFrom<usize> for BlockSize {
    type Error = BlockSizeOverflow;

    fn try_from(u: usize) -> Result<Self, BlockSizeOverflow> {
        u32::try_from(u)
            .map_err(|_| BlockSizeOverflow)
            .and_then(Self::try_from)
    }
}

impl TryFrom<u64> for BlockSize {
    type Error = BlockSizeOverflow;

    fn try_from(u: u64) -> Result<Self, BlockSizeOverflow> {
        u32::try_from(u)
            .map_err(|_| BlockSizeOverflow)
            .and_then(Self::try_from)
    }
}

impl From<BlockSize> for u32 {
    #[inline]
    fn from(size: BlockSize) -> u32 {
        size.0
    }
}

impl From<BlockSize> for u64 {
    #[inline]
    fn from(size: BlockSize) -> u64 {
        size.0.into()
    }
}

/// An error that occurs when trying to build an overly large `BlockSize`
#[derive(Copy, Clone, Debug)]
pub struct BlockSizeOverflow;

impl std::error::Error for BlockSizeOverflow {}

impl std::fmt::Display for BlockSizeOverflow {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        "value too large for BlockSize".fmt(f)
    }
}

impl From<BlockSizeOverflow> for Error {
    fn from(BlockSizeOverflow: BlockSizeOverflow) -> Self {
        Self::ExcessiveBlockSize
    }
}

/// Any possible FLAC metadata block
///
/// Each block consists of a [`BlockHeader`] followed by the block's contents.
///
/// ```text
/// ┌──────────┬────────┬┄┄┄┄┄┄┄┄┬┄┄┄┬────────┬┄┄┄┄┄┄┄┄┬┄┄┄╮
/// │ FLAC Tag │ Block₀ │ Block₁ ┆ … ┆ Frame₀ │ Frame₁ ┆ … ┆ FLAC File
/// └──────────┼────────┼┄┄┄┄┄┄┄┄┴┄┄┄┴────────┴┄┄┄┄┄┄┄┄┴┄┄┄╯
/// ╭──────────╯        ╰────────────────────────╮
/// ├──────────────┬─────────────────────────────┤
/// │ Block Header │     Metadata Block Data     │           Metadata Block
/// └──────────────┴─────────────────────────────┘
/// ```
///
/// Blocks do not carry their own `last` flag;
/// whether a block is the final one in the stream is
/// decided at write time from its position.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Block {
    /// The STREAMINFO block
    Streaminfo(Streaminfo),
    /// The PADDING block
    Padding(Padding),
    /// The APPLICATION block
    Application(Application),
    /// The SEEKTABLE block
    SeekTable(SeekTable),
    /// The VORBIS_COMMENT block
    VorbisComment(VorbisComment),
    /// The CUESHEET block
    Cuesheet(Cuesheet),
    /// The PICTURE block
    Picture(Picture),
    /// A block of a type not yet defined by the format
    Unknown(Unknown),
}

impl Block {
    /// Our block type
    pub fn block_type(&self) -> BlockType {
        match self {
            Self::Streaminfo(_) => BlockType::Streaminfo,
            Self::Padding(_) => BlockType::Padding,
            Self::Application(_) => BlockType::Application,
            Self::SeekTable(_) => BlockType::SeekTable,
            Self::VorbisComment(_) => BlockType::VorbisComment,
            Self::Cuesheet(_) => BlockType::Cuesheet,
            Self::Picture(_) => BlockType::Picture,
            Self::Unknown(u) => BlockType::Unknown(u.code),
        }
    }

    /// Size of block contents, in bytes, not including the header
    ///
    /// # Errors
    ///
    /// Returns [`Error::ExcessiveBlockSize`] if the contents
    /// do not fit a 24-bit size field.
    pub fn size(&self) -> Result<BlockSize, Error> {
        let bytes: u64 = match self {
            Self::Streaminfo(_) => Streaminfo::SIZE.into(),
            Self::Padding(padding) => padding.size.into(),
            Self::Application(application) => 4 + application.data.len() as u64,
            Self::SeekTable(seektable) => 18 * seektable.points.len() as u64,
            Self::VorbisComment(comment) => {
                4 + comment.vendor_string.len() as u64
                    + 4
                    + comment
                        .fields
                        .iter()
                        .map(|f| 4 + f.len() as u64)
                        .sum::<u64>()
            }
            Self::Cuesheet(cuesheet) => cuesheet.byte_length(),
            Self::Picture(picture) => {
                4 + 4
                    + picture.media_type.len() as u64
                    + 4
                    + picture.description.len() as u64
                    + 4 * 4
                    + 4
                    + picture.data.len() as u64
            }
            Self::Unknown(unknown) => unknown.data.len() as u64,
        };

        Ok(bytes.try_into()?)
    }

    /// Size of block, in bytes, including its header
    pub fn total_size(&self) -> Result<BlockSize, Error> {
        self.size()?
            .checked_add(BlockHeader::SIZE)
            .ok_or(Error::ExcessiveBlockSize)
    }
}

impl FromBitStreamWith<'_> for Block {
    type Context = BlockHeader;
    type Error = Error;

    // parses from reader without header
    fn from_reader<R: BitRead + ?Sized>(
        r: &mut R,
        header: &BlockHeader,
    ) -> Result<Self, Self::Error> {
        match header.block_type {
            BlockType::Streaminfo => Ok(Block::Streaminfo(r.parse()?)),
            BlockType::Padding => Ok(Block::Padding(r.parse_using(header.size)?)),
            BlockType::Application => Ok(Block::Application(r.parse_using(header.size)?)),
            BlockType::SeekTable => Ok(Block::SeekTable(r.parse_using(header.size)?)),
            BlockType::VorbisComment => Ok(Block::VorbisComment(r.parse_using(header.size)?)),
            BlockType::Cuesheet => Ok(Block::Cuesheet(r.parse()?)),
            BlockType::Picture => Ok(Block::Picture(r.parse()?)),
            BlockType::Unknown(code) => Ok(Block::Unknown(Unknown {
                code,
                data: r.read_to_vec(header.size.get().try_into().unwrap())?,
            })),
        }
    }
}

impl ToBitStreamUsing for Block {
    type Context = bool;
    type Error = Error;

    // builds to writer with header
    fn to_writer<W: BitWrite + ?Sized>(&self, w: &mut W, last: bool) -> Result<(), Error> {
        w.build(&BlockHeader {
            last,
            block_type: self.block_type(),
            size: self.size()?,
        })?;

        match self {
            Self::Streaminfo(streaminfo) => w.build(streaminfo).map_err(Error::Io),
            Self::Padding(padding) => w.build(padding).map_err(Error::Io),
            Self::Application(application) => w.build(application).map_err(Error::Io),
            Self::SeekTable(seektable) => w.build(seektable).map_err(Error::Io),
            Self::VorbisComment(comment) => w.build(comment),
            Self::Cuesheet(cuesheet) => w.build(cuesheet),
            Self::Picture(picture) => w.build(picture),
            Self::Unknown(unknown) => w.write_bytes(&unknown.data).map_err(Error::Io),
        }
    }
}

macro_rules! block_from {
    ($t:ident) => {
        impl From<$t> for Block {
            fn from(block: $t) -> Self {
                Self::$t(block)
            }
        }
    };
}

block_from!(Streaminfo);
block_from!(Padding);
block_from!(Application);
block_from!(SeekTable);
block_from!(VorbisComment);
block_from!(Cuesheet);
block_from!(Picture);
block_from!(Unknown);

/// Reads a single block's contents, limited to its header's declared size
pub(crate) fn read_block_body<R: std::io::Read>(
    reader: R,
    header: &BlockHeader,
) -> Result<Block, Error> {
    // like a slightly easier variant of "Take"
    struct LimitedReader<R> {
        reader: R,
        size: usize,
    }

    impl<R: std::io::Read> std::io::Read for LimitedReader<R> {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            let size = self.size.min(buf.len());
            self.reader.read(&mut buf[0..size]).inspect(|amt_read| {
                self.size -= amt_read;
            })
        }
    }

    let mut r = BitReader::endian(
        LimitedReader {
            reader,
            size: header.size.get().try_into().unwrap(),
        },
        BigEndian,
    );

    let block = r.parse_with(header)?;

    match r.into_reader().size {
        0 => Ok(block),
        _ => Err(Error::InvalidMetadataBlockSize),
    }
}

/// An iterator over the metadata blocks of a FLAC stream
pub struct BlockIterator<R: std::io::Read> {
    reader: R,
    failed: bool,
    tag_read: bool,
    streaminfo_read: bool,
    finished: bool,
}

impl<R: std::io::Read> BlockIterator<R> {
    /// Creates an iterator over something that implements `Read`.
    /// Because this may perform many small reads,
    /// performance is greatly improved by buffering reads
    /// when reading from a raw `File`.
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            failed: false,
            tag_read: false,
            streaminfo_read: false,
            finished: false,
        }
    }

    fn read_block(&mut self) -> Option<Result<Block, Error>> {
        (!self.finished).then(|| {
            BitReader::endian(&mut self.reader, BigEndian)
                .parse()
                .and_then(|header: BlockHeader| {
                    let block = read_block_body(self.reader.by_ref(), &header)?;
                    self.finished = header.last;
                    Ok(block)
                })
        })
    }
}

impl<R: std::io::Read> Iterator for BlockIterator<R> {
    type Item = Result<Block, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            // once we hit an error, stop any further reads
            None
        } else if !self.tag_read {
            // "fLaC" tag must come before anything else,
            // though an ID3v2 tag may precede it
            match read_flac_tag(&mut self.reader) {
                Ok(()) => {
                    self.tag_read = true;
                    self.next()
                }
                Err(err) => {
                    self.failed = true;
                    Some(Err(err))
                }
            }
        } else if !self.streaminfo_read {
            // STREAMINFO block must be first in file
            match self.read_block() {
                block @ Some(Ok(Block::Streaminfo(_))) => {
                    self.streaminfo_read = true;
                    block
                }
                block @ Some(Err(_)) => {
                    self.failed = true;
                    block
                }
                _ => {
                    self.failed = true;
                    Some(Err(Error::MissingStreaminfo))
                }
            }
        } else {
            match self.read_block() {
                Some(Ok(Block::Streaminfo(_))) => {
                    self.failed = true;
                    Some(Err(Error::MultipleStreaminfo))
                }
                block @ Some(Err(_)) => {
                    self.failed = true;
                    block
                }
                block => block,
            }
        }
    }
}

/// Returns iterator of blocks from the given reader
///
/// The reader should be positioned at the start of the FLAC
/// file.
///
/// Because this may perform many small reads,
/// using a buffered reader may greatly improve performance
/// when reading from a raw `File`.
pub fn read_blocks<R: std::io::Read>(r: R) -> BlockIterator<R> {
    BlockIterator::new(r)
}

/// Returns iterator of blocks from the given path
///
/// # Errors
///
/// Returns any I/O error from opening the path.
/// Note that the iterator itself may return any errors
/// from reading individual blocks.
pub fn blocks<P: AsRef<Path>>(p: P) -> std::io::Result<BlockIterator<BufReader<File>>> {
    File::open(p.as_ref()).map(|f| read_blocks(BufReader::new(f)))
}

/// Writes iterator of blocks to the given writer,
/// preceded by the `"fLaC"` tag
///
/// The final block written has its `last` flag set;
/// the rest do not.
///
/// Because this may perform many small writes,
/// buffering writes may greatly improve performance
/// when writing to a raw `File`.
///
/// # Errors
///
/// Passes along any I/O errors from the underlying stream.
/// May also generate an error if any of the blocks are invalid
/// (e.g. STREAMINFO not being the first block, any block is too large, etc.).
///
/// # Example
///
/// ```
/// use flac_metaedit::metadata::{
///     write_blocks, read_blocks, Streaminfo, Application, Block,
/// };
/// use std::io::{Cursor, Seek};
/// use std::num::NonZero;
///
/// let mut flac: Cursor<Vec<u8>> = Cursor::new(vec![]);  // a FLAC file in memory
///
/// // our test blocks
/// let blocks: Vec<Block> = vec![
///     Block::Streaminfo(Streaminfo {
///         minimum_block_size: 0,
///         maximum_block_size: 0,
///         minimum_frame_size: None,
///         maximum_frame_size: None,
///         sample_rate: 44100,
///         channels: NonZero::new(1).unwrap(),
///         bits_per_sample: NonZero::new(16).unwrap(),
///         total_samples: None,
///         md5: None,
///     }),
///     Block::Application(Application { id: 0x1234, data: vec![1, 2, 3, 4] }),
///     Block::Application(Application { id: 0x5678, data: vec![5, 6, 7, 8] }),
/// ];
///
/// // write our test blocks to a file
/// write_blocks(&mut flac, &blocks).unwrap();
///
/// flac.rewind().unwrap();
///
/// // read our blocks back from that file
/// let read = read_blocks(flac).collect::<Result<Vec<Block>, _>>().unwrap();
///
/// // they should be identical
/// assert_eq!(blocks, read);
/// ```
pub fn write_blocks<'b>(
    mut w: impl std::io::Write,
    blocks: impl IntoIterator<Item = &'b Block>,
) -> Result<(), Error> {
    w.write_all(FLAC_TAG).map_err(Error::Io)?;
    write_block_list(w, blocks)
}

/// Writes blocks without the leading `"fLaC"` tag
pub(crate) fn write_block_list<'b>(
    w: impl std::io::Write,
    blocks: impl IntoIterator<Item = &'b Block>,
) -> Result<(), Error> {
    fn iter_last<T>(i: impl Iterator<Item = T>) -> impl Iterator<Item = (bool, T)> {
        struct LastIterator<I: std::iter::Iterator> {
            iter: std::iter::Peekable<I>,
        }

        impl<T, I: std::iter::Iterator<Item = T>> Iterator for LastIterator<I> {
            type Item = (bool, T);

            fn next(&mut self) -> Option<Self::Item> {
                let item = self.iter.next()?;
                Some((self.iter.peek().is_none(), item))
            }
        }

        LastIterator { iter: i.peekable() }
    }

    let mut w = BitWriter::endian(w, BigEndian);
    let mut blocks = iter_last(blocks.into_iter());

    // STREAMINFO block must be present and must be first in file
    match blocks.next() {
        Some((last, block @ Block::Streaminfo(_))) => w.build_using(block, last)?,
        _ => return Err(Error::MissingStreaminfo),
    }

    blocks.try_for_each(|(last, block)| match block {
        Block::Streaminfo(_) => Err(Error::MultipleStreaminfo),
        block => w.build_using(block, last),
    })
}

/// A STREAMINFO metadata block
///
/// This must always be the first metadata block in a FLAC file
/// and may occur only once.
///
/// | Bits | Field | Meaning |
/// |-----:|------:|---------|
/// | 16   | `minimum_block_size` | minimum block size, in samples |
/// | 16   | `maximum_block_size` | maximum block size, in samples |
/// | 24   | `minimum_frame_size` | minimum frame size, in bytes |
/// | 24   | `maximum_frame_size` | maximum frame size, in bytes |
/// | 20   | `sample_rate` | sample rate, in Hz |
/// | 3    | `channels` | channel count, minus 1 |
/// | 5    | `bits_per_sample` | bits-per-sample, minus 1 |
/// | 36   | `total_samples` | total interchannel samples |
/// | 128  | `md5` | MD5 hash of raw audio data |
///
/// # Important
///
/// Changing any of these values to something that differs
/// from the values of the file's frame headers will render it
/// unplayable, as will moving it anywhere but the first
/// metadata block in the file.
/// Avoid modifying the position and contents of this block unless you
/// know exactly what you are doing.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Streaminfo {
    /// The minimum block size (in samples) used in the stream,
    /// excluding the last block.
    pub minimum_block_size: u16,
    /// The maximum block size (in samples) used in the stream,
    /// excluding the last block.
    pub maximum_block_size: u16,
    /// The minimum framesize (in bytes) used in the stream.
    ///
    /// `None` indicates the value is unknown.
    pub minimum_frame_size: Option<NonZero<u32>>,
    /// The maximum framesize (in bytes) used in the stream.
    ///
    /// `None` indicates the value is unknown.
    pub maximum_frame_size: Option<NonZero<u32>>,
    /// Sample rate in Hz
    ///
    /// 0 indicates a non-audio stream.
    pub sample_rate: u32,
    /// Number of channels, from 1 to 8
    pub channels: NonZero<u8>,
    /// Number of bits-per-sample, from 1 to 32
    pub bits_per_sample: NonZero<u8>,
    /// Total number of interchannel samples in stream.
    ///
    /// `None` indicates the value is unknown.
    pub total_samples: Option<NonZero<u64>>,
    /// MD5 hash of unencoded audio data.
    ///
    /// `None` indicates the value is unknown.
    pub md5: Option<[u8; 16]>,
}

impl Streaminfo {
    /// The maximum sample rate, in Hz (2²⁰ - 1)
    pub const MAX_SAMPLE_RATE: u32 = (1 << 20) - 1;

    /// The maximum number of channels (8)
    pub const MAX_CHANNELS: NonZero<u8> = NonZero::new(8).unwrap();

    /// Defined size of STREAMINFO block
    pub(crate) const SIZE: BlockSize = BlockSize(0x22);
}

impl FromBitStream for Streaminfo {
    type Error = std::io::Error;

    fn from_reader<R: BitRead + ?Sized>(r: &mut R) -> Result<Self, Self::Error> {
        Ok(Self {
            minimum_block_size: r.read_to()?,
            maximum_block_size: r.read_to()?,
            minimum_frame_size: r.read::<24, _>()?,
            maximum_frame_size: r.read::<24, _>()?,
            sample_rate: r.read::<20, _>()?,
            channels: r.read::<3, _>()?,
            bits_per_sample: r.read::<5, _>()?,
            total_samples: r.read::<36, _>()?,
            md5: r
                .read_to()
                .map(|md5: [u8; 16]| md5.iter().any(|b| *b != 0).then_some(md5))?,
        })
    }
}

impl ToBitStream for Streaminfo {
    type Error = std::io::Error;

    fn to_writer<W: BitWrite + ?Sized>(&self, w: &mut W) -> Result<(), Self::Error> {
        w.write_from(self.minimum_block_size)?;
        w.write_from(self.maximum_block_size)?;
        w.write::<24, _>(self.minimum_frame_size)?;
        w.write::<24, _>(self.maximum_frame_size)?;
        w.write::<20, _>(self.sample_rate)?;
        w.write::<3, _>(self.channels)?;
        w.write::<5, _>(self.bits_per_sample)?;
        w.write::<36, _>(self.total_samples)?;
        w.write_from(self.md5.unwrap_or([0; 16]))?;
        Ok(())
    }
}

/// A PADDING metadata block
///
/// Padding blocks are empty blocks consisting of all 0 bytes.
/// If one wishes to edit the metadata in other blocks,
/// adjusting the size of the padding block allows
/// us to do so without having to rewrite the entire FLAC file.
/// For example, when adding 10 bytes to a comment,
/// we can subtract 10 bytes from the padding
/// and the total size of all blocks remains unchanged.
/// Therefore we can simply overwrite the old comment
/// block with the new without affecting the following
/// FLAC audio frames.
///
/// This block may occur multiple times in a FLAC file.
#[derive(Debug, Clone, Eq, PartialEq, Default)]
pub struct Padding {
    /// The size of the padding, in bytes
    pub size: BlockSize,
}

impl FromBitStreamUsing for Padding {
    type Context = BlockSize;
    type Error = Error;

    fn from_reader<R: BitRead + ?Sized>(r: &mut R, size: BlockSize) -> Result<Self, Self::Error> {
        r.skip(size.get() * 8)?;
        Ok(Self { size })
    }
}

impl ToBitStream for Padding {
    type Error = std::io::Error;

    fn to_writer<W: BitWrite + ?Sized>(&self, w: &mut W) -> Result<(), Self::Error> {
        w.pad(self.size.get() * 8)
    }
}

/// An APPLICATION metadata block
///
/// This block is for handling application-specific binary metadata,
/// such as foreign RIFF WAVE tags.
///
/// This block may occur multiple times in a FLAC file.
///
/// | Bits | Field | Meaning |
/// |-----:|------:|---------|
/// | 32   | `id` | registered application ID
/// | rest of block | `data` | application-specific data
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Application {
    /// A registered application ID
    pub id: u32,
    /// Application-specific data
    pub data: Vec<u8>,
}

impl Application {
    /// Application ID for RIFF chunk storage
    pub const RIFF: u32 = 0x72696666;

    /// Application ID for AIFF chunk storage
    pub const AIFF: u32 = 0x61696666;
}

impl FromBitStreamUsing for Application {
    type Context = BlockSize;
    type Error = Error;

    fn from_reader<R: BitRead + ?Sized>(r: &mut R, size: BlockSize) -> Result<Self, Self::Error> {
        let data_len = size
            .get()
            .checked_sub(4)
            .ok_or(Error::InsufficientApplicationBlock)?;

        Ok(Self {
            id: r.read_to()?,
            data: r.read_to_vec(data_len.try_into().unwrap())?,
        })
    }
}

impl ToBitStream for Application {
    type Error = std::io::Error;

    fn to_writer<W: BitWrite + ?Sized>(&self, w: &mut W) -> Result<(), Self::Error> {
        w.write_from(self.id)?;
        w.write_bytes(&self.data)
    }
}

/// A SEEKTABLE metadata block
///
/// Because FLAC frames do not store their compressed length,
/// a seek table is used for random access within a FLAC file.
/// By mapping a sample number to a byte offset,
/// one can quickly reach different parts of the file
/// without decoding the whole thing.
///
/// Seek point byte offsets are relative to the start of the
/// first FLAC frame, and *not* relative to the start of the
/// entire file.  This allows us to change the size of the set
/// of metadata blocks without having to recalculate
/// the contents of the seek table.
///
/// Its seekpoints occupy the entire block.
#[derive(Debug, Clone, Eq, PartialEq, Default)]
pub struct SeekTable {
    /// The seek table's individual seek points
    pub points: Vec<SeekPoint>,
}

impl FromBitStreamUsing for SeekTable {
    type Context = BlockSize;
    type Error = Error;

    fn from_reader<R: BitRead + ?Sized>(r: &mut R, size: BlockSize) -> Result<Self, Self::Error> {
        match (size.get() / 18, size.get() % 18) {
            (p, 0) => Ok(Self {
                points: (0..p).map(|_| r.parse()).collect::<Result<Vec<_>, _>>()?,
            }),
            _ => Err(Error::InvalidSeekTableSize),
        }
    }
}

impl ToBitStream for SeekTable {
    type Error = std::io::Error;

    fn to_writer<W: BitWrite + ?Sized>(&self, w: &mut W) -> Result<(), Self::Error> {
        self.points.iter().try_for_each(|point| w.build(point))
    }
}

/// An individual SEEKTABLE seek point
///
/// | Bits | Field | Meaning |
/// |-----:|------:|---------|
/// | 64   | `sample_offset` | sample number of first sample in target frame
/// | 64   | `byte_offset` | offset, in bytes, from first frame to target frame's header
/// | 16   | `frame_samples` | number of samples in target frame
///
/// A placeholder point is stored as a sample offset of all 1 bits,
/// with undefined remaining fields.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum SeekPoint {
    /// A defined, non-placeholder seek point
    Defined {
        /// The sample number of the first sample in the target frame
        sample_offset: u64,
        /// Offset, in bytes, from the first byte of the first frame header
        /// to the first byte in the target frame's header
        byte_offset: u64,
        /// Number of samples in the target frame
        frame_samples: u16,
    },
    /// A placeholder seek point
    Placeholder,
}

impl FromBitStream for SeekPoint {
    type Error = std::io::Error;

    fn from_reader<R: BitRead + ?Sized>(r: &mut R) -> Result<Self, Self::Error> {
        match r.read_to()? {
            u64::MAX => {
                let _byte_offset = r.read_to::<u64>()?;
                let _frame_samples = r.read_to::<u16>()?;
                Ok(Self::Placeholder)
            }
            sample_offset => Ok(Self::Defined {
                sample_offset,
                byte_offset: r.read_to()?,
                frame_samples: r.read_to()?,
            }),
        }
    }
}

impl ToBitStream for SeekPoint {
    type Error = std::io::Error;

    fn to_writer<W: BitWrite + ?Sized>(&self, w: &mut W) -> Result<(), Self::Error> {
        match self {
            Self::Defined {
                sample_offset,
                byte_offset,
                frame_samples,
            } => {
                w.write_from(*sample_offset)?;
                w.write_from(*byte_offset)?;
                w.write_from(*frame_samples)
            }
            Self::Placeholder => {
                w.write_from(u64::MAX)?;
                w.write_from::<u64>(0)?;
                w.write_from::<u16>(0)
            }
        }
    }
}

/// A VORBIS_COMMENT metadata block
///
/// This block contains metadata such as track name,
/// artist name, album name, etc.  Its contents are
/// UTF-8 encoded, `=`-delimited text fields
/// with a field name followed by value,
/// such as:
///
/// ```text
/// TITLE=Track Title
/// ```
///
/// Field names are case-insensitive and
/// may occur multiple times within the same comment
/// (a track may have multiple artists and choose to
/// store an "ARTIST" field for each one).
///
/// Commonly-used fields are available in the [`fields`] module.
///
/// # Byte Order
///
/// Unlike the rest of a FLAC file, the Vorbis comment's
/// length fields are stored in little-endian byte order.
///
/// | Bits | Field | Meaning |
/// |-----:|------:|---------|
/// | 32   | vendor string len | length of vendor string, in bytes
/// | `vendor string len`×8 | `vendor_string` | vendor string, in UTF-8
/// | 32   | field count | number of fields
/// | 32   | field₀ len | length of field₀, in bytes
/// | `field₀ len`×8 | `fields₀` | first field value, in UTF-8
/// | | | ⋮
///
/// # Malformed Comments
///
/// Some tools write comments whose entry lengths overrun
/// the size of the containing block.  Rather than reject
/// such files outright, reading stops at the first bad entry,
/// the rest of the block is skipped, and the fields gathered
/// to that point are returned.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct VorbisComment {
    /// The vendor string
    pub vendor_string: String,
    /// The individual metadata comment strings
    pub fields: Vec<String>,
}

impl Default for VorbisComment {
    fn default() -> Self {
        Self {
            vendor_string: concat!(env!("CARGO_PKG_NAME"), " ", env!("CARGO_PKG_VERSION"))
                .to_owned(),
            fields: vec![],
        }
    }
}

impl VorbisComment {
    /// Given a field name, returns first matching value, if any
    ///
    /// Fields are matched case-insensitively
    ///
    /// # Example
    ///
    /// ```
    /// use flac_metaedit::metadata::{VorbisComment, fields::{ARTIST, TITLE}};
    ///
    /// let comment = VorbisComment {
    ///     fields: vec![
    ///         "ARTIST=Artist 1".to_owned(),
    ///         "ARTIST=Artist 2".to_owned(),
    ///     ],
    ///     ..VorbisComment::default()
    /// };
    ///
    /// assert_eq!(comment.get(ARTIST), Some("Artist 1"));
    /// assert_eq!(comment.get(TITLE), None);
    /// ```
    pub fn get(&self, field: &str) -> Option<&str> {
        self.all(field).next()
    }

    /// Given a field name, iterates over any matching values
    ///
    /// Fields are matched case-insensitively
    ///
    /// # Panics
    ///
    /// Panics if field contains the `=` character.
    pub fn all(&self, field: &str) -> impl Iterator<Item = &str> {
        assert!(!field.contains('='), "field must not contain '='");

        self.fields.iter().filter_map(|f| {
            f.split_once('=')
                .and_then(|(key, value)| key.eq_ignore_ascii_case(field).then_some(value))
        })
    }

    /// Replaces any instances of the given field with value
    ///
    /// Fields are matched case-insensitively
    ///
    /// # Panics
    ///
    /// Panics if field contains the `=` character.
    ///
    /// # Example
    ///
    /// ```
    /// use flac_metaedit::metadata::{VorbisComment, fields::ARTIST};
    ///
    /// let mut comment = VorbisComment {
    ///     fields: vec![
    ///         "ARTIST=Artist 1".to_owned(),
    ///         "ARTIST=Artist 2".to_owned(),
    ///     ],
    ///     ..VorbisComment::default()
    /// };
    ///
    /// comment.set(ARTIST, "Artist 3");
    ///
    /// assert_eq!(
    ///     comment.all(ARTIST).collect::<Vec<_>>(),
    ///     vec!["Artist 3"],
    /// );
    /// ```
    pub fn set<S>(&mut self, field: &str, value: S)
    where
        S: std::fmt::Display,
    {
        self.remove(field);
        self.insert(field, value);
    }

    /// Adds new instance of field with the given value
    ///
    /// # Panics
    ///
    /// Panics if field contains the `=` character.
    pub fn insert<S>(&mut self, field: &str, value: S)
    where
        S: std::fmt::Display,
    {
        assert!(!field.contains('='), "field must not contain '='");

        self.fields.push(format!("{field}={value}"));
    }

    /// Removes any matching instances of the given field
    ///
    /// Fields are matched case-insensitively
    ///
    /// # Panics
    ///
    /// Panics if field contains the `=` character.
    pub fn remove(&mut self, field: &str) {
        assert!(!field.contains('='), "field must not contain '='");

        self.fields.retain(|f| match f.split_once('=') {
            Some((key, _)) => !key.eq_ignore_ascii_case(field),
            None => true,
        });
    }

    /// Replaces any instances of the given field with the given values
    ///
    /// Fields are matched case-insensitively
    ///
    /// # Panics
    ///
    /// Panics if field contains the `=` character
    ///
    /// # Example
    ///
    /// ```
    /// use flac_metaedit::metadata::{VorbisComment, fields::ARTIST};
    ///
    /// let mut comment = VorbisComment {
    ///     fields: vec![
    ///         "ARTIST=Artist 1".to_owned(),
    ///         "ARTIST=Artist 2".to_owned(),
    ///     ],
    ///     ..VorbisComment::default()
    /// };
    ///
    /// comment.replace(ARTIST, ["Artist 3", "Artist 4"]);
    ///
    /// assert_eq!(
    ///     comment.all(ARTIST).collect::<Vec<_>>(),
    ///     vec!["Artist 3", "Artist 4"],
    /// );
    /// ```
    pub fn replace<S: std::fmt::Display>(
        &mut self,
        field: &str,
        replacements: impl IntoIterator<Item = S>,
    ) {
        self.remove(field);
        self.fields.extend(
            replacements
                .into_iter()
                .map(|value| format!("{field}={value}")),
        );
    }
}

impl FromBitStreamUsing for VorbisComment {
    type Context = BlockSize;
    type Error = Error;

    fn from_reader<R: BitRead + ?Sized>(r: &mut R, size: BlockSize) -> Result<Self, Self::Error> {
        // bytes of the block not yet consumed
        let mut remaining = u64::from(size);

        fn take(remaining: &mut u64, bytes: u64) -> bool {
            match remaining.checked_sub(bytes) {
                Some(rest) => {
                    *remaining = rest;
                    true
                }
                None => false,
            }
        }

        // an entry overrunning the block truncates the comment
        // and the remainder of the block is skipped
        macro_rules! truncated {
            ($comment:expr, $remaining:expr) => {{
                r.skip(u32::try_from($remaining * 8).unwrap())?;
                return Ok($comment);
            }};
        }

        let mut comment = Self {
            vendor_string: String::new(),
            fields: vec![],
        };

        if !take(&mut remaining, 4) {
            truncated!(comment, remaining);
        }
        let vendor_len = u64::from(r.read_as_to::<LittleEndian, u32>()?);
        if !take(&mut remaining, vendor_len) {
            truncated!(comment, remaining);
        }
        comment.vendor_string = String::from_utf8(r.read_to_vec(vendor_len.try_into().unwrap())?)?;

        if !take(&mut remaining, 4) {
            truncated!(comment, remaining);
        }
        let count = r.read_as_to::<LittleEndian, u32>()?;

        for _ in 0..count {
            if !take(&mut remaining, 4) {
                truncated!(comment, remaining);
            }
            let field_len = u64::from(r.read_as_to::<LittleEndian, u32>()?);
            if !take(&mut remaining, field_len) {
                truncated!(comment, remaining);
            }
            comment
                .fields
                .push(String::from_utf8(r.read_to_vec(field_len.try_into().unwrap())?)?);
        }

        Ok(comment)
    }
}

impl ToBitStream for VorbisComment {
    type Error = Error;

    fn to_writer<W: BitWrite + ?Sized>(&self, w: &mut W) -> Result<(), Self::Error> {
        fn write_string<W: BitWrite + ?Sized>(w: &mut W, s: &str) -> Result<(), Error> {
            w.write_as_from::<LittleEndian, u32>(
                s.len()
                    .try_into()
                    .map_err(|_| Error::ExcessiveStringLength)?,
            )?;
            w.write_bytes(s.as_bytes())?;
            Ok(())
        }

        write_string(w, &self.vendor_string)?;
        w.write_as_from::<LittleEndian, u32>(
            self.fields
                .len()
                .try_into()
                .map_err(|_| Error::ExcessiveStringLength)?,
        )?;
        self.fields.iter().try_for_each(|s| write_string(w, s))
    }
}

/// Vorbis comment metadata tag fields
///
/// Not all of these fields are officially defined in the specification,
/// but they are in common use.
pub mod fields {
    /// Name of current work
    pub const TITLE: &str = "TITLE";

    /// Name of the artist generally responsible for the current work
    pub const ARTIST: &str = "ARTIST";

    /// Name of the collection the current work belongs to
    pub const ALBUM: &str = "ALBUM";

    /// The album's catalog number
    pub const CATALOG: &str = "CATALOG";

    /// Release date of work
    pub const DATE: &str = "DATE";

    /// Generic comment
    pub const COMMENT: &str = "COMMENT";

    /// Track number in album
    pub const TRACK_NUMBER: &str = "TRACKNUMBER";

    /// Total tracks in album
    pub const TRACK_TOTAL: &str = "TRACKTOTAL";
}

/// A PICTURE metadata block
///
/// This block is for storing pictures associated with the file,
/// most commonly cover art from CDs.
///
/// This block may occur multiple times in a FLAC file.
///
/// | Bits | Field | Meaning |
/// |-----:|------:|---------|
/// | 32   | `picture_type` | picture type
/// | 32   | media type len | length of media type string, in bytes
/// | media type len×8 | `media_type` | media type string
/// | 32   | description len | length of description string, in bytes
/// | description len×8 | `description` | description string
/// | 32   | `width` | picture width, in pixels
/// | 32   | `height` | picture height, in pixels
/// | 32   | `color_depth` | color depth, in bits-per-pixel
/// | 32   | `colors_used` | for indexed images, number of colors used
/// | 32   | data len | length of picture data, in bytes
/// | data len×8 | `data` | raw picture data
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Picture {
    /// The picture type
    pub picture_type: PictureType,
    /// The picture's media type string, in printable ASCII
    pub media_type: String,
    /// The picture's description
    pub description: String,
    /// The picture's width, in pixels
    pub width: u32,
    /// The picture's height, in pixels
    pub height: u32,
    /// The picture's color depth, in bits-per-pixel
    pub color_depth: u32,
    /// For color-indexed pictures, the number of colors used
    pub colors_used: Option<NonZero<u32>>,
    /// The raw picture data
    pub data: Vec<u8>,
}

impl FromBitStream for Picture {
    type Error = Error;

    fn from_reader<R: BitRead + ?Sized>(r: &mut R) -> Result<Self, Error> {
        fn prefixed_field<R: BitRead + ?Sized>(r: &mut R) -> std::io::Result<Vec<u8>> {
            let size = r.read_to::<u32>()?;
            r.read_to_vec(size.try_into().unwrap())
        }

        Ok(Self {
            picture_type: r.parse()?,
            media_type: String::from_utf8(prefixed_field(r)?)?,
            description: String::from_utf8(prefixed_field(r)?)?,
            width: r.read_to()?,
            height: r.read_to()?,
            color_depth: r.read_to()?,
            colors_used: r.read::<32, _>()?,
            data: prefixed_field(r)?,
        })
    }
}

impl ToBitStream for Picture {
    type Error = Error;

    fn to_writer<W: BitWrite + ?Sized>(&self, w: &mut W) -> Result<(), Error> {
        fn prefixed_field<W: BitWrite + ?Sized>(
            w: &mut W,
            field: &[u8],
            error: Error,
        ) -> Result<(), Error> {
            w.write_from::<u32>(field.len().try_into().map_err(|_| error)?)
                .map_err(Error::Io)?;
            w.write_bytes(field).map_err(Error::Io)
        }

        w.build(&self.picture_type)?;
        prefixed_field(w, self.media_type.as_bytes(), Error::ExcessiveStringLength)?;
        prefixed_field(w, self.description.as_bytes(), Error::ExcessiveStringLength)?;
        w.write_from(self.width)?;
        w.write_from(self.height)?;
        w.write_from(self.color_depth)?;
        w.write::<32, _>(self.colors_used)?;
        prefixed_field(w, &self.data, Error::ExcessiveBlockSize)
    }
}

/// Defined variants of PICTURE type
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum PictureType {
    /// Other
    Other = 0,
    /// PNG file icon of 32x32 pixels
    Png32x32 = 1,
    /// General file icon
    GeneralFileIcon = 2,
    /// Front cover
    FrontCover = 3,
    /// Back cover
    BackCover = 4,
    /// Liner notes page
    LinerNotes = 5,
    /// Media label (e.g., CD, Vinyl or Cassette label)
    MediaLabel = 6,
    /// Lead artist, lead performer, or soloist
    LeadArtist = 7,
    /// Artist or performer
    Artist = 8,
    /// Conductor
    Conductor = 9,
    /// Band or orchestra
    Band = 10,
    /// Composer
    Composer = 11,
    /// Lyricist or text writer
    Lyricist = 12,
    /// Recording location
    RecordingLocation = 13,
    /// During recording
    DuringRecording = 14,
    /// During performance
    DuringPerformance = 15,
    /// Movie or video screen capture
    ScreenCapture = 16,
    /// A bright colored fish
    Fish = 17,
    /// Illustration
    Illustration = 18,
    /// Band or artist logotype
    BandLogo = 19,
    /// Publisher or studio logotype
    PublisherLogo = 20,
}

impl std::fmt::Display for PictureType {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::Other => "Other".fmt(f),
            Self::Png32x32 => "32×32 PNG Icon".fmt(f),
            Self::GeneralFileIcon => "General File Icon".fmt(f),
            Self::FrontCover => "Cover (front)".fmt(f),
            Self::BackCover => "Cover (back)".fmt(f),
            Self::LinerNotes => "Liner Notes".fmt(f),
            Self::MediaLabel => "Media Label".fmt(f),
            Self::LeadArtist => "Lead Artist".fmt(f),
            Self::Artist => "Artist".fmt(f),
            Self::Conductor => "Conductor".fmt(f),
            Self::Band => "Band or Orchestra".fmt(f),
            Self::Composer => "Composer".fmt(f),
            Self::Lyricist => "Lyricist or Text Writer".fmt(f),
            Self::RecordingLocation => "Recording Location".fmt(f),
            Self::DuringRecording => "During Recording".fmt(f),
            Self::DuringPerformance => "During Performance".fmt(f),
            Self::ScreenCapture => "Movie or Video Screen Capture".fmt(f),
            Self::Fish => "A Bright Colored Fish".fmt(f),
            Self::Illustration => "Illustration".fmt(f),
            Self::BandLogo => "Band or Artist Logotype".fmt(f),
            Self::PublisherLogo => "Publisher or Studio Logotype".fmt(f),
        }
    }
}

impl FromBitStream for PictureType {
    type Error = Error;

    fn from_reader<R: BitRead + ?Sized>(r: &mut R) -> Result<Self, Error> {
        match r.read_to::<u32>()? {
            0 => Ok(Self::Other),
            1 => Ok(Self::Png32x32),
            2 => Ok(Self::GeneralFileIcon),
            3 => Ok(Self::FrontCover),
            4 => Ok(Self::BackCover),
            5 => Ok(Self::LinerNotes),
            6 => Ok(Self::MediaLabel),
            7 => Ok(Self::LeadArtist),
            8 => Ok(Self::Artist),
            9 => Ok(Self::Conductor),
            10 => Ok(Self::Band),
            11 => Ok(Self::Composer),
            12 => Ok(Self::Lyricist),
            13 => Ok(Self::RecordingLocation),
            14 => Ok(Self::DuringRecording),
            15 => Ok(Self::DuringPerformance),
            16 => Ok(Self::ScreenCapture),
            17 => Ok(Self::Fish),
            18 => Ok(Self::Illustration),
            19 => Ok(Self::BandLogo),
            20 => Ok(Self::PublisherLogo),
            _ => Err(Error::InvalidPictureType),
        }
    }
}

impl ToBitStream for PictureType {
    type Error = std::io::Error;

    fn to_writer<W: BitWrite + ?Sized>(&self, w: &mut W) -> Result<(), Self::Error> {
        w.write_from(*self as u32)
    }
}

/// A metadata block of a type not yet defined by the format
///
/// The FLAC format reserves block types 7 through 126 for
/// future use.  Because files containing such blocks remain
/// legal FLAC files, their contents are carried through
/// reading and editing byte for byte.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Unknown {
    /// The block's type code, from 7 to 126
    pub code: u8,
    /// The block's raw contents
    pub data: Vec<u8>,
}
