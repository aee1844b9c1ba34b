//! A library for reading and editing the metadata of FLAC files.
//!
//! Three levels of access are provided, in increasing order of
//! sophistication:
//!
//! - the [`metadata`] module's [`read_blocks`](metadata::read_blocks) and
//!   [`write_blocks`](metadata::write_blocks) functions operate on whole
//!   streams of metadata blocks
//! - [`SimpleIterator`](metadata::SimpleIterator) walks the blocks of a
//!   file on disk and edits them in place, rewriting as little of the
//!   file as it can get away with
//! - [`Chain`](metadata::Chain) reads all of a file's metadata into
//!   memory for arbitrary editing and writes it back in one pass

pub mod metadata;

#[derive(Debug)]
pub enum Error {
    Io(std::io::Error),
    Utf8(std::string::FromUtf8Error),
    MissingFlacTag,
    MissingStreaminfo,
    MultipleStreaminfo,
    NotWritable,
    InvalidMetadataBlock,
    InvalidMetadataBlockSize,
    ExcessiveBlockSize,
    ExcessiveStringLength,
    InvalidSeekTableSize,
    InvalidPictureType,
    InsufficientApplicationBlock,
    InvalidCuesheetTracks,
    InvalidCuesheetIndexPoints,
}

impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Self::Io(error)
    }
}

impl From<std::string::FromUtf8Error> for Error {
    fn from(error: std::string::FromUtf8Error) -> Self {
        Self::Utf8(error)
    }
}

impl std::error::Error for Error {}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::Io(e) => e.fmt(f),
            Self::Utf8(e) => e.fmt(f),
            Self::MissingFlacTag => "missing FLAC tag".fmt(f),
            Self::MissingStreaminfo => "STREAMINFO block not first in file".fmt(f),
            Self::MultipleStreaminfo => "multiple STREAMINFO blocks found in file".fmt(f),
            Self::NotWritable => "file opened read-only".fmt(f),
            Self::InvalidMetadataBlock => "invalid metadata block type".fmt(f),
            Self::InvalidMetadataBlockSize => "invalid metadata block size".fmt(f),
            Self::ExcessiveBlockSize => "metadata block too large for 24-bit size field".fmt(f),
            Self::ExcessiveStringLength => "string too large for metadata field".fmt(f),
            Self::InvalidSeekTableSize => "invalid SEEKTABLE block size".fmt(f),
            Self::InvalidPictureType => "reserved PICTURE type".fmt(f),
            Self::InsufficientApplicationBlock => "APPLICATION block too small for data".fmt(f),
            Self::InvalidCuesheetTracks => "invalid number of CUESHEET tracks".fmt(f),
            Self::InvalidCuesheetIndexPoints => {
                "invalid number of CUESHEET track index points".fmt(f)
            }
        }
    }
}
