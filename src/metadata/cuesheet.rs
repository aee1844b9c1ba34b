use crate::Error;
use bitstream_io::{BitRead, BitWrite, FromBitStream, ToBitStream};

/// A CUESHEET metadata block
///
/// This block stores the layout of the original disc
/// for FLAC files which are whole CD images.
///
/// This block may occur multiple times in a FLAC file.
///
/// | Bits | Field | Meaning |
/// |-----:|------:|---------|
/// | 128×8 | `catalog_number` | media catalog number, in ASCII, NUL-padded |
/// | 64   | `lead_in_samples` | number of lead-in samples |
/// | 1    | `is_cdda` | whether the cue sheet corresponds to CD-DA |
/// | 7 + 258×8 | | reserved, all 0 |
/// | 8    | track count | number of tracks, including the lead-out |
///
/// followed by that many [`CuesheetTrack`]s.
///
/// The final track is the lead-out track, whose offset marks
/// the end of the disc's audio and which has no index points.
#[derive(Debug, Clone, Eq, PartialEq, Default)]
pub struct Cuesheet {
    /// The media catalog number, in printable ASCII
    ///
    /// An empty string indicates no catalog number.
    pub catalog_number: String,
    /// The number of lead-in samples
    ///
    /// Meaningful only for CD-DA cue sheets.
    pub lead_in_samples: u64,
    /// Whether the cue sheet corresponds to a Compact Disc
    pub is_cdda: bool,
    /// All tracks, including the trailing lead-out track
    pub tracks: Vec<CuesheetTrack>,
}

impl Cuesheet {
    /// Maximum byte length of the catalog number
    pub const CATALOG_LEN: usize = 128;

    /// Size of block contents, in bytes
    pub(crate) fn byte_length(&self) -> u64 {
        // fixed header: catalog number, lead-in, flag + reserved, track count
        (Self::CATALOG_LEN as u64 + 8 + (1 + 7 + 258 * 8) / 8 + 1)
            + self
                .tracks
                .iter()
                .map(|t| 36 + 12 * t.index_points.len() as u64)
                .sum::<u64>()
    }
}

impl FromBitStream for Cuesheet {
    type Error = Error;

    fn from_reader<R: BitRead + ?Sized>(r: &mut R) -> Result<Self, Self::Error> {
        let catalog_number: [u8; Self::CATALOG_LEN] = r.read_to()?;
        let lead_in_samples = r.read_to()?;
        let is_cdda = r.read_bit()?;
        r.skip(7 + 258 * 8)?;
        let track_count: u8 = r.read_to()?;

        Ok(Self {
            catalog_number: String::from_utf8(trim_nulls(&catalog_number).to_vec())?,
            lead_in_samples,
            is_cdda,
            tracks: (0..track_count)
                .map(|_| r.parse())
                .collect::<Result<Vec<_>, _>>()?,
        })
    }
}

impl ToBitStream for Cuesheet {
    type Error = Error;

    fn to_writer<W: BitWrite + ?Sized>(&self, w: &mut W) -> Result<(), Self::Error> {
        w.write_from(nul_padded::<{ Self::CATALOG_LEN }>(&self.catalog_number)?)?;
        w.write_from(self.lead_in_samples)?;
        w.write_bit(self.is_cdda)?;
        w.pad(7 + 258 * 8)?;
        w.write::<8, _>(
            u8::try_from(self.tracks.len()).map_err(|_| Error::InvalidCuesheetTracks)?,
        )?;
        self.tracks.iter().try_for_each(|track| w.build(track))
    }
}

/// An individual CUESHEET track
///
/// | Bits | Field | Meaning |
/// |-----:|------:|---------|
/// | 64   | `offset` | offset of first index point, in samples |
/// | 8    | `number` | track number |
/// | 12×8 | `isrc` | track ISRC, in ASCII, NUL-padded |
/// | 1    | `non_audio` | whether a non-audio track |
/// | 1    | `pre_emphasis` | whether the track has pre-emphasis |
/// | 6 + 13×8 | | reserved, all 0 |
/// | 8    | index count | number of index points |
///
/// followed by that many [`CuesheetIndex`]es.
#[derive(Debug, Clone, Eq, PartialEq, Default)]
pub struct CuesheetTrack {
    /// The track's offset, in samples, from the start of the stream
    pub offset: u64,
    /// The track's number
    ///
    /// CD-DA tracks number from 1 to 99, with 170 for the lead-out;
    /// other cue sheets use 255 for the lead-out track.
    pub number: u8,
    /// The track's ISRC, in printable ASCII
    ///
    /// An empty string indicates no ISRC.
    pub isrc: String,
    /// Whether the track is a non-audio track
    pub non_audio: bool,
    /// Whether the track audio has pre-emphasis
    pub pre_emphasis: bool,
    /// The track's index points
    ///
    /// These are empty for the lead-out track.
    pub index_points: Vec<CuesheetIndex>,
}

impl CuesheetTrack {
    /// Defined byte length of an ISRC
    pub const ISRC_LEN: usize = 12;
}

impl FromBitStream for CuesheetTrack {
    type Error = Error;

    fn from_reader<R: BitRead + ?Sized>(r: &mut R) -> Result<Self, Self::Error> {
        let offset = r.read_to()?;
        let number = r.read_to()?;
        let isrc: [u8; Self::ISRC_LEN] = r.read_to()?;
        let non_audio = r.read_bit()?;
        let pre_emphasis = r.read_bit()?;
        r.skip(6 + 13 * 8)?;
        let index_count: u8 = r.read_to()?;

        Ok(Self {
            offset,
            number,
            isrc: String::from_utf8(trim_nulls(&isrc).to_vec())?,
            non_audio,
            pre_emphasis,
            index_points: (0..index_count)
                .map(|_| r.parse())
                .collect::<Result<Vec<_>, _>>()?,
        })
    }
}

impl ToBitStream for CuesheetTrack {
    type Error = Error;

    fn to_writer<W: BitWrite + ?Sized>(&self, w: &mut W) -> Result<(), Self::Error> {
        w.write_from(self.offset)?;
        w.write_from(self.number)?;
        w.write_from(nul_padded::<{ Self::ISRC_LEN }>(&self.isrc)?)?;
        w.write_bit(self.non_audio)?;
        w.write_bit(self.pre_emphasis)?;
        w.pad(6 + 13 * 8)?;
        w.write::<8, _>(
            u8::try_from(self.index_points.len())
                .map_err(|_| Error::InvalidCuesheetIndexPoints)?,
        )?;
        self.index_points
            .iter()
            .try_for_each(|index| w.build(index).map_err(Error::Io))
    }
}

/// An individual CUESHEET track index point
///
/// | Bits | Field | Meaning |
/// |-----:|------:|---------|
/// | 64   | `offset` | offset of index point, in samples, relative to the track offset |
/// | 8    | `number` | index point number |
/// | 3×8  | | reserved, all 0 |
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub struct CuesheetIndex {
    /// The index point's offset, in samples, relative to the track offset
    pub offset: u64,
    /// The index point number
    pub number: u8,
}

impl FromBitStream for CuesheetIndex {
    type Error = Error;

    fn from_reader<R: BitRead + ?Sized>(r: &mut R) -> Result<Self, Self::Error> {
        let offset = r.read_to()?;
        let number = r.read_to()?;
        r.skip(3 * 8)?;
        Ok(Self { offset, number })
    }
}

impl ToBitStream for CuesheetIndex {
    type Error = std::io::Error;

    fn to_writer<W: BitWrite + ?Sized>(&self, w: &mut W) -> Result<(), Self::Error> {
        w.write_from(self.offset)?;
        w.write_from(self.number)?;
        w.pad(3 * 8)
    }
}

// trims any trailing null bytes
fn trim_nulls(mut s: &[u8]) -> &[u8] {
    while let [rest @ .., 0] = s {
        s = rest;
    }
    s
}

// pads a string with trailing null bytes to a fixed length
fn nul_padded<const LEN: usize>(s: &str) -> Result<[u8; LEN], Error> {
    let bytes = s.as_bytes();
    if bytes.len() > LEN {
        return Err(Error::ExcessiveStringLength);
    }
    let mut padded = [0; LEN];
    padded[..bytes.len()].copy_from_slice(bytes);
    Ok(padded)
}
