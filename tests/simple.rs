use flac_metaedit::Error;
use flac_metaedit::metadata::{
    Application, Block, BlockType, Cuesheet, Padding, SimpleIterator, Streaminfo, VorbisComment,
    read_blocks, write_blocks,
};
use std::io::{Read, Write};
use std::num::NonZero;
use std::path::{Path, PathBuf};

const FRAMES: &[u8] = b"these bytes stand in for audio frames";

fn streaminfo() -> Block {
    Block::Streaminfo(Streaminfo {
        minimum_block_size: 4096,
        maximum_block_size: 4096,
        minimum_frame_size: None,
        maximum_frame_size: None,
        sample_rate: 44100,
        channels: NonZero::new(2).unwrap(),
        bits_per_sample: NonZero::new(16).unwrap(),
        total_samples: None,
        md5: None,
    })
}

/// A comment block sized at 18 + the title's length
fn comment(title: &str) -> Block {
    Block::VorbisComment(VorbisComment {
        vendor_string: String::new(),
        fields: vec![format!("TITLE={title}")],
    })
}

/// An application block sized at 4 + `data_len`
fn application(data_len: usize, fill: u8) -> Block {
    Block::Application(Application {
        id: Application::RIFF,
        data: vec![fill; data_len],
    })
}

fn padding(size: u16) -> Block {
    Block::Padding(Padding { size: size.into() })
}

fn temp_flac(blocks: &[Block]) -> PathBuf {
    let path = std::env::temp_dir().join(format!("simple-{:016x}.flac", fastrand::u64(..)));
    let mut file = std::fs::File::create(&path).unwrap();
    write_blocks(&mut file, blocks).unwrap();
    file.write_all(FRAMES).unwrap();
    path
}

fn contents(path: &Path) -> (Vec<Block>, Vec<u8>) {
    let data = std::fs::read(path).unwrap();
    let mut cursor = std::io::Cursor::new(data.as_slice());
    let blocks = read_blocks(cursor.by_ref())
        .collect::<Result<Vec<_>, _>>()
        .unwrap();
    let mut rest = Vec::new();
    cursor.read_to_end(&mut rest).unwrap();
    (blocks, rest)
}

fn file_len(path: &Path) -> u64 {
    std::fs::metadata(path).unwrap().len()
}

fn assert_no_tempfile(path: &Path) {
    let mut tempfile = path.as_os_str().to_owned();
    tempfile.push(".metadata_edit");
    assert!(!PathBuf::from(tempfile).exists());
}

#[test]
fn test_iteration() {
    let path = temp_flac(&[streaminfo(), application(16, 0xaa), padding(10)]);

    let mut it = SimpleIterator::open(&path, true, false).unwrap();
    assert!(!it.is_writable());
    assert_eq!(it.block_type(), BlockType::Streaminfo);
    assert_eq!(it.block_offset(), 4);
    assert!(!it.is_last());
    assert!(!it.prev().unwrap());
    assert_eq!(it.application_id().unwrap(), None);

    assert!(it.next().unwrap());
    assert_eq!(it.block_type(), BlockType::Application);
    assert_eq!(it.block_offset(), 4 + 38);
    assert_eq!(u64::from(it.block_length()), 20);
    assert_eq!(it.application_id().unwrap(), Some(Application::RIFF));
    assert_eq!(it.get_block().unwrap(), application(16, 0xaa));

    assert!(it.next().unwrap());
    assert_eq!(it.block_type(), BlockType::Padding);
    assert!(it.is_last());
    assert!(!it.next().unwrap());

    assert!(it.prev().unwrap());
    assert_eq!(it.block_type(), BlockType::Application);
    assert!(it.prev().unwrap());
    assert_eq!(it.block_type(), BlockType::Streaminfo);

    // read-only handles refuse edits
    assert!(matches!(
        it.set_block(&streaminfo(), true),
        Err(Error::NotWritable)
    ));

    std::fs::remove_file(path).unwrap();
}

#[test]
fn test_set_block_in_place() {
    let path = temp_flac(&[streaminfo(), comment("AAAA"), padding(20)]);
    let before = file_len(&path);

    let mut it = SimpleIterator::open(&path, false, false).unwrap();
    assert!(it.is_writable());
    assert!(it.next().unwrap());

    // a block of unchanged size is simply overwritten
    it.set_block(&comment("BBBB"), false).unwrap();
    assert_eq!(it.block_type(), BlockType::VorbisComment);
    assert_eq!(file_len(&path), before);
    assert_eq!(
        contents(&path),
        (
            vec![streaminfo(), comment("BBBB"), padding(20)],
            FRAMES.to_vec(),
        ),
    );

    std::fs::remove_file(path).unwrap();
}

#[test]
fn test_set_block_padding_geometry() {
    let path = temp_flac(&[streaminfo(), application(96, 1)]);
    let before = file_len(&path);

    let mut it = SimpleIterator::open(&path, false, false).unwrap();
    assert!(it.next().unwrap());

    // shrinking leaves a PADDING block behind
    it.set_block(&application(36, 2), true).unwrap();
    assert_eq!(file_len(&path), before);
    assert_eq!(
        contents(&path),
        (
            vec![streaminfo(), application(36, 2), padding(56)],
            FRAMES.to_vec(),
        ),
    );
    assert_eq!(it.block_type(), BlockType::Application);
    assert!(!it.is_last());

    // growing eats into the following PADDING block
    it.set_block(&application(52, 3), true).unwrap();
    assert_eq!(file_len(&path), before);
    assert_eq!(
        contents(&path),
        (
            vec![streaminfo(), application(52, 3), padding(40)],
            FRAMES.to_vec(),
        ),
    );

    // growing can also consume the PADDING block entirely
    it.set_block(&application(96, 4), true).unwrap();
    assert_eq!(file_len(&path), before);
    assert_eq!(
        contents(&path),
        (vec![streaminfo(), application(96, 4)], FRAMES.to_vec()),
    );
    assert!(it.is_last());

    std::fs::remove_file(path).unwrap();
}

#[test]
fn test_set_block_whole_rewrite() {
    let path = temp_flac(&[streaminfo(), application(8, 1), application(8, 2)]);
    let before = file_len(&path);

    let mut it = SimpleIterator::open(&path, false, false).unwrap();
    assert!(it.next().unwrap());

    // growing with no PADDING block to eat rewrites the file
    it.set_block(&application(20, 3), true).unwrap();
    assert_eq!(file_len(&path), before + 12);
    assert_eq!(
        contents(&path),
        (
            vec![streaminfo(), application(20, 3), application(8, 2)],
            FRAMES.to_vec(),
        ),
    );
    assert_eq!(it.get_block().unwrap(), application(20, 3));
    assert_no_tempfile(&path);

    // so does shrinking when padding isn't wanted
    it.set_block(&application(8, 4), false).unwrap();
    assert_eq!(file_len(&path), before);
    assert_eq!(
        contents(&path),
        (
            vec![streaminfo(), application(8, 4), application(8, 2)],
            FRAMES.to_vec(),
        ),
    );
    assert_no_tempfile(&path);

    std::fs::remove_file(path).unwrap();
}

#[test]
fn test_insert_block_after() {
    // the new block takes the front of a large PADDING block
    let path = temp_flac(&[streaminfo(), padding(60)]);
    let before = file_len(&path);

    let mut it = SimpleIterator::open(&path, false, false).unwrap();
    it.insert_block_after(&comment("AB"), true).unwrap();
    assert_eq!(it.block_type(), BlockType::VorbisComment);
    assert_eq!(file_len(&path), before);
    assert_eq!(
        contents(&path),
        (
            vec![streaminfo(), comment("AB"), padding(36)],
            FRAMES.to_vec(),
        ),
    );
    std::fs::remove_file(path).unwrap();

    // or replaces a PADDING block of exactly its own size
    let path = temp_flac(&[streaminfo(), padding(20)]);
    let before = file_len(&path);

    let mut it = SimpleIterator::open(&path, false, false).unwrap();
    it.insert_block_after(&comment("AB"), true).unwrap();
    assert_eq!(it.block_type(), BlockType::VorbisComment);
    assert!(it.is_last());
    assert_eq!(file_len(&path), before);
    assert_eq!(
        contents(&path),
        (vec![streaminfo(), comment("AB")], FRAMES.to_vec()),
    );
    std::fs::remove_file(path).unwrap();

    // with no PADDING block to take, the file is rewritten
    let path = temp_flac(&[streaminfo()]);
    let before = file_len(&path);

    let mut it = SimpleIterator::open(&path, false, false).unwrap();
    assert!(matches!(
        it.insert_block_after(&streaminfo(), true),
        Err(Error::MultipleStreaminfo)
    ));
    it.insert_block_after(&comment("AB"), true).unwrap();
    assert_eq!(it.block_type(), BlockType::VorbisComment);
    assert!(it.is_last());
    assert_eq!(file_len(&path), before + 24);
    assert_eq!(
        contents(&path),
        (vec![streaminfo(), comment("AB")], FRAMES.to_vec()),
    );
    assert_no_tempfile(&path);
    std::fs::remove_file(path).unwrap();
}

#[test]
fn test_delete_block() {
    // deleted blocks may leave a PADDING block in their place
    let path = temp_flac(&[streaminfo(), application(26, 1), padding(10)]);
    let before = file_len(&path);

    let mut it = SimpleIterator::open(&path, false, false).unwrap();
    assert!(matches!(it.delete_block(true), Err(Error::MissingStreaminfo)));
    assert!(it.next().unwrap());
    it.delete_block(true).unwrap();
    assert_eq!(it.block_type(), BlockType::Streaminfo);
    assert_eq!(file_len(&path), before);
    assert_eq!(
        contents(&path),
        (
            vec![streaminfo(), padding(30), padding(10)],
            FRAMES.to_vec(),
        ),
    );
    std::fs::remove_file(path).unwrap();

    // or be removed outright by rewriting the file
    let path = temp_flac(&[streaminfo(), application(26, 1), padding(10)]);
    let before = file_len(&path);

    let mut it = SimpleIterator::open(&path, false, false).unwrap();
    assert!(it.next().unwrap());
    it.delete_block(false).unwrap();
    assert_eq!(it.block_type(), BlockType::Streaminfo);
    assert_eq!(file_len(&path), before - 34);
    assert_eq!(
        contents(&path),
        (vec![streaminfo(), padding(10)], FRAMES.to_vec()),
    );
    assert_no_tempfile(&path);
    std::fs::remove_file(path).unwrap();

    // removing the final block makes its predecessor last
    let path = temp_flac(&[streaminfo(), application(6, 1)]);

    let mut it = SimpleIterator::open(&path, false, false).unwrap();
    assert!(it.next().unwrap());
    it.delete_block(false).unwrap();
    assert_eq!(it.block_type(), BlockType::Streaminfo);
    assert!(it.is_last());
    assert_eq!(contents(&path), (vec![streaminfo()], FRAMES.to_vec()));
    std::fs::remove_file(path).unwrap();
}

#[test]
fn test_streaminfo_protection() {
    let path = temp_flac(&[streaminfo(), application(6, 1)]);
    let before = std::fs::read(&path).unwrap();

    let mut it = SimpleIterator::open(&path, false, false).unwrap();
    assert!(matches!(
        it.set_block(&application(6, 2), true),
        Err(Error::MissingStreaminfo)
    ));

    assert!(it.next().unwrap());
    assert!(matches!(
        it.set_block(&streaminfo(), true),
        Err(Error::MultipleStreaminfo)
    ));
    assert!(matches!(
        it.insert_block_after(&streaminfo(), true),
        Err(Error::MultipleStreaminfo)
    ));

    // failed edits leave the file untouched
    assert_eq!(std::fs::read(&path).unwrap(), before);
    std::fs::remove_file(path).unwrap();
}

#[test]
fn test_failed_rewrite_leaves_file_unchanged() {
    let path = temp_flac(&[streaminfo(), application(26, 1)]);
    let before = std::fs::read(&path).unwrap();

    let mut it = SimpleIterator::open(&path, false, false).unwrap();
    assert!(it.next().unwrap());

    // too long for the 128-byte catalog number field,
    // which is only caught partway through the rewrite
    let cuesheet = Block::Cuesheet(Cuesheet {
        catalog_number: "0".repeat(200),
        ..Cuesheet::default()
    });
    assert!(matches!(
        it.set_block(&cuesheet, false),
        Err(Error::ExcessiveStringLength)
    ));
    drop(it);

    assert_eq!(std::fs::read(&path).unwrap(), before);
    assert_no_tempfile(&path);

    std::fs::remove_file(path).unwrap();
}

#[test]
fn test_preserve_stats() {
    use std::time::{Duration, SystemTime};

    let path = temp_flac(&[streaminfo(), application(6, 1)]);

    let old = SystemTime::UNIX_EPOCH + Duration::from_secs(1_000_000_000);
    std::fs::OpenOptions::new()
        .write(true)
        .open(&path)
        .unwrap()
        .set_times(
            std::fs::FileTimes::new()
                .set_accessed(old)
                .set_modified(old),
        )
        .unwrap();

    let mut it = SimpleIterator::open(&path, false, true).unwrap();
    assert!(it.next().unwrap());
    it.delete_block(false).unwrap();

    // a whole-file rewrite still preserves the timestamps
    assert_eq!(contents(&path).0, vec![streaminfo()]);
    assert_eq!(std::fs::metadata(&path).unwrap().modified().unwrap(), old);

    std::fs::remove_file(path).unwrap();
}
