use flac_metaedit::Error;
use flac_metaedit::metadata::{
    Application, Block, BlockSize, Chain, Cuesheet, Padding, Streaminfo, Unknown, VorbisComment,
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
    let path = std::env::temp_dir().join(format!("chain-{:016x}.flac", fastrand::u64(..)));
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
fn test_chain_roundtrip() {
    let blocks = vec![streaminfo(), application(6, 1), padding(10)];
    let mut flac = Vec::new();
    write_blocks(&mut flac, &blocks).unwrap();

    let mut chain = Chain::read_from(std::io::Cursor::new(flac.as_slice())).unwrap();
    assert_eq!(chain.blocks(), &blocks[..]);

    let mut rewritten = Vec::new();
    chain.write_to(&mut rewritten).unwrap();
    assert_eq!(rewritten, flac);

    // a chain read from a raw stream has no file to write to
    assert!(matches!(chain.write(true, false), Err(Error::NotWritable)));
}

#[test]
fn test_grow_into_tail_padding() {
    let path = temp_flac(&[streaminfo(), comment("AB"), padding(50)]);
    let before = file_len(&path);

    let mut chain = Chain::read(&path).unwrap();
    let mut it = chain.iter();
    assert!(it.next());
    it.set_block(comment("ABCDEFGHIJLM")).unwrap(); // 10 bytes bigger

    assert!(!chain.check_if_tempfile_needed(true).unwrap());
    assert!(chain.check_if_tempfile_needed(false).unwrap());

    chain.write(true, false).unwrap();
    assert_eq!(file_len(&path), before);
    assert_eq!(
        contents(&path),
        (
            vec![streaminfo(), comment("ABCDEFGHIJLM"), padding(40)],
            FRAMES.to_vec(),
        ),
    );
    assert_no_tempfile(&path);

    std::fs::remove_file(path).unwrap();
}

#[test]
fn test_shrink_grows_tail_padding() {
    let path = temp_flac(&[streaminfo(), comment("ABCDEFGHIJ"), padding(10)]);
    let before = file_len(&path);

    let mut chain = Chain::read(&path).unwrap();
    let mut it = chain.iter();
    assert!(it.next());
    it.set_block(comment("AB")).unwrap(); // 8 bytes smaller

    assert!(!chain.check_if_tempfile_needed(true).unwrap());
    chain.write(true, false).unwrap();
    assert_eq!(file_len(&path), before);
    assert_eq!(
        contents(&path),
        (
            vec![streaminfo(), comment("AB"), padding(18)],
            FRAMES.to_vec(),
        ),
    );

    std::fs::remove_file(path).unwrap();
}

#[test]
fn test_shrink_appends_padding() {
    let path = temp_flac(&[streaminfo(), application(26, 1)]);
    let before = file_len(&path);

    let mut chain = Chain::read(&path).unwrap();
    let mut it = chain.iter();
    assert!(it.next());
    it.set_block(application(16, 1)).unwrap(); // 10 bytes smaller

    assert!(!chain.check_if_tempfile_needed(true).unwrap());
    chain.write(true, false).unwrap();
    assert_eq!(file_len(&path), before);
    assert_eq!(
        contents(&path),
        (
            vec![streaminfo(), application(16, 1), padding(6)],
            FRAMES.to_vec(),
        ),
    );

    std::fs::remove_file(path).unwrap();
}

#[test]
fn test_remove_tail_padding() {
    // growth which exactly consumes the trailing PADDING block,
    // header included, removes it outright
    let path = temp_flac(&[streaminfo(), comment("AB"), padding(16)]);
    let before = file_len(&path);

    let mut chain = Chain::read(&path).unwrap();
    let mut it = chain.iter();
    assert!(it.next());
    it.set_block(comment("ABCDEFGHIJKLMNOPQRSTUV")).unwrap(); // 20 bytes bigger

    assert!(!chain.check_if_tempfile_needed(true).unwrap());
    chain.write(true, false).unwrap();
    assert_eq!(file_len(&path), before);
    assert_eq!(
        contents(&path),
        (
            vec![streaminfo(), comment("ABCDEFGHIJKLMNOPQRSTUV")],
            FRAMES.to_vec(),
        ),
    );

    std::fs::remove_file(path).unwrap();
}

#[test]
fn test_whole_file_rewrite() {
    let path = temp_flac(&[streaminfo(), comment("AB"), padding(4)]);
    let before = file_len(&path);

    let mut chain = Chain::read(&path).unwrap();
    let mut it = chain.iter();
    assert!(it.next());
    // 20 bytes bigger, more than the trailing PADDING block can give
    it.set_block(comment("ABCDEFGHIJKLMNOPQRSTUV")).unwrap();

    assert!(chain.check_if_tempfile_needed(true).unwrap());
    chain.write(true, false).unwrap();
    assert_eq!(file_len(&path), before + 20);
    assert_eq!(
        contents(&path),
        (
            vec![streaminfo(), comment("ABCDEFGHIJKLMNOPQRSTUV"), padding(4)],
            FRAMES.to_vec(),
        ),
    );
    assert_no_tempfile(&path);

    // the rewritten file is the new baseline
    assert!(!chain.check_if_tempfile_needed(true).unwrap());

    std::fs::remove_file(path).unwrap();
}

#[test]
fn test_shrink_too_small_for_padding() {
    // a 1 to 3 byte shrink leaves no room for a PADDING header
    let path = temp_flac(&[streaminfo(), application(26, 1)]);

    let mut chain = Chain::read(&path).unwrap();
    let mut it = chain.iter();
    assert!(it.next());
    it.set_block(application(24, 1)).unwrap();

    assert!(chain.check_if_tempfile_needed(true).unwrap());
    chain.write(true, false).unwrap();
    assert_eq!(
        contents(&path),
        (vec![streaminfo(), application(24, 1)], FRAMES.to_vec()),
    );

    std::fs::remove_file(path).unwrap();
}

#[test]
fn test_sort_and_merge_padding() {
    let blocks = vec![streaminfo(), padding(10), application(6, 1), padding(20)];
    let mut flac = Vec::new();
    write_blocks(&mut flac, &blocks).unwrap();

    let mut chain = Chain::read_from(std::io::Cursor::new(flac.as_slice())).unwrap();
    chain.sort_padding();

    // merging absorbs the freed headers, preserving total size
    assert_eq!(
        chain.blocks(),
        &[streaminfo(), application(6, 1), padding(34)][..],
    );
    assert!(!chain.check_if_tempfile_needed(true).unwrap());
    assert!(!chain.check_if_tempfile_needed(false).unwrap());
}

#[test]
fn test_chain_iterator() {
    let mut flac = Vec::new();
    write_blocks(&mut flac, &[streaminfo(), application(6, 1), padding(10)]).unwrap();

    let mut chain = Chain::read_from(std::io::Cursor::new(flac.as_slice())).unwrap();
    let mut it = chain.iter();

    // nothing displaces or precedes STREAMINFO
    assert_eq!(it.block(), &streaminfo());
    assert!(matches!(it.set_block(padding(4)), Err(Error::MissingStreaminfo)));
    assert!(matches!(
        it.insert_block_before(padding(4)),
        Err(Error::MissingStreaminfo)
    ));
    assert!(matches!(it.delete_block(false), Err(Error::MissingStreaminfo)));
    assert!(matches!(
        it.insert_block_after(streaminfo()),
        Err(Error::MultipleStreaminfo)
    ));
    assert!(!it.prev());

    assert!(it.next());
    assert_eq!(it.block(), &application(6, 1));

    // insertions leave the cursor on the new block
    it.insert_block_after(comment("AB")).unwrap();
    assert_eq!(it.block(), &comment("AB"));
    it.insert_block_before(application(2, 9)).unwrap();
    assert_eq!(it.block(), &application(2, 9));

    // replacing with padding keeps the block's total size
    it.delete_block(true).unwrap();
    assert_eq!(it.block(), &application(6, 1));
    assert!(it.next());
    assert_eq!(it.block(), &padding(6));

    assert!(it.next());
    it.delete_block(false).unwrap();
    assert_eq!(it.block(), &padding(6));

    assert!(it.prev());
    if let Block::Application(app) = it.block_mut() {
        app.data = vec![7; 6];
    }

    assert_eq!(
        chain.blocks(),
        &[streaminfo(), application(6, 7), padding(6), padding(10)][..],
    );
}

#[test]
fn test_shrink_clamps_appended_padding() {
    fn unknown(data_len: usize) -> Block {
        Block::Unknown(Unknown {
            code: 99,
            data: vec![0; data_len],
        })
    }

    let path = temp_flac(&[streaminfo(), unknown((1 << 24) - 1), application(26, 3)]);
    let before = file_len(&path);

    let mut chain = Chain::read(&path).unwrap();
    let mut it = chain.iter();
    assert!(it.next());
    it.set_block(unknown(0)).unwrap();
    assert!(it.next());
    it.set_block(application(6, 3)).unwrap();

    // the gap left behind is too wide for even the largest
    // PADDING block, so the file still shrinks
    assert!(chain.check_if_tempfile_needed(true).unwrap());
    chain.write(true, false).unwrap();

    assert_eq!(
        contents(&path),
        (
            vec![
                streaminfo(),
                unknown(0),
                application(6, 3),
                Block::Padding(Padding {
                    size: BlockSize::try_from((1u32 << 24) - 1).unwrap(),
                }),
            ],
            FRAMES.to_vec(),
        ),
    );
    assert_eq!(file_len(&path), before - 16);
    assert_no_tempfile(&path);

    std::fs::remove_file(path).unwrap();
}

#[test]
fn test_failed_rewrite_leaves_file_unchanged() {
    let path = temp_flac(&[streaminfo(), application(26, 1)]);
    let before = std::fs::read(&path).unwrap();

    let mut chain = Chain::read(&path).unwrap();
    let mut it = chain.iter();
    assert!(it.next());
    it.set_block(Block::Cuesheet(Cuesheet {
        // too long for the 128-byte catalog number field,
        // which is only caught partway through the rewrite
        catalog_number: "0".repeat(200),
        ..Cuesheet::default()
    }))
    .unwrap();

    assert!(matches!(
        chain.write(false, false),
        Err(Error::ExcessiveStringLength)
    ));

    assert_eq!(std::fs::read(&path).unwrap(), before);
    assert_no_tempfile(&path);

    std::fs::remove_file(path).unwrap();
}

#[test]
fn test_rewrite_preserves_id3_prefix() {
    // an ID3v2 tag ahead of the stream survives a whole-file rewrite
    let mut blocks_bytes = Vec::new();
    write_blocks(&mut blocks_bytes, &[streaminfo(), comment("AB")]).unwrap();

    let mut id3 = b"ID3\x04\x00\x00\x00\x00\x00\x0a".to_vec();
    id3.extend_from_slice(&[0; 10]);

    let path = std::env::temp_dir().join(format!("chain-{:016x}.flac", fastrand::u64(..)));
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(&id3).unwrap();
    file.write_all(&blocks_bytes).unwrap();
    file.write_all(FRAMES).unwrap();
    drop(file);

    let mut chain = Chain::read(&path).unwrap();
    let mut it = chain.iter();
    assert!(it.next());
    it.set_block(comment("A considerably longer title")).unwrap();

    assert!(chain.check_if_tempfile_needed(true).unwrap());
    chain.write(true, false).unwrap();

    let data = std::fs::read(&path).unwrap();
    assert!(data.starts_with(&id3));
    assert!(data.ends_with(FRAMES));
    assert_eq!(
        read_blocks(data.as_slice())
            .collect::<Result<Vec<_>, _>>()
            .unwrap(),
        vec![streaminfo(), comment("A considerably longer title")],
    );

    std::fs::remove_file(path).unwrap();
}
