use sha1::{Digest, Sha1};
use std::path::{Path, PathBuf};

use super::*;

/// A single-file torrent: 40000 bytes in 16384-byte pieces (3 pieces).
/// Returns the full torrent bytes and the raw info dictionary bytes.
fn single_file_torrent() -> (Vec<u8>, Vec<u8>) {
    let mut info = Vec::new();
    info.extend_from_slice(b"d6:lengthi40000e4:name8:file.bin12:piece lengthi16384e6:pieces60:");
    info.extend((0..60).map(|i| i as u8));
    info.push(b'e');

    let mut full = Vec::new();
    full.extend_from_slice(b"d8:announce20:http://example.com/a4:info");
    full.extend_from_slice(&info);
    full.push(b'e');

    (full, info)
}

/// A multi-file torrent: `a/f1.bin` (5000 bytes) and `f2.bin` (3000 bytes)
/// in 4096-byte pieces, with a two-tier announce list.
fn multi_file_torrent() -> Vec<u8> {
    let mut info = Vec::new();
    info.extend_from_slice(b"d5:filesl");
    info.extend_from_slice(b"d6:lengthi5000e4:pathl1:a6:f1.binee");
    info.extend_from_slice(b"d6:lengthi3000e4:pathl6:f2.binee");
    info.extend_from_slice(b"e4:name3:dir12:piece lengthi4096e6:pieces40:");
    info.extend((0..40).map(|i| i as u8));
    info.push(b'e');

    let mut full = Vec::new();
    full.extend_from_slice(b"d8:announce20:http://example.com/a");
    full.extend_from_slice(b"13:announce-listll20:http://example.com/bel20:http://example.com/aee");
    full.extend_from_slice(b"4:info");
    full.extend_from_slice(&info);
    full.push(b'e');

    full
}

#[test]
fn test_single_file_parse() {
    let (bytes, _) = single_file_torrent();
    let metainfo = Metainfo::from_bytes(&bytes).unwrap();

    assert_eq!(metainfo.announce, "http://example.com/a");
    assert_eq!(metainfo.info.name, "file.bin");
    assert_eq!(metainfo.info.piece_length, 16384);
    assert_eq!(metainfo.info.num_pieces(), 3);
    assert_eq!(metainfo.info.total_length, 40000);
    assert_eq!(metainfo.info.base_dir, ".");
    assert_eq!(metainfo.info.files.len(), 1);
    assert_eq!(metainfo.info.files[0].path, PathBuf::from("file.bin"));
    assert_eq!(metainfo.info.files[0].length, 40000);
    assert!(!metainfo.info.private);
}

#[test]
fn test_piece_lengths() {
    let (bytes, _) = single_file_torrent();
    let info = Metainfo::from_bytes(&bytes).unwrap().info;

    assert_eq!(info.piece_len(0), 16384);
    assert_eq!(info.piece_len(1), 16384);
    assert_eq!(info.piece_len(2), 7232);
    assert_eq!(info.piece_len(3), 0);
}

#[test]
fn test_piece_len_exact_multiple() {
    let info = Info {
        name: "t".into(),
        piece_length: 4096,
        pieces: vec![[0; 20], [0; 20]],
        private: false,
        base_dir: ".".into(),
        files: vec![FileEntry {
            path: PathBuf::from("t"),
            length: 8192,
            offset: 0,
        }],
        total_length: 8192,
    };
    assert_eq!(info.piece_len(1), 4096);
}

#[test]
fn test_info_hash_stability() {
    let (bytes, info_bytes) = single_file_torrent();

    let mut hasher = Sha1::new();
    hasher.update(&info_bytes);
    let expected: [u8; 20] = hasher.finalize().into();

    let first = Metainfo::from_bytes(&bytes).unwrap();
    let second = Metainfo::from_bytes(&bytes).unwrap();

    assert_eq!(first.info_hash, InfoHash::from_bytes(expected));
    assert_eq!(first.info_hash, second.info_hash);
}

#[test]
fn test_info_hash_cached_forms() {
    let hash = InfoHash::from_bytes([0xab; 20]);
    assert_eq!(hash.hex(), "AB".repeat(20));
    assert_eq!(hash.url_encoded(), "%AB".repeat(20));
    assert_eq!(hash.to_string(), hash.hex());

    // Unreserved bytes pass through the URL encoding untouched
    let mut bytes = [0u8; 20];
    bytes[0] = b'a';
    bytes[1] = b'~';
    let hash = InfoHash::from_bytes(bytes);
    assert!(hash.url_encoded().starts_with("a~%00"));
}

#[test]
fn test_single_file_mapping() {
    let (bytes, _) = single_file_torrent();
    let info = Metainfo::from_bytes(&bytes).unwrap().info;
    let mapping = info.mapping();

    assert_eq!(mapping.piece_count(), 3);
    assert_eq!(mapping.entries().len(), 3);

    for piece in 0..3 {
        let entries = mapping.for_piece(piece);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].piece_range, 0..info.piece_len(piece));
    }

    let file_entries = mapping.for_file(Path::new("file.bin"));
    assert_eq!(file_entries.len(), 3);
    assert_eq!(file_entries[0].file_range, 0..16384);
    assert_eq!(file_entries[1].file_range, 16384..32768);
    assert_eq!(file_entries[2].file_range, 32768..40000);
}

#[test]
fn test_multi_file_parse() {
    let metainfo = Metainfo::from_bytes(&multi_file_torrent()).unwrap();

    assert_eq!(metainfo.info.base_dir, "dir");
    assert_eq!(metainfo.info.total_length, 8000);
    assert_eq!(metainfo.info.files.len(), 2);
    assert_eq!(metainfo.info.files[0].path, PathBuf::from("a/f1.bin"));
    assert_eq!(metainfo.info.files[0].offset, 0);
    assert_eq!(metainfo.info.files[1].path, PathBuf::from("f2.bin"));
    assert_eq!(metainfo.info.files[1].offset, 5000);
    assert_eq!(metainfo.announce_list.len(), 2);
    assert_eq!(metainfo.announce_list[0], vec!["http://example.com/b"]);
}

#[test]
fn test_multi_file_mapping_coverage() {
    let info = Metainfo::from_bytes(&multi_file_torrent()).unwrap().info;
    let mapping = info.mapping();

    assert_eq!(mapping.piece_count(), info.num_pieces());

    // Every piece is covered exactly once, start to end
    for piece in 0..mapping.piece_count() {
        let entries = mapping.for_piece(piece);
        let mut pos = 0u64;
        for entry in &entries {
            assert_eq!(entry.piece_range.start, pos);
            assert_eq!(
                entry.piece_range.end - entry.piece_range.start,
                entry.file_range.end - entry.file_range.start
            );
            pos = entry.piece_range.end;
        }
        assert_eq!(pos, info.piece_len(piece));
    }

    // Every file is covered exactly once, start to end
    for file in &info.files {
        let entries = mapping.for_file(&file.path);
        let mut pos = 0u64;
        for entry in &entries {
            assert_eq!(entry.file_range.start, pos);
            pos = entry.file_range.end;
        }
        assert_eq!(pos, file.length);
    }

    // The second piece spans the file boundary
    let boundary = mapping.for_piece(1);
    assert_eq!(boundary.len(), 2);
    assert_eq!(boundary[0].file, PathBuf::from("a/f1.bin"));
    assert_eq!(boundary[0].piece_range, 0..904);
    assert_eq!(boundary[1].file, PathBuf::from("f2.bin"));
    assert_eq!(boundary[1].piece_range, 904..3904);
}

#[test]
fn test_trackers_dedup() {
    let metainfo = Metainfo::from_bytes(&multi_file_torrent()).unwrap();
    // The second tier repeats the primary announce URL
    assert_eq!(
        metainfo.trackers(),
        vec!["http://example.com/a", "http://example.com/b"]
    );
}

#[test]
fn test_missing_announce() {
    let (_, info) = single_file_torrent();
    let mut without = Vec::new();
    without.extend_from_slice(b"d4:info");
    without.extend_from_slice(&info);
    without.push(b'e');
    assert!(matches!(
        Metainfo::from_bytes(&without),
        Err(MetainfoError::MissingField("announce"))
    ));
}

#[test]
fn test_invalid_pieces_length() {
    let mut info = Vec::new();
    info.extend_from_slice(b"d6:lengthi100e4:name1:f12:piece lengthi16384e6:pieces21:");
    info.extend((0..21).map(|i| i as u8));
    info.push(b'e');
    let mut full = Vec::new();
    full.extend_from_slice(b"d8:announce20:http://example.com/a4:info");
    full.extend_from_slice(&info);
    full.push(b'e');

    assert!(matches!(
        Metainfo::from_bytes(&full),
        Err(MetainfoError::InvalidField("pieces"))
    ));
}

#[test]
fn test_invalid_piece_length() {
    let full = b"d8:announce20:http://example.com/a4:infod6:lengthi100e4:name1:f12:piece lengthi0e6:pieces0:ee";
    assert!(matches!(
        Metainfo::from_bytes(full),
        Err(MetainfoError::InvalidField("piece length"))
    ));
}

#[test]
fn test_non_canonical_input_rejected() {
    // Info dictionary keys out of order: the decoder refuses it, which is
    // what keeps the info hash well defined.
    let full = b"d8:announce20:http://example.com/a4:infod4:name1:f6:lengthi100eee";
    assert!(matches!(
        Metainfo::from_bytes(full),
        Err(MetainfoError::Bencode(_))
    ));
}
