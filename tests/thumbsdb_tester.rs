use std::path::PathBuf;
use thumbex::{extract_file, CancelToken, ExtractError, ExtractOptions, MemorySink};

fn test_location(path: &str) -> String {
    let mut location = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    location.push(path);
    location.display().to_string()
}

fn options() -> ExtractOptions {
    ExtractOptions {
        md5: false,
        ..Default::default()
    }
}

#[test]
fn test_empty_thumbs_db() {
    let path = test_location("tests/test_data/windows/thumbsdb/empty.db");
    let mut sink = MemorySink::new();
    let summary =
        extract_file(&path, &mut sink, None, &options(), &CancelToken::new()).unwrap();

    assert_eq!(summary.emitted, 0);
    assert_eq!(summary.catalog_entries, 0);
    assert_eq!(summary.skipped_streams, 0);
    assert!(sink.thumbnails.is_empty());
}

#[test]
fn test_beta_signature_thumbs_db() {
    let path = test_location("tests/test_data/windows/thumbsdb/beta.db");
    let mut sink = MemorySink::new();
    let summary =
        extract_file(&path, &mut sink, None, &options(), &CancelToken::new()).unwrap();

    assert_eq!(summary.emitted, 0);
    assert!(sink.thumbnails.is_empty());
}

#[test]
fn test_type2_streams() {
    let path = test_location("tests/test_data/windows/thumbsdb/type2.db");
    let mut sink = MemorySink::new();
    let summary =
        extract_file(&path, &mut sink, None, &options(), &CancelToken::new()).unwrap();

    assert_eq!(summary.emitted, 2);
    assert_eq!(summary.catalog_entries, 2);
    assert_eq!(summary.catalog_agrees, Some(true));
    assert_eq!(summary.skipped_streams, 0);

    // Stream "1" holds an 8192-byte entry whose payload starts after the
    // 0x1C-byte headers. It lives at sector 5 of the fixture
    let raw = std::fs::read(&path).unwrap();
    let stream_offset = 512 + 5 * 512;
    let expected = &raw[stream_offset + 0x1c..stream_offset + 8192];

    let first = &sink.thumbnails[0];
    assert_eq!(first.stream_id, Some(1));
    assert_eq!(first.original_name, Some(String::from("photo.jpg")));
    assert_eq!(first.mtime, Some(1559390400));
    assert_eq!(first.mime, Some(String::from("image/jpeg")));
    assert_eq!(first.width, Some(96));
    assert_eq!(first.data, expected);

    let second = &sink.thumbnails[1];
    assert_eq!(second.stream_id, Some(2));
    assert_eq!(second.original_name, Some(String::from("beach.jpg")));
    assert_eq!(second.width, Some(64));
    assert!(second.data.starts_with(&[0xff, 0xd8]));
    assert!(second.data.ends_with(&[0xff, 0xd9]));
}

#[test]
fn test_type1_reconstruction() {
    let path = test_location("tests/test_data/windows/thumbsdb/type1.db");
    let mut sink = MemorySink::new();
    let summary =
        extract_file(&path, &mut sink, None, &options(), &CancelToken::new()).unwrap();

    assert_eq!(summary.emitted, 1);
    let thumb = &sink.thumbnails[0];
    assert_eq!(thumb.stream_id, Some(2));
    assert_eq!(thumb.original_name, Some(String::from("vacation.jpg")));
    assert_eq!(thumb.width, Some(96));
    assert_eq!(thumb.height, Some(96));

    // Reconstructed output is a four-component CMYK JPEG: SOI..EOI framing,
    // two quantization tables, four Huffman tables, exactly one SOF0
    let image = &thumb.data;
    assert!(image.starts_with(&[0xff, 0xd8]));
    assert!(image.ends_with(&[0xff, 0xd9]));

    let mut dqt = 0;
    let mut dht = 0;
    let mut sof = 0;
    let mut offset = 2;
    loop {
        assert_eq!(image[offset], 0xff);
        let marker = image[offset + 1];
        let length = u16::from_be_bytes([image[offset + 2], image[offset + 3]]) as usize;
        match marker {
            0xdb => dqt += 1,
            0xc4 => dht += 1,
            0xc0 => {
                sof += 1;
                // component count sits after precision and dimensions
                assert_eq!(image[offset + 9], 4);
            }
            0xda => break,
            _ => {}
        }
        offset += 2 + length;
    }
    assert_eq!(dqt, 2);
    assert_eq!(dht, 4);
    assert_eq!(sof, 1);
}

#[test]
fn test_extraction_is_deterministic() {
    let path = test_location("tests/test_data/windows/thumbsdb/type2.db");

    let mut first = MemorySink::new();
    extract_file(&path, &mut first, None, &options(), &CancelToken::new()).unwrap();
    let mut second = MemorySink::new();
    extract_file(&path, &mut second, None, &options(), &CancelToken::new()).unwrap();

    assert_eq!(first.thumbnails, second.thumbnails);
}

#[test]
fn test_cancelled_before_start() {
    let path = test_location("tests/test_data/windows/thumbsdb/type2.db");
    let cancel = CancelToken::new();
    cancel.cancel();

    let mut sink = MemorySink::new();
    let result = extract_file(&path, &mut sink, None, &options(), &cancel);
    assert_eq!(result.unwrap_err(), ExtractError::Cancelled);
    assert!(sink.thumbnails.is_empty());
}
