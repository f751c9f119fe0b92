use std::io::Cursor;
use tempfile::{tempdir, NamedTempFile};
use zipstream::{
    CompressionMethod, DosDateTime, ReadRecord, RecordKind, ZipStreamError, ZipStreamReader,
    ZipStreamWriter,
};

fn build(entries: &[(&str, &[u8], CompressionMethod)]) -> Vec<u8> {
    let mut writer = ZipStreamWriter::from_writer(Vec::new());
    for (name, content, method) in entries {
        writer
            .add_content_with_method(name, content, *method)
            .unwrap();
    }
    writer.finish().unwrap()
}

fn u16_at(data: &[u8], pos: usize) -> usize {
    u16::from_le_bytes([data[pos], data[pos + 1]]) as usize
}

fn u32_at(data: &[u8], pos: usize) -> usize {
    u32::from_le_bytes([data[pos], data[pos + 1], data[pos + 2], data[pos + 3]]) as usize
}

/// Walks an archive by hand; returns (local header offsets, directory
/// offsets, offsets stored in the directory, end record offset)
fn scan(data: &[u8]) -> (Vec<usize>, Vec<usize>, Vec<usize>, usize) {
    let (mut locals, mut dirs, mut stored) = (Vec::new(), Vec::new(), Vec::new());
    let mut pos = 0;
    loop {
        match u32_at(data, pos) {
            0x04034b50 => {
                locals.push(pos);
                pos += 30
                    + u16_at(data, pos + 26)
                    + u16_at(data, pos + 28)
                    + u32_at(data, pos + 18);
            }
            0x02014b50 => {
                dirs.push(pos);
                stored.push(u32_at(data, pos + 42));
                pos += 46
                    + u16_at(data, pos + 28)
                    + u16_at(data, pos + 30)
                    + u16_at(data, pos + 32);
            }
            0x06054b50 => return (locals, dirs, stored, pos),
            other => panic!("unexpected signature 0x{:08x} at {}", other, pos),
        }
    }
}

#[test]
fn two_deflated_files_read_back_in_order() {
    let a: &[u8] = b"12345678901234567890\r\n";
    let b: &[u8] = b"abcdefghijklmnopqrstuvwxyz";
    let zip = build(&[
        ("a.txt", a, CompressionMethod::Deflate),
        ("b.txt", b, CompressionMethod::Deflate),
    ]);

    let mut reader = ZipStreamReader::from_reader(Cursor::new(zip));
    let records: Vec<ReadRecord> = reader.by_ref().collect::<Result<_, _>>().unwrap();
    let kinds: Vec<RecordKind> = records.iter().map(|r| r.kind()).collect();
    assert_eq!(
        kinds,
        vec![
            RecordKind::LocalFile,
            RecordKind::LocalFile,
            RecordKind::CentralDirectory,
            RecordKind::CentralDirectory,
        ]
    );

    assert_eq!(records[0].filename(), b"a.txt");
    assert_eq!(records[0].content().unwrap(), a);
    assert_eq!(records[0].content_size(), Some(22));
    assert_eq!(records[0].crc32(), Some(0x5643_3e30));
    assert_eq!(records[0].compression_method(), Some(8));
    assert_eq!(records[1].filename(), b"b.txt");
    assert_eq!(records[1].content().unwrap(), b);
    assert_eq!(records[1].crc32(), Some(0x4c27_50bd));
    assert_eq!(records[2].filename(), b"a.txt");
    assert_eq!(records[3].filename(), b"b.txt");

    let end = reader.end_of_archive().expect("end record");
    assert_eq!(end.header.entries_total, 2);
    assert_eq!(end.header.entries_this_disk, 2);
    assert!(reader.next_record().unwrap().is_none());
}

#[test]
fn mixed_methods_round_trip() {
    let big: Vec<u8> = (0..200_000u32).map(|i| (i % 251) as u8).collect();
    let entries: Vec<(&str, &[u8], CompressionMethod)> = vec![
        ("stored.bin", &b"raw bytes \x00\x01\x02"[..], CompressionMethod::Stored),
        ("deflated.txt", &b"text text text text"[..], CompressionMethod::Deflate),
        ("empty-stored", &b""[..], CompressionMethod::Stored),
        ("empty-deflated", &b""[..], CompressionMethod::Deflate),
        ("dir/big.bin", &big[..], CompressionMethod::Deflate),
    ];
    let zip = build(&entries);

    let mut reader = ZipStreamReader::from_reader(&zip[..]);
    for (name, content, method) in &entries {
        let record = reader.next_file().unwrap().expect("file record");
        assert_eq!(record.filename_lossy(), *name);
        assert_eq!(record.content().unwrap(), *content);
        assert_eq!(record.content_size(), Some(content.len() as u32));
        assert_eq!(record.compression_method(), Some(method.to_zip_method()));
    }
    assert!(reader.next_file().unwrap().is_none());
    assert_eq!(reader.records_read(), 10);
}

#[test]
fn directory_offsets_point_at_local_headers() {
    let zip = build(&[
        ("one", &b"first entry"[..], CompressionMethod::Deflate),
        ("two/two", &b"second"[..], CompressionMethod::Stored),
        ("three", &[7u8; 5000][..], CompressionMethod::Deflate),
    ]);

    let (locals, dirs, stored, end_pos) = scan(&zip);
    assert_eq!(locals.len(), 3);
    assert_eq!(stored, locals);
    assert_eq!(locals[0], 0);

    // the directory is contiguous and ends where the end record starts
    assert_eq!(u16_at(&zip, end_pos + 8), 3);
    assert_eq!(u16_at(&zip, end_pos + 10), 3);
    let dir_size = u32_at(&zip, end_pos + 12);
    let dir_offset = u32_at(&zip, end_pos + 16);
    assert_eq!(dir_offset, dirs[0]);
    assert_eq!(dir_offset + dir_size, end_pos);
    assert_eq!(end_pos + 22, zip.len());

    // the decoder agrees with the hand walk
    let reader = ZipStreamReader::from_reader(&zip[..]);
    let from_decoder: Vec<u32> = reader
        .filter_map(|r| r.unwrap().local_header_offset())
        .collect();
    assert_eq!(
        from_decoder,
        locals.iter().map(|&o| o as u32).collect::<Vec<_>>()
    );
}

#[test]
fn empty_archive_is_only_an_end_record() {
    let zip = ZipStreamWriter::from_writer(Vec::new()).finish().unwrap();
    assert_eq!(zip.len(), 22);
    assert_eq!(&zip[..4], b"PK\x05\x06");

    let mut reader = ZipStreamReader::from_reader(&zip[..]);
    assert!(reader.next_record().unwrap().is_none());
    let end = reader.end_of_archive().unwrap();
    assert_eq!(end.header.entries_total, 0);
    assert_eq!(end.header.dir_size, 0);
    assert_eq!(end.header.dir_offset, 0);
}

#[test]
fn archive_comment_is_written_to_end_record() {
    let mut writer = ZipStreamWriter::from_writer(Vec::new());
    writer.add_content("a", b"a").unwrap();
    writer.set_comment("built by zipstream");
    let zip = writer.finish().unwrap();

    let mut reader = ZipStreamReader::from_reader(&zip[..]);
    while reader.next_record().unwrap().is_some() {}
    assert_eq!(
        reader.end_of_archive().unwrap().comment,
        b"built by zipstream"
    );
}

#[test]
fn entry_metadata_set_through_returned_record() {
    let stamp = DosDateTime::from_components(2015, 8, 6, 11, 57, 35).unwrap();
    let mut writer = ZipStreamWriter::from_writer(Vec::new());
    writer
        .add_content("notes.txt", b"some notes")
        .unwrap()
        .set_timestamp(stamp)
        .set_comment("entry comment")
        .set_extra(vec![0xca, 0xfe, 0x00, 0x00]);
    let zip = writer.finish().unwrap();

    let records: Vec<ReadRecord> = ZipStreamReader::from_reader(&zip[..])
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(records.len(), 2);
    for record in &records {
        let t = record.timestamp().unwrap();
        assert_eq!((t.year(), t.month(), t.day()), (2015, 8, 6));
        assert_eq!((t.hour(), t.minute(), t.second()), (11, 57, 34));
        assert_eq!(record.extra(), &[0xca, 0xfe, 0x00, 0x00]);
    }
    assert!(records[0].comment().is_empty());
    assert_eq!(records[1].comment(), b"entry comment");
}

#[test]
fn default_method_comes_from_writer() {
    let mut writer =
        ZipStreamWriter::from_writer_with_method(Vec::new(), CompressionMethod::Stored, 9);
    writer.add_content("plain", b"plain text").unwrap();
    assert_eq!(writer.len(), 1);
    let zip = writer.finish().unwrap();

    let record = ZipStreamReader::from_reader(&zip[..])
        .next_file()
        .unwrap()
        .unwrap();
    assert_eq!(record.compression_method(), Some(0));
    assert_eq!(record.compressed_size(), Some(10));
}

#[test]
fn flipped_payload_byte_is_a_crc_error() {
    let mut zip = build(&[("a.txt", &b"hello world"[..], CompressionMethod::Stored)]);
    zip[30 + 5 + 3] ^= 0x20;

    let record = ZipStreamReader::from_reader(&zip[..])
        .next_file()
        .unwrap()
        .unwrap();
    match record.content() {
        Err(ZipStreamError::CrcMismatch { expected, actual }) => {
            assert_eq!(expected, 0x0d4a_1185);
            assert_ne!(actual, expected);
        }
        other => panic!("expected CRC error, got {:?}", other),
    }
}

#[test]
fn truncated_archive_aborts_reading() {
    let zip = build(&[("a.txt", &b"hello world"[..], CompressionMethod::Deflate)]);
    let cut = &zip[..zip.len() - 10];

    let results: Vec<_> = ZipStreamReader::from_reader(cut).collect();
    assert_eq!(results.len(), 3);
    assert!(results[0].is_ok());
    assert!(results[1].is_ok());
    assert!(matches!(results[2], Err(ZipStreamError::InvalidFormat(_))));
}

#[test]
fn stream_without_end_record_ends_cleanly() {
    let zip = build(&[("a.txt", &b"hello"[..], CompressionMethod::Stored)]);
    let (_, dirs, _, _) = scan(&zip);
    let locals_only = &zip[..dirs[0]];

    let mut reader = ZipStreamReader::from_reader(locals_only);
    assert!(reader.next_record().unwrap().unwrap().is_file());
    assert!(reader.next_record().unwrap().is_none());
    assert!(reader.end_of_archive().is_none());
}

#[test]
fn add_from_reader_honours_length_cap() {
    let source = b"0123456789abcdef".repeat(1000);

    let mut writer = ZipStreamWriter::from_writer(Vec::new());
    writer
        .add_from_reader("capped", &source[..], Some(100))
        .unwrap();
    writer.add_from_reader("whole", &source[..], None).unwrap();
    writer
        .add_from_reader("short-source", &b"abc"[..], Some(100))
        .unwrap();
    let zip = writer.finish().unwrap();

    let mut reader = ZipStreamReader::from_reader(&zip[..]);
    let capped = reader.next_file().unwrap().unwrap();
    assert_eq!(capped.content().unwrap(), &source[..100]);
    let whole = reader.next_file().unwrap().unwrap();
    assert_eq!(whole.content().unwrap(), source);
    let short = reader.next_file().unwrap().unwrap();
    assert_eq!(short.content().unwrap(), b"abc");
}

#[test]
fn add_file_reads_a_byte_range() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("source.txt");
    std::fs::write(&path, b"header:payload:trailer").unwrap();

    let mut writer = ZipStreamWriter::from_writer(Vec::new());
    writer
        .add_file(&path, Some("range.txt"), Some(7), Some(7))
        .unwrap();
    writer.add_file(&path, Some("all.txt"), None, None).unwrap();
    writer.add_file(&path, None, None, None).unwrap();
    let zip = writer.finish().unwrap();

    let mut reader = ZipStreamReader::from_reader(&zip[..]);
    let range = reader.next_file().unwrap().unwrap();
    assert_eq!(range.filename(), b"range.txt");
    assert_eq!(range.content().unwrap(), b"payload");
    let all = reader.next_file().unwrap().unwrap();
    assert_eq!(all.content().unwrap(), b"header:payload:trailer");
    let unnamed = reader.next_file().unwrap().unwrap();
    assert_eq!(unnamed.filename_lossy(), path.to_string_lossy());
}

#[test]
fn add_file_reports_missing_source() {
    let mut writer = ZipStreamWriter::from_writer(Vec::new());
    let err = writer
        .add_file("/definitely/not/here.txt", None, None, None)
        .unwrap_err();
    assert!(matches!(err, ZipStreamError::Io(_)));
    assert!(writer.is_empty());
}

#[test]
fn file_backed_writer_and_reader() {
    let temp = NamedTempFile::new().unwrap();
    {
        let mut writer = ZipStreamWriter::with_compression(temp.path(), 9).unwrap();
        writer.add_content("disk.txt", b"written to disk").unwrap();
        writer.finish().unwrap();
    }

    let mut reader = ZipStreamReader::open(temp.path()).unwrap();
    let record = reader.next_file().unwrap().unwrap();
    assert_eq!(record.content().unwrap(), b"written to disk");
    assert!(reader.next_file().unwrap().is_none());
    assert_eq!(reader.end_of_archive().unwrap().header.entries_total, 1);
}

#[test]
fn entry_flushed_before_finish_is_rejected() {
    let mut output = Vec::new();
    let mut side = Vec::new();
    let mut writer = ZipStreamWriter::from_writer(&mut output);
    writer.add_content("a.txt", b"on time").unwrap();
    writer
        .add_content_with_method("b.txt", b"early", CompressionMethod::Stored)
        .unwrap()
        .flush(&mut side)
        .unwrap();
    assert!(!side.is_empty());

    let err = writer.finish().unwrap_err();
    assert!(matches!(err, ZipStreamError::InvalidState(_)));
    assert!(output.is_empty());
}

#[test]
fn too_many_entries_fail_before_any_output() {
    let mut output = Vec::new();
    let mut writer =
        ZipStreamWriter::from_writer_with_method(&mut output, CompressionMethod::Stored, 0);
    for i in 0..=u16::MAX as u32 {
        writer.add_content(&i.to_string(), b"").unwrap();
    }
    assert_eq!(writer.len(), 65536);

    let err = writer.finish().unwrap_err();
    assert!(matches!(err, ZipStreamError::InvalidFormat(_)));
    assert!(output.is_empty());
}
