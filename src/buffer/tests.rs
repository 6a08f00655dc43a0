use std::fs;

use tempfile::TempDir;

use super::*;
use crate::config::EditorConfig;
use crate::error::EditError;
use crate::syntax::{Highlighter, NoLanguage};

/// Thresholds small enough that a few hundred bytes is a "large" file
fn chunked_config() -> EditorConfig {
    EditorConfig {
        large_file_threshold: 64,
        chunk_size: 16,
        cache_capacity: 2,
        ..EditorConfig::default()
    }
}

fn binary_data(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 256) as u8).collect()
}

#[test]
fn test_insert_delete_undo_restores_clean_state() {
    let mut buffer = Buffer::from_bytes(vec![1, 2, 3]);

    assert!(buffer.insert_byte(1, 0xFF).unwrap());
    assert_eq!(buffer.raw_bytes().as_ref(), &[1, 0xFF, 2, 3]);
    assert!(buffer.delete_byte(0).unwrap());
    assert_eq!(buffer.raw_bytes().as_ref(), &[0xFF, 2, 3]);
    assert!(buffer.is_modified());

    assert!(buffer.undo());
    assert!(buffer.undo());
    assert_eq!(buffer.raw_bytes().as_ref(), &[1, 2, 3]);
    assert!(!buffer.is_modified());
    assert!(!buffer.undo());

    assert!(buffer.redo());
    assert_eq!(buffer.raw_bytes().as_ref(), &[1, 0xFF, 2, 3]);
    assert!(buffer.is_modified());
}

#[test]
fn test_byte_values_are_validated() {
    let mut buffer = Buffer::from_bytes(vec![0]);
    assert!(matches!(buffer.insert_byte(0, 256), Err(EditError::InvalidByte(256))));
    assert!(matches!(buffer.replace_byte(0, 1000), Err(EditError::InvalidByte(1000))));
    assert_eq!(buffer.raw_bytes().as_ref(), &[0]);
    assert!(!buffer.can_undo());
}

#[test]
fn test_out_of_range_edits_are_ignored() {
    let mut buffer = Buffer::from_bytes(vec![1, 2]);
    assert!(!buffer.delete_byte(2).unwrap());
    assert!(!buffer.replace_byte(5, 0).unwrap());
    // Same value: nothing to record
    assert!(!buffer.replace_byte(0, 1).unwrap());
    assert!(!buffer.can_undo());

    // Insert past the end appends
    assert!(buffer.insert_byte(99, 3).unwrap());
    assert_eq!(buffer.raw_bytes().as_ref(), &[1, 2, 3]);
}

#[test]
fn test_new_edit_clears_redo() {
    let mut buffer = Buffer::from_bytes(vec![0; 4]);
    buffer.replace_byte(0, 1).unwrap();
    buffer.undo();
    assert!(buffer.can_redo());

    buffer.replace_byte(1, 2).unwrap();
    assert!(!buffer.can_redo());
}

#[test]
fn test_replace_range_cursor_rules() {
    let mut buffer = Buffer::from_bytes(vec![0xAA, 0x01, 0xAA]);
    assert!(buffer.replace_range(1, 1, &[0x10, 0x20]).unwrap());
    assert_eq!(buffer.raw_bytes().as_ref(), &[0xAA, 0x10, 0x20, 0xAA]);
    assert_eq!(buffer.cursor_offset(), 3);

    buffer.undo();
    assert_eq!(buffer.raw_bytes().as_ref(), &[0xAA, 0x01, 0xAA]);
    assert_eq!(buffer.cursor_offset(), 1);

    buffer.redo();
    assert_eq!(buffer.cursor_offset(), 3);
}

#[test]
fn test_binary_edits_rejected_in_text_mode() {
    let mut buffer = Buffer::from_text("hello");
    assert!(matches!(
        buffer.insert_byte(0, 0x41),
        Err(EditError::WrongMode { expected: "binary" })
    ));
    assert!(!Buffer::from_bytes(vec![]).insert_text(0, 0, "x"));
}

#[test]
fn test_text_insert_splits_lines() {
    let mut buffer = Buffer::from_text("one\ntwo");
    assert!(buffer.insert_text(0, 1, "\n"));
    assert_eq!(buffer.lines(), &["o", "ne", "two"]);
    assert_eq!((buffer.cursor().line, buffer.cursor().col), (1, 0));

    assert!(buffer.undo());
    assert_eq!(buffer.lines(), &["one", "two"]);
    assert!(!buffer.is_modified());
}

#[test]
fn test_text_delete_and_line_ops() {
    let mut buffer = Buffer::from_text("añb\nsecond\nthird");

    assert!(buffer.delete_text(0, 1, 2));
    assert_eq!(buffer.get_code_line(0), "ab");

    assert!(buffer.delete_line(1));
    assert_eq!(buffer.lines(), &["ab", "third"]);

    assert!(buffer.insert_line(1, "middle"));
    assert_eq!(buffer.lines(), &["ab", "middle", "third"]);

    assert!(buffer.join_lines(0));
    assert_eq!(buffer.lines(), &["abmiddle", "third"]);

    while buffer.undo() {}
    assert_eq!(buffer.lines(), &["añb", "second", "third"]);
    assert!(!buffer.delete_line(10));
}

#[test]
fn test_text_replace_range_spans_lines() {
    let mut buffer = Buffer::from_text("alpha\nbeta\ngamma");
    // "ha\nbeta\nga" -> "-"
    assert!(buffer.replace_range(3, 10, b"-").unwrap());
    assert_eq!(buffer.lines(), &["alp-mma"]);
    assert_eq!(buffer.size(), 7);

    buffer.undo();
    assert_eq!(buffer.lines(), &["alpha", "beta", "gamma"]);
}

#[test]
fn test_replace_text_range_and_clamping() {
    let mut buffer = Buffer::from_text("ab\ncd");
    assert!(buffer.replace_text_range(1, 4, b"X"));
    assert_eq!(buffer.lines(), &["aXd"]);
    assert_eq!((buffer.cursor().line, buffer.cursor().col), (0, 2));

    // Out of range line and column land at the end of the text
    assert!(buffer.insert_text(9, 99, "!"));
    assert_eq!(buffer.lines(), &["aXd!"]);
    assert!(!buffer.replace_text_range(50, 60, b""));

    while buffer.undo() {}
    assert_eq!(buffer.lines(), &["ab", "cd"]);
}

#[test]
fn test_text_replace_never_splits_characters() {
    let mut buffer = Buffer::from_text("aé\nñ");
    // Byte 2 is inside "é", byte 5 inside "ñ"
    assert!(!buffer.replace_text_range(0, 2, b"X"));
    assert!(!buffer.replace_range(5, 1, b"-").unwrap());
    assert!(!buffer.replace_text_range(0, 1, &[0xFF]));
    assert_eq!(buffer.lines(), &["aé", "ñ"]);
    assert!(!buffer.can_undo());

    assert!(buffer.replace_text_range(1, 4, "ü".as_bytes()));
    assert_eq!(buffer.lines(), &["aüñ"]);
}

#[test]
fn test_selection_and_line_col_cursor() {
    let mut buffer = Buffer::from_text("first\nsecond");
    assert_eq!(buffer.selection(), None);
    buffer.set_selection(9, 2);
    assert_eq!(buffer.selection(), Some((2, 9)));
    buffer.clear_selection();
    assert_eq!(buffer.selection(), None);

    buffer.set_cursor_line_col(7, 40);
    assert_eq!((buffer.cursor_line(), buffer.cursor_column()), (1, 6));
    assert_eq!(buffer.cursor_offset(), 12);

    let mut binary = Buffer::from_bytes(vec![0; 40]);
    binary.set_cursor_offset(35);
    assert_eq!((binary.cursor_line(), binary.cursor_column()), (2, 3));
}

#[test]
fn test_batch_is_one_undo_unit() {
    let mut buffer = Buffer::from_bytes(vec![0; 4]);
    buffer.begin_batch();
    for i in 0..4 {
        buffer.replace_byte(i, 0xEE).unwrap();
    }
    assert!(buffer.end_batch());
    assert_eq!(buffer.undo_count(), 1);

    buffer.undo();
    assert_eq!(buffer.raw_bytes().as_ref(), &[0; 4]);
}

#[test]
fn test_hex_rows() {
    let mut buffer = Buffer::from_bytes(b"Hello, hex world! \x00\x01".to_vec());
    assert_eq!(buffer.line_count(), 2);

    let first = buffer.get_line(0);
    assert_eq!(first.offset, 0);
    assert_eq!(first.bytes.len(), 16);
    assert_eq!(first.ascii, "Hello, hex world");

    let second = buffer.get_line(1);
    assert_eq!(second.offset, 16);
    assert_eq!(second.bytes, b"! \x00\x01");
    assert_eq!(second.ascii, "! ..");

    assert!(buffer.get_line(5).bytes.is_empty());
}

#[test]
fn test_bytes_per_line_from_width() {
    let mut buffer = Buffer::new();
    buffer.set_bytes_per_line(80);
    assert_eq!(buffer.bytes_per_line(), 16);
    buffer.set_bytes_per_line(120);
    assert_eq!(buffer.bytes_per_line(), 32);
    buffer.set_bytes_per_line(10);
    assert_eq!(buffer.bytes_per_line(), 8);
}

#[test]
fn test_cursor_motion_clamps() {
    let mut buffer = Buffer::from_bytes(vec![0; 20]);
    buffer.move_cursor(CursorMove::Left);
    assert_eq!(buffer.cursor_offset(), 0);
    buffer.move_cursor(CursorMove::Down);
    assert_eq!(buffer.cursor_offset(), 16);
    buffer.move_cursor(CursorMove::PageDown(10));
    assert_eq!(buffer.cursor_offset(), 20);

    let mut text = Buffer::from_text("ab\nc");
    text.move_cursor(CursorMove::LineEnd);
    text.move_cursor(CursorMove::Right);
    assert_eq!((text.cursor().line, text.cursor().col), (1, 0));
    text.move_cursor(CursorMove::Left);
    assert_eq!((text.cursor().line, text.cursor().col), (0, 2));
    text.move_cursor(CursorMove::PageDown(50));
    assert_eq!(text.cursor().line, 1);
    assert_eq!(text.cursor().col, 1);
}

#[test]
fn test_open_text_file_and_save() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("main.rs");
    fs::write(&path, "fn main() {\n}\n").unwrap();

    let mut buffer = Buffer::open(&path, EditorConfig::default(), &Highlighter::new()).unwrap();
    assert_eq!(buffer.mode(), ViewMode::Text);
    assert_eq!(buffer.language(), Some("Rust"));
    assert_eq!(buffer.lines(), &["fn main() {", "}"]);

    buffer.insert_text(1, 0, "    ");
    buffer.save().unwrap();
    assert!(!buffer.is_modified());
    assert_eq!(fs::read_to_string(&path).unwrap(), "fn main() {\n    }");
}

#[test]
fn test_open_binary_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("blob.bin");
    fs::write(&path, binary_data(40)).unwrap();

    let mut buffer = Buffer::open(&path, EditorConfig::default(), &Highlighter::new()).unwrap();
    assert_eq!(buffer.mode(), ViewMode::Binary);
    assert_eq!(buffer.language(), None);
    assert!(!buffer.is_chunked());
    assert_eq!(buffer.size(), 40);

    buffer.replace_byte(0, 0x7F).unwrap();
    let copy = dir.path().join("copy.bin");
    buffer.save_as(&copy).unwrap();
    assert_eq!(buffer.path(), Some(copy.as_path()));
    assert_eq!(fs::read(&copy).unwrap()[0], 0x7F);
}

#[test]
fn test_printable_file_without_language_is_binary() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("notes");
    fs::write(&path, "just some words").unwrap();

    let buffer = Buffer::open(&path, EditorConfig::default(), &NoLanguage).unwrap();
    assert_eq!(buffer.mode(), ViewMode::Binary);
}

#[test]
fn test_open_missing_file() {
    let dir = TempDir::new().unwrap();
    let result = Buffer::open(dir.path().join("absent"), EditorConfig::default(), &NoLanguage);
    assert!(matches!(result, Err(EditError::Open { .. })));
}

#[test]
fn test_new_file_is_empty_text() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("fresh.py");
    let mut buffer = Buffer::new_file(&path, EditorConfig::default(), &Highlighter::new());
    assert_eq!(buffer.lines(), &[""]);
    assert_eq!(buffer.language(), Some("Python"));

    buffer.insert_text(0, 0, "print(1)");
    buffer.save().unwrap();
    assert_eq!(fs::read_to_string(&path).unwrap(), "print(1)");
}

#[test]
fn test_save_without_path() {
    let mut buffer = Buffer::from_bytes(vec![1]);
    assert!(matches!(buffer.save(), Err(EditError::NoPath)));
}

#[test]
fn test_failed_save_keeps_buffer_state() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("data.bin");
    fs::write(&path, binary_data(4)).unwrap();

    let mut buffer = Buffer::open(&path, EditorConfig::default(), &NoLanguage).unwrap();
    buffer.replace_byte(1, 0xAB).unwrap();

    let target = dir.path().join("missing").join("out.bin");
    let err = buffer.save_as(&target).unwrap_err();
    match &err {
        EditError::Save { path: failed, source } => {
            assert_eq!(failed, &target);
            assert_eq!(source.kind(), std::io::ErrorKind::NotFound);
        }
        other => panic!("expected a save error, got {:?}", other),
    }
    assert!(std::error::Error::source(&err).is_some());

    assert!(buffer.is_modified());
    assert!(buffer.can_undo());
    assert_eq!(buffer.path(), Some(path.as_path()));
    assert_eq!(fs::read(&path).unwrap(), binary_data(4));
}

#[test]
fn test_large_file_is_chunked_and_read_only() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("large.bin");
    let data = binary_data(200);
    fs::write(&path, &data).unwrap();

    let mut buffer = Buffer::open(&path, chunked_config(), &NoLanguage).unwrap();
    assert!(buffer.is_chunked());
    assert_eq!(buffer.size(), 200);

    assert_eq!(buffer.get_line(3).bytes, &data[48..64]);
    assert_eq!(buffer.read_range(10, 20), &data[10..30]);
    assert_eq!(buffer.read_byte(199), Some(199));
    assert_eq!(buffer.read_byte(200), None);
    assert!(buffer.chunk_cache().unwrap().len() <= 2);

    assert!(matches!(buffer.replace_byte(0, 1), Err(EditError::ReadOnly)));
    assert!(matches!(buffer.insert_byte(0, 1), Err(EditError::ReadOnly)));
    assert!(matches!(buffer.delete_byte(0), Err(EditError::ReadOnly)));
    assert!(!buffer.is_modified());
}

#[test]
fn test_chunked_save_copies_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("large.bin");
    let data = binary_data(300);
    fs::write(&path, &data).unwrap();

    let mut buffer = Buffer::open(&path, chunked_config(), &NoLanguage).unwrap();
    let copy = dir.path().join("copy.bin");
    buffer.save_as(&copy).unwrap();
    assert_eq!(fs::read(&copy).unwrap(), data);

    // Saving onto the mapped file itself leaves it untouched
    buffer.save_as(&path).unwrap();
    assert_eq!(fs::read(&path).unwrap(), data);
    assert!(!buffer.is_modified());
}

#[test]
fn test_materialize_makes_chunked_buffer_editable() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("large.bin");
    fs::write(&path, binary_data(100)).unwrap();

    let mut buffer = Buffer::open(&path, chunked_config(), &NoLanguage).unwrap();
    buffer.materialize().unwrap();
    assert!(!buffer.is_chunked());
    assert!(buffer.chunk_cache().is_none());
    assert_eq!(buffer.size(), 100);

    assert!(buffer.replace_byte(0, 0xFF).unwrap());
    buffer.save().unwrap();
    assert_eq!(fs::read(&path).unwrap()[0], 0xFF);
}

#[test]
fn test_empty_file_is_never_chunked() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("empty");
    fs::write(&path, b"").unwrap();

    let config = EditorConfig {
        large_file_threshold: 0,
        ..EditorConfig::default()
    };
    let buffer = Buffer::open(&path, config, &NoLanguage).unwrap();
    assert!(!buffer.is_chunked());
    assert_eq!(buffer.size(), 0);
}

#[test]
fn test_reload_resets_state() {
    let dir = TempDir::new().unwrap();
    let first = dir.path().join("a.bin");
    let second = dir.path().join("b.bin");
    fs::write(&first, binary_data(32)).unwrap();
    fs::write(&second, binary_data(8)).unwrap();

    let mut buffer = Buffer::open(&first, EditorConfig::default(), &NoLanguage).unwrap();
    buffer.replace_byte(0, 0xAB).unwrap();
    buffer.set_cursor_offset(30);

    buffer.load_file(&second, &NoLanguage).unwrap();
    assert_eq!(buffer.size(), 8);
    assert_eq!(buffer.cursor_offset(), 0);
    assert!(!buffer.can_undo());
    assert!(!buffer.is_modified());
}

#[test]
fn test_failed_reload_keeps_previous_content() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("a.bin");
    fs::write(&path, binary_data(32)).unwrap();

    let mut buffer = Buffer::open(&path, EditorConfig::default(), &NoLanguage).unwrap();
    buffer.replace_byte(0, 0xAB).unwrap();

    let missing = dir.path().join("gone.bin");
    assert!(matches!(
        buffer.load_file(&missing, &NoLanguage),
        Err(EditError::Open { .. })
    ));
    assert_eq!(buffer.size(), 32);
    assert_eq!(buffer.read_byte(0), Some(0xAB));
    assert!(buffer.can_undo());
    assert_eq!(buffer.path(), Some(path.as_path()));
}
