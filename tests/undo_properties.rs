use hexcode::Buffer;
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum ByteOp {
    Insert(usize, u8),
    Delete(usize),
    Replace(usize, u8),
}

fn arb_byte_op() -> impl Strategy<Value = ByteOp> {
    prop_oneof![
        (0usize..80, any::<u8>()).prop_map(|(pos, byte)| ByteOp::Insert(pos, byte)),
        (0usize..80).prop_map(ByteOp::Delete),
        (0usize..80, any::<u8>()).prop_map(|(pos, byte)| ByteOp::Replace(pos, byte)),
    ]
}

fn apply(buffer: &mut Buffer, op: &ByteOp) -> bool {
    let result = match *op {
        ByteOp::Insert(pos, byte) => buffer.insert_byte(pos, u32::from(byte)),
        ByteOp::Delete(pos) => buffer.delete_byte(pos),
        ByteOp::Replace(pos, byte) => buffer.replace_byte(pos, u32::from(byte)),
    };
    result.expect("resident binary buffer accepts byte edits")
}

#[derive(Debug, Clone)]
enum TextOp {
    Insert(usize, usize, String),
    Delete(usize, usize, usize),
    InsertLine(usize, String),
    DeleteLine(usize),
    Join(usize),
}

fn arb_text_op() -> impl Strategy<Value = TextOp> {
    prop_oneof![
        (0usize..8, 0usize..12, "[a-z\n]{1,6}")
            .prop_map(|(line, col, text)| TextOp::Insert(line, col, text)),
        (0usize..8, 0usize..12, 0usize..12).prop_map(|(line, a, b)| TextOp::Delete(line, a, b)),
        (0usize..8, "[a-z]{0,6}").prop_map(|(line, text)| TextOp::InsertLine(line, text)),
        (0usize..8).prop_map(TextOp::DeleteLine),
        (0usize..8).prop_map(TextOp::Join),
    ]
}

fn apply_text(buffer: &mut Buffer, op: &TextOp) -> bool {
    match op {
        TextOp::Insert(line, col, text) => buffer.insert_text(*line, *col, text),
        TextOp::Delete(line, a, b) => buffer.delete_text(*line, *a, *b),
        TextOp::InsertLine(line, text) => buffer.insert_line(*line, text),
        TextOp::DeleteLine(line) => buffer.delete_line(*line),
        TextOp::Join(line) => buffer.join_lines(*line),
    }
}

proptest! {
    /// Undoing a single byte edit restores both content and cursor
    #[test]
    fn undo_restores_bytes_and_cursor(
        initial in prop::collection::vec(any::<u8>(), 0..64),
        ops in prop::collection::vec((arb_byte_op(), 0usize..80), 1..30),
    ) {
        let mut buffer = Buffer::from_bytes(initial);

        for (op, cursor) in &ops {
            buffer.set_cursor_offset(*cursor);
            let bytes_before = buffer.raw_bytes().into_owned();
            let cursor_before = buffer.cursor_offset();

            if apply(&mut buffer, op) {
                prop_assert!(buffer.cursor_offset() <= buffer.size());
                prop_assert!(buffer.undo());
                prop_assert_eq!(buffer.raw_bytes().into_owned(), bytes_before);
                prop_assert_eq!(buffer.cursor_offset(), cursor_before);
                prop_assert!(buffer.redo());
            }
        }
    }

    /// redo(undo(x)) leaves the content exactly as x left it
    #[test]
    fn redo_after_undo_is_identity(
        initial in prop::collection::vec(any::<u8>(), 0..64),
        ops in prop::collection::vec(arb_byte_op(), 1..30),
    ) {
        let mut buffer = Buffer::from_bytes(initial);

        for op in &ops {
            if apply(&mut buffer, op) {
                let after = buffer.raw_bytes().into_owned();
                prop_assert!(buffer.undo());
                prop_assert!(buffer.redo());
                prop_assert_eq!(buffer.raw_bytes().into_owned(), after);
            }
        }
    }

    /// Unwinding the whole history returns to the original, unmodified state
    #[test]
    fn full_undo_restores_original(
        initial in prop::collection::vec(any::<u8>(), 0..64),
        ops in prop::collection::vec(arb_byte_op(), 1..40),
    ) {
        let mut buffer = Buffer::from_bytes(initial.clone());
        let mut applied = 0;
        for op in &ops {
            if apply(&mut buffer, op) {
                applied += 1;
            }
        }
        let edited = buffer.raw_bytes().into_owned();

        let mut undone = 0;
        while buffer.undo() {
            undone += 1;
        }
        prop_assert_eq!(undone, applied);
        prop_assert_eq!(buffer.raw_bytes().into_owned(), initial);
        prop_assert!(!buffer.is_modified());

        while buffer.redo() {}
        prop_assert_eq!(buffer.raw_bytes().into_owned(), edited);
    }

    /// Text edits are reversible too
    #[test]
    fn text_history_round_trips(
        initial in "[a-z\n]{0,40}",
        ops in prop::collection::vec(arb_text_op(), 1..25),
    ) {
        let mut buffer = Buffer::from_text(&initial);
        let original = buffer.lines().to_vec();

        for op in &ops {
            apply_text(&mut buffer, op);
        }
        let edited = buffer.lines().to_vec();

        while buffer.undo() {}
        prop_assert_eq!(buffer.lines(), original.as_slice());

        while buffer.redo() {}
        prop_assert_eq!(buffer.lines(), edited.as_slice());
    }
}

#[test]
fn test_insert_delete_into_empty_buffer() {
    let mut buffer = Buffer::from_bytes(Vec::new());
    assert!(buffer.insert_byte(0, 0x41).unwrap());
    assert!(buffer.delete_byte(0).unwrap());
    assert!(buffer.undo());
    assert!(buffer.undo());
    assert_eq!(buffer.size(), 0);
    assert!(!buffer.is_modified());
}

#[test]
fn test_history_is_bounded() {
    let mut buffer = Buffer::from_bytes(vec![0]);
    for i in 0..150u32 {
        buffer.replace_byte(0, (i % 2) + 1).unwrap();
    }
    assert_eq!(buffer.undo_count(), 100);
    while buffer.undo() {}
    // The oldest 50 edits were dropped, so the first write is never undone
    assert_ne!(buffer.raw_bytes().as_ref(), &[0]);
}
