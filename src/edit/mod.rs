pub mod undo;

/// A reversible description of one mutation.
///
/// Every non-batch variant carries both its before- and after-image, so it
/// can be inverted without re-reading the file or consulting the current
/// buffer state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Insert { position: usize, byte: u8 },
    Delete { position: usize, byte: u8 },
    Replace { position: usize, old: u8, new: u8 },
    ReplaceRange {
        position: usize,
        old_bytes: Vec<u8>,
        new_bytes: Vec<u8>,
    },
    ReplaceLine {
        line: usize,
        old_text: String,
        new_text: String,
    },
    InsertLine { line: usize, text: String },
    DeleteLine { line: usize, text: String },
    /// Applied in order, reverted in reverse order
    Batch(Vec<Action>),
}

/// The storage an [`Action`] is replayed against.
///
/// Implementations clamp out-of-range indices instead of panicking.
pub trait EditTarget {
    /// Remove `remove` bytes at `position` and insert `insert` in their place
    fn splice_bytes(&mut self, position: usize, remove: usize, insert: &[u8]);
    fn set_line(&mut self, index: usize, text: &str);
    fn insert_line(&mut self, index: usize, text: &str);
    fn remove_line(&mut self, index: usize);
}

impl Action {
    /// Replay the mutation forwards (initial application and redo)
    pub fn apply<T: EditTarget + ?Sized>(&self, target: &mut T) {
        match self {
            Action::Insert { position, byte } => target.splice_bytes(*position, 0, &[*byte]),
            Action::Delete { position, .. } => target.splice_bytes(*position, 1, &[]),
            Action::Replace { position, new, .. } => target.splice_bytes(*position, 1, &[*new]),
            Action::ReplaceRange {
                position,
                old_bytes,
                new_bytes,
            } => target.splice_bytes(*position, old_bytes.len(), new_bytes),
            Action::ReplaceLine { line, new_text, .. } => target.set_line(*line, new_text),
            Action::InsertLine { line, text } => target.insert_line(*line, text),
            Action::DeleteLine { line, .. } => target.remove_line(*line),
            Action::Batch(actions) => {
                for action in actions {
                    action.apply(target);
                }
            }
        }
    }

    /// Replay the mutation backwards (undo)
    pub fn revert<T: EditTarget + ?Sized>(&self, target: &mut T) {
        match self {
            Action::Insert { position, .. } => target.splice_bytes(*position, 1, &[]),
            Action::Delete { position, byte } => target.splice_bytes(*position, 0, &[*byte]),
            Action::Replace { position, old, .. } => target.splice_bytes(*position, 1, &[*old]),
            Action::ReplaceRange {
                position,
                old_bytes,
                new_bytes,
            } => target.splice_bytes(*position, new_bytes.len(), old_bytes),
            Action::ReplaceLine { line, old_text, .. } => target.set_line(*line, old_text),
            Action::InsertLine { line, .. } => target.remove_line(*line),
            Action::DeleteLine { line, text } => target.insert_line(*line, text),
            Action::Batch(actions) => {
                for action in actions.iter().rev() {
                    action.revert(target);
                }
            }
        }
    }

    /// Short name for status messages and logs
    pub fn kind(&self) -> &'static str {
        match self {
            Action::Insert { .. } => "insert",
            Action::Delete { .. } => "delete",
            Action::Replace { .. } => "replace",
            Action::ReplaceRange { .. } => "replace range",
            Action::ReplaceLine { .. } => "replace line",
            Action::InsertLine { .. } => "insert line",
            Action::DeleteLine { .. } => "delete line",
            Action::Batch(_) => "batch",
        }
    }

    /// Wrap several actions as one undo unit; a single action stays unwrapped.
    pub fn group(mut actions: Vec<Action>) -> Option<Action> {
        match actions.len() {
            0 => None,
            1 => actions.pop(),
            _ => Some(Action::Batch(actions)),
        }
    }
}
