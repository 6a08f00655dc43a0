pub mod buffer;
pub mod config;
pub mod edit;
pub mod error;
pub mod hex;
pub mod search;
pub mod syntax;
pub mod ui;

pub use buffer::{Buffer, Cursor, CursorMove, HexLine, ViewMode};
pub use config::EditorConfig;
pub use edit::Action;
pub use error::{EditError, Result};
pub use search::{Query, SearchEngine, SearchKind, SearchResult};
pub use syntax::{Highlighter, LanguageDetector};
