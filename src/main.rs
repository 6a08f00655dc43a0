use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Style},
    text::Line,
    widgets::{Block, Borders, Paragraph},
    Terminal,
};
use std::fs::File;
use std::io::{stdout, Stdout};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use hexcode::buffer::lines;
use hexcode::ui::{render, Highlights, Viewport};
use hexcode::{
    Buffer, CursorMove, EditorConfig, Highlighter, Query, SearchEngine, SearchKind, ViewMode,
};

/// Terminal hex and code editor
#[derive(Parser, Debug)]
#[command(name = "hexcode")]
#[command(version, about, long_about = None)]
struct Args {
    /// Files to open; paths that do not exist open as empty text buffers
    #[arg(value_name = "FILES")]
    files: Vec<PathBuf>,

    /// JSON file with editor settings
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Write diagnostics to this file (filter with RUST_LOG)
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// Files larger than this many bytes are opened read-only in chunks
    #[arg(long, value_name = "BYTES")]
    large_file_threshold: Option<u64>,
}

/// An open buffer and the search state that belongs to it
struct Document {
    buffer: Buffer,
    search: SearchEngine,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PromptKind {
    Search,
    Replace,
    Goto,
}

struct Prompt {
    kind: PromptKind,
    input: String,
    search_kind: SearchKind,
    case_sensitive: bool,
}

impl Prompt {
    fn title(&self) -> String {
        match self.kind {
            PromptKind::Search => format!(
                " Find ({}{}) [Tab: kind, Ctrl+T: case]: ",
                self.search_kind,
                if self.case_sensitive { ", case" } else { "" }
            ),
            PromptKind::Replace => " Replace all with: ".to_string(),
            PromptKind::Goto => " Go to (line[:col] or hex offset): ".to_string(),
        }
    }
}

struct App {
    should_quit: bool,
    documents: Vec<Document>,
    active: usize,
    viewport: Viewport,
    prompt: Option<Prompt>,
    pending_nibble: Option<u8>,
    message: Option<String>,
}

impl App {
    fn new(documents: Vec<Document>) -> Self {
        Self {
            should_quit: false,
            documents,
            active: 0,
            viewport: Viewport::new(0, 40),
            prompt: None,
            pending_nibble: None,
            message: None,
        }
    }

    fn document(&mut self) -> &mut Document {
        &mut self.documents[self.active]
    }

    fn buffer(&mut self) -> &mut Buffer {
        &mut self.documents[self.active].buffer
    }

    fn report(&mut self, message: impl Into<String>) {
        self.message = Some(message.into());
    }

    fn handle_event(&mut self, event: Event) {
        if let Event::Key(key) = event {
            if key.kind == KeyEventKind::Press {
                self.handle_key(key);
            }
        }
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if self.prompt.is_some() {
            self.handle_prompt_key(key);
            return;
        }

        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        if ctrl {
            match key.code {
                KeyCode::Char('q') => self.should_quit = true,
                KeyCode::Char('s') => self.save(),
                KeyCode::Char('z') => {
                    if !self.buffer().undo() {
                        self.report("nothing to undo");
                    }
                }
                KeyCode::Char('y') => {
                    if !self.buffer().redo() {
                        self.report("nothing to redo");
                    }
                }
                KeyCode::Char('f') => self.open_prompt(PromptKind::Search),
                KeyCode::Char('r') => self.open_prompt(PromptKind::Replace),
                KeyCode::Char('g') => self.open_prompt(PromptKind::Goto),
                KeyCode::Char('l') => self.materialize(),
                _ => {}
            }
            return;
        }

        match key.code {
            KeyCode::Tab => self.cycle_document(),
            KeyCode::F(3) if key.modifiers.contains(KeyModifiers::SHIFT) => self.find_previous(),
            KeyCode::F(3) => self.find_next(),
            KeyCode::Left => self.move_cursor(CursorMove::Left),
            KeyCode::Right => self.move_cursor(CursorMove::Right),
            KeyCode::Up => self.move_cursor(CursorMove::Up),
            KeyCode::Down => self.move_cursor(CursorMove::Down),
            KeyCode::PageUp => self.move_cursor(CursorMove::PageUp(self.viewport.page())),
            KeyCode::PageDown => self.move_cursor(CursorMove::PageDown(self.viewport.page())),
            KeyCode::Home => self.move_cursor(CursorMove::LineStart),
            KeyCode::End => self.move_cursor(CursorMove::LineEnd),
            _ => {
                self.buffer().clear_selection();
                match self.buffer().mode() {
                    ViewMode::Binary => self.handle_binary_key(key),
                    ViewMode::Text => self.handle_text_key(key),
                }
            }
        }
    }

    fn handle_binary_key(&mut self, key: KeyEvent) {
        let result = match key.code {
            KeyCode::Char('n') => {
                self.find_next();
                return;
            }
            KeyCode::Char('N') => {
                self.find_previous();
                return;
            }
            KeyCode::Char(c) if c.is_ascii_hexdigit() => {
                let Some(digit) = c.to_digit(16) else {
                    return;
                };
                let Some(high) = self.pending_nibble.take() else {
                    self.pending_nibble = Some(digit as u8);
                    return;
                };
                let buffer = self.buffer();
                let position = buffer.cursor_offset();
                let value = (u32::from(high) << 4) | digit;
                let result = if position < buffer.size() {
                    buffer.replace_byte(position, value)
                } else {
                    buffer.insert_byte(position, value)
                };
                if result.is_ok() {
                    buffer.move_cursor(CursorMove::Right);
                }
                result
            }
            KeyCode::Insert => {
                let buffer = self.buffer();
                let position = buffer.cursor_offset();
                buffer.insert_byte(position, 0)
            }
            KeyCode::Delete => {
                let buffer = self.buffer();
                let position = buffer.cursor_offset();
                buffer.delete_byte(position)
            }
            KeyCode::Esc => {
                self.pending_nibble = None;
                return;
            }
            _ => return,
        };

        if let Err(e) = result {
            self.pending_nibble = None;
            self.report(e.to_string());
        }
    }

    fn handle_text_key(&mut self, key: KeyEvent) {
        let buffer = self.buffer();
        let cursor = buffer.cursor();
        match key.code {
            KeyCode::Char(c) => {
                buffer.insert_text(cursor.line, cursor.col, c.encode_utf8(&mut [0; 4]));
            }
            KeyCode::Enter => {
                buffer.insert_text(cursor.line, cursor.col, "\n");
            }
            KeyCode::Backspace if cursor.col > 0 => {
                buffer.delete_text(cursor.line, cursor.col - 1, cursor.col);
            }
            KeyCode::Backspace if cursor.line > 0 => {
                buffer.join_lines(cursor.line - 1);
            }
            KeyCode::Delete => {
                let len = lines::char_len(buffer.get_code_line(cursor.line));
                if cursor.col < len {
                    buffer.delete_text(cursor.line, cursor.col, cursor.col + 1);
                } else {
                    buffer.join_lines(cursor.line);
                }
            }
            _ => {}
        }
    }

    fn handle_prompt_key(&mut self, key: KeyEvent) {
        let Some(prompt) = self.prompt.as_mut() else {
            return;
        };

        match key.code {
            KeyCode::Esc => self.prompt = None,
            KeyCode::Tab if prompt.kind == PromptKind::Search => {
                prompt.search_kind = prompt.search_kind.cycle();
            }
            KeyCode::Char('t') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                prompt.case_sensitive = !prompt.case_sensitive;
            }
            KeyCode::Char(c) => prompt.input.push(c),
            KeyCode::Backspace => {
                prompt.input.pop();
            }
            KeyCode::Enter => {
                if let Some(prompt) = self.prompt.take() {
                    self.submit_prompt(prompt);
                }
            }
            _ => {}
        }
    }

    fn open_prompt(&mut self, kind: PromptKind) {
        let last = self.document().search.last_query().cloned();
        if kind == PromptKind::Replace && last.is_none() {
            self.report("search first (Ctrl+F)");
            return;
        }

        let (search_kind, case_sensitive) = last
            .map(|q| (q.kind, q.case_sensitive))
            .unwrap_or_default();
        self.prompt = Some(Prompt {
            kind,
            input: String::new(),
            search_kind,
            case_sensitive,
        });
    }

    fn submit_prompt(&mut self, prompt: Prompt) {
        match prompt.kind {
            PromptKind::Search => {
                let query = Query::new(prompt.input, prompt.search_kind)
                    .case_sensitive(prompt.case_sensitive);
                let Document { buffer, search } = self.document();
                let count = search.find_all(buffer, &query).len();
                let found = search.find_next(buffer, &query, None);
                self.show_match(found);
                if self.message.is_none() {
                    self.report(format!("{} matches", count));
                }
            }
            PromptKind::Replace => {
                let Document { buffer, search } = self.document();
                let Some(query) = search.last_query().cloned() else {
                    return;
                };
                buffer.clear_selection();
                match search.replace_all(buffer, &query, &prompt.input) {
                    Ok(count) => self.report(format!("replaced {} matches", count)),
                    Err(e) => self.report(e.to_string()),
                }
            }
            PromptKind::Goto => self.goto(&prompt.input),
        }
    }

    /// Jump to `line[:col]` (1-based) in code view or a hex offset in
    /// binary view
    fn goto(&mut self, target: &str) {
        let target = target.trim();
        let buffer = self.buffer();
        buffer.clear_selection();
        let moved = match buffer.mode() {
            ViewMode::Text => {
                let mut parts = target.splitn(2, ':');
                let line = parts.next().and_then(|l| l.trim().parse::<usize>().ok());
                let col = parts.next().map_or(Some(1), |c| c.trim().parse::<usize>().ok());
                match (line, col) {
                    (Some(line), Some(col)) => {
                        buffer.set_cursor_line_col(line.saturating_sub(1), col.saturating_sub(1));
                        true
                    }
                    _ => false,
                }
            }
            ViewMode::Binary => {
                let digits = target.trim_start_matches("0x").trim_start_matches("0X");
                match usize::from_str_radix(digits, 16) {
                    Ok(offset) => {
                        buffer.set_cursor_offset(offset);
                        true
                    }
                    Err(_) => false,
                }
            }
        };
        if !moved {
            self.report(format!("cannot go to '{}'", target));
        }
    }

    fn find_next(&mut self) {
        let Document { buffer, search } = self.document();
        let Some(query) = search.last_query().cloned() else {
            self.report("no search (Ctrl+F)");
            return;
        };
        let start = buffer.cursor_offset() + 1;
        let found = search.find_next(buffer, &query, Some(start));
        self.show_match(found);
    }

    fn find_previous(&mut self) {
        let Document { buffer, search } = self.document();
        let found = search.find_previous(buffer);
        self.show_match(found);
    }

    fn show_match(&mut self, found: Option<hexcode::SearchResult>) {
        let document = self.document();
        match found {
            Some(result) => {
                document.buffer.set_cursor_offset(result.position);
                document.buffer.set_selection(result.position, result.end());
                self.message = None;
            }
            None => {
                let message = match document.search.last_error() {
                    Some(e) => e.to_string(),
                    None => "no match".to_string(),
                };
                self.report(message);
            }
        }
    }

    fn move_cursor(&mut self, motion: CursorMove) {
        self.pending_nibble = None;
        let buffer = self.buffer();
        buffer.clear_selection();
        buffer.move_cursor(motion);
    }

    fn cycle_document(&mut self) {
        self.active = (self.active + 1) % self.documents.len();
        self.pending_nibble = None;
        self.viewport.start_line = 0;
    }

    fn save(&mut self) {
        let message = match self.buffer().save() {
            Ok(()) => "saved".to_string(),
            Err(e) => format!("{:#}", anyhow::Error::from(e)),
        };
        self.report(message);
    }

    fn materialize(&mut self) {
        let message = match self.buffer().materialize() {
            Ok(()) => "loaded into memory".to_string(),
            Err(e) => e.to_string(),
        };
        self.report(message);
    }
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout());
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    terminal.show_cursor()?;
    stdout().execute(LeaveAlternateScreen)?;
    Ok(())
}

fn render_ui(terminal: &mut Terminal<CrosstermBackend<Stdout>>, app: &mut App) -> Result<()> {
    terminal.draw(|frame| {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(1), Constraint::Length(1), Constraint::Length(1)])
            .split(frame.area());

        let active = app.active;
        let count = app.documents.len();
        let Document { buffer, search } = &mut app.documents[active];

        let title = format!(" hexcode - {} ", buffer.mode().label());
        let main_block = Block::default().borders(Borders::ALL).title(title);
        let inner = main_block.inner(chunks[0]);
        frame.render_widget(main_block, chunks[0]);

        app.viewport.resize(inner.height as usize);
        if buffer.mode() == ViewMode::Binary {
            buffer.set_bytes_per_line(inner.width as usize);
        }
        app.viewport.follow(buffer.cursor_line());

        let highlights = Highlights {
            matches: search.results(),
            current: search.current(),
            selection: buffer.selection(),
        };
        let content: Vec<Line> = match buffer.mode() {
            ViewMode::Binary => {
                render::hex_lines(buffer, &app.viewport, &highlights, app.pending_nibble)
            }
            ViewMode::Text => render::code_lines(buffer, &app.viewport, &highlights),
        };
        frame.render_widget(Paragraph::new(content), inner);

        let status = Paragraph::new(render::status_line(buffer, active, count))
            .style(Style::default().bg(Color::DarkGray).fg(Color::White));
        frame.render_widget(status, chunks[1]);

        let bottom = match &app.prompt {
            Some(prompt) => format!("{}{}", prompt.title(), prompt.input),
            None => app.message.clone().unwrap_or_else(|| {
                " ^S save  ^Z/^Y undo/redo  ^F find  n/N next/prev  ^R replace  ^G go to  Tab next file  ^Q quit"
                    .to_string()
            }),
        };
        frame.render_widget(Paragraph::new(bottom), chunks[2]);
    })?;

    Ok(())
}

fn run(app: &mut App, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    loop {
        render_ui(terminal, app)?;

        if app.should_quit {
            break;
        }

        if event::poll(Duration::from_millis(16))? {
            let event = event::read()?;
            app.handle_event(event);
        }
    }

    Ok(())
}

fn init_logging(path: &Path) -> Result<()> {
    use tracing_subscriber::EnvFilter;

    let file = File::create(path)
        .with_context(|| format!("failed to create log file {}", path.display()))?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("hexcode=debug")),
        )
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn load_config(args: &Args) -> Result<EditorConfig> {
    let mut config = match &args.config {
        Some(path) => EditorConfig::from_json_file(path)?,
        None => EditorConfig::default(),
    };
    if let Some(threshold) = args.large_file_threshold {
        config.large_file_threshold = threshold;
    }
    Ok(config)
}

fn open_documents(args: &Args, config: &EditorConfig) -> Result<Vec<Document>> {
    let highlighter = Highlighter::new();
    let mut documents = Vec::new();

    for path in &args.files {
        let buffer = if path.exists() {
            Buffer::open(path, config.clone(), &highlighter)
                .with_context(|| format!("cannot open {}", path.display()))?
        } else {
            Buffer::new_file(path, config.clone(), &highlighter)
        };
        documents.push(Document {
            buffer,
            search: SearchEngine::new(),
        });
    }

    if documents.is_empty() {
        documents.push(Document {
            buffer: Buffer::with_config(config.clone()),
            search: SearchEngine::new(),
        });
    }
    Ok(documents)
}

fn main() -> Result<()> {
    let args = Args::parse();

    if let Some(path) = &args.log_file {
        init_logging(path)?;
    }

    let config = load_config(&args)?;
    let documents = open_documents(&args, &config)?;
    tracing::info!(files = documents.len(), "starting");

    // Restore the terminal on panic
    let default_panic = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = disable_raw_mode();
        let _ = stdout().execute(LeaveAlternateScreen);
        default_panic(info);
    }));

    let mut app = App::new(documents);
    let mut terminal = setup_terminal()?;
    let result = run(&mut app, &mut terminal);
    restore_terminal(&mut terminal)?;

    result
}
