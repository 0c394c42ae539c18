//! The terminal shell: input handling and rendering.
//!
//! Owns the document, the suggestion coordinator, and the viewport. The main
//! loop calls [`App::tick`] to drain fetch results, [`App::handle_event`]
//! for input, and [`App::render`] to draw the text area, status bar, and the
//! suggestion popup anchored at the caret.

use crate::config::Config;
use crate::document::Document;
use crate::services::continuation_client::ContinuationClient;
use crate::suggestions::SuggestionCoordinator;
use crossterm::event::{
    Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use ratatui::{
    layout::{Position, Rect},
    style::{Style, Stylize},
    text::{Line, Text},
    widgets::{Block, Clear, List, ListItem, ListState},
    Frame,
};
use unicode_width::UnicodeWidthStr;

pub struct App {
    doc: Document,
    coordinator: SuggestionCoordinator,
    config: Config,
    /// Top visible line and leftmost visible column (both 0-based).
    scroll: (usize, usize),
    should_quit: bool,
    /// Areas from the last render, for mouse hit testing.
    text_area: Rect,
    popup_area: Option<Rect>,
    /// First candidate row visible in the popup list.
    popup_offset: usize,
}

impl App {
    pub fn new(config: Config, initial_text: String) -> Self {
        let client = ContinuationClient::from_config(&config.service);
        Self {
            doc: Document::from_text(initial_text),
            coordinator: SuggestionCoordinator::new(client),
            config,
            scroll: (0, 0),
            should_quit: false,
            text_area: Rect::default(),
            popup_area: None,
            popup_offset: 0,
        }
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    /// Drain fetch results. Returns true if the display changed.
    pub fn tick(&mut self) -> bool {
        self.coordinator.process_messages()
    }

    pub fn handle_event(&mut self, event: Event) {
        match event {
            Event::Key(key) if key.kind == KeyEventKind::Press => self.handle_key_event(key),
            Event::Mouse(mouse) => self.handle_mouse_event(mouse),
            _ => {}
        }
        self.pump_document_changes();
    }

    /// Forward queued change notices to the coordinator.
    fn pump_document_changes(&mut self) {
        for origin in self.doc.drain_changes() {
            self.coordinator.on_buffer_changed(&self.doc, origin);
        }
    }

    fn handle_key_event(&mut self, key: KeyEvent) {
        match key {
            KeyEvent {
                code: KeyCode::Char('q'),
                modifiers: KeyModifiers::CONTROL,
                ..
            } => self.should_quit = true,

            KeyEvent {
                code: KeyCode::Esc, ..
            } => self.coordinator.hide_popup(),

            KeyEvent {
                code: KeyCode::Up,
                modifiers: KeyModifiers::NONE,
                ..
            } => {
                if self.coordinator.popup_visible() {
                    self.coordinator.select_prev();
                } else {
                    self.doc.move_up();
                }
            }

            KeyEvent {
                code: KeyCode::Down,
                modifiers: KeyModifiers::NONE,
                ..
            } => {
                if self.coordinator.popup_visible() {
                    self.coordinator.select_next();
                } else {
                    self.doc.move_down();
                }
            }

            KeyEvent {
                code: KeyCode::Tab,
                modifiers: KeyModifiers::NONE,
                ..
            } => {
                self.coordinator.accept(&mut self.doc);
            }

            KeyEvent {
                code: KeyCode::Enter,
                modifiers: KeyModifiers::NONE,
                ..
            } => {
                if !self.coordinator.accept(&mut self.doc) {
                    self.doc.insert_newline();
                }
            }

            KeyEvent {
                code: KeyCode::Char(c),
                modifiers,
                ..
            } if modifiers == KeyModifiers::NONE || modifiers == KeyModifiers::SHIFT => {
                self.doc.insert_char(c)
            }

            KeyEvent {
                code: KeyCode::Backspace,
                ..
            } => self.doc.backspace(),

            KeyEvent {
                code: KeyCode::Delete,
                ..
            } => self.doc.delete(),

            KeyEvent {
                code: KeyCode::Left,
                ..
            } => self.doc.move_left(),

            KeyEvent {
                code: KeyCode::Right,
                ..
            } => self.doc.move_right(),

            KeyEvent {
                code: KeyCode::Home,
                ..
            } => self.doc.move_line_start(),

            KeyEvent {
                code: KeyCode::End, ..
            } => self.doc.move_line_end(),

            _ => {}
        }
    }

    fn handle_mouse_event(&mut self, mouse: MouseEvent) {
        let position = Position::new(mouse.column, mouse.row);
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                if let Some(popup) = self.popup_area {
                    if popup.contains(position) {
                        // Inner rows only; clicks on the border do nothing.
                        let inner = popup.inner(ratatui::layout::Margin::new(1, 1));
                        if inner.contains(position) {
                            let row = (mouse.row - inner.y) as usize;
                            self.coordinator
                                .accept_index(&mut self.doc, self.popup_offset + row);
                        }
                        return;
                    }
                }
                if self.text_area.contains(position) {
                    let line = self.scroll.0 + (mouse.row - self.text_area.y) as usize;
                    let column = self.scroll.1 + (mouse.column - self.text_area.x) as usize;
                    self.doc.move_to(line, column);
                }
            }
            MouseEventKind::ScrollUp => self.doc.move_up(),
            MouseEventKind::ScrollDown => self.doc.move_down(),
            _ => {}
        }
    }

    /// Caret position as (line, column), both 0-based character counts.
    fn caret_line_col(&self) -> (usize, usize) {
        let prompt = self.doc.prompt();
        let line = prompt.matches('\n').count();
        let line_start = prompt.rfind('\n').map(|i| i + 1).unwrap_or(0);
        let column = prompt[line_start..].chars().count();
        (line, column)
    }

    /// Bring the caret into view.
    fn scroll_to_caret(&mut self, area: Rect) {
        let (line, column) = self.caret_line_col();
        let height = area.height as usize;
        let width = area.width as usize;
        if height == 0 || width == 0 {
            return;
        }
        self.scroll.0 = self.scroll.0.max(line.saturating_sub(height - 1)).min(line);
        self.scroll.1 = self
            .scroll
            .1
            .max(column.saturating_sub(width - 1))
            .min(column);
    }

    pub fn render(&mut self, frame: &mut Frame) {
        let area = frame.area();
        if area.height < 2 || area.width == 0 {
            return;
        }
        self.text_area = Rect::new(0, 0, area.width, area.height - 1);
        let status_area = Rect::new(0, area.height - 1, area.width, 1);
        self.scroll_to_caret(self.text_area);

        let lines: Vec<Line> = self
            .doc
            .text()
            .split('\n')
            .skip(self.scroll.0)
            .take(self.text_area.height as usize)
            .map(|line| Line::raw(line.chars().skip(self.scroll.1).collect::<String>()))
            .collect();
        frame.render_widget(Text::from(lines), self.text_area);

        let (line, column) = self.caret_line_col();
        let mut status = format!("Ln {}, Col {}", line + 1, column + 1);
        if self.coordinator.has_pending_request() {
            status.push_str("  fetching...");
        }
        frame.render_widget(Line::raw(status).dark_gray(), status_area);

        // Caret cell; always in view after scroll_to_caret, but guard anyway
        // for tiny terminals.
        let caret_cell = self.caret_screen_cell();
        if let Some(cell) = caret_cell {
            frame.set_cursor_position(cell);
        }

        self.popup_area = None;
        if self.coordinator.popup_visible() {
            match caret_cell {
                Some(cell) => self.render_popup(frame, cell),
                // Anchor unresolvable: suppress the popup rather than draw
                // it anywhere else.
                None => {}
            }
        }
    }

    fn caret_screen_cell(&self) -> Option<Position> {
        let (line, column) = self.caret_line_col();
        if line < self.scroll.0 || column < self.scroll.1 {
            return None;
        }
        let y = (line - self.scroll.0) as u16;
        let x = (column - self.scroll.1) as u16;
        if y >= self.text_area.height || x >= self.text_area.width {
            return None;
        }
        Some(Position::new(x, y))
    }

    fn render_popup(&mut self, frame: &mut Frame, caret: Position) {
        let candidates = self.coordinator.candidates().to_vec();
        if candidates.is_empty() {
            return;
        }

        let rows = (candidates.len() as u16).min(self.config.popup.max_rows);
        let height = rows + 2;
        let widest = candidates
            .iter()
            .map(|c| c.width() as u16)
            .max()
            .unwrap_or(0);
        let width = (widest + 2)
            .min(self.config.popup.width)
            .max(8)
            .min(self.text_area.width);
        if height > self.text_area.height {
            return;
        }

        // Below the caret if it fits, above otherwise.
        let y = if caret.y + 1 + height <= self.text_area.height {
            caret.y + 1
        } else if caret.y >= height {
            caret.y - height
        } else {
            return;
        };
        let x = caret.x.min(self.text_area.width - width);
        let popup = Rect::new(x, y, width, height);

        let selected = self.coordinator.selected();
        self.popup_offset = selected.saturating_sub(rows as usize - 1);
        let items: Vec<ListItem> = candidates.iter().map(|c| ListItem::new(c.as_str())).collect();
        let list = List::new(items)
            .block(Block::bordered())
            .highlight_style(Style::new().reversed());
        let mut state = ListState::default()
            .with_offset(self.popup_offset)
            .with_selected(Some(selected));

        frame.render_widget(Clear, popup);
        frame.render_stateful_widget(list, popup, &mut state);
        self.popup_area = Some(popup);
    }
}
