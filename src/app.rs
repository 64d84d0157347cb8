use crate::board::Board;
use crate::grid::Grid;
use crate::help::Help;
use crate::persist::SaveOutcome;
use crate::prompt::{AddMember, ConfirmRemove, NameInput, NameInputEvent, NameInputOutput};
use crate::status::Workday;
use crate::theme::{BASE_STYLE, STATUS_BAR_STYLE};
use crate::week::WeekCursor;
use crossterm::event::{self, KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Layout, Rect},
    text::Line,
    widgets::{Block, StatefulWidget, Widget},
    DefaultTerminal,
};
use std::io::{self, Write};
use std::time::Duration;
use time::{
    format_description::FormatItem, macros::format_description, Date, PrimitiveDateTime,
    UtcOffset,
};

/// How long to wait for a key press before checking for remote updates
const POLL_INTERVAL: Duration = Duration::from_millis(250);

static UPDATED_FMT: &[FormatItem<'_>] =
    format_description!("[year]-[month]-[day] [hour]:[minute] UTC");

#[derive(Debug)]
pub(crate) struct App {
    board: Board,
    cursor: WeekCursor,
    this_week: WeekCursor,
    today: Date,
    row: usize,
    day: Workday,
    state: AppState,
    notice: Option<String>,
}

impl App {
    pub(crate) fn new(board: Board, now: PrimitiveDateTime) -> App {
        let this_week = WeekCursor::today(now);
        let today = now.date();
        let day = Workday::from_index(usize::from(today.weekday().number_days_from_monday()))
            .unwrap_or(Workday::Monday);
        App {
            board,
            cursor: this_week,
            this_week,
            today,
            row: 0,
            day,
            state: AppState::Grid,
            notice: None,
        }
    }

    /// Start out displaying `cursor` instead of the current week
    pub(crate) fn start_week(mut self, cursor: WeekCursor) -> App {
        self.cursor = cursor;
        self
    }

    pub(crate) fn run(mut self, mut terminal: DefaultTerminal) -> io::Result<()> {
        while !self.quitting() {
            self.draw(&mut terminal)?;
            if event::poll(POLL_INTERVAL)? {
                self.handle_input()?;
            }
            self.sync();
        }
        Ok(())
    }

    fn draw(&mut self, terminal: &mut DefaultTerminal) -> io::Result<()> {
        terminal.draw(|frame| frame.render_widget(self, frame.area()))?;
        Ok(())
    }

    fn handle_input(&mut self) -> io::Result<()> {
        let normal_modifiers = KeyModifiers::NONE | KeyModifiers::SHIFT;
        if let Some(KeyEvent {
            code, modifiers, ..
        }) = event::read()?.as_key_press_event()
        {
            self.notice = None;
            if modifiers == KeyModifiers::CONTROL && code == KeyCode::Char('c') {
                self.state = AppState::Quitting;
            } else if !normal_modifiers.contains(modifiers) || !self.handle_key(code) {
                self.beep()?;
            }
        }
        // else: Redraw on resize, and we might as well redraw on other stuff
        // too
        Ok(())
    }

    fn sync(&mut self) {
        self.board.poll_saves();
        if self.board.poll_remote() {
            self.clamp_row();
            self.notice = Some(String::from("Board updated by another user"));
        }
    }

    // Returns `false` if the user pressed an invalid key
    fn handle_key(&mut self, key: KeyCode) -> bool {
        match &mut self.state {
            AppState::Grid => match key {
                KeyCode::Char('h') | KeyCode::Left => self.move_day(-1),
                KeyCode::Char('l') | KeyCode::Right => self.move_day(1),
                KeyCode::Char('k') | KeyCode::Up => self.move_row(-1),
                KeyCode::Char('j') | KeyCode::Down => self.move_row(1),
                KeyCode::Char(' ') | KeyCode::Enter => self.cycle_selected(),
                KeyCode::Char('p' | '[') | KeyCode::PageUp => {
                    self.cursor.prev();
                    true
                }
                KeyCode::Char('n' | ']') | KeyCode::PageDown => {
                    self.cursor.next();
                    true
                }
                KeyCode::Char('t') | KeyCode::Home => {
                    self.cursor = self.this_week;
                    true
                }
                KeyCode::Char('a') => {
                    self.state = AppState::Adding(NameInput::new());
                    true
                }
                KeyCode::Char('x') | KeyCode::Delete => match self.selected_member() {
                    Some(name) => {
                        self.state = AppState::Removing(name);
                        true
                    }
                    None => false,
                },
                KeyCode::Char('s') => {
                    self.save();
                    true
                }
                KeyCode::Char('L') => {
                    self.board.reload();
                    self.clamp_row();
                    self.notice = Some(String::from("Reloaded"));
                    true
                }
                KeyCode::Char('q') | KeyCode::Esc => {
                    self.state = AppState::Quitting;
                    true
                }
                KeyCode::Char('?') => {
                    self.state = AppState::Helping;
                    true
                }
                _ => false,
            },
            AppState::Helping => {
                self.state = AppState::Grid;
                true
            }
            AppState::Adding(input) => {
                let output = match key {
                    KeyCode::Esc => {
                        self.state = AppState::Grid;
                        return true;
                    }
                    KeyCode::Char(c) => input.handle_input(NameInputEvent::Char(c)),
                    KeyCode::Backspace => input.handle_input(NameInputEvent::Backspace),
                    KeyCode::Enter => input.handle_input(NameInputEvent::Enter),
                    _ => NameInputOutput::Invalid,
                };
                match output {
                    NameInputOutput::Ok => true,
                    NameInputOutput::Invalid => false,
                    NameInputOutput::Submit(name) => self.add_member(name),
                }
            }
            AppState::Removing(name) => match key {
                KeyCode::Char('y' | 'Y') => {
                    let name = std::mem::take(name);
                    self.state = AppState::Grid;
                    if self.board.remove_member(&name) {
                        self.notice = Some(format!("Removed {name}"));
                    }
                    self.clamp_row();
                    true
                }
                KeyCode::Char('n' | 'N' | 'q') | KeyCode::Esc => {
                    self.state = AppState::Grid;
                    true
                }
                _ => false,
            },
            AppState::Quitting => false,
        }
    }

    fn beep(&self) -> io::Result<()> {
        io::stdout().write_all(b"\x07")
    }

    fn quitting(&self) -> bool {
        self.state == AppState::Quitting
    }

    fn selected_member(&self) -> Option<String> {
        self.board.members().get(self.row).cloned()
    }

    fn move_day(&mut self, delta: isize) -> bool {
        match self
            .day
            .index()
            .checked_add_signed(delta)
            .and_then(Workday::from_index)
        {
            Some(day) => {
                self.day = day;
                true
            }
            None => false,
        }
    }

    fn move_row(&mut self, delta: isize) -> bool {
        match self.row.checked_add_signed(delta) {
            Some(row) if row < self.board.members().len() => {
                self.row = row;
                true
            }
            _ => false,
        }
    }

    fn clamp_row(&mut self) {
        self.row = self.row.min(self.board.members().len().saturating_sub(1));
    }

    fn cycle_selected(&mut self) -> bool {
        let Some(member) = self.selected_member() else {
            return false;
        };
        self.board
            .cycle_status(&member, self.cursor.year(), self.cursor.week(), self.day)
            .is_some()
    }

    // Leaves the prompt open if the name is already taken
    fn add_member(&mut self, name: String) -> bool {
        if self.board.add_member(&name) {
            self.row = self.board.members().len() - 1;
            self.notice = Some(format!("Added {name}"));
            self.state = AppState::Grid;
            true
        } else {
            self.notice = Some(format!("{name} is already on the team"));
            false
        }
    }

    fn save(&mut self) {
        self.notice = match self.board.save() {
            Ok(SaveOutcome::Remote) => Some(String::from("Saved to remote database")),
            Ok(SaveOutcome::Queued) => Some(String::from("Saving to remote database")),
            Ok(SaveOutcome::Local | SaveOutcome::LocalFallback) => Some(String::from("Saved")),
            // The status bar shows the failure
            Err(_) => None,
        };
    }

    fn status_message(&self) -> String {
        if let Some(notice) = &self.notice {
            notice.clone()
        } else if let Some(e) = self.board.save_error() {
            format!("Save failed: {e}")
        } else if let Some(when) = self.board.last_updated() {
            when.to_offset(UtcOffset::UTC)
                .format(&UPDATED_FMT)
                .map(|s| format!("Last updated {s}"))
                .unwrap_or_default()
        } else {
            String::new()
        }
    }
}

impl Widget for &mut App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        buf.set_style(area, BASE_STYLE);
        let [grid_area, status_area] =
            Layout::vertical([Constraint::Fill(1), Constraint::Length(1)]).areas(area);
        let mut grid = Grid::new(&self.board, self.cursor, self.today);
        if !self.board.members().is_empty() {
            grid = grid.selected(self.row, self.day);
        }
        grid.render(grid_area, buf);
        Block::new().style(STATUS_BAR_STYLE).render(status_area, buf);
        Line::raw(format!(
            " [{}] {}",
            self.board.backend_kind().label(),
            self.status_message()
        ))
        .render(status_area, buf);
        Line::raw("? help ").right_aligned().render(status_area, buf);
        match self.state {
            AppState::Helping => Help(BASE_STYLE).render(area, buf),
            AppState::Adding(ref mut input) => AddMember.render(area, buf, input),
            AppState::Removing(ref name) => ConfirmRemove(name).render(area, buf),
            AppState::Grid | AppState::Quitting => (),
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
enum AppState {
    Grid,
    Helping,
    Adding(NameInput),
    Removing(String),
    Quitting,
}
