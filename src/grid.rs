use crate::board::Board;
use crate::status::Workday;
use crate::theme::{
    status_style, EMPTY_STYLE, HEADER_STYLE, SELECTED, TODAY_STYLE, WEEK_LABEL_STYLE,
};
use crate::week::WeekCursor;
use ratatui::{prelude::*, widgets::*};
use time::Date;

static NAME_HEADER: &str = "Team Member";

static NO_MEMBERS: &str = "No team members yet; press a to add one.";

/// Width of the column of member names, including the gap after it
const NAME_WIDTH: u16 = 16;

/// Width of the text in each day's cell
const CELL_WIDTH: u16 = 8;

/// Number of columns per day, including the gap between cells
const DAY_WIDTH: u16 = CELL_WIDTH + 1;

const TOTAL_WIDTH: u16 = NAME_WIDTH + DAY_WIDTH * 5;

/// Number of lines above the first member: the week label, a blank line, the
/// column headers, and their rule
const HEADER_LINES: u16 = 4;

const ACS_HLINE: char = '─';

/// The member × weekday table for one week of a [`Board`]
#[derive(Clone, Copy, Debug)]
pub(crate) struct Grid<'a> {
    board: &'a Board,
    cursor: WeekCursor,
    today: Date,
    selection: Option<(usize, Workday)>,
}

impl<'a> Grid<'a> {
    pub(crate) fn new(board: &'a Board, cursor: WeekCursor, today: Date) -> Grid<'a> {
        Grid {
            board,
            cursor,
            today,
            selection: None,
        }
    }

    /// Highlights the cell for the `row`-th member on `day`
    pub(crate) fn selected(mut self, row: usize, day: Workday) -> Grid<'a> {
        self.selection = Some((row, day));
        self
    }

    // Index of the first member shown when only `visible` rows fit, chosen so
    // that the selected row is on screen
    fn first_row(&self, visible: usize) -> usize {
        match self.selection {
            Some((row, _)) if visible > 0 && row >= visible => row + 1 - visible,
            _ => 0,
        }
    }
}

impl Widget for Grid<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let grid_area = Rect {
            x: area.x + area.width.saturating_sub(TOTAL_WIDTH) / 2,
            width: TOTAL_WIDTH.min(area.width),
            ..area
        };
        let mut canvas = BufferCanvas::new(grid_area, buf);
        canvas.mvprint(0, 0, self.cursor.label(), Some(WEEK_LABEL_STYLE));
        let Ok(dates) = self.cursor.dates() else {
            canvas.mvprint(2, 0, "This week cannot be shown.", Some(EMPTY_STYLE));
            return;
        };
        canvas.mvprint(2, 0, NAME_HEADER, Some(HEADER_STYLE));
        for (day, date) in std::iter::zip(Workday::ALL, dates) {
            let (text, style) = if date == self.today {
                (format!("[{} {:2}]", day.short_name(), date.day()), TODAY_STYLE)
            } else {
                (format!(" {} {:2} ", day.short_name(), date.day()), HEADER_STYLE)
            };
            canvas.draw_cell(2, day, text, style);
        }
        canvas.hline(3, 0, ACS_HLINE, TOTAL_WIDTH);
        let members = self.board.members();
        if members.is_empty() {
            canvas.mvprint(HEADER_LINES, 0, NO_MEMBERS, Some(EMPTY_STYLE));
            return;
        }
        let visible = usize::from(grid_area.height.saturating_sub(HEADER_LINES));
        let first = self.first_row(visible);
        for (y, (row, member)) in
            std::iter::zip(HEADER_LINES.., members.iter().enumerate().skip(first))
        {
            if y >= grid_area.height {
                break;
            }
            let name = member
                .chars()
                .take(usize::from(NAME_WIDTH - 1))
                .collect::<String>();
            canvas.mvprint(y, 0, name, None);
            for day in Workday::ALL {
                let status =
                    self.board
                        .status(member, self.cursor.year(), self.cursor.week(), day);
                let mut style = status_style(status);
                if self.selection == Some((row, day)) {
                    style = style.add_modifier(SELECTED);
                }
                canvas.draw_cell(y, day, format!(" {:^6} ", status.label()), style);
            }
        }
    }
}

#[derive(Debug)]
struct BufferCanvas<'a> {
    area: Rect,
    buf: &'a mut Buffer,
}

impl<'a> BufferCanvas<'a> {
    fn new(area: Rect, buf: &'a mut Buffer) -> Self {
        Self { area, buf }
    }

    fn draw_cell<S: AsRef<str>>(&mut self, y: u16, day: Workday, s: S, style: Style) {
        let i = u16::try_from(day.index()).unwrap_or(u16::MAX);
        self.mvprint(y, NAME_WIDTH + DAY_WIDTH * i, s, Some(style));
    }

    fn mvprint<S: AsRef<str>>(&mut self, y: u16, x: u16, s: S, style: Option<Style>) {
        if y < self.area.height && x < self.area.width {
            let text = Text::styled(s.as_ref(), style.unwrap_or_default());
            let width = u16::try_from(text.width()).unwrap_or(u16::MAX);
            // Using a Paragraph lets us truncate text that extends beyond the
            // grid's area, though we need to be sure that the Rect passed to
            // the Paragraph is entirely within the frame lest a panic result.
            Paragraph::new(text).render(
                Rect {
                    x: x + self.area.x,
                    y: y + self.area.y,
                    width: (self.area.width - x).min(width),
                    height: 1,
                },
                self.buf,
            );
        }
    }

    fn hline(&mut self, y: u16, x: u16, ch: char, length: u16) {
        self.mvprint(y, x, String::from(ch).repeat(length.into()), None);
    }
}

/// Returns the text of each line of `buf` with trailing blanks removed
#[cfg(test)]
pub(crate) fn buffer_lines(buf: &Buffer) -> Vec<String> {
    let area = buf.area;
    (area.top()..area.bottom())
        .map(|y| {
            (area.left()..area.right())
                .map(|x| buf[(x, y)].symbol())
                .collect::<String>()
                .trim_end()
                .to_owned()
        })
        .collect()
}
