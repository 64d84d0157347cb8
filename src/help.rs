use crate::prompt::modal;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Style,
    text::{Line, Text},
    widgets::{Paragraph, Widget},
};

static TEXT: &[&str] = &[
    "h, l, LEFT, RIGHT   Select previous/next day",
    "j, k, DOWN, UP      Select next/previous member",
    "SPACE, ENTER        Cycle Office → WFH → Leave",
    "p, [, PAGE UP       Go to previous week",
    "n, ], PAGE DOWN     Go to next week",
    "t, HOME             Go to this week",
    "a                   Add a team member",
    "x, DELETE           Remove selected member",
    "s                   Save now",
    "L                   Reload saved board",
    "?                   Show this help",
    "q, ESC              Quit",
    "",
    "Press the Any Key to dismiss.",
];

/// Key help overlay
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) struct Help(pub(crate) Style);

impl Widget for Help {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let text = Text::from(TEXT.iter().map(|&s| Line::raw(s)).collect::<Vec<_>>());
        let width = u16::try_from(text.width())
            .unwrap_or(u16::MAX)
            .saturating_add(4);
        let height = u16::try_from(text.height())
            .unwrap_or(u16::MAX)
            .saturating_add(4);
        let text_area = modal(area, buf, self.0, width, height, " Commands ");
        Paragraph::new(text).style(self.0).render(text_area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::buffer_lines;
    use crate::theme::BASE_STYLE;

    #[test]
    fn test_render() {
        let area = Rect::new(0, 0, 60, 20);
        let mut buffer = Buffer::empty(area);
        Help(BASE_STYLE).render(area, &mut buffer);
        let lines = buffer_lines(&buffer);
        assert!(lines[2].contains(" Commands "));
        assert!(lines[3].contains("│ h, l, LEFT, RIGHT   Select previous/next day"));
        assert!(lines[15].trim_end().ends_with('│'));
        assert!(lines[16].contains("│ Press the Any Key to dismiss."));
        assert!(lines[17].contains('└'));
    }
}
