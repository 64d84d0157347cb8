use crate::status::Status;
use ratatui::style::{Color, Modifier, Style};

pub(crate) const BASE_STYLE: Style = Style::new().fg(Color::White).bg(Color::Black);

pub(crate) const WEEK_LABEL_STYLE: Style = BASE_STYLE.add_modifier(Modifier::BOLD);

pub(crate) const HEADER_STYLE: Style = BASE_STYLE.add_modifier(Modifier::BOLD);

pub(crate) const TODAY_STYLE: Style = Style::new()
    .fg(Color::LightCyan)
    .bg(Color::Black)
    .add_modifier(Modifier::BOLD);

pub(crate) const OFFICE_STYLE: Style = Style::new().fg(Color::LightGreen).bg(Color::Black);

pub(crate) const WFH_STYLE: Style = Style::new().fg(Color::LightBlue).bg(Color::Black);

pub(crate) const LEAVE_STYLE: Style = Style::new()
    .fg(Color::LightYellow)
    .bg(Color::Black)
    .add_modifier(Modifier::BOLD);

pub(crate) const SELECTED: Modifier = Modifier::REVERSED;

pub(crate) const EMPTY_STYLE: Style = BASE_STYLE.fg(Color::DarkGray);

pub(crate) const STATUS_BAR_STYLE: Style = Style::new().fg(Color::Black).bg(Color::Gray);

pub(crate) fn status_style(status: Status) -> Style {
    match status {
        Status::Office => OFFICE_STYLE,
        Status::WorkFromHome => WFH_STYLE,
        Status::Leave => LEAVE_STYLE,
    }
}

pub(crate) mod prompt {
    use super::*;

    pub(crate) const UNFILLED_STYLE: Style = BASE_STYLE.fg(Color::DarkGray);

    pub(crate) const READY_ENTER_STYLE: Style = BASE_STYLE.add_modifier(Modifier::UNDERLINED);
}
