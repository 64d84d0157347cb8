use crate::theme::{
    prompt::{READY_ENTER_STYLE, UNFILLED_STYLE},
    BASE_STYLE,
};
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Flex, Layout, Margin, Rect},
    style::Style,
    text::{Line, Span, Text},
    widgets::{Block, Clear, StatefulWidget, Widget},
};

/// Maximum number of characters in a member's name
pub(crate) const MAX_NAME_LEN: usize = 30;

const NAME_FILLER: char = '_';

const OUTER_WIDTH: u16 = 38;
const OUTER_HEIGHT: u16 = 8;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct AddMember;

impl StatefulWidget for AddMember {
    type State = NameInput;

    /*
     * ......................................
     * .┌──────── Add Team Member ─────────┐.
     * .│                                  │.
     * .│  Alice_________________________  │.
     * .│                                  │.
     * .│             [ENTER]              │.
     * .└──────────────────────────────────┘.
     * ......................................
     */

    fn render(self, area: Rect, buf: &mut Buffer, state: &mut Self::State) {
        let text_area = modal(
            area,
            buf,
            BASE_STYLE,
            OUTER_WIDTH,
            OUTER_HEIGHT,
            " Add Team Member ",
        );
        state.to_text().render(text_area, buf);
    }
}

/// The name typed so far into the add-member prompt
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub(crate) struct NameInput {
    name: String,
}

impl NameInput {
    pub(crate) fn new() -> NameInput {
        NameInput::default()
    }

    fn submittable(&self) -> bool {
        !self.name.trim().is_empty()
    }

    fn to_text(&self) -> Text<'static> {
        let len = self.name.chars().count();
        let filler = String::from(NAME_FILLER).repeat(MAX_NAME_LEN.saturating_sub(len));
        Text::from_iter([
            Line::styled("", BASE_STYLE),
            Line::from_iter([
                Span::styled(self.name.clone(), BASE_STYLE),
                Span::styled(filler, UNFILLED_STYLE),
            ]),
            Line::styled("", BASE_STYLE),
            // Style a span and convert it to a line rather than creating a
            // styled line directly so that only the "[ENTER]" text and not any
            // of its centering padding will be underlined:
            Line::from(Span::styled(
                "[ENTER]",
                if self.submittable() {
                    READY_ENTER_STYLE
                } else {
                    BASE_STYLE
                },
            )),
        ])
        .centered()
    }

    pub(crate) fn handle_input(&mut self, input: NameInputEvent) -> NameInputOutput {
        match input {
            NameInputEvent::Char(c) if c.is_control() => NameInputOutput::Invalid,
            NameInputEvent::Char(c) if self.name.chars().count() < MAX_NAME_LEN => {
                self.name.push(c);
                NameInputOutput::Ok
            }
            NameInputEvent::Char(_) => NameInputOutput::Invalid,
            NameInputEvent::Backspace => match self.name.pop() {
                Some(_) => NameInputOutput::Ok,
                None => NameInputOutput::Invalid,
            },
            NameInputEvent::Enter if self.submittable() => {
                NameInputOutput::Submit(self.name.trim().to_owned())
            }
            NameInputEvent::Enter => NameInputOutput::Invalid,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum NameInputEvent {
    Char(char),
    Backspace,
    Enter,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) enum NameInputOutput {
    Ok,
    Invalid,
    Submit(String),
}

/// Asks whether to remove the named member
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct ConfirmRemove<'a>(pub(crate) &'a str);

impl Widget for ConfirmRemove<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let question = format!("Remove {} and all their statuses?", self.0);
        let width = u16::try_from(question.chars().count())
            .unwrap_or(u16::MAX)
            .saturating_add(6);
        let text_area = modal(area, buf, BASE_STYLE, width, OUTER_HEIGHT, " Remove Team Member ");
        Text::from_iter([
            Line::styled("", BASE_STYLE),
            Line::styled(question, BASE_STYLE),
            Line::styled("", BASE_STYLE),
            Line::styled("[y] Yes    [n] No", BASE_STYLE),
        ])
        .centered()
        .render(text_area, buf);
    }
}

/// Clears a centered `width` by `height` box with a titled border and returns
/// the area inside the border & its one-cell padding
pub(crate) fn modal(
    area: Rect,
    buf: &mut Buffer,
    style: Style,
    width: u16,
    height: u16,
    title: &str,
) -> Rect {
    let [outer_area] = Layout::horizontal([width.min(area.width)])
        .flex(Flex::Center)
        .areas(area);
    let [outer_area] = Layout::vertical([height.min(area.height)])
        .flex(Flex::Center)
        .areas(outer_area);
    Clear.render(outer_area, buf);
    Block::new().style(style).render(outer_area, buf);
    let block_area = outer_area.inner(Margin::new(1, 1));
    Block::bordered()
        .title(title)
        .title_alignment(Alignment::Center)
        .render(block_area, buf);
    block_area.inner(Margin::new(1, 1))
}
