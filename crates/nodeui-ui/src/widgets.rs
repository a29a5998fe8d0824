use crate::colors::Theme;
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Flex, Layout, Rect},
    style::{Modifier, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Padding, Paragraph, Widget, Wrap},
};
use std::time::Duration;

const SPINNER_FRAMES: [char; 4] = ['◐', '◓', '◑', '◒'];

#[must_use]
pub fn spinner_char(tick: usize) -> char {
    SPINNER_FRAMES[tick % SPINNER_FRAMES.len()]
}

#[must_use]
pub fn format_duration(d: Duration) -> String {
    let secs = d.as_secs();
    let hours = secs / 3600;
    let mins = (secs % 3600) / 60;
    let secs = secs % 60;

    if hours > 0 {
        format!("{hours}:{mins:02}:{secs:02}")
    } else {
        format!("{mins:02}:{secs:02}")
    }
}

/// Microalgos as algos with six decimals.
#[must_use]
pub fn format_algos(microalgos: u64) -> String {
    format!("{}.{:06}", microalgos / 1_000_000, microalgos % 1_000_000)
}

/// First and last characters of a long identifier.
#[must_use]
pub fn shorten(value: &str, keep: usize) -> String {
    let chars: Vec<char> = value.chars().collect();
    if chars.len() <= keep * 2 + 1 {
        return value.to_string();
    }
    let head: String = chars[..keep].iter().collect();
    let tail: String = chars[chars.len() - keep..].iter().collect();
    format!("{head}…{tail}")
}

#[must_use]
pub fn panel_block<'a>(theme: &Theme, title: &'a str) -> Block<'a> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(theme.border))
        .padding(Padding::horizontal(1))
        .title(title)
        .title_style(Style::default().fg(theme.primary).bold())
}

#[must_use]
pub fn key_style(theme: &Theme) -> Style {
    if theme.is_monochrome() {
        Style::default().add_modifier(Modifier::REVERSED | Modifier::BOLD)
    } else {
        Style::default()
            .fg(theme.on_secondary)
            .bg(theme.secondary)
            .bold()
    }
}

/// One-line key legend, e.g. ` tab  section   q  quit`.
#[must_use]
pub fn help_line(theme: &Theme, entries: &[(&str, &str)]) -> Line<'static> {
    let mut spans = Vec::with_capacity(entries.len() * 3);
    for (key, desc) in entries {
        spans.push(Span::styled(format!(" {key} "), key_style(theme)));
        spans.push(Span::styled(
            format!(" {desc} "),
            Style::default().fg(theme.dim),
        ));
        spans.push(Span::raw(" "));
    }
    Line::from(spans)
}

pub struct TabHeader<'a> {
    pub labels: &'a [&'a str],
    pub active: usize,
    pub theme: &'a Theme,
}

impl Widget for TabHeader<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let mut spans = Vec::new();
        for (i, label) in self.labels.iter().enumerate() {
            let is_active = i == self.active;
            let style = if !is_active {
                Style::default().fg(self.theme.dim)
            } else if self.theme.is_monochrome() {
                Style::default().add_modifier(Modifier::REVERSED | Modifier::BOLD)
            } else {
                Style::default()
                    .bg(self.theme.primary)
                    .fg(self.theme.on_primary)
                    .bold()
            };

            if !spans.is_empty() {
                spans.push(Span::raw("  "));
            }
            spans.push(Span::styled(format!(" {label} "), style));
        }

        Paragraph::new(Line::from(spans))
            .alignment(Alignment::Center)
            .render(area, buf);
    }
}

pub struct ConfirmDialog<'a> {
    pub title: &'a str,
    pub lines: Vec<Line<'a>>,
    pub theme: &'a Theme,
}

impl Widget for ConfirmDialog<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let width = 64u16.min(area.width);
        let height = u16::try_from(self.lines.len() + 6)
            .unwrap_or(u16::MAX)
            .min(area.height);

        let [dialog_area] = Layout::vertical([Constraint::Length(height)])
            .flex(Flex::Center)
            .areas(area);
        let [dialog_area] = Layout::horizontal([Constraint::Length(width)])
            .flex(Flex::Center)
            .areas(dialog_area);

        Clear.render(dialog_area, buf);

        let block = Block::default()
            .borders(Borders::ALL)
            .padding(Padding::uniform(1))
            .border_type(BorderType::Double)
            .border_style(Style::default().fg(self.theme.warning))
            .title(format!(" {} ", self.title))
            .title_style(Style::default().fg(self.theme.primary).bold());

        let inner = block.inner(dialog_area);
        block.render(dialog_area, buf);

        let [body, buttons] =
            Layout::vertical([Constraint::Min(0), Constraint::Length(1)]).areas(inner);

        Paragraph::new(self.lines)
            .wrap(Wrap { trim: false })
            .style(Style::default().fg(self.theme.fg))
            .render(body, buf);

        Paragraph::new(Line::from(vec![
            Span::styled("[Y]", Style::default().fg(self.theme.success).bold()),
            Span::styled("es", Style::default().fg(self.theme.primary)),
            Span::raw("          "),
            Span::styled("[N]", Style::default().fg(self.theme.error).bold()),
            Span::styled("o", Style::default().fg(self.theme.primary)),
        ]))
        .alignment(Alignment::Center)
        .render(buttons, buf);
    }
}

/// Full-screen single message, used while the node is stopping.
pub struct MessageScreen<'a> {
    pub message: &'a str,
    pub detail: Option<&'a str>,
    pub theme: &'a Theme,
}

impl Widget for MessageScreen<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        Clear.render(area, buf);

        let block = Block::default()
            .borders(Borders::ALL)
            .padding(Padding::uniform(1))
            .border_style(Style::default().fg(self.theme.border));
        let inner = block.inner(area);
        block.render(area, buf);

        let mut lines = vec![Line::from(Span::styled(
            self.message,
            Style::default().fg(self.theme.warning).bold(),
        ))];
        if let Some(detail) = self.detail {
            lines.push(Line::raw(""));
            lines.push(Line::from(Span::styled(
                detail,
                Style::default().fg(self.theme.secondary),
            )));
        }

        let height = u16::try_from(lines.len()).unwrap_or(inner.height);
        let [content] = Layout::vertical([Constraint::Length(height)])
            .flex(Flex::Center)
            .areas(inner);

        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .render(content, buf);
    }
}
