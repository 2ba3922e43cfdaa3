//! Custom widgets for the study TUI.

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{block::BorderType, Block, Borders, Paragraph, Widget},
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use super::theme::Theme;
use levelcards::study::{Level, Progress};

// ══════════════════════════════════════════════════════════════════════════
// Logo Widget
// ══════════════════════════════════════════════════════════════════════════

pub struct Logo;

impl Logo {
    const ART: &'static str = r#"
    ╭───────────────────────────────────────────╮
    │                                           │
    │   ▌  ▛▀ ▌ ▌ ▛▀ ▌    ▞▀ ▞▀▖ ▛▀▖ ▛▀▖ ▞▀▘    │
    │   ▌  ▛▀ ▚ ▞ ▛▀ ▌    ▌  ▙▄▌ ▙▄▘ ▌ ▌ ▝▀▖    │
    │   ▀▀ ▀▀  ▘  ▀▀ ▀▀   ▝▀ ▘ ▘ ▘ ▘ ▀▀  ▀▀     │
    │                                           │
    │   Lv1 → Lv2 → Lv3 → Lv4 → Lv5 → Lv6 → ★   │
    │                                           │
    ╰───────────────────────────────────────────╯"#;

    pub fn render_to(theme: &Theme, area: Rect, buf: &mut Buffer) {
        let lines: Vec<Line> = Self::ART
            .lines()
            .skip(1)
            .map(|line| Line::from(Span::styled(line, Style::default().fg(theme.colors.primary))))
            .collect();

        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .render(area, buf);
    }
}

// ══════════════════════════════════════════════════════════════════════════
// Score Bar Widget
// ══════════════════════════════════════════════════════════════════════════

pub struct ScoreBar<'a> {
    score: f64,
    progress: &'a Progress,
    round: usize,
    theme: &'a Theme,
}

impl<'a> ScoreBar<'a> {
    pub fn new(score: f64, progress: &'a Progress, round: usize, theme: &'a Theme) -> Self {
        Self {
            score,
            progress,
            round,
            theme,
        }
    }
}

impl Widget for ScoreBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let chunks = Layout::horizontal([
            Constraint::Percentage(33),
            Constraint::Percentage(34),
            Constraint::Percentage(33),
        ])
        .split(area);

        let muted = self.theme.muted();
        let cells = [
            Line::from(vec![
                Span::styled("Score: ", muted),
                Span::styled(self.score.to_string(), self.theme.score(self.score)),
            ]),
            Line::from(vec![
                Span::styled("Mastered: ", muted),
                Span::styled(
                    format!("{}/{}", self.progress.mastered, self.progress.total),
                    self.theme.highlight(),
                ),
            ]),
            Line::from(vec![
                Span::styled(format!("Round {}: ", self.round), muted),
                Span::styled(
                    format!(
                        "card {} of {}",
                        self.progress.round_position, self.progress.round_length
                    ),
                    Style::default().fg(self.theme.colors.text),
                ),
            ]),
        ];

        for (cell, chunk) in cells.into_iter().zip(chunks.iter()) {
            Paragraph::new(cell)
                .alignment(Alignment::Center)
                .render(*chunk, buf);
        }
    }
}

// ══════════════════════════════════════════════════════════════════════════
// Level Bar Widget
// ══════════════════════════════════════════════════════════════════════════

/// Pending cards per level, with the current card's level outlined.
pub struct LevelBar<'a> {
    progress: &'a Progress,
    current: Option<Level>,
    theme: &'a Theme,
}

impl<'a> LevelBar<'a> {
    pub fn new(progress: &'a Progress, current: Option<Level>, theme: &'a Theme) -> Self {
        Self {
            progress,
            current,
            theme,
        }
    }
}

impl Widget for LevelBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let mut spans = Vec::with_capacity(Level::COUNT * 2);
        for level in Level::all() {
            let mut style = self.theme.level(level);
            let label = if Some(level) == self.current {
                style = style.add_modifier(Modifier::BOLD | Modifier::REVERSED);
                format!("[Lv{}: {}]", level, self.progress.count_at(level))
            } else {
                format!(" Lv{}: {} ", level, self.progress.count_at(level))
            };
            spans.push(Span::styled(label, style));
            spans.push(Span::raw(" "));
        }

        Paragraph::new(Line::from(spans))
            .alignment(Alignment::Center)
            .render(area, buf);
    }
}

// ══════════════════════════════════════════════════════════════════════════
// Flashcard Widget
// ══════════════════════════════════════════════════════════════════════════

pub struct FlashcardWidget<'a> {
    content: &'a str,
    /// Shown on the question face only.
    level: Option<Level>,
    theme: &'a Theme,
}

impl<'a> FlashcardWidget<'a> {
    pub fn question(content: &'a str, level: Level, theme: &'a Theme) -> Self {
        Self {
            content,
            level: Some(level),
            theme,
        }
    }

    pub fn answer(content: &'a str, theme: &'a Theme) -> Self {
        Self {
            content,
            level: None,
            theme,
        }
    }
}

impl Widget for FlashcardWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let (label, label_style, border_color) = match self.level {
            Some(level) => (
                format!("QUESTION · LEVEL {}", level),
                self.theme.question_face(),
                self.theme.colors.accent,
            ),
            None => (
                "ANSWER".to_string(),
                self.theme.answer_face(),
                self.theme.colors.success,
            ),
        };

        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(border_color))
            .title(Line::from(vec![
                Span::raw(" "),
                Span::styled(label, label_style),
                Span::raw(" "),
            ]))
            .title_alignment(Alignment::Center);

        let inner = block.inner(area);
        block.render(area, buf);

        let width = inner.width.saturating_sub(4).max(1) as usize;
        let lines: Vec<Line> = textwrap::wrap(self.content, width)
            .into_iter()
            .map(|l| Line::from(l.into_owned()))
            .collect();

        let vertical_padding = inner.height.saturating_sub(lines.len() as u16) / 2;
        let content_area = Rect {
            x: inner.x + 2,
            y: inner.y + vertical_padding,
            width: inner.width.saturating_sub(4),
            height: inner.height.saturating_sub(vertical_padding),
        };

        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .style(Style::default().fg(self.theme.colors.text))
            .render(content_area, buf);
    }
}

// ══════════════════════════════════════════════════════════════════════════
// Answer Buttons Widget
// ══════════════════════════════════════════════════════════════════════════

/// Hit/miss buttons, greyed out until the card is flipped.
pub struct AnswerButtons<'a> {
    enabled: bool,
    theme: &'a Theme,
}

impl<'a> AnswerButtons<'a> {
    pub fn new(enabled: bool, theme: &'a Theme) -> Self {
        Self { enabled, theme }
    }
}

impl Widget for AnswerButtons<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let chunks = Layout::horizontal([
            Constraint::Percentage(20),
            Constraint::Percentage(30),
            Constraint::Percentage(30),
            Constraint::Percentage(20),
        ])
        .split(area);

        let buttons = [
            (chunks[1], "y / →", "✓ Hit", "+1", self.theme.colors.hit),
            (chunks[2], "n / ←", "✗ Miss", "-1.5", self.theme.colors.miss),
        ];

        for (rect, key, name, delta, color) in buttons {
            let color = if self.enabled {
                color
            } else {
                self.theme.colors.text_dim
            };

            let button = Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(color));
            let inner = button.inner(rect);
            button.render(rect, buf);

            let mut lines = vec![
                Line::from(Span::styled(
                    key,
                    Style::default().fg(color).add_modifier(Modifier::BOLD),
                )),
                Line::from(Span::styled(name, Style::default().fg(color))),
            ];
            if self.enabled {
                lines.push(Line::from(Span::styled(delta, self.theme.muted())));
            }

            Paragraph::new(lines)
                .alignment(Alignment::Center)
                .render(inner, buf);
        }
    }
}

// ══════════════════════════════════════════════════════════════════════════
// Key Hints Widget
// ══════════════════════════════════════════════════════════════════════════

pub struct KeyHints<'a> {
    hints: &'a [(&'a str, &'a str)],
    theme: &'a Theme,
}

impl<'a> KeyHints<'a> {
    pub fn new(hints: &'a [(&'a str, &'a str)], theme: &'a Theme) -> Self {
        Self { hints, theme }
    }
}

impl Widget for KeyHints<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let spans: Vec<Span> = self
            .hints
            .iter()
            .flat_map(|(key, desc)| {
                [
                    Span::styled(*key, self.theme.key_highlight()),
                    Span::styled(format!(" {} ", desc), self.theme.key_hint()),
                    Span::styled("│ ", Style::default().fg(self.theme.colors.text_dim)),
                ]
            })
            .collect();

        Paragraph::new(Line::from(spans))
            .alignment(Alignment::Center)
            .render(area, buf);
    }
}

// ══════════════════════════════════════════════════════════════════════════
// Finished Screen Widget
// ══════════════════════════════════════════════════════════════════════════

pub struct FinishedScreen<'a> {
    deck_name: &'a str,
    score: f64,
    mastered: usize,
    player_name: &'a str,
    theme: &'a Theme,
}

impl<'a> FinishedScreen<'a> {
    pub fn new(
        deck_name: &'a str,
        score: f64,
        mastered: usize,
        player_name: &'a str,
        theme: &'a Theme,
    ) -> Self {
        Self {
            deck_name,
            score,
            mastered,
            player_name,
            theme,
        }
    }
}

impl Widget for FinishedScreen<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(self.theme.colors.success))
            .title(Line::from(vec![
                Span::raw(" "),
                Span::styled("DECK COMPLETE", self.theme.answer_face()),
                Span::raw(" "),
            ]))
            .title_alignment(Alignment::Center);

        let inner = block.inner(area);
        block.render(area, buf);

        let input_width = inner.width.saturating_sub(8) as usize;
        let name = tail_to_width(self.player_name, input_width.saturating_sub(1));

        let text = vec![
            Line::from(""),
            Line::from(Span::styled(self.deck_name, self.theme.title())),
            Line::from(""),
            Line::from(vec![
                Span::styled("Final score: ", self.theme.muted()),
                Span::styled(self.score.to_string(), self.theme.score(self.score)),
            ]),
            Line::from(vec![
                Span::styled(self.mastered.to_string(), self.theme.highlight()),
                Span::styled(" cards mastered", self.theme.muted()),
            ]),
            Line::from(""),
            Line::from(Span::styled("Your name", self.theme.muted())),
            Line::from(vec![
                Span::styled(name, Style::default().fg(self.theme.colors.text)),
                Span::styled("▏", self.theme.key_highlight()),
            ]),
            Line::from(""),
            Line::from(vec![
                Span::styled("Enter", self.theme.key_highlight()),
                Span::styled(" save game  ", self.theme.key_hint()),
                Span::styled("Esc", self.theme.key_highlight()),
                Span::styled(" leave without saving", self.theme.key_hint()),
            ]),
        ];

        Paragraph::new(text)
            .alignment(Alignment::Center)
            .render(inner, buf);
    }
}

/// Longest suffix of `s` that fits in `max_width` terminal columns.
pub(super) fn tail_to_width(s: &str, max_width: usize) -> &str {
    if s.width() <= max_width {
        return s;
    }
    let mut width = 0;
    let mut start = s.len();
    for (i, c) in s.char_indices().rev() {
        width += c.width().unwrap_or(0);
        if width > max_width {
            break;
        }
        start = i;
    }
    &s[start..]
}
