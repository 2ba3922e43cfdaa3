//! Theme and styling for the TUI.

use ratatui::style::{Color, Modifier, Style};

use levelcards::difficulty::DifficultyLabel;
use levelcards::study::Level;

/// Color palette for a theme.
#[derive(Debug, Clone)]
pub struct ThemeColors {
    // Brand Colors
    pub primary: Color,
    pub accent: Color,

    // Semantic Colors
    pub success: Color,
    pub warning: Color,
    pub error: Color,

    // Background Colors
    pub bg_dark: Color,
    pub bg_highlight: Color,

    // Text Colors
    pub text: Color,
    pub text_muted: Color,
    pub text_dim: Color,

    // Answer Colors
    pub hit: Color,
    pub miss: Color,

    /// Level badges, coolest for level 1.
    pub levels: [Color; Level::COUNT],
}

/// Available theme names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThemeName {
    Default,
    KanagawaWave,
}

impl ThemeName {
    pub fn as_str(&self) -> &'static str {
        match self {
            ThemeName::Default => "default",
            ThemeName::KanagawaWave => "kanagawa-wave",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ThemeName::Default => "Default",
            ThemeName::KanagawaWave => "Kanagawa Wave",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "kanagawa-wave" | "kanagawa_wave" | "kanagawa" => ThemeName::KanagawaWave,
            _ => ThemeName::Default,
        }
    }

    pub fn next(&self) -> Self {
        match self {
            ThemeName::Default => ThemeName::KanagawaWave,
            ThemeName::KanagawaWave => ThemeName::Default,
        }
    }
}

/// Theme struct that holds colors and provides style methods.
#[derive(Debug, Clone)]
pub struct Theme {
    pub name: ThemeName,
    pub colors: ThemeColors,
}

impl Theme {
    pub fn new(name: ThemeName) -> Self {
        let colors = match name {
            ThemeName::Default => Self::default_colors(),
            ThemeName::KanagawaWave => Self::kanagawa_wave_colors(),
        };
        Self { name, colors }
    }

    pub fn from_name(name: &str) -> Self {
        Self::new(ThemeName::parse(name))
    }

    fn default_colors() -> ThemeColors {
        ThemeColors {
            primary: Color::Rgb(99, 102, 241),      // Indigo
            accent: Color::Rgb(236, 72, 153),       // Pink

            success: Color::Rgb(34, 197, 94),       // Green
            warning: Color::Rgb(250, 204, 21),      // Yellow
            error: Color::Rgb(239, 68, 68),         // Red

            bg_dark: Color::Rgb(15, 23, 42),        // Slate 900
            bg_highlight: Color::Rgb(71, 85, 105),  // Slate 600

            text: Color::Rgb(248, 250, 252),        // Slate 50
            text_muted: Color::Rgb(148, 163, 184),  // Slate 400
            text_dim: Color::Rgb(100, 116, 139),    // Slate 500

            hit: Color::Rgb(34, 197, 94),
            miss: Color::Rgb(239, 68, 68),

            levels: [
                Color::Rgb(239, 68, 68),   // Red
                Color::Rgb(249, 115, 22),  // Orange
                Color::Rgb(250, 204, 21),  // Yellow
                Color::Rgb(132, 204, 22),  // Lime
                Color::Rgb(34, 197, 94),   // Green
                Color::Rgb(20, 184, 166),  // Teal
            ],
        }
    }

    /// Kanagawa Wave theme - inspired by the famous painting and kanagawa.nvim
    fn kanagawa_wave_colors() -> ThemeColors {
        ThemeColors {
            primary: Color::Rgb(0x7E, 0x9C, 0xD8),      // crystalBlue
            accent: Color::Rgb(0xD2, 0x7E, 0x99),       // sakuraPink

            success: Color::Rgb(0x98, 0xBB, 0x6C),      // springGreen
            warning: Color::Rgb(0xFF, 0x9E, 0x3B),      // roninYellow
            error: Color::Rgb(0xE8, 0x24, 0x24),        // samuraiRed

            bg_dark: Color::Rgb(0x16, 0x16, 0x1D),      // sumiInk0
            bg_highlight: Color::Rgb(0x36, 0x36, 0x46), // sumiInk3

            text: Color::Rgb(0xDC, 0xD7, 0xBA),         // fujiWhite
            text_muted: Color::Rgb(0xC8, 0xC0, 0x93),   // oldWhite
            text_dim: Color::Rgb(0x54, 0x54, 0x6D),     // sumiInk4

            hit: Color::Rgb(0x98, 0xBB, 0x6C),
            miss: Color::Rgb(0xE8, 0x24, 0x24),

            levels: [
                Color::Rgb(0xE8, 0x24, 0x24), // samuraiRed
                Color::Rgb(0xFF, 0xA0, 0x66), // surimiOrange
                Color::Rgb(0xFF, 0x9E, 0x3B), // roninYellow
                Color::Rgb(0xE6, 0xC3, 0x84), // carpYellow
                Color::Rgb(0x98, 0xBB, 0x6C), // springGreen
                Color::Rgb(0x7A, 0xA8, 0x9F), // waveAqua2
            ],
        }
    }

    // ══════════════════════════════════════════════════════════════════════
    // Styles
    // ══════════════════════════════════════════════════════════════════════

    pub fn title(&self) -> Style {
        Style::default()
            .fg(self.colors.text)
            .add_modifier(Modifier::BOLD)
    }

    pub fn highlight(&self) -> Style {
        Style::default()
            .fg(self.colors.primary)
            .add_modifier(Modifier::BOLD)
    }

    pub fn selected(&self) -> Style {
        Style::default()
            .bg(self.colors.bg_highlight)
            .fg(self.colors.text)
    }

    pub fn muted(&self) -> Style {
        Style::default().fg(self.colors.text_muted)
    }

    pub fn question_face(&self) -> Style {
        Style::default()
            .fg(self.colors.accent)
            .add_modifier(Modifier::BOLD)
    }

    pub fn answer_face(&self) -> Style {
        Style::default()
            .fg(self.colors.success)
            .add_modifier(Modifier::BOLD)
    }

    /// Positive scores in green, negative in red.
    pub fn score(&self, score: f64) -> Style {
        let color = if score < 0.0 {
            self.colors.miss
        } else {
            self.colors.hit
        };
        Style::default().fg(color).add_modifier(Modifier::BOLD)
    }

    pub fn level(&self, level: Level) -> Style {
        Style::default().fg(self.colors.levels[level.index()])
    }

    pub fn difficulty(&self, label: DifficultyLabel) -> Style {
        let color = match label {
            DifficultyLabel::NoData => self.colors.text_dim,
            DifficultyLabel::Easy => self.colors.success,
            DifficultyLabel::Medium => self.colors.warning,
            DifficultyLabel::Hard => self.colors.error,
        };
        Style::default().fg(color).add_modifier(Modifier::BOLD)
    }

    pub fn key_hint(&self) -> Style {
        Style::default().fg(self.colors.text_dim)
    }

    pub fn key_highlight(&self) -> Style {
        Style::default()
            .fg(self.colors.accent)
            .add_modifier(Modifier::BOLD)
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::new(ThemeName::Default)
    }
}
