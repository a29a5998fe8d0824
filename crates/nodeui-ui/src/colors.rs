use crossterm::tty::IsTty;
use ratatui::style::Color;
use std::env;
use std::io;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ThemeMode {
    Dark,
    Light,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColorLevel {
    None,
    Ansi16,
    Ansi256,
    TrueColor,
}

#[derive(Clone, Copy, Debug)]
pub struct ThemeSettings {
    pub mode: ThemeMode,
    pub color_level: ColorLevel,
}

/// Resolved colours. Monochrome themes use `Color::Reset` everywhere and
/// rely on modifiers instead.
#[derive(Clone, Copy, Debug)]
pub struct Theme {
    pub fg: Color,
    pub primary: Color,
    pub on_primary: Color,
    pub secondary: Color,
    pub on_secondary: Color,
    pub success: Color,
    pub warning: Color,
    pub error: Color,
    pub dim: Color,
    pub border: Color,
    pub highlight: Color,
    pub color_level: ColorLevel,
}

impl Default for Theme {
    fn default() -> Self {
        Self::for_mode(ThemeMode::Dark, ColorLevel::Ansi16)
    }
}

impl ThemeSettings {
    #[must_use]
    pub fn resolve() -> Self {
        let color_level = ColorLevel::detect();
        let mode = ThemeMode::resolve(color_level);
        Self { mode, color_level }
    }
}

impl ThemeMode {
    #[must_use]
    fn from_env_override() -> Option<Self> {
        env_theme_override("NODEUI_THEME").or_else(|| env_theme_override("CLITHEME"))
    }

    #[must_use]
    fn resolve(color_level: ColorLevel) -> Self {
        if let Some(mode) = Self::from_env_override() {
            return mode;
        }

        if color_level == ColorLevel::None {
            return ThemeMode::Dark;
        }

        theme_from_colorfgbg().unwrap_or(ThemeMode::Dark)
    }
}

impl ColorLevel {
    #[must_use]
    pub fn detect() -> Self {
        if env::var_os("NO_COLOR").is_some() {
            return ColorLevel::None;
        }

        if !io::stdout().is_tty() {
            return ColorLevel::None;
        }

        let colorterm = env::var("COLORTERM")
            .unwrap_or_default()
            .to_ascii_lowercase();
        if colorterm.contains("truecolor") || colorterm.contains("24bit") {
            return ColorLevel::TrueColor;
        }

        let term = env::var("TERM").unwrap_or_default();
        if term.contains("256color") {
            return ColorLevel::Ansi256;
        }

        ColorLevel::Ansi16
    }
}

struct ThemePalette {
    fg: Color,
    primary: Color,
    on_primary: Color,
    secondary: Color,
    on_secondary: Color,
    success: Color,
    warning: Color,
    error: Color,
    dim: Color,
    border: Color,
    highlight: Color,
}

impl ThemePalette {
    fn into_theme(self, color_level: ColorLevel) -> Theme {
        Theme {
            fg: self.fg,
            primary: self.primary,
            on_primary: self.on_primary,
            secondary: self.secondary,
            on_secondary: self.on_secondary,
            success: self.success,
            warning: self.warning,
            error: self.error,
            dim: self.dim,
            border: self.border,
            highlight: self.highlight,
            color_level,
        }
    }
}

const PALETTE_NONE: ThemePalette = ThemePalette {
    fg: Color::Reset,
    primary: Color::Reset,
    on_primary: Color::Reset,
    secondary: Color::Reset,
    on_secondary: Color::Reset,
    success: Color::Reset,
    warning: Color::Reset,
    error: Color::Reset,
    dim: Color::Reset,
    border: Color::Reset,
    highlight: Color::Reset,
};

const DARK_TRUECOLOR: ThemePalette = ThemePalette {
    fg: Color::Rgb(226, 232, 236),
    primary: Color::Rgb(36, 214, 176),
    on_primary: Color::Rgb(12, 20, 24),
    secondary: Color::Rgb(124, 140, 255),
    on_secondary: Color::Rgb(12, 20, 24),
    success: Color::Rgb(96, 220, 120),
    warning: Color::Rgb(250, 200, 90),
    error: Color::Rgb(250, 96, 96),
    dim: Color::Rgb(110, 122, 130),
    border: Color::Rgb(58, 78, 88),
    highlight: Color::Rgb(30, 52, 60),
};

const DARK_ANSI256: ThemePalette = ThemePalette {
    fg: Color::Indexed(254),
    primary: Color::Indexed(43),
    on_primary: Color::Indexed(233),
    secondary: Color::Indexed(105),
    on_secondary: Color::Indexed(233),
    success: Color::Indexed(77),
    warning: Color::Indexed(221),
    error: Color::Indexed(203),
    dim: Color::Indexed(244),
    border: Color::Indexed(239),
    highlight: Color::Indexed(236),
};

const DARK_ANSI16: ThemePalette = ThemePalette {
    fg: Color::White,
    primary: Color::Cyan,
    on_primary: Color::Black,
    secondary: Color::Magenta,
    on_secondary: Color::Black,
    success: Color::Green,
    warning: Color::Yellow,
    error: Color::LightRed,
    dim: Color::DarkGray,
    border: Color::DarkGray,
    highlight: Color::DarkGray,
};

const LIGHT_TRUECOLOR: ThemePalette = ThemePalette {
    fg: Color::Rgb(24, 30, 34),
    primary: Color::Rgb(0, 128, 110),
    on_primary: Color::Rgb(250, 250, 250),
    secondary: Color::Rgb(84, 80, 200),
    on_secondary: Color::Rgb(250, 250, 250),
    success: Color::Rgb(20, 130, 50),
    warning: Color::Rgb(180, 120, 0),
    error: Color::Rgb(196, 30, 30),
    dim: Color::Rgb(130, 138, 144),
    border: Color::Rgb(200, 208, 212),
    highlight: Color::Rgb(218, 236, 232),
};

const LIGHT_ANSI256: ThemePalette = ThemePalette {
    fg: Color::Indexed(235),
    primary: Color::Indexed(30),
    on_primary: Color::Indexed(231),
    secondary: Color::Indexed(61),
    on_secondary: Color::Indexed(231),
    success: Color::Indexed(28),
    warning: Color::Indexed(136),
    error: Color::Indexed(160),
    dim: Color::Indexed(245),
    border: Color::Indexed(250),
    highlight: Color::Indexed(195),
};

const LIGHT_ANSI16: ThemePalette = ThemePalette {
    fg: Color::Black,
    primary: Color::Blue,
    on_primary: Color::White,
    secondary: Color::Magenta,
    on_secondary: Color::White,
    success: Color::Green,
    warning: Color::Red,
    error: Color::LightRed,
    dim: Color::DarkGray,
    border: Color::Gray,
    highlight: Color::Gray,
};
impl Theme {
    #[must_use]
    pub fn for_mode(mode: ThemeMode, color_level: ColorLevel) -> Self {
        let palette = match (mode, color_level) {
            (ThemeMode::Dark, ColorLevel::TrueColor) => DARK_TRUECOLOR,
            (ThemeMode::Dark, ColorLevel::Ansi256) => DARK_ANSI256,
            (ThemeMode::Dark, ColorLevel::Ansi16) => DARK_ANSI16,
            (ThemeMode::Light, ColorLevel::TrueColor) => LIGHT_TRUECOLOR,
            (ThemeMode::Light, ColorLevel::Ansi256) => LIGHT_ANSI256,
            (ThemeMode::Light, ColorLevel::Ansi16) => LIGHT_ANSI16,
            (_, ColorLevel::None) => PALETTE_NONE,
        };

        palette.into_theme(color_level)
    }

    #[must_use]
    pub fn is_monochrome(&self) -> bool {
        self.color_level == ColorLevel::None
    }
}

fn env_theme_override(var: &str) -> Option<ThemeMode> {
    let value = env::var(var).ok()?;
    match value.trim().to_ascii_lowercase().as_str() {
        "dark" => Some(ThemeMode::Dark),
        "light" => Some(ThemeMode::Light),
        _ => None,
    }
}

fn theme_from_colorfgbg() -> Option<ThemeMode> {
    parse_colorfgbg(&env::var("COLORFGBG").ok()?)
}

/// `COLORFGBG` is `fg;bg` (sometimes `fg;default;bg`); low background
/// indices are dark colours.
fn parse_colorfgbg(value: &str) -> Option<ThemeMode> {
    let bg = value.split(';').next_back()?;
    let bg = bg.parse::<u8>().ok()?;
    Some(if bg <= 6 || bg == 8 {
        ThemeMode::Dark
    } else {
        ThemeMode::Light
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_colorfgbg() {
        assert_eq!(parse_colorfgbg("15;0"), Some(ThemeMode::Dark));
        assert_eq!(parse_colorfgbg("0;default;15"), Some(ThemeMode::Light));
        assert_eq!(parse_colorfgbg("garbage"), None);
    }

    #[test]
    fn test_palettes_keep_roles_apart() {
        let theme = Theme::for_mode(ThemeMode::Dark, ColorLevel::TrueColor);
        assert_eq!(theme.error, Color::Rgb(250, 96, 96));
        assert_eq!(theme.success, Color::Rgb(96, 220, 120));
        assert_eq!(theme.color_level, ColorLevel::TrueColor);

        let light = Theme::for_mode(ThemeMode::Light, ColorLevel::Ansi16);
        assert_eq!(light.primary, Color::Blue);
        assert_eq!(light.warning, Color::Red);
    }

    #[test]
    fn test_monochrome_palette() {
        let theme = Theme::for_mode(ThemeMode::Light, ColorLevel::None);
        assert!(theme.is_monochrome());
        assert_eq!(theme.primary, Color::Reset);
    }
}
