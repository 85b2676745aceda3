//! Terminal colours for the CLI.
//!
//! Respects the `NO_COLOR` env-var and the `--no-color` flag.

use colored::Colorize;

/// Initialise the colour system.
pub fn init_color(no_color_flag: bool) {
    let env_disabled = std::env::var("NO_COLOR")
        .map(|v| !v.is_empty())
        .unwrap_or(false);
    if no_color_flag || env_disabled {
        colored::control::set_override(false);
    }
}

pub mod palette {
    pub const ACCENT: (u8, u8, u8) = (0x3D, 0x7E, 0xFF);
    pub const SUCCESS: (u8, u8, u8) = (0x2F, 0xBF, 0x71);
    pub const WARN: (u8, u8, u8) = (0xFF, 0xB0, 0x20);
    pub const ERROR: (u8, u8, u8) = (0xE2, 0x3D, 0x2D);
    pub const MUTED: (u8, u8, u8) = (0x8B, 0x7F, 0x77);
}

fn paint(text: &str, rgb: (u8, u8, u8)) -> String {
    text.truecolor(rgb.0, rgb.1, rgb.2).to_string()
}

pub fn accent(text: &str) -> String {
    let (r, g, b) = palette::ACCENT;
    text.truecolor(r, g, b).bold().to_string()
}

pub fn success(text: &str) -> String {
    paint(text, palette::SUCCESS)
}

pub fn warn(text: &str) -> String {
    paint(text, palette::WARN)
}

pub fn error(text: &str) -> String {
    paint(text, palette::ERROR)
}

pub fn muted(text: &str) -> String {
    paint(text, palette::MUTED)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_when_colour_disabled() {
        colored::control::set_override(false);
        assert_eq!(warn("fallback"), "fallback");
        assert_eq!(muted("s1"), "s1");
        colored::control::unset_override();
    }
}
