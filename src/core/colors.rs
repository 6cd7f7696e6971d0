//! Style value compiler.
//!
//! Turns the loosely typed style values found in configuration into the
//! escape sequences the renderer concatenates. Every value goes through
//! [`compile_color`] or [`compile_flag`] exactly once, at startup, so the
//! renderer only ever deals with ready-to-print strings.
//!
//! # Accepted color values
//! - a literal escape sequence (real `ESC`, or the textual `\e`, `\033`, `\x1b`)
//! - `#RRGGBB`
//! - three integers in `0..=255`, separated by commas and/or spaces
//! - a legacy SGR code in `30..=107`
//! - a color name understood by `colored` (`red`, `bright black`, ...)

use crate::core::error::{BriefError, Result};
use colored::Color;

pub const ESC: char = '\x1b';
pub const RESET: &str = "\x1b[0m";
pub const BOLD: &str = "\x1b[1m";
pub const ITALIC: &str = "\x1b[3m";
pub const UNDERLINE: &str = "\x1b[4m";

/// OSC 8 hyperlink template, `{url}` is replaced by the link target
pub const HYPERLINK: &str = "\x1b]8;;{url}\x1b\\";

const TEXTUAL_ESCAPES: [&str; 4] = ["\\x1b", "\\033", "\\e", "\\E"];

/// Which layer a color applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorLayer {
    Foreground,
    Background,
}

impl ColorLayer {
    fn truecolor_selector(&self) -> u8 {
        match self {
            ColorLayer::Foreground => 38,
            ColorLayer::Background => 48,
        }
    }
}

/// Fixed-escape text attributes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StyleFlag {
    Bold,
    Underline,
    Italic,
}

/// Values that switch an attribute off entirely
pub fn is_disabled(value: &str) -> bool {
    let value = value.trim();
    value.is_empty() || value == "0" || value.eq_ignore_ascii_case("false")
}

/// Translate textual escape spellings into a real `ESC`.
/// Returns `None` when the value is not an escape sequence at all.
pub fn literal_escape(value: &str) -> Option<String> {
    if value.starts_with(ESC) {
        return Some(value.to_string());
    }
    if !TEXTUAL_ESCAPES
        .iter()
        .any(|spelling| value.starts_with(spelling))
    {
        return None;
    }
    let mut escaped = value.to_string();
    for spelling in TEXTUAL_ESCAPES {
        escaped = escaped.replace(spelling, "\x1b");
    }
    Some(escaped)
}

/// Compile a color value for `layer`. `key` names the configuration entry in
/// the error when the value cannot be understood.
pub fn compile_color(key: &str, value: &str, layer: ColorLayer) -> Result<String> {
    let trimmed = value.trim();

    if let Some(escape) = literal_escape(trimmed) {
        return Ok(escape);
    }

    if let Some(hex) = trimmed.strip_prefix('#') {
        return parse_hex(hex)
            .map(|rgb| truecolor(rgb, layer))
            .ok_or_else(|| BriefError::invalid_style_value(key, value));
    }

    if let Ok(code) = trimmed.parse::<u16>() {
        if (30..=107).contains(&code) {
            return Ok(format!("{ESC}[{code}m"));
        }
        return Err(BriefError::invalid_style_value(key, value));
    }

    if let Some(rgb) = parse_triple(trimmed) {
        return Ok(truecolor(rgb, layer));
    }

    if let Ok(color) = trimmed.parse::<Color>() {
        let code = match layer {
            ColorLayer::Foreground => color.to_fg_str(),
            ColorLayer::Background => color.to_bg_str(),
        };
        return Ok(format!("{ESC}[{code}m"));
    }

    Err(BriefError::invalid_style_value(key, value))
}

/// Flags compile to their fixed escape whatever the literal value was
pub fn compile_flag(flag: StyleFlag) -> String {
    match flag {
        StyleFlag::Bold => BOLD,
        StyleFlag::Underline => UNDERLINE,
        StyleFlag::Italic => ITALIC,
    }
    .to_string()
}

fn truecolor((r, g, b): (u8, u8, u8), layer: ColorLayer) -> String {
    format!("{ESC}[{};2;{r};{g};{b}m", layer.truecolor_selector())
}

fn parse_hex(hex: &str) -> Option<(u8, u8, u8)> {
    if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&hex[range], 16).ok();
    Some((channel(0..2)?, channel(2..4)?, channel(4..6)?))
}

fn parse_triple(value: &str) -> Option<(u8, u8, u8)> {
    let parts: Vec<&str> = value
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|part| !part.is_empty())
        .collect();
    match parts.as_slice() {
        [r, g, b] => Some((r.parse().ok()?, g.parse().ok()?, b.parse().ok()?)),
        _ => None,
    }
}
