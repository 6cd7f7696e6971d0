//! Indicator configuration resolver.
//!
//! Merges the built-in indicator defaults with `brief.indicator.*` overrides
//! into one [`IndicatorTable`], compiled once and read-only afterwards.
//!
//! An override whose value is empty, `0` or `false` removes the attribute: it
//! does not fall back to the built-in default.

use crate::core::colors::{self, ColorLayer, StyleFlag};
use crate::core::error::{BriefError, Result};
use crate::core::status::{KeyOrder, StatusKey};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Built-in indicators as `(key, attribute, value)`, compiled like overrides
const DEFAULT_INDICATORS: &[(&str, &str, &str)] = &[
    ("checked-out", "bold", "true"),
    ("checked-out", "prefix", "*"),
    ("checked-out", "prefix-color", "green"),
    ("checked-out", "plain-prefix", "*"),
    ("merged", "bg", "#3a3a3a"),
    ("merged", "plain-suffix", "[merged]"),
    ("non-remote-associated", "italic", "true"),
    ("non-remote-associated", "plain-suffix", "[local]"),
    ("remote-ahead", "prefix", "↑"),
    ("remote-ahead", "prefix-color", "yellow"),
    ("remote-ahead", "plain-prefix", ">"),
    ("remote-behind", "prefix", "↓"),
    ("remote-behind", "prefix-color", "red"),
    ("remote-behind", "plain-prefix", "<"),
    ("remote-mixed", "prefix", "↕"),
    ("remote-mixed", "prefix-color", "magenta"),
    ("remote-mixed", "plain-prefix", "x"),
    ("pr-open", "suffix", "PR"),
    ("pr-open", "suffix-color", "green"),
    ("pr-open", "plain-suffix", "[pr]"),
    ("pr-draft", "suffix", "draft"),
    ("pr-draft", "suffix-color", "bright black"),
    ("pr-draft", "plain-suffix", "[draft]"),
    ("pr-merged", "suffix", "PR merged"),
    ("pr-merged", "suffix-color", "magenta"),
    ("pr-merged", "plain-suffix", "[pr-merged]"),
    ("pr-closed", "suffix", "PR closed"),
    ("pr-closed", "suffix-color", "red"),
    ("pr-closed", "plain-suffix", "[pr-closed]"),
    ("pr-review-commented", "suffix", "commented"),
    ("pr-review-commented", "suffix-color", "yellow"),
    ("pr-review-commented", "plain-suffix", "[commented]"),
    ("pr-review-changes-requested", "suffix", "changes requested"),
    ("pr-review-changes-requested", "suffix-color", "red"),
    ("pr-review-changes-requested", "plain-suffix", "[changes-requested]"),
    ("pr-review-approved", "suffix", "approved"),
    ("pr-review-approved", "suffix-color", "green"),
    ("pr-review-approved", "plain-suffix", "[approved]"),
    ("ci-pending", "suffix", "…"),
    ("ci-pending", "suffix-color", "yellow"),
    ("ci-pending", "plain-suffix", "[ci:pending]"),
    ("ci-fail", "suffix", "✗"),
    ("ci-fail", "suffix-color", "red"),
    ("ci-fail", "plain-suffix", "[ci:fail]"),
    ("ci-pass", "suffix", "✓"),
    ("ci-pass", "suffix-color", "green"),
    ("ci-pass", "plain-suffix", "[ci:pass]"),
];

/// Recognized per-status attributes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attribute {
    Fg,
    Bg,
    Bold,
    Underline,
    Italic,
    Prefix,
    PrefixColor,
    Suffix,
    SuffixColor,
    PlainPrefix,
    PlainSuffix,
}

impl Attribute {
    pub const ALL: [Attribute; 11] = [
        Attribute::Fg,
        Attribute::Bg,
        Attribute::Bold,
        Attribute::Underline,
        Attribute::Italic,
        Attribute::Prefix,
        Attribute::PrefixColor,
        Attribute::Suffix,
        Attribute::SuffixColor,
        Attribute::PlainPrefix,
        Attribute::PlainSuffix,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Attribute::Fg => "fg",
            Attribute::Bg => "bg",
            Attribute::Bold => "bold",
            Attribute::Underline => "underline",
            Attribute::Italic => "italic",
            Attribute::Prefix => "prefix",
            Attribute::PrefixColor => "prefix-color",
            Attribute::Suffix => "suffix",
            Attribute::SuffixColor => "suffix-color",
            Attribute::PlainPrefix => "plain-prefix",
            Attribute::PlainSuffix => "plain-suffix",
        }
    }

    /// Compile a raw value for this attribute; `None` means "no effect"
    fn compile(&self, config_key: &str, value: &str) -> Result<Option<String>> {
        if colors::is_disabled(value) {
            return Ok(None);
        }
        let compiled = match self {
            Attribute::Fg | Attribute::PrefixColor | Attribute::SuffixColor => {
                colors::compile_color(config_key, value, ColorLayer::Foreground)?
            }
            Attribute::Bg => colors::compile_color(config_key, value, ColorLayer::Background)?,
            Attribute::Bold => colors::compile_flag(StyleFlag::Bold),
            Attribute::Underline => colors::compile_flag(StyleFlag::Underline),
            Attribute::Italic => colors::compile_flag(StyleFlag::Italic),
            Attribute::Prefix | Attribute::Suffix | Attribute::PlainPrefix | Attribute::PlainSuffix => {
                value.to_string()
            }
        };
        Ok(Some(compiled))
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Attribute {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.to_ascii_lowercase();
        Attribute::ALL
            .iter()
            .copied()
            .find(|attr| attr.as_str() == s)
            .ok_or(())
    }
}

/// Compiled attributes of one status key
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndicatorSpec {
    pub fg: Option<String>,
    pub bg: Option<String>,
    pub bold: Option<String>,
    pub underline: Option<String>,
    pub italic: Option<String>,
    pub prefix: Option<String>,
    pub prefix_color: Option<String>,
    pub suffix: Option<String>,
    pub suffix_color: Option<String>,
    pub plain_prefix: Option<String>,
    pub plain_suffix: Option<String>,
}

impl IndicatorSpec {
    fn slot_mut(&mut self, attr: Attribute) -> &mut Option<String> {
        match attr {
            Attribute::Fg => &mut self.fg,
            Attribute::Bg => &mut self.bg,
            Attribute::Bold => &mut self.bold,
            Attribute::Underline => &mut self.underline,
            Attribute::Italic => &mut self.italic,
            Attribute::Prefix => &mut self.prefix,
            Attribute::PrefixColor => &mut self.prefix_color,
            Attribute::Suffix => &mut self.suffix,
            Attribute::SuffixColor => &mut self.suffix_color,
            Attribute::PlainPrefix => &mut self.plain_prefix,
            Attribute::PlainSuffix => &mut self.plain_suffix,
        }
    }

    /// Style escapes that lead the whole line, in application order
    pub fn line_styles(&self) -> impl Iterator<Item = &str> {
        [&self.fg, &self.bg, &self.bold, &self.underline, &self.italic]
            .into_iter()
            .filter_map(|slot| slot.as_deref())
    }

    pub fn is_empty(&self) -> bool {
        *self == IndicatorSpec::default()
    }
}

/// One `brief.indicator.<target>` configuration entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndicatorOverride {
    /// Full configuration key, used in diagnostics
    pub config_key: String,
    /// `<status-key>.<attribute>`, or a bare `reset` / `hyperlink`
    pub target: String,
    pub value: String,
}

impl IndicatorOverride {
    pub fn new(
        config_key: impl Into<String>,
        target: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            config_key: config_key.into(),
            target: target.into(),
            value: value.into(),
        }
    }
}

/// Fully resolved indicator table for the active key order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndicatorTable {
    specs: BTreeMap<StatusKey, IndicatorSpec>,
    reset: String,
    hyperlink: String,
}

impl IndicatorTable {
    /// Built-in defaults only
    pub fn defaults(order: &KeyOrder) -> Result<Self> {
        Self::resolve(order, &[])
    }

    /// Apply `overrides` on top of the built-in defaults. Keys outside
    /// `order` are dropped; unknown keys and attributes are ignored with a
    /// warning; malformed values are fatal.
    pub fn resolve(order: &KeyOrder, overrides: &[IndicatorOverride]) -> Result<Self> {
        let mut table = Self {
            specs: order.iter().map(|key| (key, IndicatorSpec::default())).collect(),
            reset: colors::RESET.to_string(),
            hyperlink: colors::HYPERLINK.to_string(),
        };

        for (key, attr, value) in DEFAULT_INDICATORS {
            let target = format!("{key}.{attr}");
            table.apply(&IndicatorOverride::new(
                format!("default indicator {target}"),
                target,
                *value,
            ))?;
        }

        for entry in overrides {
            table.apply(entry)?;
        }

        Ok(table)
    }

    fn apply(&mut self, entry: &IndicatorOverride) -> Result<()> {
        match entry.target.as_str() {
            "reset" => {
                self.reset = compile_escape(entry)?;
                return Ok(());
            }
            "hyperlink" => {
                self.hyperlink = compile_escape(entry)?;
                return Ok(());
            }
            _ => {}
        }

        let Some((key_name, attr_name)) = entry.target.rsplit_once('.') else {
            log::warn!("Ignoring indicator setting '{}'", entry.config_key);
            return Ok(());
        };
        let Ok(key) = key_name.parse::<StatusKey>() else {
            log::warn!(
                "Ignoring '{}': unknown status '{key_name}'",
                entry.config_key
            );
            return Ok(());
        };
        let Ok(attr) = attr_name.parse::<Attribute>() else {
            log::warn!(
                "Ignoring '{}': unknown attribute '{attr_name}'",
                entry.config_key
            );
            return Ok(());
        };
        let Some(spec) = self.specs.get_mut(&key) else {
            log::debug!("Skipping '{}': status not active", entry.config_key);
            return Ok(());
        };

        *spec.slot_mut(attr) = attr.compile(&entry.config_key, &entry.value)?;
        Ok(())
    }

    pub fn spec(&self, key: StatusKey) -> Option<&IndicatorSpec> {
        self.specs.get(&key)
    }

    /// Specs in catalogue order
    pub fn iter(&self) -> impl Iterator<Item = (StatusKey, &IndicatorSpec)> {
        self.specs.iter().map(|(key, spec)| (*key, spec))
    }

    pub fn reset(&self) -> &str {
        &self.reset
    }

    pub fn hyperlink_open(&self, url: &str) -> String {
        self.hyperlink.replace("{url}", url)
    }

    pub fn hyperlink_close(&self) -> String {
        self.hyperlink.replace("{url}", "")
    }

    pub fn hyperlinks_enabled(&self) -> bool {
        !self.hyperlink.is_empty()
    }
}

fn compile_escape(entry: &IndicatorOverride) -> Result<String> {
    if colors::is_disabled(&entry.value) {
        return Ok(String::new());
    }
    colors::literal_escape(entry.value.trim())
        .ok_or_else(|| BriefError::invalid_style_value(&entry.config_key, &entry.value))
}
