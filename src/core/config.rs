//! `brief.*` settings read from git configuration.
//!
//! Scalar options may be set at any scope and the last value read wins, the
//! way git itself resolves them. Ignore lists are only honoured from the
//! repository's own config file, since branch names mean nothing across
//! repositories.

use crate::core::error::{BriefError, Result};
use crate::core::git::GitRepo;
use crate::core::ignore::{IgnoreRules, IgnoreScope};
use crate::core::indicators::IndicatorOverride;
use crate::core::render::{validate_date_format, DEFAULT_DATE_FORMAT};
use crate::core::status::StatusKey;

const PREFIX: &str = "brief.";
const INDICATOR_PREFIX: &str = "brief.indicator.";
const IGNORE_PREFIX: &str = "brief.ignore.";

/// Tri-state switch for color and pager
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Toggle {
    #[default]
    Auto,
    Always,
    Never,
}

impl Toggle {
    /// Accepts `auto` / `always` / `never` or any git boolean
    pub fn parse(key: &str, value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(Toggle::Auto),
            "always" => Ok(Toggle::Always),
            "never" => Ok(Toggle::Never),
            _ => parse_bool(key, value).map(|on| if on { Toggle::Always } else { Toggle::Never }),
        }
    }

    pub fn resolve(self, is_terminal: bool) -> bool {
        match self {
            Toggle::Auto => is_terminal,
            Toggle::Always => true,
            Toggle::Never => false,
        }
    }
}

/// Git boolean spelling: `true`/`yes`/`on`/`1` and `false`/`no`/`off`/`0`
pub fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" | "" => Ok(false),
        _ => Err(BriefError::invalid_option_value(key, value)),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub date_format: String,
    pub color: Toggle,
    pub pager: Toggle,
    pub reverse: bool,
    pub pull_requests: bool,
    pub hyperlinks: bool,
    pub indicators: Vec<IndicatorOverride>,
    pub ignore: IgnoreRules,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            date_format: DEFAULT_DATE_FORMAT.to_string(),
            color: Toggle::Auto,
            pager: Toggle::Auto,
            reverse: false,
            pull_requests: false,
            hyperlinks: false,
            indicators: Vec::new(),
            ignore: IgnoreRules::new(),
        }
    }
}

impl Settings {
    pub fn load(repo: &GitRepo) -> Result<Self> {
        let pattern = format!("^{}", regex::escape(PREFIX));
        let all = repo.config_entries(&pattern, false)?;
        let local = repo.config_entries(&pattern, true)?;
        log::debug!("Read {} brief settings ({} local)", all.len(), local.len());
        Self::from_entries(&all, &local)
    }

    /// Build settings from `(name, value)` pairs. `all` holds entries of
    /// every scope in read order, `local` the repository-local subset.
    pub fn from_entries(all: &[(String, String)], local: &[(String, String)]) -> Result<Self> {
        let mut settings = Settings::default();

        for (name, value) in all {
            // git reports section and variable names in lower case
            let name = name.as_str();
            if let Some(target) = name.strip_prefix(INDICATOR_PREFIX) {
                settings
                    .indicators
                    .push(IndicatorOverride::new(name, target, value.as_str()));
                continue;
            }
            if name.starts_with(IGNORE_PREFIX) {
                continue;
            }
            match name {
                "brief.date-format" => settings.date_format = value.clone(),
                "brief.color" => settings.color = Toggle::parse(name, value)?,
                "brief.pager" => settings.pager = Toggle::parse(name, value)?,
                "brief.reverse" => settings.reverse = parse_bool(name, value)?,
                "brief.pr" => settings.pull_requests = parse_bool(name, value)?,
                "brief.link" => settings.hyperlinks = parse_bool(name, value)?,
                _ => log::warn!("Ignoring unknown setting '{name}'"),
            }
        }

        for (name, value) in local {
            let Some(scope_name) = name.strip_prefix(IGNORE_PREFIX) else {
                continue;
            };
            let scope = if scope_name == "all" {
                IgnoreScope::All
            } else if let Ok(key) = scope_name.parse::<StatusKey>() {
                IgnoreScope::Key(key)
            } else {
                log::warn!("Ignoring '{name}': unknown status '{scope_name}'");
                continue;
            };
            settings.ignore.add(scope, value.split_whitespace());
        }

        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        validate_date_format(&self.date_format)
    }
}
