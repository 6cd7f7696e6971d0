//! Report rendering.
//!
//! Text mode produces one line per visible branch, oldest first:
//!
//! ```text
//! [style]date SEP [prefixes ][link]name[/link][padding][reset] [suffixes]
//! ```
//!
//! With color, the leading style is a fold of every held status's line
//! styles in catalogue order, so later keys win over earlier ones. Without
//! color only the `plain-prefix` / `plain-suffix` texts are used. Either way
//! each key that defines a prefix owns a fixed-width column, blank when the
//! branch does not hold it.
//!
//! Structured mode serializes timestamps and the status matrix as JSON.

use crate::core::error::{BriefError, Result};
use crate::core::indicators::IndicatorTable;
use crate::core::state::{Branch, BranchReport};
use crate::core::status::{KeyOrder, StatusKey, StatusMatrix};
use chrono::format::{Item, StrftimeItems};
use chrono::{Local, TimeZone};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Write;

pub const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Separator after the date; wider than one space so it cannot be taken
/// for a tab by column tools
const COLOR_SEPARATOR: &str = "  ";
const PLAIN_SEPARATOR: &str = "\t";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    pub color: bool,
    pub reverse: bool,
    pub hyperlinks: bool,
    pub date_format: String,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            color: false,
            reverse: false,
            hyperlinks: false,
            date_format: DEFAULT_DATE_FORMAT.to_string(),
        }
    }
}

/// Reject strftime strings chrono cannot format
pub fn validate_date_format(format: &str) -> Result<()> {
    if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
        return Err(BriefError::invalid_date_format(format));
    }
    Ok(())
}

#[derive(Serialize)]
struct StructuredReport<'a> {
    branches: BTreeMap<&'a str, i64>,
    statuses: &'a StatusMatrix,
}

/// Serialize effective timestamps and the full status matrix
pub fn render_json(report: &BranchReport) -> Result<String> {
    let structured = StructuredReport {
        branches: report
            .visible()
            .map(|branch| (branch.name.as_str(), branch.effective_timestamp()))
            .collect(),
        statuses: &report.matrix,
    };
    Ok(serde_json::to_string_pretty(&structured)?)
}

/// Branches in display order
pub fn sorted_branches<'a>(report: &'a BranchReport, reverse: bool) -> Vec<&'a Branch> {
    let mut branches: Vec<&Branch> = report.visible().collect();
    if reverse {
        branches.sort_by(|a, b| b.effective_timestamp().cmp(&a.effective_timestamp()));
    } else {
        branches.sort_by_key(|branch| branch.effective_timestamp());
    }
    branches
}

pub fn render_text(
    report: &BranchReport,
    order: &KeyOrder,
    table: &IndicatorTable,
    options: &RenderOptions,
) -> String {
    let branches = sorted_branches(report, options.reverse);
    let width = branches
        .iter()
        .map(|branch| branch.name.chars().count())
        .max()
        .unwrap_or(0);

    let mut output = String::new();
    for branch in branches {
        let held: Vec<StatusKey> = order
            .iter()
            .filter(|key| report.matrix.holds(*key, &branch.name))
            .collect();
        let line = if options.color {
            color_line(branch, &held, report, table, options, width)
        } else {
            plain_line(branch, &held, table, options, width)
        };
        output.push_str(&line);
        output.push('\n');
    }
    output
}

fn format_date(timestamp: i64, format: &str) -> String {
    match Local.timestamp_opt(timestamp, 0).single() {
        Some(date) => date.format(format).to_string(),
        None => timestamp.to_string(),
    }
}

fn blank(text: &str) -> String {
    " ".repeat(text.chars().count())
}

fn padding(name: &str, width: usize) -> String {
    " ".repeat(width.saturating_sub(name.chars().count()))
}

fn color_line(
    branch: &Branch,
    held: &[StatusKey],
    report: &BranchReport,
    table: &IndicatorTable,
    options: &RenderOptions,
    width: usize,
) -> String {
    let reset = table.reset();
    let lead = held
        .iter()
        .filter_map(|key| table.spec(*key))
        .fold(String::new(), |mut lead, spec| {
            lead.extend(spec.line_styles());
            lead
        });

    let mut line = String::new();
    line.push_str(&lead);
    line.push_str(&format_date(branch.effective_timestamp(), &options.date_format));
    line.push_str(COLOR_SEPARATOR);

    let mut columns = 0;
    for (key, spec) in table.iter() {
        let Some(prefix) = &spec.prefix else {
            continue;
        };
        columns += 1;
        if !held.contains(&key) {
            line.push_str(&blank(prefix));
            continue;
        }
        match &spec.prefix_color {
            Some(color) => {
                let _ = write!(line, "{color}{prefix}{reset}{lead}");
            }
            None => line.push_str(prefix),
        }
    }
    if columns > 0 {
        line.push(' ');
    }

    match report.urls.get(&branch.name) {
        Some(url) if options.hyperlinks && table.hyperlinks_enabled() => {
            let _ = write!(
                line,
                "{}{}{}",
                table.hyperlink_open(url),
                branch.name,
                table.hyperlink_close()
            );
        }
        _ => line.push_str(&branch.name),
    }
    line.push_str(&padding(&branch.name, width));
    line.push_str(reset);

    let suffixes: Vec<String> = held
        .iter()
        .filter_map(|key| table.spec(*key))
        .filter_map(|spec| {
            let suffix = spec.suffix.as_deref()?;
            Some(match &spec.suffix_color {
                Some(color) => format!("{color}{suffix}{reset}"),
                None => suffix.to_string(),
            })
        })
        .collect();
    if !suffixes.is_empty() {
        line.push(' ');
        line.push_str(&suffixes.join(" "));
    }
    line
}

fn plain_line(
    branch: &Branch,
    held: &[StatusKey],
    table: &IndicatorTable,
    options: &RenderOptions,
    width: usize,
) -> String {
    let mut line = format_date(branch.effective_timestamp(), &options.date_format);
    line.push_str(PLAIN_SEPARATOR);

    let mut columns = 0;
    for (key, spec) in table.iter() {
        let Some(prefix) = &spec.plain_prefix else {
            continue;
        };
        columns += 1;
        if held.contains(&key) {
            line.push_str(prefix);
        } else {
            line.push_str(&blank(prefix));
        }
    }
    if columns > 0 {
        line.push(' ');
    }

    line.push_str(&branch.name);
    line.push_str(&padding(&branch.name, width));

    let suffixes: Vec<&str> = held
        .iter()
        .filter_map(|key| table.spec(*key))
        .filter_map(|spec| spec.plain_suffix.as_deref())
        .collect();
    if !suffixes.is_empty() {
        line.push(' ');
        line.push_str(&suffixes.join(" "));
    }
    line
}
