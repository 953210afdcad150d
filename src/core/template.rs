//! `{placeholder}` templates for rendered Markdown.
//!
//! Every document has a built-in default for each template. A template
//! directory may override any of them file by file.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;
use tokio::fs;
use tracing::debug;

use crate::domain::DEFAULT_TIMEZONE;

/// Default strftime format for dates in documents ("Tuesday 2 January 2024")
pub const DEFAULT_DATE_FORMAT: &str = "%A %e %B %Y";

/// How dates are shown in rendered documents
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateStyle {
    /// Civil timezone dates are shown in
    pub zone: Tz,

    /// strftime format
    pub format: String,
}

impl Default for DateStyle {
    fn default() -> Self {
        Self {
            zone: DEFAULT_TIMEZONE,
            format: DEFAULT_DATE_FORMAT.to_string(),
        }
    }
}

impl DateStyle {
    pub fn new(zone: Tz, format: impl Into<String>) -> Self {
        Self {
            zone,
            format: format.into(),
        }
    }

    /// Format an instant as a date in the configured zone
    pub fn format(&self, instant: DateTime<Utc>) -> String {
        let local = instant.with_timezone(&self.zone);
        collapse_spaces(&local.format(&self.format).to_string())
    }

    /// Format a calendar date
    pub fn format_date(&self, date: NaiveDate) -> String {
        collapse_spaces(&date.format(&self.format).to_string())
    }

    /// Convert an instant to the configured zone
    pub fn localize(&self, instant: DateTime<Utc>) -> DateTime<Tz> {
        self.zone.from_utc_datetime(&instant.naive_utc())
    }
}

// `%e` pads single-digit days with a space
fn collapse_spaces(text: &str) -> String {
    text.split(' ')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// A text template with `{name}` placeholders
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    source: String,
}

impl Template {
    /// Create a template; trailing whitespace is dropped
    pub fn new(source: impl Into<String>) -> Self {
        let source: String = source.into();
        Self {
            source: source.trim_end().to_string(),
        }
    }

    /// The raw template text
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Substitute placeholders in a single pass.
    ///
    /// Unknown placeholders and unbalanced braces are kept as written, and
    /// substituted values are never expanded again.
    pub fn render(&self, values: &[(&str, &str)]) -> String {
        let mut out = String::with_capacity(self.source.len());
        let mut rest = self.source.as_str();

        while let Some(open) = rest.find('{') {
            out.push_str(&rest[..open]);
            let after = &rest[open + 1..];

            match after.find(|c: char| c == '}' || c == '{') {
                Some(close) if after.as_bytes()[close] == b'}' => {
                    let name = &after[..close];
                    match values.iter().find(|(key, _)| *key == name) {
                        Some((_, value)) => out.push_str(value),
                        None => {
                            out.push('{');
                            out.push_str(name);
                            out.push('}');
                        }
                    }
                    rest = &after[close + 1..];
                }
                _ => {
                    out.push('{');
                    rest = after;
                }
            }
        }

        out.push_str(rest);
        out
    }
}

/// Load `{dir}/{file}` when a directory is configured and the file exists
pub async fn load_override(dir: Option<&Path>, file: &str) -> Result<Option<Template>> {
    let Some(dir) = dir else {
        return Ok(None);
    };

    let path = dir.join(file);
    if !path.exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(&path)
        .await
        .with_context(|| format!("Failed to read template: {}", path.display()))?;

    debug!(path = %path.display(), "Loaded template override");
    Ok(Some(Template::new(content)))
}

/// Load an override or fall back to a built-in default
pub async fn load_or_default(dir: Option<&Path>, file: &str, default: &str) -> Result<Template> {
    Ok(load_override(dir, file)
        .await?
        .unwrap_or_else(|| Template::new(default)))
}

/// Prefix every line of `text` with `level` tabs
pub fn indent(text: &str, level: usize) -> String {
    let prefix = "\t".repeat(level);
    text.lines()
        .map(|line| format!("{}{}", prefix, line))
        .collect::<Vec<_>>()
        .join("\n")
}
