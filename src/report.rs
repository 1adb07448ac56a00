//! The structured report: the record produced by the content stage and
//! consumed by the rendering stage.
//!
//! Models return "JSON-shaped" data rather than the exact schema they were
//! asked for: numbers where strings were requested, `null` for missing
//! fields, ragged table rows. Deserialisation is therefore lenient at the
//! leaves (any scalar becomes a string, a list of scalars becomes one line
//! per item, `null` becomes the default) but
//! strict about the overall shape, and [`StructuredReport::from_value`]
//! finishes with a normalisation pass that fills meta defaults and drops
//! tables that are not fully populated.

use crate::error::ReportError;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::warn;

/// Title used when the model leaves `meta.title` empty.
pub const DEFAULT_TITLE: &str = "Untitled Report";
/// Client used when the model leaves `meta.client` empty.
pub const DEFAULT_CLIENT: &str = "Internal Report";
/// Author used when the model leaves `meta.author` empty.
pub const DEFAULT_AUTHOR: &str = "AI Consultant";

/// A single free-form report request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportRequest {
    pub text: String,
}

impl ReportRequest {
    /// Wrap user text, rejecting empty or whitespace-only input.
    pub fn new(text: impl Into<String>) -> Result<Self, ReportError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(ReportError::EmptyInput);
        }
        Ok(Self { text })
    }

    /// Short prefix of the text for log lines.
    pub fn preview(&self, max_chars: usize) -> String {
        let mut preview: String = self.text.trim().chars().take(max_chars).collect();
        if self.text.trim().chars().count() > max_chars {
            preview.push('…');
        }
        preview
    }
}

/// The report record: cover metadata plus ordered sections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredReport {
    #[serde(default, deserialize_with = "null_as_default")]
    pub meta: ReportMeta,
    #[serde(default, deserialize_with = "null_as_default")]
    pub sections: Vec<Section>,
}

/// Cover-page metadata. `date` is formatted `YYYY-MM-DD`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportMeta {
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub client: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub author: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub date: String,
}

/// One page-flow region of the report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    #[serde(default, deserialize_with = "lenient_string")]
    pub heading: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub content: String,
    #[serde(default, deserialize_with = "lenient_table")]
    pub table_data: Option<Table>,
}

/// Tabular data attached to a section. Every row has exactly
/// `columns.len()` cells.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    /// Build a table, returning `None` unless it is fully populated.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<String>>) -> Option<Self> {
        let table = Self { columns, rows };
        table.is_complete().then_some(table)
    }

    /// A table is complete when it has columns and every row matches them.
    pub fn is_complete(&self) -> bool {
        !self.columns.is_empty() && self.rows.iter().all(|r| r.len() == self.columns.len())
    }
}

impl StructuredReport {
    /// Convert a sanitised JSON value into a report.
    ///
    /// Fails with [`ReportError::GenerationParse`] when the value is not an
    /// object or its shape does not match the schema at all.
    pub fn from_value(value: Value) -> Result<Self, ReportError> {
        if !value.is_object() {
            return Err(ReportError::GenerationParse {
                reason: format!("expected a JSON object, got {}", json_kind(&value)),
                raw_len: value.to_string().len(),
            });
        }
        let raw_len = value.to_string().len();
        let mut report: StructuredReport =
            serde_json::from_value(value).map_err(|e| ReportError::GenerationParse {
                reason: format!("reply does not match the report schema: {e}"),
                raw_len,
            })?;
        report.normalise();
        Ok(report)
    }

    /// Fill empty meta fields with their defaults.
    pub fn normalise(&mut self) {
        let meta = &mut self.meta;
        fill_default(&mut meta.title, DEFAULT_TITLE);
        fill_default(&mut meta.client, DEFAULT_CLIENT);
        fill_default(&mut meta.author, DEFAULT_AUTHOR);
        if meta.date.trim().is_empty() {
            meta.date = chrono::Local::now().format("%Y-%m-%d").to_string();
        }
    }

    /// Number of sections carrying a table.
    pub fn table_count(&self) -> usize {
        self.sections.iter().filter(|s| s.table_data.is_some()).count()
    }
}

fn fill_default(field: &mut String, default: &str) {
    if field.trim().is_empty() {
        *field = default.to_string();
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

// ── Lenient field deserialisers ──────────────────────────────────────────

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    if let Some(text) = scalar_to_string(&value) {
        return Ok(text);
    }
    // A list of paragraphs is joined one per line.
    let lines = value.as_array().and_then(|items| {
        items
            .iter()
            .map(scalar_to_string)
            .collect::<Option<Vec<_>>>()
    });
    match lines {
        Some(lines) => Ok(lines.join("\n")),
        None => {
            warn!("Dropping non-text field value: {}", value);
            Ok(String::new())
        }
    }
}

/// Render a scalar JSON value as display text; `None` for containers.
fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::Null => Some(String::new()),
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Array(_) | Value::Object(_) => None,
    }
}

/// Accept any `table_data` shape; keep it only if it is a complete table.
fn lenient_table<'de, D>(deserializer: D) -> Result<Option<Table>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    if value.is_null() {
        return Ok(None);
    }
    let table = table_from_value(&value);
    if table.is_none() {
        warn!("Dropping incomplete table_data: {}", value);
    }
    Ok(table)
}

fn table_from_value(value: &Value) -> Option<Table> {
    let columns = value
        .get("columns")?
        .as_array()?
        .iter()
        .map(scalar_to_string)
        .collect::<Option<Vec<_>>>()?;
    let rows = value
        .get("rows")?
        .as_array()?
        .iter()
        .map(|row| {
            row.as_array()?
                .iter()
                .map(scalar_to_string)
                .collect::<Option<Vec<_>>>()
        })
        .collect::<Option<Vec<_>>>()?;
    Table::new(columns, rows)
}
