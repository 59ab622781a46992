//! Typed columns of a [`Table`](super::Table)

use log::warn;
use serde::{Deserialize, Serialize};

/// Declared type of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Bool,
    #[serde(alias = "int", alias = "number")]
    Float,
    #[default]
    #[serde(alias = "string")]
    Str,
}

/// A column of nullable values
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    Bool(Vec<Option<bool>>),
    Float(Vec<Option<f64>>),
    Str(Vec<Option<String>>),
}

impl Column {
    pub fn len(&self) -> usize {
        match self {
            Column::Bool(values) => values.len(),
            Column::Float(values) => values.len(),
            Column::Str(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn column_type(&self) -> ColumnType {
        match self {
            Column::Bool(_) => ColumnType::Bool,
            Column::Float(_) => ColumnType::Float,
            Column::Str(_) => ColumnType::Str,
        }
    }

    pub fn is_null(&self, row: usize) -> bool {
        match self {
            Column::Bool(values) => values.get(row).is_none_or(Option::is_none),
            Column::Float(values) => values.get(row).is_none_or(Option::is_none),
            Column::Str(values) => values.get(row).is_none_or(Option::is_none),
        }
    }

    /// Convert the column to another type.
    ///
    /// Values that cannot be represented in the target type become missing.
    #[must_use]
    pub fn cast(self, target: ColumnType, name: &str) -> Column {
        match (self, target) {
            (column @ Column::Bool(_), ColumnType::Bool)
            | (column @ Column::Float(_), ColumnType::Float)
            | (column @ Column::Str(_), ColumnType::Str) => column,
            (Column::Bool(values), ColumnType::Float) => Column::Float(
                values
                    .into_iter()
                    .map(|v| v.map(|b| if b { 1.0 } else { 0.0 }))
                    .collect(),
            ),
            (Column::Bool(values), ColumnType::Str) => Column::Str(
                values
                    .into_iter()
                    .map(|v| v.map(|b| b.to_string()))
                    .collect(),
            ),
            (Column::Float(values), ColumnType::Bool) => {
                Column::Bool(values.into_iter().map(|v| v.map(|x| x != 0.0)).collect())
            }
            (Column::Float(values), ColumnType::Str) => Column::Str(
                values
                    .into_iter()
                    .map(|v| v.map(format_float))
                    .collect(),
            ),
            (Column::Str(values), ColumnType::Bool) => Column::Bool(
                values
                    .into_iter()
                    .map(|v| v.and_then(|s| parse_bool(&s)))
                    .collect(),
            ),
            (Column::Str(values), ColumnType::Float) => {
                let mut invalid = 0usize;
                let parsed = values
                    .into_iter()
                    .map(|v| {
                        v.and_then(|s| {
                            let value = parse_float(&s);
                            if value.is_none() && !s.trim().is_empty() {
                                invalid += 1;
                            }
                            value
                        })
                    })
                    .collect();
                if invalid > 0 {
                    warn!("{invalid} values of column `{name}` are not numeric and were dropped");
                }
                Column::Float(parsed)
            }
        }
    }
}

impl From<Vec<f64>> for Column {
    fn from(values: Vec<f64>) -> Self {
        Column::Float(values.into_iter().map(Some).collect())
    }
}

impl From<Vec<Option<f64>>> for Column {
    fn from(values: Vec<Option<f64>>) -> Self {
        Column::Float(values)
    }
}

impl From<Vec<bool>> for Column {
    fn from(values: Vec<bool>) -> Self {
        Column::Bool(values.into_iter().map(Some).collect())
    }
}

impl From<Vec<Option<bool>>> for Column {
    fn from(values: Vec<Option<bool>>) -> Self {
        Column::Bool(values)
    }
}

impl From<Vec<String>> for Column {
    fn from(values: Vec<String>) -> Self {
        Column::Str(values.into_iter().map(Some).collect())
    }
}

impl From<Vec<Option<String>>> for Column {
    fn from(values: Vec<Option<String>>) -> Self {
        Column::Str(values)
    }
}

impl From<Vec<&str>> for Column {
    fn from(values: Vec<&str>) -> Self {
        Column::Str(values.into_iter().map(|s| Some(s.to_string())).collect())
    }
}

impl From<Vec<Option<&str>>> for Column {
    fn from(values: Vec<Option<&str>>) -> Self {
        Column::Str(
            values
                .into_iter()
                .map(|s| s.map(ToString::to_string))
                .collect(),
        )
    }
}

/// Integral values print without a fractional part so numeric ids keep their
/// textual form (`3`, not `3.0`)
#[allow(clippy::cast_possible_truncation)]
pub(crate) fn format_float(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

pub(crate) fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "t" => Some(true),
        "false" | "0" | "no" | "f" => Some(false),
        _ => None,
    }
}

/// Parse a number or a `HH:MM:SS` clock time (seconds since midnight)
pub(crate) fn parse_float(value: &str) -> Option<f64> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if let Ok(number) = value.parse::<f64>() {
        return Some(number);
    }
    parse_time(value).map(f64::from)
}

/// Parse time string in HH:MM:SS format to seconds since midnight.
///
/// Hours past 23 are kept as is, simulations regularly run past midnight.
fn parse_time(time_str: &str) -> Option<u32> {
    let mut parts = time_str.split(':');
    let hours: u32 = parts.next()?.parse().ok()?;
    let minutes: u32 = parts.next()?.parse().ok()?;
    let seconds: u32 = parts.next().map_or(Some(0), |p| p.parse().ok())?;
    if parts.next().is_some() || minutes >= 60 || seconds >= 60 {
        return None;
    }
    Some(hours * 3600 + minutes * 60 + seconds)
}
