use hashbrown::HashMap;
use serde_json::Value;

use crate::model::column::format_float;
use crate::model::{Column, Table, TableKind, TableSpecification};
use crate::Error;

/// Build a table from a JSON array of flat objects, as written by
/// `DataFrame.to_json(orient="records")`.
///
/// Columns appear in the order keys are first seen. Keys missing from a
/// record and `null` are missing values.
///
/// # Errors
///
/// Returns an error if the input is not a JSON array of objects or holds nested values
pub fn table_from_records(
    json: &str,
    kind: TableKind,
    specification: &TableSpecification,
) -> Result<Table, Error> {
    let records: Vec<serde_json::Map<String, Value>> = serde_json::from_str(json)?;

    let mut names: Vec<&str> = Vec::new();
    let mut positions: HashMap<&str, usize> = HashMap::new();
    for record in &records {
        for key in record.keys() {
            positions.entry(key.as_str()).or_insert_with(|| {
                names.push(key.as_str());
                names.len() - 1
            });
        }
    }

    let mut table = Table::new();
    for name in names {
        let values: Vec<Option<&Value>> = records
            .iter()
            .map(|record| record.get(name).filter(|value| !value.is_null()))
            .collect();
        let column = json_column(name, &values)?;
        let column = match specification.column_type(kind, name) {
            Some(declared) => column.cast(declared, name),
            None => column,
        };
        table.insert_column(name, column)?;
    }
    Ok(table)
}

/// Column of the natural type of `values`, strings if they are mixed
fn json_column(name: &str, values: &[Option<&Value>]) -> Result<Column, Error> {
    let present = || values.iter().flatten();
    if present().any(|value| value.is_array() || value.is_object()) {
        return Err(Error::InvalidData(format!(
            "Column `{name}` holds nested values"
        )));
    }

    let column = if present().all(|value| value.is_number()) {
        Column::Float(
            values
                .iter()
                .map(|value| value.and_then(Value::as_f64))
                .collect(),
        )
    } else if present().all(|value| value.is_boolean()) {
        Column::Bool(
            values
                .iter()
                .map(|value| value.and_then(Value::as_bool))
                .collect(),
        )
    } else {
        Column::Str(
            values
                .iter()
                .map(|value| {
                    value.map(|value| match value {
                        Value::String(s) => s.clone(),
                        Value::Number(n) => n.as_f64().map_or_else(|| n.to_string(), format_float),
                        other => other.to_string(),
                    })
                })
                .collect(),
        )
    };
    Ok(column)
}
