//! Reading simulation output and zones into the data model
//!
//! Columns declared in the [`TableSpecification`] are parsed as their
//! declared type. The type of other columns is inferred: all values numeric,
//! all values boolean, otherwise strings. Empty cells are missing values.

mod csv_table;
mod records;
mod zones;

pub use csv_table::{read_csv_table, table_from_csv_reader};
pub use records::table_from_records;
pub use zones::zones_from_geojson;

use crate::model::column::parse_bool;
use crate::model::{Column, ColumnType, TableKind, TableSpecification};

/// Build a column of `kind` from raw text cells
fn text_column(
    name: &str,
    cells: Vec<Option<String>>,
    kind: TableKind,
    specification: &TableSpecification,
) -> Column {
    let dtype = specification
        .column_type(kind, name)
        .unwrap_or_else(|| infer_type(&cells));
    Column::Str(cells).cast(dtype, name)
}

/// Clock strings are only parsed in declared numeric columns
fn infer_type(cells: &[Option<String>]) -> ColumnType {
    let mut present = cells.iter().flatten().peekable();
    if present.peek().is_none() {
        ColumnType::Str
    } else if cells
        .iter()
        .flatten()
        .all(|cell| cell.trim().parse::<f64>().is_ok())
    {
        ColumnType::Float
    } else if cells.iter().flatten().all(|cell| parse_bool(cell).is_some()) {
        ColumnType::Bool
    } else {
        ColumnType::Str
    }
}
