use std::fs::File;
use std::io::Read;
use std::path::Path;

use log::info;

use super::text_column;
use crate::model::{Table, TableKind, TableSpecification};
use crate::Error;

/// Read a delimited file with a header row into a table of `kind`
///
/// # Errors
///
/// Returns an error if the file cannot be opened or is not valid CSV
pub fn read_csv_table(
    path: &Path,
    kind: TableKind,
    specification: &TableSpecification,
) -> Result<Table, Error> {
    let file = File::open(path).map_err(|e| {
        std::io::Error::new(
            e.kind(),
            format!("Failed to open file '{}': {}", path.display(), e),
        )
    })?;
    let table = table_from_csv_reader(file, kind, specification)?;
    info!(
        "Read {} rows of {} from {}",
        table.n_rows(),
        kind,
        path.display()
    );
    Ok(table)
}

/// Read CSV with a header row from any reader
///
/// # Errors
///
/// Returns an error if the input is not valid CSV or rows differ in length
pub fn table_from_csv_reader<R: Read>(
    reader: R,
    kind: TableKind,
    specification: &TableSpecification,
) -> Result<Table, Error> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let headers: Vec<String> = reader.headers()?.iter().map(ToString::to_string).collect();

    let mut cells: Vec<Vec<Option<String>>> = vec![Vec::new(); headers.len()];
    for record in reader.records() {
        let record = record?;
        for (column, value) in cells.iter_mut().zip(record.iter()) {
            column.push((!value.is_empty()).then(|| value.to_string()));
        }
    }

    let mut table = Table::new();
    for (name, column) in headers.iter().zip(cells) {
        table.insert_column(name, text_column(name, column, kind, specification))?;
    }
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_declared_and_inferred_columns() {
        let data = "\
trip_id,main_mode,start_time,contains_drt,score
1,car,08:00:00,false,0.5
2,drt,3600,true,
3,,7200,,1
";
        let table = table_from_csv_reader(
            data.as_bytes(),
            TableKind::Trips,
            &TableSpecification::default(),
        )
        .unwrap();

        assert_eq!(table.n_rows(), 3);
        assert_eq!(
            table.str_column("trip_id").unwrap(),
            &[Some("1".into()), Some("2".into()), Some("3".into())]
        );
        assert_eq!(table.str_column("main_mode").unwrap()[2], None);
        assert_eq!(
            table.float_column("start_time").unwrap(),
            &[Some(28800.0), Some(3600.0), Some(7200.0)]
        );
        assert_eq!(
            table.bool_column("contains_drt").unwrap(),
            &[Some(false), Some(true), None]
        );
        assert_eq!(
            table.float_column("score").unwrap(),
            &[Some(0.5), None, Some(1.0)]
        );
    }

    #[test]
    fn ragged_rows_are_an_error() {
        let data = "trip_id,main_mode\n1,car,extra\n";
        let result = table_from_csv_reader(
            data.as_bytes(),
            TableKind::Trips,
            &TableSpecification::default(),
        );
        assert!(matches!(result, Err(Error::CsvError(_))));
    }
}
