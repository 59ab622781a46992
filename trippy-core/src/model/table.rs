//! Column-oriented in-memory table

use super::column::{Column, ColumnType};
use crate::Error;

/// Ordered collection of equally long named columns
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<(String, Column)>,
    n_rows: usize,
}

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style variant of [`Table::insert_column`]
    ///
    /// # Errors
    ///
    /// Returns an error if the column length differs from the table's row count
    pub fn with_column(mut self, name: &str, column: impl Into<Column>) -> Result<Self, Error> {
        self.insert_column(name, column)?;
        Ok(self)
    }

    /// Insert a column, replacing an existing column with the same name.
    ///
    /// # Errors
    ///
    /// Returns an error if the column length differs from the table's row count
    pub fn insert_column(&mut self, name: &str, column: impl Into<Column>) -> Result<(), Error> {
        let column = column.into();
        let replaces_only_column = self.columns.len() == 1 && self.columns[0].0 == name;
        if !self.columns.is_empty() && !replaces_only_column && column.len() != self.n_rows {
            return Err(Error::InvalidData(format!(
                "Column `{name}` has {} values but the table has {} rows",
                column.len(),
                self.n_rows
            )));
        }
        self.n_rows = column.len();

        if let Some(slot) = self.columns.iter_mut().find(|(n, _)| n == name) {
            slot.1 = column;
        } else {
            self.columns.push((name.to_string(), column));
        }
        Ok(())
    }

    pub fn drop_column(&mut self, name: &str) -> Option<Column> {
        let idx = self.columns.iter().position(|(n, _)| n == name)?;
        let (_, column) = self.columns.remove(idx);
        if self.columns.is_empty() {
            self.n_rows = 0;
        }
        Some(column)
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }

    /// True if the table holds no cells at all
    pub fn is_empty(&self) -> bool {
        self.n_rows == 0 || self.columns.is_empty()
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(name, _)| name.as_str())
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|(n, _)| n == name)
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, column)| column)
    }

    /// Cast a column in place. Missing columns are ignored.
    pub fn cast_column(&mut self, name: &str, target: ColumnType) {
        if let Some(slot) = self.columns.iter_mut().find(|(n, _)| n == name) {
            if slot.1.column_type() != target {
                let column = std::mem::replace(&mut slot.1, Column::Bool(Vec::new()));
                slot.1 = column.cast(target, name);
            }
        }
    }

    /// # Errors
    ///
    /// Returns an error if the column is missing or not a string column
    pub fn str_column(&self, name: &str) -> Result<&[Option<String>], Error> {
        match self.typed_column(name)? {
            Column::Str(values) => Ok(values),
            other => Err(type_mismatch(name, ColumnType::Str, other)),
        }
    }

    /// # Errors
    ///
    /// Returns an error if the column is missing or not numeric
    pub fn float_column(&self, name: &str) -> Result<&[Option<f64>], Error> {
        match self.typed_column(name)? {
            Column::Float(values) => Ok(values),
            other => Err(type_mismatch(name, ColumnType::Float, other)),
        }
    }

    /// # Errors
    ///
    /// Returns an error if the column is missing or not boolean
    pub fn bool_column(&self, name: &str) -> Result<&[Option<bool>], Error> {
        match self.typed_column(name)? {
            Column::Bool(values) => Ok(values),
            other => Err(type_mismatch(name, ColumnType::Bool, other)),
        }
    }

    fn typed_column(&self, name: &str) -> Result<&Column, Error> {
        self.column(name)
            .ok_or_else(|| Error::InvalidData(format!("Column `{name}` not found")))
    }
}

fn type_mismatch(name: &str, expected: ColumnType, found: &Column) -> Error {
    Error::InvalidData(format!(
        "Column `{name}` has type {:?}, expected {expected:?}",
        found.column_type()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_columns_of_different_length() {
        let table = Table::new()
            .with_column("trip_id", vec!["1", "2"])
            .unwrap();
        assert!(table.clone().with_column("main_mode", vec!["car"]).is_err());
        assert_eq!(table.n_rows(), 2);
    }

    #[test]
    fn replacing_a_column_keeps_its_position() {
        let mut table = Table::new()
            .with_column("a", vec![1.0, 2.0])
            .unwrap()
            .with_column("b", vec!["x", "y"])
            .unwrap();
        table.insert_column("a", vec![3.0, 4.0]).unwrap();
        assert_eq!(table.column_names().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(table.float_column("a").unwrap(), &[Some(3.0), Some(4.0)]);
    }

    #[test]
    fn typed_access_checks_the_column_kind() {
        let table = Table::new().with_column("mode", vec!["car"]).unwrap();
        assert!(table.str_column("mode").is_ok());
        assert!(table.float_column("mode").is_err());
        assert!(table.bool_column("missing").is_err());
    }
}
