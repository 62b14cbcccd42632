//! Definition of the `Table` type
//!
//! A `Table` is a row-oriented collection of named categorical columns. It is
//! the one "table-like" abstraction shared by the CPT estimator, the network
//! builder and the query memoizer. Cells are plain strings; columns referenced
//! by an edge list or evidence set must not contain missing values (there is
//! no representation for them).

use util::{LaplaceError, Result};

use indexmap::IndexMap;

#[derive(Clone, Debug)]
pub struct Table {

    /// The named columns, in insertion order. Every column has `rows` cells.
    columns: IndexMap<String, Vec<String>>,

    /// The number of rows in the `Table`
    rows: usize

}

impl Table {

    /// Create an empty `Table` with no columns and no rows
    pub fn new() -> Self {
        Table { columns: IndexMap::new(), rows: 0 }
    }


    /// Create a `Table` from named columns.
    ///
    /// # Errors
    /// * `LaplaceError::General` if column lengths differ or a name repeats
    pub fn from_columns(columns: Vec<(String, Vec<String>)>) -> Result<Self> {
        let rows = columns.first().map(|&(_, ref c)| c.len()).unwrap_or(0);

        let mut map = IndexMap::new();
        for (name, cells) in columns {
            if cells.len() != rows {
                return Err(LaplaceError::General(
                    format!("column '{}' has {} cells, expected {}", name, cells.len(), rows)
                ));
            }

            if map.insert(name.clone(), cells).is_some() {
                return Err(LaplaceError::General(format!("duplicate column '{}'", name)));
            }
        }

        Ok(Table { columns: map, rows })
    }


    /// Create a `Table` from a header and row tuples. Convenient for tests and
    /// for callers that receive row-oriented input.
    pub fn from_rows(header: &[&str], rows: &[Vec<&str>]) -> Result<Self> {
        let mut columns: Vec<(String, Vec<String>)> = header
            .iter()
            .map(|h| (String::from(*h), Vec::with_capacity(rows.len())))
            .collect();

        for (i, row) in rows.iter().enumerate() {
            if row.len() != header.len() {
                return Err(LaplaceError::General(
                    format!("row {} has {} cells, expected {}", i, row.len(), header.len())
                ));
            }

            for (col, cell) in columns.iter_mut().zip(row.iter()) {
                col.1.push(String::from(*cell));
            }
        }

        Table::from_columns(columns)
    }


    /// The number of rows in the `Table`
    pub fn len(&self) -> usize {
        self.rows
    }


    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }


    /// The column names, in insertion order
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.keys().map(|k| k.as_str()).collect()
    }


    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }


    /// Retrieve a column by name
    ///
    /// # Errors
    /// * `LaplaceError::MissingColumn` if no column has the given name
    pub fn column(&self, name: &str) -> Result<&[String]> {
        self.columns
            .get(name)
            .map(|c| c.as_slice())
            .ok_or_else(|| LaplaceError::MissingColumn(String::from(name)))
    }


    /// Retrieve a single cell
    pub fn value(&self, row: usize, column: &str) -> Result<&str> {
        let col = self.column(column)?;
        col.get(row)
           .map(|v| v.as_str())
           .ok_or_else(|| LaplaceError::General(format!("row {} is out of bounds", row)))
    }


    /// Build a new `Table` containing the given rows, in the given order.
    /// Used to restrict the full dataset to a train or test partition.
    ///
    /// # Errors
    /// * `LaplaceError::General` if any index is out of bounds
    pub fn select(&self, rows: &[usize]) -> Result<Self> {
        if let Some(&bad) = rows.iter().find(|&&r| r >= self.rows) {
            return Err(LaplaceError::General(format!("row {} is out of bounds", bad)));
        }

        let columns = self.columns
                          .iter()
                          .map(|(name, cells)| {
                              let picked = rows.iter().map(|&r| cells[r].clone()).collect();
                              (name.clone(), picked)
                          })
                          .collect();

        Ok(Table { columns, rows: rows.len() })
    }

}
