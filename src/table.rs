//! # Tables
//!
//! A table owns a fixed set of named columns and keeps them in lock-step:
//! every column holds exactly one value per row, and row index `i` names the
//! same logical record in each. Rows are appended by [`Table::add_row`] and
//! destroyed only from the end; arbitrary removal is swap-to-end then
//! truncate, which moves the last row into the removed slot.
//!
//! Row indices are the only row identity. Any held index becomes stale when
//! a removal or swap reorders the table; that is a documented precondition,
//! not something the types enforce.

use tracing::trace;

use crate::column::Column;
use crate::error::{Error, Result};
use crate::tree::{self, names, TreeReader, TreeWriter};

/// Ordered set of named columns sharing one row count.
#[derive(Default)]
pub struct Table {
    count: usize,
    columns: Vec<(String, Box<dyn Column>)>,
}

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a column under `name`. The column's row count must match
    /// the table's current count (usually both zero at schema setup).
    pub fn add_column(
        &mut self,
        name: impl Into<String>,
        column: impl Column + 'static,
    ) -> Result<()> {
        let name = name.into();
        if self.columns.iter().any(|(existing, _)| *existing == name) {
            return Err(Error::consistency(format!(
                "table already has a column named '{name}'"
            )));
        }
        if column.count() != self.count {
            return Err(Error::consistency(format!(
                "column '{name}' has {} rows, table has {}",
                column.count(),
                self.count
            )));
        }
        self.columns.push((name, Box::new(column)));
        Ok(())
    }

    /// Number of rows.
    pub fn count(&self) -> usize {
        self.count
    }

    /// Typed access to a column by name.
    pub fn column<C: Column + 'static>(&self, name: &str) -> Option<&C> {
        self.columns
            .iter()
            .find(|(existing, _)| existing == name)
            .and_then(|(_, column)| column.as_any().downcast_ref())
    }

    /// Typed mutable access to a column by name.
    pub fn column_mut<C: Column + 'static>(&mut self, name: &str) -> Option<&mut C> {
        self.columns
            .iter_mut()
            .find(|(existing, _)| existing == name)
            .and_then(|(_, column)| column.as_any_mut().downcast_mut())
    }

    /// Column names in registration order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(name, _)| name.as_str())
    }

    /// Appends one row to every column atomically, returning its index.
    pub fn add_row(&mut self) -> usize {
        for (_, column) in &mut self.columns {
            column.add();
        }
        self.count += 1;
        trace!(rows = self.count, "appended row");
        self.count - 1
    }

    /// Exchanges two rows across every column.
    pub fn swap_rows(&mut self, a: usize, b: usize) -> Result<()> {
        for (_, column) in &mut self.columns {
            column.swap(a, b)?;
        }
        Ok(())
    }

    /// Truncates the last `n` rows from every column.
    pub fn remove_from_end(&mut self, n: usize) -> Result<()> {
        if n > self.count {
            return Err(Error::bounds(format!(
                "cannot remove {n} rows from table with {} rows",
                self.count
            )));
        }
        for (_, column) in &mut self.columns {
            column.remove_from_end(n)?;
        }
        self.count -= n;
        Ok(())
    }

    /// Removes one row by swapping it with the last row and truncating.
    ///
    /// The previously-last row takes the removed row's index; any held row
    /// indices are stale after this.
    pub fn remove_row(&mut self, row: usize) -> Result<()> {
        if row >= self.count {
            return Err(Error::bounds(format!(
                "row {row} out of bounds for table with {} rows",
                self.count
            )));
        }
        let last = self.count - 1;
        if row != last {
            self.swap_rows(row, last)?;
        }
        self.remove_from_end(1)
    }

    /// Empties every column to zero rows.
    pub fn clear(&mut self) {
        for (_, column) in &mut self.columns {
            column.clear();
        }
        self.count = 0;
    }

    /// Trims every column, collecting indirect-column garbage first.
    pub fn trim(&mut self) -> Result<()> {
        for (_, column) in &mut self.columns {
            column.trim()?;
        }
        Ok(())
    }

    /// Serializes as `{count, columns: {name: column, ...}}`.
    pub fn write(&self, writer: &mut dyn TreeWriter) -> Result<()> {
        writer.start_object()?;
        tree::field_u64(writer, names::COUNT, self.count as u64, 0)?;
        writer.field(names::COLUMNS)?;
        writer.start_object()?;
        for (name, column) in &self.columns {
            writer.field(name)?;
            column.write(writer)?;
        }
        writer.end_object()?;
        writer.end_object()
    }

    /// Deserializes into the registered columns. Stream members with no
    /// matching column are skipped; a surviving column whose row count
    /// disagrees with the table's is a format error.
    pub fn read(&mut self, reader: &mut dyn TreeReader) -> Result<()> {
        let mut count = 0u64;
        let columns = &mut self.columns;
        reader.read_object(&mut |reader, name| match name {
            names::COUNT => {
                count = reader.read_u64()?;
                Ok(true)
            }
            names::COLUMNS => {
                reader.read_object(&mut |reader, column_name| {
                    match columns
                        .iter_mut()
                        .find(|(existing, _)| existing == column_name)
                    {
                        Some((_, column)) => {
                            column.read(reader)?;
                            Ok(true)
                        }
                        None => Ok(false),
                    }
                })?;
                Ok(true)
            }
            _ => Ok(false),
        })?;
        self.count = count as usize;
        for (name, column) in &self.columns {
            if column.count() != self.count {
                return Err(Error::format(format!(
                    "column '{name}' has {} rows, table declares {}",
                    column.count(),
                    self.count
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::{ListColumn, NumberColumn, TypedColumn};
    use crate::tree::{JsonTreeReader, JsonTreeWriter};

    fn people() -> Table {
        let mut table = Table::new();
        table.add_column("id", NumberColumn::<i64>::new()).unwrap();
        table
            .add_column("scores", ListColumn::<i32>::new())
            .unwrap();
        table
    }

    #[test]
    fn add_row_keeps_columns_in_lock_step() {
        let mut table = people();
        let row = table.add_row();
        assert_eq!(row, 0);
        assert_eq!(table.count(), 1);
        assert_eq!(table.column::<NumberColumn<i64>>("id").unwrap().count(), 1);
        assert_eq!(table.column::<ListColumn<i32>>("scores").unwrap().count(), 1);
    }

    #[test]
    fn duplicate_or_misaligned_columns_are_rejected() {
        let mut table = people();
        assert!(matches!(
            table.add_column("id", NumberColumn::<i64>::new()),
            Err(Error::Consistency(_))
        ));

        table.add_row();
        assert!(matches!(
            table.add_column("late", NumberColumn::<i64>::new()),
            Err(Error::Consistency(_))
        ));
    }

    #[test]
    fn remove_row_swaps_the_last_row_in() {
        let mut table = people();
        for i in 0..3 {
            let row = table.add_row();
            table
                .column_mut::<NumberColumn<i64>>("id")
                .unwrap()
                .set(row, i as i64)
                .unwrap();
        }

        table.remove_row(0).unwrap();
        assert_eq!(table.count(), 2);
        let ids = table.column::<NumberColumn<i64>>("id").unwrap();
        assert_eq!(ids.get(0).unwrap(), 2);
        assert_eq!(ids.get(1).unwrap(), 1);
    }

    #[test]
    fn removal_applies_identically_across_columns() {
        let mut table = people();
        for i in 0..3i64 {
            let row = table.add_row();
            table
                .column_mut::<NumberColumn<i64>>("id")
                .unwrap()
                .set(row, i)
                .unwrap();
            table
                .column_mut::<ListColumn<i32>>("scores")
                .unwrap()
                .set(row, &[i as i32 * 10])
                .unwrap();
        }

        table.remove_row(1).unwrap();
        let ids = table.column::<NumberColumn<i64>>("id").unwrap();
        let scores = table.column::<ListColumn<i32>>("scores").unwrap();
        // Row 1 is now the old row 2 in every column.
        assert_eq!(ids.get(1).unwrap(), 2);
        assert_eq!(scores.get(1).unwrap(), [20]);
    }

    #[test]
    fn tree_round_trip() {
        let mut table = people();
        for i in 0..3i64 {
            let row = table.add_row();
            table
                .column_mut::<NumberColumn<i64>>("id")
                .unwrap()
                .set(row, i * 7)
                .unwrap();
            table
                .column_mut::<ListColumn<i32>>("scores")
                .unwrap()
                .set(row, &[i as i32, i as i32 + 1])
                .unwrap();
        }

        let mut writer = JsonTreeWriter::new();
        table.write(&mut writer).unwrap();
        let document = writer.finish().unwrap();

        let mut restored = people();
        restored.read(&mut JsonTreeReader::new(&document)).unwrap();
        assert_eq!(restored.count(), 3);
        assert_eq!(
            restored
                .column::<NumberColumn<i64>>("id")
                .unwrap()
                .get(2)
                .unwrap(),
            14
        );
        assert_eq!(
            restored
                .column::<ListColumn<i32>>("scores")
                .unwrap()
                .get(1)
                .unwrap(),
            [1, 2]
        );
    }

    #[test]
    fn unknown_columns_in_the_stream_are_skipped() {
        let mut table = people();
        table.add_row();
        let mut writer = JsonTreeWriter::new();
        table.write(&mut writer).unwrap();
        let mut document = writer.finish().unwrap();
        document["columns"]["retired_column"] = serde_json::json!([1, 2, 3]);

        let mut restored = people();
        restored.read(&mut JsonTreeReader::new(&document)).unwrap();
        assert_eq!(restored.count(), 1);
    }

    #[test]
    fn count_mismatch_is_a_format_error() {
        let mut table = people();
        table.add_row();
        let mut writer = JsonTreeWriter::new();
        table.write(&mut writer).unwrap();
        let mut document = writer.finish().unwrap();
        document["count"] = serde_json::json!(5);

        let mut restored = people();
        assert!(matches!(
            restored.read(&mut JsonTreeReader::new(&document)),
            Err(Error::Format(_))
        ));
    }
}
