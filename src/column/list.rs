//! Variable-length list column.
//!
//! Each row maps, through a nullable indices entry, to a run of a shared
//! values column. Reads hand out [`ArraySlice`] views straight into the
//! values array; in-place element writes go through [`RowList`]. `set`
//! replaces a row's content by appending at the values tail — the old run
//! becomes garbage until the next `trim`.
//!
//! `swap`, `remove_from_end` and plain row removal touch only the indices
//! column; the values column is untouched and accumulates garbage by design.

use std::any::Any;

use crate::column::{check_row, gc, Column, IndicesColumn, NumberColumn, Scalar, SliceRef,
    ValuesColumn};
use crate::error::{Error, Result};
use crate::slice::ArraySlice;
use crate::tree::{names, TreeReader, TreeWriter};

/// Column storing one list of `T` per row over a shared values column.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ListColumn<T: Scalar> {
    indices: IndicesColumn,
    values: NumberColumn<T>,
}

impl<T: Scalar> ListColumn<T> {
    pub fn new() -> Self {
        Self {
            indices: IndicesColumn::new(),
            values: NumberColumn::new(),
        }
    }

    /// Total values stored, live and orphaned.
    pub fn values_len(&self) -> usize {
        self.values.count()
    }

    /// True when the row has content (an empty list counts; a never-set or
    /// nulled row does not).
    pub fn has_value(&self, row: usize) -> Result<bool> {
        Ok(self.indices.entry(row)?.is_some())
    }

    /// Zero-copy view of one row's list. Absent rows read as empty.
    pub fn get(&self, row: usize) -> Result<ArraySlice<'_, T>> {
        match self.indices.entry(row)? {
            None => Ok(ArraySlice::empty()),
            Some(entry) => self.slice_for(entry),
        }
    }

    /// Replaces one row's content, orphaning the previous run.
    pub fn set(&mut self, row: usize, items: &[T]) -> Result<()> {
        check_row(row, self.indices.count())?;
        let offset = self.values.count() as u32;
        self.values.extend_from_slice(items);
        self.indices
            .set_entry(row, Some(SliceRef::new(offset, items.len() as u32)))
    }

    /// Nulls one row's content, orphaning the previous run.
    pub fn set_null(&mut self, row: usize) -> Result<()> {
        check_row(row, self.indices.count())?;
        self.indices.set_entry(row, None)
    }

    /// Mutable view over one row's elements for in-place writes.
    pub fn row_mut(&mut self, row: usize) -> Result<RowList<'_, T>> {
        let entry = self
            .indices
            .entry(row)?
            .unwrap_or_else(|| SliceRef::new(0, 0));
        let start = entry.offset as usize;
        let end = entry.end() as usize;
        if end > self.values.count() {
            return Err(Error::consistency(format!(
                "row {row} references {start}..{end} beyond values length {}",
                self.values.count()
            )));
        }
        Ok(RowList {
            items: &mut self.values.values_mut()[start..end],
        })
    }

    fn slice_for(&self, entry: SliceRef) -> Result<ArraySlice<'_, T>> {
        ArraySlice::new(
            self.values.values(),
            entry.offset as usize,
            entry.length as usize,
        )
        .map_err(|_| {
            Error::consistency(format!(
                "indices entry {}..{} beyond values length {}",
                entry.offset,
                entry.end(),
                self.values.count()
            ))
        })
    }
}

impl<T: Scalar> Column for ListColumn<T> {
    fn count(&self) -> usize {
        self.indices.count()
    }

    fn add(&mut self) {
        self.indices.add();
    }

    fn swap(&mut self, a: usize, b: usize) -> Result<()> {
        self.indices.swap(a, b)
    }

    fn remove_from_end(&mut self, n: usize) -> Result<()> {
        self.indices.remove_from_end(n)
    }

    fn clear(&mut self) {
        self.indices.clear();
        self.values.clear();
    }

    fn trim(&mut self) -> Result<()> {
        // Compact before shrinking: trimming first would lock garbage into
        // the reclaimed capacity.
        let mut values: [&mut dyn ValuesColumn; 1] = [&mut self.values];
        gc::collect(&mut self.indices, &mut values)?;
        self.values.trim()?;
        self.indices.trim()
    }

    fn write(&self, writer: &mut dyn TreeWriter) -> Result<()> {
        writer.start_object()?;
        writer.field(names::INDICES)?;
        self.indices.write(writer)?;
        writer.field(names::VALUES)?;
        self.values.write(writer)?;
        writer.end_object()
    }

    fn read(&mut self, reader: &mut dyn TreeReader) -> Result<()> {
        self.clear();
        reader.read_object(&mut |reader, name| match name {
            names::INDICES => {
                self.indices.read(reader)?;
                Ok(true)
            }
            names::VALUES => {
                self.values.read(reader)?;
                Ok(true)
            }
            _ => Ok(false),
        })
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Mutable view over one row's list elements.
///
/// Writes land directly in the shared values column. The view covers the
/// row's current run; growing a row goes through [`ListColumn::set`].
pub struct RowList<'a, T: Scalar> {
    items: &'a mut [T],
}

impl<'a, T: Scalar> RowList<'a, T> {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Result<T> {
        check_row(index, self.items.len())?;
        Ok(self.items[index])
    }

    /// In-place element write, straight to the values column.
    pub fn set(&mut self, index: usize, value: T) -> Result<()> {
        check_row(index, self.items.len())?;
        self.items[index] = value;
        Ok(())
    }

    pub fn as_slice(&self) -> &[T] {
        self.items
    }
}
