//! Per-row references into a shared values column.
//!
//! Each row of an [`IndicesColumn`] holds a nullable [`SliceRef`] — an
//! `{offset, length}` pair addressing a run of the values column owned by a
//! [`ListColumn`](crate::column::ListColumn) or
//! [`DictionaryColumn`](crate::column::DictionaryColumn). Values are only
//! ever addressed through these entries, never by row number.
//!
//! Stored structure-of-arrays style: an offsets column, a lengths column and
//! a presence column, kept in lock-step by every structural operation.

use std::any::Any;

use crate::column::{BooleanColumn, Column, NumberColumn, TypedColumn};
use crate::error::Result;
use crate::tree::{names, TreeReader, TreeWriter};

/// One row's reference into a shared values column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SliceRef {
    pub offset: u32,
    pub length: u32,
}

impl SliceRef {
    pub fn new(offset: u32, length: u32) -> Self {
        Self { offset, length }
    }

    /// Exclusive end of the referenced run.
    pub fn end(&self) -> u32 {
        self.offset + self.length
    }
}

/// Column of nullable slice references, one per row.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct IndicesColumn {
    offsets: NumberColumn<u32>,
    lengths: NumberColumn<u32>,
    present: BooleanColumn,
}

impl IndicesColumn {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads one row's entry; `None` for rows whose content was never set or
    /// was set to null.
    pub fn entry(&self, row: usize) -> Result<Option<SliceRef>> {
        if !self.present.get(row)? {
            return Ok(None);
        }
        Ok(Some(SliceRef::new(
            self.offsets.get(row)?,
            self.lengths.get(row)?,
        )))
    }

    /// Overwrites one row's entry. The previously referenced run, if any,
    /// becomes orphaned until the next collection.
    pub fn set_entry(&mut self, row: usize, entry: Option<SliceRef>) -> Result<()> {
        match entry {
            Some(slice) => {
                self.offsets.set(row, slice.offset)?;
                self.lengths.set(row, slice.length)?;
                self.present.set(row, true)
            }
            None => {
                // Zero the pair so absent rows serialize canonically.
                self.offsets.set(row, 0)?;
                self.lengths.set(row, 0)?;
                self.present.set(row, false)
            }
        }
    }
}

impl Column for IndicesColumn {
    fn count(&self) -> usize {
        self.present.count()
    }

    fn add(&mut self) {
        self.offsets.add();
        self.lengths.add();
        self.present.add();
    }

    fn swap(&mut self, a: usize, b: usize) -> Result<()> {
        self.offsets.swap(a, b)?;
        self.lengths.swap(a, b)?;
        self.present.swap(a, b)
    }

    fn remove_from_end(&mut self, n: usize) -> Result<()> {
        self.offsets.remove_from_end(n)?;
        self.lengths.remove_from_end(n)?;
        self.present.remove_from_end(n)
    }

    fn clear(&mut self) {
        self.offsets.clear();
        self.lengths.clear();
        self.present.clear();
    }

    fn trim(&mut self) -> Result<()> {
        self.offsets.trim()?;
        self.lengths.trim()?;
        self.present.trim()
    }

    fn write(&self, writer: &mut dyn TreeWriter) -> Result<()> {
        writer.start_object()?;
        writer.field(names::OFFSETS)?;
        self.offsets.write(writer)?;
        writer.field(names::LENGTHS)?;
        self.lengths.write(writer)?;
        writer.field(names::PRESENT)?;
        self.present.write(writer)?;
        writer.end_object()
    }

    fn read(&mut self, reader: &mut dyn TreeReader) -> Result<()> {
        self.clear();
        reader.read_object(&mut |reader, name| match name {
            names::OFFSETS => {
                self.offsets.read(reader)?;
                Ok(true)
            }
            names::LENGTHS => {
                self.lengths.read(reader)?;
                Ok(true)
            }
            names::PRESENT => {
                self.present.read(reader)?;
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{JsonTreeReader, JsonTreeWriter};

    #[test]
    fn entries_default_to_absent() {
        let mut column = IndicesColumn::new();
        column.add();
        assert_eq!(column.entry(0).unwrap(), None);
    }

    #[test]
    fn set_and_clear_entries() {
        let mut column = IndicesColumn::new();
        column.add();
        column.add();

        column.set_entry(0, Some(SliceRef::new(4, 3))).unwrap();
        assert_eq!(column.entry(0).unwrap(), Some(SliceRef::new(4, 3)));
        assert_eq!(column.entry(1).unwrap(), None);

        column.set_entry(0, None).unwrap();
        assert_eq!(column.entry(0).unwrap(), None);
    }

    #[test]
    fn swap_moves_whole_entries() {
        let mut column = IndicesColumn::new();
        column.add();
        column.add();
        column.set_entry(0, Some(SliceRef::new(4, 3))).unwrap();

        column.swap(0, 1).unwrap();
        assert_eq!(column.entry(0).unwrap(), None);
        assert_eq!(column.entry(1).unwrap(), Some(SliceRef::new(4, 3)));
    }

    #[test]
    fn tree_round_trip() {
        let mut column = IndicesColumn::new();
        for i in 0..5u32 {
            column.add();
            if i % 2 == 0 {
                column
                    .set_entry(i as usize, Some(SliceRef::new(i * 10, i)))
                    .unwrap();
            }
        }

        let mut writer = JsonTreeWriter::new();
        column.write(&mut writer).unwrap();
        let document = writer.finish().unwrap();

        let mut restored = IndicesColumn::new();
        restored.read(&mut JsonTreeReader::new(&document)).unwrap();
        assert_eq!(column, restored);
    }
}
