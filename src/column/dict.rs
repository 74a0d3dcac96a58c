//! Variable-length dictionary column.
//!
//! Like [`ListColumn`](crate::column::ListColumn), but each row's run spans
//! two parallel values columns — keys and values — kept the same length and
//! compacted in lock-step by the collector. Lookup inside one row is a
//! linear scan over its slice; rows are expected to hold handfuls of pairs,
//! not indexes.

use std::any::Any;

use crate::column::{check_row, gc, Column, IndicesColumn, NumberColumn, Scalar, SliceRef,
    ValuesColumn};
use crate::error::{Error, Result};
use crate::slice::ArraySlice;
use crate::tree::{names, TreeReader, TreeWriter};

/// Column storing one key/value mapping per row over parallel values columns.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct DictionaryColumn<K: Scalar, V: Scalar> {
    indices: IndicesColumn,
    keys: NumberColumn<K>,
    values: NumberColumn<V>,
}

impl<K: Scalar, V: Scalar> DictionaryColumn<K, V> {
    pub fn new() -> Self {
        Self {
            indices: IndicesColumn::new(),
            keys: NumberColumn::new(),
            values: NumberColumn::new(),
        }
    }

    /// Total pairs stored, live and orphaned.
    pub fn pairs_len(&self) -> usize {
        self.keys.count()
    }

    /// True when the row has content (an empty mapping counts; a never-set
    /// or nulled row does not).
    pub fn has_value(&self, row: usize) -> Result<bool> {
        Ok(self.indices.entry(row)?.is_some())
    }

    /// Zero-copy view of one row's mapping. Absent rows read as empty.
    pub fn get(&self, row: usize) -> Result<DictSlice<'_, K, V>> {
        match self.indices.entry(row)? {
            None => Ok(DictSlice {
                keys: ArraySlice::empty(),
                values: ArraySlice::empty(),
            }),
            Some(entry) => Ok(DictSlice {
                keys: self.slice_for(self.keys.values(), entry)?,
                values: self.slice_for(self.values.values(), entry)?,
            }),
        }
    }

    /// Replaces one row's mapping, orphaning the previous run.
    pub fn set(&mut self, row: usize, pairs: &[(K, V)]) -> Result<()> {
        check_row(row, self.indices.count())?;
        let offset = self.keys.count() as u32;
        for (key, value) in pairs {
            self.keys.extend_from_slice(&[*key]);
            self.values.extend_from_slice(&[*value]);
        }
        self.indices
            .set_entry(row, Some(SliceRef::new(offset, pairs.len() as u32)))
    }

    /// Nulls one row's mapping, orphaning the previous run.
    pub fn set_null(&mut self, row: usize) -> Result<()> {
        check_row(row, self.indices.count())?;
        self.indices.set_entry(row, None)
    }

    fn slice_for<'a, T: Scalar>(
        &self,
        array: &'a [T],
        entry: SliceRef,
    ) -> Result<ArraySlice<'a, T>> {
        ArraySlice::new(array, entry.offset as usize, entry.length as usize).map_err(|_| {
            Error::consistency(format!(
                "indices entry {}..{} beyond pairs length {}",
                entry.offset,
                entry.end(),
                array.len()
            ))
        })
    }
}

impl<K: Scalar, V: Scalar> Column for DictionaryColumn<K, V> {
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
        self.keys.clear();
        self.values.clear();
    }

    fn trim(&mut self) -> Result<()> {
        let mut values: [&mut dyn ValuesColumn; 2] = [&mut self.keys, &mut self.values];
        gc::collect(&mut self.indices, &mut values)?;
        self.keys.trim()?;
        self.values.trim()?;
        self.indices.trim()
    }

    fn write(&self, writer: &mut dyn TreeWriter) -> Result<()> {
        writer.start_object()?;
        writer.field(names::INDICES)?;
        self.indices.write(writer)?;
        writer.field(names::KEYS)?;
        self.keys.write(writer)?;
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
            names::KEYS => {
                self.keys.read(reader)?;
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

/// Zero-copy view of one row's key/value pairs.
pub struct DictSlice<'a, K, V> {
    keys: ArraySlice<'a, K>,
    values: ArraySlice<'a, V>,
}

impl<'a, K: Scalar, V: Scalar> DictSlice<'a, K, V> {
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Linear lookup of `key` within this row.
    pub fn get(&self, key: K) -> Option<V> {
        self.iter().find(|(k, _)| *k == key).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (K, V)> + 'a {
        self.keys
            .iter()
            .copied()
            .zip(self.values.iter().copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{JsonTreeReader, JsonTreeWriter};

    fn column_with(rows: &[&[(u32, i64)]]) -> DictionaryColumn<u32, i64> {
        let mut column = DictionaryColumn::new();
        for row in rows {
            column.add();
            column.set(column.count() - 1, row).unwrap();
        }
        column
    }

    #[test]
    fn rows_default_to_empty() {
        let mut column = DictionaryColumn::<u32, i64>::new();
        column.add();
        assert!(!column.has_value(0).unwrap());
        assert!(column.get(0).unwrap().is_empty());
    }

    #[test]
    fn set_and_lookup() {
        let column = column_with(&[&[(1, 10), (2, 20)], &[(3, 30)]]);
        let row = column.get(0).unwrap();
        assert_eq!(row.len(), 2);
        assert_eq!(row.get(2), Some(20));
        assert_eq!(row.get(9), None);

        let pairs: Vec<_> = column.get(1).unwrap().iter().collect();
        assert_eq!(pairs, vec![(3, 30)]);
    }

    #[test]
    fn replacement_orphans_pairs_until_trim() {
        let mut column = column_with(&[&[(1, 10), (2, 20)], &[(3, 30)]]);
        column.set(0, &[(9, 90)]).unwrap();
        assert!(column.pairs_len() >= 4);

        column.trim().unwrap();
        assert_eq!(column.pairs_len(), 2);
        assert_eq!(column.get(0).unwrap().get(9), Some(90));
        assert_eq!(column.get(1).unwrap().get(3), Some(30));
    }

    #[test]
    fn swap_and_truncate_touch_only_indices() {
        let mut column = column_with(&[&[(1, 10)], &[(2, 20)]]);
        let pairs_before = column.pairs_len();

        column.swap(0, 1).unwrap();
        assert_eq!(column.get(0).unwrap().get(2), Some(20));
        assert_eq!(column.get(1).unwrap().get(1), Some(10));

        column.remove_from_end(1).unwrap();
        assert_eq!(column.count(), 1);
        assert_eq!(column.pairs_len(), pairs_before);
    }

    #[test]
    fn tree_round_trip() {
        let mut column = column_with(&[&[(1, 10), (2, 20)], &[(3, 30)]]);
        column.set_null(1).unwrap();

        let mut writer = JsonTreeWriter::new();
        column.write(&mut writer).unwrap();
        let document = writer.finish().unwrap();

        let mut restored = DictionaryColumn::<u32, i64>::new();
        restored.read(&mut JsonTreeReader::new(&document)).unwrap();
        assert_eq!(restored.get(0).unwrap().get(1), Some(10));
        assert!(!restored.has_value(1).unwrap());
    }
}
