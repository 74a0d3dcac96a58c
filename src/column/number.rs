//! Dense primitive column.
//!
//! The simplest column: one fixed-width value per row in a growable array.
//! Also serves as the shared values column behind [`ListColumn`] and
//! [`DictionaryColumn`], which is why it implements [`ValuesColumn`].
//!
//! [`ListColumn`]: crate::column::ListColumn
//! [`DictionaryColumn`]: crate::column::DictionaryColumn

use std::any::Any;

use crate::column::{check_removal, check_row, Column, Scalar, TypedColumn, ValuesColumn};
use crate::error::Result;
use crate::tree::{TreeReader, TreeWriter};

/// Dense array column for a fixed-width primitive type.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct NumberColumn<T: Scalar> {
    values: Vec<T>,
}

impl<T: Scalar> NumberColumn<T> {
    pub fn new() -> Self {
        Self { values: Vec::new() }
    }

    /// The stored values as a plain slice (the backing array for slices
    /// handed out by list columns).
    pub fn values(&self) -> &[T] {
        &self.values
    }

    pub(crate) fn values_mut(&mut self) -> &mut [T] {
        &mut self.values
    }

    pub(crate) fn extend_from_slice(&mut self, items: &[T]) {
        self.values.extend_from_slice(items);
    }
}

impl<T: Scalar> Column for NumberColumn<T> {
    fn count(&self) -> usize {
        self.values.len()
    }

    fn add(&mut self) {
        self.values.push(T::default());
    }

    fn swap(&mut self, a: usize, b: usize) -> Result<()> {
        check_row(a, self.values.len())?;
        check_row(b, self.values.len())?;
        self.values.swap(a, b);
        Ok(())
    }

    fn remove_from_end(&mut self, n: usize) -> Result<()> {
        check_removal(n, self.values.len())?;
        self.values.truncate(self.values.len() - n);
        Ok(())
    }

    fn clear(&mut self) {
        self.values.clear();
    }

    fn trim(&mut self) -> Result<()> {
        self.values.shrink_to_fit();
        Ok(())
    }

    fn write(&self, writer: &mut dyn TreeWriter) -> Result<()> {
        writer.start_list()?;
        for value in &self.values {
            value.write_value(writer)?;
        }
        writer.end_list()
    }

    fn read(&mut self, reader: &mut dyn TreeReader) -> Result<()> {
        self.values.clear();
        reader.read_list(&mut |reader| {
            self.values.push(T::read_value(reader)?);
            Ok(())
        })
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl<T: Scalar> TypedColumn for NumberColumn<T> {
    type Elem = T;

    fn get(&self, row: usize) -> Result<T> {
        check_row(row, self.values.len())?;
        Ok(self.values[row])
    }

    fn set(&mut self, row: usize, value: T) -> Result<()> {
        check_row(row, self.values.len())?;
        self.values[row] = value;
        Ok(())
    }
}

impl<T: Scalar> ValuesColumn for NumberColumn<T> {
    fn shift_range(&mut self, src: usize, dst: usize, len: usize) {
        self.values.copy_within(src..src + len, dst);
    }

    fn truncate(&mut self, new_len: usize) {
        self.values.truncate(new_len);
    }
}
