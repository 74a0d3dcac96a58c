//! # Zero-Copy Array Slices
//!
//! [`ArraySlice`] is a bounds-checked window into a contiguous range of a
//! shared backing array. It is the unit handed out by the variable-length
//! columns ([`ListColumn`](crate::column::ListColumn),
//! [`DictionaryColumn`](crate::column::DictionaryColumn)): a row's content is
//! a slice of the column's shared values array, never a per-row allocation.
//!
//! ## Invariants
//!
//! Construction enforces `start + length <= array.len()`, and `start <
//! array.len()` for non-empty slices (an empty slice only requires `start <=
//! array.len()`). Violations are [`Error::Bounds`], reported immediately.
//!
//! The slice never owns its array; its lifetime is tied to the borrow it was
//! built from. Mutation goes through the owning column, not the slice.
//!
//! ## Wire Format
//!
//! `write_binary` emits `[seven-bit-terminated count][count raw
//! little-endian elements]`. `read_binary` reproduces an equivalent owning
//! `Vec<T>`; slice a fresh view from it to continue zero-copy reads.

use std::fmt;

use crate::column::Scalar;
use crate::encoding::{NumberReader, NumberWriter};
use crate::error::{Error, Result};

/// Bounds-checked view over a contiguous range of a borrowed array.
#[derive(Clone, Copy)]
pub struct ArraySlice<'a, T> {
    array: &'a [T],
    start: usize,
    length: usize,
}

impl<'a, T> ArraySlice<'a, T> {
    /// Creates a slice over `array[start..start + length]`.
    ///
    /// Fails with [`Error::Bounds`] when `start` lies past the end of the
    /// array (for a non-empty slice, at or past the end) or when the range
    /// overruns the array.
    pub fn new(array: &'a [T], start: usize, length: usize) -> Result<Self> {
        if length == 0 {
            if start > array.len() {
                return Err(Error::bounds(format!(
                    "slice start {start} past array length {}",
                    array.len()
                )));
            }
        } else if start >= array.len() {
            return Err(Error::bounds(format!(
                "slice start {start} at or past array length {}",
                array.len()
            )));
        } else if start + length > array.len() {
            return Err(Error::bounds(format!(
                "slice range {start}..{} exceeds array length {}",
                start + length,
                array.len()
            )));
        }
        Ok(Self {
            array,
            start,
            length,
        })
    }

    /// Creates a slice covering the whole array.
    pub fn whole(array: &'a [T]) -> Self {
        Self {
            array,
            start: 0,
            length: array.len(),
        }
    }

    /// Creates a slice from `start` to the end of the array.
    pub fn starting_at(array: &'a [T], start: usize) -> Result<Self> {
        let length = array.len().saturating_sub(start);
        Self::new(array, start, length)
    }

    /// The empty slice.
    pub fn empty() -> ArraySlice<'static, T> {
        ArraySlice {
            array: &[],
            start: 0,
            length: 0,
        }
    }

    /// Number of elements visible through the slice.
    pub fn len(&self) -> usize {
        self.length
    }

    /// True when the slice covers no elements.
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Bounds-checked positional access.
    pub fn get(&self, index: usize) -> Result<&'a T> {
        if index >= self.length {
            return Err(Error::bounds(format!(
                "index {index} out of bounds for slice length {}",
                self.length
            )));
        }
        Ok(&self.array[self.start + index])
    }

    /// The viewed range as a plain slice.
    pub fn as_slice(&self) -> &'a [T] {
        &self.array[self.start..self.start + self.length]
    }

    /// Restartable forward iterator over the viewed elements.
    pub fn iter(&self) -> ArraySliceIter<'a, T> {
        ArraySliceIter {
            items: self.as_slice(),
            position: 0,
        }
    }
}

impl<'a, T: Copy> ArraySlice<'a, T> {
    /// Copies every element into `target` starting at `at`.
    pub fn copy_to(&self, target: &mut [T], at: usize) -> Result<()> {
        let end = at + self.length;
        if end > target.len() {
            return Err(Error::bounds(format!(
                "copy range {at}..{end} exceeds target length {}",
                target.len()
            )));
        }
        target[at..end].copy_from_slice(self.as_slice());
        Ok(())
    }
}

impl<'a, T: Scalar> ArraySlice<'a, T> {
    /// Writes `[varint count][raw little-endian elements]`.
    pub fn write_binary<W: std::io::Write>(&self, writer: &mut NumberWriter<W>) -> Result<()> {
        writer.write_seven_bit_terminated(self.length as u32)?;
        writer.write_raw(zerocopy::IntoBytes::as_bytes(self.as_slice()))
    }

    /// Reads the format produced by `write_binary` into an owning vector.
    pub fn read_binary<R: std::io::Read>(reader: &mut NumberReader<R>) -> Result<Vec<T>> {
        let count = reader.read_seven_bit_terminated()? as usize;
        let mut values = vec![T::default(); count];
        reader.read_raw(zerocopy::IntoBytes::as_mut_bytes(values.as_mut_slice()))?;
        Ok(values)
    }
}

impl<'a, 'b, T: PartialEq> PartialEq<ArraySlice<'b, T>> for ArraySlice<'a, T> {
    fn eq(&self, other: &ArraySlice<'b, T>) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<'a, T: PartialEq> PartialEq<[T]> for ArraySlice<'a, T> {
    fn eq(&self, other: &[T]) -> bool {
        self.as_slice() == other
    }
}

impl<'a, T: PartialEq, const N: usize> PartialEq<[T; N]> for ArraySlice<'a, T> {
    fn eq(&self, other: &[T; N]) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<'a, T: fmt::Debug> fmt::Debug for ArraySlice<'a, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.as_slice()).finish()
    }
}

impl<'a, T> IntoIterator for &ArraySlice<'a, T> {
    type Item = &'a T;
    type IntoIter = ArraySliceIter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Forward iterator over an [`ArraySlice`] that can be reset to the start.
pub struct ArraySliceIter<'a, T> {
    items: &'a [T],
    position: usize,
}

impl<'a, T> ArraySliceIter<'a, T> {
    /// Rewinds the iterator so the next call yields the first element again.
    pub fn reset(&mut self) {
        self.position = 0;
    }
}

impl<'a, T> Iterator for ArraySliceIter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        let item = self.items.get(self.position)?;
        self.position += 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.items.len() - self.position;
        (remaining, Some(remaining))
    }
}
