//! Bit-packed boolean column.
//!
//! One bit per row, packed into `u32` words. Used standalone and as the
//! presence storage inside [`NullableColumn`](crate::column::NullableColumn)
//! and [`IndicesColumn`](crate::column::IndicesColumn).
//!
//! Truncation re-zeroes the freed tail bits so that two columns with equal
//! logical content always serialize identically.

use std::any::Any;

use crate::column::{check_removal, check_row, Column, TypedColumn};
use crate::error::Result;
use crate::tree::{self, names, TreeReader, TreeWriter};

const BITS_PER_WORD: usize = 32;

/// Dense boolean column, 32 rows per backing word.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct BooleanColumn {
    words: Vec<u32>,
    count: usize,
}

impl BooleanColumn {
    pub fn new() -> Self {
        Self::default()
    }

    fn locate(row: usize) -> (usize, u32) {
        (row / BITS_PER_WORD, 1u32 << (row % BITS_PER_WORD))
    }
}

impl Column for BooleanColumn {
    fn count(&self) -> usize {
        self.count
    }

    fn add(&mut self) {
        self.count += 1;
        let words_needed = self.count.div_ceil(BITS_PER_WORD);
        if self.words.len() < words_needed {
            self.words.push(0);
        }
    }

    fn swap(&mut self, a: usize, b: usize) -> Result<()> {
        let left = self.get(a)?;
        let right = self.get(b)?;
        self.set(a, right)?;
        self.set(b, left)
    }

    fn remove_from_end(&mut self, n: usize) -> Result<()> {
        check_removal(n, self.count)?;
        self.count -= n;
        self.words.truncate(self.count.div_ceil(BITS_PER_WORD));
        // Zero the partial tail word so freed rows leave no residue.
        let tail_bits = self.count % BITS_PER_WORD;
        if tail_bits != 0 {
            if let Some(last) = self.words.last_mut() {
                *last &= (1u32 << tail_bits) - 1;
            }
        }
        Ok(())
    }

    fn clear(&mut self) {
        self.words.clear();
        self.count = 0;
    }

    fn trim(&mut self) -> Result<()> {
        self.words.shrink_to_fit();
        Ok(())
    }

    fn write(&self, writer: &mut dyn TreeWriter) -> Result<()> {
        writer.start_object()?;
        tree::field_u64(writer, names::COUNT, self.count as u64, 0)?;
        tree::field_list(writer, names::WORDS, &self.words, |w, word| {
            w.value_u64(*word as u64)
        })?;
        writer.end_object()
    }

    fn read(&mut self, reader: &mut dyn TreeReader) -> Result<()> {
        self.clear();
        let mut count = 0usize;
        let mut words = Vec::new();
        reader.read_object(&mut |reader, name| match name {
            names::COUNT => {
                count = reader.read_u64()? as usize;
                Ok(true)
            }
            names::WORDS => {
                reader.read_list(&mut |reader| {
                    words.push(u32::try_from(reader.read_u64()?).map_err(|_| {
                        crate::error::Error::format("boolean word overflows u32")
                    })?);
                    Ok(())
                })?;
                Ok(true)
            }
            _ => Ok(false),
        })?;
        if words.len() != count.div_ceil(BITS_PER_WORD) {
            return Err(crate::error::Error::format(format!(
                "boolean column declares {count} rows but carries {} words",
                words.len()
            )));
        }
        self.count = count;
        self.words = words;
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl TypedColumn for BooleanColumn {
    type Elem = bool;

    fn get(&self, row: usize) -> Result<bool> {
        check_row(row, self.count)?;
        let (word, mask) = Self::locate(row);
        Ok(self.words[word] & mask != 0)
    }

    fn set(&mut self, row: usize, value: bool) -> Result<()> {
        check_row(row, self.count)?;
        let (word, mask) = Self::locate(row);
        if value {
            self.words[word] |= mask;
        } else {
            self.words[word] &= !mask;
        }
        Ok(())
    }
}
