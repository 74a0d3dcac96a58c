//! # Typed Column Storage
//!
//! Columns are the storage unit of the engine: one typed array holding one
//! value per row across an entire table. Every column in a table keeps the
//! same row count, so row index `i` names the same logical record in each.
//!
//! ## Column Family
//!
//! | Column | Storage |
//! |--------|---------|
//! | [`NumberColumn<T>`] | dense `Vec<T>` of a fixed-width primitive |
//! | [`BooleanColumn`] | bit-packed words |
//! | [`NullableColumn<C>`] | inner column + optional presence bits |
//! | [`ListColumn<T>`] | per-row slice refs into a shared values column |
//! | [`DictionaryColumn<K, V>`] | per-row slice refs into parallel key/value columns |
//! | [`WrappingColumn<C, A>`] | type-converting adapter over any inner column |
//!
//! ## Contracts
//!
//! - [`Column`] is the object-safe structural capability set: `count`, `add`,
//!   `swap`, `remove_from_end`, `clear`, `trim`, tree `write`/`read`. Tables
//!   hold `Box<dyn Column>` and drive every structural mutation across all
//!   columns in lock-step.
//! - [`TypedColumn`] adds the element-typed indexer on top of [`Column`].
//! - [`ValuesColumn`] is the garbage collector's view of a shared backing
//!   column: shift a live range toward the front, truncate the dead tail.
//!
//! ## Deferred collection
//!
//! Replacing a row's list or dictionary content appends at the values tail
//! and orphans the old range; `swap`, `remove_from_end` and `clear` touch
//! only the indices. Orphans persist until `trim` runs the collector —
//! mutation never collects inline. See [`gc`].

pub mod boolean;
pub mod dict;
pub mod gc;
pub mod indices;
pub mod list;
pub mod nullable;
pub mod number;
pub mod wrapping;

pub use boolean::BooleanColumn;
pub use dict::{DictSlice, DictionaryColumn};
pub use indices::{IndicesColumn, SliceRef};
pub use list::{ListColumn, RowList};
pub use nullable::NullableColumn;
pub use number::NumberColumn;
pub use wrapping::{Adapter, WrappingColumn};

use std::any::Any;
use std::fmt;

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::error::{Error, Result};
use crate::tree::{TreeReader, TreeWriter};

/// Structural capability set shared by every column.
///
/// `count` always equals the owning table's row count. Structural operations
/// must be applied identically to every column of a table; [`Table`] is the
/// layer that guarantees this.
///
/// [`Table`]: crate::table::Table
pub trait Column {
    /// Number of rows stored.
    fn count(&self) -> usize;

    /// Appends one default-valued row.
    fn add(&mut self);

    /// Exchanges the stored values of two rows in place.
    fn swap(&mut self, a: usize, b: usize) -> Result<()>;

    /// Truncates the last `n` logical rows.
    fn remove_from_end(&mut self, n: usize) -> Result<()>;

    /// Empties the column to zero rows.
    fn clear(&mut self);

    /// Releases over-allocated backing capacity; indirect columns collect
    /// garbage first.
    fn trim(&mut self) -> Result<()>;

    /// Serializes the column through the tree protocol.
    fn write(&self, writer: &mut dyn TreeWriter) -> Result<()>;

    /// Deserializes the column through the tree protocol, replacing current
    /// contents.
    fn read(&mut self, reader: &mut dyn TreeReader) -> Result<()>;

    /// Downcast support for typed lookup through a table.
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// A column with an element-typed indexer.
pub trait TypedColumn: Column {
    type Elem;

    /// Bounds-checked read of one row's value.
    fn get(&self, row: usize) -> Result<Self::Elem>;

    /// Bounds-checked write of one row's value.
    fn set(&mut self, row: usize, value: Self::Elem) -> Result<()>;
}

/// The garbage collector's view of a shared values column.
///
/// Implementations move whole element ranges without interpreting them; the
/// collector guarantees `src >= dst` and in-bounds ranges.
pub trait ValuesColumn: Column {
    /// Copies `len` elements from `src` to `dst` within the column.
    fn shift_range(&mut self, src: usize, dst: usize, len: usize);

    /// Drops every element at or past `new_len`.
    fn truncate(&mut self, new_len: usize);
}

pub(crate) fn check_row(row: usize, count: usize) -> Result<()> {
    if row >= count {
        return Err(Error::bounds(format!(
            "row {row} out of bounds for column with {count} rows"
        )));
    }
    Ok(())
}

pub(crate) fn check_removal(n: usize, count: usize) -> Result<()> {
    if n > count {
        return Err(Error::bounds(format!(
            "cannot remove {n} rows from column with {count} rows"
        )));
    }
    Ok(())
}

/// Fixed-width primitive element type storable in a [`NumberColumn`].
///
/// The zerocopy bounds give the raw little-endian wire view used by
/// [`ArraySlice`](crate::slice::ArraySlice) serialization; the two methods
/// route single values through the tree protocol.
pub trait Scalar:
    Copy
    + Default
    + PartialEq
    + fmt::Debug
    + FromBytes
    + IntoBytes
    + Immutable
    + KnownLayout
    + Send
    + Sync
    + 'static
{
    fn write_value(&self, writer: &mut dyn TreeWriter) -> Result<()>;
    fn read_value(reader: &mut dyn TreeReader) -> Result<Self>;
}

macro_rules! unsigned_scalar {
    ($($t:ty),*) => {
        $(
            impl Scalar for $t {
                fn write_value(&self, writer: &mut dyn TreeWriter) -> Result<()> {
                    writer.value_u64(*self as u64)
                }

                fn read_value(reader: &mut dyn TreeReader) -> Result<Self> {
                    let value = reader.read_u64()?;
                    <$t>::try_from(value).map_err(|_| {
                        Error::format(format!(
                            "value {value} overflows {}",
                            stringify!($t)
                        ))
                    })
                }
            }
        )*
    };
}

macro_rules! signed_scalar {
    ($($t:ty),*) => {
        $(
            impl Scalar for $t {
                fn write_value(&self, writer: &mut dyn TreeWriter) -> Result<()> {
                    writer.value_i64(*self as i64)
                }

                fn read_value(reader: &mut dyn TreeReader) -> Result<Self> {
                    let value = reader.read_i64()?;
                    <$t>::try_from(value).map_err(|_| {
                        Error::format(format!(
                            "value {value} overflows {}",
                            stringify!($t)
                        ))
                    })
                }
            }
        )*
    };
}

macro_rules! float_scalar {
    ($($t:ty),*) => {
        $(
            impl Scalar for $t {
                fn write_value(&self, writer: &mut dyn TreeWriter) -> Result<()> {
                    writer.value_f64(*self as f64)
                }

                fn read_value(reader: &mut dyn TreeReader) -> Result<Self> {
                    Ok(reader.read_f64()? as $t)
                }
            }
        )*
    };
}

unsigned_scalar!(u8, u16, u32, u64);
signed_scalar!(i8, i16, i32, i64);
float_scalar!(f32, f64);
