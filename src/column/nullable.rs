//! Presence-tracking decorator column.
//!
//! Wraps an inner typed column so a row can be "not set" distinct from "set
//! to the default". Construction chooses between two modes:
//!
//! - `null_by_default = true`: presence bits are kept per row; unset rows
//!   read as `None`.
//! - `null_by_default = false`: no presence storage at all — absence and
//!   default collapse, and every row reads as `Some(value)`.
//!
//! Structural operations and serialization forward to the inner column; the
//! decorator only adds presence semantics to get/set.

use std::any::Any;

use crate::column::{BooleanColumn, Column, TypedColumn};
use crate::error::Result;
use crate::tree::{self, names, TreeReader, TreeWriter};

/// Decorator adding optional-value semantics to any typed column.
#[derive(Debug, Clone, PartialEq)]
pub struct NullableColumn<C> {
    inner: C,
    present: BooleanColumn,
    null_by_default: bool,
}

impl<C: TypedColumn> NullableColumn<C> {
    /// Wraps `inner`, which must be empty.
    pub fn new(inner: C, null_by_default: bool) -> Self {
        debug_assert_eq!(inner.count(), 0);
        Self {
            inner,
            present: BooleanColumn::new(),
            null_by_default,
        }
    }

    /// Access to the wrapped column.
    pub fn inner(&self) -> &C {
        &self.inner
    }

    /// Whether unset rows read as absent.
    pub fn null_by_default(&self) -> bool {
        self.null_by_default
    }
}

impl<C: TypedColumn + 'static> Column for NullableColumn<C>
where
    C::Elem: Default,
{
    fn count(&self) -> usize {
        self.inner.count()
    }

    fn add(&mut self) {
        self.inner.add();
        if self.null_by_default {
            self.present.add();
        }
    }

    fn swap(&mut self, a: usize, b: usize) -> Result<()> {
        self.inner.swap(a, b)?;
        if self.null_by_default {
            self.present.swap(a, b)?;
        }
        Ok(())
    }

    fn remove_from_end(&mut self, n: usize) -> Result<()> {
        self.inner.remove_from_end(n)?;
        if self.null_by_default {
            self.present.remove_from_end(n)?;
        }
        Ok(())
    }

    fn clear(&mut self) {
        self.inner.clear();
        self.present.clear();
    }

    fn trim(&mut self) -> Result<()> {
        self.inner.trim()?;
        self.present.trim()
    }

    fn write(&self, writer: &mut dyn TreeWriter) -> Result<()> {
        writer.start_object()?;
        writer.field(names::VALUES)?;
        self.inner.write(writer)?;
        if self.null_by_default {
            writer.field(names::PRESENT)?;
            self.present.write(writer)?;
        }
        writer.end_object()
    }

    fn read(&mut self, reader: &mut dyn TreeReader) -> Result<()> {
        // A stream without a "present" member is a collapse-mode column.
        self.present.clear();
        let mut saw_present = false;
        reader.read_object(&mut |reader, name| match name {
            names::VALUES => {
                self.inner.read(reader)?;
                Ok(true)
            }
            names::PRESENT => {
                self.present.read(reader)?;
                saw_present = true;
                Ok(true)
            }
            _ => Ok(false),
        })?;
        self.null_by_default = saw_present;
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl<C: TypedColumn + 'static> TypedColumn for NullableColumn<C>
where
    C::Elem: Default,
{
    type Elem = Option<C::Elem>;

    fn get(&self, row: usize) -> Result<Option<C::Elem>> {
        if self.null_by_default && !self.present.get(row)? {
            return Ok(None);
        }
        Ok(Some(self.inner.get(row)?))
    }

    fn set(&mut self, row: usize, value: Option<C::Elem>) -> Result<()> {
        match value {
            Some(value) => {
                self.inner.set(row, value)?;
                if self.null_by_default {
                    self.present.set(row, true)?;
                }
            }
            None => {
                // Absence collapses to the default in non-tracking mode.
                self.inner.set(row, C::Elem::default())?;
                if self.null_by_default {
                    self.present.set(row, false)?;
                }
            }
        }
        Ok(())
    }
}
