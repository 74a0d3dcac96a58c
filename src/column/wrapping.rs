//! Type-converting adapter column.
//!
//! [`WrappingColumn`] holds one inner column and forwards every structural
//! operation, write and read to it verbatim. Pairing it with an [`Adapter`]
//! yields a [`TypedColumn`] exposing a different element type — a new column
//! type is just a conversion, with the full structural contract inherited
//! from the inner column by construction.
//!
//! Composition instead of inheritance: the adapter is a value held by the
//! column, so stateful conversions (a row-reference column fixed to one
//! target table, for instance) fall out naturally.

use std::any::Any;

use crate::column::{Column, TypedColumn};
use crate::error::Result;
use crate::tree::{TreeReader, TreeWriter};

/// Two-way conversion between an inner column's element type and the type a
/// wrapping column exposes.
pub trait Adapter {
    type Inner;
    type Exposed;

    fn wrap(&self, inner: Self::Inner) -> Self::Exposed;
    fn unwrap(&self, exposed: Self::Exposed) -> Self::Inner;
}

/// Adapter column: inner storage `C`, exposed element type `A::Exposed`.
#[derive(Debug, Clone, PartialEq)]
pub struct WrappingColumn<C, A> {
    inner: C,
    adapter: A,
}

impl<C: Column, A> WrappingColumn<C, A> {
    pub fn new(inner: C, adapter: A) -> Self {
        Self { inner, adapter }
    }

    pub fn inner(&self) -> &C {
        &self.inner
    }

    pub fn inner_mut(&mut self) -> &mut C {
        &mut self.inner
    }
}

impl<C: Column + 'static, A: 'static> Column for WrappingColumn<C, A> {
    fn count(&self) -> usize {
        self.inner.count()
    }

    fn add(&mut self) {
        self.inner.add();
    }

    fn swap(&mut self, a: usize, b: usize) -> Result<()> {
        self.inner.swap(a, b)
    }

    fn remove_from_end(&mut self, n: usize) -> Result<()> {
        self.inner.remove_from_end(n)
    }

    fn clear(&mut self) {
        self.inner.clear();
    }

    fn trim(&mut self) -> Result<()> {
        self.inner.trim()
    }

    fn write(&self, writer: &mut dyn TreeWriter) -> Result<()> {
        self.inner.write(writer)
    }

    fn read(&mut self, reader: &mut dyn TreeReader) -> Result<()> {
        self.inner.read(reader)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl<C, A> TypedColumn for WrappingColumn<C, A>
where
    C: TypedColumn + 'static,
    A: Adapter<Inner = C::Elem> + 'static,
{
    type Elem = A::Exposed;

    fn get(&self, row: usize) -> Result<A::Exposed> {
        Ok(self.adapter.wrap(self.inner.get(row)?))
    }

    fn set(&mut self, row: usize, value: A::Exposed) -> Result<()> {
        self.inner.set(row, self.adapter.unwrap(value))
    }
}
