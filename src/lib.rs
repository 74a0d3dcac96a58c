//! # soadb
//!
//! An embedded structure-of-arrays persistence engine. Object graphs are
//! stored as tables of typed columns rather than as individual record
//! objects: every column is one dense array, rows are indices, and
//! variable-length content (lists, dictionaries) lives in shared backing
//! arrays referenced by per-row slice entries.
//!
//! The layout buys three things at once: near-zero per-row overhead, cheap
//! whole-column serialization, and mutation that never moves unrelated data.
//! The price is indirection — replacing a row's list orphans its old range,
//! and reclaiming that garbage is deferred to an explicit [`trim`].
//!
//! ## Architecture
//!
//! ```text
//!   Database ─ named tables + optional root, cross-table RowRefs
//!      │
//!   Table ──── named columns kept in row lock-step
//!      │
//!   Columns ── NumberColumn / BooleanColumn / NullableColumn
//!      │       ListColumn / DictionaryColumn / WrappingColumn
//!      │
//!   Tree ───── format-agnostic document protocol (JSON and binary)
//!      │
//!   Encoding ─ variable-width number codecs over io::Read / io::Write
//! ```
//!
//! ## Modules
//!
//! - [`column`]: the typed column family and the values-column garbage
//!   collector.
//! - [`table`] / [`database`]: row lock-step management, cross-table
//!   references, whole-graph serialization.
//! - [`tree`]: the writer/reader protocol both serialization formats
//!   implement.
//! - [`encoding`]: seven-bit and six-bit variable-width integer codecs and
//!   the int block format.
//! - [`slice`]: bounds-checked zero-copy array views.
//!
//! [`trim`]: crate::database::Database::trim

pub mod column;
pub mod database;
pub mod encoding;
pub mod error;
pub mod slice;
pub mod table;
pub mod tree;

pub use column::{
    Adapter, BooleanColumn, Column, DictSlice, DictionaryColumn, IndicesColumn, ListColumn,
    NullableColumn, NumberColumn, RowList, Scalar, SliceRef, TypedColumn, WrappingColumn,
};
pub use database::{ref_column, Database, RefAdapter, RefColumn, RowHandle, RowRef, TableId};
pub use error::{Error, Result};
pub use slice::ArraySlice;
pub use table::Table;
