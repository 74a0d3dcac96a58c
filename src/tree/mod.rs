//! # Tree Serialization Protocol
//!
//! Format-agnostic reader/writer abstraction for the document shape every
//! column serializes to: objects with named members, lists, string-keyed
//! mappings, and primitive values. Columns and the table/database layer are
//! written against [`TreeWriter`] and [`TreeReader`] only — never against
//! JSON text or byte streams directly — so swapping the physical format
//! requires no change above this layer.
//!
//! Exactly two implementations exist:
//!
//! - [`json::JsonTreeWriter`] / [`json::JsonTreeReader`]: JSON documents via
//!   `serde_json`.
//! - [`binary::BinaryTreeWriter`] / [`binary::BinaryTreeReader`]: the compact
//!   binary form over the [`encoding`](crate::encoding) number codec.
//!
//! Both produce the same logical document.
//!
//! ## Forward compatibility
//!
//! [`TreeReader::read_object`] dispatches each member to a caller-supplied
//! visitor keyed by name. The visitor returns `Ok(false)` for members it does
//! not recognize, and the reader skips them — unknown fields are tolerated,
//! never errors.
//!
//! ## Default suppression
//!
//! The `field_*` helpers omit members whose value equals a caller-supplied
//! default, keeping documents sparse. Readers must therefore treat a missing
//! member as "default", which the dispatch-by-name model gives for free.

pub mod binary;
pub mod json;

pub use binary::{BinaryTreeReader, BinaryTreeWriter};
pub use json::{JsonTreeReader, JsonTreeWriter};

use crate::error::Result;

/// Reserved member names shared by the column serializers and the generated
/// layer above the core.
pub mod names {
    pub const INDICES: &str = "indices";
    pub const VALUES: &str = "values";
    pub const KEYS: &str = "keys";
    pub const OFFSETS: &str = "offsets";
    pub const LENGTHS: &str = "lengths";
    pub const PRESENT: &str = "present";
    pub const COUNT: &str = "count";
    pub const WORDS: &str = "words";
    pub const COLUMNS: &str = "columns";
    pub const TABLES: &str = "tables";
    pub const ROOT: &str = "root";

    /// Reserved key under which the external generated layer serializes its
    /// property bag.
    pub const PROPERTIES: &str = "_properties";
}

/// Token-level writer for the tree document model.
///
/// Object-safe by design: columns hold `&mut dyn TreeWriter`, and the
/// structured helpers ([`field_u64`], [`field_list`], ...) are free functions
/// over the trait.
pub trait TreeWriter {
    fn start_object(&mut self) -> Result<()>;
    fn end_object(&mut self) -> Result<()>;
    /// Names the next value written as a member of the enclosing object.
    fn field(&mut self, name: &str) -> Result<()>;
    fn start_list(&mut self) -> Result<()>;
    fn end_list(&mut self) -> Result<()>;
    fn value_u64(&mut self, value: u64) -> Result<()>;
    fn value_i64(&mut self, value: i64) -> Result<()>;
    fn value_f64(&mut self, value: f64) -> Result<()>;
    fn value_bool(&mut self, value: bool) -> Result<()>;
    fn value_str(&mut self, value: &str) -> Result<()>;
    fn value_null(&mut self) -> Result<()>;
}

/// Token-level reader, the dual of [`TreeWriter`].
pub trait TreeReader {
    /// Iterates the current object's members, calling `visit` with a reader
    /// positioned at each member's value. `visit` returns `Ok(false)` for
    /// unknown members, which are skipped.
    fn read_object(
        &mut self,
        visit: &mut dyn FnMut(&mut dyn TreeReader, &str) -> Result<bool>,
    ) -> Result<()>;

    /// Iterates the current list, calling `visit` once per element.
    fn read_list(&mut self, visit: &mut dyn FnMut(&mut dyn TreeReader) -> Result<()>)
        -> Result<()>;

    fn read_u64(&mut self) -> Result<u64>;
    fn read_i64(&mut self) -> Result<i64>;
    fn read_f64(&mut self) -> Result<f64>;
    fn read_bool(&mut self) -> Result<bool>;
    fn read_str(&mut self) -> Result<String>;

    /// Consumes the current value without interpreting it.
    fn skip(&mut self) -> Result<()>;
}

/// Writes `name: value`, omitting the member when `value == default`.
pub fn field_u64(
    writer: &mut dyn TreeWriter,
    name: &str,
    value: u64,
    default: u64,
) -> Result<()> {
    if value != default {
        writer.field(name)?;
        writer.value_u64(value)?;
    }
    Ok(())
}

/// Writes `name: value`, omitting the member when `value == default`.
pub fn field_str(
    writer: &mut dyn TreeWriter,
    name: &str,
    value: &str,
    default: &str,
) -> Result<()> {
    if value != default {
        writer.field(name)?;
        writer.value_str(value)?;
    }
    Ok(())
}

/// Writes `name: [..]` with one callback invocation per element.
pub fn field_list<T>(
    writer: &mut dyn TreeWriter,
    name: &str,
    items: &[T],
    mut each: impl FnMut(&mut dyn TreeWriter, &T) -> Result<()>,
) -> Result<()> {
    writer.field(name)?;
    writer.start_list()?;
    for item in items {
        each(writer, item)?;
    }
    writer.end_list()
}

/// Writes `name: {..}` with the body supplied by a callback.
pub fn field_object(
    writer: &mut dyn TreeWriter,
    name: &str,
    body: impl FnOnce(&mut dyn TreeWriter) -> Result<()>,
) -> Result<()> {
    writer.field(name)?;
    writer.start_object()?;
    body(writer)?;
    writer.end_object()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Writes one document exercising every token kind. Shared by the JSON
    /// and binary implementation tests so both formats stay logically equal.
    pub(crate) fn write_sample(writer: &mut dyn TreeWriter) -> Result<()> {
        writer.start_object()?;
        field_u64(writer, "count", 3, 0)?;
        field_u64(writer, "omitted", 0, 0)?;
        field_str(writer, "title", "columns", "")?;
        field_list(writer, "values", &[1u64, 2, 3], |w, v| w.value_u64(*v))?;
        field_object(writer, "nested", |w| {
            w.field("signed")?;
            w.value_i64(-42)?;
            w.field("ratio")?;
            w.value_f64(0.5)?;
            w.field("flag")?;
            w.value_bool(true)?;
            w.field("missing")?;
            w.value_null()
        })?;
        writer.end_object()
    }

    /// Reads the document produced by [`write_sample`] and asserts every
    /// member, tolerating unknown members.
    pub(crate) fn read_sample(reader: &mut dyn TreeReader) -> Result<()> {
        let mut count = 0u64;
        let mut title = String::new();
        let mut values = Vec::new();
        let mut signed = 0i64;
        let mut ratio = 0.0f64;
        let mut flag = false;
        reader.read_object(&mut |reader, name| match name {
            "count" => {
                count = reader.read_u64()?;
                Ok(true)
            }
            "title" => {
                title = reader.read_str()?;
                Ok(true)
            }
            "values" => {
                reader.read_list(&mut |reader| {
                    values.push(reader.read_u64()?);
                    Ok(())
                })?;
                Ok(true)
            }
            "nested" => {
                reader.read_object(&mut |reader, name| match name {
                    "signed" => {
                        signed = reader.read_i64()?;
                        Ok(true)
                    }
                    "ratio" => {
                        ratio = reader.read_f64()?;
                        Ok(true)
                    }
                    "flag" => {
                        flag = reader.read_bool()?;
                        Ok(true)
                    }
                    _ => Ok(false),
                })?;
                Ok(true)
            }
            _ => Ok(false),
        })?;

        assert_eq!(count, 3);
        assert_eq!(title, "columns");
        assert_eq!(values, vec![1, 2, 3]);
        assert_eq!(signed, -42);
        assert_eq!(ratio, 0.5);
        assert!(flag);
        Ok(())
    }
}
