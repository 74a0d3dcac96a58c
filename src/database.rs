//! # Database
//!
//! A database is a named collection of [`Table`]s plus an optional root table
//! designation. It exists for two things: cross-table row references and
//! whole-graph serialization.
//!
//! Rows in one table point at rows in another through [`RowRef`] values
//! stored in a [`RefColumn`], a `u32` column wrapped with an adapter fixed
//! to its target table at construction. The reference is an index, nothing
//! more: removing or swapping rows in the target table invalidates stored
//! references, and keeping them coherent is the caller's job (typically by
//! only removing from the end, or by rewriting reference columns after a
//! swap-removal).

use std::io::{Read, Write};

use hashbrown::HashMap;
use tracing::debug;

use crate::column::{Adapter, NumberColumn, TypedColumn, WrappingColumn};
use crate::error::{Error, Result};
use crate::table::Table;
use crate::tree::{
    self, names, BinaryTreeReader, BinaryTreeWriter, JsonTreeReader, JsonTreeWriter, TreeReader,
    TreeWriter,
};

/// Stable identifier of one table within its database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TableId(pub u32);

/// One row of one table, addressable across tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RowRef {
    pub table: TableId,
    pub row: u32,
}

impl RowRef {
    pub fn new(table: TableId, row: u32) -> Self {
        Self { table, row }
    }
}

/// Adapter fixing a `u32` column to rows of one target table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RefAdapter {
    target: TableId,
}

impl RefAdapter {
    pub fn new(target: TableId) -> Self {
        Self { target }
    }
}

impl Adapter for RefAdapter {
    type Inner = u32;
    type Exposed = RowRef;

    fn wrap(&self, inner: u32) -> RowRef {
        RowRef::new(self.target, inner)
    }

    fn unwrap(&self, exposed: RowRef) -> u32 {
        debug_assert_eq!(exposed.table, self.target);
        exposed.row
    }
}

/// Column of row references into one fixed target table.
///
/// Serialized form is the bare `u32` column; the target binding is schema,
/// re-established at construction time.
pub type RefColumn = WrappingColumn<NumberColumn<u32>, RefAdapter>;

/// Builds a reference column targeting `table`.
pub fn ref_column(table: TableId) -> RefColumn {
    WrappingColumn::new(NumberColumn::new(), RefAdapter::new(table))
}

/// Named collection of tables with an optional root.
#[derive(Default)]
pub struct Database {
    tables: Vec<(String, Table)>,
    by_name: HashMap<String, TableId>,
    root: Option<String>,
}

impl Database {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `table` under `name`, returning its identifier.
    pub fn add_table(&mut self, name: impl Into<String>, table: Table) -> Result<TableId> {
        let name = name.into();
        if self.by_name.contains_key(&name) {
            return Err(Error::consistency(format!(
                "database already has a table named '{name}'"
            )));
        }
        let id = TableId(self.tables.len() as u32);
        self.by_name.insert(name.clone(), id);
        self.tables.push((name, table));
        Ok(id)
    }

    /// Designates the root table; it must already be registered.
    pub fn set_root(&mut self, name: impl Into<String>) -> Result<()> {
        let name = name.into();
        if !self.by_name.contains_key(&name) {
            return Err(Error::consistency(format!(
                "cannot set unknown table '{name}' as root"
            )));
        }
        self.root = Some(name);
        Ok(())
    }

    /// The root table, if one has been designated.
    pub fn root(&self) -> Option<&Table> {
        self.root.as_deref().and_then(|name| self.table_by_name(name))
    }

    pub fn root_name(&self) -> Option<&str> {
        self.root.as_deref()
    }

    pub fn table_id(&self, name: &str) -> Option<TableId> {
        self.by_name.get(name).copied()
    }

    pub fn table(&self, id: TableId) -> Option<&Table> {
        self.tables.get(id.0 as usize).map(|(_, table)| table)
    }

    pub fn table_mut(&mut self, id: TableId) -> Option<&mut Table> {
        self.tables.get_mut(id.0 as usize).map(|(_, table)| table)
    }

    pub fn table_by_name(&self, name: &str) -> Option<&Table> {
        self.table_id(name).and_then(|id| self.table(id))
    }

    pub fn table_by_name_mut(&mut self, name: &str) -> Option<&mut Table> {
        self.table_id(name).and_then(|id| self.table_mut(id))
    }

    /// Resolves a row reference to a handle for typed reads.
    pub fn handle(&self, row_ref: RowRef) -> Result<RowHandle<'_>> {
        let table = self
            .table(row_ref.table)
            .ok_or_else(|| Error::bounds(format!("no table with id {}", row_ref.table.0)))?;
        if (row_ref.row as usize) >= table.count() {
            return Err(Error::bounds(format!(
                "row {} out of bounds for table with {} rows",
                row_ref.row,
                table.count()
            )));
        }
        Ok(RowHandle {
            table,
            row: row_ref.row as usize,
        })
    }

    /// Trims every table, collecting all deferred garbage.
    pub fn trim(&mut self) -> Result<()> {
        for (name, table) in &mut self.tables {
            table.trim()?;
            debug!(table = name.as_str(), rows = table.count(), "trimmed table");
        }
        Ok(())
    }

    /// Serializes as `{root, tables: {name: table, ...}}`.
    pub fn write(&self, writer: &mut dyn TreeWriter) -> Result<()> {
        writer.start_object()?;
        tree::field_str(writer, names::ROOT, self.root.as_deref().unwrap_or(""), "")?;
        writer.field(names::TABLES)?;
        writer.start_object()?;
        for (name, table) in &self.tables {
            writer.field(name)?;
            table.write(writer)?;
        }
        writer.end_object()?;
        writer.end_object()
    }

    /// Deserializes into the registered tables. Stream tables with no
    /// registered counterpart are skipped.
    pub fn read(&mut self, reader: &mut dyn TreeReader) -> Result<()> {
        let mut root = None;
        let tables = &mut self.tables;
        reader.read_object(&mut |reader, name| match name {
            names::ROOT => {
                root = Some(reader.read_str()?);
                Ok(true)
            }
            names::TABLES => {
                reader.read_object(&mut |reader, table_name| {
                    match tables
                        .iter_mut()
                        .find(|(existing, _)| existing == table_name)
                    {
                        Some((_, table)) => {
                            table.read(reader)?;
                            Ok(true)
                        }
                        None => Ok(false),
                    }
                })?;
                Ok(true)
            }
            _ => Ok(false),
        })?;
        self.root = root.filter(|name| !name.is_empty());
        if let Some(name) = &self.root {
            if !self.by_name.contains_key(name) {
                return Err(Error::format(format!(
                    "stream designates unknown table '{name}' as root"
                )));
            }
        }
        Ok(())
    }

    /// Serializes the whole database to a JSON document.
    pub fn to_json(&self) -> Result<serde_json::Value> {
        let mut writer = JsonTreeWriter::new();
        self.write(&mut writer)?;
        writer.finish()
    }

    /// Deserializes the whole database from a JSON document.
    pub fn from_json(&mut self, document: &serde_json::Value) -> Result<()> {
        self.read(&mut JsonTreeReader::new(document))
    }

    /// Serializes to the binary format, returning the bytes written.
    pub fn write_binary<W: Write>(&self, out: W) -> Result<u64> {
        let mut writer = BinaryTreeWriter::new(out);
        self.write(&mut writer)?;
        let written = writer.bytes_written();
        writer.into_inner()?;
        Ok(written)
    }

    /// Deserializes from the binary format, returning the bytes consumed.
    pub fn read_binary<R: Read>(&mut self, input: R) -> Result<u64> {
        let mut reader = BinaryTreeReader::new(input);
        self.read(&mut reader)?;
        Ok(reader.bytes_read())
    }
}

/// Borrowed view of one row, produced by [`Database::handle`].
pub struct RowHandle<'a> {
    table: &'a Table,
    row: usize,
}

impl<'a> RowHandle<'a> {
    pub fn table(&self) -> &'a Table {
        self.table
    }

    pub fn row(&self) -> usize {
        self.row
    }

    /// Reads this row's value from the named column.
    pub fn get<C: TypedColumn + 'static>(&self, column: &str) -> Result<C::Elem> {
        self.table
            .column::<C>(column)
            .ok_or_else(|| Error::bounds(format!("no column named '{column}'")))?
            .get(self.row)
    }
}
