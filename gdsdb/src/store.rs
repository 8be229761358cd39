//!
//! # Gds Cell Stores
//!
//! Persistent, cell-indexed storage for GDSII libraries.
//!
//! A store holds two tables of named byte-blobs:
//! * An "info" table, holding the raw payloads of the library-level records
//!   (`HEADER`, `BGNLIB`, `LIBNAME`, `UNITS`), and
//! * A "cell" table, holding each struct's raw `BGNSTR` through `ENDSTR` bytes, keyed by struct name.
//!
//! Libraries re-opened from a store, via [GdsLibrary::open_store], load each struct's content on demand.
//!

// Std-Lib Imports
use std::collections::HashMap;
use std::fmt::Debug;
use std::io::{Read, Seek};
use std::path::Path;

// Crates.io
use rusqlite::{Connection, OptionalExtension};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

// Local Imports
use crate::error::{GdsError, GdsResult};
use crate::read::{GdsLibScan, GdsReader, GdsScanner};
use crate::ser::SerdeFile;

///
/// # Gds Store Trait
///
/// Named byte-blob storage, organized into tables.
/// Each blob is identified by its table and a string `id`.
///
pub trait GdsStore: Debug {
    /// Adopt the column names of `schema` for all subsequent operations.
    /// Stores without named columns need not override this.
    fn use_schema(&mut self, _schema: &GdsStoreSchema) {}
    /// Drop, if present, and (re-)create the info and cell tables of `schema`.
    /// Also adopts `schema`, as in [GdsStore::use_schema].
    fn create_tables(&mut self, schema: &GdsStoreSchema) -> GdsResult<()>;
    /// Store `data` under `id` in `table`.
    /// Existing entries are replaced in place, keeping their position in [GdsStore::names].
    fn put(&mut self, table: &str, id: &str, data: &[u8]) -> GdsResult<()>;
    /// Store a batch of `(id, data)` entries in `table`
    fn put_many(&mut self, table: &str, entries: &[(String, Vec<u8>)]) -> GdsResult<()> {
        for (id, data) in entries {
            self.put(table, id, data)?;
        }
        Ok(())
    }
    /// Fetch the blob stored under `id` in `table`, if any
    fn get(&self, table: &str, id: &str) -> GdsResult<Option<Vec<u8>>>;
    /// Remove the entry `id` from `table`, if present
    fn remove(&mut self, table: &str, id: &str) -> GdsResult<()>;
    /// List all ids in `table`, in insertion order
    fn names(&self, table: &str) -> GdsResult<Vec<String>>;
}

///
/// # Gds Store Schema
///
/// Table, column, and key names for a [GdsStore].
/// Loadable from JSON, YAML, or TOML; any missing fields take their default values.
///
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(default)]
pub struct GdsStoreSchema {
    /// Library-info table name
    pub info_table: String,
    /// Struct (cell) table name
    pub cell_table: String,
    /// Id column name, shared by both tables
    pub id_column: String,
    /// Data column name, shared by both tables
    pub data_column: String,
    /// Info key for the `HEADER` version
    pub version_key: String,
    /// Info key for the library modification date
    pub mod_time_key: String,
    /// Info key for the library access date
    pub acc_time_key: String,
    /// Info key for the library name
    pub lib_name_key: String,
    /// Info key for the library units
    pub units_key: String,
}
impl Default for GdsStoreSchema {
    fn default() -> Self {
        Self {
            info_table: "db_info_table".into(),
            cell_table: "cell_table".into(),
            id_column: "ID".into(),
            data_column: "DATA".into(),
            version_key: "GDS_VERSION".into(),
            mod_time_key: "MOD_TIME".into(),
            acc_time_key: "ACC_TIME".into(),
            lib_name_key: "LIB_NAME".into(),
            units_key: "UNITS".into(),
        }
    }
}
impl SerdeFile for GdsStoreSchema {}

/// # Store Connection
/// A [GdsStore] attached to a [crate::GdsLibrary], along with its schema
#[derive(Debug)]
pub struct GdsStoreConn {
    pub(crate) store: Box<dyn GdsStore>,
    pub(crate) schema: GdsStoreSchema,
}
impl GdsStoreConn {
    /// Fetch the blob `id` from `table`, failing if it is not present
    pub(crate) fn fetch(&self, table: &str, id: &str) -> GdsResult<Vec<u8>> {
        self.store
            .get(table, id)?
            .ok_or_else(|| GdsError::Store(format!("Missing entry {} in table {}", id, table)))
    }
}

///
/// # SQLite Store
///
/// [GdsStore] backed by an SQLite database, either on disk or in memory.
///
#[derive(Debug)]
pub struct SqliteStore {
    conn: Connection,
    id_column: String,
    data_column: String,
}
impl SqliteStore {
    /// Open (or create) the database file at `path`
    pub fn open(path: impl AsRef<Path>) -> GdsResult<Self> {
        Ok(Self::new(Connection::open(path)?))
    }
    /// Open a new in-memory database
    pub fn open_in_memory() -> GdsResult<Self> {
        Ok(Self::new(Connection::open_in_memory()?))
    }
    fn new(conn: Connection) -> Self {
        let schema = GdsStoreSchema::default();
        Self {
            conn,
            id_column: schema.id_column,
            data_column: schema.data_column,
        }
    }
    /// Use the column names of `schema`, for databases created with non-default schemas
    pub fn with_schema(mut self, schema: &GdsStoreSchema) -> Self {
        self.use_schema(schema);
        self
    }
    fn delete_stmt(&self, table: &str) -> String {
        format!(
            "DELETE FROM {} WHERE {} = ?1;",
            ident(table),
            ident(&self.id_column)
        )
    }
    fn update_stmt(&self, table: &str) -> String {
        format!(
            "UPDATE {} SET {} = ?2 WHERE {} = ?1;",
            ident(table),
            ident(&self.data_column),
            ident(&self.id_column)
        )
    }
    fn insert_stmt(&self, table: &str) -> String {
        format!(
            "INSERT INTO {} ({}, {}) VALUES (?1, ?2);",
            ident(table),
            ident(&self.id_column),
            ident(&self.data_column)
        )
    }
}
/// Quote SQL identifier `name`.
/// Grave accents, unlike double quotes, are never re-interpreted by SQLite as string literals,
/// so unknown table or column names fail.
fn ident(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}
impl GdsStore for SqliteStore {
    fn use_schema(&mut self, schema: &GdsStoreSchema) {
        self.id_column = schema.id_column.clone();
        self.data_column = schema.data_column.clone();
    }
    fn create_tables(&mut self, schema: &GdsStoreSchema) -> GdsResult<()> {
        self.use_schema(schema);
        let (info, cell) = (ident(&schema.info_table), ident(&schema.cell_table));
        let (id, data) = (ident(&schema.id_column), ident(&schema.data_column));
        let stmts = format!(
            r#"
            DROP TABLE IF EXISTS {info};
            DROP TABLE IF EXISTS {cell};
            CREATE TABLE {info} ({id} TEXT NOT NULL, {data} BLOB NOT NULL);
            CREATE TABLE {cell} ({id} TEXT NOT NULL, {data} BLOB);
            "#,
            info = info,
            cell = cell,
            id = id,
            data = data,
        );
        self.conn.execute_batch(&stmts)?;
        Ok(())
    }
    fn put(&mut self, table: &str, id: &str, data: &[u8]) -> GdsResult<()> {
        self.put_many(table, &[(id.to_string(), data.to_vec())])
    }
    /// Store all `entries` in a single transaction
    fn put_many(&mut self, table: &str, entries: &[(String, Vec<u8>)]) -> GdsResult<()> {
        let (update, insert) = (self.update_stmt(table), self.insert_stmt(table));
        let tx = self.conn.transaction()?;
        {
            let mut update = tx.prepare(&update)?;
            let mut insert = tx.prepare(&insert)?;
            for (id, data) in entries {
                if update.execute((id, data))? == 0 {
                    insert.execute((id, data))?;
                }
            }
        }
        tx.commit()?;
        Ok(())
    }
    fn get(&self, table: &str, id: &str) -> GdsResult<Option<Vec<u8>>> {
        let stmt = format!(
            "SELECT {} FROM {} WHERE {} = ?1 ORDER BY rowid LIMIT 1;",
            ident(&self.data_column),
            ident(table),
            ident(&self.id_column)
        );
        let data: Option<Option<Vec<u8>>> = self
            .conn
            .query_row(&stmt, (id,), |row| row.get(0))
            .optional()?;
        Ok(data.flatten())
    }
    fn remove(&mut self, table: &str, id: &str) -> GdsResult<()> {
        self.conn.execute(&self.delete_stmt(table), (id,))?;
        Ok(())
    }
    fn names(&self, table: &str) -> GdsResult<Vec<String>> {
        let stmt = format!(
            "SELECT {} FROM {} ORDER BY rowid;",
            ident(&self.id_column),
            ident(table)
        );
        let mut stmt = self.conn.prepare(&stmt)?;
        let rows = stmt.query_map([], |row| row.get(0))?;
        let names = rows.collect::<Result<Vec<String>, rusqlite::Error>>()?;
        Ok(names)
    }
}

///
/// # In-Memory Store
///
/// [GdsStore] held entirely in memory, in insertion order.
///
#[derive(Debug, Default, Clone)]
pub struct MemStore {
    tables: HashMap<String, Vec<(String, Vec<u8>)>>,
}
impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }
    fn table(&self, table: &str) -> GdsResult<&Vec<(String, Vec<u8>)>> {
        self.tables
            .get(table)
            .ok_or_else(|| GdsError::Store(format!("No such table: {}", table)))
    }
    fn table_mut(&mut self, table: &str) -> GdsResult<&mut Vec<(String, Vec<u8>)>> {
        self.tables
            .get_mut(table)
            .ok_or_else(|| GdsError::Store(format!("No such table: {}", table)))
    }
}
impl GdsStore for MemStore {
    fn create_tables(&mut self, schema: &GdsStoreSchema) -> GdsResult<()> {
        self.tables.insert(schema.info_table.clone(), Vec::new());
        self.tables.insert(schema.cell_table.clone(), Vec::new());
        Ok(())
    }
    fn put(&mut self, table: &str, id: &str, data: &[u8]) -> GdsResult<()> {
        let entries = self.table_mut(table)?;
        match entries.iter_mut().find(|(k, _)| k == id) {
            Some(entry) => entry.1 = data.to_vec(),
            None => entries.push((id.to_string(), data.to_vec())),
        }
        Ok(())
    }
    fn get(&self, table: &str, id: &str) -> GdsResult<Option<Vec<u8>>> {
        let entries = self.table(table)?;
        Ok(entries
            .iter()
            .find(|(k, _)| k == id)
            .map(|(_, v)| v.clone()))
    }
    fn remove(&mut self, table: &str, id: &str) -> GdsResult<()> {
        self.table_mut(table)?.retain(|(k, _)| k != id);
        Ok(())
    }
    fn names(&self, table: &str) -> GdsResult<Vec<String>> {
        Ok(self.table(table)?.iter().map(|(k, _)| k.clone()).collect())
    }
}

/// Convert the GDSII stream of `rdr` into `store`.
///
/// (Re-)creates the tables of `schema`, writes the library-level record payloads to its info table,
/// and the raw bytes of each struct definition to its cell table.
/// Returns the [GdsLibScan] of the stream.
pub fn convert<R: Read + Seek>(
    rdr: GdsReader<R>,
    store: &mut dyn GdsStore,
    schema: &GdsStoreSchema,
) -> GdsResult<GdsLibScan> {
    let mut scanner = GdsScanner::new(rdr);
    let scan = scanner.scan_lib()?;
    let mut rdr = scanner.into_reader();

    store.create_tables(schema)?;
    // The twelve date-entries of BGNLIB split into modification and access halves
    let (modified, accessed) = scan.bgnlib.split_at(12);
    let info: [(&str, &[u8]); 5] = [
        (schema.version_key.as_str(), scan.header.as_slice()),
        (schema.mod_time_key.as_str(), modified),
        (schema.acc_time_key.as_str(), accessed),
        (schema.lib_name_key.as_str(), scan.libname.as_slice()),
        (schema.units_key.as_str(), scan.units.as_slice()),
    ];
    for (key, data) in info {
        store.put(&schema.info_table, key, data)?;
    }

    let mut cells = Vec::with_capacity(scan.structs.len());
    for s in scan.structs.iter() {
        debug!("Storing struct {} ({} bytes)", s.name, s.end - s.start);
        cells.push((s.name.clone(), rdr.read_range(s.start, s.end)?));
    }
    store.put_many(&schema.cell_table, &cells)?;
    info!(
        "Converted library with {} structs into {} and {}",
        cells.len(),
        schema.info_table,
        schema.cell_table
    );
    Ok(scan)
}

/// Convert GDSII file `fname` into `store`. See [convert].
pub fn convert_file(
    fname: impl AsRef<Path>,
    store: &mut dyn GdsStore,
    schema: &GdsStoreSchema,
) -> GdsResult<GdsLibScan> {
    convert(GdsReader::open(fname)?, store, schema)
}
