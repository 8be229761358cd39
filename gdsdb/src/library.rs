//!
//! # Gds Library Operations
//!
//! Struct management, file I/O, and [GdsStore] attachment for [GdsLibrary].
//!

// Std-Lib Imports
use std::collections::HashSet;
use std::fs::File;
use std::io::{Cursor, Write};
use std::path::Path;

// Crates.io
use tracing::{debug, info};

// Local Imports
use crate::bbox::HasBBox;
use crate::codec;
use crate::data::*;
use crate::error::{GdsError, GdsResult, GdsSizeRule};
use crate::geom::GdsBBox;
use crate::read::{GdsParser, GdsReader};
use crate::store::{GdsStore, GdsStoreConn, GdsStoreSchema};
use crate::write::{struct_to_bytes, GdsWriter};

impl GdsLibrary {
    /// Create a new and empty [GdsLibrary]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: 3,
            ..Default::default()
        }
    }
    /// Append a new, empty struct named `name`, and return a reference to it
    pub fn add(&mut self, name: impl Into<String>) -> &mut GdsStruct {
        self.structs.push(GdsStruct::new(name));
        let idx = self.structs.len() - 1;
        &mut self.structs[idx]
    }
    /// Get the first struct named `name`
    pub fn get(&self, name: &str) -> Option<&GdsStruct> {
        self.structs.iter().find(|s| s.name == name)
    }
    /// Get a mutable reference to the first struct named `name`.
    /// Callers editing a store-backed struct should set its `changed` flag.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut GdsStruct> {
        self.structs.iter_mut().find(|s| s.name == name)
    }
    /// Get the struct at position `index`
    pub fn at(&self, index: usize) -> Option<&GdsStruct> {
        self.structs.get(index)
    }
    /// Number of (non-deleted) structs
    pub fn len(&self) -> usize {
        self.structs.len()
    }
    pub fn is_empty(&self) -> bool {
        self.structs.is_empty()
    }
    /// Delete the first struct named `name`, moving it to our deleted-list.
    /// Returns whether such a struct was found.
    pub fn del(&mut self, name: &str) -> bool {
        match self.structs.iter().position(|s| s.name == name) {
            Some(idx) => {
                let strukt = self.structs.remove(idx);
                self.deleted.push(strukt);
                true
            }
            None => false,
        }
    }
    /// Get our deleted structs, in order of deletion
    pub fn deleted(&self) -> &[GdsStruct] {
        &self.deleted
    }
    /// Drop all structs, deleted or not, and detach any attached store
    pub fn clear(&mut self) {
        self.structs.clear();
        self.deleted.clear();
        self.store = None;
    }
    /// Get the bounding box of the struct named `name`
    pub fn bbox_of(&self, name: &str) -> Option<GdsBBox> {
        self.get(name)?.bbox(self)
    }
    /// Collect and return the library's aggregate statistics
    pub fn stats(&self) -> GdsStats {
        let mut stats = GdsStats {
            libraries: 1,
            ..Default::default()
        };
        for strukt in self.structs.iter() {
            stats += strukt.stats();
        }
        stats
    }
    /// Set the modification & access dates of the library and all of its structs to now
    pub fn set_all_dates(&mut self) {
        let dates = GdsDateTimes::default();
        for strukt in self.structs.iter_mut() {
            strukt.dates = dates.clone();
        }
        self.dates = dates;
    }

    /// Read a GDS loaded from file at path `fname`
    pub fn open(fname: impl AsRef<Path>) -> GdsResult<GdsLibrary> {
        GdsParser::open(fname)?.parse_lib()
    }
    /// Read a GDS library from an opened [File]
    pub fn from_file(file: File) -> GdsResult<GdsLibrary> {
        GdsParser::new(GdsReader::from_file(file)?).parse_lib()
    }
    /// Read a GDS library from byte-array `bytes`
    pub fn from_bytes(bytes: &[u8]) -> GdsResult<GdsLibrary> {
        GdsParser::new(GdsReader::new(Cursor::new(bytes))).parse_lib()
    }
    /// Save to file `fname`
    pub fn save(&self, fname: impl AsRef<Path>) -> GdsResult<()> {
        let mut wr = GdsWriter::open(fname)?;
        wr.write_lib(self)
    }
    /// Write to destination `dest`
    pub fn write(&self, dest: impl Write) -> GdsResult<()> {
        let mut wr = GdsWriter::new(dest);
        wr.write_lib(self)
    }
    /// Encode to GDSII bytes
    pub fn to_bytes(&self) -> GdsResult<Vec<u8>> {
        let mut bytes = Vec::new();
        self.write(&mut bytes)?;
        Ok(bytes)
    }

    /// Open a [GdsLibrary] from `store`, with table and key names set by `schema`.
    ///
    /// Library-level data is loaded immediately.
    /// Each struct is created un-cached, with no elements;
    /// its content is loaded by [GdsLibrary::cache] or [GdsLibrary::cache_all].
    /// The store adopts the column names of `schema`, and remains attached to the library.
    pub fn open_store(
        mut store: Box<dyn GdsStore>,
        schema: GdsStoreSchema,
    ) -> GdsResult<GdsLibrary> {
        store.use_schema(&schema);
        let conn = GdsStoreConn { store, schema };
        let info = &conn.schema.info_table;

        let version = conn.fetch(info, &conn.schema.version_key)?;
        let version = codec::decode_i16s::<1>(info_len(GdsRecordType::Header, &version, 2)?)?;
        let modified = conn.fetch(info, &conn.schema.mod_time_key)?;
        let modified = codec::decode_i16s::<6>(info_len(GdsRecordType::BgnLib, &modified, 12)?)?;
        let accessed = conn.fetch(info, &conn.schema.acc_time_key)?;
        let accessed = codec::decode_i16s::<6>(info_len(GdsRecordType::BgnLib, &accessed, 12)?)?;
        let units = conn.fetch(info, &conn.schema.units_key)?;
        let units = codec::decode_f64s::<2>(info_len(GdsRecordType::Units, &units, 16)?)?;
        let name = conn.fetch(info, &conn.schema.lib_name_key)?;
        let name = name.split(|b| *b == 0x00).next().unwrap_or_default();
        let name = std::str::from_utf8(name)?.to_string();

        let names = conn.store.names(&conn.schema.cell_table)?;
        debug!("Opening library {} with {} stored structs", name, names.len());
        Ok(GdsLibrary {
            name,
            version: version[0],
            dates: GdsDateTimes {
                modified: GdsDateTime::from(&modified),
                accessed: GdsDateTime::from(&accessed),
            },
            units: GdsUnits(units[0], units[1]),
            structs: names.into_iter().map(GdsStruct::uncached).collect(),
            deleted: Vec::new(),
            store: Some(conn),
        })
    }
    /// Boolean indication of whether a [GdsStore] is attached
    pub fn has_store(&self) -> bool {
        self.store.is_some()
    }
    /// Load the content of the struct named `name` from our attached store.
    /// Structs which are already cached are left unchanged.
    pub fn cache(&mut self, name: &str) -> GdsResult<()> {
        let conn = self
            .store
            .as_ref()
            .ok_or_else(|| GdsError::Store("No store attached".into()))?;
        let strukt = self
            .structs
            .iter_mut()
            .find(|s| s.name == name)
            .ok_or_else(|| GdsError::Str(format!("No struct named {}", name)))?;
        if strukt.cached {
            return Ok(());
        }
        let blob = conn.fetch(&conn.schema.cell_table, name)?;
        let loaded = GdsParser::new(GdsReader::new(Cursor::new(&blob[..]))).parse_struct_def()?;
        debug!("Loaded struct {} with {} elements", name, loaded.elems.len());
        strukt.dates = loaded.dates;
        strukt.elems = loaded.elems;
        strukt.cached = true;
        strukt.changed = false;
        Ok(())
    }
    /// Load the content of all un-cached structs from our attached store
    pub fn cache_all(&mut self) -> GdsResult<()> {
        let names: Vec<String> = self
            .structs
            .iter()
            .filter(|s| !s.cached)
            .map(|s| s.name.clone())
            .collect();
        for name in names.iter() {
            self.cache(name)?;
        }
        Ok(())
    }
    /// Write our modifications back to the attached store.
    ///
    /// Rewrites the library-level info, and each struct which is either `changed` or not yet stored.
    /// Deleted structs are removed from the store.
    pub fn sync_store(&mut self) -> GdsResult<()> {
        let conn = self
            .store
            .as_mut()
            .ok_or_else(|| GdsError::Store("No store attached".into()))?;
        let schema = &conn.schema;
        let store = &mut conn.store;

        // Library-level info
        let mut version = Vec::new();
        codec::write_i16(&mut version, self.version)?;
        let mut modified = Vec::new();
        let mut accessed = Vec::new();
        for val in self.dates.modified.encode() {
            codec::write_i16(&mut modified, val)?;
        }
        for val in self.dates.accessed.encode() {
            codec::write_i16(&mut accessed, val)?;
        }
        let mut name = Vec::new();
        codec::write_str(&mut name, &self.name)?;
        let mut units = Vec::new();
        codec::write_f64(&mut units, self.units.0)?;
        codec::write_f64(&mut units, self.units.1)?;
        store.put(&schema.info_table, &schema.version_key, &version)?;
        store.put(&schema.info_table, &schema.mod_time_key, &modified)?;
        store.put(&schema.info_table, &schema.acc_time_key, &accessed)?;
        store.put(&schema.info_table, &schema.lib_name_key, &name)?;
        store.put(&schema.info_table, &schema.units_key, &units)?;

        // Structs
        for strukt in self.deleted.iter() {
            store.remove(&schema.cell_table, &strukt.name)?;
        }
        let stored: HashSet<String> = store.names(&schema.cell_table)?.into_iter().collect();
        let mut cells = Vec::new();
        for strukt in self.structs.iter_mut() {
            if strukt.changed || !stored.contains(&strukt.name) {
                cells.push((strukt.name.clone(), struct_to_bytes(strukt)?));
                strukt.changed = false;
            }
        }
        store.put_many(&schema.cell_table, &cells)?;
        info!("Synced {} structs to {}", cells.len(), schema.cell_table);
        Ok(())
    }
    /// Detach our store, and clear the library
    pub fn close_store(&mut self) {
        self.clear();
    }
}

/// Check the length of an info-table payload, which stood in for record-type `rtype`
fn info_len(rtype: GdsRecordType, data: &[u8], len: usize) -> GdsResult<&[u8]> {
    if data.len() != len {
        return Err(GdsError::format(
            rtype as u8,
            GdsSizeRule::Exact(len as u16 + 4),
            data.len() as u16 + 4,
            0,
        ));
    }
    Ok(data)
}

/// Write `lib` to a temporary file, read it back, and check the two match
#[cfg(any(test, feature = "selftest"))]
pub fn roundtrip(lib: &GdsLibrary) -> GdsResult<()> {
    use std::io::{Seek, SeekFrom};

    let mut file = tempfile::tempfile()?;
    lib.write(&mut file)?;
    file.seek(SeekFrom::Start(0))?;
    let lib2 = GdsLibrary::from_file(file)?;
    assert_eq!(*lib, lib2);
    Ok(())
}
