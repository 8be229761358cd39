//!
//! # Gdsdb GDSII Stream Codec, Layout Model & Cell Store
//!
//! GDSII is the IC industry's de facto standard for storing and sharing layout data.
//! Gdsdb reads and writes GDSII streams, models their hierarchy of cells in memory,
//! computes bounding boxes across nested and arrayed cell references,
//! and bridges GDSII data into a cell-indexed store for fast repeated loading.
//!
//! Layout data is represented in three primary forms:
//!
//! * A short tree with three layers:
//!   * The root is a [GdsLibrary], which primarily consists of a set of cells ([GdsStruct]s), and secondarily a set of metadata.
//!     Each [GdsLibrary] is a universe unto itself: references between cells are by name, resolved within the library.
//!   * Libraries consist of cell definitions AKA [GdsStruct]s.
//!   * Cells consist of [GdsElement]s: polygons ([GdsBoundary]), wires ([GdsPath]),
//!     and single or arrayed instances of other cells ([GdsStructRef], [GdsArrayRef]).
//! * For storage, the [GdsLibrary] tree is flattened to a series of [GdsRecord]s.
//! * Records are stored in binary form: a length, record-type, data-type, and payload.
//!
//! Text, node, and box elements, and element properties, are recognized and skipped.
//!
//! ## Bounding Boxes
//!
//! Each element, struct, and library answers bounding-box queries via [HasBBox].
//! References are resolved by name through the [GdsLibrary] passed in at query time.
//! Unresolvable references produce no box, rather than an error.
//!
//! ## Cell Stores
//!
//! The [store] module converts GDSII streams into a [GdsStore], one blob per cell,
//! and re-opens [GdsLibrary]s from such stores with lazily-loaded cells.
//!
//! ## Usage
//!
//! Loading a [GdsLibrary] from disk:
//!
//! ```skip
//! let lib = GdsLibrary::open("sample.gds")?;
//! ```
//!
//! Creating a new and empty [GdsLibrary], and adding a [GdsStruct] cell-definition:
//!
//! ```
//! use gdsdb::GdsLibrary;
//! let mut lib = GdsLibrary::new("mylib");
//! lib.add("mycell");
//! assert_eq!(lib.len(), 1);
//! ```
//!
//! Converting a GDSII file into an SQLite cell store, and re-opening it:
//!
//! ```skip
//! use gdsdb::{store, GdsLibrary, GdsStoreSchema, SqliteStore};
//! let schema = GdsStoreSchema::default();
//! let mut db = SqliteStore::open("sample.db")?;
//! store::convert_file("sample.gds", &mut db, &schema)?;
//! let mut lib = GdsLibrary::open_store(Box::new(db), schema)?;
//! lib.cache_all()?;
//! ```
//!

pub mod bbox;
pub mod codec;
pub mod data;
pub mod error;
pub mod geom;
pub mod library;
pub mod read;
pub mod ser;
pub mod store;
pub mod write;

pub use bbox::*;
pub use data::*;
pub use error::*;
pub use geom::*;
pub use read::*;
pub use ser::{SerdeFile, SerializationFormat};
pub use store::{GdsStore, GdsStoreSchema, MemStore, SqliteStore};
pub use write::*;

#[cfg(test)]
mod tests;
