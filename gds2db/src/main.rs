//! # gds2db
//!
//! GDSII to Cell-Indexed SQLite Store Converter
//!

use clap::Parser;
use std::error::Error;
use tracing::info;
use tracing_subscriber::EnvFilter;

use gdsdb::{store, GdsLibrary, GdsStoreSchema, SerdeFile, SqliteStore};

// => The doc-comment on `ProgramOptions` here is displayed by the `clap`-generated help docs =>

/// GDSII to Cell-Indexed SQLite Store Converter
#[derive(Parser)]
struct ProgramOptions {
    /// GDSII Input File
    #[clap(short = 'i', long)]
    gds: String,
    /// SQLite Output File
    #[clap(short = 'o', long)]
    db: String,
    /// Store Schema File (JSON, YAML, or TOML)
    #[clap(long)]
    schema: Option<String>,
    /// Print a bounding-box summary of each struct, loaded back from the store
    #[clap(short, long)]
    summary: bool,
    /// Verbose Output Mode
    #[clap(short, long)]
    verbose: bool,
}

/// The main entry point.
/// All logic is offloaded to `_main` for sake of testing.
fn main() -> Result<(), Box<dyn Error>> {
    let options = ProgramOptions::parse();
    let level = if options.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .init();
    _main(&options)
}

/// All the real logic, with `ProgramOptions` argument for sake of testing
fn _main(options: &ProgramOptions) -> Result<(), Box<dyn Error>> {
    let schema = match &options.schema {
        Some(fname) => GdsStoreSchema::open_any(fname)?,
        None => GdsStoreSchema::default(),
    };

    // Scan the GDSII file into the store
    let mut db = SqliteStore::open(&options.db)?.with_schema(&schema);
    let scan = store::convert_file(&options.gds, &mut db, &schema)?;
    info!("Wrote {} structs to {:?}", scan.structs.len(), &options.db);

    if options.summary {
        // Load it all back, and report each struct's extent
        let mut lib = GdsLibrary::open_store(Box::new(db), schema)?;
        lib.cache_all()?;
        println!("{}: {} structs", lib.name, lib.len());
        for strukt in lib.structs.iter() {
            match lib.bbox_of(&strukt.name) {
                Some(b) => println!(
                    "  {}: ({}, {}) {} x {}",
                    strukt.name,
                    b.x(),
                    b.y(),
                    b.width(),
                    b.height()
                ),
                None => println!("  {}: (empty)", strukt.name),
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use gdsdb::{GdsBoundary, GdsPoint, GdsStore, GdsStructRef};

    #[test]
    fn converts_a_library() -> Result<(), Box<dyn Error>> {
        let dir = tempfile::tempdir()?;
        let gds = dir.path().join("lib.gds");
        let db = dir.path().join("lib.db");

        let mut lib = GdsLibrary::new("lib");
        lib.add("unit").add(GdsBoundary {
            layer: 1,
            xy: GdsPoint::vec(&[(0, 0), (0, 5), (5, 5), (5, 0), (0, 0)]),
            ..Default::default()
        });
        lib.add("parent").add(GdsStructRef {
            name: "unit".into(),
            xy: GdsPoint::new(10, 10),
            ..Default::default()
        });
        lib.save(&gds)?;

        let options = ProgramOptions {
            gds: gds.to_string_lossy().into(),
            db: db.to_string_lossy().into(),
            schema: None,
            summary: true,
            verbose: true,
        };
        _main(&options)?;

        // Read back what it wrote to disk
        let schema = GdsStoreSchema::default();
        let store = SqliteStore::open(&db)?;
        assert_eq!(store.names(&schema.cell_table)?, vec!["unit", "parent"]);
        let mut readback = GdsLibrary::open_store(Box::new(store), schema)?;
        readback.cache_all()?;
        assert_eq!(readback, GdsLibrary::open(&gds)?);
        Ok(())
    }
}
