//!
//! # Text Serialization & Deserialization
//!
//! Used for store-schema configuration files, and for JSON/YAML/TOML dumps of layout data.
//!

// Std-Lib Imports
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

// Crates.io
use serde::de::DeserializeOwned;
use serde::Serialize;
use textwrap::dedent;

// Local Imports
use crate::error::{GdsError, GdsResult};

/// # Enumerated Supported Text-Serialization Formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SerializationFormat {
    Json,
    Yaml,
    Toml,
}
impl SerializationFormat {
    /// Infer the format from the extension of path `fname`.
    /// Returns `None` for missing or unrecognized extensions.
    pub fn from_path(fname: impl AsRef<Path>) -> Option<Self> {
        let ext = fname.as_ref().extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "json" => Some(Self::Json),
            "yaml" | "yml" => Some(Self::Yaml),
            "toml" => Some(Self::Toml),
            _ => None,
        }
    }
    /// Convert any [serde::Serialize] data to a serialized string
    pub fn to_string(&self, data: &impl Serialize) -> GdsResult<String> {
        match *self {
            Self::Json => Ok(serde_json::to_string_pretty(data)?),
            Self::Yaml => Ok(serde_yaml::to_string(data)?),
            Self::Toml => Ok(toml::to_string(data)?),
        }
    }
    /// Parse string `s`.
    /// Common leading indentation is removed first, so inline (e.g. test) literals can be indented.
    pub fn from_str<T: DeserializeOwned>(&self, s: &str) -> GdsResult<T> {
        let s = dedent(s);
        match *self {
            Self::Json => Ok(serde_json::from_str(&s)?),
            Self::Yaml => Ok(serde_yaml::from_str(&s)?),
            Self::Toml => Ok(toml::from_str(&s)?),
        }
    }
    /// Save `data` to file `fname`
    pub fn save(&self, data: &impl Serialize, fname: impl AsRef<Path>) -> GdsResult<()> {
        let mut file = BufWriter::new(std::fs::File::create(fname)?);
        let s = self.to_string(data)?;
        file.write_all(s.as_bytes())?;
        file.flush()?;
        Ok(())
    }
    /// Load from file at path `fname`
    pub fn open<T: DeserializeOwned>(&self, fname: impl AsRef<Path>) -> GdsResult<T> {
        let file = std::fs::File::open(&fname)?;
        let mut file = BufReader::new(file);
        let rv: T = match *self {
            Self::Json => serde_json::from_reader(file)?,
            Self::Yaml => serde_yaml::from_reader(file)?,
            Self::Toml => {
                // No reader-based TOML decoding; go through a string
                let mut s = String::new();
                file.read_to_string(&mut s)?;
                toml::from_str(&s)?
            }
        };
        Ok(rv)
    }
}

/// Serialization to & from file trait
///
/// Fully default-implemented, allowing empty implementations
/// for types that implement [serde] serialization and deserialization.
///
pub trait SerdeFile: Serialize + DeserializeOwned {
    /// Save in `fmt`-format to file `fname`
    fn save_as(&self, fmt: SerializationFormat, fname: impl AsRef<Path>) -> GdsResult<()> {
        fmt.save(self, fname)
    }
    /// Open from `fmt`-format file `fname`
    fn open_as(fname: impl AsRef<Path>, fmt: SerializationFormat) -> GdsResult<Self> {
        fmt.open(fname)
    }
    /// Open from file `fname`, inferring its format from its extension
    fn open_any(fname: impl AsRef<Path>) -> GdsResult<Self> {
        let fname = fname.as_ref();
        match SerializationFormat::from_path(fname) {
            Some(fmt) => fmt.open(fname),
            None => Err(GdsError::Str(format!(
                "Cannot infer serialization format of {:?}",
                fname
            ))),
        }
    }
}
