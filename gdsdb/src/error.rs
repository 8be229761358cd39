//!
//! # Gdsdb Errors & Error-Helpers
//!

// Std-Lib Imports
use std::error::Error;

// Local Imports
use crate::data::{GdsRecord, GdsRecordType};

/// # GdsResult Type-Alias
pub type GdsResult<T> = Result<T, GdsError>;

/// # Gds Context
/// Enumeration of each context in which a record can be parsed, primarily for error reporting
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GdsContext {
    Library,
    Struct,
    StructRef,
    ArrayRef,
    Boundary,
    Path,
    Skipped,
    Store,
}

/// # Gds Record Size Rule
///
/// The size contract a record's declared length (including its four header bytes) must meet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GdsSizeRule {
    /// Exactly this many bytes
    Exact(u16),
    /// At least this many bytes, and even
    AtLeastEven(u16),
    /// Four header bytes plus a multiple of `of` bytes, holding at least `min` multiples
    Multiple { of: u16, min: u16 },
}
impl GdsSizeRule {
    /// Boolean indication of whether total record-length `len` satisfies the rule
    pub fn accepts(&self, len: u16) -> bool {
        match *self {
            Self::Exact(n) => len == n,
            Self::AtLeastEven(n) => len >= n && len % 2 == 0,
            Self::Multiple { of, min } => {
                len >= 4 && (len - 4) % of == 0 && (len - 4) / of >= min
            }
        }
    }
}

/// # Gds Error Kinds
///
/// Coarse classification of [GdsError]s, for callers which want to react to the category of failure
/// without matching on each variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GdsErrorKind {
    /// Failures opening, writing, or querying a [crate::GdsStore]
    Store,
    /// Short reads, and unreadable or unwritable underlying streams
    Stream,
    /// Record sizes, tags, or sequences violating the GDSII format
    Format,
    /// Everything else: configuration, date conversions, free-form messages
    Other,
}

/// # Gds Error Enumeration
/// Most errors are tied in some sense to parsing and decoding.
/// Once a valid [crate::GdsLibrary] is created in memory, it can generally be streamed to bytes.
#[derive(Debug)]
pub enum GdsError {
    /// Record size violating its tag's [GdsSizeRule]
    Format {
        rtype: u8,
        expected: GdsSizeRule,
        actual: u16,
        bytepos: u64,
    },
    /// Invalid record length, either decoded (too short, odd) or too long to encode
    RecordLen(usize),
    /// Parser Errors
    Parse {
        msg: String,
        record: GdsRecord,
        recordnum: usize,
        bytepos: u64,
        ctx: Vec<GdsContext>,
    },
    /// Stream I/O Errors
    Stream(std::io::Error),
    /// Store Errors
    Store(String),
    /// Boxed (External) Errors
    Boxed(Box<dyn Error + Send + Sync>),
    /// Other errors
    Str(String),
}
impl GdsError {
    /// Create a [GdsError::Format] for record-type `rtype`
    pub fn format(rtype: u8, expected: GdsSizeRule, actual: u16, bytepos: u64) -> Self {
        Self::Format {
            rtype,
            expected,
            actual,
            bytepos,
        }
    }
    /// Get our [GdsErrorKind]
    pub fn kind(&self) -> GdsErrorKind {
        match self {
            Self::Format { .. } | Self::RecordLen(_) | Self::Parse { .. } => GdsErrorKind::Format,
            Self::Stream(_) => GdsErrorKind::Stream,
            Self::Store(_) => GdsErrorKind::Store,
            Self::Boxed(_) | Self::Str(_) => GdsErrorKind::Other,
        }
    }
    /// Get the offending [GdsRecordType] of a [GdsError::Format], if it is a known one
    pub fn record_type(&self) -> Option<GdsRecordType> {
        match self {
            Self::Format { rtype, .. } => num_traits::FromPrimitive::from_u8(*rtype),
            _ => None,
        }
    }
}
impl std::fmt::Display for GdsError {
    /// Display a [GdsError].
    /// This functionally delegates to the (derived) [std::fmt::Debug] implementation.
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}
impl std::error::Error for GdsError {}
impl From<std::io::Error> for GdsError {
    fn from(e: std::io::Error) -> Self {
        Self::Stream(e)
    }
}
impl From<std::str::Utf8Error> for GdsError {
    fn from(e: std::str::Utf8Error) -> Self {
        Self::Str(format!("Invalid ASCII string: {}", e))
    }
}
impl From<rusqlite::Error> for GdsError {
    fn from(e: rusqlite::Error) -> Self {
        Self::Store(e.to_string())
    }
}
impl From<serde_json::Error> for GdsError {
    fn from(e: serde_json::Error) -> Self {
        Self::Boxed(Box::new(e))
    }
}
impl From<serde_yaml::Error> for GdsError {
    fn from(e: serde_yaml::Error) -> Self {
        Self::Boxed(Box::new(e))
    }
}
impl From<toml::ser::Error> for GdsError {
    fn from(e: toml::ser::Error) -> Self {
        Self::Boxed(Box::new(e))
    }
}
impl From<toml::de::Error> for GdsError {
    fn from(e: toml::de::Error) -> Self {
        Self::Boxed(Box::new(e))
    }
}
impl From<String> for GdsError {
    fn from(e: String) -> Self {
        GdsError::Str(e)
    }
}
impl From<&str> for GdsError {
    fn from(e: &str) -> Self {
        GdsError::Str(e.to_string())
    }
}

///
/// # ErrorHelper
///
/// Helper trait for the parser, scanner, and store-loader.
/// Each implementer generally has some internal state to report upon failure,
/// e.g. a byte position or context stack, which it injects in the implementation-required `err` method.
/// The `fail` method, provided by default, simply returns the `err` value.
///
pub trait ErrorHelper {
    type Error;

    /// Create and return a [Self::Error] value.
    fn err(&mut self, msg: impl Into<String>) -> Self::Error;
    /// Return failure
    fn fail<T>(&mut self, msg: impl Into<String>) -> Result<T, Self::Error> {
        Err(self.err(msg))
    }
    /// Unwrap the [Option] `opt` if it is [Some], and return our error if not.
    fn unwrap<T>(&mut self, opt: Option<T>, msg: impl Into<String>) -> Result<T, Self::Error> {
        match opt {
            Some(val) => Ok(val),
            None => self.fail(msg),
        }
    }
    /// Assert a boolean condition. Returns through `self.fail` if it is not satisfied.
    fn assert(&mut self, b: bool, msg: impl Into<String>) -> Result<(), Self::Error> {
        match b {
            true => Ok(()),
            false => self.fail(msg),
        }
    }
}
