//!
//! # Gdsdb Data Model
//!

// Crates.io
use chrono::{Datelike, NaiveDate, NaiveDateTime, SubsecRound, Timelike, Utc};
use derive_builder::Builder;
use derive_more::{self, Add, AddAssign};
use num_derive::FromPrimitive;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

// Local Imports
use crate::error::{GdsError, GdsResult, GdsSizeRule};
use crate::geom::GdsPoint;
use crate::ser::SerdeFile;
use crate::store::GdsStoreConn;

///
/// # Gds Record Types
///
/// In the numeric-order specified by GDSII, for automatic [FromPrimitive] conversions.
///
#[derive(FromPrimitive, Debug, Clone, Copy, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub enum GdsRecordType {
    Header = 0x00,
    BgnLib,
    LibName,
    Units,
    EndLib,
    BgnStruct,
    StructName, // STRNAME
    EndStruct,
    Boundary,
    Path,
    StructRef,
    ArrayRef,
    Text,
    Layer,
    DataType,
    Width,
    Xy,
    EndElement,
    StructRefName, // SNAME
    ColRow,
    TextNode, // "Not currently used"
    Node,
    TextType,
    Presentation,
    Spacing, // "Discontinued"
    String,
    Strans,
    Mag,
    Angle,
    Uinteger, // "No longer used"
    Ustring,  // "No longer used"
    RefLibs,
    Fonts,
    PathType,
    Generations,
    AttrTable,
    StypTable, // "Unreleased Feature"
    StrType,   // "Unreleased Feature"
    ElemFlags,
    ElemKey,  // "Unreleased Feature"
    LinkType, // "Unreleased Feature"
    LinkKeys, // "Unreleased Feature"
    Nodetype,
    PropAttr,
    PropValue,
    Box,
    BoxType,
    Plex,
    BeginExtn, // "Only occurs in CustomPlus"
    EndExtn,   // "Only occurs in CustomPlus"
    TapeNum,
    TapeCode,
    StrClass, // "Only for Calma internal use"
    Reserved, // "Reserved for future use"
    Format,
    Mask,
    EndMasks,
    LibDirSize,
    SrfName,
    LibSecur,
}
impl GdsRecordType {
    /// Get the size-rule for record-types which are decoded into [GdsRecord]s.
    /// Sizes include the four header bytes.
    ///
    /// Returns `None` for record-types which are skipped over, whatever their length.
    /// Note `Xy` records are only checked for four-byte alignment here;
    /// their per-element point-counts are checked by the parser.
    pub fn size_rule(&self) -> Option<GdsSizeRule> {
        use GdsSizeRule::{AtLeastEven, Exact, Multiple};
        let rule = match self {
            Self::Header => Exact(6),
            Self::BgnLib | Self::BgnStruct => Exact(28),
            Self::LibName | Self::StructName | Self::StructRefName => AtLeastEven(4),
            Self::Units => Exact(20),
            Self::EndLib | Self::EndStruct | Self::EndElement => Exact(4),
            Self::Boundary
            | Self::Path
            | Self::StructRef
            | Self::ArrayRef
            | Self::Text
            | Self::Node
            | Self::Box => Exact(4),
            Self::ElemFlags | Self::Strans => Exact(6),
            Self::Layer | Self::DataType | Self::PathType => Exact(6),
            Self::Width | Self::BeginExtn | Self::EndExtn => Exact(8),
            Self::ColRow => Exact(8),
            Self::Xy => Multiple { of: 8, min: 0 },
            Self::Mag | Self::Angle => Exact(12),
            _ => return None,
        };
        Some(rule)
    }
}

/// # Gds DataType Enumeration
/// In order as decoded from 16-bit integers in binary data
#[derive(FromPrimitive, Debug, Clone, Copy, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub enum GdsDataType {
    NoData = 0,
    BitArray = 1,
    I16 = 2,
    I32 = 3,
    F32 = 4,
    F64 = 5,
    Str = 6,
}

/// # Gds Record Header
/// Decoded contents of a record's four header bytes.
///
/// Both type-bytes are kept raw, as unknown record-types are skipped rather than rejected.
/// `len` is the payload length, excluding the header bytes.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub struct GdsRecordHeader {
    pub rtype: u8,
    pub dtype: u8,
    pub len: u16,
}
impl GdsRecordHeader {
    /// Get our record-type, if it is a known one
    pub fn record_type(&self) -> Option<GdsRecordType> {
        num_traits::FromPrimitive::from_u8(self.rtype)
    }
    /// Total on-stream length, including the header
    pub fn total_len(&self) -> u16 {
        self.len + 4
    }
}

///
/// # Gds Record Enumeration
///
/// Keeps each record in relatively "raw" form,
/// other than assuring correct sizes, and converting one-entry arrays into scalars.
/// Records outside the modelled subset are kept only as their type and length, in [GdsRecord::Skipped].
///
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GdsRecord {
    Header { version: i16 },
    BgnLib { dates: [i16; 12] },
    LibName(String),
    Units(f64, f64),
    EndLib,
    BgnStruct { dates: [i16; 12] },
    StructName(String),    // STRNAME Record
    StructRefName(String), // SNAME Record
    EndStruct,
    Boundary,
    Path,
    StructRef,
    ArrayRef,
    Text,
    Node,
    Box,
    Layer(i16),
    DataType(i16),
    Width(i32),
    Xy(Vec<i32>),
    EndElement,
    ColRow { cols: i16, rows: i16 },
    Strans(u8, u8),
    Mag(f64),
    Angle(f64),
    PathType(i16),
    ElemFlags(u8, u8),
    BeginExtn(i32),
    EndExtn(i32),
    /// Any other record, with its payload passed over
    Skipped { rtype: u8, len: u16 },
}

/// # Gds Floating Point
/// ## GDSII's Home-Grown Floating-Point Format
///
/// GDSII is old enough to have its own float-format, like most computers did before IEEE754.
/// Eight bytes comprise a sign bit, a seven-bit base-16 exponent biased by 64,
/// and a 56-bit mantissa interpreted as a fraction in the range [1/16, 1).
///
/// The [GdsFloat64] struct is not used as a data-store, but largely a namespace
/// for the `encode` and `decode` operations to and from IEEE754 double-precision format.
///
pub struct GdsFloat64;
impl GdsFloat64 {
    /// Decode GDSII's eight-byte representation, stored as a `u64`, to IEEE (and Rust)-compatible `f64`
    pub fn decode(val: u64) -> f64 {
        // Extract the MSB Sign bit
        let neg = (val & 0x8000_0000_0000_0000) != 0;
        // Extract the 7b exponent
        let exp: i32 = ((val & 0x7F00_0000_0000_0000) >> 8 * 7) as i32 - 64;
        // Create the initially integer-valued mantissa from the 7 least-significant bytes
        let mantissa: u64 = val & 0x00FF_FFFF_FFFF_FFFF;
        // And apply its normalization to the range (1/16, 1)
        let mantissa: f64 = mantissa as f64 / 2f64.powi(8 * 7);
        // Combine everything into our overall value
        if neg {
            -1.0 * mantissa * 16f64.powi(exp)
        } else {
            mantissa * 16f64.powi(exp)
        }
    }
    /// Encode `f64` to GDSII's eight bytes, stored as `u64`.
    ///
    /// Magnitudes beyond the format's range saturate to its largest value;
    /// those below it flush to zero.
    pub fn encode(val: f64) -> u64 {
        if val == 0.0 || val.is_nan() {
            return 0;
        }
        let sign: u64 = if val < 0.0 { 0x8000_0000_0000_0000 } else { 0 };
        let mut mantissa = val.abs();
        if mantissa.is_infinite() {
            return sign | 0x7FFF_FFFF_FFFF_FFFF;
        }
        // Normalize the mantissa into [1/16, 1), adjusting the base-16 exponent along the way
        let mut exponent: i32 = 64;
        while mantissa >= 1.0 {
            mantissa /= 16.0;
            exponent += 1;
        }
        while mantissa < 0.0625 {
            mantissa *= 16.0;
            exponent -= 1;
        }
        let mut bits = (mantissa * 2f64.powi(56)).round() as u64;
        if bits >= 1 << 56 {
            // Rounding carried into a new hex digit
            bits >>= 4;
            exponent += 1;
        }
        if exponent > 127 {
            return sign | 0x7FFF_FFFF_FFFF_FFFF;
        }
        if exponent < 0 {
            return 0;
        }
        sign | (exponent as u64) << 56 | bits
    }
}

/// # Gds Translation Settings
/// Reflection, rotation, and magnification for references.
/// As configured by `STRANS` records.
#[derive(Default, Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq)]
pub struct GdsStrans {
    /// Reflection, about the x-axis.
    /// Applied before rotation.
    #[serde(default, skip_serializing_if = "is_false")]
    pub reflected: bool,
    /// Absolute Magnification Setting
    #[serde(default, skip_serializing_if = "is_false")]
    pub abs_mag: bool,
    /// Absolute Angle Setting
    #[serde(default, skip_serializing_if = "is_false")]
    pub abs_angle: bool,
    /// Magnification Factor. Interpreted as unit-scaling (mag==1.0) if not specified.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mag: Option<f64>,
    /// Angle, in degrees counter-clockwise. Defaults to zero if not specified.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub angle: Option<f64>,
}
impl GdsStrans {
    /// Decode from the two bytes of a `STRANS` record
    pub fn from_bytes(d0: u8, d1: u8) -> Self {
        Self {
            reflected: d0 & 0x80 != 0,
            abs_mag: d1 & 0x04 != 0,
            abs_angle: d1 & 0x02 != 0,
            ..Default::default()
        }
    }
    /// Encode our flags into the two bytes of a `STRANS` record
    pub fn to_bytes(&self) -> (u8, u8) {
        (
            (self.reflected as u8) << 7,
            (self.abs_mag as u8) << 2 | (self.abs_angle as u8) << 1,
        )
    }
}

/// # Gds Element Flags
/// As configured by `EFLAGS` records.
/// Two bytes of bit-fields stored in raw `u8` form.
#[derive(Default, Debug, Clone, Deserialize, Serialize, JsonSchema, PartialEq)]
pub struct GdsElemFlags(pub u8, pub u8);

/// # Gds Library Units
///
/// Each GDSII Library has two length-units, referred to as "DB Units" and "User Units" respectively.
/// Essentially all spatial data throughout the Library is denoted in "DB Units".
///
/// From the `UNITS` record-description:
/// ```text
/// Contains two eight-byte real numbers.
/// The first number is the size of a database-unit, in user-units.
/// The second is the size of a database-unit in meters.
/// ```
///
/// These two numbers are stored as-is in the [GdsUnits] tuple-struct.
///
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema, PartialEq)]
pub struct GdsUnits(pub f64, pub f64);
impl GdsUnits {
    /// Create a new [GdsUnits]
    pub fn new(num1: f64, num2: f64) -> Self {
        Self(num1, num2)
    }
    /// Get the database-unit size, in meters. Used for all spatial data.
    pub fn db_unit(&self) -> f64 {
        self.1
    }
    /// Get the user-unit size, in meters. Largely for display/ debug.
    pub fn user_unit(&self) -> f64 {
        self.1 / self.0
    }
}
impl Default for GdsUnits {
    /// Default values for GDS Units:
    /// * DB-Unit = 1nm
    /// * User-Unit = 1µm (1000x the DB-Unit)
    fn default() -> Self {
        Self(1e-3, 1e-9)
    }
}

///
/// # Gds Path Element
///
/// BNF:
/// ```text
/// PATH [ELFLAGS] [PLEX] LAYER DATATYPE [PATHTYPE] [WIDTH] XY [BGNEXTN] [ENDEXTN])
/// ```
///
/// Path segments are presumed axis-aligned ("Manhattan") for bounding-box purposes.
///
#[derive(Default, Clone, Builder, Debug, Deserialize, Serialize, JsonSchema, PartialEq)]
#[builder(pattern = "owned", setter(into))]
pub struct GdsPath {
    // Required Fields
    /// Layer Number
    pub layer: i16,
    /// DataType ID
    pub datatype: i16,
    /// Vector of x,y coordinates
    pub xy: Vec<GdsPoint>,

    // Optional Fields
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(strip_option))]
    pub width: Option<i32>,
    /// End-cap style. Zero is flush; any positive value extends by half the width.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(strip_option))]
    pub path_type: Option<i16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(strip_option))]
    pub begin_extn: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(strip_option))]
    pub end_extn: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(strip_option))]
    pub elflags: Option<GdsElemFlags>,
}

///
/// # Gds Boundary Element
///
/// The most common type for closed-form shapes in GDSII.
/// GDSII dictates that the first and final coordinates in each [GdsBoundary] be identical, "closing" the polygon.
/// Hence an N-sided polygon is represented by an (N+1)-point `xy` vector.
///
/// BNF:
/// ```text
/// BOUNDARY [ELFLAGS] [PLEX] LAYER DATATYPE XY
/// ```
///
#[derive(Default, Clone, Builder, Debug, Deserialize, Serialize, JsonSchema, PartialEq)]
#[builder(pattern = "owned", setter(into))]
pub struct GdsBoundary {
    // Required Fields
    /// Layer Number
    pub layer: i16,
    /// DataType ID
    pub datatype: i16,
    /// Vector of x,y coordinates
    pub xy: Vec<GdsPoint>,

    // Optional Fields
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(strip_option))]
    pub elflags: Option<GdsElemFlags>,
}
///
/// # Gds Struct Reference (Cell Instance)
///
/// Represents an instance of a layout-cell.
/// Coordinate `xy` is the instance's origin.
/// Options for rotation and reflection are configured in the [GdsStrans] attribute `strans`.
///
/// The referenced struct is held by name only, and resolved through the owning [GdsLibrary] on demand.
///
/// BNF:
/// ```text
/// SREF [ELFLAGS] [PLEX] SNAME [<strans>] XY
/// ```
///
#[derive(Default, Clone, Builder, Debug, Deserialize, Serialize, JsonSchema, PartialEq)]
#[builder(pattern = "owned", setter(into))]
pub struct GdsStructRef {
    // Required Fields
    /// Struct (Cell) Name
    pub name: String,
    /// Location x,y coordinates
    pub xy: GdsPoint,

    // Optional Fields
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(strip_option))]
    /// Translation & Reflection Options
    pub strans: Option<GdsStrans>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(strip_option))]
    pub elflags: Option<GdsElemFlags>,
}
///
/// # Gds Array Reference
///
/// A two-dimensional array of struct (cell) instances.
///
/// The three `xy` points are, in order:
/// * The array origin
/// * The origin displaced by `cols` column-pitches
/// * The origin displaced by `rows` row-pitches
///
/// BNF:
/// ```text
/// AREF [ELFLAGS] [PLEX] SNAME [<strans>] COLROW XY
/// ```
///
#[derive(Default, Clone, Builder, Debug, Deserialize, Serialize, JsonSchema, PartialEq)]
#[builder(pattern = "owned", setter(into))]
pub struct GdsArrayRef {
    // Required Fields
    /// Struct (Cell) Name
    pub name: String,
    /// Vector of x,y coordinates
    pub xy: [GdsPoint; 3],
    /// Number of columns
    pub cols: i16,
    /// Number of rows
    pub rows: i16,

    // Optional Fields
    /// Translation & Reflection Options
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(strip_option))]
    pub strans: Option<GdsStrans>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(strip_option))]
    pub elflags: Option<GdsElemFlags>,
}

///
/// # Gds Element Enumeration
///
/// Primary union of geometric elements, instances, and arrays which comprise a GDSII struct (cell).
///
/// BNF:
/// ```text
/// {<boundary> | <path> | <SREF> | <AREF> | <text> | <node> | <box>} {<property>}* ENDEL
/// ```
///
/// Text, node, and box elements are skipped when reading, and have no variant here.
///
#[derive(derive_more::From, Debug, Clone, Deserialize, Serialize, JsonSchema, PartialEq)]
pub enum GdsElement {
    GdsBoundary(GdsBoundary),
    GdsPath(GdsPath),
    GdsStructRef(GdsStructRef),
    GdsArrayRef(GdsArrayRef),
}
impl GdsElement {
    /// Get the record-type which opens this element
    pub fn tag(&self) -> GdsRecordType {
        match self {
            Self::GdsBoundary(_) => GdsRecordType::Boundary,
            Self::GdsPath(_) => GdsRecordType::Path,
            Self::GdsStructRef(_) => GdsRecordType::StructRef,
            Self::GdsArrayRef(_) => GdsRecordType::ArrayRef,
        }
    }
    /// Get the name of the referenced struct, for reference-elements
    pub fn ref_name(&self) -> Option<&str> {
        match self {
            Self::GdsStructRef(r) => Some(&r.name),
            Self::GdsArrayRef(r) => Some(&r.name),
            _ => None,
        }
    }
}

/// # Gds Summary Stats
///
/// Summary statistics for a [GdsLibrary] or [GdsStruct].
/// Total numbers of elements of each type.
#[derive(Debug, Default, Clone, Deserialize, Serialize, JsonSchema, PartialEq, Add, AddAssign)]
pub struct GdsStats {
    pub libraries: usize,
    pub structs: usize,
    pub boundaries: usize,
    pub paths: usize,
    pub struct_refs: usize,
    pub array_refs: usize,
    /// Text, node, and box elements passed over while reading
    pub skipped: usize,
}

/// # Gds Date & Time
///
/// Six two-byte fields: year, month, day, hour, minute, and second.
///
/// When reading, [`GdsDateTime`] accepts any twelve bytes and stores them as-is;
/// no validation for real dates & times, e.g. month 30 or hour 99, is performed.
/// Years are stored in full (e.g. 2024), as [`GdsDateTime::now`] produces them,
/// although files from some writers reference years to 1900.
///
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub struct GdsDateTime {
    pub year: i16,
    pub month: i16,
    pub day: i16,
    pub hour: i16,
    pub minute: i16,
    pub second: i16,
}
impl From<NaiveDateTime> for GdsDateTime {
    fn from(dt: NaiveDateTime) -> Self {
        Self {
            year: dt.year() as i16,
            month: dt.month() as i16,
            day: dt.day() as i16,
            hour: dt.hour() as i16,
            minute: dt.minute() as i16,
            second: dt.second() as i16,
        }
    }
}
impl TryFrom<&GdsDateTime> for NaiveDateTime {
    type Error = GdsError;

    /// Try converting a [`GdsDateTime`] to a [`chrono::NaiveDateTime`].
    /// Fails if any of the GDSII values are invalid. e.g. "month 30" or "hour 99".
    fn try_from(dt: &GdsDateTime) -> GdsResult<NaiveDateTime> {
        let ymd = NaiveDate::from_ymd_opt(dt.year as i32, dt.month as u32, dt.day as u32)
            .ok_or_else(|| GdsError::Str(format!("Invalid Date: {:?}", dt)))?;
        let rv = ymd
            .and_hms_opt(dt.hour as u32, dt.minute as u32, dt.second as u32)
            .ok_or_else(|| GdsError::Str(format!("Invalid Time: {:?}", dt)))?;
        Ok(rv)
    }
}
impl GdsDateTime {
    /// Get the current time
    ///
    /// Note GDSII's time format is specified in seconds, whereas `NaiveDateTime` has nanosecond precision.
    /// Always round to the nearest second to match data coming in from GDSII files.
    ///
    pub fn now() -> Self {
        Utc::now().naive_utc().round_subsecs(0).into()
    }
    /// Encode as GDSII's six `i16`s
    pub fn encode(&self) -> [i16; 6] {
        [
            self.year,
            self.month,
            self.day,
            self.hour,
            self.minute,
            self.second,
        ]
    }
}
impl Default for GdsDateTime {
    /// Default dates & times: what better time than now!
    fn default() -> Self {
        Self::now()
    }
}
impl From<&[i16; 6]> for GdsDateTime {
    /// Convert from a 6-element array of i16s to a [`GdsDateTime`], in GDSII's order.
    fn from(d: &[i16; 6]) -> Self {
        Self {
            year: d[0],
            month: d[1],
            day: d[2],
            hour: d[3],
            minute: d[4],
            second: d[5],
        }
    }
}

/// # Gds Modification & Access Dates & Times
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub struct GdsDateTimes {
    /// Last Modification Date & Time
    pub modified: GdsDateTime,
    /// Last Access Date & Time
    pub accessed: GdsDateTime,
}
impl GdsDateTimes {
    /// Encode in GDSII's twelve-`i16` format, as used by `BGNLIB` and `BGNSTR` records
    pub fn encode(&self) -> [i16; 12] {
        let mut rv = [0; 12];
        rv[..6].copy_from_slice(&self.modified.encode());
        rv[6..].copy_from_slice(&self.accessed.encode());
        rv
    }
    /// Decode from GDSII's twelve-`i16` format
    pub fn decode(d: &[i16; 12]) -> Self {
        let (modified, accessed) = d.split_at(6);
        Self {
            // Both halves are six elements long; the `try_into` conversions can never fail
            modified: GdsDateTime::from(&<[i16; 6]>::try_from(modified).unwrap_or_default()),
            accessed: GdsDateTime::from(&<[i16; 6]>::try_from(accessed).unwrap_or_default()),
        }
    }
}
impl Default for GdsDateTimes {
    /// Default dates & times: what better time than now!
    /// Note this makes a *single* call to `Utc::now()`, so the two dates will be the same.
    fn default() -> Self {
        let now = GdsDateTime::now();
        Self {
            modified: now.clone(),
            accessed: now,
        }
    }
}

///
/// # Gds Struct (Cell) Definition
///
/// GDSII's primary hierarchical layout-definition object is its "struct",
/// which most other layout systems would call a "cell" or "module".
///
/// [GdsStruct]s are principally composed of an ordered vector of [GdsElement]s.
///
/// Structs opened from a [crate::GdsStore] start out un-`cached`: named, but with no elements loaded.
/// The `changed` flag marks in-memory edits not yet written back to such a store.
/// Neither flag is serialized.
///
/// BNF:
/// ```text
/// BGNSTR STRNAME [STRCLASS] {<element>}* ENDSTR
/// ```
///
#[derive(Clone, Builder, Debug, Deserialize, Serialize, JsonSchema, PartialEq)]
#[builder(pattern = "owned", setter(into))]
pub struct GdsStruct {
    /// Struct Name
    pub name: String,
    /// Modification & Access Dates & Times
    #[builder(default)]
    pub dates: GdsDateTimes,
    /// Elements List
    #[builder(default)]
    pub elems: Vec<GdsElement>,
    /// Whether `elems` reflects the struct's content
    #[serde(skip, default = "default_true")]
    #[builder(default = "true")]
    pub cached: bool,
    /// Whether the struct has un-stored modifications
    #[serde(skip)]
    #[builder(default)]
    pub changed: bool,
}
impl GdsStruct {
    /// Create a new and empty [GdsStruct]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            dates: GdsDateTimes::default(),
            elems: Vec::new(),
            cached: true,
            changed: false,
        }
    }
    /// Create a named placeholder [GdsStruct], with content yet to be loaded
    pub(crate) fn uncached(name: impl Into<String>) -> Self {
        Self {
            cached: false,
            ..Self::new(name)
        }
    }
    /// Number of elements
    pub fn len(&self) -> usize {
        self.elems.len()
    }
    /// Boolean indication of an element-free struct
    pub fn is_empty(&self) -> bool {
        self.elems.is_empty()
    }
    /// Get the element at `index`, if in bounds
    pub fn at(&self, index: usize) -> Option<&GdsElement> {
        self.elems.get(index)
    }
    /// Append element `elem`
    pub fn add(&mut self, elem: impl Into<GdsElement>) {
        self.elems.push(elem.into());
    }
    /// Count and return our element statistics
    pub fn stats(&self) -> GdsStats {
        let mut stats = GdsStats::default();
        stats.structs += 1;
        for elem in &self.elems {
            use GdsElement::*;
            match elem {
                GdsBoundary(_) => stats.boundaries += 1,
                GdsPath(_) => stats.paths += 1,
                GdsStructRef(_) => stats.struct_refs += 1,
                GdsArrayRef(_) => stats.array_refs += 1,
            };
        }
        stats
    }
}

///
/// # Gds Library
///
/// The Library is GDSII's primary idiom for a suite of layout-cells.
/// A Library generally corresponds one-to-one with a `.gds` file, or with a [crate::GdsStore].
/// Libraries consist primarily of cell-definitions ([GdsStruct]s),
/// and secondarily include library-level meta-data, including the distance units, GDS-spec version, and modification dates.
///
/// Structs removed via [GdsLibrary::del] are held in a separate, non-serialized `deleted` list
/// until the library is cleared or dropped.
/// Operations on the library's structs are implemented in [crate::library].
///
/// BNF:
/// ```text
/// HEADER BGNLIB [LIBDIRSIZE] [SRFNAME] [LIBSECUR] LIBNAME [REFLIBS] [FONTS] [ATTRTABLE] [GENERATIONS] [<FormatType>]
/// UNITS {<structure>}* ENDLIB
/// ```
///
#[derive(Default, Debug, Deserialize, Serialize, JsonSchema)]
pub struct GdsLibrary {
    /// Library Name
    pub name: String,
    /// Gds Spec Version
    pub version: i16,
    /// Modification & Access Dates & Times
    pub dates: GdsDateTimes,
    /// Spatial Units
    pub units: GdsUnits,
    /// Struct Definitions
    pub structs: Vec<GdsStruct>,
    /// Removed Struct Definitions
    #[serde(skip)]
    pub(crate) deleted: Vec<GdsStruct>,
    /// Attached Cell-Store, if any
    #[serde(skip)]
    pub(crate) store: Option<GdsStoreConn>,
}
impl PartialEq for GdsLibrary {
    /// Compare library content. Attached stores are not considered.
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.version == other.version
            && self.dates == other.dates
            && self.units == other.units
            && self.structs == other.structs
            && self.deleted == other.deleted
    }
}
// Enable [GdsLibrary] and [GdsStruct] serialization to file, in each supported text format.
impl SerdeFile for GdsLibrary {}
impl SerdeFile for GdsStruct {}

/// Our helper for "do not serialize default `false` boolean values".
/// This is a function primarily because those are what `#[serde(skip_serializing_if)]` understands.
fn is_false(b: &bool) -> bool {
    !b
}
/// Default for de-serialized [GdsStruct::cached]
fn default_true() -> bool {
    true
}
