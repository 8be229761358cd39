//!
//! # Gdsdb Byte-Encoding and Writing
//!

// Std-Lib Imports
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

// Crates.io
use byteorder::{BigEndian, WriteBytesExt};

// Local Imports
use crate::codec;
use crate::data::*;
use crate::error::{GdsError, GdsResult};
use crate::geom::GdsPoint;

/// Gds Writing Helper
pub struct GdsWriter<'wr> {
    /// Write Destination
    dest: Box<dyn Write + 'wr>,
}
impl<'wr> GdsWriter<'wr> {
    /// Create new [GdsWriter] with destination file `fname`
    pub fn open(fname: impl AsRef<Path>) -> GdsResult<Self> {
        let file = BufWriter::new(File::create(fname)?);
        Ok(Self::new(file))
    }
    /// Create a new [GdsWriter] to destination `dest`
    pub fn new(dest: impl Write + 'wr) -> Self {
        Self {
            dest: Box::new(dest),
        }
    }
    /// Write a [GdsLibrary] to the destination.
    /// Fields are written in the Gds-recommended order.
    /// Structs not yet loaded from an attached store are written as empty definitions;
    /// see [GdsLibrary::cache_all].
    pub fn write_lib(&mut self, lib: &GdsLibrary) -> GdsResult<()> {
        self.write_lib_header(lib)?;
        for strukt in lib.structs.iter() {
            self.write_struct(strukt)?;
        }
        self.write_record(&GdsRecord::EndLib)?;
        self.dest.flush()?;
        Ok(())
    }
    /// Write the library-level records preceding its struct definitions
    fn write_lib_header(&mut self, lib: &GdsLibrary) -> GdsResult<()> {
        self.write_records(&[
            GdsRecord::Header {
                version: lib.version,
            },
            GdsRecord::BgnLib {
                dates: lib.dates.encode(),
            },
            GdsRecord::LibName(lib.name.clone()),
            GdsRecord::Units(lib.units.0, lib.units.1),
        ])
    }
    /// Write [GdsStruct] `strukt` to the destination
    pub fn write_struct(&mut self, strukt: &GdsStruct) -> GdsResult<()> {
        self.write_records(&[
            GdsRecord::BgnStruct {
                dates: strukt.dates.encode(),
            },
            GdsRecord::StructName(strukt.name.clone()),
        ])?;
        for elem in strukt.elems.iter() {
            self.write_records(&elem.to_records())?;
        }
        self.write_record(&GdsRecord::EndStruct)?;
        Ok(())
    }
    /// Helper to write a sequence of [GdsRecord]s
    fn write_records(&mut self, records: &[GdsRecord]) -> GdsResult<()> {
        for r in records {
            self.write_record(r)?;
        }
        Ok(())
    }
    /// Encode into bytes and write onto `dest`
    pub fn write_record(&mut self, record: &GdsRecord) -> GdsResult<()> {
        // This is split in two parts - header and data -
        // largely to ease handling the variety of datatypes

        // First grab the header info: RecordType, DataType, and length
        use codec::gds_strlen;
        use GdsDataType::{BitArray, NoData, Str, F64, I16, I32};
        let (rtype, dtype, len) = match record {
            // Library-Level Records
            GdsRecord::Header { .. } => (GdsRecordType::Header, I16, 2),
            GdsRecord::BgnLib { .. } => (GdsRecordType::BgnLib, I16, 24),
            GdsRecord::LibName(s) => (GdsRecordType::LibName, Str, gds_strlen(s)),
            GdsRecord::Units(_, _) => (GdsRecordType::Units, F64, 16),
            GdsRecord::EndLib => (GdsRecordType::EndLib, NoData, 0),

            // Structure (Cell) Level Records
            GdsRecord::BgnStruct { .. } => (GdsRecordType::BgnStruct, I16, 24),
            GdsRecord::StructName(s) => (GdsRecordType::StructName, Str, gds_strlen(s)),
            GdsRecord::StructRefName(s) => (GdsRecordType::StructRefName, Str, gds_strlen(s)),
            GdsRecord::EndStruct => (GdsRecordType::EndStruct, NoData, 0),

            // Element-Level Records
            GdsRecord::Boundary => (GdsRecordType::Boundary, NoData, 0),
            GdsRecord::Path => (GdsRecordType::Path, NoData, 0),
            GdsRecord::StructRef => (GdsRecordType::StructRef, NoData, 0),
            GdsRecord::ArrayRef => (GdsRecordType::ArrayRef, NoData, 0),
            GdsRecord::Text => (GdsRecordType::Text, NoData, 0),
            GdsRecord::Node => (GdsRecordType::Node, NoData, 0),
            GdsRecord::Box => (GdsRecordType::Box, NoData, 0),
            GdsRecord::Layer(_) => (GdsRecordType::Layer, I16, 2),
            GdsRecord::DataType(_) => (GdsRecordType::DataType, I16, 2),
            GdsRecord::Width(_) => (GdsRecordType::Width, I32, 4),
            GdsRecord::Xy(d) => (GdsRecordType::Xy, I32, 4 * d.len()),
            GdsRecord::EndElement => (GdsRecordType::EndElement, NoData, 0),

            // More (less well-categorized here) record-types
            GdsRecord::ColRow { .. } => (GdsRecordType::ColRow, I16, 4),
            GdsRecord::Strans(_, _) => (GdsRecordType::Strans, BitArray, 2),
            GdsRecord::Mag(_) => (GdsRecordType::Mag, F64, 8),
            GdsRecord::Angle(_) => (GdsRecordType::Angle, F64, 8),
            GdsRecord::PathType(_) => (GdsRecordType::PathType, I16, 2),
            GdsRecord::ElemFlags(_, _) => (GdsRecordType::ElemFlags, BitArray, 2),
            GdsRecord::BeginExtn(_) => (GdsRecordType::BeginExtn, I32, 4),
            GdsRecord::EndExtn(_) => (GdsRecordType::EndExtn, I32, 4),

            // Skipped records no longer have their content
            GdsRecord::Skipped { rtype, .. } => {
                return Err(GdsError::Str(format!(
                    "Cannot write skipped record of type {:#04x}",
                    rtype
                )))
            }
        };
        // Send those header-bytes to the writer.
        // Include the four header bytes in total-length.
        match u16::try_from(len + 4) {
            Ok(val) => self.dest.write_u16::<BigEndian>(val)?,
            Err(_) => return Err(GdsError::RecordLen(len)),
        };
        self.dest.write_u8(rtype as u8)?;
        self.dest.write_u8(dtype as u8)?;

        // Now write the data portion
        // This section is generally organized by DataType
        let dest = &mut self.dest;
        match record {
            // NoData
            GdsRecord::EndLib
            | GdsRecord::EndStruct
            | GdsRecord::Boundary
            | GdsRecord::Path
            | GdsRecord::StructRef
            | GdsRecord::ArrayRef
            | GdsRecord::Text
            | GdsRecord::EndElement
            | GdsRecord::Node
            | GdsRecord::Box
            | GdsRecord::Skipped { .. } => (),

            // BitArrays
            GdsRecord::Strans(d0, d1) | GdsRecord::ElemFlags(d0, d1) => {
                dest.write_u8(*d0)?;
                dest.write_u8(*d1)?;
            }
            // Single I16s
            GdsRecord::Header { version: d }
            | GdsRecord::Layer(d)
            | GdsRecord::DataType(d)
            | GdsRecord::PathType(d) => codec::write_i16(dest, *d)?,

            // Single I32s
            GdsRecord::Width(d) | GdsRecord::BeginExtn(d) | GdsRecord::EndExtn(d) => {
                codec::write_i32(dest, *d)?
            }
            // Single F64s
            GdsRecord::Mag(d) | GdsRecord::Angle(d) => codec::write_f64(dest, *d)?,
            // "Structs"
            GdsRecord::Units(d0, d1) => {
                codec::write_f64(dest, *d0)?;
                codec::write_f64(dest, *d1)?;
            }
            GdsRecord::ColRow { cols, rows } => {
                codec::write_i16(dest, *cols)?;
                codec::write_i16(dest, *rows)?;
            }
            // Vectors
            GdsRecord::BgnLib { dates: d } | GdsRecord::BgnStruct { dates: d } => {
                for val in d.iter() {
                    codec::write_i16(dest, *val)?;
                }
            }
            GdsRecord::Xy(d) => {
                for val in d.iter() {
                    codec::write_i32(dest, *val)?;
                }
            }
            // Strings
            GdsRecord::LibName(s) | GdsRecord::StructName(s) | GdsRecord::StructRefName(s) => {
                codec::write_str(dest, s)?
            }
        };
        Ok(())
    }
}

/// Encode a [GdsStruct] as a stand-alone `BGNSTR`-through-`ENDSTR` byte-blob,
/// as stored per-struct in a [crate::GdsStore].
pub fn struct_to_bytes(strukt: &GdsStruct) -> GdsResult<Vec<u8>> {
    let mut bytes = Vec::new();
    GdsWriter::new(&mut bytes).write_struct(strukt)?;
    Ok(bytes)
}

/// # ToRecords
/// Conversion of in-memory data into its sequence of [GdsRecord]s
pub trait ToRecords {
    fn to_records(&self) -> Vec<GdsRecord>;
}

impl ToRecords for GdsStrans {
    /// Convert to a Vector of [GdsRecord], ordered as dictated by the GDSII spec BNF.
    fn to_records(&self) -> Vec<GdsRecord> {
        let (d0, d1) = self.to_bytes();
        let mut records = vec![GdsRecord::Strans(d0, d1)];
        if let Some(e) = self.mag {
            records.push(GdsRecord::Mag(e));
        }
        if let Some(e) = self.angle {
            records.push(GdsRecord::Angle(e));
        }
        records
    }
}
impl ToRecords for GdsPath {
    fn to_records(&self) -> Vec<GdsRecord> {
        let mut records = vec![GdsRecord::Path];
        if let Some(ref e) = self.elflags {
            records.push(GdsRecord::ElemFlags(e.0, e.1));
        }
        records.push(GdsRecord::Layer(self.layer));
        records.push(GdsRecord::DataType(self.datatype));
        if let Some(e) = self.path_type {
            records.push(GdsRecord::PathType(e));
        }
        if let Some(e) = self.width {
            records.push(GdsRecord::Width(e));
        }
        if let Some(e) = self.begin_extn {
            records.push(GdsRecord::BeginExtn(e));
        }
        if let Some(e) = self.end_extn {
            records.push(GdsRecord::EndExtn(e));
        }
        records.push(GdsRecord::Xy(GdsPoint::flatten_vec(&self.xy)));
        records.push(GdsRecord::EndElement);
        records
    }
}
impl ToRecords for GdsBoundary {
    fn to_records(&self) -> Vec<GdsRecord> {
        let mut records = vec![GdsRecord::Boundary];
        if let Some(ref e) = self.elflags {
            records.push(GdsRecord::ElemFlags(e.0, e.1));
        }
        records.push(GdsRecord::Layer(self.layer));
        records.push(GdsRecord::DataType(self.datatype));
        records.push(GdsRecord::Xy(GdsPoint::flatten_vec(&self.xy)));
        records.push(GdsRecord::EndElement);
        records
    }
}
impl ToRecords for GdsStructRef {
    fn to_records(&self) -> Vec<GdsRecord> {
        let mut records = vec![GdsRecord::StructRef];
        if let Some(ref e) = self.elflags {
            records.push(GdsRecord::ElemFlags(e.0, e.1));
        }
        records.push(GdsRecord::StructRefName(self.name.clone()));
        if let Some(ref e) = self.strans {
            records.extend(e.to_records());
        }
        records.push(GdsRecord::Xy(vec![self.xy.x, self.xy.y]));
        records.push(GdsRecord::EndElement);
        records
    }
}
impl ToRecords for GdsArrayRef {
    fn to_records(&self) -> Vec<GdsRecord> {
        let mut records = vec![GdsRecord::ArrayRef];
        if let Some(ref e) = self.elflags {
            records.push(GdsRecord::ElemFlags(e.0, e.1));
        }
        records.push(GdsRecord::StructRefName(self.name.clone()));
        if let Some(ref e) = self.strans {
            records.extend(e.to_records());
        }
        records.push(GdsRecord::ColRow {
            cols: self.cols,
            rows: self.rows,
        });
        records.push(GdsRecord::Xy(GdsPoint::flatten_vec(&self.xy)));
        records.push(GdsRecord::EndElement);
        records
    }
}
impl ToRecords for GdsElement {
    fn to_records(&self) -> Vec<GdsRecord> {
        use GdsElement::*;
        match self {
            GdsBoundary(e) => e.to_records(),
            GdsPath(e) => e.to_records(),
            GdsStructRef(e) => e.to_records(),
            GdsArrayRef(e) => e.to_records(),
        }
    }
}
