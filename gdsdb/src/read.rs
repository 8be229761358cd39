//!
//! # Gdsdb Reading, Parsing & Scanning
//!

// Std-Lib Imports
use std::fs::File;
use std::io::{Cursor, Read, Seek, SeekFrom};
use std::path::Path;

// Crates.io
use byteorder::{BigEndian, ReadBytesExt};
use memmap2::Mmap;
use tracing::{debug, trace, warn};

// Local Imports
use crate::codec;
use crate::data::*;
use crate::error::{ErrorHelper, GdsContext, GdsError, GdsResult, GdsSizeRule};
use crate::geom::GdsPoint;

/// # GdsReader
///
/// Sequential record-reader over any seekable byte source.
/// Generally either a memory-mapped file, or an in-memory byte slice.
///
/// Each record's declared length is checked against its record-type's [GdsSizeRule] before decoding.
/// Records outside the modelled subset are passed over, and returned as [GdsRecord::Skipped].
///
pub struct GdsReader<R> {
    /// Source being read
    file: R,
}
/// Reader of memory-mapped files
pub type GdsFileReader = GdsReader<Cursor<Mmap>>;

impl GdsReader<Cursor<Mmap>> {
    /// Create a [GdsReader], opening [File] at path `fname`
    pub fn open(fname: impl AsRef<Path>) -> GdsResult<Self> {
        Self::from_file(File::open(fname)?)
    }
    /// Create a [GdsReader] of [File] `file`
    pub fn from_file(file: File) -> GdsResult<Self> {
        // This is our one line of `unsafe`, for loading memory-mapped data.
        let mmap = unsafe { Mmap::map(&file)? };
        Ok(Self::new(Cursor::new(mmap)))
    }
}
impl<'a> GdsReader<Cursor<&'a [u8]>> {
    /// Create a [GdsReader] over in-memory `bytes`
    pub fn from_bytes(bytes: &'a [u8]) -> Self {
        Self::new(Cursor::new(bytes))
    }
}
impl<R: Read + Seek> GdsReader<R> {
    /// Create a [GdsReader] of `file`
    pub fn new(file: R) -> Self {
        Self { file }
    }
    /// Read the next record-header.
    /// Fails on declared lengths which are too short to hold the header, or odd.
    pub fn read_record_header(&mut self) -> GdsResult<GdsRecordHeader> {
        // Read the 16-bit record-size. (In bytes, including the four header bytes.)
        let len = self.file.read_u16::<BigEndian>()?;
        if len < 4 || len % 2 != 0 {
            return Err(GdsError::RecordLen(len.into()));
        }
        let rtype = self.file.read_u8()?;
        // The data-type byte is kept, but not checked against the record-type
        let dtype = self.file.read_u8()?;
        Ok(GdsRecordHeader {
            rtype,
            dtype,
            len: len - 4,
        })
    }
    /// Read the next [GdsRecord]
    pub fn read_record(&mut self) -> GdsResult<GdsRecord> {
        let header = self.read_record_header()?;
        self.read_record_content(&header)
    }
    /// Check `header` against its record-type's [GdsSizeRule], if it has one
    pub fn check_size(&mut self, header: &GdsRecordHeader) -> GdsResult<()> {
        if let Some(rule) = header.record_type().and_then(|r| r.size_rule()) {
            if !rule.accepts(header.total_len()) {
                let bytepos = self.pos()? - 4;
                return Err(GdsError::format(
                    header.rtype,
                    rule,
                    header.total_len(),
                    bytepos,
                ));
            }
        }
        Ok(())
    }
    /// Read and decode the content of the record whose header was just read
    pub fn read_record_content(&mut self, header: &GdsRecordHeader) -> GdsResult<GdsRecord> {
        self.check_size(header)?;
        let len = header.len as usize;
        let rtype = match header.record_type() {
            Some(r) if r.size_rule().is_some() => r,
            _ => {
                // Unknown or unmodelled. Pass over its payload.
                trace!(
                    "Skipping record type {:#04x} of {} bytes",
                    header.rtype,
                    header.len
                );
                self.skip(header)?;
                return Ok(GdsRecord::Skipped {
                    rtype: header.rtype,
                    len: header.len,
                });
            }
        };
        let file = &mut self.file;
        let record = match rtype {
            // Library-Level Records
            GdsRecordType::Header => GdsRecord::Header {
                version: codec::read_i16(file)?,
            },
            GdsRecordType::BgnLib => GdsRecord::BgnLib {
                dates: read_dates(file)?,
            },
            GdsRecordType::LibName => GdsRecord::LibName(codec::read_str(file, len)?),
            GdsRecordType::Units => {
                GdsRecord::Units(codec::read_f64(file)?, codec::read_f64(file)?)
            }
            GdsRecordType::EndLib => GdsRecord::EndLib,

            // Structure (Cell) Level Records
            GdsRecordType::BgnStruct => GdsRecord::BgnStruct {
                dates: read_dates(file)?,
            },
            GdsRecordType::StructName => GdsRecord::StructName(codec::read_str(file, len)?),
            GdsRecordType::StructRefName => {
                GdsRecord::StructRefName(codec::read_str(file, len)?)
            }
            GdsRecordType::EndStruct => GdsRecord::EndStruct,

            // Element-Level Records
            GdsRecordType::Boundary => GdsRecord::Boundary,
            GdsRecordType::Path => GdsRecord::Path,
            GdsRecordType::StructRef => GdsRecord::StructRef,
            GdsRecordType::ArrayRef => GdsRecord::ArrayRef,
            GdsRecordType::Text => GdsRecord::Text,
            GdsRecordType::Node => GdsRecord::Node,
            GdsRecordType::Box => GdsRecord::Box,
            GdsRecordType::Layer => GdsRecord::Layer(codec::read_i16(file)?),
            GdsRecordType::DataType => GdsRecord::DataType(codec::read_i16(file)?),
            GdsRecordType::Width => GdsRecord::Width(codec::read_i32(file)?),
            GdsRecordType::Xy => {
                let mut xy = vec![0; len / 4];
                file.read_i32_into::<BigEndian>(&mut xy)?;
                GdsRecord::Xy(xy)
            }
            GdsRecordType::EndElement => GdsRecord::EndElement,
            GdsRecordType::ColRow => GdsRecord::ColRow {
                cols: codec::read_i16(file)?,
                rows: codec::read_i16(file)?,
            },
            GdsRecordType::Strans => GdsRecord::Strans(file.read_u8()?, file.read_u8()?),
            GdsRecordType::Mag => GdsRecord::Mag(codec::read_f64(file)?),
            GdsRecordType::Angle => GdsRecord::Angle(codec::read_f64(file)?),
            GdsRecordType::PathType => GdsRecord::PathType(codec::read_i16(file)?),
            GdsRecordType::ElemFlags => GdsRecord::ElemFlags(file.read_u8()?, file.read_u8()?),
            GdsRecordType::BeginExtn => GdsRecord::BeginExtn(codec::read_i32(file)?),
            GdsRecordType::EndExtn => GdsRecord::EndExtn(codec::read_i32(file)?),
            // Everything else has no size-rule, and was skipped above
            _ => return Err(GdsError::Str(format!("No decoder for {:?}", rtype))),
        };
        Ok(record)
    }
    /// Read the raw payload of the record whose header was just read
    pub fn read_payload(&mut self, header: &GdsRecordHeader) -> GdsResult<Vec<u8>> {
        let mut rv = vec![0; header.len as usize];
        self.file.read_exact(&mut rv)?;
        Ok(rv)
    }
    /// Read the raw bytes in range `[start, end)`, leaving the position at `end`
    pub fn read_range(&mut self, start: u64, end: u64) -> GdsResult<Vec<u8>> {
        self.file.seek(SeekFrom::Start(start))?;
        let mut rv = vec![0; (end - start) as usize];
        self.file.read_exact(&mut rv)?;
        Ok(rv)
    }
    /// Skip over the payload of the record whose header was just read
    pub fn skip(&mut self, header: &GdsRecordHeader) -> GdsResult<()> {
        self.file.seek(SeekFrom::Current(header.len.into()))?;
        Ok(())
    }
    /// Get the current byte position
    pub fn pos(&mut self) -> GdsResult<u64> {
        Ok(self.file.stream_position()?)
    }
}
/// Read a `BGNLIB` or `BGNSTR` twelve-entry date payload
fn read_dates(file: &mut impl Read) -> GdsResult<[i16; 12]> {
    let mut dates = [0; 12];
    file.read_i16_into::<BigEndian>(&mut dates)?;
    Ok(dates)
}

/// # GdsStructScan
/// Typically generated by first-pass file scanning.
/// Stores a struct name and byte-offsets in its source.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct GdsStructScan {
    /// Struct Name
    pub name: String,
    /// Starting byte offset, at beginning of the `BGNSTR` header
    pub start: u64,
    /// Ending byte offset, just past the `ENDSTR` record
    pub end: u64,
}
/// # GdsLibScan
/// Raw library-level record payloads, plus the locations of all struct definitions
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct GdsLibScan {
    /// `HEADER` payload: the two-byte version
    pub header: Vec<u8>,
    /// `BGNLIB` payload: modification & access dates
    pub bgnlib: Vec<u8>,
    /// `LIBNAME` payload, including any padding
    pub libname: Vec<u8>,
    /// `UNITS` payload: two eight-byte floats
    pub units: Vec<u8>,
    /// Struct locations, in stream order
    pub structs: Vec<GdsStructScan>,
}

/// # GdsScanner
/// Scans a stream for [GdsStruct] definitions,
/// creating a first-pass list of their names and byte-locations,
/// without decoding their content.
pub struct GdsScanner<R> {
    /// Reader-helper
    rdr: GdsReader<R>,
    /// Most recent record-header, for error reporting
    last: GdsRecordHeader,
    /// Number of records read
    numread: usize,
    /// Context Stack
    ctx_stack: Vec<GdsContext>,
}
impl GdsScanner<Cursor<Mmap>> {
    /// Open and scan file `fname`
    pub fn scan(fname: impl AsRef<Path>) -> GdsResult<GdsLibScan> {
        Self::new(GdsReader::open(fname)?).scan_lib()
    }
}
impl<R: Read + Seek> GdsScanner<R> {
    /// Create a new [GdsScanner]
    pub fn new(rdr: GdsReader<R>) -> Self {
        Self {
            rdr,
            last: GdsRecordHeader {
                rtype: 0,
                dtype: 0,
                len: 0,
            },
            numread: 0,
            ctx_stack: Vec::new(),
        }
    }
    /// Convert back into our underlying [GdsReader]
    pub fn into_reader(self) -> GdsReader<R> {
        self.rdr
    }
    /// Read the next record-header, checking its size
    fn next(&mut self) -> GdsResult<GdsRecordHeader> {
        let header = self.rdr.read_record_header()?;
        self.last = header;
        self.numread += 1;
        self.rdr.check_size(&header)?;
        Ok(header)
    }
    /// Scan the library-level records, and the locations of all structs
    pub fn scan_lib(&mut self) -> GdsResult<GdsLibScan> {
        self.ctx_stack.push(GdsContext::Library);
        let mut scan = GdsLibScan::default();
        loop {
            let header = self.next()?;
            match header.record_type() {
                Some(GdsRecordType::EndLib) => break,
                Some(GdsRecordType::Header) => scan.header = self.rdr.read_payload(&header)?,
                Some(GdsRecordType::BgnLib) => scan.bgnlib = self.rdr.read_payload(&header)?,
                Some(GdsRecordType::LibName) => scan.libname = self.rdr.read_payload(&header)?,
                Some(GdsRecordType::Units) => scan.units = self.rdr.read_payload(&header)?,
                Some(GdsRecordType::BgnStruct) => {
                    let s = self.scan_struct(&header)?;
                    debug!("Scanned struct {} at bytes {}..{}", s.name, s.start, s.end);
                    scan.structs.push(s);
                }
                // Everything else: skip and continue
                _ => self.rdr.skip(&header)?,
            }
        }
        self.assert(!scan.header.is_empty(), "Missing HEADER record")?;
        self.assert(!scan.bgnlib.is_empty(), "Missing BGNLIB record")?;
        self.assert(!scan.units.is_empty(), "Missing UNITS record")?;
        self.ctx_stack.pop();
        Ok(scan)
    }
    /// Scan a single struct definition.
    /// Starts *after* the `BGNSTR` header, passed as `header`, has been read.
    fn scan_struct(&mut self, header: &GdsRecordHeader) -> GdsResult<GdsStructScan> {
        self.ctx_stack.push(GdsContext::Struct);
        // Back up over the four header bytes for our start-position
        let start = self.rdr.pos()? - 4;
        self.rdr.skip(header)?;

        let header = self.next()?;
        if header.record_type() != Some(GdsRecordType::StructName) {
            return self.fail("Missing STRNAME record");
        }
        let name = codec::read_str(&mut self.rdr.file, header.len as usize)?;

        // Skip over everything until `ENDSTR`
        let end = loop {
            let header = self.next()?;
            match header.record_type() {
                Some(GdsRecordType::EndStruct) => break self.rdr.pos()?,
                // Check for records which cannot appear in a struct,
                // lest we find an end-of-library and run off the end of the stream.
                Some(GdsRecordType::EndLib) | Some(GdsRecordType::BgnStruct) => {
                    return self.fail("Unterminated struct")
                }
                _ => self.rdr.skip(&header)?,
            }
        };
        self.ctx_stack.pop();
        Ok(GdsStructScan { name, start, end })
    }
}
impl<R: Read + Seek> ErrorHelper for GdsScanner<R> {
    type Error = GdsError;
    fn err(&mut self, msg: impl Into<String>) -> GdsError {
        GdsError::Parse {
            msg: msg.into(),
            record: GdsRecord::Skipped {
                rtype: self.last.rtype,
                len: self.last.len,
            },
            recordnum: self.numread,
            bytepos: self.rdr.pos().unwrap_or_default(),
            ctx: self.ctx_stack.clone(),
        }
    }
}

/// # GdsParser
/// Loads [GdsRecord]s from a [GdsReader], one at a time,
/// and converts them into a tree of Gds data structures.
pub struct GdsParser<R> {
    /// Reader-helper
    rdr: GdsReader<R>,
    /// Next record and its byte position, if peeked
    peeked: Option<(GdsRecord, u64)>,
    /// Most recent record, for error reporting
    last: GdsRecord,
    /// Byte position of the most recent record
    recpos: u64,
    /// Number of records read
    numread: usize,
    /// Number of text, node, and box elements skipped
    skipped: usize,
    /// Context Stack
    ctx_stack: Vec<GdsContext>,
}
impl GdsParser<Cursor<Mmap>> {
    /// Create a new [GdsParser] for the file at path `fname`
    pub fn open(fname: impl AsRef<Path>) -> GdsResult<Self> {
        Ok(Self::new(GdsReader::open(fname)?))
    }
}
impl<R: Read + Seek> GdsParser<R> {
    /// Create a new [GdsParser]
    pub fn new(rdr: GdsReader<R>) -> Self {
        Self {
            rdr,
            peeked: None,
            last: GdsRecord::Skipped { rtype: 0, len: 0 },
            recpos: 0,
            numread: 0,
            skipped: 0,
            ctx_stack: Vec::new(),
        }
    }
    /// Number of text, node, and box elements skipped so far
    pub fn skipped(&self) -> usize {
        self.skipped
    }
    /// Read a record and its starting byte position
    fn read(&mut self) -> GdsResult<(GdsRecord, u64)> {
        let pos = self.rdr.pos()?;
        let record = self.rdr.read_record()?;
        Ok((record, pos))
    }
    /// Advance and return the next record
    fn next(&mut self) -> GdsResult<GdsRecord> {
        let (record, pos) = match self.peeked.take() {
            Some(p) => p,
            None => self.read()?,
        };
        self.recpos = pos;
        self.numread += 1;
        self.last = record.clone();
        Ok(record)
    }
    /// Peek at our next record, without advancing
    fn peek(&mut self) -> GdsResult<&GdsRecord> {
        let peeked = match self.peeked.take() {
            Some(p) => p,
            None => self.read()?,
        };
        Ok(&self.peeked.insert(peeked).0)
    }
    /// Parse a [GdsLibrary]. Generally the start-state when reading a GDS file.
    pub fn parse_lib(&mut self) -> GdsResult<GdsLibrary> {
        self.ctx_stack.push(GdsContext::Library);
        let mut lib = GdsLibrary::default();
        // Read the Header and its version data
        lib.version = match self.next()? {
            GdsRecord::Header { version } => version,
            _ => return self.fail("Invalid library: missing GDS HEADER record"),
        };
        // Read the begin-lib
        lib.dates = match self.next()? {
            GdsRecord::BgnLib { dates } => GdsDateTimes::decode(&dates),
            _ => return self.fail("Invalid library: missing GDS BGNLIB record"),
        };
        // Iterate over all others
        let mut units = None;
        loop {
            let r = self.next()?;
            match r {
                GdsRecord::EndLib => break, // End-of-library
                GdsRecord::LibName(d) => lib.name = d,
                GdsRecord::Units(d0, d1) => units = Some(GdsUnits(d0, d1)),
                GdsRecord::BgnStruct { dates } => {
                    let strukt = self.parse_struct(dates)?;
                    lib.structs.push(strukt);
                }
                // Library-level records outside our model, e.g. REFLIBS and FONTS
                GdsRecord::Skipped { .. } => (),
                // Invalid
                _ => return self.invalid(r),
            };
        }
        lib.units = self.unwrap(units, "Invalid library: missing GDS UNITS record")?;
        debug!("Parsed library {} with {} structs", lib.name, lib.structs.len());
        if self.skipped > 0 {
            warn!(
                "Skipped {} unsupported text, node, and box elements",
                self.skipped
            );
        }
        self.ctx_stack.pop();
        Ok(lib)
    }
    /// Parse a stand-alone struct definition, from its `BGNSTR` through its `ENDSTR`.
    /// As stored per-struct in a [crate::GdsStore].
    pub fn parse_struct_def(&mut self) -> GdsResult<GdsStruct> {
        match self.next()? {
            GdsRecord::BgnStruct { dates } => self.parse_struct(dates),
            r => self.invalid(r),
        }
    }
    /// Parse a cell ([GdsStruct]).
    /// Starts after its `BGNSTR` record, whose `dates` are passed as an argument.
    fn parse_struct(&mut self, dates: [i16; 12]) -> GdsResult<GdsStruct> {
        self.ctx_stack.push(GdsContext::Struct);
        let mut strukt = GdsStructBuilder::default();
        strukt = strukt.dates(GdsDateTimes::decode(&dates));
        strukt = match self.next()? {
            GdsRecord::StructName(d) => strukt.name(d),
            _ => return self.fail("Missing Gds StructName"),
        };
        // Parse [GdsElement] records until hitting a [GdsRecord::EndStruct]
        let mut elems = Vec::<GdsElement>::with_capacity(64);
        loop {
            let r = self.next()?;
            match r {
                GdsRecord::EndStruct => break, // End-of-struct
                GdsRecord::Boundary => elems.push(self.parse_boundary()?.into()),
                GdsRecord::Path => elems.push(self.parse_path()?.into()),
                GdsRecord::StructRef => elems.push(self.parse_struct_ref()?.into()),
                GdsRecord::ArrayRef => elems.push(self.parse_array_ref()?.into()),
                GdsRecord::Text | GdsRecord::Node | GdsRecord::Box => self.skip_element(&r)?,
                // Struct-level records outside our model, e.g. STRCLASS
                GdsRecord::Skipped { .. } => (),
                // Invalid
                _ => return self.invalid(r),
            };
        }
        strukt = strukt.elems(elems);
        let strukt = strukt.build().map_err(|e| self.err(e.to_string()))?;
        self.ctx_stack.pop();
        Ok(strukt)
    }
    /// Skip over an element outside our model, through its `ENDEL`
    fn skip_element(&mut self, opener: &GdsRecord) -> GdsResult<()> {
        self.ctx_stack.push(GdsContext::Skipped);
        trace!("Skipping unsupported {:?} element", opener);
        loop {
            match self.next()? {
                GdsRecord::EndElement => break,
                GdsRecord::EndStruct | GdsRecord::EndLib => {
                    return self.fail("Unterminated element")
                }
                _ => (),
            }
        }
        self.skipped += 1;
        self.ctx_stack.pop();
        Ok(())
    }
    /// Parse a [GdsBoundary]
    fn parse_boundary(&mut self) -> GdsResult<GdsBoundary> {
        self.ctx_stack.push(GdsContext::Boundary);
        let mut b = GdsBoundaryBuilder::default();
        loop {
            let r = self.next()?;
            b = match r {
                GdsRecord::EndElement => break, // End-of-element
                GdsRecord::Layer(d) => b.layer(d),
                GdsRecord::DataType(d) => b.datatype(d),
                GdsRecord::Xy(d) => {
                    self.check_xy(&d, GdsSizeRule::Multiple { of: 8, min: 4 })?;
                    b.xy(GdsPoint::parse_vec(&d)?)
                }
                GdsRecord::ElemFlags(d0, d1) => b.elflags(GdsElemFlags(d0, d1)),
                // Properties and PLEX
                GdsRecord::Skipped { .. } => b,
                // Invalid
                _ => return self.invalid(r),
            };
        }
        let b = b.build().map_err(|e| self.err(e.to_string()))?;
        self.ctx_stack.pop();
        Ok(b)
    }
    /// Parse a [GdsPath]
    fn parse_path(&mut self) -> GdsResult<GdsPath> {
        self.ctx_stack.push(GdsContext::Path);
        let mut b = GdsPathBuilder::default();
        loop {
            let r = self.next()?;
            b = match r {
                GdsRecord::EndElement => break, // End-of-element
                GdsRecord::Layer(d) => b.layer(d),
                GdsRecord::DataType(d) => b.datatype(d),
                GdsRecord::Xy(d) => {
                    self.check_xy(&d, GdsSizeRule::Multiple { of: 8, min: 2 })?;
                    b.xy(GdsPoint::parse_vec(&d)?)
                }
                GdsRecord::Width(d) => b.width(d),
                GdsRecord::PathType(d) => b.path_type(d),
                GdsRecord::BeginExtn(d) => b.begin_extn(d),
                GdsRecord::EndExtn(d) => b.end_extn(d),
                GdsRecord::ElemFlags(d0, d1) => b.elflags(GdsElemFlags(d0, d1)),
                GdsRecord::Skipped { .. } => b,
                // Invalid
                _ => return self.invalid(r),
            };
        }
        let b = b.build().map_err(|e| self.err(e.to_string()))?;
        self.ctx_stack.pop();
        Ok(b)
    }
    /// Parse a [GdsStructRef]
    fn parse_struct_ref(&mut self) -> GdsResult<GdsStructRef> {
        self.ctx_stack.push(GdsContext::StructRef);
        let mut b = GdsStructRefBuilder::default();
        loop {
            let r = self.next()?;
            b = match r {
                GdsRecord::EndElement => break, // End-of-element
                GdsRecord::StructRefName(d) => b.name(d),
                GdsRecord::Xy(d) => {
                    self.check_xy(&d, GdsSizeRule::Exact(12))?;
                    b.xy(GdsPoint::new(d[0], d[1]))
                }
                GdsRecord::ElemFlags(d0, d1) => b.elflags(GdsElemFlags(d0, d1)),
                GdsRecord::Strans(d0, d1) => b.strans(self.parse_strans(d0, d1)?),
                GdsRecord::Skipped { .. } => b,
                // Invalid
                _ => return self.invalid(r),
            };
        }
        let b = b.build().map_err(|e| self.err(e.to_string()))?;
        self.ctx_stack.pop();
        Ok(b)
    }
    /// Parse a [GdsArrayRef]
    fn parse_array_ref(&mut self) -> GdsResult<GdsArrayRef> {
        self.ctx_stack.push(GdsContext::ArrayRef);
        let mut b = GdsArrayRefBuilder::default();
        loop {
            let r = self.next()?;
            b = match r {
                GdsRecord::EndElement => break, // End-of-element
                GdsRecord::StructRefName(d) => b.name(d),
                GdsRecord::ColRow { rows, cols } => b.rows(rows).cols(cols),
                GdsRecord::Xy(d) => {
                    self.check_xy(&d, GdsSizeRule::Exact(28))?;
                    b.xy([
                        GdsPoint::new(d[0], d[1]),
                        GdsPoint::new(d[2], d[3]),
                        GdsPoint::new(d[4], d[5]),
                    ])
                }
                GdsRecord::ElemFlags(d0, d1) => b.elflags(GdsElemFlags(d0, d1)),
                GdsRecord::Strans(d0, d1) => b.strans(self.parse_strans(d0, d1)?),
                GdsRecord::Skipped { .. } => b,
                // Invalid
                _ => return self.invalid(r),
            };
        }
        let b = b.build().map_err(|e| self.err(e.to_string()))?;
        self.ctx_stack.pop();
        Ok(b)
    }
    /// Parse a [GdsStrans] from records. Header bytes are passed as arguments `d0`, `d1`.
    fn parse_strans(&mut self, d0: u8, d1: u8) -> GdsResult<GdsStrans> {
        let mut s = GdsStrans::from_bytes(d0, d1);
        // And parse optional magnitude & angle
        loop {
            match *self.peek()? {
                GdsRecord::Mag(d) => s.mag = Some(d),
                GdsRecord::Angle(d) => s.angle = Some(d),
                _ => break,
            }
            self.next()?; // Advance past the peeked record
        }
        Ok(s)
    }
    /// Check the just-read `XY` record, holding `xy`, against its element's size-rule
    fn check_xy(&mut self, xy: &[i32], rule: GdsSizeRule) -> GdsResult<()> {
        let total = (4 * xy.len() + 4) as u16;
        if rule.accepts(total) {
            return Ok(());
        }
        Err(GdsError::format(
            GdsRecordType::Xy as u8,
            rule,
            total,
            self.recpos,
        ))
    }
    /// Error helper for an invalid record
    fn invalid<T>(&mut self, record: GdsRecord) -> GdsResult<T> {
        Err(GdsError::Parse {
            msg: "Invalid GDS Record".into(),
            record,
            recordnum: self.numread,
            bytepos: self.recpos,
            ctx: self.ctx_stack.clone(),
        })
    }
}
impl<R: Read + Seek> ErrorHelper for GdsParser<R> {
    type Error = GdsError;
    fn err(&mut self, msg: impl Into<String>) -> GdsError {
        GdsError::Parse {
            msg: msg.into(),
            record: self.last.clone(),
            recordnum: self.numread,
            bytepos: self.recpos,
            ctx: self.ctx_stack.clone(),
        }
    }
}
