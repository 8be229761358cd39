// Crates.io
use chrono::NaiveDateTime;

// Local Imports
use crate::bbox::HasBBox;
use crate::codec;
use crate::data::*;
use crate::error::*;
use crate::geom::*;
use crate::library::roundtrip;
use crate::read::*;
use crate::ser::SerializationFormat::{Json, Yaml};
use crate::store::{self, GdsStore, GdsStoreSchema, MemStore, SqliteStore};
use crate::write::{GdsWriter, ToRecords};

/// Specified creation date for test cases
fn test_dates() -> GdsDateTimes {
    let test_date = GdsDateTime {
        year: 1970,
        month: 1,
        day: 1,
        hour: 0,
        minute: 0,
        second: 1,
    };
    GdsDateTimes {
        modified: test_date.clone(),
        accessed: test_date,
    }
}
/// Closed square boundary, with lower-left corner at (x, y)
fn square(x: i32, y: i32, size: i32) -> GdsBoundary {
    GdsBoundary {
        layer: 1,
        datatype: 0,
        xy: GdsPoint::vec(&[
            (x, y),
            (x, y + size),
            (x + size, y + size),
            (x + size, y),
            (x, y),
        ]),
        ..Default::default()
    }
}
/// Add a struct with known dates to `lib`
fn add_struct<'a>(lib: &'a mut GdsLibrary, name: &str) -> &'a mut GdsStruct {
    let s = lib.add(name);
    s.dates = test_dates();
    s
}
/// Create a small hierarchical library:
/// a 10x10 "leaf", a horizontal "wire", and a "top" which places and arrays the leaf.
fn sample_lib() -> GdsResult<GdsLibrary> {
    let mut lib = GdsLibrary::new("sample");
    lib.dates = test_dates();
    add_struct(&mut lib, "leaf").add(square(0, 0, 10));
    add_struct(&mut lib, "wire").add(
        GdsPathBuilder::default()
            .layer(2i16)
            .datatype(0i16)
            .xy(GdsPoint::vec(&[(0, 0), (10, 0)]))
            .width(4)
            .build()
            .map_err(|e| GdsError::Str(e.to_string()))?,
    );
    let top = add_struct(&mut lib, "top");
    top.add(GdsStructRef {
        name: "leaf".into(),
        xy: GdsPoint::new(100, 0),
        ..Default::default()
    });
    top.add(GdsArrayRef {
        name: "leaf".into(),
        xy: [
            GdsPoint::new(0, 0),
            GdsPoint::new(40, 0),
            GdsPoint::new(0, 40),
        ],
        cols: 2,
        rows: 2,
        ..Default::default()
    });
    Ok(lib)
}
/// Encode a sequence of records to bytes
fn encode(records: &[GdsRecord]) -> GdsResult<Vec<u8>> {
    let mut bytes = Vec::new();
    let mut wr = GdsWriter::new(&mut bytes);
    for r in records {
        wr.write_record(r)?;
    }
    drop(wr);
    Ok(bytes)
}
/// Encode a raw record, of any record-type
fn raw(rtype: u8, dtype: u8, payload: &[u8]) -> Vec<u8> {
    let len = (payload.len() + 4) as u16;
    let mut bytes = len.to_be_bytes().to_vec();
    bytes.push(rtype);
    bytes.push(dtype);
    bytes.extend_from_slice(payload);
    bytes
}
/// Assert `a` and `b` are equal, within a relative tolerance
fn assert_close(a: f64, b: f64) {
    let tol = 1e-15 * a.abs().max(b.abs());
    assert!((a - b).abs() <= tol, "{} != {}", a, b);
}

#[test]
fn floats() -> GdsResult<()> {
    // Test conversions between normal-human and GDSII floating-point formats
    let f = GdsFloat64::encode(0.0);
    assert_eq!(f, 0);
    let d = GdsFloat64::decode(f);
    assert_eq!(d, 0.0);
    assert_eq!(GdsFloat64::encode(1.0), 0x4110_0000_0000_0000);
    assert_eq!(GdsFloat64::encode(-2.0), 0xC120_0000_0000_0000);
    assert_close(GdsFloat64::decode(0x3E41_8937_4BC6_A7F0), 0.001);
    for val in [1.0, 1e-3, 1e-9, 1e-11, -0.69, -33.33e-33, 12345.678, 1e30, 0.0625] {
        assert_close(GdsFloat64::decode(GdsFloat64::encode(val)), val);
    }
    // Out-of-range magnitudes saturate and flush to zero
    assert_eq!(GdsFloat64::encode(1e300), 0x7FFF_FFFF_FFFF_FFFF);
    assert_eq!(GdsFloat64::encode(-1e300), 0xFFFF_FFFF_FFFF_FFFF);
    assert_eq!(GdsFloat64::encode(1e-300), 0);
    Ok(())
}
#[test]
fn ints_and_strings() -> GdsResult<()> {
    let mut bytes = Vec::new();
    for val in [0, 1, -1, i16::MAX, i16::MIN] {
        codec::write_i16(&mut bytes, val)?;
    }
    for val in [0, -7, i32::MAX, i32::MIN] {
        codec::write_i32(&mut bytes, val)?;
    }
    assert_eq!(&bytes[..4], &[0x00, 0x00, 0x00, 0x01]);
    let mut rd = &bytes[..];
    for val in [0, 1, -1, i16::MAX, i16::MIN] {
        assert_eq!(codec::read_i16(&mut rd)?, val);
    }
    for val in [0, -7, i32::MAX, i32::MIN] {
        assert_eq!(codec::read_i32(&mut rd)?, val);
    }
    // Short reads are stream errors
    let err = codec::read_i32(&mut &[0u8, 1][..]).unwrap_err();
    assert_eq!(err.kind(), GdsErrorKind::Stream);

    // Odd-length strings gain a padding byte, which is dropped on reading
    let mut bytes = Vec::new();
    codec::write_str(&mut bytes, "odd")?;
    assert_eq!(bytes, b"odd\0");
    assert_eq!(codec::read_str(&mut &bytes[..], 4)?, "odd");
    assert_eq!(codec::read_str(&mut &b"a\0b\0"[..], 4)?, "ab");
    assert_eq!(codec::gds_strlen("even"), 4);
    Ok(())
}
#[test]
fn transforms() -> GdsResult<()> {
    let p = GdsPoint::new(1, 1);
    // Steps apply in call order
    let t = GdsTransform::identity().scale(1., -1.).translate(1., 1.);
    assert_eq!(t.map(&p), GdsPoint::new(2, 0));
    let t = GdsTransform::identity().translate(1., 1.).scale(1., -1.);
    assert_eq!(t.map(&p), GdsPoint::new(2, -2));
    let t = GdsTransform::identity().scale(2., 2.).rotate(90.);
    assert_eq!(t.map(&GdsPoint::new(10, 0)), GdsPoint::new(0, 20));
    Ok(())
}
#[test]
fn element_bboxes() -> GdsResult<()> {
    let lib = sample_lib()?;
    let leaf = lib.bbox_of("leaf").unwrap();
    assert_eq!((leaf.x(), leaf.y(), leaf.width(), leaf.height()), (0, 0, 10, 10));

    let wire = lib.bbox_of("wire").unwrap();
    assert_eq!((wire.x(), wire.y(), wire.width(), wire.height()), (0, -2, 10, 4));

    let top = lib.get("top").unwrap();
    let sref = top.at(0).unwrap().bbox(&lib).unwrap();
    assert_eq!((sref.x(), sref.y(), sref.width(), sref.height()), (100, 0, 10, 10));
    let aref = top.at(1).unwrap().bbox(&lib).unwrap();
    assert_eq!((aref.x(), aref.y(), aref.width(), aref.height()), (0, 0, 30, 30));
    let all = top.bbox(&lib).unwrap();
    assert_eq!(all, GdsBBox {
        p0: GdsPoint::new(0, 0),
        p1: GdsPoint::new(110, 30),
    });
    assert!(all.contains(&GdsPoint::new(105, 5)));
    assert!(!all.contains(&GdsPoint::new(105, 31)));
    // The library's box encloses all of its structs, including the wire below y=0
    assert_eq!(
        lib.bbox(&lib),
        Some(GdsBBox {
            p0: GdsPoint::new(0, -2),
            p1: GdsPoint::new(110, 30),
        })
    );
    Ok(())
}
#[test]
fn path_bboxes() -> GdsResult<()> {
    let lib = GdsLibrary::new("paths");
    let mut path = GdsPath {
        xy: GdsPoint::vec(&[(0, 0), (10, 0)]),
        width: Some(4),
        path_type: Some(2),
        ..Default::default()
    };
    let b = path.bbox(&lib).unwrap();
    assert_eq!((b.x(), b.y(), b.width(), b.height()), (-2, -2, 14, 4));

    // Vertical segments widen in x
    path.xy = GdsPoint::vec(&[(0, 0), (0, 10)]);
    path.path_type = None;
    let b = path.bbox(&lib).unwrap();
    assert_eq!((b.x(), b.y(), b.width(), b.height()), (-2, 0, 4, 10));

    // Vertical paths extend in y
    path.path_type = Some(2);
    let b = path.bbox(&lib).unwrap();
    assert_eq!((b.x(), b.y(), b.width(), b.height()), (-2, -2, 4, 14));
    // Coincident leading points extend toward positive y
    path.xy = GdsPoint::vec(&[(0, 0), (0, 0), (0, 10)]);
    let b = path.bbox(&lib).unwrap();
    assert_eq!((b.x(), b.y(), b.width(), b.height()), (-2, 0, 4, 12));
    path.path_type = None;

    // Zero-width and single-point paths have no box
    path.width = Some(0);
    assert_eq!(path.bbox(&lib), None);
    path.width = Some(4);
    path.xy.truncate(1);
    assert_eq!(path.bbox(&lib), None);
    Ok(())
}
#[test]
fn transformed_ref_bboxes() -> GdsResult<()> {
    let lib = sample_lib()?;
    let mut sref = GdsStructRef {
        name: "leaf".into(),
        xy: GdsPoint::new(100, 0),
        strans: Some(GdsStrans {
            angle: Some(90.0),
            ..Default::default()
        }),
        ..Default::default()
    };
    let b = sref.bbox(&lib).unwrap();
    assert_eq!((b.x(), b.y(), b.width(), b.height()), (90, 0, 10, 10));

    sref.strans = Some(GdsStrans {
        reflected: true,
        ..Default::default()
    });
    let b = sref.bbox(&lib).unwrap();
    assert_eq!((b.x(), b.y(), b.width(), b.height()), (100, -10, 10, 10));

    sref.strans = Some(GdsStrans {
        mag: Some(2.0),
        ..Default::default()
    });
    let b = sref.bbox(&lib).unwrap();
    assert_eq!((b.x(), b.y(), b.width(), b.height()), (100, 0, 20, 20));
    Ok(())
}
#[test]
fn unresolved_ref_bboxes() -> GdsResult<()> {
    let mut lib = sample_lib()?;
    let dangling = GdsStructRef {
        name: "nonexistent".into(),
        ..Default::default()
    };
    assert_eq!(dangling.bbox(&lib), None);

    let empty_array = GdsArrayRef {
        name: "leaf".into(),
        cols: 0,
        rows: 2,
        ..Default::default()
    };
    assert_eq!(empty_array.bbox(&lib), None);

    // Self-referencing structs terminate, with no box from the cyclic reference
    let ouroboros = add_struct(&mut lib, "ouroboros");
    ouroboros.add(GdsStructRef {
        name: "ouroboros".into(),
        ..Default::default()
    });
    assert_eq!(lib.bbox_of("ouroboros"), None);
    // While its other content still counts
    lib.get_mut("ouroboros").unwrap().add(square(5, 5, 1));
    let b = lib.bbox_of("ouroboros").unwrap();
    assert_eq!((b.x(), b.y(), b.width(), b.height()), (5, 5, 1, 1));
    Ok(())
}
#[test]
fn lifecycle() -> GdsResult<()> {
    let mut lib = GdsLibrary::new("lifecycle");
    let x = lib.add("X");
    assert!(x.cached);
    assert!(!x.changed);
    lib.add("Y");
    assert_eq!(lib.len(), 2);
    assert_eq!(lib.at(0).unwrap().name, "X");

    assert!(lib.del("X"));
    assert!(!lib.del("X"));
    assert!(lib.get("X").is_none());
    assert_eq!(lib.at(0).unwrap().name, "Y");
    assert!(lib.at(1).is_none());
    assert_eq!(lib.deleted().len(), 1);
    assert_eq!(lib.deleted()[0].name, "X");

    lib.clear();
    assert!(lib.is_empty());
    assert!(lib.deleted().is_empty());
    Ok(())
}
#[test]
fn stats() -> GdsResult<()> {
    let lib = sample_lib()?;
    assert_eq!(
        lib.stats(),
        GdsStats {
            libraries: 1,
            structs: 3,
            boundaries: 1,
            paths: 1,
            struct_refs: 1,
            array_refs: 1,
            skipped: 0,
        }
    );
    Ok(())
}
#[test]
fn it_round_trips() -> GdsResult<()> {
    let mut lib = sample_lib()?;
    let top = lib.get_mut("top").unwrap();
    top.add(GdsStructRef {
        name: "leaf".into(),
        xy: GdsPoint::new(-5, 7),
        strans: Some(GdsStrans {
            reflected: true,
            abs_mag: true,
            mag: Some(0.5),
            angle: Some(270.0),
            ..Default::default()
        }),
        elflags: Some(GdsElemFlags(0, 1)),
    });
    top.add(GdsPath {
        layer: 3,
        datatype: 1,
        xy: GdsPoint::vec(&[(0, 0), (0, 50), (20, 50)]),
        width: Some(6),
        path_type: Some(4),
        begin_extn: Some(1),
        end_extn: Some(2),
        ..Default::default()
    });
    roundtrip(&lib)?;
    assert_eq!(GdsLibrary::from_bytes(&lib.to_bytes()?)?, lib);
    Ok(())
}
#[test]
fn record_too_long() -> GdsResult<()> {
    let mut lib = GdsLibrary::new("mylib");
    lib.add("mycell").add(GdsBoundary {
        xy: GdsPoint::parse_vec(&vec![0; 20_000])?,
        ..GdsBoundary::default()
    });
    match lib.to_bytes() {
        Err(e @ GdsError::RecordLen(_)) => {
            assert_eq!(e.kind(), GdsErrorKind::Format);
            Ok(())
        }
        Ok(_) | Err(_) => Err(GdsError::Str(
            "should generate a [GdsError::RecordLen] error".into(),
        )),
    }
}
#[test]
fn size_violation() -> GdsResult<()> {
    // A well-formed ENDEL, followed by an eight-byte LAYER record
    let mut bytes = encode(&[GdsRecord::EndElement])?;
    bytes.extend(raw(0x0D, 0x02, &[0, 1, 0, 0]));
    let mut rdr = GdsReader::from_bytes(&bytes);
    assert_eq!(rdr.read_record()?, GdsRecord::EndElement);
    let err = rdr.read_record().unwrap_err();
    assert_eq!(err.kind(), GdsErrorKind::Format);
    assert_eq!(err.record_type(), Some(GdsRecordType::Layer));
    match err {
        GdsError::Format {
            rtype,
            expected,
            actual,
            bytepos,
        } => {
            assert_eq!(rtype, 0x0D);
            assert_eq!(expected, GdsSizeRule::Exact(6));
            assert_eq!(actual, 8);
            assert_eq!(bytepos, 4);
        }
        _ => panic!("Expected a GdsError::Format"),
    }

    // Odd and too-short lengths are rejected before their record-types are considered
    let err = GdsReader::from_bytes(&[0x00, 0x05, 0x0D, 0x02, 0x00])
        .read_record()
        .unwrap_err();
    assert_eq!(err.kind(), GdsErrorKind::Format);
    let err = GdsReader::from_bytes(&[0x00, 0x02, 0x0D, 0x02])
        .read_record()
        .unwrap_err();
    assert_eq!(err.kind(), GdsErrorKind::Format);
    Ok(())
}
#[test]
fn xy_counts_per_element() -> GdsResult<()> {
    // A three-point boundary
    let mut records = vec![
        GdsRecord::Header { version: 3 },
        GdsRecord::BgnLib {
            dates: test_dates().encode(),
        },
        GdsRecord::LibName("lib".into()),
        GdsRecord::Units(1e-3, 1e-9),
        GdsRecord::BgnStruct {
            dates: test_dates().encode(),
        },
        GdsRecord::StructName("cell".into()),
        GdsRecord::Boundary,
        GdsRecord::Layer(0),
        GdsRecord::DataType(0),
        GdsRecord::Xy(vec![0, 0, 0, 1, 1, 1]),
        GdsRecord::EndElement,
        GdsRecord::EndStruct,
        GdsRecord::EndLib,
    ];
    let err = GdsLibrary::from_bytes(&encode(&records)?).unwrap_err();
    assert_eq!(err.record_type(), Some(GdsRecordType::Xy));

    // A struct-reference with two points
    records[6] = GdsRecord::StructRef;
    records[7] = GdsRecord::StructRefName("other".into());
    records.remove(8);
    records[8] = GdsRecord::Xy(vec![0, 0, 1, 1]);
    let err = GdsLibrary::from_bytes(&encode(&records)?).unwrap_err();
    assert_eq!(err.record_type(), Some(GdsRecordType::Xy));

    // And the same reference with one
    records[8] = GdsRecord::Xy(vec![1, 1]);
    let lib = GdsLibrary::from_bytes(&encode(&records)?)?;
    assert_eq!(
        lib.structs[0].elems[0],
        GdsElement::GdsStructRef(GdsStructRef {
            name: "other".into(),
            xy: GdsPoint::new(1, 1),
            ..Default::default()
        })
    );
    Ok(())
}
#[test]
fn structure_errors() -> GdsResult<()> {
    // Missing HEADER
    let bytes = encode(&[
        GdsRecord::BgnLib {
            dates: test_dates().encode(),
        },
        GdsRecord::EndLib,
    ])?;
    let err = GdsLibrary::from_bytes(&bytes).unwrap_err();
    assert_eq!(err.kind(), GdsErrorKind::Format);

    // Element records outside of any element
    let bytes = encode(&[
        GdsRecord::Header { version: 3 },
        GdsRecord::BgnLib {
            dates: test_dates().encode(),
        },
        GdsRecord::BgnStruct {
            dates: test_dates().encode(),
        },
        GdsRecord::StructName("cell".into()),
        GdsRecord::Layer(1),
        GdsRecord::EndStruct,
        GdsRecord::EndLib,
    ])?;
    match GdsLibrary::from_bytes(&bytes) {
        Err(GdsError::Parse { record, ctx, .. }) => {
            assert_eq!(record, GdsRecord::Layer(1));
            assert_eq!(ctx, vec![GdsContext::Library, GdsContext::Struct]);
        }
        _ => panic!("Expected a GdsError::Parse"),
    }

    // Truncated streams are stream errors
    let bytes = sample_lib()?.to_bytes()?;
    let err = GdsLibrary::from_bytes(&bytes[..bytes.len() - 2]).unwrap_err();
    assert_eq!(err.kind(), GdsErrorKind::Stream);
    Ok(())
}

/// Create a stream including records and elements outside our model
fn stream_with_unknowns() -> GdsResult<Vec<u8>> {
    let mut bytes = encode(&[
        GdsRecord::Header { version: 5 },
        GdsRecord::BgnLib {
            dates: test_dates().encode(),
        },
    ])?;
    // An unknown record-type
    bytes.extend(raw(0x70, 0x00, &[1, 2, 3, 4]));
    bytes.extend(encode(&[
        GdsRecord::LibName("lib".into()),
        GdsRecord::Units(1e-3, 1e-9),
        GdsRecord::BgnStruct {
            dates: test_dates().encode(),
        },
        GdsRecord::StructName("cell".into()),
    ])?);
    // A boundary with a property
    bytes.extend(encode(&square(0, 0, 10).to_records())?);
    bytes.truncate(bytes.len() - 4); // Its ENDEL
    bytes.extend(raw(0x2B, 0x02, &[0, 1])); // PROPATTR
    bytes.extend(raw(0x2C, 0x06, b"ab")); // PROPVALUE
    bytes.extend(encode(&[GdsRecord::EndElement])?);
    // A text element
    bytes.extend(encode(&[GdsRecord::Text, GdsRecord::Layer(1)])?);
    bytes.extend(raw(0x16, 0x02, &[0, 0])); // TEXTTYPE
    bytes.extend(encode(&[GdsRecord::Xy(vec![3, 4])])?);
    bytes.extend(raw(0x19, 0x06, b"hi")); // STRING
    bytes.extend(encode(&[
        GdsRecord::EndElement,
        GdsRecord::EndStruct,
        GdsRecord::EndLib,
    ])?);
    Ok(bytes)
}
#[test]
fn it_skips_unknowns() -> GdsResult<()> {
    let bytes = stream_with_unknowns()?;
    let mut parser = GdsParser::new(GdsReader::from_bytes(&bytes));
    let lib = parser.parse_lib()?;
    assert_eq!(parser.skipped(), 1);
    assert_eq!(lib.version, 5);
    assert_eq!(lib.name, "lib");
    assert_eq!(lib.structs.len(), 1);
    assert_eq!(lib.structs[0].elems, vec![GdsElement::from(square(0, 0, 10))]);
    Ok(())
}
#[test]
fn scan() -> GdsResult<()> {
    let bytes = stream_with_unknowns()?;
    let scan = GdsScanner::new(GdsReader::from_bytes(&bytes)).scan_lib()?;
    assert_eq!(scan.header, vec![0, 5]);
    assert_eq!(scan.bgnlib.len(), 24);
    assert_eq!(scan.libname, b"lib\0");
    assert_eq!(scan.units.len(), 16);
    assert_eq!(scan.structs.len(), 1);
    let s = &scan.structs[0];
    assert_eq!(s.name, "cell");
    // HEADER, BGNLIB, the unknown record, LIBNAME, and UNITS precede the struct
    assert_eq!(s.start, 6 + 28 + 8 + 8 + 20);
    assert_eq!(s.end, bytes.len() as u64 - 4);
    Ok(())
}
#[test]
fn dates() -> GdsResult<()> {
    let dates = test_dates();
    assert_eq!(GdsDateTimes::decode(&dates.encode()), dates);
    let dt = NaiveDateTime::try_from(&dates.modified)?;
    assert_eq!(GdsDateTime::from(dt), dates.modified);

    let invalid = GdsDateTime {
        month: 30,
        ..dates.modified.clone()
    };
    let err = NaiveDateTime::try_from(&invalid).unwrap_err();
    assert_eq!(err.kind(), GdsErrorKind::Other);
    Ok(())
}
#[test]
fn lib_to_json() -> GdsResult<()> {
    let lib = sample_lib()?;
    let s = Json.to_string(&lib)?;
    let lib2: GdsLibrary = Json.from_str(&s)?;
    assert_eq!(lib2, lib);
    assert!(lib2.structs.iter().all(|s| s.cached && !s.changed));
    Ok(())
}

/// Convert `lib` into `store`, re-open it, and check the two match
fn check_store(lib: &GdsLibrary, mut db: Box<dyn GdsStore>, schema: &GdsStoreSchema) -> GdsResult<()> {
    let bytes = lib.to_bytes()?;
    let scan = store::convert(GdsReader::from_bytes(&bytes), db.as_mut(), schema)?;
    assert_eq!(scan.structs.len(), lib.len());
    assert_eq!(
        db.names(&schema.cell_table)?,
        vec!["leaf".to_string(), "wire".into(), "top".into()]
    );

    let mut lib2 = GdsLibrary::open_store(db, schema.clone())?;
    assert!(lib2.has_store());
    assert_eq!(lib2.name, lib.name);
    assert_eq!(lib2.dates, lib.dates);
    assert_eq!(lib2.units, lib.units);
    assert_eq!(lib2.len(), 3);
    assert!(lib2.structs.iter().all(|s| !s.cached && s.elems.is_empty()));
    // Un-cached structs have no content, and hence no box
    assert_eq!(lib2.bbox_of("top"), None);

    lib2.cache("leaf")?;
    assert!(lib2.get("leaf").unwrap().cached);
    assert!(!lib2.get("top").unwrap().cached);
    lib2.cache_all()?;
    assert_eq!(lib2, *lib);
    assert_eq!(lib2.bbox_of("top"), lib.bbox_of("top"));

    lib2.close_store();
    assert!(!lib2.has_store());
    assert!(lib2.is_empty());
    Ok(())
}
#[test]
fn mem_store() -> GdsResult<()> {
    check_store(&sample_lib()?, Box::new(MemStore::new()), &GdsStoreSchema::default())
}
#[test]
fn sqlite_store() -> GdsResult<()> {
    check_store(
        &sample_lib()?,
        Box::new(SqliteStore::open_in_memory()?),
        &GdsStoreSchema::default(),
    )
}
#[test]
fn store_schema_config() -> GdsResult<()> {
    let schema: GdsStoreSchema = Yaml.from_str(
        r#"
        info_table: library_info
        cell_table: cells
        id_column: NAME
        "#,
    )?;
    assert_eq!(schema.info_table, "library_info");
    assert_eq!(schema.id_column, "NAME");
    // Unspecified fields take their defaults
    assert_eq!(schema.data_column, "DATA");
    assert_eq!(schema.units_key, "UNITS");

    let mut db = MemStore::new();
    store::convert(
        GdsReader::from_bytes(&sample_lib()?.to_bytes()?),
        &mut db,
        &schema,
    )?;
    assert!(db.get("library_info", "LIB_NAME")?.is_some());
    assert!(db.get("db_info_table", "LIB_NAME").is_err());

    check_store(&sample_lib()?, Box::new(SqliteStore::open_in_memory()?), &schema)
}
#[test]
fn store_errors() -> GdsResult<()> {
    let schema = GdsStoreSchema::default();
    let mut db = MemStore::new();
    db.create_tables(&schema)?;
    let err = GdsLibrary::open_store(Box::new(db), schema.clone()).unwrap_err();
    assert_eq!(err.kind(), GdsErrorKind::Store);

    // Wrong-sized info payloads
    let mut db = MemStore::new();
    store::convert(
        GdsReader::from_bytes(&sample_lib()?.to_bytes()?),
        &mut db,
        &schema,
    )?;
    db.put(&schema.info_table, &schema.units_key, &[0; 8])?;
    let err = GdsLibrary::open_store(Box::new(db), schema).unwrap_err();
    assert_eq!(err.kind(), GdsErrorKind::Format);

    // Caching without a store
    let mut lib = sample_lib()?;
    assert_eq!(lib.cache("leaf").unwrap_err().kind(), GdsErrorKind::Store);
    Ok(())
}
#[test]
fn sync_store() -> GdsResult<()> {
    let file = tempfile::NamedTempFile::new()?;
    let schema = GdsStoreSchema::default();
    let mut db = SqliteStore::open(file.path())?;
    store::convert(
        GdsReader::from_bytes(&sample_lib()?.to_bytes()?),
        &mut db,
        &schema,
    )?;

    // Open, edit, and sync
    let mut lib = GdsLibrary::open_store(Box::new(db), schema.clone())?;
    lib.name = "edited".into();
    lib.cache("leaf")?;
    let leaf = lib.get_mut("leaf").unwrap();
    leaf.add(square(20, 20, 5));
    leaf.changed = true;
    lib.add("fresh").add(square(0, 0, 1));
    assert!(lib.del("wire"));
    lib.sync_store()?;
    assert!(lib.structs.iter().all(|s| !s.changed));
    drop(lib);

    // And check the edits persist
    let db = SqliteStore::open(file.path())?;
    let mut lib = GdsLibrary::open_store(Box::new(db), schema)?;
    assert_eq!(lib.name, "edited");
    let names: Vec<&str> = lib.structs.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["leaf", "top", "fresh"]);
    lib.cache_all()?;
    assert_eq!(lib.get("leaf").unwrap().elems.len(), 2);
    assert_eq!(
        lib.get("fresh").unwrap().elems,
        vec![GdsElement::from(square(0, 0, 1))]
    );
    let b = lib.bbox_of("leaf").unwrap();
    assert_eq!((b.x(), b.y(), b.width(), b.height()), (0, 0, 25, 25));
    Ok(())
}
#[test]
fn store_schema_files() -> GdsResult<()> {
    use crate::ser::{SerdeFile, SerializationFormat::Toml};
    let dir = tempfile::tempdir()?;
    let schema = GdsStoreSchema {
        cell_table: "cells".into(),
        ..Default::default()
    };
    let fname = dir.path().join("schema.toml");
    schema.save_as(Toml, &fname)?;
    assert_eq!(GdsStoreSchema::open_any(&fname)?, schema);
    assert_eq!(GdsStoreSchema::open_as(&fname, Toml)?, schema);
    // Unrecognized extensions fail
    assert!(GdsStoreSchema::open_any(dir.path().join("schema.txt")).is_err());
    Ok(())
}
#[test]
fn set_all_dates() -> GdsResult<()> {
    let mut lib = sample_lib()?;
    lib.set_all_dates();
    assert_ne!(lib.dates, test_dates());
    assert!(lib.structs.iter().all(|s| s.dates == lib.dates));
    NaiveDateTime::try_from(&lib.dates.modified)?;
    Ok(())
}
#[test]
fn transformed_array_bboxes() -> GdsResult<()> {
    let lib = sample_lib()?;
    let mut aref = GdsArrayRef {
        name: "leaf".into(),
        xy: [
            GdsPoint::new(0, 0),
            GdsPoint::new(40, 0),
            GdsPoint::new(0, 40),
        ],
        cols: 2,
        rows: 2,
        strans: Some(GdsStrans {
            angle: Some(90.0),
            ..Default::default()
        }),
        ..Default::default()
    };
    let b = aref.bbox(&lib).unwrap();
    assert_eq!((b.x(), b.y(), b.width(), b.height()), (-10, 0, 30, 30));

    aref.strans = Some(GdsStrans {
        reflected: true,
        ..Default::default()
    });
    let b = aref.bbox(&lib).unwrap();
    assert_eq!((b.x(), b.y(), b.width(), b.height()), (0, -10, 30, 30));

    // Columns stepping in both x and y
    aref.strans = None;
    aref.rows = 1;
    aref.xy = [
        GdsPoint::new(0, 0),
        GdsPoint::new(40, 10),
        GdsPoint::new(0, 10),
    ];
    let b = aref.bbox(&lib).unwrap();
    assert_eq!((b.x(), b.y(), b.width(), b.height()), (0, 0, 30, 15));
    Ok(())
}
#[test]
fn extreme_coordinate_bboxes() -> GdsResult<()> {
    let lib = sample_lib()?;
    // Anchors spanning the full coordinate range. A single placement, at the origin.
    let aref = GdsArrayRef {
        name: "leaf".into(),
        xy: [
            GdsPoint::new(i32::MIN, 0),
            GdsPoint::new(i32::MAX, 0),
            GdsPoint::new(i32::MIN, 10),
        ],
        cols: 1,
        rows: 1,
        ..Default::default()
    };
    let b = aref.bbox(&lib).unwrap();
    assert_eq!((b.x(), b.y(), b.width(), b.height()), (i32::MIN, 0, 10, 10));

    // Extents beyond the coordinate range produce no box
    let aref = GdsArrayRef {
        cols: 2,
        xy: [
            GdsPoint::new(i32::MAX - 5, 0),
            GdsPoint::new(i32::MAX, 0),
            GdsPoint::new(i32::MAX - 5, 10),
        ],
        ..aref
    };
    assert_eq!(aref.bbox(&lib), None);
    let path = GdsPath {
        xy: GdsPoint::vec(&[(0, i32::MAX - 1), (10, i32::MAX - 1)]),
        width: Some(10),
        ..Default::default()
    };
    assert_eq!(path.bbox(&lib), None);
    // The most-negative width still has a magnitude
    let path = GdsPath {
        xy: GdsPoint::vec(&[(0, 0), (10, 0)]),
        width: Some(i32::MIN),
        ..Default::default()
    };
    assert_eq!(path.bbox(&lib).unwrap().height(), 1 << 31);
    let sref = GdsStructRef {
        name: "leaf".into(),
        xy: GdsPoint::new(i32::MAX - 5, 0),
        ..Default::default()
    };
    assert_eq!(sref.bbox(&lib), None);

    // Full-range boxes measure without overflow
    let full = GdsBBox {
        p0: GdsPoint::new(i32::MIN, i32::MIN),
        p1: GdsPoint::new(i32::MAX, i32::MAX),
    };
    assert_eq!((full.width(), full.height()), (u32::MAX, u32::MAX));
    Ok(())
}
#[test]
fn sqlite_custom_columns() -> GdsResult<()> {
    let file = tempfile::NamedTempFile::new()?;
    let schema: GdsStoreSchema = Yaml.from_str(
        r#"
        id_column: NAME
        data_column: BLOB
        "#,
    )?;
    let lib = sample_lib()?;
    let mut db = SqliteStore::open(file.path())?;
    store::convert(GdsReader::from_bytes(&lib.to_bytes()?), &mut db, &schema)?;
    drop(db);

    // A freshly-opened store adopts the schema's columns
    let db = SqliteStore::open(file.path())?;
    let mut lib2 = GdsLibrary::open_store(Box::new(db), schema.clone())?;
    assert_eq!(lib2.len(), 3);
    lib2.cache_all()?;
    assert_eq!(lib2, lib);

    // While unknown columns are errors, rather than empty results
    let db = SqliteStore::open(file.path())?;
    let err = db.get(&schema.info_table, &schema.version_key).unwrap_err();
    assert_eq!(err.kind(), GdsErrorKind::Store);
    assert!(db.names(&schema.cell_table).is_err());
    let db = db.with_schema(&schema);
    assert_eq!(db.names(&schema.cell_table)?, vec!["leaf", "wire", "top"]);
    Ok(())
}
#[test]
fn missing_units() -> GdsResult<()> {
    let bytes = encode(&[
        GdsRecord::Header { version: 3 },
        GdsRecord::BgnLib {
            dates: test_dates().encode(),
        },
        GdsRecord::LibName("lib".into()),
        GdsRecord::EndLib,
    ])?;
    let err = GdsLibrary::from_bytes(&bytes).unwrap_err();
    assert_eq!(err.kind(), GdsErrorKind::Format);
    let err = GdsScanner::new(GdsReader::from_bytes(&bytes))
        .scan_lib()
        .unwrap_err();
    assert_eq!(err.kind(), GdsErrorKind::Format);
    Ok(())
}
#[test]
fn parse_errors_report_their_record() -> GdsResult<()> {
    // A struct missing its name
    let bytes = encode(&[
        GdsRecord::Header { version: 3 },
        GdsRecord::BgnLib {
            dates: test_dates().encode(),
        },
        GdsRecord::Units(1e-3, 1e-9),
        GdsRecord::BgnStruct {
            dates: test_dates().encode(),
        },
        GdsRecord::Boundary,
        GdsRecord::EndLib,
    ])?;
    match GdsLibrary::from_bytes(&bytes) {
        Err(GdsError::Parse {
            record, recordnum, ..
        }) => {
            assert_eq!(record, GdsRecord::Boundary);
            assert_eq!(recordnum, 5);
        }
        _ => panic!("Expected a GdsError::Parse"),
    }
    Ok(())
}
