//! Decoding synthetic ABIF files end to end.

mod common;

use common::{read_quality, sanger_builder, sanger_read, AbifBuilder, READ_SEQUENCE};
use tracetui::abif::{AbifDate, AbifError, AbifFile, AbifTime, ElementType, TagValue};
use tracetui::chromatogram::{Chromatogram, Nucleotide};

#[test]
fn test_decode_sanger_read() {
    let model = Chromatogram::load(sanger_read()).unwrap();
    assert_eq!(model.sequence(), READ_SEQUENCE);
    assert_eq!(model.quality_scores(), read_quality().as_slice());
    assert_eq!(model.peak_locations()[..3], [5, 15, 25]);
    assert_eq!(model.trace_len(), 310);
    assert!(model.warnings().is_empty());

    // Base 2 is an A: its channel peaks under it.
    let a = model.trace(Nucleotide::A, false);
    assert_eq!(a[25], 1000);
    assert_eq!(model.trace(Nucleotide::G, false)[25], 0);
    assert_eq!(model.metadata().sample_name(), Some("sample 42"));
    assert_eq!(model.metadata().peak_spacing, Some(10.0));
    assert!(!model.has_raw_traces());
}

#[test]
fn test_numeric_types() {
    let data = AbifBuilder::new()
        .bytes("BYTE", 1, &[0, 255])
        .words("WORD", 1, &[1, 65535])
        .shorts("SHRT", 1, &[-2, 300, i16::MIN])
        .longs("LONG", 1, &[-70_000, i32::MAX])
        .floats("FLOT", 1, &[1.5, -0.25])
        .doubles("DOUB", 1, &[std::f64::consts::PI])
        .bools("BOOL", 1, &[true, false, true])
        .build();
    let file = AbifFile::from_bytes(data).unwrap();

    assert_eq!(file.get("BYTE", 1).unwrap(), Some(&TagValue::Bytes(vec![0, 255])));
    assert_eq!(file.get("WORD", 1).unwrap(), Some(&TagValue::Words(vec![1, 65535])));
    assert_eq!(
        file.get("SHRT", 1).unwrap(),
        Some(&TagValue::Shorts(vec![-2, 300, i16::MIN]))
    );
    assert_eq!(
        file.get("LONG", 1).unwrap(),
        Some(&TagValue::Longs(vec![-70_000, i32::MAX]))
    );
    assert_eq!(file.get("FLOT", 1).unwrap(), Some(&TagValue::Floats(vec![1.5, -0.25])));
    assert_eq!(
        file.get("DOUB", 1).unwrap(),
        Some(&TagValue::Doubles(vec![std::f64::consts::PI]))
    );
    assert_eq!(
        file.get("BOOL", 1).unwrap(),
        Some(&TagValue::Bools(vec![true, false, true]))
    );
    assert_eq!(file.entry("SHRT", 1).unwrap().element_type(), ElementType::Short);
}

#[test]
fn test_text_and_calendar_types() {
    let data = AbifBuilder::new()
        .chars("PBAS", 1, b"ACGT")
        .pstring("SMPL", 1, "my sample")
        .cstring("CMNT", 1, "hello")
        .date("RUND", 1, 2021, 6, 30)
        .time("RUNT", 1, 13, 5, 59, 7)
        .build();
    let file = AbifFile::from_bytes(data).unwrap();

    assert_eq!(file.base_calls().unwrap(), "ACGT");
    assert_eq!(
        file.get("SMPL", 1).unwrap(),
        Some(&TagValue::PString("my sample".into()))
    );
    assert_eq!(file.get("CMNT", 1).unwrap(), Some(&TagValue::CString("hello".into())));
    assert_eq!(
        file.get("RUND", 1).unwrap(),
        Some(&TagValue::Date(AbifDate { year: 2021, month: 6, day: 30 }))
    );
    assert_eq!(
        file.get("RUNT", 1).unwrap(),
        Some(&TagValue::Time(AbifTime { hour: 13, minute: 5, second: 59, hundredths: 7 }))
    );

    let fields = file.metadata_fields().unwrap();
    assert!(fields.contains(&("Sample".to_string(), "my sample".to_string())));
    assert!(fields.contains(&("Comment".to_string(), "hello".to_string())));
    assert!(fields.contains(&("Run date".to_string(), "2021-06-30".to_string())));
}

#[test]
fn test_unknown_type_kept_raw() {
    let data = AbifBuilder::new()
        .raw("ODD_", 1, 1024, 1, 6, vec![0xDE, 0xAD, 0xBE, 0xEF, 0x01, 0x02])
        .build();
    let file = AbifFile::from_bytes(data).unwrap();
    match file.get("ODD_", 1).unwrap() {
        Some(TagValue::Raw { type_code, hex }) => {
            assert_eq!(*type_code, 1024);
            assert_eq!(hex, "deadbeef0102");
        }
        other => panic!("unexpected value {:?}", other),
    }
    assert_eq!(file.warnings().len(), 1);
}

#[test]
fn test_edited_copy_preferred() {
    let data = sanger_builder("ACGT", &[30, 30, 30, 30])
        .chars("PBAS", 1, b"ACCT")
        .build();
    let model = Chromatogram::load(data).unwrap();
    assert_eq!(model.sequence(), "ACCT");
}

#[test]
fn test_default_channel_order() {
    let data = AbifBuilder::new()
        .chars("PBAS", 2, b"A")
        .chars("PCON", 2, &[20])
        .shorts("PLOC", 2, &[0])
        .shorts("DATA", 9, &[1])
        .shorts("DATA", 10, &[2])
        .shorts("DATA", 11, &[3])
        .shorts("DATA", 12, &[4])
        .build();
    let model = Chromatogram::load(data).unwrap();
    assert_eq!(
        model.channel_order(),
        [Nucleotide::G, Nucleotide::A, Nucleotide::T, Nucleotide::C]
    );
    assert_eq!(model.trace(Nucleotide::A, false), &[2]);
    assert_eq!(model.trace(Nucleotide::C, false), &[4]);
}

#[test]
fn test_custom_channel_order_and_raw() {
    let mut builder = AbifBuilder::new()
        .chars("PBAS", 2, b"A")
        .chars("PCON", 2, &[20])
        .shorts("PLOC", 2, &[0])
        .chars("FWO_", 1, b"ACGT");
    for k in 0..4 {
        builder = builder
            .shorts("DATA", 9 + k, &[k as i16])
            .shorts("DATA", 1 + k, &[100 + k as i16]);
    }
    let model = Chromatogram::load(builder.build()).unwrap();
    assert_eq!(model.trace(Nucleotide::A, false), &[0]);
    assert_eq!(model.trace(Nucleotide::T, false), &[3]);
    assert!(model.has_raw_traces());
    assert_eq!(model.trace(Nucleotide::T, true), &[103]);
}

#[test]
fn test_missing_quality_and_mismatched_lengths() {
    let data = AbifBuilder::new()
        .chars("PBAS", 2, b"ACGTA")
        .shorts("PLOC", 2, &[1, 5, 9])
        .build();
    let model = Chromatogram::load(data).unwrap();
    assert_eq!(model.sequence(), "ACG");
    assert_eq!(model.quality_scores(), &[0, 0, 0]);
    assert_eq!(model.warnings().len(), 2);
}

#[test]
fn test_empty_read() {
    let model = Chromatogram::load(AbifBuilder::new().build()).unwrap();
    assert!(model.is_empty());
    assert_eq!(model.trace_len(), 0);
}

#[test]
fn test_format_error() {
    let err = Chromatogram::load(b"\x89PNG\r\n\x1a\n".to_vec()).unwrap_err();
    assert!(matches!(err, AbifError::Format { .. }));
}

#[test]
fn test_bounds_error_is_lazy() {
    let data = AbifBuilder::new()
        .chars("PBAS", 2, b"ACGTACGT")
        .dangling("DATA", 9, 4, 2, 50)
        .build();
    // The directory itself is fine.
    let file = AbifFile::from_bytes(data.clone()).unwrap();
    assert_eq!(file.base_calls().unwrap(), "ACGTACGT");
    assert!(matches!(file.get("DATA", 9), Err(AbifError::Bounds { .. })));
    // Assembling the model reads every trace and fails.
    assert!(matches!(Chromatogram::load(data), Err(AbifError::Bounds { .. })));
}

#[test]
fn test_open_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("read.ab1");
    std::fs::write(&path, sanger_read()).unwrap();
    let file = AbifFile::open(&path).unwrap();
    assert_eq!(file.base_calls().unwrap(), READ_SEQUENCE);
    assert!(matches!(
        AbifFile::open(dir.path().join("missing.ab1")),
        Err(AbifError::Io(_))
    ));
}
