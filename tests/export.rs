mod common;

use common::{find_subsequence, jpeg_bytes, png_bytes, record_with_steps, step, text_item, MapSource};
use stepdoc::blocks::build_blocks;
use stepdoc::pdf::layout::{paginate, BodyTextMeasure, PageGeometry};
use stepdoc::session::Session;

fn sample_source() -> MapSource {
    let mut source = MapSource::new();
    source.insert("front.png", png_bytes(400, 300));
    source.insert("detail.jpg", jpeg_bytes(640, 480));
    source
}

#[test]
fn exported_pdf_has_header_and_one_page() {
    let source = sample_source();
    let record = record_with_steps(
        "Seal check",
        vec![step(
            1,
            &["front.png"],
            vec![text_item("inspect the gasket lip for cracks", false)],
        )],
    );

    let mut session = Session::from_record(record);
    session.finalize().unwrap();
    let bytes = session.export_bytes(&source, &PageGeometry::a4()).unwrap();

    assert!(bytes.starts_with(b"%PDF-"));
    assert!(find_subsequence(&bytes, b"/Count 1"));
}

#[test]
fn page_count_in_pdf_matches_the_pager() {
    let source = sample_source();
    let long_note = "release the clamp, slide the housing back, and check both \
        o-rings for wear before anything is reassembled in reverse order";
    let steps = (0..8)
        .map(|i| {
            step(
                i + 1,
                &["front.png", "detail.jpg"],
                vec![text_item(long_note, false), text_item("sign off", true)],
            )
        })
        .collect();
    let record = record_with_steps("Long procedure", steps);

    let geom = PageGeometry::a4();
    let blocks = build_blocks(&record, &source);
    let pagination = paginate(&blocks, &geom, &BodyTextMeasure::new()).unwrap();
    assert!(pagination.page_count > 1);

    let mut session = Session::from_record(record);
    session.finalize().unwrap();
    let bytes = session.export_bytes(&source, &geom).unwrap();

    let marker = format!("/Count {}", pagination.page_count);
    assert!(find_subsequence(&bytes, marker.as_bytes()));
}

#[test]
fn export_file_name_replaces_whitespace_and_adds_tag() {
    let source = sample_source();
    let record = record_with_steps(
        "Annual  pump\tservice",
        vec![step(1, &["front.png"], vec![])],
    );

    let mut session = Session::from_record(record);
    session.finalize().unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = session
        .export_to_dir(&source, &PageGeometry::a4(), dir.path())
        .unwrap();

    assert_eq!(
        path.file_name().unwrap().to_str().unwrap(),
        "Annual_pump_service_protocol.pdf"
    );
    assert!(path.metadata().unwrap().len() > 0);
}

#[test]
fn export_survives_a_missing_photo() {
    // One bad reference degrades to a skipped block, not a failed export.
    let source = sample_source();
    let record = record_with_steps(
        "Partial",
        vec![step(
            1,
            &["nowhere.png", "front.png"],
            vec![text_item("still here", false)],
        )],
    );

    let mut session = Session::from_record(record);
    session.finalize().unwrap();
    let bytes = session.export_bytes(&source, &PageGeometry::a4()).unwrap();
    assert!(bytes.starts_with(b"%PDF-"));
}
