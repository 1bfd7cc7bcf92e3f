mod common;

use std::str::FromStr;

use common::{png_bytes, MapSource};
use stepdoc::model::Version;
use stepdoc::pdf::layout::PageGeometry;
use stepdoc::session::Session;
use stepdoc::Error;

#[test]
fn version_minor_bumps_and_rolls_over_at_nine() {
    assert_eq!(Version::from_str("1.3").unwrap().bumped().to_string(), "1.4");
    assert_eq!(Version::from_str("1.9").unwrap().bumped().to_string(), "2.0");
    assert_eq!(Version::from_str("4.0").unwrap().bumped().to_string(), "4.1");
}

#[test]
fn blank_process_name_is_rejected() {
    assert!(matches!(Session::start("   "), Err(Error::Validation(_))));
}

#[test]
fn finalize_bumps_once_per_distinct_snapshot() {
    let mut session = Session::start("Bearing swap").unwrap();
    session.add_text("loosen the collar", false);
    session.commit_step();

    assert!(session.finalize().unwrap());
    assert_eq!(session.record().version.to_string(), "1.1");

    // Same content again: no bump, still export-ready.
    assert!(!session.finalize().unwrap());
    assert_eq!(session.record().version.to_string(), "1.1");
    assert!(session.is_export_ready());

    // An edit makes a new snapshot; the next finalize bumps again.
    session.add_text("refit the collar", false);
    session.commit_step();
    assert!(session.finalize().unwrap());
    assert_eq!(session.record().version.to_string(), "1.2");
}

#[test]
fn finalize_requires_some_content() {
    let mut session = Session::start("Empty").unwrap();
    assert!(matches!(session.finalize(), Err(Error::Validation(_))));

    // A placeholder step alone is still no content.
    session.commit_step();
    assert!(matches!(session.finalize(), Err(Error::Validation(_))));
}

#[test]
fn finalize_refuses_uncommitted_draft() {
    let mut session = Session::start("Half done").unwrap();
    session.add_text("dangling", false);
    assert!(matches!(session.finalize(), Err(Error::Validation(_))));

    session.commit_step();
    assert!(session.finalize().is_ok());
}

#[test]
fn toggling_importance_keeps_the_id_stable() {
    let mut session = Session::start("Ids").unwrap();
    let id = session.add_text("check torque", false);

    assert!(session.toggle_important(&id).unwrap());
    assert!(!session.toggle_important(&id).unwrap());
    assert_eq!(session.draft().texts[0].id, id);

    assert!(matches!(
        session.toggle_important("no-such-id"),
        Err(Error::Validation(_))
    ));
}

#[test]
fn export_is_gated_on_finalization() {
    let mut source = MapSource::new();
    source.insert("p.png", png_bytes(64, 48));
    let geom = PageGeometry::a4();

    let mut session = Session::start("Gated").unwrap();
    session.add_photo("p.png");
    session.commit_step();

    // Not finalized yet.
    assert!(matches!(
        session.export_bytes(&source, &geom),
        Err(Error::ExportPrecondition)
    ));

    session.finalize().unwrap();
    assert!(session.export_bytes(&source, &geom).is_ok());

    // Any edit after finalizing closes the gate again.
    session.add_text("late note", false);
    session.commit_step();
    assert!(matches!(
        session.export_bytes(&source, &geom),
        Err(Error::ExportPrecondition)
    ));
}

#[test]
fn committed_steps_are_numbered_contiguously() {
    let mut session = Session::start("Numbering").unwrap();
    session.add_text("one", false);
    assert_eq!(session.commit_step(), 1);
    assert_eq!(session.commit_step(), 2); // placeholder
    session.add_photo("x.png");
    assert_eq!(session.commit_step(), 3);

    let indices: Vec<u32> = session.record().steps.iter().map(|s| s.index).collect();
    assert_eq!(indices, [1, 2, 3]);
}
