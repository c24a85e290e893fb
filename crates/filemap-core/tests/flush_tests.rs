mod common;

use std::collections::HashMap;

use common::{schema, session_over};
use filemap_core::{
    Capability, DesiredResource, DriverError, Error, FlushFailure, Resource, Session,
    SessionConfig,
};
use filemap_test_utils::{FixtureDir, LineDriver};
use pretty_assertions::assert_eq;

#[test]
fn untouched_session_serializes_nothing() {
    let dir = FixtureDir::new();
    let hosts = dir.write("hosts", "web   ip=10.0.0.1\n# kept as is\n");
    let before = dir.modified("hosts");

    for _ in 0..2 {
        let driver = LineDriver::new([hosts.clone()]);
        let probe = driver.probe();
        let mut session = Session::new(driver, &schema());
        session.load_all().unwrap();

        let report = session.flush().unwrap();

        assert!(report.is_noop());
        assert_eq!(probe.serialize_calls(), 0);
    }

    assert_eq!(dir.read("hosts"), "web   ip=10.0.0.1\n# kept as is\n");
    assert_eq!(dir.modified("hosts"), before);
}

#[test]
fn modified_record_rewrites_its_file_only() {
    let dir = FixtureDir::new();
    let a = dir.write("a", "web ip=10.0.0.1\n");
    let b = dir.write("b", "db ip=10.0.0.2\n");
    let driver = LineDriver::new([a.clone(), b]);
    let probe = driver.probe();
    let mut session = Session::new(driver, &schema());
    let ids = session.load_all().unwrap();

    session.record_mut(ids[0]).unwrap().set("ip", "10.0.0.9").unwrap();
    let report = session.flush().unwrap();

    assert_eq!(report.written, vec![a]);
    assert_eq!(probe.serialize_calls(), 1);
    assert_eq!(dir.read("a"), "web ip=10.0.0.9\n");
    assert_eq!(dir.read("b"), "db ip=10.0.0.2\n");
    assert!(session.registry().dirty_paths().is_empty());
}

#[test]
fn created_record_is_written_with_requested_values_only() {
    let dir = FixtureDir::new();
    let hosts = dir.write("hosts", "web ip=10.0.0.1\n");
    let mut session = session_over(&[hosts]);
    let mut resources = HashMap::from([(
        "cache".to_string(),
        Resource::new("cache").with("ensure", "present").with("ip", "10.0.0.7"),
    )]);
    session.prefetch(&mut resources).unwrap();
    assert_eq!(resources["cache"].provider(), None);

    session.create(&resources["cache"]).unwrap();
    session.flush().unwrap();

    assert_eq!(dir.read("hosts"), "web ip=10.0.0.1\ncache ip=10.0.0.7\n");
}

#[test]
fn destroyed_record_is_dropped_and_siblings_kept() {
    let dir = FixtureDir::new();
    let hosts = dir.write("hosts", "web ip=10.0.0.1\ndb ip=10.0.0.2\nmail ip=10.0.0.3\n");
    let mut session = session_over(&[hosts]);
    let ids = session.load_all().unwrap();

    session.record_mut(ids[1]).unwrap().destroy().unwrap();
    session.flush().unwrap();

    assert_eq!(dir.read("hosts"), "web ip=10.0.0.1\nmail ip=10.0.0.3\n");
    assert_eq!(session.records().count(), 3);
}

#[test]
fn identical_content_is_not_rewritten() {
    let dir = FixtureDir::new();
    let hosts = dir.write("hosts", "web ip=10.0.0.1\n");
    let before = dir.modified("hosts");
    let mut session = session_over(&[hosts.clone()]);
    let ids = session.load_all().unwrap();

    session.record_mut(ids[0]).unwrap().set("ip", "10.0.0.1").unwrap();
    let report = session.flush().unwrap();

    assert_eq!(report.unchanged, vec![hosts.clone()]);
    assert!(report.written.is_empty());
    assert_eq!(dir.modified("hosts"), before);
    assert!(!session.registry().is_dirty(&hosts));
}

#[test]
fn dry_run_writes_nothing_and_keeps_files_dirty() {
    let dir = FixtureDir::new();
    let hosts = dir.write("hosts", "web ip=10.0.0.1\n");
    let mut session = Session::with_config(
        LineDriver::new([hosts.clone()]),
        &schema(),
        SessionConfig::default().dry_run(true),
    );
    let ids = session.load_all().unwrap();

    session.record_mut(ids[0]).unwrap().set("ip", "10.0.0.9").unwrap();
    let report = session.flush().unwrap();

    assert_eq!(report.would_write, vec![hosts.clone()]);
    assert!(!report.is_noop());
    assert_eq!(dir.read("hosts"), "web ip=10.0.0.1\n");
    assert!(session.registry().is_dirty(&hosts));
}

#[test]
fn failing_file_stops_flush_and_stays_dirty() {
    let dir = FixtureDir::new();
    let a = dir.write("a", "web ip=10.0.0.1\n");
    let b = dir.write("b", "db ip=10.0.0.2\n");
    let c = dir.write("c", "mail ip=10.0.0.3\n");
    let driver = LineDriver::new([a.clone(), b.clone(), c.clone()]).fail_serialize(b.clone());
    let mut session = Session::new(driver, &schema());
    let ids = session.load_all().unwrap();
    for id in &ids {
        session.record_mut(*id).unwrap().set("port", "22").unwrap();
    }

    let err = session.flush().unwrap_err();

    assert!(matches!(
        &err,
        Error::Flush { source: FlushFailure::Serialize(_), .. }
    ));
    assert_eq!(err.path(), Some(&b));
    assert_eq!(dir.read("a"), "web ip=10.0.0.1 port=22\n");
    assert_eq!(dir.read("c"), "mail ip=10.0.0.3\n");
    assert!(!session.registry().is_dirty(&a));
    assert!(session.registry().is_dirty(&b));
    assert!(session.registry().is_dirty(&c));
}

#[test]
fn driver_without_serialize_fails_on_flush() {
    let dir = FixtureDir::new();
    let hosts = dir.write("hosts", "web ip=10.0.0.1\n");
    let driver = LineDriver::new([hosts.clone()]).without(Capability::Serialize);
    let probe = driver.probe();
    let mut session = Session::new(driver, &schema());
    let ids = session.load_all().unwrap();

    session.record_mut(ids[0]).unwrap().set("ip", "10.0.0.9").unwrap();
    let err = session.flush().unwrap_err();

    assert!(matches!(
        err,
        Error::Flush {
            source: FlushFailure::Serialize(DriverError::Unsupported {
                capability: Capability::Serialize
            }),
            ..
        }
    ));
    assert_eq!(probe.serialize_calls(), 0);
    assert_eq!(dir.read("hosts"), "web ip=10.0.0.1\n");
    assert!(session.registry().is_dirty(&hosts));
}

#[test]
fn driver_without_serialize_flushes_clean_session() {
    let dir = FixtureDir::new();
    let hosts = dir.write("hosts", "web ip=10.0.0.1\n");
    let driver = LineDriver::new([hosts]).without(Capability::Serialize);
    let mut session = Session::new(driver, &schema());
    session.load_all().unwrap();

    assert!(session.flush().unwrap().is_noop());
}

#[test]
fn create_without_ensure_writes_the_record() {
    let dir = FixtureDir::new();
    let hosts = dir.write("hosts", "web ip=10.0.0.1\n");
    let mut session = session_over(&[hosts.clone()]);
    session.load_all().unwrap();

    session.create(&Resource::new("x").with("ip", "bar")).unwrap();
    let report = session.flush().unwrap();

    assert_eq!(report.written, vec![hosts]);
    assert_eq!(dir.read("hosts"), "web ip=10.0.0.1\nx ip=bar\n");
}

#[test]
fn create_into_missing_file_writes_new_file() {
    let dir = FixtureDir::new();
    let local = dir.path("hosts.local");
    let mut session = session_over(&[local]);
    session.load_all().unwrap();

    session
        .create(&Resource::new("cache").with("ensure", "present").with("ip", "10.0.0.7"))
        .unwrap();
    let report = session.flush().unwrap();

    assert_eq!(report.written.len(), 1);
    dir.assert_file_exists("hosts.local");
    assert_eq!(dir.read("hosts.local"), "cache ip=10.0.0.7\n");
}

#[test]
fn pending_records_are_not_serialized() {
    let dir = FixtureDir::new();
    let hosts = dir.write("hosts", "web ip=10.0.0.1\n");
    let mut session = session_over(&[hosts]);
    let ids = session.load_all().unwrap();
    let mut desired = Resource::new("cache").with("ensure", "present");
    session.pending(&mut desired);

    session.record_mut(ids[0]).unwrap().set("port", "80").unwrap();
    session.flush().unwrap();

    assert_eq!(dir.read("hosts"), "web ip=10.0.0.1 port=80\n");
}

#[test]
fn record_handle_flushes_whole_session() {
    let dir = FixtureDir::new();
    let a = dir.write("a", "web ip=10.0.0.1\n");
    let b = dir.write("b", "db ip=10.0.0.2\n");
    let mut session = session_over(&[a, b]);
    let ids = session.load_all().unwrap();
    session.record_mut(ids[1]).unwrap().set("ip", "10.0.0.8").unwrap();

    let mut record = session.record_mut(ids[0]).unwrap();
    record.set("ip", "10.0.0.9").unwrap();
    let report = record.flush().unwrap();

    assert_eq!(report.written.len(), 2);
    assert_eq!(dir.read("a"), "web ip=10.0.0.9\n");
    assert_eq!(dir.read("b"), "db ip=10.0.0.8\n");
}

#[test]
fn second_flush_after_write_is_noop() {
    let dir = FixtureDir::new();
    let hosts = dir.write("hosts", "web ip=10.0.0.1\n");
    let mut session = session_over(&[hosts]);
    let ids = session.load_all().unwrap();
    session.record_mut(ids[0]).unwrap().set("ip", "10.0.0.9").unwrap();
    session.flush().unwrap();

    let report = session.flush().unwrap();

    assert!(report.is_noop());
    assert!(report.unchanged.is_empty());
}
