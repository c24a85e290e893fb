use std::collections::HashMap;

use filemap_core::{DesiredResource, Error, FlushFailure, Resource, Schema, Session};
use filemap_drivers::HostsDriver;
use filemap_test_utils::FixtureDir;
use pretty_assertions::assert_eq;
use serde_json::json;

const HOSTS: &str = "\
# static table
127.0.0.1\tlocalhost
10.0.0.1\tweb.internal\tweb www\t# frontend
10.0.0.2\tdb.internal
";

fn schema() -> Schema {
    Schema::new(["ensure", "ip", "host_aliases", "comment"], ["target"])
}

fn session(dir: &FixtureDir) -> Session {
    Session::new(HostsDriver::new([dir.path("hosts")]), &schema())
}

#[test]
fn loads_every_host_entry() {
    let dir = FixtureDir::new();
    dir.write("hosts", HOSTS);
    let mut session = session(&dir);

    let ids = session.load_all().unwrap();

    let names: Vec<_> = ids
        .iter()
        .map(|id| session.record(*id).unwrap().name().to_string())
        .collect();
    assert_eq!(names, ["localhost", "web.internal", "db.internal"]);
    assert_eq!(
        session.get(ids[1], "host_aliases").unwrap(),
        Some(&json!(["web", "www"]))
    );
    assert_eq!(session.record(ids[1]).unwrap().provider(), "hosts");
}

#[test]
fn untouched_file_keeps_its_comments() {
    let dir = FixtureDir::new();
    dir.write("hosts", HOSTS);
    let mut session = session(&dir);
    session.load_all().unwrap();

    assert!(session.flush().unwrap().is_noop());
    assert_eq!(dir.read("hosts"), HOSTS);
}

#[test]
fn full_run_creates_updates_and_removes() {
    let dir = FixtureDir::new();
    dir.write("hosts", HOSTS);
    let mut session = session(&dir);
    let mut resources: HashMap<String, Resource> = [
        Resource::new("web.internal")
            .with("ensure", "present")
            .with("ip", "10.0.0.5"),
        Resource::new("db.internal").with("ensure", "absent"),
        Resource::new("cache.internal")
            .with("ensure", "present")
            .with("ip", "10.0.0.7")
            .with("host_aliases", json!(["cache"])),
    ]
    .into_iter()
    .map(|r| (r.name().to_string(), r))
    .collect();

    session.prefetch(&mut resources).unwrap();

    let web = resources["web.internal"].provider().unwrap();
    session.record_mut(web).unwrap().set("ip", "10.0.0.5").unwrap();
    let db = resources["db.internal"].provider().unwrap();
    session.record_mut(db).unwrap().destroy().unwrap();
    assert_eq!(resources["cache.internal"].provider(), None);
    session.create(&resources["cache.internal"]).unwrap();

    let report = session.flush().unwrap();

    assert_eq!(report.written, vec![dir.path("hosts")]);
    assert_eq!(
        dir.read("hosts"),
        "127.0.0.1\tlocalhost\n\
         10.0.0.5\tweb.internal\tweb www\t# frontend\n\
         10.0.0.7\tcache.internal\tcache\n"
    );
}

#[test]
fn new_host_goes_to_its_target_file() {
    let dir = FixtureDir::new();
    dir.write("hosts", HOSTS);
    let extra = dir.path("hosts.d/extra");
    let mut session = Session::new(
        HostsDriver::new([dir.path("hosts"), extra.clone()]),
        &schema(),
    );
    session.load_all().unwrap();

    session
        .create(
            &Resource::new("mail.internal")
                .with("ip", "10.0.0.9")
                .with("target", extra.as_str()),
        )
        .unwrap();
    session.flush().unwrap();

    assert_eq!(dir.read("hosts"), HOSTS);
    assert_eq!(dir.read("hosts.d/extra"), "10.0.0.9\tmail.internal\n");
}

#[test]
fn host_without_ip_fails_flush() {
    let dir = FixtureDir::new();
    dir.write("hosts", "");
    let mut session = session(&dir);
    session.load_all().unwrap();

    session
        .create(&Resource::new("ghost").with("ensure", "present"))
        .unwrap();

    let err = session.flush().unwrap_err();
    assert_eq!(err.path(), Some(&dir.path("hosts")));
    assert_eq!(dir.read("hosts"), "");
}

#[test]
fn malformed_line_fails_load() {
    let dir = FixtureDir::new();
    dir.write("hosts", "127.0.0.1 localhost\n10.0.0.3\n");
    let mut session = session(&dir);

    let err = session.load_all().unwrap_err();

    assert!(err.is_load_error());
    assert!(err.to_string().contains("hosts"));
    assert!(session.failed());
}

#[test]
fn non_string_alias_fails_flush() {
    let dir = FixtureDir::new();
    dir.write("hosts", HOSTS);
    let mut session = session(&dir);
    let ids = session.load_all().unwrap();

    session
        .record_mut(ids[1])
        .unwrap()
        .set("host_aliases", json!(["web", 80]))
        .unwrap();
    let err = session.flush().unwrap_err();

    assert!(matches!(
        err,
        Error::Flush {
            source: FlushFailure::Serialize(_),
            ..
        }
    ));
    assert!(err.to_string().contains("non-string alias"));
    assert_eq!(dir.read("hosts"), HOSTS);
}
