use std::fs;

use sondo::models::{Job, JobSeed, PayloadKind, TargetItem};
use sondo::writer::write_artifacts;
use tempfile::TempDir;

const TEMPLATE: &str =
    "import requests\nrequests.post(\"http://192.168.0.1{URI}\", data=\"payload\")\n";

fn wifi_job() -> Job {
    Job::from_seed(
        JobSeed {
            uri: "WifiBasicSet".into(),
            ui_label: "wireless_basic".into(),
            baseline_packet: "security=none&ssid=Tenda_83B550&hideSsid=0&wrlPwd=".into(),
            frontend_context: String::new(),
        },
        "Tenda",
        "AC18",
        String::new(),
    )
}

fn groups(raw: &[&[&str]]) -> Vec<Vec<String>> {
    raw.iter()
        .map(|g| g.iter().map(|s| s.to_string()).collect())
        .collect()
}

#[test]
fn grid_expansion_writes_sequenced_scripts() {
    let dir = TempDir::new().unwrap();
    let mut grid_item = TargetItem::new("ssid={overflow}", PayloadKind::Overflow);
    grid_item.prerequisites = groups(&[&["hideSsid=0", "hideSsid=1"]]);
    grid_item.other_params = groups(&[&["security=none", "security=wpapsk"]]);
    let lone_item = TargetItem::new("wrlPwd={cmdi}", PayloadKind::Cmdi);

    let written = write_artifacts(
        &wifi_job(),
        &[grid_item, lone_item],
        TEMPLATE,
        dir.path(),
    )
    .unwrap();

    // 2x2 grid for the first item, a single body for the second, one
    // sequence across both.
    assert_eq!(written.len(), 5);
    assert_eq!(
        written[0],
        dir.path()
            .join("overflow/WifiBasicSet/WifiBasicSet_ssid_1.py")
    );
    assert_eq!(
        written[3],
        dir.path()
            .join("overflow/WifiBasicSet/WifiBasicSet_ssid_4.py")
    );
    assert_eq!(
        written[4],
        dir.path().join("cmdi/WifiBasicSet/WifiBasicSet_wrlPwd_5.py")
    );

    // Baseline key order survives; the grid only swaps values in place.
    let first = fs::read_to_string(&written[0]).unwrap();
    assert!(first.contains("data=\"security=none&ssid={overflow}&hideSsid=0&wrlPwd=\""));
    assert!(first.contains("http://192.168.0.1/WifiBasicSet"));

    let last_grid = fs::read_to_string(&written[3]).unwrap();
    assert!(last_grid.contains("data=\"security=wpapsk&ssid={overflow}&hideSsid=1&wrlPwd=\""));

    // The lone item keeps the captured values and only swaps its own.
    let lone = fs::read_to_string(&written[4]).unwrap();
    assert!(lone.contains("data=\"security=none&ssid=Tenda_83B550&hideSsid=0&wrlPwd={cmdi}\""));
}

#[test]
fn every_grid_body_is_distinct() {
    let dir = TempDir::new().unwrap();
    let mut item = TargetItem::new("lanIp={cmdi}", PayloadKind::Cmdi);
    item.prerequisites = groups(&[&["dhcpEn=0", "dhcpEn=1"], &["lanMask=255.255.255.0"]]);

    let written = write_artifacts(
        &wifi_job(),
        &[item],
        TEMPLATE,
        dir.path(),
    )
    .unwrap();
    assert_eq!(written.len(), 2);

    let bodies: Vec<String> = written
        .iter()
        .map(|p| fs::read_to_string(p).unwrap())
        .collect();
    assert_ne!(bodies[0], bodies[1]);
    assert!(bodies[0].contains("dhcpEn=0"));
    assert!(bodies[1].contains("dhcpEn=1"));
    // Appended keys the baseline lacked show up in encounter order.
    assert!(bodies[0].contains("wrlPwd=&lanIp={cmdi}&dhcpEn=0&lanMask=255.255.255.0"));
}
