//! Pipeline completo contra um coletor HTTP local.

mod common;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE;
use common::StubServer;
use inventory_core::crypto::{IV_LEN, decrypt};
use inventory_core::probe::FnProbe;
use inventory_core::protocol::parse_snapshot;
use inventory_core::types::{
    CpuInfo, HardwareInfo, NetworkInfo, OsInfo, PerformanceInfo, Snapshot, SoftwareInfo,
};
use inventory_core::{
    AgentConfig, EncryptionKey, Probe, ProbeError, ProbeOutcome, ProbeSet, serialize_snapshot,
};
use inventory_sender::{HttpTransport, RunError, TransportError, run_pipeline};
use std::time::Duration;

const ZERO_KEY: &str = "0000000000000000000000000000000000000000000000000000000000000000";

fn config(server: &StubServer) -> AgentConfig {
    AgentConfig {
        server_address: server.url.clone(),
        encryption_key: ZERO_KEY.into(),
        probe_timeout_secs: 5.0,
        request_timeout_secs: 5.0,
        ..Default::default()
    }
}

fn fixture_hardware() -> HardwareInfo {
    HardwareInfo {
        cpu: CpuInfo {
            model: Some("Intel(R) Core(TM) i7-10700".into()),
            physical_cores: Some(8),
            ..Default::default()
        },
        ..Default::default()
    }
}

fn fixture_software() -> SoftwareInfo {
    SoftwareInfo {
        os: OsInfo {
            name: Some("Ubuntu".into()),
            hostname: Some("estacao-07".into()),
            ..Default::default()
        },
        ..Default::default()
    }
}

fn fixture_network() -> NetworkInfo {
    NetworkInfo {
        public_ip: Some("203.0.113.5".into()),
        ..Default::default()
    }
}

fn fixture_performance() -> PerformanceInfo {
    PerformanceInfo {
        cpu_usage_percent: Some(17.25),
        ..Default::default()
    }
}

fn fixture_probes() -> ProbeSet<
    impl Probe<Record = HardwareInfo>,
    impl Probe<Record = SoftwareInfo>,
    impl Probe<Record = NetworkInfo>,
    impl Probe<Record = PerformanceInfo>,
> {
    ProbeSet {
        hardware: FnProbe(|| ProbeOutcome::Complete(fixture_hardware())),
        software: FnProbe(|| ProbeOutcome::Complete(fixture_software())),
        network: FnProbe(|| ProbeOutcome::Complete(fixture_network())),
        performance: FnProbe(|| ProbeOutcome::Complete(fixture_performance())),
    }
}

fn transport() -> HttpTransport {
    HttpTransport::new(Duration::from_secs(5)).unwrap()
}

#[test]
fn collector_receives_decryptable_snapshot() {
    let server = StubServer::start("200 OK");
    let summary = run_pipeline(&config(&server), fixture_probes(), &transport()).unwrap();

    let requests = server.requests();
    assert_eq!(requests.len(), 1);
    let req = &requests[0];
    assert!(req.request_line.starts_with("POST /api/inventario"));
    assert_eq!(req.header("content-type"), Some("text/plain"));
    assert_eq!(req.body.len(), summary.encoded_len);

    let key = EncryptionKey::from_hex(ZERO_KEY).unwrap();
    let plaintext = decrypt(&req.body, &key).unwrap();
    assert_eq!(plaintext.len(), summary.plaintext_len);

    let snapshot = parse_snapshot(&plaintext).unwrap();
    assert_eq!(snapshot.hardware().cpu.physical_cores, Some(8));
    assert_eq!(snapshot.network().public_ip.as_deref(), Some("203.0.113.5"));
    assert_eq!(snapshot.software(), &fixture_software());
}

#[test]
fn decrypted_body_matches_fixture_serialization_byte_for_byte() {
    let server = StubServer::start("200 OK");
    run_pipeline(&config(&server), fixture_probes(), &transport()).unwrap();

    let key = EncryptionKey::from_hex(ZERO_KEY).unwrap();
    let plaintext = decrypt(&server.requests()[0].body, &key).unwrap();

    // Só o instante de captura vem da execução
    let capture_time = parse_snapshot(&plaintext).unwrap().capture_time();
    let expected = Snapshot::new(
        capture_time,
        fixture_hardware(),
        fixture_software(),
        fixture_network(),
        fixture_performance(),
    );
    assert_eq!(plaintext, serialize_snapshot(&expected).unwrap());
}

#[test]
fn envelope_is_iv_plus_ciphertext_of_plaintext_length() {
    let server = StubServer::start("200 OK");
    let summary = run_pipeline(&config(&server), fixture_probes(), &transport()).unwrap();

    let body = &server.requests()[0].body;
    let raw = URL_SAFE.decode(body).unwrap();
    assert_eq!(raw.len(), IV_LEN + summary.plaintext_len);
    assert!(body.chars().all(|c| c.is_ascii_alphanumeric() || "-_=".contains(c)));
}

#[test]
fn same_fixture_gives_fixed_length_and_fresh_iv() {
    let server = StubServer::start("200 OK");
    run_pipeline(&config(&server), fixture_probes(), &transport()).unwrap();
    run_pipeline(&config(&server), fixture_probes(), &transport()).unwrap();

    let requests = server.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].body.len(), requests[1].body.len());

    let iv_a = &URL_SAFE.decode(&requests[0].body).unwrap()[..IV_LEN];
    let iv_b = &URL_SAFE.decode(&requests[1].body).unwrap()[..IV_LEN];
    assert_ne!(iv_a, iv_b);
}

#[test]
fn server_error_fails_run_after_single_attempt() {
    let server = StubServer::start("500 Internal Server Error");
    let err = run_pipeline(&config(&server), fixture_probes(), &transport()).unwrap_err();

    assert!(matches!(err, RunError::Transport(TransportError::Status(500))));
    assert_eq!(server.requests().len(), 1);
}

#[test]
fn failed_probe_still_delivers_snapshot() {
    let server = StubServer::start("200 OK");
    let probes = ProbeSet {
        hardware: FnProbe(|| -> ProbeOutcome<HardwareInfo> {
            ProbeOutcome::Failed(ProbeError::Unavailable("sem /sys".into()))
        }),
        software: FnProbe(|| ProbeOutcome::Complete(SoftwareInfo::default())),
        network: FnProbe(|| {
            ProbeOutcome::Complete(NetworkInfo {
                public_ip: Some("203.0.113.5".into()),
                ..Default::default()
            })
        }),
        performance: FnProbe(|| ProbeOutcome::Complete(PerformanceInfo::default())),
    };
    let summary = run_pipeline(&config(&server), probes, &transport()).unwrap();
    assert!(!summary.report.is_clean());

    let key = EncryptionKey::from_hex(ZERO_KEY).unwrap();
    let snapshot = parse_snapshot(&decrypt(&server.requests()[0].body, &key).unwrap()).unwrap();
    assert_eq!(snapshot.hardware(), &HardwareInfo::default());
    assert_eq!(snapshot.network().public_ip.as_deref(), Some("203.0.113.5"));
}
