//! Binário de ponta a ponta: código de saída e mensagens.

mod common;

use common::StubServer;
use std::io::Write;
use std::process::Command;

fn sender() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_inventory_sender"));
    cmd.env("RUST_LOG", "warn");
    cmd
}

/// Configuração com medições curtas e destinos locais inalcançáveis.
fn write_config(server_url: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        "; agente de teste
[agente]
server_address = {server_url}
encryption_key = 000102030405060708090a0b0c0d0e0f
probe_timeout_secs = 10
request_timeout_secs = 5
public_ip_url = http://127.0.0.1:1/
latency_target = 127.0.0.1:1
latency_samples = 1
sample_window_ms = 100"
    )
    .unwrap();
    file
}

#[test]
fn server_error_exits_non_zero_with_status_in_stderr() {
    let server = StubServer::start("500 Internal Server Error");
    let config = write_config(&server.url);

    let out = sender().arg("--config").arg(config.path()).output().unwrap();

    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("500"), "stderr: {stderr}");
    assert!(out.stdout.is_empty());
    assert_eq!(server.requests().len(), 1);
}

#[test]
fn successful_run_prints_confirmation() {
    let server = StubServer::start("200 OK");
    let config = write_config(&server.url);

    let out = sender().arg("--config").arg(config.path()).output().unwrap();

    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("enviadas com sucesso"));
    assert_eq!(server.requests().len(), 1);
}

#[test]
fn missing_config_exits_non_zero() {
    let dir = tempfile::tempdir().unwrap();
    let out = sender()
        .arg("--config")
        .arg(dir.path().join("nao-existe.ini"))
        .output()
        .unwrap();

    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("configuração"));
}

#[test]
fn invalid_key_aborts_before_sending() {
    let server = StubServer::start("200 OK");
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        "server_address = {}\nencryption_key = 0011223344",
        server.url
    )
    .unwrap();

    let out = sender().arg("--config").arg(file.path()).output().unwrap();

    assert!(!out.status.success());
    assert!(server.requests().is_empty());
}
