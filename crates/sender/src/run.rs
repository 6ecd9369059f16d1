//! Pipeline de uma execução: sondas → snapshot → JSON → envelope → POST.

use crate::platform;
use crate::probes::build_probes;
use crate::transport::{HttpTransport, Transport, TransportError};
use inventory_core::types::{HardwareInfo, NetworkInfo, PerformanceInfo, SoftwareInfo};
use inventory_core::{
    AgentConfig, AggregationReport, Aggregator, ConfigError, CryptoError, EncryptionKey, Probe,
    ProbeSet, ProtocolError, encrypt_with_key, serialize_snapshot,
};
use std::path::Path;
use tracing::{debug, info};

/// Falhas fatais de uma execução. Cada uma encerra o agente com código ≠ 0.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("Erro ao carregar a configuração: {0}")]
    Config(#[from] ConfigError),

    #[error("Erro ao serializar o snapshot: {0}")]
    Serialize(#[from] ProtocolError),

    #[error("Erro ao criptografar os dados: {0}")]
    Crypto(#[from] CryptoError),

    #[error("Erro ao enviar os dados para o servidor: {0}")]
    Transport(#[from] TransportError),
}

/// O que foi feito numa execução bem-sucedida.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub report: AggregationReport,
    pub plaintext_len: usize,
    pub encoded_len: usize,
}

/// Executa o agente com a configuração em `config_path` e as sondas do host.
pub fn run(config_path: &Path) -> Result<RunSummary, RunError> {
    let config = AgentConfig::load(config_path)?;
    let transport = HttpTransport::new(config.request_timeout())?;
    let probes = build_probes(&config, platform::detect());
    run_pipeline(&config, probes, &transport)
}

/// Agrega, serializa, criptografa e entrega uma vez. Sem retry.
pub fn run_pipeline<H, S, N, P, T>(
    config: &AgentConfig,
    probes: ProbeSet<H, S, N, P>,
    transport: &T,
) -> Result<RunSummary, RunError>
where
    H: Probe<Record = HardwareInfo>,
    S: Probe<Record = SoftwareInfo>,
    N: Probe<Record = NetworkInfo>,
    P: Probe<Record = PerformanceInfo>,
    T: Transport + ?Sized,
{
    let key = EncryptionKey::from_hex(&config.encryption_key)?;

    let (snapshot, report) = Aggregator::new(config.probe_deadline()).aggregate_with_report(probes);
    let plaintext = serialize_snapshot(&snapshot)?;
    debug!("Snapshot serializado: {} bytes", plaintext.len());

    let encoded = encrypt_with_key(&plaintext, &key)?;
    transport.deliver(&config.server_address, &encoded)?;

    info!(
        "Snapshot de {} enviado ({} bytes cifrados)",
        snapshot.capture_time(),
        encoded.len()
    );
    Ok(RunSummary {
        report,
        plaintext_len: plaintext.len(),
        encoded_len: encoded.len(),
    })
}
