//! Sondas de domínio – sysinfo + [`Platform`].
//!
//! Cada sonda é construída com o que precisa (config, plataforma) e consumida
//! pelo agregador numa thread própria. Listas são ordenadas antes de sair da
//! sonda para que dois snapshots do mesmo estado serializem igual.

mod hardware;
mod network;
mod performance;
mod software;

pub use hardware::HardwareProbe;
pub use network::NetworkProbe;
pub use performance::PerformanceProbe;
pub use software::SoftwareProbe;

use crate::platform::Platform;
use inventory_core::{AgentConfig, ProbeSet};
use std::sync::Arc;
use std::time::Duration;
use sysinfo::{Components, Networks};

/// Conjunto de sondas reais do host.
pub type HostProbes = ProbeSet<HardwareProbe, SoftwareProbe, NetworkProbe, PerformanceProbe>;

/// Monta as quatro sondas a partir da configuração.
pub fn build_probes(config: &AgentConfig, platform: Arc<dyn Platform>) -> HostProbes {
    ProbeSet {
        hardware: HardwareProbe::new(Arc::clone(&platform)),
        software: SoftwareProbe::new(Arc::clone(&platform)),
        network: NetworkProbe::new(Arc::clone(&platform), config),
        performance: PerformanceProbe::new(platform, config.sample_window()),
    }
}

// ──────────────────────────────────────────────
// Helpers compartilhados
// ──────────────────────────────────────────────

/// Contadores acumulados de todas as interfaces.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct NetCounters {
    pub sent: u64,
    pub recv: u64,
    pub packets_sent: u64,
    pub packets_recv: u64,
}

impl NetCounters {
    pub fn read(networks: &Networks) -> Self {
        networks
            .iter()
            .fold(Self::default(), |acc, (_name, data)| Self {
                sent: acc.sent + data.total_transmitted(),
                recv: acc.recv + data.total_received(),
                packets_sent: acc.packets_sent + data.total_packets_transmitted(),
                packets_recv: acc.packets_recv + data.total_packets_received(),
            })
    }

    /// Diferença `later - self`, saturando em zero (contador reiniciado).
    pub fn delta(&self, later: &Self) -> Self {
        Self {
            sent: later.sent.saturating_sub(self.sent),
            recv: later.recv.saturating_sub(self.recv),
            packets_sent: later.packets_sent.saturating_sub(self.packets_sent),
            packets_recv: later.packets_recv.saturating_sub(self.packets_recv),
        }
    }
}

/// Mede os contadores de rede antes e depois de `window`.
pub(crate) fn sample_network(window: Duration) -> NetCounters {
    let mut networks = Networks::new_with_refreshed_list();
    let before = NetCounters::read(&networks);
    std::thread::sleep(window);
    networks.refresh(true);
    before.delta(&NetCounters::read(&networks))
}

/// Converte uma contagem em taxa por segundo.
pub(crate) fn per_second(count: u64, window: Duration) -> u64 {
    let secs = window.as_secs_f64();
    if secs > 0.0 {
        (count as f64 / secs).round() as u64
    } else {
        0
    }
}

/// Bytes na janela → megabits por segundo.
pub(crate) fn mbps(bytes: u64, window: Duration) -> f64 {
    let secs = window.as_secs_f64();
    if secs > 0.0 {
        bytes as f64 * 8.0 / 1_000_000.0 / secs
    } else {
        0.0
    }
}

/// `used / total` em %, `None` se o total é zero.
pub(crate) fn percent(used: u64, total: u64) -> Option<f64> {
    (total > 0).then(|| used as f64 / total as f64 * 100.0)
}

/// Maior leitura plausível entre os sensores cujo rótulo contém algum dos termos.
pub(crate) fn max_temperature(components: &Components, labels: &[&str]) -> Option<f64> {
    components
        .iter()
        .filter(|c| {
            let label = c.label().to_lowercase();
            labels.iter().any(|l| label.contains(l))
        })
        .filter_map(|c| c.temperature())
        .filter(|t| *t > 0.0 && *t < 150.0)
        .map(f64::from)
        .reduce(f64::max)
}

pub(crate) const CPU_SENSOR_LABELS: &[&str] = &["cpu", "tctl", "tdie", "package", "core"];
pub(crate) const GPU_SENSOR_LABELS: &[&str] = &["gpu", "amdgpu", "nouveau", "radeon"];
pub(crate) const DISK_SENSOR_LABELS: &[&str] = &["nvme", "drivetemp", "composite", "sata"];

// ──────────────────────────────────────────────
// Testes
// ──────────────────────────────────────────────
