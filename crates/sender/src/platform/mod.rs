//! Sonda de plataforma – tudo que depende do sistema operacional.
//!
//! A implementação é escolhida uma única vez por [`detect`]:
//! - **Linux:** `/sys`, `/proc`, `dpkg-query`, `systemctl`
//! - **Windows:** WMI (`root\CIMv2`) + NVML + `netstat`
//! - **Outros:** [`UnsupportedPlatform`], cada consulta vira campo ausente
//!
//! As sondas de domínio só conhecem o trait [`Platform`].

#[cfg(target_os = "linux")]
mod linux;
#[cfg(any(windows, test))]
mod netstat;
#[cfg(windows)]
mod windows;

use inventory_core::types::{
    BiosInfo, ConnectionInfo, DnsConfig, GpuInfo, InstalledApp, Motherboard, RemovableDevice,
    RouteEntry, ServiceInfo,
};
use std::process::Command;
use std::sync::Arc;
use tracing::{debug, info};

/// Erros de consulta à plataforma. Sempre recuperáveis (campo ausente).
#[derive(Debug, thiserror::Error)]
pub enum PlatformError {
    #[error("{0} não suportado nesta plataforma")]
    Unsupported(&'static str),

    #[error("Erro de I/O: {0}")]
    Io(#[from] std::io::Error),

    #[error("Comando `{program}` falhou: {reason}")]
    Command { program: String, reason: String },

    #[error("Formato inesperado: {0}")]
    Parse(String),

    #[error("WMI: {0}")]
    Wmi(String),
}

/// Contadores acumulados de disco (desde o boot), somados entre discos físicos.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiskCounters {
    pub read_bytes: u64,
    pub write_bytes: u64,
    pub read_ops: u64,
    pub write_ops: u64,
}

/// Consultas específicas do sistema operacional.
pub trait Platform: Send + Sync {
    fn name(&self) -> &'static str;

    fn installed_apps(&self) -> Result<Vec<InstalledApp>, PlatformError>;
    fn services(&self) -> Result<Vec<ServiceInfo>, PlatformError>;

    fn motherboard(&self) -> Result<Motherboard, PlatformError>;
    fn bios(&self) -> Result<BiosInfo, PlatformError>;
    fn removable_devices(&self) -> Result<Vec<RemovableDevice>, PlatformError>;
    fn gpus(&self) -> Result<Vec<GpuInfo>, PlatformError>;

    fn tcp_connections(&self) -> Result<Vec<ConnectionInfo>, PlatformError>;
    fn routing_table(&self) -> Result<Vec<RouteEntry>, PlatformError>;
    fn dns_config(&self) -> Result<DnsConfig, PlatformError>;

    fn disk_counters(&self) -> Result<DiskCounters, PlatformError>;
}

/// Seleciona a implementação do sistema atual.
pub fn detect() -> Arc<dyn Platform> {
    #[cfg(target_os = "linux")]
    let platform: Arc<dyn Platform> = Arc::new(linux::LinuxPlatform::new());

    #[cfg(windows)]
    let platform: Arc<dyn Platform> = Arc::new(windows::WindowsPlatform::new());

    #[cfg(not(any(target_os = "linux", windows)))]
    let platform: Arc<dyn Platform> = Arc::new(UnsupportedPlatform);

    info!("Plataforma detectada: {}", platform.name());
    platform
}

// ──────────────────────────────────────────────
// Plataforma sem suporte
// ──────────────────────────────────────────────

/// Responde `Unsupported` para tudo.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnsupportedPlatform;

impl Platform for UnsupportedPlatform {
    fn name(&self) -> &'static str {
        "unsupported"
    }

    fn installed_apps(&self) -> Result<Vec<InstalledApp>, PlatformError> {
        Err(PlatformError::Unsupported("Aplicativos instalados"))
    }

    fn services(&self) -> Result<Vec<ServiceInfo>, PlatformError> {
        Err(PlatformError::Unsupported("Serviços"))
    }

    fn motherboard(&self) -> Result<Motherboard, PlatformError> {
        Err(PlatformError::Unsupported("Placa-mãe"))
    }

    fn bios(&self) -> Result<BiosInfo, PlatformError> {
        Err(PlatformError::Unsupported("BIOS"))
    }

    fn removable_devices(&self) -> Result<Vec<RemovableDevice>, PlatformError> {
        Err(PlatformError::Unsupported("Dispositivos removíveis"))
    }

    fn gpus(&self) -> Result<Vec<GpuInfo>, PlatformError> {
        Err(PlatformError::Unsupported("GPU"))
    }

    fn tcp_connections(&self) -> Result<Vec<ConnectionInfo>, PlatformError> {
        Err(PlatformError::Unsupported("Conexões TCP"))
    }

    fn routing_table(&self) -> Result<Vec<RouteEntry>, PlatformError> {
        Err(PlatformError::Unsupported("Tabela de rotas"))
    }

    fn dns_config(&self) -> Result<DnsConfig, PlatformError> {
        Err(PlatformError::Unsupported("DNS"))
    }

    fn disk_counters(&self) -> Result<DiskCounters, PlatformError> {
        Err(PlatformError::Unsupported("I/O de disco"))
    }
}

// ──────────────────────────────────────────────
// Helpers
// ──────────────────────────────────────────────

/// Executa um comando externo e devolve o stdout como texto.
#[cfg_attr(not(any(target_os = "linux", windows)), allow(dead_code))]
pub(crate) fn run_command(program: &str, args: &[&str]) -> Result<String, PlatformError> {
    debug!("Executando {program} {}", args.join(" "));
    let output = Command::new(program)
        .args(args)
        .output()
        .map_err(|e| PlatformError::Command {
            program: program.to_string(),
            reason: e.to_string(),
        })?;

    if !output.status.success() {
        return Err(PlatformError::Command {
            program: program.to_string(),
            reason: format!(
                "{} – {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            ),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}
