//! Definição de tipos/structs do snapshot.
//!
//! Cada domínio (hardware, software, rede, performance) é um registro cujas
//! folhas são `Option`: `None` significa "a sonda não conseguiu determinar"
//! e é serializado como `null`, nunca omitido. Sub-registros (CPU, memória,
//! DNS, I/O…) não são opcionais: um sub-registro ausente ainda emite todas
//! as suas chaves com `null`, então as posições dos campos são estáveis
//! entre snapshots com padrões de falha diferentes.
//!
//! O `Default` de cada registro é o valor-zero (todas as folhas ausentes).

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

// ──────────────────────────────────────────────
// Hardware
// ──────────────────────────────────────────────

/// Dados de CPU.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CpuInfo {
    /// Modelo (brand string)
    pub model: Option<String>,
    /// Núcleos físicos
    pub physical_cores: Option<u32>,
    /// Núcleos lógicos (threads)
    pub logical_cores: Option<u32>,
    /// Frequência do primeiro core (GHz)
    pub frequency_ghz: Option<f64>,
    /// Temperatura do pacote/die (°C)
    pub temperature_celsius: Option<f64>,
    /// Uso total (0–100%)
    pub usage_percent: Option<f64>,
}

/// Dados de memória RAM.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MemoryInfo {
    pub total_bytes: Option<u64>,
    pub used_bytes: Option<u64>,
    pub free_bytes: Option<u64>,
    pub usage_percent: Option<f64>,
}

/// Uma partição/volume montado.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DiskInfo {
    /// Nome do dispositivo (ex: "/dev/nvme0n1p2")
    pub device: Option<String>,
    pub mount_point: Option<String>,
    pub file_system: Option<String>,
    /// "ssd", "hdd" ou "unknown"
    pub kind: Option<String>,
    pub removable: Option<bool>,
    pub total_bytes: Option<u64>,
    pub used_bytes: Option<u64>,
    pub free_bytes: Option<u64>,
    pub usage_percent: Option<f64>,
}

/// Placa de vídeo.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GpuInfo {
    pub model: Option<String>,
    pub vendor: Option<String>,
    pub driver: Option<String>,
    /// VRAM total (bytes)
    pub memory_bytes: Option<u64>,
    pub temperature_celsius: Option<f64>,
    pub usage_percent: Option<f64>,
}

/// Dados de placa-mãe.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Motherboard {
    pub manufacturer: Option<String>,
    pub model: Option<String>,
    pub serial_number: Option<String>,
}

/// Dados de BIOS/firmware.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct BiosInfo {
    pub vendor: Option<String>,
    pub version: Option<String>,
    pub release_date: Option<String>,
}

/// Dispositivo de armazenamento removível (pendrive, HD externo…).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RemovableDevice {
    pub name: Option<String>,
    pub vendor: Option<String>,
    pub model: Option<String>,
    pub serial_number: Option<String>,
}

/// Registro de hardware.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct HardwareInfo {
    pub cpu: CpuInfo,
    pub memory: MemoryInfo,
    pub disks: Option<Vec<DiskInfo>>,
    pub gpus: Option<Vec<GpuInfo>>,
    pub motherboard: Motherboard,
    pub bios: BiosInfo,
    pub removable_devices: Option<Vec<RemovableDevice>>,
}

// ──────────────────────────────────────────────
// Software
// ──────────────────────────────────────────────

/// Identificação do sistema operacional.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct OsInfo {
    pub name: Option<String>,
    pub version: Option<String>,
    pub architecture: Option<String>,
    pub hostname: Option<String>,
}

/// Aplicativo/pacote instalado.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct InstalledApp {
    pub name: String,
    pub version: Option<String>,
    pub install_date: Option<String>,
}

/// Processo em execução.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ProcessInfo {
    pub name: String,
    pub pid: u32,
    pub cpu_usage_percent: Option<f64>,
    pub memory_bytes: Option<u64>,
}

/// Serviço do sistema (systemd unit, serviço Windows…).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ServiceInfo {
    pub name: String,
    pub status: Option<String>,
}

/// Registro de software.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SoftwareInfo {
    pub os: OsInfo,
    pub kernel: Option<String>,
    pub installed_apps: Option<Vec<InstalledApp>>,
    pub running_processes: Option<Vec<ProcessInfo>>,
    pub system_services: Option<Vec<ServiceInfo>>,
}

// ──────────────────────────────────────────────
// Network
// ──────────────────────────────────────────────

/// Interface de rede.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct InterfaceInfo {
    pub name: String,
    pub mac_address: Option<String>,
    /// Endereços em notação CIDR (ex: "192.168.0.10/24")
    pub ip_addresses: Option<Vec<String>>,
    pub bytes_sent: Option<u64>,
    pub bytes_recv: Option<u64>,
}

/// Conexão TCP.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ConnectionInfo {
    pub local_address: String,
    pub local_port: u16,
    pub remote_address: String,
    pub remote_port: u16,
    pub state: String,
    pub pid: Option<u32>,
}

/// Entrada da tabela de rotas.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RouteEntry {
    pub destination: String,
    pub gateway: String,
    pub interface: String,
}

/// Configuração de DNS do host.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DnsConfig {
    pub servers: Option<Vec<String>>,
    pub domain: Option<String>,
}

/// Métricas de rede que exigem medição ativa.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AdvancedNetworkInfo {
    pub latency_ms: Option<f64>,
    pub packet_loss_percent: Option<f64>,
    pub download_mbps: Option<f64>,
    pub upload_mbps: Option<f64>,
    pub routing_table: Option<Vec<RouteEntry>>,
    pub dns_configuration: DnsConfig,
    pub vpn_active: Option<bool>,
}

/// Registro de rede.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct NetworkInfo {
    pub interfaces: Option<Vec<InterfaceInfo>>,
    pub connections: Option<Vec<ConnectionInfo>>,
    pub dns_servers: Option<Vec<String>>,
    pub public_ip: Option<String>,
    pub advanced: AdvancedNetworkInfo,
}

// ──────────────────────────────────────────────
// Performance
// ──────────────────────────────────────────────

/// Taxas de I/O de disco, somadas entre dispositivos.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DiskIo {
    pub read_bytes_per_sec: Option<u64>,
    pub write_bytes_per_sec: Option<u64>,
    pub read_ops_per_sec: Option<u64>,
    pub write_ops_per_sec: Option<u64>,
}

/// Taxas de I/O de rede, somadas entre interfaces.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct NetworkIo {
    pub bytes_sent_per_sec: Option<u64>,
    pub bytes_recv_per_sec: Option<u64>,
    pub packets_sent_per_sec: Option<u64>,
    pub packets_recv_per_sec: Option<u64>,
}

/// Load average (1, 5 e 15 minutos).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct LoadAverage {
    pub one: Option<f64>,
    pub five: Option<f64>,
    pub fifteen: Option<f64>,
}

/// Temperaturas lidas dos sensores.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Temperatures {
    pub cpu_celsius: Option<f64>,
    pub gpu_celsius: Option<f64>,
    pub disk_celsius: Option<Vec<f64>>,
}

/// Registro de performance.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PerformanceInfo {
    pub cpu_usage_percent: Option<f64>,
    pub memory_usage_percent: Option<f64>,
    pub disk_io: DiskIo,
    pub network_io: NetworkIo,
    pub load_average: LoadAverage,
    pub temperatures: Temperatures,
}

// ──────────────────────────────────────────────
// Snapshot completo
// ──────────────────────────────────────────────

/// Snapshot imutável do estado da máquina em um instante.
///
/// Construído apenas por [`Snapshot::new`]; os campos são somente leitura.
/// A ordem de declaração define a ordem na serialização:
/// `capture_time`, `hardware`, `software`, `network`, `performance`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Snapshot {
    #[serde(with = "rfc3339_nanos")]
    capture_time: DateTime<Utc>,
    hardware: HardwareInfo,
    software: SoftwareInfo,
    network: NetworkInfo,
    performance: PerformanceInfo,
}

impl Snapshot {
    pub fn new(
        capture_time: DateTime<Utc>,
        hardware: HardwareInfo,
        software: SoftwareInfo,
        network: NetworkInfo,
        performance: PerformanceInfo,
    ) -> Self {
        Self {
            capture_time,
            hardware,
            software,
            network,
            performance,
        }
    }

    pub fn capture_time(&self) -> DateTime<Utc> {
        self.capture_time
    }

    pub fn hardware(&self) -> &HardwareInfo {
        &self.hardware
    }

    pub fn software(&self) -> &SoftwareInfo {
        &self.software
    }

    pub fn network(&self) -> &NetworkInfo {
        &self.network
    }

    pub fn performance(&self) -> &PerformanceInfo {
        &self.performance
    }
}

/// Timestamp em RFC 3339, UTC, sempre com 9 dígitos de fração e sufixo `Z`.
mod rfc3339_nanos {
    use super::*;

    pub fn serialize<S: Serializer>(time: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&time.to_rfc3339_opts(SecondsFormat::Nanos, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(d)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|t| t.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}

// ──────────────────────────────────────────────
// Testes
// ──────────────────────────────────────────────
