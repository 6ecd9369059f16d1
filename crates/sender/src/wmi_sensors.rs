//! Consultas WMI (`root\CIMv2`) usadas pela plataforma Windows.
//!
//! Fontes:
//! - `Win32_Product`, `Win32_Service` – software
//! - `Win32_BaseBoard`, `Win32_BIOS`, `Win32_DiskDrive`, `Win32_VideoController` – hardware
//! - `Win32_IP4RouteTable`, `Win32_NetworkAdapterConfiguration` – rede
//! - `Win32_PerfRawData_PerfDisk_PhysicalDisk` – contadores de disco
//!
//! A conexão COM é por thread, então cada consulta abre a sua.

use crate::platform::{DiskCounters, PlatformError};
use inventory_core::types::{
    BiosInfo, DnsConfig, GpuInfo, InstalledApp, Motherboard, RemovableDevice, RouteEntry,
    ServiceInfo,
};
use serde::Deserialize;
use tracing::debug;
use wmi::{COMLibrary, WMIConnection};

// ──────────────────────────────────────────────
// WMI Query structs
// ──────────────────────────────────────────────

#[derive(Deserialize, Debug)]
#[serde(rename = "Win32_Product")]
#[serde(rename_all = "PascalCase")]
struct Product {
    name: Option<String>,
    version: Option<String>,
    install_date: Option<String>,
}

#[derive(Deserialize, Debug)]
#[serde(rename = "Win32_Service")]
#[serde(rename_all = "PascalCase")]
struct Service {
    name: String,
    state: Option<String>,
}

#[derive(Deserialize, Debug)]
#[serde(rename = "Win32_BaseBoard")]
#[serde(rename_all = "PascalCase")]
struct BaseBoard {
    manufacturer: Option<String>,
    product: Option<String>,
    serial_number: Option<String>,
}

#[derive(Deserialize, Debug)]
#[serde(rename = "Win32_BIOS")]
#[serde(rename_all = "PascalCase")]
struct Bios {
    manufacturer: Option<String>,
    #[serde(rename = "SMBIOSBIOSVersion")]
    smbios_version: Option<String>,
    release_date: Option<String>,
}

#[derive(Deserialize, Debug)]
#[serde(rename = "Win32_DiskDrive")]
#[serde(rename_all = "PascalCase")]
struct DiskDrive {
    caption: Option<String>,
    manufacturer: Option<String>,
    model: Option<String>,
    serial_number: Option<String>,
}

#[derive(Deserialize, Debug)]
#[serde(rename = "Win32_VideoController")]
#[serde(rename_all = "PascalCase")]
struct VideoController {
    name: Option<String>,
    adapter_compatibility: Option<String>,
    driver_version: Option<String>,
    #[serde(rename = "AdapterRAM")]
    adapter_ram: Option<u32>,
}

#[derive(Deserialize, Debug)]
#[serde(rename = "Win32_IP4RouteTable")]
#[serde(rename_all = "PascalCase")]
struct Route {
    destination: String,
    mask: String,
    next_hop: String,
    interface_index: i32,
}

#[derive(Deserialize, Debug)]
#[serde(rename = "Win32_NetworkAdapterConfiguration")]
struct AdapterConfig {
    #[serde(rename = "DNSServerSearchOrder")]
    dns_servers: Option<Vec<String>>,
    #[serde(rename = "DNSDomain")]
    dns_domain: Option<String>,
}

/// uint64 chega como string no WMI; uint32 como número.
#[derive(Deserialize, Debug)]
#[serde(untagged)]
enum Counter {
    Num(u64),
    Text(String),
}

impl Counter {
    fn value(&self) -> u64 {
        match self {
            Counter::Num(n) => *n,
            Counter::Text(s) => s.trim().parse().unwrap_or(0),
        }
    }
}

#[derive(Deserialize, Debug)]
#[serde(rename = "Win32_PerfRawData_PerfDisk_PhysicalDisk")]
#[serde(rename_all = "PascalCase")]
struct PhysicalDiskRaw {
    disk_read_bytes_persec: Counter,
    disk_write_bytes_persec: Counter,
    disk_reads_persec: Counter,
    disk_writes_persec: Counter,
}

// ──────────────────────────────────────────────
// API pública
// ──────────────────────────────────────────────

/// Abre uma conexão em `root\CIMv2` para a thread atual.
pub fn connect() -> Result<WMIConnection, PlatformError> {
    let com = COMLibrary::new().map_err(|e| PlatformError::Wmi(e.to_string()))?;
    WMIConnection::new(com).map_err(|e| PlatformError::Wmi(e.to_string()))
}

fn query<T: serde::de::DeserializeOwned>(
    wmi: &WMIConnection,
    sql: &str,
) -> Result<Vec<T>, PlatformError> {
    wmi.raw_query::<T>(sql).map_err(|e| {
        debug!("WMI `{sql}`: {e}");
        PlatformError::Wmi(e.to_string())
    })
}

/// Pacotes MSI registrados (`Win32_Product`).
pub fn query_installed_apps(wmi: &WMIConnection) -> Result<Vec<InstalledApp>, PlatformError> {
    let products: Vec<Product> =
        query(wmi, "SELECT Name, Version, InstallDate FROM Win32_Product")?;
    Ok(products
        .into_iter()
        .filter_map(|p| {
            Some(InstalledApp {
                name: p.name.filter(|n| !n.is_empty())?,
                version: p.version,
                install_date: p.install_date,
            })
        })
        .collect())
}

pub fn query_services(wmi: &WMIConnection) -> Result<Vec<ServiceInfo>, PlatformError> {
    let services: Vec<Service> = query(wmi, "SELECT Name, State FROM Win32_Service")?;
    Ok(services
        .into_iter()
        .map(|s| ServiceInfo {
            name: s.name,
            status: s.state,
        })
        .collect())
}

pub fn query_motherboard(wmi: &WMIConnection) -> Result<Motherboard, PlatformError> {
    let boards: Vec<BaseBoard> =
        query(wmi, "SELECT Manufacturer, Product, SerialNumber FROM Win32_BaseBoard")?;
    let board = boards
        .into_iter()
        .next()
        .ok_or_else(|| PlatformError::Wmi("Win32_BaseBoard vazio".into()))?;
    Ok(Motherboard {
        manufacturer: board.manufacturer,
        model: board.product,
        serial_number: board.serial_number,
    })
}

pub fn query_bios(wmi: &WMIConnection) -> Result<BiosInfo, PlatformError> {
    let entries: Vec<Bios> = query(
        wmi,
        "SELECT Manufacturer, SMBIOSBIOSVersion, ReleaseDate FROM Win32_BIOS",
    )?;
    let bios = entries
        .into_iter()
        .next()
        .ok_or_else(|| PlatformError::Wmi("Win32_BIOS vazio".into()))?;
    Ok(BiosInfo {
        vendor: bios.manufacturer,
        version: bios.smbios_version,
        release_date: bios.release_date,
    })
}

/// Discos conectados via USB.
pub fn query_removable_devices(wmi: &WMIConnection) -> Result<Vec<RemovableDevice>, PlatformError> {
    let drives: Vec<DiskDrive> = query(
        wmi,
        "SELECT Caption, Manufacturer, Model, SerialNumber FROM Win32_DiskDrive WHERE InterfaceType = 'USB'",
    )?;
    Ok(drives
        .into_iter()
        .map(|d| RemovableDevice {
            name: d.caption,
            vendor: d.manufacturer,
            model: d.model,
            serial_number: d.serial_number.map(|s| s.trim().to_string()),
        })
        .collect())
}

pub fn query_gpus(wmi: &WMIConnection) -> Result<Vec<GpuInfo>, PlatformError> {
    let controllers: Vec<VideoController> = query(
        wmi,
        "SELECT Name, AdapterCompatibility, DriverVersion, AdapterRAM FROM Win32_VideoController",
    )?;
    Ok(controllers
        .into_iter()
        .map(|c| GpuInfo {
            model: c.name,
            vendor: c.adapter_compatibility,
            driver: c.driver_version,
            // AdapterRAM é uint32: satura em 4 GB
            memory_bytes: c.adapter_ram.map(u64::from),
            temperature_celsius: None,
            usage_percent: None,
        })
        .collect())
}

pub fn query_routes(wmi: &WMIConnection) -> Result<Vec<RouteEntry>, PlatformError> {
    let routes: Vec<Route> = query(
        wmi,
        "SELECT Destination, Mask, NextHop, InterfaceIndex FROM Win32_IP4RouteTable",
    )?;
    Ok(routes
        .into_iter()
        .map(|r| RouteEntry {
            destination: format!("{}/{}", r.destination, mask_prefix(&r.mask)),
            gateway: r.next_hop,
            interface: r.interface_index.to_string(),
        })
        .collect())
}

pub fn query_dns(wmi: &WMIConnection) -> Result<DnsConfig, PlatformError> {
    let adapters: Vec<AdapterConfig> = query(
        wmi,
        "SELECT DNSServerSearchOrder, DNSDomain FROM Win32_NetworkAdapterConfiguration WHERE IPEnabled = TRUE",
    )?;

    let mut config = DnsConfig::default();
    for adapter in adapters {
        for server in adapter.dns_servers.unwrap_or_default() {
            let servers = config.servers.get_or_insert_with(Vec::new);
            if !servers.contains(&server) {
                servers.push(server);
            }
        }
        if config.domain.is_none() {
            config.domain = adapter.dns_domain.filter(|d| !d.is_empty());
        }
    }
    Ok(config)
}

/// Contadores brutos acumulados da instância `_Total`.
pub fn query_disk_counters(wmi: &WMIConnection) -> Result<DiskCounters, PlatformError> {
    let disks: Vec<PhysicalDiskRaw> = query(
        wmi,
        "SELECT DiskReadBytesPersec, DiskWriteBytesPersec, DiskReadsPersec, DiskWritesPersec \
         FROM Win32_PerfRawData_PerfDisk_PhysicalDisk WHERE Name = '_Total'",
    )?;
    let total = disks
        .into_iter()
        .next()
        .ok_or_else(|| PlatformError::Wmi("PhysicalDisk _Total ausente".into()))?;
    Ok(DiskCounters {
        read_bytes: total.disk_read_bytes_persec.value(),
        write_bytes: total.disk_write_bytes_persec.value(),
        read_ops: total.disk_reads_persec.value(),
        write_ops: total.disk_writes_persec.value(),
    })
}

/// `255.255.255.0` → 24.
fn mask_prefix(mask: &str) -> u32 {
    mask.parse::<std::net::Ipv4Addr>()
        .map(|m| u32::from(m).count_ones())
        .unwrap_or(0)
}
