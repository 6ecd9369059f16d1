//! Implementação Linux.
//!
//! Quase tudo vem de pseudo-arquivos do kernel; só pacotes e serviços
//! dependem de ferramentas externas (`dpkg-query`, `systemctl`).

use super::{DiskCounters, Platform, PlatformError, run_command};
use inventory_core::types::{
    BiosInfo, ConnectionInfo, DnsConfig, GpuInfo, InstalledApp, Motherboard, RemovableDevice,
    RouteEntry, ServiceInfo,
};
use std::fs;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::path::{Path, PathBuf};

const DMI_DIR: &str = "/sys/class/dmi/id";
const BLOCK_DIR: &str = "/sys/block";
const DRM_DIR: &str = "/sys/class/drm";

/// Tamanho de setor usado por `/proc/diskstats` (sempre 512, independente do disco).
const DISKSTATS_SECTOR: u64 = 512;

#[derive(Debug, Default)]
pub struct LinuxPlatform;

impl LinuxPlatform {
    pub fn new() -> Self {
        Self
    }
}

impl Platform for LinuxPlatform {
    fn name(&self) -> &'static str {
        "linux"
    }

    fn installed_apps(&self) -> Result<Vec<InstalledApp>, PlatformError> {
        let out = run_command("dpkg-query", &["-W", "-f=${Package}\t${Version}\n"])?;
        Ok(parse_dpkg_query(&out))
    }

    fn services(&self) -> Result<Vec<ServiceInfo>, PlatformError> {
        let out = run_command(
            "systemctl",
            &["list-units", "--type=service", "--all", "--no-pager", "--no-legend"],
        )?;
        Ok(parse_systemctl_units(&out))
    }

    fn motherboard(&self) -> Result<Motherboard, PlatformError> {
        let dir = Path::new(DMI_DIR);
        let board = Motherboard {
            manufacturer: read_trimmed(&dir.join("board_vendor")),
            model: read_trimmed(&dir.join("board_name")),
            // board_serial só é legível como root
            serial_number: read_trimmed(&dir.join("board_serial")),
        };
        if board == Motherboard::default() {
            return Err(PlatformError::Parse(format!("{DMI_DIR} sem dados de placa-mãe")));
        }
        Ok(board)
    }

    fn bios(&self) -> Result<BiosInfo, PlatformError> {
        let dir = Path::new(DMI_DIR);
        let bios = BiosInfo {
            vendor: read_trimmed(&dir.join("bios_vendor")),
            version: read_trimmed(&dir.join("bios_version")),
            release_date: read_trimmed(&dir.join("bios_date")),
        };
        if bios == BiosInfo::default() {
            return Err(PlatformError::Parse(format!("{DMI_DIR} sem dados de BIOS")));
        }
        Ok(bios)
    }

    fn removable_devices(&self) -> Result<Vec<RemovableDevice>, PlatformError> {
        let mut devices = Vec::new();
        for dev in sorted_entries(Path::new(BLOCK_DIR))? {
            if read_trimmed(&dev.join("removable")).as_deref() != Some("1") {
                continue;
            }
            // Leitores de cartão vazios aparecem com tamanho 0
            if read_trimmed(&dev.join("size")).as_deref() == Some("0") {
                continue;
            }
            let device_dir = dev.join("device");
            devices.push(RemovableDevice {
                name: file_name(&dev),
                vendor: read_trimmed(&device_dir.join("vendor")),
                model: read_trimmed(&device_dir.join("model")),
                serial_number: read_trimmed(&device_dir.join("serial")),
            });
        }
        Ok(devices)
    }

    fn gpus(&self) -> Result<Vec<GpuInfo>, PlatformError> {
        let mut gpus = Vec::new();
        for card in sorted_entries(Path::new(DRM_DIR))? {
            let Some(name) = file_name(&card) else { continue };
            // card0, card1… (card0-HDMI-A-1 etc. são conectores)
            if !is_drm_card(&name) {
                continue;
            }

            let device = card.join("device");
            let vendor_id = read_trimmed(&device.join("vendor"));
            let device_id = read_trimmed(&device.join("device"));
            let vendor = vendor_id.as_deref().map(pci_vendor_name);
            let driver = fs::read_link(device.join("driver"))
                .ok()
                .and_then(|p| file_name(&p));

            gpus.push(GpuInfo {
                model: match (&vendor, &vendor_id, &device_id) {
                    (Some(v), Some(vid), Some(did)) => Some(format!(
                        "{v} [{}:{}]",
                        vid.trim_start_matches("0x"),
                        did.trim_start_matches("0x")
                    )),
                    _ => None,
                },
                vendor,
                driver,
                // Só amdgpu expõe VRAM e carga via sysfs
                memory_bytes: read_trimmed(&device.join("mem_info_vram_total"))
                    .and_then(|v| v.parse().ok()),
                temperature_celsius: None,
                usage_percent: read_trimmed(&device.join("gpu_busy_percent"))
                    .and_then(|v| v.parse().ok()),
            });
        }
        Ok(gpus)
    }

    fn tcp_connections(&self) -> Result<Vec<ConnectionInfo>, PlatformError> {
        let mut conns = parse_proc_net_tcp(&fs::read_to_string("/proc/net/tcp")?, false);
        // Kernel sem IPv6 não tem o arquivo
        if let Ok(v6) = fs::read_to_string("/proc/net/tcp6") {
            conns.extend(parse_proc_net_tcp(&v6, true));
        }
        Ok(conns)
    }

    fn routing_table(&self) -> Result<Vec<RouteEntry>, PlatformError> {
        parse_proc_route(&fs::read_to_string("/proc/net/route")?)
    }

    fn dns_config(&self) -> Result<DnsConfig, PlatformError> {
        Ok(parse_resolv_conf(&fs::read_to_string("/etc/resolv.conf")?))
    }

    fn disk_counters(&self) -> Result<DiskCounters, PlatformError> {
        let content = fs::read_to_string("/proc/diskstats")?;
        // Partições não aparecem em /sys/block; somar só discos inteiros evita contagem dupla.
        parse_diskstats(&content, |name| {
            !name.starts_with("loop")
                && !name.starts_with("ram")
                && !name.starts_with("zram")
                && Path::new(BLOCK_DIR).join(name).exists()
        })
    }
}

// ──────────────────────────────────────────────
// Parsers
// ──────────────────────────────────────────────

/// `dpkg-query -W -f='${Package}\t${Version}\n'`
fn parse_dpkg_query(out: &str) -> Vec<InstalledApp> {
    out.lines()
        .filter_map(|line| {
            let (name, version) = line.split_once('\t')?;
            let name = name.trim();
            if name.is_empty() {
                return None;
            }
            let version = version.trim();
            Some(InstalledApp {
                name: name.to_string(),
                version: (!version.is_empty()).then(|| version.to_string()),
                install_date: None,
            })
        })
        .collect()
}

/// `systemctl list-units --no-legend`: UNIT LOAD ACTIVE SUB DESCRIPTION…
fn parse_systemctl_units(out: &str) -> Vec<ServiceInfo> {
    out.lines()
        .filter_map(|line| {
            let mut fields = line.split_whitespace().peekable();
            // Unidades com falha vêm prefixadas por "●" (ou "*" sem UTF-8)
            if matches!(fields.peek(), Some(&"●") | Some(&"*")) {
                fields.next();
            }
            let fields: Vec<&str> = fields.collect();
            if fields.len() < 4 {
                return None;
            }
            Some(ServiceInfo {
                name: fields[0].to_string(),
                status: Some(fields[2].to_string()),
            })
        })
        .collect()
}

/// `/proc/net/route`: endereços em hexadecimal little-endian.
fn parse_proc_route(content: &str) -> Result<Vec<RouteEntry>, PlatformError> {
    let mut entries = Vec::new();
    for line in content.lines().skip(1) {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 8 {
            continue;
        }
        let dest = hex_ipv4(fields[1])?;
        let gateway = hex_ipv4(fields[2])?;
        let mask = hex_ipv4(fields[7])?;
        entries.push(RouteEntry {
            destination: format!("{dest}/{}", u32::from(mask).count_ones()),
            gateway: gateway.to_string(),
            interface: fields[0].to_string(),
        });
    }
    Ok(entries)
}

/// `/etc/resolv.conf`: `nameserver` e `domain` (ou o primeiro `search`).
fn parse_resolv_conf(content: &str) -> DnsConfig {
    let mut config = DnsConfig::default();
    let mut search = None;

    for line in content.lines() {
        let mut fields = line.split_whitespace();
        match (fields.next(), fields.next()) {
            (Some("nameserver"), Some(server)) => config
                .servers
                .get_or_insert_with(Vec::new)
                .push(server.to_string()),
            (Some("domain"), Some(domain)) => config.domain = Some(domain.to_string()),
            (Some("search"), Some(first)) if search.is_none() => search = Some(first.to_string()),
            _ => {}
        }
    }

    if config.domain.is_none() {
        config.domain = search;
    }
    config
}

/// `/proc/net/tcp` e `/proc/net/tcp6`.
fn parse_proc_net_tcp(content: &str, ipv6: bool) -> Vec<ConnectionInfo> {
    content
        .lines()
        .skip(1)
        .filter_map(|line| {
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() < 4 {
                return None;
            }
            let (local_address, local_port) = hex_socket(fields[1], ipv6)?;
            let (remote_address, remote_port) = hex_socket(fields[2], ipv6)?;
            Some(ConnectionInfo {
                local_address,
                local_port,
                remote_address,
                remote_port,
                state: tcp_state_name(fields[3]).to_string(),
                pid: None,
            })
        })
        .collect()
}

/// `/proc/diskstats`: campos 4 (leituras), 6 (setores lidos), 8 (escritas), 10 (setores escritos).
fn parse_diskstats(
    content: &str,
    is_whole_disk: impl Fn(&str) -> bool,
) -> Result<DiskCounters, PlatformError> {
    let mut total = DiskCounters::default();
    for line in content.lines() {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 10 || !is_whole_disk(fields[2]) {
            continue;
        }
        let num = |i: usize| -> Result<u64, PlatformError> {
            fields[i]
                .parse()
                .map_err(|_| PlatformError::Parse(format!("diskstats: campo {i} = {:?}", fields[i])))
        };
        total.read_ops += num(3)?;
        total.read_bytes += num(5)? * DISKSTATS_SECTOR;
        total.write_ops += num(7)?;
        total.write_bytes += num(9)? * DISKSTATS_SECTOR;
    }
    Ok(total)
}

fn hex_ipv4(raw: &str) -> Result<Ipv4Addr, PlatformError> {
    u32::from_str_radix(raw, 16)
        .map(|v| Ipv4Addr::from(v.to_le_bytes()))
        .map_err(|_| PlatformError::Parse(format!("endereço IPv4 hex inválido: {raw}")))
}

/// `0100007F:1F90` → ("127.0.0.1", 8080). IPv6 são 4 palavras de 32 bits em ordem do host.
fn hex_socket(raw: &str, ipv6: bool) -> Option<(String, u16)> {
    let (addr, port) = raw.split_once(':')?;
    let port = u16::from_str_radix(port, 16).ok()?;

    let addr = if ipv6 {
        if addr.len() != 32 {
            return None;
        }
        let mut bytes = [0u8; 16];
        for (i, chunk) in bytes.chunks_mut(4).enumerate() {
            let word = u32::from_str_radix(&addr[i * 8..i * 8 + 8], 16).ok()?;
            chunk.copy_from_slice(&word.to_le_bytes());
        }
        Ipv6Addr::from(bytes).to_string()
    } else {
        hex_ipv4(addr).ok()?.to_string()
    };

    Some((addr, port))
}

fn tcp_state_name(code: &str) -> &'static str {
    match code {
        "01" => "ESTABLISHED",
        "02" => "SYN_SENT",
        "03" => "SYN_RECV",
        "04" => "FIN_WAIT1",
        "05" => "FIN_WAIT2",
        "06" => "TIME_WAIT",
        "07" => "CLOSE",
        "08" => "CLOSE_WAIT",
        "09" => "LAST_ACK",
        "0A" => "LISTEN",
        "0B" => "CLOSING",
        _ => "UNKNOWN",
    }
}

fn pci_vendor_name(id: &str) -> String {
    match id {
        "0x10de" => "NVIDIA".into(),
        "0x1002" => "AMD".into(),
        "0x8086" => "Intel".into(),
        "0x1af4" => "Red Hat (virtio)".into(),
        "0x15ad" => "VMware".into(),
        other => other.to_string(),
    }
}

fn is_drm_card(name: &str) -> bool {
    name.strip_prefix("card")
        .is_some_and(|n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()))
}

fn read_trimmed(path: &Path) -> Option<String> {
    let value = fs::read_to_string(path).ok()?;
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

fn file_name(path: &Path) -> Option<String> {
    path.file_name().map(|n| n.to_string_lossy().into_owned())
}

fn sorted_entries(dir: &Path) -> Result<Vec<PathBuf>, PlatformError> {
    let mut entries: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|e| e.ok().map(|e| e.path()))
        .collect();
    entries.sort();
    Ok(entries)
}

// ──────────────────────────────────────────────
// Testes
// ──────────────────────────────────────────────
