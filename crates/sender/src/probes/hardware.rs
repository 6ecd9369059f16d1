//! Sonda de hardware: CPU, RAM, volumes, GPUs, placa-mãe, BIOS e removíveis.

use super::{CPU_SENSOR_LABELS, max_temperature, percent};
use crate::platform::Platform;
use inventory_core::types::{CpuInfo, DiskInfo, HardwareInfo, MemoryInfo};
use inventory_core::{FieldCollector, Probe, ProbeOutcome};
use std::sync::Arc;
use sysinfo::{
    Components, CpuRefreshKind, DiskKind, Disks, MemoryRefreshKind, RefreshKind, System,
};

pub struct HardwareProbe {
    platform: Arc<dyn Platform>,
}

impl HardwareProbe {
    pub fn new(platform: Arc<dyn Platform>) -> Self {
        Self { platform }
    }
}

impl Probe for HardwareProbe {
    type Record = HardwareInfo;

    fn collect(self) -> ProbeOutcome<HardwareInfo> {
        let mut sys = System::new_with_specifics(
            RefreshKind::nothing()
                .with_cpu(CpuRefreshKind::everything())
                .with_memory(MemoryRefreshKind::everything()),
        );
        // Uso de CPU precisa de duas leituras
        std::thread::sleep(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL);
        sys.refresh_cpu_all();
        let components = Components::new_with_refreshed_list();

        let mut fields = FieldCollector::new();
        let cpu = fields.field("cpu", cpu_info(&sys, &components)).unwrap_or_default();
        let memory = fields.field("memory", memory_info(&sys)).unwrap_or_default();
        let disks = fields.field::<_, String>("disks", Ok(volumes()));
        let gpus = fields.field("gpus", self.platform.gpus());
        let motherboard = fields
            .field("motherboard", self.platform.motherboard())
            .unwrap_or_default();
        let bios = fields.field("bios", self.platform.bios()).unwrap_or_default();
        let removable_devices = fields.field(
            "removable_devices",
            self.platform.removable_devices().map(|mut devices| {
                devices.sort_by(|a, b| a.name.cmp(&b.name));
                devices
            }),
        );

        fields.finish(HardwareInfo {
            cpu,
            memory,
            disks,
            gpus,
            motherboard,
            bios,
            removable_devices,
        })
    }
}

fn cpu_info(sys: &System, components: &Components) -> Result<CpuInfo, String> {
    let cpus = sys.cpus();
    let first = cpus.first().ok_or("nenhuma CPU reportada")?;

    let model = first.brand().trim();
    let mhz = first.frequency();

    Ok(CpuInfo {
        model: (!model.is_empty()).then(|| model.to_string()),
        physical_cores: System::physical_core_count().map(|n| n as u32),
        logical_cores: Some(cpus.len() as u32),
        frequency_ghz: (mhz > 0).then(|| mhz as f64 / 1000.0),
        temperature_celsius: max_temperature(components, CPU_SENSOR_LABELS),
        usage_percent: Some(f64::from(sys.global_cpu_usage())),
    })
}

fn memory_info(sys: &System) -> Result<MemoryInfo, String> {
    let total = sys.total_memory();
    if total == 0 {
        return Err("memória total desconhecida".into());
    }
    let used = sys.used_memory();
    Ok(MemoryInfo {
        total_bytes: Some(total),
        used_bytes: Some(used),
        free_bytes: Some(sys.available_memory()),
        usage_percent: percent(used, total),
    })
}

/// Volumes montados, ordenados por ponto de montagem.
fn volumes() -> Vec<DiskInfo> {
    let disks = Disks::new_with_refreshed_list();
    let mut volumes: Vec<DiskInfo> = disks
        .iter()
        .filter(|d| d.total_space() > 0)
        .map(|d| {
            let total = d.total_space();
            let free = d.available_space();
            let used = total.saturating_sub(free);
            DiskInfo {
                device: Some(d.name().to_string_lossy().into_owned()).filter(|n| !n.is_empty()),
                mount_point: Some(d.mount_point().to_string_lossy().into_owned()),
                file_system: Some(d.file_system().to_string_lossy().into_owned()),
                kind: Some(disk_kind(d.kind()).to_string()),
                removable: Some(d.is_removable()),
                total_bytes: Some(total),
                used_bytes: Some(used),
                free_bytes: Some(free),
                usage_percent: percent(used, total),
            }
        })
        .collect();
    volumes.sort_by(|a, b| a.mount_point.cmp(&b.mount_point));
    volumes
}

fn disk_kind(kind: DiskKind) -> &'static str {
    match kind {
        DiskKind::SSD => "ssd",
        DiskKind::HDD => "hdd",
        DiskKind::Unknown(_) => "unknown",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::UnsupportedPlatform;
    use inventory_core::types::{BiosInfo, Motherboard};

    #[test]
    fn disk_kinds_have_stable_names() {
        assert_eq!(disk_kind(DiskKind::SSD), "ssd");
        assert_eq!(disk_kind(DiskKind::HDD), "hdd");
        assert_eq!(disk_kind(DiskKind::Unknown(-1)), "unknown");
    }

    #[test]
    fn unsupported_platform_yields_partial_record() {
        let outcome = HardwareProbe::new(Arc::new(UnsupportedPlatform)).collect();
        let ProbeOutcome::Partial { record, errors } = outcome else {
            panic!("esperado Partial");
        };
        assert_eq!(record.motherboard, Motherboard::default());
        assert_eq!(record.bios, BiosInfo::default());
        assert!(errors.iter().any(|e| e.field == "gpus"));
        assert!(errors.iter().all(|e| e.field != "disks"));
    }
}
