//! Sonda de performance: uso de CPU/RAM, taxas de I/O, load average e temperaturas.
//!
//! Taxas são deltas de contadores acumulados sobre a janela de amostragem.

use super::{
    CPU_SENSOR_LABELS, DISK_SENSOR_LABELS, GPU_SENSOR_LABELS, NetCounters, max_temperature,
    per_second, percent,
};
use crate::platform::{DiskCounters, Platform, PlatformError};
use inventory_core::types::{DiskIo, LoadAverage, NetworkIo, PerformanceInfo, Temperatures};
use inventory_core::{FieldCollector, Probe, ProbeOutcome};
use std::sync::Arc;
use std::time::Duration;
use sysinfo::{Components, CpuRefreshKind, MemoryRefreshKind, Networks, RefreshKind, System};

pub struct PerformanceProbe {
    platform: Arc<dyn Platform>,
    window: Duration,
}

impl PerformanceProbe {
    pub fn new(platform: Arc<dyn Platform>, window: Duration) -> Self {
        Self { platform, window }
    }
}

impl Probe for PerformanceProbe {
    type Record = PerformanceInfo;

    fn collect(self) -> ProbeOutcome<PerformanceInfo> {
        let window = self.window.max(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL);

        let mut sys = System::new_with_specifics(
            RefreshKind::nothing()
                .with_cpu(CpuRefreshKind::nothing().with_cpu_usage())
                .with_memory(MemoryRefreshKind::nothing().with_ram()),
        );
        let mut networks = Networks::new_with_refreshed_list();
        let net_before = NetCounters::read(&networks);
        let disk_before = self.platform.disk_counters();

        std::thread::sleep(window);

        sys.refresh_cpu_usage();
        networks.refresh(true);
        let net_delta = net_before.delta(&NetCounters::read(&networks));
        let disk_after = self.platform.disk_counters();
        let components = Components::new_with_refreshed_list();

        let mut fields = FieldCollector::new();
        let cpu_usage_percent = Some(f64::from(sys.global_cpu_usage()));
        let memory_usage_percent = fields.field(
            "memory_usage_percent",
            percent(sys.used_memory(), sys.total_memory()).ok_or("memória total desconhecida"),
        );
        let disk_io = fields
            .field("disk_io", disk_rates(disk_before, disk_after, window))
            .unwrap_or_default();
        let network_io = NetworkIo {
            bytes_sent_per_sec: Some(per_second(net_delta.sent, window)),
            bytes_recv_per_sec: Some(per_second(net_delta.recv, window)),
            packets_sent_per_sec: Some(per_second(net_delta.packets_sent, window)),
            packets_recv_per_sec: Some(per_second(net_delta.packets_recv, window)),
        };
        let load_average = fields.field("load_average", load_average()).unwrap_or_default();
        let temperatures = self.temperatures(&components);

        fields.finish(PerformanceInfo {
            cpu_usage_percent,
            memory_usage_percent,
            disk_io,
            network_io,
            load_average,
            temperatures,
        })
    }
}

impl PerformanceProbe {
    fn temperatures(&self, components: &Components) -> Temperatures {
        // Sem sensor de GPU no sysinfo (Windows): NVML via plataforma
        let gpu_celsius = max_temperature(components, GPU_SENSOR_LABELS).or_else(|| {
            self.platform.gpus().ok().and_then(|gpus| {
                gpus.iter()
                    .filter_map(|g| g.temperature_celsius)
                    .reduce(f64::max)
            })
        });

        let mut disks: Vec<f64> = components
            .iter()
            .filter(|c| {
                let label = c.label().to_lowercase();
                DISK_SENSOR_LABELS.iter().any(|l| label.contains(l))
            })
            .filter_map(|c| c.temperature())
            .filter(|t| *t > 0.0 && *t < 150.0)
            .map(f64::from)
            .collect();
        disks.sort_by(f64::total_cmp);

        Temperatures {
            cpu_celsius: max_temperature(components, CPU_SENSOR_LABELS),
            gpu_celsius,
            disk_celsius: (!disks.is_empty()).then_some(disks),
        }
    }
}

fn disk_rates(
    before: Result<DiskCounters, PlatformError>,
    after: Result<DiskCounters, PlatformError>,
    window: Duration,
) -> Result<DiskIo, PlatformError> {
    let (before, after) = (before?, after?);
    Ok(DiskIo {
        read_bytes_per_sec: Some(per_second(after.read_bytes.saturating_sub(before.read_bytes), window)),
        write_bytes_per_sec: Some(per_second(after.write_bytes.saturating_sub(before.write_bytes), window)),
        read_ops_per_sec: Some(per_second(after.read_ops.saturating_sub(before.read_ops), window)),
        write_ops_per_sec: Some(per_second(after.write_ops.saturating_sub(before.write_ops), window)),
    })
}

/// Windows não tem load average; sysinfo devolve zeros lá.
fn load_average() -> Result<LoadAverage, PlatformError> {
    if cfg!(windows) {
        return Err(PlatformError::Unsupported("Load average"));
    }
    let load = System::load_average();
    Ok(LoadAverage {
        one: Some(load.one),
        five: Some(load.five),
        fifteen: Some(load.fifteen),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::UnsupportedPlatform;

    #[test]
    fn disk_rates_from_counter_delta() {
        let before = DiskCounters {
            read_bytes: 1_000,
            write_bytes: 2_000,
            read_ops: 10,
            write_ops: 20,
        };
        let after = DiskCounters {
            read_bytes: 3_000,
            write_bytes: 2_000,
            read_ops: 14,
            write_ops: 21,
        };
        let io = disk_rates(Ok(before), Ok(after), Duration::from_secs(2)).unwrap();
        assert_eq!(io.read_bytes_per_sec, Some(1_000));
        assert_eq!(io.write_bytes_per_sec, Some(0));
        assert_eq!(io.read_ops_per_sec, Some(2));
        assert_eq!(io.write_ops_per_sec, Some(1));
    }

    #[test]
    fn disk_rates_need_both_readings() {
        let err = disk_rates(
            Err(PlatformError::Unsupported("I/O de disco")),
            Ok(DiskCounters::default()),
            Duration::from_secs(1),
        );
        assert!(err.is_err());
    }

    #[test]
    fn missing_disk_counters_leave_rest_of_record() {
        let probe = PerformanceProbe::new(Arc::new(UnsupportedPlatform), Duration::from_millis(250));
        let (record, status) = probe.collect().into_parts();
        assert_eq!(record.disk_io, DiskIo::default());
        assert!(record.cpu_usage_percent.is_some());
        assert!(record.network_io.bytes_recv_per_sec.is_some());
        let inventory_core::probe::ProbeStatus::Partial(errors) = status else {
            panic!("esperado Partial");
        };
        assert!(errors.iter().any(|e| e.field == "disk_io"));
    }
}
