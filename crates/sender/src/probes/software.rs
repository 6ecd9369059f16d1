//! Sonda de software: SO, kernel, aplicativos, processos e serviços.

use crate::platform::Platform;
use inventory_core::types::{OsInfo, ProcessInfo, SoftwareInfo};
use inventory_core::{FieldCollector, Probe, ProbeOutcome};
use std::sync::Arc;
use sysinfo::{ProcessRefreshKind, ProcessesToUpdate, RefreshKind, System};

pub struct SoftwareProbe {
    platform: Arc<dyn Platform>,
}

impl SoftwareProbe {
    pub fn new(platform: Arc<dyn Platform>) -> Self {
        Self { platform }
    }
}

impl Probe for SoftwareProbe {
    type Record = SoftwareInfo;

    fn collect(self) -> ProbeOutcome<SoftwareInfo> {
        let mut fields = FieldCollector::new();

        let os = fields.field("os", os_info()).unwrap_or_default();
        let kernel = fields.field("kernel", System::kernel_version().ok_or("versão do kernel indisponível"));
        let installed_apps = fields.field(
            "installed_apps",
            self.platform.installed_apps().map(|mut apps| {
                apps.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.version.cmp(&b.version)));
                apps
            }),
        );
        let running_processes = fields.field::<_, String>("running_processes", Ok(processes()));
        let system_services = fields.field(
            "system_services",
            self.platform.services().map(|mut services| {
                services.sort_by(|a, b| a.name.cmp(&b.name));
                services
            }),
        );

        fields.finish(SoftwareInfo {
            os,
            kernel,
            installed_apps,
            running_processes,
            system_services,
        })
    }
}

fn os_info() -> Result<OsInfo, String> {
    let name = System::name().ok_or("nome do sistema indisponível")?;
    Ok(OsInfo {
        name: Some(name),
        version: System::os_version(),
        architecture: Some(std::env::consts::ARCH.to_string()),
        hostname: System::host_name(),
    })
}

/// Processos vivos, ordenados por PID. CPU% exige duas leituras.
fn processes() -> Vec<ProcessInfo> {
    let kind = ProcessRefreshKind::nothing().with_cpu().with_memory();
    let mut sys = System::new_with_specifics(RefreshKind::nothing().with_processes(kind));
    std::thread::sleep(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL);
    sys.refresh_processes_specifics(ProcessesToUpdate::All, true, kind);

    let mut list: Vec<ProcessInfo> = sys
        .processes()
        .iter()
        .map(|(pid, p)| ProcessInfo {
            name: p.name().to_string_lossy().into_owned(),
            pid: pid.as_u32(),
            cpu_usage_percent: Some(f64::from(p.cpu_usage())),
            memory_bytes: Some(p.memory()),
        })
        .collect();
    list.sort_by_key(|p| p.pid);
    list
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::UnsupportedPlatform;

    #[test]
    fn own_process_is_listed() {
        let me = std::process::id();
        assert!(processes().iter().any(|p| p.pid == me));
    }

    #[test]
    fn processes_are_sorted_by_pid() {
        let list = processes();
        assert!(list.windows(2).all(|w| w[0].pid <= w[1].pid));
    }

    #[test]
    fn platform_failures_become_absent_fields() {
        let outcome = SoftwareProbe::new(Arc::new(UnsupportedPlatform)).collect();
        let ProbeOutcome::Partial { record, errors } = outcome else {
            panic!("esperado Partial");
        };
        assert!(record.installed_apps.is_none());
        assert!(record.system_services.is_none());
        assert!(record.running_processes.is_some());
        let failed: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert!(failed.contains(&"installed_apps"));
        assert!(failed.contains(&"system_services"));
    }
}
