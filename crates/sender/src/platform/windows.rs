//! Implementação Windows: WMI + NVML + `netstat`.

use super::netstat::parse_netstat_tcp;
use super::{DiskCounters, Platform, PlatformError, run_command};
use crate::nvml_gpu::NvmlMonitor;
use crate::wmi_sensors;
use inventory_core::types::{
    BiosInfo, ConnectionInfo, DnsConfig, GpuInfo, InstalledApp, Motherboard, RemovableDevice,
    RouteEntry, ServiceInfo,
};

#[derive(Debug, Default)]
pub struct WindowsPlatform;

impl WindowsPlatform {
    pub fn new() -> Self {
        Self
    }
}

impl Platform for WindowsPlatform {
    fn name(&self) -> &'static str {
        "windows"
    }

    fn installed_apps(&self) -> Result<Vec<InstalledApp>, PlatformError> {
        wmi_sensors::query_installed_apps(&wmi_sensors::connect()?)
    }

    fn services(&self) -> Result<Vec<ServiceInfo>, PlatformError> {
        wmi_sensors::query_services(&wmi_sensors::connect()?)
    }

    fn motherboard(&self) -> Result<Motherboard, PlatformError> {
        wmi_sensors::query_motherboard(&wmi_sensors::connect()?)
    }

    fn bios(&self) -> Result<BiosInfo, PlatformError> {
        wmi_sensors::query_bios(&wmi_sensors::connect()?)
    }

    fn removable_devices(&self) -> Result<Vec<RemovableDevice>, PlatformError> {
        wmi_sensors::query_removable_devices(&wmi_sensors::connect()?)
    }

    fn gpus(&self) -> Result<Vec<GpuInfo>, PlatformError> {
        let mut gpus = wmi_sensors::query_gpus(&wmi_sensors::connect()?)?;
        if let Some(nvml) = NvmlMonitor::try_new() {
            nvml.enrich(&mut gpus);
        }
        Ok(gpus)
    }

    fn tcp_connections(&self) -> Result<Vec<ConnectionInfo>, PlatformError> {
        let out = run_command("netstat", &["-ano", "-p", "TCP"])?;
        Ok(parse_netstat_tcp(&out))
    }

    fn routing_table(&self) -> Result<Vec<RouteEntry>, PlatformError> {
        wmi_sensors::query_routes(&wmi_sensors::connect()?)
    }

    fn dns_config(&self) -> Result<DnsConfig, PlatformError> {
        wmi_sensors::query_dns(&wmi_sensors::connect()?)
    }

    fn disk_counters(&self) -> Result<DiskCounters, PlatformError> {
        wmi_sensors::query_disk_counters(&wmi_sensors::connect()?)
    }
}
