//! Telemetria de GPU NVIDIA via NVML (nvidia-ml).
//!
//! Carrega `nvml.dll` dinamicamente, funciona com qualquer driver NVIDIA.
//! Sem GPU NVIDIA? `try_new()` retorna `None` e as GPUs ficam só com os dados do WMI.

use inventory_core::types::GpuInfo;
use nvml_wrapper::Nvml;
use nvml_wrapper::enum_wrappers::device::TemperatureSensor;
use tracing::debug;

/// Sessão NVML.
pub struct NvmlMonitor {
    nvml: Nvml,
}

impl NvmlMonitor {
    /// Tenta inicializar NVML. Retorna `None` se não houver GPU NVIDIA.
    pub fn try_new() -> Option<Self> {
        match Nvml::init() {
            Ok(nvml) => {
                let count = nvml.device_count().unwrap_or(0);
                if count > 0 {
                    debug!("NVML: {count} GPU(s) NVIDIA");
                    Some(Self { nvml })
                } else {
                    debug!("NVML init OK mas nenhuma GPU encontrada");
                    None
                }
            }
            Err(e) => {
                debug!("NVML não disponível: {e}");
                None
            }
        }
    }

    /// Completa as GPUs NVIDIA da lista do WMI com temperatura, carga e VRAM.
    ///
    /// A n-ésima GPU NVIDIA do WMI corresponde ao índice NVML n.
    pub fn enrich(&self, gpus: &mut [GpuInfo]) {
        let nvidia = gpus.iter_mut().filter(|g| {
            g.vendor
                .as_deref()
                .is_some_and(|v| v.to_ascii_lowercase().contains("nvidia"))
        });

        for (index, gpu) in (0u32..).zip(nvidia) {
            let Ok(device) = self.nvml.device_by_index(index) else {
                break;
            };

            if let Ok(temp) = device.temperature(TemperatureSensor::Gpu) {
                gpu.temperature_celsius = Some(f64::from(temp));
            }
            if let Ok(util) = device.utilization_rates() {
                gpu.usage_percent = Some(f64::from(util.gpu));
            }
            // AdapterRAM do WMI satura em 4 GB; NVML tem o valor real
            if let Ok(mem) = device.memory_info() {
                gpu.memory_bytes = Some(mem.total);
            }
        }
    }
}
