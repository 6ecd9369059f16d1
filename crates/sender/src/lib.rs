//! # Inventory Sender
//!
//! Sondas do host, transporte HTTP e o pipeline de uma execução do agente.
//!
//! ## Módulos
//! - [`platform`] – Consultas específicas do SO (Linux, Windows)
//! - [`probes`] – Sondas de hardware, software, rede e performance
//! - [`transport`] – POST do envelope ao coletor
//! - [`run`] – Pipeline completo e erros fatais

pub mod platform;
pub mod probes;
pub mod run;
pub mod transport;

#[cfg(windows)]
pub(crate) mod nvml_gpu;
#[cfg(windows)]
pub(crate) mod wmi_sensors;

pub use run::{RunError, RunSummary, run, run_pipeline};
pub use transport::{HttpTransport, Transport, TransportError};
