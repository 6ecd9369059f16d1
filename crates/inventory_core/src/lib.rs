//! # Inventory Core
//!
//! Crate compartilhada do Inventário: modelo do snapshot, contrato das
//! sondas, agregação tolerante a falhas, serialização JSON determinística,
//! criptografia AES-CFB do payload e configuração plana.
//!
//! ## Módulos
//! - [`types`] – Registros de hardware, software, rede e performance
//! - [`probe`] – Contrato das sondas e resultados estruturados
//! - [`aggregator`] – Monta o [`Snapshot`] com prazo por sonda
//! - [`protocol`] – Serialização do snapshot
//! - [`crypto`] – Envelope `IV || AES-CFB` em base64 URL-safe
//! - [`config`](crate::config) – Configuração `chave = valor`
//!
//! ## Pipeline
//! ```text
//! sondas → Aggregator → serialize_snapshot → encrypt → transporte
//! ```

pub mod types;
pub mod probe;
pub mod aggregator;
pub mod protocol;
pub mod crypto;
pub mod config;

// Re-exports convenientes
pub use types::Snapshot;
pub use probe::{Domain, FieldCollector, Probe, ProbeError, ProbeOutcome};
pub use aggregator::{AggregationReport, Aggregator, ProbeSet};
pub use protocol::{serialize_snapshot, ProtocolError};
pub use crypto::{encrypt, encrypt_with_key, CryptoError, EncryptionKey};
pub use crate::config::{AgentConfig, ConfigError};
