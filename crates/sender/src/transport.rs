//! Entrega do payload criptografado ao coletor.
//!
//! Uma única tentativa, sem retry. Só `200 OK` conta como entregue.

use std::time::Duration;
use tracing::{debug, info};

/// Erros de entrega.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Falha na requisição: {0}")]
    Request(String),

    #[error("Servidor respondeu com status {0}")]
    Status(u16),
}

/// Canal de entrega do payload.
pub trait Transport {
    fn deliver(&self, address: &str, payload: &str) -> Result<(), TransportError>;
}

/// POST `text/plain` via reqwest (bloqueante).
pub struct HttpTransport {
    client: reqwest::blocking::Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Request(e.to_string()))?;
        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    fn deliver(&self, address: &str, payload: &str) -> Result<(), TransportError> {
        debug!("POST {address} ({} bytes)", payload.len());
        let response = self
            .client
            .post(address)
            .header(reqwest::header::CONTENT_TYPE, "text/plain")
            .body(payload.to_owned())
            .send()
            .map_err(|e| TransportError::Request(e.to_string()))?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(TransportError::Status(status.as_u16()));
        }

        info!("Payload entregue a {address}");
        Ok(())
    }
}

// ──────────────────────────────────────────────
// Testes
// ──────────────────────────────────────────────
