//! Contrato das sondas de domínio.
//!
//! Uma sonda nunca propaga erro para cima: devolve um [`ProbeOutcome`] que diz
//! se o registro veio completo, parcial (com a lista de campos que falharam)
//! ou se a sonda inteira falhou. A política de absorção fica toda no
//! agregador.

use std::fmt;
use std::time::Duration;
use tracing::debug;

/// Domínio coberto por uma sonda.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Domain {
    Hardware,
    Software,
    Network,
    Performance,
}

impl Domain {
    pub fn as_str(self) -> &'static str {
        match self {
            Domain::Hardware => "hardware",
            Domain::Software => "software",
            Domain::Network => "network",
            Domain::Performance => "performance",
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Falha de um campo individual dentro de um registro.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldError {
    pub field: &'static str,
    pub reason: String,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.reason)
    }
}

/// Falha da sonda inteira.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProbeError {
    #[error("Sonda indisponível: {0}")]
    Unavailable(String),

    #[error("Prazo de {0:?} excedido")]
    DeadlineExceeded(Duration),

    #[error("Sonda abortou (panic)")]
    Panicked,
}

/// Resultado de uma coleta.
#[derive(Debug, Clone, PartialEq)]
pub enum ProbeOutcome<R> {
    Complete(R),
    Partial { record: R, errors: Vec<FieldError> },
    Failed(ProbeError),
}

/// Resumo do que aconteceu com uma sonda, sem o registro.
#[derive(Debug, Clone, PartialEq)]
pub enum ProbeStatus {
    Complete,
    Partial(Vec<FieldError>),
    Failed(ProbeError),
}

impl<R: Default> ProbeOutcome<R> {
    /// Separa registro e status. `Failed` vira o registro valor-zero.
    pub fn into_parts(self) -> (R, ProbeStatus) {
        match self {
            ProbeOutcome::Complete(record) => (record, ProbeStatus::Complete),
            ProbeOutcome::Partial { record, errors } => (record, ProbeStatus::Partial(errors)),
            ProbeOutcome::Failed(err) => (R::default(), ProbeStatus::Failed(err)),
        }
    }
}

/// Fonte de dados de um domínio.
///
/// `collect` consome a sonda para que ela possa ser movida para a thread de
/// coleta; estado como `sysinfo::System` vive dentro dela.
pub trait Probe: Send + 'static {
    type Record: Default + Send + 'static;

    fn collect(self) -> ProbeOutcome<Self::Record>;
}

/// Adapta uma closure como [`Probe`] (fixtures, testes).
pub struct FnProbe<F>(pub F);

impl<F, R> Probe for FnProbe<F>
where
    F: FnOnce() -> ProbeOutcome<R> + Send + 'static,
    R: Default + Send + 'static,
{
    type Record = R;

    fn collect(self) -> ProbeOutcome<R> {
        (self.0)()
    }
}

/// Acumula resultados campo a campo e monta o [`ProbeOutcome`] final.
///
/// ```
/// use inventory_core::probe::{FieldCollector, ProbeOutcome};
///
/// let mut fields = FieldCollector::new();
/// let kernel = fields.field("kernel", Ok::<_, String>("6.8.0".to_string()));
/// let apps: Option<Vec<String>> = fields.field("installed_apps", Err("dpkg ausente"));
/// let outcome = fields.finish((kernel, apps));
/// assert!(matches!(outcome, ProbeOutcome::Partial { .. }));
/// ```
#[derive(Debug, Default)]
pub struct FieldCollector {
    errors: Vec<FieldError>,
}

impl FieldCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Converte o resultado de um campo em `Option`, registrando o erro.
    pub fn field<T, E: fmt::Display>(&mut self, field: &'static str, result: Result<T, E>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                debug!("Campo {field} ausente: {e}");
                self.errors.push(FieldError {
                    field,
                    reason: e.to_string(),
                });
                None
            }
        }
    }

    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    pub fn finish<R>(self, record: R) -> ProbeOutcome<R> {
        if self.errors.is_empty() {
            ProbeOutcome::Complete(record)
        } else {
            ProbeOutcome::Partial {
                record,
                errors: self.errors,
            }
        }
    }
}

// ──────────────────────────────────────────────
// Testes
// ──────────────────────────────────────────────
