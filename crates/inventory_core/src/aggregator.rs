//! Agregador de snapshot.
//!
//! Dispara as quatro sondas, espera cada uma até o prazo configurado e monta
//! um único [`Snapshot`]. Nunca falha: qualquer problema de domínio vira campo
//! ausente (ou registro valor-zero) e fica registrado no
//! [`AggregationReport`].
//!
//! Cada sonda roda numa thread própria. Se o prazo estoura, a thread é
//! abandonada (continua até terminar, mas o resultado é descartado).

use crate::probe::{Domain, Probe, ProbeError, ProbeOutcome, ProbeStatus};
use crate::types::{HardwareInfo, NetworkInfo, PerformanceInfo, Snapshot, SoftwareInfo};
use chrono::Utc;
use crossbeam_channel::{Receiver, RecvTimeoutError, bounded};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// As quatro sondas de uma execução.
pub struct ProbeSet<H, S, N, P> {
    pub hardware: H,
    pub software: S,
    pub network: N,
    pub performance: P,
}

/// Diagnóstico de uma sonda.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeDiagnostic {
    pub domain: Domain,
    pub status: ProbeStatus,
    pub elapsed: Duration,
}

/// Relatório de uma agregação.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregationReport {
    pub diagnostics: Vec<ProbeDiagnostic>,
}

impl AggregationReport {
    /// `true` se todas as sondas vieram completas.
    pub fn is_clean(&self) -> bool {
        self.diagnostics
            .iter()
            .all(|d| d.status == ProbeStatus::Complete)
    }

    pub fn get(&self, domain: Domain) -> Option<&ProbeDiagnostic> {
        self.diagnostics.iter().find(|d| d.domain == domain)
    }
}

/// Agregador com prazo opcional por sonda.
#[derive(Debug, Clone, Copy, Default)]
pub struct Aggregator {
    deadline: Option<Duration>,
}

impl Aggregator {
    /// `None` espera indefinidamente por cada sonda.
    pub fn new(deadline: Option<Duration>) -> Self {
        Self { deadline }
    }

    pub fn deadline(&self) -> Option<Duration> {
        self.deadline
    }

    /// Coleta tudo e retorna o snapshot.
    pub fn aggregate<H, S, N, P>(&self, probes: ProbeSet<H, S, N, P>) -> Snapshot
    where
        H: Probe<Record = HardwareInfo>,
        S: Probe<Record = SoftwareInfo>,
        N: Probe<Record = NetworkInfo>,
        P: Probe<Record = PerformanceInfo>,
    {
        self.aggregate_with_report(probes).0
    }

    /// Igual a [`Aggregator::aggregate`], devolvendo também o diagnóstico por sonda.
    pub fn aggregate_with_report<H, S, N, P>(
        &self,
        probes: ProbeSet<H, S, N, P>,
    ) -> (Snapshot, AggregationReport)
    where
        H: Probe<Record = HardwareInfo>,
        S: Probe<Record = SoftwareInfo>,
        N: Probe<Record = NetworkInfo>,
        P: Probe<Record = PerformanceInfo>,
    {
        let capture_time = Utc::now();
        let started = Instant::now();
        let deadline_at = self.deadline.map(|d| started + d);

        let hardware = spawn_probe(Domain::Hardware, probes.hardware);
        let software = spawn_probe(Domain::Software, probes.software);
        let network = spawn_probe(Domain::Network, probes.network);
        let performance = spawn_probe(Domain::Performance, probes.performance);

        let mut report = AggregationReport::default();
        let hardware = self.settle(hardware, started, deadline_at, &mut report);
        let software = self.settle(software, started, deadline_at, &mut report);
        let network = self.settle(network, started, deadline_at, &mut report);
        let performance = self.settle(performance, started, deadline_at, &mut report);

        info!(
            "Snapshot agregado em {:.2}s ({} de 4 domínios completos)",
            started.elapsed().as_secs_f64(),
            report
                .diagnostics
                .iter()
                .filter(|d| d.status == ProbeStatus::Complete)
                .count()
        );

        let snapshot = Snapshot::new(capture_time, hardware, software, network, performance);
        (snapshot, report)
    }

    /// Espera uma sonda, aplica a política de absorção e registra o diagnóstico.
    fn settle<R: Default>(
        &self,
        pending: Pending<R>,
        started: Instant,
        deadline_at: Option<Instant>,
        report: &mut AggregationReport,
    ) -> R {
        let domain = pending.domain;
        let outcome = match pending.rx {
            Err(e) => ProbeOutcome::Failed(e),
            Ok(rx) => match deadline_at {
                None => rx.recv().unwrap_or(ProbeOutcome::Failed(ProbeError::Panicked)),
                Some(at) => {
                    let remaining = at.saturating_duration_since(Instant::now());
                    match rx.recv_timeout(remaining) {
                        Ok(outcome) => outcome,
                        Err(RecvTimeoutError::Timeout) => ProbeOutcome::Failed(
                            ProbeError::DeadlineExceeded(self.deadline.unwrap_or_default()),
                        ),
                        Err(RecvTimeoutError::Disconnected) => {
                            ProbeOutcome::Failed(ProbeError::Panicked)
                        }
                    }
                }
            },
        };

        let (record, status) = outcome.into_parts();
        match &status {
            ProbeStatus::Complete => debug!("Sonda {domain}: completa"),
            ProbeStatus::Partial(errors) => {
                for e in errors {
                    warn!("Sonda {domain}: campo ausente – {e}");
                }
            }
            ProbeStatus::Failed(e) => {
                warn!("Sonda {domain} falhou, registro substituído por valores ausentes: {e}")
            }
        }

        report.diagnostics.push(ProbeDiagnostic {
            domain,
            status,
            elapsed: started.elapsed(),
        });
        record
    }
}

/// Sonda em andamento.
struct Pending<R> {
    domain: Domain,
    rx: Result<Receiver<ProbeOutcome<R>>, ProbeError>,
}

fn spawn_probe<P: Probe>(domain: Domain, probe: P) -> Pending<P::Record> {
    let (tx, rx) = bounded::<ProbeOutcome<P::Record>>(1);

    let spawned = std::thread::Builder::new()
        .name(format!("probe-{domain}"))
        .spawn(move || {
            // Se o agregador já desistiu (prazo), o envio falha e é ignorado.
            let _ = tx.send(probe.collect());
        });

    Pending {
        domain,
        rx: spawned
            .map(|_| rx)
            .map_err(|e| ProbeError::Unavailable(format!("falha ao criar thread: {e}"))),
    }
}

// ──────────────────────────────────────────────
// Testes
// ──────────────────────────────────────────────
