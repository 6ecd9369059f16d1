//! Serialização do snapshot.
//!
//! O receptor não negocia schema: ele espera JSON UTF-8 com os campos numa
//! ordem fixa.
//!
//! ```text
//! capture_time → hardware.* → software.* → network.* → performance.*
//! ```
//!
//! - Ordem dos campos = ordem de declaração das structs em [`crate::types`]
//! - Campos ausentes viram `null` (nunca omitidos)
//! - Indentação de 2 espaços
//! - Números em notação decimal do `serde_json` (determinística)

use crate::types::Snapshot;

/// Erros do protocolo.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("Erro de serialização: {0}")]
    Serialize(String),

    #[error("Erro de deserialização: {0}")]
    Deserialize(String),
}

/// Codifica um [`Snapshot`] nos bytes que serão criptografados.
///
/// Determinística: snapshots iguais produzem bytes idênticos. O caminho de
/// erro só existe porque `serde_json` o expõe; o modelo não tem mapas com
/// chaves não-string, então na prática não falha.
pub fn serialize_snapshot(snapshot: &Snapshot) -> Result<Vec<u8>, ProtocolError> {
    serde_json::to_vec_pretty(snapshot).map_err(|e| ProtocolError::Serialize(e.to_string()))
}

/// Decodifica bytes produzidos por [`serialize_snapshot`].
pub fn parse_snapshot(data: &[u8]) -> Result<Snapshot, ProtocolError> {
    serde_json::from_slice(data).map_err(|e| ProtocolError::Deserialize(e.to_string()))
}

// ──────────────────────────────────────────────
// Testes
// ──────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::*;
    use chrono::{TimeZone, Utc};

    fn sample_snapshot() -> Snapshot {
        Snapshot::new(
            Utc.with_ymd_and_hms(2024, 5, 17, 8, 0, 0).unwrap(),
            HardwareInfo {
                cpu: CpuInfo {
                    model: Some("AMD Ryzen 7 5800X".into()),
                    physical_cores: Some(8),
                    logical_cores: Some(16),
                    frequency_ghz: Some(3.8),
                    temperature_celsius: None,
                    usage_percent: Some(12.5),
                },
                memory: MemoryInfo {
                    total_bytes: Some(34_359_738_368),
                    used_bytes: Some(8_589_934_592),
                    free_bytes: Some(25_769_803_776),
                    usage_percent: Some(25.0),
                },
                ..Default::default()
            },
            SoftwareInfo {
                kernel: Some("6.8.0-31-generic".into()),
                ..Default::default()
            },
            NetworkInfo {
                public_ip: Some("203.0.113.5".into()),
                ..Default::default()
            },
            PerformanceInfo {
                load_average: LoadAverage {
                    one: Some(0.52),
                    five: Some(0.61),
                    fifteen: Some(0.7),
                },
                ..Default::default()
            },
        )
    }

    #[test]
    fn serialization_is_deterministic() {
        let a = sample_snapshot();
        let b = a.clone();
        assert_eq!(serialize_snapshot(&a).unwrap(), serialize_snapshot(&b).unwrap());
    }

    #[test]
    fn top_level_field_order_is_fixed() {
        let bytes = serialize_snapshot(&sample_snapshot()).unwrap();
        let text = String::from_utf8(bytes).unwrap();

        let positions: Vec<usize> = [
            "\"capture_time\"",
            "\"hardware\"",
            "\"software\"",
            "\"network\"",
            "\"performance\"",
        ]
        .iter()
        .map(|k| text.find(k).expect("campo ausente na saída"))
        .collect();

        assert!(positions.windows(2).all(|w| w[0] < w[1]), "ordem: {positions:?}");
    }

    #[test]
    fn absent_fields_are_emitted_as_null() {
        let text = String::from_utf8(serialize_snapshot(&sample_snapshot()).unwrap()).unwrap();
        assert!(text.contains("\"temperature_celsius\": null"));
        assert!(text.contains("\"gpus\": null"));
        assert!(text.contains("\"installed_apps\": null"));
    }

    /// Sequência de chaves na ordem em que aparecem nos bytes, com a
    /// indentação como marca de profundidade.
    fn key_sequence(bytes: &[u8]) -> Vec<String> {
        std::str::from_utf8(bytes)
            .unwrap()
            .lines()
            .filter_map(|line| {
                let depth = line.len() - line.trim_start().len();
                let key = line.trim_start().strip_prefix('"')?.split_once("\": ")?.0;
                Some(format!("{depth}:{key}"))
            })
            .collect()
    }

    #[test]
    fn field_positions_stable_across_failure_patterns() {
        let full = sample_snapshot();
        let full_keys = key_sequence(&serialize_snapshot(&full).unwrap());

        let degraded_hardware = Snapshot::new(
            full.capture_time(),
            HardwareInfo::default(),
            full.software().clone(),
            full.network().clone(),
            full.performance().clone(),
        );
        let all_failed = Snapshot::new(
            full.capture_time(),
            HardwareInfo::default(),
            SoftwareInfo::default(),
            NetworkInfo::default(),
            PerformanceInfo::default(),
        );

        assert!(full_keys.contains(&"6:model".to_string()));
        assert!(full_keys.contains(&"6:fifteen".to_string()));
        for degraded in [degraded_hardware, all_failed] {
            assert_eq!(key_sequence(&serialize_snapshot(&degraded).unwrap()), full_keys);
        }
    }

    #[test]
    fn parse_restores_serialized_snapshot() {
        let original = sample_snapshot();
        let bytes = serialize_snapshot(&original).unwrap();
        assert_eq!(parse_snapshot(&bytes).unwrap(), original);
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(matches!(
            parse_snapshot(b"not json"),
            Err(ProtocolError::Deserialize(_))
        ));
    }
}
