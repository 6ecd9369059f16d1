//! Configuração do agente.
//!
//! Formato plano `chave = valor`, compatível com o `config.ini` do agente
//! antigo:
//!
//! ```ini
//! ; comentário
//! # comentário
//! server_address = https://coletor.exemplo/api/inventario
//! encryption_key = 000102030405060708090a0b0c0d0e0f
//! ```
//!
//! Seções (`[nome]`) são ignoradas; linhas sem `=` também. Chave repetida:
//! vale a última.

use crate::crypto::{CryptoError, EncryptionKey};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

/// Nome padrão do arquivo de configuração.
pub const DEFAULT_CONFIG_FILE: &str = "config.ini";

/// Timeout de cada tentativa de conexão na medição de latência.
pub const LATENCY_CONNECT_TIMEOUT: Duration = Duration::from_secs(2);

/// Erros de configuração. Todos são fatais antes de qualquer coleta.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Erro ao ler {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Chave obrigatória ausente: {0}")]
    MissingKey(&'static str),

    #[error("Valor inválido para {key}: {reason}")]
    InvalidValue { key: &'static str, reason: String },

    #[error("Erro ao interpretar a configuração: {0}")]
    Format(#[from] ::config::ConfigError),

    #[error("encryption_key inválida: {0}")]
    InvalidKey(#[from] CryptoError),
}

/// Configuração do agente.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// URL do coletor (POST)
    pub server_address: String,
    /// Chave AES em hexadecimal (16, 24 ou 32 bytes)
    pub encryption_key: String,
    /// Prazo por sonda em segundos (0 = sem prazo)
    pub probe_timeout_secs: f64,
    /// Timeout do POST em segundos
    pub request_timeout_secs: f64,
    /// Serviço que devolve o IP público em texto puro
    pub public_ip_url: String,
    /// Timeout do GET no serviço de IP público em segundos
    pub public_ip_timeout_secs: f64,
    /// Destino `host:porta` para medir latência/perda via TCP
    pub latency_target: String,
    /// Número de tentativas de conexão para latência/perda
    pub latency_samples: u32,
    /// Janela de amostragem para taxas (rede, disco, CPU) em ms
    pub sample_window_ms: u64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            server_address: String::new(),
            encryption_key: String::new(),
            probe_timeout_secs: 30.0,
            request_timeout_secs: 30.0,
            public_ip_url: "https://api.ipify.org".into(),
            public_ip_timeout_secs: 5.0,
            latency_target: "8.8.8.8:53".into(),
            latency_samples: 4,
            sample_window_ms: 1000,
        }
    }
}

impl AgentConfig {
    /// Carrega e valida configuração de um arquivo.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::parse(&content)?;
        info!("Configuração carregada de {}", path.display());
        Ok(config)
    }

    /// Interpreta o conteúdo de um arquivo de configuração.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        Self::from_map(&parse_flat(content))
    }

    /// Monta a configuração a partir do mapa plano.
    ///
    /// Chaves ausentes ficam com o valor de [`AgentConfig::default`]; o
    /// crate `config` converte os textos para os tipos numéricos.
    pub fn from_map(map: &BTreeMap<String, String>) -> Result<Self, ConfigError> {
        let config: Self = ::config::Config::builder()
            .add_source(FlatSource(map.clone()))
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Valida chaves obrigatórias, faixas e a chave de criptografia.
    ///
    /// A chave é validada aqui para abortar antes de qualquer sonda rodar.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server_address.is_empty() {
            return Err(ConfigError::MissingKey("server_address"));
        }
        if self.encryption_key.is_empty() {
            return Err(ConfigError::MissingKey("encryption_key"));
        }
        EncryptionKey::from_hex(&self.encryption_key)?;

        if !(self.probe_timeout_secs >= 0.0 && self.probe_timeout_secs.is_finite()) {
            return Err(ConfigError::InvalidValue {
                key: "probe_timeout_secs",
                reason: format!("{} (esperado >= 0)", self.probe_timeout_secs),
            });
        }
        if !(self.request_timeout_secs > 0.0 && self.request_timeout_secs.is_finite()) {
            return Err(ConfigError::InvalidValue {
                key: "request_timeout_secs",
                reason: format!("{} (esperado > 0)", self.request_timeout_secs),
            });
        }
        if !(self.public_ip_timeout_secs > 0.0 && self.public_ip_timeout_secs.is_finite()) {
            return Err(ConfigError::InvalidValue {
                key: "public_ip_timeout_secs",
                reason: format!("{} (esperado > 0)", self.public_ip_timeout_secs),
            });
        }
        if self.latency_samples == 0 {
            return Err(ConfigError::InvalidValue {
                key: "latency_samples",
                reason: "deve ser pelo menos 1".into(),
            });
        }
        if self.sample_window_ms == 0 || self.sample_window_ms > 60_000 {
            return Err(ConfigError::InvalidValue {
                key: "sample_window_ms",
                reason: format!("{} (1–60000)", self.sample_window_ms),
            });
        }

        // A sonda de rede precisa terminar antes do prazo, senão o registro
        // inteiro vira o valor-zero
        if let Some(deadline) = self.probe_deadline() {
            let budget = self.network_budget();
            if budget >= deadline {
                return Err(ConfigError::InvalidValue {
                    key: "probe_timeout_secs",
                    reason: format!(
                        "{:.1}s não cobre a medição de rede ({:.1}s)",
                        deadline.as_secs_f64(),
                        budget.as_secs_f64()
                    ),
                });
            }
        }

        Ok(())
    }

    /// Prazo por sonda, `None` se desativado.
    pub fn probe_deadline(&self) -> Option<Duration> {
        (self.probe_timeout_secs > 0.0).then(|| Duration::from_secs_f64(self.probe_timeout_secs))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.request_timeout_secs)
    }

    pub fn public_ip_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.public_ip_timeout_secs)
    }

    pub fn sample_window(&self) -> Duration {
        Duration::from_millis(self.sample_window_ms)
    }

    /// Pior caso das etapas bloqueantes da sonda de rede: GET do IP
    /// público, tentativas de conexão e janela de amostragem.
    pub fn network_budget(&self) -> Duration {
        self.public_ip_timeout() + LATENCY_CONNECT_TIMEOUT * self.latency_samples + self.sample_window()
    }

    /// Caminho padrão: `config.ini` no diretório atual.
    pub fn default_path() -> PathBuf {
        PathBuf::from(DEFAULT_CONFIG_FILE)
    }
}

/// Lê linhas `chave = valor` em um mapa.
pub fn parse_flat(content: &str) -> BTreeMap<String, String> {
    let mut map = BTreeMap::new();

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with(';') || line.starts_with('#') || line.starts_with('[') {
            continue;
        }

        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        map.insert(key.trim().to_string(), value.trim().to_string());
    }

    map
}

/// Fonte do crate `config` sobre o mapa plano (sem seções).
#[derive(Debug, Clone)]
struct FlatSource(BTreeMap<String, String>);

impl ::config::Source for FlatSource {
    fn clone_into_box(&self) -> Box<dyn ::config::Source + Send + Sync> {
        Box::new(self.clone())
    }

    fn collect(&self) -> Result<::config::Map<String, ::config::Value>, ::config::ConfigError> {
        let origin = DEFAULT_CONFIG_FILE.to_string();
        Ok(self
            .0
            .iter()
            .map(|(k, v)| (k.clone(), ::config::Value::new(Some(&origin), v.clone())))
            .collect())
    }
}

// ──────────────────────────────────────────────
// Testes
// ──────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &str = "000102030405060708090a0b0c0d0e0f";

    #[test]
    fn parses_comments_blank_lines_and_sections() {
        let content = format!(
            "; comentário\n# outro\n\n[agente]\nserver_address = http://127.0.0.1:9000/inv \nencryption_key={KEY}\nlinha sem igual\n"
        );
        let map = parse_flat(&content);
        assert_eq!(map.len(), 2);
        assert_eq!(map["server_address"], "http://127.0.0.1:9000/inv");
        assert_eq!(map["encryption_key"], KEY);
    }

    #[test]
    fn value_may_contain_equals_sign() {
        let map = parse_flat("server_address = http://h/api?token=abc\n");
        assert_eq!(map["server_address"], "http://h/api?token=abc");
    }

    #[test]
    fn last_duplicate_wins() {
        let map = parse_flat("a = 1\na = 2\n");
        assert_eq!(map["a"], "2");
    }

    #[test]
    fn minimal_config_uses_defaults() {
        let config =
            AgentConfig::parse(&format!("server_address = http://x\nencryption_key = {KEY}\n"))
                .unwrap();
        assert_eq!(config.server_address, "http://x");
        assert_eq!(config.probe_deadline(), Some(Duration::from_secs(30)));
        assert_eq!(config.latency_samples, 4);
        assert_eq!(config.public_ip_url, "https://api.ipify.org");
    }

    #[test]
    fn missing_server_address_is_fatal() {
        let err = AgentConfig::parse(&format!("encryption_key = {KEY}\n")).unwrap_err();
        assert!(matches!(err, ConfigError::MissingKey("server_address")));
    }

    #[test]
    fn missing_encryption_key_is_fatal() {
        let err = AgentConfig::parse("server_address = http://x\n").unwrap_err();
        assert!(matches!(err, ConfigError::MissingKey("encryption_key")));
    }

    #[test]
    fn empty_value_counts_as_missing() {
        let err = AgentConfig::parse(&format!("server_address =\nencryption_key = {KEY}\n"))
            .unwrap_err();
        assert!(matches!(err, ConfigError::MissingKey("server_address")));
    }

    #[test]
    fn bad_key_length_rejected_at_load() {
        let err = AgentConfig::parse("server_address = http://x\nencryption_key = 00112233445566778899\n")
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidKey(CryptoError::KeyLength(10))));
    }

    #[test]
    fn non_numeric_timeout_rejected() {
        let err = AgentConfig::parse(&format!(
            "server_address = http://x\nencryption_key = {KEY}\nprobe_timeout_secs = muito\n"
        ))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Format(_)), "{err}");
    }

    #[test]
    fn numeric_values_are_converted_from_text() {
        let config = AgentConfig::parse(&format!(
            "server_address = http://x\nencryption_key = {KEY}\nprobe_timeout_secs = 12.5\nlatency_samples = 2\nsample_window_ms = 250\n"
        ))
        .unwrap();
        assert_eq!(config.probe_deadline(), Some(Duration::from_millis(12_500)));
        assert_eq!(config.latency_samples, 2);
        assert_eq!(config.sample_window(), Duration::from_millis(250));
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let config = AgentConfig::parse(&format!(
            "server_address = http://x\nencryption_key = {KEY}\nmodo_legado = sim\n"
        ))
        .unwrap();
        assert_eq!(config.latency_target, "8.8.8.8:53");
    }

    #[test]
    fn default_network_budget_fits_default_deadline() {
        let config = AgentConfig::default();
        assert_eq!(config.public_ip_timeout(), Duration::from_secs(5));
        assert_eq!(config.network_budget(), Duration::from_secs(14));
        assert!(config.network_budget() < config.probe_deadline().unwrap());
    }

    #[test]
    fn deadline_shorter_than_network_budget_rejected() {
        let err = AgentConfig::parse(&format!(
            "server_address = http://x\nencryption_key = {KEY}\nprobe_timeout_secs = 10\n"
        ))
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                key: "probe_timeout_secs",
                ..
            }
        ));

        let shorter = AgentConfig::parse(&format!(
            "server_address = http://x\nencryption_key = {KEY}\nprobe_timeout_secs = 10\npublic_ip_timeout_secs = 2\nlatency_samples = 2\n"
        ))
        .unwrap();
        assert_eq!(shorter.network_budget(), Duration::from_secs(7));
    }

    #[test]
    fn zero_public_ip_timeout_rejected() {
        let err = AgentConfig::parse(&format!(
            "server_address = http://x\nencryption_key = {KEY}\npublic_ip_timeout_secs = 0\n"
        ))
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                key: "public_ip_timeout_secs",
                ..
            }
        ));
    }

    #[test]
    fn zero_timeout_disables_deadline() {
        let config = AgentConfig::parse(&format!(
            "server_address = http://x\nencryption_key = {KEY}\nprobe_timeout_secs = 0\n"
        ))
        .unwrap();
        assert_eq!(config.probe_deadline(), None);
    }

    #[test]
    fn missing_file_reports_path() {
        let err = AgentConfig::load(Path::new("/nonexistent/dir/config.ini")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/dir/config.ini"));
    }

    #[test]
    fn loads_from_file() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "server_address = https://coletor.exemplo/api\nencryption_key = {KEY}\nlatency_samples = 2"
        )
        .unwrap();

        let config = AgentConfig::load(file.path()).unwrap();
        assert_eq!(config.server_address, "https://coletor.exemplo/api");
        assert_eq!(config.latency_samples, 2);
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
    }
}
