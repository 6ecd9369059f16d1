//! Sonda de rede: interfaces, conexões, DNS, IP público e métricas avançadas.
//!
//! Latência e perda são medidas com conexões TCP ao `latency_target` (sem
//! ICMP, que exige privilégio); vazão é o delta dos contadores das
//! interfaces durante a janela de amostragem.

use super::{mbps, sample_network};
use crate::platform::Platform;
use inventory_core::types::{AdvancedNetworkInfo, InterfaceInfo, NetworkInfo};
use inventory_core::config::LATENCY_CONNECT_TIMEOUT;
use inventory_core::{AgentConfig, FieldCollector, Probe, ProbeOutcome};
use std::net::{IpAddr, SocketAddr, TcpStream, ToSocketAddrs};
use std::sync::Arc;
use std::time::{Duration, Instant};
use sysinfo::Networks;
use tracing::debug;

/// Prefixos de interfaces de túnel (OpenVPN, WireGuard…).
const VPN_PREFIXES: &[&str] = &["tun", "tap", "wg", "ppp", "utun"];

pub struct NetworkProbe {
    platform: Arc<dyn Platform>,
    public_ip_url: String,
    public_ip_timeout: Duration,
    latency_target: String,
    latency_samples: u32,
    sample_window: Duration,
}

impl NetworkProbe {
    pub fn new(platform: Arc<dyn Platform>, config: &AgentConfig) -> Self {
        Self {
            platform,
            public_ip_url: config.public_ip_url.clone(),
            public_ip_timeout: config.public_ip_timeout(),
            latency_target: config.latency_target.clone(),
            latency_samples: config.latency_samples,
            sample_window: config.sample_window(),
        }
    }
}

impl Probe for NetworkProbe {
    type Record = NetworkInfo;

    fn collect(self) -> ProbeOutcome<NetworkInfo> {
        let mut fields = FieldCollector::new();

        let networks = Networks::new_with_refreshed_list();
        let list = interfaces(&networks);
        let vpn_active = vpn_active(list.iter().map(|i| i.name.as_str()));

        let connections = fields.field(
            "connections",
            self.platform.tcp_connections().map(|mut conns| {
                conns.sort_by(|a, b| {
                    (a.local_port, &a.local_address, a.remote_port, &a.remote_address).cmp(&(
                        b.local_port,
                        &b.local_address,
                        b.remote_port,
                        &b.remote_address,
                    ))
                });
                conns
            }),
        );
        let dns_configuration = fields
            .field("dns_configuration", self.platform.dns_config())
            .unwrap_or_default();
        let dns_servers = dns_configuration.servers.clone();
        let public_ip = fields.field(
            "public_ip",
            fetch_public_ip(&self.public_ip_url, self.public_ip_timeout),
        );

        let latency = measure_latency(&self.latency_target, self.latency_samples);
        let packet_loss_percent = fields.field(
            "packet_loss_percent",
            latency.as_ref().map(|l| l.loss_percent).map_err(String::clone),
        );
        let latency_ms = fields.field(
            "latency_ms",
            latency.and_then(|l| {
                l.average_ms
                    .ok_or_else(|| "nenhuma conexão bem-sucedida".to_string())
            }),
        );

        let traffic = sample_network(self.sample_window);
        let routing_table = fields.field("routing_table", self.platform.routing_table());

        let advanced = AdvancedNetworkInfo {
            latency_ms,
            packet_loss_percent,
            download_mbps: Some(mbps(traffic.recv, self.sample_window)),
            upload_mbps: Some(mbps(traffic.sent, self.sample_window)),
            routing_table,
            dns_configuration,
            vpn_active: Some(vpn_active),
        };

        fields.finish(NetworkInfo {
            interfaces: Some(list),
            connections,
            dns_servers,
            public_ip,
            advanced,
        })
    }
}

/// Interfaces com MAC, endereços CIDR e contadores, ordenadas por nome.
fn interfaces(networks: &Networks) -> Vec<InterfaceInfo> {
    let mut list: Vec<InterfaceInfo> = networks
        .iter()
        .map(|(name, data)| {
            let mac = data.mac_address();
            let mut ips: Vec<String> = data
                .ip_networks()
                .iter()
                .map(|n| format!("{}/{}", n.addr, n.prefix))
                .collect();
            ips.sort();
            InterfaceInfo {
                name: name.clone(),
                mac_address: (!mac.is_unspecified()).then(|| mac.to_string()),
                ip_addresses: Some(ips),
                bytes_sent: Some(data.total_transmitted()),
                bytes_recv: Some(data.total_received()),
            }
        })
        .collect();
    list.sort_by(|a, b| a.name.cmp(&b.name));
    list
}

fn vpn_active<'a>(mut names: impl Iterator<Item = &'a str>) -> bool {
    names.any(|name| {
        let name = name.to_ascii_lowercase();
        VPN_PREFIXES.iter().any(|p| name.starts_with(p))
    })
}

/// GET no serviço de IP público; a resposta precisa ser um endereço IP.
fn fetch_public_ip(url: &str, timeout: Duration) -> Result<String, String> {
    let client = reqwest::blocking::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| e.to_string())?;
    let body = client
        .get(url)
        .send()
        .and_then(|r| r.error_for_status())
        .and_then(|r| r.text())
        .map_err(|e| e.to_string())?;
    parse_public_ip(&body)
}

fn parse_public_ip(body: &str) -> Result<String, String> {
    let trimmed = body.trim();
    trimmed
        .parse::<IpAddr>()
        .map(|ip| ip.to_string())
        .map_err(|_| format!("resposta não é um IP: {trimmed:?}"))
}

/// Resultado das tentativas de conexão.
#[derive(Debug, Clone, PartialEq)]
struct LatencyProbe {
    /// Média das conexões bem-sucedidas (`None` se todas falharam)
    average_ms: Option<f64>,
    loss_percent: f64,
}

fn measure_latency(target: &str, samples: u32) -> Result<LatencyProbe, String> {
    let addr: SocketAddr = target
        .to_socket_addrs()
        .map_err(|e| format!("{target}: {e}"))?
        .next()
        .ok_or_else(|| format!("{target}: nenhum endereço"))?;

    let timings: Vec<Option<Duration>> = (0..samples)
        .map(|_| {
            let start = Instant::now();
            match TcpStream::connect_timeout(&addr, LATENCY_CONNECT_TIMEOUT) {
                Ok(_stream) => Some(start.elapsed()),
                Err(e) => {
                    debug!("Conexão a {addr} falhou: {e}");
                    None
                }
            }
        })
        .collect();

    summarize_latency(&timings).ok_or_else(|| "nenhuma amostra".to_string())
}

fn summarize_latency(timings: &[Option<Duration>]) -> Option<LatencyProbe> {
    if timings.is_empty() {
        return None;
    }
    let ok: Vec<f64> = timings
        .iter()
        .flatten()
        .map(|d| d.as_secs_f64() * 1000.0)
        .collect();
    let lost = timings.len() - ok.len();
    Some(LatencyProbe {
        average_ms: (!ok.is_empty()).then(|| ok.iter().sum::<f64>() / ok.len() as f64),
        loss_percent: lost as f64 / timings.len() as f64 * 100.0,
    })
}
