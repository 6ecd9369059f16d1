//! # Inventário Sender
//!
//! Coleta um snapshot do sistema (hardware, software, rede, performance),
//! criptografa com AES-CFB e envia ao coletor via HTTP POST. Uma execução,
//! um envio.
//!
//! ## Uso
//! ```bash
//! inventory_sender                       # lê ./config.ini
//! inventory_sender --config /etc/inv.ini
//! RUST_LOG=debug inventory_sender        # detalhes por campo
//! ```

use clap::Parser;
use inventory_core::config::DEFAULT_CONFIG_FILE;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "inventory_sender", version, about = "Coleta, criptografa e envia o inventário do sistema")]
struct Cli {
    /// Arquivo de configuração `chave = valor`
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,
}

fn main() -> ExitCode {
    // ── Logging ──
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    info!("Inventário Sender iniciado (config: {})", cli.config.display());

    match inventory_sender::run(&cli.config) {
        Ok(summary) => {
            info!(
                "Concluído: {} bytes de snapshot, {} bytes enviados",
                summary.plaintext_len, summary.encoded_len
            );
            println!("Informações do sistema coletadas, criptografadas e enviadas com sucesso.");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{e}");
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}
