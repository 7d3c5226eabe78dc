//! AUREV Guard - compliance scanning API server

use aurev_guard::config::{AgentEndpoints, BlockfrostSettings, PaymentSettings};
use aurev_guard::{GuardConfig, GuardServer, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// AUREV Guard API server
#[derive(Parser, Debug)]
#[command(name = "aurev-guard")]
#[command(version)]
#[command(about = "Compliance scanning API for Cardano wallet addresses", long_about = None)]
struct Args {
    /// Host to bind to
    #[arg(short = 'H', long, env = "HOST", default_value = "0.0.0.0")]
    host: String,

    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value_t = 3000)]
    port: u16,

    /// Deployment environment
    #[arg(long, env = "NODE_ENV", default_value = "development")]
    environment: String,

    /// AI scoring stub base URL
    #[arg(long, env = "PY_AI_URL", default_value = "http://localhost:8000")]
    ai_stub_url: String,

    /// AI model agent base URL
    #[arg(long, env = "AI_AGENT_URL", default_value = "http://localhost:8083")]
    ai_agent_url: String,

    /// Payment agent base URL
    #[arg(long, env = "PAYMENT_AGENT_URL", default_value = "http://localhost:8081")]
    payment_agent_url: String,

    /// Masumi orchestrator base URL
    #[arg(long, env = "ORCHESTRATOR_URL", default_value = "http://localhost:8080")]
    orchestrator_url: String,

    /// Route AI and payment calls through the orchestrator
    #[arg(long, env = "USE_ORCHESTRATOR", default_value_t = false)]
    use_orchestrator: bool,

    /// Blockfrost project id
    #[arg(long, env = "BLOCKFROST_API_KEY")]
    blockfrost_api_key: Option<String>,

    /// Cardano network used for Blockfrost
    #[arg(long, env = "CARDANO_NETWORK", default_value = "preview")]
    network: String,

    /// Require a payment transaction before real-data analysis
    #[arg(long, env = "PAYMENT_REQUIRED", default_value_t = false)]
    payment_required: bool,

    /// Address that receives analysis payments
    #[arg(long, env = "PAYMENT_ADDRESS")]
    payment_address: Option<String>,

    /// Disable CORS headers
    #[arg(long)]
    no_cors: bool,

    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Args {
    fn into_config(self) -> GuardConfig {
        let agents = AgentEndpoints {
            ai_stub_url: self.ai_stub_url,
            ai_agent_url: self.ai_agent_url,
            payment_agent_url: self.payment_agent_url,
            orchestrator_url: self.orchestrator_url,
            use_orchestrator: self.use_orchestrator,
            ..Default::default()
        };
        let blockfrost = BlockfrostSettings {
            api_key: self.blockfrost_api_key.filter(|k| !k.is_empty()),
            network: self.network,
            ..Default::default()
        };
        let mut payment = PaymentSettings {
            required: self.payment_required,
            ..Default::default()
        };
        if let Some(address) = self.payment_address {
            payment.address = address;
        }

        let mut config = GuardConfig::default()
            .with_host(self.host)
            .with_port(self.port)
            .with_agents(agents)
            .with_blockfrost(blockfrost)
            .with_payment(payment);
        config.environment = self.environment;
        config.cors_enabled = !self.no_cors;
        config
    }
}

fn init_tracing(verbose: u8) {
    let default_filter = match verbose {
        0 => "aurev_guard=info,tower_http=debug",
        1 => "aurev_guard=debug,tower_http=debug",
        _ => "aurev_guard=trace,tower_http=trace",
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let server = GuardServer::new(args.into_config());

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for shutdown signal");
            std::future::pending::<()>().await;
        }
        info!("Shutdown signal received");
    };

    server.run_with_shutdown(shutdown).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_defaults_match_config() {
        let command = Args::command();
        let port = command
            .get_arguments()
            .find(|arg| arg.get_id() == "port")
            .unwrap();
        let expected = GuardConfig::default().port.to_string();
        assert_eq!(port.get_default_values()[0].to_str(), Some(expected.as_str()));

        let config = Args::try_parse_from(["aurev-guard", "--no-cors", "-p", "8080"])
            .unwrap()
            .into_config();
        assert_eq!(config.port, 8080);
        assert!(!config.cors_enabled);
    }
}
