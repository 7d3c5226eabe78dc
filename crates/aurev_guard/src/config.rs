//! Server configuration.
//!
//! Every section has a `Default` suitable for local development. The binary
//! fills these in from command-line flags and environment variables.

use std::time::Duration;

/// Top-level configuration for the `GuardServer`.
#[derive(Debug, Clone)]
pub struct GuardConfig {
    /// The host address to bind the server to.
    pub host: String,
    /// The port to listen on.
    pub port: u16,
    /// Deployment environment name (reported by `/project`).
    pub environment: String,
    /// If `true`, permissive CORS headers are added to every response.
    pub cors_enabled: bool,
    /// If `true`, HTTP request tracing is enabled.
    pub tracing: bool,
    /// Artificial latency of the in-process mock services.
    pub mock_delays: MockDelays,
    /// Where the sibling agent services live.
    pub agents: AgentEndpoints,
    /// Pipeline job pacing and limits.
    pub pipeline: PipelineSettings,
    /// Blockfrost access for the real-data pipeline.
    pub blockfrost: BlockfrostSettings,
    /// Payment enforcement for the real-data pipeline.
    pub payment: PaymentSettings,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            environment: "development".to_string(),
            cors_enabled: true,
            tracing: true,
            mock_delays: MockDelays::default(),
            agents: AgentEndpoints::default(),
            pipeline: PipelineSettings::default(),
            blockfrost: BlockfrostSettings::default(),
            payment: PaymentSettings::default(),
        }
    }
}

impl GuardConfig {
    /// Returns a configuration that binds to all network interfaces.
    pub fn public() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            ..Default::default()
        }
    }

    /// Sets the port for the server to listen on.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets the host address for the server.
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn with_mock_delays(mut self, delays: MockDelays) -> Self {
        self.mock_delays = delays;
        self
    }

    pub fn with_agents(mut self, agents: AgentEndpoints) -> Self {
        self.agents = agents;
        self
    }

    pub fn with_pipeline(mut self, pipeline: PipelineSettings) -> Self {
        self.pipeline = pipeline;
        self
    }

    pub fn with_blockfrost(mut self, blockfrost: BlockfrostSettings) -> Self {
        self.blockfrost = blockfrost;
        self
    }

    pub fn with_payment(mut self, payment: PaymentSettings) -> Self {
        self.payment = payment;
        self
    }

    /// A configuration with no artificial latency and fast pipelines.
    pub fn for_tests() -> Self {
        Self::default()
            .with_mock_delays(MockDelays::none())
            .with_pipeline(PipelineSettings::fast())
    }
}

/// Simulated latency of each mock integration, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockDelays {
    pub masumi_ms: u64,
    pub aiken_ms: u64,
    pub blockfrost_ms: u64,
    pub hydra_ms: u64,
}

impl Default for MockDelays {
    fn default() -> Self {
        Self {
            masumi_ms: 100,
            aiken_ms: 100,
            blockfrost_ms: 50,
            hydra_ms: 150,
        }
    }
}

impl MockDelays {
    /// No artificial latency at all.
    pub fn none() -> Self {
        Self {
            masumi_ms: 0,
            aiken_ms: 0,
            blockfrost_ms: 0,
            hydra_ms: 0,
        }
    }
}

/// Base URLs and timeouts for the sibling agent services.
#[derive(Debug, Clone)]
pub struct AgentEndpoints {
    /// AI scoring stub consulted by `/scan/address`.
    pub ai_stub_url: String,
    pub ai_stub_timeout_ms: u64,
    /// AI model agent (`/predict`).
    pub ai_agent_url: String,
    pub ai_agent_timeout_ms: u64,
    /// Payment agent (`/validate_settle`).
    pub payment_agent_url: String,
    pub payment_agent_timeout_ms: u64,
    /// Masumi orchestrator.
    pub orchestrator_url: String,
    pub orchestrator_route_path: String,
    pub orchestrator_timeout_ms: u64,
    /// Attempts per routed workflow before giving up.
    pub orchestrator_retries: u32,
    /// Base backoff between routing attempts; multiplied by the attempt number.
    pub orchestrator_backoff_ms: u64,
    /// Route AI and payment calls through the orchestrator instead of direct.
    pub use_orchestrator: bool,
    /// Timeout applied to `/health` probes.
    pub health_timeout_ms: u64,
}

impl Default for AgentEndpoints {
    fn default() -> Self {
        Self {
            ai_stub_url: "http://localhost:8000".to_string(),
            ai_stub_timeout_ms: 5_000,
            ai_agent_url: "http://localhost:8083".to_string(),
            ai_agent_timeout_ms: 30_000,
            payment_agent_url: "http://localhost:8081".to_string(),
            payment_agent_timeout_ms: 30_000,
            orchestrator_url: "http://localhost:8080".to_string(),
            orchestrator_route_path: "/masumi/route".to_string(),
            orchestrator_timeout_ms: 30_000,
            orchestrator_retries: 2,
            orchestrator_backoff_ms: 1_000,
            use_orchestrator: false,
            health_timeout_ms: 5_000,
        }
    }
}

/// Pacing and limits for background pipeline jobs.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    /// Minimum pause between progress updates of the live pipeline.
    pub progress_tick_ms: u64,
    /// Random extra pause added to each tick.
    pub progress_jitter_ms: u64,
    /// Upper bound on a live pipeline run.
    pub job_timeout_secs: u64,
    /// Upper bound on a real-data pipeline run.
    pub real_job_timeout_secs: u64,
    /// Finished jobs are evicted after this long.
    pub job_ttl_secs: u64,
    /// Maximum entries returned by the results endpoints.
    pub results_limit: usize,
    /// Transactions fetched per wallet by the real-data pipeline.
    pub max_transactions: usize,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            progress_tick_ms: 800,
            progress_jitter_ms: 400,
            job_timeout_secs: 60,
            real_job_timeout_secs: 180,
            job_ttl_secs: 3_600,
            results_limit: 50,
            max_transactions: 100,
        }
    }
}

impl PipelineSettings {
    /// Millisecond ticks, for tests.
    pub fn fast() -> Self {
        Self {
            progress_tick_ms: 1,
            progress_jitter_ms: 1,
            ..Default::default()
        }
    }

    pub fn job_timeout(&self) -> Duration {
        Duration::from_secs(self.job_timeout_secs)
    }

    pub fn real_job_timeout(&self) -> Duration {
        Duration::from_secs(self.real_job_timeout_secs)
    }

    pub fn job_ttl(&self) -> Duration {
        Duration::from_secs(self.job_ttl_secs)
    }
}

/// Blockfrost API access.
#[derive(Debug, Clone)]
pub struct BlockfrostSettings {
    /// Blockfrost project id. Live fetching is impossible without it.
    pub api_key: Option<String>,
    /// Network used when the key prefix does not name one.
    pub network: String,
    /// Explicit API root, overriding the network-derived URL.
    pub base_url: Option<String>,
    pub timeout_ms: u64,
}

impl Default for BlockfrostSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            network: "preview".to_string(),
            base_url: None,
            timeout_ms: 20_000,
        }
    }
}

impl BlockfrostSettings {
    /// The API root to query.
    ///
    /// Project ids are prefixed with their network (`mainnet…`, `preview…`,
    /// `preprod…`), which wins over the configured network.
    pub fn base_url(&self) -> String {
        if let Some(url) = &self.base_url {
            return url.trim_end_matches('/').to_string();
        }
        let key = self.api_key.as_deref().unwrap_or_default();
        let network = ["mainnet", "preview", "preprod"]
            .into_iter()
            .find(|prefix| key.starts_with(prefix))
            .unwrap_or(self.network.as_str());
        format!("https://cardano-{}.blockfrost.io/api/v0", network)
    }
}

/// Payment enforcement for the real-data pipeline.
#[derive(Debug, Clone)]
pub struct PaymentSettings {
    /// Reject pipeline starts that carry no payment transaction.
    pub required: bool,
    /// Address that must receive the payment.
    pub address: String,
    /// Minimum payment in ADA.
    pub min_ada: f64,
}

impl Default for PaymentSettings {
    fn default() -> Self {
        Self {
            required: false,
            address: "addr_test1qqr585tvlc7ylnqvz8pyqwynzspgltytxv43wr6w8u0w0t5x4tvjvjwnn3w8l4n87a3x4c5e5m5t5r5c5g5f5d5s5a5".to_string(),
            min_ada: 0.17,
        }
    }
}

impl PaymentSettings {
    pub fn min_lovelace(&self) -> u64 {
        (self.min_ada * 1_000_000.0).floor() as u64
    }
}
