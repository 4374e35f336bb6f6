use {
    anyhow::Result,
    clap::{
        crate_authors,
        crate_description,
        crate_name,
        crate_version,
        Args,
        Parser,
    },
    std::fs,
};

mod server;

#[derive(Parser, Debug)]
#[command(name = crate_name!())]
#[command(author = crate_authors!())]
#[command(about = crate_description!())]
#[command(version = crate_version!())]
pub enum Options {
    /// Run the auction server service.
    Run(RunOptions),
}

#[derive(Args, Clone, Debug)]
pub struct RunOptions {
    /// Server Options
    #[command(flatten)]
    pub server: server::Options,

    #[command(flatten)]
    pub config: ConfigOptions,

    /// Postgres connection string for the durable store.
    #[arg(long = "database-url")]
    #[arg(env = "DATABASE_URL")]
    pub database_url: String,
}

#[derive(Args, Clone, Debug)]
#[command(next_help_heading = "Config Options")]
#[group(id = "Config")]
pub struct ConfigOptions {
    /// Path to a configuration file containing the auction tunables.
    #[arg(long = "config")]
    #[arg(env = "ASK_AUCTION_CONFIG")]
    #[arg(default_value = "config.yaml")]
    pub config: String,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct Config {
    #[serde(default)]
    pub auction: AuctionConfig,
    #[serde(default)]
    pub ws:      WsConfig,
}

impl Config {
    pub fn load(path: &str) -> Result<Config> {
        let yaml_content = fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&yaml_content)?;
        Ok(config)
    }
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct AuctionConfig {
    /// Bids landing with less than this many seconds left stretch the
    /// window.
    #[serde(default = "default_anti_snipe_window_secs")]
    pub anti_snipe_window_secs: u64,

    /// Seconds the end time is pushed out, measured from the previous end.
    #[serde(default = "default_anti_snipe_extension_secs")]
    pub anti_snipe_extension_secs: u64,

    /// Enforce that every new bid beats the lowest pending one. A display
    /// convention in the clients; off by default.
    #[serde(default)]
    pub enforce_improving_bids: bool,

    /// Seconds between passive expiry sweeps.
    #[serde(default = "default_expiry_sweep_interval_secs")]
    pub expiry_sweep_interval_secs: u64,
}

impl Default for AuctionConfig {
    fn default() -> Self {
        Self {
            anti_snipe_window_secs:    default_anti_snipe_window_secs(),
            anti_snipe_extension_secs: default_anti_snipe_extension_secs(),
            enforce_improving_bids:    false,
            expiry_sweep_interval_secs: default_expiry_sweep_interval_secs(),
        }
    }
}

fn default_anti_snipe_window_secs() -> u64 {
    crate::kernel::clock::FINAL_WINDOW.as_secs()
}

fn default_anti_snipe_extension_secs() -> u64 {
    crate::kernel::clock::FINAL_WINDOW.as_secs()
}

fn default_expiry_sweep_interval_secs() -> u64 {
    10
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct WsConfig {
    /// Header carrying the requester IP behind the load balancer.
    #[serde(default = "default_requester_ip_header_name")]
    pub requester_ip_header_name: String,

    #[serde(default = "default_notification_channel_size")]
    pub notification_channel_size: usize,
}

impl Default for WsConfig {
    fn default() -> Self {
        Self {
            requester_ip_header_name:  default_requester_ip_header_name(),
            notification_channel_size: default_notification_channel_size(),
        }
    }
}

fn default_requester_ip_header_name() -> String {
    "X-Forwarded-For".to_string()
}

fn default_notification_channel_size() -> usize {
    1000
}
