use crate::cli::GustCli;
use anyhow::Context;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_OUT_DIR: &str = "results";

/// Target and output configuration, resolved exactly once before scheduling begins.
///
/// CLI flags win over environment variables, which win over the documented defaults.
#[derive(Debug, Clone)]
pub struct TargetConfig {
    pub host: String,
    pub port: u16,
    pub out_dir: PathBuf,
    pub request_timeout: Duration,
}

impl TargetConfig {
    pub fn resolve(cli: &GustCli) -> anyhow::Result<Self> {
        let host = cli
            .host
            .clone()
            .or_else(|| std::env::var("HOST").ok())
            .unwrap_or_else(|| DEFAULT_HOST.to_string());

        let port = if let Some(port) = cli.port {
            port
        } else if let Ok(raw) = std::env::var("PORT") {
            raw.parse()
                .with_context(|| format!("PORT environment variable [{raw}] is not a valid port"))?
        } else {
            DEFAULT_PORT
        };

        let out_dir = cli
            .out_dir
            .clone()
            .or_else(|| std::env::var("OUTPUT_DIR").ok().map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUT_DIR));

        Ok(Self {
            host,
            port,
            out_dir,
            request_timeout: Duration::from_secs(cli.request_timeout),
        })
    }

    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }

    /// The resolved environment as recorded in the run summary.
    pub fn as_env(&self) -> BTreeMap<String, String> {
        BTreeMap::from([
            ("HOST".to_string(), self.host.clone()),
            ("PORT".to_string(), self.port.to_string()),
        ])
    }
}
