use std::net::SocketAddr;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::models::pv::PipelineConfig;
use crate::services::pipeline::Pipeline;

fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8080 }

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    pub model: PipelineConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: default_host(), port: default_port() }
    }
}

impl ServerConfig {
    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid listen address {}:{}", self.host, self.port))
    }
}

impl Config {
    /// Reads and validates a JSON configuration file. A model section that
    /// would fail at pipeline setup is rejected here.
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path).with_context(|| format!("reading {path}"))?;
        Self::from_json(&content).with_context(|| format!("loading {path}"))
    }

    pub fn from_json(content: &str) -> anyhow::Result<Self> {
        let config: Config = serde_json::from_str(content)?;
        Pipeline::new(&config.model)?;
        Ok(config)
    }
}
