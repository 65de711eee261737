use std::{path::PathBuf, time::Duration};

use anyhow::Context;
use clap::Parser;
use config::{Environment, File, FileFormat};

use crate::http::codec::DEFAULT_MAX_BODY_BYTES;

const DEFAULT_ADDRESS: &str = "0.0.0.0:4221";
const DEFAULT_DIRECTORY: &str = "/tmp/";

#[derive(Debug, serde::Deserialize)]
pub struct Config {
    pub address: String,
    /// Root under which `/files/{name}` is read and written.
    pub directory: PathBuf,
    pub read_timeout_ms: u64,
    pub connection_timeout_ms: u64,
    pub permits: usize,
    /// Requests announcing a larger `Content-Length` are rejected.
    pub max_body_bytes: usize,
}

#[derive(Debug, Parser)]
#[command(name = "server", about = "Minimal HTTP/1.1 file server", long_about = None)]
struct Args {
    /// Directory served under `/files/`.
    #[arg(long)]
    directory: Option<String>,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        Self::from_args(std::env::args().skip(1))
    }

    /// Defaults, then `config.toml`, then `SERVER_*` variables, then
    /// `--directory <path>`.
    pub fn from_args(args: impl IntoIterator<Item = String>) -> anyhow::Result<Self> {
        let mut builder = ::config::Config::builder()
            .set_default("address", DEFAULT_ADDRESS)?
            .set_default("directory", DEFAULT_DIRECTORY)?
            .set_default("read_timeout_ms", 1_000)?
            .set_default("connection_timeout_ms", 15_000)?
            .set_default("permits", 1_000)?
            .set_default("max_body_bytes", DEFAULT_MAX_BODY_BYTES as i64)?
            .add_source(File::new("config.toml", FileFormat::Toml).required(false))
            .add_source(Environment::with_prefix("SERVER").try_parsing(true));

        let args = Args::try_parse_from(std::iter::once("server".to_string()).chain(args))?;
        if let Some(directory) = args.directory {
            builder = builder.set_override("directory", directory)?;
        }

        builder
            .build()
            .context("failed to load configuration")?
            .try_deserialize()
            .context("invalid configuration")
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    pub fn connection_timeout(&self) -> Duration {
        Duration::from_millis(self.connection_timeout_ms)
    }
}
