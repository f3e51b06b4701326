//! `templar update` — reconcile a namespace with a local directory.

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Args;
use templar_client::HttpReconciliationClient;
use templar_core::{config, ClientConfig, Namespace, PrunePolicy};
use templar_sync::{pipeline, report, CancelFlag, UpdateRequest};

use super::FORMATS;

/// Arguments for `templar update`.
#[derive(Args, Debug)]
pub struct UpdateArgs {
    /// Namespace whose templates are replaced.
    pub namespace: String,

    /// Directory scanned recursively for template files.
    pub directory: PathBuf,

    /// Keep server templates that are missing from the directory.
    #[arg(long)]
    pub no_delete: bool,

    /// Template server base URL (default from config, else http://localhost:8080).
    #[arg(long)]
    pub server: Option<String>,

    /// Bearer token sent with the request.
    #[arg(long)]
    pub token: Option<String>,

    /// Extra request header, repeatable.
    #[arg(long = "header", value_name = "NAME=VALUE", value_parser = parse_header)]
    pub headers: Vec<(String, String)>,

    /// Request timeout in seconds.
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Config file to use instead of ~/.templar/config.yaml.
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl UpdateArgs {
    pub fn run(self) -> Result<ExitCode> {
        let client_config = self.client_config()?;
        let client = HttpReconciliationClient::new(&client_config);

        let request = UpdateRequest {
            root: self.directory,
            namespace: Namespace::from(self.namespace),
            prune: PrunePolicy::from_no_delete(self.no_delete),
            formats: FORMATS,
        };
        let run = pipeline::run(&client, &request, &CancelFlag::new());

        let outcome = report(&run, &mut io::stdout().lock(), &mut io::stderr().lock())
            .context("failed to write report")?;
        Ok(ExitCode::from(outcome.exit_code()))
    }

    /// File configuration with command-line overrides applied.
    fn client_config(&self) -> Result<ClientConfig> {
        let mut cfg = match &self.config {
            Some(path) => config::load_from(path)
                .with_context(|| format!("failed to load config {}", path.display()))?,
            None => config::load().context("failed to load ~/.templar/config.yaml")?,
        };

        if let Some(server) = &self.server {
            cfg.server = server.clone();
        }
        if let Some(token) = &self.token {
            cfg.token = Some(token.clone());
        }
        if let Some(timeout) = self.timeout {
            cfg.timeout_secs = timeout;
        }
        for (name, value) in &self.headers {
            cfg.headers.insert(name.clone(), value.clone());
        }
        cfg.validate().context("invalid client configuration")?;
        Ok(cfg)
    }
}

fn parse_header(raw: &str) -> Result<(String, String), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{raw}'"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("empty header name in '{raw}'"));
    }
    Ok((name.to_string(), value.to_string()))
}
