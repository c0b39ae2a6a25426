//! CLI runner - executes commands

use crate::auth::Authenticator;
use crate::cli::commands::{Cli, Commands, OutputFormat};
use crate::config::TapConfig;
use crate::engine::SyncEngine;
use crate::error::Result;
use crate::http::HttpClient;
use crate::output::StdoutSink;
use crate::pagination::PageIterator;
use crate::partition::PartitionContext;
use crate::schema::DiscoveredCatalog;
use crate::state::{BookmarkManager, StateManager};
use crate::streams::Catalog;
use chrono::{Duration, NaiveDate, Utc};
use futures::TryStreamExt;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        match &self.cli.command {
            Commands::Spec => self.spec(),
            Commands::Check => self.check().await,
            Commands::Discover => self.discover(),
            Commands::Read { streams, today } => self.read(streams, *today).await,
        }
    }

    /// Load configuration
    pub fn load_config(&self) -> Result<TapConfig> {
        if self.cli.config_from_env() {
            TapConfig::from_env()
        } else {
            TapConfig::from_files(&self.cli.config)
        }
    }

    /// Load state
    pub fn load_state(&self) -> Result<StateManager> {
        // Inline state takes precedence
        match (&self.cli.state_json, &self.cli.state) {
            (Some(json), Some(path)) => Ok(StateManager::from_json(json)?.persist_to(path)),
            (Some(json), None) => StateManager::from_json(json),
            (None, Some(path)) => StateManager::from_file(path),
            (None, None) => Ok(StateManager::in_memory()),
        }
    }

    /// Build the authenticated HTTP client
    fn build_client(config: &TapConfig) -> Result<HttpClient> {
        let http_config = config.http_config();
        let authenticator = Authenticator::new(config.auth_config()?, http_config.timeout)?;
        Ok(HttpClient::with_config(http_config)?.with_token_provider(Arc::new(authenticator)))
    }

    /// Show spec
    fn spec(&self) -> Result<()> {
        self.output_message(&json!({
            "type": "SPEC",
            "spec": {
                "name": env!("CARGO_PKG_NAME"),
                "version": env!("CARGO_PKG_VERSION"),
                "connectionSpecification": TapConfig::properties(),
                "streams": Catalog::pinterest().names(),
            }
        }));
        Ok(())
    }

    /// Check connection by fetching one page of ad accounts
    async fn check(&self) -> Result<()> {
        let config = self.load_config()?;
        let client = Self::build_client(&config)?;
        let catalog = Catalog::pinterest();
        let stream = catalog.get("ad_accounts")?;
        let ctx = PartitionContext::new();
        let yesterday = Utc::now().date_naive() - Duration::days(1);

        let mut pages = std::pin::pin!(PageIterator::new(&client, stream, &ctx, yesterday).pages());

        match pages.try_next().await {
            Ok(page) => {
                let count = page.map_or(0, |p| p.records.len());
                self.output_message(&json!({
                    "type": "CONNECTION_STATUS",
                    "connectionStatus": {
                        "status": "SUCCEEDED",
                        "message": format!("Connection successful, {count} ad accounts on first page")
                    }
                }));
            }
            Err(e) => {
                self.output_message(&json!({
                    "type": "CONNECTION_STATUS",
                    "connectionStatus": {
                        "status": "FAILED",
                        "message": format!("Connection failed: {e}")
                    }
                }));
            }
        }

        Ok(())
    }

    /// Print the catalog
    fn discover(&self) -> Result<()> {
        let catalog = DiscoveredCatalog::from_catalog(&Catalog::pinterest());
        self.output_message(&serde_json::to_value(&catalog)?);
        Ok(())
    }

    /// Read the selected streams
    async fn read(&self, streams: &[String], today: Option<NaiveDate>) -> Result<()> {
        let config = self.load_config()?;
        let client = Self::build_client(&config)?;
        let state = self.load_state()?;
        let today = today.unwrap_or_else(|| Utc::now().date_naive());

        let bookmarks = BookmarkManager::new(state, config.start_date()?, today);
        let engine = SyncEngine::new(client, Catalog::pinterest(), bookmarks, Arc::new(StdoutSink::new()))
            .with_config(config.sync_config());

        let stats = engine.run(streams).await?;
        info!(
            "Read {} records from {} streams ({} partitions, {} skipped, {} bookmarks committed)",
            stats.records_synced,
            stats.streams_synced,
            stats.partitions_synced,
            stats.partitions_skipped,
            stats.bookmarks_committed
        );

        Ok(())
    }

    /// Output a message
    fn output_message(&self, msg: &Value) {
        match self.cli.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string(msg).unwrap_or_default());
            }
            OutputFormat::Pretty => {
                println!("{}", serde_json::to_string_pretty(msg).unwrap_or_default());
            }
        }
    }
}
