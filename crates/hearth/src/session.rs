//! One command's view of the gateway: the in-memory domain seeded from its
//! fixtures, plus the output and timing settings every handler shares.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use clap::ValueEnum;
use tracing::debug;

use hearth_core::{DomainService, EntityId, EntityRecord, MemoryDomain, Reducer, Store, Worker};

use crate::cli::{GlobalOpts, OutputFormat};
use crate::config::{self, Config};
use crate::error::CliError;
use crate::output;

pub struct Session {
    /// Kept alongside `service` for simulation and direct record lookups.
    pub domain: MemoryDomain,
    pub service: Arc<dyn DomainService>,
    pub output: OutputFormat,
    pub color: bool,
    pub quiet: bool,
    pub settle_timeout: Duration,
    pub simulate_interval: Duration,
}

impl Session {
    pub fn open(global: &GlobalOpts, cfg: &Config) -> Result<Self, CliError> {
        let (path, profile) = config::resolve_fixtures(global, cfg)?;
        let mut fixture = config::read_fixture(&path)?;
        if let Some(profile) = profile {
            fixture.gateway.name.clone_from(&profile.name);
            fixture.gateway.host.clone_from(&profile.host);
        }
        debug!(
            path = %path.display(),
            records = fixture.records.len(),
            gateway = %fixture.gateway.name,
            "loaded fixtures"
        );

        let domain = MemoryDomain::from_fixture(fixture);
        Ok(Self {
            service: Arc::new(domain.clone()),
            domain,
            output: resolve_output(global, cfg)?,
            color: output::should_color(global.color),
            quiet: global.quiet,
            settle_timeout: cfg.defaults.settle_timeout(),
            simulate_interval: cfg.defaults.simulate_interval(),
        })
    }

    /// Fold derived events into `store` until `done` holds.
    pub async fn settle<R, W>(
        &self,
        store: &mut Store<R, W>,
        what: &str,
        done: impl FnMut(&R::State) -> bool,
    ) -> Result<(), CliError>
    where
        R: Reducer,
        W: Worker<Event = R::Event, Effect = R::Effect>,
    {
        self.bounded(what, store.wait_for(done)).await
    }

    /// Apply exactly one derived event.
    pub async fn next<R, W>(&self, store: &mut Store<R, W>, what: &str) -> Result<(), CliError>
    where
        R: Reducer,
        W: Worker<Event = R::Event, Effect = R::Effect>,
    {
        self.bounded(what, store.next()).await
    }

    async fn bounded(&self, what: &str, fut: impl Future<Output = ()>) -> Result<(), CliError> {
        tokio::time::timeout(self.settle_timeout, fut)
            .await
            .map_err(|_| CliError::Timeout {
                what: what.to_owned(),
                millis: u64::try_from(self.settle_timeout.as_millis()).unwrap_or(u64::MAX),
            })
    }

    /// Find a record by id, or by case-insensitive display name.
    pub fn require_record(&self, identifier: &str) -> Result<EntityRecord, CliError> {
        let id = EntityId::from(identifier);
        self.domain
            .records()
            .iter()
            .find(|r| r.id == id || r.name.eq_ignore_ascii_case(identifier))
            .map(|r| (**r).clone())
            .ok_or_else(|| CliError::NotFound {
                resource_type: "entity".into(),
                identifier: identifier.into(),
                list_command: "list devices".into(),
            })
    }

    pub fn print(&self, rendered: &str) {
        output::print_output(rendered, self.quiet);
    }

    /// Status line on stderr, silenced by `--quiet`.
    pub fn note(&self, message: &str) {
        if !self.quiet {
            eprintln!("{message}");
        }
    }
}

fn resolve_output(global: &GlobalOpts, cfg: &Config) -> Result<OutputFormat, CliError> {
    if let Some(format) = global.output {
        return Ok(format);
    }
    OutputFormat::from_str(&cfg.defaults.output, true).map_err(|reason| CliError::Validation {
        field: "defaults.output".into(),
        reason,
    })
}
