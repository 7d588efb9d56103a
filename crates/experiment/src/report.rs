//! Reporting results to a shared job store.
//!
//! Finished jobs are pushed onto the list `jobs:done:<workhash>`. The store is
//! Redis in production; [`MemorySink`] stands in for it in tests.

use std::collections::HashMap;

use redis::Commands;

use crate::error::ExperimentError;

/// Prefix of the list a finished job reports to.
pub const JOB_DONE_PREFIX: &str = "jobs:done:";

/// The result list for a work hash.
pub fn job_key(workhash: &str) -> String {
    format!("{JOB_DONE_PREFIX}{workhash}")
}

/// Turn a `REDIS` value into a connection URL; bare hosts get `redis://`.
pub fn redis_url(server: &str) -> String {
    let server = server.trim();
    if server.contains("://") {
        server.to_string()
    } else {
        format!("redis://{server}/")
    }
}

/// A list store that accepts pushed payloads.
pub trait ResultSink {
    /// Prepend `payload` to the list at `key`.
    fn push(&mut self, key: &str, payload: &[u8]) -> Result<(), ExperimentError>;
}

/// A synchronous Redis connection.
pub struct RedisSink {
    conn: redis::Connection,
}

impl RedisSink {
    /// Open a connection, failing immediately if the server is unreachable.
    pub fn connect(server: &str) -> Result<Self, ExperimentError> {
        let url = redis_url(server);
        let client = redis::Client::open(url.as_str())?;
        let conn = client.get_connection()?;
        tracing::debug!(%url, "connected to result store");
        Ok(Self { conn })
    }
}

impl ResultSink for RedisSink {
    fn push(&mut self, key: &str, payload: &[u8]) -> Result<(), ExperimentError> {
        let len: usize = self.conn.lpush(key, payload)?;
        tracing::debug!(key, len, "LPUSH");
        Ok(())
    }
}

/// In-process list store with `LPUSH` ordering.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    lists: HashMap<String, Vec<Vec<u8>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Items at `key`, most recent first.
    pub fn list(&self, key: &str) -> &[Vec<u8>] {
        self.lists.get(key).map(Vec::as_slice).unwrap_or(&[])
    }
}

impl ResultSink for MemorySink {
    fn push(&mut self, key: &str, payload: &[u8]) -> Result<(), ExperimentError> {
        self.lists
            .entry(key.to_string())
            .or_default()
            .insert(0, payload.to_vec());
        Ok(())
    }
}

/// Sends one job's payload to its result list.
pub struct Reporter<S> {
    workhash: String,
    sink: S,
}

impl<S: ResultSink> Reporter<S> {
    pub fn new(workhash: impl Into<String>, sink: S) -> Self {
        Self {
            workhash: workhash.into(),
            sink,
        }
    }

    pub fn workhash(&self) -> &str {
        &self.workhash
    }

    pub fn key(&self) -> String {
        job_key(&self.workhash)
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn report(&mut self, payload: &[u8]) -> Result<(), ExperimentError> {
        let key = self.key();
        self.sink.push(&key, payload)?;
        tracing::info!(%key, bytes = payload.len(), "result reported");
        Ok(())
    }
}

impl Reporter<RedisSink> {
    /// Build the reporter selected by `WORKHASH` and `REDIS`.
    ///
    /// An unset work hash means no reporting. Any set work hash, even an
    /// empty one, needs a server; a missing or unreachable server is an error.
    pub fn from_env(
        workhash: Option<String>,
        redis: Option<String>,
    ) -> Result<Option<Self>, ExperimentError> {
        let Some(workhash) = workhash else {
            return Ok(None);
        };
        let server = redis
            .filter(|r| !r.trim().is_empty())
            .ok_or(ExperimentError::MissingRedis)?;
        let sink = RedisSink::connect(&server)?;
        Ok(Some(Self::new(workhash, sink)))
    }
}
