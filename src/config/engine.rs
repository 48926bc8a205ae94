//! Engine, dispatch, and polling configuration structures.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::WorkerPoolConfig;

/// Prefix shared by every environment variable read by [`EngineConfig::from_env`].
pub const ENV_PREFIX: &str = "DEADLINE_ENGINE_";

/// Where fired handlers run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchBackendConfig {
    /// Dedicated OS threads fed by a never-blocking channel.
    WorkerPool,
    /// Tokio's blocking thread pool on the ambient runtime.
    Tokio,
}

impl FromStr for DispatchBackendConfig {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "worker_pool" => Ok(Self::WorkerPool),
            "tokio" => Ok(Self::Tokio),
            other => Err(format!("unknown dispatch backend `{other}`")),
        }
    }
}

/// Dispatch configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Backend selection.
    pub backend: DispatchBackendConfig,
    /// Worker pool settings, used when `backend` is `worker_pool`.
    pub pool: WorkerPoolConfig,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            backend: DispatchBackendConfig::WorkerPool,
            pool: WorkerPoolConfig::default(),
        }
    }
}

/// Background polling configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollConfig {
    /// Upper bound on requests fired per tick.
    pub max_fire_per_tick: i64,
    /// Interval between ticks, in milliseconds.
    pub tick_interval_ms: u64,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            max_fire_per_tick: 256,
            tick_interval_ms: 100,
        }
    }
}

/// Root engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Maximum due-time queue entries, tombstones included.
    pub max_queue_depth: usize,
    /// First request id handed out by `schedule`.
    pub initial_request_id: u64,
    /// Handler dispatch settings.
    pub dispatch: DispatchConfig,
    /// Background polling settings.
    pub poll: PollConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_queue_depth: 1_000_000,
            initial_request_id: 0,
            dispatch: DispatchConfig::default(),
            poll: PollConfig::default(),
        }
    }
}

impl PollConfig {
    /// Validate polling values.
    ///
    /// # Errors
    ///
    /// Returns a description of the first invalid field.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_fire_per_tick <= 0 {
            return Err("max_fire_per_tick must be greater than 0".into());
        }
        if self.tick_interval_ms == 0 {
            return Err("tick_interval_ms must be greater than 0".into());
        }
        Ok(())
    }
}

impl EngineConfig {
    /// Validate the engine and its nested sections.
    ///
    /// # Errors
    ///
    /// Returns a description of the first invalid field.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_queue_depth == 0 {
            return Err("max_queue_depth must be greater than 0".into());
        }
        if self.dispatch.backend == DispatchBackendConfig::WorkerPool {
            self.dispatch
                .pool
                .validate()
                .map_err(|e| format!("dispatch pool invalid: {e}"))?;
        }
        self.poll.validate().map_err(|e| format!("poll invalid: {e}"))?;
        Ok(())
    }

    /// Parse engine configuration from a JSON string and validate.
    ///
    /// # Errors
    ///
    /// Returns a description of the parse or validation failure.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load configuration from the process environment, reading a `.env` file first
    /// if one is present. Unset variables keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns a description of the first unparsable variable or invalid value.
    pub fn from_env() -> Result<Self, String> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary `DEADLINE_ENGINE_*` variable source.
    ///
    /// # Errors
    ///
    /// Returns a description of the first unparsable variable or invalid value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();
        let read = |name: &str| lookup(&format!("{ENV_PREFIX}{name}"));

        if let Some(v) = read("MAX_QUEUE_DEPTH") {
            cfg.max_queue_depth = parse_var("MAX_QUEUE_DEPTH", &v)?;
        }
        if let Some(v) = read("INITIAL_REQUEST_ID") {
            cfg.initial_request_id = parse_var("INITIAL_REQUEST_ID", &v)?;
        }
        if let Some(v) = read("DISPATCH_BACKEND") {
            cfg.dispatch.backend = parse_var("DISPATCH_BACKEND", &v)?;
        }
        if let Some(v) = read("WORKER_COUNT") {
            cfg.dispatch.pool.worker_count = parse_var("WORKER_COUNT", &v)?;
        }
        if let Some(v) = read("DISPATCH_QUEUE_DEPTH") {
            cfg.dispatch.pool.max_queue_depth = parse_var("DISPATCH_QUEUE_DEPTH", &v)?;
        }
        if let Some(v) = read("MAX_FIRE_PER_TICK") {
            cfg.poll.max_fire_per_tick = parse_var("MAX_FIRE_PER_TICK", &v)?;
        }
        if let Some(v) = read("TICK_INTERVAL_MS") {
            cfg.poll.tick_interval_ms = parse_var("TICK_INTERVAL_MS", &v)?;
        }

        cfg.validate()?;
        Ok(cfg)
    }
}

fn parse_var<T>(name: &str, value: &str) -> Result<T, String>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| format!("{ENV_PREFIX}{name}=`{value}` invalid: {e}"))
}
