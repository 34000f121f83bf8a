//! Batch run configuration.

use crate::error::{Error, ErrorContext};
use crate::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const ENV_BATCH_SIZE: &str = "CAMPAIGN_BATCH_SIZE";
pub const ENV_BATCH_DELAY_MS: &str = "CAMPAIGN_BATCH_DELAY_MS";
pub const ENV_LARGE_VOLUME: &str = "CAMPAIGN_LARGE_VOLUME";
pub const ENV_ITEM_TIMEOUT_MS: &str = "CAMPAIGN_ITEM_TIMEOUT_MS";

/// Throughput heuristic applied to large inputs when
/// [`BatchRunConfig::enable_large_volume_optimizations`] is set.
///
/// Inputs of at least `threshold` items get
/// `min(batch_size * batch_size_multiplier, max_batch_size)` items per batch and
/// `max(delay / delay_divisor, min_delay_ms)` between batches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LargeVolumeTuning {
    pub threshold: usize,
    pub batch_size_multiplier: usize,
    pub max_batch_size: usize,
    pub delay_divisor: u32,
    pub min_delay_ms: u64,
}

impl Default for LargeVolumeTuning {
    fn default() -> Self {
        Self {
            threshold: 500,
            batch_size_multiplier: 2,
            max_batch_size: 50,
            delay_divisor: 2,
            min_delay_ms: 25,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchRunConfig {
    pub batch_size: usize,
    pub delay_between_batches_ms: u64,
    pub enable_large_volume_optimizations: bool,
    /// Per-item timeout. `None` or `0` lets an item run until it settles.
    pub item_timeout_ms: Option<u64>,
    pub large_volume: LargeVolumeTuning,
}

impl Default for BatchRunConfig {
    fn default() -> Self {
        Self {
            batch_size: 10,
            delay_between_batches_ms: 100,
            enable_large_volume_optimizations: false,
            item_timeout_ms: None,
            large_volume: LargeVolumeTuning::default(),
        }
    }
}

impl BatchRunConfig {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn with_batch_size(mut self, s: usize) -> Self {
        self.batch_size = s;
        self
    }
    pub fn with_delay_between_batches(mut self, d: Duration) -> Self {
        self.delay_between_batches_ms = d.as_millis() as u64;
        self
    }
    pub fn with_large_volume_optimizations(mut self, on: bool) -> Self {
        self.enable_large_volume_optimizations = on;
        self
    }
    /// Sub-millisecond timeouts round up to the next whole millisecond;
    /// `Some(Duration::ZERO)` disables the timeout.
    pub fn with_item_timeout(mut self, t: Option<Duration>) -> Self {
        self.item_timeout_ms = t
            .map(|d| d.as_nanos().div_ceil(1_000_000) as u64)
            .filter(|ms| *ms > 0);
        self
    }
    pub fn with_large_volume_tuning(mut self, tuning: LargeVolumeTuning) -> Self {
        self.large_volume = tuning;
        self
    }

    pub fn delay_between_batches(&self) -> Duration {
        Duration::from_millis(self.delay_between_batches_ms)
    }

    pub fn item_timeout(&self) -> Option<Duration> {
        self.item_timeout_ms
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis)
    }

    pub fn from_yaml_str(s: &str) -> Result<Self> {
        let cfg: Self = serde_yaml::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&raw)
    }

    pub fn from_json_str(s: &str) -> Result<Self> {
        let cfg: Self = serde_json::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Overlay `CAMPAIGN_*` environment variables onto this configuration.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Overlay values from an arbitrary key lookup. Unparseable values are
    /// logged and ignored.
    pub fn with_overrides_from<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = parse_override::<usize>(&lookup, ENV_BATCH_SIZE) {
            self.batch_size = v;
        }
        if let Some(v) = parse_override::<u64>(&lookup, ENV_BATCH_DELAY_MS) {
            self.delay_between_batches_ms = v;
        }
        if let Some(raw) = lookup(ENV_LARGE_VOLUME) {
            match parse_flag(&raw) {
                Some(on) => self.enable_large_volume_optimizations = on,
                None => tracing::warn!(key = ENV_LARGE_VOLUME, value = %raw, "ignoring unparseable flag"),
            }
        }
        if let Some(v) = parse_override::<u64>(&lookup, ENV_ITEM_TIMEOUT_MS) {
            self.item_timeout_ms = if v == 0 { None } else { Some(v) };
        }
        self
    }

    /// Reject values that would make a run meaningless.
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(invalid("batch_size", 0, "batch size must be at least 1"));
        }
        let lv = &self.large_volume;
        if lv.batch_size_multiplier == 0 {
            return Err(invalid(
                "large_volume.batch_size_multiplier",
                0,
                "multiplier must be at least 1",
            ));
        }
        if lv.max_batch_size == 0 {
            return Err(invalid(
                "large_volume.max_batch_size",
                0,
                "maximum batch size must be at least 1",
            ));
        }
        if lv.delay_divisor == 0 {
            return Err(invalid(
                "large_volume.delay_divisor",
                0,
                "delay divisor must be at least 1",
            ));
        }
        Ok(())
    }

    /// Resolve the effective batch size, delay and batch count for `item_count`
    /// items. Assumes a validated configuration.
    pub fn plan(&self, item_count: usize) -> ExecutionPlan {
        let lv = &self.large_volume;
        let large = self.enable_large_volume_optimizations && item_count >= lv.threshold;

        let (batch_size, delay) = if large {
            let size = self
                .batch_size
                .saturating_mul(lv.batch_size_multiplier)
                .min(lv.max_batch_size);
            let delay = (self.delay_between_batches() / lv.delay_divisor)
                .max(Duration::from_millis(lv.min_delay_ms));
            (size, delay)
        } else {
            (self.batch_size, self.delay_between_batches())
        };
        let batch_size = batch_size.max(1);

        ExecutionPlan {
            batch_size,
            delay,
            total_batches: item_count.div_ceil(batch_size),
            large_volume: large,
        }
    }
}

/// Parameters resolved once per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionPlan {
    pub batch_size: usize,
    pub delay: Duration,
    pub total_batches: usize,
    /// Whether the large-volume heuristic kicked in.
    pub large_volume: bool,
}

fn invalid(field: &str, value: impl std::fmt::Display, msg: &str) -> Error {
    Error::configuration_with_context(
        msg,
        ErrorContext::new()
            .with_field_path(field)
            .with_details(value.to_string()),
    )
}

fn parse_override<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Option<T> {
    let raw = lookup(key)?;
    match raw.trim().parse::<T>() {
        Ok(v) => Some(v),
        Err(_) => {
            tracing::warn!(key, value = %raw, "ignoring unparseable override");
            None
        }
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = BatchRunConfig::default();
        assert_eq!(config.batch_size, 10);
        assert_eq!(config.delay_between_batches(), Duration::from_millis(100));
        assert!(!config.enable_large_volume_optimizations);
        assert!(config.item_timeout().is_none());
        assert_eq!(config.large_volume.threshold, 500);
    }

    #[test]
    fn test_builder() {
        let config = BatchRunConfig::new()
            .with_batch_size(3)
            .with_delay_between_batches(Duration::from_millis(5))
            .with_item_timeout(Some(Duration::from_secs(2)));
        assert_eq!(config.batch_size, 3);
        assert_eq!(config.delay_between_batches_ms, 5);
        assert_eq!(config.item_timeout_ms, Some(2000));
    }

    #[test]
    fn test_zero_item_timeout_disables_timeout() {
        let built = BatchRunConfig::new().with_item_timeout(Some(Duration::ZERO));
        assert_eq!(built.item_timeout_ms, None);
        assert!(built.item_timeout().is_none());

        let yaml = BatchRunConfig::from_yaml_str("item_timeout_ms: 0\n").unwrap();
        assert_eq!(yaml.item_timeout_ms, Some(0));
        assert!(yaml.item_timeout().is_none());

        let json = BatchRunConfig::from_json_str(r#"{"item_timeout_ms": 0}"#).unwrap();
        assert!(json.item_timeout().is_none());

        let env = BatchRunConfig::new()
            .with_item_timeout(Some(Duration::from_secs(1)))
            .with_overrides_from(|k| (k == ENV_ITEM_TIMEOUT_MS).then(|| "0".to_string()));
        assert!(env.item_timeout().is_none());
    }

    #[test]
    fn test_sub_millisecond_timeout_rounds_up() {
        let config = BatchRunConfig::new().with_item_timeout(Some(Duration::from_micros(300)));
        assert_eq!(config.item_timeout(), Some(Duration::from_millis(1)));
        let config = BatchRunConfig::new().with_item_timeout(Some(Duration::from_micros(2_001)));
        assert_eq!(config.item_timeout_ms, Some(3));
    }

    #[test]
    fn test_plan_small_input_keeps_caller_settings() {
        let config = BatchRunConfig::new().with_large_volume_optimizations(true);
        let plan = config.plan(499);
        assert_eq!(plan.batch_size, 10);
        assert_eq!(plan.delay, Duration::from_millis(100));
        assert_eq!(plan.total_batches, 50);
        assert!(!plan.large_volume);
    }

    #[test]
    fn test_plan_large_volume() {
        let config = BatchRunConfig::new().with_large_volume_optimizations(true);
        let plan = config.plan(600);
        assert_eq!(plan.batch_size, 20);
        assert_eq!(plan.delay, Duration::from_millis(50));
        assert_eq!(plan.total_batches, 30);
        assert!(plan.large_volume);
    }

    #[test]
    fn test_plan_large_volume_caps_and_floors() {
        let config = BatchRunConfig::new()
            .with_batch_size(40)
            .with_delay_between_batches(Duration::from_millis(30))
            .with_large_volume_optimizations(true);
        let plan = config.plan(1000);
        assert_eq!(plan.batch_size, 50);
        assert_eq!(plan.delay, Duration::from_millis(25));
    }

    #[test]
    fn test_plan_without_flag_ignores_volume() {
        let plan = BatchRunConfig::new().plan(10_000);
        assert_eq!(plan.batch_size, 10);
        assert!(!plan.large_volume);
    }

    #[test]
    fn test_plan_empty() {
        assert_eq!(BatchRunConfig::new().plan(0).total_batches, 0);
    }

    #[test]
    fn test_validate_rejects_zero_batch_size() {
        let err = BatchRunConfig::new().with_batch_size(0).validate().unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));
        assert_eq!(
            err.to_string(),
            "Configuration error: batch size must be at least 1 (batch_size = 0)"
        );
    }

    #[test]
    fn test_validate_rejects_zero_divisor() {
        let tuning = LargeVolumeTuning {
            delay_divisor: 0,
            ..Default::default()
        };
        let err = BatchRunConfig::new()
            .with_large_volume_tuning(tuning)
            .validate()
            .unwrap_err();
        assert_eq!(
            err.context().and_then(|c| c.field_path.as_deref()),
            Some("large_volume.delay_divisor")
        );
    }

    #[test]
    fn test_yaml_partial_document_fills_defaults() {
        let config = BatchRunConfig::from_yaml_str(
            "batch_size: 25\nenable_large_volume_optimizations: true\nlarge_volume:\n  threshold: 100\n",
        )
        .unwrap();
        assert_eq!(config.batch_size, 25);
        assert_eq!(config.delay_between_batches_ms, 100);
        assert_eq!(config.large_volume.threshold, 100);
        assert_eq!(config.large_volume.max_batch_size, 50);
    }

    #[test]
    fn test_yaml_invalid_batch_size() {
        assert!(BatchRunConfig::from_yaml_str("batch_size: 0\n").is_err());
    }

    #[test]
    fn test_json_config() {
        let config = BatchRunConfig::from_json_str(r#"{"delay_between_batches_ms": 0}"#).unwrap();
        assert_eq!(config.delay_between_batches(), Duration::ZERO);
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = [
            (ENV_BATCH_SIZE, "7"),
            (ENV_BATCH_DELAY_MS, " 15 "),
            (ENV_LARGE_VOLUME, "yes"),
            (ENV_ITEM_TIMEOUT_MS, "250"),
        ]
        .into_iter()
        .collect();
        let config =
            BatchRunConfig::new().with_overrides_from(|k| vars.get(k).map(|v| v.to_string()));
        assert_eq!(config.batch_size, 7);
        assert_eq!(config.delay_between_batches_ms, 15);
        assert!(config.enable_large_volume_optimizations);
        assert_eq!(config.item_timeout_ms, Some(250));
    }

    #[test]
    fn test_unparseable_overrides_are_ignored() {
        let config = BatchRunConfig::new().with_overrides_from(|k| match k {
            ENV_BATCH_SIZE => Some("ten".to_string()),
            ENV_LARGE_VOLUME => Some("maybe".to_string()),
            _ => None,
        });
        assert_eq!(config, BatchRunConfig::default());
    }
}
