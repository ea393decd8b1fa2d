use crate::{
    error::{BridgeError, BridgeResult},
    queue::OverflowPolicy,
    types::AgentKind,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Rendering hint for one agent kind. The core never reads these; they are
/// handed to the view layer as-is.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct KindHint {
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default = "default_scale")]
    pub scale: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    pub bind_address:         String,
    pub port:                 u16,
    /// Sent once to every client right after accept.
    pub greeting:             String,
    /// Single ASCII character terminating each message.
    pub delimiter:            char,
    pub read_buffer_size:     usize,
    /// Vehicles with |x| or |y| beyond this are evicted by the sweep.
    pub boundary_half_extent: f64,
    pub queue_capacity:       usize,
    pub overflow_policy:      OverflowPolicy,
    pub tick_interval_ms:     u64,
    pub kind_hints:           HashMap<AgentKind, KindHint>,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            bind_address:         "127.0.0.1".into(),
            port:                 1114,
            greeting:             "I will send key".into(),
            delimiter:            '$',
            read_buffer_size:     1024,
            boundary_half_extent: 25.0,
            queue_capacity:       256,
            overflow_policy:      OverflowPolicy::DropOldest,
            tick_interval_ms:     20,
            kind_hints:           default_kind_hints(),
        }
    }
}

impl BridgeConfig {
    /// Load from a JSON file. Missing fields take their defaults.
    /// In tests, use BridgeConfig::default_test().
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        Self::from_json(&content).map_err(|e| anyhow::anyhow!("Cannot load {path}: {e}"))
    }

    pub fn from_json(content: &str) -> BridgeResult<Self> {
        let config: Self = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Config for tests: ephemeral port, tight tick, small queue.
    pub fn default_test() -> Self {
        Self {
            port:             0,
            queue_capacity:   16,
            tick_interval_ms: 5,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> BridgeResult<()> {
        if self.queue_capacity == 0 {
            return Err(BridgeError::Config("queue_capacity must be at least 1".into()));
        }
        if self.read_buffer_size == 0 {
            return Err(BridgeError::Config("read_buffer_size must be at least 1".into()));
        }
        if !self.boundary_half_extent.is_finite() || self.boundary_half_extent <= 0.0 {
            return Err(BridgeError::Config(format!(
                "boundary_half_extent must be a positive number, got {}",
                self.boundary_half_extent
            )));
        }
        if !self.delimiter.is_ascii() {
            return Err(BridgeError::Config(format!(
                "delimiter must be a single ASCII character, got {:?}",
                self.delimiter
            )));
        }
        Ok(())
    }

    pub fn bind_target(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }

    /// Delimiter as a byte. Only meaningful after `validate()`.
    pub fn delimiter_byte(&self) -> u8 {
        self.delimiter as u8
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn hint_for(&self, kind: AgentKind) -> Option<&KindHint> {
        self.kind_hints.get(&kind)
    }
}

fn default_scale() -> f64 {
    1.0
}

fn default_kind_hints() -> HashMap<AgentKind, KindHint> {
    [
        (AgentKind::Pedestrian, "#3fa7ff", 0.5),
        (AgentKind::Vehicle,    "#ffb000", 1.5),
        (AgentKind::Authority,  "#1b2a80", 0.6),
        (AgentKind::Obstacle,   "#777777", 1.0),
    ]
    .into_iter()
    .map(|(kind, color, scale)| {
        (kind, KindHint { color: Some(color.to_string()), scale })
    })
    .collect()
}
