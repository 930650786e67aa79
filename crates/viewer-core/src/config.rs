//! Viewer configuration.
//!
//! Settings can be built programmatically, loaded from a TOML file, and
//! overridden by environment variables.

use std::fs;
use std::io;
use std::path::Path;
use std::time::Duration;

use doc_model::DEFAULT_PAGE_NUMBER_RADIX;
use serde::{Deserialize, Serialize};

use crate::virtualize::VisibilityPolicy;
use crate::zoom::DEFAULT_SCALE_STEP;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("invalid TOML: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("invalid value for {key}: {value:?}")]
    InvalidValue { key: String, value: String },
}

fn invalid(key: &str, value: impl ToString) -> ConfigError {
    ConfigError::InvalidValue { key: key.to_owned(), value: value.to_string() }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Quiet interval before a deferred visibility pass runs
    pub render_timeout_ms: u64,
    /// Zoom-out factor per step; zoom-in uses its reciprocal
    pub scale_step: f64,
    pub policy: VisibilityPolicy,
    /// Vertical space before every page placeholder
    pub page_gap: f64,
    /// Radix of the declared page-number attribute
    pub page_number_radix: u32,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            render_timeout_ms: 130,
            scale_step: DEFAULT_SCALE_STEP,
            policy: VisibilityPolicy::Positional,
            page_gap: 0.0,
            page_number_radix: DEFAULT_PAGE_NUMBER_RADIX,
        }
    }
}

impl ViewerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_render_timeout_ms(mut self, ms: u64) -> Self {
        self.render_timeout_ms = ms;
        self
    }

    pub fn with_scale_step(mut self, step: f64) -> Self {
        self.scale_step = step;
        self
    }

    pub fn with_policy(mut self, policy: VisibilityPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_page_gap(mut self, gap: f64) -> Self {
        self.page_gap = gap;
        self
    }

    pub fn with_page_number_radix(mut self, radix: u32) -> Self {
        self.page_number_radix = radix;
        self
    }

    pub fn render_timeout(&self) -> Duration {
        Duration::from_millis(self.render_timeout_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.scale_step > 0.0 && self.scale_step < 1.0) {
            return Err(invalid("scale_step", self.scale_step));
        }
        if !(self.page_gap >= 0.0 && self.page_gap.is_finite()) {
            return Err(invalid("page_gap", self.page_gap));
        }
        if !(2..=36).contains(&self.page_number_radix) {
            return Err(invalid("page_number_radix", self.page_number_radix));
        }
        Ok(())
    }

    /// Parse a TOML document; missing keys keep their defaults.
    ///
    /// ```toml
    /// render_timeout_ms = 200
    /// scale_step = 0.8
    /// policy = "windowed"
    /// page_gap = 13.0
    /// page_number_radix = 16
    /// ```
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&contents)
    }

    /// Defaults overridden by the environment.
    ///
    /// - `PAGEVIEW_RENDER_TIMEOUT_MS`
    /// - `PAGEVIEW_SCALE_STEP`
    /// - `PAGEVIEW_POLICY` (`positional` or `windowed`)
    /// - `PAGEVIEW_PAGE_GAP`
    /// - `PAGEVIEW_PAGE_RADIX`
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_env_overrides()
    }

    pub fn with_env_overrides(mut self) -> Result<Self, ConfigError> {
        if let Ok(val) = std::env::var("PAGEVIEW_RENDER_TIMEOUT_MS") {
            self.render_timeout_ms =
                val.trim().parse().map_err(|_| invalid("PAGEVIEW_RENDER_TIMEOUT_MS", &val))?;
        }

        if let Ok(val) = std::env::var("PAGEVIEW_SCALE_STEP") {
            self.scale_step = val.trim().parse().map_err(|_| invalid("PAGEVIEW_SCALE_STEP", &val))?;
        }

        if let Ok(val) = std::env::var("PAGEVIEW_POLICY") {
            self.policy =
                VisibilityPolicy::from_name(&val).ok_or_else(|| invalid("PAGEVIEW_POLICY", &val))?;
        }

        if let Ok(val) = std::env::var("PAGEVIEW_PAGE_GAP") {
            self.page_gap = val.trim().parse().map_err(|_| invalid("PAGEVIEW_PAGE_GAP", &val))?;
        }

        if let Ok(val) = std::env::var("PAGEVIEW_PAGE_RADIX") {
            self.page_number_radix =
                val.trim().parse().map_err(|_| invalid("PAGEVIEW_PAGE_RADIX", &val))?;
        }

        self.validate()?;
        Ok(self)
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let contents = toml::to_string_pretty(self).map_err(|error| invalid("config", error))?;
        fs::write(path.as_ref(), contents)?;
        Ok(())
    }
}
