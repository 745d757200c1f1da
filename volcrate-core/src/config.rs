//! Encoder and transport configuration

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Width in pixels of a grid atlas unless configured otherwise
pub const DEFAULT_ATLAS_WIDTH: u32 = 2048;

/// Wire representation used for numeric arrays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PerformanceMode {
    /// Nested JSON lists
    #[default]
    Json,
    /// A single `.npy` blob
    Binary,
    /// One raw buffer view per top-level element
    ChunkedBinary,
}

impl PerformanceMode {
    /// Integer switch value used by host configuration (0, 1 or 2)
    pub fn as_u8(&self) -> u8 {
        match self {
            PerformanceMode::Json => 0,
            PerformanceMode::Binary => 1,
            PerformanceMode::ChunkedBinary => 2,
        }
    }

    pub fn is_binary(&self) -> bool {
        !matches!(self, PerformanceMode::Json)
    }
}

impl TryFrom<u8> for PerformanceMode {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(PerformanceMode::Json),
            1 => Ok(PerformanceMode::Binary),
            2 => Ok(PerformanceMode::ChunkedBinary),
            other => Err(Error::InvalidData(format!(
                "unknown performance mode {} (expected 0, 1 or 2)",
                other
            ))),
        }
    }
}

/// Configuration for array transport
///
/// Passed explicitly to every codec call instead of living in process-wide state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    pub performance: PerformanceMode,
}

impl TransportConfig {
    pub fn new(performance: PerformanceMode) -> Self {
        Self { performance }
    }

    /// Parse configuration from a JSON document such as `{"performance": "binary"}`
    pub fn from_json_str(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }
}

/// Configuration for grid atlas encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AtlasOptions {
    /// Fixed width of the atlas image in pixels
    pub image_width: u32,
}

impl Default for AtlasOptions {
    fn default() -> Self {
        Self {
            image_width: DEFAULT_ATLAS_WIDTH,
        }
    }
}

impl AtlasOptions {
    pub fn with_image_width(mut self, image_width: u32) -> Self {
        self.image_width = image_width;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_performance_mode_from_switch() {
        assert_eq!(PerformanceMode::try_from(0u8).unwrap(), PerformanceMode::Json);
        assert_eq!(PerformanceMode::try_from(1u8).unwrap(), PerformanceMode::Binary);
        assert_eq!(PerformanceMode::try_from(2u8).unwrap(), PerformanceMode::ChunkedBinary);
        assert!(PerformanceMode::try_from(3u8).is_err());
        assert_eq!(PerformanceMode::ChunkedBinary.as_u8(), 2);
    }

    #[test]
    fn test_transport_config_defaults_to_json() {
        let config = TransportConfig::from_json_str("{}").unwrap();
        assert_eq!(config.performance, PerformanceMode::Json);
        assert!(!config.performance.is_binary());

        let config = TransportConfig::from_json_str(r#"{"performance": "chunked_binary"}"#).unwrap();
        assert_eq!(config.performance, PerformanceMode::ChunkedBinary);
    }

    #[test]
    fn test_atlas_options() {
        assert_eq!(AtlasOptions::default().image_width, 2048);
        assert_eq!(AtlasOptions::default().with_image_width(512).image_width, 512);
    }
}
