//! Codec configuration.
//!
//! Values the wire does not carry but the codec needs: the short header DCID
//! length, the AEAD tag length and the datagram size. Loaded from TOML.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::coalesce::DatagramBuilder;
use crate::packet::ParseContext;
use crate::types::{
    PacketNumber, DEFAULT_MAX_UDP_PAYLOAD_SIZE, MAX_CID_LENGTH_V1, MAX_UDP_PAYLOAD_SIZE_IPV4,
};
use crate::version::{VERSION_1, VERSION_NEGOTIATION};

/// Configuration validator trait.
pub trait ConfigValidator {
    /// Validate the configuration.
    ///
    /// Returns `Ok(())` if valid, or a list of error messages if invalid.
    fn validate(&self) -> Result<(), Vec<String>>;
}

/// Packet codec configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecConfig {
    /// Largest datagram the builder fills (RFC 9000 Section 14)
    pub max_datagram_size: usize,

    /// Length of the connection IDs this endpoint issues, which is what
    /// short headers addressed to it carry
    pub short_header_dcid_len: u8,

    /// AEAD tag length of the negotiated cipher suite
    pub aead_tag_len: usize,

    /// Versions advertised in Version Negotiation, in preference order
    pub supported_versions: Vec<u32>,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            max_datagram_size: DEFAULT_MAX_UDP_PAYLOAD_SIZE,
            short_header_dcid_len: 8,
            aead_tag_len: 16,
            supported_versions: vec![VERSION_1],
        }
    }
}

impl CodecConfig {
    /// Parse context for a packet number space whose largest processed
    /// packet number is `largest`.
    pub fn parse_context(&self, largest: Option<PacketNumber>) -> ParseContext {
        ParseContext {
            largest_pn: largest,
            short_dcid_len: self.short_header_dcid_len,
            tag_len: self.aead_tag_len,
        }
    }

    pub fn datagram_builder(&self) -> DatagramBuilder {
        DatagramBuilder::new(self.max_datagram_size)
    }
}

impl ConfigValidator for CodecConfig {
    fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if !(DEFAULT_MAX_UDP_PAYLOAD_SIZE..=MAX_UDP_PAYLOAD_SIZE_IPV4)
            .contains(&self.max_datagram_size)
        {
            errors.push(format!(
                "max_datagram_size ({}) must be between {} and {}",
                self.max_datagram_size, DEFAULT_MAX_UDP_PAYLOAD_SIZE, MAX_UDP_PAYLOAD_SIZE_IPV4
            ));
        }

        if self.short_header_dcid_len as usize > MAX_CID_LENGTH_V1 {
            errors.push(format!(
                "short_header_dcid_len ({}) exceeds the QUIC v1 limit of {}",
                self.short_header_dcid_len, MAX_CID_LENGTH_V1
            ));
        }

        if self.supported_versions.is_empty() {
            errors.push("supported_versions must not be empty".to_string());
        }
        if self.supported_versions.contains(&VERSION_NEGOTIATION) {
            errors.push("supported_versions must not contain 0x00000000".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Load codec configuration from a TOML file.
///
/// A missing file yields the defaults.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, or if validation
/// fails.
pub fn load(path: impl AsRef<Path>) -> Result<CodecConfig> {
    let path = path.as_ref();

    let config = if path.exists() {
        let config_str = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&config_str)
            .with_context(|| format!("Failed to parse TOML config: {}", path.display()))?
    } else {
        tracing::warn!(
            config_path = %path.display(),
            "Configuration file not found, using defaults"
        );
        CodecConfig::default()
    };

    config.validate().map_err(|errors| {
        anyhow::anyhow!("Configuration validation failed:\n{}", errors.join("\n"))
    })?;

    Ok(config)
}
