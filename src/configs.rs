//! Configuration Module
//!
//! Loads the trust-domain values that drive the test matrix from a TOML file.
//! The eight values are held read-only for the whole run; the generator
//! treats them as opaque strings and wires them through exactly as given.
//! Whether an "invalid" value really falls outside the corresponding "valid"
//! subtree is the caller's responsibility, not checked here.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub trust_domain: TrustDomainValues,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            trust_domain: TrustDomainValues::default(),
            output_dir: default_output_dir(),
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("certificates")
}

/// The eight configured test inputs: a hostname, an IP address, a DNS
/// subtree and an IP subtree, each in a "valid" and an "invalid" flavor.
///
/// Subtree values must be in a form openssl's extension parser accepts:
/// DNS subtrees as a domain suffix, IP subtrees as `address/netmask`.
#[derive(Debug, Deserialize, Clone)]
pub struct TrustDomainValues {
    #[serde(default = "default_valid_hostname")]
    pub valid_hostname: String,
    #[serde(default = "default_valid_ip")]
    pub valid_ip: String,
    #[serde(default = "default_valid_host_subtree")]
    pub valid_host_subtree: String,
    #[serde(default = "default_valid_ip_subtree")]
    pub valid_ip_subtree: String,

    #[serde(default = "default_invalid_hostname")]
    pub invalid_hostname: String,
    #[serde(default = "default_invalid_ip")]
    pub invalid_ip: String,
    #[serde(default = "default_invalid_host_subtree")]
    pub invalid_host_subtree: String,
    #[serde(default = "default_invalid_ip_subtree")]
    pub invalid_ip_subtree: String,
}

impl Default for TrustDomainValues {
    fn default() -> Self {
        Self {
            valid_hostname: default_valid_hostname(),
            valid_ip: default_valid_ip(),
            valid_host_subtree: default_valid_host_subtree(),
            valid_ip_subtree: default_valid_ip_subtree(),
            invalid_hostname: default_invalid_hostname(),
            invalid_ip: default_invalid_ip(),
            invalid_host_subtree: default_invalid_host_subtree(),
            invalid_ip_subtree: default_invalid_ip_subtree(),
        }
    }
}

fn default_valid_hostname() -> String {
    "test.example.com".to_string()
}

fn default_valid_ip() -> String {
    "10.0.0.1".to_string()
}

fn default_valid_host_subtree() -> String {
    "example.com".to_string()
}

fn default_valid_ip_subtree() -> String {
    "10.0.0.0/255.0.0.0".to_string()
}

fn default_invalid_hostname() -> String {
    "test.invalid.example".to_string()
}

fn default_invalid_ip() -> String {
    "192.168.0.1".to_string()
}

fn default_invalid_host_subtree() -> String {
    "invalid.example".to_string()
}

fn default_invalid_ip_subtree() -> String {
    "192.168.0.0/255.255.0.0".to_string()
}

impl AppConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &str) -> Result<Self> {
        let config_str =
            fs::read_to_string(path).context(format!("Failed to read config file: {}", path))?;

        let config: AppConfig =
            toml::from_str(&config_str).context("Failed to parse config file")?;

        Ok(config)
    }

    /// Load configuration with default path (config.toml), falling back to
    /// built-in defaults when the file does not exist.
    pub fn load() -> Result<Self> {
        if std::path::Path::new("config.toml").exists() {
            Self::from_file("config.toml")
        } else {
            Ok(Self::default())
        }
    }
}
