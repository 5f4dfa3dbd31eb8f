// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use std::net::SocketAddr;
use std::path::PathBuf;

use neuro_kernel::proof::DEFAULT_THRESHOLD;
use neuro_kernel::signal::DEFAULT_DEVICE_ID;

pub const DEFAULT_CLIENT: &str = "agent-legacy";
pub const SYSTEM_NAME: &str = "Cortex-Sec Neuro Gateway";

#[derive(Debug, Clone)]
pub struct NodeConfig {
    pub bind_addr: SocketAddr,
    /// `None` keeps the ledger in memory only.
    pub ledger_path: Option<PathBuf>,
    pub policy_threshold: f64,
    /// Client assumed by legacy polls that do not name one.
    pub default_client: String,
    pub device_id: String,
    pub cors_origins: Vec<String>,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8008)),
            ledger_path: Some(PathBuf::from("data/consent.ledger")),
            policy_threshold: DEFAULT_THRESHOLD,
            default_client: DEFAULT_CLIENT.to_string(),
            device_id: DEFAULT_DEVICE_ID.to_string(),
            cors_origins: vec![
                "http://localhost:3000".to_string(),
                "http://127.0.0.1:3000".to_string(),
            ],
        }
    }
}

impl NodeConfig {
    /// Defaults overlaid with `NEURO_*` environment variables.
    ///
    /// Unparseable values are logged and ignored rather than aborting start-up.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut cfg = Self::default();

        if let Some(v) = lookup("NEURO_BIND_ADDR") {
            match v.parse() {
                Ok(addr) => cfg.bind_addr = addr,
                Err(e) => tracing::warn!("Ignoring NEURO_BIND_ADDR={:?}: {}", v, e),
            }
        }

        if let Some(v) = lookup("NEURO_LEDGER_PATH") {
            cfg.ledger_path = if v.trim().is_empty() {
                None
            } else {
                Some(PathBuf::from(v))
            };
        }

        if let Some(v) = lookup("NEURO_POLICY_THRESHOLD") {
            match v.parse::<f64>() {
                Ok(t) if t.is_finite() => cfg.policy_threshold = t,
                _ => tracing::warn!("Ignoring NEURO_POLICY_THRESHOLD={:?}", v),
            }
        }

        if let Some(v) = lookup("NEURO_DEFAULT_CLIENT") {
            if !v.trim().is_empty() {
                cfg.default_client = v.trim().to_string();
            }
        }

        if let Some(v) = lookup("NEURO_DEVICE_ID") {
            if !v.trim().is_empty() {
                cfg.device_id = v.trim().to_string();
            }
        }

        if let Some(v) = lookup("NEURO_CORS_ORIGINS") {
            cfg.cors_origins = v
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
        }

        cfg
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn test_defaults() {
        let cfg = NodeConfig::from_lookup(lookup(&[]));
        assert_eq!(cfg.bind_addr.port(), 8008);
        assert_eq!(cfg.policy_threshold, 75.0);
        assert_eq!(cfg.default_client, "agent-legacy");
        assert_eq!(cfg.cors_origins.len(), 2);
        assert!(cfg.ledger_path.is_some());
    }

    #[test]
    fn test_overlay() {
        let cfg = NodeConfig::from_lookup(lookup(&[
            ("NEURO_BIND_ADDR", "0.0.0.0:9000"),
            ("NEURO_LEDGER_PATH", ""),
            ("NEURO_POLICY_THRESHOLD", "60.5"),
            ("NEURO_CORS_ORIGINS", "https://a.example, https://b.example,"),
        ]));
        assert_eq!(cfg.bind_addr.port(), 9000);
        assert!(cfg.ledger_path.is_none());
        assert_eq!(cfg.policy_threshold, 60.5);
        assert_eq!(cfg.cors_origins, vec!["https://a.example", "https://b.example"]);
    }

    #[test]
    fn test_bad_values_keep_defaults() {
        let cfg = NodeConfig::from_lookup(lookup(&[
            ("NEURO_BIND_ADDR", "not-an-addr"),
            ("NEURO_POLICY_THRESHOLD", "NaN"),
        ]));
        assert_eq!(cfg.bind_addr.port(), 8008);
        assert_eq!(cfg.policy_threshold, 75.0);
    }
}
