// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Configuration is loaded from the environment at startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `CERTVERIFY_BACKEND_URL` | Base URL of the certificate backend | Required |
//! | `CERTVERIFY_IDENTITY_URL` | Base URL of the identity provider | Required |
//! | `CERTVERIFY_HTTP_TIMEOUT_SECS` | Per-request HTTP timeout in seconds | `15` |
//! | `CERTVERIFY_LOGIN_WINDOW` | Authorization surface geometry, `WIDTHxHEIGHT` | `500x600` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info` |

use std::time::Duration;

use url::Url;

/// Environment variable name for the certificate backend base URL.
pub const BACKEND_URL_ENV: &str = "CERTVERIFY_BACKEND_URL";

/// Environment variable name for the identity provider base URL.
pub const IDENTITY_URL_ENV: &str = "CERTVERIFY_IDENTITY_URL";

/// Environment variable name for the per-request HTTP timeout (seconds).
pub const HTTP_TIMEOUT_ENV: &str = "CERTVERIFY_HTTP_TIMEOUT_SECS";

/// Environment variable name for the login window geometry (`WIDTHxHEIGHT`).
pub const LOGIN_WINDOW_ENV: &str = "CERTVERIFY_LOGIN_WINDOW";

const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 15;
const DEFAULT_LOGIN_WINDOW: WindowGeometry = WindowGeometry {
    width: 500,
    height: 600,
};

/// Display geometry requested for the identity provider's interactive
/// authorization surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowGeometry {
    pub width: u32,
    pub height: u32,
}

impl std::fmt::Display for WindowGeometry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl WindowGeometry {
    /// Parse `WIDTHxHEIGHT` (e.g. `500x600`).
    pub fn parse(raw: &str) -> Option<Self> {
        let (w, h) = raw.trim().split_once(['x', 'X'])?;
        Some(Self {
            width: w.trim().parse().ok()?,
            height: h.trim().parse().ok()?,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("configuration missing: {0}")]
    Missing(&'static str),

    #[error("configuration invalid: {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Resolved runtime configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the certificate backend.
    pub backend_url: Url,
    /// Base URL of the identity provider.
    pub identity_url: Url,
    /// Per-request HTTP timeout.
    pub http_timeout: Duration,
    /// Geometry hint forwarded to the identity provider at login.
    pub login_window: WindowGeometry,
}

impl Config {
    /// Load configuration from the environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let backend_url = parse_url(BACKEND_URL_ENV)?;
        let identity_url = parse_url(IDENTITY_URL_ENV)?;

        let http_timeout = match env_optional(HTTP_TIMEOUT_ENV) {
            Some(raw) => {
                let secs: u64 = raw.parse().map_err(|e| ConfigError::Invalid {
                    name: HTTP_TIMEOUT_ENV,
                    reason: format!("{e}"),
                })?;
                Duration::from_secs(secs)
            }
            None => Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        };

        let login_window = match env_optional(LOGIN_WINDOW_ENV) {
            Some(raw) => WindowGeometry::parse(&raw).ok_or(ConfigError::Invalid {
                name: LOGIN_WINDOW_ENV,
                reason: format!("expected WIDTHxHEIGHT, got {raw:?}"),
            })?,
            None => DEFAULT_LOGIN_WINDOW,
        };

        Ok(Self {
            backend_url,
            identity_url,
            http_timeout,
            login_window,
        })
    }
}

fn parse_url(name: &'static str) -> Result<Url, ConfigError> {
    let raw = env_optional(name).ok_or(ConfigError::Missing(name))?;
    Url::parse(&raw).map_err(|e| ConfigError::Invalid {
        name,
        reason: format!("{e}"),
    })
}

fn env_optional(name: &str) -> Option<String> {
    match std::env::var(name) {
        Ok(value) => {
            let trimmed = value.trim().to_string();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed)
            }
        }
        Err(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_geometry_parses_well_formed_input() {
        assert_eq!(
            WindowGeometry::parse("500x600"),
            Some(WindowGeometry {
                width: 500,
                height: 600
            })
        );
        assert_eq!(
            WindowGeometry::parse(" 800X400 "),
            Some(WindowGeometry {
                width: 800,
                height: 400
            })
        );
    }

    #[test]
    fn window_geometry_rejects_malformed_input() {
        assert_eq!(WindowGeometry::parse("500"), None);
        assert_eq!(WindowGeometry::parse("x600"), None);
        assert_eq!(WindowGeometry::parse("wide x tall"), None);
    }

    #[test]
    fn window_geometry_display_matches_env_format() {
        let geometry = WindowGeometry {
            width: 500,
            height: 600,
        };
        assert_eq!(geometry.to_string(), "500x600");
    }
}
