//! PROJ.4-style descriptor string parsing.
//!
//! Grid definitions in the polar community are conventionally exchanged as
//! PROJ strings, e.g. the NSIDC south polar grid:
//!
//! ```text
//! +proj=stere +lat_0=-90 +lat_ts=-71 +lon_0=0 +k=1 +x_0=0 +y_0=0 +datum=WGS84 +units=m +no_defs
//! ```
//!
//! This module tokenizes such a string into typed parameter lookups. It does
//! not interpret the parameters; that is the job of the projection
//! constructors.

use crate::error::{ProjectionError, Result};

/// Parsed `+key=value` / `+flag` parameters of a PROJ.4 descriptor string.
#[derive(Debug, Clone)]
pub struct Proj4Params {
    params: Vec<(String, Option<String>)>,
}

impl Proj4Params {
    /// Parse a PROJ.4 descriptor string.
    ///
    /// Tokens are whitespace-separated and must start with `+`. A token is
    /// either a flag (`+no_defs`) or a key/value pair (`+lat_0=-90`).
    /// Unknown keys are kept so callers can decide what is relevant.
    pub fn parse(projstring: &str) -> Result<Self> {
        let mut params = Vec::new();

        for token in projstring.split_whitespace() {
            let body = token
                .strip_prefix('+')
                .ok_or_else(|| ProjectionError::InvalidProjString {
                    token: token.to_string(),
                    message: "token does not start with '+'".to_string(),
                })?;

            match body.split_once('=') {
                Some((key, value)) => {
                    if key.is_empty() || value.is_empty() {
                        return Err(ProjectionError::InvalidProjString {
                            token: token.to_string(),
                            message: "empty key or value".to_string(),
                        });
                    }
                    params.push((key.to_string(), Some(value.to_string())));
                }
                None => {
                    if body.is_empty() {
                        return Err(ProjectionError::InvalidProjString {
                            token: token.to_string(),
                            message: "empty token".to_string(),
                        });
                    }
                    params.push((body.to_string(), None));
                }
            }
        }

        Ok(Self { params })
    }

    /// Get the string value of a key, if present.
    pub fn value(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .and_then(|(_, v)| v.as_deref())
    }

    /// Check whether a bare flag (or any form of the key) is present.
    pub fn has(&self, key: &str) -> bool {
        self.params.iter().any(|(k, _)| k == key)
    }

    /// Get a numeric value for a key. Returns an error if the value does not
    /// parse as a float, `Ok(None)` if the key is absent.
    pub fn number(&self, key: &str) -> Result<Option<f64>> {
        match self.value(key) {
            None => Ok(None),
            Some(raw) => raw
                .parse::<f64>()
                .map(Some)
                .map_err(|_| ProjectionError::InvalidProjString {
                    token: format!("+{key}={raw}"),
                    message: "value is not a number".to_string(),
                }),
        }
    }

    /// Get a numeric value, falling back to a default when the key is absent.
    pub fn number_or(&self, key: &str, default: f64) -> Result<f64> {
        Ok(self.number(key)?.unwrap_or(default))
    }
}
