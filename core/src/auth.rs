//! Authorization header construction.
//!
//! Only HTTP Basic is implemented. Digest is a recognised method name but
//! always fails, so a config asking for it is rejected up front instead of
//! silently sending unauthenticated requests.

use std::fmt;
use std::str::FromStr;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::config::AuthConfig;
use crate::error::{RestError, Result};

pub const AUTHORIZATION: &str = "Authorization";

/// Supported authorization schemes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMethod {
    Basic,
    Digest,
}

impl AuthMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthMethod::Basic => "basic",
            AuthMethod::Digest => "digest",
        }
    }
}

impl fmt::Display for AuthMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuthMethod {
    type Err = RestError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "basic" => Ok(AuthMethod::Basic),
            "digest" => Ok(AuthMethod::Digest),
            _ => Err(RestError::config(format!(
                "authentication method \"{s}\" does not exist"
            ))),
        }
    }
}

/// A computed `Authorization` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Authorization {
    method: AuthMethod,
    value: String,
}

impl Authorization {
    pub fn new(username: &str, password: &str, method: AuthMethod) -> Result<Self> {
        if username.is_empty() || password.is_empty() {
            return Err(RestError::config("username and/or password can not be empty"));
        }

        let value = match method {
            AuthMethod::Basic => basic(username, password),
            AuthMethod::Digest => {
                return Err(RestError::config("digest authorization is not supported"));
            }
        };

        Ok(Self { method, value })
    }

    /// Build from a config block. Credentials are checked before the method
    /// name.
    pub fn from_config(config: &AuthConfig) -> Result<Self> {
        if config.username.is_empty() || config.password.is_empty() {
            return Err(RestError::config("username and/or password can not be empty"));
        }
        let method = config.method.parse()?;
        Self::new(&config.username, &config.password, method)
    }

    pub fn method(&self) -> AuthMethod {
        self.method
    }

    /// The `(name, value)` pair to merge into the outgoing headers.
    pub fn header(&self) -> (&'static str, &str) {
        (AUTHORIZATION, &self.value)
    }
}

fn basic(username: &str, password: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{username}:{password}")))
}
