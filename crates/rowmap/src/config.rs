//! Handle configuration and per-statement options.

use crate::dialect::Dialect;
use crate::error::{OrmError, OrmResult};
use crate::named::{DEFAULT_PREFIX, is_name_char};
use serde::Deserialize;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Configuration for a [`Db`](crate::Db) handle.
///
/// Can be built in code or loaded from TOML:
///
/// ```toml
/// dialect = "postgres"
/// param_prefix = ":"
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DbConfig {
    /// Placeholder syntax and insert-key convention.
    pub dialect: Dialect,
    /// Character introducing a symbolic parameter in query clauses.
    pub param_prefix: char,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            dialect: Dialect::default(),
            param_prefix: DEFAULT_PREFIX,
        }
    }
}

impl DbConfig {
    /// Create a new configuration with defaults (SQLite, `@`).
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(raw: &str) -> OrmResult<Self> {
        let cfg: DbConfig = toml::from_str(raw)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    pub fn param_prefix(mut self, prefix: char) -> Self {
        self.param_prefix = prefix;
        self
    }

    /// A prefix that can also appear inside a name would never terminate a parameter.
    pub fn validate(&self) -> OrmResult<()> {
        if is_name_char(self.param_prefix) || self.param_prefix.is_whitespace() {
            return Err(OrmError::Config(format!(
                "invalid parameter prefix {:?}",
                self.param_prefix
            )));
        }
        Ok(())
    }
}

/// Per-statement execution options.
///
/// ```ignore
/// let opts = StmtOptions::new()
///     .timeout(Duration::from_secs(2))
///     .cancel_on(token.clone());
/// db.insert_with(&company, &opts).await?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct StmtOptions {
    /// Abort the statement after this long.
    pub timeout: Option<Duration>,
    /// Abort the statement when this token is cancelled.
    pub cancel: Option<CancellationToken>,
}

impl StmtOptions {
    pub const NONE: StmtOptions = StmtOptions {
        timeout: None,
        cancel: None,
    };

    pub fn new() -> Self {
        Self::default()
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn cancel_on(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }
}
