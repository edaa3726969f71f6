use serde::{Deserialize, Serialize};
use tracing::warn;

/// Generates a `Debug` impl that redacts secret fields.
///
/// Field specifiers:
/// - `field_name`            : printed normally via `&self.field_name`
/// - `redact(field_name)`    : `String` field: shows `[empty]` or `[REDACTED]`
macro_rules! redact_debug {
    // Internal: emit a single .field() call
    (@field $builder:ident, $self:ident, redact($field:ident)) => {
        $builder.field(
            stringify!($field),
            &if $self.$field.is_empty() {
                "[empty]"
            } else {
                "[REDACTED]"
            },
        );
    };
    (@field $builder:ident, $self:ident, $field:ident) => {
        $builder.field(stringify!($field), &$self.$field);
    };

    // Internal: recursive TT muncher
    (@fields $builder:ident, $self:ident,) => {};
    (@fields $builder:ident, $self:ident, redact($field:ident), $($rest:tt)*) => {
        redact_debug!(@field $builder, $self, redact($field));
        redact_debug!(@fields $builder, $self, $($rest)*);
    };
    (@fields $builder:ident, $self:ident, $field:ident, $($rest:tt)*) => {
        redact_debug!(@field $builder, $self, $field);
        redact_debug!(@fields $builder, $self, $($rest)*);
    };

    // Entry point
    ($struct_name:ident, $($fields:tt)*) => {
        impl std::fmt::Debug for $struct_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                let mut builder = f.debug_struct(stringify!($struct_name));
                redact_debug!(@fields builder, self, $($fields)*);
                builder.finish()
            }
        }
    };
}

// Declared after the macro so they can use `redact_debug!`
mod channels;
mod tools;

pub use channels::*;
pub use tools::*;

// ---------------------------------------------------------------------------
// Gateway
// ---------------------------------------------------------------------------

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    18790
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

// ---------------------------------------------------------------------------
// Top-level Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub channels: ChannelsConfig,
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub tools: ToolsConfig,
}

impl Config {
    /// Validate configuration values. Missing channel credentials are not an
    /// error here: the channel reports them when it is started.
    pub fn validate(&self) -> Result<(), crate::errors::BridgeError> {
        self.validate_gateway()?;
        self.validate_tools()?;
        self.validate_channels()?;
        Ok(())
    }

    fn validate_gateway(&self) -> Result<(), crate::errors::BridgeError> {
        use crate::errors::BridgeError;
        if self.gateway.port == 0 {
            return Err(BridgeError::Config("gateway.port must be > 0".into()));
        }
        if self.gateway.host.trim().is_empty() {
            return Err(BridgeError::Config("gateway.host must not be empty".into()));
        }
        Ok(())
    }

    fn validate_tools(&self) -> Result<(), crate::errors::BridgeError> {
        use crate::errors::BridgeError;
        if self.tools.exec.timeout == 0 {
            return Err(BridgeError::Config("tools.exec.timeout must be > 0".into()));
        }
        Ok(())
    }

    fn validate_channels(&self) -> Result<(), crate::errors::BridgeError> {
        use crate::errors::BridgeError;
        let qq = &self.channels.qq;

        if qq.reconnect_delay_secs == 0 {
            return Err(BridgeError::Config(
                "channels.qq.reconnectDelaySecs must be > 0".into(),
            ));
        }
        if qq.reconnect_delay_secs > 3600 {
            return Err(BridgeError::Config(
                "channels.qq.reconnectDelaySecs is unreasonably large (> 3600)".into(),
            ));
        }
        if qq.dedup_capacity == 0 {
            return Err(BridgeError::Config(
                "channels.qq.dedupCapacity must be > 0".into(),
            ));
        }
        if qq.enabled && !qq.has_credentials() {
            warn!("channels.qq is enabled but appId/secret are not set; the channel will not connect");
        }
        Ok(())
    }
}
