use serde::{Deserialize, Serialize};

fn default_timeout() -> u64 {
    60
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecToolConfig {
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for ExecToolConfig {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ToolsConfig {
    #[serde(default)]
    pub exec: ExecToolConfig,
    /// Formerly `tools.exec.restrictToWorkspace`; moved by the loader's migration.
    #[serde(default, rename = "restrictToWorkspace")]
    pub restrict_to_workspace: bool,
}
