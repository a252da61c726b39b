//! Plugin-level configuration and channel naming.

use serde::{Deserialize, Serialize};

use crate::Result;

/// Namespace used when none is configured.
pub const DEFAULT_NAMESPACE: &str = "com.nocorps.in_app_browser";

/// Plugin configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PluginConfig {
    /// Prefix of every channel name the plugin registers.
    pub namespace: String,
    /// Overrides the OS name reported by `getPlatformVersion`.
    pub platform_name: Option<String>,
}

impl Default for PluginConfig {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
            platform_name: None,
        }
    }
}

impl PluginConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    #[must_use]
    pub fn with_platform_name(mut self, name: impl Into<String>) -> Self {
        self.platform_name = Some(name.into());
        self
    }

    /// Load a configuration from JSON; missing fields take their defaults.
    ///
    /// # Errors
    /// Returns an error if the text is not valid JSON for this type.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Name of the global command channel.
    #[must_use]
    pub fn global_channel(&self) -> &str {
        &self.namespace
    }

    /// Type id the view factory is registered under.
    #[must_use]
    pub fn view_type(&self) -> String {
        format!("{}/webview", self.namespace)
    }

    /// Name of the command channel of view `view_id`.
    #[must_use]
    pub fn view_channel(&self, view_id: i64) -> String {
        format!("{}/webview_{view_id}", self.namespace)
    }
}
