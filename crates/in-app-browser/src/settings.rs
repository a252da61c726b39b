//! Per-view configuration options.

use serde_json::{Map, Value};

/// Options applied to a widget once, at construction.
///
/// Every field is optional: `None` keeps the backend's default. Backends
/// apply the options they support and ignore the rest.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WebViewSettings {
    /// Enable JavaScript
    pub javascript_enabled: Option<bool>,
    /// Enable `localStorage` / `sessionStorage`
    pub dom_storage_enabled: Option<bool>,
    /// Enable HTML5 databases
    pub database_enabled: Option<bool>,
    /// Honour the viewport meta tag
    pub use_wide_view_port: Option<bool>,
    /// Zoom out to fit content on first load
    pub load_with_overview_mode: Option<bool>,
    /// Allow `file://` access
    pub allow_file_access: Option<bool>,
    /// Allow content provider access
    pub allow_content_access: Option<bool>,
    /// Play media inline rather than fullscreen
    pub allows_inline_media_playback: Option<bool>,
    /// Swipe gestures for back/forward navigation
    pub allows_back_forward_navigation_gestures: Option<bool>,
    /// Enable developer tools
    pub developer_extras_enabled: Option<bool>,
    /// User agent string
    pub user_agent: Option<String>,
}

impl WebViewSettings {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse options from a loosely typed settings map.
    ///
    /// Unknown keys are ignored and values of the wrong type are treated as
    /// absent; parsing never fails.
    #[must_use]
    pub fn from_map(map: &Map<String, Value>) -> Self {
        let flag = |key: &str| {
            let value = map.get(key)?;
            let parsed = value.as_bool();
            if parsed.is_none() {
                tracing::warn!("Ignoring setting {}: expected a boolean, got {}", key, value);
            }
            parsed
        };

        let settings = Self {
            javascript_enabled: flag("javaScriptEnabled"),
            dom_storage_enabled: flag("domStorageEnabled"),
            database_enabled: flag("databaseEnabled"),
            use_wide_view_port: flag("useWideViewPort"),
            load_with_overview_mode: flag("loadWithOverviewMode"),
            allow_file_access: flag("allowFileAccess"),
            allow_content_access: flag("allowContentAccess"),
            allows_inline_media_playback: flag("allowsInlineMediaPlayback"),
            allows_back_forward_navigation_gestures: flag("allowsBackForwardNavigationGestures"),
            developer_extras_enabled: flag("developerExtrasEnabled"),
            user_agent: map.get("userAgent").and_then(Value::as_str).map(str::to_string),
        };

        tracing::debug!("Parsed web view settings: {:?}", settings);
        settings
    }

    /// Parse options from any value; non-maps yield the defaults.
    #[must_use]
    pub fn from_value(value: Option<&Value>) -> Self {
        value
            .and_then(Value::as_object)
            .map(Self::from_map)
            .unwrap_or_default()
    }

    #[must_use]
    pub fn with_javascript(mut self, enabled: bool) -> Self {
        self.javascript_enabled = Some(enabled);
        self
    }

    #[must_use]
    pub fn with_dom_storage(mut self, enabled: bool) -> Self {
        self.dom_storage_enabled = Some(enabled);
        self
    }

    #[must_use]
    pub fn with_file_access(mut self, enabled: bool) -> Self {
        self.allow_file_access = Some(enabled);
        self
    }

    #[must_use]
    pub fn with_developer_extras(mut self, enabled: bool) -> Self {
        self.developer_extras_enabled = Some(enabled);
        self
    }

    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_settings_default_keeps_everything_unset() {
        let settings = WebViewSettings::default();
        assert!(settings.javascript_enabled.is_none());
        assert!(settings.allow_file_access.is_none());
        assert!(settings.user_agent.is_none());
    }

    #[test]
    fn test_settings_from_map() {
        let settings = WebViewSettings::from_map(&map(json!({
            "javaScriptEnabled": false,
            "useWideViewPort": true,
            "allowsInlineMediaPlayback": true,
            "userAgent": "InAppBrowser/1.0",
        })));

        assert_eq!(settings.javascript_enabled, Some(false));
        assert_eq!(settings.use_wide_view_port, Some(true));
        assert_eq!(settings.allows_inline_media_playback, Some(true));
        assert_eq!(settings.user_agent.as_deref(), Some("InAppBrowser/1.0"));
        assert!(settings.dom_storage_enabled.is_none());
    }

    #[test]
    fn test_settings_unknown_keys_ignored() {
        let settings = WebViewSettings::from_map(&map(json!({"teleport": true})));
        assert_eq!(settings, WebViewSettings::default());
    }

    #[test]
    fn test_settings_wrong_types_treated_as_absent() {
        let settings = WebViewSettings::from_map(&map(json!({
            "javaScriptEnabled": "yes",
            "allowFileAccess": 1,
            "userAgent": false,
        })));
        assert_eq!(settings, WebViewSettings::default());
    }

    #[test]
    fn test_settings_from_non_map_value() {
        assert_eq!(WebViewSettings::from_value(Some(&json!([1, 2]))), WebViewSettings::default());
        assert_eq!(WebViewSettings::from_value(None), WebViewSettings::default());
    }

    #[test]
    fn test_settings_builder_chain() {
        let settings = WebViewSettings::new()
            .with_javascript(true)
            .with_file_access(false)
            .with_developer_extras(true)
            .with_user_agent("test");

        assert_eq!(settings.javascript_enabled, Some(true));
        assert_eq!(settings.allow_file_access, Some(false));
        assert_eq!(settings.developer_extras_enabled, Some(true));
        assert_eq!(settings.user_agent.as_deref(), Some("test"));
    }
}
