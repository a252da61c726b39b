//! Commands accepted on a browser view's channel.

use url::Url;

use crate::codec::MethodCall;
use crate::{Error, Result};

/// A validated per-view command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `url` is the caller's string, trimmed; it is passed to the widget
    /// as given rather than in normalized form.
    LoadUrl { url: String },
    GoBack,
    GoForward,
    Reload,
    StopLoading,
    CanGoBack,
    CanGoForward,
    IsLoading,
    GetProgress,
    GetCurrentUrl,
    GetTitle,
    EvaluateJavascript { javascript: String },
}

impl Command {
    /// Validate a method call.
    ///
    /// # Errors
    /// - `Error::MissingParameter` if a required argument is absent or not a string
    /// - `Error::InvalidUrl` if `loadUrl` is given something that is not an absolute URL
    /// - `Error::NotImplemented` for unknown method names
    pub fn parse(call: &MethodCall) -> Result<Self> {
        Ok(match call.method.as_str() {
            "loadUrl" => {
                let raw = call
                    .string_argument("url")
                    .ok_or(Error::MissingParameter("url"))?;
                Self::LoadUrl {
                    url: validate_url(raw)?,
                }
            }
            "goBack" => Self::GoBack,
            "goForward" => Self::GoForward,
            "reload" => Self::Reload,
            "stopLoading" => Self::StopLoading,
            "canGoBack" => Self::CanGoBack,
            "canGoForward" => Self::CanGoForward,
            "isLoading" => Self::IsLoading,
            "getProgress" => Self::GetProgress,
            "getCurrentUrl" => Self::GetCurrentUrl,
            "getTitle" => Self::GetTitle,
            "evaluateJavascript" => Self::EvaluateJavascript {
                javascript: call
                    .string_argument("javascript")
                    .ok_or(Error::MissingParameter("javascript"))?
                    .to_string(),
            },
            other => return Err(Error::NotImplemented(other.to_string())),
        })
    }

    /// Method name used on the wire.
    #[must_use]
    pub fn method(&self) -> &'static str {
        match self {
            Self::LoadUrl { .. } => "loadUrl",
            Self::GoBack => "goBack",
            Self::GoForward => "goForward",
            Self::Reload => "reload",
            Self::StopLoading => "stopLoading",
            Self::CanGoBack => "canGoBack",
            Self::CanGoForward => "canGoForward",
            Self::IsLoading => "isLoading",
            Self::GetProgress => "getProgress",
            Self::GetCurrentUrl => "getCurrentUrl",
            Self::GetTitle => "getTitle",
            Self::EvaluateJavascript { .. } => "evaluateJavascript",
        }
    }
}

/// Check that `raw` is an absolute URL and return it trimmed.
///
/// # Errors
/// Returns `Error::InvalidUrl` if `raw` does not parse.
pub fn validate_url(raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    Url::parse(trimmed).map_err(|e| Error::InvalidUrl(format!("{raw}: {e}")))?;
    Ok(trimmed.to_string())
}
