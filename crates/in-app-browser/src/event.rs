//! Lifecycle events sent from a browser view to the host.

use serde_json::{json, Value};

use crate::codec::MethodCall;
use crate::widget::LoadFailure;

/// A fire-and-forget notification about a widget state change.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewEvent {
    LoadingStateChanged { is_loading: bool },
    UrlChanged { url: String },
    TitleChanged { title: String },
    /// Estimated load progress in `[0.0, 1.0]`.
    ProgressChanged { progress: f64 },
    PageStarted { url: String },
    PageFinished { url: String },
    LoadError(LoadFailure),
}

impl ViewEvent {
    /// Method name used on the wire.
    #[must_use]
    pub fn method(&self) -> &'static str {
        match self {
            Self::LoadingStateChanged { .. } => "onLoadingStateChanged",
            Self::UrlChanged { .. } => "onUrlChanged",
            Self::TitleChanged { .. } => "onTitleChanged",
            Self::ProgressChanged { .. } => "onProgressChanged",
            Self::PageStarted { .. } => "onPageStarted",
            Self::PageFinished { .. } => "onPageFinished",
            Self::LoadError(_) => "onLoadError",
        }
    }

    #[must_use]
    pub fn arguments(&self) -> Value {
        match self {
            Self::LoadingStateChanged { is_loading } => json!({ "isLoading": is_loading }),
            Self::UrlChanged { url } | Self::PageStarted { url } | Self::PageFinished { url } => {
                json!({ "url": url })
            }
            Self::TitleChanged { title } => json!({ "title": title }),
            Self::ProgressChanged { progress } => json!({ "progress": progress }),
            Self::LoadError(failure) => json!({
                "url": failure.url,
                "code": failure.code,
                "description": failure.description,
                "provisional": failure.provisional,
            }),
        }
    }

    /// Decode an event the host received; `None` for unknown methods or
    /// malformed arguments.
    #[must_use]
    pub fn from_call(call: &MethodCall) -> Option<Self> {
        let string = |key: &str| call.string_argument(key).map(str::to_string);
        Some(match call.method.as_str() {
            "onLoadingStateChanged" => Self::LoadingStateChanged {
                is_loading: call.argument("isLoading")?.as_bool()?,
            },
            "onUrlChanged" => Self::UrlChanged { url: string("url")? },
            "onTitleChanged" => Self::TitleChanged { title: string("title")? },
            "onProgressChanged" => Self::ProgressChanged {
                progress: call.argument("progress")?.as_f64()?,
            },
            "onPageStarted" => Self::PageStarted { url: string("url")? },
            "onPageFinished" => Self::PageFinished { url: string("url")? },
            "onLoadError" => Self::LoadError(LoadFailure {
                url: string("url")?,
                code: i32::try_from(call.argument("code")?.as_i64()?).ok()?,
                description: string("description")?,
                provisional: call.argument("provisional")?.as_bool()?,
            }),
            _ => return None,
        })
    }

    #[must_use]
    pub fn to_call(&self) -> MethodCall {
        MethodCall::new(self.method(), self.arguments())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_wire_shape() {
        let call = ViewEvent::LoadingStateChanged { is_loading: true }.to_call();
        assert_eq!(call.method, "onLoadingStateChanged");
        assert_eq!(call.arguments, json!({"isLoading": true}));

        let call = ViewEvent::ProgressChanged { progress: 0.5 }.to_call();
        assert_eq!(call.arguments, json!({"progress": 0.5}));
    }

    #[test]
    fn test_load_error_arguments() {
        let event = ViewEvent::LoadError(LoadFailure {
            url: "https://down.example/".to_string(),
            code: -2,
            description: "host lookup failed".to_string(),
            provisional: true,
        });
        let args = event.arguments();
        assert_eq!(args["code"], -2);
        assert_eq!(args["provisional"], true);
        assert_eq!(ViewEvent::from_call(&event.to_call()), Some(event));
    }

    #[test]
    fn test_from_call_rejects_unknown_and_malformed() {
        assert!(ViewEvent::from_call(&MethodCall::bare("onSomethingElse")).is_none());
        assert!(ViewEvent::from_call(&MethodCall::new("onUrlChanged", json!({"url": 3}))).is_none());
        assert!(ViewEvent::from_call(&MethodCall::bare("onTitleChanged")).is_none());
    }
}
