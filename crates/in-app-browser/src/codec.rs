//! Message encoding for the command channels.
//!
//! Every message is a `serde_json::Value` tree with string keys. Method calls
//! travel in both directions: the host invokes commands on the native side,
//! and the native side invokes event methods on the host. Replies only travel
//! back to whoever issued the call.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{Error, Result};

/// A named request with an optional argument map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodCall {
    pub method: String,
    #[serde(default)]
    pub arguments: Value,
}

impl MethodCall {
    #[must_use]
    pub fn new(method: impl Into<String>, arguments: Value) -> Self {
        Self {
            method: method.into(),
            arguments,
        }
    }

    /// A call without arguments.
    #[must_use]
    pub fn bare(method: impl Into<String>) -> Self {
        Self::new(method, Value::Null)
    }

    /// Look up a named argument. Non-map arguments have no named entries.
    #[must_use]
    pub fn argument(&self, key: &str) -> Option<&Value> {
        self.arguments.get(key)
    }

    /// A named argument, if it is present and a string.
    #[must_use]
    pub fn string_argument(&self, key: &str) -> Option<&str> {
        self.argument(key).and_then(Value::as_str)
    }

    /// Decode a call from JSON text.
    ///
    /// # Errors
    /// Returns an error if the text is not a valid method call.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Encode the call as JSON text.
    ///
    /// # Errors
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// The single reply produced for a method call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum MethodResponse {
    Success {
        #[serde(default)]
        result: Value,
    },
    Error {
        code: String,
        message: Option<String>,
        #[serde(default)]
        details: Value,
    },
    NotImplemented,
}

impl MethodResponse {
    #[must_use]
    pub fn success(result: impl Into<Value>) -> Self {
        Self::Success {
            result: result.into(),
        }
    }

    /// An empty success reply (`null` result).
    #[must_use]
    pub fn done() -> Self {
        Self::Success {
            result: Value::Null,
        }
    }

    #[must_use]
    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Error {
            code: code.into(),
            message: Some(message.into()),
            details: Value::Null,
        }
    }

    /// Build the reply for a failed command.
    ///
    /// `Error::NotImplemented` gets the dedicated reply rather than an error
    /// code so hosts can tell a missing method from a failing one.
    #[must_use]
    pub fn from_error(error: &Error) -> Self {
        match error {
            Error::NotImplemented(_) => Self::NotImplemented,
            other => Self::error(other.code(), other.to_string()),
        }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// The success value, if this is a success reply.
    #[must_use]
    pub fn result(&self) -> Option<&Value> {
        match self {
            Self::Success { result } => Some(result),
            _ => None,
        }
    }

    /// The error code, if this is an error reply.
    #[must_use]
    pub fn error_code(&self) -> Option<&str> {
        match self {
            Self::Error { code, .. } => Some(code),
            _ => None,
        }
    }

    /// Encode the reply as JSON text.
    ///
    /// # Errors
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

impl From<Result<Value>> for MethodResponse {
    fn from(result: Result<Value>) -> Self {
        match result {
            Ok(value) => Self::success(value),
            Err(e) => Self::from_error(&e),
        }
    }
}
