//! In-process messenger and method channels.
//!
//! The [`Messenger`] routes method calls to handlers registered under a
//! channel name and collects the method calls the native side sends back
//! to the host (lifecycle events). Everything lives on the main context,
//! so the messenger is cheap to clone but not `Send`.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use serde_json::Value;
use tokio::sync::oneshot;

use crate::codec::{MethodCall, MethodResponse};
use crate::Error;

/// Receives method calls sent to a channel.
pub trait MethodCallHandler {
    /// Handle one call. The handler owns `reply` and must eventually send it,
    /// either before returning or from a later continuation.
    fn on_method_call(&self, call: MethodCall, reply: Reply);
}

impl<F> MethodCallHandler for F
where
    F: Fn(MethodCall, Reply),
{
    fn on_method_call(&self, call: MethodCall, reply: Reply) {
        self(call, reply);
    }
}

type ReplySink = Box<dyn FnOnce(MethodResponse)>;

/// One-shot reply slot for a method call.
///
/// Sending consumes the reply, so a call can be answered at most once. A
/// reply dropped without being sent delivers a `REPLY_DROPPED` error so the
/// caller still observes exactly one answer.
pub struct Reply {
    method: String,
    sink: Option<ReplySink>,
}

impl Reply {
    pub fn new<F>(method: impl Into<String>, sink: F) -> Self
    where
        F: FnOnce(MethodResponse) + 'static,
    {
        Self {
            method: method.into(),
            sink: Some(Box::new(sink)),
        }
    }

    /// A reply whose answer nobody is waiting for.
    #[must_use]
    pub fn detached(method: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            sink: None,
        }
    }

    /// Name of the method this reply answers.
    #[must_use]
    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn send(mut self, response: MethodResponse) {
        if let Some(sink) = self.sink.take() {
            sink(response);
        }
    }

    pub fn success(self, result: impl Into<Value>) {
        self.send(MethodResponse::success(result));
    }

    pub fn error(self, error: &Error) {
        self.send(MethodResponse::from_error(error));
    }

    pub fn not_implemented(self) {
        self.send(MethodResponse::NotImplemented);
    }
}

impl Drop for Reply {
    fn drop(&mut self) {
        if let Some(sink) = self.sink.take() {
            tracing::warn!("Reply to {} dropped without an answer", self.method);
            sink(MethodResponse::error(
                "REPLY_DROPPED",
                format!("{} finished without replying", self.method),
            ));
        }
    }
}

impl std::fmt::Debug for Reply {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reply")
            .field("method", &self.method)
            .field("pending", &self.sink.is_some())
            .finish()
    }
}

/// Host-side handle to a reply that may arrive later.
#[derive(Debug)]
pub struct PendingReply {
    receiver: oneshot::Receiver<MethodResponse>,
}

impl PendingReply {
    /// Take the reply if it has already been sent.
    pub fn try_take(&mut self) -> Option<MethodResponse> {
        self.receiver.try_recv().ok()
    }

    /// Wait for the reply.
    pub async fn wait(self) -> MethodResponse {
        self.receiver.await.unwrap_or_else(|_| {
            MethodResponse::error("REPLY_DROPPED", "reply channel closed")
        })
    }
}

/// A method call sent from the native side to the host.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundMessage {
    pub channel: String,
    pub call: MethodCall,
}

#[derive(Default)]
struct MessengerState {
    handlers: HashMap<String, Rc<dyn MethodCallHandler>>,
    outbound: VecDeque<OutboundMessage>,
}

/// Routes method calls between the host and native handlers.
#[derive(Clone, Default)]
pub struct Messenger {
    state: Rc<RefCell<MessengerState>>,
}

impl Messenger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Install or remove the handler for a channel.
    pub fn set_handler(&self, channel: &str, handler: Option<Rc<dyn MethodCallHandler>>) {
        let mut state = self.state.borrow_mut();
        match handler {
            Some(handler) => {
                state.handlers.insert(channel.to_string(), handler);
                tracing::debug!("Handler installed on {}", channel);
            }
            None => {
                if state.handlers.remove(channel).is_some() {
                    tracing::debug!("Handler removed from {}", channel);
                }
            }
        }
    }

    #[must_use]
    pub fn has_handler(&self, channel: &str) -> bool {
        self.state.borrow().handlers.contains_key(channel)
    }

    /// Deliver a host call to the channel's handler.
    ///
    /// Calls on a channel without a handler are answered with a
    /// `NO_HANDLER` error.
    pub fn send(&self, channel: &str, call: MethodCall, reply: Reply) {
        // Release the borrow before running the handler; handlers re-enter
        // the messenger to emit events or detach themselves.
        let handler = self.state.borrow().handlers.get(channel).cloned();
        match handler {
            Some(handler) => handler.on_method_call(call, reply),
            None => {
                tracing::warn!("Dropping {} on {}: no handler", call.method, channel);
                reply.error(&Error::NoHandler(channel.to_string()));
            }
        }
    }

    /// Deliver a host call and return a handle to its reply.
    pub fn call(&self, channel: &str, call: MethodCall) -> PendingReply {
        let (tx, receiver) = oneshot::channel();
        let reply = Reply::new(call.method.clone(), move |response| {
            let _ = tx.send(response);
        });
        self.send(channel, call, reply);
        PendingReply { receiver }
    }

    /// Queue a native-to-host call.
    pub fn post(&self, channel: &str, call: MethodCall) {
        tracing::trace!("Posting {} on {}", call.method, channel);
        self.state.borrow_mut().outbound.push_back(OutboundMessage {
            channel: channel.to_string(),
            call,
        });
    }

    /// Drain every queued native-to-host call.
    #[must_use]
    pub fn take_outbound(&self) -> Vec<OutboundMessage> {
        self.state.borrow_mut().outbound.drain(..).collect()
    }

    /// Drain the queued native-to-host calls of one channel, keeping the rest.
    #[must_use]
    pub fn take_outbound_for(&self, channel: &str) -> Vec<MethodCall> {
        let mut state = self.state.borrow_mut();
        let (matching, rest): (Vec<_>, Vec<_>) = state
            .outbound
            .drain(..)
            .partition(|message| message.channel == channel);
        state.outbound = rest.into();
        matching.into_iter().map(|message| message.call).collect()
    }
}

impl std::fmt::Debug for Messenger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("Messenger")
            .field("channels", &state.handlers.keys().collect::<Vec<_>>())
            .field("outbound", &state.outbound.len())
            .finish()
    }
}

/// A named channel on a messenger.
#[derive(Debug, Clone)]
pub struct MethodChannel {
    name: String,
    messenger: Messenger,
}

impl MethodChannel {
    pub fn new(messenger: &Messenger, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            messenger: messenger.clone(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_method_call_handler(&self, handler: Option<Rc<dyn MethodCallHandler>>) {
        self.messenger.set_handler(&self.name, handler);
    }

    /// Send a fire-and-forget call to the host.
    pub fn invoke_method(&self, method: &str, arguments: Value) {
        self.messenger.post(&self.name, MethodCall::new(method, arguments));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::cell::Cell;

    fn echo_handler() -> Rc<dyn MethodCallHandler> {
        Rc::new(|call: MethodCall, reply: Reply| match call.method.as_str() {
            "echo" => reply.success(call.arguments),
            _ => reply.not_implemented(),
        })
    }

    #[test]
    fn test_call_routes_to_handler() {
        let messenger = Messenger::new();
        messenger.set_handler("test", Some(echo_handler()));

        let mut pending = messenger.call("test", MethodCall::new("echo", json!({"a": 1})));
        let reply = pending.try_take().unwrap();
        assert_eq!(reply.result(), Some(&json!({"a": 1})));
    }

    #[test]
    fn test_unknown_method_is_not_implemented() {
        let messenger = Messenger::new();
        messenger.set_handler("test", Some(echo_handler()));

        let mut pending = messenger.call("test", MethodCall::bare("fly"));
        assert_eq!(pending.try_take(), Some(MethodResponse::NotImplemented));
    }

    #[test]
    fn test_call_without_handler() {
        let messenger = Messenger::new();
        let mut pending = messenger.call("nobody", MethodCall::bare("echo"));
        let reply = pending.try_take().unwrap();
        assert_eq!(reply.error_code(), Some("NO_HANDLER"));
    }

    #[test]
    fn test_removed_handler_stops_receiving() {
        let messenger = Messenger::new();
        messenger.set_handler("test", Some(echo_handler()));
        assert!(messenger.has_handler("test"));

        messenger.set_handler("test", None);
        assert!(!messenger.has_handler("test"));

        let mut pending = messenger.call("test", MethodCall::bare("echo"));
        assert_eq!(pending.try_take().unwrap().error_code(), Some("NO_HANDLER"));
    }

    #[test]
    fn test_dropped_reply_still_answers() {
        let messenger = Messenger::new();
        messenger.set_handler("test", Some(Rc::new(|_call: MethodCall, _reply: Reply| {})));

        let mut pending = messenger.call("test", MethodCall::bare("anything"));
        assert_eq!(pending.try_take().unwrap().error_code(), Some("REPLY_DROPPED"));
    }

    #[test]
    fn test_reply_sends_once() {
        let count = Rc::new(Cell::new(0));
        let seen = count.clone();
        let reply = Reply::new("m", move |_| seen.set(seen.get() + 1));
        reply.success(json!(null));
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn test_detached_reply_is_silent() {
        Reply::detached("event").success(json!(1));
        drop(Reply::detached("event"));
    }

    #[test]
    fn test_outbound_queue() {
        let messenger = Messenger::new();
        let a = MethodChannel::new(&messenger, "a");
        let b = MethodChannel::new(&messenger, "b");

        a.invoke_method("first", json!({}));
        b.invoke_method("second", json!({}));
        a.invoke_method("third", json!({}));

        let from_a = messenger.take_outbound_for("a");
        assert_eq!(from_a.len(), 2);
        assert_eq!(from_a[0].method, "first");
        assert_eq!(from_a[1].method, "third");

        let rest = messenger.take_outbound();
        assert_eq!(rest.len(), 1);
        assert_eq!(rest[0].channel, "b");
        assert!(messenger.take_outbound().is_empty());
    }

    #[tokio::test]
    async fn test_wait_for_deferred_reply() {
        let messenger = Messenger::new();
        let parked: Rc<RefCell<Option<Reply>>> = Rc::new(RefCell::new(None));
        let slot = parked.clone();
        messenger.set_handler(
            "test",
            Some(Rc::new(move |_call: MethodCall, reply: Reply| {
                *slot.borrow_mut() = Some(reply);
            })),
        );

        let mut pending = messenger.call("test", MethodCall::bare("later"));
        assert!(pending.try_take().is_none());

        parked.borrow_mut().take().unwrap().success("done");
        let reply = pending.wait().await;
        assert_eq!(reply.result(), Some(&json!("done")));
    }
}
