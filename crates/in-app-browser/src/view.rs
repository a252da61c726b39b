//! A browser view: one widget, one command channel.
//!
//! The view moves through `Uninitialized → Ready → Disposed`. While ready it
//! turns channel method calls into widget operations and widget callbacks
//! into outbound events. Disposal detaches the channel handler first and
//! destroys the widget second; nothing is emitted once it has begun.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use serde_json::Value;

use crate::channel::{MethodCallHandler, MethodChannel, Reply};
use crate::codec::MethodCall;
use crate::command::{validate_url, Command};
use crate::event::ViewEvent;
use crate::factory::CreationParams;
use crate::widget::{LoadFailure, NavigationObserver, WebWidget};
use crate::Error;

/// Script used to read the title from widgets that do not expose it.
const TITLE_SCRIPT: &str = "document.title";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Uninitialized,
    Ready,
    Disposed,
}

/// Page state as last reported by the widget.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewSnapshot {
    pub url: String,
    pub title: String,
    pub is_loading: bool,
    pub progress: f64,
}

type DisposeHook = Box<dyn FnOnce(i64)>;

struct ViewInner {
    id: i64,
    channel: MethodChannel,
    widget: RefCell<Box<dyn WebWidget>>,
    state: RefCell<ViewSnapshot>,
    lifecycle: Cell<Lifecycle>,
    on_dispose: RefCell<Option<DisposeHook>>,
}

/// Coerce a script result to the string sent back to the host.
fn script_result_to_string(value: Value) -> String {
    match value {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

impl ViewInner {
    fn is_ready(&self) -> bool {
        self.lifecycle.get() == Lifecycle::Ready
    }

    fn emit(&self, event: &ViewEvent) {
        if !self.is_ready() {
            return;
        }
        tracing::debug!("View {} emitting {}", self.id, event.method());
        self.channel.invoke_method(event.method(), event.arguments());
    }

    fn handle(self: &Rc<Self>, call: &MethodCall, reply: Reply) {
        if !self.is_ready() {
            reply.error(&Error::Disposed(self.id));
            return;
        }

        let command = match Command::parse(call) {
            Ok(command) => command,
            Err(e) => {
                tracing::warn!("View {} rejected {}: {}", self.id, call.method, e);
                reply.error(&e);
                return;
            }
        };
        tracing::debug!("View {} dispatching {}", self.id, command.method());

        match command {
            Command::LoadUrl { url } => {
                self.widget.borrow_mut().load_url(&url);
                reply.success(Value::Null);
            }
            Command::GoBack => {
                let mut widget = self.widget.borrow_mut();
                if widget.can_go_back() {
                    widget.go_back();
                }
                drop(widget);
                reply.success(Value::Null);
            }
            Command::GoForward => {
                let mut widget = self.widget.borrow_mut();
                if widget.can_go_forward() {
                    widget.go_forward();
                }
                drop(widget);
                reply.success(Value::Null);
            }
            Command::Reload => {
                self.widget.borrow_mut().reload();
                reply.success(Value::Null);
            }
            Command::StopLoading => {
                self.widget.borrow_mut().stop_loading();
                reply.success(Value::Null);
            }
            Command::CanGoBack => {
                let can = self.widget.borrow().can_go_back();
                reply.success(can);
            }
            Command::CanGoForward => {
                let can = self.widget.borrow().can_go_forward();
                reply.success(can);
            }
            Command::IsLoading => {
                let loading = self.widget.borrow().is_loading();
                reply.success(loading);
            }
            Command::GetProgress => {
                let progress = self.state.borrow().progress;
                reply.success(progress);
            }
            Command::GetCurrentUrl => {
                let url = self.widget.borrow().url();
                reply.success(url.unwrap_or_else(|| self.state.borrow().url.clone()));
            }
            Command::GetTitle => {
                let title = self.widget.borrow().title();
                reply.success(title.unwrap_or_else(|| self.state.borrow().title.clone()));
            }
            Command::EvaluateJavascript { javascript } => {
                let id = self.id;
                self.widget.borrow_mut().evaluate_javascript(
                    &javascript,
                    Box::new(move |result| match result {
                        Ok(value) => reply.success(script_result_to_string(value)),
                        Err(e) => {
                            tracing::warn!("View {} script failed: {}", id, e);
                            let e = match e {
                                Error::ScriptEvaluation(_) => e,
                                other => Error::ScriptEvaluation(other.to_string()),
                            };
                            reply.error(&e);
                        }
                    }),
                );
            }
        }
    }

    fn set_title(&self, title: String) {
        if !self.is_ready() {
            return;
        }
        self.state.borrow_mut().title.clone_from(&title);
        self.emit(&ViewEvent::TitleChanged { title });
    }

    /// Announce the title after a page finished, asking the page when the
    /// widget does not expose it.
    fn refresh_title(self: &Rc<Self>) {
        let title = self.widget.borrow().title();
        if let Some(title) = title {
            self.set_title(title);
            return;
        }

        let weak = Rc::downgrade(self);
        self.widget.borrow_mut().evaluate_javascript(
            TITLE_SCRIPT,
            Box::new(move |result| {
                let Some(inner) = weak.upgrade() else {
                    return;
                };
                match result {
                    Ok(value) => inner.set_title(script_result_to_string(value)),
                    Err(e) => tracing::debug!("View {} could not read title: {}", inner.id, e),
                }
            }),
        );
    }

    fn dispose(&self) {
        if self.lifecycle.replace(Lifecycle::Disposed) == Lifecycle::Disposed {
            return;
        }

        self.channel.set_method_call_handler(None);
        {
            let mut widget = self.widget.borrow_mut();
            widget.set_observer(None);
            widget.destroy();
        }

        let hook = self.on_dispose.borrow_mut().take();
        if let Some(hook) = hook {
            hook(self.id);
        }
        tracing::info!("Disposed web view {}", self.id);
    }
}

/// Channel handler installed on the view's channel.
struct ViewHandler {
    id: i64,
    inner: Weak<ViewInner>,
}

impl MethodCallHandler for ViewHandler {
    fn on_method_call(&self, call: MethodCall, reply: Reply) {
        match self.inner.upgrade() {
            Some(inner) => inner.handle(&call, reply),
            None => reply.error(&Error::Disposed(self.id)),
        }
    }
}

/// Observer registered on the widget.
struct ViewObserver {
    inner: Weak<ViewInner>,
}

impl ViewObserver {
    fn ready(&self) -> Option<Rc<ViewInner>> {
        self.inner.upgrade().filter(|inner| inner.is_ready())
    }
}

impl NavigationObserver for ViewObserver {
    fn on_page_started(&self, url: &str) {
        let Some(inner) = self.ready() else { return };
        {
            let mut state = inner.state.borrow_mut();
            state.is_loading = true;
            state.url = url.to_string();
        }
        inner.emit(&ViewEvent::LoadingStateChanged { is_loading: true });
        inner.emit(&ViewEvent::UrlChanged { url: url.to_string() });
        inner.emit(&ViewEvent::PageStarted { url: url.to_string() });
    }

    fn on_page_finished(&self, url: &str) {
        let Some(inner) = self.ready() else { return };
        {
            let mut state = inner.state.borrow_mut();
            state.is_loading = false;
            state.url = url.to_string();
        }
        inner.emit(&ViewEvent::LoadingStateChanged { is_loading: false });
        inner.emit(&ViewEvent::UrlChanged { url: url.to_string() });
        inner.emit(&ViewEvent::PageFinished { url: url.to_string() });
        inner.refresh_title();
    }

    fn on_load_failed(&self, failure: &LoadFailure) {
        let Some(inner) = self.ready() else { return };
        tracing::warn!(
            "View {} failed to load {}: {} ({})",
            inner.id,
            failure.url,
            failure.description,
            failure.code
        );
        inner.state.borrow_mut().is_loading = false;
        inner.emit(&ViewEvent::LoadingStateChanged { is_loading: false });
        inner.emit(&ViewEvent::LoadError(failure.clone()));
    }

    fn on_progress_changed(&self, progress: f64) {
        let Some(inner) = self.ready() else { return };
        if !progress.is_finite() {
            tracing::warn!("View {} ignoring progress {}", inner.id, progress);
            return;
        }
        let progress = progress.clamp(0.0, 1.0);
        inner.state.borrow_mut().progress = progress;
        inner.emit(&ViewEvent::ProgressChanged { progress });
    }

    fn on_title_changed(&self, title: &str) {
        if let Some(inner) = self.ready() {
            inner.set_title(title.to_string());
        }
    }
}

/// One live embedded browser widget plus its dedicated channel.
pub struct BrowserView {
    inner: Rc<ViewInner>,
}

impl BrowserView {
    /// Configure `widget`, attach to `channel`, and start loading the
    /// initial URL if it is valid.
    ///
    /// An invalid initial URL is logged and not loaded.
    pub fn new(
        id: i64,
        channel: MethodChannel,
        widget: Box<dyn WebWidget>,
        params: &CreationParams,
    ) -> Self {
        let inner = Rc::new(ViewInner {
            id,
            channel,
            widget: RefCell::new(widget),
            state: RefCell::new(ViewSnapshot::default()),
            lifecycle: Cell::new(Lifecycle::Uninitialized),
            on_dispose: RefCell::new(None),
        });

        {
            let mut widget = inner.widget.borrow_mut();
            widget.apply_settings(&params.settings);
            widget.set_observer(Some(Rc::new(ViewObserver {
                inner: Rc::downgrade(&inner),
            })));
        }
        inner.channel.set_method_call_handler(Some(Rc::new(ViewHandler {
            id,
            inner: Rc::downgrade(&inner),
        })));
        inner.lifecycle.set(Lifecycle::Ready);

        if let Some(raw) = params.initial_url.as_deref() {
            match validate_url(raw) {
                Ok(url) => inner.widget.borrow_mut().load_url(&url),
                Err(e) => tracing::warn!("View {} not loading initial URL: {}", id, e),
            }
        }

        tracing::info!("Created web view {} on {}", id, inner.channel.name());
        Self { inner }
    }

    #[must_use]
    pub fn id(&self) -> i64 {
        self.inner.id
    }

    #[must_use]
    pub fn channel_name(&self) -> &str {
        self.inner.channel.name()
    }

    #[must_use]
    pub fn lifecycle(&self) -> Lifecycle {
        self.inner.lifecycle.get()
    }

    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.lifecycle() == Lifecycle::Disposed
    }

    /// Page state as last reported by the widget.
    #[must_use]
    pub fn snapshot(&self) -> ViewSnapshot {
        self.inner.state.borrow().clone()
    }

    /// Dispatch a call directly, bypassing the channel.
    ///
    /// After disposal every call is answered with `Error::Disposed`.
    pub fn handle_method_call(&self, call: &MethodCall, reply: Reply) {
        self.inner.handle(call, reply);
    }

    /// Run `hook` with the view id once disposal completes.
    pub(crate) fn set_on_dispose(&self, hook: impl FnOnce(i64) + 'static) {
        *self.inner.on_dispose.borrow_mut() = Some(Box::new(hook));
    }

    /// Detach the channel handler and release the widget. Safe to call more
    /// than once.
    pub fn dispose(&self) {
        self.inner.dispose();
    }
}

impl Drop for BrowserView {
    fn drop(&mut self) {
        self.inner.dispose();
    }
}

impl std::fmt::Debug for BrowserView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BrowserView")
            .field("id", &self.inner.id)
            .field("channel", &self.inner.channel.name())
            .field("lifecycle", &self.inner.lifecycle.get())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{HeadlessController, HeadlessWidget};
    use crate::channel::Messenger;
    use crate::codec::MethodResponse;
    use crate::WebViewSettings;
    use serde_json::json;

    const CHANNEL: &str = "test/webview_1";

    struct Fixture {
        messenger: Messenger,
        controller: HeadlessController,
        view: BrowserView,
    }

    impl Fixture {
        fn new(params: &CreationParams) -> Self {
            let messenger = Messenger::new();
            let widget = HeadlessWidget::new();
            let controller = widget.controller();
            let view = BrowserView::new(1, MethodChannel::new(&messenger, CHANNEL), Box::new(widget), params);
            Self {
                messenger,
                controller,
                view,
            }
        }

        fn blank() -> Self {
            Self::new(&CreationParams::default())
        }

        fn call(&self, method: &str, arguments: Value) -> MethodResponse {
            self.messenger
                .call(CHANNEL, MethodCall::new(method, arguments))
                .try_take()
                .expect("command replied synchronously")
        }

        fn events(&self) -> Vec<ViewEvent> {
            self.messenger
                .take_outbound_for(CHANNEL)
                .iter()
                .map(|call| ViewEvent::from_call(call).unwrap())
                .collect()
        }

        fn load(&self, url: &str) {
            assert!(self.call("loadUrl", json!({ "url": url })).is_success());
            self.controller.finish_navigation();
        }
    }

    #[test]
    fn test_construction_applies_settings_and_loads_initial_url() {
        let params = CreationParams {
            initial_url: Some("https://example.com".to_string()),
            settings: WebViewSettings::new().with_javascript(true),
        };
        let fixture = Fixture::new(&params);

        assert_eq!(fixture.view.lifecycle(), Lifecycle::Ready);
        assert_eq!(fixture.view.channel_name(), CHANNEL);
        assert!(fixture.controller.has_observer());
        assert_eq!(fixture.controller.settings().javascript_enabled, Some(true));
        assert_eq!(fixture.controller.loading_url().as_deref(), Some("https://example.com"));
    }

    #[test]
    fn test_invalid_initial_url_is_not_loaded() {
        let params = CreationParams {
            initial_url: Some("definitely not a url".to_string()),
            settings: WebViewSettings::default(),
        };
        let fixture = Fixture::new(&params);

        assert_eq!(fixture.view.lifecycle(), Lifecycle::Ready);
        assert!(fixture.controller.loading_url().is_none());
        fixture.controller.pump();
        assert!(fixture.events().is_empty());
    }

    #[test]
    fn test_load_url_then_current_url() {
        let fixture = Fixture::blank();
        let reply = fixture.call("loadUrl", json!({"url": "https://example.com"}));
        assert_eq!(reply, MethodResponse::done());

        fixture.controller.finish_navigation();
        let reply = fixture.call("getCurrentUrl", Value::Null);
        assert_eq!(reply.result(), Some(&json!("https://example.com")));
    }

    #[test]
    fn test_load_url_missing_parameter_leaves_url_unchanged() {
        let fixture = Fixture::blank();
        fixture.load("https://example.com/");

        let reply = fixture.call("loadUrl", json!({}));
        assert_eq!(reply.error_code(), Some("MISSING_PARAMS"));
        assert!(fixture.controller.loading_url().is_none());
        assert_eq!(
            fixture.call("getCurrentUrl", Value::Null).result(),
            Some(&json!("https://example.com/"))
        );
    }

    #[test]
    fn test_load_url_invalid() {
        let fixture = Fixture::blank();
        let reply = fixture.call("loadUrl", json!({"url": "::nope::"}));
        assert_eq!(reply.error_code(), Some("INVALID_URL"));
        assert!(fixture.controller.loading_url().is_none());
    }

    #[test]
    fn test_go_back_without_history() {
        let fixture = Fixture::blank();
        assert_eq!(fixture.call("goBack", Value::Null), MethodResponse::done());
        assert_eq!(fixture.call("goForward", Value::Null), MethodResponse::done());
        assert!(fixture.controller.loading_url().is_none());
        assert_eq!(fixture.call("canGoBack", Value::Null).result(), Some(&json!(false)));
        assert_eq!(fixture.call("canGoForward", Value::Null).result(), Some(&json!(false)));
    }

    #[test]
    fn test_back_and_forward() {
        let fixture = Fixture::blank();
        fixture.load("https://a.example/");
        fixture.load("https://b.example/");
        assert_eq!(fixture.call("canGoBack", Value::Null).result(), Some(&json!(true)));

        fixture.call("goBack", Value::Null);
        fixture.controller.finish_navigation();
        assert_eq!(
            fixture.call("getCurrentUrl", Value::Null).result(),
            Some(&json!("https://a.example/"))
        );
        assert_eq!(fixture.call("canGoForward", Value::Null).result(), Some(&json!(true)));

        fixture.call("goForward", Value::Null);
        fixture.controller.finish_navigation();
        assert_eq!(
            fixture.call("getCurrentUrl", Value::Null).result(),
            Some(&json!("https://b.example/"))
        );
    }

    #[test]
    fn test_reload_and_stop() {
        let fixture = Fixture::blank();
        fixture.load("https://example.com/");

        assert_eq!(fixture.call("reload", Value::Null), MethodResponse::done());
        assert_eq!(fixture.call("isLoading", Value::Null).result(), Some(&json!(true)));
        assert_eq!(fixture.call("stopLoading", Value::Null), MethodResponse::done());
        assert_eq!(fixture.call("isLoading", Value::Null).result(), Some(&json!(false)));
    }

    #[test]
    fn test_queries_default_to_empty_strings() {
        let fixture = Fixture::blank();
        assert_eq!(fixture.call("getCurrentUrl", Value::Null).result(), Some(&json!("")));
        assert_eq!(fixture.call("getTitle", Value::Null).result(), Some(&json!("")));
        assert_eq!(fixture.call("getProgress", Value::Null).result(), Some(&json!(0.0)));
    }

    #[test]
    fn test_evaluate_javascript_replies_on_completion() {
        let fixture = Fixture::blank();
        let mut pending = fixture.messenger.call(
            CHANNEL,
            MethodCall::new("evaluateJavascript", json!({"javascript": "1+1"})),
        );
        assert!(pending.try_take().is_none());

        fixture.controller.pump();
        assert_eq!(pending.try_take().unwrap().result(), Some(&json!("2")));
    }

    #[test]
    fn test_evaluate_javascript_errors() {
        let fixture = Fixture::blank();
        let mut pending = fixture.messenger.call(
            CHANNEL,
            MethodCall::new("evaluateJavascript", json!({"javascript": "invalid!!syntax"})),
        );
        fixture.controller.pump();
        assert_eq!(pending.try_take().unwrap().error_code(), Some("JS_EVALUATION_ERROR"));

        let reply = fixture.call("evaluateJavascript", json!({"script": "1"}));
        assert_eq!(reply.error_code(), Some("MISSING_PARAMS"));
    }

    #[test]
    fn test_unknown_command_is_not_implemented() {
        let fixture = Fixture::blank();
        assert_eq!(fixture.call("zoomIn", Value::Null), MethodResponse::NotImplemented);
        // The view stays usable after any error reply.
        assert!(fixture.call("reload", Value::Null).is_success());
    }

    #[test]
    fn test_navigation_events() {
        let fixture = Fixture::blank();
        fixture.call("loadUrl", json!({"url": "https://example.com/"}));
        fixture.controller.pump();

        let url = "https://example.com/".to_string();
        assert_eq!(
            fixture.events(),
            vec![
                ViewEvent::LoadingStateChanged { is_loading: true },
                ViewEvent::UrlChanged { url: url.clone() },
                ViewEvent::PageStarted { url: url.clone() },
                ViewEvent::ProgressChanged { progress: 0.1 },
            ]
        );

        fixture.controller.set_page_title("https://example.com/", "Example Domain");
        let _ = fixture.events();
        fixture.controller.finish_navigation();
        assert_eq!(
            fixture.events(),
            vec![
                ViewEvent::ProgressChanged { progress: 1.0 },
                ViewEvent::LoadingStateChanged { is_loading: false },
                ViewEvent::UrlChanged { url: url.clone() },
                ViewEvent::PageFinished { url },
                ViewEvent::TitleChanged {
                    title: "Example Domain".to_string()
                },
            ]
        );
        assert_eq!(fixture.view.snapshot().title, "Example Domain");
        assert!(!fixture.view.snapshot().is_loading);
    }

    #[test]
    fn test_title_fetched_from_page_when_not_exposed() {
        let fixture = Fixture::blank();
        fixture.controller.set_title_property(false);
        fixture.call("loadUrl", json!({"url": "https://example.com/"}));
        fixture.controller.set_page_title("https://example.com/", "Fetched");
        fixture.controller.finish_navigation();

        let titles: Vec<_> = fixture
            .events()
            .into_iter()
            .filter(|e| matches!(e, ViewEvent::TitleChanged { .. }))
            .collect();
        assert_eq!(
            titles,
            vec![ViewEvent::TitleChanged {
                title: "Fetched".to_string()
            }]
        );
        assert_eq!(fixture.call("getTitle", Value::Null).result(), Some(&json!("Fetched")));
    }

    #[test]
    fn test_fetched_title_keeps_its_quotes() {
        let fixture = Fixture::blank();
        fixture.controller.set_title_property(false);
        fixture.call("loadUrl", json!({"url": "https://example.com/"}));
        fixture.controller.set_page_title("https://example.com/", "\"Quoted\" page \"");
        fixture.controller.finish_navigation();

        assert!(fixture.events().contains(&ViewEvent::TitleChanged {
            title: "\"Quoted\" page \"".to_string()
        }));
        assert_eq!(fixture.view.snapshot().title, "\"Quoted\" page \"");
    }

    #[test]
    fn test_load_failure_events() {
        let fixture = Fixture::blank();
        fixture.call("loadUrl", json!({"url": "https://down.example/"}));
        fixture.controller.pump();
        let _ = fixture.events();

        fixture.controller.fail_navigation(-2, "host lookup failed");
        let events = fixture.events();
        assert_eq!(events[0], ViewEvent::LoadingStateChanged { is_loading: false });
        assert!(matches!(
            &events[1],
            ViewEvent::LoadError(failure) if failure.provisional && failure.code == -2
        ));
        assert_eq!(events.len(), 2);
    }

    #[test]
    fn test_progress_is_clamped() {
        let fixture = Fixture::blank();
        fixture.controller.report_progress(1.7);
        fixture.controller.report_progress(-0.3);
        fixture.controller.report_progress(f64::NAN);
        fixture.controller.report_progress(0.42);

        let progress: Vec<f64> = fixture
            .events()
            .into_iter()
            .filter_map(|e| match e {
                ViewEvent::ProgressChanged { progress } => Some(progress),
                _ => None,
            })
            .collect();
        assert_eq!(progress, vec![1.0, 0.0, 0.42]);
        assert!(progress.iter().all(|p| (0.0..=1.0).contains(p)));
    }

    #[test]
    fn test_no_events_after_dispose() {
        let fixture = Fixture::blank();
        fixture.call("loadUrl", json!({"url": "https://example.com/"}));
        let _ = fixture.events();

        fixture.view.dispose();
        assert!(fixture.view.is_disposed());
        assert!(fixture.controller.is_destroyed());

        fixture.controller.pump();
        fixture.controller.finish_navigation();
        fixture.controller.report_progress(0.5);
        assert!(fixture.events().is_empty());
    }

    #[test]
    fn test_dispose_is_idempotent_and_terminal() {
        let fixture = Fixture::blank();
        fixture.view.dispose();
        fixture.view.dispose();

        assert!(!fixture.messenger.has_handler(CHANNEL));
        let reply = fixture.call("reload", Value::Null);
        assert_eq!(reply.error_code(), Some("NO_HANDLER"));

        let mut pending = {
            let (tx, rx) = tokio::sync::oneshot::channel();
            let reply = Reply::new("reload", move |r| {
                let _ = tx.send(r);
            });
            fixture.view.handle_method_call(&MethodCall::bare("reload"), reply);
            rx
        };
        assert_eq!(pending.try_recv().unwrap().error_code(), Some("DISPOSED"));
    }

    #[test]
    fn test_dispose_resolves_pending_script() {
        let fixture = Fixture::blank();
        let mut pending = fixture.messenger.call(
            CHANNEL,
            MethodCall::new("evaluateJavascript", json!({"javascript": "1"})),
        );
        fixture.view.dispose();
        assert_eq!(pending.try_take().unwrap().error_code(), Some("JS_EVALUATION_ERROR"));
    }

    #[test]
    fn test_drop_disposes() {
        let fixture = Fixture::blank();
        let Fixture {
            messenger,
            controller,
            view,
        } = fixture;
        drop(view);
        assert!(controller.is_destroyed());
        assert!(!messenger.has_handler(CHANNEL));
    }

    #[test]
    fn test_every_command_replies_once() {
        let fixture = Fixture::blank();
        for (method, args) in [
            ("loadUrl", json!({"url": "https://example.com"})),
            ("goBack", Value::Null),
            ("goForward", Value::Null),
            ("reload", Value::Null),
            ("stopLoading", Value::Null),
            ("canGoBack", Value::Null),
            ("canGoForward", Value::Null),
            ("isLoading", Value::Null),
            ("getProgress", Value::Null),
            ("getCurrentUrl", Value::Null),
            ("getTitle", Value::Null),
            ("evaluateJavascript", json!({"javascript": "'x'"})),
            ("bogus", Value::Null),
        ] {
            let mut pending = fixture.messenger.call(CHANNEL, MethodCall::new(method, args));
            fixture.controller.pump();
            assert!(pending.try_take().is_some(), "{method} did not reply");
            assert!(pending.try_take().is_none(), "{method} replied twice");
        }
    }
}
