//! The seam between a browser view and the native widget it wraps.
//!
//! A [`WebWidget`] performs navigation and script evaluation. It reports
//! what happens to the page through a [`NavigationObserver`] registered at
//! construction and removed at disposal. Widgets deliver observer callbacks
//! from the main context, never from inside one of their own methods, so an
//! observer may call back into the widget.

use std::rc::Rc;

use serde_json::Value;

use crate::{Result, WebViewSettings};

/// Continuation invoked once a script evaluation completes.
pub type ScriptCallback = Box<dyn FnOnce(Result<Value>)>;

/// Details of a failed navigation.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadFailure {
    pub url: String,
    pub code: i32,
    pub description: String,
    /// The failure happened before the page was committed.
    pub provisional: bool,
}

/// Listener for widget lifecycle callbacks.
pub trait NavigationObserver {
    fn on_page_started(&self, url: &str);

    fn on_page_finished(&self, url: &str);

    fn on_load_failed(&self, failure: &LoadFailure);

    /// `progress` is the estimated load progress in `[0.0, 1.0]`.
    fn on_progress_changed(&self, progress: f64);

    /// The document title changed outside a page finish.
    fn on_title_changed(&self, _title: &str) {}
}

/// A native web widget.
pub trait WebWidget {
    fn apply_settings(&mut self, settings: &WebViewSettings);

    /// Register the lifecycle listener, or remove it with `None`.
    fn set_observer(&mut self, observer: Option<Rc<dyn NavigationObserver>>);

    /// Start loading `url`, an absolute URL already validated by the caller.
    fn load_url(&mut self, url: &str);

    fn go_back(&mut self);

    fn go_forward(&mut self);

    fn reload(&mut self);

    fn stop_loading(&mut self);

    fn can_go_back(&self) -> bool;

    fn can_go_forward(&self) -> bool;

    fn is_loading(&self) -> bool;

    fn url(&self) -> Option<String>;

    fn title(&self) -> Option<String>;

    /// Run `script` in the page. `callback` receives the result, or an error
    /// if the script failed, once the widget reports completion.
    fn evaluate_javascript(&mut self, script: &str, callback: ScriptCallback);

    /// Release the native resources. Pending script callbacks resolve with an
    /// error and no observer callback fires afterwards.
    fn destroy(&mut self);
}
