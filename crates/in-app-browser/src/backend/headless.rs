//! In-memory widget with no rendering or networking.
//!
//! Navigation requests are queued and only complete when the
//! [`HeadlessController`] says so, which makes the asynchronous parts of the
//! widget contract deterministic: tests (and headless hosts) decide when a
//! page starts, finishes, fails, or reports progress, and when pending
//! scripts return.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;


use super::script::{self, PageContext};
use crate::widget::{LoadFailure, NavigationObserver, ScriptCallback, WebWidget};
use crate::{Error, WebViewSettings};

/// Error code reported when a load is stopped before it finishes.
pub const LOAD_CANCELLED: i32 = 302;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Target {
    New,
    Entry(usize),
}

#[derive(Debug, Clone)]
struct Navigation {
    url: String,
    target: Target,
}

enum Task {
    Started(String),
    Progress(f64),
    Finished(String),
    Failed(LoadFailure),
    Title(String),
    Script {
        source: String,
        callback: ScriptCallback,
    },
}

struct HeadlessState {
    settings: WebViewSettings,
    observer: Option<Rc<dyn NavigationObserver>>,
    history: Vec<String>,
    index: Option<usize>,
    in_flight: Option<Navigation>,
    titles: HashMap<String, String>,
    title_property: bool,
    queue: VecDeque<Task>,
    destroyed: bool,
}

impl HeadlessState {
    fn current_url(&self) -> Option<&str> {
        self.index.and_then(|i| self.history.get(i)).map(String::as_str)
    }

    fn current_title(&self) -> Option<&str> {
        self.current_url()
            .and_then(|url| self.titles.get(url))
            .map(String::as_str)
    }

    fn navigate(&mut self, url: String, target: Target) {
        if self.destroyed {
            return;
        }
        if let Some(previous) = self.in_flight.take() {
            tracing::debug!("Superseding navigation to {}", previous.url);
        }
        self.queue.push_back(Task::Started(url.clone()));
        self.queue.push_back(Task::Progress(0.1));
        self.in_flight = Some(Navigation { url, target });
    }

    fn navigate_to_entry(&mut self, index: usize) {
        if let Some(url) = self.history.get(index).cloned() {
            self.navigate(url, Target::Entry(index));
        }
    }
}

/// A widget whose page lifecycle is driven by a [`HeadlessController`].
pub struct HeadlessWidget {
    state: Rc<RefCell<HeadlessState>>,
}

impl HeadlessWidget {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Rc::new(RefCell::new(HeadlessState {
                settings: WebViewSettings::default(),
                observer: None,
                history: Vec::new(),
                index: None,
                in_flight: None,
                titles: HashMap::new(),
                title_property: true,
                queue: VecDeque::new(),
                destroyed: false,
            })),
        }
    }

    /// A handle that drives this widget's page lifecycle.
    #[must_use]
    pub fn controller(&self) -> HeadlessController {
        HeadlessController {
            state: self.state.clone(),
        }
    }
}

impl Default for HeadlessWidget {
    fn default() -> Self {
        Self::new()
    }
}

impl WebWidget for HeadlessWidget {
    fn apply_settings(&mut self, settings: &WebViewSettings) {
        let mut state = self.state.borrow_mut();
        let current = &mut state.settings;
        macro_rules! merge {
            ($($field:ident),*) => {
                $(if settings.$field.is_some() {
                    current.$field.clone_from(&settings.$field);
                })*
            };
        }
        merge!(
            javascript_enabled,
            dom_storage_enabled,
            database_enabled,
            use_wide_view_port,
            load_with_overview_mode,
            allow_file_access,
            allow_content_access,
            allows_inline_media_playback,
            allows_back_forward_navigation_gestures,
            developer_extras_enabled,
            user_agent
        );
    }

    fn set_observer(&mut self, observer: Option<Rc<dyn NavigationObserver>>) {
        self.state.borrow_mut().observer = observer;
    }

    fn load_url(&mut self, url: &str) {
        self.state.borrow_mut().navigate(url.to_string(), Target::New);
    }

    fn go_back(&mut self) {
        let mut state = self.state.borrow_mut();
        if let Some(index) = state.index.filter(|&i| i > 0) {
            state.navigate_to_entry(index - 1);
        }
    }

    fn go_forward(&mut self) {
        let mut state = self.state.borrow_mut();
        if let Some(index) = state.index.filter(|&i| i + 1 < state.history.len()) {
            state.navigate_to_entry(index + 1);
        }
    }

    fn reload(&mut self) {
        let mut state = self.state.borrow_mut();
        if let Some(index) = state.index {
            state.navigate_to_entry(index);
        }
    }

    fn stop_loading(&mut self) {
        let mut state = self.state.borrow_mut();
        if let Some(navigation) = state.in_flight.take() {
            state.queue.push_back(Task::Failed(LoadFailure {
                url: navigation.url,
                code: LOAD_CANCELLED,
                description: "Load request cancelled".to_string(),
                provisional: true,
            }));
        }
    }

    fn can_go_back(&self) -> bool {
        self.state.borrow().index.is_some_and(|i| i > 0)
    }

    fn can_go_forward(&self) -> bool {
        let state = self.state.borrow();
        state.index.is_some_and(|i| i + 1 < state.history.len())
    }

    fn is_loading(&self) -> bool {
        self.state.borrow().in_flight.is_some()
    }

    fn url(&self) -> Option<String> {
        self.state.borrow().current_url().map(str::to_string)
    }

    fn title(&self) -> Option<String> {
        let state = self.state.borrow();
        if state.title_property {
            state.current_title().map(str::to_string)
        } else {
            None
        }
    }

    fn evaluate_javascript(&mut self, script: &str, callback: ScriptCallback) {
        let mut state = self.state.borrow_mut();
        if state.destroyed {
            drop(state);
            callback(Err(Error::ScriptEvaluation("web view destroyed".to_string())));
            return;
        }
        state.queue.push_back(Task::Script {
            source: script.to_string(),
            callback,
        });
    }

    fn destroy(&mut self) {
        let pending: Vec<Task> = {
            let mut state = self.state.borrow_mut();
            state.destroyed = true;
            state.observer = None;
            state.in_flight = None;
            state.queue.drain(..).collect()
        };

        for task in pending {
            if let Task::Script { callback, .. } = task {
                callback(Err(Error::ScriptEvaluation("web view destroyed".to_string())));
            }
        }
        tracing::debug!("Headless widget destroyed");
    }
}

/// Drives a [`HeadlessWidget`]'s page lifecycle.
#[derive(Clone)]
pub struct HeadlessController {
    state: Rc<RefCell<HeadlessState>>,
}

impl HeadlessController {
    /// Deliver every queued callback to the observer, in order.
    ///
    /// Returns the number of tasks processed.
    pub fn pump(&self) -> usize {
        let mut processed = 0;
        loop {
            // The borrow ends before any callback runs; observers call back
            // into the widget.
            let (task, observer, page) = {
                let mut state = self.state.borrow_mut();
                let Some(task) = state.queue.pop_front() else {
                    break;
                };
                let page = (
                    state.current_title().unwrap_or_default().to_string(),
                    state.current_url().unwrap_or_default().to_string(),
                );
                let javascript_enabled = state.settings.javascript_enabled != Some(false);
                (task, state.observer.clone(), (page, javascript_enabled))
            };
            processed += 1;

            match task {
                Task::Script { source, callback } => {
                    let ((title, url), javascript_enabled) = page;
                    let result = if javascript_enabled {
                        script::evaluate(&source, &PageContext { title: &title, url: &url })
                    } else {
                        Err(Error::ScriptEvaluation("JavaScript is disabled".to_string()))
                    };
                    callback(result);
                }
                Task::Started(url) => {
                    if let Some(observer) = observer {
                        observer.on_page_started(&url);
                    }
                }
                Task::Progress(progress) => {
                    if let Some(observer) = observer {
                        observer.on_progress_changed(progress);
                    }
                }
                Task::Finished(url) => {
                    if let Some(observer) = observer {
                        observer.on_page_finished(&url);
                    }
                }
                Task::Failed(failure) => {
                    if let Some(observer) = observer {
                        observer.on_load_failed(&failure);
                    }
                }
                Task::Title(title) => {
                    if let Some(observer) = observer {
                        observer.on_title_changed(&title);
                    }
                }
            }
        }
        processed
    }

    /// Commit the in-flight navigation, then deliver everything queued.
    ///
    /// Returns `false` if nothing was loading.
    pub fn finish_navigation(&self) -> bool {
        {
            let mut state = self.state.borrow_mut();
            let Some(navigation) = state.in_flight.take() else {
                return false;
            };

            let index = match navigation.target {
                Target::New => {
                    let keep = state.index.map_or(0, |i| i + 1);
                    state.history.truncate(keep);
                    state.history.push(navigation.url.clone());
                    state.history.len() - 1
                }
                Target::Entry(index) => index,
            };
            state.index = Some(index);
            state.queue.push_back(Task::Progress(1.0));
            state.queue.push_back(Task::Finished(navigation.url));
        }
        self.pump();
        true
    }

    /// Fail the in-flight navigation, then deliver everything queued.
    ///
    /// Returns `false` if nothing was loading.
    pub fn fail_navigation(&self, code: i32, description: &str) -> bool {
        {
            let mut state = self.state.borrow_mut();
            let Some(navigation) = state.in_flight.take() else {
                return false;
            };
            state.queue.push_back(Task::Failed(LoadFailure {
                url: navigation.url,
                code,
                description: description.to_string(),
                provisional: true,
            }));
        }
        self.pump();
        true
    }

    /// Report load progress, then deliver everything queued.
    pub fn report_progress(&self, progress: f64) {
        self.state.borrow_mut().queue.push_back(Task::Progress(progress));
        self.pump();
    }

    /// Give the page at `url` a title. Announces the change if that page is
    /// the one currently shown.
    pub fn set_page_title(&self, url: &str, title: &str) {
        {
            let mut state = self.state.borrow_mut();
            state.titles.insert(url.to_string(), title.to_string());
            if state.current_url() == Some(url) && !state.destroyed {
                state.queue.push_back(Task::Title(title.to_string()));
            }
        }
        self.pump();
    }

    /// Whether the widget exposes the title directly. When disabled,
    /// `title()` returns `None` and callers must ask the page.
    pub fn set_title_property(&self, enabled: bool) {
        self.state.borrow_mut().title_property = enabled;
    }

    /// Number of queued callbacks not yet delivered.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.state.borrow().queue.len()
    }

    #[must_use]
    pub fn has_observer(&self) -> bool {
        self.state.borrow().observer.is_some()
    }

    #[must_use]
    pub fn is_destroyed(&self) -> bool {
        self.state.borrow().destroyed
    }

    /// Settings the widget has accumulated.
    #[must_use]
    pub fn settings(&self) -> WebViewSettings {
        self.state.borrow().settings.clone()
    }

    /// Committed history entries, oldest first.
    #[must_use]
    pub fn history(&self) -> Vec<String> {
        self.state.borrow().history.clone()
    }

    /// URL of the navigation in progress, if any.
    #[must_use]
    pub fn loading_url(&self) -> Option<String> {
        self.state.borrow().in_flight.as_ref().map(|n| n.url.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use std::cell::RefCell;

    #[derive(Default)]
    struct Recorder {
        log: RefCell<Vec<String>>,
    }

    impl NavigationObserver for Recorder {
        fn on_page_started(&self, url: &str) {
            self.log.borrow_mut().push(format!("started {url}"));
        }
        fn on_page_finished(&self, url: &str) {
            self.log.borrow_mut().push(format!("finished {url}"));
        }
        fn on_load_failed(&self, failure: &LoadFailure) {
            self.log.borrow_mut().push(format!("failed {} {}", failure.url, failure.code));
        }
        fn on_progress_changed(&self, progress: f64) {
            self.log.borrow_mut().push(format!("progress {progress}"));
        }
        fn on_title_changed(&self, title: &str) {
            self.log.borrow_mut().push(format!("title {title}"));
        }
    }

    fn observed() -> (HeadlessWidget, HeadlessController, Rc<Recorder>) {
        let mut widget = HeadlessWidget::new();
        let recorder = Rc::new(Recorder::default());
        widget.set_observer(Some(recorder.clone()));
        let controller = widget.controller();
        (widget, controller, recorder)
    }

    #[test]
    fn test_navigation_completes_only_when_driven() {
        let (mut widget, controller, recorder) = observed();
        widget.load_url("https://example.com");

        assert!(widget.is_loading());
        assert!(widget.url().is_none());
        assert!(recorder.log.borrow().is_empty());

        assert!(controller.finish_navigation());
        assert!(!widget.is_loading());
        assert_eq!(widget.url().as_deref(), Some("https://example.com"));
        assert_eq!(
            *recorder.log.borrow(),
            vec![
                "started https://example.com",
                "progress 0.1",
                "progress 1",
                "finished https://example.com",
            ]
        );
    }

    #[test]
    fn test_history_navigation() {
        let (mut widget, controller, _recorder) = observed();
        widget.load_url("https://a.example/");
        controller.finish_navigation();
        widget.load_url("https://b.example/");
        controller.finish_navigation();

        assert!(widget.can_go_back());
        assert!(!widget.can_go_forward());

        widget.go_back();
        controller.finish_navigation();
        assert_eq!(widget.url().as_deref(), Some("https://a.example/"));
        assert!(widget.can_go_forward());

        widget.go_forward();
        controller.finish_navigation();
        assert_eq!(widget.url().as_deref(), Some("https://b.example/"));

        widget.go_back();
        controller.finish_navigation();
        widget.load_url("https://c.example/");
        controller.finish_navigation();
        assert_eq!(controller.history(), vec!["https://a.example/", "https://c.example/"]);
        assert!(!widget.can_go_forward());
    }

    #[test]
    fn test_go_back_without_history_is_noop() {
        let (mut widget, controller, _recorder) = observed();
        widget.go_back();
        widget.go_forward();
        widget.reload();
        assert!(!widget.is_loading());
        assert_eq!(controller.pending(), 0);
    }

    #[test]
    fn test_stop_loading_reports_cancellation() {
        let (mut widget, controller, recorder) = observed();
        widget.load_url("https://slow.example/");
        widget.stop_loading();
        controller.pump();

        assert!(!widget.is_loading());
        assert_eq!(
            recorder.log.borrow().last().unwrap(),
            &format!("failed https://slow.example/ {LOAD_CANCELLED}")
        );
    }

    #[test]
    fn test_fail_navigation() {
        let (mut widget, controller, recorder) = observed();
        widget.load_url("https://unreachable.example/");
        assert!(controller.fail_navigation(-2, "host lookup failed"));
        assert!(widget.url().is_none());
        assert_eq!(recorder.log.borrow().last().unwrap(), "failed https://unreachable.example/ -2");
        assert!(!controller.fail_navigation(-2, "nothing loading"));
    }

    #[test]
    fn test_script_runs_on_pump() {
        let (mut widget, controller, _recorder) = observed();
        let result: Rc<RefCell<Option<Value>>> = Rc::new(RefCell::new(None));
        let slot = result.clone();
        widget.evaluate_javascript("1+1", Box::new(move |r| *slot.borrow_mut() = r.ok()));

        assert!(result.borrow().is_none());
        controller.pump();
        assert_eq!(*result.borrow(), Some(json!(2)));
    }

    #[test]
    fn test_script_sees_page_title() {
        let (mut widget, controller, recorder) = observed();
        widget.load_url("https://example.com/");
        controller.finish_navigation();
        controller.set_page_title("https://example.com/", "Example");
        assert_eq!(recorder.log.borrow().last().unwrap(), "title Example");

        controller.set_title_property(false);
        assert!(widget.title().is_none());

        let result: Rc<RefCell<Option<Value>>> = Rc::new(RefCell::new(None));
        let slot = result.clone();
        widget.evaluate_javascript("document.title", Box::new(move |r| *slot.borrow_mut() = r.ok()));
        controller.pump();
        assert_eq!(*result.borrow(), Some(json!("Example")));
    }

    #[test]
    fn test_script_fails_when_javascript_disabled() {
        let (mut widget, controller, _recorder) = observed();
        widget.apply_settings(&WebViewSettings::new().with_javascript(false));
        let failed = Rc::new(RefCell::new(false));
        let slot = failed.clone();
        widget.evaluate_javascript("1", Box::new(move |r| *slot.borrow_mut() = r.is_err()));
        controller.pump();
        assert!(*failed.borrow());
    }

    #[test]
    fn test_apply_settings_merges() {
        let (mut widget, controller, _recorder) = observed();
        widget.apply_settings(&WebViewSettings::new().with_javascript(true));
        widget.apply_settings(&WebViewSettings::new().with_user_agent("ua"));
        let settings = controller.settings();
        assert_eq!(settings.javascript_enabled, Some(true));
        assert_eq!(settings.user_agent.as_deref(), Some("ua"));
    }

    #[test]
    fn test_destroy_resolves_scripts_and_silences_observer() {
        let (mut widget, controller, recorder) = observed();
        widget.load_url("https://example.com/");
        let failed = Rc::new(RefCell::new(false));
        let slot = failed.clone();
        widget.evaluate_javascript("1", Box::new(move |r| *slot.borrow_mut() = r.is_err()));

        widget.destroy();
        assert!(*failed.borrow());
        assert!(controller.is_destroyed());
        assert!(!controller.has_observer());

        widget.load_url("https://example.com/again");
        controller.report_progress(0.5);
        assert!(!controller.finish_navigation());
        assert!(recorder.log.borrow().is_empty());
    }
}
