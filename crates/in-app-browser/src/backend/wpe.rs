//! WPE WebKit widget.
//!
//! GLib signals from the `WebKitWebView` are queued by the C handlers and
//! delivered to the observer by [`WpeDriver::pump`], which also runs the GLib
//! main context. Script completions travel through the same queue, so every
//! observer callback and script continuation runs from `pump`, never from
//! inside a widget method.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::ffi::{CStr, CString};
use std::ptr;
use std::rc::Rc;
use std::sync::OnceLock;

use serde_json::Value;

use crate::widget::{LoadFailure, NavigationObserver, ScriptCallback, WebWidget};
use crate::{Error, Result, WebViewSettings};

static INITIALIZED: OnceLock<bool> = OnceLock::new();

/// Set up a headless primary WPE display. Must succeed before any widget is
/// created; repeated calls return the first outcome.
///
/// # Errors
/// Returns `Error::InitFailed` if the display cannot be created or connected.
#[allow(unsafe_code)]
pub fn initialize() -> Result<()> {
    let ok = *INITIALIZED.get_or_init(|| {
        // SAFETY: runs once on the main context; every returned pointer is
        // checked before use.
        unsafe {
            let display = wpe_sys::wpe_display_headless_new();
            if display.is_null() {
                tracing::error!("Failed to create headless WPE display");
                return false;
            }

            let mut error: *mut wpe_sys::GError = ptr::null_mut();
            if wpe_sys::wpe_display_connect(display, &mut error) == 0 {
                tracing::error!("Failed to connect headless display: {}", take_error(error));
                wpe_sys::g_object_unref(display.cast());
                return false;
            }

            wpe_sys::wpe_display_set_primary(display);
            tracing::info!("WPE headless display initialized");
            true
        }
    });

    if ok {
        Ok(())
    } else {
        Err(Error::InitFailed)
    }
}

/// Read and free a `GError`.
#[allow(unsafe_code)]
unsafe fn take_error(error: *mut wpe_sys::GError) -> String {
    if error.is_null() {
        return "unknown error".to_string();
    }
    let message = CStr::from_ptr((*error).message).to_string_lossy().into_owned();
    wpe_sys::g_error_free(error);
    message
}

/// Copy a borrowed C string owned by WebKit.
#[allow(unsafe_code)]
unsafe fn borrowed_string(s: *const std::os::raw::c_char) -> Option<String> {
    if s.is_null() {
        None
    } else {
        Some(CStr::from_ptr(s).to_string_lossy().into_owned())
    }
}

enum Signal {
    Started(String),
    Finished(String),
    Failed(LoadFailure),
    Title(String),
    Progress(f64),
    ScriptDone(u64, Result<Value>),
}

#[derive(Default)]
struct Shared {
    signals: RefCell<VecDeque<Signal>>,
    observer: RefCell<Option<Rc<dyn NavigationObserver>>>,
    scripts: RefCell<HashMap<u64, ScriptCallback>>,
    next_script: Cell<u64>,
    /// WebKit emits `load-changed(FINISHED)` after `load-failed`; the
    /// finish of a failed load is swallowed.
    failed: Cell<bool>,
    destroyed: Cell<bool>,
}

impl Shared {
    fn push(&self, signal: Signal) {
        if self.destroyed.get() {
            return;
        }
        // Never borrowed across a callback: pump pops one signal at a time.
        self.signals.borrow_mut().push_back(signal);
    }
}

/// Per-evaluation data handed to the async callback.
struct ScriptRequest {
    shared: Rc<Shared>,
    id: u64,
}

#[allow(unsafe_code)]
unsafe extern "C" fn on_load_changed(
    web_view: *mut wpe_sys::WebKitWebView,
    load_event: wpe_sys::WebKitLoadEvent,
    user_data: *mut std::ffi::c_void,
) {
    if user_data.is_null() || web_view.is_null() {
        return;
    }
    let shared = &*(user_data as *const Shared);
    let uri = borrowed_string(wpe_sys::webkit_web_view_get_uri(web_view)).unwrap_or_default();

    match load_event {
        wpe_sys::WebKitLoadEvent_WEBKIT_LOAD_STARTED => shared.push(Signal::Started(uri)),
        wpe_sys::WebKitLoadEvent_WEBKIT_LOAD_FINISHED => shared.push(Signal::Finished(uri)),
        _ => {}
    }
}

#[allow(unsafe_code)]
unsafe extern "C" fn on_load_failed(
    _web_view: *mut wpe_sys::WebKitWebView,
    load_event: wpe_sys::WebKitLoadEvent,
    failing_uri: *const std::os::raw::c_char,
    error: *mut wpe_sys::GError,
    user_data: *mut std::ffi::c_void,
) -> i32 {
    if user_data.is_null() {
        return 0;
    }
    let shared = &*(user_data as *const Shared);
    let (code, description) = if error.is_null() {
        (0, String::new())
    } else {
        (
            (*error).code,
            borrowed_string((*error).message).unwrap_or_default(),
        )
    };

    shared.push(Signal::Failed(LoadFailure {
        url: borrowed_string(failing_uri).unwrap_or_default(),
        code,
        description,
        provisional: load_event != wpe_sys::WebKitLoadEvent_WEBKIT_LOAD_COMMITTED,
    }));

    0 // FALSE - let WebKit show its error page
}

#[allow(unsafe_code)]
unsafe extern "C" fn on_notify_title(
    web_view: *mut wpe_sys::WebKitWebView,
    _pspec: *mut std::ffi::c_void,
    user_data: *mut std::ffi::c_void,
) {
    if user_data.is_null() || web_view.is_null() {
        return;
    }
    let shared = &*(user_data as *const Shared);
    if let Some(title) = borrowed_string(wpe_sys::webkit_web_view_get_title(web_view)) {
        shared.push(Signal::Title(title));
    }
}

#[allow(unsafe_code)]
unsafe extern "C" fn on_notify_progress(
    web_view: *mut wpe_sys::WebKitWebView,
    _pspec: *mut std::ffi::c_void,
    user_data: *mut std::ffi::c_void,
) {
    if user_data.is_null() || web_view.is_null() {
        return;
    }
    let shared = &*(user_data as *const Shared);
    let progress = wpe_sys::webkit_web_view_get_estimated_load_progress(web_view);
    shared.push(Signal::Progress(progress));
}

#[allow(unsafe_code)]
unsafe extern "C" fn on_script_finished(
    source: *mut wpe_sys::GObject,
    result: *mut wpe_sys::GAsyncResult,
    user_data: *mut std::ffi::c_void,
) {
    if user_data.is_null() {
        return;
    }
    let request = Box::from_raw(user_data.cast::<ScriptRequest>());

    let mut error: *mut wpe_sys::GError = ptr::null_mut();
    let value = wpe_sys::webkit_web_view_evaluate_javascript_finish(source.cast(), result, &mut error);

    let outcome = if value.is_null() {
        Err(Error::ScriptEvaluation(take_error(error)))
    } else {
        let json = wpe_sys::jsc_value_to_json(value, 0);
        let parsed = if json.is_null() {
            // undefined and functions have no JSON form
            Ok(Value::Null)
        } else {
            let text = CStr::from_ptr(json).to_string_lossy().into_owned();
            wpe_sys::g_free(json.cast());
            serde_json::from_str(&text).map_err(Error::from)
        };
        wpe_sys::g_object_unref(value.cast());
        parsed
    };

    request.shared.push(Signal::ScriptDone(request.id, outcome));
}

/// Connect `handler` to `signal` on `instance`.
#[allow(unsafe_code)]
unsafe fn connect(
    instance: *mut wpe_sys::WebKitWebView,
    signal: &str,
    handler: unsafe extern "C" fn(),
    user_data: *const Shared,
) -> u64 {
    let Ok(signal_name) = CString::new(signal) else {
        tracing::warn!("Invalid signal name {}", signal);
        return 0;
    };
    let id = wpe_sys::g_signal_connect_data(
        instance.cast(),
        signal_name.as_ptr(),
        Some(handler),
        user_data as *mut _,
        None,
        0, // G_CONNECT_DEFAULT
    );
    if id == 0 {
        tracing::warn!("Failed to connect {} signal", signal);
    } else {
        tracing::debug!("Connected {} signal: {}", signal, id);
    }
    id
}

/// A `WebKitWebView` driven through the [`WebWidget`] contract.
pub struct WpeWidget {
    web_view: *mut wpe_sys::WebKitWebView,
    shared: Rc<Shared>,
    /// Pointer handed to the signal handlers; reclaimed on destroy.
    shared_ptr: *const Shared,
    signal_ids: Vec<u64>,
}

/// Runs the GLib main context and delivers queued widget callbacks.
#[derive(Clone)]
pub struct WpeDriver {
    shared: Rc<Shared>,
}

impl WpeWidget {
    /// Create a web view on the primary display.
    ///
    /// # Errors
    /// Returns an error if WPE cannot be initialized or the view cannot be
    /// created.
    #[allow(unsafe_code)]
    pub fn new() -> Result<Self> {
        initialize()?;

        let shared = Rc::new(Shared::default());

        // SAFETY: all pointers are checked; the Shared pointer stays valid
        // until destroy() disconnects the handlers and reclaims it.
        unsafe {
            let web_view = wpe_sys::webkit_web_view_new(ptr::null_mut());
            if web_view.is_null() {
                tracing::error!("Failed to create WebKitWebView");
                return Err(Error::WebViewCreationFailed);
            }

            let shared_ptr = Rc::into_raw(shared.clone());

            type NotifyHandler = unsafe extern "C" fn(
                *mut wpe_sys::WebKitWebView,
                *mut std::ffi::c_void,
                *mut std::ffi::c_void,
            );
            let signal_ids = vec![
                connect(
                    web_view,
                    "load-changed",
                    std::mem::transmute::<
                        unsafe extern "C" fn(
                            *mut wpe_sys::WebKitWebView,
                            wpe_sys::WebKitLoadEvent,
                            *mut std::ffi::c_void,
                        ),
                        unsafe extern "C" fn(),
                    >(on_load_changed),
                    shared_ptr,
                ),
                connect(
                    web_view,
                    "load-failed",
                    std::mem::transmute::<
                        unsafe extern "C" fn(
                            *mut wpe_sys::WebKitWebView,
                            wpe_sys::WebKitLoadEvent,
                            *const std::os::raw::c_char,
                            *mut wpe_sys::GError,
                            *mut std::ffi::c_void,
                        ) -> i32,
                        unsafe extern "C" fn(),
                    >(on_load_failed),
                    shared_ptr,
                ),
                connect(
                    web_view,
                    "notify::title",
                    std::mem::transmute::<NotifyHandler, unsafe extern "C" fn()>(on_notify_title),
                    shared_ptr,
                ),
                connect(
                    web_view,
                    "notify::estimated-load-progress",
                    std::mem::transmute::<NotifyHandler, unsafe extern "C" fn()>(on_notify_progress),
                    shared_ptr,
                ),
            ];

            tracing::info!("Created WPE web view");

            Ok(Self {
                web_view,
                shared,
                shared_ptr,
                signal_ids,
            })
        }
    }

    /// A handle that pumps this widget's callbacks.
    #[must_use]
    pub fn driver(&self) -> WpeDriver {
        WpeDriver {
            shared: self.shared.clone(),
        }
    }

    fn is_destroyed(&self) -> bool {
        self.shared.destroyed.get()
    }
}

impl WpeDriver {
    /// Run pending GLib work, then deliver queued callbacks.
    ///
    /// Returns the number of callbacks delivered.
    #[allow(unsafe_code)]
    pub fn pump(&self) -> usize {
        // SAFETY: iterating the default main context from the main thread.
        unsafe {
            let ctx = wpe_sys::g_main_context_default();
            while wpe_sys::g_main_context_iteration(ctx, 0) != 0 {}
        }

        let mut delivered = 0;
        loop {
            let Some(signal) = self.shared.signals.borrow_mut().pop_front() else {
                break;
            };
            delivered += 1;
            self.deliver(signal);
        }
        delivered
    }

    fn deliver(&self, signal: Signal) {
        if let Signal::ScriptDone(id, result) = signal {
            let callback = self.shared.scripts.borrow_mut().remove(&id);
            if let Some(callback) = callback {
                callback(result);
            }
            return;
        }

        let Some(observer) = self.shared.observer.borrow().clone() else {
            return;
        };
        match signal {
            Signal::Started(url) => {
                self.shared.failed.set(false);
                observer.on_page_started(&url);
            }
            Signal::Finished(url) => {
                if !self.shared.failed.replace(false) {
                    observer.on_page_finished(&url);
                }
            }
            Signal::Failed(failure) => {
                self.shared.failed.set(true);
                observer.on_load_failed(&failure);
            }
            Signal::Title(title) => observer.on_title_changed(&title),
            Signal::Progress(progress) => observer.on_progress_changed(progress),
            Signal::ScriptDone(..) => {}
        }
    }
}

impl WebWidget for WpeWidget {
    #[allow(unsafe_code)]
    fn apply_settings(&mut self, settings: &WebViewSettings) {
        if self.is_destroyed() {
            return;
        }
        // SAFETY: web_view is valid until destroy(); the settings object is
        // owned by the view.
        unsafe {
            let target = wpe_sys::webkit_web_view_get_settings(self.web_view);
            if target.is_null() {
                tracing::warn!("Web view has no settings object");
                return;
            }
            if let Some(enabled) = settings.javascript_enabled {
                wpe_sys::webkit_settings_set_enable_javascript(target, i32::from(enabled));
            }
            if let Some(enabled) = settings.dom_storage_enabled {
                wpe_sys::webkit_settings_set_enable_html5_local_storage(target, i32::from(enabled));
            }
            if let Some(enabled) = settings.database_enabled {
                wpe_sys::webkit_settings_set_enable_html5_database(target, i32::from(enabled));
            }
            if let Some(enabled) = settings.allow_file_access {
                wpe_sys::webkit_settings_set_allow_file_access_from_file_urls(target, i32::from(enabled));
            }
            if let Some(enabled) = settings.allows_inline_media_playback {
                wpe_sys::webkit_settings_set_media_playback_allows_inline(target, i32::from(enabled));
            }
            if let Some(enabled) = settings.developer_extras_enabled {
                wpe_sys::webkit_settings_set_enable_developer_extras(target, i32::from(enabled));
            }
            if let Some(user_agent) = settings.user_agent.as_deref() {
                match CString::new(user_agent) {
                    Ok(c_agent) => wpe_sys::webkit_settings_set_user_agent(target, c_agent.as_ptr()),
                    Err(_) => tracing::warn!("Ignoring user agent with NUL byte"),
                }
            }
        }

        if settings.use_wide_view_port.is_some()
            || settings.load_with_overview_mode.is_some()
            || settings.allow_content_access.is_some()
            || settings.allows_back_forward_navigation_gestures.is_some()
        {
            tracing::debug!("Ignoring settings WPE WebKit has no equivalent for");
        }
    }

    fn set_observer(&mut self, observer: Option<Rc<dyn NavigationObserver>>) {
        *self.shared.observer.borrow_mut() = observer;
    }

    #[allow(unsafe_code)]
    fn load_url(&mut self, url: &str) {
        if self.is_destroyed() {
            return;
        }
        let Ok(c_url) = CString::new(url) else {
            tracing::warn!("Not loading URL with an interior NUL: {:?}", url);
            return;
        };
        // SAFETY: web_view is valid, c_url is a valid C string.
        unsafe {
            wpe_sys::webkit_web_view_load_uri(self.web_view, c_url.as_ptr());
        }
        tracing::debug!("Loading URL: {}", url);
    }

    #[allow(unsafe_code)]
    fn go_back(&mut self) {
        if !self.is_destroyed() {
            // SAFETY: web_view is valid.
            unsafe { wpe_sys::webkit_web_view_go_back(self.web_view) };
        }
    }

    #[allow(unsafe_code)]
    fn go_forward(&mut self) {
        if !self.is_destroyed() {
            // SAFETY: web_view is valid.
            unsafe { wpe_sys::webkit_web_view_go_forward(self.web_view) };
        }
    }

    #[allow(unsafe_code)]
    fn reload(&mut self) {
        if !self.is_destroyed() {
            // SAFETY: web_view is valid.
            unsafe { wpe_sys::webkit_web_view_reload(self.web_view) };
        }
    }

    #[allow(unsafe_code)]
    fn stop_loading(&mut self) {
        if !self.is_destroyed() {
            // SAFETY: web_view is valid.
            unsafe { wpe_sys::webkit_web_view_stop_loading(self.web_view) };
        }
    }

    #[allow(unsafe_code)]
    fn can_go_back(&self) -> bool {
        // SAFETY: web_view is valid.
        !self.is_destroyed() && unsafe { wpe_sys::webkit_web_view_can_go_back(self.web_view) != 0 }
    }

    #[allow(unsafe_code)]
    fn can_go_forward(&self) -> bool {
        // SAFETY: web_view is valid.
        !self.is_destroyed() && unsafe { wpe_sys::webkit_web_view_can_go_forward(self.web_view) != 0 }
    }

    #[allow(unsafe_code)]
    fn is_loading(&self) -> bool {
        // SAFETY: web_view is valid.
        !self.is_destroyed() && unsafe { wpe_sys::webkit_web_view_is_loading(self.web_view) != 0 }
    }

    #[allow(unsafe_code)]
    fn url(&self) -> Option<String> {
        if self.is_destroyed() {
            return None;
        }
        // SAFETY: the returned string is owned by WebKit; copied immediately.
        unsafe { borrowed_string(wpe_sys::webkit_web_view_get_uri(self.web_view)) }
    }

    #[allow(unsafe_code)]
    fn title(&self) -> Option<String> {
        if self.is_destroyed() {
            return None;
        }
        // SAFETY: the returned string is owned by WebKit; copied immediately.
        unsafe { borrowed_string(wpe_sys::webkit_web_view_get_title(self.web_view)) }
    }

    #[allow(unsafe_code)]
    fn evaluate_javascript(&mut self, script: &str, callback: ScriptCallback) {
        if self.is_destroyed() {
            callback(Err(Error::ScriptEvaluation("web view destroyed".to_string())));
            return;
        }
        let c_script = match CString::new(script) {
            Ok(c_script) => c_script,
            Err(e) => {
                callback(Err(Error::ScriptEvaluation(e.to_string())));
                return;
            }
        };

        let id = self.shared.next_script.get();
        self.shared.next_script.set(id + 1);
        self.shared.scripts.borrow_mut().insert(id, callback);

        let request = Box::into_raw(Box::new(ScriptRequest {
            shared: self.shared.clone(),
            id,
        }));

        // SAFETY: web_view is valid; request is reclaimed by on_script_finished.
        unsafe {
            wpe_sys::webkit_web_view_evaluate_javascript(
                self.web_view,
                c_script.as_ptr(),
                i64::try_from(script.len()).unwrap_or(-1),
                ptr::null(),
                ptr::null(),
                ptr::null_mut(),
                Some(on_script_finished),
                request.cast(),
            );
        }
        tracing::debug!("Evaluating script ({} bytes)", script.len());
    }

    #[allow(unsafe_code)]
    fn destroy(&mut self) {
        if self.shared.destroyed.replace(true) {
            return;
        }
        *self.shared.observer.borrow_mut() = None;
        self.shared.signals.borrow_mut().clear();

        // SAFETY: the handlers were connected in new() with shared_ptr as
        // user data; once disconnected nothing reads that pointer, so it can
        // be reclaimed. The view was created in new() and is released once.
        unsafe {
            for id in self.signal_ids.drain(..).filter(|&id| id != 0) {
                wpe_sys::g_signal_handler_disconnect(self.web_view.cast(), id);
            }
            wpe_sys::g_object_unref(self.web_view.cast());
            drop(Rc::from_raw(self.shared_ptr));
        }
        self.web_view = ptr::null_mut();

        let pending: Vec<ScriptCallback> = self.shared.scripts.borrow_mut().drain().map(|(_, cb)| cb).collect();
        for callback in pending {
            callback(Err(Error::ScriptEvaluation("web view destroyed".to_string())));
        }
        tracing::info!("WPE web view destroyed");
    }
}

impl Drop for WpeWidget {
    fn drop(&mut self) {
        self.destroy();
    }
}

// Note: WpeWidget is not Send or Sync; it holds GObject pointers that must
// only be touched from the thread that created them.
