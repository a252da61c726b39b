//! Creation of browser views.

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use serde_json::Value;

use crate::channel::{Messenger, MethodChannel};
use crate::config::PluginConfig;
use crate::view::BrowserView;
use crate::widget::WebWidget;
use crate::{Error, Result, WebViewSettings};

/// Arguments a host passes when creating a view.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreationParams {
    pub initial_url: Option<String>,
    pub settings: WebViewSettings,
}

impl CreationParams {
    #[must_use]
    pub fn with_initial_url(mut self, url: impl Into<String>) -> Self {
        self.initial_url = Some(url.into());
        self
    }

    #[must_use]
    pub fn with_settings(mut self, settings: WebViewSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Read creation arguments leniently: fields of the wrong type, and
    /// arguments that are not a map at all, count as absent.
    #[must_use]
    pub fn from_value(args: Option<&Value>) -> Self {
        let Some(args) = args.filter(|a| !a.is_null()) else {
            return Self::default();
        };
        if !args.is_object() {
            tracing::warn!("Ignoring creation arguments that are not a map: {}", args);
            return Self::default();
        }

        let initial_url = match args.get("initialUrl") {
            Some(Value::String(url)) => Some(url.clone()),
            Some(Value::Null) | None => None,
            Some(other) => {
                tracing::warn!("Ignoring initialUrl of unexpected type: {}", other);
                None
            }
        };

        Self {
            initial_url,
            settings: WebViewSettings::from_value(args.get("settings")),
        }
    }
}

/// Builds the widget for a new view.
pub type WidgetProvider = Box<dyn Fn(i64) -> Result<Box<dyn WebWidget>>>;

/// Something that creates platform views of one type.
pub trait PlatformViewFactory {
    /// Create the view with id `view_id` from the host's creation arguments.
    ///
    /// # Errors
    /// Returns an error if the view cannot be created.
    fn create(&self, view_id: i64, args: Option<&Value>) -> Result<BrowserView>;
}

/// Creates browser views, each on its own channel.
pub struct WebViewFactory {
    config: PluginConfig,
    messenger: Messenger,
    provider: WidgetProvider,
    live: Rc<RefCell<HashSet<i64>>>,
}

impl WebViewFactory {
    pub fn new(config: PluginConfig, messenger: &Messenger, provider: WidgetProvider) -> Self {
        Self {
            config,
            messenger: messenger.clone(),
            provider,
            live: Rc::new(RefCell::new(HashSet::new())),
        }
    }

    /// Whether a view with this id exists and has not been disposed.
    #[must_use]
    pub fn is_live(&self, view_id: i64) -> bool {
        self.live.borrow().contains(&view_id)
    }

    #[must_use]
    pub fn live_count(&self) -> usize {
        self.live.borrow().len()
    }
}

impl PlatformViewFactory for WebViewFactory {
    fn create(&self, view_id: i64, args: Option<&Value>) -> Result<BrowserView> {
        if self.is_live(view_id) {
            tracing::warn!("Refusing to create web view {}: id in use", view_id);
            return Err(Error::DuplicateViewId(view_id));
        }

        let params = CreationParams::from_value(args);
        let widget = (self.provider)(view_id)?;
        let channel = MethodChannel::new(&self.messenger, self.config.view_channel(view_id));
        let view = BrowserView::new(view_id, channel, widget, &params);

        self.live.borrow_mut().insert(view_id);
        let live = Rc::downgrade(&self.live);
        view.set_on_dispose(move |id| {
            if let Some(live) = live.upgrade() {
                live.borrow_mut().remove(&id);
            }
        });

        Ok(view)
    }
}
