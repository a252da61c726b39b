//! Plugin registration and the host-side view registry.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use serde_json::Value;

use crate::channel::{Messenger, MethodChannel, Reply};
use crate::codec::MethodCall;
use crate::config::PluginConfig;
use crate::factory::{PlatformViewFactory, WebViewFactory, WidgetProvider};
use crate::platform::platform_version;
use crate::view::BrowserView;
use crate::{Error, Result};

#[derive(Default)]
struct RegistryState {
    factories: HashMap<String, Rc<dyn PlatformViewFactory>>,
    views: HashMap<i64, Rc<BrowserView>>,
}

/// Host-side registry of view factories and the views they created.
#[derive(Clone, Default)]
pub struct PlatformViewRegistry {
    state: Rc<RefCell<RegistryState>>,
}

impl PlatformViewRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_view_factory(&self, view_type: &str, factory: Rc<dyn PlatformViewFactory>) {
        self.state
            .borrow_mut()
            .factories
            .insert(view_type.to_string(), factory);
        tracing::debug!("Registered view factory {}", view_type);
    }

    pub fn unregister_view_factory(&self, view_type: &str) {
        if self.state.borrow_mut().factories.remove(view_type).is_some() {
            tracing::debug!("Unregistered view factory {}", view_type);
        }
    }

    #[must_use]
    pub fn has_view_factory(&self, view_type: &str) -> bool {
        self.state.borrow().factories.contains_key(view_type)
    }

    /// Create a view of `view_type` with the host-chosen `view_id`.
    ///
    /// # Errors
    /// - `Error::UnknownViewType` if no factory is registered for `view_type`
    /// - `Error::DuplicateViewId` if a view with `view_id` is still live
    /// - any error from the factory
    pub fn create_view(&self, view_type: &str, view_id: i64, args: Option<&Value>) -> Result<()> {
        // A view disposed without going through the registry frees its id.
        drop(self.prune(view_id));

        let factory = {
            let state = self.state.borrow();
            if state.views.contains_key(&view_id) {
                return Err(Error::DuplicateViewId(view_id));
            }
            state
                .factories
                .get(view_type)
                .cloned()
                .ok_or_else(|| Error::UnknownViewType(view_type.to_string()))?
        };

        let view = factory.create(view_id, args)?;
        self.state.borrow_mut().views.insert(view_id, Rc::new(view));
        Ok(())
    }

    /// Dispose and forget a view. Returns `false` if no live view has this id.
    pub fn dispose_view(&self, view_id: i64) -> bool {
        let view = self.state.borrow_mut().views.remove(&view_id);
        match view {
            Some(view) if !view.is_disposed() => {
                view.dispose();
                true
            }
            _ => false,
        }
    }

    /// Run `f` against a live view.
    ///
    /// The registry is not borrowed while `f` runs, so `f` may call back into
    /// it.
    pub fn with_view<R>(&self, view_id: i64, f: impl FnOnce(&BrowserView) -> R) -> Option<R> {
        let view = self
            .state
            .borrow()
            .views
            .get(&view_id)
            .filter(|view| !view.is_disposed())
            .cloned()?;
        Some(f(&view))
    }

    /// Ids of live views, ascending.
    #[must_use]
    pub fn view_ids(&self) -> Vec<i64> {
        let mut ids: Vec<i64> = self
            .state
            .borrow()
            .views
            .iter()
            .filter(|(_, view)| !view.is_disposed())
            .map(|(id, _)| *id)
            .collect();
        ids.sort_unstable();
        ids
    }

    /// Remove the entry for `view_id` if its view is already disposed. The
    /// entry is returned so it is dropped outside the borrow.
    fn prune(&self, view_id: i64) -> Option<Rc<BrowserView>> {
        let mut state = self.state.borrow_mut();
        if state.views.get(&view_id)?.is_disposed() {
            state.views.remove(&view_id)
        } else {
            None
        }
    }
}

/// Registers the global command channel and the web view factory.
pub struct InAppBrowserPlugin {
    config: PluginConfig,
    channel: MethodChannel,
    registry: PlatformViewRegistry,
    attached: Cell<bool>,
}

impl InAppBrowserPlugin {
    /// Attach to `messenger` and `registry`; `provider` builds the widget of
    /// every view the factory creates.
    pub fn attach(
        config: PluginConfig,
        messenger: &Messenger,
        registry: &PlatformViewRegistry,
        provider: WidgetProvider,
    ) -> Self {
        let channel = MethodChannel::new(messenger, config.global_channel());
        let version = platform_version(config.platform_name.as_deref());

        channel.set_method_call_handler(Some(Rc::new(move |call: MethodCall, reply: Reply| {
            match call.method.as_str() {
                "getPlatformVersion" => reply.success(version.clone()),
                other => {
                    tracing::debug!("Global channel has no method {}", other);
                    reply.not_implemented();
                }
            }
        })));

        let factory = WebViewFactory::new(config.clone(), messenger, provider);
        registry.register_view_factory(&config.view_type(), Rc::new(factory));

        tracing::info!("In-app browser plugin attached on {}", config.global_channel());
        Self {
            config,
            channel,
            registry: registry.clone(),
            attached: Cell::new(true),
        }
    }

    #[must_use]
    pub fn config(&self) -> &PluginConfig {
        &self.config
    }

    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.attached.get()
    }

    /// Remove the global handler and the view factory. Views already created
    /// stay alive until the host disposes them.
    pub fn detach(&self) {
        if !self.attached.replace(false) {
            return;
        }
        self.channel.set_method_call_handler(None);
        self.registry.unregister_view_factory(&self.config.view_type());
        tracing::info!("In-app browser plugin detached");
    }
}

impl Drop for InAppBrowserPlugin {
    fn drop(&mut self) {
        self.detach();
    }
}
