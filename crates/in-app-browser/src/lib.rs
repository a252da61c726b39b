//! Embeddable web views driven over method channels.
//!
//! The host creates a view through a [`PlatformViewRegistry`] and then talks
//! to it over a per-view [`MethodChannel`]: commands such as `loadUrl` or
//! `evaluateJavascript` go in, lifecycle events such as `onUrlChanged` come
//! back out. The plugin also answers `getPlatformVersion` on its global
//! channel.
//!
//! ## Features
//!
//! - `wpe`: a native widget backed by WPE WebKit. Without it only the
//!   in-process headless widget is available.
//!
//! ## Example
//!
//! ```rust
//! use in_app_browser::{
//!     HeadlessWidget, InAppBrowserPlugin, Messenger, MethodCall, PlatformViewRegistry,
//!     PluginConfig, WebWidget,
//! };
//! use serde_json::json;
//!
//! let messenger = Messenger::new();
//! let registry = PlatformViewRegistry::new();
//! let config = PluginConfig::default();
//! let _plugin = InAppBrowserPlugin::attach(
//!     config.clone(),
//!     &messenger,
//!     &registry,
//!     Box::new(|_| Ok(Box::new(HeadlessWidget::new()) as Box<dyn WebWidget>)),
//! );
//!
//! registry.create_view(&config.view_type(), 1, None)?;
//! let mut reply = messenger.call(
//!     &config.view_channel(1),
//!     MethodCall::new("loadUrl", json!({"url": "https://example.com"})),
//! );
//! assert!(reply.try_take().is_some_and(|r| r.is_success()));
//! # Ok::<(), in_app_browser::Error>(())
//! ```
//!
//! ## System Requirements
//!
//! The `wpe` feature needs the WPE WebKit development packages:
//!
//! ### Arch Linux / Artix
//! ```sh
//! pacman -S libwpe wpewebkit
//! ```
//!
//! ### Debian / Ubuntu
//! ```sh
//! apt install libwpe-1.0-dev libwpewebkit-2.0-dev
//! ```

pub mod backend;
pub mod channel;
pub mod codec;
pub mod command;
pub mod config;
pub mod error;
pub mod event;
pub mod factory;
pub mod platform;
pub mod plugin;
pub mod settings;
pub mod view;
pub mod widget;

pub use backend::{HeadlessController, HeadlessWidget};
pub use channel::{Messenger, MethodCallHandler, MethodChannel, OutboundMessage, PendingReply, Reply};
pub use codec::{MethodCall, MethodResponse};
pub use command::Command;
pub use config::PluginConfig;
pub use error::{Error, Result};
pub use event::ViewEvent;
pub use factory::{CreationParams, PlatformViewFactory, WebViewFactory, WidgetProvider};
pub use plugin::{InAppBrowserPlugin, PlatformViewRegistry};
pub use settings::WebViewSettings;
pub use view::{BrowserView, Lifecycle, ViewSnapshot};
pub use widget::{LoadFailure, NavigationObserver, ScriptCallback, WebWidget};

#[cfg(feature = "wpe")]
pub use backend::{WpeDriver, WpeWidget};
