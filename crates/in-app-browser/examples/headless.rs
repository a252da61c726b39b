//! Drive a headless web view over its method channel.
//!
//! Run with: `cargo run --example headless`

use std::cell::RefCell;
use std::rc::Rc;

use in_app_browser::{
    HeadlessController, HeadlessWidget, InAppBrowserPlugin, Messenger, MethodCall, PlatformViewRegistry,
    PluginConfig, Result, ViewEvent, WebWidget,
};
use serde_json::{json, Value};

const VIEW_ID: i64 = 1;

fn print_events(messenger: &Messenger, channel: &str) {
    for call in messenger.take_outbound_for(channel) {
        match ViewEvent::from_call(&call) {
            Some(event) => println!("  event: {:?}", event),
            None => println!("  unknown event: {}", call.method),
        }
    }
}

fn call(messenger: &Messenger, channel: &str, method: &str, arguments: Value) {
    let mut pending = messenger.call(channel, MethodCall::new(method, arguments));
    match pending.try_take() {
        Some(response) => println!("{} -> {:?}", method, response),
        None => println!("{} -> (pending)", method),
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let messenger = Messenger::new();
    let registry = PlatformViewRegistry::new();
    let config = PluginConfig::default();

    // Keep a controller so we can play the part of the page.
    let controller: Rc<RefCell<Option<HeadlessController>>> = Rc::default();
    let slot = controller.clone();
    let plugin = InAppBrowserPlugin::attach(
        config.clone(),
        &messenger,
        &registry,
        Box::new(move |_| {
            let widget = HeadlessWidget::new();
            *slot.borrow_mut() = Some(widget.controller());
            Ok(Box::new(widget) as Box<dyn WebWidget>)
        }),
    );

    call(&messenger, config.global_channel(), "getPlatformVersion", Value::Null);

    registry.create_view(
        &config.view_type(),
        VIEW_ID,
        Some(&json!({
            "initialUrl": "https://example.com",
            "settings": {"javaScriptEnabled": true},
        })),
    )?;
    let channel = config.view_channel(VIEW_ID);
    let Some(page) = controller.borrow().clone() else {
        return Err(in_app_browser::Error::WebViewCreationFailed);
    };

    page.set_page_title("https://example.com", "Example Domain");
    page.finish_navigation();
    print_events(&messenger, &channel);

    call(&messenger, &channel, "loadUrl", json!({"url": "https://www.rust-lang.org"}));
    page.report_progress(0.6);
    page.finish_navigation();
    print_events(&messenger, &channel);

    call(&messenger, &channel, "canGoBack", Value::Null);
    call(&messenger, &channel, "goBack", Value::Null);
    page.finish_navigation();
    print_events(&messenger, &channel);

    let mut script = messenger.call(
        &channel,
        MethodCall::new("evaluateJavascript", json!({"javascript": "document.title"})),
    );
    page.pump();
    println!("evaluateJavascript -> {:?}", script.try_take());

    call(&messenger, &channel, "loadUrl", json!({"url": "not a url"}));

    registry.dispose_view(VIEW_ID);
    call(&messenger, &channel, "reload", Value::Null);
    plugin.detach();

    Ok(())
}
