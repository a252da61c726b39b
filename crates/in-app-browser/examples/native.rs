//! Load a page in a native WPE web view and print its lifecycle events.
//!
//! Run with: `cargo run --example native --features wpe -- https://example.com`

use std::cell::RefCell;
use std::rc::Rc;
use std::time::{Duration, Instant};

use in_app_browser::{
    InAppBrowserPlugin, Messenger, MethodCall, PlatformViewRegistry, PluginConfig, Result,
    ViewEvent, WebWidget, WpeDriver, WpeWidget,
};
use serde_json::json;

const VIEW_ID: i64 = 1;
const RUN_FOR: Duration = Duration::from_secs(15);

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let url = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "https://example.com".to_string());

    let messenger = Messenger::new();
    let registry = PlatformViewRegistry::new();
    let config = PluginConfig::default();

    let driver: Rc<RefCell<Option<WpeDriver>>> = Rc::default();
    let slot = driver.clone();
    let _plugin = InAppBrowserPlugin::attach(
        config.clone(),
        &messenger,
        &registry,
        Box::new(move |_| {
            let widget = WpeWidget::new()?;
            *slot.borrow_mut() = Some(widget.driver());
            Ok(Box::new(widget) as Box<dyn WebWidget>)
        }),
    );

    registry.create_view(
        &config.view_type(),
        VIEW_ID,
        Some(&json!({
            "initialUrl": url,
            "settings": {"javaScriptEnabled": true, "developerExtrasEnabled": true},
        })),
    )?;
    let channel = config.view_channel(VIEW_ID);
    let Some(driver) = driver.borrow().clone() else {
        return Err(in_app_browser::Error::WebViewCreationFailed);
    };

    println!("Loading {} for {}s...", url, RUN_FOR.as_secs());

    let started = Instant::now();
    let mut script = None;
    while started.elapsed() < RUN_FOR {
        driver.pump();

        for call in messenger.take_outbound_for(&channel) {
            let Some(event) = ViewEvent::from_call(&call) else {
                continue;
            };
            match &event {
                ViewEvent::ProgressChanged { progress } => {
                    println!("Loading: {:.0}%", progress * 100.0);
                }
                ViewEvent::PageFinished { .. } if script.is_none() => {
                    println!("{:?}", event);
                    script = Some(messenger.call(
                        &channel,
                        MethodCall::new(
                            "evaluateJavascript",
                            json!({"javascript": "document.links.length"}),
                        ),
                    ));
                }
                _ => println!("{:?}", event),
            }
        }

        if let Some(response) = script.as_mut().and_then(|pending| pending.try_take()) {
            println!("Links on page: {:?}", response.result());
        }

        // Small sleep to avoid busy-waiting
        std::thread::sleep(Duration::from_millis(10));
    }

    registry.dispose_view(VIEW_ID);
    Ok(())
}
