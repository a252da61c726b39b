//! Widget backends.
//!
//! - [`headless`]: in-memory widget, always available.
//! - `wpe`: WPE WebKit widget, behind the `wpe` feature.

pub mod headless;
mod script;

#[cfg(feature = "wpe")]
pub mod wpe;

pub use headless::{HeadlessController, HeadlessWidget};

#[cfg(feature = "wpe")]
pub use self::wpe::{WpeDriver, WpeWidget};
