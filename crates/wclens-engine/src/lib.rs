//! wclens Engine
//!
//! Live component introspection for web pages.
//!
//! # Goals
//! - See every component instance on a page, shadow DOM included
//! - Watch events, re-renders, and CSS variables as they happen
//! - Edit attributes and properties safely, with undo
//! - Audit accessibility without leaving the page
//!
//! # Example
//! ```rust,ignore
//! use wclens_engine::DevtoolsSession;
//!
//! let mut session = DevtoolsSession::new(doc);
//! session.enable_tracking();
//! let instances = session.scan();
//! session.tick(16);
//! ```

mod config;
mod overlay;
mod session;

pub use config::{Config, ConfigError, PanelPosition};
pub use overlay::{anchors, issue_anchors, Badge, OverlayAnchor};
pub use session::{DevtoolsSession, SessionStats};

// Re-export sub-crates for advanced usage
pub use wclens_a11y as a11y;
pub use wclens_devtools as devtools;
pub use wclens_dom as dom;

/// Engine version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
