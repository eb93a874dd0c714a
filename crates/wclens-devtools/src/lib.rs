//! wclens devtools
//!
//! Introspection subsystems for component-based pages.
//!
//! Features:
//! - Component scanner
//! - Event monitor with breakpoints and replay
//! - Render tracker
//! - Property editor with undo history
//! - CSS custom property resolution

pub mod cssvars;
pub mod editor;
pub mod monitor;
pub mod scanner;
pub mod tracker;
pub mod undo;

pub use cssvars::{css_variables, CssVariableInfo, CssVariableReport, VariableSource};
pub use editor::{
    validate_value, Change, ChangeKind, ExpectedType, PropertyEditor, Validated,
};
pub use monitor::{
    BreakState, EventFilter, EventLogEntry, EventMonitor, MonitorBreakpoint, MonitorState,
    MonitorStats, COMMON_EVENTS, LOG_CAPACITY,
};
pub use scanner::{scan, scan_root, selector_path, ComponentInstance, ShadowNode, ShadowSnapshot};
pub use tracker::{RenderTracker, TrackerStats};
pub use undo::{UndoManager, UNDO_CAPACITY};

/// Devtools error
#[derive(Debug, thiserror::Error)]
pub enum DevtoolsError {
    #[error("node {0:?} is not an element")]
    NotAnElement(wclens_dom::NodeId),

    #[error("property setter failed on <{tag}>.{property}")]
    SetterFailed { tag: String, property: String },
}
