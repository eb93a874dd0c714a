//! wclens a11y - Accessibility auditing
//!
//! Heuristic accessibility checks for component instances, an accessibility
//! tree builder, and the WCAG contrast math behind both.

mod aria;
mod audit;
mod color;
mod error;
mod tree;

pub use aria::{computed_role, AriaRole, KNOWN_ARIA_ATTRIBUTES};
pub use audit::{audit, AuditReport, Category, Issue, Severity};
pub use color::{
    contrast_ratio, is_large_text, meets_minimum, parse_color, relative_luminance, Rgb,
};
pub use error::A11yError;
pub use tree::{
    accessible_description, accessible_name, build_tree, is_focusable, is_visible,
    screen_reader_text, A11yTreeNode,
};
