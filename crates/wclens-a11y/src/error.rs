//! Accessibility errors.

use thiserror::Error;
use wclens_dom::NodeId;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum A11yError {
    #[error("node {0:?} is not an element")]
    NotAnElement(NodeId),
}
