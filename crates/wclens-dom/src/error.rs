//! DOM errors

use thiserror::Error;

use crate::NodeId;

/// Errors raised by the host page model
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomError {
    #[error("invalid custom element name: {0}")]
    InvalidName(String),

    #[error("custom element already defined: {0}")]
    AlreadyDefined(String),

    #[error("getter for {tag}.{property} threw")]
    GetterThrew { tag: String, property: String },

    #[error("setter for {tag}.{property} threw")]
    SetterThrew { tag: String, property: String },

    #[error("stylesheet rules are not accessible cross-origin")]
    CrossOriginStylesheet,

    #[error("node {0:?} is not an element")]
    NotAnElement(NodeId),

    #[error("node {0:?} already has a shadow root")]
    ShadowAlreadyAttached(NodeId),
}
