//! wclens DOM - Host page model
//!
//! Arena-based document tree the inspection engine runs against: elements,
//! text, shadow roots, component capability descriptors, synthetic event
//! dispatch, mutation observers, style and geometry stores, and a virtual
//! clock that stamps everything.

mod node;
mod document;
mod shadow;
mod component;
mod events;
mod observer;
mod style;
mod geometry;
mod error;

pub use node::{Attribute, ElementData, Node, NodeData};
pub use document::Document;
pub use shadow::{ShadowMode, ShadowRootData, SlotDetail};
pub use component::{
    ComponentRegistry, ComponentSpec, MethodSpec, PropertySpec, UpdateNotice, LIFECYCLE_NAMES,
};
pub use events::{
    DispatchSummary, EventInit, EventPhase, ListenerId, ListenerKind, PathStep, ScriptAction,
    TapCapture, TapId,
};
pub use observer::{MutationRecord, ObserverId, ObserverInit, RecordKind};
pub use style::{
    matching_specificity, ComputedStyle, Declaration, StyleOrigin, StyleRule, Stylesheet,
};
pub use geometry::{DomRect, Viewport};
pub use error::DomError;

/// Node identifier (index into the document arena)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// Document root node ID
    pub const ROOT: NodeId = NodeId(0);

    #[inline]
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}
