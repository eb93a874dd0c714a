//! Shadow DOM
//!
//! Shadow root fragments, modes, and slot assignment.

use crate::NodeId;
use crate::document::Document;
use crate::error::DomError;
use crate::node::{Node, NodeData};

/// Shadow root mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShadowMode {
    #[default]
    Open,
    Closed,
}

impl ShadowMode {
    pub fn as_str(self) -> &'static str {
        match self {
            ShadowMode::Open => "open",
            ShadowMode::Closed => "closed",
        }
    }
}

/// Shadow root fragment data
#[derive(Debug, Clone)]
pub struct ShadowRootData {
    pub host: NodeId,
    pub mode: ShadowMode,
    pub delegates_focus: bool,
}

/// A slot and the light children assigned to it
#[derive(Debug, Clone)]
pub struct SlotDetail {
    /// Slot name; empty string for the default slot
    pub name: String,
    /// Assigned light-tree element children of the host, in tree order
    pub assigned: Vec<NodeId>,
}

// Shadow tree operations on the document.
impl Document {
    /// Attach a shadow root to a host element. The fragment node is not
    /// linked into the light tree; it is reachable only through the host.
    pub fn attach_shadow(
        &mut self,
        host: NodeId,
        mode: ShadowMode,
        delegates_focus: bool,
    ) -> Result<NodeId, DomError> {
        let Some(elem) = self.get(host).and_then(|n| n.as_element()) else {
            return Err(DomError::NotAnElement(host));
        };
        if elem.shadow_root.is_some() {
            return Err(DomError::ShadowAlreadyAttached(host));
        }
        let fragment = self.push_node(Node::new(NodeData::ShadowRoot(ShadowRootData {
            host,
            mode,
            delegates_focus,
        })));
        if let Some(elem) = self.node_mut(host).as_element_mut() {
            elem.shadow_root = Some(fragment);
        }
        Ok(fragment)
    }

    /// Shadow root fragment of a host element, open or closed
    pub fn shadow_root(&self, host: NodeId) -> Option<NodeId> {
        self.get(host)?.as_element()?.shadow_root
    }

    /// Shadow root data for a host element
    pub fn shadow_info(&self, host: NodeId) -> Option<&ShadowRootData> {
        let fragment = self.shadow_root(host)?;
        self.get(fragment)?.as_shadow_root()
    }

    /// Whether the node lives inside some shadow tree
    pub fn in_shadow_tree(&self, id: NodeId) -> bool {
        let mut cur = id;
        loop {
            match self.node(cur).parent {
                Some(p) => cur = p,
                None => return self.node(cur).as_shadow_root().is_some(),
            }
        }
    }

    /// Slots declared in the host's shadow tree with their assigned light
    /// children. A light child's `slot` attribute selects a named slot;
    /// children without one go to the default slot.
    pub fn slot_map(&self, host: NodeId) -> Vec<SlotDetail> {
        let Some(fragment) = self.shadow_root(host) else {
            return Vec::new();
        };
        let mut details: Vec<SlotDetail> = self
            .elements_below(fragment)
            .into_iter()
            .filter(|&id| self.tag_name(id) == Some("slot"))
            .map(|id| SlotDetail {
                name: self.attribute(id, "name").unwrap_or("").to_string(),
                assigned: Vec::new(),
            })
            .collect();

        for child in self.child_elements(host) {
            let wanted = self.attribute(child, "slot").unwrap_or("");
            if let Some(slot) = details.iter_mut().find(|s| s.name == wanted) {
                slot.assigned.push(child);
            }
        }
        details
    }
}
