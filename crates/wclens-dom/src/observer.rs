//! Mutation observers
//!
//! Observers register interest in attribute and child-list mutations on a
//! target, optionally its subtree. Records queue per observer until drained
//! with take_records.

use crate::NodeId;

/// Observer handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u32);

/// What an observer wants to see
#[derive(Debug, Clone, Default)]
pub struct ObserverInit {
    pub attributes: bool,
    pub child_list: bool,
    pub subtree: bool,
}

/// One observed mutation
#[derive(Debug, Clone)]
pub struct MutationRecord {
    /// The mutated node: the element for attribute changes, the parent for
    /// child-list changes
    pub target: NodeId,
    pub kind: RecordKind,
    pub at: u64,
}

/// Mutation payload
#[derive(Debug, Clone)]
pub enum RecordKind {
    Attributes {
        name: String,
        old_value: Option<String>,
    },
    ChildList {
        added: Vec<NodeId>,
        removed: Vec<NodeId>,
    },
}

/// Per-document observer table
#[derive(Debug, Default)]
pub(crate) struct ObserverRegistry {
    next_id: u32,
    slots: Vec<ObserverSlot>,
}

#[derive(Debug)]
struct ObserverSlot {
    id: ObserverId,
    target: NodeId,
    init: ObserverInit,
    records: Vec<MutationRecord>,
    connected: bool,
}

impl ObserverRegistry {
    pub(crate) fn observe(&mut self, target: NodeId, init: ObserverInit) -> ObserverId {
        let id = ObserverId(self.next_id);
        self.next_id += 1;
        self.slots.push(ObserverSlot {
            id,
            target,
            init,
            records: Vec::new(),
            connected: true,
        });
        id
    }

    pub(crate) fn disconnect(&mut self, id: ObserverId) {
        if let Some(slot) = self.slots.iter_mut().find(|s| s.id == id) {
            slot.connected = false;
            slot.records.clear();
        }
    }

    pub(crate) fn take_records(&mut self, id: ObserverId) -> Vec<MutationRecord> {
        self.slots
            .iter_mut()
            .find(|s| s.id == id)
            .map(|s| std::mem::take(&mut s.records))
            .unwrap_or_default()
    }

    /// Route one mutation to every matching observer. `scope` holds the
    /// target's ancestors by parent links, so subtree observers match
    /// without crossing shadow boundaries.
    pub(crate) fn deliver(&mut self, target: NodeId, scope: &[NodeId], kind: RecordKind, at: u64) {
        for slot in self.slots.iter_mut().filter(|s| s.connected) {
            let wants = match kind {
                RecordKind::Attributes { .. } => slot.init.attributes,
                RecordKind::ChildList { .. } => slot.init.child_list,
            };
            if !wants {
                continue;
            }
            let in_scope =
                slot.target == target || (slot.init.subtree && scope.contains(&slot.target));
            if !in_scope {
                continue;
            }
            slot.records.push(MutationRecord {
                target,
                kind: kind.clone(),
                at,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Document, ShadowMode};

    #[test]
    fn test_kind_flags_filter_delivery() {
        let mut doc = Document::new();
        let card = doc.create_element("my-card");
        doc.append_child(doc.body(), card);

        let attrs_only = doc.observe(
            card,
            ObserverInit {
                attributes: true,
                ..Default::default()
            },
        );
        let children_only = doc.observe(
            card,
            ObserverInit {
                child_list: true,
                ..Default::default()
            },
        );

        doc.set_attribute(card, "open", "");
        let child = doc.create_element("span");
        doc.append_child(card, child);

        assert_eq!(doc.take_records(attrs_only).len(), 1);
        assert_eq!(doc.take_records(children_only).len(), 1);
    }

    #[test]
    fn test_subtree_required_for_descendants() {
        let mut doc = Document::new();
        let card = doc.create_element("my-card");
        let inner = doc.create_element("span");
        doc.append_child(doc.body(), card);
        doc.append_child(card, inner);

        let shallow = doc.observe(
            card,
            ObserverInit {
                attributes: true,
                ..Default::default()
            },
        );
        let deep = doc.observe(
            card,
            ObserverInit {
                attributes: true,
                subtree: true,
                ..Default::default()
            },
        );

        doc.set_attribute(inner, "title", "x");
        assert!(doc.take_records(shallow).is_empty());
        assert_eq!(doc.take_records(deep).len(), 1);
    }

    #[test]
    fn test_shadow_scope_isolation() {
        let mut doc = Document::new();
        let host = doc.create_element("my-card");
        doc.append_child(doc.body(), host);
        let root = doc.attach_shadow(host, ShadowMode::Open, false).unwrap();
        let inner = doc.create_element("button");
        doc.append_child(root, inner);

        // A document-wide subtree observer does not see into the shadow
        // tree; an observer on the fragment does.
        let page_wide = doc.observe(
            NodeId::ROOT,
            ObserverInit {
                attributes: true,
                subtree: true,
                ..Default::default()
            },
        );
        let shadow_scoped = doc.observe(
            root,
            ObserverInit {
                attributes: true,
                subtree: true,
                ..Default::default()
            },
        );

        doc.set_attribute(inner, "disabled", "");
        assert!(doc.take_records(page_wide).is_empty());
        assert_eq!(doc.take_records(shadow_scoped).len(), 1);
    }

    #[test]
    fn test_disconnect_drops_queue() {
        let mut doc = Document::new();
        let card = doc.create_element("my-card");
        doc.append_child(doc.body(), card);
        let obs = doc.observe(
            card,
            ObserverInit {
                attributes: true,
                ..Default::default()
            },
        );

        doc.set_attribute(card, "a", "1");
        doc.disconnect_observer(obs);
        doc.set_attribute(card, "b", "2");

        assert!(doc.take_records(obs).is_empty());
    }
}
