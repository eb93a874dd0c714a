//! Document
//!
//! The arena document: tree structure, attributes, component property
//! stores, mutation record routing, style and geometry stores, and the
//! virtual clock that stamps every record the engine consumes.

use std::collections::HashMap;

use serde_json::Value;
use tracing::debug;

use crate::NodeId;
use crate::component::{ComponentRegistry, ComponentSpec, UpdateNotice};
use crate::error::DomError;
use crate::events::{Listeners, TapCapture};
use crate::geometry::{DomRect, Viewport};
use crate::node::{Attribute, ElementData, Node, NodeData};
use crate::observer::{MutationRecord, ObserverId, ObserverInit, ObserverRegistry, RecordKind};
use crate::style::{ComputedStyle, Declaration, Stylesheet};

/// The host document
pub struct Document {
    pub(crate) nodes: Vec<Node>,
    pub(crate) registry: ComponentRegistry,
    pub(crate) properties: HashMap<NodeId, HashMap<String, Value>>,
    pub(crate) listeners: Listeners,
    pub(crate) captures: Vec<TapCapture>,
    pub(crate) dispatch_seq: u64,
    pub(crate) observers: ObserverRegistry,
    update_notices: Vec<UpdateNotice>,
    stylesheets: Vec<Stylesheet>,
    computed: HashMap<NodeId, ComputedStyle>,
    rects: HashMap<NodeId, DomRect>,
    /// Viewport geometry, used for overlay positioning
    pub viewport: Viewport,
    now_ms: u64,
    html: NodeId,
    head: NodeId,
    body: NodeId,
}

impl Document {
    /// Create a document with the usual html/head/body skeleton
    pub fn new() -> Self {
        let mut doc = Self {
            nodes: vec![Node::new(NodeData::Document)],
            registry: ComponentRegistry::new(),
            properties: HashMap::new(),
            listeners: Listeners::default(),
            captures: Vec::new(),
            dispatch_seq: 0,
            observers: ObserverRegistry::default(),
            update_notices: Vec::new(),
            stylesheets: Vec::new(),
            computed: HashMap::new(),
            rects: HashMap::new(),
            viewport: Viewport::default(),
            now_ms: 0,
            html: NodeId::ROOT,
            head: NodeId::ROOT,
            body: NodeId::ROOT,
        };

        let html = doc.create_element("html");
        let head = doc.create_element("head");
        let body = doc.create_element("body");
        doc.append_child(NodeId::ROOT, html);
        doc.append_child(html, head);
        doc.append_child(html, body);
        doc.html = html;
        doc.head = head;
        doc.body = body;
        doc
    }

    // ---- Clock ----

    /// Current virtual time in milliseconds
    #[inline]
    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    /// Advance the virtual clock
    pub fn advance(&mut self, ms: u64) {
        self.now_ms += ms;
    }

    // ---- Node access ----

    /// Get a node by ID
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    #[inline]
    pub(crate) fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    #[inline]
    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.index()]
    }

    /// The `<html>` element
    pub fn html(&self) -> NodeId {
        self.html
    }

    /// The `<head>` element
    pub fn head(&self) -> NodeId {
        self.head
    }

    /// The `<body>` element
    pub fn body(&self) -> NodeId {
        self.body
    }

    /// Tag name of an element node
    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        self.get(id)?.as_element().map(|e| e.tag_name.as_str())
    }

    /// Whether the node is a custom element (hyphenated tag)
    pub fn is_custom_element(&self, id: NodeId) -> bool {
        self.get(id)
            .and_then(|n| n.as_element())
            .map(|e| e.is_custom())
            .unwrap_or(false)
    }

    // ---- Tree construction ----

    /// Create a detached element
    pub fn create_element(&mut self, tag_name: &str) -> NodeId {
        self.push_node(Node::new(NodeData::Element(ElementData::new(tag_name))))
    }

    /// Create a detached text node
    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.push_node(Node::new(NodeData::Text(text.to_string())))
    }

    pub(crate) fn push_node(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    /// Append a child, detaching it from any previous parent first
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        if let Some(last) = self.node(parent).last_child {
            self.node_mut(last).next_sibling = Some(child);
            self.node_mut(child).prev_sibling = Some(last);
        } else {
            self.node_mut(parent).first_child = Some(child);
        }
        self.node_mut(parent).last_child = Some(child);
        self.node_mut(child).parent = Some(parent);
        self.deliver_mutation(
            parent,
            RecordKind::ChildList {
                added: vec![child],
                removed: Vec::new(),
            },
        );
    }

    /// Remove a node from its parent; the node stays in the arena, detached
    pub fn remove_node(&mut self, id: NodeId) {
        let parent = self.node(id).parent;
        self.detach(id);
        if let Some(parent) = parent {
            self.deliver_mutation(
                parent,
                RecordKind::ChildList {
                    added: Vec::new(),
                    removed: vec![id],
                },
            );
        }
    }

    fn detach(&mut self, id: NodeId) {
        let (parent, prev, next) = {
            let n = self.node(id);
            (n.parent, n.prev_sibling, n.next_sibling)
        };
        if parent.is_none() {
            return;
        }
        match prev {
            Some(prev) => self.node_mut(prev).next_sibling = next,
            None => {
                if let Some(parent) = parent {
                    self.node_mut(parent).first_child = next;
                }
            }
        }
        match next {
            Some(next) => self.node_mut(next).prev_sibling = prev,
            None => {
                if let Some(parent) = parent {
                    self.node_mut(parent).last_child = prev;
                }
            }
        }
        let n = self.node_mut(id);
        n.parent = None;
        n.prev_sibling = None;
        n.next_sibling = None;
    }

    // ---- Traversal ----

    /// Parent node
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id)?.parent
    }

    /// All child nodes in order
    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut child = self.node(id).first_child;
        while let Some(c) = child {
            out.push(c);
            child = self.node(c).next_sibling;
        }
        out
    }

    /// Element children only
    pub fn child_elements(&self, id: NodeId) -> Vec<NodeId> {
        self.children(id)
            .into_iter()
            .filter(|&c| self.node(c).is_element())
            .collect()
    }

    /// Ancestors by parent links, nearest first. Does not cross out of a
    /// shadow tree: the chain ends at the shadow root fragment.
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut cur = id;
        while let Some(p) = self.node(cur).parent {
            out.push(p);
            cur = p;
        }
        out
    }

    /// Ancestors crossing shadow boundaries: at a shadow root fragment the
    /// chain continues through the host element.
    pub fn composed_ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut cur = id;
        loop {
            if let Some(p) = self.node(cur).parent {
                out.push(p);
                cur = p;
                continue;
            }
            match self.node(cur).as_shadow_root() {
                Some(sr) => {
                    out.push(sr.host);
                    cur = sr.host;
                }
                None => break,
            }
        }
        out
    }

    /// Elements strictly below `root` in document order. Does not descend
    /// into shadow root fragments.
    pub fn elements_below(&self, root: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.collect_elements(root, &mut out);
        out
    }

    fn collect_elements(&self, node: NodeId, out: &mut Vec<NodeId>) {
        let mut child = self.node(node).first_child;
        while let Some(c) = child {
            if self.node(c).is_element() {
                out.push(c);
            }
            self.collect_elements(c, out);
            child = self.node(c).next_sibling;
        }
    }

    /// Whether `id` sits below `root` by parent links
    pub fn contains(&self, root: NodeId, id: NodeId) -> bool {
        if root == id {
            return true;
        }
        self.ancestors(id).contains(&root)
    }

    /// Whether the node reaches the document root through composed ancestors
    pub fn is_connected(&self, id: NodeId) -> bool {
        id == NodeId::ROOT || self.composed_ancestors(id).contains(&NodeId::ROOT)
    }

    /// Concatenated text of the subtree, shadow content included
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, node: NodeId, out: &mut String) {
        if let Some(sr) = self.node(node).as_element().and_then(|e| e.shadow_root) {
            self.collect_text(sr, out);
        }
        let mut child = self.node(node).first_child;
        while let Some(c) = child {
            match &self.node(c).data {
                NodeData::Text(t) => out.push_str(t),
                NodeData::Element(_) => self.collect_text(c, out),
                _ => {}
            }
            child = self.node(c).next_sibling;
        }
    }

    // ---- Attributes ----

    /// Attribute value
    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.get(id)?.as_element()?.get_attr(name)
    }

    /// Snapshot of all attributes in set order
    pub fn attributes(&self, id: NodeId) -> Vec<Attribute> {
        self.get(id)
            .and_then(|n| n.as_element())
            .map(|e| e.attrs.clone())
            .unwrap_or_default()
    }

    /// Set an attribute, returning the previous value. Routes a mutation
    /// record to matching observers.
    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) -> Option<String> {
        let old = self.node_mut(id).as_element_mut()?.set_attr(name, value);
        self.deliver_mutation(
            id,
            RecordKind::Attributes {
                name: name.to_string(),
                old_value: old.clone(),
            },
        );
        old
    }

    /// Remove an attribute, returning the previous value
    pub fn remove_attribute(&mut self, id: NodeId, name: &str) -> Option<String> {
        let old = self.node_mut(id).as_element_mut()?.remove_attr(name)?;
        self.deliver_mutation(
            id,
            RecordKind::Attributes {
                name: name.to_string(),
                old_value: Some(old.clone()),
            },
        );
        Some(old)
    }

    // ---- Components & properties ----

    /// Register a component definition
    pub fn define_component(&mut self, spec: ComponentSpec) -> Result<(), DomError> {
        self.registry.define(spec)
    }

    /// The component registry
    pub fn registry(&self) -> &ComponentRegistry {
        &self.registry
    }

    /// Set a property value. A defined setter marked as throwing fails
    /// without storing anything.
    pub fn set_property(&mut self, id: NodeId, name: &str, value: Value) -> Result<(), DomError> {
        let tag = match self.get(id).and_then(|n| n.as_element()) {
            Some(e) => e.tag_name.clone(),
            None => return Err(DomError::NotAnElement(id)),
        };
        if let Some(prop) = self.registry.property_spec(&tag, name) {
            if prop.setter_throws {
                return Err(DomError::SetterThrew {
                    tag,
                    property: name.to_string(),
                });
            }
        }
        self.properties
            .entry(id)
            .or_default()
            .insert(name.to_string(), value);
        Ok(())
    }

    /// Drop a stored property value so the descriptor default shows through
    /// again. Returns the value that was stored.
    pub fn remove_property(&mut self, id: NodeId, name: &str) -> Option<Value> {
        self.properties.get_mut(&id)?.remove(name)
    }

    /// Read a property value: the stored value, else the descriptor default.
    /// A getter marked as throwing fails instead of returning.
    pub fn property(&self, id: NodeId, name: &str) -> Result<Option<Value>, DomError> {
        let Some(elem) = self.get(id).and_then(|n| n.as_element()) else {
            return Err(DomError::NotAnElement(id));
        };
        let spec = self.registry.property_spec(&elem.tag_name, name);
        if let Some(prop) = spec {
            if prop.getter_throws {
                return Err(DomError::GetterThrew {
                    tag: elem.tag_name.clone(),
                    property: name.to_string(),
                });
            }
        }
        if let Some(stored) = self.properties.get(&id).and_then(|m| m.get(name)) {
            return Ok(Some(stored.clone()));
        }
        Ok(spec.map(|p| p.default.clone()))
    }

    /// Current values for every reflectable property of the element.
    /// Throwing getters are skipped.
    pub fn property_snapshot(&self, id: NodeId) -> Vec<(String, Value)> {
        let Some(elem) = self.get(id).and_then(|n| n.as_element()) else {
            return Vec::new();
        };
        let mut out = Vec::new();
        for prop in self.registry.resolve_properties(&elem.tag_name) {
            if prop.getter_throws {
                debug!(tag = %elem.tag_name, property = %prop.name, "skipping throwing getter");
                continue;
            }
            let value = self
                .properties
                .get(&id)
                .and_then(|m| m.get(&prop.name))
                .cloned()
                .unwrap_or_else(|| prop.default.clone());
            out.push((prop.name.clone(), value));
        }
        out
    }

    /// A component reports one completed update cycle. Empty change sets
    /// are not queued.
    pub fn notify_updated(&mut self, id: NodeId, changed: Vec<String>) {
        if changed.is_empty() {
            return;
        }
        let at = self.now_ms;
        self.update_notices.push(UpdateNotice {
            node: id,
            changed,
            at,
        });
    }

    /// Drain queued update notices
    pub fn take_update_notices(&mut self) -> Vec<UpdateNotice> {
        std::mem::take(&mut self.update_notices)
    }

    /// Whether the element's component definition has a reactive update hook
    pub fn has_update_hook(&self, id: NodeId) -> bool {
        self.get(id)
            .and_then(|n| n.as_element())
            .map(|e| self.registry.has_update_hook(&e.tag_name))
            .unwrap_or(false)
    }

    // ---- Styles ----

    /// Attach a stylesheet to the document
    pub fn add_stylesheet(&mut self, sheet: Stylesheet) {
        self.stylesheets.push(sheet);
    }

    /// All attached stylesheets
    pub fn stylesheets(&self) -> &[Stylesheet] {
        &self.stylesheets
    }

    /// Replace an element's inline style declarations
    pub fn set_inline_style(&mut self, id: NodeId, declarations: Vec<Declaration>) {
        if let Some(elem) = self.node_mut(id).as_element_mut() {
            elem.inline_style = declarations;
        }
    }

    /// An element's inline style declarations
    pub fn inline_style(&self, id: NodeId) -> &[Declaration] {
        self.get(id)
            .and_then(|n| n.as_element())
            .map(|e| e.inline_style.as_slice())
            .unwrap_or(&[])
    }

    /// Record computed style for an element
    pub fn set_computed_style(&mut self, id: NodeId, style: ComputedStyle) {
        self.computed.insert(id, style);
    }

    /// Computed style for an element, defaults when none was recorded
    pub fn computed_style(&self, id: NodeId) -> ComputedStyle {
        self.computed.get(&id).cloned().unwrap_or_default()
    }

    // ---- Geometry ----

    /// Record layout geometry for an element
    pub fn set_bounding_rect(&mut self, id: NodeId, rect: DomRect) {
        self.rects.insert(id, rect);
    }

    /// Bounding rect for an element, zero when none was recorded
    pub fn bounding_rect(&self, id: NodeId) -> DomRect {
        self.rects.get(&id).copied().unwrap_or_default()
    }

    // ---- Mutation observers ----

    /// Register a mutation observer on a target node
    pub fn observe(&mut self, target: NodeId, init: ObserverInit) -> ObserverId {
        self.observers.observe(target, init)
    }

    /// Disconnect an observer; its undelivered records are dropped
    pub fn disconnect_observer(&mut self, id: ObserverId) {
        self.observers.disconnect(id);
    }

    /// Drain an observer's queued records
    pub fn take_records(&mut self, id: ObserverId) -> Vec<MutationRecord> {
        self.observers.take_records(id)
    }

    fn deliver_mutation(&mut self, target: NodeId, kind: RecordKind) {
        let scope = self.ancestors(target);
        let at = self.now_ms;
        self.observers.deliver(target, &scope, kind, at);
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}
