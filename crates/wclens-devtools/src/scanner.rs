//! Component scanner
//!
//! Discovers custom-element instances in a page, shadow trees included.
//! The hyphen in the tag name is the sole identity test, so undefined
//! components are still surfaced.

use serde_json::Value;
use tracing::debug;
use wclens_dom::{Document, NodeId, ShadowMode, SlotDetail, StyleOrigin};

use crate::cssvars::CssVariableInfo;

/// Snapshot of one custom-element instance at scan time.
#[derive(Debug, Clone)]
pub struct ComponentInstance {
    pub element: NodeId,
    pub tag_name: String,
    /// Attribute pairs in document order
    pub attributes: Vec<(String, String)>,
    /// Reflectable property values; hostile getters are absent
    pub properties: Vec<(String, Value)>,
    /// Method names from the capability descriptor chain, sorted
    pub methods: Vec<String>,
    /// Slot names paired with whether anything is assigned to them;
    /// the unnamed slot shows as "default"
    pub slots: Vec<(String, bool)>,
    pub shadow: Option<ShadowSnapshot>,
    /// Instances discovered inside this element's shadow root
    pub nested: Vec<NodeId>,
    /// Host whose shadow tree this instance was discovered in
    pub parent: Option<NodeId>,
    pub in_shadow_dom: bool,
    /// Nesting depth in the component tree, zero at the top
    pub depth: usize,
    /// Filled in by the session when render tracking is active
    pub render_count: Option<u64>,
    /// Filled in by the session when variable resolution is requested
    pub css_variables: Option<Vec<CssVariableInfo>>,
}

/// What a shadow root looked like at scan time. Closed roots are reported
/// too; the engine runs inside the page and only surfaces the mode.
#[derive(Debug, Clone)]
pub struct ShadowSnapshot {
    pub mode: ShadowMode,
    pub delegates_focus: bool,
    /// Custom properties declared by the root's own stylesheets
    pub custom_properties: Vec<(String, String)>,
    pub slots: Vec<SlotDetail>,
    pub tree: ShadowNode,
}

/// Structural summary of a shadow subtree.
#[derive(Debug, Clone)]
pub enum ShadowNode {
    Element { tag: String, children: Vec<ShadowNode> },
    Text(String),
}

/// Scans the whole page from the body.
pub fn scan(doc: &Document) -> Vec<ComponentInstance> {
    scan_root(doc, doc.body(), false)
}

/// Scans below one root. `in_shadow` seeds the shadow flag for roots that
/// are themselves shadow fragments.
pub fn scan_root(doc: &Document, root: NodeId, in_shadow: bool) -> Vec<ComponentInstance> {
    let mut out = Vec::new();
    collect(doc, root, in_shadow, 0, None, &mut out);
    debug!(instances = out.len(), "component scan complete");
    out
}

fn collect(
    doc: &Document,
    node: NodeId,
    in_shadow: bool,
    depth: usize,
    parent: Option<NodeId>,
    out: &mut Vec<ComponentInstance>,
) {
    for child in doc.child_elements(node) {
        visit(doc, child, in_shadow, depth, parent, out);
    }
}

fn visit(
    doc: &Document,
    el: NodeId,
    in_shadow: bool,
    depth: usize,
    parent: Option<NodeId>,
    out: &mut Vec<ComponentInstance>,
) {
    if doc.is_custom_element(el) {
        let idx = out.len();
        out.push(build_instance(doc, el, in_shadow, depth, parent));
        if let Some(fragment) = doc.shadow_root(el) {
            collect(doc, fragment, true, depth + 1, Some(el), out);
        }
        collect(doc, el, in_shadow, depth + 1, parent, out);
        let nested: Vec<NodeId> = out[idx + 1..]
            .iter()
            .filter(|inst| inst.parent == Some(el))
            .map(|inst| inst.element)
            .collect();
        out[idx].nested = nested;
    } else {
        if let Some(fragment) = doc.shadow_root(el) {
            collect(doc, fragment, true, depth, parent, out);
        }
        collect(doc, el, in_shadow, depth, parent, out);
    }
}

fn build_instance(
    doc: &Document,
    el: NodeId,
    in_shadow: bool,
    depth: usize,
    parent: Option<NodeId>,
) -> ComponentInstance {
    let tag_name = doc.tag_name(el).unwrap_or_default().to_string();
    let attributes = doc
        .attributes(el)
        .into_iter()
        .map(|a| (a.name, a.value))
        .collect();
    let properties = doc.property_snapshot(el);
    let methods = doc.registry().resolve_methods(&tag_name);
    let slots = doc
        .slot_map(el)
        .into_iter()
        .map(|s| {
            let name = if s.name.is_empty() { "default".to_string() } else { s.name };
            (name, !s.assigned.is_empty())
        })
        .collect();
    let shadow = match (doc.shadow_root(el), doc.shadow_info(el)) {
        (Some(fragment), Some(info)) => Some(ShadowSnapshot {
            mode: info.mode,
            delegates_focus: info.delegates_focus,
            custom_properties: shadow_custom_properties(doc, el),
            slots: doc.slot_map(el),
            tree: shadow_tree(doc, fragment),
        }),
        _ => None,
    };
    ComponentInstance {
        element: el,
        tag_name,
        attributes,
        properties,
        methods,
        slots,
        shadow,
        nested: Vec::new(),
        parent,
        in_shadow_dom: in_shadow,
        depth,
        render_count: None,
        css_variables: None,
    }
}

fn shadow_custom_properties(doc: &Document, host: NodeId) -> Vec<(String, String)> {
    let mut out = Vec::new();
    for sheet in doc.stylesheets() {
        let owner = match sheet.origin {
            StyleOrigin::ShadowStyle(h) | StyleOrigin::Adopted(h) => h,
            StyleOrigin::Document => continue,
        };
        if owner != host {
            continue;
        }
        let Ok(rules) = sheet.rules() else {
            continue;
        };
        for rule in rules {
            for decl in &rule.declarations {
                if decl.is_custom_property() {
                    out.push((decl.name.clone(), decl.value.clone()));
                }
            }
        }
    }
    out
}

fn shadow_tree(doc: &Document, fragment: NodeId) -> ShadowNode {
    ShadowNode::Element {
        tag: "#shadow-root".to_string(),
        children: child_summaries(doc, fragment),
    }
}

fn child_summaries(doc: &Document, node: NodeId) -> Vec<ShadowNode> {
    let mut out = Vec::new();
    for child in doc.children(node) {
        let Some(n) = doc.get(child) else { continue };
        if let Some(elem) = n.as_element() {
            out.push(ShadowNode::Element {
                tag: elem.tag_name.clone(),
                children: child_summaries(doc, child),
            });
        } else if let Some(text) = n.as_text() {
            let trimmed = text.trim();
            if !trimmed.is_empty() {
                out.push(ShadowNode::Text(trimmed.to_string()));
            }
        }
    }
    out
}

/// Display path for an element: tag names joined ancestor to element,
/// with `#id` standing in where an element carries an id.
pub fn selector_path(doc: &Document, id: NodeId) -> String {
    let mut path = Vec::new();
    let mut current = Some(id);
    while let Some(node) = current {
        if let Some(tag) = doc.tag_name(node) {
            let selector = match doc.attribute(node, "id") {
                Some(id_value) => format!("#{id_value}"),
                None => tag.to_string(),
            };
            path.push(selector);
        }
        current = doc.parent(node);
    }
    path.reverse();
    path.join(" > ")
}
