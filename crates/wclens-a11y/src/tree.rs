//! Accessibility tree building and accessible-name computation.

use crate::aria::{computed_role, AriaRole};
use crate::error::A11yError;
use wclens_dom::{Document, NodeId};

/// One node of the accessibility tree, mirroring the composed element tree.
#[derive(Debug, Clone, PartialEq)]
pub struct A11yTreeNode {
    pub node: NodeId,
    pub tag: String,
    pub role: AriaRole,
    pub name: String,
    pub description: String,
    pub visible: bool,
    pub focusable: bool,
    /// Widget state tokens, in announcement order
    pub state: Vec<String>,
    pub level: Option<u8>,
    pub children: Vec<A11yTreeNode>,
}

/// Builds the accessibility tree rooted at an element. Shadow content is
/// included ahead of light children, matching composed rendering order.
pub fn build_tree(doc: &Document, id: NodeId) -> Result<A11yTreeNode, A11yError> {
    if doc.tag_name(id).is_none() {
        return Err(A11yError::NotAnElement(id));
    }
    Ok(build_node(doc, id))
}

fn build_node(doc: &Document, id: NodeId) -> A11yTreeNode {
    let role = computed_role(doc, id);
    let children = composed_element_children(doc, id)
        .into_iter()
        .map(|child| build_node(doc, child))
        .collect();
    A11yTreeNode {
        node: id,
        tag: doc.tag_name(id).unwrap_or_default().to_string(),
        role,
        name: accessible_name(doc, id),
        description: accessible_description(doc, id),
        visible: is_visible(doc, id),
        focusable: is_focusable(doc, id),
        state: state_tokens(doc, id),
        level: heading_level(doc, id, role),
        children,
    }
}

/// Announced widget states: toggle values from `aria-checked`,
/// `aria-pressed`, `aria-expanded`, `aria-selected`, and the `disabled`
/// attribute.
fn state_tokens(doc: &Document, id: NodeId) -> Vec<String> {
    let mut out: Vec<&str> = Vec::new();
    match doc.attribute(id, "aria-checked").map(str::trim) {
        Some("true") => out.push("checked"),
        Some("mixed") => out.push("partially checked"),
        Some(_) => out.push("not checked"),
        None => {}
    }
    match doc.attribute(id, "aria-pressed").map(str::trim) {
        Some("true") => out.push("pressed"),
        Some(_) => out.push("not pressed"),
        None => {}
    }
    match doc.attribute(id, "aria-expanded").map(str::trim) {
        Some("true") => out.push("expanded"),
        Some(_) => out.push("collapsed"),
        None => {}
    }
    if doc.attribute(id, "aria-selected").map(str::trim) == Some("true") {
        out.push("selected");
    }
    if doc.attribute(id, "disabled").is_some() {
        out.push("disabled");
    }
    out.into_iter().map(str::to_string).collect()
}

/// Approximates what a screen reader would announce for a tree node.
pub fn screen_reader_text(node: &A11yTreeNode) -> String {
    let mut parts: Vec<String> = Vec::new();
    if !node.name.is_empty() {
        parts.push(node.name.clone());
    }
    if node.role != AriaRole::Generic {
        let mut role = node.role.as_str().to_string();
        if let Some(level) = node.level {
            role.push_str(&format!(" level {level}"));
        }
        parts.push(role);
    }
    parts.extend(node.state.iter().cloned());
    if !node.description.is_empty() {
        parts.push(node.description.clone());
    }
    parts.join(", ")
}

/// Computes the accessible name of an element: `aria-labelledby`, then
/// `aria-label`, `alt`, an associated `<label>`, text content for roles
/// that allow it, and finally `title`.
pub fn accessible_name(doc: &Document, id: NodeId) -> String {
    if let Some(refs) = doc.attribute(id, "aria-labelledby") {
        let text = resolve_id_refs(doc, refs);
        if !text.is_empty() {
            return text;
        }
    }
    if let Some(label) = doc.attribute(id, "aria-label") {
        let label = collapse(label);
        if !label.is_empty() {
            return label;
        }
    }
    let tag = doc.tag_name(id).unwrap_or_default();
    if matches!(tag, "img" | "area" | "input") {
        if let Some(alt) = doc.attribute(id, "alt") {
            return collapse(alt);
        }
    }
    if matches!(tag, "input" | "select" | "textarea") {
        if let Some(label) = control_label(doc, id) {
            if !label.is_empty() {
                return label;
            }
        }
    }
    if computed_role(doc, id).supports_name_from_content() {
        let text = collapse(&doc.text_content(id));
        if !text.is_empty() {
            return text;
        }
    }
    if let Some(title) = doc.attribute(id, "title") {
        return collapse(title);
    }
    String::new()
}

/// Computes the accessible description, which supplements the name.
pub fn accessible_description(doc: &Document, id: NodeId) -> String {
    if let Some(refs) = doc.attribute(id, "aria-describedby") {
        let text = resolve_id_refs(doc, refs);
        if !text.is_empty() {
            return text;
        }
    }
    if let Some(desc) = doc.attribute(id, "aria-description") {
        let desc = collapse(desc);
        if !desc.is_empty() {
            return desc;
        }
    }
    if let Some(title) = doc.attribute(id, "title") {
        let title = collapse(title);
        if title != accessible_name(doc, id) {
            return title;
        }
    }
    String::new()
}

/// Whether an element can receive keyboard focus.
pub fn is_focusable(doc: &Document, id: NodeId) -> bool {
    if doc.attribute(id, "disabled").is_some() {
        return false;
    }
    if let Some(value) = doc.attribute(id, "tabindex") {
        if let Ok(index) = value.trim().parse::<i32>() {
            return index >= 0;
        }
    }
    let Some(tag) = doc.tag_name(id) else {
        return false;
    };
    match tag {
        "a" | "area" => doc.attribute(id, "href").is_some(),
        "button" | "select" | "textarea" | "summary" => true,
        "input" => doc
            .attribute(id, "type")
            .map(|t| !t.eq_ignore_ascii_case("hidden"))
            .unwrap_or(true),
        "audio" | "video" => doc.attribute(id, "controls").is_some(),
        _ => false,
    }
}

/// Hidden attributes and computed display/visibility both hide a node.
pub fn is_visible(doc: &Document, id: NodeId) -> bool {
    if doc.attribute(id, "hidden").is_some() {
        return false;
    }
    if doc
        .attribute(id, "aria-hidden")
        .map(|v| v.trim() == "true")
        .unwrap_or(false)
    {
        return false;
    }
    let style = doc.computed_style(id);
    style.display != "none" && style.visibility != "hidden"
}

/// Element children in composed order: shadow content first, then light.
pub(crate) fn composed_element_children(doc: &Document, id: NodeId) -> Vec<NodeId> {
    let mut out = Vec::new();
    if let Some(fragment) = doc.shadow_root(id) {
        out.extend(doc.child_elements(fragment));
    }
    out.extend(doc.child_elements(id));
    out
}

/// All composed element descendants of a node, depth first.
pub(crate) fn composed_descendants(doc: &Document, root: NodeId) -> Vec<NodeId> {
    let mut out = Vec::new();
    collect_composed(doc, root, &mut out);
    out
}

fn collect_composed(doc: &Document, root: NodeId, out: &mut Vec<NodeId>) {
    for child in composed_element_children(doc, root) {
        out.push(child);
        collect_composed(doc, child, out);
    }
}

pub(crate) fn has_focusable_within(doc: &Document, root: NodeId) -> bool {
    composed_descendants(doc, root)
        .into_iter()
        .any(|el| is_focusable(doc, el))
}

pub(crate) fn find_by_id(doc: &Document, target: &str) -> Option<NodeId> {
    let html = doc.html();
    if doc.attribute(html, "id") == Some(target) {
        return Some(html);
    }
    composed_descendants(doc, html)
        .into_iter()
        .find(|&el| doc.attribute(el, "id") == Some(target))
}

fn resolve_id_refs(doc: &Document, refs: &str) -> String {
    let mut parts = Vec::new();
    for target in refs.split_whitespace() {
        if let Some(el) = find_by_id(doc, target) {
            let text = collapse(&doc.text_content(el));
            if !text.is_empty() {
                parts.push(text);
            }
        }
    }
    parts.join(" ")
}

fn control_label(doc: &Document, id: NodeId) -> Option<String> {
    if let Some(own) = doc.attribute(id, "id") {
        let label = composed_descendants(doc, doc.html()).into_iter().find(|&el| {
            doc.tag_name(el) == Some("label") && doc.attribute(el, "for") == Some(own)
        });
        if let Some(el) = label {
            return Some(collapse(&doc.text_content(el)));
        }
    }
    doc.ancestors(id)
        .into_iter()
        .find(|&anc| doc.tag_name(anc) == Some("label"))
        .map(|el| collapse(&doc.text_content(el)))
}

fn heading_level(doc: &Document, id: NodeId, role: AriaRole) -> Option<u8> {
    if role != AriaRole::Heading {
        return None;
    }
    if let Some(tag) = doc.tag_name(id) {
        if let Some(rest) = tag.strip_prefix('h') {
            if let Ok(level) = rest.parse::<u8>() {
                if (1..=6).contains(&level) {
                    return Some(level);
                }
            }
        }
    }
    doc.attribute(id, "aria-level")
        .and_then(|v| v.trim().parse().ok())
        .or(Some(2))
}

fn collapse(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use wclens_dom::ShadowMode;

    #[test]
    fn test_name_priority() {
        let mut doc = Document::new();
        let body = doc.body();
        let button = doc.create_element("button");
        doc.append_child(body, button);
        let text = doc.create_text("  Click   me  ");
        doc.append_child(button, text);
        assert_eq!(accessible_name(&doc, button), "Click me");

        doc.set_attribute(button, "aria-label", "Submit form");
        assert_eq!(accessible_name(&doc, button), "Submit form");

        let caption = doc.create_element("span");
        doc.set_attribute(caption, "id", "cap");
        doc.append_child(body, caption);
        let caption_text = doc.create_text("Send the order");
        doc.append_child(caption, caption_text);
        doc.set_attribute(button, "aria-labelledby", "cap");
        assert_eq!(accessible_name(&doc, button), "Send the order");
    }

    #[test]
    fn test_label_for_association() {
        let mut doc = Document::new();
        let body = doc.body();
        let label = doc.create_element("label");
        doc.set_attribute(label, "for", "email");
        doc.append_child(body, label);
        let label_text = doc.create_text("Email address");
        doc.append_child(label, label_text);
        let input = doc.create_element("input");
        doc.set_attribute(input, "id", "email");
        doc.append_child(body, input);
        assert_eq!(accessible_name(&doc, input), "Email address");
    }

    #[test]
    fn test_tree_crosses_shadow_boundary() {
        let mut doc = Document::new();
        let body = doc.body();
        let host = doc.create_element("x-card");
        doc.append_child(body, host);
        let fragment = doc.attach_shadow(host, ShadowMode::Open, false).unwrap();
        let inner = doc.create_element("button");
        doc.append_child(fragment, inner);
        let inner_text = doc.create_text("Inside");
        doc.append_child(inner, inner_text);
        let light = doc.create_element("p");
        doc.append_child(host, light);

        let tree = build_tree(&doc, host).unwrap();
        assert_eq!(tree.children.len(), 2);
        assert_eq!(tree.children[0].node, inner);
        assert_eq!(tree.children[0].role, AriaRole::Button);
        assert_eq!(tree.children[1].node, light);
    }

    #[test]
    fn test_heading_levels() {
        let mut doc = Document::new();
        let body = doc.body();
        let h3 = doc.create_element("h3");
        doc.append_child(body, h3);
        let div = doc.create_element("div");
        doc.set_attribute(div, "role", "heading");
        doc.set_attribute(div, "aria-level", "4");
        doc.append_child(body, div);

        let tree = build_tree(&doc, body).unwrap();
        assert_eq!(tree.children[0].level, Some(3));
        assert_eq!(tree.children[1].level, Some(4));
    }

    #[test]
    fn test_screen_reader_text() {
        let mut doc = Document::new();
        let body = doc.body();
        let h2 = doc.create_element("h2");
        doc.append_child(body, h2);
        let text = doc.create_text("Settings");
        doc.append_child(h2, text);
        let node = build_tree(&doc, h2).unwrap();
        assert_eq!(screen_reader_text(&node), "Settings, heading level 2");
    }

    #[test]
    fn test_screen_reader_text_announces_state() {
        let mut doc = Document::new();
        let body = doc.body();
        let input = doc.create_element("input");
        doc.set_attribute(input, "type", "checkbox");
        doc.set_attribute(input, "aria-label", "Subscribe");
        doc.set_attribute(input, "aria-checked", "true");
        doc.append_child(body, input);
        let node = build_tree(&doc, input).unwrap();
        assert_eq!(screen_reader_text(&node), "Subscribe, checkbox, checked");

        doc.set_attribute(input, "aria-checked", "false");
        doc.set_attribute(input, "disabled", "");
        let node = build_tree(&doc, input).unwrap();
        assert_eq!(
            screen_reader_text(&node),
            "Subscribe, checkbox, not checked, disabled"
        );

        let toggle = doc.create_element("button");
        doc.set_attribute(toggle, "aria-expanded", "false");
        doc.append_child(body, toggle);
        let node = build_tree(&doc, toggle).unwrap();
        assert_eq!(screen_reader_text(&node), "button, collapsed");
    }

    #[test]
    fn test_focusability() {
        let mut doc = Document::new();
        let body = doc.body();
        let button = doc.create_element("button");
        doc.append_child(body, button);
        assert!(is_focusable(&doc, button));

        doc.set_attribute(button, "disabled", "");
        assert!(!is_focusable(&doc, button));

        let div = doc.create_element("div");
        doc.append_child(body, div);
        assert!(!is_focusable(&doc, div));
        doc.set_attribute(div, "tabindex", "0");
        assert!(is_focusable(&doc, div));
        doc.set_attribute(div, "tabindex", "-1");
        assert!(!is_focusable(&doc, div));
    }

    #[test]
    fn test_visibility() {
        let mut doc = Document::new();
        let body = doc.body();
        let div = doc.create_element("div");
        doc.append_child(body, div);
        assert!(is_visible(&doc, div));
        doc.set_attribute(div, "aria-hidden", "true");
        assert!(!is_visible(&doc, div));
    }
}
