//! DOM nodes
//!
//! Compact arena node with sibling links instead of pointers.

use crate::NodeId;
use crate::shadow::ShadowRootData;
use crate::style::Declaration;

/// Arena node
#[derive(Debug)]
pub struct Node {
    /// Parent node (None when detached or a tree root)
    pub parent: Option<NodeId>,
    /// First child
    pub first_child: Option<NodeId>,
    /// Last child (for O(1) append)
    pub last_child: Option<NodeId>,
    /// Previous sibling
    pub prev_sibling: Option<NodeId>,
    /// Next sibling
    pub next_sibling: Option<NodeId>,
    /// Node-specific data
    pub data: NodeData,
}

impl Node {
    pub(crate) fn new(data: NodeData) -> Self {
        Self {
            parent: None,
            first_child: None,
            last_child: None,
            prev_sibling: None,
            next_sibling: None,
            data,
        }
    }

    /// Check if this is an element
    #[inline]
    pub fn is_element(&self) -> bool {
        matches!(self.data, NodeData::Element(_))
    }

    /// Get element data if this is an element
    #[inline]
    pub fn as_element(&self) -> Option<&ElementData> {
        match &self.data {
            NodeData::Element(e) => Some(e),
            _ => None,
        }
    }

    /// Get mutable element data
    #[inline]
    pub fn as_element_mut(&mut self) -> Option<&mut ElementData> {
        match &mut self.data {
            NodeData::Element(e) => Some(e),
            _ => None,
        }
    }

    /// Get text content if this is a text node
    #[inline]
    pub fn as_text(&self) -> Option<&str> {
        match &self.data {
            NodeData::Text(t) => Some(t),
            _ => None,
        }
    }

    /// Get shadow root data if this is a shadow root fragment
    #[inline]
    pub fn as_shadow_root(&self) -> Option<&ShadowRootData> {
        match &self.data {
            NodeData::ShadowRoot(s) => Some(s),
            _ => None,
        }
    }
}

/// Node-specific data
#[derive(Debug)]
pub enum NodeData {
    /// Document root
    Document,
    /// Element
    Element(ElementData),
    /// Text content
    Text(String),
    /// Shadow root fragment, reachable only through its host
    ShadowRoot(ShadowRootData),
}

/// Element-specific data
#[derive(Debug)]
pub struct ElementData {
    /// Tag name, lowercase
    pub tag_name: String,
    /// Attributes in set order
    pub attrs: Vec<Attribute>,
    /// Inline style declarations
    pub inline_style: Vec<Declaration>,
    /// Shadow root fragment, if one was attached
    pub shadow_root: Option<NodeId>,
}

impl ElementData {
    pub fn new(tag_name: &str) -> Self {
        Self {
            tag_name: tag_name.to_ascii_lowercase(),
            attrs: Vec::new(),
            inline_style: Vec::new(),
            shadow_root: None,
        }
    }

    /// Get an attribute value
    pub fn get_attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }

    /// Check attribute presence
    pub fn has_attr(&self, name: &str) -> bool {
        self.attrs.iter().any(|a| a.name == name)
    }

    /// Set an attribute, returning the previous value
    pub fn set_attr(&mut self, name: &str, value: &str) -> Option<String> {
        for attr in self.attrs.iter_mut() {
            if attr.name == name {
                return Some(std::mem::replace(&mut attr.value, value.to_string()));
            }
        }
        self.attrs.push(Attribute {
            name: name.to_string(),
            value: value.to_string(),
        });
        None
    }

    /// Remove an attribute, returning the previous value
    pub fn remove_attr(&mut self, name: &str) -> Option<String> {
        let idx = self.attrs.iter().position(|a| a.name == name)?;
        Some(self.attrs.remove(idx).value)
    }

    /// The `id` attribute
    pub fn id_attr(&self) -> Option<&str> {
        self.get_attr("id")
    }

    /// Whitespace-split `class` attribute values
    pub fn class_list(&self) -> Vec<&str> {
        self.get_attr("class")
            .map(|c| c.split_ascii_whitespace().collect())
            .unwrap_or_default()
    }

    /// Custom elements are identified by a hyphen in the tag name
    #[inline]
    pub fn is_custom(&self) -> bool {
        self.tag_name.contains('-')
    }
}

/// Attribute
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attr_set_and_replace() {
        let mut elem = ElementData::new("my-card");
        assert_eq!(elem.set_attr("variant", "flat"), None);
        assert_eq!(elem.get_attr("variant"), Some("flat"));

        let old = elem.set_attr("variant", "raised");
        assert_eq!(old, Some("flat".to_string()));
        assert_eq!(elem.attrs.len(), 1);
    }

    #[test]
    fn test_attr_remove() {
        let mut elem = ElementData::new("my-card");
        elem.set_attr("title", "hello");

        assert_eq!(elem.remove_attr("title"), Some("hello".to_string()));
        assert_eq!(elem.remove_attr("title"), None);
        assert!(!elem.has_attr("title"));
    }

    #[test]
    fn test_class_list() {
        let mut elem = ElementData::new("div");
        elem.set_attr("class", "card  fancy primary");

        assert_eq!(elem.class_list(), vec!["card", "fancy", "primary"]);
    }

    #[test]
    fn test_custom_tag_detection() {
        assert!(ElementData::new("my-card").is_custom());
        assert!(ElementData::new("DIV").tag_name == "div");
        assert!(!ElementData::new("section").is_custom());
    }
}
