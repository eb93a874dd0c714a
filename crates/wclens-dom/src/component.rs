//! Component descriptors
//!
//! Capability descriptors for custom element definitions: which properties
//! and methods a component exposes, whether accessors throw, and whether it
//! has a reactive update hook. Descriptors are consulted through the
//! registry instead of reflecting over live class objects.

use std::collections::{HashMap, HashSet};

use serde_json::Value;
use tracing::debug;

use crate::NodeId;
use crate::error::DomError;

/// Lifecycle and framework-internal names excluded from reflection
pub const LIFECYCLE_NAMES: &[&str] = &[
    "constructor",
    "connectedCallback",
    "disconnectedCallback",
    "adoptedCallback",
    "attributeChangedCallback",
    "attributeChanged",
    "requestUpdate",
    "firstUpdated",
    "updated",
    "render",
    "update",
    "shouldUpdate",
    "willUpdate",
    "performUpdate",
    "createRenderRoot",
];

/// Component definition registry
#[derive(Debug, Default)]
pub struct ComponentRegistry {
    specs: HashMap<String, ComponentSpec>,
}

/// Capability descriptor for one component tag
#[derive(Debug, Clone)]
pub struct ComponentSpec {
    /// Tag name, lowercase, hyphenated
    pub tag: String,
    /// Base component tag this one extends, if any
    pub extends: Option<String>,
    /// Reflectable properties declared at this level
    pub properties: Vec<PropertySpec>,
    /// Methods declared at this level
    pub methods: Vec<MethodSpec>,
    /// Whether the component runs a reactive update cycle
    pub has_update_hook: bool,
}

impl ComponentSpec {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            extends: None,
            properties: Vec::new(),
            methods: Vec::new(),
            has_update_hook: false,
        }
    }
}

/// One property descriptor
#[derive(Debug, Clone)]
pub struct PropertySpec {
    pub name: String,
    /// Value reported before anything is stored on the element
    pub default: Value,
    /// Reading this property raises instead of returning
    pub getter_throws: bool,
    /// Writing this property raises instead of storing
    pub setter_throws: bool,
}

impl PropertySpec {
    pub fn new(name: &str, default: Value) -> Self {
        Self {
            name: name.to_string(),
            default,
            getter_throws: false,
            setter_throws: false,
        }
    }
}

/// One method descriptor
#[derive(Debug, Clone)]
pub struct MethodSpec {
    pub name: String,
}

impl MethodSpec {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
        }
    }
}

/// A completed component update cycle, queued for the render tracker
#[derive(Debug, Clone)]
pub struct UpdateNotice {
    pub node: NodeId,
    /// Names of the properties that changed in the cycle; never empty
    pub changed: Vec<String>,
    pub at: u64,
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a component definition
    pub fn define(&mut self, spec: ComponentSpec) -> Result<(), DomError> {
        if !Self::is_valid_name(&spec.tag) {
            return Err(DomError::InvalidName(spec.tag));
        }
        if self.specs.contains_key(&spec.tag) {
            return Err(DomError::AlreadyDefined(spec.tag));
        }
        debug!(tag = %spec.tag, "component defined");
        self.specs.insert(spec.tag.clone(), spec);
        Ok(())
    }

    /// Get a definition by tag
    pub fn get(&self, tag: &str) -> Option<&ComponentSpec> {
        self.specs.get(tag)
    }

    /// Check if a tag is defined
    pub fn is_defined(&self, tag: &str) -> bool {
        self.specs.contains_key(tag)
    }

    /// Reflectable properties for a tag, walking the extends chain.
    /// The nearest declaration of a name wins; underscore-prefixed and
    /// lifecycle names are excluded.
    pub fn resolve_properties(&self, tag: &str) -> Vec<&PropertySpec> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for spec in self.chain(tag) {
            for prop in &spec.properties {
                if !is_reflectable(&prop.name) {
                    continue;
                }
                if seen.insert(prop.name.as_str()) {
                    out.push(prop);
                }
            }
        }
        out
    }

    /// Nearest descriptor for a single property name
    pub fn property_spec(&self, tag: &str, name: &str) -> Option<&PropertySpec> {
        self.chain(tag)
            .into_iter()
            .flat_map(|spec| spec.properties.iter())
            .find(|p| p.name == name)
    }

    /// Method names for a tag, walking the extends chain, sorted.
    /// Excludes underscore-prefixed and lifecycle names.
    pub fn resolve_methods(&self, tag: &str) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for spec in self.chain(tag) {
            for method in &spec.methods {
                if !is_reflectable(&method.name) {
                    continue;
                }
                if !out.contains(&method.name) {
                    out.push(method.name.clone());
                }
            }
        }
        out.sort();
        out
    }

    /// Whether any definition in the chain has the reactive update hook
    pub fn has_update_hook(&self, tag: &str) -> bool {
        self.chain(tag).iter().any(|spec| spec.has_update_hook)
    }

    /// Event names inferred from `on`-prefixed handler properties
    pub fn inferred_event_names(&self, tag: &str) -> Vec<String> {
        self.resolve_properties(tag)
            .into_iter()
            .filter(|p| p.name.starts_with("on") && p.name.len() > 2)
            .map(|p| p.name[2..].to_string())
            .collect()
    }

    /// Definition chain from the tag through its bases, nearest first.
    /// Cycles in extends links are cut at the repeat.
    fn chain(&self, tag: &str) -> Vec<&ComponentSpec> {
        let mut out = Vec::new();
        let mut visited = HashSet::new();
        let mut cur = Some(tag.to_string());
        while let Some(tag) = cur {
            if !visited.insert(tag.clone()) {
                break;
            }
            match self.specs.get(&tag) {
                Some(spec) => {
                    cur = spec.extends.clone();
                    out.push(spec);
                }
                None => break,
            }
        }
        out
    }

    /// Custom element tags must be hyphenated, start lowercase, and avoid
    /// the reserved SVG/MathML names.
    pub fn is_valid_name(name: &str) -> bool {
        if !name.contains('-') {
            return false;
        }
        if !name
            .chars()
            .next()
            .map(|c| c.is_ascii_lowercase())
            .unwrap_or(false)
        {
            return false;
        }
        let reserved = [
            "annotation-xml",
            "color-profile",
            "font-face",
            "font-face-src",
            "font-face-uri",
            "font-face-format",
            "font-face-name",
            "missing-glyph",
        ];
        !reserved.contains(&name)
    }
}

fn is_reflectable(name: &str) -> bool {
    !name.starts_with('_') && !LIFECYCLE_NAMES.contains(&name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Document;
    use serde_json::json;

    #[test]
    fn test_valid_names() {
        assert!(ComponentRegistry::is_valid_name("my-element"));
        assert!(ComponentRegistry::is_valid_name("app-header"));
        assert!(!ComponentRegistry::is_valid_name("myelement")); // no hyphen
        assert!(!ComponentRegistry::is_valid_name("My-Element")); // uppercase
        assert!(!ComponentRegistry::is_valid_name("font-face")); // reserved
    }

    #[test]
    fn test_define_rejects_duplicates() {
        let mut registry = ComponentRegistry::new();
        assert!(registry.define(ComponentSpec::new("my-element")).is_ok());
        assert!(registry.is_defined("my-element"));
        assert!(matches!(
            registry.define(ComponentSpec::new("my-element")),
            Err(DomError::AlreadyDefined(_))
        ));
    }

    #[test]
    fn test_chain_resolution_nearest_wins() {
        let mut registry = ComponentRegistry::new();
        let mut base = ComponentSpec::new("base-card");
        base.properties.push(PropertySpec::new("variant", json!("plain")));
        base.properties.push(PropertySpec::new("elevation", json!(0)));
        base.methods.push(MethodSpec::new("show"));
        registry.define(base).unwrap();

        let mut derived = ComponentSpec::new("my-card");
        derived.extends = Some("base-card".to_string());
        derived.properties.push(PropertySpec::new("variant", json!("fancy")));
        derived.methods.push(MethodSpec::new("close"));
        registry.define(derived).unwrap();

        let props = registry.resolve_properties("my-card");
        assert_eq!(props.len(), 2);
        assert_eq!(props[0].name, "variant");
        assert_eq!(props[0].default, json!("fancy"));
        assert_eq!(registry.resolve_methods("my-card"), vec!["close", "show"]);
    }

    #[test]
    fn test_lifecycle_and_private_names_excluded() {
        let mut registry = ComponentRegistry::new();
        let mut spec = ComponentSpec::new("my-widget");
        spec.properties.push(PropertySpec::new("label", json!("")));
        spec.properties.push(PropertySpec::new("_internal", json!(0)));
        spec.methods.push(MethodSpec::new("requestUpdate"));
        spec.methods.push(MethodSpec::new("refresh"));
        registry.define(spec).unwrap();

        let props = registry.resolve_properties("my-widget");
        assert_eq!(props.len(), 1);
        assert_eq!(props[0].name, "label");
        assert_eq!(registry.resolve_methods("my-widget"), vec!["refresh"]);
    }

    #[test]
    fn test_inferred_event_names() {
        let mut registry = ComponentRegistry::new();
        let mut spec = ComponentSpec::new("my-input");
        spec.properties.push(PropertySpec::new("onchange", Value::Null));
        spec.properties.push(PropertySpec::new("onvalidate", Value::Null));
        spec.properties.push(PropertySpec::new("open", json!(false)));
        registry.define(spec).unwrap();

        assert_eq!(
            registry.inferred_event_names("my-input"),
            vec!["change", "validate"]
        );
    }

    #[test]
    fn test_update_hook_through_chain() {
        let mut registry = ComponentRegistry::new();
        let mut base = ComponentSpec::new("reactive-base");
        base.has_update_hook = true;
        registry.define(base).unwrap();
        let mut derived = ComponentSpec::new("my-reactive");
        derived.extends = Some("reactive-base".to_string());
        registry.define(derived).unwrap();

        assert!(registry.has_update_hook("my-reactive"));
        assert!(!registry.has_update_hook("my-plain"));
    }

    #[test]
    fn test_property_store_defaults_and_hostile_accessors() {
        let mut doc = Document::new();
        let mut spec = ComponentSpec::new("my-card");
        spec.properties.push(PropertySpec::new("variant", json!("plain")));
        spec.properties.push(PropertySpec {
            getter_throws: true,
            ..PropertySpec::new("secret", Value::Null)
        });
        spec.properties.push(PropertySpec {
            setter_throws: true,
            ..PropertySpec::new("locked", json!(1))
        });
        doc.define_component(spec).unwrap();

        let card = doc.create_element("my-card");
        doc.append_child(doc.body(), card);

        // Default until written, stored value afterwards.
        assert_eq!(doc.property(card, "variant").unwrap(), Some(json!("plain")));
        doc.set_property(card, "variant", json!("fancy")).unwrap();
        assert_eq!(doc.property(card, "variant").unwrap(), Some(json!("fancy")));

        // The throwing getter errors on direct reads and is skipped in
        // snapshots; the throwing setter stores nothing.
        assert!(doc.property(card, "secret").is_err());
        assert!(doc.set_property(card, "locked", json!(2)).is_err());
        assert_eq!(doc.property(card, "locked").unwrap(), Some(json!(1)));

        let snapshot = doc.property_snapshot(card);
        let names: Vec<&str> = snapshot.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["variant", "locked"]);
    }
}
