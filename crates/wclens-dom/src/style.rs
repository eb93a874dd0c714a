//! Styles
//!
//! Declaration lists and stylesheets as the engine sees them, a compound
//! selector matcher with a small specificity heuristic, and the computed
//! style store the contrast checks read. This is an introspection surface,
//! not a CSS engine.

use crate::NodeId;
use crate::error::DomError;
use crate::node::ElementData;

/// One `name: value` declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub name: String,
    pub value: String,
}

impl Declaration {
    pub fn new(name: &str, value: &str) -> Self {
        Self {
            name: name.to_string(),
            value: value.to_string(),
        }
    }

    /// Custom properties start with `--`
    pub fn is_custom_property(&self) -> bool {
        self.name.starts_with("--")
    }
}

/// One selector with its declaration block
#[derive(Debug, Clone)]
pub struct StyleRule {
    pub selector: String,
    pub declarations: Vec<Declaration>,
}

impl StyleRule {
    pub fn new(selector: &str, declarations: Vec<Declaration>) -> Self {
        Self {
            selector: selector.to_string(),
            declarations,
        }
    }
}

/// Where a stylesheet is attached
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StyleOrigin {
    /// Document-level sheet
    Document,
    /// `<style>` inside the shadow root of the given host
    ShadowStyle(NodeId),
    /// Constructed sheet adopted by the shadow root of the given host
    Adopted(NodeId),
}

/// A stylesheet. Cross-origin sheets keep their rules inaccessible.
#[derive(Debug, Clone)]
pub struct Stylesheet {
    pub origin: StyleOrigin,
    cross_origin: bool,
    rules: Vec<StyleRule>,
}

impl Stylesheet {
    pub fn new(origin: StyleOrigin) -> Self {
        Self {
            origin,
            cross_origin: false,
            rules: Vec::new(),
        }
    }

    pub fn with_rules(origin: StyleOrigin, rules: Vec<StyleRule>) -> Self {
        Self {
            origin,
            cross_origin: false,
            rules,
        }
    }

    /// A sheet whose rules cannot be read
    pub fn cross_origin(origin: StyleOrigin) -> Self {
        Self {
            origin,
            cross_origin: true,
            rules: Vec::new(),
        }
    }

    pub fn push_rule(&mut self, rule: StyleRule) {
        self.rules.push(rule);
    }

    pub fn is_cross_origin(&self) -> bool {
        self.cross_origin
    }

    /// Rule access fails for cross-origin sheets
    pub fn rules(&self) -> Result<&[StyleRule], DomError> {
        if self.cross_origin {
            return Err(DomError::CrossOriginStylesheet);
        }
        Ok(&self.rules)
    }
}

/// Match a selector list against an element and return the specificity of
/// the first matching alternative. Compound selectors only: alternatives
/// with combinators or functional pseudos never match, and pseudo-classes
/// are assumed to match.
pub fn matching_specificity(selector: &str, elem: &ElementData) -> Option<u32> {
    for alt in selector.split(',') {
        let alt = alt.trim();
        if alt.is_empty()
            || alt.contains('(')
            || alt.chars().any(|c| c.is_whitespace() || matches!(c, '>' | '+' | '~'))
        {
            continue;
        }
        let Some((tag, parts)) = tokenize(alt) else {
            continue;
        };
        if compound_matches(&tag, &parts, elem) {
            return Some(compound_specificity(&tag, &parts));
        }
    }
    None
}

/// Split a compound selector into its tag and simple-selector parts
fn tokenize(compound: &str) -> Option<(String, Vec<(char, String)>)> {
    let mut tag = String::new();
    let mut parts = Vec::new();
    let mut kind: Option<char> = None;
    let mut buf = String::new();
    for c in compound.chars() {
        if matches!(c, '.' | '#' | ':') {
            match kind {
                None => tag = std::mem::take(&mut buf),
                Some(k) => {
                    if buf.is_empty() {
                        return None;
                    }
                    parts.push((k, std::mem::take(&mut buf)));
                }
            }
            kind = Some(c);
        } else {
            buf.push(c);
        }
    }
    match kind {
        None => tag = buf,
        Some(k) => {
            if buf.is_empty() {
                return None;
            }
            parts.push((k, buf));
        }
    }
    Some((tag, parts))
}

fn compound_matches(tag: &str, parts: &[(char, String)], elem: &ElementData) -> bool {
    if !tag.is_empty() && tag != "*" && tag != elem.tag_name {
        return false;
    }
    for (kind, name) in parts {
        let ok = match kind {
            '.' => elem.class_list().contains(&name.as_str()),
            '#' => elem.id_attr() == Some(name.as_str()),
            ':' => true,
            _ => false,
        };
        if !ok {
            return false;
        }
    }
    true
}

fn compound_specificity(tag: &str, parts: &[(char, String)]) -> u32 {
    let mut total = 0;
    if !tag.is_empty() && tag != "*" {
        total += 1;
    }
    for (kind, _) in parts {
        total += match kind {
            '#' => 100,
            '.' | ':' => 10,
            _ => 0,
        };
    }
    total
}

/// Computed style values the auditor reads
#[derive(Debug, Clone, PartialEq)]
pub struct ComputedStyle {
    pub color: String,
    pub background_color: String,
    pub font_size_px: f32,
    pub font_weight: u16,
    pub display: String,
    pub visibility: String,
}

impl Default for ComputedStyle {
    fn default() -> Self {
        Self {
            color: "rgb(0, 0, 0)".to_string(),
            background_color: "rgb(255, 255, 255)".to_string(),
            font_size_px: 16.0,
            font_weight: 400,
            display: "block".to_string(),
            visibility: "visible".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card() -> ElementData {
        let mut elem = ElementData::new("my-card");
        elem.set_attr("class", "fancy primary");
        elem.set_attr("id", "hero");
        elem
    }

    #[test]
    fn test_custom_property_detection() {
        assert!(Declaration::new("--accent", "red").is_custom_property());
        assert!(!Declaration::new("color", "red").is_custom_property());
    }

    #[test]
    fn test_cross_origin_rules_inaccessible() {
        let sheet = Stylesheet::cross_origin(StyleOrigin::Document);
        assert!(matches!(sheet.rules(), Err(DomError::CrossOriginStylesheet)));

        let open = Stylesheet::with_rules(
            StyleOrigin::Document,
            vec![StyleRule::new("my-card", vec![Declaration::new("--a", "1")])],
        );
        assert_eq!(open.rules().unwrap().len(), 1);
    }

    #[test]
    fn test_compound_matching() {
        let elem = card();
        assert_eq!(matching_specificity("my-card", &elem), Some(1));
        assert_eq!(matching_specificity(".fancy", &elem), Some(10));
        assert_eq!(matching_specificity("#hero", &elem), Some(100));
        assert_eq!(matching_specificity("my-card.fancy#hero", &elem), Some(111));
        assert_eq!(matching_specificity("*", &elem), Some(0));
        assert_eq!(matching_specificity("div", &elem), None);
        assert_eq!(matching_specificity(".missing", &elem), None);
    }

    #[test]
    fn test_selector_list_first_match_wins() {
        let elem = card();
        assert_eq!(matching_specificity("div, .fancy, #hero", &elem), Some(10));
    }

    #[test]
    fn test_unsupported_shapes_never_match() {
        let elem = card();
        assert_eq!(matching_specificity("my-card .inner", &elem), None);
        assert_eq!(matching_specificity("my-card > span", &elem), None);
        assert_eq!(matching_specificity(":not(.fancy)", &elem), None);
        assert_eq!(matching_specificity("my-card::part(label)", &elem), None);
    }

    #[test]
    fn test_pseudo_classes_match_permissively() {
        let elem = card();
        assert_eq!(matching_specificity("my-card:hover", &elem), Some(11));
    }
}
