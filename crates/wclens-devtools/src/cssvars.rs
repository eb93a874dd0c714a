//! CSS variable resolver
//!
//! Collects the custom properties visible to an element from inline
//! style, its own shadow sheets, matching document rules, ancestor
//! inline styles, and root-level rules. The first source to define a
//! name wins; var() references resolve one level deep.

use std::collections::HashMap;

use tracing::debug;
use wclens_dom::{matching_specificity, Declaration, Document, NodeId, StyleOrigin};

/// Where a winning custom property was defined
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableSource {
    /// Inline style or a rule matching the element itself
    Element,
    /// A sheet inside the element's own shadow root
    ShadowRoot,
    /// An ancestor's inline style
    Inherited,
    /// A `:root` or `html` rule
    Root,
}

/// One resolved custom property
#[derive(Debug, Clone, PartialEq)]
pub struct CssVariableInfo {
    pub name: String,
    /// Raw declared value
    pub value: String,
    /// Value with var() references substituted one level
    pub computed_value: String,
    pub source: VariableSource,
    pub specificity: u32,
    /// Selector of the defining rule; absent for inline declarations
    pub selector: Option<String>,
    /// Ancestor the value was inherited from
    pub inherited_from: Option<NodeId>,
}

/// Everything the variables panel shows for one element
#[derive(Debug, Clone, Default)]
pub struct CssVariableReport {
    /// Winning definition per name, strongest first
    pub variables: Vec<CssVariableInfo>,
    /// Declarations seen across all sources, shadowed ones included
    pub total: usize,
}

const SPECIFICITY_INLINE: u32 = 1000;
const SPECIFICITY_SHADOW: u32 = 900;
const SPECIFICITY_INHERITED: u32 = 100;
const SPECIFICITY_ROOT: u32 = 10;

/// Resolve the custom properties in scope for `el`.
pub fn css_variables(doc: &Document, el: NodeId) -> CssVariableReport {
    let mut vars: Vec<CssVariableInfo> = Vec::new();
    let mut total = 0;

    for decl in custom_properties(doc.inline_style(el)) {
        push_unique(
            &mut vars,
            &mut total,
            CssVariableInfo {
                name: decl.name.clone(),
                value: decl.value.clone(),
                computed_value: String::new(),
                source: VariableSource::Element,
                specificity: SPECIFICITY_INLINE,
                selector: None,
                inherited_from: None,
            },
        );
    }

    for sheet in doc.stylesheets() {
        let own = matches!(
            sheet.origin,
            StyleOrigin::ShadowStyle(h) | StyleOrigin::Adopted(h) if h == el
        );
        if !own {
            continue;
        }
        // Cross-origin sheets keep their rules to themselves.
        let Ok(rules) = sheet.rules() else { continue };
        for rule in rules {
            for decl in custom_properties(&rule.declarations) {
                push_unique(
                    &mut vars,
                    &mut total,
                    CssVariableInfo {
                        name: decl.name.clone(),
                        value: decl.value.clone(),
                        computed_value: String::new(),
                        source: VariableSource::ShadowRoot,
                        specificity: SPECIFICITY_SHADOW,
                        selector: Some(rule.selector.clone()),
                        inherited_from: None,
                    },
                );
            }
        }
    }

    // Document rules matching the element, strongest selector first. Later
    // rules win specificity ties, as in the cascade.
    if let Some(elem) = doc.get(el).and_then(|n| n.as_element()) {
        let mut matched: Vec<(u32, usize, &str, &Declaration)> = Vec::new();
        let mut idx = 0;
        for sheet in doc.stylesheets() {
            if sheet.origin != StyleOrigin::Document {
                continue;
            }
            let Ok(rules) = sheet.rules() else { continue };
            for rule in rules {
                idx += 1;
                if is_root_selector(&rule.selector) {
                    continue;
                }
                let Some(spec) = matching_specificity(&rule.selector, elem) else {
                    continue;
                };
                for decl in custom_properties(&rule.declarations) {
                    matched.push((spec, idx, &rule.selector, decl));
                }
            }
        }
        matched.sort_by(|a, b| b.0.cmp(&a.0).then(b.1.cmp(&a.1)));
        for (spec, _, selector, decl) in matched {
            push_unique(
                &mut vars,
                &mut total,
                CssVariableInfo {
                    name: decl.name.clone(),
                    value: decl.value.clone(),
                    computed_value: String::new(),
                    source: VariableSource::Element,
                    specificity: spec,
                    selector: Some(selector.to_string()),
                    inherited_from: None,
                },
            );
        }
    }

    let mut step = 0u32;
    for anc in doc.composed_ancestors(el) {
        if doc.get(anc).and_then(|n| n.as_element()).is_none() {
            continue;
        }
        for decl in custom_properties(doc.inline_style(anc)) {
            push_unique(
                &mut vars,
                &mut total,
                CssVariableInfo {
                    name: decl.name.clone(),
                    value: decl.value.clone(),
                    computed_value: String::new(),
                    source: VariableSource::Inherited,
                    specificity: SPECIFICITY_INHERITED.saturating_sub(step),
                    selector: None,
                    inherited_from: Some(anc),
                },
            );
        }
        step += 1;
    }

    for sheet in doc.stylesheets() {
        if sheet.origin != StyleOrigin::Document {
            continue;
        }
        let Ok(rules) = sheet.rules() else { continue };
        for rule in rules {
            if !is_root_selector(&rule.selector) {
                continue;
            }
            for decl in custom_properties(&rule.declarations) {
                push_unique(
                    &mut vars,
                    &mut total,
                    CssVariableInfo {
                        name: decl.name.clone(),
                        value: decl.value.clone(),
                        computed_value: String::new(),
                        source: VariableSource::Root,
                        specificity: SPECIFICITY_ROOT,
                        selector: Some(rule.selector.clone()),
                        inherited_from: None,
                    },
                );
            }
        }
    }

    vars.sort_by(|a, b| b.specificity.cmp(&a.specificity));

    let lookup: HashMap<String, String> = vars
        .iter()
        .map(|v| (v.name.clone(), v.value.clone()))
        .collect();
    for var in &mut vars {
        var.computed_value = resolve_value(&var.value, &lookup);
    }

    debug!(element = ?el, winners = vars.len(), total, "css variables resolved");
    CssVariableReport {
        variables: vars,
        total,
    }
}

/// First definition of a name wins; later ones only bump the total.
fn push_unique(vars: &mut Vec<CssVariableInfo>, total: &mut usize, info: CssVariableInfo) {
    *total += 1;
    if !vars.iter().any(|v| v.name == info.name) {
        vars.push(info);
    }
}

fn custom_properties(declarations: &[Declaration]) -> impl Iterator<Item = &Declaration> {
    declarations.iter().filter(|d| d.is_custom_property())
}

/// Every alternative in the list targets the document root
fn is_root_selector(selector: &str) -> bool {
    selector
        .split(',')
        .map(str::trim)
        .all(|alt| alt == ":root" || alt == "html")
}

/// Substitute var() references against the winning set, one level deep.
/// Unresolvable references without a fallback stay as written.
fn resolve_value(raw: &str, vars: &HashMap<String, String>) -> String {
    let mut out = String::new();
    let mut rest = raw;
    while let Some(start) = rest.find("var(") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 4..];
        let Some(end) = closing_paren(after) else {
            out.push_str(&rest[start..]);
            return out;
        };
        let inner = &after[..end];
        let (name, fallback) = match inner.split_once(',') {
            Some((n, f)) => (n.trim(), Some(f.trim())),
            None => (inner.trim(), None),
        };
        match (vars.get(name), fallback) {
            (Some(v), _) => out.push_str(v),
            (None, Some(f)) => out.push_str(f),
            (None, None) => out.push_str(&rest[start..start + 4 + end + 1]),
        }
        rest = &after[end + 1..];
    }
    out.push_str(rest);
    out
}

fn closing_paren(text: &str) -> Option<usize> {
    let mut depth = 1u32;
    for (i, c) in text.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}
