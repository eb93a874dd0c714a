//! Heuristic accessibility audit for component instances.

use tracing::debug;
use wclens_dom::{Document, NodeId};

use crate::aria::{computed_role, KNOWN_ARIA_ATTRIBUTES};
use crate::color::{contrast_ratio, is_large_text, meets_minimum, parse_color};
use crate::error::A11yError;
use crate::tree::{
    accessible_name, composed_descendants, has_focusable_within, is_focusable,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }

    /// Points deducted from the audit score per issue of this severity.
    fn penalty(&self) -> u32 {
        match self {
            Severity::Info => 3,
            Severity::Warning => 8,
            Severity::Error => 15,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Aria,
    Keyboard,
    Focus,
    Contrast,
    Semantics,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Aria => "aria",
            Category::Keyboard => "keyboard",
            Category::Focus => "focus",
            Category::Contrast => "contrast",
            Category::Semantics => "semantics",
        }
    }
}

/// A single finding, anchored to the node that triggered it.
#[derive(Debug, Clone, PartialEq)]
pub struct Issue {
    pub severity: Severity,
    pub category: Category,
    pub node: NodeId,
    pub message: String,
    pub recommendation: String,
    /// WCAG success criterion, when the finding maps to one.
    pub wcag: Option<&'static str>,
}

impl Issue {
    fn new(
        severity: Severity,
        category: Category,
        node: NodeId,
        message: impl Into<String>,
        recommendation: impl Into<String>,
        wcag: Option<&'static str>,
    ) -> Self {
        Self {
            severity,
            category,
            node,
            message: message.into(),
            recommendation: recommendation.into(),
            wcag,
        }
    }
}

/// Outcome of auditing one component instance.
#[derive(Debug, Clone, PartialEq)]
pub struct AuditReport {
    pub target: NodeId,
    pub issues: Vec<Issue>,
    /// 100 minus 15 per error, 8 per warning and 3 per info, floored at 0.
    pub score: u8,
    pub keyboard_accessible: bool,
    pub manages_focus: bool,
    pub has_labels: bool,
}

/// Audits an element and its composed subtree, shadow content included.
pub fn audit(doc: &Document, id: NodeId) -> Result<AuditReport, A11yError> {
    if doc.tag_name(id).is_none() {
        return Err(A11yError::NotAnElement(id));
    }
    let mut scope = vec![id];
    scope.extend(composed_descendants(doc, id));

    let mut issues = Vec::new();
    check_aria(doc, &scope, &mut issues);
    check_keyboard(doc, id, &scope, &mut issues);
    check_focus(doc, id, &mut issues);
    check_contrast(doc, id, &mut issues);
    check_semantics(doc, &scope, &mut issues);

    let score = score_for(&issues);
    let keyboard_accessible = !issues
        .iter()
        .any(|i| i.category == Category::Keyboard && i.severity == Severity::Error);
    let manages_focus = match doc.shadow_root(id) {
        Some(fragment) => {
            let delegates = doc.shadow_info(id).map(|s| s.delegates_focus).unwrap_or(false);
            delegates || has_focusable_within(doc, fragment)
        }
        None => is_focusable(doc, id) || has_focusable_within(doc, id),
    };
    let has_labels = scope.iter().all(|&el| {
        let role = computed_role(doc, el);
        !role.requires_name() || !accessible_name(doc, el).is_empty()
    });

    debug!(node = ?id, issues = issues.len(), score, "accessibility audit complete");
    Ok(AuditReport {
        target: id,
        issues,
        score,
        keyboard_accessible,
        manages_focus,
        has_labels,
    })
}

fn score_for(issues: &[Issue]) -> u8 {
    let penalty: u32 = issues.iter().map(|i| i.severity.penalty()).sum();
    100u32.saturating_sub(penalty) as u8
}

fn check_aria(doc: &Document, scope: &[NodeId], issues: &mut Vec<Issue>) {
    for &el in scope {
        for attr in doc.attributes(el) {
            let Some(suffix) = attr.name.strip_prefix("aria-") else {
                continue;
            };
            if !KNOWN_ARIA_ATTRIBUTES.contains(&suffix) {
                issues.push(Issue::new(
                    Severity::Error,
                    Category::Aria,
                    el,
                    format!("unknown ARIA attribute \"{}\"", attr.name),
                    "remove it or use a documented aria-* attribute",
                    Some("4.1.2 Name, Role, Value"),
                ));
            } else if attr.value.trim().is_empty() {
                issues.push(Issue::new(
                    Severity::Warning,
                    Category::Aria,
                    el,
                    format!("\"{}\" has an empty value", attr.name),
                    "set a value or remove the attribute",
                    Some("4.1.2 Name, Role, Value"),
                ));
            }
        }

        // <img> naming is handled by the alt check, where an empty alt
        // legitimately marks a decorative image.
        let role = computed_role(doc, el);
        let is_html_img = doc.tag_name(el) == Some("img");
        if role.requires_name() && !is_html_img && accessible_name(doc, el).is_empty() {
            issues.push(Issue::new(
                Severity::Error,
                Category::Aria,
                el,
                format!("element with role \"{}\" has no accessible name", role.as_str()),
                "add aria-label, aria-labelledby or visible text content",
                Some("4.1.2 Name, Role, Value"),
            ));
        }

        if doc.attribute(el, "aria-hidden") == Some("true")
            && (is_focusable(doc, el) || has_focusable_within(doc, el))
        {
            issues.push(Issue::new(
                Severity::Error,
                Category::Aria,
                el,
                "aria-hidden element contains focusable content".to_string(),
                "remove aria-hidden or make the content unfocusable",
                Some("4.1.2 Name, Role, Value"),
            ));
        }
    }
}

fn check_keyboard(doc: &Document, id: NodeId, scope: &[NodeId], issues: &mut Vec<Issue>) {
    let role = computed_role(doc, id);
    if role.is_widget() && !is_focusable(doc, id) && !has_focusable_within(doc, id) {
        issues.push(Issue::new(
            Severity::Error,
            Category::Keyboard,
            id,
            format!("interactive \"{}\" is not keyboard reachable", role.as_str()),
            "add tabindex=\"0\" or render a native interactive element",
            Some("2.1.1 Keyboard"),
        ));
    }
    for &el in scope {
        let positive = doc
            .attribute(el, "tabindex")
            .and_then(|v| v.trim().parse::<i32>().ok())
            .map(|v| v > 0)
            .unwrap_or(false);
        if positive {
            issues.push(Issue::new(
                Severity::Warning,
                Category::Keyboard,
                el,
                "positive tabindex overrides the natural focus order".to_string(),
                "use tabindex=\"0\" and source order instead",
                Some("2.4.3 Focus Order"),
            ));
        }
    }
}

fn check_focus(doc: &Document, id: NodeId, issues: &mut Vec<Issue>) {
    let Some(fragment) = doc.shadow_root(id) else {
        return;
    };
    let delegates = doc.shadow_info(id).map(|s| s.delegates_focus).unwrap_or(false);
    let focusable_inside = has_focusable_within(doc, fragment);
    let role = computed_role(doc, id);

    // An entirely unreachable widget is already an error in the keyboard
    // check; this warning covers a focusable host with an inert shadow tree.
    if role.is_widget() && !focusable_inside && is_focusable(doc, id) {
        issues.push(Issue::new(
            Severity::Warning,
            Category::Focus,
            id,
            "shadow root of an interactive component has no focusable content".to_string(),
            "render a focusable element inside the shadow root",
            Some("2.1.1 Keyboard"),
        ));
    }
    if focusable_inside && !delegates {
        issues.push(Issue::new(
            Severity::Info,
            Category::Focus,
            id,
            "shadow root has focusable content but does not delegate focus".to_string(),
            "attach the shadow root with delegatesFocus to forward host focus",
            None,
        ));
    }
}

fn check_contrast(doc: &Document, id: NodeId, issues: &mut Vec<Issue>) {
    let style = doc.computed_style(id);
    let (Some(fg), Some(bg)) = (
        parse_color(&style.color),
        parse_color(&style.background_color),
    ) else {
        return;
    };
    let ratio = contrast_ratio(fg, bg);
    let large = is_large_text(style.font_size_px, style.font_weight);
    if !meets_minimum(ratio, large) {
        let required = if large { "3" } else { "4.5" };
        issues.push(Issue::new(
            Severity::Warning,
            Category::Contrast,
            id,
            format!("contrast ratio {ratio:.2}:1 is below the {required}:1 minimum"),
            "increase the difference between text and background colors",
            Some("1.4.3 Contrast (Minimum)"),
        ));
    }
}

fn check_semantics(doc: &Document, scope: &[NodeId], issues: &mut Vec<Issue>) {
    let mut previous_level: Option<u8> = None;
    for &el in scope {
        if let Some(tag) = doc.tag_name(el) {
            if let Some(level) = tag
                .strip_prefix('h')
                .and_then(|rest| rest.parse::<u8>().ok())
                .filter(|l| (1..=6).contains(l))
            {
                if let Some(prev) = previous_level {
                    if level > prev + 1 {
                        issues.push(Issue::new(
                            Severity::Warning,
                            Category::Semantics,
                            el,
                            format!("heading level jumps from h{prev} to h{level}"),
                            "use consecutive heading levels",
                            Some("1.3.1 Info and Relationships"),
                        ));
                    }
                }
                previous_level = Some(level);
            }
        }

        let is_img = doc.tag_name(el) == Some("img");
        let labelled = doc.attribute(el, "alt").is_some()
            || doc.attribute(el, "aria-label").is_some()
            || doc.attribute(el, "aria-labelledby").is_some();
        if is_img && !labelled {
            issues.push(Issue::new(
                Severity::Error,
                Category::Semantics,
                el,
                "image has no alt text".to_string(),
                "add an alt attribute, empty for decorative images",
                Some("1.1.1 Non-text Content"),
            ));
        }
    }
}
