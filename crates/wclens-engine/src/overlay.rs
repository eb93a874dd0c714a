//! Overlay anchors
//!
//! Screen positions for the badges drawn over component instances,
//! derived from recorded bounding rects and the viewport scroll.

use wclens_a11y::AuditReport;
use wclens_devtools::ComponentInstance;
use wclens_dom::{Document, DomRect, NodeId};

/// What a badge shows
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Badge {
    /// Component tag name
    Tag(String),
    /// Render count from the tracker
    RenderCount(u64),
    /// Open accessibility issues
    IssueCount(usize),
}

/// One positioned overlay badge
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayAnchor {
    pub element: NodeId,
    pub label: String,
    /// Viewport-relative rect
    pub rect: DomRect,
    pub badge: Badge,
    /// False for elements scrolled away or without recorded geometry
    pub on_screen: bool,
}

/// Anchors for scanned instances. Instances carrying a render count get a
/// count badge, the rest show their tag.
pub fn anchors(doc: &Document, instances: &[ComponentInstance]) -> Vec<OverlayAnchor> {
    instances
        .iter()
        .map(|inst| {
            let badge = match inst.render_count {
                Some(n) => Badge::RenderCount(n),
                None => Badge::Tag(inst.tag_name.clone()),
            };
            position(doc, inst.element, inst.tag_name.clone(), badge)
        })
        .collect()
}

/// Issue-count anchors for audited elements. Clean reports draw nothing.
pub fn issue_anchors(doc: &Document, reports: &[AuditReport]) -> Vec<OverlayAnchor> {
    reports
        .iter()
        .filter(|r| !r.issues.is_empty())
        .map(|r| {
            let label = doc.tag_name(r.target).unwrap_or("#node").to_string();
            position(doc, r.target, label, Badge::IssueCount(r.issues.len()))
        })
        .collect()
}

fn position(doc: &Document, el: NodeId, label: String, badge: Badge) -> OverlayAnchor {
    let view = doc.viewport;
    let screen = DomRect::from_xywh(0.0, 0.0, view.width, view.height);
    let page = doc.bounding_rect(el);
    let rect = DomRect::from_xywh(
        page.x - view.scroll_x,
        page.y - view.scroll_y,
        page.width,
        page.height,
    );
    let has_area = page.width > 0.0 || page.height > 0.0;
    OverlayAnchor {
        element: el,
        label,
        on_screen: has_area && rect.intersects(&screen),
        rect,
        badge,
    }
}
