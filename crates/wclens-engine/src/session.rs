//! Session
//!
//! One devtools session bound to a live document. Owns the scanner-fed
//! panels, the event monitor, the render tracker, and the property
//! editor, and drives them from the page's event loop.

use serde_json::Value;
use tracing::{debug, info};
use wclens_a11y::{audit, build_tree, A11yError, A11yTreeNode, AuditReport};
use wclens_devtools::{
    css_variables, scan, selector_path, Change, ComponentInstance, CssVariableReport,
    DevtoolsError, EventMonitor, MonitorState, MonitorStats, PropertyEditor, RenderTracker,
    TrackerStats,
};
use wclens_dom::{Document, NodeId, ObserverId, ObserverInit};

use crate::config::Config;
use crate::overlay::{self, OverlayAnchor};

/// Counters for the panel footer
#[derive(Debug, Clone, Copy)]
pub struct SessionStats {
    pub monitor: MonitorStats,
    pub tracker: TrackerStats,
    pub edits_applied: u64,
    pub edits_rejected: u64,
    pub rescans: u64,
}

/// Devtools session for one document
pub struct DevtoolsSession {
    doc: Document,
    config: Config,
    monitor: EventMonitor,
    tracker: RenderTracker,
    editor: PropertyEditor,
    /// Watches the light tree for components coming and going
    page_observer: Option<ObserverId>,
    /// Deadline for the debounced rescan; pushed on every new change
    rescan_at: Option<u64>,
    rescans: u64,
    /// Reposition requests since the last turn; any number collapses to one
    overlay_pending: bool,
    overlay_stale: bool,
    open: bool,
}

impl DevtoolsSession {
    pub fn new(doc: Document) -> Self {
        Self::with_config(doc, Config::default())
    }

    pub fn with_config(doc: Document, config: Config) -> Self {
        let start_open = config.enabled;
        let mut session = Self {
            doc,
            config,
            monitor: EventMonitor::new(),
            tracker: RenderTracker::new(),
            editor: PropertyEditor::new(),
            page_observer: None,
            rescan_at: None,
            rescans: 0,
            overlay_pending: false,
            overlay_stale: false,
            open: false,
        };
        if start_open {
            session.open();
        }
        session
    }

    /// Open the panel and start watching the page structure.
    pub fn open(&mut self) {
        if self.open {
            return;
        }
        self.open = true;
        let root = self.doc.html();
        self.page_observer = Some(self.doc.observe(
            root,
            ObserverInit {
                attributes: false,
                child_list: true,
                subtree: true,
            },
        ));
        info!("devtools session opened");
    }

    /// Close the panel. Stops the monitor and tracker and drops the
    /// structure observer; the edit history survives.
    pub fn close(&mut self) {
        if !self.open {
            return;
        }
        if self.monitor.state() != MonitorState::Idle {
            self.monitor.stop(&mut self.doc);
        }
        self.tracker.disable(&mut self.doc);
        if let Some(obs) = self.page_observer.take() {
            self.doc.disconnect_observer(obs);
        }
        self.rescan_at = None;
        self.open = false;
        info!("devtools session closed");
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn doc(&self) -> &Document {
        &self.doc
    }

    pub fn doc_mut(&mut self) -> &mut Document {
        &mut self.doc
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn set_config(&mut self, config: Config) {
        self.config = config;
    }

    /// Advance the page clock and run one devtools turn.
    pub fn tick(&mut self, ms: u64) {
        self.doc.advance(ms);
        self.pump();
    }

    /// One devtools turn: drain the monitor and tracker, then rescan once
    /// the page has stayed quiet long enough.
    pub fn pump(&mut self) {
        if !self.open {
            return;
        }
        self.monitor.pump(&mut self.doc);
        self.tracker.pump(&mut self.doc);
        if let Some(obs) = self.page_observer {
            if !self.doc.take_records(obs).is_empty() {
                self.rescan_at = Some(self.doc.now_ms() + self.config.rescan_debounce_ms);
            }
        }
        if let Some(at) = self.rescan_at {
            if self.doc.now_ms() >= at {
                self.rescan_at = None;
                self.rescans += 1;
                self.monitor.refresh(&mut self.doc);
                self.tracker.refresh(&mut self.doc);
                debug!(rescans = self.rescans, "page settled, panels rescanned");
            }
        }
        if self.overlay_pending {
            self.overlay_pending = false;
            self.overlay_stale = true;
        }
    }

    // === Scanner ===

    /// Scan the page. Instances carry render counts while tracking runs,
    /// and their resolved CSS variables.
    pub fn scan(&self) -> Vec<ComponentInstance> {
        let mut instances = scan(&self.doc);
        for inst in &mut instances {
            if self.tracker.is_enabled() {
                inst.render_count = self.tracker.render_count(inst.element);
            }
            inst.css_variables = Some(css_variables(&self.doc, inst.element).variables);
        }
        instances
    }

    /// Unique selector path for display
    pub fn selector_path(&self, el: NodeId) -> String {
        selector_path(&self.doc, el)
    }

    pub fn overlay_anchors(&self) -> Vec<OverlayAnchor> {
        overlay::anchors(&self.doc, &self.scan())
    }

    /// Ask for overlay repositioning after a scroll or resize. Requests
    /// queue until the next turn, then surface once through `take_update`.
    pub fn invalidate_overlays(&mut self) {
        self.overlay_pending = true;
    }

    // === Event monitor ===

    pub fn toggle_monitor(&mut self) -> MonitorState {
        self.monitor.toggle(&mut self.doc)
    }

    pub fn replay_event(&mut self, at: u64) -> bool {
        self.monitor.replay(&mut self.doc, at)
    }

    pub fn monitor(&self) -> &EventMonitor {
        &self.monitor
    }

    /// Breakpoints, filters, and resume live on the monitor itself.
    pub fn monitor_mut(&mut self) -> &mut EventMonitor {
        &mut self.monitor
    }

    // === Render tracker ===

    pub fn enable_tracking(&mut self) {
        self.tracker.enable(&mut self.doc);
    }

    pub fn disable_tracking(&mut self) {
        self.tracker.disable(&mut self.doc);
    }

    pub fn render_count(&self, el: NodeId) -> Option<u64> {
        self.tracker.render_count(el)
    }

    pub fn tracker(&self) -> &RenderTracker {
        &self.tracker
    }

    // === Property editor ===

    pub fn set_attribute(&mut self, el: NodeId, name: &str, value: Option<&str>) -> Change {
        self.editor.set_attribute(&mut self.doc, el, name, value)
    }

    pub fn set_property(
        &mut self,
        el: NodeId,
        name: &str,
        value: Value,
    ) -> Result<Change, DevtoolsError> {
        self.editor.set_property(&mut self.doc, el, name, value)
    }

    pub fn undo(&mut self) -> Option<Change> {
        self.editor.undo(&mut self.doc)
    }

    pub fn redo(&mut self) -> Option<Change> {
        self.editor.redo(&mut self.doc)
    }

    pub fn editor(&self) -> &PropertyEditor {
        &self.editor
    }

    // === Accessibility ===

    pub fn audit(&self, el: NodeId) -> Result<AuditReport, A11yError> {
        audit(&self.doc, el)
    }

    pub fn accessibility_tree(&self, el: NodeId) -> Result<A11yTreeNode, A11yError> {
        build_tree(&self.doc, el)
    }

    // === CSS variables ===

    pub fn css_variables(&self, el: NodeId) -> CssVariableReport {
        css_variables(&self.doc, el)
    }

    // === Housekeeping ===

    /// Whether panel data went stale since the last call
    pub fn take_update(&mut self) -> bool {
        let monitor = self.monitor.take_update();
        let editor = self.editor.take_update();
        let overlays = std::mem::take(&mut self.overlay_stale);
        monitor || editor || overlays
    }

    pub fn stats(&self) -> SessionStats {
        SessionStats {
            monitor: self.monitor.stats(),
            tracker: self.tracker.stats(),
            edits_applied: self.editor.edits_applied(),
            edits_rejected: self.editor.edits_rejected(),
            rescans: self.rescans,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn page() -> Document {
        let mut doc = Document::new();
        let app = doc.create_element("x-app");
        doc.append_child(doc.body(), app);
        doc
    }

    #[test]
    fn test_open_close_lifecycle() {
        let mut session = DevtoolsSession::new(page());
        assert!(session.is_open());

        session.enable_tracking();
        session.toggle_monitor();
        assert_eq!(session.monitor().state(), MonitorState::Monitoring);

        session.close();
        assert!(!session.is_open());
        assert_eq!(session.monitor().state(), MonitorState::Idle);
        assert!(!session.tracker().is_enabled());
        assert_eq!(session.doc().listener_count(), 0);
    }

    #[test]
    fn test_closed_config_starts_shut() {
        let config = Config {
            enabled: false,
            ..Config::default()
        };
        let session = DevtoolsSession::with_config(page(), config);
        assert!(!session.is_open());
    }

    #[test]
    fn test_rescan_waits_for_quiet() {
        let mut session = DevtoolsSession::new(page());

        let late = session.doc_mut().create_element("x-late");
        let body = session.doc().body();
        session.doc_mut().append_child(body, late);
        session.tick(0);
        assert_eq!(session.stats().rescans, 0);

        // More churn inside the window pushes the deadline out.
        session.tick(200);
        let later = session.doc_mut().create_element("x-later");
        session.doc_mut().append_child(body, later);
        session.tick(0);
        session.tick(250);
        assert_eq!(session.stats().rescans, 0);

        session.tick(100);
        assert_eq!(session.stats().rescans, 1);
    }

    #[test]
    fn test_rescan_attaches_monitor_to_new_components() {
        let mut session = DevtoolsSession::new(page());
        session.toggle_monitor();
        let before = session.doc().listener_count();

        let late = session.doc_mut().create_element("x-late");
        let body = session.doc().body();
        session.doc_mut().append_child(body, late);
        session.tick(0);
        session.tick(300);

        assert!(session.doc().listener_count() > before);
    }

    #[test]
    fn test_scan_carries_render_counts_and_variables() {
        let mut session = DevtoolsSession::new(page());
        session.enable_tracking();

        let app = session.scan()[0].element;
        session.doc_mut().set_attribute(app, "theme", "dark");
        session.tick(0);

        let instances = session.scan();
        assert_eq!(instances[0].render_count, Some(1));
        assert!(instances[0].css_variables.is_some());
    }

    #[test]
    fn test_editor_round_trip_through_session() {
        let mut session = DevtoolsSession::new(page());
        let app = session.scan()[0].element;

        session.set_attribute(app, "mode", Some("compact"));
        assert_eq!(session.doc().attribute(app, "mode"), Some("compact"));
        session.undo();
        assert_eq!(session.doc().attribute(app, "mode"), None);
        session.redo();
        assert_eq!(session.doc().attribute(app, "mode"), Some("compact"));
        assert_eq!(session.stats().edits_applied, 1);
    }

    #[test]
    fn test_take_update_covers_edits() {
        let mut session = DevtoolsSession::new(page());
        let app = session.scan()[0].element;
        assert!(!session.take_update());

        session.set_property(app, "open", json!(true)).unwrap();
        assert!(session.take_update());
        assert!(!session.take_update());
    }

    #[test]
    fn test_overlay_invalidations_collapse_to_one_update() {
        let mut session = DevtoolsSession::new(page());

        session.invalidate_overlays();
        session.invalidate_overlays();
        assert!(!session.take_update());

        session.tick(16);
        assert!(session.take_update());
        assert!(!session.take_update());
    }
}
