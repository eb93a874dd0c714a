//! Event monitor
//!
//! Captures component events through capturing tap listeners, keeps a
//! bounded newest-first log, and supports filters, breakpoints and replay.

use std::collections::{HashSet, VecDeque};

use serde_json::Value;
use tracing::{debug, warn};
use wclens_dom::{
    Document, EventInit, ListenerId, ListenerKind, NodeId, PathStep, TapCapture, TapId,
};

use crate::scanner;

/// Event names attached for every instance, on top of the names inferred
/// from `on`-prefixed handler properties.
pub const COMMON_EVENTS: &[&str] = &[
    "change", "input", "click", "submit", "close", "open", "load", "error",
];

/// Maximum retained log entries.
pub const LOG_CAPACITY: usize = 100;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MonitorState {
    #[default]
    Idle,
    Monitoring,
    Paused,
}

/// One captured event.
#[derive(Debug, Clone)]
pub struct EventLogEntry {
    pub at: u64,
    /// Dispatch number from the document
    pub sequence: u64,
    pub event_type: String,
    pub source_tag: String,
    pub source: NodeId,
    pub detail: Value,
    pub path: Vec<PathStep>,
    pub default_prevented: bool,
    pub propagation_stopped: bool,
    pub immediate_stopped: bool,
    pub bubbles: bool,
    pub cancelable: bool,
    pub composed: bool,
    /// False for entries produced by `replay`
    pub trusted: bool,
}

/// A tag-scoped or page-wide event breakpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorBreakpoint {
    pub id: u64,
    pub event_type: String,
    /// Restricts the breakpoint to one component tag when set
    pub tag: Option<String>,
    pub enabled: bool,
}

/// The entry and breakpoint that paused the monitor.
#[derive(Debug, Clone)]
pub struct BreakState {
    pub entry: EventLogEntry,
    pub breakpoint: MonitorBreakpoint,
}

/// Conjunction of log filters; empty members match everything.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    pub event_types: Vec<String>,
    pub component_tags: Vec<String>,
    pub only_prevented: bool,
    pub only_stopped: bool,
    pub search: String,
}

impl EventFilter {
    pub fn matches(&self, entry: &EventLogEntry) -> bool {
        if !self.event_types.is_empty() && !self.event_types.contains(&entry.event_type) {
            return false;
        }
        if !self.component_tags.is_empty() && !self.component_tags.contains(&entry.source_tag) {
            return false;
        }
        if self.only_prevented && !entry.default_prevented {
            return false;
        }
        if self.only_stopped && !(entry.propagation_stopped || entry.immediate_stopped) {
            return false;
        }
        if !self.search.is_empty() {
            let needle = self.search.to_ascii_lowercase();
            let haystack = format!(
                "{} {} {}",
                entry.event_type, entry.source_tag, entry.detail
            )
            .to_ascii_lowercase();
            if !haystack.contains(&needle) {
                return false;
            }
        }
        true
    }
}

/// Counters for the monitor panel.
#[derive(Debug, Clone, Copy, Default)]
pub struct MonitorStats {
    pub captured: u64,
    pub evicted: u64,
    pub active_listeners: usize,
}

/// Event monitor
#[derive(Debug, Default)]
pub struct EventMonitor {
    state: MonitorState,
    logs: VecDeque<EventLogEntry>,
    pending: VecDeque<TapCapture>,
    filter: EventFilter,
    breakpoints: Vec<MonitorBreakpoint>,
    next_breakpoint: u64,
    break_state: Option<BreakState>,
    listeners: Vec<(NodeId, ListenerId)>,
    tapped: HashSet<(NodeId, String)>,
    next_tap: u32,
    captured: u64,
    evicted: u64,
    log_visible: bool,
    update_pending: bool,
}

impl EventMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> MonitorState {
        self.state
    }

    /// Switches between idle and monitoring. Pausing counts as monitoring
    /// for the purposes of the toggle.
    pub fn toggle(&mut self, doc: &mut Document) -> MonitorState {
        match self.state {
            MonitorState::Idle => self.start(doc),
            MonitorState::Monitoring | MonitorState::Paused => self.stop(doc),
        }
        self.state
    }

    /// Scans the page and attaches one capturing tap per instance and
    /// event name. Already-tapped pairs are left alone.
    pub fn start(&mut self, doc: &mut Document) {
        if self.state != MonitorState::Idle {
            return;
        }
        self.attach_all(doc);
        self.state = MonitorState::Monitoring;
        debug!(listeners = self.listeners.len(), "event monitoring started");
    }

    /// Removes every owned listener and returns to idle. The log survives.
    pub fn stop(&mut self, doc: &mut Document) {
        for (_, id) in self.listeners.drain(..) {
            doc.remove_listener(id);
        }
        self.tapped.clear();
        self.pending.clear();
        self.break_state = None;
        self.state = MonitorState::Idle;
        debug!("event monitoring stopped");
    }

    /// Attaches listeners for instances that appeared since the last scan.
    pub fn refresh(&mut self, doc: &mut Document) {
        if self.state != MonitorState::Idle {
            self.attach_all(doc);
        }
    }

    fn attach_all(&mut self, doc: &mut Document) {
        for inst in scanner::scan(doc) {
            self.attach_instance(doc, inst.element, &inst.tag_name);
        }
    }

    fn attach_instance(&mut self, doc: &mut Document, el: NodeId, tag: &str) {
        let mut names = doc.registry().inferred_event_names(tag);
        for common in COMMON_EVENTS {
            if !names.iter().any(|n| n == common) {
                names.push((*common).to_string());
            }
        }
        for name in names {
            if !self.tapped.insert((el, name.clone())) {
                continue;
            }
            let tap = TapId(self.next_tap);
            self.next_tap += 1;
            let id = doc.add_listener(el, &name, true, ListenerKind::Tap(tap));
            self.listeners.push((el, id));
        }
    }

    /// One event-loop turn: moves queued captures into the log, pausing at
    /// the first breakpoint hit. While paused the backlog stays queued.
    pub fn pump(&mut self, doc: &mut Document) {
        if self.state == MonitorState::Idle {
            return;
        }
        self.pending.extend(doc.take_captures());
        if self.state == MonitorState::Paused {
            return;
        }
        self.process_pending(doc, true);
    }

    fn process_pending(&mut self, doc: &Document, trusted: bool) {
        while self.state == MonitorState::Monitoring {
            let Some(cap) = self.pending.pop_front() else {
                break;
            };
            if self.is_duplicate(&cap) {
                continue;
            }
            let entry = self.entry_from(doc, cap, trusted);
            let hit = self.matching_breakpoint(&entry);
            self.push_entry(entry.clone());
            if let Some(breakpoint) = hit {
                debug!(
                    event_type = %entry.event_type,
                    breakpoint = breakpoint.id,
                    "event breakpoint hit"
                );
                self.break_state = Some(BreakState { entry, breakpoint });
                self.state = MonitorState::Paused;
            }
        }
    }

    /// Taps on several instances see the same dispatch; only the first
    /// capture of a dispatch becomes a log entry.
    fn is_duplicate(&self, cap: &TapCapture) -> bool {
        self.logs
            .front()
            .is_some_and(|front| front.sequence == cap.sequence)
    }

    fn entry_from(&self, doc: &Document, cap: TapCapture, trusted: bool) -> EventLogEntry {
        EventLogEntry {
            at: cap.at,
            sequence: cap.sequence,
            event_type: cap.event_type,
            source_tag: doc.tag_name(cap.target).unwrap_or_default().to_string(),
            source: cap.target,
            detail: cap.detail,
            path: cap.path,
            default_prevented: cap.default_prevented,
            propagation_stopped: cap.propagation_stopped,
            immediate_stopped: cap.immediate_stopped,
            bubbles: cap.bubbles,
            cancelable: cap.cancelable,
            composed: cap.composed,
            trusted,
        }
    }

    fn push_entry(&mut self, entry: EventLogEntry) {
        self.logs.push_front(entry);
        self.captured += 1;
        while self.logs.len() > LOG_CAPACITY {
            self.logs.pop_back();
            self.evicted += 1;
        }
        if self.log_visible {
            self.update_pending = true;
        }
    }

    fn matching_breakpoint(&self, entry: &EventLogEntry) -> Option<MonitorBreakpoint> {
        let tag_specific = self.breakpoints.iter().find(|bp| {
            bp.enabled
                && bp.event_type == entry.event_type
                && bp.tag.as_deref() == Some(entry.source_tag.as_str())
        });
        tag_specific
            .or_else(|| {
                self.breakpoints
                    .iter()
                    .find(|bp| bp.enabled && bp.event_type == entry.event_type && bp.tag.is_none())
            })
            .cloned()
    }

    /// Leaves the paused state; queued captures drain on the next pump.
    pub fn resume(&mut self) {
        if self.state == MonitorState::Paused {
            self.break_state = None;
            self.state = MonitorState::Monitoring;
        }
    }

    pub fn break_state(&self) -> Option<&BreakState> {
        self.break_state.as_ref()
    }

    /// Add breakpoint for an event type, optionally scoped to one tag
    pub fn add_breakpoint(&mut self, event_type: &str, tag: Option<&str>) -> u64 {
        let id = self.next_breakpoint;
        self.next_breakpoint += 1;
        self.breakpoints.push(MonitorBreakpoint {
            id,
            event_type: event_type.to_string(),
            tag: tag.map(str::to_string),
            enabled: true,
        });
        id
    }

    pub fn remove_breakpoint(&mut self, id: u64) -> bool {
        let before = self.breakpoints.len();
        self.breakpoints.retain(|bp| bp.id != id);
        self.breakpoints.len() != before
    }

    pub fn set_breakpoint_enabled(&mut self, id: u64, enabled: bool) {
        if let Some(bp) = self.breakpoints.iter_mut().find(|bp| bp.id == id) {
            bp.enabled = enabled;
        }
    }

    pub fn breakpoints(&self) -> &[MonitorBreakpoint] {
        &self.breakpoints
    }

    /// Re-dispatches a logged event against its original source. Returns
    /// false when the entry is gone, the source is disconnected, or the
    /// monitor is paused.
    pub fn replay(&mut self, doc: &mut Document, at: u64) -> bool {
        if self.state == MonitorState::Paused {
            warn!("replay ignored while paused at a breakpoint");
            return false;
        }
        let Some(entry) = self.logs.iter().find(|e| e.at == at && e.trusted).cloned() else {
            warn!(at, "replay target is not in the retained log");
            return false;
        };
        if !doc.is_connected(entry.source) {
            warn!(source = ?entry.source, "replay source left the document");
            return false;
        }
        if self.state == MonitorState::Monitoring {
            self.pending.extend(doc.take_captures());
            self.process_pending(doc, true);
            if self.state == MonitorState::Paused {
                warn!("breakpoint hit while flushing before replay");
                return false;
            }
        }
        let mut init = EventInit::new(&entry.event_type);
        init.detail = entry.detail.clone();
        init.bubbles = entry.bubbles;
        init.cancelable = entry.cancelable;
        init.composed = entry.composed;
        doc.dispatch(entry.source, init);
        if self.state == MonitorState::Monitoring {
            self.pending.extend(doc.take_captures());
            self.process_pending(doc, false);
        }
        debug!(event_type = %entry.event_type, "event replayed");
        true
    }

    /// Newest-first log
    pub fn logs(&self) -> &VecDeque<EventLogEntry> {
        &self.logs
    }

    pub fn filtered_logs(&self) -> Vec<&EventLogEntry> {
        self.logs.iter().filter(|e| self.filter.matches(e)).collect()
    }

    pub fn clear_logs(&mut self) {
        self.logs.clear();
    }

    pub fn set_filter(&mut self, filter: EventFilter) {
        self.filter = filter;
    }

    pub fn filter(&self) -> &EventFilter {
        &self.filter
    }

    /// Marks the log view visible; log writes latch an update while it is
    pub fn set_log_visible(&mut self, visible: bool) {
        self.log_visible = visible;
    }

    /// Clears and returns the latched update flag
    pub fn take_update(&mut self) -> bool {
        std::mem::take(&mut self.update_pending)
    }

    pub fn stats(&self) -> MonitorStats {
        MonitorStats {
            captured: self.captured,
            evicted: self.evicted,
            active_listeners: self.listeners.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn page() -> (Document, NodeId, NodeId) {
        let mut doc = Document::new();
        let body = doc.body();
        let dialog = doc.create_element("x-dialog");
        doc.append_child(body, dialog);
        let button = doc.create_element("x-button");
        doc.append_child(dialog, button);
        (doc, dialog, button)
    }

    #[test]
    fn test_toggle_attaches_and_removes_listeners() {
        let (mut doc, _, _) = page();
        let mut monitor = EventMonitor::new();

        assert_eq!(monitor.toggle(&mut doc), MonitorState::Monitoring);
        assert_eq!(doc.listener_count(), 2 * COMMON_EVENTS.len());

        assert_eq!(monitor.toggle(&mut doc), MonitorState::Idle);
        assert_eq!(doc.listener_count(), 0);
    }

    #[test]
    fn test_start_twice_does_not_double_listen() {
        let (mut doc, _, _) = page();
        let mut monitor = EventMonitor::new();
        monitor.start(&mut doc);
        let count = doc.listener_count();
        monitor.refresh(&mut doc);
        assert_eq!(doc.listener_count(), count);
    }

    #[test]
    fn test_capture_goes_to_front_of_log() {
        let (mut doc, dialog, _) = page();
        let mut monitor = EventMonitor::new();
        monitor.start(&mut doc);

        doc.dispatch(dialog, EventInit::new("open"));
        doc.advance(1);
        doc.dispatch(dialog, EventInit::new("close"));
        monitor.pump(&mut doc);

        let logs = monitor.logs();
        assert_eq!(logs.len(), 2);
        assert_eq!(logs[0].event_type, "close");
        assert_eq!(logs[1].event_type, "open");
        assert!(logs[0].trusted);
    }

    #[test]
    fn test_log_capped_at_one_hundred() {
        let (mut doc, dialog, _) = page();
        let mut monitor = EventMonitor::new();
        monitor.start(&mut doc);

        for _ in 0..105 {
            doc.dispatch(dialog, EventInit::new("click"));
            doc.advance(1);
        }
        monitor.pump(&mut doc);

        assert_eq!(monitor.logs().len(), LOG_CAPACITY);
        let stats = monitor.stats();
        assert_eq!(stats.captured, 105);
        assert_eq!(stats.evicted, 5);
        assert_eq!(monitor.logs()[0].at, 104);
    }

    #[test]
    fn test_one_dispatch_one_entry_across_nested_taps() {
        let (mut doc, _, button) = page();
        let mut monitor = EventMonitor::new();
        monitor.start(&mut doc);

        // The capturing taps on both instances see this single dispatch.
        doc.dispatch(button, EventInit::new("click"));
        monitor.pump(&mut doc);

        assert_eq!(monitor.logs().len(), 1);
        assert_eq!(monitor.logs()[0].source, button);
    }

    #[test]
    fn test_repeat_dispatch_within_one_tick_logs_both() {
        let (mut doc, dialog, _) = page();
        let mut monitor = EventMonitor::new();
        monitor.start(&mut doc);

        // Same type, same target, same millisecond: two dispatches, two entries.
        doc.dispatch(dialog, EventInit::new("click"));
        doc.dispatch(dialog, EventInit::new("click"));
        monitor.pump(&mut doc);

        let logs = monitor.logs();
        assert_eq!(logs.len(), 2);
        assert_eq!(logs[0].at, logs[1].at);
        assert_ne!(logs[0].sequence, logs[1].sequence);
    }

    #[test]
    fn test_breakpoint_pauses_and_resume_drains() {
        let (mut doc, dialog, _) = page();
        let mut monitor = EventMonitor::new();
        monitor.start(&mut doc);
        monitor.add_breakpoint("open", Some("x-dialog"));

        doc.dispatch(dialog, EventInit::new("open"));
        doc.advance(1);
        doc.dispatch(dialog, EventInit::new("click"));
        monitor.pump(&mut doc);

        assert_eq!(monitor.state(), MonitorState::Paused);
        let brk = monitor.break_state().unwrap();
        assert_eq!(brk.entry.event_type, "open");
        assert_eq!(monitor.logs().len(), 1);

        monitor.pump(&mut doc);
        assert_eq!(monitor.logs().len(), 1);

        monitor.resume();
        monitor.pump(&mut doc);
        assert_eq!(monitor.state(), MonitorState::Monitoring);
        assert_eq!(monitor.logs().len(), 2);
        assert_eq!(monitor.logs()[0].event_type, "click");
    }

    #[test]
    fn test_filter_conjunction() {
        let (mut doc, dialog, button) = page();
        let mut monitor = EventMonitor::new();
        monitor.start(&mut doc);

        doc.dispatch(dialog, EventInit::new("open"));
        doc.advance(1);
        doc.dispatch(button, EventInit::new("click"));
        monitor.pump(&mut doc);

        monitor.set_filter(EventFilter {
            event_types: vec!["click".to_string()],
            ..EventFilter::default()
        });
        let filtered = monitor.filtered_logs();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].event_type, "click");

        monitor.set_filter(EventFilter {
            event_types: vec!["click".to_string()],
            component_tags: vec!["x-dialog".to_string()],
            ..EventFilter::default()
        });
        assert!(monitor.filtered_logs().is_empty());
    }

    #[test]
    fn test_search_spans_detail() {
        let (mut doc, dialog, _) = page();
        let mut monitor = EventMonitor::new();
        monitor.start(&mut doc);

        let mut init = EventInit::new("change");
        init.detail = json!({"value": "espresso"});
        doc.dispatch(dialog, init);
        monitor.pump(&mut doc);

        monitor.set_filter(EventFilter {
            search: "ESPRESSO".to_string(),
            ..EventFilter::default()
        });
        assert_eq!(monitor.filtered_logs().len(), 1);
    }

    #[test]
    fn test_replay_reinjects_untrusted_copy() {
        let (mut doc, dialog, _) = page();
        let mut monitor = EventMonitor::new();
        monitor.start(&mut doc);

        let mut init = EventInit::new("change");
        init.detail = json!({"value": 7});
        doc.dispatch(dialog, init);
        monitor.pump(&mut doc);
        let at = monitor.logs()[0].at;

        assert!(monitor.replay(&mut doc, at));
        let logs = monitor.logs();
        assert_eq!(logs.len(), 2);
        assert!(!logs[0].trusted);
        assert_eq!(logs[0].event_type, "change");
        assert_eq!(logs[0].detail, json!({"value": 7}));

        assert!(!monitor.replay(&mut doc, 9_999));
    }
}
