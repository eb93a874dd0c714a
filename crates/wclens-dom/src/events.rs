//! Event dispatch
//!
//! Synthetic events with capture/target/bubble phases over the composed
//! path. Listeners are either taps, which record a dispatch for the
//! monitor without altering it, or scripted reactions standing in for page
//! handlers. Tap captures snapshot the event's final flag state, so a stop
//! or prevent that happens after the tap ran is still visible in the
//! record.

use serde_json::Value;

use crate::NodeId;
use crate::document::Document;

/// Construction data for a dispatched event
#[derive(Debug, Clone)]
pub struct EventInit {
    pub event_type: String,
    pub detail: Value,
    pub bubbles: bool,
    pub cancelable: bool,
    /// Whether the event crosses shadow boundaries
    pub composed: bool,
}

impl EventInit {
    pub fn new(event_type: &str) -> Self {
        Self {
            event_type: event_type.to_string(),
            detail: Value::Null,
            bubbles: true,
            cancelable: true,
            composed: true,
        }
    }
}

/// Dispatch phase of a propagation path step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventPhase {
    Capturing,
    AtTarget,
    Bubbling,
}

impl EventPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            EventPhase::Capturing => "capturing",
            EventPhase::AtTarget => "target",
            EventPhase::Bubbling => "bubbling",
        }
    }
}

/// One visit in the full propagation travel order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathStep {
    pub node: NodeId,
    pub phase: EventPhase,
}

/// Listener handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u32);

/// Tap handle, chosen by the tap's owner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TapId(pub u32);

/// What a listener does when reached
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerKind {
    /// Record the dispatch without altering it
    Tap(TapId),
    /// Page-handler stand-in
    Script(ScriptAction),
}

/// Scripted reaction of a page handler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptAction {
    Noop,
    PreventDefault,
    StopPropagation,
    StopImmediatePropagation,
}

/// Result of one dispatch
#[derive(Debug, Clone)]
pub struct DispatchSummary {
    /// Dispatch number, monotonic per document
    pub sequence: u64,
    pub event_type: String,
    pub target: NodeId,
    pub detail: Value,
    /// Full travel order independent of where propagation stopped
    pub path: Vec<PathStep>,
    pub default_prevented: bool,
    pub propagation_stopped: bool,
    pub immediate_stopped: bool,
    pub at: u64,
}

/// A dispatch recorded by a tap listener
#[derive(Debug, Clone)]
pub struct TapCapture {
    pub tap: TapId,
    /// Element the tap listener was attached to
    pub node: NodeId,
    /// Phase at which the tap was reached
    pub phase: EventPhase,
    /// Dispatch number; captures of the same dispatch share it
    pub sequence: u64,
    pub target: NodeId,
    pub event_type: String,
    pub detail: Value,
    pub bubbles: bool,
    pub cancelable: bool,
    pub composed: bool,
    pub path: Vec<PathStep>,
    pub default_prevented: bool,
    pub propagation_stopped: bool,
    pub immediate_stopped: bool,
    pub at: u64,
}

/// Per-document listener table
#[derive(Debug, Default)]
pub(crate) struct Listeners {
    next_id: u32,
    entries: Vec<ListenerEntry>,
}

#[derive(Debug, Clone)]
struct ListenerEntry {
    id: ListenerId,
    node: NodeId,
    event_type: String,
    capture: bool,
    kind: ListenerKind,
}

impl Listeners {
    fn add(&mut self, node: NodeId, event_type: &str, capture: bool, kind: ListenerKind) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.entries.push(ListenerEntry {
            id,
            node,
            event_type: event_type.to_string(),
            capture,
            kind,
        });
        id
    }

    fn remove(&mut self, id: ListenerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.id != id);
        self.entries.len() != before
    }

    /// Registration-order snapshot of listeners on a node for a type
    fn snapshot(&self, node: NodeId, event_type: &str) -> Vec<(bool, ListenerKind)> {
        self.entries
            .iter()
            .filter(|e| e.node == node && e.event_type == event_type)
            .map(|e| (e.capture, e.kind))
            .collect()
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

// Event operations on the document.
impl Document {
    /// Add a listener on a node
    pub fn add_listener(
        &mut self,
        node: NodeId,
        event_type: &str,
        capture: bool,
        kind: ListenerKind,
    ) -> ListenerId {
        self.listeners.add(node, event_type, capture, kind)
    }

    /// Remove a listener by handle
    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }

    /// Number of registered listeners
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Propagation path from target to the outermost root, the target
    /// first. Composed events continue through shadow hosts; others end at
    /// their shadow root fragment.
    pub fn composed_path(&self, target: NodeId, composed: bool) -> Vec<NodeId> {
        let mut path = vec![target];
        let mut cur = target;
        loop {
            if let Some(p) = self.node(cur).parent {
                path.push(p);
                cur = p;
                continue;
            }
            match self.node(cur).as_shadow_root() {
                Some(sr) if composed => {
                    path.push(sr.host);
                    cur = sr.host;
                }
                _ => break,
            }
        }
        path
    }

    /// Dispatch an event at a target, running listeners across the three
    /// phases. Returns the summary; every tap reached also queues a capture
    /// record with the event's final flag state.
    pub fn dispatch(&mut self, target: NodeId, init: EventInit) -> DispatchSummary {
        let path = self.composed_path(target, init.composed);
        let travel = travel_order(&path, init.bubbles);

        let mut default_prevented = false;
        let mut propagation_stopped = false;
        let mut immediate_stopped = false;
        let mut hits: Vec<(TapId, NodeId, EventPhase)> = Vec::new();

        let mut legs: Vec<(NodeId, EventPhase)> = Vec::new();
        for &node in path.iter().rev().take(path.len() - 1) {
            legs.push((node, EventPhase::Capturing));
        }
        legs.push((target, EventPhase::AtTarget));
        if init.bubbles {
            for &node in path.iter().skip(1) {
                legs.push((node, EventPhase::Bubbling));
            }
        }

        'run: for (node, phase) in legs {
            for (capture, kind) in self.listeners.snapshot(node, &init.event_type) {
                let runs = match phase {
                    EventPhase::Capturing => capture,
                    EventPhase::AtTarget => true,
                    EventPhase::Bubbling => !capture,
                };
                if !runs {
                    continue;
                }
                match kind {
                    ListenerKind::Tap(tap) => hits.push((tap, node, phase)),
                    ListenerKind::Script(action) => match action {
                        ScriptAction::Noop => {}
                        ScriptAction::PreventDefault => {
                            if init.cancelable {
                                default_prevented = true;
                            }
                        }
                        ScriptAction::StopPropagation => propagation_stopped = true,
                        ScriptAction::StopImmediatePropagation => {
                            propagation_stopped = true;
                            immediate_stopped = true;
                            break 'run;
                        }
                    },
                }
            }
            if propagation_stopped {
                break 'run;
            }
        }

        self.dispatch_seq += 1;
        let sequence = self.dispatch_seq;
        let at = self.now_ms();
        for (tap, node, phase) in hits {
            self.captures.push(TapCapture {
                tap,
                node,
                phase,
                sequence,
                target,
                event_type: init.event_type.clone(),
                detail: init.detail.clone(),
                bubbles: init.bubbles,
                cancelable: init.cancelable,
                composed: init.composed,
                path: travel.clone(),
                default_prevented,
                propagation_stopped,
                immediate_stopped,
                at,
            });
        }

        DispatchSummary {
            sequence,
            event_type: init.event_type,
            target,
            detail: init.detail,
            path: travel,
            default_prevented,
            propagation_stopped,
            immediate_stopped,
            at,
        }
    }

    /// Drain queued tap captures
    pub fn take_captures(&mut self) -> Vec<TapCapture> {
        std::mem::take(&mut self.captures)
    }
}

/// Full travel order for a path: capture chain down, target, bubble chain
/// back up when the event bubbles.
fn travel_order(path: &[NodeId], bubbles: bool) -> Vec<PathStep> {
    let target = path[0];
    let mut steps = Vec::new();
    for &node in path.iter().rev().take(path.len() - 1) {
        steps.push(PathStep {
            node,
            phase: EventPhase::Capturing,
        });
    }
    steps.push(PathStep {
        node: target,
        phase: EventPhase::AtTarget,
    });
    if bubbles {
        for &node in path.iter().skip(1) {
            steps.push(PathStep {
                node,
                phase: EventPhase::Bubbling,
            });
        }
    }
    steps
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ShadowMode;

    fn page() -> (Document, NodeId, NodeId) {
        let mut doc = Document::new();
        let outer = doc.create_element("my-outer");
        let inner = doc.create_element("my-inner");
        doc.append_child(doc.body(), outer);
        doc.append_child(outer, inner);
        (doc, outer, inner)
    }

    #[test]
    fn test_phase_order() {
        let (mut doc, outer, inner) = page();
        doc.add_listener(outer, "ping", true, ListenerKind::Tap(TapId(1)));
        doc.add_listener(inner, "ping", false, ListenerKind::Tap(TapId(2)));
        doc.add_listener(outer, "ping", false, ListenerKind::Tap(TapId(3)));

        doc.dispatch(inner, EventInit::new("ping"));
        let captures = doc.take_captures();
        let order: Vec<(u32, EventPhase)> =
            captures.iter().map(|c| (c.tap.0, c.phase)).collect();
        assert_eq!(
            order,
            vec![
                (1, EventPhase::Capturing),
                (2, EventPhase::AtTarget),
                (3, EventPhase::Bubbling),
            ]
        );
    }

    #[test]
    fn test_travel_order_records_both_legs() {
        let (mut doc, outer, inner) = page();
        let summary = doc.dispatch(inner, EventInit::new("ping"));

        let first = summary.path.first().unwrap();
        let last = summary.path.last().unwrap();
        assert_eq!(first.phase, EventPhase::Capturing);
        assert_eq!(first.node, NodeId::ROOT);
        assert_eq!(last.phase, EventPhase::Bubbling);
        assert_eq!(last.node, NodeId::ROOT);
        assert!(summary.path.iter().any(|s| s.node == inner && s.phase == EventPhase::AtTarget));
        assert!(summary.path.iter().filter(|s| s.node == outer).count() == 2);
    }

    #[test]
    fn test_non_bubbling_has_no_bubble_leg() {
        let (mut doc, outer, inner) = page();
        doc.add_listener(outer, "ping", false, ListenerKind::Tap(TapId(1)));

        let summary = doc.dispatch(
            inner,
            EventInit {
                bubbles: false,
                ..EventInit::new("ping")
            },
        );
        assert!(doc.take_captures().is_empty());
        assert!(summary.path.iter().all(|s| s.phase != EventPhase::Bubbling));
    }

    #[test]
    fn test_stop_propagation_halts_after_node() {
        let (mut doc, outer, inner) = page();
        doc.add_listener(outer, "ping", true, ListenerKind::Script(ScriptAction::StopPropagation));
        doc.add_listener(outer, "ping", true, ListenerKind::Tap(TapId(1)));
        doc.add_listener(inner, "ping", false, ListenerKind::Tap(TapId(2)));

        let summary = doc.dispatch(inner, EventInit::new("ping"));
        assert!(summary.propagation_stopped);
        assert!(!summary.immediate_stopped);

        // The same node finishes its listeners; deeper nodes are skipped.
        let captures = doc.take_captures();
        assert_eq!(captures.len(), 1);
        assert_eq!(captures[0].tap, TapId(1));
    }

    #[test]
    fn test_stop_immediate_halts_instantly() {
        let (mut doc, outer, inner) = page();
        doc.add_listener(
            outer,
            "ping",
            true,
            ListenerKind::Script(ScriptAction::StopImmediatePropagation),
        );
        doc.add_listener(outer, "ping", true, ListenerKind::Tap(TapId(1)));

        let summary = doc.dispatch(inner, EventInit::new("ping"));
        assert!(summary.immediate_stopped);
        assert!(doc.take_captures().is_empty());
    }

    #[test]
    fn test_prevent_default_respects_cancelable() {
        let (mut doc, _outer, inner) = page();
        doc.add_listener(inner, "ping", false, ListenerKind::Script(ScriptAction::PreventDefault));

        let prevented = doc.dispatch(inner, EventInit::new("ping"));
        assert!(prevented.default_prevented);

        let not_cancelable = doc.dispatch(
            inner,
            EventInit {
                cancelable: false,
                ..EventInit::new("ping")
            },
        );
        assert!(!not_cancelable.default_prevented);
    }

    #[test]
    fn test_composed_event_crosses_shadow_boundary() {
        let mut doc = Document::new();
        let host = doc.create_element("my-card");
        doc.append_child(doc.body(), host);
        let root = doc.attach_shadow(host, ShadowMode::Open, false).unwrap();
        let button = doc.create_element("button");
        doc.append_child(root, button);
        doc.add_listener(host, "click", true, ListenerKind::Tap(TapId(7)));

        doc.dispatch(button, EventInit::new("click"));
        let captures = doc.take_captures();
        assert_eq!(captures.len(), 1);
        assert_eq!(captures[0].node, host);

        // Non-composed events end at the shadow root fragment.
        doc.dispatch(button, EventInit {
            composed: false,
            ..EventInit::new("click")
        });
        assert!(doc.take_captures().is_empty());
        assert_eq!(doc.composed_path(button, false), vec![button, root]);
    }

    #[test]
    fn test_tap_capture_sees_later_stop() {
        let (mut doc, outer, inner) = page();
        // Tap runs during capture on the ancestor; the page handler stops
        // propagation later, at the target.
        doc.add_listener(outer, "ping", true, ListenerKind::Tap(TapId(1)));
        doc.add_listener(inner, "ping", false, ListenerKind::Script(ScriptAction::StopPropagation));

        doc.dispatch(inner, EventInit::new("ping"));
        let captures = doc.take_captures();
        assert_eq!(captures.len(), 1);
        assert!(captures[0].propagation_stopped);
    }

    #[test]
    fn test_detached_target_path() {
        let mut doc = Document::new();
        let lone = doc.create_element("my-lone");
        let summary = doc.dispatch(lone, EventInit::new("ping"));
        assert_eq!(summary.path.len(), 1);
        assert_eq!(summary.path[0].node, lone);
        assert_eq!(summary.path[0].phase, EventPhase::AtTarget);
    }
}
