//! Render tracker
//!
//! Counts re-renders per component instance by merging three signal
//! channels: mutations on the element, lifecycle update notices, and a
//! property-snapshot poll. Signals landing inside a 50 ms window are
//! counted as one render.

use std::collections::HashMap;

use serde_json::Value;
use tracing::debug;
use wclens_dom::{Document, NodeId, ObserverId, ObserverInit, RecordKind};

use crate::scanner;

const DEDUPE_WINDOW_MS: u64 = 50;
const POLL_INTERVAL_MS: u64 = 500;

#[derive(Debug)]
struct Tracked {
    tag: String,
    /// Attributes and direct child-list changes on the element itself
    self_observer: ObserverId,
    /// Subtree observer inside the shadow fragment; absent for lifecycle
    /// components, which report through update notices instead
    shadow_observer: Option<ObserverId>,
    uses_lifecycle: bool,
    count: u64,
    last_render_at: Option<u64>,
    snapshot: Vec<(String, Value)>,
    next_poll_at: u64,
}

/// Counters for the tracker panel.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrackerStats {
    pub tracked: usize,
    pub recorded: u64,
    pub deduped: u64,
}

/// Render tracker
#[derive(Debug, Default)]
pub struct RenderTracker {
    enabled: bool,
    tracked: HashMap<NodeId, Tracked>,
    page_observer: Option<ObserverId>,
    recorded: u64,
    deduped: u64,
}

impl RenderTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Starts tracking every current instance and watches the page for
    /// instances coming and going.
    pub fn enable(&mut self, doc: &mut Document) {
        if self.enabled {
            return;
        }
        self.enabled = true;
        let root = doc.html();
        self.page_observer = Some(doc.observe(
            root,
            ObserverInit {
                attributes: false,
                child_list: true,
                subtree: true,
            },
        ));
        for inst in scanner::scan(doc) {
            self.track(doc, inst.element);
        }
        debug!(tracked = self.tracked.len(), "render tracking enabled");
    }

    /// Disconnects every observer and forgets all counters.
    pub fn disable(&mut self, doc: &mut Document) {
        if !self.enabled {
            return;
        }
        if let Some(obs) = self.page_observer.take() {
            doc.disconnect_observer(obs);
        }
        let ids: Vec<NodeId> = self.tracked.keys().copied().collect();
        for el in ids {
            self.untrack(doc, el);
        }
        self.enabled = false;
        debug!("render tracking disabled");
    }

    /// Tracks one instance. Lifecycle components listen on update notices;
    /// the rest get a shadow-subtree observer and the property poll.
    pub fn track(&mut self, doc: &mut Document, el: NodeId) {
        if !self.enabled || self.tracked.contains_key(&el) || !doc.is_custom_element(el) {
            return;
        }
        let Some(tag) = doc.tag_name(el).map(str::to_string) else {
            return;
        };
        let self_observer = doc.observe(
            el,
            ObserverInit {
                attributes: true,
                child_list: true,
                subtree: false,
            },
        );
        let uses_lifecycle = doc.has_update_hook(el);
        let shadow_observer = if uses_lifecycle {
            None
        } else {
            doc.shadow_root(el).map(|fragment| {
                doc.observe(
                    fragment,
                    ObserverInit {
                        attributes: true,
                        child_list: true,
                        subtree: true,
                    },
                )
            })
        };
        let snapshot = doc.property_snapshot(el);
        let next_poll_at = doc.now_ms() + POLL_INTERVAL_MS;
        self.tracked.insert(
            el,
            Tracked {
                tag,
                self_observer,
                shadow_observer,
                uses_lifecycle,
                count: 0,
                last_render_at: None,
                snapshot,
                next_poll_at,
            },
        );
    }

    /// Stops tracking one instance and drops its counters.
    pub fn untrack(&mut self, doc: &mut Document, el: NodeId) {
        if let Some(t) = self.tracked.remove(&el) {
            doc.disconnect_observer(t.self_observer);
            if let Some(obs) = t.shadow_observer {
                doc.disconnect_observer(obs);
            }
        }
    }

    /// Re-scans for instances the page observer cannot see, such as ones
    /// added inside shadow roots.
    pub fn refresh(&mut self, doc: &mut Document) {
        if !self.enabled {
            return;
        }
        for inst in scanner::scan(doc) {
            self.track(doc, inst.element);
        }
    }

    /// One event-loop turn: handles page changes, drains every channel,
    /// and runs due property polls.
    pub fn pump(&mut self, doc: &mut Document) {
        if !self.enabled {
            return;
        }
        self.pump_page_observer(doc);
        self.pump_mutation_channels(doc);
        self.pump_lifecycle(doc);
        self.pump_polls(doc);
    }

    fn pump_page_observer(&mut self, doc: &mut Document) {
        let Some(obs) = self.page_observer else {
            return;
        };
        for record in doc.take_records(obs) {
            let RecordKind::ChildList { added, removed } = record.kind else {
                continue;
            };
            for id in added {
                self.track(doc, id);
                for below in doc.elements_below(id) {
                    self.track(doc, below);
                }
            }
            for id in removed {
                self.untrack(doc, id);
                for below in doc.elements_below(id) {
                    self.untrack(doc, below);
                }
            }
        }
    }

    fn pump_mutation_channels(&mut self, doc: &mut Document) {
        let ids: Vec<NodeId> = self.tracked.keys().copied().collect();
        for el in ids {
            let Some((self_obs, shadow_obs)) = self
                .tracked
                .get(&el)
                .map(|t| (t.self_observer, t.shadow_observer))
            else {
                continue;
            };
            for record in doc.take_records(self_obs) {
                self.record_render(el, record.at);
            }
            if let Some(obs) = shadow_obs {
                for record in doc.take_records(obs) {
                    self.record_render(el, record.at);
                }
            }
        }
    }

    fn pump_lifecycle(&mut self, doc: &mut Document) {
        for notice in doc.take_update_notices() {
            let counts = self
                .tracked
                .get(&notice.node)
                .is_some_and(|t| t.uses_lifecycle);
            if counts {
                self.record_render(notice.node, notice.at);
            }
        }
    }

    fn pump_polls(&mut self, doc: &mut Document) {
        let now = doc.now_ms();
        let due: Vec<NodeId> = self
            .tracked
            .iter()
            .filter(|(_, t)| !t.uses_lifecycle && now >= t.next_poll_at)
            .map(|(&el, _)| el)
            .collect();
        for el in due {
            let fresh = doc.property_snapshot(el);
            let changed = match self.tracked.get_mut(&el) {
                Some(t) => {
                    t.next_poll_at = now + POLL_INTERVAL_MS;
                    if t.snapshot != fresh {
                        t.snapshot = fresh;
                        true
                    } else {
                        false
                    }
                }
                None => false,
            };
            if changed {
                self.record_render(el, now);
            }
        }
    }

    fn record_render(&mut self, el: NodeId, at: u64) {
        let Some(t) = self.tracked.get_mut(&el) else {
            return;
        };
        if let Some(last) = t.last_render_at {
            if at.saturating_sub(last) < DEDUPE_WINDOW_MS {
                self.deduped += 1;
                return;
            }
        }
        t.count += 1;
        t.last_render_at = Some(at);
        self.recorded += 1;
        debug!(element = ?el, tag = %t.tag, count = t.count, "render recorded");
    }

    pub fn render_count(&self, el: NodeId) -> Option<u64> {
        self.tracked.get(&el).map(|t| t.count)
    }

    pub fn stats(&self) -> TrackerStats {
        TrackerStats {
            tracked: self.tracked.len(),
            recorded: self.recorded,
            deduped: self.deduped,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wclens_dom::{ComponentSpec, PropertySpec, ShadowMode};

    fn page_with_widget() -> (Document, NodeId) {
        let mut doc = Document::new();
        let body = doc.body();
        let widget = doc.create_element("x-widget");
        doc.append_child(body, widget);
        (doc, widget)
    }

    #[test]
    fn test_attribute_mutation_counts_one_render() {
        let (mut doc, widget) = page_with_widget();
        let mut tracker = RenderTracker::new();
        tracker.enable(&mut doc);

        doc.set_attribute(widget, "theme", "dark");
        tracker.pump(&mut doc);

        assert_eq!(tracker.render_count(widget), Some(1));
    }

    #[test]
    fn test_two_channels_inside_window_count_once() {
        let (mut doc, widget) = page_with_widget();
        let fragment = doc.attach_shadow(widget, ShadowMode::Open, false).unwrap();
        let mut tracker = RenderTracker::new();
        tracker.enable(&mut doc);

        doc.set_attribute(widget, "theme", "dark");
        let inner = doc.create_element("span");
        doc.append_child(fragment, inner);
        tracker.pump(&mut doc);
        assert_eq!(tracker.render_count(widget), Some(1));

        doc.advance(60);
        doc.set_attribute(widget, "theme", "light");
        tracker.pump(&mut doc);
        assert_eq!(tracker.render_count(widget), Some(2));
    }

    #[test]
    fn test_lifecycle_channel_replaces_shadow_channel() {
        let mut doc = Document::new();
        let body = doc.body();
        let mut spec = ComponentSpec::new("x-reactive");
        spec.has_update_hook = true;
        doc.define_component(spec).unwrap();
        let el = doc.create_element("x-reactive");
        doc.append_child(body, el);
        let fragment = doc.attach_shadow(el, ShadowMode::Open, false).unwrap();

        let mut tracker = RenderTracker::new();
        tracker.enable(&mut doc);

        doc.notify_updated(el, vec!["value".to_string()]);
        tracker.pump(&mut doc);
        assert_eq!(tracker.render_count(el), Some(1));

        // Shadow-internal churn does not count for lifecycle components.
        doc.advance(100);
        let inner = doc.create_element("span");
        doc.append_child(fragment, inner);
        tracker.pump(&mut doc);
        assert_eq!(tracker.render_count(el), Some(1));

        // Notices with nothing changed are not produced at all.
        doc.advance(100);
        doc.notify_updated(el, Vec::new());
        tracker.pump(&mut doc);
        assert_eq!(tracker.render_count(el), Some(1));
    }

    #[test]
    fn test_poll_detects_property_change() {
        let mut doc = Document::new();
        let body = doc.body();
        let mut spec = ComponentSpec::new("x-counter");
        spec.properties.push(PropertySpec::new("value", json!(0)));
        doc.define_component(spec).unwrap();
        let el = doc.create_element("x-counter");
        doc.append_child(body, el);

        let mut tracker = RenderTracker::new();
        tracker.enable(&mut doc);

        doc.set_property(el, "value", json!(5)).unwrap();
        tracker.pump(&mut doc);
        assert_eq!(tracker.render_count(el), Some(0));

        doc.advance(500);
        tracker.pump(&mut doc);
        assert_eq!(tracker.render_count(el), Some(1));

        // Unchanged values do not count on the next poll.
        doc.advance(500);
        tracker.pump(&mut doc);
        assert_eq!(tracker.render_count(el), Some(1));
    }

    #[test]
    fn test_page_observer_tracks_additions_and_removals() {
        let (mut doc, widget) = page_with_widget();
        let mut tracker = RenderTracker::new();
        tracker.enable(&mut doc);

        let late = doc.create_element("x-late");
        doc.append_child(doc.body(), late);
        tracker.pump(&mut doc);
        assert_eq!(tracker.render_count(late), Some(0));

        doc.advance(60);
        doc.set_attribute(late, "state", "ready");
        tracker.pump(&mut doc);
        assert_eq!(tracker.render_count(late), Some(1));

        doc.remove_node(widget);
        tracker.pump(&mut doc);
        assert_eq!(tracker.render_count(widget), None);
    }

    #[test]
    fn test_disable_forgets_everything() {
        let (mut doc, widget) = page_with_widget();
        let mut tracker = RenderTracker::new();
        tracker.enable(&mut doc);
        doc.set_attribute(widget, "a", "1");
        tracker.pump(&mut doc);

        tracker.disable(&mut doc);
        assert_eq!(tracker.render_count(widget), None);
        assert!(!tracker.is_enabled());

        doc.set_attribute(widget, "b", "2");
        tracker.pump(&mut doc);
        assert_eq!(tracker.render_count(widget), None);
    }
}
