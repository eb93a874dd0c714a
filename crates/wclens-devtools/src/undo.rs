//! Undo history
//!
//! Bounded two-stack history for property-editor changes. Recording a
//! fresh change invalidates everything that was undone.

use std::collections::VecDeque;

use crate::editor::Change;

/// Oldest changes fall off once the stack is full.
pub const UNDO_CAPACITY: usize = 50;

/// Undo history
#[derive(Debug, Default)]
pub struct UndoManager {
    undo: VecDeque<Change>,
    redo: Vec<Change>,
}

impl UndoManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a fresh change. Clears the redo stack.
    pub fn record(&mut self, change: Change) {
        self.undo.push_back(change);
        while self.undo.len() > UNDO_CAPACITY {
            self.undo.pop_front();
        }
        self.redo.clear();
    }

    /// Move the most recent change onto the redo stack and return it.
    pub fn pop_undo(&mut self) -> Option<Change> {
        let change = self.undo.pop_back()?;
        self.redo.push(change.clone());
        Some(change)
    }

    /// Move the most recently undone change back and return it.
    pub fn pop_redo(&mut self) -> Option<Change> {
        let change = self.redo.pop()?;
        self.undo.push_back(change.clone());
        Some(change)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    /// Number of changes available to undo
    pub fn len(&self) -> usize {
        self.undo.len()
    }

    pub fn is_empty(&self) -> bool {
        self.undo.is_empty()
    }

    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::ChangeKind;
    use serde_json::json;
    use wclens_dom::NodeId;

    fn change(name: &str) -> Change {
        Change {
            element: NodeId::ROOT,
            kind: ChangeKind::Attribute,
            name: name.to_string(),
            old: None,
            new: Some(json!("x")),
            at: 0,
        }
    }

    #[test]
    fn test_undo_redo_transfer() {
        let mut history = UndoManager::new();
        history.record(change("a"));
        history.record(change("b"));

        let undone = history.pop_undo().unwrap();
        assert_eq!(undone.name, "b");
        assert!(history.can_redo());

        let redone = history.pop_redo().unwrap();
        assert_eq!(redone.name, "b");
        assert_eq!(history.len(), 2);
        assert!(!history.can_redo());
    }

    #[test]
    fn test_capacity_drops_oldest() {
        let mut history = UndoManager::new();
        for i in 0..UNDO_CAPACITY + 3 {
            history.record(change(&format!("c{i}")));
        }
        assert_eq!(history.len(), UNDO_CAPACITY);

        // Everything still present undoes in reverse order down to c3.
        let mut last = String::new();
        while let Some(c) = history.pop_undo() {
            last = c.name;
        }
        assert_eq!(last, "c3");
    }

    #[test]
    fn test_record_clears_redo() {
        let mut history = UndoManager::new();
        history.record(change("a"));
        history.record(change("b"));
        history.pop_undo();
        assert!(history.can_redo());

        history.record(change("c"));
        assert!(!history.can_redo());
        assert_eq!(history.len(), 2);
    }
}
