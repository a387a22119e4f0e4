//! Focus chain and keyboard routing.
//!
//! Exactly one path from a root to a leaf holds focus. Every node on the path has
//! `has_focus` set and each container points at its `focused_child`. The tree keeps the
//! focused leaf in `focused` so lookups never walk the arena.

use crate::core::input::KeyEvent;
use crate::core::keybindings::NavigationAction;
use crate::runtime::control::FocusReason;
use crate::runtime::tree::{ControlEvent, ControlId, ControlTree, Notification};

impl ControlTree {
    pub fn has_focus(&self, id: ControlId) -> bool {
        self.node(id).is_some_and(|node| node.has_focus)
    }

    /// The focused leaf, if any.
    pub fn focused(&self) -> Option<ControlId> {
        self.focused
    }

    pub fn focused_child(&self, id: ControlId) -> Option<ControlId> {
        self.node(id)?.focused_child
    }

    /// Whether `id` itself accepts focus (ignoring descendants).
    pub(crate) fn accepts_focus_directly(&self, id: ControlId) -> bool {
        match self.control_ref(id) {
            Some(control) => control
                .as_focusable()
                .is_some_and(|focusable| focusable.can_receive_focus()),
            // Out of its slot: a control focusing itself from one of its own handlers.
            None => self.node(id).is_some_and(|node| node.accepts_focus),
        }
    }

    /// Visible children that can take focus, in tree order.
    pub fn focus_candidates(&self, id: ControlId) -> Vec<ControlId> {
        self.children(id)
            .iter()
            .copied()
            .filter(|child| self.subtree_accepts_focus(*child))
            .collect()
    }

    /// A control can take focus when it and its ancestors are visible and it either accepts
    /// focus itself or has a focusable descendant to delegate to.
    pub fn can_focus(&self, id: ControlId) -> bool {
        self.is_effectively_visible(id) && self.subtree_accepts_focus(id)
    }

    fn subtree_accepts_focus(&self, id: ControlId) -> bool {
        if !self.is_visible(id) {
            return false;
        }
        self.accepts_focus_directly(id)
            || self
                .children(id)
                .iter()
                .any(|child| self.subtree_accepts_focus(*child))
    }

    /// Resolves the leaf that actually receives focus when `id` is asked to take it.
    /// Containers delegate to the remembered child for programmatic/mouse focus, otherwise
    /// to the first (or, going backward, last) focusable child. A container with no
    /// focusable children keeps focus itself.
    fn delegate_target(&self, id: ControlId, reason: FocusReason) -> ControlId {
        let mut current = id;
        loop {
            let candidates = self.focus_candidates(current);
            if candidates.is_empty() {
                return current;
            }
            let remembered = self
                .node(current)
                .and_then(|node| node.last_focused_child)
                .filter(|child| candidates.contains(child));
            let next = match reason {
                FocusReason::Programmatic | FocusReason::Mouse => remembered,
                FocusReason::Tab | FocusReason::ShiftTab => None,
            };
            let next = next.or_else(|| {
                if reason.is_backward() {
                    candidates.last().copied()
                } else {
                    candidates.first().copied()
                }
            });
            match next {
                Some(child) => current = child,
                None => return current,
            }
        }
    }

    /// Focuses `id` (or the descendant it delegates to). Returns `false` when nothing under
    /// `id` can take focus. Re-focusing the current leaf is a no-op and fires no events.
    pub fn set_focus(&mut self, id: ControlId, reason: FocusReason) -> bool {
        if !self.can_focus(id) {
            return false;
        }
        let target = self.delegate_target(id, reason);
        if self.focused == Some(target) {
            return true;
        }

        if let Some(old) = self.focused {
            let new_path = self.path_to(target);
            let mut top = old;
            let mut current = Some(old);
            while let Some(node) = current {
                if new_path.contains(&node) {
                    break;
                }
                top = node;
                current = self.parent(node);
            }
            if !new_path.contains(&top) {
                self.unfocus_subtree(top);
            }
        }

        if let Some(node) = self.node_mut(target) {
            node.has_focus = true;
        }
        self.focused = Some(target);
        tracing::trace!(target: "tape_widgets::focus", id = target.raw(), ?reason, "focus");
        self.notify(
            target,
            Notification::FocusChanged {
                focused: true,
                reason,
            },
        );
        self.emit(ControlEvent::GotFocus { id: target, reason });
        self.propagate_focus_up(target, target, reason);
        true
    }

    /// Walks from `from` to the root, pointing each ancestor at the child on the focus path.
    /// Ancestors only record the change; they never re-run delegation. An ancestor joining
    /// the path gets the same `GotFocus` a leaf does, so every `LostFocus` has a partner.
    pub(crate) fn propagate_focus_up(
        &mut self,
        from: ControlId,
        leaf: ControlId,
        reason: FocusReason,
    ) {
        let mut child = from;
        while let Some(parent) = self.parent(child) {
            let Some(node) = self.node_mut(parent) else {
                break;
            };
            let joined = !node.has_focus;
            node.has_focus = true;
            node.focused_child = Some(child);
            node.last_focused_child = Some(child);
            if joined {
                self.notify(parent, Notification::FocusChanged { focused: true, reason });
                self.emit(ControlEvent::GotFocus { id: parent, reason });
            }
            self.notify(parent, Notification::ChildFocus { child, leaf });
            child = parent;
        }
    }

    /// Clears focus on `id` and everything focused beneath it, deepest first.
    fn unfocus_subtree(&mut self, id: ControlId) {
        let Some(node) = self.node(id) else {
            return;
        };
        if !node.has_focus {
            return;
        }
        if let Some(child) = node.focused_child {
            self.unfocus_subtree(child);
        }
        if let Some(node) = self.node_mut(id) {
            node.has_focus = false;
            node.focused_child = None;
        }
        if self.focused == Some(id) {
            self.focused = None;
        }
        self.notify(
            id,
            Notification::FocusChanged {
                focused: false,
                reason: FocusReason::Programmatic,
            },
        );
        self.emit(ControlEvent::LostFocus { id });
    }

    /// Removes focus from the whole tree.
    pub fn clear_focus(&mut self) {
        let Some(leaf) = self.focused else {
            return;
        };
        let root = self.root_of(leaf);
        self.unfocus_subtree(root);
        // Nodes above a detached leaf may still carry stale flags.
        if let Some(node) = self.node_mut(leaf) {
            node.has_focus = false;
        }
        self.focused = None;
    }

    /// Root-to-leaf path ending at `id`.
    fn path_to(&self, id: ControlId) -> Vec<ControlId> {
        let mut path = self.ancestors(id);
        path.reverse();
        path.push(id);
        path
    }

    /// Moves focus to the next (or previous) focusable child of `container`. Returns `false`
    /// when already at the last (first) one so the key escapes to the parent.
    pub fn focus_next_in(&mut self, container: ControlId, forward: bool) -> bool {
        let candidates = self.focus_candidates(container);
        if candidates.is_empty() {
            return false;
        }
        let current = self
            .focused_child(container)
            .and_then(|child| candidates.iter().position(|candidate| *candidate == child));
        let next = match (current, forward) {
            (Some(index), true) => candidates.get(index + 1).copied(),
            (Some(index), false) => index.checked_sub(1).and_then(|i| candidates.get(i).copied()),
            (None, true) => candidates.first().copied(),
            (None, false) => candidates.last().copied(),
        };
        let Some(next) = next else {
            return false;
        };
        let reason = if forward {
            FocusReason::Tab
        } else {
            FocusReason::ShiftTab
        };
        self.set_focus(next, reason)
    }

    /// Routes a key down the focus path starting at `id`: the focused child gets the first
    /// chance, then the control itself, then generic Tab handling for containers.
    pub fn process_key(&mut self, id: ControlId, key: &KeyEvent) -> bool {
        if !self.is_visible(id) {
            return false;
        }
        if let Some(child) = self.focused_child(id) {
            if self.process_key(child, key) {
                return true;
            }
        }
        let handled = self
            .with_control(id, |control, tree| {
                control
                    .as_interactive()
                    .is_some_and(|interactive| interactive.process_key(tree, id, key))
            })
            .unwrap_or(false);
        if handled {
            return true;
        }
        if !self.children(id).is_empty() {
            if self.keymap().matches(key, NavigationAction::FocusNext) {
                return self.focus_next_in(id, true);
            }
            if self.keymap().matches(key, NavigationAction::FocusPrevious) {
                return self.focus_next_in(id, false);
            }
        }
        false
    }
}
