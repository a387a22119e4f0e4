//! Minimal host window: owns the tree, the root control, the screen buffer and the portals,
//! and exposes the input entry points a console driver calls.

use std::time::Instant;

use crate::config::ToolkitConfig;
use crate::core::buffer::CharacterBuffer;
use crate::core::geometry::{to_i32, LayoutConstraints, LayoutRect};
use crate::core::input::{KeyEvent, MouseEvent};
use crate::core::keybindings::NavigationAction;
use crate::core::style::{Color, ColorPair};
use crate::core::theme::names;
use crate::render::frame::Frame;
use crate::runtime::control::{align_horizontal, align_vertical, Control, FocusReason};
use crate::runtime::tree::{ControlEvent, ControlId, ControlTree, InvalidationReason};

pub struct Window {
    tree: ControlTree,
    root: ControlId,
    buffer: CharacterBuffer,
}

impl Window {
    pub fn new(width: usize, height: usize, root: impl Control) -> Self {
        Self::with_config(ToolkitConfig::default(), width, height, root)
    }

    pub fn with_config(
        config: ToolkitConfig,
        width: usize,
        height: usize,
        root: impl Control,
    ) -> Self {
        let mut tree = ControlTree::new(config);
        let root = tree.create(root);
        Self {
            tree,
            root,
            buffer: CharacterBuffer::new(width, height),
        }
    }

    pub fn root(&self) -> ControlId {
        self.root
    }

    pub fn tree(&self) -> &ControlTree {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut ControlTree {
        &mut self.tree
    }

    pub fn size(&self) -> (usize, usize) {
        (self.buffer.width(), self.buffer.height())
    }

    pub fn resize(&mut self, width: usize, height: usize) {
        self.buffer.resize(width, height);
        self.tree.invalidate(self.root, InvalidationReason::Layout);
    }

    /// Buffer from the most recent [`Window::render`].
    pub fn buffer(&self) -> &CharacterBuffer {
        &self.buffer
    }

    /// Full layout pass: measure and paint the root into the whole screen, then portals.
    pub fn render(&mut self) -> Frame {
        let screen = self.buffer.bounds();
        let colors = ColorPair::new(
            self.tree.color(names::WINDOW_FG, Color::WHITE),
            self.tree.color(names::WINDOW_BG, Color::BLACK),
        );
        self.tree.begin_frame(screen);
        self.buffer.clear(colors);
        let bounds = self.root_bounds(screen);
        self.tree
            .paint(self.root, &mut self.buffer, bounds, screen, colors);
        self.tree.paint_portals(&mut self.buffer);
        Frame::from_buffer(&self.buffer)
    }

    /// The root fills the screen unless it has an explicit size, in which case its own
    /// alignment places it.
    fn root_bounds(&mut self, screen: LayoutRect) -> LayoutRect {
        let (width, height) = self.size();
        let props = self.tree.props(self.root).cloned().unwrap_or_default();
        if props.width.is_none() && props.height.is_none() {
            self.tree
                .measure(self.root, LayoutConstraints::tight(width, height));
            return screen;
        }
        let size = self
            .tree
            .measure(self.root, LayoutConstraints::loose(width, height));
        let (x, width) = match props.width {
            Some(_) => align_horizontal(props.horizontal_alignment, size.width, width),
            None => (0, width),
        };
        let (y, height) = match props.height {
            Some(_) => align_vertical(props.vertical_alignment, size.height, height),
            None => (0, height),
        };
        LayoutRect::new(screen.x + x, screen.y + y, to_i32(width), to_i32(height))
    }

    pub fn focus(&mut self, id: ControlId) -> bool {
        self.tree.set_focus(id, FocusReason::Programmatic)
    }

    pub fn focused(&self) -> Option<ControlId> {
        self.tree.focused()
    }

    /// Portals first, then the focus path. Tab that escapes the root wraps to the first
    /// (or last) focusable control.
    pub fn process_key(&mut self, key: &KeyEvent) -> bool {
        if self.tree.route_portal_key(key) {
            return true;
        }
        if self.tree.focused().is_none() && self.focus_by_key(key) {
            return true;
        }
        if self.tree.process_key(self.root, key) {
            return true;
        }
        self.focus_by_key(key)
    }

    fn focus_by_key(&mut self, key: &KeyEvent) -> bool {
        let keymap = self.tree.keymap();
        let reason = if keymap.matches(key, NavigationAction::FocusNext) {
            FocusReason::Tab
        } else if keymap.matches(key, NavigationAction::FocusPrevious) {
            FocusReason::ShiftTab
        } else {
            return false;
        };
        if self.tree.focused().is_some() {
            self.tree.clear_focus();
        }
        let root = self.root;
        if let Some(node) = self.tree.node_mut(root) {
            node.last_focused_child = None;
        }
        self.tree.set_focus(root, reason)
    }

    /// `event.position` is in screen coordinates.
    pub fn process_mouse(&mut self, event: &mut MouseEvent) -> bool {
        self.process_mouse_at(event, Instant::now())
    }

    /// Like [`Window::process_mouse`] with an explicit input timestamp.
    pub fn process_mouse_at(&mut self, event: &mut MouseEvent, now: Instant) -> bool {
        self.tree.set_input_time(now);
        if self.tree.route_portal_mouse(event) {
            return true;
        }
        let Some(origin) = self.tree.content_origin(self.root) else {
            return false;
        };
        let mut local = event.translated(origin);
        let handled = self.tree.process_mouse(self.root, &mut local);
        if local.handled {
            event.handled = true;
        }
        handled
    }

    /// Delivers due ticks; returns `true` when a repaint is needed.
    pub fn tick(&mut self, now: Instant) -> bool {
        self.tree.tick(now)
    }

    pub fn drain_events(&mut self) -> Vec<ControlEvent> {
        self.tree.drain_events()
    }

    pub fn needs_render(&self) -> bool {
        self.tree.is_dirty(self.root)
    }

    pub fn screen(&self) -> LayoutRect {
        self.buffer.bounds()
    }
}
