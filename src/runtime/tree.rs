//! Control arena.
//!
//! The tree owns every control. Parent/child links are ids: the parent owns the child slot,
//! the child's `parent` is a lookup pointer only. A control is taken out of its slot while
//! one of its own methods runs (see [`ControlTree::with_control`]), so it can freely call
//! back into the tree to measure, paint or focus its children.

use std::any::Any;
use std::time::Instant;

use crate::config::ToolkitConfig;
use crate::core::buffer::{Cell, CharacterBuffer};
use crate::core::geometry::{LayoutConstraints, LayoutRect, LayoutSize, Margin, Point};
use crate::core::keybindings::NavigationKeymap;
use crate::core::style::{
    Color, ColorPair, HorizontalAlignment, StickyPosition, VerticalAlignment,
};
use crate::core::text::markup::{AnsiTextRenderer, TextRenderer};
use crate::core::theme::Theme;
use crate::error::{Result, ToolkitError};
use crate::runtime::control::{Control, ControlProps, FocusReason};
use crate::runtime::portal::{PortalHost, PortalId};
use crate::runtime::ticker::Ticker;

/// Stable identifier for a control owned by one [`ControlTree`].
///
/// Ids are never reused for the lifetime of the tree, so a stale id simply stops resolving.
#[repr(transparent)]
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct ControlId(u64);

impl ControlId {
    pub fn raw(self) -> u64 {
        self.0
    }

    fn index(self) -> Option<usize> {
        usize::try_from(self.0).ok()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InvalidationReason {
    Property,
    Content,
    Layout,
    State,
    Theme,
}

/// Notifications queued by the tree for the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlEvent {
    GotFocus {
        id: ControlId,
        reason: FocusReason,
    },
    LostFocus {
        id: ControlId,
    },
    TabChanged {
        id: ControlId,
        previous: Option<usize>,
        current: usize,
    },
    SplitterMoved {
        id: ControlId,
        left_width: usize,
    },
    Clicked {
        id: ControlId,
    },
    DoubleClicked {
        id: ControlId,
    },
    DismissRequested {
        portal: PortalId,
        owner: Option<ControlId>,
    },
    MenuItemActivated {
        menu: ControlId,
        path: Vec<String>,
    },
    Scrolled {
        id: ControlId,
        vertical: usize,
        horizontal: usize,
    },
}

/// Where a control was painted during the most recent frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaintRecord {
    /// Content bounds (margins removed), absolute.
    pub bounds: LayoutRect,
    /// Part of `bounds` that survived clipping.
    pub visible: LayoutRect,
    generation: u64,
}

pub(crate) enum Notification {
    FocusChanged { focused: bool, reason: FocusReason },
    ChildFocus { child: ControlId, leaf: ControlId },
    ChildRemoved(ControlId),
}

pub(crate) struct Node {
    pub(crate) parent: Option<ControlId>,
    pub(crate) children: Vec<ControlId>,
    pub(crate) props: ControlProps,
    pub(crate) tag: Option<Box<dyn Any>>,
    pub(crate) has_focus: bool,
    /// Last known `can_receive_focus`, readable while the control is out of its slot.
    pub(crate) accepts_focus: bool,
    pub(crate) focused_child: Option<ControlId>,
    pub(crate) last_focused_child: Option<ControlId>,
    pub(crate) hovered_child: Option<ControlId>,
    pub(crate) dirty: bool,
    pub(crate) painted: Option<PaintRecord>,
    pub(crate) type_name: &'static str,
    pub(crate) control: Option<Box<dyn Control>>,
}

fn accepts_focus(control: &dyn Control) -> bool {
    control
        .as_focusable()
        .is_some_and(|focusable| focusable.can_receive_focus())
}

pub struct ControlTree {
    pub(crate) nodes: Vec<Option<Node>>,
    pub(crate) focused: Option<ControlId>,
    events: Vec<ControlEvent>,
    pending: Vec<(ControlId, Notification)>,
    pub(crate) portals: PortalHost,
    pub(crate) ticker: Ticker,
    theme: Theme,
    renderer: Box<dyn TextRenderer>,
    keymap: NavigationKeymap,
    config: ToolkitConfig,
    generation: u64,
    input_time: Instant,
    screen: LayoutRect,
}

impl Default for ControlTree {
    fn default() -> Self {
        Self::new(ToolkitConfig::default())
    }
}

impl ControlTree {
    pub fn new(config: ToolkitConfig) -> Self {
        Self {
            nodes: Vec::new(),
            focused: None,
            events: Vec::new(),
            pending: Vec::new(),
            portals: PortalHost::default(),
            ticker: Ticker::default(),
            theme: Theme::default(),
            renderer: Box::new(AnsiTextRenderer),
            keymap: NavigationKeymap::default(),
            config,
            generation: 0,
            input_time: Instant::now(),
            screen: LayoutRect::EMPTY,
        }
    }

    // ----- services -------------------------------------------------------------------

    pub fn config(&self) -> &ToolkitConfig {
        &self.config
    }

    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    /// Replaces the theme and invalidates every control.
    pub fn set_theme(&mut self, theme: Theme) {
        self.theme = theme;
        self.invalidate_all(InvalidationReason::Theme);
    }

    pub fn color(&self, name: &str, fallback: Color) -> Color {
        self.theme.color_or(name, fallback)
    }

    pub fn renderer(&self) -> &dyn TextRenderer {
        self.renderer.as_ref()
    }

    pub fn set_renderer(&mut self, renderer: Box<dyn TextRenderer>) {
        self.renderer = renderer;
        self.invalidate_all(InvalidationReason::Content);
    }

    pub fn keymap(&self) -> &NavigationKeymap {
        &self.keymap
    }

    pub fn set_keymap(&mut self, keymap: NavigationKeymap) {
        self.keymap = keymap;
    }

    /// Timestamp of the input event currently being dispatched.
    pub fn input_time(&self) -> Instant {
        self.input_time
    }

    pub(crate) fn set_input_time(&mut self, now: Instant) {
        self.input_time = now;
    }

    /// Screen rectangle of the most recent frame; portals position themselves inside it.
    pub fn screen(&self) -> LayoutRect {
        self.screen
    }

    pub(crate) fn begin_frame(&mut self, screen: LayoutRect) {
        self.generation += 1;
        self.screen = screen;
    }

    // ----- events ---------------------------------------------------------------------

    pub fn emit(&mut self, event: ControlEvent) {
        tracing::trace!(target: "tape_widgets::events", ?event, "emit");
        self.events.push(event);
    }

    pub fn drain_events(&mut self) -> Vec<ControlEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn pending_events(&self) -> &[ControlEvent] {
        &self.events
    }

    // ----- node storage ---------------------------------------------------------------

    pub(crate) fn node(&self, id: ControlId) -> Option<&Node> {
        self.nodes.get(id.index()?)?.as_ref()
    }

    pub(crate) fn node_mut(&mut self, id: ControlId) -> Option<&mut Node> {
        self.nodes.get_mut(id.index()?)?.as_mut()
    }

    fn require(&self, id: ControlId) -> Result<&Node> {
        self.node(id).ok_or(ToolkitError::UnknownControl(id))
    }

    pub fn contains(&self, id: ControlId) -> bool {
        self.node(id).is_some()
    }

    /// Adds a detached control and returns its id.
    pub fn create(&mut self, control: impl Control) -> ControlId {
        self.create_boxed(Box::new(control))
    }

    pub fn create_boxed(&mut self, control: Box<dyn Control>) -> ControlId {
        let id = ControlId(self.nodes.len() as u64);
        let type_name = control.type_name();
        let accepts_focus = accepts_focus(control.as_ref());
        self.nodes.push(Some(Node {
            parent: None,
            children: Vec::new(),
            props: ControlProps::default(),
            tag: None,
            has_focus: false,
            accepts_focus,
            focused_child: None,
            last_focused_child: None,
            hovered_child: None,
            dirty: true,
            painted: None,
            type_name,
            control: Some(control),
        }));
        tracing::trace!(target: "tape_widgets::tree", id = id.raw(), type_name, "created control");
        id
    }

    /// Runs `f` with the control taken out of its slot so it can use the tree mutably.
    /// Returns `None` for unknown ids and for a control whose own method is already running.
    pub fn with_control<R>(
        &mut self,
        id: ControlId,
        f: impl FnOnce(&mut dyn Control, &mut ControlTree) -> R,
    ) -> Option<R> {
        let mut control = self.node_mut(id)?.control.take()?;
        let result = f(control.as_mut(), self);
        self.restore(id, control);
        Some(result)
    }

    fn restore(&mut self, id: ControlId, control: Box<dyn Control>) {
        let Some(node) = self.node_mut(id) else {
            return;
        };
        node.accepts_focus = accepts_focus(control.as_ref());
        node.control = Some(control);
        self.flush_pending(id);
    }

    /// Typed variant of [`ControlTree::with_control`].
    pub fn with_typed<T: Control, R>(
        &mut self,
        id: ControlId,
        f: impl FnOnce(&mut T, &mut ControlTree) -> R,
    ) -> Result<R> {
        let expected = std::any::type_name::<T>();
        let type_name = self.require(id)?.type_name;
        let outcome = self.with_control(id, |control, tree| {
            control.as_any_mut().downcast_mut::<T>().map(|typed| f(typed, tree))
        });
        match outcome {
            Some(Some(result)) => Ok(result),
            Some(None) => Err(ToolkitError::TypeMismatch { id, expected }),
            None => {
                tracing::warn!(target: "tape_widgets::tree", id = id.raw(), type_name, "re-entrant typed access");
                Err(ToolkitError::UnknownControl(id))
            }
        }
    }

    pub fn get<T: Control>(&self, id: ControlId) -> Result<&T> {
        let node = self.require(id)?;
        let control = node
            .control
            .as_deref()
            .ok_or(ToolkitError::UnknownControl(id))?;
        control
            .as_any()
            .downcast_ref::<T>()
            .ok_or(ToolkitError::TypeMismatch {
                id,
                expected: std::any::type_name::<T>(),
            })
    }

    pub fn get_mut<T: Control>(&mut self, id: ControlId) -> Result<&mut T> {
        let node = self.node_mut(id).ok_or(ToolkitError::UnknownControl(id))?;
        let control = node
            .control
            .as_deref_mut()
            .ok_or(ToolkitError::UnknownControl(id))?;
        control
            .as_any_mut()
            .downcast_mut::<T>()
            .ok_or(ToolkitError::TypeMismatch {
                id,
                expected: std::any::type_name::<T>(),
            })
    }

    /// Control access by reference while it sits in the tree; `None` while its own method
    /// is running.
    pub(crate) fn control_ref(&self, id: ControlId) -> Option<&dyn Control> {
        self.node(id)?.control.as_deref()
    }

    pub fn type_name(&self, id: ControlId) -> Option<&'static str> {
        self.node(id).map(|node| node.type_name)
    }

    // ----- hierarchy ------------------------------------------------------------------

    pub fn parent(&self, id: ControlId) -> Option<ControlId> {
        self.node(id)?.parent
    }

    pub fn children(&self, id: ControlId) -> &[ControlId] {
        self.node(id).map(|node| node.children.as_slice()).unwrap_or(&[])
    }

    pub fn visible_children(&self, id: ControlId) -> Vec<ControlId> {
        self.children(id)
            .iter()
            .copied()
            .filter(|child| self.is_visible(*child))
            .collect()
    }

    /// Ancestors from the direct parent up to the root.
    pub fn ancestors(&self, id: ControlId) -> Vec<ControlId> {
        let mut chain = Vec::new();
        let mut current = self.parent(id);
        while let Some(ancestor) = current {
            chain.push(ancestor);
            current = self.parent(ancestor);
        }
        chain
    }

    pub fn root_of(&self, id: ControlId) -> ControlId {
        self.ancestors(id).last().copied().unwrap_or(id)
    }

    /// `true` when `ancestor` is `id` or one of its ancestors.
    pub fn is_ancestor_or_self(&self, ancestor: ControlId, id: ControlId) -> bool {
        ancestor == id || self.ancestors(id).contains(&ancestor)
    }

    pub fn is_container(&self, id: ControlId) -> bool {
        self.control_ref(id)
            .map(|control| control.as_container().is_some())
            .unwrap_or_else(|| self.node(id).is_some_and(|node| !node.children.is_empty()))
    }

    pub fn add_child(&mut self, parent: ControlId, child: ControlId) -> Result<()> {
        let index = self.children(parent).len();
        self.insert_child(parent, index, child)
    }

    /// Attaches `child` under `parent` at `index` (clamped). A child that already has a
    /// container is detached from it first.
    pub fn insert_child(&mut self, parent: ControlId, index: usize, child: ControlId) -> Result<()> {
        self.require(parent)?;
        self.require(child)?;
        if !self.is_container(parent) {
            return Err(ToolkitError::NotAContainer(parent));
        }
        if self.is_ancestor_or_self(child, parent) {
            return Err(ToolkitError::WouldCreateCycle { parent, child });
        }
        if self.parent(child).is_some() {
            self.detach(child);
        }

        let Some(parent_node) = self.node_mut(parent) else {
            return Err(ToolkitError::UnknownControl(parent));
        };
        let index = index.min(parent_node.children.len());
        parent_node.children.insert(index, child);
        if let Some(child_node) = self.node_mut(child) {
            child_node.parent = Some(parent);
        }
        if self.node(child).is_some_and(|node| node.has_focus) {
            self.propagate_focus_up(child, child, FocusReason::Programmatic);
        }
        self.invalidate(parent, InvalidationReason::Layout);
        Ok(())
    }

    /// Detaches `child` from `parent` without disposing it.
    pub fn remove_child(&mut self, parent: ControlId, child: ControlId) -> Result<()> {
        self.require(parent)?;
        if self.parent(child) != Some(parent) {
            return Err(ToolkitError::InvalidArgument(format!(
                "{child:?} is not a child of {parent:?}"
            )));
        }
        self.detach(child);
        Ok(())
    }

    fn detach(&mut self, child: ControlId) {
        let Some(parent) = self.parent(child) else {
            return;
        };
        if self.focused.is_some_and(|leaf| self.is_ancestor_or_self(child, leaf)) {
            self.clear_focus();
        }
        if let Some(parent_node) = self.node_mut(parent) {
            parent_node.children.retain(|existing| *existing != child);
            if parent_node.focused_child == Some(child) {
                parent_node.focused_child = None;
            }
            if parent_node.last_focused_child == Some(child) {
                parent_node.last_focused_child = None;
            }
            if parent_node.hovered_child == Some(child) {
                parent_node.hovered_child = None;
            }
        }
        if let Some(child_node) = self.node_mut(child) {
            child_node.parent = None;
        }
        self.notify(parent, Notification::ChildRemoved(child));
        self.invalidate(parent, InvalidationReason::Layout);
    }

    /// Disposes `id` and its whole subtree. Unknown or already disposed ids are ignored.
    pub fn dispose(&mut self, id: ControlId) {
        if !self.contains(id) {
            return;
        }
        self.detach(id);
        self.dispose_subtree(id);
    }

    fn dispose_subtree(&mut self, id: ControlId) {
        if self.focused == Some(id) {
            self.focused = None;
        }
        for child in self.children(id).to_vec() {
            self.dispose_subtree(child);
        }
        self.with_control(id, |control, tree| control.on_dispose(tree, id));
        self.ticker.unregister(id);
        self.portals.forget_owner(id);
        self.pending.retain(|(target, _)| *target != id);
        if let Some(slot) = id.index().and_then(|index| self.nodes.get_mut(index)) {
            *slot = None;
        }
        tracing::trace!(target: "tape_widgets::tree", id = id.raw(), "disposed control");
    }

    // ----- deferred notifications -----------------------------------------------------

    pub(crate) fn notify(&mut self, target: ControlId, notification: Notification) {
        if !self.contains(target) {
            return;
        }
        let ready = self.node(target).is_some_and(|node| node.control.is_some());
        if ready {
            self.deliver(target, notification);
        } else {
            self.pending.push((target, notification));
        }
    }

    fn flush_pending(&mut self, id: ControlId) {
        if !self.pending.iter().any(|(target, _)| *target == id) {
            return;
        }
        let (ready, rest): (Vec<_>, Vec<_>) = std::mem::take(&mut self.pending)
            .into_iter()
            .partition(|(target, _)| *target == id);
        self.pending = rest;
        for (_, notification) in ready {
            self.deliver(id, notification);
        }
    }

    fn deliver(&mut self, target: ControlId, notification: Notification) {
        self.with_control(target, |control, tree| match notification {
            Notification::FocusChanged { focused, reason } => {
                if let Some(focusable) = control.as_focusable_mut() {
                    focusable.on_focus_changed(tree, target, focused, reason);
                }
            }
            Notification::ChildFocus { child, leaf } => {
                if let Some(tracking) = control.as_focus_tracking() {
                    tracking.on_child_focus_changed(tree, target, child, leaf);
                }
            }
            Notification::ChildRemoved(child) => {
                if let Some(container) = control.as_container_mut() {
                    container.on_child_removed(tree, target, child);
                }
            }
        });
    }
}

// ----- properties -----------------------------------------------------------------------

impl ControlTree {
    pub fn props(&self, id: ControlId) -> Option<&ControlProps> {
        self.node(id).map(|node| &node.props)
    }

    /// Applies `update` to the layout properties and invalidates the layout. Explicit sizes
    /// are validated by the control before anything is stored.
    pub fn update_props(
        &mut self,
        id: ControlId,
        update: impl FnOnce(&mut ControlProps),
    ) -> Result<()> {
        let mut props = self.require(id)?.props.clone();
        update(&mut props);
        if let Some(control) = self.control_ref(id) {
            control.validate_size(props.width, props.height)?;
        }
        let was_visible = self.is_visible(id);
        let Some(node) = self.node_mut(id) else {
            return Err(ToolkitError::UnknownControl(id));
        };
        if node.props == props {
            return Ok(());
        }
        node.props = props;
        if was_visible && !self.is_visible(id) {
            self.on_hidden(id);
        }
        self.invalidate(id, InvalidationReason::Layout);
        Ok(())
    }

    pub fn set_visible(&mut self, id: ControlId, visible: bool) -> Result<()> {
        self.update_props(id, |props| props.visible = visible)
    }

    pub fn set_width(&mut self, id: ControlId, width: Option<usize>) -> Result<()> {
        self.update_props(id, |props| props.width = width)
    }

    pub fn set_height(&mut self, id: ControlId, height: Option<usize>) -> Result<()> {
        self.update_props(id, |props| props.height = height)
    }

    pub fn set_margin(&mut self, id: ControlId, margin: Margin) -> Result<()> {
        self.update_props(id, |props| props.margin = margin)
    }

    pub fn set_alignment(
        &mut self,
        id: ControlId,
        horizontal: HorizontalAlignment,
        vertical: VerticalAlignment,
    ) -> Result<()> {
        self.update_props(id, |props| {
            props.horizontal_alignment = horizontal;
            props.vertical_alignment = vertical;
        })
    }

    pub fn set_sticky(&mut self, id: ControlId, sticky: StickyPosition) -> Result<()> {
        self.update_props(id, |props| props.sticky = sticky)
    }

    pub fn set_colors(
        &mut self,
        id: ControlId,
        foreground: Option<Color>,
        background: Option<Color>,
    ) -> Result<()> {
        self.update_props(id, |props| {
            props.foreground = foreground;
            props.background = background;
        })
    }

    pub fn set_name(&mut self, id: ControlId, name: impl Into<String>) -> Result<()> {
        let name = name.into();
        self.update_props(id, |props| props.name = Some(name))
    }

    /// First control in the subtree of `root` whose name matches.
    pub fn find_by_name(&self, root: ControlId, name: &str) -> Option<ControlId> {
        if self.props(root)?.name.as_deref() == Some(name) {
            return Some(root);
        }
        self.children(root)
            .iter()
            .find_map(|child| self.find_by_name(*child, name))
    }

    /// Own visibility flag only; see [`ControlTree::is_effectively_visible`] for ancestors.
    pub fn is_visible(&self, id: ControlId) -> bool {
        self.node(id).is_some_and(|node| node.props.visible)
    }

    pub fn is_effectively_visible(&self, id: ControlId) -> bool {
        self.is_visible(id) && self.ancestors(id).iter().all(|ancestor| self.is_visible(*ancestor))
    }

    fn on_hidden(&mut self, id: ControlId) {
        if self.focused.is_some_and(|leaf| self.is_ancestor_or_self(id, leaf)) {
            self.clear_focus();
        }
    }

    /// Attaches opaque user data to a control.
    pub fn set_tag<T: Any>(&mut self, id: ControlId, tag: T) -> Result<()> {
        let node = self.node_mut(id).ok_or(ToolkitError::UnknownControl(id))?;
        node.tag = Some(Box::new(tag));
        Ok(())
    }

    pub fn tag<T: Any>(&self, id: ControlId) -> Option<&T> {
        self.node(id)?.tag.as_ref()?.downcast_ref::<T>()
    }
}

// ----- invalidation ---------------------------------------------------------------------

impl ControlTree {
    /// Marks `id` and every ancestor dirty. Nothing is repainted until the host's next
    /// paint pass.
    pub fn invalidate(&mut self, id: ControlId, reason: InvalidationReason) {
        tracing::trace!(target: "tape_widgets::tree", id = id.raw(), ?reason, "invalidate");
        let mut current = Some(id);
        while let Some(target) = current {
            let Some(node) = self.node_mut(target) else {
                break;
            };
            node.dirty = true;
            current = node.parent;
        }
    }

    pub fn invalidate_all(&mut self, reason: InvalidationReason) {
        tracing::trace!(target: "tape_widgets::tree", ?reason, "invalidate all");
        for node in self.nodes.iter_mut().flatten() {
            node.dirty = true;
        }
    }

    pub fn is_dirty(&self, id: ControlId) -> bool {
        self.node(id).is_some_and(|node| node.dirty)
    }
}

// ----- measure / paint ------------------------------------------------------------------

impl ControlTree {
    /// Measures `id` including its margins. The result always satisfies `constraints`.
    pub fn measure(&mut self, id: ControlId, constraints: LayoutConstraints) -> LayoutSize {
        let Some(props) = self.props(id).cloned() else {
            return constraints.clamp(LayoutSize::ZERO);
        };
        if !props.visible {
            return constraints.clamp(LayoutSize::ZERO);
        }

        let margin = props.margin;
        let mut inner = constraints.deflate(margin.horizontal(), margin.vertical());
        if let Some(width) = props.width {
            inner = inner.with_width(width);
        }
        if let Some(height) = props.height {
            inner = inner.with_height(height);
        }

        let content = self
            .with_control(id, |control, tree| control.measure(tree, id, inner))
            .unwrap_or(LayoutSize::ZERO);
        let content = inner.clamp(content);

        let mut size = LayoutSize::new(
            content.width + margin.horizontal(),
            content.height + margin.vertical(),
        );
        if props.horizontal_alignment == HorizontalAlignment::Stretch
            && props.width.is_none()
            && constraints.has_bounded_width()
        {
            size.width = constraints.max_width;
        }
        constraints.clamp(size)
    }

    /// Paints `id` into `bounds` (absolute, margins included). The whole visible part of
    /// `bounds` is filled with the control's background first; content painting is skipped
    /// when nothing is left after margins and clipping.
    pub fn paint(
        &mut self,
        id: ControlId,
        buffer: &mut CharacterBuffer,
        bounds: LayoutRect,
        clip: LayoutRect,
        inherited: ColorPair,
    ) {
        let generation = self.generation;
        let debug_layout = self.config.debug_layout;
        let Some(node) = self.node_mut(id) else {
            return;
        };
        if !node.props.visible {
            return;
        }
        let colors = node.props.resolve_colors(inherited);
        let visible = bounds.intersect(&clip);
        if visible.is_empty() {
            return;
        }
        buffer.fill_rect(&visible, Cell::blank(colors));

        let content = bounds.deflate(node.props.margin);
        let content_clip = content.intersect(&clip);
        node.painted = Some(PaintRecord {
            bounds: content,
            visible: content_clip,
            generation,
        });
        node.dirty = false;
        if content.is_empty() || content_clip.is_empty() {
            return;
        }
        if debug_layout {
            tracing::debug!(
                target: "tape_widgets::layout",
                id = id.raw(),
                type_name = node.type_name,
                x = content.x,
                y = content.y,
                width = content.width,
                height = content.height,
                "paint"
            );
        }
        self.with_control(id, |control, tree| {
            control.paint(tree, id, buffer, content, content_clip, colors)
        });
    }

    /// Paint record from the current frame; `None` for controls skipped this frame.
    pub fn paint_record(&self, id: ControlId) -> Option<PaintRecord> {
        let record = self.node(id)?.painted?;
        (record.generation == self.generation).then_some(record)
    }

    /// Absolute content bounds from the current frame.
    pub fn painted_bounds(&self, id: ControlId) -> Option<LayoutRect> {
        self.paint_record(id).map(|record| record.bounds)
    }

    pub fn content_origin(&self, id: ControlId) -> Option<Point> {
        self.painted_bounds(id).map(|bounds| bounds.origin())
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::{ControlId, ControlTree};
    use crate::core::buffer::CharacterBuffer;
    use crate::core::geometry::{LayoutConstraints, LayoutRect, LayoutSize, Margin};
    use crate::core::style::ColorPair;
    use crate::error::ToolkitError;
    use crate::runtime::control::{Control, FocusReason};
    use crate::widgets::button::ButtonControl;
    use crate::widgets::markup::MarkupControl;
    use crate::widgets::panel::PanelControl;

    struct Probe(Rc<Cell<usize>>);

    impl Control for Probe {
        fn measure(&mut self, _: &mut ControlTree, _: ControlId, _: LayoutConstraints) -> LayoutSize {
            LayoutSize::new(1, 1)
        }

        fn paint(
            &mut self,
            _: &mut ControlTree,
            _: ControlId,
            _: &mut CharacterBuffer,
            _: LayoutRect,
            _: LayoutRect,
            _: ColorPair,
        ) {
        }

        fn on_dispose(&mut self, _: &mut ControlTree, _: ControlId) {
            self.0.set(self.0.get() + 1);
        }
    }

    #[test]
    fn attaching_checks_containers_and_cycles() {
        let mut tree = ControlTree::default();
        let outer = tree.create(PanelControl::new());
        let inner = tree.create(PanelControl::new());
        let text = tree.create(MarkupControl::new("x"));
        tree.add_child(outer, inner).expect("attach");

        assert_eq!(tree.add_child(text, outer), Err(ToolkitError::NotAContainer(text)));
        assert_eq!(
            tree.add_child(inner, outer),
            Err(ToolkitError::WouldCreateCycle { parent: inner, child: outer })
        );

        tree.add_child(inner, text).expect("attach");
        tree.add_child(outer, text).expect("reparent");
        assert_eq!(tree.parent(text), Some(outer));
        assert!(tree.children(inner).is_empty());
        assert!(tree.remove_child(inner, text).is_err());
    }

    #[test]
    fn dispose_runs_for_the_whole_subtree() {
        let disposed = Rc::new(Cell::new(0));
        let mut tree = ControlTree::default();
        let root = tree.create(PanelControl::new());
        let group = tree.create(PanelControl::new());
        let a = tree.create(Probe(Rc::clone(&disposed)));
        let b = tree.create(Probe(Rc::clone(&disposed)));
        tree.add_child(root, group).expect("attach");
        tree.add_child(group, a).expect("attach");
        tree.add_child(group, b).expect("attach");

        tree.dispose(group);
        assert_eq!(disposed.get(), 2);
        assert!(!tree.contains(a));
        assert!(tree.children(root).is_empty());
        tree.dispose(group);
        assert_eq!(disposed.get(), 2);
    }

    #[test]
    fn typed_access_reports_mismatch_and_reentry() {
        let mut tree = ControlTree::default();
        let text = tree.create(MarkupControl::new("x"));
        assert!(matches!(
            tree.get::<PanelControl>(text),
            Err(ToolkitError::TypeMismatch { .. })
        ));
        let nested = tree.with_typed::<MarkupControl, _>(text, |_, tree| {
            tree.with_typed::<MarkupControl, _>(text, |_, _| ())
        });
        assert_eq!(nested, Ok(Err(ToolkitError::UnknownControl(text))));
    }

    #[test]
    fn measure_adds_margins_around_explicit_sizes() {
        let mut tree = ControlTree::default();
        let text = tree.create(MarkupControl::new("abc"));
        tree.set_width(text, Some(5)).expect("width");
        tree.set_margin(text, Margin::uniform(1)).expect("margin");
        assert_eq!(
            tree.measure(text, LayoutConstraints::loose(20, 20)),
            LayoutSize::new(7, 3)
        );
        tree.set_visible(text, false).expect("hide");
        assert_eq!(
            tree.measure(text, LayoutConstraints::loose(20, 20)),
            LayoutSize::ZERO
        );
    }

    #[test]
    fn hiding_a_focused_branch_clears_focus() {
        let mut tree = ControlTree::default();
        let root = tree.create(PanelControl::new());
        let group = tree.create(PanelControl::new());
        let button = tree.create(ButtonControl::new("ok"));
        tree.add_child(root, group).expect("attach");
        tree.add_child(group, button).expect("attach");
        assert!(tree.set_focus(button, FocusReason::Programmatic));

        tree.set_visible(group, false).expect("hide");
        assert_eq!(tree.focused(), None);
        assert!(!tree.has_focus(root));
        assert!(!tree.can_focus(button));
    }

    #[test]
    fn names_and_tags() {
        let mut tree = ControlTree::default();
        let root = tree.create(PanelControl::new());
        let text = tree.create(MarkupControl::new("x"));
        tree.add_child(root, text).expect("attach");
        tree.set_name(text, "status").expect("name");
        tree.set_tag(text, 42u32).expect("tag");

        assert_eq!(tree.find_by_name(root, "status"), Some(text));
        assert_eq!(tree.find_by_name(root, "missing"), None);
        assert_eq!(tree.tag::<u32>(text), Some(&42));
        assert_eq!(tree.tag::<String>(text), None);
    }
}
