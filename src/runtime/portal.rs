//! Portals: transient overlays painted after the control tree in absolute coordinates.
//!
//! Portals are not part of the layout tree. The host paints them last (in registration
//! order, so later portals sit on top) and offers them mouse events before the tree.

use crate::core::buffer::{Cell, CharacterBuffer};
use crate::core::geometry::{to_i32, LayoutRect, LayoutSize, Point};
use crate::core::input::{KeyEvent, MouseEvent};
use crate::core::style::{BorderStyle, Color, ColorPair};
use crate::core::theme::names;
use crate::render::border::draw_border;
use crate::runtime::tree::{ControlEvent, ControlId, ControlTree};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PortalId(u64);

impl PortalId {
    pub fn raw(self) -> u64 {
        self.0
    }
}

pub trait PortalContent {
    /// Absolute screen bounds, border included.
    fn portal_bounds(&self, tree: &ControlTree) -> LayoutRect;

    fn border_style(&self) -> Option<BorderStyle> {
        None
    }

    fn colors(&self, tree: &ControlTree) -> ColorPair {
        ColorPair::new(
            tree.color(names::WINDOW_FG, Color::WHITE),
            tree.color(names::WINDOW_BG, Color::BLACK),
        )
    }

    fn dismiss_on_outside_click(&self) -> bool {
        true
    }

    /// Control that opened the portal. Disposing it removes the portal.
    fn owner(&self) -> Option<ControlId> {
        None
    }

    /// Paints into `content` (inside the border, if any).
    fn paint(
        &mut self,
        tree: &mut ControlTree,
        buffer: &mut CharacterBuffer,
        content: LayoutRect,
        clip: LayoutRect,
        colors: ColorPair,
    );

    /// `event.position` is relative to the content origin, border already removed.
    fn process_mouse(&mut self, _tree: &mut ControlTree, _event: &mut MouseEvent) -> bool {
        false
    }

    fn process_key(&mut self, _tree: &mut ControlTree, _key: &KeyEvent) -> bool {
        false
    }

    fn on_dismissed(&mut self, _tree: &mut ControlTree) {}
}

struct PortalEntry {
    id: PortalId,
    owner: Option<ControlId>,
    content: Option<Box<dyn PortalContent>>,
}

/// Registered portals in z-order (last is topmost).
#[derive(Default)]
pub struct PortalHost {
    entries: Vec<PortalEntry>,
    next_id: u64,
}

impl PortalHost {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn insert(&mut self, content: Box<dyn PortalContent>) -> PortalId {
        let id = PortalId(self.next_id);
        self.next_id += 1;
        self.entries.push(PortalEntry {
            id,
            owner: content.owner(),
            content: Some(content),
        });
        id
    }

    fn position(&self, id: PortalId) -> Option<usize> {
        self.entries.iter().position(|entry| entry.id == id)
    }

    fn ids(&self) -> Vec<PortalId> {
        self.entries.iter().map(|entry| entry.id).collect()
    }

    /// Drops portals opened by a disposed control without calling back into them.
    pub(crate) fn forget_owner(&mut self, owner: ControlId) {
        self.entries.retain(|entry| entry.owner != Some(owner));
    }
}

/// Places a `size` rectangle at `origin`, shifted back inside `screen` where it would
/// overflow. Rectangles larger than the screen are pinned to its top-left corner.
pub fn place_within(origin: Point, size: LayoutSize, screen: LayoutRect) -> LayoutRect {
    let width = to_i32(size.width);
    let height = to_i32(size.height);
    let max_x = (screen.right() - width).max(screen.x);
    let max_y = (screen.bottom() - height).max(screen.y);
    LayoutRect::new(
        origin.x.min(max_x).max(screen.x),
        origin.y.min(max_y).max(screen.y),
        width,
        height,
    )
}

impl ControlTree {
    pub fn show_portal(&mut self, content: impl PortalContent + 'static) -> PortalId {
        let id = self.portals.insert(Box::new(content));
        tracing::debug!(target: "tape_widgets::portal", id = id.raw(), "portal shown");
        id
    }

    /// Removes a portal and calls its `on_dismissed`. Unknown ids are ignored.
    pub fn dismiss_portal(&mut self, id: PortalId) -> bool {
        let Some(index) = self.portals.position(id) else {
            return false;
        };
        let entry = self.portals.entries.remove(index);
        tracing::debug!(target: "tape_widgets::portal", id = id.raw(), "portal dismissed");
        if let Some(mut content) = entry.content {
            content.on_dismissed(self);
        }
        true
    }

    /// Dismisses every portal opened by `owner`.
    pub fn dismiss_portals_of(&mut self, owner: ControlId) {
        let ids: Vec<PortalId> = self
            .portals
            .entries
            .iter()
            .filter(|entry| entry.owner == Some(owner))
            .map(|entry| entry.id)
            .collect();
        for id in ids {
            self.dismiss_portal(id);
        }
    }

    pub fn has_portal(&self, id: PortalId) -> bool {
        self.portals.position(id).is_some()
    }

    pub fn portal_ids(&self) -> Vec<PortalId> {
        self.portals.ids()
    }

    pub fn portal_bounds(&self, id: PortalId) -> Option<LayoutRect> {
        let index = self.portals.position(id)?;
        let content = self.portals.entries[index].content.as_deref()?;
        Some(content.portal_bounds(self))
    }

    /// Runs `f` with the portal content taken out of the host.
    fn with_portal<R>(
        &mut self,
        id: PortalId,
        f: impl FnOnce(&mut dyn PortalContent, &mut ControlTree) -> R,
    ) -> Option<R> {
        let index = self.portals.position(id)?;
        let mut content = self.portals.entries[index].content.take()?;
        let result = f(content.as_mut(), self);
        // The portal may have been dismissed while it ran.
        if let Some(index) = self.portals.position(id) {
            self.portals.entries[index].content = Some(content);
        }
        Some(result)
    }

    /// Paints every portal on top of whatever the tree painted.
    pub fn paint_portals(&mut self, buffer: &mut CharacterBuffer) {
        let screen = buffer.bounds();
        for id in self.portals.ids() {
            self.with_portal(id, |content, tree| {
                let bounds = content.portal_bounds(tree);
                let clip = bounds.intersect(&screen);
                if clip.is_empty() {
                    return;
                }
                let colors = content.colors(tree);
                buffer.fill_rect(&clip, Cell::blank(colors));
                let inner = match content.border_style() {
                    Some(style) => {
                        draw_border(buffer, &bounds, style, colors, &clip, None);
                        bounds.inset(1)
                    }
                    None => bounds,
                };
                let inner_clip = inner.intersect(&clip);
                if !inner_clip.is_empty() {
                    content.paint(tree, buffer, inner, inner_clip, colors);
                }
            });
        }
    }

    /// Offers an absolute-coordinate mouse event to the portals, topmost first. Presses
    /// outside a dismiss-on-outside-click portal dismiss it and keep looking; the caller
    /// routes the event to the tree when this returns `false`.
    pub fn route_portal_mouse(&mut self, event: &mut MouseEvent) -> bool {
        for id in self.portals.ids().into_iter().rev() {
            let Some(bounds) = self.portal_bounds(id) else {
                continue;
            };
            if bounds.contains(event.position) {
                let mut local = event.translated(bounds.origin());
                let bordered = self
                    .portals
                    .position(id)
                    .and_then(|index| self.portals.entries[index].content.as_deref())
                    .is_some_and(|content| content.border_style().is_some());
                if bordered {
                    let on_border = local.position.x == 0
                        || local.position.y == 0
                        || local.position.x == bounds.width - 1
                        || local.position.y == bounds.height - 1;
                    if on_border {
                        event.handled = true;
                        return true;
                    }
                    local.position = local.position.offset(-1, -1);
                }
                self.with_portal(id, |content, tree| content.process_mouse(tree, &mut local));
                event.handled = true;
                return true;
            }
            if event.kind.is_press() {
                self.request_outside_dismiss(id);
            }
        }
        false
    }

    fn request_outside_dismiss(&mut self, id: PortalId) {
        let Some(index) = self.portals.position(id) else {
            return;
        };
        let entry = &self.portals.entries[index];
        let dismiss = entry
            .content
            .as_deref()
            .is_some_and(|content| content.dismiss_on_outside_click());
        if !dismiss {
            return;
        }
        let owner = entry.owner;
        self.emit(ControlEvent::DismissRequested { portal: id, owner });
        self.dismiss_portal(id);
    }

    /// Offers a key to the topmost portal that wants it.
    pub fn route_portal_key(&mut self, key: &KeyEvent) -> bool {
        for id in self.portals.ids().into_iter().rev() {
            if self
                .with_portal(id, |content, tree| content.process_key(tree, key))
                .unwrap_or(false)
            {
                return true;
            }
        }
        false
    }
}
