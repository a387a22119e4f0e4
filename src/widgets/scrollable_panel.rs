//! Scrollable panel: a vertical stack of children viewed through a scrolling viewport.
//!
//! Each paint pass re-measures the children against the current width, clamps the offsets
//! and places children at `cumulative - offset`. Children entirely outside the viewport are
//! not painted (their heights still count towards the scrollbar). Sticky children are
//! pinned above or below the viewport and ignore the offset.
//!
//! When the vertical scrollbar is shown and the content overflows, two columns (a gap and
//! the track) are reserved and the children are measured once more at the narrower width.
//! The result is not iterated further: narrower content may wrap taller, which at worst
//! leaves a scrollbar visible for content that would have fit.

use crate::core::buffer::CharacterBuffer;
use crate::core::geometry::{to_i32, LayoutConstraints, LayoutRect, LayoutSize, UNBOUNDED};
use crate::core::input::{KeyEvent, MouseButton, MouseEvent, MouseEventKind};
use crate::core::keybindings::NavigationAction;
use crate::core::style::{Color, ColorPair, StickyPosition};
use crate::core::theme::names;
use crate::error::{Result, ToolkitError};
use crate::render::scrollbar::{paint_horizontal, paint_vertical, ScrollbarColors};
use crate::runtime::control::{
    align_horizontal, Container, Control, FocusReason, FocusTracking, Focusable, Interactive,
    MouseAware,
};
use crate::runtime::scroll::{ScrollState, ThumbGeometry};
use crate::runtime::tree::{ControlEvent, ControlId, ControlTree, InvalidationReason};

/// Lines scrolled per wheel notch.
pub const WHEEL_STEP: isize = 3;

/// Columns reserved for the vertical scrollbar: one gap plus the track.
const SCROLLBAR_RESERVE: usize = 2;

/// A scrolling child's vertical extent in content coordinates, from the last paint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ChildSlot {
    child: ControlId,
    top: usize,
    height: usize,
}

/// Panel geometry from the last paint, local to the content origin.
#[derive(Debug, Clone, Copy, Default)]
struct PanelLayout {
    viewport: LayoutRect,
    vertical_track: Option<LayoutRect>,
    horizontal_track: Option<LayoutRect>,
}

#[derive(Debug, Clone, Copy)]
struct ThumbDrag {
    /// Row within the thumb where the drag started.
    grab: usize,
}

pub struct ScrollablePanelControl {
    vertical: ScrollState,
    horizontal: ScrollState,
    show_scrollbar: Option<bool>,
    horizontal_scroll: bool,
    slots: Vec<ChildSlot>,
    layout: PanelLayout,
    drag: Option<ThumbDrag>,
}

impl Default for ScrollablePanelControl {
    fn default() -> Self {
        Self::new()
    }
}

impl ScrollablePanelControl {
    pub fn new() -> Self {
        Self {
            vertical: ScrollState::new(),
            horizontal: ScrollState::new(),
            show_scrollbar: None,
            horizontal_scroll: false,
            slots: Vec::new(),
            layout: PanelLayout::default(),
            drag: None,
        }
    }

    /// Keeps the view pinned to the bottom while content grows, until the user scrolls away.
    pub fn with_auto_scroll(mut self, enabled: bool) -> Self {
        self.vertical.auto_follow = enabled;
        self
    }

    /// Overrides the configured default scrollbar visibility.
    pub fn with_scrollbar(mut self, visible: bool) -> Self {
        self.show_scrollbar = Some(visible);
        self
    }

    pub fn with_horizontal_scroll(mut self, enabled: bool) -> Self {
        self.horizontal_scroll = enabled;
        self
    }

    pub fn vertical_offset(&self) -> usize {
        self.vertical.offset()
    }

    pub fn horizontal_offset(&self) -> usize {
        self.horizontal.offset()
    }

    pub fn content_height(&self) -> usize {
        self.vertical.content()
    }

    pub fn viewport_height(&self) -> usize {
        self.vertical.viewport()
    }

    pub fn is_auto_scroll(&self) -> bool {
        self.vertical.auto_follow
    }

    pub fn set_auto_scroll(tree: &mut ControlTree, id: ControlId, enabled: bool) -> Result<()> {
        tree.get_mut::<Self>(id)?.vertical.auto_follow = enabled;
        tree.invalidate(id, InvalidationReason::State);
        Ok(())
    }

    pub fn set_show_scrollbar(tree: &mut ControlTree, id: ControlId, visible: Option<bool>) -> Result<()> {
        tree.get_mut::<Self>(id)?.show_scrollbar = visible;
        tree.invalidate(id, InvalidationReason::Layout);
        Ok(())
    }

    pub fn set_horizontal_scroll(tree: &mut ControlTree, id: ControlId, enabled: bool) -> Result<()> {
        let panel = tree.get_mut::<Self>(id)?;
        panel.horizontal_scroll = enabled;
        if !enabled {
            panel.horizontal.scroll_to_top();
        }
        tree.invalidate(id, InvalidationReason::Layout);
        Ok(())
    }

    pub fn scroll_to_top(tree: &mut ControlTree, id: ControlId) -> Result<bool> {
        Self::scroll_with(tree, id, |panel| panel.vertical.scroll_to_top())
    }

    pub fn scroll_to_bottom(tree: &mut ControlTree, id: ControlId) -> Result<bool> {
        Self::scroll_with(tree, id, |panel| panel.vertical.scroll_to_bottom())
    }

    /// Scrolls vertically by `delta` lines (negative is up). Returns whether the offset moved.
    pub fn scroll_by(tree: &mut ControlTree, id: ControlId, delta: isize) -> Result<bool> {
        Self::scroll_with(tree, id, |panel| panel.vertical.scroll_by(delta))
    }

    pub fn scroll_horizontally_by(tree: &mut ControlTree, id: ControlId, delta: isize) -> Result<bool> {
        Self::scroll_with(tree, id, |panel| {
            panel.horizontal_scroll && panel.horizontal.scroll_by(delta)
        })
    }

    /// Minimal scroll that brings a direct child into view, using the last layout pass.
    pub fn scroll_child_into_view(tree: &mut ControlTree, id: ControlId, child: ControlId) -> Result<bool> {
        if tree.parent(child) != Some(id) {
            return Err(ToolkitError::InvalidArgument(format!(
                "{child:?} is not a child of {id:?}"
            )));
        }
        Self::scroll_with(tree, id, |panel| panel.reveal(child, 0, None))
    }

    fn scroll_with(
        tree: &mut ControlTree,
        id: ControlId,
        scroll: impl FnOnce(&mut Self) -> bool,
    ) -> Result<bool> {
        let panel = tree.get_mut::<Self>(id)?;
        let changed = scroll(panel);
        let offsets = (panel.vertical.offset(), panel.horizontal.offset());
        if changed {
            Self::scrolled(tree, id, offsets);
        }
        Ok(changed)
    }

    fn scrolled(tree: &mut ControlTree, id: ControlId, (vertical, horizontal): (usize, usize)) {
        tree.emit(ControlEvent::Scrolled {
            id,
            vertical,
            horizontal,
        });
        tree.invalidate(id, InvalidationReason::State);
    }

    fn after_scroll(&self, tree: &mut ControlTree, id: ControlId, changed: bool) -> bool {
        if changed {
            Self::scrolled(tree, id, (self.vertical.offset(), self.horizontal.offset()));
        }
        changed
    }

    /// Scrolls so that `height` rows starting `within` rows into `child` are visible. A
    /// `None` height reveals the whole child.
    fn reveal(&mut self, child: ControlId, within: usize, height: Option<usize>) -> bool {
        let Some(slot) = self.slots.iter().find(|slot| slot.child == child) else {
            return false;
        };
        let height = height.unwrap_or(slot.height).min(slot.height.saturating_sub(within));
        self.vertical.ensure_visible(slot.top + within, height.max(1))
    }

    fn scrollbar_visible(&self, tree: &ControlTree) -> bool {
        self.show_scrollbar.unwrap_or(tree.config().show_scrollbars)
    }

    fn measure_flow(
        &self,
        tree: &mut ControlTree,
        children: &[ControlId],
        width: usize,
    ) -> Vec<LayoutSize> {
        let max_width = if self.horizontal_scroll { UNBOUNDED } else { width };
        children
            .iter()
            .map(|child| tree.measure(*child, LayoutConstraints::loose(max_width, UNBOUNDED)))
            .collect()
    }

    fn scrollbar_colors(tree: &ControlTree, background: Color) -> ScrollbarColors {
        ScrollbarColors {
            track: tree.color(names::SCROLLBAR_TRACK_FG, Color::GRAY),
            thumb: tree.color(names::SCROLLBAR_THUMB_FG, Color::WHITE),
            background,
        }
    }

    fn thumb(&self) -> Option<ThumbGeometry> {
        let track = self.layout.vertical_track?;
        ThumbGeometry::compute(
            self.vertical.content(),
            self.vertical.viewport(),
            self.vertical.offset(),
            track.size().height,
        )
    }

    /// Offset for a thumb whose top edge sits `start` rows into the track.
    fn offset_for_thumb(&self, start: usize, thumb: ThumbGeometry, track_len: usize) -> usize {
        let travel = track_len.saturating_sub(thumb.length);
        if travel == 0 {
            return 0;
        }
        let ratio = start.min(travel) as f64 / travel as f64;
        (ratio * self.vertical.max_offset() as f64).round() as usize
    }

    fn process_scrollbar_mouse(&mut self, event: &MouseEvent) -> Option<bool> {
        let track = self.layout.vertical_track?;
        match event.kind {
            MouseEventKind::Dragged(MouseButton::Left) if self.drag.is_some() => {
                let grab = self.drag.map(|drag| drag.grab).unwrap_or(0);
                let thumb = self.thumb()?;
                let start = (event.position.y - track.y - to_i32(grab)).max(0) as usize;
                let target = self.offset_for_thumb(start, thumb, track.size().height);
                Some(self.vertical.scroll_to(target))
            }
            MouseEventKind::Released(_) if self.drag.is_some() => {
                self.drag = None;
                Some(false)
            }
            MouseEventKind::Pressed(MouseButton::Left) if track.contains(event.position) => {
                let row = (event.position.y - track.y) as usize;
                let thumb = self.thumb()?;
                if row < thumb.offset {
                    Some(self.vertical.page_up())
                } else if row >= thumb.offset + thumb.length {
                    Some(self.vertical.page_down())
                } else {
                    self.drag = Some(ThumbDrag {
                        grab: row - thumb.offset,
                    });
                    Some(false)
                }
            }
            _ => None,
        }
    }

    fn process_horizontal_bar_mouse(&mut self, event: &MouseEvent) -> Option<bool> {
        let track = self.layout.horizontal_track?;
        if !matches!(event.kind, MouseEventKind::Pressed(MouseButton::Left))
            || !track.contains(event.position)
        {
            return None;
        }
        let col = (event.position.x - track.x) as usize;
        let thumb = ThumbGeometry::compute(
            self.horizontal.content(),
            self.horizontal.viewport(),
            self.horizontal.offset(),
            track.size().width,
        )?;
        let step = self.horizontal.viewport().max(1) as isize;
        if col < thumb.offset {
            Some(self.horizontal.scroll_by(-step))
        } else if col >= thumb.offset + thumb.length {
            Some(self.horizontal.scroll_by(step))
        } else {
            Some(false)
        }
    }
}

impl Control for ScrollablePanelControl {
    fn measure(
        &mut self,
        tree: &mut ControlTree,
        id: ControlId,
        constraints: LayoutConstraints,
    ) -> LayoutSize {
        let children = tree.visible_children(id);
        let sizes = self.measure_flow(tree, &children, constraints.max_width);
        let width = sizes.iter().map(|size| size.width).max().unwrap_or(0);
        let height: usize = sizes.iter().map(|size| size.height).sum();
        let overflow = constraints.has_bounded_height() && height > constraints.max_height;
        let reserve = if overflow && self.scrollbar_visible(tree) {
            SCROLLBAR_RESERVE
        } else {
            0
        };
        LayoutSize::new(width + reserve, height)
    }

    fn paint(
        &mut self,
        tree: &mut ControlTree,
        id: ControlId,
        buffer: &mut CharacterBuffer,
        bounds: LayoutRect,
        clip: LayoutRect,
        colors: ColorPair,
    ) {
        let LayoutSize { width, height } = bounds.size();
        let mut sticky_top = Vec::new();
        let mut sticky_bottom = Vec::new();
        let mut flow = Vec::new();
        for child in tree.visible_children(id) {
            match tree.props(child).map(|props| props.sticky).unwrap_or_default() {
                StickyPosition::Top => sticky_top.push(child),
                StickyPosition::Bottom => sticky_bottom.push(child),
                StickyPosition::None => flow.push(child),
            }
        }

        let measure_sticky = |tree: &mut ControlTree, ids: &[ControlId]| -> Vec<(ControlId, LayoutSize)> {
            ids.iter()
                .map(|child| (*child, tree.measure(*child, LayoutConstraints::loose(width, height))))
                .collect()
        };
        let top_sizes = measure_sticky(tree, &sticky_top);
        let bottom_sizes = measure_sticky(tree, &sticky_bottom);
        let top_height: usize = top_sizes.iter().map(|(_, size)| size.height).sum();
        let bottom_height: usize = bottom_sizes.iter().map(|(_, size)| size.height).sum();
        let mut viewport_height = height.saturating_sub(top_height + bottom_height);

        let mut content_width = width;
        let mut sizes = self.measure_flow(tree, &flow, content_width);
        let content_height: usize = sizes.iter().map(|size| size.height).sum();
        let reserve = self.scrollbar_visible(tree)
            && content_height > viewport_height
            && width > SCROLLBAR_RESERVE;
        if reserve {
            content_width = width - SCROLLBAR_RESERVE;
            sizes = self.measure_flow(tree, &flow, content_width);
        }
        let content_height: usize = sizes.iter().map(|size| size.height).sum();
        let widest = sizes.iter().map(|size| size.width).max().unwrap_or(0);
        let horizontal_bar = self.horizontal_scroll && widest > content_width && viewport_height > 1;
        if horizontal_bar {
            viewport_height -= 1;
        }

        self.vertical.update_dimensions(content_height, viewport_height);
        if self.horizontal_scroll {
            self.horizontal.update_dimensions(widest.max(content_width), content_width);
        } else {
            self.horizontal.update_dimensions(content_width, content_width);
        }

        // Sticky top rows.
        let mut y = bounds.y;
        for (child, size) in &top_sizes {
            let (dx, child_width) = child_span(tree, *child, size.width, content_width);
            let rect = LayoutRect::new(bounds.x + dx, y, to_i32(child_width), to_i32(size.height));
            tree.paint(*child, buffer, rect, clip, colors);
            y += to_i32(size.height);
        }

        // Scrolling children, virtualized against the viewport.
        let viewport = LayoutRect::new(bounds.x, y, to_i32(content_width), to_i32(viewport_height));
        let viewport_clip = viewport.intersect(&clip);
        let offset = self.vertical.offset();
        let scrolled_width = self.horizontal.content();
        let left = bounds.x - to_i32(self.horizontal.offset());
        self.slots.clear();
        let mut top = 0usize;
        for (child, size) in flow.iter().zip(&sizes) {
            self.slots.push(ChildSlot {
                child: *child,
                top,
                height: size.height,
            });
            let outside = top + size.height <= offset || top >= offset + viewport_height;
            if !outside && !viewport_clip.is_empty() {
                let (dx, child_width) = child_span(tree, *child, size.width, scrolled_width);
                let rect = LayoutRect::new(
                    left + dx,
                    viewport.y + to_i32(top) - to_i32(offset),
                    to_i32(child_width),
                    to_i32(size.height),
                );
                tree.paint(*child, buffer, rect, viewport_clip, colors);
            }
            top += size.height;
        }

        let bar_colors = Self::scrollbar_colors(tree, colors.bg);
        let mut horizontal_track = None;
        if horizontal_bar {
            let track = LayoutRect::new(bounds.x, viewport.bottom(), to_i32(content_width), 1);
            if let Some(thumb) = ThumbGeometry::compute(
                self.horizontal.content(),
                self.horizontal.viewport(),
                self.horizontal.offset(),
                content_width,
            ) {
                paint_horizontal(buffer, &track, (thumb.offset, thumb.length), bar_colors, &clip);
            }
            horizontal_track = Some(track);
        }

        // Sticky bottom rows.
        let mut y = viewport.bottom() + i32::from(horizontal_bar);
        for (child, size) in &bottom_sizes {
            let (dx, child_width) = child_span(tree, *child, size.width, content_width);
            let rect = LayoutRect::new(bounds.x + dx, y, to_i32(child_width), to_i32(size.height));
            tree.paint(*child, buffer, rect, clip, colors);
            y += to_i32(size.height);
        }

        let mut vertical_track = None;
        if reserve && self.vertical.needs_scrollbar() {
            let track = LayoutRect::new(bounds.right() - 1, viewport.y, 1, to_i32(viewport_height));
            if let Some(thumb) = ThumbGeometry::compute(
                content_height,
                viewport_height,
                offset,
                viewport_height,
            ) {
                paint_vertical(buffer, &track, (thumb.offset, thumb.length), bar_colors, &clip);
            }
            vertical_track = Some(track);
        }

        let local = |rect: LayoutRect| rect.translate(-bounds.x, -bounds.y);
        self.layout = PanelLayout {
            viewport: local(viewport),
            vertical_track: vertical_track.map(local),
            horizontal_track: horizontal_track.map(local),
        };
        if vertical_track.is_none() {
            self.drag = None;
        }
    }

    fn as_focusable(&self) -> Option<&dyn Focusable> {
        Some(self)
    }

    fn as_focusable_mut(&mut self) -> Option<&mut dyn Focusable> {
        Some(self)
    }

    fn as_interactive(&mut self) -> Option<&mut dyn Interactive> {
        Some(self)
    }

    fn as_mouse_aware(&mut self) -> Option<&mut dyn MouseAware> {
        Some(self)
    }

    fn as_container(&self) -> Option<&dyn Container> {
        Some(self)
    }

    fn as_container_mut(&mut self) -> Option<&mut dyn Container> {
        Some(self)
    }

    fn as_focus_tracking(&mut self) -> Option<&mut dyn FocusTracking> {
        Some(self)
    }
}

/// Horizontal offset and width for a child per its alignment.
fn child_span(tree: &ControlTree, child: ControlId, desired: usize, available: usize) -> (i32, usize) {
    let alignment = tree
        .props(child)
        .map(|props| props.horizontal_alignment)
        .unwrap_or_default();
    align_horizontal(alignment, desired, available)
}

impl Container for ScrollablePanelControl {
    fn on_child_removed(&mut self, _tree: &mut ControlTree, _id: ControlId, child: ControlId) {
        self.slots.retain(|slot| slot.child != child);
    }
}

/// A panel with no focusable content still takes focus so the keyboard can scroll it.
impl Focusable for ScrollablePanelControl {
    fn on_focus_changed(
        &mut self,
        tree: &mut ControlTree,
        id: ControlId,
        _focused: bool,
        _reason: FocusReason,
    ) {
        tree.invalidate(id, InvalidationReason::State);
    }
}

impl FocusTracking for ScrollablePanelControl {
    fn on_child_focus_changed(
        &mut self,
        tree: &mut ControlTree,
        id: ControlId,
        child: ControlId,
        leaf: ControlId,
    ) {
        // Reveal the focused leaf itself when both were painted, else the whole child.
        let within = match (tree.painted_bounds(child), tree.painted_bounds(leaf)) {
            (Some(outer), Some(inner)) if child != leaf => {
                Some(((inner.y - outer.y).max(0) as usize, inner.size().height))
            }
            _ => None,
        };
        let changed = match within {
            Some((row, height)) => self.reveal(child, row, Some(height)),
            None => self.reveal(child, 0, None),
        };
        self.after_scroll(tree, id, changed);
    }
}

impl Interactive for ScrollablePanelControl {
    fn process_key(&mut self, tree: &mut ControlTree, id: ControlId, key: &KeyEvent) -> bool {
        use NavigationAction::*;

        let Some(action) = [PageUp, PageDown, MoveUp, MoveDown, Home, End, MoveLeft, MoveRight]
            .into_iter()
            .find(|action| tree.keymap().matches(key, *action))
        else {
            return false;
        };
        if matches!(action, PageUp | PageDown) {
            let changed = if action == PageUp {
                self.vertical.page_up()
            } else {
                self.vertical.page_down()
            };
            return self.after_scroll(tree, id, changed);
        }
        if tree.focused() != Some(id) {
            return false;
        }
        let changed = match action {
            MoveUp => self.vertical.scroll_by(-1),
            MoveDown => self.vertical.scroll_by(1),
            Home => self.vertical.scroll_to_top(),
            End => self.vertical.scroll_to_bottom(),
            MoveLeft if self.horizontal_scroll => self.horizontal.scroll_by(-1),
            MoveRight if self.horizontal_scroll => self.horizontal.scroll_by(1),
            _ => return false,
        };
        self.after_scroll(tree, id, changed);
        true
    }
}

impl MouseAware for ScrollablePanelControl {
    fn process_mouse(&mut self, tree: &mut ControlTree, id: ControlId, event: &mut MouseEvent) -> bool {
        if let Some(changed) = self.process_scrollbar_mouse(event) {
            self.after_scroll(tree, id, changed);
            return true;
        }
        if let Some(changed) = self.process_horizontal_bar_mouse(event) {
            self.after_scroll(tree, id, changed);
            return true;
        }
        if tree.dispatch_mouse_to_children(id, event) {
            return true;
        }
        let changed = match event.kind {
            MouseEventKind::WheelUp => self.vertical.scroll_by(-WHEEL_STEP),
            MouseEventKind::WheelDown => self.vertical.scroll_by(WHEEL_STEP),
            MouseEventKind::Pressed(_) => {
                let inside_focus = tree
                    .focused()
                    .is_some_and(|focused| tree.is_ancestor_or_self(id, focused));
                if self.layout.viewport.contains(event.position) && !inside_focus {
                    tree.set_focus(id, FocusReason::Mouse);
                }
                return false;
            }
            _ => return false,
        };
        self.after_scroll(tree, id, changed)
    }
}

#[cfg(test)]
mod tests {
    use super::ScrollablePanelControl;
    use crate::core::buffer::CharacterBuffer;
    use crate::core::geometry::Point;
    use crate::core::input::{KeyCode, KeyEvent, MouseButton, MouseEvent, MouseEventKind};
    use crate::core::style::{ColorPair, StickyPosition};
    use crate::runtime::control::FocusReason;
    use crate::runtime::tree::{ControlEvent, ControlId, ControlTree};
    use crate::widgets::button::ButtonControl;
    use crate::widgets::markup::MarkupControl;

    fn panel_with_lines(tree: &mut ControlTree, panel: ScrollablePanelControl, count: usize) -> (ControlId, Vec<ControlId>) {
        let id = tree.create(panel);
        let lines = (0..count)
            .map(|index| {
                let line = tree.create(MarkupControl::new(format!("line{index}")));
                tree.add_child(id, line).expect("attach");
                line
            })
            .collect();
        (id, lines)
    }

    fn paint(tree: &mut ControlTree, id: ControlId, width: usize, height: usize) -> CharacterBuffer {
        let mut buffer = CharacterBuffer::new(width, height);
        let screen = buffer.bounds();
        tree.begin_frame(screen);
        tree.paint(id, &mut buffer, screen, screen, ColorPair::default());
        buffer
    }

    fn offset(tree: &ControlTree, id: ControlId) -> usize {
        tree.get::<ScrollablePanelControl>(id)
            .map(|panel| panel.vertical_offset())
            .unwrap_or(usize::MAX)
    }

    #[test]
    fn overflowing_content_reserves_a_scrollbar_and_virtualizes() {
        let mut tree = ControlTree::default();
        let (id, lines) = panel_with_lines(&mut tree, ScrollablePanelControl::new(), 6);
        let buffer = paint(&mut tree, id, 8, 3);

        assert_eq!(buffer.to_plain_lines(), vec!["line0  █", "line1  █", "line2  │"]);
        assert!(tree.paint_record(lines[2]).is_some());
        assert!(tree.paint_record(lines[3]).is_none());
        let panel = tree.get::<ScrollablePanelControl>(id).expect("panel");
        assert_eq!((panel.content_height(), panel.viewport_height()), (6, 3));
    }

    #[test]
    fn scrolling_is_clamped_and_moves_children() {
        let mut tree = ControlTree::default();
        let (id, _) = panel_with_lines(&mut tree, ScrollablePanelControl::new().with_scrollbar(false), 6);
        paint(&mut tree, id, 8, 3);

        assert!(!ScrollablePanelControl::scroll_by(&mut tree, id, -1).expect("panel"));
        assert!(ScrollablePanelControl::scroll_by(&mut tree, id, 100).expect("panel"));
        assert_eq!(offset(&tree, id), 3);
        assert!(!ScrollablePanelControl::scroll_to_bottom(&mut tree, id).expect("panel"));

        let buffer = paint(&mut tree, id, 8, 3);
        assert_eq!(buffer.to_plain_lines(), vec!["line3   ", "line4   ", "line5   "]);
        assert_eq!(
            tree.drain_events(),
            vec![ControlEvent::Scrolled { id, vertical: 3, horizontal: 0 }]
        );
    }

    #[test]
    fn sticky_children_ignore_the_offset() {
        let mut tree = ControlTree::default();
        let (id, _) = panel_with_lines(&mut tree, ScrollablePanelControl::new().with_scrollbar(false), 5);
        let header = tree.create(MarkupControl::new("head"));
        tree.insert_child(id, 0, header).expect("attach");
        tree.set_sticky(header, StickyPosition::Top).expect("props");
        paint(&mut tree, id, 6, 3);

        ScrollablePanelControl::scroll_by(&mut tree, id, 2).expect("panel");
        let buffer = paint(&mut tree, id, 6, 3);
        assert_eq!(buffer.to_plain_lines(), vec!["head  ", "line2 ", "line3 "]);
    }

    #[test]
    fn wheel_scrolls_until_the_end_then_bubbles() {
        let mut tree = ControlTree::default();
        let (id, _) = panel_with_lines(&mut tree, ScrollablePanelControl::new(), 5);
        paint(&mut tree, id, 8, 3);

        let wheel = || MouseEvent::new(Point::new(0, 0), MouseEventKind::WheelDown);
        assert!(tree.process_mouse(id, &mut wheel()));
        assert_eq!(offset(&tree, id), 2);
        let mut last = wheel();
        assert!(!tree.process_mouse(id, &mut last));
        assert!(!last.handled);
    }

    #[test]
    fn track_clicks_page_and_thumb_drags() {
        let mut tree = ControlTree::default();
        let (id, _) = panel_with_lines(&mut tree, ScrollablePanelControl::new(), 20);
        paint(&mut tree, id, 10, 10);

        // Thumb is 5 rows at the top of a 10-row track in column 9.
        assert!(tree.process_mouse(id, &mut MouseEvent::press(9, 8)));
        assert_eq!(offset(&tree, id), 10);

        paint(&mut tree, id, 10, 10);
        assert!(tree.process_mouse(id, &mut MouseEvent::press(9, 6)));
        let mut drag = MouseEvent::new(Point::new(9, 1), MouseEventKind::Dragged(MouseButton::Left));
        assert!(tree.process_mouse(id, &mut drag));
        assert_eq!(offset(&tree, id), 0);
        let mut release = MouseEvent::new(Point::new(9, 1), MouseEventKind::Released(MouseButton::Left));
        assert!(tree.process_mouse(id, &mut release));
    }

    #[test]
    fn focusing_a_hidden_child_scrolls_it_into_view() {
        let mut tree = ControlTree::default();
        let (id, _) = panel_with_lines(&mut tree, ScrollablePanelControl::new(), 4);
        let button = tree.create(ButtonControl::new("go"));
        tree.add_child(id, button).expect("attach");
        paint(&mut tree, id, 10, 3);

        assert!(tree.set_focus(button, FocusReason::Programmatic));
        assert_eq!(offset(&tree, id), 2);
    }

    #[test]
    fn keyboard_scrolls_only_when_the_panel_holds_focus() {
        let mut tree = ControlTree::default();
        let (id, _) = panel_with_lines(&mut tree, ScrollablePanelControl::new(), 6);
        paint(&mut tree, id, 8, 3);

        let down = KeyEvent::plain(KeyCode::Down);
        assert!(!tree.process_key(id, &down));
        assert!(tree.set_focus(id, FocusReason::Programmatic));
        assert!(tree.process_key(id, &down));
        assert_eq!(offset(&tree, id), 1);
        assert!(tree.process_key(id, &KeyEvent::plain(KeyCode::End)));
        assert_eq!(offset(&tree, id), 3);
        assert!(tree.process_key(id, &KeyEvent::plain(KeyCode::PageUp)));
        assert_eq!(offset(&tree, id), 0);
    }

    #[test]
    fn auto_scroll_follows_new_content() {
        let mut tree = ControlTree::default();
        let (id, _) = panel_with_lines(&mut tree, ScrollablePanelControl::new().with_auto_scroll(true), 3);
        paint(&mut tree, id, 8, 3);
        assert_eq!(offset(&tree, id), 0);

        let extra = tree.create(MarkupControl::new("extra"));
        tree.add_child(id, extra).expect("attach");
        let buffer = paint(&mut tree, id, 8, 3);
        assert_eq!(offset(&tree, id), 1);
        assert_eq!(buffer.row_text(2), "extra  █");
    }

    #[test]
    fn horizontal_scroll_shifts_wide_children() {
        let mut tree = ControlTree::default();
        let id = tree.create(ScrollablePanelControl::new().with_horizontal_scroll(true));
        let wide = tree.create(MarkupControl::new("abcdefghij"));
        tree.add_child(id, wide).expect("attach");
        paint(&mut tree, id, 4, 2);

        assert!(ScrollablePanelControl::scroll_horizontally_by(&mut tree, id, 2).expect("panel"));
        let buffer = paint(&mut tree, id, 4, 2);
        assert_eq!(buffer.row_text(0), "cdef");
        assert_eq!(
            tree.painted_bounds(wide).map(|bounds| bounds.x),
            Some(-2)
        );
    }
}
