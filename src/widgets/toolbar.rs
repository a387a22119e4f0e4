//! Toolbar: items laid out left to right, optionally wrapping onto further rows.
//!
//! [`compute_row_layout`] is the only place item positions are decided. Measuring,
//! painting, hit-testing and arrow-key navigation all call it with the same inputs, so
//! they can never disagree about where an item is.

use crate::core::buffer::CharacterBuffer;
use crate::core::geometry::{to_i32, LayoutConstraints, LayoutRect, LayoutSize, Point, UNBOUNDED};
use crate::core::input::KeyEvent;
use crate::core::keybindings::NavigationAction;
use crate::core::style::ColorPair;
use crate::error::Result;
use crate::runtime::control::{Container, Control, FocusReason, Interactive};
use crate::runtime::tree::{ControlId, ControlTree, InvalidationReason};

/// Position of one item relative to the toolbar's content origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ItemSlot {
    pub x: usize,
    pub y: usize,
    pub width: usize,
    pub height: usize,
    pub row: usize,
}

impl ItemSlot {
    fn midpoint(&self) -> usize {
        self.x + self.width / 2
    }

    fn rect(&self) -> LayoutRect {
        LayoutRect::new(
            to_i32(self.x),
            to_i32(self.y),
            to_i32(self.width),
            to_i32(self.height),
        )
    }
}

/// Places items of the given sizes left to right with `spacing` columns between them.
///
/// With `wrap`, an item that would cross `available` starts a new row, unless it is the first
/// item on its row: an item wider than the toolbar keeps a row to itself and is clipped
/// rather than split. Each row is as tall as its tallest item.
pub fn compute_row_layout(
    sizes: &[LayoutSize],
    available: usize,
    spacing: usize,
    wrap: bool,
) -> Vec<ItemSlot> {
    let mut slots = Vec::with_capacity(sizes.len());
    let (mut x, mut y, mut row) = (0, 0, 0);
    let mut row_height = 0;
    let mut on_row = 0;
    for size in sizes {
        if wrap && on_row > 0 && x + size.width > available {
            y += row_height;
            row += 1;
            x = 0;
            row_height = 0;
            on_row = 0;
        }
        slots.push(ItemSlot {
            x,
            y,
            width: size.width,
            height: size.height,
            row,
        });
        x += size.width + spacing;
        row_height = row_height.max(size.height);
        on_row += 1;
    }
    slots
}

#[derive(Debug, Default)]
pub struct ToolbarControl {
    spacing: usize,
    wrap: bool,
    /// Content width of the last paint, used to lay out again for hit-testing and navigation.
    painted_width: Option<usize>,
}

impl ToolbarControl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_spacing(mut self, spacing: usize) -> Self {
        self.spacing = spacing;
        self
    }

    pub fn with_wrap(mut self, wrap: bool) -> Self {
        self.wrap = wrap;
        self
    }

    pub fn set_spacing(tree: &mut ControlTree, id: ControlId, spacing: usize) -> Result<()> {
        tree.get_mut::<Self>(id)?.spacing = spacing;
        tree.invalidate(id, InvalidationReason::Layout);
        Ok(())
    }

    pub fn set_wrap(tree: &mut ControlTree, id: ControlId, wrap: bool) -> Result<()> {
        tree.get_mut::<Self>(id)?.wrap = wrap;
        tree.invalidate(id, InvalidationReason::Layout);
        Ok(())
    }

    /// Item under `point` (local to the toolbar's content origin), per the last painted width.
    pub fn item_at(tree: &mut ControlTree, id: ControlId, point: Point) -> Result<Option<ControlId>> {
        tree.with_typed::<Self, _>(id, |toolbar, tree| {
            toolbar
                .current_layout(tree, id)
                .into_iter()
                .find(|(_, slot)| slot.rect().contains(point))
                .map(|(child, _)| child)
        })
    }

    /// Slots of the visible items for `available` columns. Measure, paint, hit-testing and
    /// navigation all go through here, so items always see the same constraints: the row
    /// width and no height limit.
    fn layout(&self, tree: &mut ControlTree, id: ControlId, available: usize) -> Vec<(ControlId, ItemSlot)> {
        let items = tree.visible_children(id);
        let sizes: Vec<LayoutSize> = items
            .iter()
            .map(|child| tree.measure(*child, LayoutConstraints::loose(available, UNBOUNDED)))
            .collect();
        items
            .into_iter()
            .zip(compute_row_layout(&sizes, available, self.spacing, self.wrap))
            .collect()
    }

    fn current_layout(&self, tree: &mut ControlTree, id: ControlId) -> Vec<(ControlId, ItemSlot)> {
        match self.painted_width {
            Some(width) => self.layout(tree, id, width),
            None => Vec::new(),
        }
    }

    /// Next focusable item in `direction` among `layout`, starting from `current`.
    fn horizontal_target(
        tree: &ControlTree,
        layout: &[(ControlId, ItemSlot)],
        current: usize,
        forward: bool,
    ) -> Option<ControlId> {
        let ordered: Box<dyn Iterator<Item = &(ControlId, ItemSlot)>> = if forward {
            Box::new(layout.iter().skip(current + 1))
        } else {
            Box::new(layout.iter().take(current).rev())
        };
        ordered
            .map(|(child, _)| *child)
            .find(|child| tree.can_focus(*child))
    }

    /// Focusable item on the adjacent row whose horizontal midpoint is closest to the
    /// current item's. Ties go to the leftmost item.
    fn vertical_target(
        tree: &ControlTree,
        layout: &[(ControlId, ItemSlot)],
        current: usize,
        down: bool,
    ) -> Option<ControlId> {
        let (_, slot) = layout.get(current)?;
        let row = if down {
            slot.row + 1
        } else {
            slot.row.checked_sub(1)?
        };
        let midpoint = slot.midpoint();
        layout
            .iter()
            .filter(|(child, candidate)| candidate.row == row && tree.can_focus(*child))
            .min_by_key(|(_, candidate)| candidate.midpoint().abs_diff(midpoint))
            .map(|(child, _)| *child)
    }
}

impl Control for ToolbarControl {
    fn measure(
        &mut self,
        tree: &mut ControlTree,
        id: ControlId,
        constraints: LayoutConstraints,
    ) -> LayoutSize {
        let slots = self.layout(tree, id, constraints.max_width);
        let width = slots.iter().map(|(_, slot)| slot.x + slot.width).max().unwrap_or(0);
        let height = slots.iter().map(|(_, slot)| slot.y + slot.height).max().unwrap_or(0);
        LayoutSize::new(width, height)
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
        let available = bounds.size().width;
        self.painted_width = Some(available);
        for (child, slot) in self.layout(tree, id, available) {
            let rect = slot.rect().translate(bounds.x, bounds.y);
            if !rect.intersects(&bounds) {
                continue;
            }
            tree.paint(child, buffer, rect, bounds.intersect(&clip), colors);
        }
    }

    fn as_interactive(&mut self) -> Option<&mut dyn Interactive> {
        Some(self)
    }

    fn as_container(&self) -> Option<&dyn Container> {
        Some(self)
    }

    fn as_container_mut(&mut self) -> Option<&mut dyn Container> {
        Some(self)
    }
}

impl Container for ToolbarControl {}

impl Interactive for ToolbarControl {
    fn process_key(&mut self, tree: &mut ControlTree, id: ControlId, key: &KeyEvent) -> bool {
        let keymap = tree.keymap();
        let action = [
            NavigationAction::MoveLeft,
            NavigationAction::MoveRight,
            NavigationAction::MoveUp,
            NavigationAction::MoveDown,
        ]
        .into_iter()
        .find(|action| keymap.matches(key, *action));
        let Some(action) = action else {
            return false;
        };
        let Some(focused) = tree.focused_child(id) else {
            return false;
        };
        let layout = self.current_layout(tree, id);
        let Some(current) = layout.iter().position(|(child, _)| *child == focused) else {
            return false;
        };
        let target = match action {
            NavigationAction::MoveLeft => Self::horizontal_target(tree, &layout, current, false),
            NavigationAction::MoveRight => Self::horizontal_target(tree, &layout, current, true),
            NavigationAction::MoveUp => Self::vertical_target(tree, &layout, current, false),
            _ => Self::vertical_target(tree, &layout, current, true),
        };
        let reason = match action {
            NavigationAction::MoveLeft | NavigationAction::MoveUp => FocusReason::ShiftTab,
            _ => FocusReason::Tab,
        };
        target.is_some_and(|target| tree.set_focus(target, reason))
    }
}
