//! Splitter: a one-column divider that resizes the grid columns on either side of it.
//!
//! Resizing gives the left column an explicit width and clears the right column's width, so
//! the grid recomputes the right side as "fill the rest" instead of accumulating rounding
//! drift across repeated drags.

use crate::core::buffer::{Cell, CharacterBuffer};
use crate::core::geometry::{LayoutConstraints, LayoutRect, LayoutSize};
use crate::core::input::{KeyEvent, MouseButton, MouseEvent, MouseEventKind};
use crate::core::keybindings::NavigationAction;
use crate::core::style::{Color, ColorPair};
use crate::core::theme::names;
use crate::error::{Result, ToolkitError};
use crate::runtime::control::{Control, FocusReason, Focusable, Interactive, MouseAware};
use crate::runtime::tree::{ControlEvent, ControlId, ControlTree, InvalidationReason};

pub const SPLITTER_GLYPH: char = '│';
/// Smallest width either side may shrink to, whatever the percentage says.
pub const MIN_COLUMN_WIDTH: usize = 5;
pub const DEFAULT_MIN_PERCENTAGE: usize = 10;
/// Columns moved by the large resize keys.
pub const LARGE_STEP: isize = 5;

/// Clamps a requested left width into `[lower, total - lower]` with
/// `lower = max(5, total * min_percentage / 100)`. When the range is empty the upper bound
/// wins.
pub fn clamp_split(total: usize, desired: usize, min_percentage: usize) -> usize {
    let lower = MIN_COLUMN_WIDTH.max(total * min_percentage / 100);
    let upper = total.saturating_sub(lower);
    desired.clamp(lower.min(upper), upper)
}

#[derive(Debug, Clone, Copy)]
struct DragAnchor {
    /// Absolute column where the drag started.
    origin_x: i32,
    start_width: usize,
}

#[derive(Debug)]
pub struct SplitterControl {
    min_percentage: usize,
    drag: Option<DragAnchor>,
}

impl Default for SplitterControl {
    fn default() -> Self {
        Self::new()
    }
}

impl SplitterControl {
    pub fn new() -> Self {
        Self {
            min_percentage: DEFAULT_MIN_PERCENTAGE,
            drag: None,
        }
    }

    /// Minimum share of the grid width, in percent, kept on each side.
    pub fn with_min_percentage(mut self, percentage: usize) -> Result<Self> {
        if percentage >= 50 {
            return Err(ToolkitError::InvalidArgument(format!(
                "splitter minimum percentage must be below 50, got {percentage}"
            )));
        }
        self.min_percentage = percentage;
        Ok(self)
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// Moves the split by `delta` columns. Returns whether the left width changed.
    pub fn move_by(tree: &mut ControlTree, id: ControlId, delta: isize) -> Result<bool> {
        let min_percentage = tree.get::<Self>(id)?.min_percentage;
        let Some((_, left, _)) = neighbours(tree, id) else {
            return Ok(false);
        };
        let target = offset_width(current_width(tree, left), delta);
        resize_left(tree, id, min_percentage, target)
    }

    /// Sets the left column to `width` columns (clamped).
    pub fn set_left_width(tree: &mut ControlTree, id: ControlId, width: usize) -> Result<bool> {
        let min_percentage = tree.get::<Self>(id)?.min_percentage;
        resize_left(tree, id, min_percentage, width)
    }
}

fn offset_width(width: usize, delta: isize) -> usize {
    if delta < 0 {
        width.saturating_sub(delta.unsigned_abs())
    } else {
        width.saturating_add(delta as usize)
    }
}

/// Grid plus the visible columns directly left and right of the splitter.
fn neighbours(tree: &ControlTree, id: ControlId) -> Option<(ControlId, ControlId, ControlId)> {
    let grid = tree.parent(id)?;
    let siblings = tree.visible_children(grid);
    let index = siblings.iter().position(|child| *child == id)?;
    let left = *siblings.get(index.checked_sub(1)?)?;
    let right = *siblings.get(index + 1)?;
    Some((grid, left, right))
}

fn current_width(tree: &ControlTree, column: ControlId) -> usize {
    tree.props(column)
        .and_then(|props| props.width)
        .or_else(|| tree.painted_bounds(column).map(|bounds| bounds.size().width))
        .unwrap_or(0)
}

fn resize_left(tree: &mut ControlTree, id: ControlId, min_percentage: usize, desired: usize) -> Result<bool> {
    let Some((grid, left, right)) = neighbours(tree, id) else {
        return Ok(false);
    };
    let Some(total) = tree.painted_bounds(grid).map(|bounds| bounds.size().width) else {
        return Ok(false);
    };
    let width = clamp_split(total, desired, min_percentage);
    let unchanged = tree.props(left).and_then(|props| props.width) == Some(width)
        && tree.props(right).and_then(|props| props.width).is_none();
    if unchanged {
        return Ok(false);
    }
    tree.set_width(left, Some(width))?;
    tree.set_width(right, None)?;
    tracing::debug!(target: "tape_widgets::splitter", id = id.raw(), total, desired, width, "splitter moved");
    tree.emit(ControlEvent::SplitterMoved {
        id,
        left_width: width,
    });
    Ok(true)
}

impl Control for SplitterControl {
    fn measure(
        &mut self,
        _tree: &mut ControlTree,
        _id: ControlId,
        _constraints: LayoutConstraints,
    ) -> LayoutSize {
        LayoutSize::new(1, 0)
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
        let fg = if tree.has_focus(id) || self.drag.is_some() {
            tree.color(names::SPLITTER_FOCUSED_FG, Color::CYAN)
        } else {
            tree.color(names::SPLITTER_FG, Color::GRAY)
        };
        for y in bounds.y..bounds.bottom() {
            buffer.set_cell_clipped(bounds.x, y, Cell::new(SPLITTER_GLYPH, fg, colors.bg), &clip);
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
}

impl Focusable for SplitterControl {
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

impl Interactive for SplitterControl {
    fn process_key(&mut self, tree: &mut ControlTree, id: ControlId, key: &KeyEvent) -> bool {
        let keymap = tree.keymap();
        let delta = if keymap.matches(key, NavigationAction::ResizeLeftLarge) {
            -LARGE_STEP
        } else if keymap.matches(key, NavigationAction::ResizeRightLarge) {
            LARGE_STEP
        } else if keymap.matches(key, NavigationAction::ResizeLeft) {
            -1
        } else if keymap.matches(key, NavigationAction::ResizeRight) {
            1
        } else {
            return false;
        };
        let Some((_, left, _)) = neighbours(tree, id) else {
            return false;
        };
        let target = offset_width(current_width(tree, left), delta);
        // Consumed even when clamped.
        let _ = resize_left(tree, id, self.min_percentage, target);
        true
    }
}

impl MouseAware for SplitterControl {
    fn process_mouse(&mut self, tree: &mut ControlTree, id: ControlId, event: &mut MouseEvent) -> bool {
        let Some(origin) = tree.content_origin(id) else {
            return false;
        };
        let absolute_x = origin.x + event.position.x;
        match event.kind {
            MouseEventKind::Pressed(MouseButton::Left) => {
                let Some((_, left, _)) = neighbours(tree, id) else {
                    return false;
                };
                self.drag = Some(DragAnchor {
                    origin_x: absolute_x,
                    start_width: current_width(tree, left),
                });
                tree.invalidate(id, InvalidationReason::State);
                true
            }
            MouseEventKind::Dragged(MouseButton::Left) => {
                let Some(anchor) = self.drag else {
                    return false;
                };
                let delta = (absolute_x - anchor.origin_x) as isize;
                let target = offset_width(anchor.start_width, delta);
                let _ = resize_left(tree, id, self.min_percentage, target);
                true
            }
            MouseEventKind::Released(_) if self.drag.is_some() => {
                self.drag = None;
                tree.invalidate(id, InvalidationReason::State);
                true
            }
            _ => false,
        }
    }
}
