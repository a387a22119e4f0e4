//! Horizontal grid: columns and splitters laid out left to right.
//!
//! Columns with an explicit width get it first, splitters take one column each, and the
//! remaining width is shared between flex columns (earlier columns absorb the remainder).

use crate::core::buffer::CharacterBuffer;
use crate::core::geometry::{to_i32, LayoutConstraints, LayoutRect, LayoutSize, UNBOUNDED};
use crate::core::input::{MouseEvent, MouseEventKind};
use crate::core::style::ColorPair;
use crate::runtime::control::{align_vertical, Container, Control, MouseAware};
use crate::runtime::tree::{ControlId, ControlTree};
use crate::widgets::column::ColumnControl;
use crate::widgets::splitter::SplitterControl;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnWidth {
    Fixed(usize),
    Flex,
}

/// `(x, width)` for every entry, given `available` columns.
pub fn compute_column_layout(widths: &[ColumnWidth], available: usize) -> Vec<(usize, usize)> {
    let fixed: usize = widths
        .iter()
        .map(|width| match width {
            ColumnWidth::Fixed(width) => *width,
            ColumnWidth::Flex => 0,
        })
        .sum();
    let flex_count = widths
        .iter()
        .filter(|width| **width == ColumnWidth::Flex)
        .count();
    let remaining = available.saturating_sub(fixed);
    let (share, mut extra) = if flex_count == 0 {
        (0, 0)
    } else {
        (remaining / flex_count, remaining % flex_count)
    };

    let mut x = 0;
    widths
        .iter()
        .map(|width| {
            let width = match width {
                ColumnWidth::Fixed(width) => *width,
                ColumnWidth::Flex => {
                    let bonus = usize::from(extra > 0);
                    extra -= bonus;
                    share + bonus
                }
            };
            let slot = (x, width);
            x += width;
            slot
        })
        .collect()
}

#[derive(Debug, Default)]
pub struct HorizontalGridControl {
    /// Splitter receiving drag events until the button is released.
    captured: Option<ControlId>,
}

impl HorizontalGridControl {
    pub fn new() -> Self {
        Self::default()
    }

    fn widths(tree: &ControlTree, children: &[ControlId]) -> Vec<ColumnWidth> {
        children
            .iter()
            .map(|child| {
                if tree.get::<SplitterControl>(*child).is_ok() {
                    ColumnWidth::Fixed(1)
                } else {
                    match tree.props(*child).and_then(|props| props.width) {
                        Some(width) => ColumnWidth::Fixed(width + margin_width(tree, *child)),
                        None => ColumnWidth::Flex,
                    }
                }
            })
            .collect()
    }
}

/// Columns and splitters always span the grid's full height.
fn is_lane(tree: &ControlTree, child: ControlId) -> bool {
    tree.get::<ColumnControl>(child).is_ok() || tree.get::<SplitterControl>(child).is_ok()
}

fn margin_width(tree: &ControlTree, child: ControlId) -> usize {
    tree.props(child)
        .map(|props| props.margin.horizontal())
        .unwrap_or(0)
}

impl Control for HorizontalGridControl {
    fn measure(
        &mut self,
        tree: &mut ControlTree,
        id: ControlId,
        constraints: LayoutConstraints,
    ) -> LayoutSize {
        let children = tree.visible_children(id);
        let widths = Self::widths(tree, &children);
        let available = if constraints.has_bounded_width() {
            constraints.max_width
        } else {
            // Unbounded: flex columns take their natural width.
            children
                .iter()
                .zip(&widths)
                .map(|(child, width)| match width {
                    ColumnWidth::Fixed(width) => *width,
                    ColumnWidth::Flex => tree.measure(*child, constraints).width,
                })
                .sum()
        };
        let layout = compute_column_layout(&widths, available);
        let height = children
            .iter()
            .zip(&layout)
            .map(|(child, (_, width))| {
                tree.measure(*child, LayoutConstraints::loose(*width, constraints.max_height))
                    .height
            })
            .max()
            .unwrap_or(0);
        LayoutSize::new(available, height)
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
        let children = tree.visible_children(id);
        let widths = Self::widths(tree, &children);
        let layout = compute_column_layout(&widths, bounds.size().width);
        let rows = bounds.size().height;
        for (child, (x, width)) in children.iter().zip(layout) {
            let x = bounds.x + to_i32(x);
            let rect = if is_lane(tree, *child) {
                // Columns are measured so nested layout caches see the final width.
                tree.measure(*child, LayoutConstraints::new(width, width, 0, UNBOUNDED));
                LayoutRect::new(x, bounds.y, to_i32(width), bounds.height)
            } else {
                let size = tree.measure(*child, LayoutConstraints::new(width, width, 0, rows));
                let alignment = tree
                    .props(*child)
                    .map(|props| props.vertical_alignment)
                    .unwrap_or_default();
                let (dy, height) = align_vertical(alignment, size.height, rows);
                LayoutRect::new(x, bounds.y + dy, to_i32(width), to_i32(height))
            };
            tree.paint(*child, buffer, rect, clip, colors);
        }
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
}

impl Container for HorizontalGridControl {
    fn on_child_removed(&mut self, _tree: &mut ControlTree, _id: ControlId, child: ControlId) {
        if self.captured == Some(child) {
            self.captured = None;
        }
    }
}

impl MouseAware for HorizontalGridControl {
    fn process_mouse(&mut self, tree: &mut ControlTree, id: ControlId, event: &mut MouseEvent) -> bool {
        if let Some(splitter) = self.captured {
            if matches!(event.kind, MouseEventKind::Dragged(_) | MouseEventKind::Released(_)) {
                if matches!(event.kind, MouseEventKind::Released(_)) {
                    self.captured = None;
                }
                let (Some(origin), Some(child_origin)) =
                    (tree.content_origin(id), tree.content_origin(splitter))
                else {
                    return false;
                };
                let mut local = event.translated(child_origin.offset(-origin.x, -origin.y));
                return tree.process_mouse(splitter, &mut local);
            }
        }
        let handled = tree.dispatch_mouse_to_children(id, event);
        if event.kind.is_press() {
            self.captured = tree
                .hovered_child(id)
                .filter(|child| tree.get::<SplitterControl>(*child).is_ok_and(|s| s.is_dragging()));
        }
        handled
    }
}
