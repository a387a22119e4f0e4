//! Vertical stacking shared by panels and columns.

use crate::core::buffer::CharacterBuffer;
use crate::core::geometry::{to_i32, LayoutConstraints, LayoutRect, LayoutSize};
use crate::core::style::{ColorPair, VerticalAlignment};
use crate::runtime::control::{align_horizontal, align_vertical};
use crate::runtime::tree::{ControlId, ControlTree};

/// Children stacked top to bottom: widest child and summed heights.
pub(crate) fn measure_stack(
    tree: &mut ControlTree,
    id: ControlId,
    constraints: LayoutConstraints,
) -> LayoutSize {
    let mut width = 0;
    let mut height = 0usize;
    for child in tree.visible_children(id) {
        let remaining = if constraints.has_bounded_height() {
            constraints.max_height.saturating_sub(height)
        } else {
            constraints.max_height
        };
        let size = tree.measure(child, LayoutConstraints::loose(constraints.max_width, remaining));
        width = width.max(size.width);
        height += size.height;
    }
    LayoutSize::new(width, height)
}

/// Paints children top to bottom inside `bounds`, each aligned horizontally per its own
/// properties. Rows left over go to `Fill` children (earlier ones absorb the remainder);
/// without any, the first `Center` or `Bottom` child moves itself and everything after it
/// down by the slack. Children below the bottom edge are skipped.
pub(crate) fn paint_stack(
    tree: &mut ControlTree,
    id: ControlId,
    buffer: &mut CharacterBuffer,
    bounds: LayoutRect,
    clip: LayoutRect,
    colors: ColorPair,
) {
    let available = bounds.size();
    let children = tree.visible_children(id);
    let mut slack = available.height;
    let mut sizes = Vec::with_capacity(children.len());
    for child in &children {
        let size = tree.measure(*child, LayoutConstraints::loose(available.width, slack));
        slack = slack.saturating_sub(size.height);
        sizes.push(size);
    }
    let alignments: Vec<_> = children
        .iter()
        .map(|child| {
            tree.props(*child)
                .map(|props| (props.horizontal_alignment, props.vertical_alignment))
                .unwrap_or_default()
        })
        .collect();
    let fills = alignments
        .iter()
        .filter(|(_, vertical)| *vertical == VerticalAlignment::Fill)
        .count();
    let (share, mut extra) = if fills == 0 {
        (0, 0)
    } else {
        (slack / fills, slack % fills)
    };
    let used = available.height - slack;

    let mut shifted = fills > 0;
    let mut y = bounds.y;
    for ((child, size), (horizontal, vertical)) in children.iter().zip(sizes).zip(alignments) {
        let mut height = size.height;
        match vertical {
            VerticalAlignment::Fill => {
                let bonus = usize::from(extra > 0);
                extra -= bonus;
                height += share + bonus;
            }
            VerticalAlignment::Top => {}
            other if !shifted => {
                shifted = true;
                y += align_vertical(other, used, available.height).0;
            }
            _ => {}
        }
        if y >= bounds.bottom() {
            break;
        }
        let (dx, width) = align_horizontal(horizontal, size.width, available.width);
        let rect = LayoutRect::new(bounds.x + dx, y, to_i32(width), to_i32(height));
        tree.paint(*child, buffer, rect, clip, colors);
        y += to_i32(height);
    }
}
