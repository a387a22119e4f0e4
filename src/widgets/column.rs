//! Column: one vertical lane of a [`HorizontalGridControl`](super::grid::HorizontalGridControl).
//!
//! The grid decides the column's width (explicit or flex); the column stacks its children
//! top to bottom inside it.

use crate::core::buffer::CharacterBuffer;
use crate::core::geometry::{LayoutConstraints, LayoutRect, LayoutSize};
use crate::core::style::ColorPair;
use crate::runtime::control::{Container, Control};
use crate::runtime::tree::{ControlId, ControlTree};
use crate::widgets::stack::{measure_stack, paint_stack};

#[derive(Debug, Default)]
pub struct ColumnControl;

impl ColumnControl {
    pub fn new() -> Self {
        Self
    }
}

impl Control for ColumnControl {
    fn measure(
        &mut self,
        tree: &mut ControlTree,
        id: ControlId,
        constraints: LayoutConstraints,
    ) -> LayoutSize {
        measure_stack(tree, id, constraints)
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
        paint_stack(tree, id, buffer, bounds, clip, colors);
    }

    fn as_container(&self) -> Option<&dyn Container> {
        Some(self)
    }

    fn as_container_mut(&mut self) -> Option<&mut dyn Container> {
        Some(self)
    }
}

impl Container for ColumnControl {}

#[cfg(test)]
mod tests {
    use super::ColumnControl;
    use crate::core::buffer::CharacterBuffer;
    use crate::core::geometry::{LayoutConstraints, LayoutRect, LayoutSize};
    use crate::core::style::{ColorPair, HorizontalAlignment, VerticalAlignment};
    use crate::runtime::tree::ControlTree;
    use crate::widgets::markup::MarkupControl;

    #[test]
    fn stacks_children_and_honors_alignment() {
        let mut tree = ControlTree::default();
        let column = tree.create(ColumnControl::new());
        let left = tree.create(MarkupControl::new("ab"));
        let right = tree.create(MarkupControl::new("cd"));
        tree.add_child(column, left).expect("attach");
        tree.add_child(column, right).expect("attach");
        tree.set_alignment(right, HorizontalAlignment::Right, VerticalAlignment::Top)
            .expect("props");

        assert_eq!(
            tree.measure(column, LayoutConstraints::loose(10, 10)),
            LayoutSize::new(2, 2)
        );

        let mut buffer = CharacterBuffer::new(6, 2);
        let screen = buffer.bounds();
        tree.paint(column, &mut buffer, screen, screen, ColorPair::default());
        assert_eq!(buffer.to_plain_lines(), vec!["ab    ", "    cd"]);
    }

    #[test]
    fn bottom_and_center_children_take_the_slack() {
        let mut tree = ControlTree::default();
        let column = tree.create(ColumnControl::new());
        let top = tree.create(MarkupControl::new("a"));
        let bottom = tree.create(MarkupControl::new("b"));
        tree.add_child(column, top).expect("attach");
        tree.add_child(column, bottom).expect("attach");
        tree.set_alignment(bottom, HorizontalAlignment::Left, VerticalAlignment::Bottom)
            .expect("props");

        let mut buffer = CharacterBuffer::new(2, 4);
        let screen = buffer.bounds();
        tree.paint(column, &mut buffer, screen, screen, ColorPair::default());
        assert_eq!(buffer.to_plain_lines(), vec!["a ", "  ", "  ", "b "]);

        tree.set_alignment(top, HorizontalAlignment::Left, VerticalAlignment::Center)
            .expect("props");
        let mut buffer = CharacterBuffer::new(2, 4);
        tree.paint(column, &mut buffer, screen, screen, ColorPair::default());
        assert_eq!(buffer.to_plain_lines(), vec!["  ", "a ", "b ", "  "]);
    }

    #[test]
    fn fill_children_share_the_leftover_rows() {
        let mut tree = ControlTree::default();
        let column = tree.create(ColumnControl::new());
        let first = tree.create(MarkupControl::new("a"));
        let middle = tree.create(MarkupControl::new("b"));
        let last = tree.create(MarkupControl::new("c"));
        for child in [first, middle, last] {
            tree.add_child(column, child).expect("attach");
        }
        for child in [first, last] {
            tree.set_alignment(child, HorizontalAlignment::Left, VerticalAlignment::Fill)
                .expect("props");
        }

        let mut buffer = CharacterBuffer::new(2, 8);
        let screen = buffer.bounds();
        tree.begin_frame(screen);
        tree.paint(column, &mut buffer, screen, screen, ColorPair::default());
        // Five spare rows: the earlier fill child takes the odd one.
        assert_eq!(tree.painted_bounds(first), Some(LayoutRect::new(0, 0, 1, 4)));
        assert_eq!(tree.painted_bounds(middle), Some(LayoutRect::new(0, 4, 1, 1)));
        assert_eq!(tree.painted_bounds(last), Some(LayoutRect::new(0, 5, 1, 3)));
    }

    #[test]
    fn hidden_children_take_no_space() {
        let mut tree = ControlTree::default();
        let column = tree.create(ColumnControl::new());
        let a = tree.create(MarkupControl::new("a"));
        let b = tree.create(MarkupControl::new("b"));
        tree.add_child(column, a).expect("attach");
        tree.add_child(column, b).expect("attach");
        tree.set_visible(a, false).expect("props");

        let mut buffer = CharacterBuffer::new(2, 2);
        let screen = buffer.bounds();
        tree.paint(column, &mut buffer, screen, screen, ColorPair::default());
        assert_eq!(buffer.to_plain_lines(), vec!["b ", "  "]);
    }
}
