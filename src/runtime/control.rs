//! Control contract and optional capability traits.
//!
//! Every control implements [`Control`] (measure then paint). Everything else is opt-in: a
//! control advertises a capability by overriding the matching `as_*` accessor, and the tree
//! dispatches by asking for the capability instead of by concrete type.
//!
//! Controls do not own their children. Children live in the [`ControlTree`] arena and a
//! control reaches them through the `tree` argument it is handed on every call.

use std::any::Any;
use std::time::Instant;

use crate::core::buffer::CharacterBuffer;
use crate::core::geometry::{to_i32, LayoutConstraints, LayoutRect, LayoutSize, Margin};
use crate::core::input::{KeyEvent, MouseEvent};
use crate::core::style::{
    Color, ColorPair, HorizontalAlignment, StickyPosition, VerticalAlignment,
};
use crate::error::Result;
use crate::runtime::tree::{ControlId, ControlTree};

/// Downcasting support, implemented for every `'static` type.
pub trait AsAny {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

pub trait Control: AsAny + 'static {
    fn type_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Desired content size within `constraints` (margins and explicit sizes are already
    /// applied by the tree). Must not change anything a user can see.
    fn measure(
        &mut self,
        tree: &mut ControlTree,
        id: ControlId,
        constraints: LayoutConstraints,
    ) -> LayoutSize;

    /// Paints into `bounds` (absolute buffer coordinates, margins already removed). Writes
    /// outside `clip` are forbidden; the buffer drops them regardless.
    fn paint(
        &mut self,
        tree: &mut ControlTree,
        id: ControlId,
        buffer: &mut CharacterBuffer,
        bounds: LayoutRect,
        clip: LayoutRect,
        colors: ColorPair,
    );

    /// Rejects explicit sizes the control cannot honor. Called before a size is stored.
    fn validate_size(&self, _width: Option<usize>, _height: Option<usize>) -> Result<()> {
        Ok(())
    }

    /// Releases external resources. Runs once, before the node leaves the tree.
    fn on_dispose(&mut self, _tree: &mut ControlTree, _id: ControlId) {}

    fn as_focusable(&self) -> Option<&dyn Focusable> {
        None
    }

    fn as_focusable_mut(&mut self) -> Option<&mut dyn Focusable> {
        None
    }

    fn as_interactive(&mut self) -> Option<&mut dyn Interactive> {
        None
    }

    fn as_mouse_aware(&mut self) -> Option<&mut dyn MouseAware> {
        None
    }

    fn as_container(&self) -> Option<&dyn Container> {
        None
    }

    fn as_container_mut(&mut self) -> Option<&mut dyn Container> {
        None
    }

    fn as_focus_tracking(&mut self) -> Option<&mut dyn FocusTracking> {
        None
    }

    fn as_tickable(&mut self) -> Option<&mut dyn Tickable> {
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FocusReason {
    Programmatic,
    Tab,
    ShiftTab,
    Mouse,
}

impl FocusReason {
    /// Backward navigation delegates to the last focusable child instead of the first.
    pub fn is_backward(self) -> bool {
        matches!(self, FocusReason::ShiftTab)
    }
}

pub trait Focusable {
    fn can_receive_focus(&self) -> bool {
        true
    }

    /// Called after the tree has updated the focus flag.
    fn on_focus_changed(
        &mut self,
        _tree: &mut ControlTree,
        _id: ControlId,
        _focused: bool,
        _reason: FocusReason,
    ) {
    }
}

pub trait Interactive {
    /// Returns `true` when the key was consumed.
    fn process_key(&mut self, tree: &mut ControlTree, id: ControlId, key: &KeyEvent) -> bool;
}

pub trait MouseAware {
    fn wants_mouse_events(&self) -> bool {
        true
    }

    /// `event.position` is relative to this control's content origin. Returns `true` when
    /// consumed; wheel events a control does not scroll with must return `false` so they
    /// bubble to the parent.
    fn process_mouse(&mut self, tree: &mut ControlTree, id: ControlId, event: &mut MouseEvent)
        -> bool;
}

/// A control that hosts children.
pub trait Container {
    /// A child was detached from this container (removed or reparented).
    fn on_child_removed(&mut self, _tree: &mut ControlTree, _id: ControlId, _child: ControlId) {}
}

/// Containers that react when focus moves somewhere beneath them.
pub trait FocusTracking {
    /// `child` is the direct child on the new focus path, `leaf` the focused control.
    fn on_child_focus_changed(
        &mut self,
        tree: &mut ControlTree,
        id: ControlId,
        child: ControlId,
        leaf: ControlId,
    );
}

/// Controls animated by host-granted ticks.
pub trait Tickable {
    /// Returns `true` when the control changed and needs repainting.
    fn on_tick(&mut self, tree: &mut ControlTree, id: ControlId, now: Instant) -> bool;
}

/// Layout properties every control carries. The tree owns them so containers can read a
/// child's properties without touching the child control itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlProps {
    pub horizontal_alignment: HorizontalAlignment,
    pub vertical_alignment: VerticalAlignment,
    pub margin: Margin,
    pub width: Option<usize>,
    pub height: Option<usize>,
    pub visible: bool,
    pub sticky: StickyPosition,
    pub foreground: Option<Color>,
    pub background: Option<Color>,
    pub name: Option<String>,
}

impl Default for ControlProps {
    fn default() -> Self {
        Self {
            horizontal_alignment: HorizontalAlignment::Left,
            vertical_alignment: VerticalAlignment::Top,
            margin: Margin::default(),
            width: None,
            height: None,
            visible: true,
            sticky: StickyPosition::None,
            foreground: None,
            background: None,
            name: None,
        }
    }
}

impl ControlProps {
    pub fn resolve_colors(&self, inherited: ColorPair) -> ColorPair {
        ColorPair::new(
            self.foreground.unwrap_or(inherited.fg),
            self.background.unwrap_or(inherited.bg),
        )
    }
}

/// Offset and width for a child of `desired` width inside `available` columns.
pub fn align_horizontal(
    alignment: HorizontalAlignment,
    desired: usize,
    available: usize,
) -> (i32, usize) {
    let width = desired.min(available);
    let slack = to_i32(available - width);
    match alignment {
        HorizontalAlignment::Left => (0, width),
        HorizontalAlignment::Center => (slack / 2, width),
        HorizontalAlignment::Right => (slack, width),
        HorizontalAlignment::Stretch => (0, available),
    }
}

/// Offset and height for a child of `desired` height inside `available` rows.
pub fn align_vertical(alignment: VerticalAlignment, desired: usize, available: usize) -> (i32, usize) {
    let height = desired.min(available);
    let slack = to_i32(available - height);
    match alignment {
        VerticalAlignment::Top => (0, height),
        VerticalAlignment::Center => (slack / 2, height),
        VerticalAlignment::Bottom => (slack, height),
        VerticalAlignment::Fill => (0, available),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn horizontal_alignment_places_within_slack() {
        assert_eq!(align_horizontal(HorizontalAlignment::Left, 4, 10), (0, 4));
        assert_eq!(align_horizontal(HorizontalAlignment::Center, 4, 10), (3, 4));
        assert_eq!(align_horizontal(HorizontalAlignment::Right, 4, 10), (6, 4));
        assert_eq!(align_horizontal(HorizontalAlignment::Stretch, 4, 10), (0, 10));
        assert_eq!(align_horizontal(HorizontalAlignment::Right, 14, 10), (0, 10));
    }

    #[test]
    fn vertical_fill_takes_everything() {
        assert_eq!(align_vertical(VerticalAlignment::Fill, 1, 5), (0, 5));
        assert_eq!(align_vertical(VerticalAlignment::Bottom, 2, 5), (3, 2));
    }

    #[test]
    fn own_colors_override_inherited() {
        let props = ControlProps {
            background: Some(Color::BLUE),
            ..ControlProps::default()
        };
        let colors = props.resolve_colors(ColorPair::new(Color::WHITE, Color::BLACK));
        assert_eq!(colors, ColorPair::new(Color::WHITE, Color::BLUE));
    }
}
