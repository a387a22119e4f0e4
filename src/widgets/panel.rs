//! Panel: a container that stacks its children vertically, optionally inside a border.

use crate::core::buffer::CharacterBuffer;
use crate::core::geometry::{LayoutConstraints, LayoutRect, LayoutSize, Margin};
use crate::core::style::{BorderStyle, Color, ColorPair};
use crate::core::theme::names;
use crate::error::Result;
use crate::render::border::draw_border;
use crate::runtime::control::{Container, Control, FocusTracking};
use crate::runtime::tree::{ControlId, ControlTree, InvalidationReason};
use crate::widgets::stack::{measure_stack, paint_stack};

#[derive(Default)]
pub struct PanelControl {
    border: Option<BorderStyle>,
    title: Option<String>,
    padding: Margin,
}

impl PanelControl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bordered(style: BorderStyle) -> Self {
        Self {
            border: Some(style),
            ..Self::default()
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_padding(mut self, padding: Margin) -> Self {
        self.padding = padding;
        self
    }

    pub fn set_border(tree: &mut ControlTree, id: ControlId, border: Option<BorderStyle>) -> Result<()> {
        tree.get_mut::<Self>(id)?.border = border;
        tree.invalidate(id, InvalidationReason::Layout);
        Ok(())
    }

    pub fn set_title(tree: &mut ControlTree, id: ControlId, title: Option<String>) -> Result<()> {
        tree.get_mut::<Self>(id)?.title = title;
        tree.invalidate(id, InvalidationReason::Property);
        Ok(())
    }

    fn chrome(&self) -> Margin {
        let border = usize::from(self.border.is_some());
        Margin::new(
            self.padding.left + border,
            self.padding.top + border,
            self.padding.right + border,
            self.padding.bottom + border,
        )
    }
}

impl Control for PanelControl {
    fn measure(
        &mut self,
        tree: &mut ControlTree,
        id: ControlId,
        constraints: LayoutConstraints,
    ) -> LayoutSize {
        let chrome = self.chrome();
        let inner = constraints.deflate(chrome.horizontal(), chrome.vertical());
        let content = measure_stack(tree, id, inner);
        LayoutSize::new(
            content.width + chrome.horizontal(),
            content.height + chrome.vertical(),
        )
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
        if let Some(style) = self.border {
            let fg = if tree.has_focus(id) {
                tree.color(names::BORDER_FOCUSED_FG, Color::CYAN)
            } else {
                tree.color(names::BORDER_FG, Color::GRAY)
            };
            draw_border(
                buffer,
                &bounds,
                style,
                ColorPair::new(fg, colors.bg),
                &clip,
                self.title.as_deref(),
            );
        }
        let inner = bounds.deflate(self.chrome());
        let inner_clip = inner.intersect(&clip);
        if inner_clip.is_empty() {
            return;
        }
        paint_stack(tree, id, buffer, inner, inner_clip, colors);
    }

    fn as_container(&self) -> Option<&dyn Container> {
        Some(self)
    }

    fn as_container_mut(&mut self) -> Option<&mut dyn Container> {
        Some(self)
    }

    fn as_focus_tracking(&mut self) -> Option<&mut dyn FocusTracking> {
        self.border.is_some().then_some(self as &mut dyn FocusTracking)
    }
}

impl Container for PanelControl {}

impl FocusTracking for PanelControl {
    /// Focus entering or leaving repaints the highlighted border.
    fn on_child_focus_changed(
        &mut self,
        tree: &mut ControlTree,
        id: ControlId,
        _child: ControlId,
        _leaf: ControlId,
    ) {
        tree.invalidate(id, InvalidationReason::State);
    }
}

/// Convenience: a panel holding `children` in order.
pub fn panel_with(tree: &mut ControlTree, panel: PanelControl, children: &[ControlId]) -> Result<ControlId> {
    let id = tree.create(panel);
    for child in children {
        tree.add_child(id, *child)?;
    }
    Ok(id)
}
