//! Button: a focusable, clickable leaf.

use crate::core::buffer::{Cell, CharacterBuffer};
use crate::core::geometry::{to_i32, LayoutConstraints, LayoutRect, LayoutSize};
use crate::core::input::{KeyEvent, MouseButton, MouseEvent, MouseEventKind};
use crate::core::keybindings::NavigationAction;
use crate::core::style::{Color, ColorPair};
use crate::core::text::width::{fit_plain, visible_width};
use crate::core::theme::names;
use crate::error::Result;
use crate::runtime::control::{Control, FocusReason, Focusable, Interactive, MouseAware};
use crate::runtime::mouse::{ClickKind, DoubleClickDetector};
use crate::runtime::tree::{ControlEvent, ControlId, ControlTree, InvalidationReason};

pub type ClickHandler = Box<dyn FnMut(&mut ControlTree, ControlId)>;

pub struct ButtonControl {
    label: String,
    enabled: bool,
    on_click: Option<ClickHandler>,
    on_double_click: Option<ClickHandler>,
    clicks: DoubleClickDetector,
}

impl ButtonControl {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            enabled: true,
            on_click: None,
            on_double_click: None,
            clicks: DoubleClickDetector::new(),
        }
    }

    pub fn on_click(mut self, handler: impl FnMut(&mut ControlTree, ControlId) + 'static) -> Self {
        self.on_click = Some(Box::new(handler));
        self
    }

    pub fn on_double_click(
        mut self,
        handler: impl FnMut(&mut ControlTree, ControlId) + 'static,
    ) -> Self {
        self.on_double_click = Some(Box::new(handler));
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_label(tree: &mut ControlTree, id: ControlId, label: impl Into<String>) -> Result<()> {
        tree.get_mut::<Self>(id)?.label = label.into();
        tree.invalidate(id, InvalidationReason::Layout);
        Ok(())
    }

    /// Disabling a focused button moves nothing; it just stops accepting new focus.
    pub fn set_enabled(tree: &mut ControlTree, id: ControlId, enabled: bool) -> Result<()> {
        tree.get_mut::<Self>(id)?.enabled = enabled;
        tree.invalidate(id, InvalidationReason::State);
        Ok(())
    }

    fn click(&mut self, tree: &mut ControlTree, id: ControlId) {
        if !self.enabled {
            return;
        }
        tree.emit(ControlEvent::Clicked { id });
        if let Some(handler) = self.on_click.as_mut() {
            handler(tree, id);
        }
    }

    fn double_click(&mut self, tree: &mut ControlTree, id: ControlId) {
        if !self.enabled {
            return;
        }
        tree.emit(ControlEvent::DoubleClicked { id });
        if let Some(handler) = self.on_double_click.as_mut() {
            handler(tree, id);
        }
    }

    fn caption(&self) -> String {
        format!("[ {} ]", self.label)
    }
}

impl Control for ButtonControl {
    fn measure(
        &mut self,
        _tree: &mut ControlTree,
        _id: ControlId,
        _constraints: LayoutConstraints,
    ) -> LayoutSize {
        LayoutSize::new(visible_width(&self.caption()), 1)
    }

    fn paint(
        &mut self,
        tree: &mut ControlTree,
        id: ControlId,
        buffer: &mut CharacterBuffer,
        bounds: LayoutRect,
        clip: LayoutRect,
        _colors: ColorPair,
    ) {
        let colors = if !self.enabled {
            ColorPair::new(
                tree.color(names::BUTTON_DISABLED_FG, Color::GRAY),
                tree.color(names::BUTTON_BG, Color::BLUE),
            )
        } else if tree.has_focus(id) {
            ColorPair::new(
                tree.color(names::BUTTON_FOCUSED_FG, Color::BLACK),
                tree.color(names::BUTTON_FOCUSED_BG, Color::CYAN),
            )
        } else {
            ColorPair::new(
                tree.color(names::BUTTON_FG, Color::WHITE),
                tree.color(names::BUTTON_BG, Color::BLUE),
            )
        };
        let caption = self.caption();
        let width = bounds.size().width;
        let text = if visible_width(&caption) > width {
            fit_plain(&self.label, width)
        } else {
            caption
        };
        let pad = width.saturating_sub(visible_width(&text)) / 2;
        let row = LayoutRect::new(bounds.x, bounds.y, bounds.width, 1).intersect(&clip);
        buffer.fill_rect(&row, Cell::blank(colors));
        buffer.write_str_clipped(bounds.x + to_i32(pad), bounds.y, &text, colors, &clip);
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

impl Focusable for ButtonControl {
    fn can_receive_focus(&self) -> bool {
        self.enabled
    }

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

impl Interactive for ButtonControl {
    fn process_key(&mut self, tree: &mut ControlTree, id: ControlId, key: &KeyEvent) -> bool {
        if !tree.keymap().matches(key, NavigationAction::Activate) {
            return false;
        }
        self.click(tree, id);
        true
    }
}

impl MouseAware for ButtonControl {
    fn process_mouse(&mut self, tree: &mut ControlTree, id: ControlId, event: &mut MouseEvent) -> bool {
        if !matches!(
            event.kind,
            MouseEventKind::Pressed(MouseButton::Left) | MouseEventKind::DoubleClicked(MouseButton::Left)
        ) {
            return matches!(event.kind, MouseEventKind::Released(_));
        }
        let threshold = tree.config().double_click_threshold;
        match self.clicks.classify(event, tree.input_time(), threshold) {
            Some(ClickKind::Double) => self.double_click(tree, id),
            Some(ClickKind::Single) => self.click(tree, id),
            None => {}
        }
        true
    }
}
