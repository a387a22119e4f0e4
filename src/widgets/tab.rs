//! Tab control: a header row of titles over one visible page.
//!
//! Pages are ordinary children. Switching tabs only toggles their visibility, so a page
//! keeps its scroll position, focus memory and any other state while hidden.

use crate::core::buffer::{Cell, CharacterBuffer};
use crate::core::geometry::{to_i32, LayoutConstraints, LayoutRect, LayoutSize};
use crate::core::input::{KeyEvent, MouseButton, MouseEvent, MouseEventKind};
use crate::core::keybindings::NavigationAction;
use crate::core::style::{Color, ColorPair};
use crate::core::text::width::visible_width;
use crate::core::theme::names;
use crate::error::{Result, ToolkitError};
use crate::runtime::control::{
    Container, Control, FocusReason, Focusable, Interactive, MouseAware,
};
use crate::runtime::tree::{ControlEvent, ControlId, ControlTree, InvalidationReason};

/// Header row plus at least one content row.
pub const MIN_TAB_HEIGHT: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
struct TabPage {
    title: String,
    content: ControlId,
}

#[derive(Debug, Default)]
pub struct TabControl {
    pages: Vec<TabPage>,
    active: Option<usize>,
}

impl TabControl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tab_count(&self) -> usize {
        self.pages.len()
    }

    pub fn active_index(&self) -> Option<usize> {
        self.active
    }

    pub fn active_content(&self) -> Option<ControlId> {
        self.active
            .and_then(|index| self.pages.get(index))
            .map(|page| page.content)
    }

    pub fn title(&self, index: usize) -> Option<&str> {
        self.pages.get(index).map(|page| page.title.as_str())
    }

    /// Appends a page. The first page becomes active; later pages start hidden.
    pub fn add_tab(
        tree: &mut ControlTree,
        id: ControlId,
        title: impl Into<String>,
        content: ControlId,
    ) -> Result<usize> {
        tree.get::<Self>(id)?;
        tree.add_child(id, content)?;
        let first = tree.get::<Self>(id)?.pages.is_empty();
        tree.set_visible(content, first)?;
        let tab = tree.get_mut::<Self>(id)?;
        tab.pages.push(TabPage {
            title: title.into(),
            content,
        });
        let index = tab.pages.len() - 1;
        if first {
            tab.active = Some(index);
            tree.emit(ControlEvent::TabChanged {
                id,
                previous: None,
                current: index,
            });
        }
        tree.invalidate(id, InvalidationReason::Layout);
        Ok(index)
    }

    pub fn set_active_tab(tree: &mut ControlTree, id: ControlId, index: usize) -> Result<()> {
        tree.with_typed::<Self, _>(id, |tab, tree| tab.activate(tree, id, index))?
    }

    pub fn set_title(
        tree: &mut ControlTree,
        id: ControlId,
        index: usize,
        title: impl Into<String>,
    ) -> Result<()> {
        let tab = tree.get_mut::<Self>(id)?;
        let count = tab.pages.len();
        let page = tab
            .pages
            .get_mut(index)
            .ok_or(ToolkitError::TabIndexOutOfRange { index, count })?;
        page.title = title.into();
        tree.invalidate(id, InvalidationReason::Property);
        Ok(())
    }

    /// Removes and disposes the page at `index`. The next page (or the new last one) becomes
    /// active when the active page is removed.
    pub fn remove_tab(tree: &mut ControlTree, id: ControlId, index: usize) -> Result<()> {
        let tab = tree.get::<Self>(id)?;
        let count = tab.pages.len();
        let content = tab
            .pages
            .get(index)
            .map(|page| page.content)
            .ok_or(ToolkitError::TabIndexOutOfRange { index, count })?;
        // Disposal detaches the page, which reaches `on_child_removed` below.
        tree.dispose(content);
        Ok(())
    }

    fn activate(&mut self, tree: &mut ControlTree, id: ControlId, index: usize) -> Result<()> {
        let count = self.pages.len();
        let Some(page) = self.pages.get(index) else {
            return Err(ToolkitError::TabIndexOutOfRange { index, count });
        };
        if self.active == Some(index) {
            return Ok(());
        }
        let content = page.content;
        let had_focus = tree.has_focus(id);
        let previous = self.active;
        let old = self.active_content();
        tree.set_visible(content, true)?;
        self.active = Some(index);
        // Focus moves before the old page is hidden so the tab and its ancestors stay on
        // the focus path throughout.
        let moved = had_focus && tree.set_focus(content, FocusReason::Programmatic);
        if let Some(old) = old {
            tree.set_visible(old, false)?;
        }
        if had_focus && !moved {
            tree.set_focus(id, FocusReason::Programmatic);
        }
        tracing::debug!(target: "tape_widgets::tab", id = id.raw(), ?previous, current = index, "tab changed");
        tree.emit(ControlEvent::TabChanged {
            id,
            previous,
            current: index,
        });
        tree.invalidate(id, InvalidationReason::State);
        Ok(())
    }

    fn step(&mut self, tree: &mut ControlTree, id: ControlId, forward: bool) -> bool {
        let count = self.pages.len();
        if count < 2 {
            return false;
        }
        let current = self.active.unwrap_or(0);
        let next = if forward {
            (current + 1) % count
        } else {
            (current + count - 1) % count
        };
        self.activate(tree, id, next).is_ok()
    }

    /// `(x, width)` of every header, relative to the control's left edge.
    fn header_spans(&self) -> Vec<(usize, usize)> {
        let mut x = 0;
        self.pages
            .iter()
            .map(|page| {
                let width = visible_width(&page.title) + 2;
                let span = (x, width);
                x += width;
                span
            })
            .collect()
    }

    fn header_at(&self, x: i32) -> Option<usize> {
        let x = usize::try_from(x).ok()?;
        self.header_spans()
            .iter()
            .position(|(start, width)| x >= *start && x < start + width)
    }
}

impl Control for TabControl {
    fn measure(
        &mut self,
        tree: &mut ControlTree,
        _id: ControlId,
        constraints: LayoutConstraints,
    ) -> LayoutSize {
        let headers: usize = self.header_spans().iter().map(|(_, width)| width).sum();
        let content = self
            .active_content()
            .map(|content| tree.measure(content, constraints.deflate(0, 1)))
            .unwrap_or(LayoutSize::ZERO);
        LayoutSize::new(headers.max(content.width), content.height + 1)
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
        let header = ColorPair::new(
            tree.color(names::TAB_HEADER_FG, Color::WHITE),
            tree.color(names::TAB_HEADER_BG, Color::BLUE),
        );
        let active = if tree.has_focus(id) {
            ColorPair::new(
                tree.color(names::BUTTON_FOCUSED_FG, Color::BLACK),
                tree.color(names::BUTTON_FOCUSED_BG, Color::CYAN),
            )
        } else {
            ColorPair::new(
                tree.color(names::TAB_ACTIVE_FG, Color::BLACK),
                tree.color(names::TAB_ACTIVE_BG, Color::WHITE),
            )
        };
        let row = LayoutRect::new(bounds.x, bounds.y, bounds.width, 1);
        let row_clip = row.intersect(&clip);
        buffer.fill_rect(&row_clip, Cell::blank(header));
        for (index, (page, (x, _))) in self.pages.iter().zip(self.header_spans()).enumerate() {
            let pair = if self.active == Some(index) { active } else { header };
            let label = format!(" {} ", page.title);
            buffer.write_str_clipped(bounds.x + to_i32(x), bounds.y, &label, pair, &row_clip);
        }

        if let Some(content) = self.active_content() {
            let body = LayoutRect::new(bounds.x, bounds.y + 1, bounds.width, bounds.height - 1);
            tree.paint(content, buffer, body, clip, colors);
        }
    }

    fn validate_size(&self, _width: Option<usize>, height: Option<usize>) -> Result<()> {
        match height {
            Some(requested) if requested < MIN_TAB_HEIGHT => Err(ToolkitError::InvalidHeight {
                control: "TabControl",
                minimum: MIN_TAB_HEIGHT,
                requested,
            }),
            _ => Ok(()),
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
}

impl Container for TabControl {
    fn on_child_removed(&mut self, tree: &mut ControlTree, id: ControlId, child: ControlId) {
        let Some(index) = self.pages.iter().position(|page| page.content == child) else {
            return;
        };
        self.pages.remove(index);
        let previous = self.active;
        self.active = match self.active {
            _ if self.pages.is_empty() => None,
            Some(active) if active == index => Some(index.min(self.pages.len() - 1)),
            Some(active) if active > index => Some(active - 1),
            other => other,
        };
        if previous == Some(index) {
            if let Some(content) = self.active_content() {
                if let Err(error) = tree.set_visible(content, true) {
                    tracing::warn!(target: "tape_widgets::tab", id = id.raw(), %error, "could not show the next tab page");
                }
            }
            if let Some(current) = self.active {
                tree.emit(ControlEvent::TabChanged {
                    id,
                    previous: None,
                    current,
                });
            }
        }
        tree.invalidate(id, InvalidationReason::Layout);
    }
}

impl Focusable for TabControl {
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

impl Interactive for TabControl {
    fn process_key(&mut self, tree: &mut ControlTree, id: ControlId, key: &KeyEvent) -> bool {
        let keymap = tree.keymap();
        let forward = if keymap.matches(key, NavigationAction::NextTab) {
            true
        } else if keymap.matches(key, NavigationAction::PreviousTab) {
            false
        } else if tree.focused() == Some(id) && keymap.matches(key, NavigationAction::MoveRight) {
            true
        } else if tree.focused() == Some(id) && keymap.matches(key, NavigationAction::MoveLeft) {
            false
        } else {
            return false;
        };
        self.step(tree, id, forward)
    }
}

impl MouseAware for TabControl {
    fn process_mouse(&mut self, tree: &mut ControlTree, id: ControlId, event: &mut MouseEvent) -> bool {
        if event.position.y != 0 {
            return tree.dispatch_mouse_to_children(id, event);
        }
        if event.kind != MouseEventKind::Pressed(MouseButton::Left) {
            return !event.kind.is_wheel();
        }
        let Some(index) = self.header_at(event.position.x) else {
            return true;
        };
        if let Err(error) = self.activate(tree, id, index) {
            tracing::warn!(target: "tape_widgets::tab", id = id.raw(), %error, "tab switch failed");
        }
        if !tree.has_focus(id) {
            tree.set_focus(id, FocusReason::Mouse);
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::TabControl;
    use crate::core::buffer::CharacterBuffer;
    use crate::core::input::{KeyCode, KeyEvent, KeyModifiers, MouseEvent};
    use crate::core::style::ColorPair;
    use crate::error::ToolkitError;
    use crate::runtime::control::FocusReason;
    use crate::runtime::tree::{ControlEvent, ControlId, ControlTree};
    use crate::widgets::button::ButtonControl;
    use crate::widgets::markup::MarkupControl;
    use crate::widgets::panel::PanelControl;

    fn two_tabs(tree: &mut ControlTree) -> (ControlId, ControlId, ControlId) {
        let tab = tree.create(TabControl::new());
        let a = tree.create(ButtonControl::new("A"));
        let b = tree.create(ButtonControl::new("B"));
        TabControl::add_tab(tree, tab, "One", a).expect("tab");
        TabControl::add_tab(tree, tab, "Two", b).expect("tab");
        tree.drain_events();
        (tab, a, b)
    }

    fn active(tree: &ControlTree, tab: ControlId) -> Option<usize> {
        tree.get::<TabControl>(tab).ok().and_then(|tab| tab.active_index())
    }

    #[test]
    fn height_below_two_is_rejected() {
        let mut tree = ControlTree::default();
        let tab = tree.create(TabControl::new());
        assert_eq!(
            tree.set_height(tab, Some(1)),
            Err(ToolkitError::InvalidHeight {
                control: "TabControl",
                minimum: 2,
                requested: 1,
            })
        );
        assert_eq!(tree.props(tab).and_then(|props| props.height), None);
        assert!(tree.set_height(tab, Some(2)).is_ok());
    }

    #[test]
    fn only_the_active_page_is_visible() {
        let mut tree = ControlTree::default();
        let (tab, a, b) = two_tabs(&mut tree);
        assert!(tree.is_visible(a));
        assert!(!tree.is_visible(b));

        TabControl::set_active_tab(&mut tree, tab, 1).expect("switch");
        assert!(!tree.is_visible(a));
        assert!(tree.is_visible(b));
        assert_eq!(
            tree.drain_events(),
            vec![ControlEvent::TabChanged { id: tab, previous: Some(0), current: 1 }]
        );
        assert_eq!(
            TabControl::set_active_tab(&mut tree, tab, 5),
            Err(ToolkitError::TabIndexOutOfRange { index: 5, count: 2 })
        );
    }

    #[test]
    fn focus_follows_into_the_new_page() {
        let mut tree = ControlTree::default();
        let (tab, a, b) = two_tabs(&mut tree);
        assert!(tree.set_focus(tab, FocusReason::Tab));
        assert_eq!(tree.focused(), Some(a));

        let next = KeyEvent::new(KeyCode::PageDown, KeyModifiers::CTRL);
        assert!(tree.process_key(tab, &next));
        assert_eq!(tree.focused(), Some(b));
        assert!(tree.has_focus(tab));
        assert_eq!(active(&tree, tab), Some(1));

        assert!(tree.process_key(tab, &next));
        assert_eq!(active(&tree, tab), Some(0));
        assert_eq!(tree.focused(), Some(a));
    }

    #[test]
    fn switching_pages_keeps_the_tab_on_the_focus_path() {
        let mut tree = ControlTree::default();
        let root = tree.create(PanelControl::new());
        let (tab, a, b) = two_tabs(&mut tree);
        tree.add_child(root, tab).expect("attach");
        assert!(tree.set_focus(a, FocusReason::Programmatic));
        tree.drain_events();

        let next = KeyEvent::new(KeyCode::PageDown, KeyModifiers::CTRL);
        assert!(tree.process_key(root, &next));
        assert_eq!(
            tree.drain_events(),
            vec![
                ControlEvent::LostFocus { id: a },
                ControlEvent::GotFocus { id: b, reason: FocusReason::Programmatic },
                ControlEvent::TabChanged { id: tab, previous: Some(0), current: 1 },
            ]
        );
        assert!(tree.has_focus(tab) && tree.has_focus(root));
    }

    #[test]
    fn header_clicks_switch_tabs() {
        let mut tree = ControlTree::default();
        let (tab, _, _) = two_tabs(&mut tree);
        let mut buffer = CharacterBuffer::new(12, 3);
        let screen = buffer.bounds();
        tree.paint(tab, &mut buffer, screen, screen, ColorPair::default());
        assert_eq!(buffer.row_text(0), " One  Two   ");

        assert!(tree.process_mouse(tab, &mut MouseEvent::press(6, 0)));
        assert_eq!(active(&tree, tab), Some(1));
        assert!(tree.process_mouse(tab, &mut MouseEvent::press(0, 0)));
        assert_eq!(active(&tree, tab), Some(0));
    }

    #[test]
    fn removing_the_active_tab_activates_its_neighbour() {
        let mut tree = ControlTree::default();
        let (tab, a, b) = two_tabs(&mut tree);
        let c = tree.create(MarkupControl::new("c"));
        TabControl::add_tab(&mut tree, tab, "Three", c).expect("tab");
        TabControl::set_active_tab(&mut tree, tab, 1).expect("switch");
        tree.drain_events();

        TabControl::remove_tab(&mut tree, tab, 1).expect("remove");
        assert!(!tree.contains(b));
        assert_eq!(active(&tree, tab), Some(1));
        assert!(tree.is_visible(c));
        assert!(tree
            .drain_events()
            .contains(&ControlEvent::TabChanged { id: tab, previous: None, current: 1 }));
        assert!(!tree.is_visible(a));

        TabControl::remove_tab(&mut tree, tab, 0).expect("remove");
        assert_eq!(active(&tree, tab), Some(0));
        assert_eq!(tree.get::<TabControl>(tab).map(|tab| tab.tab_count()), Ok(1));
    }
}
