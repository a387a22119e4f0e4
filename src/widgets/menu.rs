//! Menu bar with dropdown and submenu portals.
//!
//! The bar is an ordinary control. Each open dropdown level is a portal that reads the
//! bar's state through the tree and sends its mouse and key input back to the bar. The bar
//! owns the open-level stack; a level closed by the bar itself is flagged first so the
//! portal's dismissal callback does not call back into it.

use std::cell::{Cell as FlagCell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};
use std::time::Instant;

use crate::core::buffer::{Cell, CharacterBuffer};
use crate::core::geometry::{to_i32, LayoutConstraints, LayoutRect, LayoutSize, Point};
use crate::core::input::{KeyEvent, MouseButton, MouseEvent, MouseEventKind};
use crate::core::keybindings::{NavigationAction, NavigationKeymap};
use crate::core::style::{BorderStyle, Color, ColorPair};
use crate::core::text::width::{fit_plain, pad_to_width, visible_width};
use crate::core::theme::names;
use crate::error::Result;
use crate::runtime::control::{Control, FocusReason, Focusable, Interactive, MouseAware};
use crate::runtime::portal::{place_within, PortalContent, PortalId};
use crate::runtime::tree::{ControlEvent, ControlId, ControlTree, InvalidationReason};

const SUBMENU_MARKER: &str = "►";
const SEPARATOR_GLYPH: char = '─';

pub type MenuAction = Box<dyn FnMut(&mut ControlTree, ControlId)>;

struct MenuItemNode {
    text: String,
    shortcut: Option<String>,
    enabled: bool,
    separator: bool,
    parent: Weak<RefCell<MenuItemNode>>,
    children: Vec<MenuItem>,
    action: Option<MenuAction>,
}

/// Shared handle to a menu entry. Parents own their children; the parent link is weak.
#[derive(Clone)]
pub struct MenuItem(Rc<RefCell<MenuItemNode>>);

impl fmt::Debug for MenuItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let node = self.0.borrow();
        f.debug_struct("MenuItem")
            .field("text", &node.text)
            .field("enabled", &node.enabled)
            .field("separator", &node.separator)
            .field("children", &node.children.len())
            .finish()
    }
}

impl MenuItem {
    pub fn new(text: impl Into<String>) -> Self {
        Self(Rc::new(RefCell::new(MenuItemNode {
            text: text.into(),
            shortcut: None,
            enabled: true,
            separator: false,
            parent: Weak::new(),
            children: Vec::new(),
            action: None,
        })))
    }

    pub fn separator() -> Self {
        let item = Self::new("");
        item.0.borrow_mut().separator = true;
        item
    }

    /// Display-only shortcut label.
    pub fn with_shortcut(self, shortcut: impl Into<String>) -> Self {
        self.0.borrow_mut().shortcut = Some(shortcut.into());
        self
    }

    pub fn with_enabled(self, enabled: bool) -> Self {
        self.set_enabled(enabled);
        self
    }

    pub fn on_activate(self, action: impl FnMut(&mut ControlTree, ControlId) + 'static) -> Self {
        self.0.borrow_mut().action = Some(Box::new(action));
        self
    }

    pub fn with_child(self, child: MenuItem) -> Self {
        self.add_child(child);
        self
    }

    /// Appends `child`, detaching it from any previous parent.
    pub fn add_child(&self, child: MenuItem) {
        if let Some(previous) = child.parent() {
            previous
                .0
                .borrow_mut()
                .children
                .retain(|existing| !existing.ptr_eq(&child));
        }
        child.0.borrow_mut().parent = Rc::downgrade(&self.0);
        self.0.borrow_mut().children.push(child);
    }

    pub fn ptr_eq(&self, other: &MenuItem) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub fn text(&self) -> String {
        self.0.borrow().text.clone()
    }

    pub fn set_text(&self, text: impl Into<String>) {
        self.0.borrow_mut().text = text.into();
    }

    pub fn shortcut(&self) -> Option<String> {
        self.0.borrow().shortcut.clone()
    }

    pub fn is_enabled(&self) -> bool {
        self.0.borrow().enabled
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.0.borrow_mut().enabled = enabled;
    }

    pub fn is_separator(&self) -> bool {
        self.0.borrow().separator
    }

    pub fn has_children(&self) -> bool {
        !self.0.borrow().children.is_empty()
    }

    pub fn children(&self) -> Vec<MenuItem> {
        self.0.borrow().children.clone()
    }

    pub fn parent(&self) -> Option<MenuItem> {
        self.0.borrow().parent.upgrade().map(MenuItem)
    }

    /// Texts from the top-level item down to this one.
    pub fn path(&self) -> Vec<String> {
        let mut path = vec![self.text()];
        let mut current = self.parent();
        while let Some(item) = current {
            path.push(item.text());
            current = item.parent();
        }
        path.reverse();
        path
    }

    fn is_selectable(&self) -> bool {
        let node = self.0.borrow();
        node.enabled && !node.separator
    }

    /// Runs the action with the item unborrowed, so the action may edit the menu.
    fn fire(&self, tree: &mut ControlTree, menu: ControlId) {
        let action = self.0.borrow_mut().action.take();
        if let Some(mut action) = action {
            action(tree, menu);
            let mut node = self.0.borrow_mut();
            if node.action.is_none() {
                node.action = Some(action);
            }
        }
    }

    /// Shortcut label, or the submenu marker for items with children.
    fn trailing(&self) -> Option<String> {
        if self.has_children() {
            Some(SUBMENU_MARKER.to_string())
        } else {
            self.shortcut()
        }
    }

    fn label_width(&self) -> usize {
        let text = visible_width(&self.text());
        match self.trailing() {
            Some(trailing) => text + 2 + visible_width(&trailing),
            None => text,
        }
    }
}

/// Outer size of a dropdown listing `items`, border included.
fn dropdown_size(items: &[MenuItem]) -> LayoutSize {
    let inner = items.iter().map(MenuItem::label_width).max().unwrap_or(0) + 2;
    LayoutSize::new(inner + 2, items.len() + 2)
}

/// Submenu bounds next to row `index` of `parent`: to the right, or flipped to the left
/// when the right side would leave the screen.
pub(crate) fn submenu_bounds(
    parent: LayoutRect,
    index: usize,
    size: LayoutSize,
    screen: LayoutRect,
) -> LayoutRect {
    let width = to_i32(size.width);
    let x = if parent.right() + width > screen.right() {
        parent.x - width
    } else {
        parent.right()
    };
    place_within(Point::new(x, parent.y + to_i32(index)), size, screen)
}

fn row_text(item: &MenuItem, width: usize) -> String {
    if item.is_separator() {
        return SEPARATOR_GLYPH.to_string().repeat(width);
    }
    let inner = width.saturating_sub(2);
    let text = item.text();
    let line = match item.trailing() {
        Some(trailing) => {
            let room = inner.saturating_sub(visible_width(&trailing) + 2);
            let text = pad_to_width(&fit_plain(&text, room), room);
            format!("{text}  {trailing}")
        }
        None => fit_plain(&text, inner),
    };
    format!(" {} ", pad_to_width(&line, inner))
}

fn step_selection(items: &[MenuItem], from: Option<usize>, forward: bool) -> Option<usize> {
    let len = items.len();
    if len == 0 {
        return None;
    }
    let mut index = from.unwrap_or(if forward { len - 1 } else { 0 });
    for _ in 0..len {
        index = if forward {
            (index + 1) % len
        } else {
            (index + len - 1) % len
        };
        if items[index].is_selectable() {
            return Some(index);
        }
    }
    None
}

const MENU_ACTIONS: [NavigationAction; 7] = [
    NavigationAction::MoveUp,
    NavigationAction::MoveDown,
    NavigationAction::MoveLeft,
    NavigationAction::MoveRight,
    NavigationAction::Activate,
    NavigationAction::Cancel,
    NavigationAction::FocusNext,
];

fn menu_action(keymap: &NavigationKeymap, key: &KeyEvent) -> Option<NavigationAction> {
    if keymap.matches(key, NavigationAction::FocusPrevious) {
        return Some(NavigationAction::FocusPrevious);
    }
    MENU_ACTIONS
        .into_iter()
        .find(|action| keymap.matches(key, *action))
}

struct OpenLevel {
    portal: PortalId,
    items: Vec<MenuItem>,
    selected: Option<usize>,
    bounds: LayoutRect,
    /// Set before the bar dismisses the portal itself.
    closing: Rc<FlagCell<bool>>,
}

#[derive(Default)]
pub struct MenuControl {
    items: Vec<MenuItem>,
    highlighted: usize,
    open_header: Option<usize>,
    levels: Vec<OpenLevel>,
    /// Header whose dropdown an outside press closed, and when. A press on that same header
    /// in the same input event must not reopen it.
    last_dismissed: Option<(usize, Instant)>,
}

impl MenuControl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_item(mut self, item: MenuItem) -> Self {
        self.items.push(item);
        self
    }

    pub fn add_item(tree: &mut ControlTree, id: ControlId, item: MenuItem) -> Result<()> {
        tree.get_mut::<Self>(id)?.items.push(item);
        tree.invalidate(id, InvalidationReason::Layout);
        Ok(())
    }

    pub fn items(&self) -> &[MenuItem] {
        &self.items
    }

    pub fn is_open(&self) -> bool {
        !self.levels.is_empty()
    }

    pub fn open_header(&self) -> Option<usize> {
        self.open_header
    }

    pub fn open_depth(&self) -> usize {
        self.levels.len()
    }

    pub fn selected_item(&self, level: usize) -> Option<MenuItem> {
        let open = self.levels.get(level)?;
        open.items.get(open.selected?).cloned()
    }

    /// Opens the dropdown of header `index`. Requires a painted menu bar.
    pub fn open(tree: &mut ControlTree, id: ControlId, index: usize) -> Result<bool> {
        tree.with_typed::<Self, _>(id, |menu, tree| menu.open_dropdown(tree, id, index))
    }

    pub fn close(tree: &mut ControlTree, id: ControlId) -> Result<()> {
        tree.with_typed::<Self, _>(id, |menu, tree| menu.close_from(tree, id, 0))
    }

    /// `(x, width)` of every header, relative to the bar.
    fn header_spans(&self) -> Vec<(usize, usize)> {
        let mut x = 0;
        self.items
            .iter()
            .map(|item| {
                let width = visible_width(&item.text()) + 2;
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

    fn show_level(
        &mut self,
        tree: &mut ControlTree,
        id: ControlId,
        items: Vec<MenuItem>,
        bounds: LayoutRect,
    ) {
        let closing = Rc::new(FlagCell::new(false));
        let portal = tree.show_portal(MenuPortalContent {
            menu: id,
            level: self.levels.len(),
            bounds,
            closing: Rc::clone(&closing),
        });
        let selected = step_selection(&items, None, true);
        self.levels.push(OpenLevel {
            portal,
            items,
            selected,
            bounds,
            closing,
        });
    }

    fn open_dropdown(&mut self, tree: &mut ControlTree, id: ControlId, index: usize) -> bool {
        let Some(item) = self.items.get(index).cloned() else {
            return false;
        };
        self.close_from(tree, id, 0);
        self.highlighted = index;
        if !item.has_children() {
            return self.activate(tree, id, &item);
        }
        let Some(origin) = tree.content_origin(id) else {
            return false;
        };
        let x = self
            .header_spans()
            .get(index)
            .map_or(0, |(x, _)| to_i32(*x));
        let items = item.children();
        let bounds = place_within(
            origin.offset(x, 1),
            dropdown_size(&items),
            tree.screen(),
        );
        self.show_level(tree, id, items, bounds);
        self.open_header = Some(index);
        tracing::debug!(target: "tape_widgets::menu", id = id.raw(), header = index, "dropdown opened");
        tree.invalidate(id, InvalidationReason::State);
        true
    }

    fn open_submenu(&mut self, tree: &mut ControlTree, id: ControlId, level: usize, index: usize) -> bool {
        self.close_from(tree, id, level + 1);
        let Some(open) = self.levels.get(level) else {
            return false;
        };
        let Some(item) = open.items.get(index) else {
            return false;
        };
        if !item.has_children() || !item.is_enabled() {
            return false;
        }
        let items = item.children();
        let bounds = submenu_bounds(open.bounds, index, dropdown_size(&items), tree.screen());
        self.show_level(tree, id, items, bounds);
        true
    }

    /// Closes `level` and everything above it.
    fn close_from(&mut self, tree: &mut ControlTree, id: ControlId, level: usize) {
        if level >= self.levels.len() {
            return;
        }
        let closed = self.levels.split_off(level);
        for open in closed.into_iter().rev() {
            open.closing.set(true);
            tree.dismiss_portal(open.portal);
        }
        if level == 0 {
            self.open_header = None;
        }
        tree.invalidate(id, InvalidationReason::State);
    }

    /// A level's portal went away without the bar asking (outside press).
    fn level_dismissed(&mut self, tree: &mut ControlTree, id: ControlId, level: usize) {
        if level >= self.levels.len() {
            return;
        }
        if level == 0 {
            if let Some(header) = self.open_header {
                self.last_dismissed = Some((header, tree.input_time()));
            }
        }
        self.close_from(tree, id, level);
    }

    fn activate(&mut self, tree: &mut ControlTree, id: ControlId, item: &MenuItem) -> bool {
        if !item.is_selectable() || item.has_children() {
            return false;
        }
        let path = item.path();
        self.close_from(tree, id, 0);
        tracing::debug!(target: "tape_widgets::menu", id = id.raw(), path = ?path, "menu item activated");
        tree.emit(ControlEvent::MenuItemActivated { menu: id, path });
        item.fire(tree, id);
        true
    }

    fn select(&mut self, tree: &mut ControlTree, id: ControlId, level: usize, index: Option<usize>) {
        if let Some(open) = self.levels.get_mut(level) {
            if open.selected != index {
                open.selected = index;
                tree.invalidate(id, InvalidationReason::State);
            }
        }
    }

    fn switch_header(&mut self, tree: &mut ControlTree, id: ControlId, forward: bool) -> bool {
        let count = self.items.len();
        if count == 0 {
            return false;
        }
        let current = self.open_header.unwrap_or(self.highlighted);
        let next = if forward {
            (current + 1) % count
        } else {
            (current + count - 1) % count
        };
        if self.is_open() {
            self.open_dropdown(tree, id, next)
        } else {
            self.highlighted = next;
            tree.invalidate(id, InvalidationReason::State);
            true
        }
    }

    fn process_dropdown_key(
        &mut self,
        tree: &mut ControlTree,
        id: ControlId,
        level: usize,
        key: &KeyEvent,
    ) -> bool {
        // Only the deepest level answers keys.
        if level + 1 != self.levels.len() {
            return false;
        }
        let Some(action) = menu_action(tree.keymap(), key) else {
            return false;
        };
        let (items, selected) = match self.levels.get(level) {
            Some(open) => (open.items.clone(), open.selected),
            None => return false,
        };
        let current = selected.and_then(|index| items.get(index).cloned());
        match action {
            NavigationAction::MoveDown | NavigationAction::MoveUp => {
                let forward = action == NavigationAction::MoveDown;
                let next = step_selection(&items, selected, forward);
                self.select(tree, id, level, next);
                true
            }
            NavigationAction::MoveRight => {
                match (current, selected) {
                    (Some(item), Some(index)) if item.has_children() => {
                        self.open_submenu(tree, id, level, index);
                    }
                    _ => {
                        self.switch_header(tree, id, true);
                    }
                }
                true
            }
            NavigationAction::MoveLeft => {
                if level > 0 {
                    self.close_from(tree, id, level);
                } else {
                    self.switch_header(tree, id, false);
                }
                true
            }
            NavigationAction::Activate => {
                if let (Some(item), Some(index)) = (current, selected) {
                    if item.has_children() {
                        self.open_submenu(tree, id, level, index);
                    } else {
                        self.activate(tree, id, &item);
                    }
                }
                true
            }
            NavigationAction::Cancel => {
                self.close_from(tree, id, level);
                true
            }
            // Tab closes the menu and keeps moving focus.
            _ => {
                self.close_from(tree, id, 0);
                false
            }
        }
    }

    fn process_dropdown_mouse(
        &mut self,
        tree: &mut ControlTree,
        id: ControlId,
        level: usize,
        event: &MouseEvent,
    ) -> bool {
        let Some(open) = self.levels.get(level) else {
            return false;
        };
        let width = open.bounds.size().width.saturating_sub(2);
        let row = usize::try_from(event.position.y).ok();
        let column_ok = usize::try_from(event.position.x).is_ok_and(|x| x < width);
        let hit = row
            .filter(|_| column_ok)
            .and_then(|row| open.items.get(row).cloned().map(|item| (row, item)));
        let Some((index, item)) = hit else {
            return true;
        };
        if !item.is_selectable() {
            return true;
        }
        match event.kind {
            MouseEventKind::Moved => {
                if open.selected != Some(index) {
                    self.select(tree, id, level, Some(index));
                    if item.has_children() {
                        self.open_submenu(tree, id, level, index);
                    } else {
                        self.close_from(tree, id, level + 1);
                    }
                }
            }
            MouseEventKind::Pressed(MouseButton::Left) => {
                self.select(tree, id, level, Some(index));
                if item.has_children() {
                    self.open_submenu(tree, id, level, index);
                } else {
                    self.activate(tree, id, &item);
                }
            }
            _ => {}
        }
        true
    }
}

impl Control for MenuControl {
    fn measure(
        &mut self,
        _tree: &mut ControlTree,
        _id: ControlId,
        constraints: LayoutConstraints,
    ) -> LayoutSize {
        let natural: usize = self.header_spans().iter().map(|(_, width)| width).sum();
        let width = if constraints.has_bounded_width() {
            constraints.max_width
        } else {
            natural
        };
        LayoutSize::new(width, 1)
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
        let normal = ColorPair::new(
            tree.color(names::MENU_FG, Color::BLACK),
            tree.color(names::MENU_BG, Color::WHITE),
        );
        let selected = ColorPair::new(
            tree.color(names::MENU_SELECTED_FG, Color::WHITE),
            tree.color(names::MENU_SELECTED_BG, Color::BLUE),
        );
        let row = LayoutRect::new(bounds.x, bounds.y, bounds.width, 1).intersect(&clip);
        buffer.fill_rect(&row, Cell::blank(normal));
        let focused = tree.has_focus(id);
        for (index, (item, (x, _))) in self.items.iter().zip(self.header_spans()).enumerate() {
            let active = self.open_header == Some(index)
                || (focused && self.open_header.is_none() && self.highlighted == index);
            let colors = if active { selected } else { normal };
            let label = format!(" {} ", item.text());
            buffer.write_str_clipped(bounds.x + to_i32(x), bounds.y, &label, colors, &clip);
        }
    }

    fn on_dispose(&mut self, tree: &mut ControlTree, id: ControlId) {
        self.close_from(tree, id, 0);
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

impl Focusable for MenuControl {
    fn can_receive_focus(&self) -> bool {
        !self.items.is_empty()
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

impl Interactive for MenuControl {
    fn process_key(&mut self, tree: &mut ControlTree, id: ControlId, key: &KeyEvent) -> bool {
        let Some(action) = menu_action(tree.keymap(), key) else {
            return false;
        };
        match action {
            NavigationAction::MoveLeft => self.switch_header(tree, id, false),
            NavigationAction::MoveRight => self.switch_header(tree, id, true),
            NavigationAction::Activate | NavigationAction::MoveDown => {
                let index = self.highlighted;
                self.open_dropdown(tree, id, index)
            }
            NavigationAction::Cancel if self.is_open() => {
                self.close_from(tree, id, 0);
                true
            }
            _ => false,
        }
    }
}

impl MouseAware for MenuControl {
    fn process_mouse(&mut self, tree: &mut ControlTree, id: ControlId, event: &mut MouseEvent) -> bool {
        if event.position.y != 0 {
            return false;
        }
        let hit = self.header_at(event.position.x);
        match event.kind {
            MouseEventKind::Pressed(MouseButton::Left) => {
                let Some(index) = hit else {
                    return true;
                };
                if self.last_dismissed.take() == Some((index, tree.input_time())) {
                    return true;
                }
                if !tree.has_focus(id) {
                    tree.set_focus(id, FocusReason::Mouse);
                }
                if self.open_header == Some(index) {
                    self.close_from(tree, id, 0);
                } else {
                    self.open_dropdown(tree, id, index);
                }
                true
            }
            MouseEventKind::Moved => {
                if let (Some(index), Some(open)) = (hit, self.open_header) {
                    if index != open {
                        self.open_dropdown(tree, id, index);
                    }
                }
                true
            }
            _ => false,
        }
    }
}

/// One open dropdown level, painted as a bordered portal.
pub struct MenuPortalContent {
    menu: ControlId,
    level: usize,
    bounds: LayoutRect,
    closing: Rc<FlagCell<bool>>,
}

impl MenuPortalContent {
    pub fn menu(&self) -> ControlId {
        self.menu
    }

    pub fn level(&self) -> usize {
        self.level
    }
}

impl PortalContent for MenuPortalContent {
    fn portal_bounds(&self, _tree: &ControlTree) -> LayoutRect {
        self.bounds
    }

    fn border_style(&self) -> Option<BorderStyle> {
        Some(BorderStyle::Single)
    }

    fn colors(&self, tree: &ControlTree) -> ColorPair {
        ColorPair::new(
            tree.color(names::MENU_FG, Color::BLACK),
            tree.color(names::MENU_BG, Color::WHITE),
        )
    }

    fn owner(&self) -> Option<ControlId> {
        Some(self.menu)
    }

    fn paint(
        &mut self,
        tree: &mut ControlTree,
        buffer: &mut CharacterBuffer,
        content: LayoutRect,
        clip: LayoutRect,
        colors: ColorPair,
    ) {
        let selected_colors = ColorPair::new(
            tree.color(names::MENU_SELECTED_FG, Color::WHITE),
            tree.color(names::MENU_SELECTED_BG, Color::BLUE),
        );
        let disabled_fg = tree.color(names::MENU_DISABLED_FG, Color::GRAY);
        let Ok(menu) = tree.get::<MenuControl>(self.menu) else {
            return;
        };
        let Some(open) = menu.levels.get(self.level) else {
            return;
        };
        let width = content.size().width;
        for (row, item) in open.items.iter().enumerate() {
            let row_colors = if open.selected == Some(row) {
                selected_colors
            } else if !item.is_enabled() {
                ColorPair::new(disabled_fg, colors.bg)
            } else {
                colors
            };
            let y = content.y + to_i32(row);
            let line = LayoutRect::new(content.x, y, content.width, 1).intersect(&clip);
            buffer.fill_rect(&line, Cell::blank(row_colors));
            buffer.write_str_clipped(content.x, y, &row_text(item, width), row_colors, &clip);
        }
    }

    fn process_mouse(&mut self, tree: &mut ControlTree, event: &mut MouseEvent) -> bool {
        let (menu, level) = (self.menu, self.level);
        tree.with_typed::<MenuControl, _>(menu, |control, tree| {
            control.process_dropdown_mouse(tree, menu, level, event)
        })
        .unwrap_or(false)
    }

    fn process_key(&mut self, tree: &mut ControlTree, key: &KeyEvent) -> bool {
        let (menu, level) = (self.menu, self.level);
        tree.with_typed::<MenuControl, _>(menu, |control, tree| {
            control.process_dropdown_key(tree, menu, level, key)
        })
        .unwrap_or(false)
    }

    fn on_dismissed(&mut self, tree: &mut ControlTree) {
        if self.closing.get() {
            return;
        }
        let (menu, level) = (self.menu, self.level);
        // The menu may already be disposed.
        let _ = tree.with_typed::<MenuControl, _>(menu, |control, tree| {
            control.level_dismissed(tree, menu, level)
        });
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;
    use std::time::{Duration, Instant};

    use super::{submenu_bounds, MenuControl, MenuItem};
    use crate::core::geometry::{LayoutRect, LayoutSize};
    use crate::core::input::{KeyCode, KeyEvent, MouseEvent};
    use crate::runtime::tree::ControlEvent;
    use crate::runtime::window::Window;

    fn file_menu(quits: Rc<Cell<usize>>) -> MenuItem {
        MenuItem::new("File")
            .with_child(MenuItem::new("Open").with_shortcut("Ctrl+O"))
            .with_child(MenuItem::separator())
            .with_child(MenuItem::new("Quit").on_activate(move |_, _| quits.set(quits.get() + 1)))
    }

    fn window(quits: Rc<Cell<usize>>) -> Window {
        let menu = MenuControl::new()
            .with_item(file_menu(quits))
            .with_item(MenuItem::new("Edit").with_child(MenuItem::new("Undo")));
        let mut window = Window::new(30, 10, menu);
        window.render();
        window
    }

    fn menu_state<R>(window: &Window, f: impl FnOnce(&MenuControl) -> R) -> R {
        f(window
            .tree()
            .get::<MenuControl>(window.root())
            .expect("menu"))
    }

    #[test]
    fn paths_follow_weak_parent_links() {
        let file = MenuItem::new("File");
        let recent = MenuItem::new("Recent");
        let item = MenuItem::new("notes.txt");
        recent.add_child(item.clone());
        file.add_child(recent.clone());
        assert_eq!(item.path(), vec!["File", "Recent", "notes.txt"]);

        let other = MenuItem::new("Other");
        other.add_child(item.clone());
        assert!(!recent.has_children());
        drop(other);
        assert!(item.parent().is_none());
    }

    #[test]
    fn header_press_opens_a_dropdown_below_it() {
        let mut window = window(Rc::default());
        assert!(window.process_mouse_at(&mut MouseEvent::press(2, 0), Instant::now()));
        let lines = window.render().into_strings();
        assert!(lines[1].starts_with("┌──────────────┐"));
        assert!(lines[2].starts_with("│ Open  Ctrl+O │"));
        assert!(lines[3].starts_with("│──────────────│"));
        assert!(lines[4].starts_with("│ Quit         │"));
        assert!(lines[5].starts_with("└──────────────┘"));
        assert_eq!(menu_state(&window, |menu| menu.open_header()), Some(0));
    }

    #[test]
    fn pressing_the_open_header_again_closes_it() {
        let mut window = window(Rc::default());
        let start = Instant::now();
        window.process_mouse_at(&mut MouseEvent::press(2, 0), start);
        window.render();

        window.process_mouse_at(&mut MouseEvent::press(2, 0), start + Duration::from_millis(10));
        assert!(!menu_state(&window, MenuControl::is_open));
        assert!(window.tree().portal_ids().is_empty());

        window.process_mouse_at(&mut MouseEvent::press(2, 0), start + Duration::from_millis(20));
        assert!(menu_state(&window, MenuControl::is_open));
    }

    #[test]
    fn keyboard_skips_separators_and_activates() {
        let quits = Rc::new(Cell::new(0));
        let mut window = window(Rc::clone(&quits));
        let root = window.root();
        assert!(window.focus(root));
        window.drain_events();

        assert!(window.process_key(&KeyEvent::plain(KeyCode::Enter)));
        let selected = menu_state(&window, |menu| menu.selected_item(0).map(|item| item.text()));
        assert_eq!(selected.as_deref(), Some("Open"));

        assert!(window.process_key(&KeyEvent::plain(KeyCode::Down)));
        let selected = menu_state(&window, |menu| menu.selected_item(0).map(|item| item.text()));
        assert_eq!(selected.as_deref(), Some("Quit"));

        assert!(window.process_key(&KeyEvent::plain(KeyCode::Enter)));
        assert_eq!(quits.get(), 1);
        assert!(!menu_state(&window, MenuControl::is_open));
        assert_eq!(
            window.drain_events(),
            vec![ControlEvent::MenuItemActivated {
                menu: root,
                path: vec!["File".to_string(), "Quit".to_string()],
            }]
        );
    }

    #[test]
    fn arrows_move_between_headers_and_escape_closes() {
        let mut window = window(Rc::default());
        let root = window.root();
        window.focus(root);
        window.process_key(&KeyEvent::plain(KeyCode::Enter));
        assert!(window.process_key(&KeyEvent::plain(KeyCode::Right)));
        assert_eq!(menu_state(&window, |menu| menu.open_header()), Some(1));
        assert_eq!(window.tree().portal_ids().len(), 1);

        assert!(window.process_key(&KeyEvent::plain(KeyCode::Escape)));
        assert!(!menu_state(&window, MenuControl::is_open));
        assert!(window.tree().portal_ids().is_empty());
    }

    #[test]
    fn submenus_open_to_the_right_or_flip_left() {
        let screen = LayoutRect::new(0, 0, 30, 10);
        let size = LayoutSize::new(10, 3);
        assert_eq!(
            submenu_bounds(LayoutRect::new(0, 1, 16, 5), 0, size, screen),
            LayoutRect::new(16, 1, 10, 3)
        );
        assert_eq!(
            submenu_bounds(LayoutRect::new(20, 1, 8, 5), 2, size, screen),
            LayoutRect::new(10, 3, 10, 3)
        );
    }

    #[test]
    fn nested_items_open_submenus_and_left_closes_them() {
        let recent = MenuItem::new("Recent").with_child(MenuItem::new("a.txt"));
        let file = MenuItem::new("File").with_child(recent);
        let mut window = Window::new(30, 10, MenuControl::new().with_item(file));
        window.render();
        let root = window.root();
        window.focus(root);

        window.process_key(&KeyEvent::plain(KeyCode::Enter));
        assert!(window.process_key(&KeyEvent::plain(KeyCode::Right)));
        assert_eq!(menu_state(&window, MenuControl::open_depth), 2);
        let lines = window.render().into_strings();
        assert!(lines[1].starts_with("┌───────────┐┌───────┐"));
        assert!(lines[2].starts_with("│ Recent  ► ││ a.txt │"));

        assert!(window.process_key(&KeyEvent::plain(KeyCode::Left)));
        assert_eq!(menu_state(&window, MenuControl::open_depth), 1);
    }
}
