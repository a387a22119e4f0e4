//! Scrolling view over a shared [`LogBuffer`].
//!
//! Producers may append from any thread. The buffer's change callback only raises an atomic
//! flag; the viewer picks the change up on its next host tick, so no control state is ever
//! touched off the UI thread and the buffer lock is never held while the viewer repaints.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::core::buffer::CharacterBuffer;
use crate::core::geometry::{LayoutConstraints, LayoutRect, LayoutSize};
use crate::core::input::{KeyEvent, MouseEvent, MouseEventKind};
use crate::core::keybindings::NavigationAction;
use crate::core::style::{Color, ColorPair};
use crate::core::text::width::{fit_plain, visible_width};
use crate::core::theme::names;
use crate::error::Result;
use crate::logging::{LogBuffer, LogEntry, LogLevel, SubscriptionId};
use crate::render::scrollbar::{paint_vertical, ScrollbarColors};
use crate::runtime::control::{Control, Focusable, Interactive, MouseAware, Tickable};
use crate::runtime::scroll::{ScrollState, ThumbGeometry};
use crate::runtime::tree::{ControlEvent, ControlId, ControlTree, InvalidationReason};

const WHEEL_STEP: isize = 3;

pub struct LogViewerControl {
    buffer: LogBuffer,
    subscription: Option<SubscriptionId>,
    dirty: Arc<AtomicBool>,
    disposed: Arc<AtomicBool>,
    entries: Vec<LogEntry>,
    scroll: ScrollState,
    show_timestamps: bool,
    min_level: LogLevel,
}

impl LogViewerControl {
    /// Creates a viewer over `buffer`, subscribes to its changes and asks the host for
    /// ticks. The first tick loads whatever the buffer already holds.
    pub fn create(tree: &mut ControlTree, buffer: LogBuffer) -> ControlId {
        let dirty = Arc::new(AtomicBool::new(true));
        let disposed = Arc::new(AtomicBool::new(false));
        let subscription = {
            let dirty = Arc::clone(&dirty);
            let disposed = Arc::clone(&disposed);
            buffer.subscribe(move || {
                if !disposed.load(Ordering::SeqCst) {
                    dirty.store(true, Ordering::SeqCst);
                }
            })
        };
        let id = tree.create(Self {
            buffer,
            subscription: Some(subscription),
            dirty,
            disposed,
            entries: Vec::new(),
            scroll: ScrollState::following(),
            show_timestamps: true,
            min_level: LogLevel::Trace,
        });
        tree.register_tick(id, None);
        id
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn offset(&self) -> usize {
        self.scroll.offset()
    }

    pub fn is_following(&self) -> bool {
        self.scroll.auto_follow
    }

    pub fn set_show_timestamps(tree: &mut ControlTree, id: ControlId, show: bool) -> Result<()> {
        tree.get_mut::<Self>(id)?.show_timestamps = show;
        tree.invalidate(id, InvalidationReason::Property);
        Ok(())
    }

    /// Hides entries less severe than `level`.
    pub fn set_min_level(tree: &mut ControlTree, id: ControlId, level: LogLevel) -> Result<()> {
        let viewer = tree.get_mut::<Self>(id)?;
        viewer.min_level = level;
        viewer.reload();
        tree.invalidate(id, InvalidationReason::Content);
        Ok(())
    }

    pub fn scroll_to_bottom(tree: &mut ControlTree, id: ControlId) -> Result<bool> {
        let changed = tree.get_mut::<Self>(id)?.scroll.scroll_to_bottom();
        tree.invalidate(id, InvalidationReason::State);
        Ok(changed)
    }

    fn reload(&mut self) {
        let min_level = self.min_level;
        self.entries = self
            .buffer
            .get_all()
            .into_iter()
            .filter(|entry| entry.level <= min_level)
            .collect();
    }

    fn line(&self, entry: &LogEntry) -> String {
        if self.show_timestamps {
            format!(
                "{} {:<5} {}",
                entry.timestamp.format("%H:%M:%S"),
                entry.level.as_str(),
                entry.message
            )
        } else {
            format!("{:<5} {}", entry.level.as_str(), entry.message)
        }
    }

    fn level_color(tree: &ControlTree, level: LogLevel, fallback: Color) -> Color {
        match level {
            LogLevel::Error => tree.color(names::LOG_ERROR_FG, Color::RED),
            LogLevel::Warn => tree.color(names::LOG_WARN_FG, Color::YELLOW),
            LogLevel::Info => tree.color(names::LOG_INFO_FG, fallback),
            LogLevel::Debug | LogLevel::Trace => tree.color(names::LOG_DEBUG_FG, Color::GRAY),
        }
    }

    fn scrolled(&self, tree: &mut ControlTree, id: ControlId, changed: bool) -> bool {
        if changed {
            tree.emit(ControlEvent::Scrolled {
                id,
                vertical: self.scroll.offset(),
                horizontal: 0,
            });
            tree.invalidate(id, InvalidationReason::State);
        }
        changed
    }
}

impl Control for LogViewerControl {
    fn measure(
        &mut self,
        _tree: &mut ControlTree,
        _id: ControlId,
        constraints: LayoutConstraints,
    ) -> LayoutSize {
        let width = if constraints.has_bounded_width() {
            constraints.max_width
        } else {
            self.entries
                .iter()
                .map(|entry| visible_width(&self.line(entry)))
                .max()
                .unwrap_or(0)
        };
        LayoutSize::new(width, self.entries.len())
    }

    fn paint(
        &mut self,
        tree: &mut ControlTree,
        _id: ControlId,
        buffer: &mut CharacterBuffer,
        bounds: LayoutRect,
        clip: LayoutRect,
        colors: ColorPair,
    ) {
        let size = bounds.size();
        self.scroll.update_dimensions(self.entries.len(), size.height);
        let scrollbar = self.scroll.needs_scrollbar() && size.width > 1;
        let text_width = if scrollbar { size.width - 1 } else { size.width };

        let offset = self.scroll.offset();
        for (row, entry) in self.entries.iter().skip(offset).take(size.height).enumerate() {
            let fg = Self::level_color(tree, entry.level, colors.fg);
            let text = fit_plain(&self.line(entry), text_width);
            buffer.write_str_clipped(
                bounds.x,
                bounds.y + row as i32,
                &text,
                ColorPair::new(fg, colors.bg),
                &clip,
            );
        }

        if scrollbar {
            let track = LayoutRect::new(bounds.right() - 1, bounds.y, 1, bounds.height);
            if let Some(thumb) =
                ThumbGeometry::compute(self.entries.len(), size.height, offset, size.height)
            {
                let bar_colors = ScrollbarColors {
                    track: tree.color(names::SCROLLBAR_TRACK_FG, Color::GRAY),
                    thumb: tree.color(names::SCROLLBAR_THUMB_FG, Color::WHITE),
                    background: colors.bg,
                };
                paint_vertical(buffer, &track, (thumb.offset, thumb.length), bar_colors, &clip);
            }
        }
    }

    fn on_dispose(&mut self, tree: &mut ControlTree, id: ControlId) {
        self.disposed.store(true, Ordering::SeqCst);
        if let Some(subscription) = self.subscription.take() {
            self.buffer.unsubscribe(subscription);
        }
        tree.unregister_tick(id);
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

    fn as_tickable(&mut self) -> Option<&mut dyn Tickable> {
        Some(self)
    }
}

impl Focusable for LogViewerControl {}

impl Tickable for LogViewerControl {
    fn on_tick(&mut self, _tree: &mut ControlTree, _id: ControlId, _now: Instant) -> bool {
        if self.disposed.load(Ordering::SeqCst) || !self.dirty.swap(false, Ordering::SeqCst) {
            return false;
        }
        self.reload();
        true
    }
}

impl Interactive for LogViewerControl {
    fn process_key(&mut self, tree: &mut ControlTree, id: ControlId, key: &KeyEvent) -> bool {
        let keymap = tree.keymap();
        let changed = if keymap.matches(key, NavigationAction::MoveUp) {
            self.scroll.scroll_by(-1)
        } else if keymap.matches(key, NavigationAction::MoveDown) {
            self.scroll.scroll_by(1)
        } else if keymap.matches(key, NavigationAction::PageUp) {
            self.scroll.page_up()
        } else if keymap.matches(key, NavigationAction::PageDown) {
            self.scroll.page_down()
        } else if keymap.matches(key, NavigationAction::Home) {
            self.scroll.scroll_to_top()
        } else if keymap.matches(key, NavigationAction::End) {
            self.scroll.scroll_to_bottom()
        } else {
            return false;
        };
        self.scrolled(tree, id, changed);
        true
    }
}

impl MouseAware for LogViewerControl {
    fn process_mouse(&mut self, tree: &mut ControlTree, id: ControlId, event: &mut MouseEvent) -> bool {
        let changed = match event.kind {
            MouseEventKind::WheelUp => self.scroll.scroll_by(-WHEEL_STEP),
            MouseEventKind::WheelDown => self.scroll.scroll_by(WHEEL_STEP),
            _ => return false,
        };
        self.scrolled(tree, id, changed)
    }
}

#[cfg(test)]
mod tests {
    use std::thread;
    use std::time::{Duration, Instant};

    use super::LogViewerControl;
    use crate::core::buffer::CharacterBuffer;
    use crate::core::input::{KeyCode, KeyEvent};
    use crate::core::style::ColorPair;
    use crate::logging::{LogBuffer, LogEntry, LogLevel};
    use crate::runtime::control::FocusReason;
    use crate::runtime::tree::{ControlId, ControlTree};

    fn seeded(messages: &[&str]) -> LogBuffer {
        let buffer = LogBuffer::new();
        for message in messages {
            buffer.add(LogEntry::new(LogLevel::Info, "test", *message));
        }
        buffer
    }

    fn viewer(tree: &mut ControlTree, buffer: LogBuffer) -> ControlId {
        let id = LogViewerControl::create(tree, buffer);
        LogViewerControl::set_show_timestamps(tree, id, false).expect("viewer");
        id
    }

    fn render(tree: &mut ControlTree, id: ControlId, width: usize, height: usize) -> Vec<String> {
        let mut buffer = CharacterBuffer::new(width, height);
        let screen = buffer.bounds();
        tree.begin_frame(screen);
        tree.paint(id, &mut buffer, screen, screen, ColorPair::default());
        buffer.to_plain_lines()
    }

    #[test]
    fn first_tick_loads_and_follows_the_tail() {
        let mut tree = ControlTree::default();
        let id = viewer(&mut tree, seeded(&["a", "b", "c"]));
        assert!(tree.tick(Instant::now()));
        let lines = render(&mut tree, id, 12, 2);
        assert!(lines[0].starts_with("INFO  b"));
        assert!(lines[1].starts_with("INFO  c"));
    }

    #[test]
    fn entries_from_other_threads_arrive_on_the_next_tick() {
        let mut tree = ControlTree::default();
        let buffer = seeded(&["a"]);
        let id = viewer(&mut tree, buffer.clone());
        let start = Instant::now();
        tree.tick(start);
        assert!(!tree.tick(start + Duration::from_secs(1)));

        let producer = buffer.clone();
        thread::spawn(move || producer.add(LogEntry::new(LogLevel::Error, "worker", "boom")))
            .join()
            .expect("producer thread");

        assert!(tree.tick(start + Duration::from_secs(2)));
        let lines = render(&mut tree, id, 12, 3);
        assert!(lines[1].starts_with("ERROR boom"));
    }

    #[test]
    fn scrolling_up_stops_following() {
        let mut tree = ControlTree::default();
        let buffer = seeded(&["a", "b", "c", "d"]);
        let id = viewer(&mut tree, buffer.clone());
        let start = Instant::now();
        tree.tick(start);
        render(&mut tree, id, 12, 2);
        assert!(tree.set_focus(id, FocusReason::Programmatic));

        assert!(tree.process_key(id, &KeyEvent::plain(KeyCode::Up)));
        let viewer_state = |tree: &ControlTree| {
            let viewer = tree.get::<LogViewerControl>(id).expect("viewer");
            (viewer.offset(), viewer.is_following())
        };
        assert_eq!(viewer_state(&tree), (1, false));

        buffer.add(LogEntry::new(LogLevel::Info, "test", "e"));
        tree.tick(start + Duration::from_secs(1));
        let lines = render(&mut tree, id, 12, 2);
        assert!(lines[0].starts_with("INFO  b"));

        assert!(tree.process_key(id, &KeyEvent::plain(KeyCode::End)));
        assert_eq!(viewer_state(&tree), (3, true));
    }

    #[test]
    fn disposed_viewer_stops_ticking() {
        let mut tree = ControlTree::default();
        let buffer = seeded(&["a"]);
        let id = viewer(&mut tree, buffer.clone());
        tree.dispose(id);
        assert!(!tree.is_ticking(id));
        buffer.add(LogEntry::new(LogLevel::Info, "test", "late"));
        assert!(!tree.tick(Instant::now()));
    }

    #[test]
    fn level_filter_hides_chatter() {
        let mut tree = ControlTree::default();
        let buffer = LogBuffer::new();
        buffer.add(LogEntry::new(LogLevel::Debug, "test", "noise"));
        buffer.add(LogEntry::new(LogLevel::Warn, "test", "careful"));
        let id = viewer(&mut tree, buffer);
        LogViewerControl::set_min_level(&mut tree, id, LogLevel::Info).expect("viewer");
        let messages: Vec<String> = tree
            .get::<LogViewerControl>(id)
            .expect("viewer")
            .entries()
            .iter()
            .map(|entry| entry.message.clone())
            .collect();
        assert_eq!(messages, vec!["careful"]);
    }
}
