//! Mouse routing: hit-testing against the last paint pass, coordinate translation,
//! enter/leave tracking and double-click detection.

use std::time::{Duration, Instant};

use crate::core::geometry::Point;
use crate::core::input::{MouseEvent, MouseEventKind};
use crate::runtime::control::FocusReason;
use crate::runtime::tree::{ControlId, ControlTree};

impl ControlTree {
    /// Delivers `event` (local to `id`'s content origin) to `id`. Mouse-aware controls get
    /// the event directly; other containers forward it to the child under the pointer.
    pub fn process_mouse(&mut self, id: ControlId, event: &mut MouseEvent) -> bool {
        if !self.is_visible(id) {
            return false;
        }
        let outcome = self
            .with_control(id, |control, tree| match control.as_mouse_aware() {
                Some(aware) if aware.wants_mouse_events() => {
                    Some(aware.process_mouse(tree, id, event))
                }
                _ => None,
            })
            .flatten();
        let handled = match outcome {
            Some(handled) => handled,
            None if !self.children(id).is_empty() => self.dispatch_mouse_to_children(id, event),
            None => false,
        };
        if handled {
            event.handled = true;
        }
        handled
    }

    /// Topmost visible child whose painted area contains `point` (absolute). Children
    /// painted later sit on top, so the search runs back to front.
    pub fn hit_test_child(&self, id: ControlId, point: Point) -> Option<ControlId> {
        self.children(id).iter().rev().copied().find(|child| {
            self.is_visible(*child)
                && self
                    .paint_record(*child)
                    .is_some_and(|record| record.visible.contains(point))
        })
    }

    /// Forwards `event` (local to `id`) to the child under the pointer, translating it into
    /// the child's space. Handles enter/leave bookkeeping and focus-on-press. Unhandled
    /// wheel events return `false` so the caller can scroll.
    pub fn dispatch_mouse_to_children(&mut self, id: ControlId, event: &mut MouseEvent) -> bool {
        if event.kind == MouseEventKind::Leave {
            self.update_hover(id, None, event);
            return false;
        }
        let Some(origin) = self.content_origin(id) else {
            return false;
        };
        let absolute = origin.offset(event.position.x, event.position.y);
        let hit = self.hit_test_child(id, absolute);
        self.update_hover(id, hit, event);
        let Some(child) = hit else {
            return false;
        };
        if event.kind == MouseEventKind::Enter {
            return false;
        }

        if event.kind.is_press()
            && self.accepts_focus_directly(child)
            && self.can_focus(child)
            && self.children(child).is_empty()
        {
            self.set_focus(child, FocusReason::Mouse);
        }

        let Some(child_origin) = self.content_origin(child) else {
            return false;
        };
        let mut child_event = MouseEvent {
            position: Point::new(absolute.x - child_origin.x, absolute.y - child_origin.y),
            ..*event
        };
        let handled = self.process_mouse(child, &mut child_event);
        if child_event.handled {
            event.handled = true;
        }
        handled
    }

    fn update_hover(&mut self, id: ControlId, hit: Option<ControlId>, event: &MouseEvent) {
        let previous = self.node(id).and_then(|node| node.hovered_child);
        if previous == hit {
            return;
        }
        if let Some(node) = self.node_mut(id) {
            node.hovered_child = hit;
        }
        if let Some(left) = previous {
            let mut leave = event.with_kind(MouseEventKind::Leave);
            leave.handled = false;
            self.process_mouse(left, &mut leave);
        }
        if let Some(entered) = hit {
            if let (Some(origin), Some(child_origin)) =
                (self.content_origin(id), self.content_origin(entered))
            {
                let absolute = origin.offset(event.position.x, event.position.y);
                let mut enter = MouseEvent {
                    position: Point::new(absolute.x - child_origin.x, absolute.y - child_origin.y),
                    kind: MouseEventKind::Enter,
                    modifiers: event.modifiers,
                    handled: false,
                };
                self.process_mouse(entered, &mut enter);
            }
        }
    }

    pub fn hovered_child(&self, id: ControlId) -> Option<ControlId> {
        self.node(id)?.hovered_child
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickKind {
    Single,
    Double,
}

/// Turns a stream of presses into single and double clicks for drivers that do not report
/// double clicks natively.
#[derive(Debug, Clone, Default)]
pub struct DoubleClickDetector {
    last_click: Option<Instant>,
    click_count: u32,
}

impl DoubleClickDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// A second press within `threshold` of a single click is a double click and resets the
    /// counter; anything else starts a fresh single click.
    pub fn register(&mut self, now: Instant, threshold: Duration) -> ClickKind {
        let within = self
            .last_click
            .is_some_and(|last| now.saturating_duration_since(last) <= threshold);
        if self.click_count == 1 && within {
            self.reset();
            ClickKind::Double
        } else {
            self.click_count = 1;
            self.last_click = Some(now);
            ClickKind::Single
        }
    }

    /// Classifies a mouse event: native double-click reports bypass the timer.
    pub fn classify(&mut self, event: &MouseEvent, now: Instant, threshold: Duration) -> Option<ClickKind> {
        match event.kind {
            MouseEventKind::DoubleClicked(_) => {
                self.reset();
                Some(ClickKind::Double)
            }
            MouseEventKind::Pressed(_) => Some(self.register(now, threshold)),
            _ => None,
        }
    }

    pub fn reset(&mut self) {
        self.last_click = None;
        self.click_count = 0;
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::time::{Duration, Instant};

    use super::{ClickKind, DoubleClickDetector};
    use crate::core::buffer::CharacterBuffer;
    use crate::core::geometry::{LayoutConstraints, LayoutRect, LayoutSize, Point};
    use crate::core::input::{MouseButton, MouseEvent, MouseEventKind};
    use crate::core::style::{Color, ColorPair};
    use crate::runtime::control::{Container, Control, Focusable, MouseAware};
    use crate::runtime::tree::{ControlId, ControlTree};

    type Log = Rc<RefCell<Vec<(MouseEventKind, Point)>>>;

    struct Probe {
        log: Log,
        consume_wheel: bool,
    }

    impl Control for Probe {
        fn measure(&mut self, _: &mut ControlTree, _: ControlId, _: LayoutConstraints) -> LayoutSize {
            LayoutSize::new(4, 2)
        }

        fn paint(
            &mut self,
            _: &mut ControlTree,
            _: ControlId,
            _: &mut CharacterBuffer,
            _: LayoutRect,
            _: LayoutRect,
            _: ColorPair,
        ) {
        }

        fn as_focusable(&self) -> Option<&dyn Focusable> {
            Some(self)
        }

        fn as_focusable_mut(&mut self) -> Option<&mut dyn Focusable> {
            Some(self)
        }

        fn as_mouse_aware(&mut self) -> Option<&mut dyn MouseAware> {
            Some(self)
        }
    }

    impl Focusable for Probe {}

    impl MouseAware for Probe {
        fn process_mouse(&mut self, _: &mut ControlTree, _: ControlId, event: &mut MouseEvent) -> bool {
            self.log.borrow_mut().push((event.kind, event.position));
            !event.kind.is_wheel() || self.consume_wheel
        }
    }

    /// Lays children out side by side, four columns each.
    struct Row;

    impl Control for Row {
        fn measure(&mut self, _: &mut ControlTree, _: ControlId, _: LayoutConstraints) -> LayoutSize {
            LayoutSize::new(8, 2)
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
            for (index, child) in tree.children(id).to_vec().into_iter().enumerate() {
                let rect = LayoutRect::new(bounds.x + index as i32 * 4, bounds.y, 4, 2);
                tree.paint(child, buffer, rect, clip, colors);
            }
        }

        fn as_container(&self) -> Option<&dyn Container> {
            Some(self)
        }
    }

    impl Container for Row {}

    fn fixture(consume_wheel: bool) -> (ControlTree, ControlId, ControlId, ControlId, Log, Log) {
        let mut tree = ControlTree::default();
        let row = tree.create(Row);
        let left_log = Log::default();
        let right_log = Log::default();
        let left = tree.create(Probe {
            log: Rc::clone(&left_log),
            consume_wheel,
        });
        let right = tree.create(Probe {
            log: Rc::clone(&right_log),
            consume_wheel,
        });
        tree.add_child(row, left).expect("attach");
        tree.add_child(row, right).expect("attach");

        let mut buffer = CharacterBuffer::new(20, 5);
        let colors = ColorPair::new(Color::WHITE, Color::BLACK);
        let screen = buffer.bounds();
        tree.begin_frame(screen);
        tree.paint(row, &mut buffer, LayoutRect::new(2, 1, 8, 2), screen, colors);
        (tree, row, left, right, left_log, right_log)
    }

    #[test]
    fn press_is_translated_into_child_space_and_focuses() {
        let (mut tree, row, _left, right, _l, right_log) = fixture(false);
        let mut event = MouseEvent::press(5, 1);
        assert!(tree.process_mouse(row, &mut event));
        assert!(event.handled);
        assert_eq!(tree.focused(), Some(right));
        let log = right_log.borrow();
        assert_eq!(
            log.last(),
            Some(&(MouseEventKind::Pressed(MouseButton::Left), Point::new(1, 1)))
        );
    }

    #[test]
    fn unhandled_wheel_bubbles() {
        let (mut tree, row, ..) = fixture(false);
        let mut event = MouseEvent::new(Point::new(1, 0), MouseEventKind::WheelDown);
        assert!(!tree.process_mouse(row, &mut event));
        assert!(!event.handled);

        let (mut tree, row, ..) = fixture(true);
        let mut event = MouseEvent::new(Point::new(1, 0), MouseEventKind::WheelDown);
        assert!(tree.process_mouse(row, &mut event));
    }

    #[test]
    fn moving_between_children_sends_leave_then_enter() {
        let (mut tree, row, left, right, left_log, right_log) = fixture(false);
        let mut event = MouseEvent::new(Point::new(1, 0), MouseEventKind::Moved);
        tree.process_mouse(row, &mut event);
        assert_eq!(tree.hovered_child(row), Some(left));

        let mut event = MouseEvent::new(Point::new(6, 0), MouseEventKind::Moved);
        tree.process_mouse(row, &mut event);
        assert_eq!(tree.hovered_child(row), Some(right));

        let left_kinds: Vec<MouseEventKind> = left_log.borrow().iter().map(|(k, _)| *k).collect();
        assert_eq!(
            left_kinds,
            vec![MouseEventKind::Enter, MouseEventKind::Moved, MouseEventKind::Leave]
        );
        assert_eq!(right_log.borrow()[0].0, MouseEventKind::Enter);
    }

    #[test]
    fn clicks_outside_children_are_not_handled() {
        let (mut tree, row, ..) = fixture(false);
        let mut event = MouseEvent::press(9, 9);
        assert!(!tree.process_mouse(row, &mut event));
        assert_eq!(tree.focused(), None);
    }

    #[test]
    fn double_click_within_threshold() {
        let threshold = Duration::from_millis(500);
        let start = Instant::now();
        let mut detector = DoubleClickDetector::new();
        assert_eq!(detector.register(start, threshold), ClickKind::Single);
        assert_eq!(
            detector.register(start + Duration::from_millis(200), threshold),
            ClickKind::Double
        );
        // The counter reset, so a third quick press starts over.
        assert_eq!(
            detector.register(start + Duration::from_millis(300), threshold),
            ClickKind::Single
        );
    }

    #[test]
    fn slow_clicks_stay_single() {
        let threshold = Duration::from_millis(500);
        let start = Instant::now();
        let mut detector = DoubleClickDetector::new();
        assert_eq!(detector.register(start, threshold), ClickKind::Single);
        assert_eq!(
            detector.register(start + Duration::from_millis(900), threshold),
            ClickKind::Single
        );
    }

    #[test]
    fn native_double_click_bypasses_timer() {
        let mut detector = DoubleClickDetector::new();
        let event = MouseEvent::new(
            Point::new(0, 0),
            MouseEventKind::DoubleClicked(MouseButton::Left),
        );
        assert_eq!(
            detector.classify(&event, Instant::now(), Duration::from_millis(1)),
            Some(ClickKind::Double)
        );
    }
}
