use proptest::prelude::*;

use tape_widgets::core::geometry::{LayoutConstraints, LayoutSize, Margin};
use tape_widgets::core::input::{KeyCode, KeyEvent, KeyModifiers};
use tape_widgets::runtime::scroll::{ScrollState, ThumbGeometry};
use tape_widgets::widgets::grid::{compute_column_layout, ColumnWidth};
use tape_widgets::widgets::splitter::{clamp_split, MIN_COLUMN_WIDTH};
use tape_widgets::widgets::toolbar::compute_row_layout;
use tape_widgets::{ButtonControl, ControlTree, MarkupControl, PanelControl, Window};

#[derive(Debug, Clone)]
enum ScrollOp {
    Resize(usize, usize),
    By(isize),
    To(usize),
    PageUp,
    PageDown,
    Top,
    Bottom,
}

fn scroll_op() -> impl Strategy<Value = ScrollOp> {
    prop_oneof![
        (0usize..200, 0usize..60).prop_map(|(content, viewport)| ScrollOp::Resize(content, viewport)),
        (-80isize..80).prop_map(ScrollOp::By),
        (0usize..300).prop_map(ScrollOp::To),
        Just(ScrollOp::PageUp),
        Just(ScrollOp::PageDown),
        Just(ScrollOp::Top),
        Just(ScrollOp::Bottom),
    ]
}

fn constraints() -> impl Strategy<Value = LayoutConstraints> {
    (0usize..40, 0usize..40, 0usize..20, 0usize..20).prop_map(|(a, b, c, d)| {
        LayoutConstraints::new(a.min(b), a.max(b), c.min(d), c.max(d))
    })
}

proptest! {
    #[test]
    fn measured_sizes_satisfy_constraints(
        lines in prop::collection::vec("[a-z ]{0,30}", 0..6),
        margin in 0usize..4,
        constraints in constraints(),
    ) {
        let mut tree = ControlTree::default();
        let panel = tree.create(PanelControl::new());
        for line in lines {
            let child = tree.create(MarkupControl::new(line));
            tree.set_margin(child, Margin::uniform(margin)).expect("margin");
            tree.add_child(panel, child).expect("attach");
        }
        let size = tree.measure(panel, constraints);
        prop_assert!(size.width >= constraints.min_width && size.width <= constraints.max_width);
        prop_assert!(size.height >= constraints.min_height && size.height <= constraints.max_height);
    }

    #[test]
    fn scroll_offset_stays_in_bounds(ops in prop::collection::vec(scroll_op(), 1..40)) {
        let mut state = ScrollState::following();
        for op in ops {
            match op {
                ScrollOp::Resize(content, viewport) => state.update_dimensions(content, viewport),
                ScrollOp::By(delta) => { state.scroll_by(delta); }
                ScrollOp::To(offset) => { state.scroll_to(offset); }
                ScrollOp::PageUp => { state.page_up(); }
                ScrollOp::PageDown => { state.page_down(); }
                ScrollOp::Top => { state.scroll_to_top(); }
                ScrollOp::Bottom => { state.scroll_to_bottom(); }
            }
            prop_assert!(state.offset() <= state.content().saturating_sub(state.viewport()));
        }
    }

    #[test]
    fn thumb_stays_inside_the_track(
        content in 1usize..500,
        viewport in 1usize..100,
        offset in 0usize..600,
        track in 0usize..100,
    ) {
        match ThumbGeometry::compute(content, viewport, offset, track) {
            Some(thumb) => {
                prop_assert!(content > viewport);
                prop_assert!(thumb.length >= 1);
                prop_assert!(thumb.offset + thumb.length <= track);
            }
            None => prop_assert!(track == 0 || content <= viewport),
        }
    }

    #[test]
    fn row_layout_is_deterministic_and_non_overlapping(
        widths in prop::collection::vec((1usize..15, 1usize..3), 0..12),
        available in 1usize..60,
        spacing in 0usize..3,
        wrap in any::<bool>(),
    ) {
        let sizes: Vec<LayoutSize> = widths
            .iter()
            .map(|(width, height)| LayoutSize::new(*width, *height))
            .collect();
        let first = compute_row_layout(&sizes, available, spacing, wrap);
        let second = compute_row_layout(&sizes, available, spacing, wrap);
        prop_assert_eq!(&first, &second);
        for pair in first.windows(2) {
            if pair[0].row == pair[1].row {
                prop_assert!(pair[0].x + pair[0].width + spacing <= pair[1].x);
            } else {
                prop_assert_eq!(pair[1].x, 0);
                prop_assert!(pair[1].y >= pair[0].y + pair[0].height);
            }
        }
        if wrap {
            for (index, slot) in first.iter().enumerate() {
                let opens_row = index == 0 || first[index - 1].row != slot.row;
                prop_assert!(opens_row || slot.x + slot.width <= available);
            }
        }
    }

    #[test]
    fn flex_columns_fill_the_remaining_width(
        fixed in prop::collection::vec(0usize..10, 0..4),
        flex in 1usize..4,
        extra in 0usize..50,
    ) {
        let mut widths: Vec<ColumnWidth> = fixed.iter().map(|width| ColumnWidth::Fixed(*width)).collect();
        widths.extend(std::iter::repeat(ColumnWidth::Flex).take(flex));
        let available = fixed.iter().sum::<usize>() + extra;
        let layout = compute_column_layout(&widths, available);
        prop_assert_eq!(layout.iter().map(|(_, width)| width).sum::<usize>(), available);
        for pair in layout.windows(2) {
            prop_assert_eq!(pair[0].0 + pair[0].1, pair[1].0);
        }
    }

    #[test]
    fn split_clamp_respects_both_bounds(total in 0usize..300, desired in 0usize..400, percentage in 0usize..50) {
        let width = clamp_split(total, desired, percentage);
        let lower = MIN_COLUMN_WIDTH.max(total * percentage / 100);
        prop_assert!(width <= total.saturating_sub(lower));
        if total >= 2 * lower {
            prop_assert!(width >= lower);
        }
    }

    #[test]
    fn focus_path_stays_unique_under_tab_presses(count in 1usize..6, presses in prop::collection::vec(any::<bool>(), 1..20)) {
        let mut window = Window::new(20, 8, PanelControl::new());
        let root = window.root();
        let buttons: Vec<_> = (0..count)
            .map(|index| {
                let button = window.tree_mut().create(ButtonControl::new(format!("b{index}")));
                window.tree_mut().add_child(root, button).expect("attach");
                button
            })
            .collect();
        window.render();
        for forward in presses {
            let key = if forward {
                KeyEvent::plain(KeyCode::Tab)
            } else {
                KeyEvent::new(KeyCode::Tab, KeyModifiers::SHIFT)
            };
            prop_assert!(window.process_key(&key));
            let holders = buttons.iter().filter(|id| window.tree().has_focus(**id)).count();
            prop_assert_eq!(holders, 1);
            prop_assert!(window.focused().is_some_and(|id| buttons.contains(&id)));
        }
    }
}
