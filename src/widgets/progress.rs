//! Progress bar: determinate (value out of maximum) or an indeterminate pulse driven by
//! host ticks.

use std::time::{Duration, Instant};

use crate::core::buffer::{Cell, CharacterBuffer};
use crate::core::geometry::{to_i32, LayoutConstraints, LayoutRect, LayoutSize};
use crate::core::style::{Color, ColorPair};
use crate::core::theme::names;
use crate::error::{Result, ToolkitError};
use crate::runtime::control::{Control, Tickable};
use crate::runtime::tree::{ControlId, ControlTree, InvalidationReason};

const FILLED_GLYPH: char = '█';
const EMPTY_GLYPH: char = '░';
const PULSE_WIDTH: usize = 3;
/// `" 100%"`
const LABEL_WIDTH: usize = 5;

#[derive(Debug)]
pub struct ProgressBarControl {
    value: usize,
    maximum: usize,
    show_percentage: bool,
    indeterminate: bool,
    tick_interval: Option<Duration>,
    pulse: usize,
}

impl ProgressBarControl {
    pub fn new(maximum: usize) -> Result<Self> {
        check_maximum(maximum)?;
        Ok(Self {
            value: 0,
            maximum,
            show_percentage: false,
            indeterminate: false,
            tick_interval: None,
            pulse: 0,
        })
    }

    /// A bar with no known end. Ticks start with the first paint.
    pub fn indeterminate() -> Self {
        Self {
            value: 0,
            maximum: 1,
            show_percentage: false,
            indeterminate: true,
            tick_interval: None,
            pulse: 0,
        }
    }

    pub fn with_percentage(mut self, show: bool) -> Self {
        self.show_percentage = show;
        self
    }

    pub fn with_value(mut self, value: usize) -> Self {
        self.value = value.min(self.maximum);
        self
    }

    /// Pulse interval; the configured tick interval when unset.
    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = Some(interval);
        self
    }

    pub fn value(&self) -> usize {
        self.value
    }

    pub fn maximum(&self) -> usize {
        self.maximum
    }

    pub fn is_indeterminate(&self) -> bool {
        self.indeterminate
    }

    /// Whole percent, rounded down.
    pub fn percentage(&self) -> usize {
        self.value * 100 / self.maximum
    }

    /// Values past the maximum are clamped.
    pub fn set_value(tree: &mut ControlTree, id: ControlId, value: usize) -> Result<()> {
        let bar = tree.get_mut::<Self>(id)?;
        let value = value.min(bar.maximum);
        if bar.value != value {
            bar.value = value;
            tree.invalidate(id, InvalidationReason::State);
        }
        Ok(())
    }

    pub fn set_maximum(tree: &mut ControlTree, id: ControlId, maximum: usize) -> Result<()> {
        check_maximum(maximum)?;
        let bar = tree.get_mut::<Self>(id)?;
        bar.maximum = maximum;
        bar.value = bar.value.min(maximum);
        tree.invalidate(id, InvalidationReason::State);
        Ok(())
    }

    /// Switching to determinate stops the pulse ticks immediately.
    pub fn set_indeterminate(tree: &mut ControlTree, id: ControlId, indeterminate: bool) -> Result<()> {
        let bar = tree.get_mut::<Self>(id)?;
        bar.indeterminate = indeterminate;
        bar.pulse = 0;
        let interval = bar.tick_interval;
        if indeterminate {
            tree.register_tick(id, interval);
        } else {
            tree.unregister_tick(id);
        }
        tree.invalidate(id, InvalidationReason::State);
        Ok(())
    }

    /// Start column of the pulse block inside a bar of `width` columns. The block bounces
    /// between both ends.
    fn pulse_offset(&self, width: usize) -> usize {
        let range = width.saturating_sub(PULSE_WIDTH);
        if range == 0 {
            return 0;
        }
        let phase = self.pulse % (2 * range);
        if phase <= range {
            phase
        } else {
            2 * range - phase
        }
    }
}

fn check_maximum(maximum: usize) -> Result<()> {
    if maximum == 0 {
        return Err(ToolkitError::InvalidArgument(
            "progress maximum must be greater than zero".to_string(),
        ));
    }
    Ok(())
}

impl Control for ProgressBarControl {
    fn measure(
        &mut self,
        _tree: &mut ControlTree,
        _id: ControlId,
        constraints: LayoutConstraints,
    ) -> LayoutSize {
        let width = if constraints.has_bounded_width() {
            constraints.max_width
        } else {
            10 + if self.show_percentage { LABEL_WIDTH } else { 0 }
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
        colors: ColorPair,
    ) {
        if self.indeterminate && !tree.is_ticking(id) {
            tree.register_tick(id, self.tick_interval);
        }
        let filled = Cell::new(
            FILLED_GLYPH,
            tree.color(names::PROGRESS_FILLED_FG, Color::GREEN),
            colors.bg,
        );
        let empty = Cell::new(
            EMPTY_GLYPH,
            tree.color(names::PROGRESS_EMPTY_FG, Color::GRAY),
            colors.bg,
        );

        let width = bounds.size().width;
        let labelled = self.show_percentage && !self.indeterminate && width > LABEL_WIDTH;
        let bar_width = if labelled { width - LABEL_WIDTH } else { width };
        let (start, end) = if self.indeterminate {
            let start = self.pulse_offset(bar_width);
            (start, (start + PULSE_WIDTH).min(bar_width))
        } else {
            (0, self.value * bar_width / self.maximum)
        };
        let cells: Vec<Cell> = (0..bar_width)
            .map(|x| if (start..end).contains(&x) { filled } else { empty })
            .collect();
        buffer.write_cells_clipped(bounds.x, bounds.y, &cells, &clip);

        if labelled {
            let label = format!(" {:>3}%", self.percentage());
            buffer.write_str_clipped(bounds.x + to_i32(bar_width), bounds.y, &label, colors, &clip);
        }
    }

    fn on_dispose(&mut self, tree: &mut ControlTree, id: ControlId) {
        tree.unregister_tick(id);
    }

    fn as_tickable(&mut self) -> Option<&mut dyn Tickable> {
        Some(self)
    }
}

impl Tickable for ProgressBarControl {
    fn on_tick(&mut self, _tree: &mut ControlTree, _id: ControlId, _now: Instant) -> bool {
        if !self.indeterminate {
            return false;
        }
        self.pulse = self.pulse.wrapping_add(1);
        true
    }
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use super::ProgressBarControl;
    use crate::core::buffer::CharacterBuffer;
    use crate::core::style::ColorPair;
    use crate::error::ToolkitError;
    use crate::runtime::tree::{ControlId, ControlTree};

    fn render(tree: &mut ControlTree, id: ControlId, width: usize) -> String {
        let mut buffer = CharacterBuffer::new(width, 1);
        let screen = buffer.bounds();
        tree.begin_frame(screen);
        tree.paint(id, &mut buffer, screen, screen, ColorPair::default());
        buffer.row_text(0)
    }

    #[test]
    fn zero_maximum_is_rejected() {
        assert!(matches!(
            ProgressBarControl::new(0),
            Err(ToolkitError::InvalidArgument(_))
        ));
        let mut tree = ControlTree::default();
        let bar = tree.create(ProgressBarControl::new(10).expect("maximum"));
        assert!(ProgressBarControl::set_maximum(&mut tree, bar, 0).is_err());
    }

    #[test]
    fn determinate_fill_and_label() {
        let mut tree = ControlTree::default();
        let bar = tree.create(ProgressBarControl::new(10).expect("maximum").with_value(5));
        assert_eq!(render(&mut tree, bar, 10), "█████░░░░░");

        let labelled = tree.create(
            ProgressBarControl::new(4)
                .expect("maximum")
                .with_value(1)
                .with_percentage(true),
        );
        assert_eq!(render(&mut tree, labelled, 10), "█░░░░  25%");

        ProgressBarControl::set_value(&mut tree, labelled, 99).expect("set");
        assert_eq!(tree.get::<ProgressBarControl>(labelled).map(|b| b.value()).ok(), Some(4));
        assert_eq!(render(&mut tree, labelled, 10), "█████ 100%");
    }

    #[test]
    fn pulse_advances_on_ticks_and_stops_on_dispose() {
        let mut tree = ControlTree::default();
        let bar = tree.create(ProgressBarControl::indeterminate());
        assert!(!tree.is_ticking(bar));
        assert_eq!(render(&mut tree, bar, 10), "███░░░░░░░");
        assert!(tree.is_ticking(bar));

        assert!(tree.tick(Instant::now()));
        assert_eq!(render(&mut tree, bar, 10), "░███░░░░░░");

        tree.dispose(bar);
        assert!(!tree.is_ticking(bar));
        assert!(!tree.tick(Instant::now()));
    }

    #[test]
    fn switching_to_determinate_unregisters() {
        let mut tree = ControlTree::default();
        let bar = tree.create(ProgressBarControl::indeterminate());
        ProgressBarControl::set_indeterminate(&mut tree, bar, true).expect("set");
        assert!(tree.is_ticking(bar));
        ProgressBarControl::set_indeterminate(&mut tree, bar, false).expect("set");
        assert!(!tree.is_ticking(bar));
        assert_eq!(render(&mut tree, bar, 4), "░░░░");
    }
}
