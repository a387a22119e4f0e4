//! Scroll offset bookkeeping and scrollbar thumb geometry.
//!
//! Invariant: `0 <= offset <= max(0, content - viewport)` after every mutation.

/// Largest valid offset for the given extents.
pub fn max_offset(content: usize, viewport: usize) -> usize {
    content.saturating_sub(viewport)
}

pub fn clamp_offset(offset: usize, content: usize, viewport: usize) -> usize {
    offset.min(max_offset(content, viewport))
}

/// Scroll position along one axis.
///
/// With `auto_follow` set, growing content keeps the view pinned to the end; any scroll away
/// from the end clears it and reaching the end again restores it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScrollState {
    offset: usize,
    content: usize,
    viewport: usize,
    pub auto_follow: bool,
}

impl ScrollState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn following() -> Self {
        Self {
            auto_follow: true,
            ..Self::default()
        }
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn content(&self) -> usize {
        self.content
    }

    pub fn viewport(&self) -> usize {
        self.viewport
    }

    pub fn max_offset(&self) -> usize {
        max_offset(self.content, self.viewport)
    }

    pub fn needs_scrollbar(&self) -> bool {
        self.content > self.viewport
    }

    pub fn at_end(&self) -> bool {
        self.offset >= self.max_offset()
    }

    /// Records fresh extents from a layout pass and re-clamps the offset.
    pub fn update_dimensions(&mut self, content: usize, viewport: usize) {
        self.content = content;
        self.viewport = viewport;
        if self.auto_follow {
            self.offset = self.max_offset();
        } else {
            self.offset = clamp_offset(self.offset, content, viewport);
        }
    }

    /// Sets the offset (clamped). Returns whether it changed.
    pub fn set_offset(&mut self, offset: usize) -> bool {
        let clamped = clamp_offset(offset, self.content, self.viewport);
        let changed = clamped != self.offset;
        self.offset = clamped;
        changed
    }

    /// Moves to `offset` (clamped) as a user scroll would: following resumes only when the
    /// new position is the end.
    pub fn scroll_to(&mut self, offset: usize) -> bool {
        let changed = self.set_offset(offset);
        if changed {
            self.auto_follow = self.at_end();
        }
        changed
    }

    /// Scrolls by a signed delta. Returns whether the offset moved.
    pub fn scroll_by(&mut self, delta: isize) -> bool {
        let target = if delta < 0 {
            self.offset.saturating_sub(delta.unsigned_abs())
        } else {
            self.offset.saturating_add(delta as usize)
        };
        self.scroll_to(target)
    }

    pub fn page_up(&mut self) -> bool {
        self.scroll_by(-(self.viewport.max(1) as isize))
    }

    pub fn page_down(&mut self) -> bool {
        self.scroll_by(self.viewport.max(1) as isize)
    }

    pub fn scroll_to_top(&mut self) -> bool {
        let changed = self.set_offset(0);
        self.auto_follow = false;
        changed
    }

    pub fn scroll_to_bottom(&mut self) -> bool {
        let changed = self.set_offset(self.max_offset());
        self.auto_follow = true;
        changed
    }

    /// Minimal scroll that brings `[start, start + len)` into the viewport. Items taller than
    /// the viewport are aligned to their top edge.
    pub fn ensure_visible(&mut self, start: usize, len: usize) -> bool {
        let end = start + len;
        let target = if start < self.offset || len >= self.viewport {
            start
        } else if end > self.offset + self.viewport {
            end - self.viewport
        } else {
            return false;
        };
        self.scroll_to(target)
    }
}

/// Thumb placement within a scrollbar track.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThumbGeometry {
    pub offset: usize,
    pub length: usize,
}

impl ThumbGeometry {
    /// Thumb length is `round(viewport * viewport / content)` (at least 1, at most the track);
    /// its offset is `round((track - length) * offset / (content - viewport))`. `None` when
    /// nothing scrolls or the track is empty.
    pub fn compute(content: usize, viewport: usize, offset: usize, track: usize) -> Option<Self> {
        if track == 0 || content <= viewport {
            return None;
        }
        let length = ((viewport as f64 * viewport as f64 / content as f64).round() as usize)
            .clamp(1, track);
        let scrollable = max_offset(content, viewport);
        let ratio = clamp_offset(offset, content, viewport) as f64 / scrollable as f64;
        let thumb_offset = (((track - length) as f64) * ratio).round() as usize;
        Some(Self {
            offset: thumb_offset.min(track - length),
            length,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(100, 20, 40, 20 => Some(ThumbGeometry { offset: 8, length: 4 }); "mid scroll")]
    #[test_case(100, 20, 0, 20 => Some(ThumbGeometry { offset: 0, length: 4 }); "top")]
    #[test_case(100, 20, 80, 20 => Some(ThumbGeometry { offset: 16, length: 4 }); "bottom")]
    #[test_case(1000, 10, 0, 10 => Some(ThumbGeometry { offset: 0, length: 1 }); "minimum length")]
    #[test_case(20, 20, 0, 20 => None; "no overflow")]
    #[test_case(100, 20, 40, 0 => None; "empty track")]
    fn thumb_geometry(content: usize, viewport: usize, offset: usize, track: usize) -> Option<ThumbGeometry> {
        ThumbGeometry::compute(content, viewport, offset, track)
    }

    #[test]
    fn offsets_clamp_into_range() {
        assert_eq!(clamp_offset(50, 30, 20), 10);
        assert_eq!(clamp_offset(5, 10, 20), 0);
    }

    #[test]
    fn scrolling_past_ends_is_a_no_op() {
        let mut state = ScrollState::new();
        state.update_dimensions(30, 10);
        assert!(!state.scroll_by(-1));
        assert!(state.scroll_to_bottom());
        assert_eq!(state.offset(), 20);
        assert!(!state.scroll_by(3));
        assert_eq!(state.offset(), 20);
    }

    #[test]
    fn shrinking_content_reclamps_offset() {
        let mut state = ScrollState::new();
        state.update_dimensions(50, 10);
        state.set_offset(35);
        state.update_dimensions(20, 10);
        assert_eq!(state.offset(), 10);
    }

    #[test]
    fn auto_follow_tracks_growth_until_user_scrolls_up() {
        let mut state = ScrollState::following();
        state.update_dimensions(15, 10);
        assert_eq!(state.offset(), 5);
        state.update_dimensions(25, 10);
        assert_eq!(state.offset(), 15);

        state.scroll_by(-2);
        assert!(!state.auto_follow);
        state.update_dimensions(40, 10);
        assert_eq!(state.offset(), 13);

        state.scroll_to_bottom();
        assert!(state.auto_follow);
    }

    #[test]
    fn ensure_visible_scrolls_minimally() {
        let mut state = ScrollState::new();
        state.update_dimensions(100, 10);
        assert!(state.ensure_visible(15, 2));
        assert_eq!(state.offset(), 7);
        assert!(!state.ensure_visible(8, 2));
        assert!(state.ensure_visible(3, 1));
        assert_eq!(state.offset(), 3);
    }
}
