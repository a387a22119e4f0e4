//! Layout geometry: rectangles, sizes, constraints and margins.
//!
//! All coordinates are integer terminal cells. Rectangles use signed positions because
//! scrolled children are routinely laid out above or left of their viewport; sizes are
//! never negative.

/// Upper bound used for "no limit" constraints. Kept well below `usize::MAX` so margin
/// arithmetic never overflows.
pub const UNBOUNDED: usize = u32::MAX as usize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct LayoutSize {
    pub width: usize,
    pub height: usize,
}

impl LayoutSize {
    pub const ZERO: LayoutSize = LayoutSize {
        width: 0,
        height: 0,
    };

    pub const fn new(width: usize, height: usize) -> Self {
        Self { width, height }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Margin {
    pub left: usize,
    pub top: usize,
    pub right: usize,
    pub bottom: usize,
}

impl Margin {
    pub const fn new(left: usize, top: usize, right: usize, bottom: usize) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub const fn uniform(value: usize) -> Self {
        Self::new(value, value, value, value)
    }

    pub fn horizontal(&self) -> usize {
        self.left + self.right
    }

    pub fn vertical(&self) -> usize {
        self.top + self.bottom
    }
}

/// A rectangle in buffer (screen) space or in a container's local space.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct LayoutRect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl LayoutRect {
    pub const EMPTY: LayoutRect = LayoutRect {
        x: 0,
        y: 0,
        width: 0,
        height: 0,
    };

    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width: width.max(0),
            height: height.max(0),
        }
    }

    pub fn from_size(size: LayoutSize) -> Self {
        Self::new(0, 0, to_i32(size.width), to_i32(size.height))
    }

    pub fn at(origin: Point, size: LayoutSize) -> Self {
        Self::new(origin.x, origin.y, to_i32(size.width), to_i32(size.height))
    }

    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn size(&self) -> LayoutSize {
        LayoutSize::new(self.width.max(0) as usize, self.height.max(0) as usize)
    }

    pub fn right(&self) -> i32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.height
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x && point.x < self.right() && point.y >= self.y && point.y < self.bottom()
    }

    /// Tighter of the two rectangles; empty (zero-sized, anchored at the overlap corner)
    /// when they do not overlap.
    pub fn intersect(&self, other: &LayoutRect) -> LayoutRect {
        let x1 = self.x.max(other.x);
        let y1 = self.y.max(other.y);
        let x2 = self.right().min(other.right());
        let y2 = self.bottom().min(other.bottom());
        LayoutRect::new(x1, y1, (x2 - x1).max(0), (y2 - y1).max(0))
    }

    pub fn intersects(&self, other: &LayoutRect) -> bool {
        !self.intersect(other).is_empty()
    }

    pub fn translate(&self, dx: i32, dy: i32) -> LayoutRect {
        LayoutRect::new(self.x + dx, self.y + dy, self.width, self.height)
    }

    /// Shrinks the rectangle by a margin on every side.
    pub fn deflate(&self, margin: Margin) -> LayoutRect {
        LayoutRect::new(
            self.x + to_i32(margin.left),
            self.y + to_i32(margin.top),
            self.width - to_i32(margin.horizontal()),
            self.height - to_i32(margin.vertical()),
        )
    }

    /// Shrinks by `amount` cells on every side (border insets).
    pub fn inset(&self, amount: i32) -> LayoutRect {
        LayoutRect::new(
            self.x + amount,
            self.y + amount,
            self.width - amount * 2,
            self.height - amount * 2,
        )
    }

    /// Converts a screen-space point to a point relative to this rectangle's origin.
    pub fn to_local(&self, point: Point) -> Point {
        Point::new(point.x - self.x, point.y - self.y)
    }
}

/// Min/max bounds handed down during the measure pass.
///
/// Invariant: `min <= max` on both axes; constructors normalize inverted input by
/// lowering the minimum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LayoutConstraints {
    pub min_width: usize,
    pub max_width: usize,
    pub min_height: usize,
    pub max_height: usize,
}

impl Default for LayoutConstraints {
    fn default() -> Self {
        Self::unbounded()
    }
}

impl LayoutConstraints {
    pub fn new(min_width: usize, max_width: usize, min_height: usize, max_height: usize) -> Self {
        Self {
            min_width: min_width.min(max_width),
            max_width,
            min_height: min_height.min(max_height),
            max_height,
        }
    }

    pub fn unbounded() -> Self {
        Self::new(0, UNBOUNDED, 0, UNBOUNDED)
    }

    pub fn loose(max_width: usize, max_height: usize) -> Self {
        Self::new(0, max_width, 0, max_height)
    }

    pub fn tight(width: usize, height: usize) -> Self {
        Self::new(width, width, height, height)
    }

    pub fn clamp(&self, size: LayoutSize) -> LayoutSize {
        LayoutSize::new(
            size.width.clamp(self.min_width, self.max_width),
            size.height.clamp(self.min_height, self.max_height),
        )
    }

    pub fn clamp_width(&self, width: usize) -> usize {
        width.clamp(self.min_width, self.max_width)
    }

    pub fn clamp_height(&self, height: usize) -> usize {
        height.clamp(self.min_height, self.max_height)
    }

    /// Constraints left for content after removing `horizontal` and `vertical` cells.
    pub fn deflate(&self, horizontal: usize, vertical: usize) -> LayoutConstraints {
        LayoutConstraints::new(
            self.min_width.saturating_sub(horizontal),
            shrink_bound(self.max_width, horizontal),
            self.min_height.saturating_sub(vertical),
            shrink_bound(self.max_height, vertical),
        )
    }

    pub fn with_width(&self, width: usize) -> LayoutConstraints {
        let width = self.clamp_width(width);
        LayoutConstraints::new(width, width, self.min_height, self.max_height)
    }

    pub fn with_height(&self, height: usize) -> LayoutConstraints {
        let height = self.clamp_height(height);
        LayoutConstraints::new(self.min_width, self.max_width, height, height)
    }

    pub fn with_max_height(&self, max_height: usize) -> LayoutConstraints {
        LayoutConstraints::new(
            self.min_width,
            self.max_width,
            self.min_height,
            max_height.min(self.max_height),
        )
    }

    pub fn has_bounded_width(&self) -> bool {
        self.max_width < UNBOUNDED
    }

    pub fn has_bounded_height(&self) -> bool {
        self.max_height < UNBOUNDED
    }
}

fn shrink_bound(bound: usize, amount: usize) -> usize {
    if bound >= UNBOUNDED {
        UNBOUNDED
    } else {
        bound.saturating_sub(amount)
    }
}

/// Saturating conversion used wherever cell counts meet signed coordinates.
pub fn to_i32(value: usize) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intersect_overlapping_rects() {
        let a = LayoutRect::new(0, 0, 10, 10);
        let b = LayoutRect::new(5, 3, 10, 4);
        assert_eq!(a.intersect(&b), LayoutRect::new(5, 3, 5, 4));
        assert_eq!(b.intersect(&a), LayoutRect::new(5, 3, 5, 4));
    }

    #[test]
    fn intersect_disjoint_rects_is_empty() {
        let a = LayoutRect::new(0, 0, 3, 3);
        let b = LayoutRect::new(10, 10, 3, 3);
        assert!(a.intersect(&b).is_empty());
        assert!(!a.intersects(&b));
    }

    #[test]
    fn negative_sizes_are_clamped_to_zero() {
        let rect = LayoutRect::new(2, 2, 4, 4).deflate(Margin::uniform(3));
        assert_eq!(rect.width, 0);
        assert_eq!(rect.height, 0);
        assert!(rect.is_empty());
    }

    #[test]
    fn contains_is_half_open() {
        let rect = LayoutRect::new(1, 1, 2, 2);
        assert!(rect.contains(Point::new(1, 1)));
        assert!(rect.contains(Point::new(2, 2)));
        assert!(!rect.contains(Point::new(3, 1)));
        assert!(!rect.contains(Point::new(1, 3)));
    }

    #[test]
    fn inverted_constraints_are_normalized() {
        let constraints = LayoutConstraints::new(10, 5, 8, 2);
        assert_eq!(constraints.min_width, 5);
        assert_eq!(constraints.min_height, 2);
    }

    #[test]
    fn deflate_keeps_unbounded_axes_unbounded() {
        let constraints = LayoutConstraints::loose(20, UNBOUNDED).deflate(4, 2);
        assert_eq!(constraints.max_width, 16);
        assert_eq!(constraints.max_height, UNBOUNDED);
    }
}
