//! Rect: A rectangle primitive for panel geometry.

/// A rectangle defined by position and size.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rect {
    /// X coordinate (column) of the top-left corner.
    pub x: u16,
    /// Y coordinate (row) of the top-left corner.
    pub y: u16,
    /// Width in columns.
    pub width: u16,
    /// Height in rows.
    pub height: u16,
}

impl Rect {
    /// Create a new rectangle.
    #[inline]
    pub const fn new(x: u16, y: u16, width: u16, height: u16) -> Self {
        Self { x, y, width, height }
    }

    /// Create a rectangle from a terminal size (full screen).
    #[inline]
    pub const fn from_size(width: u16, height: u16) -> Self {
        Self::new(0, 0, width, height)
    }

    /// Create a rectangle from two inclusive corners.
    ///
    /// `(x0, y0)` is the top-left cell and `(x1, y1)` the bottom-right cell,
    /// both part of the rectangle. Inverted corners yield an empty rectangle.
    #[inline]
    pub const fn from_corners(x0: u16, y0: u16, x1: u16, y1: u16) -> Self {
        if x1 < x0 || y1 < y0 {
            return Self::new(x0, y0, 0, 0);
        }
        Self::new(x0, y0, (x1 - x0).saturating_add(1), (y1 - y0).saturating_add(1))
    }

    /// Zero-sized rectangle.
    pub const ZERO: Self = Self::new(0, 0, 0, 0);

    /// Check if the rectangle is empty.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Get the right edge (exclusive).
    #[inline]
    pub const fn right(&self) -> u16 {
        self.x.saturating_add(self.width)
    }

    /// Get the bottom edge (exclusive).
    #[inline]
    pub const fn bottom(&self) -> u16 {
        self.y.saturating_add(self.height)
    }

    /// Shrink the rectangle by a margin on all sides.
    #[inline]
    #[must_use]
    pub const fn shrink(&self, margin: u16) -> Self {
        let m2 = margin * 2;
        if self.width <= m2 || self.height <= m2 {
            return Self::ZERO;
        }
        Self::new(
            self.x.saturating_add(margin),
            self.y.saturating_add(margin),
            self.width - m2,
            self.height - m2,
        )
    }
}

impl std::fmt::Debug for Rect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Rect({}, {} {}x{})", self.x, self.y, self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_corners_is_inclusive() {
        let rect = Rect::from_corners(0, 0, 29, 22);
        assert_eq!(rect, Rect::new(0, 0, 30, 23));
        assert_eq!(rect.right(), 30);
        assert_eq!(rect.bottom(), 23);
    }

    #[test]
    fn test_from_corners_inverted_is_empty() {
        assert!(Rect::from_corners(10, 5, 9, 8).is_empty());
        assert!(Rect::from_corners(10, 5, 12, 4).is_empty());
    }

    #[test]
    fn test_from_corners_full_range_saturates() {
        let rect = Rect::from_corners(0, 0, u16::MAX, 3);
        assert_eq!(rect.width, u16::MAX);
        assert_eq!(Rect::new(u16::MAX - 1, 0, 5, 5).shrink(1).x, u16::MAX);
    }

    #[test]
    fn test_shrink_frame() {
        let rect = Rect::new(2, 3, 10, 4);
        assert_eq!(rect.shrink(1), Rect::new(3, 4, 8, 2));
        assert_eq!(Rect::new(0, 0, 2, 5).shrink(1), Rect::ZERO);
    }
}
