//! Integer pixel geometry shared by the stabilizer and the tracker.

use bytemuck::{Pod, Zeroable};
use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};

/// Frame dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct FrameSize {
    pub width: u32,
    pub height: u32,
}

impl FrameSize {
    #[inline]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    #[inline]
    pub fn pixel_count(self) -> usize {
        self.width as usize * self.height as usize
    }

    /// True when either side is zero.
    #[inline]
    pub fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Integer center of the frame.
    #[inline]
    pub fn center(self) -> Point {
        Point::new((self.width / 2) as i32, (self.height / 2) as i32)
    }

    /// Nearest pixel of the frame to `point`. An empty frame maps every
    /// point to the origin.
    pub fn clamp(self, point: Point) -> Point {
        let last = |side: u32| i32::try_from(side.saturating_sub(1)).unwrap_or(i32::MAX);
        Point::new(
            point.x.clamp(0, last(self.width)),
            point.y.clamp(0, last(self.height)),
        )
    }
}

impl fmt::Display for FrameSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Integer point in frame coordinates.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Pod, Zeroable,
)]
#[repr(C)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const ZERO: Self = Self::new(0, 0);

    #[inline]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    #[inline]
    pub fn as_vec2(self) -> Vec2 {
        Vec2::new(self.x as f32, self.y as f32)
    }

    /// Round a floating point position to the nearest pixel.
    #[inline]
    pub fn from_vec2_round(v: Vec2) -> Self {
        Self::new(v.x.round() as i32, v.y.round() as i32)
    }

    /// Largest per-axis distance to `other`.
    #[inline]
    pub fn chebyshev_distance(self, other: Self) -> u32 {
        self.x.abs_diff(other.x).max(self.y.abs_diff(other.y))
    }
}

impl Add for Point {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

/// Axis-aligned pixel rectangle. `x`/`y` is the top-left corner, the
/// right and bottom edges are exclusive. Edge arithmetic saturates at the
/// `i32` range.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Pod, Zeroable,
)]
#[repr(C)]
pub struct PixelRect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    #[inline]
    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Rectangle of the given size whose center is `center`.
    pub fn centered(center: Point, width: u32, height: u32) -> Self {
        Self::new(
            center.x.saturating_sub_unsigned(width / 2),
            center.y.saturating_sub_unsigned(height / 2),
            width,
            height,
        )
    }

    #[inline]
    pub fn left(self) -> i32 {
        self.x
    }

    #[inline]
    pub fn top(self) -> i32 {
        self.y
    }

    #[inline]
    pub fn right(self) -> i32 {
        self.x.saturating_add_unsigned(self.width)
    }

    #[inline]
    pub fn bottom(self) -> i32 {
        self.y.saturating_add_unsigned(self.height)
    }

    #[inline]
    pub fn origin(self) -> Point {
        Point::new(self.x, self.y)
    }

    #[inline]
    pub fn center(self) -> Point {
        Point::new(
            self.x.saturating_add_unsigned(self.width / 2),
            self.y.saturating_add_unsigned(self.height / 2),
        )
    }

    #[inline]
    pub fn area(self) -> usize {
        self.width as usize * self.height as usize
    }

    /// True when the rectangle lies entirely inside a frame of `size`.
    pub fn fits_within(self, size: FrameSize) -> bool {
        self.x >= 0
            && self.y >= 0
            && self.right() as i64 <= size.width as i64
            && self.bottom() as i64 <= size.height as i64
    }

    /// Shift the rectangle (keeping its size) so it lies inside the frame.
    /// Returns `None` when the rectangle is larger than the frame.
    pub fn shifted_inside(self, size: FrameSize) -> Option<Self> {
        if self.width > size.width || self.height > size.height {
            return None;
        }
        let max_x = (size.width - self.width) as i32;
        let max_y = (size.height - self.height) as i32;
        Some(Self::new(
            self.x.clamp(0, max_x),
            self.y.clamp(0, max_y),
            self.width,
            self.height,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_centered_rect() {
        let r = PixelRect::centered(Point::new(320, 240), 100, 100);
        assert_eq!(r, PixelRect::new(270, 190, 100, 100));
        assert_eq!(r.center(), Point::new(320, 240));
        assert_eq!(r.right(), 370);
    }

    #[test]
    fn test_fits_within() {
        let size = FrameSize::new(640, 480);
        assert!(PixelRect::new(0, 0, 640, 480).fits_within(size));
        assert!(!PixelRect::new(-1, 0, 10, 10).fits_within(size));
        assert!(!PixelRect::new(635, 0, 10, 10).fits_within(size));
    }

    #[test]
    fn test_shifted_inside() {
        let size = FrameSize::new(200, 100);
        let r = PixelRect::new(-20, 80, 50, 50).shifted_inside(size).unwrap();
        assert_eq!(r, PixelRect::new(0, 50, 50, 50));
        assert!(PixelRect::new(0, 0, 300, 10).shifted_inside(size).is_none());
    }

    #[test]
    fn test_extreme_points_saturate() {
        let r = PixelRect::centered(Point::new(i32::MIN, i32::MAX), 100, 100);
        assert_eq!((r.left(), r.top()), (i32::MIN, i32::MAX - 50));
        assert_eq!(r.bottom(), i32::MAX);
        assert!(!r.fits_within(FrameSize::new(640, 480)));
        let inside = r.shifted_inside(FrameSize::new(640, 480)).unwrap();
        assert_eq!(inside, PixelRect::new(0, 380, 100, 100));
    }

    #[test]
    fn test_frame_clamp() {
        let size = FrameSize::new(640, 480);
        assert_eq!(size.clamp(Point::new(i32::MIN, i32::MAX)), Point::new(0, 479));
        assert_eq!(size.clamp(Point::new(12, 34)), Point::new(12, 34));
        assert_eq!(FrameSize::new(0, 0).clamp(Point::new(-3, 9)), Point::ZERO);
    }

    #[test]
    fn test_point_ops() {
        let p = Point::new(3, -4) + Point::new(1, 1);
        assert_eq!(p, Point::new(4, -3));
        assert_eq!(p - Point::new(4, -3), Point::ZERO);
        assert_eq!(Point::new(0, 0).chebyshev_distance(Point::new(-5, 2)), 5);
        assert_eq!(Point::from_vec2_round(Vec2::new(1.6, -2.4)), Point::new(2, -2));
    }

    proptest::proptest! {
        #[test]
        fn prop_shifted_inside_always_fits(
            x in -500i32..1500,
            y in -500i32..1500,
            w in 1u32..640,
            h in 1u32..480,
        ) {
            let size = FrameSize::new(640, 480);
            let rect = PixelRect::new(x, y, w, h).shifted_inside(size).unwrap();
            proptest::prop_assert!(rect.fits_within(size));
            proptest::prop_assert_eq!((rect.width, rect.height), (w, h));
        }
    }
}
