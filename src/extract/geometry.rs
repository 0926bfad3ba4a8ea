//! Quadrilateral geometry for OCR boxes.
//!
//! OCR engines report boxes as four corners in the order top-left, top-right,
//! bottom-right, bottom-left. The corners are not guaranteed to be
//! axis-aligned, so every helper takes min/max over the relevant corners.
//! Degenerate boxes (zero width or height) are valid input.

use serde::{Deserialize, Serialize};

/// A 2D point in image pixel coordinates (y grows downwards).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Four corners: top-left, top-right, bottom-right, bottom-left.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Quad {
    pub top_left: Point,
    pub top_right: Point,
    pub bottom_right: Point,
    pub bottom_left: Point,
}

impl Quad {
    pub fn new(top_left: Point, top_right: Point, bottom_right: Point, bottom_left: Point) -> Self {
        Self {
            top_left,
            top_right,
            bottom_right,
            bottom_left,
        }
    }

    /// Axis-aligned box from its x and y spans.
    pub fn from_bounds(x_min: f32, y_min: f32, x_max: f32, y_max: f32) -> Self {
        Self {
            top_left: Point::new(x_min, y_min),
            top_right: Point::new(x_max, y_min),
            bottom_right: Point::new(x_max, y_max),
            bottom_left: Point::new(x_min, y_max),
        }
    }

    /// Leftmost x of the left edge.
    pub fn left(&self) -> f32 {
        self.top_left.x.min(self.bottom_left.x)
    }

    /// Rightmost x of the right edge.
    pub fn right(&self) -> f32 {
        self.top_right.x.max(self.bottom_right.x)
    }

    /// Lowest point of the right edge, used as a header's bottom line.
    pub fn bottom(&self) -> f32 {
        self.top_right.y.max(self.bottom_right.y)
    }

    /// Topmost y of the top edge.
    pub fn top(&self) -> f32 {
        self.top_left.y.min(self.top_right.y)
    }

    /// Horizontal center measured along the top edge.
    pub fn center_x(&self) -> f32 {
        (self.top_left.x + self.top_right.x) / 2.0
    }

    /// Pixel rectangle spanned by the top-left and bottom-right corners.
    pub fn pixel_rect(&self) -> PixelRect {
        PixelRect::from_corners(self.top_left, self.bottom_right)
    }
}

/// Integer rectangle for drawing, already normalised so `x0 <= x1`, `y0 <= y1`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelRect {
    pub x0: i64,
    pub y0: i64,
    pub x1: i64,
    pub y1: i64,
}

impl PixelRect {
    /// Truncates both corners to integers and orders them.
    pub fn from_corners(a: Point, b: Point) -> Self {
        let (ax, ay, bx, by) = (a.x as i64, a.y as i64, b.x as i64, b.y as i64);
        Self {
            x0: ax.min(bx),
            y0: ay.min(by),
            x1: ax.max(bx),
            y1: ay.max(by),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn skewed() -> Quad {
        // Slightly rotated clockwise
        Quad::new(
            Point::new(102.0, 0.0),
            Point::new(200.0, 4.0),
            Point::new(198.0, 24.0),
            Point::new(100.0, 20.0),
        )
    }

    #[test]
    fn test_axis_aligned_bounds() {
        let q = Quad::from_bounds(100.0, 0.0, 200.0, 20.0);
        assert_eq!(q.left(), 100.0);
        assert_eq!(q.right(), 200.0);
        assert_eq!(q.top(), 0.0);
        assert_eq!(q.bottom(), 20.0);
        assert_eq!(q.center_x(), 150.0);
    }

    #[test]
    fn test_rotated_bounds_take_extremes() {
        let q = skewed();
        assert_eq!(q.left(), 100.0);
        assert_eq!(q.right(), 200.0);
        assert_eq!(q.top(), 0.0);
        assert_eq!(q.bottom(), 24.0);
        assert_eq!(q.center_x(), 151.0);
    }

    #[test]
    fn test_degenerate_quad() {
        let q = Quad::from_bounds(50.0, 10.0, 50.0, 10.0);
        assert_eq!(q.left(), q.right());
        assert_eq!(q.top(), q.bottom());
        let r = q.pixel_rect();
        assert_eq!((r.x0, r.y0), (r.x1, r.y1));
    }

    #[test]
    fn test_pixel_rect_orders_corners() {
        let r = PixelRect::from_corners(Point::new(30.5, 40.9), Point::new(10.2, 5.0));
        assert_eq!(r, PixelRect { x0: 10, y0: 5, x1: 30, y1: 40 });
    }
}
