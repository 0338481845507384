use serde::{Deserialize, Serialize};

/// Axis-aligned box in page pixel coordinates.
///
/// `width` and `height` are never negative; [`Rect::new`] clamps them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width: width.max(0),
            height: height.max(0),
        }
    }

    /// Build a rect from inclusive-exclusive edges.
    pub fn from_edges(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self::new(left, top, right - left, bottom - top)
    }

    pub fn right(&self) -> i32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.height
    }

    pub fn area(&self) -> i64 {
        self.width as i64 * self.height as i64
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn center(&self) -> (f64, f64) {
        (
            self.x as f64 + self.width as f64 / 2.0,
            self.y as f64 + self.height as f64 / 2.0,
        )
    }

    /// Grow by `mx` on the left and right and by `my` on the top and bottom.
    pub fn expand(&self, mx: i32, my: i32) -> Self {
        Self::new(
            self.x - mx,
            self.y - my,
            self.width + 2 * mx,
            self.height + 2 * my,
        )
    }

    /// Smallest rect covering both.
    pub fn union(&self, other: &Rect) -> Self {
        Self::from_edges(
            self.x.min(other.x),
            self.y.min(other.y),
            self.right().max(other.right()),
            self.bottom().max(other.bottom()),
        )
    }

    /// Two rects are disjoint only when one lies entirely to the left, right,
    /// above or below the other. Shared edges count as touching.
    pub fn intersects(&self, other: &Rect) -> bool {
        !(self.right() < other.x
            || other.right() < self.x
            || self.bottom() < other.y
            || other.bottom() < self.y)
    }

    pub fn contains(&self, other: &Rect) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }

    /// Clip to `[0, width) x [0, height)`.
    pub fn clamp_to(&self, width: u32, height: u32) -> Self {
        let (w, h) = (width as i32, height as i32);
        let left = self.x.clamp(0, w);
        let top = self.y.clamp(0, h);
        let right = self.right().clamp(0, w);
        let bottom = self.bottom().clamp(0, h);
        Self::from_edges(left, top, right.max(left), bottom.max(top))
    }

    pub fn translate(&self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy, self.width, self.height)
    }

    /// Manhattan distance between the centers of two rects.
    pub fn center_distance(&self, other: &Rect) -> f64 {
        let (ax, ay) = self.center();
        let (bx, by) = other.center();
        (ax - bx).abs() + (ay - by).abs()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

/// Four-corner polygon as returned by a text detection engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quad {
    pub points: [Point; 4],
}

impl Quad {
    pub fn from_rect(rect: &Rect) -> Self {
        let (l, t, r, b) = (
            rect.x as f32,
            rect.y as f32,
            rect.right() as f32,
            rect.bottom() as f32,
        );
        Self {
            points: [
                Point { x: l, y: t },
                Point { x: r, y: t },
                Point { x: r, y: b },
                Point { x: l, y: b },
            ],
        }
    }

    /// Axis-aligned bounding rect of the corners.
    pub fn bounding_rect(&self) -> Rect {
        let xs = self.points.iter().map(|p| p.x);
        let ys = self.points.iter().map(|p| p.y);
        let min_x = xs.clone().fold(f32::INFINITY, f32::min);
        let max_x = xs.fold(f32::NEG_INFINITY, f32::max);
        let min_y = ys.clone().fold(f32::INFINITY, f32::min);
        let max_y = ys.fold(f32::NEG_INFINITY, f32::max);
        Rect::from_edges(
            min_x.floor() as i32,
            min_y.floor() as i32,
            max_x.ceil() as i32,
            max_y.ceil() as i32,
        )
    }

    pub fn translate(&self, dx: f32, dy: f32) -> Self {
        let mut points = self.points;
        for p in points.iter_mut() {
            p.x += dx;
            p.y += dy;
        }
        Self { points }
    }
}

/// A recognized text instance in page coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub text: String,
    pub confidence: f32,
    pub rect: Rect,
    pub raw_quad: Quad,
}

/// A rectangular frame found on the page. Panels may overlap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Panel {
    pub rect: Rect,
}

/// A cluster of adjacent detections treated as one speech balloon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bubble {
    /// Tight union of the member rects.
    pub rect: Rect,
    /// Detection indices in reading order.
    pub member_indices: Vec<usize>,
    pub text: String,
}

/// A bubble whose text was replaced by the translation engine.
/// `confidence` is translation trust, not detection trust.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslatedBubble {
    pub rect: Rect,
    pub text: String,
    pub confidence: f32,
}
