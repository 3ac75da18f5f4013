use serde::{Deserialize, Serialize};

/// Corner-form bounding box `(x1, y1)`–`(x2, y2)`.
#[derive(Default, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl BBox {
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Builds a corner-form box from center coordinates and size.
    ///
    /// # Arguments
    ///
    /// * `cx` - The x-coordinate of the horizontal center.
    /// * `cy` - The y-coordinate of the vertical center.
    /// * `w` - The width of the bounding box.
    /// * `h` - The height of the bounding box.
    pub fn from_cxcywh(cx: f32, cy: f32, w: f32, h: f32) -> Self {
        Self {
            x1: cx - w / 2.0,
            y1: cy - h / 2.0,
            x2: cx + w / 2.0,
            y2: cy + h / 2.0,
        }
    }

    /// Returns the width of the bounding box.
    pub fn width(&self) -> f32 {
        self.x2 - self.x1
    }

    /// Returns the height of the bounding box.
    pub fn height(&self) -> f32 {
        self.y2 - self.y1
    }

    /// Returns the center coordinates and size of the bounding box as `(cx, cy, w, h)`.
    pub fn cxcywh(&self) -> (f32, f32, f32, f32) {
        (
            self.x1 + self.width() / 2.,
            self.y1 + self.height() / 2.,
            self.width(),
            self.height(),
        )
    }

    /// Returns the bounding box coordinates as `(x1, y1, x2, y2)`.
    pub fn xyxy(&self) -> (f32, f32, f32, f32) {
        (self.x1, self.y1, self.x2, self.y2)
    }

    /// Computes the area of the bounding box. Degenerate boxes have zero area.
    pub fn area(&self) -> f32 {
        self.width().max(0.) * self.height().max(0.)
    }

    /// Computes the intersection area between this bounding box and another.
    pub fn intersect(&self, other: &BBox) -> f32 {
        let left = self.x1.max(other.x1);
        let right = self.x2.min(other.x2);
        let top = self.y1.max(other.y1);
        let bottom = self.y2.min(other.y2);
        (right - left).max(0.) * (bottom - top).max(0.)
    }

    /// Computes the union area between this bounding box and another.
    pub fn union(&self, other: &BBox) -> f32 {
        self.area() + other.area() - self.intersect(other)
    }

    /// Intersection over union. Two empty boxes have an IoU of zero.
    pub fn iou(&self, other: &BBox) -> f32 {
        let union = self.union(other);
        if union <= 0. {
            return 0.;
        }
        self.intersect(other) / union
    }

    /// Shifts both corners by the same amount along both axes.
    pub fn offset(&self, delta: f32) -> Self {
        Self {
            x1: self.x1 + delta,
            y1: self.y1 + delta,
            x2: self.x2 + delta,
            y2: self.y2 + delta,
        }
    }

    /// Checks if this bounding box completely contains another bounding box `other`.
    pub fn contains(&self, other: &BBox) -> bool {
        self.x1 <= other.x1 && self.x2 >= other.x2 && self.y1 <= other.y1 && self.y2 >= other.y2
    }

    pub fn as_xyxy_i32(&self) -> (i32, i32, i32, i32) {
        (
            self.x1.round() as i32,
            self.y1.round() as i32,
            self.x2.round() as i32,
            self.y2.round() as i32,
        )
    }
}
