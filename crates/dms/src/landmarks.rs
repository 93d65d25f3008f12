//! Facial landmark frames and eye geometry

use serde::{Deserialize, Serialize};

/// A landmark position in normalized image coordinates ([0, 1] on both axes)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point2 {
    pub x: f32,
    pub y: f32,
}

impl Point2 {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to `other`
    pub fn distance(&self, other: &Point2) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl From<(f32, f32)> for Point2 {
    fn from((x, y): (f32, f32)) -> Self {
        Self { x, y }
    }
}

/// One snapshot of facial keypoints, addressed by position
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LandmarkFrame {
    points: Vec<Point2>,
}

impl LandmarkFrame {
    pub fn new(points: Vec<Point2>) -> Self {
        Self { points }
    }

    pub fn get(&self, index: usize) -> Option<Point2> {
        self.points.get(index).copied()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[Point2] {
        &self.points
    }

    /// Overwrite a single landmark, growing the frame if needed
    #[cfg(test)]
    pub(crate) fn set(&mut self, index: usize, point: Point2) {
        if index >= self.points.len() {
            self.points.resize(index + 1, Point2::default());
        }
        self.points[index] = point;
    }
}

impl From<Vec<Point2>> for LandmarkFrame {
    fn from(points: Vec<Point2>) -> Self {
        Self::new(points)
    }
}

impl FromIterator<Point2> for LandmarkFrame {
    fn from_iter<I: IntoIterator<Item = Point2>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// A pair of landmark indices
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexPair {
    pub a: usize,
    pub b: usize,
}

/// Landmark indices describing one eye
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EyeLandmarks {
    /// Inner / outer corner
    pub corners: IndexPair,
    /// First top / bottom eyelid pair
    pub vertical_1: IndexPair,
    /// Second top / bottom eyelid pair
    pub vertical_2: IndexPair,
}

impl EyeLandmarks {
    /// Highest index this eye refers to
    pub fn max_index(&self) -> usize {
        [
            self.corners.a,
            self.corners.b,
            self.vertical_1.a,
            self.vertical_1.b,
            self.vertical_2.a,
            self.vertical_2.b,
        ]
        .into_iter()
        .max()
        .unwrap_or(0)
    }
}

/// Face-mesh (468 point) eye indices
pub mod eye_indices {
    use super::{EyeLandmarks, IndexPair};

    /// Number of points in a full face-mesh frame
    pub const FACE_MESH_POINTS: usize = 468;

    pub const LEFT_EYE: EyeLandmarks = EyeLandmarks {
        corners: IndexPair { a: 133, b: 33 },
        vertical_1: IndexPair { a: 160, b: 144 },
        vertical_2: IndexPair { a: 158, b: 153 },
    };

    pub const RIGHT_EYE: EyeLandmarks = EyeLandmarks {
        corners: IndexPair { a: 362, b: 263 },
        vertical_1: IndexPair { a: 385, b: 380 },
        vertical_2: IndexPair { a: 387, b: 373 },
    };
}
