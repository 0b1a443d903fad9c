pub mod floating;

use serde::{Deserialize, Serialize};

/// Window box in CSS pixels, relative to the viewport's top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Geometry {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Geometry {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Clamp that tolerates an inverted range by collapsing onto `min`.
pub(crate) fn clamp_lenient(value: f64, min: f64, max: f64) -> f64 {
    value.min(max.max(min)).max(min)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_lenient_handles_inverted_range() {
        assert_eq!(clamp_lenient(5.0, 0.0, 10.0), 5.0);
        assert_eq!(clamp_lenient(-5.0, 0.0, 10.0), 0.0);
        assert_eq!(clamp_lenient(50.0, 0.0, 10.0), 10.0);
        // max < min: everything lands on min instead of panicking like f64::clamp
        assert_eq!(clamp_lenient(50.0, 20.0, 10.0), 20.0);
    }

    #[test]
    fn geometry_edges() {
        let g = Geometry::new(10.0, 20.0, 100.0, 50.0);
        assert_eq!(g.right(), 110.0);
        assert_eq!(g.bottom(), 70.0);
    }
}
