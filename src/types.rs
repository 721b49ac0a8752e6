use serde::{Deserialize, Serialize};

/// Stable identifier of a branch node, unique for the organism's lifetime.
pub type NodeId = u32;

#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Point reached by walking `length` along `angle` (radians, y grows downward).
    pub fn offset(self, angle: f32, length: f32) -> Self {
        Self {
            x: self.x + angle.cos() * length,
            y: self.y + angle.sin() * length,
        }
    }
}

#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_straight_up_decreases_y() {
        let p = Point::new(10.0, 100.0).offset(-std::f32::consts::FRAC_PI_2, 20.0);
        assert!((p.x - 10.0).abs() < 1e-4);
        assert!((p.y - 80.0).abs() < 1e-4);
    }

    #[test]
    fn lerp_endpoints() {
        assert_eq!(lerp(-0.35, 0.25, 0.0), -0.35);
        assert!((lerp(-0.35, 0.25, 1.0) - 0.25).abs() < 1e-6);
    }
}
