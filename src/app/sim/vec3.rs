use std::ops::{Add, AddAssign, Div, DivAssign, Mul, MulAssign, Neg, Sub, SubAssign};

/// Layout-space vector. The solver always works in three components; 2D
/// layouts simply never produce a z component, so z stays at zero.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

pub const fn vec3(x: f32, y: f32, z: f32) -> Vec3 {
    Vec3 { x, y, z }
}

impl Vec3 {
    pub const ZERO: Vec3 = vec3(0.0, 0.0, 0.0);

    pub fn length_sq(self) -> f32 {
        (self.x * self.x) + (self.y * self.y) + (self.z * self.z)
    }

    pub fn length(self) -> f32 {
        self.length_sq().sqrt()
    }

    /// Unit vector, or `fallback` when the length is degenerate.
    pub fn normalized_or(self, fallback: Vec3) -> Vec3 {
        let length = self.length();
        if length > 0.0001 { self / length } else { fallback }
    }

    /// Componentwise clamp into the box [-half_extents, half_extents].
    pub fn clamp_box(self, half_extents: Vec3) -> Vec3 {
        vec3(
            self.x.clamp(-half_extents.x, half_extents.x),
            self.y.clamp(-half_extents.y, half_extents.y),
            self.z.clamp(-half_extents.z, half_extents.z),
        )
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl Add for Vec3 {
    type Output = Vec3;
    fn add(self, rhs: Vec3) -> Vec3 {
        vec3(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vec3 {
    type Output = Vec3;
    fn sub(self, rhs: Vec3) -> Vec3 {
        vec3(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Neg for Vec3 {
    type Output = Vec3;
    fn neg(self) -> Vec3 {
        vec3(-self.x, -self.y, -self.z)
    }
}

impl Mul<f32> for Vec3 {
    type Output = Vec3;
    fn mul(self, rhs: f32) -> Vec3 {
        vec3(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl Div<f32> for Vec3 {
    type Output = Vec3;
    fn div(self, rhs: f32) -> Vec3 {
        vec3(self.x / rhs, self.y / rhs, self.z / rhs)
    }
}

impl AddAssign for Vec3 {
    fn add_assign(&mut self, rhs: Vec3) {
        *self = *self + rhs;
    }
}

impl SubAssign for Vec3 {
    fn sub_assign(&mut self, rhs: Vec3) {
        *self = *self - rhs;
    }
}

impl MulAssign<f32> for Vec3 {
    fn mul_assign(&mut self, rhs: f32) {
        *self = *self * rhs;
    }
}

impl DivAssign<f32> for Vec3 {
    fn div_assign(&mut self, rhs: f32) {
        *self = *self / rhs;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalized_or_uses_fallback_for_degenerate_vectors() {
        let fallback = vec3(1.0, 0.0, 0.0);
        assert_eq!(Vec3::ZERO.normalized_or(fallback), fallback);

        let unit = vec3(3.0, 0.0, 4.0).normalized_or(fallback);
        assert!((unit.length() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn clamp_box_limits_each_component() {
        let clamped = vec3(500.0, -500.0, 10.0).clamp_box(vec3(100.0, 100.0, 0.0));
        assert_eq!(clamped, vec3(100.0, -100.0, 0.0));
    }
}
