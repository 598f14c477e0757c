/// 3D vector utilities for the arena.
/// The pitch lies in the XZ plane; Y is up and is flattened away for anything
/// that moves along the ground.

#[derive(Debug, Clone, Copy, Default, serde::Serialize, serde::Deserialize, PartialEq)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3 {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };
    pub const X: Vec3 = Vec3 {
        x: 1.0,
        y: 0.0,
        z: 0.0,
    };
    pub const Z: Vec3 = Vec3 {
        x: 0.0,
        y: 0.0,
        z: 1.0,
    };

    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn to_array(self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }

    pub fn is_zero(self) -> bool {
        self.x == 0.0 && self.y == 0.0 && self.z == 0.0
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

/// Shorthand constructor
pub fn vec3(x: f64, y: f64, z: f64) -> Vec3 {
    Vec3::new(x, y, z)
}

/// Point on the ground plane
pub fn ground(x: f64, z: f64) -> Vec3 {
    Vec3::new(x, 0.0, z)
}

/// Dot product
pub fn dot(a: Vec3, b: Vec3) -> f64 {
    a.x * b.x + a.y * b.y + a.z * b.z
}

/// Vector length
pub fn length(v: Vec3) -> f64 {
    dot(v, v).sqrt()
}

/// Distance between two points
pub fn distance(a: Vec3, b: Vec3) -> f64 {
    length(sub(a, b))
}

/// Normalize to unit length. Near-zero vectors come back as zero, since a
/// resting ball has no direction.
pub fn normalize_or_zero(v: Vec3) -> Vec3 {
    let len = length(v);
    if len < 1e-10 {
        return Vec3::ZERO;
    }
    scale(v, 1.0 / len)
}

pub fn scale(v: Vec3, s: f64) -> Vec3 {
    Vec3::new(v.x * s, v.y * s, v.z * s)
}

pub fn add(a: Vec3, b: Vec3) -> Vec3 {
    Vec3::new(a.x + b.x, a.y + b.y, a.z + b.z)
}

pub fn sub(a: Vec3, b: Vec3) -> Vec3 {
    Vec3::new(a.x - b.x, a.y - b.y, a.z - b.z)
}

/// `origin + dir * t`
pub fn along(origin: Vec3, dir: Vec3, t: f64) -> Vec3 {
    add(origin, scale(dir, t))
}

/// Drop the vertical component.
pub fn flatten(v: Vec3) -> Vec3 {
    Vec3::new(v.x, 0.0, v.z)
}

/// Unit direction on the ground plane, or zero if there is none.
pub fn ground_direction(v: Vec3) -> Vec3 {
    normalize_or_zero(flatten(v))
}

/// Reflect `dir` about a surface `normal`. The normal need not be unit length.
pub fn reflect(dir: Vec3, normal: Vec3) -> Vec3 {
    let n = normalize_or_zero(normal);
    sub(dir, scale(n, 2.0 * dot(dir, n)))
}

/// Scale `v` down so its length does not exceed `max_length`.
pub fn clamp_magnitude(v: Vec3, max_length: f64) -> Vec3 {
    let len = length(v);
    if len > max_length && len > 0.0 {
        scale(v, max_length / len)
    } else {
        v
    }
}

/// Ground-plane heading of `v` in radians, measured from +X towards +Z.
pub fn ground_angle(v: Vec3) -> f64 {
    v.z.atan2(v.x)
}

/// Unit ground vector for a heading produced by [`ground_angle`].
pub fn from_ground_angle(angle: f64) -> Vec3 {
    Vec3::new(angle.cos(), 0.0, angle.sin())
}

/// Forward axis for a yaw in degrees, where 0 faces +Z and positive yaw turns
/// clockwise seen from above.
pub fn forward_from_yaw(yaw_degrees: f64) -> Vec3 {
    let yaw = yaw_degrees.to_radians();
    Vec3::new(yaw.sin(), 0.0, yaw.cos())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn assert_vec3_close(actual: Vec3, expected: Vec3) {
        assert!(
            (actual.x - expected.x).abs() < 1e-6
                && (actual.y - expected.y).abs() < 1e-6
                && (actual.z - expected.z).abs() < 1e-6,
            "Expected {:?} to be close to {:?}",
            actual,
            expected
        );
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-6,
            "Expected {} to be close to {}",
            actual,
            expected
        );
    }

    #[test]
    fn length_of_3_4_0_is_5() {
        assert_eq!(length(vec3(3.0, 4.0, 0.0)), 5.0);
    }

    #[test]
    fn normalize_returns_unit_vector() {
        let v = normalize_or_zero(vec3(3.0, 4.0, 0.0));
        assert_close(length(v), 1.0);
        assert_vec3_close(v, vec3(0.6, 0.8, 0.0));
    }

    #[test]
    fn normalize_zero_stays_zero() {
        assert_eq!(normalize_or_zero(Vec3::ZERO), Vec3::ZERO);
    }

    #[test]
    fn ground_direction_drops_height() {
        let d = ground_direction(vec3(3.0, 10.0, 4.0));
        assert_vec3_close(d, vec3(0.6, 0.0, 0.8));
    }

    #[test]
    fn reflect_off_vertical_wall_flips_x() {
        let dir = normalize_or_zero(vec3(1.0, 0.0, 1.0));
        let r = reflect(dir, vec3(-1.0, 0.0, 0.0));
        assert_vec3_close(r, normalize_or_zero(vec3(-1.0, 0.0, 1.0)));
    }

    #[test]
    fn reflect_accepts_unnormalized_normal() {
        let r = reflect(vec3(0.0, 0.0, -1.0), vec3(0.0, 0.0, 5.0));
        assert_vec3_close(r, vec3(0.0, 0.0, 1.0));
    }

    #[test]
    fn reflect_preserves_length() {
        let dir = normalize_or_zero(vec3(0.3, 0.0, -0.7));
        let r = reflect(dir, normalize_or_zero(vec3(1.0, 0.0, 2.0)));
        assert_close(length(r), 1.0);
    }

    #[test]
    fn clamp_magnitude_limits_long_vectors() {
        let v = clamp_magnitude(vec3(30.0, 0.0, 40.0), 10.0);
        assert_close(length(v), 10.0);
        assert_vec3_close(v, vec3(6.0, 0.0, 8.0));
    }

    #[test]
    fn clamp_magnitude_leaves_short_vectors() {
        let v = vec3(1.0, 0.0, 1.0);
        assert_eq!(clamp_magnitude(v, 10.0), v);
    }

    #[test]
    fn ground_angle_round_trips() {
        for angle in [0.0, 0.5, PI / 2.0, 2.5, -1.0] {
            assert_close(ground_angle(from_ground_angle(angle)), angle);
        }
    }

    #[test]
    fn forward_from_yaw_follows_clockwise_convention() {
        assert_vec3_close(forward_from_yaw(0.0), vec3(0.0, 0.0, 1.0));
        assert_vec3_close(forward_from_yaw(90.0), vec3(1.0, 0.0, 0.0));
        assert_vec3_close(forward_from_yaw(180.0), vec3(0.0, 0.0, -1.0));
    }
}
