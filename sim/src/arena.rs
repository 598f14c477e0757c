//! Pitch geometry and ray queries.
//!
//! Everything is resolved on the ground plane. Walls and goal mouths are
//! one-sided segments facing into the pitch; vehicles are hit circles.

use crate::vehicle::VehicleId;
use hyperbol_shared::config::ArenaConfig;
use hyperbol_shared::team::Team;
use hyperbol_shared::vec3::{along, dot, flatten, ground, normalize_or_zero, sub, Vec3};

/// Hits closer than this to the ray origin are ignored, so a ray cast from a
/// contact point does not immediately re-hit the surface it left.
const MIN_HIT_DISTANCE: f64 = 1e-7;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitKind {
    Wall,
    /// Goal mouth defended by the given team
    Goal(Team),
    Vehicle(VehicleId),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    pub distance: f64,
    pub point: Vec3,
    /// Unit surface normal at the hit, on the ground plane
    pub normal: Vec3,
    pub kind: HitKind,
}

/// Hit circle of a vehicle as seen by ray queries.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VehicleCollider {
    pub id: VehicleId,
    pub center: Vec3,
    pub radius: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Segment {
    a: Vec3,
    b: Vec3,
    /// Faces into the pitch
    normal: Vec3,
    kind: HitKind,
}

impl Segment {
    fn new(a: Vec3, b: Vec3, normal: Vec3, kind: HitKind) -> Self {
        Self { a, b, normal, kind }
    }

    fn raycast(&self, origin: Vec3, dir: Vec3, max_distance: f64) -> Option<RayHit> {
        // One-sided: only rays heading into the front face count.
        if dot(dir, self.normal) >= 0.0 {
            return None;
        }

        let edge = sub(self.b, self.a);
        let denom = cross2(dir, edge);
        if denom.abs() < 1e-12 {
            return None;
        }

        let to_start = sub(self.a, origin);
        let t = cross2(to_start, edge) / denom;
        let s = cross2(to_start, dir) / denom;
        if t < MIN_HIT_DISTANCE || t > max_distance || !(0.0..=1.0).contains(&s) {
            return None;
        }

        Some(RayHit {
            distance: t,
            point: along(origin, dir, t),
            normal: self.normal,
            kind: self.kind,
        })
    }
}

/// 2D cross product on the ground plane.
fn cross2(a: Vec3, b: Vec3) -> f64 {
    a.x * b.z - a.z * b.x
}

fn raycast_circle(
    collider: &VehicleCollider,
    origin: Vec3,
    dir: Vec3,
    max_distance: f64,
) -> Option<RayHit> {
    let center = flatten(collider.center);
    let m = sub(origin, center);
    let b = dot(m, dir);
    let c = dot(m, m) - collider.radius * collider.radius;
    // Starting inside the circle is an overlap, not a ray hit.
    if c <= 0.0 || b > 0.0 {
        return None;
    }
    let discriminant = b * b - c;
    if discriminant < 0.0 {
        return None;
    }
    let t = -b - discriminant.sqrt();
    if t < MIN_HIT_DISTANCE || t > max_distance {
        return None;
    }

    let point = along(origin, dir, t);
    Some(RayHit {
        distance: t,
        point,
        normal: normalize_or_zero(sub(point, center)),
        kind: HitKind::Vehicle(collider.id),
    })
}

/// The pitch: perimeter walls with a goal mouth in each end wall.
#[derive(Debug, Clone)]
pub struct Arena {
    pub config: ArenaConfig,
    segments: Vec<Segment>,
}

impl Arena {
    pub fn new(config: ArenaConfig) -> Self {
        let l = config.half_length;
        let w = config.half_width;
        let g = config.goal_half_width;

        let plus_x = ground(1.0, 0.0);
        let minus_x = ground(-1.0, 0.0);
        let plus_z = ground(0.0, 1.0);
        let minus_z = ground(0.0, -1.0);

        let segments = vec![
            // Side walls
            Segment::new(ground(-l, -w), ground(l, -w), plus_z, HitKind::Wall),
            Segment::new(ground(-l, w), ground(l, w), minus_z, HitKind::Wall),
            // Red end (-X)
            Segment::new(ground(-l, -w), ground(-l, -g), plus_x, HitKind::Wall),
            Segment::new(ground(-l, g), ground(-l, w), plus_x, HitKind::Wall),
            Segment::new(ground(-l, -g), ground(-l, g), plus_x, HitKind::Goal(Team::Red)),
            // Blue end (+X)
            Segment::new(ground(l, -w), ground(l, -g), minus_x, HitKind::Wall),
            Segment::new(ground(l, g), ground(l, w), minus_x, HitKind::Wall),
            Segment::new(ground(l, -g), ground(l, g), minus_x, HitKind::Goal(Team::Blue)),
        ];

        Self { config, segments }
    }

    /// Nearest hit along the ray against walls, goal mouths and vehicles.
    /// `dir` must be a unit ground-plane vector.
    pub fn raycast(
        &self,
        origin: Vec3,
        dir: Vec3,
        max_distance: f64,
        vehicles: &[VehicleCollider],
    ) -> Option<RayHit> {
        let origin = flatten(origin);
        let static_hit = self.raycast_static(origin, dir, max_distance);
        let limit = static_hit.map_or(max_distance, |h| h.distance);

        let vehicle_hit = vehicles
            .iter()
            .filter_map(|v| raycast_circle(v, origin, dir, limit))
            .min_by(|a, b| a.distance.total_cmp(&b.distance));

        vehicle_hit.or(static_hit)
    }

    /// Nearest hit against walls and goal mouths only.
    pub fn raycast_static(&self, origin: Vec3, dir: Vec3, max_distance: f64) -> Option<RayHit> {
        let origin = flatten(origin);
        self.segments
            .iter()
            .filter_map(|s| s.raycast(origin, dir, max_distance))
            .min_by(|a, b| a.distance.total_cmp(&b.distance))
    }

    /// First vehicle whose hit circle overlaps a ball of `radius` at `center`.
    pub fn overlapping_vehicle(
        &self,
        center: Vec3,
        radius: f64,
        vehicles: &[VehicleCollider],
    ) -> Option<VehicleId> {
        let center = flatten(center);
        vehicles
            .iter()
            .find(|v| {
                let d = sub(center, flatten(v.center));
                let reach = v.radius + radius;
                dot(d, d) < reach * reach
            })
            .map(|v| v.id)
    }

    /// Keep a body of `radius` inside the perimeter. Returns the corrected
    /// position and which axes were pushed back, so the caller can cancel
    /// velocity along them.
    pub fn confine(&self, position: Vec3, radius: f64) -> (Vec3, bool, bool) {
        let max_x = (self.config.half_length - radius).max(0.0);
        let max_z = (self.config.half_width - radius).max(0.0);
        let x = position.x.clamp(-max_x, max_x);
        let z = position.z.clamp(-max_z, max_z);
        (
            Vec3::new(x, position.y, z),
            x != position.x,
            z != position.z,
        )
    }

    pub fn is_out_of_bounds(&self, position: Vec3) -> bool {
        self.config.is_out_of_bounds(position)
    }

    pub fn ball_start(&self) -> Vec3 {
        self.config.ball_start
    }

    /// Centre of the goal mouth defended by `team`.
    pub fn goal_center(&self, team: Team) -> Vec3 {
        let x = match team {
            Team::Red => -self.config.half_length,
            Team::Blue => self.config.half_length,
        };
        ground(x, 0.0)
    }
}
