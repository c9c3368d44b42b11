//! # World Module
//!
//! Spatial primitives, the generated room graph, and the engine capability boundary.
//!
//! Everything the generator knows about the engine goes through [`WorldHost`]. The
//! generator itself only manipulates plain data: transforms, connection points, and the
//! arena-backed [`MapLayout`].

pub mod host;
pub mod layout;
pub mod sandbox;

pub use host::*;
pub use layout::*;
pub use sandbox::*;

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Tolerance used when comparing facings and overlap extents.
pub const GEOMETRY_EPSILON: f32 = 1e-3;

/// Penetration depth below which touching boxes are not considered overlapping.
///
/// Room coordinates run into the hundreds of thousands, where `f32` rounding alone is
/// well above [`GEOMETRY_EPSILON`].
pub const OVERLAP_TOLERANCE: f32 = 0.1;

/// Location plus yaw (degrees about +Z).
///
/// Rooms in this game only ever turn around the vertical axis, so pitch and roll are not
/// represented.
///
/// # Examples
///
/// ```
/// use glam::Vec3;
/// use portalcrawl::Transform;
///
/// let room = Transform::new(Vec3::new(100.0, 0.0, 0.0), 90.0);
/// let local = Transform::new(Vec3::new(10.0, 0.0, 0.0), 0.0);
/// let world = room.apply(&local);
/// assert!((world.location - Vec3::new(100.0, 10.0, 0.0)).length() < 1e-3);
/// assert!((world.yaw - 90.0).abs() < 1e-3);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub location: Vec3,
    pub yaw: f32,
}

impl Transform {
    pub fn new(location: Vec3, yaw: f32) -> Self {
        Self {
            location,
            yaw: normalize_yaw(yaw),
        }
    }

    pub fn identity() -> Self {
        Self::new(Vec3::ZERO, 0.0)
    }

    pub fn at(location: Vec3) -> Self {
        Self::new(location, 0.0)
    }

    /// Rotation around the vertical axis.
    pub fn rotation(&self) -> Quat {
        Quat::from_rotation_z(self.yaw.to_radians())
    }

    /// Unit facing vector.
    pub fn forward(&self) -> Vec3 {
        self.rotation() * Vec3::X
    }

    /// Composes a local transform onto this one, producing a world transform.
    pub fn apply(&self, local: &Transform) -> Transform {
        Transform::new(
            self.location + self.rotation() * local.location,
            self.yaw + local.yaw,
        )
    }

    /// Moves along the facing by `distance` (negative moves backward).
    pub fn offset_forward(&self, distance: f32) -> Transform {
        Transform::new(self.location + self.forward() * distance, self.yaw)
    }

    /// Same location, rotated by an additional yaw.
    pub fn turned(&self, degrees: f32) -> Transform {
        Transform::new(self.location, self.yaw + degrees)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

/// Wraps a yaw into `(-180, 180]`.
pub fn normalize_yaw(degrees: f32) -> f32 {
    let mut wrapped = degrees % 360.0;
    if wrapped <= -180.0 {
        wrapped += 360.0;
    } else if wrapped > 180.0 {
        wrapped -= 360.0;
    }
    wrapped
}

/// Yaw delta that rotates `from` onto `to` along the shortest arc.
///
/// The angle of the shortest-arc quaternion is signed by the vertical component of its
/// rotation axis. Anti-parallel facings have no unique shortest arc, so they resolve to a
/// half turn around +Z.
pub fn shortest_arc_yaw(from: Vec3, to: Vec3) -> f32 {
    let from = from.normalize_or_zero();
    let to = to.normalize_or_zero();
    if from == Vec3::ZERO || to == Vec3::ZERO {
        return 0.0;
    }
    if from.dot(to) < -1.0 + GEOMETRY_EPSILON {
        return 180.0;
    }
    let (axis, angle) = Quat::from_rotation_arc(from, to).to_axis_angle();
    angle.to_degrees() * axis.z
}

/// Axis-aligned box in world space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self {
            min: min.min(max),
            max: min.max(max),
        }
    }

    /// Bounds of a box with the given half extents after it is moved by `transform`.
    pub fn from_half_extents(transform: &Transform, half_extents: Vec3) -> Self {
        let rotation = transform.rotation();
        let corners = [
            Vec3::new(half_extents.x, half_extents.y, 0.0),
            Vec3::new(-half_extents.x, half_extents.y, 0.0),
            Vec3::new(half_extents.x, -half_extents.y, 0.0),
            Vec3::new(-half_extents.x, -half_extents.y, 0.0),
        ];
        let mut min = Vec3::splat(f32::MAX);
        let mut max = Vec3::splat(f32::MIN);
        for corner in corners {
            let rotated = rotation * corner;
            min = min.min(rotated);
            max = max.max(rotated);
        }
        min.z = -half_extents.z;
        max.z = half_extents.z;
        Self::new(transform.location + min, transform.location + max)
    }

    /// Strict overlap; boxes that only share a face do not intersect.
    pub fn intersects(&self, other: &Aabb) -> bool {
        self.min.x < other.max.x - OVERLAP_TOLERANCE
            && other.min.x < self.max.x - OVERLAP_TOLERANCE
            && self.min.y < other.max.y - OVERLAP_TOLERANCE
            && other.min.y < self.max.y - OVERLAP_TOLERANCE
            && self.min.z < other.max.z - OVERLAP_TOLERANCE
            && other.min.z < self.max.z - OVERLAP_TOLERANCE
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }
}

/// Role of a connection point on its room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PointRole {
    Entrance,
    Exit,
    Puzzle,
}

/// Labeled attachment location on a room.
///
/// The transform is local to the owning room. A consumed point has been used by a doorway
/// or portal and is not offered again until it is explicitly released.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionPoint {
    pub label: String,
    pub role: PointRole,
    pub local: Transform,
    pub consumed: bool,
    pub placeholder_visible: bool,
}

impl ConnectionPoint {
    pub fn new(label: impl Into<String>, role: PointRole, local: Transform) -> Self {
        Self {
            label: label.into(),
            role,
            local,
            consumed: false,
            placeholder_visible: false,
        }
    }

    pub fn is_available(&self) -> bool {
        !self.consumed
    }

    /// World transform of this point for a room placed at `room`.
    pub fn world(&self, room: &Transform) -> Transform {
        room.apply(&self.local)
    }
}
