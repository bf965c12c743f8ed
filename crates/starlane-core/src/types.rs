//! Fundamental identifiers and geometric helpers.

use std::f64::consts::{PI, TAU};
use std::fmt;

use glam::DVec3;
use serde::{Deserialize, Serialize};

/// Stable, opaque identity of an entity. Survives save/load and replication.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub String);

/// Stable identity of a system.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SystemId(pub String);

impl EntityId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl SystemId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for SystemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<&str> for SystemId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Simulation time tracking.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimTime {
    /// Current tick number (increments by 1 each tick).
    pub tick: u64,
}

impl SimTime {
    pub fn advance(&mut self) {
        self.tick += 1;
    }
}

/// Wrap an angle into (-PI, PI].
pub fn wrap_angle(angle: f64) -> f64 {
    let wrapped = (angle + PI).rem_euclid(TAU) - PI;
    if wrapped <= -PI {
        wrapped + TAU
    } else {
        wrapped
    }
}

/// Pitch/yaw rotation (radians, roll zero) that faces from `from` toward `to`.
/// Returns `None` when the points coincide.
pub fn look_rotation(from: DVec3, to: DVec3) -> Option<DVec3> {
    let delta = to - from;
    if delta.length_squared() == 0.0 {
        return None;
    }
    let yaw = delta.x.atan2(delta.z);
    let pitch = -delta.y.atan2(delta.x.hypot(delta.z));
    Some(DVec3::new(pitch, yaw, 0.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_angle_range() {
        for raw in [-10.0, -PI, -1.0, 0.0, 1.0, PI, 3.5, 7.0, 100.0] {
            let wrapped = wrap_angle(raw);
            assert!(wrapped > -PI && wrapped <= PI, "{raw} wrapped to {wrapped}");
            let turns = (raw - wrapped) / TAU;
            assert!((turns - turns.round()).abs() < 1e-9, "wrap must preserve direction");
        }
        assert_eq!(wrap_angle(-PI), PI, "-PI maps onto PI");
    }

    #[test]
    fn test_look_rotation_faces_target() {
        let rot = look_rotation(DVec3::ZERO, DVec3::new(1.0, 0.0, 0.0)).unwrap();
        assert!((rot.y - PI / 2.0).abs() < 1e-12);
        assert_eq!(rot.x, 0.0);
        assert!(look_rotation(DVec3::ONE, DVec3::ONE).is_none());
    }
}
