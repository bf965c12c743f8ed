//! Path following and kinematic integration.
//!
//! position += velocity each tick. An entity with waypoints steers its
//! velocity toward the head waypoint, capped by its speed, and pops the
//! head once within `WAYPOINT_THRESHOLD`.

use glam::DVec3;

use starlane_core::catalog::ship_spec;
use starlane_core::components::{PathQueue, ShipState, Transform};
use starlane_core::constants::{PATH_STEERING, SHIP_VELOCITY_DAMPING, WAYPOINT_THRESHOLD};
use starlane_core::enums::EntityKind;
use starlane_core::types::{look_rotation, wrap_angle, EntityId};
use starlane_core::SimError;

use crate::level::Level;

/// Speed of entities without a ship spec.
const DEFAULT_SPEED: f64 = 1.0;

pub fn run(level: &mut Level, id: &EntityId, kind: EntityKind) -> Result<(), SimError> {
    let speed = match kind {
        EntityKind::Ship => ship_spec(level.read::<ShipState>(id)?.ship_type).speed,
        _ => DEFAULT_SPEED,
    };
    let absolute = level.absolute_position(id)?;
    let handle = level.handle(id)?;
    let (transform, path) = level
        .world
        .query_one_mut::<(&mut Transform, Option<&mut PathQueue>)>(handle)
        .map_err(|_| SimError::UnknownEntity(id.clone()))?;

    transform.rotation.y = wrap_angle(transform.rotation.y);
    if let Some(path) = path {
        steer(transform, path, absolute, speed);
    }
    transform.position += transform.velocity;
    if kind == EntityKind::Ship {
        transform.velocity *= SHIP_VELOCITY_DAMPING;
    }
    Ok(())
}

fn steer(transform: &mut Transform, path: &mut PathQueue, absolute: DVec3, speed: f64) {
    let Some(head) = path.waypoints.front().copied() else {
        return;
    };
    if absolute.distance(head) <= WAYPOINT_THRESHOLD {
        path.waypoints.pop_front();
        match path.waypoints.front() {
            Some(next) => {
                if let Some(rotation) = look_rotation(absolute, *next) {
                    transform.rotation = rotation;
                }
            }
            None => transform.velocity = DVec3::ZERO,
        }
        return;
    }
    let desired = (head - absolute).clamp_length_max(speed);
    transform.velocity += (desired - transform.velocity) * PATH_STEERING;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    #[test]
    fn test_steer_accelerates_toward_head() {
        let mut transform = Transform::default();
        let mut path = PathQueue {
            waypoints: VecDeque::from([DVec3::new(100.0, 0.0, 0.0)]),
        };
        steer(&mut transform, &mut path, DVec3::ZERO, 2.0);
        assert!((transform.velocity.x - 1.0).abs() < 1e-9);
        assert_eq!(path.waypoints.len(), 1);
    }

    #[test]
    fn test_arrival_pops_waypoint_and_stops() {
        let mut transform = Transform {
            velocity: DVec3::new(0.5, 0.0, 0.0),
            ..Transform::default()
        };
        let mut path = PathQueue {
            waypoints: VecDeque::from([DVec3::new(0.5, 0.0, 0.0)]),
        };
        steer(&mut transform, &mut path, DVec3::ZERO, 1.0);
        assert!(path.waypoints.is_empty());
        assert_eq!(transform.velocity, DVec3::ZERO);
    }

    #[test]
    fn test_arrival_turns_toward_next_waypoint() {
        let mut transform = Transform::default();
        let mut path = PathQueue {
            waypoints: VecDeque::from([DVec3::ZERO, DVec3::new(10.0, 0.0, 0.0)]),
        };
        steer(&mut transform, &mut path, DVec3::ZERO, 1.0);
        assert_eq!(path.waypoints.len(), 1);
        assert!((transform.rotation.y - std::f64::consts::FRAC_PI_2).abs() < 1e-9);
    }
}
