//! Obstacle-avoiding paths within a system.
//!
//! Greedy and single-obstacle-at-a-time: the obstacle nearest the start that
//! blocks the straight leg is side-stepped, then the search continues from
//! the side-step point. Not optimal, and bounded by `MAX_PATH_DEPTH`.

use glam::DVec3;

use starlane_core::components::{CelestialBody, EntityFlags};
use starlane_core::constants::{DEFAULT_OBSTACLE_RADIUS, MAX_PATH_DEPTH, OBSTACLE_CLEARANCE_FACTOR};
use starlane_core::types::{EntityId, SystemId};

use crate::level::Level;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Obstacle {
    pub position: DVec3,
    /// Body radius. Non-body obstacles use `DEFAULT_OBSTACLE_RADIUS`.
    pub radius: Option<f64>,
}

impl Obstacle {
    /// Distance a path must keep from the obstacle's center.
    pub fn avoidance_radius(&self) -> f64 {
        OBSTACLE_CLEARANCE_FACTOR * self.radius.unwrap_or(DEFAULT_OBSTACLE_RADIUS)
    }
}

/// Waypoints from `start` to `end`, both included.
pub fn find_path(start: DVec3, end: DVec3, obstacles: &[Obstacle]) -> Vec<DVec3> {
    let mut path = vec![start];
    let mut from = start;
    for _ in 0..MAX_PATH_DEPTH {
        let Some(obstacle) = nearest_blocking(from, end, obstacles) else {
            break;
        };
        from = side_step(from, obstacle);
        path.push(from);
    }
    path.push(end);
    path
}

/// The obstacle closest to `from` whose avoidance sphere the segment `from → end` enters.
fn nearest_blocking(from: DVec3, end: DVec3, obstacles: &[Obstacle]) -> Option<&Obstacle> {
    let segment = end - from;
    let length = segment.length();
    if length == 0.0 {
        return None;
    }
    let direction = segment / length;

    let mut best: Option<(f64, &Obstacle)> = None;
    for obstacle in obstacles {
        let to_obstacle = obstacle.position - from;
        let distance = to_obstacle.length();
        if best.is_some_and(|(nearest, _)| distance >= nearest) {
            continue;
        }
        let projection = to_obstacle.dot(direction);
        if projection <= 0.0 || projection >= length {
            continue;
        }
        let off_line = (to_obstacle - direction * projection).length();
        if off_line >= obstacle.avoidance_radius() {
            continue;
        }
        best = Some((distance, obstacle));
    }
    best.map(|(_, obstacle)| obstacle)
}

/// A point on the obstacle's avoidance sphere, perpendicular (in the xz plane)
/// to the direction from `from` to the obstacle.
fn side_step(from: DVec3, obstacle: &Obstacle) -> DVec3 {
    let toward = (obstacle.position - from).normalize_or_zero();
    let sideways = DVec3::new(-toward.z, 0.0, toward.x);
    let sideways = if sideways.length_squared() > 1e-12 {
        sideways.normalize()
    } else {
        DVec3::X
    };
    obstacle.position + sideways * obstacle.avoidance_radius()
}

impl Level {
    /// Obstacles in `system`, excluding `except`.
    pub fn obstacles_in(&self, system: &SystemId, except: Option<&EntityId>) -> Vec<Obstacle> {
        let mut obstacles = Vec::new();
        for id in self.registry.members(system) {
            if Some(id) == except {
                continue;
            }
            let Some(handle) = self.registry.handle(id) else {
                continue;
            };
            let is_obstacle = self
                .world
                .get::<&EntityFlags>(handle)
                .map(|flags| flags.is_obstacle)
                .unwrap_or(false);
            if !is_obstacle {
                continue;
            }
            let Ok(position) = self.absolute_position(id) else {
                continue;
            };
            let radius = self
                .world
                .get::<&CelestialBody>(handle)
                .ok()
                .map(|body| body.radius);
            obstacles.push(Obstacle { position, radius });
        }
        obstacles
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn planet(x: f64, z: f64, radius: f64) -> Obstacle {
        Obstacle {
            position: DVec3::new(x, 0.0, z),
            radius: Some(radius),
        }
    }

    #[test]
    fn test_direct_path_without_obstacles() {
        let start = DVec3::new(0.0, 0.0, 0.0);
        let end = DVec3::new(100.0, 0.0, 0.0);
        assert_eq!(find_path(start, end, &[]), vec![start, end]);
    }

    #[test]
    fn test_obstacle_off_the_line_is_ignored() {
        let start = DVec3::ZERO;
        let end = DVec3::new(100.0, 0.0, 0.0);
        let obstacles = [planet(50.0, 40.0, 10.0), planet(-30.0, 0.0, 10.0), planet(130.0, 0.0, 10.0)];
        assert_eq!(find_path(start, end, &obstacles), vec![start, end]);
    }

    #[test]
    fn test_path_clears_single_obstacle() {
        let start = DVec3::ZERO;
        let end = DVec3::new(1000.0, 0.0, 0.0);
        let obstacle = planet(500.0, 5.0, 40.0);
        let path = find_path(start, end, &[obstacle]);

        assert!(path.len() > 2, "blocked leg must be side-stepped");
        assert_eq!(path.first(), Some(&start));
        assert_eq!(path.last(), Some(&end));
        let clearance = obstacle.avoidance_radius();
        for point in &path[1..path.len() - 1] {
            let distance = point.distance(obstacle.position);
            assert!(
                distance >= clearance - 1e-9,
                "waypoint {point} is {distance} from obstacle, needs {clearance}"
            );
        }
    }

    #[test]
    fn test_nearest_obstacle_is_avoided_first() {
        let start = DVec3::ZERO;
        let end = DVec3::new(1000.0, 0.0, 0.0);
        let near = planet(200.0, 0.0, 20.0);
        let far = planet(700.0, 0.0, 20.0);
        let path = find_path(start, end, &[far, near]);
        let first_step = path[1];
        assert!(
            (first_step.distance(near.position) - near.avoidance_radius()).abs() < 1e-9,
            "first side-step goes around the nearer obstacle"
        );
    }

    #[test]
    fn test_path_depth_is_bounded() {
        // A wall of overlapping obstacles can never be fully cleared.
        let obstacles: Vec<Obstacle> = (0..200)
            .map(|i| planet(50.0 + f64::from(i) * 5.0, 0.0, 100.0))
            .collect();
        let path = find_path(DVec3::ZERO, DVec3::new(1200.0, 0.0, 0.0), &obstacles);
        assert!(path.len() <= MAX_PATH_DEPTH + 2);
    }

    #[test]
    fn test_default_obstacle_radius() {
        let rock = Obstacle {
            position: DVec3::ZERO,
            radius: None,
        };
        assert_eq!(rock.avoidance_radius(), 13.0);
    }
}
