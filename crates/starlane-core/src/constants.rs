//! Simulation constants and tuning parameters.

/// Simulation tick rate (Hz).
pub const TICK_RATE: u32 = 30;

// --- Motion ---

/// Distance at which a path waypoint counts as reached.
pub const WAYPOINT_THRESHOLD: f64 = 1.0;

/// Fraction of the gap between current and desired velocity closed each tick
/// while following a path.
pub const PATH_STEERING: f64 = 0.5;

/// Per-tick velocity damping applied to ships after integration.
pub const SHIP_VELOCITY_DAMPING: f64 = 0.9;

// --- Pathfinding ---

/// Obstacles are avoided at this multiple of their radius.
pub const OBSTACLE_CLEARANCE_FACTOR: f64 = 1.3;

/// Radius used for obstacles that are not celestial bodies.
pub const DEFAULT_OBSTACLE_RADIUS: f64 = 10.0;

/// Maximum number of side-steps a single path may take.
pub const MAX_PATH_DEPTH: usize = 32;

// --- Progression ---

/// Divisor in the xp curve: level = sqrt(xp / XP_PER_LEVEL_FACTOR).
pub const XP_PER_LEVEL_FACTOR: f64 = 10.0;

/// Each storage research level adds this fraction of base capacity to player ships.
pub const STORAGE_RESEARCH_DIVISOR: f64 = 20.0;

/// Capacity of a celestial body's reward storage.
pub const CELESTIAL_STORAGE_MAX: f64 = 1e10;

// --- Generation ---

pub const STAR_RADIUS_MIN: f64 = 300.0;
pub const STAR_RADIUS_MAX: f64 = 500.0;
pub const PLANET_RADIUS_MIN: f64 = 25.0;
pub const PLANET_RADIUS_MAX: f64 = 50.0;
pub const PLANET_COUNT_MIN: usize = 1;
pub const PLANET_COUNT_MAX: usize = 9;
/// Planets are placed no further than this from their star.
pub const PLANET_MAX_ORBIT: f64 = 5000.0;
/// Probability of each additional hyperspace connection.
pub const CONNECTION_PROBABILITY: f64 = 0.5;
/// Radius around a system position in which connection points are drawn.
pub const CONNECTION_SPREAD: f64 = 5.0;
/// Lower bound for generated system difficulty.
pub const MIN_SYSTEM_DIFFICULTY: f64 = 0.25;

// --- Diagnostics ---

/// Number of tick durations kept for the rolling TPS average.
pub const PERFORMANCE_SAMPLES: usize = 60;

// --- Network ---

pub const DEFAULT_PORT: u16 = 1123;
pub const DEFAULT_MAX_CLIENTS: usize = 10;
/// Commands per second above which a client is kicked.
pub const PACKET_FLOOD_LIMIT: u32 = 50;
/// Number of sequenced events retained for incremental catch-up.
pub const EVENT_LOG_CAPACITY: usize = 4096;
