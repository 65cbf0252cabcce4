//! Grid raycasting (DDA) against the tile arena

use super::arena::StaticArena;

/// Maximum hitscan range in tiles
pub const MAX_RANGE: f64 = 32.0;

/// Direction components below this are treated as parallel to the axis
const PARALLEL_EPSILON: f64 = 1e-10;
/// Stand-in crossing distance for an axis the ray never crosses
const NEVER_CROSSES: f64 = 1e30;

/// Which grid line family the ray crossed last
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Vertical,
    Horizontal,
}

/// Perpendicular distance from `origin` to the first solid tile along
/// `dir` (which need not be unit length).
///
/// Exiting the map counts as hitting a wall. Returns [`MAX_RANGE`] when no
/// wall is found within the step budget.
pub fn cast_ray(arena: &StaticArena, origin: (f64, f64), dir: (f64, f64)) -> f64 {
    let (ox, oy) = origin;
    let (dx, dy) = dir;

    let mut map_x = ox.floor() as i64;
    let mut map_y = oy.floor() as i64;

    let delta_x = if dx.abs() < PARALLEL_EPSILON { NEVER_CROSSES } else { (1.0 / dx).abs() };
    let delta_y = if dy.abs() < PARALLEL_EPSILON { NEVER_CROSSES } else { (1.0 / dy).abs() };

    let (step_x, mut side_x) = if dx < 0.0 {
        (-1i64, (ox - map_x as f64) * delta_x)
    } else {
        (1i64, (map_x as f64 + 1.0 - ox) * delta_x)
    };
    let (step_y, mut side_y) = if dy < 0.0 {
        (-1i64, (oy - map_y as f64) * delta_y)
    } else {
        (1i64, (map_y as f64 + 1.0 - oy) * delta_y)
    };

    let max_steps = (MAX_RANGE * 2.0).ceil() as usize;
    for _ in 0..max_steps {
        let side = if side_x < side_y {
            side_x += delta_x;
            map_x += step_x;
            Side::Vertical
        } else {
            side_y += delta_y;
            map_y += step_y;
            Side::Horizontal
        };

        if arena.is_solid(map_x, map_y) {
            // Project back along the ray rather than using the raw step length
            return match side {
                Side::Vertical => {
                    (map_x as f64 - ox + (1 - step_x) as f64 * 0.5) / dx
                }
                Side::Horizontal => {
                    (map_y as f64 - oy + (1 - step_y) as f64 * 0.5) / dy
                }
            };
        }
    }

    MAX_RANGE
}
