//! Player movement and tile collision

use super::arena::StaticArena;
use super::{MoveKeys, TickInput};

/// Movement speed in tiles per second
pub const MOVE_SPEED: f64 = 3.0;
/// Player collision circle radius (tiles)
pub const COLLISION_RADIUS: f64 = 0.25;
/// Radians of turn per mouse unit
pub const MOUSE_SENSITIVITY: f64 = 0.003;
/// Largest mouse delta accepted from a client in one tick
pub const MAX_MOUSE_DELTA: f64 = 500.0;

/// Movement system for integrating player input against the arena
pub struct MovementSolver;

impl MovementSolver {
    /// Advance one player's pose by one tick of input.
    /// Returns (new_x, new_y, new_angle)
    pub fn step(
        x: f64,
        y: f64,
        angle: f64,
        input: &TickInput,
        dt: f64,
        arena: &StaticArena,
    ) -> (f64, f64, f64) {
        let angle = Self::turn(angle, input.mouse_dx);

        let (dir_x, dir_y) = Self::direction(angle, input.keys);
        if dir_x == 0.0 && dir_y == 0.0 {
            return (x, y, angle);
        }

        let dx = dir_x * MOVE_SPEED * dt;
        let dy = dir_y * MOVE_SPEED * dt;

        // Each axis commits on its own so blocked motion slides along walls
        let mut new_x = x;
        let mut new_y = y;
        if !Self::collides(arena, x + dx, y, COLLISION_RADIUS) {
            new_x = x + dx;
        }
        if !Self::collides(arena, x, y + dy, COLLISION_RADIUS) {
            new_y = y + dy;
        }

        let max_x = arena.width() as f64 - COLLISION_RADIUS;
        let max_y = arena.height() as f64 - COLLISION_RADIUS;
        (
            new_x.clamp(COLLISION_RADIUS, max_x.max(COLLISION_RADIUS)),
            new_y.clamp(COLLISION_RADIUS, max_y.max(COLLISION_RADIUS)),
            angle,
        )
    }

    /// Apply a clamped mouse delta to a facing angle
    pub fn turn(angle: f64, mouse_dx: f64) -> f64 {
        angle + mouse_dx.clamp(-MAX_MOUSE_DELTA, MAX_MOUSE_DELTA) * MOUSE_SENSITIVITY
    }

    /// Unit movement direction for the held keys, or (0, 0)
    pub fn direction(angle: f64, keys: MoveKeys) -> (f64, f64) {
        let (fwd_x, fwd_y) = (angle.cos(), angle.sin());
        // Left-hand perpendicular of the forward axis
        let (left_x, left_y) = (fwd_y, -fwd_x);

        let mut mx = 0.0;
        let mut my = 0.0;
        if keys.up {
            mx += fwd_x;
            my += fwd_y;
        }
        if keys.down {
            mx -= fwd_x;
            my -= fwd_y;
        }
        if keys.left {
            mx += left_x;
            my += left_y;
        }
        if keys.right {
            mx -= left_x;
            my -= left_y;
        }

        let len = (mx * mx + my * my).sqrt();
        if len < 1e-9 {
            return (0.0, 0.0);
        }
        (mx / len, my / len)
    }

    /// Circle vs tile test over the 3x3 tiles around the point
    pub fn collides(arena: &StaticArena, x: f64, y: f64, radius: f64) -> bool {
        let tile_x = x.floor() as i64;
        let tile_y = y.floor() as i64;

        for ty in (tile_y - 1)..=(tile_y + 1) {
            for tx in (tile_x - 1)..=(tile_x + 1) {
                if !arena.is_solid(tx, ty) {
                    continue;
                }
                // Closest point on the tile's AABB
                let near_x = x.clamp(tx as f64, tx as f64 + 1.0);
                let near_y = y.clamp(ty as f64, ty as f64 + 1.0);
                let ddx = x - near_x;
                let ddy = y - near_y;
                if ddx * ddx + ddy * ddy < radius * radius {
                    return true;
                }
            }
        }
        false
    }
}
