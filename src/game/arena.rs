//! Static tile arena and spawn table

use std::path::Path;

use serde::{Deserialize, Serialize};

/// A spawn location with initial facing
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpawnPoint {
    pub x: f64,
    pub y: f64,
    pub angle: f64,
}

impl SpawnPoint {
    pub const fn new(x: f64, y: f64, angle: f64) -> Self {
        Self { x, y, angle }
    }
}

/// Immutable tile grid shared read-only by the whole simulation.
///
/// Tile code `0` is open floor, anything greater is solid. Coordinates
/// outside the grid are always solid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaticArena {
    grid: Vec<Vec<u8>>,
    spawn_points: Vec<SpawnPoint>,
}

impl StaticArena {
    /// Build and validate an arena
    pub fn new(grid: Vec<Vec<u8>>, spawn_points: Vec<SpawnPoint>) -> Result<Self, ArenaError> {
        let arena = Self { grid, spawn_points };
        arena.validate()?;
        Ok(arena)
    }

    /// Parse an arena from its JSON description
    pub fn from_json(json: &str) -> Result<Self, ArenaError> {
        let raw: StaticArena = serde_json::from_str(json)?;
        Self::new(raw.grid, raw.spawn_points)
    }

    /// Load an arena file from disk
    pub fn load(path: &Path) -> Result<Self, ArenaError> {
        let json = std::fs::read_to_string(path).map_err(|source| ArenaError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// Built-in 16x16 duel arena: walled border, four pillars, a center block
    pub fn duel() -> Self {
        const W: u8 = 1;
        const O: u8 = 0;
        let grid = vec![
            vec![W, W, W, W, W, W, W, W, W, W, W, W, W, W, W, W],
            vec![W, O, O, O, O, O, O, O, O, O, O, O, O, O, O, W],
            vec![W, O, O, O, O, O, O, O, O, O, O, O, O, O, O, W],
            vec![W, O, O, W, W, O, O, O, O, O, O, W, W, O, O, W],
            vec![W, O, O, W, W, O, O, O, O, O, O, W, W, O, O, W],
            vec![W, O, O, O, O, O, O, O, O, O, O, O, O, O, O, W],
            vec![W, O, O, O, O, O, O, O, O, O, O, O, O, O, O, W],
            vec![W, O, O, O, O, O, O, W, W, O, O, O, O, O, O, W],
            vec![W, O, O, O, O, O, O, W, W, O, O, O, O, O, O, W],
            vec![W, O, O, O, O, O, O, O, O, O, O, O, O, O, O, W],
            vec![W, O, O, O, O, O, O, O, O, O, O, O, O, O, O, W],
            vec![W, O, O, W, W, O, O, O, O, O, O, W, W, O, O, W],
            vec![W, O, O, W, W, O, O, O, O, O, O, W, W, O, O, W],
            vec![W, O, O, O, O, O, O, O, O, O, O, O, O, O, O, W],
            vec![W, O, O, O, O, O, O, O, O, O, O, O, O, O, O, W],
            vec![W, W, W, W, W, W, W, W, W, W, W, W, W, W, W, W],
        ];
        let spawn_points = vec![
            SpawnPoint::new(1.5, 1.5, std::f64::consts::FRAC_PI_4),
            SpawnPoint::new(14.5, 14.5, -3.0 * std::f64::consts::FRAC_PI_4),
            SpawnPoint::new(14.5, 1.5, 3.0 * std::f64::consts::FRAC_PI_4),
            SpawnPoint::new(1.5, 14.5, -std::f64::consts::FRAC_PI_4),
        ];
        Self { grid, spawn_points }
    }

    pub fn width(&self) -> usize {
        self.grid.first().map(Vec::len).unwrap_or(0)
    }

    pub fn height(&self) -> usize {
        self.grid.len()
    }

    pub fn spawn_points(&self) -> &[SpawnPoint] {
        &self.spawn_points
    }

    /// Tile solidity; anything outside the grid counts as wall
    pub fn is_solid(&self, tile_x: i64, tile_y: i64) -> bool {
        if tile_x < 0 || tile_y < 0 {
            return true;
        }
        self.grid
            .get(tile_y as usize)
            .and_then(|row| row.get(tile_x as usize))
            .map_or(true, |&tile| tile > 0)
    }

    /// Solidity of the tile containing a world point
    pub fn is_solid_at(&self, x: f64, y: f64) -> bool {
        self.is_solid(x.floor() as i64, y.floor() as i64)
    }

    fn validate(&self) -> Result<(), ArenaError> {
        let width = self.width();
        if self.grid.is_empty() || width == 0 {
            return Err(ArenaError::EmptyGrid);
        }
        if let Some(row) = self.grid.iter().position(|r| r.len() != width) {
            return Err(ArenaError::RaggedRow { row, expected: width });
        }
        if self.spawn_points.len() < 2 {
            return Err(ArenaError::TooFewSpawns(self.spawn_points.len()));
        }
        for (index, spawn) in self.spawn_points.iter().enumerate() {
            let finite = spawn.x.is_finite() && spawn.y.is_finite() && spawn.angle.is_finite();
            if !finite || self.is_solid_at(spawn.x, spawn.y) {
                return Err(ArenaError::BlockedSpawn { index });
            }
        }
        Ok(())
    }
}

/// Arena loading and validation errors
#[derive(Debug, thiserror::Error)]
pub enum ArenaError {
    #[error("Failed to read arena file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid arena JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Arena grid is empty")]
    EmptyGrid,

    #[error("Arena row {row} does not have {expected} tiles")]
    RaggedRow { row: usize, expected: usize },

    #[error("Arena needs at least 2 spawn points, found {0}")]
    TooFewSpawns(usize),

    #[error("Spawn point {index} is outside the grid or inside a wall")]
    BlockedSpawn { index: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duel_arena_is_valid() {
        let arena = StaticArena::duel();
        assert!(arena.validate().is_ok());
        assert_eq!(arena.width(), 16);
        assert_eq!(arena.height(), 16);
        assert_eq!(arena.spawn_points().len(), 4);
    }

    #[test]
    fn out_of_bounds_is_solid() {
        let arena = StaticArena::duel();
        assert!(arena.is_solid(-1, 5));
        assert!(arena.is_solid(5, -1));
        assert!(arena.is_solid(16, 5));
        assert!(arena.is_solid(5, 16));
        assert!(!arena.is_solid(1, 1));
        assert!(arena.is_solid(0, 0));
    }

    #[test]
    fn from_json_accepts_camel_case() {
        let json = r#"{
            "grid": [[1,1,1,1],[1,0,0,1],[1,0,0,1],[1,1,1,1]],
            "spawnPoints": [{"x":1.5,"y":1.5,"angle":0.0},{"x":2.5,"y":2.5,"angle":3.14}]
        }"#;
        let arena = StaticArena::from_json(json).unwrap();
        assert_eq!(arena.width(), 4);
        assert_eq!(arena.spawn_points()[1].x, 2.5);
    }

    #[test]
    fn rejects_ragged_grid() {
        let err = StaticArena::new(
            vec![vec![0, 0], vec![0]],
            vec![SpawnPoint::new(0.5, 0.5, 0.0), SpawnPoint::new(1.5, 0.5, 0.0)],
        )
        .unwrap_err();
        assert!(matches!(err, ArenaError::RaggedRow { row: 1, expected: 2 }));
    }

    #[test]
    fn rejects_spawn_in_wall() {
        let err = StaticArena::new(
            vec![vec![0, 1]],
            vec![SpawnPoint::new(0.5, 0.5, 0.0), SpawnPoint::new(1.5, 0.5, 0.0)],
        )
        .unwrap_err();
        assert!(matches!(err, ArenaError::BlockedSpawn { index: 1 }));
    }

    #[test]
    fn rejects_single_spawn() {
        let err = StaticArena::new(vec![vec![0, 0]], vec![SpawnPoint::new(0.5, 0.5, 0.0)])
            .unwrap_err();
        assert!(matches!(err, ArenaError::TooFewSpawns(1)));
    }
}
