use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::math::Vec2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tile {
    Floor,
    Wall,
}

impl Tile {
    pub fn is_solid(self) -> bool {
        matches!(self, Tile::Wall)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileCoord {
    pub x: i32,
    pub y: i32,
}

impl TileCoord {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn manhattan(self, other: TileCoord) -> u32 {
        self.x.abs_diff(other.x).saturating_add(self.y.abs_diff(other.y))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GridError {
    #[error("tile count mismatch: expected {expected}, got {actual}")]
    TileCountMismatch { expected: usize, actual: usize },
}

/// Row-major tile grid. Tile `(x, y)` covers the pixel square
/// `[x * tile_size, (x + 1) * tile_size) x [y * tile_size, (y + 1) * tile_size)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    width: u32,
    height: u32,
    tile_size: f32,
    tiles: Vec<Tile>,
}

impl Grid {
    pub fn new(width: u32, height: u32, tile_size: f32, tiles: Vec<Tile>) -> Result<Self, GridError> {
        let expected = width as usize * height as usize;
        let actual = tiles.len();
        if expected != actual {
            return Err(GridError::TileCountMismatch { expected, actual });
        }
        Ok(Self {
            width,
            height,
            tile_size,
            tiles,
        })
    }

    pub fn filled(width: u32, height: u32, tile_size: f32, tile: Tile) -> Self {
        Self {
            width,
            height,
            tile_size,
            tiles: vec![tile; width as usize * height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn tile_size(&self) -> f32 {
        self.tile_size
    }

    pub fn width_px(&self) -> f32 {
        self.width as f32 * self.tile_size
    }

    pub fn height_px(&self) -> f32 {
        self.height as f32 * self.tile_size
    }

    pub fn in_bounds(&self, coord: TileCoord) -> bool {
        coord.x >= 0
            && coord.y >= 0
            && (coord.x as u32) < self.width
            && (coord.y as u32) < self.height
    }

    pub(crate) fn index_of(&self, coord: TileCoord) -> Option<usize> {
        if !self.in_bounds(coord) {
            return None;
        }
        Some(coord.y as usize * self.width as usize + coord.x as usize)
    }

    pub(crate) fn coord_of(&self, index: usize) -> TileCoord {
        let width = self.width as usize;
        TileCoord::new((index % width) as i32, (index / width) as i32)
    }

    /// Out-of-bounds coordinates read as `Tile::Wall`.
    pub fn tile(&self, coord: TileCoord) -> Tile {
        self.index_of(coord)
            .and_then(|index| self.tiles.get(index))
            .copied()
            .unwrap_or(Tile::Wall)
    }

    pub fn is_solid(&self, coord: TileCoord) -> bool {
        self.tile(coord).is_solid()
    }

    pub fn is_walkable(&self, coord: TileCoord) -> bool {
        !self.is_solid(coord)
    }

    pub fn set(&mut self, coord: TileCoord, tile: Tile) {
        if let Some(index) = self.index_of(coord) {
            self.tiles[index] = tile;
        }
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    pub fn walkable_count(&self) -> usize {
        self.tiles.iter().filter(|tile| !tile.is_solid()).count()
    }

    pub fn tile_at_px(&self, position: Vec2) -> TileCoord {
        TileCoord::new(
            (position.x / self.tile_size).floor() as i32,
            (position.y / self.tile_size).floor() as i32,
        )
    }

    pub fn tile_center(&self, coord: TileCoord) -> Vec2 {
        Vec2::new(
            (coord.x as f32 + 0.5) * self.tile_size,
            (coord.y as f32 + 0.5) * self.tile_size,
        )
    }

    pub fn is_walkable_px(&self, position: Vec2) -> bool {
        self.is_walkable(self.tile_at_px(position))
    }

    pub fn is_border(&self, coord: TileCoord) -> bool {
        coord.x == 0
            || coord.y == 0
            || coord.x == self.width as i32 - 1
            || coord.y == self.height as i32 - 1
    }

    /// Builds a grid from rows of `#` (wall) and `.` (floor). Test helper.
    #[cfg(test)]
    pub(crate) fn from_ascii(rows: &[&str], tile_size: f32) -> Self {
        let height = rows.len() as u32;
        let width = rows.first().map(|row| row.len()).unwrap_or(0) as u32;
        let tiles = rows
            .iter()
            .flat_map(|row| {
                row.chars().map(|ch| match ch {
                    '#' => Tile::Wall,
                    _ => Tile::Floor,
                })
            })
            .collect();
        Self::new(width, height, tile_size, tiles).expect("ascii grid rows must be equal length")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tile_count_mismatch_is_rejected() {
        let result = Grid::new(3, 3, 28.0, vec![Tile::Floor; 8]);
        assert_eq!(
            result,
            Err(GridError::TileCountMismatch {
                expected: 9,
                actual: 8
            })
        );
    }

    #[test]
    fn out_of_bounds_reads_as_wall() {
        let grid = Grid::filled(4, 4, 28.0, Tile::Floor);
        assert!(grid.is_solid(TileCoord::new(-1, 0)));
        assert!(grid.is_solid(TileCoord::new(0, 4)));
        assert!(grid.is_walkable(TileCoord::new(3, 3)));
    }

    #[test]
    fn pixel_tile_round_trip_uses_tile_centers() {
        let grid = Grid::filled(10, 10, 28.0, Tile::Floor);
        let coord = TileCoord::new(3, 7);
        let center = grid.tile_center(coord);
        assert_eq!(center, Vec2::new(98.0, 210.0));
        assert_eq!(grid.tile_at_px(center), coord);
        assert_eq!(grid.tile_at_px(Vec2::new(27.99, 28.0)), TileCoord::new(0, 1));
    }

    #[test]
    fn negative_pixels_map_outside_grid() {
        let grid = Grid::filled(4, 4, 28.0, Tile::Floor);
        let coord = grid.tile_at_px(Vec2::new(-0.5, 10.0));
        assert_eq!(coord, TileCoord::new(-1, 0));
        assert!(!grid.in_bounds(coord));
    }

    #[test]
    fn ascii_helper_marks_walls() {
        let grid = Grid::from_ascii(&["###", "#.#", "###"], 10.0);
        assert_eq!(grid.walkable_count(), 1);
        assert!(grid.is_walkable(TileCoord::new(1, 1)));
        assert!(grid.is_border(TileCoord::new(2, 1)));
    }
}
