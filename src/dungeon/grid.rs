//! Tile grid with bounds-checked access. Origin (0,0) is the top-left corner and
//! cells are addressed row-major as `tiles[y][x]`.

use serde::{Deserialize, Serialize};

use super::types::{Direction, Position};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Tile {
    Wall,
    Floor,
    Door,
    Chest,
}

impl Tile {
    /// Tiles the player can stand on once any lock is dealt with.
    pub fn is_walkable(self) -> bool {
        !matches!(self, Tile::Wall)
    }

    pub fn glyph(self) -> char {
        match self {
            Tile::Wall => '#',
            Tile::Floor => '.',
            Tile::Door => '+',
            Tile::Chest => 'C',
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Grid {
    width: usize,
    height: usize,
    tiles: Vec<Vec<Tile>>,
}

impl Grid {
    /// A grid of solid rock.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            tiles: vec![vec![Tile::Wall; width]; height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn rows(&self) -> &[Vec<Tile>] {
        &self.tiles
    }

    pub fn in_bounds(&self, pos: Position) -> bool {
        pos.x < self.width && pos.y < self.height
    }

    pub fn get(&self, pos: Position) -> Option<Tile> {
        self.tiles.get(pos.y).and_then(|row| row.get(pos.x)).copied()
    }

    /// Returns false (and leaves the grid untouched) when `pos` is out of bounds.
    pub fn set(&mut self, pos: Position, tile: Tile) -> bool {
        match self.tiles.get_mut(pos.y).and_then(|row| row.get_mut(pos.x)) {
            Some(cell) => {
                *cell = tile;
                true
            }
            None => false,
        }
    }

    pub fn is(&self, pos: Position, tile: Tile) -> bool {
        self.get(pos) == Some(tile)
    }

    /// One step from `from` towards `dir`, clamped to the grid edges.
    pub fn step(&self, from: Position, dir: Direction) -> Position {
        let (dx, dy) = dir.delta();
        let max_x = self.width.saturating_sub(1) as i64;
        let max_y = self.height.saturating_sub(1) as i64;
        let x = (from.x as i64 + dx).clamp(0, max_x);
        let y = (from.y as i64 + dy).clamp(0, max_y);
        Position::new(x as usize, y as usize)
    }

    /// All floor positions in row-major order.
    pub fn floor_positions(&self) -> Vec<Position> {
        let mut out = Vec::new();
        for (y, row) in self.tiles.iter().enumerate() {
            for (x, tile) in row.iter().enumerate() {
                if *tile == Tile::Floor {
                    out.push(Position::new(x, y));
                }
            }
        }
        out
    }

    pub fn count(&self, tile: Tile) -> usize {
        self.tiles
            .iter()
            .map(|row| row.iter().filter(|t| **t == tile).count())
            .sum()
    }

    /// Number of non-floor cells in the 3x3 block centred on `pos` (the cell itself included).
    /// Cells outside the grid count as non-floor.
    pub fn non_floor_around(&self, pos: Position) -> usize {
        let mut n = 0;
        for dy in -1i64..=1 {
            for dx in -1i64..=1 {
                let x = pos.x as i64 + dx;
                let y = pos.y as i64 + dy;
                let tile = if x < 0 || y < 0 {
                    None
                } else {
                    self.get(Position::new(x as usize, y as usize))
                };
                if tile != Some(Tile::Floor) {
                    n += 1;
                }
            }
        }
        n
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_grid_is_all_wall() {
        let g = Grid::new(5, 3);
        assert_eq!(g.width(), 5);
        assert_eq!(g.height(), 3);
        assert_eq!(g.count(Tile::Wall), 15);
        assert!(g.floor_positions().is_empty());
    }

    #[test]
    fn out_of_bounds_access_is_rejected() {
        let mut g = Grid::new(4, 4);
        assert!(g.in_bounds(Position::new(3, 3)));
        assert!(!g.in_bounds(Position::new(4, 0)));
        assert_eq!(g.get(Position::new(4, 0)), None);
        assert!(!g.set(Position::new(0, 9), Tile::Floor));
        assert!(g.set(Position::new(3, 3), Tile::Floor));
        assert!(g.is(Position::new(3, 3), Tile::Floor));
    }

    #[test]
    fn step_clamps_at_edges() {
        let g = Grid::new(3, 3);
        let origin = Position::new(0, 0);
        assert_eq!(g.step(origin, Direction::North), origin);
        assert_eq!(g.step(origin, Direction::West), origin);
        assert_eq!(g.step(origin, Direction::East), Position::new(1, 0));
        let corner = Position::new(2, 2);
        assert_eq!(g.step(corner, Direction::South), corner);
    }

    #[test]
    fn non_floor_count_detects_narrow_passages() {
        let mut g = Grid::new(5, 5);
        // Horizontal corridor through the middle row.
        for x in 0..5 {
            g.set(Position::new(x, 2), Tile::Floor);
        }
        assert_eq!(g.non_floor_around(Position::new(2, 2)), 6);
        // Open room: fill everything.
        for y in 0..5 {
            for x in 0..5 {
                g.set(Position::new(x, y), Tile::Floor);
            }
        }
        assert_eq!(g.non_floor_around(Position::new(2, 2)), 0);
        assert_eq!(g.non_floor_around(Position::new(0, 0)), 5);
    }
}
