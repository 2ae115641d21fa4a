//! Piece shapes: the seven-shape palette and the clockwise rotation transform.

use crate::error::ShapeError;
use std::fmt;

/// Shape kinds in palette order (I, O, T, L, J, S, Z).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeKind {
    I,
    O,
    T,
    L,
    J,
    S,
    Z,
}

impl ShapeKind {
    pub const ALL: [Self; 7] = [Self::I, Self::O, Self::T, Self::L, Self::J, Self::S, Self::Z];

    /// Spawn-orientation cell pattern, row-major, `1` = occupied.
    pub fn pattern(&self) -> &'static [&'static [u8]] {
        match self {
            Self::I => &[&[1, 1, 1, 1]],
            Self::O => &[&[1, 1], &[1, 1]],
            Self::T => &[&[0, 1, 0], &[1, 1, 1]],
            Self::L => &[&[1, 0, 0], &[1, 1, 1]],
            Self::J => &[&[0, 0, 1], &[1, 1, 1]],
            Self::S => &[&[0, 1, 1], &[1, 1, 0]],
            Self::Z => &[&[1, 1, 0], &[0, 1, 1]],
        }
    }

    pub fn shape(&self) -> Shape {
        Shape::from_pattern(self.pattern())
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::I => "I",
            Self::O => "O",
            Self::T => "T",
            Self::L => "L",
            Self::J => "J",
            Self::S => "S",
            Self::Z => "Z",
        }
    }
}

impl fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Rectangular occupancy matrix for a piece's bounding box. Immutable; rotation returns a new shape.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Shape {
    width: usize,
    height: usize,
    /// cells[y * width + x]
    cells: Vec<bool>,
}

impl Shape {
    /// Build a shape from rows of `0`/non-zero values. Rows must be non-empty and equally long.
    pub fn new<R: AsRef<[u8]>>(rows: &[R]) -> Result<Self, ShapeError> {
        let width = rows.first().map(|r| r.as_ref().len()).unwrap_or(0);
        if width == 0 {
            return Err(ShapeError::Empty);
        }
        for (row, r) in rows.iter().enumerate() {
            let found = r.as_ref().len();
            if found != width {
                return Err(ShapeError::Ragged {
                    row,
                    expected: width,
                    found,
                });
            }
        }
        Ok(Self::from_pattern(rows))
    }

    /// Caller guarantees `rows` is non-empty and rectangular.
    fn from_pattern<R: AsRef<[u8]>>(rows: &[R]) -> Self {
        let height = rows.len();
        let width = rows.first().map(|r| r.as_ref().len()).unwrap_or(0);
        let cells = rows
            .iter()
            .flat_map(|r| r.as_ref().iter().map(|&v| v != 0))
            .collect();
        Self {
            width,
            height,
            cells,
        }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// True if sub-cell (x, y) is occupied; false outside the bounding box.
    #[inline]
    pub fn is_filled(&self, x: usize, y: usize) -> bool {
        x < self.width && y < self.height && self.cells[y * self.width + x]
    }

    /// Occupied sub-cells as (px, py) offsets from the bounding-box origin, row-major.
    pub fn cells(&self) -> impl Iterator<Item = (i32, i32)> + '_ {
        self.cells.iter().enumerate().filter_map(|(i, &filled)| {
            filled.then(|| ((i % self.width) as i32, (i / self.width) as i32))
        })
    }

    /// 90° clockwise: `new[x][h - 1 - y] = old[y][x]`.
    pub fn rotated_cw(&self) -> Self {
        let (w, h) = (self.width, self.height);
        // Rotated shape is h columns wide and w rows tall.
        let mut cells = vec![false; w * h];
        for y in 0..h {
            for x in 0..w {
                cells[x * h + (h - 1 - y)] = self.cells[y * w + x];
            }
        }
        Self {
            width: h,
            height: w,
            cells,
        }
    }

    /// Rows as `0`/`1` vectors, mostly for display and tests.
    pub fn rows(&self) -> Vec<Vec<u8>> {
        self.cells
            .chunks(self.width)
            .map(|row| row.iter().map(|&c| u8::from(c)).collect())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_palette_matches_reference_layouts() {
        assert_eq!(ShapeKind::I.shape().rows(), vec![vec![1, 1, 1, 1]]);
        assert_eq!(ShapeKind::O.shape().rows(), vec![vec![1, 1], vec![1, 1]]);
        assert_eq!(
            ShapeKind::T.shape().rows(),
            vec![vec![0, 1, 0], vec![1, 1, 1]]
        );
        assert_eq!(
            ShapeKind::Z.shape().rows(),
            vec![vec![1, 1, 0], vec![0, 1, 1]]
        );
    }

    #[test]
    fn test_every_palette_shape_has_four_cells() {
        for kind in ShapeKind::ALL {
            assert_eq!(kind.shape().cells().count(), 4, "{kind}");
        }
    }

    #[test]
    fn test_rotate_i_becomes_vertical() {
        let r = ShapeKind::I.shape().rotated_cw();
        assert_eq!((r.width(), r.height()), (1, 4));
        assert_eq!(r.cells().collect::<Vec<_>>(), vec![(0, 0), (0, 1), (0, 2), (0, 3)]);
    }

    #[test]
    fn test_rotate_l_clockwise() {
        // [[1,0,0],[1,1,1]] -> [[1,1],[1,0],[1,0]]
        let r = ShapeKind::L.shape().rotated_cw();
        assert_eq!(r.rows(), vec![vec![1, 1], vec![1, 0], vec![1, 0]]);
    }

    #[test]
    fn test_rotate_s_clockwise() {
        // [[0,1,1],[1,1,0]] -> [[1,0],[1,1],[0,1]]
        let r = ShapeKind::S.shape().rotated_cw();
        assert_eq!(r.rows(), vec![vec![1, 0], vec![1, 1], vec![0, 1]]);
    }

    #[test]
    fn test_four_rotations_round_trip() {
        for kind in ShapeKind::ALL {
            let s = kind.shape();
            let r = s.rotated_cw().rotated_cw().rotated_cw().rotated_cw();
            assert_eq!(r, s, "{kind}");
        }
    }

    #[test]
    fn test_rotation_does_not_mutate_original() {
        let s = ShapeKind::T.shape();
        let _ = s.rotated_cw();
        assert_eq!(s, ShapeKind::T.shape());
    }

    #[test]
    fn test_new_rejects_empty_and_ragged() {
        let empty: [Vec<u8>; 0] = [];
        assert_eq!(Shape::new(&empty), Err(ShapeError::Empty));
        assert_eq!(Shape::new(&[Vec::<u8>::new()]), Err(ShapeError::Empty));
        assert_eq!(
            Shape::new(&[vec![1, 1], vec![1]]),
            Err(ShapeError::Ragged {
                row: 1,
                expected: 2,
                found: 1
            })
        );
    }

    #[test]
    fn test_new_accepts_custom_shape() {
        let s = Shape::new(&[[1u8, 0], [1, 1]]).unwrap();
        assert!(s.is_filled(0, 0));
        assert!(!s.is_filled(1, 0));
        assert!(!s.is_filled(5, 5));
        assert_eq!(s.cells().count(), 3);
    }
}
