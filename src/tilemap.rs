/// A bounded 2D tilemap grid stored row-major.
///
/// Unlike a world map this one does not wrap: every edge is a hard border.
#[derive(Clone, Debug, PartialEq)]
pub struct Tilemap<T> {
    pub width: usize,
    pub height: usize,
    data: Vec<T>,
}

impl<T: Clone + Default> Tilemap<T> {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![T::default(); width * height],
        }
    }
}

impl<T: Clone> Tilemap<T> {
    fn index(&self, x: usize, y: usize) -> usize {
        debug_assert!(self.in_bounds(x, y), "({x}, {y}) outside {}x{}", self.width, self.height);
        y * self.width + x
    }

    pub fn in_bounds(&self, x: usize, y: usize) -> bool {
        x < self.width && y < self.height
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn get(&self, x: usize, y: usize) -> &T {
        &self.data[self.index(x, y)]
    }

    pub fn try_get(&self, x: usize, y: usize) -> Option<&T> {
        if self.in_bounds(x, y) {
            Some(self.get(x, y))
        } else {
            None
        }
    }

    pub fn set(&mut self, x: usize, y: usize, value: T) {
        let idx = self.index(x, y);
        self.data[idx] = value;
    }

    /// Orthogonal neighbours (up, left, down, right) that lie inside the map.
    pub fn neighbors(&self, x: usize, y: usize) -> Vec<(usize, usize)> {
        let mut result = Vec::with_capacity(4);

        if y > 0 {
            result.push((x, y - 1));
        }
        if x > 0 {
            result.push((x - 1, y));
        }
        if y + 1 < self.height {
            result.push((x, y + 1));
        }
        if x + 1 < self.width {
            result.push((x + 1, y));
        }

        result
    }

    /// Iterate over all cells with their coordinates.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, &T)> {
        let width = self.width;
        self.data.iter().enumerate().map(move |(idx, val)| {
            let x = idx % width;
            let y = idx / width;
            (x, y, val)
        })
    }

    /// Iterate over rows, top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = &[T]> {
        // chunks(0) panics, and an empty map has no rows anyway
        self.data.chunks(self.width.max(1))
    }
}
