/// Address of one fixed-size block of source data at a given clipmap level.
///
/// Tiles are the unit of backing-store fetch and the cache's residency key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Tile {
    pub x: i32,
    pub y: i32,
    pub level: usize,
}

impl Tile {
    pub fn new(x: i32, y: i32, level: usize) -> Self {
        Self { x, y, level }
    }
}

/// An axis-aligned rectangle in per-level pixel space.
///
/// Regions double as invalidation notices (posted to the mailbox when a tile
/// finishes fetching) and as clip bounds during the mailbox drain. Two regions
/// at different levels never intersect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub level: usize,
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Region {
    pub fn new(level: usize, x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            level,
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> i32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.height
    }

    pub fn intersects(&self, other: &Region) -> bool {
        self.level == other.level
            && self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }

    /// Clips `self` to the overlap with `other`.
    ///
    /// Only meaningful when [`Region::intersects`] returned true; callers
    /// check first.
    pub fn intersect(&mut self, other: &Region) {
        let x1 = self.x.max(other.x);
        let y1 = self.y.max(other.y);
        let x2 = self.right().min(other.right());
        let y2 = self.bottom().min(other.bottom());
        self.x = x1;
        self.y = y1;
        self.width = x2 - x1;
        self.height = y2 - y1;
    }
}
