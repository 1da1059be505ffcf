use std::fmt;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Vec2<T> {
    pub x: T,
    pub y: T,
}

impl<T: fmt::Debug> fmt::Debug for Vec2<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Vec2")
            .field("x", &self.x)
            .field("y", &self.y)
            .finish()
    }
}

// sizes print as WIDTHxHEIGHT
impl<T: fmt::Display> fmt::Display for Vec2<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.x, self.y)
    }
}

impl<T> Vec2<T> {
    pub fn new(x: T, y: T) -> Self {
        Self { x, y }
    }
}

impl<T: Default> Vec2<T> {
    pub fn zero() -> Self {
        Self::default()
    }
}

impl Vec2<usize> {
    /// Number of pixels covered by a size.
    pub fn area(self) -> usize {
        self.x * self.y
    }

    pub fn is_empty(self) -> bool {
        self.x == 0 || self.y == 0
    }

    /// Resolve a requested size against this (native) size.
    ///
    /// A zero axis in `requested` means "native": when both are zero the
    /// native size is kept, when only one is zero it follows the aspect ratio
    /// of the native size.
    pub fn resolve(self, requested: Vec2<usize>) -> Vec2<usize> {
        match (requested.x, requested.y) {
            (0, 0) => self,
            (w, 0) if self.x > 0 => Vec2::new(w, ((self.y * w + self.x / 2) / self.x).max(1)),
            (0, h) if self.y > 0 => Vec2::new(((self.x * h + self.y / 2) / self.y).max(1), h),
            (w, h) => Vec2::new(w, h),
        }
    }
}
