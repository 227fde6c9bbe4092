use std::fmt;

/// Fixed-size working surface every layer is rendered onto.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Canvas {
    pub width: u32,
    pub height: u32,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Zero-area canvases are produced when no image layer contributes a size.
    pub fn is_degenerate(self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Component-wise maximum of two sizes.
    pub fn union(self, other: Canvas) -> Canvas {
        Canvas {
            width: self.width.max(other.width),
            height: self.height.max(other.height),
        }
    }

    /// ImageMagick `-size` geometry, e.g. `300x200`.
    pub fn geometry(self) -> String {
        format!("{}x{}", self.width, self.height)
    }
}

/// Pixel displacement of a layer relative to its anchor.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Offset {
    pub x: i32,
    pub y: i32,
}

impl Offset {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Offset {
    // `+x+y` geometry; negative components carry their own sign.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:+}{:+}", self.x, self.y)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
