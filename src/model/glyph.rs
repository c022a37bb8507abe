//! Glyph and bounding-box primitives.

/// Axis-aligned bounding box in PDF user space (y grows upward).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BBox {
    /// Left edge
    pub x0: f32,
    /// Bottom edge
    pub y0: f32,
    /// Right edge
    pub x1: f32,
    /// Top edge
    pub y1: f32,
}

impl BBox {
    /// Create a new bounding box.
    pub fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    /// Box width.
    pub fn width(&self) -> f32 {
        self.x1 - self.x0
    }

    /// Box height.
    pub fn height(&self) -> f32 {
        self.y1 - self.y0
    }

    /// Smallest box covering both `self` and `other`.
    pub fn union(&self, other: &BBox) -> BBox {
        BBox {
            x0: self.x0.min(other.x0),
            y0: self.y0.min(other.y0),
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
        }
    }
}

/// A single rendered character with position, size and font metadata.
///
/// Glyphs are owned by their page's content; spans and structure nodes
/// refer to them by index, never by copy.
#[derive(Debug, Clone)]
pub struct Glyph {
    /// The character (one grapheme).
    pub value: String,
    /// Bounding box in page space.
    pub bbox: BBox,
    /// Point size at which the glyph was rendered.
    pub size: f32,
    /// Font identifier (base font name, e.g. "Helvetica-Bold").
    pub font: String,
    /// Original content-stream emission order, 0-based per page.
    ///
    /// This is the ground truth for intra-span reading order; it is not
    /// guaranteed to match geometric left-to-right/top-to-bottom order.
    pub seq: u32,
}

impl Glyph {
    /// Whether the font identifier carries a bold/heavy/black marker.
    pub fn is_bold(&self) -> bool {
        let lower = self.font.to_lowercase();
        lower.contains("bold") || lower.contains("heavy") || lower.contains("black")
    }

    /// Glyph width.
    pub fn width(&self) -> f32 {
        self.bbox.width()
    }

    /// Glyph height.
    pub fn height(&self) -> f32 {
        self.bbox.height()
    }
}
