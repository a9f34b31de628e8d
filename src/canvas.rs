//! # Canvas Model
//!
//! Poster geometry: outer dimensions, margins, and the three-column grid.
//!
//! A canvas is validated and frozen before any balancing begins. The aspect
//! ratio is constrained to [1.4, 2.0]: the lower bound matches ISO A paper
//! proportions, the upper bound the practical limit of human vision for a
//! poster viewed as a whole. All geometry is in inches, with the placement
//! origin at the top-left corner of the content area (inside the margins).

use serde::{Deserialize, Serialize};

use crate::error::LayoutError;

/// Poster columns are fixed at three: the classic research-poster triptych.
pub const COLUMN_COUNT: usize = 3;

/// Minimum width/height ratio (ISO A paper proportions).
pub const MIN_ASPECT_RATIO: f64 = 1.4;

/// Maximum width/height ratio (human vision limit).
pub const MAX_ASPECT_RATIO: f64 = 2.0;

/// Reference poster width used by [`CanvasSpec::normalized`], in inches.
pub const BASE_WIDTH: f64 = 54.0;

/// Edge values (top, right, bottom, left) used for margins.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Edges {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Default for Edges {
    fn default() -> Self {
        Self::uniform(1.0)
    }
}

impl Edges {
    pub fn uniform(v: f64) -> Self {
        Self {
            top: v,
            right: v,
            bottom: v,
            left: v,
        }
    }

    pub fn horizontal(&self) -> f64 {
        self.left + self.right
    }

    pub fn vertical(&self) -> f64 {
        self.top + self.bottom
    }
}

/// Requested canvas geometry, before validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasSpec {
    /// Poster width in inches.
    pub width: f64,
    /// Poster height in inches.
    pub height: f64,
    /// Margins in inches. Defaults to 1in on every side.
    #[serde(default)]
    pub margin: Edges,
    /// Gap between adjacent columns, in inches.
    #[serde(default = "default_gutter")]
    pub gutter: f64,
}

fn default_gutter() -> f64 {
    0.5
}

impl CanvasSpec {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            margin: Edges::default(),
            gutter: default_gutter(),
        }
    }

    pub fn with_margin(mut self, margin: Edges) -> Self {
        self.margin = margin;
        self
    }

    /// Normalize to the reference print width: fix width at 54in and derive
    /// height from the requested aspect ratio. Margins and gutter are kept.
    /// The ratio bounds are still enforced by [`Canvas::new`].
    pub fn normalized(&self) -> CanvasSpec {
        let ratio = self.width / self.height;
        CanvasSpec {
            width: BASE_WIDTH,
            height: BASE_WIDTH / ratio,
            margin: self.margin,
            gutter: self.gutter,
        }
    }
}

/// Validated, immutable poster geometry. Owned by a single balancing run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Canvas {
    pub width: f64,
    pub height: f64,
    pub margin: Edges,
    pub gutter: f64,
    /// Usable width inside the margins.
    pub content_width: f64,
    /// Usable height inside the margins.
    pub content_height: f64,
    /// Width of each of the three columns.
    pub column_width: f64,
}

impl Canvas {
    /// Validate a spec and compute the column grid.
    ///
    /// Fails with [`LayoutError::InvalidDimension`] when a dimension is not
    /// positive, the aspect ratio falls outside [1.4, 2.0], or margins and
    /// gutters leave no usable content area.
    pub fn new(spec: &CanvasSpec) -> Result<Canvas, LayoutError> {
        if spec.width <= 0.0 || spec.height <= 0.0 {
            return Err(LayoutError::InvalidDimension(format!(
                "width and height must be positive, got {}in x {}in",
                spec.width, spec.height
            )));
        }
        let ratio = spec.width / spec.height;
        if !(MIN_ASPECT_RATIO..=MAX_ASPECT_RATIO).contains(&ratio) {
            return Err(LayoutError::InvalidDimension(format!(
                "aspect ratio {:.3} is outside [{}, {}]",
                ratio, MIN_ASPECT_RATIO, MAX_ASPECT_RATIO
            )));
        }
        if spec.gutter < 0.0 {
            return Err(LayoutError::InvalidDimension(format!(
                "gutter must be non-negative, got {}in",
                spec.gutter
            )));
        }

        let content_width = spec.width - spec.margin.horizontal();
        let content_height = spec.height - spec.margin.vertical();
        let column_width =
            (content_width - spec.gutter * (COLUMN_COUNT as f64 - 1.0)) / COLUMN_COUNT as f64;
        if content_width <= 0.0 || content_height <= 0.0 || column_width <= 0.0 {
            return Err(LayoutError::InvalidDimension(format!(
                "margins and gutter leave no content area ({:.2}in x {:.2}in, column {:.2}in)",
                content_width, content_height, column_width
            )));
        }

        Ok(Canvas {
            width: spec.width,
            height: spec.height,
            margin: spec.margin,
            gutter: spec.gutter,
            content_width,
            content_height,
            column_width,
        })
    }

    /// Width available to every column.
    pub fn column_width(&self) -> f64 {
        self.column_width
    }

    /// Vertical capacity of every column (the content height).
    pub fn column_capacity(&self) -> f64 {
        self.content_height
    }

    /// X offset of a column's left edge, relative to the content origin.
    pub fn column_x(&self, index: usize) -> f64 {
        debug_assert!(index < COLUMN_COUNT);
        index as f64 * (self.column_width + self.gutter)
    }

    pub fn aspect_ratio(&self) -> f64 {
        self.width / self.height
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn square_canvas_is_rejected() {
        let err = Canvas::new(&CanvasSpec::new(42.0, 42.0)).unwrap_err();
        assert!(matches!(err, LayoutError::InvalidDimension(_)));
    }

    #[test]
    fn standard_poster_is_accepted() {
        let canvas = Canvas::new(&CanvasSpec::new(54.0, 36.0)).unwrap();
        assert!((canvas.aspect_ratio() - 1.5).abs() < 1e-9);
    }

    #[test]
    fn non_positive_dimensions_are_rejected() {
        assert!(Canvas::new(&CanvasSpec::new(0.0, 36.0)).is_err());
        assert!(Canvas::new(&CanvasSpec::new(54.0, -1.0)).is_err());
    }

    #[test]
    fn too_wide_canvas_is_rejected() {
        // ratio 2.25, past the human-vision bound
        assert!(Canvas::new(&CanvasSpec::new(54.0, 24.0)).is_err());
    }

    #[test]
    fn column_grid_arithmetic() {
        // 54in wide, 1in margins, 0.5in gutters: 52in content,
        // (52 - 1) / 3 = 17in columns.
        let canvas = Canvas::new(&CanvasSpec::new(54.0, 36.0)).unwrap();
        assert!((canvas.content_width - 52.0).abs() < 1e-9);
        assert!((canvas.content_height - 34.0).abs() < 1e-9);
        assert!((canvas.column_width() - 17.0).abs() < 1e-9);
        assert!((canvas.column_x(0) - 0.0).abs() < 1e-9);
        assert!((canvas.column_x(1) - 17.5).abs() < 1e-9);
        assert!((canvas.column_x(2) - 35.0).abs() < 1e-9);
    }

    #[test]
    fn normalization_fixes_width_and_keeps_ratio() {
        let spec = CanvasSpec::new(27.0, 18.0).normalized();
        assert!((spec.width - 54.0).abs() < 1e-9);
        assert!((spec.height - 36.0).abs() < 1e-9);
        assert!(Canvas::new(&spec).is_ok());
    }

    #[test]
    fn oversized_margins_are_rejected() {
        let spec = CanvasSpec::new(54.0, 36.0).with_margin(Edges::uniform(20.0));
        assert!(Canvas::new(&spec).is_err());
    }
}
