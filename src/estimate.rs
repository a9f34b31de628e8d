//! # Content Estimator
//!
//! Converts storyboard elements into estimated rendered heights for a given
//! column width and typography. The estimate mirrors how the downstream
//! renderer treats text: body text splits into paragraphs on single
//! newlines, each paragraph word-wraps independently inside the column, and
//! every rendered line costs `font_size / 72 × line_spacing` inches. A small
//! per-newline compensation accounts for the renderer's paragraph advance.
//!
//! Estimates are deterministic and monotone: more text never gets shorter,
//! a wider column never gets taller. Balancing is reproducible because of
//! this; there is no randomness anywhere in the estimator.

use unicode_linebreak::{linebreaks, BreakOpportunity};

use crate::error::LayoutError;
use crate::metrics;
use crate::model::{BalancerConfig, Section, Typography, Visual};

/// Per-newline height compensation as a fraction of the line height,
/// matching the renderer's paragraph advance.
const NEWLINE_OFFSET_RATIO: f64 = 0.2;

/// Estimated height of a section in inches at the given column width.
///
/// A pre-measured section uses its recorded height (tracking the global
/// typography scale); otherwise the title band and body paragraphs are
/// wrap-estimated. Fails with [`LayoutError::Estimation`] when a section has
/// neither text nor a pre-measured height.
pub fn estimate_section_height(
    section: &Section,
    column_width: f64,
    typography: &Typography,
) -> Result<f64, LayoutError> {
    if let Some(h) = section.estimated_height {
        return Ok(h * typography.scale);
    }

    let title = section.title.as_deref().map(str::trim).unwrap_or("");
    let body = section.body.trim();
    if title.is_empty() && body.is_empty() {
        return Err(LayoutError::Estimation {
            element: section.id.clone(),
            reason: "section has no body text, title, or pre-measured height".to_string(),
        });
    }

    let mut height = 0.0;
    if !title.is_empty() {
        let size = typography.title_font_size * typography.scale;
        height += wrapped_line_count(title, size, column_width) as f64
            * line_height_in(size, typography.line_spacing);
    }

    let body_size = typography.body_font_size * typography.scale;
    let body_line = line_height_in(body_size, typography.line_spacing);
    for paragraph in body.split('\n') {
        let paragraph = paragraph.trim();
        if paragraph.is_empty() {
            continue;
        }
        height += wrapped_line_count(paragraph, body_size, column_width) as f64 * body_line;
    }

    // Paragraph-advance compensation, proportional to newline count.
    let newlines = body.matches('\n').count() as f64;
    height += newlines * body_line * NEWLINE_OFFSET_RATIO;

    Ok(height)
}

/// Estimated geometry of a visual: the width-constrained image block plus
/// its caption band.
#[derive(Debug, Clone, Copy)]
pub struct VisualEstimate {
    /// Height of the image/table block in inches, after the capacity cap.
    pub image_height: f64,
    /// Height of the caption band in inches (zero when there is no caption).
    pub caption_height: f64,
}

impl VisualEstimate {
    pub fn total(&self) -> f64 {
        self.image_height + self.caption_height
    }
}

/// Estimate a visual at the given column width.
///
/// The image scales width-constrained (`column_width / aspect_ratio`) and is
/// capped at the configured fraction of column capacity; the cap shrinks the
/// display width too, preserving the intrinsic aspect ratio. Fails with
/// [`LayoutError::Estimation`] when the aspect ratio is missing or
/// non-positive.
pub fn estimate_visual(
    visual: &Visual,
    column_width: f64,
    column_capacity: f64,
    typography: &Typography,
    config: &BalancerConfig,
) -> Result<VisualEstimate, LayoutError> {
    let aspect = match visual.aspect_ratio {
        Some(a) if a > 0.0 => a,
        _ => {
            return Err(LayoutError::Estimation {
                element: visual.id.clone(),
                reason: "missing or non-positive aspect ratio".to_string(),
            })
        }
    };

    let natural = column_width / aspect;
    let image_height = natural.min(config.max_visual_fraction * column_capacity);

    let caption = visual.caption.trim();
    let caption_height = if caption.is_empty() {
        0.0
    } else {
        let size = typography.caption_font_size * typography.scale;
        wrapped_line_count(caption, size, column_width) as f64
            * line_height_in(size, typography.line_spacing)
    };

    Ok(VisualEstimate {
        image_height,
        caption_height,
    })
}

fn line_height_in(font_size_pt: f64, line_spacing: f64) -> f64 {
    font_size_pt / 72.0 * line_spacing
}

/// A run of characters that must stay together on one line.
struct Segment {
    width: f64,
    mandatory_start: bool,
}

/// Count the lines a paragraph occupies when greedily wrapped into
/// `max_width` inches at `font_size_pt`.
///
/// Break opportunities come from UAX#14. Segments between opportunities are
/// packed first-fit; a segment wider than the column is hard-broken at the
/// column edge rather than looping forever.
pub fn wrapped_line_count(text: &str, font_size_pt: f64, max_width: f64) -> usize {
    let segments = split_segments(text, font_size_pt);
    if segments.is_empty() || max_width <= 0.0 {
        return if text.trim().is_empty() { 0 } else { 1 };
    }

    let mut lines = 1usize;
    let mut line_width = 0.0;
    for seg in &segments {
        if seg.mandatory_start && line_width > 0.0 {
            lines += 1;
            line_width = 0.0;
        }
        if line_width > 0.0 && line_width + seg.width > max_width {
            lines += 1;
            line_width = seg.width;
        } else {
            line_width += seg.width;
        }
        // Hard-break oversized runs (URLs, long identifiers).
        while line_width > max_width {
            lines += 1;
            line_width -= max_width;
        }
    }
    lines
}

/// Split text into unbreakable segments at UAX#14 break opportunities.
///
/// `linebreaks` yields byte offsets *after* which a break may occur, i.e.
/// the start of the next segment; the trailing end-of-text opportunity is
/// dropped.
fn split_segments(text: &str, font_size_pt: f64) -> Vec<Segment> {
    if text.is_empty() {
        return vec![];
    }
    let mut segments = Vec::new();
    let mut start = 0usize;
    let mut mandatory_start = false;
    for (offset, opportunity) in linebreaks(text) {
        if offset < text.len() {
            segments.push(Segment {
                width: metrics::string_width(&text[start..offset], font_size_pt),
                mandatory_start,
            });
            start = offset;
            mandatory_start = matches!(opportunity, BreakOpportunity::Mandatory);
        }
    }
    segments.push(Segment {
        width: metrics::string_width(&text[start..], font_size_pt),
        mandatory_start,
    });
    segments
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Section;

    fn typography() -> Typography {
        Typography::default()
    }

    fn section_with_body(body: &str) -> Section {
        Section {
            id: "s".to_string(),
            title: None,
            body: body.to_string(),
            rank: 0,
            estimated_height: None,
        }
    }

    const LOREM: &str = "We study the effect of column balance on poster readability \
                         across a corpus of two hundred conference posters.";

    #[test]
    fn taller_with_more_text() {
        let short = estimate_section_height(&section_with_body(LOREM), 17.0, &typography());
        let long = estimate_section_height(
            &section_with_body(&format!("{LOREM} {LOREM} {LOREM}")),
            17.0,
            &typography(),
        );
        assert!(long.unwrap() > short.unwrap());
    }

    #[test]
    fn shorter_in_wider_column() {
        let text = format!("{LOREM} {LOREM}");
        let narrow = estimate_section_height(&section_with_body(&text), 10.0, &typography());
        let wide = estimate_section_height(&section_with_body(&text), 20.0, &typography());
        assert!(narrow.unwrap() >= wide.unwrap());
    }

    #[test]
    fn deterministic_across_calls() {
        let section = section_with_body(LOREM);
        let a = estimate_section_height(&section, 17.0, &typography()).unwrap();
        let b = estimate_section_height(&section, 17.0, &typography()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn empty_section_is_an_error() {
        let err = estimate_section_height(&section_with_body("  "), 17.0, &typography());
        assert!(matches!(err, Err(LayoutError::Estimation { .. })));
    }

    #[test]
    fn premeasured_height_tracks_scale() {
        let section = Section::measured("s", 0, 6.0);
        let full = estimate_section_height(&section, 17.0, &typography()).unwrap();
        let scaled =
            estimate_section_height(&section, 17.0, &typography().with_scale(0.5)).unwrap();
        assert!((full - 6.0).abs() < 1e-9);
        assert!((scaled - 3.0).abs() < 1e-9);
    }

    #[test]
    fn visual_height_is_width_constrained() {
        let visual = crate::model::Visual::figure("f", 2.0);
        let est = estimate_visual(&visual, 16.0, 34.0, &typography(), &BalancerConfig::default())
            .unwrap();
        assert!((est.image_height - 8.0).abs() < 1e-9);
        assert_eq!(est.caption_height, 0.0);
    }

    #[test]
    fn tall_visual_is_capped_at_capacity_fraction() {
        // aspect 0.25 would want 68in; cap = 0.4 * 34 = 13.6in
        let visual = crate::model::Visual::figure("f", 0.25);
        let est = estimate_visual(&visual, 17.0, 34.0, &typography(), &BalancerConfig::default())
            .unwrap();
        assert!((est.image_height - 13.6).abs() < 1e-9);
    }

    #[test]
    fn visual_without_aspect_ratio_is_an_error() {
        let mut visual = crate::model::Visual::figure("f", 1.0);
        visual.aspect_ratio = None;
        let err = estimate_visual(&visual, 17.0, 34.0, &typography(), &BalancerConfig::default());
        assert!(matches!(err, Err(LayoutError::Estimation { .. })));
    }

    #[test]
    fn caption_adds_height() {
        let bare = crate::model::Visual::figure("f", 2.0);
        let captioned = crate::model::Visual::figure("f", 2.0)
            .with_caption("Figure 1: measured column utilization across the corpus.");
        let cfg = BalancerConfig::default();
        let a = estimate_visual(&bare, 17.0, 34.0, &typography(), &cfg).unwrap();
        let b = estimate_visual(&captioned, 17.0, 34.0, &typography(), &cfg).unwrap();
        assert!(b.total() > a.total());
        assert_eq!(a.image_height, b.image_height);
    }

    #[test]
    fn oversized_word_hard_breaks() {
        let lines = wrapped_line_count(
            "supercalifragilisticexpialidocious",
            400.0,
            2.0,
        );
        assert!(lines > 1);
    }
}
