//! # Storyboard Model
//!
//! The input representation for the balancing engine. A storyboard is the
//! narrative decomposition of a paper produced upstream: an ordered sequence
//! of sections plus a set of classified visuals (figures and tables) with
//! intrinsic aspect ratios. This is designed to be easily produced by a
//! curation stage, a JSON API, or direct construction in tests.
//!
//! Everything here is read-only input during balancing. The engine never
//! mutates a storyboard; it annotates elements with placements in its output.

use serde::{Deserialize, Serialize};

/// A complete storyboard ready for balancing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Storyboard {
    /// Sections in narrative order. Rank breaks ties with input order.
    pub sections: Vec<Section>,

    /// Figures and tables referenced by the paper. Each may be bound to at
    /// most one owning section via `section`.
    #[serde(default)]
    pub visuals: Vec<Visual>,
}

/// One narrative unit of the poster: a titled block of body text.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    /// Unique identifier, referenced by placements and decisions.
    pub id: String,

    /// Section heading. Rendered as a title band above the body.
    #[serde(default)]
    pub title: Option<String>,

    /// Body text. Paragraphs are separated by newlines.
    #[serde(default)]
    pub body: String,

    /// Narrative order from the curation stage. Sections with equal rank
    /// keep their input order.
    #[serde(default)]
    pub rank: u32,

    /// Pre-measured height in inches, when an upstream stage has already
    /// measured this section against the real renderer. Overrides the
    /// text-based estimate; still tracks the global typography scale.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_height: Option<f64>,
}

/// A figure or table with an intrinsic aspect ratio.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Visual {
    /// Unique identifier, referenced by placements and decisions.
    pub id: String,

    /// Whether this is a figure or a table.
    pub kind: VisualKind,

    /// Intrinsic width/height ratio from the source asset. Required for
    /// height estimation; a missing or non-positive ratio aborts the run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aspect_ratio: Option<f64>,

    /// Caption text, rendered below the visual at caption size.
    #[serde(default)]
    pub caption: String,

    /// Id of the owning section, if any. Bound visuals are placed
    /// immediately after their section in the same column.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
}

/// Classification of a visual element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VisualKind {
    Figure,
    Table,
}

/// Typography settings the estimator measures against. Font sizes are in
/// points; spacings are in inches.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Typography {
    /// Body text size in points.
    #[serde(default = "default_body_size")]
    pub body_font_size: f64,

    /// Section title size in points.
    #[serde(default = "default_title_size")]
    pub title_font_size: f64,

    /// Caption size in points.
    #[serde(default = "default_caption_size")]
    pub caption_font_size: f64,

    /// Line height as a multiplier of font size.
    #[serde(default = "default_line_spacing")]
    pub line_spacing: f64,

    /// Vertical gap between elements in a column, in inches.
    #[serde(default = "default_section_spacing")]
    pub section_spacing: f64,

    /// Vertical gap between a section and its bound visuals, in inches.
    #[serde(default = "default_visual_spacing")]
    pub visual_spacing: f64,

    /// Global scale factor applied to all font sizes. The overflow resolver
    /// steps this down when content cannot fit.
    #[serde(default = "default_scale")]
    pub scale: f64,
}

impl Default for Typography {
    fn default() -> Self {
        Self {
            body_font_size: default_body_size(),
            title_font_size: default_title_size(),
            caption_font_size: default_caption_size(),
            line_spacing: default_line_spacing(),
            section_spacing: default_section_spacing(),
            visual_spacing: default_visual_spacing(),
            scale: default_scale(),
        }
    }
}

impl Typography {
    /// A copy of these settings with the global scale replaced.
    pub fn with_scale(&self, scale: f64) -> Self {
        Self {
            scale,
            ..self.clone()
        }
    }
}

fn default_body_size() -> f64 {
    32.0
}

fn default_title_size() -> f64 {
    44.0
}

fn default_caption_size() -> f64 {
    24.0
}

fn default_line_spacing() -> f64 {
    1.2
}

fn default_section_spacing() -> f64 {
    0.3
}

fn default_visual_spacing() -> f64 {
    0.2
}

fn default_scale() -> f64 {
    1.0
}

/// Tuning knobs for the balancer and overflow resolver. Sourced from the
/// surrounding system's configuration; the engine never loads these from
/// disk itself. The defaults are starting points, not authoritative values.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalancerConfig {
    /// Maximum allowed spread between the most and least utilized column
    /// (as a fraction of capacity) before rebalancing kicks in.
    #[serde(default = "default_imbalance_threshold")]
    pub imbalance_threshold: f64,

    /// Cap on rebalancing move attempts per balancing pass.
    #[serde(default = "default_rebalance_iterations")]
    pub max_rebalance_iterations: u32,

    /// Cap on typography-scale overflow retries per run.
    #[serde(default = "default_overflow_retries")]
    pub max_overflow_retries: u32,

    /// Multiplier applied to the typography scale on each overflow retry.
    #[serde(default = "default_scale_step")]
    pub scale_step: f64,

    /// Lower bound on visual shrinking, as a fraction of the visual's
    /// estimated height. 0.5 means a visual never shrinks below half size.
    #[serde(default = "default_min_visual_scale")]
    pub min_visual_scale: f64,

    /// Upper bound on a visual's height, as a fraction of column capacity.
    #[serde(default = "default_max_visual_fraction")]
    pub max_visual_fraction: f64,
}

impl Default for BalancerConfig {
    fn default() -> Self {
        Self {
            imbalance_threshold: default_imbalance_threshold(),
            max_rebalance_iterations: default_rebalance_iterations(),
            max_overflow_retries: default_overflow_retries(),
            scale_step: default_scale_step(),
            min_visual_scale: default_min_visual_scale(),
            max_visual_fraction: default_max_visual_fraction(),
        }
    }
}

fn default_imbalance_threshold() -> f64 {
    0.15
}

fn default_rebalance_iterations() -> u32 {
    6
}

fn default_overflow_retries() -> u32 {
    3
}

fn default_scale_step() -> f64 {
    0.9
}

fn default_min_visual_scale() -> f64 {
    0.5
}

fn default_max_visual_fraction() -> f64 {
    0.4
}

/// A full balancing request as it arrives over the JSON surface: storyboard,
/// canvas spec, and optional typography/config overrides.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceRequest {
    pub storyboard: Storyboard,
    pub canvas: crate::canvas::CanvasSpec,
    /// Snap the canvas to the 54in reference print width before validation,
    /// deriving the height from the requested aspect ratio.
    #[serde(default)]
    pub normalize: bool,
    #[serde(default)]
    pub typography: Typography,
    #[serde(default)]
    pub config: BalancerConfig,
}

impl Section {
    /// Create a section with a title and body at the given narrative rank.
    pub fn new(id: &str, title: &str, body: &str, rank: u32) -> Self {
        Self {
            id: id.to_string(),
            title: Some(title.to_string()),
            body: body.to_string(),
            rank,
            estimated_height: None,
        }
    }

    /// Create a section with a pre-measured height instead of body text.
    pub fn measured(id: &str, rank: u32, height: f64) -> Self {
        Self {
            id: id.to_string(),
            title: None,
            body: String::new(),
            rank,
            estimated_height: Some(height),
        }
    }
}

impl Visual {
    /// Create a figure with the given aspect ratio, bound to no section.
    pub fn figure(id: &str, aspect_ratio: f64) -> Self {
        Self {
            id: id.to_string(),
            kind: VisualKind::Figure,
            aspect_ratio: Some(aspect_ratio),
            caption: String::new(),
            section: None,
        }
    }

    /// Create a table with the given aspect ratio, bound to no section.
    pub fn table(id: &str, aspect_ratio: f64) -> Self {
        Self {
            id: id.to_string(),
            kind: VisualKind::Table,
            aspect_ratio: Some(aspect_ratio),
            caption: String::new(),
            section: None,
        }
    }

    /// Bind this visual to an owning section.
    pub fn bound_to(mut self, section_id: &str) -> Self {
        self.section = Some(section_id.to_string());
        self
    }

    /// Attach a caption.
    pub fn with_caption(mut self, caption: &str) -> Self {
        self.caption = caption.to_string();
        self
    }
}
