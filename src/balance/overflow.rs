//! # Overflow Resolver
//!
//! When a balancing pass leaves a column taller than its capacity, the
//! resolver tries a fixed escalation, in order:
//!
//! 1. Shrink the visuals in the overflowing column, proportionally to how
//!    much slack each one has, never below the configured minimum scale.
//! 2. Request a shortened variant of the column's longest text section.
//!    Producing the shorter text is an upstream collaborator's job; here it
//!    is a logged signal only.
//! 3. Step the global typography scale down and re-balance (driven by the
//!    caller's retry loop in [`super::Balancer::run`]).
//!
//! Only when the retry budget is exhausted does the run fail with
//! `LayoutInfeasible`; content is never silently dropped.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::model::BalancerConfig;

use super::{Action, ColumnState, Decision, Group, MemberDetail, Placement, EPS};

/// Shrink visuals in every overflowing column. Updates the per-visual shrink
/// factor map and appends `Resized` decisions. Returns true when any factor
/// changed; the caller then re-estimates and re-balances.
pub(crate) fn shrink_visuals(
    columns: &[ColumnState],
    groups: &[Group],
    capacity: f64,
    config: &BalancerConfig,
    shrink: &mut HashMap<String, f64>,
    log: &mut Vec<Decision>,
) -> bool {
    let mut applied = false;

    for col in columns {
        let needed = -col.remaining(capacity);
        if needed <= EPS {
            continue;
        }

        // How much height each visual can still give up before hitting the
        // minimum scale.
        let mut candidates: Vec<(String, f64, f64, f64, f64)> = Vec::new();
        let mut reducible_total = 0.0;
        for &g in &col.groups {
            for member in &groups[g].members {
                if let MemberDetail::Visual {
                    base_image_height,
                    image_height,
                    caption_height,
                    ..
                } = member.detail
                {
                    let floor = base_image_height * config.min_visual_scale;
                    let reducible = (image_height - floor).max(0.0);
                    if reducible > EPS {
                        candidates.push((
                            member.id.clone(),
                            base_image_height,
                            image_height,
                            caption_height,
                            reducible,
                        ));
                        reducible_total += reducible;
                    }
                }
            }
        }
        if reducible_total <= EPS {
            continue;
        }

        let reduction = needed.min(reducible_total);
        debug!(
            column = col.index,
            needed,
            reduction,
            visuals = candidates.len(),
            "shrinking visuals"
        );
        for (id, base, image, caption, reducible) in candidates {
            let delta = reduction * reducible / reducible_total;
            let new_factor = (image - delta) / base;
            shrink.insert(id.clone(), new_factor);
            log.push(Decision {
                element: id,
                action: Action::Resized,
                rationale: format!(
                    "shrunk to relieve {:.2}in overflow in column {}",
                    needed, col.index
                ),
                before_height: Some(image + caption),
                after_height: Some(image - delta + caption),
            });
        }
        applied = true;
    }

    applied
}

/// For each overflowing column, request a shortened variant of its longest
/// text section. Each section is requested at most once per run.
pub(crate) fn request_truncation(
    columns: &[ColumnState],
    groups: &[Group],
    capacity: f64,
    requested: &mut HashSet<String>,
    log: &mut Vec<Decision>,
) {
    for col in columns {
        let overflow = -col.remaining(capacity);
        if overflow <= EPS {
            continue;
        }

        let mut longest: Option<(&str, usize, f64)> = None;
        for &g in &col.groups {
            for member in &groups[g].members {
                if let MemberDetail::Section { text_len } = member.detail {
                    if text_len > 0 && longest.map_or(true, |(_, len, _)| text_len > len) {
                        longest = Some((&member.id, text_len, member.height));
                    }
                }
            }
        }

        if let Some((id, _, height)) = longest {
            if requested.insert(id.to_string()) {
                debug!(section = id, column = col.index, overflow, "requesting truncation");
                log.push(Decision {
                    element: id.to_string(),
                    action: Action::TruncationRequested,
                    rationale: format!(
                        "column {} overflows by {:.2}in; shortened text requested from upstream",
                        col.index, overflow
                    ),
                    before_height: Some(height),
                    after_height: None,
                });
            }
        }
    }
}

/// Total overflow across columns and the elements that extend past column
/// capacity, for the `LayoutInfeasible` report.
pub(crate) fn summarize(
    placements: &[Placement],
    columns: &[ColumnState],
    capacity: f64,
) -> (f64, Vec<String>) {
    let overflow = columns
        .iter()
        .map(|c| (c.used - capacity).max(0.0))
        .sum::<f64>();
    let elements = placements
        .iter()
        .filter(|p| p.y + p.height > capacity + EPS)
        .map(|p| p.element.clone())
        .collect();
    (overflow, elements)
}
