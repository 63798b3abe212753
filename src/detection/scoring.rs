//! Heuristic ranking of plate-region candidates.
//!
//! The scoring table is data: an ordered list of (criterion, points,
//! predicate) rules evaluated against precomputed candidate features and
//! summed. Adding a criterion means adding a row, not another branch.

use tracing::debug;

use crate::models::PlateCandidate;

/// Measurements a scoring rule may look at, precomputed once per candidate.
#[derive(Debug, Clone, Copy)]
pub struct CandidateFeatures {
    /// Bounding-box width over height.
    pub aspect_ratio: f32,
    /// Enclosed area over total raster area.
    pub area_ratio: f64,
    /// Bounding-box vertical center over raster height.
    pub center_y_frac: f32,
    /// Vertex count of the simplified polygon.
    pub vertices: usize,
}

impl CandidateFeatures {
    pub fn measure(candidate: &PlateCandidate, raster_dims: (u32, u32)) -> Self {
        let (w, h) = raster_dims;
        let raster_area = (w as f64 * h as f64).max(1.0);
        Self {
            aspect_ratio: candidate.aspect_ratio,
            area_ratio: candidate.area / raster_area,
            center_y_frac: candidate.bbox.center_y() / (h as f32).max(1.0),
            vertices: candidate.vertex_count(),
        }
    }
}

/// One row of the scoring table.
pub struct ScoreRule {
    pub name: &'static str,
    pub points: i32,
    pub applies: fn(&CandidateFeatures) -> bool,
}

/// Plate-likeness scoring table. Tiered criteria are written as disjoint
/// predicates so each candidate collects at most one tier per criterion.
pub const SCORE_RULES: &[ScoreRule] = &[
    ScoreRule {
        name: "aspect 4.0..5.0",
        points: 4,
        applies: |f| (4.0..=5.0).contains(&f.aspect_ratio),
    },
    ScoreRule {
        name: "aspect 3.5..5.5",
        points: 2,
        applies: |f| {
            (3.5..=5.5).contains(&f.aspect_ratio) && !(4.0..=5.0).contains(&f.aspect_ratio)
        },
    },
    ScoreRule {
        name: "aspect 2.5..6.0",
        points: 1,
        applies: |f| {
            (2.5..=6.0).contains(&f.aspect_ratio) && !(3.5..=5.5).contains(&f.aspect_ratio)
        },
    },
    ScoreRule {
        name: "area ratio 0.005..0.05",
        points: 3,
        applies: |f| (0.005..=0.05).contains(&f.area_ratio),
    },
    ScoreRule {
        name: "area ratio 0.001..0.1",
        points: 1,
        applies: |f| {
            (0.001..=0.1).contains(&f.area_ratio) && !(0.005..=0.05).contains(&f.area_ratio)
        },
    },
    ScoreRule {
        name: "lower part of frame",
        points: 2,
        applies: |f| f.center_y_frac > 0.4,
    },
    ScoreRule {
        name: "4..6 vertices",
        points: 2,
        applies: |f| (4..=6).contains(&f.vertices),
    },
];

/// Score a single candidate against the table.
pub fn score_candidate(features: &CandidateFeatures) -> i32 {
    SCORE_RULES
        .iter()
        .filter(|rule| (rule.applies)(features))
        .map(|rule| rule.points)
        .sum()
}

/// Pick the highest-scoring candidate, or `None` for an empty list.
///
/// Candidates are sorted by raw area descending before the scoring scan and
/// ties keep the first maximum, so equal-scored proposals resolve to the
/// larger region. The winner is returned with its score attached.
pub fn select_best(
    mut candidates: Vec<PlateCandidate>,
    raster_dims: (u32, u32),
) -> Option<PlateCandidate> {
    if candidates.is_empty() {
        return None;
    }

    candidates.sort_by(|a, b| b.area.partial_cmp(&a.area).unwrap_or(std::cmp::Ordering::Equal));

    let mut best: Option<(usize, i32)> = None;
    for (idx, candidate) in candidates.iter().enumerate() {
        let features = CandidateFeatures::measure(candidate, raster_dims);
        let score = score_candidate(&features);
        debug!(
            "candidate {idx}: bbox {:?} aspect {:.2} area {:.0} -> score {score}",
            candidate.bbox, candidate.aspect_ratio, candidate.area
        );
        if best.is_none_or(|(_, s)| score > s) {
            best = Some((idx, score));
        }
    }

    let (idx, score) = best?;
    let mut winner = candidates.swap_remove(idx);
    winner.score = Some(score);
    Some(winner)
}
