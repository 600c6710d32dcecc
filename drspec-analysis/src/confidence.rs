//! C9 — confidence score normalization, status-transition policy, and
//! vision-finding adjustment (§4.9).

use drspec_core::{ArtifactStatus, ConfidenceLevel, Significance};

/// Normalize a stored confidence value to the display scale `[0,100]`.
///
/// Legacy rows stored `[0,100]` directly; current rows store `[0,1]`.
/// A stored value `> 1.0` is treated as already on the legacy scale.
pub fn normalize_display(stored: f64) -> f64 {
    if stored <= 1.0 {
        (stored * 100.0).round()
    } else {
        stored.round()
    }
}

/// The reverse of `normalize_display` for writes: clamp a caller-submitted
/// `[0,100]` confidence down to the `[0,1]` storage representation.
pub fn to_stored(submitted_0_100: f64) -> f64 {
    (submitted_0_100.clamp(0.0, 100.0)) / 100.0
}

/// Apply the vision-finding penalty (§4.9): subtract `significance.penalty()`
/// for every `NEW` finding, clamp to `[0,100]`. `ADDRESSED`/`IGNORED`
/// findings contribute nothing — callers should only pass `NEW` ones.
pub fn adjust_for_findings(base_display: f64, new_finding_significances: &[Significance]) -> f64 {
    let penalty: f64 = new_finding_significances.iter().map(|s| s.penalty()).sum();
    (base_display - penalty).clamp(0.0, 100.0)
}

/// §4.9 status transition rule: `VERIFIED` if `c >= threshold` else `NEEDS_REVIEW`.
pub fn status_for_confidence(submitted_0_100: f64, threshold: f64) -> ArtifactStatus {
    if submitted_0_100 >= threshold {
        ArtifactStatus::Verified
    } else {
        ArtifactStatus::NeedsReview
    }
}

/// Display-scale confidence bucket (§4.9).
pub fn level(display_0_100: f64) -> ConfidenceLevel {
    ConfidenceLevel::from_display(display_0_100)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_fractional_as_percent() {
        assert_eq!(normalize_display(0.85), 85.0);
    }

    #[test]
    fn normalizes_legacy_scale_unchanged() {
        assert_eq!(normalize_display(85.0), 85.0);
    }

    #[test]
    fn boundary_value_one_is_fractional_scale() {
        // 1.0 <= 1.0 so it is treated as the fractional scale: 100%.
        assert_eq!(normalize_display(1.0), 100.0);
    }

    #[test]
    fn status_transition_at_threshold() {
        assert_eq!(
            status_for_confidence(70.0, 70.0),
            ArtifactStatus::Verified
        );
        assert_eq!(
            status_for_confidence(69.9, 70.0),
            ArtifactStatus::NeedsReview
        );
    }

    #[test]
    fn findings_penalty_clamped() {
        let adjusted = adjust_for_findings(10.0, &[Significance::High, Significance::High]);
        assert_eq!(adjusted, 0.0);
    }

    #[test]
    fn levels_match_spec_bounds() {
        assert_eq!(level(90.0), ConfidenceLevel::High);
        assert_eq!(level(89.9), ConfidenceLevel::Good);
        assert_eq!(level(70.0), ConfidenceLevel::Good);
        assert_eq!(level(50.0), ConfidenceLevel::Moderate);
        assert_eq!(level(49.9), ConfidenceLevel::Low);
    }
}
