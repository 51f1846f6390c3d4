//! Probability-mass cutoff over sorted candidate lists.

use crate::adapter::Candidate;

/// Length of the shortest prefix of `candidates` whose cumulative
/// probability mass reaches `cover_prob`.
///
/// `candidates` must already be sorted by descending logprob. Returns the
/// full length when the threshold is never reached, and zero when
/// `cover_prob` is zero or negative. The caller applies the independent
/// max-width cap separately; both bounds must be respected.
pub fn cover_prefix_len(candidates: &[Candidate], cover_prob: f64) -> usize {
    if cover_prob <= 0.0 {
        return 0;
    }

    let mut mass = 0.0;
    for (index, candidate) in candidates.iter().enumerate() {
        mass += candidate.logprob.exp();
        if mass >= cover_prob {
            return index + 1;
        }
    }
    candidates.len()
}
