use anyhow::Result;

use rankdb_core::types::top_positions;
use rankdb_core::{Error, ScoredPosition};

/// `alpha · lexical[i] + (1 − alpha) · dense[i]` for every position.
pub fn combine_scores(lexical: &[f32], dense: &[f32], alpha: f32) -> Result<Vec<f32>> {
    if lexical.len() != dense.len() {
        return Err(Error::MisalignedScores { lexical: lexical.len(), dense: dense.len() }.into());
    }
    if !(0.0..=1.0).contains(&alpha) {
        return Err(Error::InvalidMixtureWeight(alpha).into());
    }
    Ok(lexical.iter().zip(dense).map(|(l, d)| alpha * l + (1.0 - alpha) * d).collect())
}

/// Best `top_n` positions of the combined signal, ties to the lower position.
/// Returns the whole corpus ranked when `top_n` exceeds it.
pub fn score_mixture(
    lexical: &[f32],
    dense: &[f32],
    alpha: f32,
    top_n: usize,
) -> Result<Vec<ScoredPosition>> {
    let combined = combine_scores(lexical, dense, alpha)?;
    Ok(top_positions(&combined, top_n))
}
