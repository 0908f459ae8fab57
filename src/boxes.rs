#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use crate::model::Coordinate;

/// Produces one coordinate per response.
///
/// Explicit indexes pass through untouched, even when their length differs
/// from `n_responses`; the encoder rejects that mismatch. Without indexes,
/// response `i` lands at `(i, 0)`.
pub fn box_coordinates(n_responses: usize, box_indexes: Option<&[Coordinate]>) -> Vec<Coordinate> {
    match box_indexes {
        Some(indexes) => indexes.to_vec(),
        None => (0..n_responses as u32)
            .map(|x| Coordinate::new(x, 0))
            .collect(),
    }
}
