//! Dataset generator
//!
//! Produces the input for one (category, size) benchmark cell. Generation is
//! a pure function of `(category, size, seed)`: a fresh RNG is seeded for
//! every call, so results do not depend on anything else the process did.
//!
//! | Category  | Input                                                      |
//! |-----------|------------------------------------------------------------|
//! | sorting   | `size` integers uniform in `[0, size * 10)`                |
//! | searching | the same sequence plus a target drawn from it              |
//! | recursion | a recursion depth chosen by size tier (20 / 25 / 30)       |
//!
//! The recursion tiers keep exponential algorithms tractable at every size.

use crate::algorithms::{AlgorithmCategory, DatasetInput};
use crate::{Error, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Upper bound of generated values, as a multiple of the dataset size.
pub const VALUE_RANGE_FACTOR: usize = 10;

/// Recursion depth tiers: `(max_size, depth)`; larger sizes use
/// [`RECURSION_DEPTH_MAX`].
pub const RECURSION_DEPTH_TIERS: [(usize, u32); 2] = [(1000, 20), (5000, 25)];

/// Recursion depth for sizes above every tier.
pub const RECURSION_DEPTH_MAX: u32 = 30;

/// Generate the input for `category` at `size`.
///
/// # Errors
/// Returns `InvalidInput` for a searching dataset of size 0 (no target can be
/// drawn from an empty sequence).
///
/// # Example
///
/// ```rust
/// use carbon_optimizer::algorithms::{AlgorithmCategory, DatasetInput};
/// use carbon_optimizer::dataset::generate;
///
/// let input = generate(AlgorithmCategory::Searching, 100, 42)?;
/// if let DatasetInput::Searching { data, target } = input {
///     assert!(data.contains(&target));
/// }
/// # Ok::<(), carbon_optimizer::Error>(())
/// ```
pub fn generate(category: AlgorithmCategory, size: usize, seed: u64) -> Result<DatasetInput> {
    match category {
        AlgorithmCategory::Sorting => {
            let mut rng = StdRng::seed_from_u64(seed);
            Ok(DatasetInput::Sorting(random_sequence(&mut rng, size)))
        }
        AlgorithmCategory::Searching => {
            if size == 0 {
                return Err(Error::InvalidInput(
                    "searching dataset requires size > 0".to_string(),
                ));
            }
            let mut rng = StdRng::seed_from_u64(seed);
            let data = random_sequence(&mut rng, size);
            let target = data[rng.gen_range(0..size)];
            Ok(DatasetInput::Searching { data, target })
        }
        AlgorithmCategory::Recursion => Ok(DatasetInput::Recursion(recursion_depth(size))),
    }
}

/// Generate from a category tag as found in configuration files.
///
/// # Errors
/// Returns `InvalidCategory` for an unknown tag, otherwise as [`generate`].
pub fn generate_by_tag(tag: &str, size: usize, seed: u64) -> Result<DatasetInput> {
    generate(tag.parse()?, size, seed)
}

/// Recursion depth used for a given dataset size.
#[must_use]
pub fn recursion_depth(size: usize) -> u32 {
    RECURSION_DEPTH_TIERS
        .iter()
        .find(|(max_size, _)| size <= *max_size)
        .map_or(RECURSION_DEPTH_MAX, |(_, depth)| *depth)
}

#[allow(clippy::cast_possible_wrap)]
fn random_sequence(rng: &mut StdRng, size: usize) -> Vec<i64> {
    let upper = size.saturating_mul(VALUE_RANGE_FACTOR) as i64;
    (0..size).map(|_| rng.gen_range(0..upper)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sorting_is_deterministic() {
        let a = generate(AlgorithmCategory::Sorting, 500, 42).unwrap();
        let b = generate(AlgorithmCategory::Sorting, 500, 42).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_different_seeds_differ() {
        let a = generate(AlgorithmCategory::Sorting, 500, 1).unwrap();
        let b = generate(AlgorithmCategory::Sorting, 500, 2).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_sorting_values_in_range() {
        let DatasetInput::Sorting(data) = generate(AlgorithmCategory::Sorting, 1000, 7).unwrap()
        else {
            panic!("expected sorting input");
        };
        assert_eq!(data.len(), 1000);
        assert!(data.iter().all(|&v| (0..10_000).contains(&v)));
    }

    #[test]
    fn test_searching_target_present() {
        for seed in 0..20 {
            let DatasetInput::Searching { data, target } =
                generate(AlgorithmCategory::Searching, 50, seed).unwrap()
            else {
                panic!("expected searching input");
            };
            assert!(data.contains(&target));
        }
    }

    #[test]
    fn test_searching_shares_sorting_sequence() {
        let DatasetInput::Sorting(sorted) = generate(AlgorithmCategory::Sorting, 64, 9).unwrap()
        else {
            panic!("expected sorting input");
        };
        let DatasetInput::Searching { data, .. } =
            generate(AlgorithmCategory::Searching, 64, 9).unwrap()
        else {
            panic!("expected searching input");
        };
        assert_eq!(sorted, data);
    }

    #[test]
    fn test_empty_searching_rejected() {
        assert!(matches!(
            generate(AlgorithmCategory::Searching, 0, 42),
            Err(Error::InvalidInput(_))
        ));
        assert_eq!(
            generate(AlgorithmCategory::Sorting, 0, 42).unwrap(),
            DatasetInput::Sorting(vec![])
        );
    }

    #[test]
    fn test_recursion_tiers() {
        assert_eq!(recursion_depth(1), 20);
        assert_eq!(recursion_depth(1000), 20);
        assert_eq!(recursion_depth(1001), 25);
        assert_eq!(recursion_depth(5000), 25);
        assert_eq!(recursion_depth(5001), 30);
        assert_eq!(recursion_depth(1_000_000), 30);
    }

    #[test]
    fn test_unknown_tag() {
        assert!(matches!(
            generate_by_tag("graphs", 10, 42),
            Err(Error::InvalidCategory(_))
        ));
    }
}
