//! Searching algorithms under test

use super::{mismatch, AlgorithmCategory, AlgorithmOutput, DatasetInput};
use crate::Result;

/// Index of the first element equal to `target`.
#[must_use]
pub fn linear_search(data: &[i64], target: i64) -> Option<usize> {
    data.iter().position(|&value| value == target)
}

/// Bisection search. Assumes `data` is sorted ascending; on unsorted input the
/// answer may be `None` even though `target` is present.
#[must_use]
pub fn binary_search(data: &[i64], target: i64) -> Option<usize> {
    let (mut left, mut right) = (0usize, data.len());
    while left < right {
        let mid = left + (right - left) / 2;
        match data[mid].cmp(&target) {
            std::cmp::Ordering::Equal => return Some(mid),
            std::cmp::Ordering::Less => left = mid + 1,
            std::cmp::Ordering::Greater => right = mid,
        }
    }
    None
}

fn haystack<'a>(name: &str, input: &'a DatasetInput) -> Result<(&'a [i64], i64)> {
    match input {
        DatasetInput::Searching { data, target } => Ok((data.as_slice(), *target)),
        other => Err(mismatch(name, AlgorithmCategory::Searching, other)),
    }
}

pub(super) fn run_linear_search(input: &mut DatasetInput) -> Result<AlgorithmOutput> {
    let (data, target) = haystack("linear_search", input)?;
    Ok(AlgorithmOutput::Found(linear_search(data, target)))
}

pub(super) fn run_binary_search(input: &mut DatasetInput) -> Result<AlgorithmOutput> {
    let (data, target) = haystack("binary_search", input)?;
    Ok(AlgorithmOutput::Found(binary_search(data, target)))
}
