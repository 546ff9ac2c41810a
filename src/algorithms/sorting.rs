//! Sorting algorithms under test

use super::{mismatch, AlgorithmCategory, AlgorithmOutput, DatasetInput};
use crate::Result;

/// In-place bubble sort with early exit on a pass without swaps.
pub fn bubble_sort(data: &mut [i64]) {
    let n = data.len();
    for pass in 0..n {
        let mut swapped = false;
        for j in 0..n - pass - 1 {
            if data[j] > data[j + 1] {
                data.swap(j, j + 1);
                swapped = true;
            }
        }
        if !swapped {
            break;
        }
    }
}

/// Top-down merge sort; allocates a new vector per merge level.
#[must_use]
pub fn merge_sort(data: &[i64]) -> Vec<i64> {
    if data.len() <= 1 {
        return data.to_vec();
    }
    let mid = data.len() / 2;
    let left = merge_sort(&data[..mid]);
    let right = merge_sort(&data[mid..]);

    let mut merged = Vec::with_capacity(data.len());
    let (mut i, mut j) = (0, 0);
    while i < left.len() && j < right.len() {
        if left[i] <= right[j] {
            merged.push(left[i]);
            i += 1;
        } else {
            merged.push(right[j]);
            j += 1;
        }
    }
    merged.extend_from_slice(&left[i..]);
    merged.extend_from_slice(&right[j..]);
    merged
}

/// Quick sort with a middle pivot and three-way partitioning into new vectors.
#[must_use]
pub fn quick_sort(data: &[i64]) -> Vec<i64> {
    if data.len() <= 1 {
        return data.to_vec();
    }
    let pivot = data[data.len() / 2];
    let mut less = Vec::new();
    let mut equal = Vec::new();
    let mut greater = Vec::new();
    for &value in data {
        match value.cmp(&pivot) {
            std::cmp::Ordering::Less => less.push(value),
            std::cmp::Ordering::Equal => equal.push(value),
            std::cmp::Ordering::Greater => greater.push(value),
        }
    }
    let mut sorted = quick_sort(&less);
    sorted.extend(equal);
    sorted.extend(quick_sort(&greater));
    sorted
}

fn sequence<'a>(name: &str, input: &'a mut DatasetInput) -> Result<&'a mut Vec<i64>> {
    match input {
        DatasetInput::Sorting(data) => Ok(data),
        other => Err(mismatch(name, AlgorithmCategory::Sorting, other)),
    }
}

pub(super) fn run_bubble_sort(input: &mut DatasetInput) -> Result<AlgorithmOutput> {
    let mut data = std::mem::take(sequence("bubble_sort", input)?);
    bubble_sort(&mut data);
    Ok(AlgorithmOutput::Sorted(data))
}

pub(super) fn run_merge_sort(input: &mut DatasetInput) -> Result<AlgorithmOutput> {
    Ok(AlgorithmOutput::Sorted(merge_sort(sequence("merge_sort", input)?)))
}

pub(super) fn run_quick_sort(input: &mut DatasetInput) -> Result<AlgorithmOutput> {
    Ok(AlgorithmOutput::Sorted(quick_sort(sequence("quick_sort", input)?)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<i64> {
        vec![5, -1, 3, 3, 9, 0, 2, 8, 1]
    }

    fn expected() -> Vec<i64> {
        let mut v = sample();
        v.sort_unstable();
        v
    }

    #[test]
    fn test_bubble_sort() {
        let mut data = sample();
        bubble_sort(&mut data);
        assert_eq!(data, expected());
    }

    #[test]
    fn test_merge_sort() {
        assert_eq!(merge_sort(&sample()), expected());
    }

    #[test]
    fn test_quick_sort() {
        assert_eq!(quick_sort(&sample()), expected());
    }

    #[test]
    fn test_empty_and_single() {
        let mut empty: Vec<i64> = vec![];
        bubble_sort(&mut empty);
        assert!(empty.is_empty());
        assert!(merge_sort(&[]).is_empty());
        assert_eq!(quick_sort(&[4]), vec![4]);
    }

    #[test]
    fn test_merge_sort_leaves_input_untouched() {
        let mut input = DatasetInput::Sorting(sample());
        let output = run_merge_sort(&mut input).unwrap();
        assert_eq!(output, AlgorithmOutput::Sorted(expected()));
        assert_eq!(input, DatasetInput::Sorting(sample()));
    }
}
