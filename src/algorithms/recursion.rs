//! Recursive vs iterative algorithms under test

use super::{mismatch, AlgorithmCategory, AlgorithmOutput, DatasetInput};
use crate::{Error, Result};

/// Naive recursive Fibonacci, O(2^n).
#[must_use]
pub fn fibonacci_recursive(n: u32) -> u64 {
    if n <= 1 {
        return u64::from(n);
    }
    fibonacci_recursive(n - 1) + fibonacci_recursive(n - 2)
}

/// Iterative Fibonacci, O(n).
#[must_use]
pub fn fibonacci_iterative(n: u32) -> u64 {
    if n <= 1 {
        return u64::from(n);
    }
    let (mut a, mut b) = (0u64, 1u64);
    for _ in 2..=n {
        let next = a + b;
        a = b;
        b = next;
    }
    b
}

/// Recursive factorial; `None` once the result overflows `u128` (n > 34).
#[must_use]
pub fn factorial_recursive(n: u32) -> Option<u128> {
    if n == 0 {
        return Some(1);
    }
    factorial_recursive(n - 1)?.checked_mul(u128::from(n))
}

/// Iterative factorial; `None` once the result overflows `u128` (n > 34).
#[must_use]
pub fn factorial_iterative(n: u32) -> Option<u128> {
    (1..=n).try_fold(1u128, |acc, i| acc.checked_mul(u128::from(i)))
}

fn depth(name: &str, input: &DatasetInput) -> Result<u32> {
    match input {
        DatasetInput::Recursion(n) => Ok(*n),
        other => Err(mismatch(name, AlgorithmCategory::Recursion, other)),
    }
}

pub(super) fn run_fibonacci_recursive(input: &mut DatasetInput) -> Result<AlgorithmOutput> {
    Ok(AlgorithmOutput::Number(fibonacci_recursive(depth(
        "fibonacci_recursive",
        input,
    )?)))
}

pub(super) fn run_fibonacci_iterative(input: &mut DatasetInput) -> Result<AlgorithmOutput> {
    Ok(AlgorithmOutput::Number(fibonacci_iterative(depth(
        "fibonacci_iterative",
        input,
    )?)))
}

fn factorial_output(name: &str, n: u32, value: Option<u128>) -> Result<AlgorithmOutput> {
    value
        .map(AlgorithmOutput::Wide)
        .ok_or_else(|| Error::InvalidInput(format!("{name}({n}) overflows u128")))
}

pub(super) fn run_factorial_recursive(input: &mut DatasetInput) -> Result<AlgorithmOutput> {
    let n = depth("factorial_recursive", input)?;
    factorial_output("factorial_recursive", n, factorial_recursive(n))
}

pub(super) fn run_factorial_iterative(input: &mut DatasetInput) -> Result<AlgorithmOutput> {
    let n = depth("factorial_iterative", input)?;
    factorial_output("factorial_iterative", n, factorial_iterative(n))
}
