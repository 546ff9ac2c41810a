//! Algorithm registry
//!
//! Maps algorithm identifiers to plain function values. The built-in registry
//! is assembled once per process and is read-only afterwards.
//!
//! ## Built-in algorithms
//!
//! | Category  | Algorithms                                      |
//! |-----------|-------------------------------------------------|
//! | sorting   | `bubble_sort`, `merge_sort`, `quick_sort`       |
//! | searching | `linear_search`, `binary_search`                |
//! | recursion | `fibonacci_recursive`, `fibonacci_iterative`    |
//! |           | `factorial_recursive`, `factorial_iterative`    |
//!
//! The factorial pair is registered but left out of the default experiment
//! plan; list it in a `CategoryPlan` to benchmark it.
//!
//! ## Example
//!
//! ```rust
//! use carbon_optimizer::algorithms::{AlgorithmOutput, AlgorithmRegistry, DatasetInput};
//!
//! let registry = AlgorithmRegistry::builtin();
//! let merge_sort = registry.get("merge_sort").unwrap();
//!
//! let mut input = DatasetInput::Sorting(vec![3, 1, 2]);
//! let output = merge_sort.invoke(&mut input)?;
//! assert_eq!(output, AlgorithmOutput::Sorted(vec![1, 2, 3]));
//! # Ok::<(), carbon_optimizer::Error>(())
//! ```

mod recursion;
mod searching;
mod sorting;

pub use recursion::{
    factorial_iterative, factorial_recursive, fibonacci_iterative, fibonacci_recursive,
};
pub use searching::{binary_search, linear_search};
pub use sorting::{bubble_sort, merge_sort, quick_sort};

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

/// Algorithm family; decides how inputs are generated and passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlgorithmCategory {
    /// Integer sequence in, sorted sequence out
    Sorting,
    /// Integer sequence plus target in, index out
    Searching,
    /// Recursion depth in, number out
    Recursion,
}

impl AlgorithmCategory {
    /// All categories in canonical order.
    pub const ALL: [Self; 3] = [Self::Sorting, Self::Searching, Self::Recursion];

    /// Lowercase tag used in configuration and persisted results.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sorting => "sorting",
            Self::Searching => "searching",
            Self::Recursion => "recursion",
        }
    }
}

impl fmt::Display for AlgorithmCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AlgorithmCategory {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "sorting" => Ok(Self::Sorting),
            "searching" => Ok(Self::Searching),
            "recursion" => Ok(Self::Recursion),
            other => Err(Error::InvalidCategory(other.to_string())),
        }
    }
}

/// Built-in algorithm identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Algorithm {
    /// O(n²) exchange sort
    BubbleSort,
    /// Top-down merge sort
    MergeSort,
    /// Three-way partition quick sort
    QuickSort,
    /// Sequential scan
    LinearSearch,
    /// Bisection (assumes sorted input)
    BinarySearch,
    /// Naive O(2^n) Fibonacci
    FibonacciRecursive,
    /// O(n) Fibonacci
    FibonacciIterative,
    /// Factorial with O(n) stack depth
    FactorialRecursive,
    /// Factorial in a loop
    FactorialIterative,
}

impl Algorithm {
    /// All built-in algorithms in registration order.
    pub const ALL: [Self; 9] = [
        Self::BubbleSort,
        Self::MergeSort,
        Self::QuickSort,
        Self::LinearSearch,
        Self::BinarySearch,
        Self::FibonacciRecursive,
        Self::FibonacciIterative,
        Self::FactorialRecursive,
        Self::FactorialIterative,
    ];

    /// Snake-case identifier.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::BubbleSort => "bubble_sort",
            Self::MergeSort => "merge_sort",
            Self::QuickSort => "quick_sort",
            Self::LinearSearch => "linear_search",
            Self::BinarySearch => "binary_search",
            Self::FibonacciRecursive => "fibonacci_recursive",
            Self::FibonacciIterative => "fibonacci_iterative",
            Self::FactorialRecursive => "factorial_recursive",
            Self::FactorialIterative => "factorial_iterative",
        }
    }

    /// Category the algorithm belongs to.
    #[must_use]
    pub const fn category(self) -> AlgorithmCategory {
        match self {
            Self::BubbleSort | Self::MergeSort | Self::QuickSort => AlgorithmCategory::Sorting,
            Self::LinearSearch | Self::BinarySearch => AlgorithmCategory::Searching,
            Self::FibonacciRecursive
            | Self::FibonacciIterative
            | Self::FactorialRecursive
            | Self::FactorialIterative => AlgorithmCategory::Recursion,
        }
    }

    const fn entry_point(self) -> AlgorithmFn {
        match self {
            Self::BubbleSort => sorting::run_bubble_sort,
            Self::MergeSort => sorting::run_merge_sort,
            Self::QuickSort => sorting::run_quick_sort,
            Self::LinearSearch => searching::run_linear_search,
            Self::BinarySearch => searching::run_binary_search,
            Self::FibonacciRecursive => recursion::run_fibonacci_recursive,
            Self::FibonacciIterative => recursion::run_fibonacci_iterative,
            Self::FactorialRecursive => recursion::run_factorial_recursive,
            Self::FactorialIterative => recursion::run_factorial_iterative,
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Algorithm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|algorithm| algorithm.name() == s)
            .ok_or_else(|| Error::UnknownAlgorithm(s.to_string()))
    }
}

/// Input handed to an algorithm under test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatasetInput {
    /// Sequence to sort
    Sorting(Vec<i64>),
    /// Sequence to scan and the value to find (always present in `data`)
    Searching {
        /// Sequence to scan
        data: Vec<i64>,
        /// Value to look for
        target: i64,
    },
    /// Recursion depth
    Recursion(u32),
}

impl DatasetInput {
    /// Category this input was generated for.
    #[must_use]
    pub const fn category(&self) -> AlgorithmCategory {
        match self {
            Self::Sorting(_) => AlgorithmCategory::Sorting,
            Self::Searching { .. } => AlgorithmCategory::Searching,
            Self::Recursion(_) => AlgorithmCategory::Recursion,
        }
    }
}

/// Value returned by an algorithm under test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlgorithmOutput {
    /// Sorted sequence
    Sorted(Vec<i64>),
    /// Index of the target, if found
    Found(Option<usize>),
    /// Computed number
    Number(u64),
    /// Computed number wider than `u64` (factorials)
    Wide(u128),
}

/// Function value invoked by the profiler.
///
/// The input is a private copy; implementations may consume or mutate it.
pub type AlgorithmFn = fn(&mut DatasetInput) -> Result<AlgorithmOutput>;

/// Named, category-tagged algorithm entry.
#[derive(Debug, Clone)]
pub struct AlgorithmHandle {
    name: String,
    category: AlgorithmCategory,
    func: AlgorithmFn,
}

impl AlgorithmHandle {
    /// Create a handle for a custom algorithm.
    #[must_use]
    pub fn new(name: impl Into<String>, category: AlgorithmCategory, func: AlgorithmFn) -> Self {
        Self {
            name: name.into(),
            category,
            func,
        }
    }

    /// Algorithm name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Algorithm category.
    #[must_use]
    pub const fn category(&self) -> AlgorithmCategory {
        self.category
    }

    /// Run the algorithm once.
    ///
    /// # Errors
    /// Returns `CategoryMismatch` if `input` was built for another category,
    /// otherwise whatever the algorithm itself returns.
    pub fn invoke(&self, input: &mut DatasetInput) -> Result<AlgorithmOutput> {
        if input.category() != self.category {
            return Err(mismatch(&self.name, self.category, input));
        }
        (self.func)(input)
    }
}

impl From<Algorithm> for AlgorithmHandle {
    fn from(algorithm: Algorithm) -> Self {
        Self::new(algorithm.name(), algorithm.category(), algorithm.entry_point())
    }
}

pub(crate) fn mismatch(name: &str, expected: AlgorithmCategory, input: &DatasetInput) -> Error {
    Error::CategoryMismatch {
        algorithm: name.to_string(),
        expected: expected.to_string(),
        found: input.category().to_string(),
    }
}

/// Immutable collection of algorithm handles, in registration order.
#[derive(Debug, Clone)]
pub struct AlgorithmRegistry {
    handles: Vec<AlgorithmHandle>,
}

impl AlgorithmRegistry {
    /// Create a builder for a custom registry.
    #[must_use]
    pub fn builder() -> AlgorithmRegistryBuilder {
        AlgorithmRegistryBuilder::default()
    }

    /// Process-wide registry of the built-in algorithms.
    #[must_use]
    pub fn builtin() -> &'static Self {
        static BUILTIN: OnceLock<AlgorithmRegistry> = OnceLock::new();
        BUILTIN.get_or_init(|| Self {
            handles: Algorithm::ALL.into_iter().map(AlgorithmHandle::from).collect(),
        })
    }

    /// Look up a handle by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&AlgorithmHandle> {
        self.handles.iter().find(|handle| handle.name() == name)
    }

    /// Handles of one category, in registration order.
    pub fn for_category(
        &self,
        category: AlgorithmCategory,
    ) -> impl Iterator<Item = &AlgorithmHandle> + '_ {
        self.handles
            .iter()
            .filter(move |handle| handle.category() == category)
    }

    /// All handles.
    #[must_use]
    pub fn handles(&self) -> &[AlgorithmHandle] {
        &self.handles
    }

    /// Number of registered algorithms.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    /// Check if no algorithm is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}

/// Builder for `AlgorithmRegistry`.
#[derive(Debug, Default)]
pub struct AlgorithmRegistryBuilder {
    handles: Vec<AlgorithmHandle>,
}

impl AlgorithmRegistryBuilder {
    /// Add every built-in algorithm.
    #[must_use]
    pub fn with_builtins(mut self) -> Self {
        self.handles
            .extend(Algorithm::ALL.into_iter().map(AlgorithmHandle::from));
        self
    }

    /// Add one handle.
    #[must_use]
    pub fn register(mut self, handle: impl Into<AlgorithmHandle>) -> Self {
        self.handles.push(handle.into());
        self
    }

    /// Build the registry.
    ///
    /// # Errors
    /// Returns `InvalidConfig` if two handles share a name.
    pub fn build(self) -> Result<AlgorithmRegistry> {
        for (i, handle) in self.handles.iter().enumerate() {
            if self.handles[..i].iter().any(|h| h.name() == handle.name()) {
                return Err(Error::InvalidConfig(format!(
                    "algorithm '{}' registered twice",
                    handle.name()
                )));
            }
        }
        Ok(AlgorithmRegistry {
            handles: self.handles,
        })
    }
}
