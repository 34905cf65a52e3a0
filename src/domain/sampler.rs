//! Uniform sampling of distinct candidate indices.
//!
//! A sample picks `min(desired, candidates)` distinct indices from
//! `0..candidates` and resolves each one, in acceptance order, into a bundle.
//! Resolution is fail-fast: the first error aborts the sample and the indices
//! after it are never resolved.
//!
//! The generator is always supplied by the caller through [`IndexSource`], so
//! tests can script the exact draw sequence.

use std::collections::HashSet;
use std::future::Future;
use std::str::FromStr;

use rand::Rng;
use thiserror::Error;

/// Source of uniformly distributed indices.
pub trait IndexSource {
    /// Draw an index uniformly from `0..bound`. Callers never pass `bound == 0`.
    fn next_index(&mut self, bound: usize) -> usize;
}

impl<R: Rng + ?Sized> IndexSource for R {
    fn next_index(&mut self, bound: usize) -> usize {
        self.random_range(0..bound)
    }
}

/// How distinct indices are drawn.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SelectionStrategy {
    /// Draw from the full range and redraw on collision. Unbounded in the worst
    /// case; cheap while the selection is small relative to the candidates.
    #[default]
    Rejection,
    /// Partial Fisher–Yates over the candidate range. Exactly one draw per pick.
    PartialShuffle,
}

impl SelectionStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            SelectionStrategy::Rejection => "rejection",
            SelectionStrategy::PartialShuffle => "partial_shuffle",
        }
    }
}

impl FromStr for SelectionStrategy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "rejection" => Ok(SelectionStrategy::Rejection),
            "partial_shuffle" => Ok(SelectionStrategy::PartialShuffle),
            other => Err(format!(
                "unknown selection strategy `{other}` (expected rejection or partial_shuffle)"
            )),
        }
    }
}

/// The injected resolver failed for a selected index.
#[derive(Debug, Error)]
#[error("failed to resolve sampled candidate #{index}")]
pub struct ResolutionError<E> {
    pub index: usize,
    #[source]
    pub source: E,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Sampler {
    strategy: SelectionStrategy,
}

impl Sampler {
    pub fn new(strategy: SelectionStrategy) -> Self {
        Self { strategy }
    }

    pub fn strategy(&self) -> SelectionStrategy {
        self.strategy
    }

    /// Pick `min(desired, candidates)` distinct indices, in acceptance order.
    pub fn select<S>(&self, source: &mut S, candidates: usize, desired: usize) -> Vec<usize>
    where
        S: IndexSource + ?Sized,
    {
        let effective = desired.min(candidates);
        if effective == 0 {
            return Vec::new();
        }

        match self.strategy {
            SelectionStrategy::Rejection => select_by_rejection(source, candidates, effective),
            SelectionStrategy::PartialShuffle => {
                select_by_partial_shuffle(source, candidates, effective)
            }
        }
    }

    /// Select indices and resolve each of them synchronously.
    pub fn sample<S, T, E, F>(
        &self,
        source: &mut S,
        candidates: usize,
        desired: usize,
        mut resolve: F,
    ) -> Result<Vec<T>, ResolutionError<E>>
    where
        S: IndexSource + ?Sized,
        F: FnMut(usize) -> Result<T, E>,
    {
        let indices = self.select(source, candidates, desired);
        let mut bundles = Vec::with_capacity(indices.len());
        for index in indices {
            let bundle = resolve(index).map_err(|source| ResolutionError { index, source })?;
            bundles.push(bundle);
        }
        Ok(bundles)
    }
}

/// Resolve already selected indices one after another, stopping at the first failure.
///
/// Selection happens before the first `.await` so that a non-`Send` generator
/// never lives across a suspension point.
pub async fn resolve_in_order<T, E, F, Fut>(
    indices: Vec<usize>,
    mut resolve: F,
) -> Result<Vec<T>, ResolutionError<E>>
where
    F: FnMut(usize) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut bundles = Vec::with_capacity(indices.len());
    for index in indices {
        let bundle = resolve(index)
            .await
            .map_err(|source| ResolutionError { index, source })?;
        bundles.push(bundle);
    }
    Ok(bundles)
}

fn select_by_rejection<S>(source: &mut S, candidates: usize, effective: usize) -> Vec<usize>
where
    S: IndexSource + ?Sized,
{
    let mut seen = HashSet::with_capacity(effective);
    let mut accepted = Vec::with_capacity(effective);
    while accepted.len() < effective {
        let index = source.next_index(candidates);
        if seen.insert(index) {
            accepted.push(index);
        }
    }
    accepted
}

fn select_by_partial_shuffle<S>(source: &mut S, candidates: usize, effective: usize) -> Vec<usize>
where
    S: IndexSource + ?Sized,
{
    let mut pool: Vec<usize> = (0..candidates).collect();
    for position in 0..effective {
        let offset = source.next_index(candidates - position);
        pool.swap(position, position + offset);
    }
    pool.truncate(effective);
    pool
}
