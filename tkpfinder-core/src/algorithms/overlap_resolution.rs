use std::collections::HashSet;

use tracing::debug;

use crate::constants::MAX_RESOLVER_ITERATIONS;
use crate::types::{Annotation, Chain, Interval, TkpError};

/// Anything occupying a half-open residue interval.
pub trait Span {
    fn span(&self) -> Interval;
}

impl Span for Interval {
    fn span(&self) -> Interval {
        *self
    }
}

impl Span for Annotation {
    fn span(&self) -> Interval {
        self.interval
    }
}

impl<T: Span + ?Sized> Span for &T {
    fn span(&self) -> Interval {
        (**self).span()
    }
}

/// Weighted interval scheduling over the candidates of one resolution group.
///
/// Candidates are ordered by end (then start, then input position) and the
/// best total value including or excluding each candidate is computed by
/// dynamic programming:
///
/// ```text
/// best[j] = max(
///     best[j-1],                    // skip candidate j
///     value(j) + best[p(j)]         // take j after its last compatible predecessor
/// )
/// ```
///
/// Every DP cell and every traceback step counts as one iteration. Exceeding
/// the bound is an error; a partial selection is never returned.
#[derive(Debug, Clone, Copy)]
pub struct OverlapResolver {
    max_iterations: usize,
}

impl Default for OverlapResolver {
    fn default() -> Self {
        Self::new(MAX_RESOLVER_ITERATIONS)
    }
}

impl OverlapResolver {
    #[must_use]
    pub const fn new(max_iterations: usize) -> Self {
        Self { max_iterations }
    }

    #[must_use]
    pub const fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    /// Selects the maximum-value subset of pairwise non-overlapping candidates.
    ///
    /// Returns positions into `candidates`, ordered by interval start. On equal
    /// totals the selection built from earlier-ending candidates wins.
    ///
    /// # Errors
    ///
    /// Returns [`TkpError::ConvergenceError`] when the iteration bound is hit.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use tkpfinder_core::algorithms::OverlapResolver;
    /// use tkpfinder_core::types::Interval;
    ///
    /// let spans = [
    ///     (Interval::new(0, 10).unwrap(), 5.0),
    ///     (Interval::new(5, 15).unwrap(), 8.0),
    ///     (Interval::new(12, 20).unwrap(), 6.0),
    /// ];
    /// let intervals: Vec<Interval> = spans.iter().map(|(i, _)| *i).collect();
    /// let selected = OverlapResolver::default()
    ///     .resolve(&intervals, |i| spans.iter().find(|(s, _)| s == i).unwrap().1)?;
    /// assert_eq!(selected, vec![0, 2]);
    /// # Ok::<(), tkpfinder_core::types::TkpError>(())
    /// ```
    pub fn resolve<T, F>(&self, candidates: &[T], value_fn: F) -> Result<Vec<usize>, TkpError>
    where
        T: Span,
        F: Fn(&T) -> f64,
    {
        let n = candidates.len();
        if n == 0 {
            return Ok(Vec::new());
        }

        let spans: Vec<Interval> = candidates.iter().map(|c| c.span()).collect();
        let mut order: Vec<usize> = (0..n).collect();
        order.sort_by_key(|&i| (spans[i].end, spans[i].start, i));
        let ends: Vec<usize> = order.iter().map(|&i| spans[i].end).collect();

        let mut iterations = 0usize;
        let mut tick = || {
            iterations += 1;
            if iterations > self.max_iterations {
                Err(TkpError::ConvergenceError {
                    candidates: n,
                    limit: self.max_iterations,
                })
            } else {
                Ok(())
            }
        };

        // best[j] is the optimum over the first j candidates in end order
        let mut best = vec![0.0f64; n + 1];
        let mut taken = vec![false; n];
        let mut predecessor = vec![0usize; n];

        for (j, &candidate) in order.iter().enumerate() {
            tick()?;
            let start = spans[candidate].start;
            let p = ends[..j].partition_point(|&end| end <= start);
            predecessor[j] = p;

            let include = value_fn(&candidates[candidate]) + best[p];
            let exclude = best[j];
            if include > exclude {
                best[j + 1] = include;
                taken[j] = true;
            } else {
                best[j + 1] = exclude;
            }
        }

        let mut selected = Vec::new();
        let mut j = n;
        while j > 0 {
            tick()?;
            if taken[j - 1] {
                selected.push(order[j - 1]);
                j = predecessor[j - 1];
            } else {
                j -= 1;
            }
        }
        selected.sort_by_key(|&i| (spans[i].start, i));

        Ok(selected)
    }
}

/// Removes overlapping annotations of one resolution group from a chain.
///
/// Annotations rejected by `filter` are left untouched and do not compete.
/// Among the rest, the maximum-`value_fn` non-overlapping subset is kept.
///
/// Returns the number of removed annotations.
pub fn resolve_chain_overlaps<P, V>(
    chain: &mut Chain,
    resolver: &OverlapResolver,
    filter: P,
    value_fn: V,
) -> Result<usize, TkpError>
where
    P: Fn(&Annotation) -> bool,
    V: Fn(&Annotation) -> f64,
{
    let candidates: Vec<&Annotation> = chain.annotations().iter().filter(|a| filter(a)).collect();
    if candidates.len() < 2 {
        return Ok(0);
    }

    let kept: HashSet<String> = resolver
        .resolve(&candidates, |a| value_fn(a))?
        .into_iter()
        .map(|i| candidates[i].id.clone())
        .collect();
    let removed = candidates.len() - kept.len();

    chain.retain(|a| !filter(a) || kept.contains(&a.id));
    if removed > 0 {
        debug!(chain = %chain.id, removed, "resolved overlapping annotations");
    }

    Ok(removed)
}
