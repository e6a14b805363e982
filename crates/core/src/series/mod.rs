use std::slice;

use serde::{Deserialize, Serialize};

/// A rating sample positioned on a single time axis.
pub trait TimedSample {
    /// Position of the sample in its series' domain (beats or seconds).
    fn time(&self) -> f64;
}

/// Raw difficulty of one swing as reported by the swing analyzer.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SwingSample {
    /// Elapsed beats.
    pub time: f64,
    pub pass: f64,
    pub tech: f64,
}

impl SwingSample {
    pub fn new(time: f64, pass: f64, tech: f64) -> Self {
        Self { time, pass, tech }
    }
}

impl TimedSample for SwingSample {
    fn time(&self) -> f64 {
        self.time
    }
}

/// Predicted accuracy of one note as reported by the accuracy provider.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct NoteAccSample {
    /// Elapsed seconds.
    pub time: f64,
    pub acc: f64,
}

impl NoteAccSample {
    pub fn new(time: f64, acc: f64) -> Self {
        Self { time, acc }
    }
}

impl TimedSample for NoteAccSample {
    fn time(&self) -> f64 {
        self.time
    }
}

/// Samples sorted ascending by time. Immutable once built; a recompute
/// produces a fresh series instead of editing an existing one.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleSeries<T> {
    samples: Vec<T>,
}

impl<T> Default for SampleSeries<T> {
    fn default() -> Self {
        Self {
            samples: Vec::new(),
        }
    }
}

impl<T: TimedSample> SampleSeries<T> {
    /// Builds a series, restoring ascending time order if the provider
    /// handed samples over out of order. Equal times keep their input order.
    ///
    /// Samples without a finite time cannot be bracketed and are dropped.
    pub fn new(mut samples: Vec<T>) -> Self {
        let before = samples.len();
        samples.retain(|sample| sample.time().is_finite());

        if samples.len() != before {
            tracing::warn!(
                dropped = before - samples.len(),
                "dropped samples with non-finite time"
            );
        }

        samples.sort_by(|a, b| a.time().total_cmp(&b.time()));

        Self { samples }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Whether the series holds enough samples to span an interval.
    pub fn has_interval(&self) -> bool {
        self.samples.len() >= 2
    }

    pub fn as_slice(&self) -> &[T] {
        &self.samples
    }

    pub fn iter(&self) -> slice::Iter<'_, T> {
        self.samples.iter()
    }

    /// Time of the first and last sample.
    pub fn span(&self) -> Option<(f64, f64)> {
        let first = self.samples.first()?;
        let last = self.samples.last()?;

        Some((first.time(), last.time()))
    }

    /// Returns the samples bracketing `time` as `(before, after)`.
    ///
    /// Queries at or before the first sample clamp to `(first, first)`,
    /// queries at or after the last sample clamp to `(last, last)`.
    /// Otherwise `after` is the first sample with `after.time() >= time`
    /// and `before` its predecessor. An empty series yields `None`.
    pub fn neighbors(&self, time: f64) -> Option<(&T, &T)> {
        let first = self.samples.first()?;
        let last = self.samples.last()?;

        if time <= first.time() {
            return Some((first, first));
        }

        if time >= last.time() {
            return Some((last, last));
        }

        let idx = self.samples.partition_point(|sample| sample.time() < time);

        // * NaN queries never compare, land here with idx == 0
        match (idx.checked_sub(1), self.samples.get(idx)) {
            (Some(prev), Some(after)) => Some((&self.samples[prev], after)),
            _ => Some((last, last)),
        }
    }
}

impl<T: TimedSample> From<Vec<T>> for SampleSeries<T> {
    fn from(samples: Vec<T>) -> Self {
        Self::new(samples)
    }
}

impl<T: TimedSample> FromIterator<T> for SampleSeries<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a, T> IntoIterator for &'a SampleSeries<T> {
    type Item = &'a T;
    type IntoIter = slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.samples.iter()
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn swings() -> SampleSeries<SwingSample> {
        SampleSeries::new(vec![
            SwingSample::new(0.0, 1.0, 2.0),
            SwingSample::new(2.0, 3.0, 4.0),
            SwingSample::new(4.0, 5.0, 6.0),
        ])
    }

    #[test]
    fn empty_series_has_no_neighbors() {
        let series = SampleSeries::<NoteAccSample>::empty();
        assert!(series.neighbors(1.0).is_none());
        assert!(series.span().is_none());
        assert!(!series.has_interval());
    }

    #[test]
    fn single_sample_clamps_both_ways() {
        let series = SampleSeries::new(vec![NoteAccSample::new(3.0, 0.9)]);

        let (before, after) = series.neighbors(-10.0).unwrap();
        assert_eq!((before.time, after.time), (3.0, 3.0));

        let (before, after) = series.neighbors(10.0).unwrap();
        assert_eq!((before.time, after.time), (3.0, 3.0));
    }

    #[test]
    fn brackets_interior_queries() {
        let series = swings();

        let (before, after) = series.neighbors(1.0).unwrap();
        assert_eq!((before.time, after.time), (0.0, 2.0));

        let (before, after) = series.neighbors(3.5).unwrap();
        assert_eq!((before.time, after.time), (2.0, 4.0));
    }

    #[test]
    fn exact_hit_pairs_with_predecessor() {
        let series = swings();

        let (before, after) = series.neighbors(2.0).unwrap();
        assert_eq!((before.time, after.time), (0.0, 2.0));
    }

    #[test]
    fn nan_query_falls_back_to_last() {
        let series = swings();

        let (before, after) = series.neighbors(f64::NAN).unwrap();
        assert_eq!((before.time, after.time), (4.0, 4.0));
    }

    #[test]
    fn restores_time_order() {
        let series = SampleSeries::new(vec![
            NoteAccSample::new(2.0, 0.8),
            NoteAccSample::new(0.5, 0.9),
            NoteAccSample::new(1.0, 0.7),
        ]);

        let times: Vec<_> = series.iter().map(|s| s.time).collect();
        assert_eq!(times, vec![0.5, 1.0, 2.0]);
        assert_eq!(series.span(), Some((0.5, 2.0)));
    }

    #[test]
    fn drops_non_finite_times() {
        let series = SampleSeries::new(vec![
            SwingSample::new(f64::NAN, 9.0, 9.0),
            SwingSample::new(2.0, 3.0, 4.0),
            SwingSample::new(f64::INFINITY, 9.0, 9.0),
            SwingSample::new(0.0, 1.0, 2.0),
            SwingSample::new(f64::NEG_INFINITY, 9.0, 9.0),
        ]);

        assert_eq!(series.len(), 2);
        assert_eq!(series.span(), Some((0.0, 2.0)));

        let (before, after) = series.neighbors(5.0).unwrap();
        assert_eq!((before.pass, after.pass), (3.0, 3.0));
    }

    proptest! {
        #[test]
        fn clamp_law(
            mut times in prop::collection::vec(-100.0..100.0_f64, 1..64),
            below in 0.0..50.0_f64,
            above in 0.0..50.0_f64,
        ) {
            times.sort_by(f64::total_cmp);
            let series: SampleSeries<_> = times
                .iter()
                .map(|&t| NoteAccSample::new(t, 0.5))
                .collect();

            let (first, last) = series.span().unwrap();

            let (a, b) = series.neighbors(first - below).unwrap();
            prop_assert!(std::ptr::eq(a, &series.as_slice()[0]));
            prop_assert!(std::ptr::eq(b, &series.as_slice()[0]));

            let end = series.len() - 1;
            let (a, b) = series.neighbors(last + above).unwrap();
            prop_assert!(std::ptr::eq(a, &series.as_slice()[end]));
            prop_assert!(std::ptr::eq(b, &series.as_slice()[end]));
        }

        #[test]
        fn interior_queries_are_bracketed(
            mut times in prop::collection::vec(-100.0..100.0_f64, 2..64),
            frac in 0.0..1.0_f64,
        ) {
            times.sort_by(f64::total_cmp);
            let series: SampleSeries<_> = times
                .iter()
                .map(|&t| NoteAccSample::new(t, 0.5))
                .collect();

            let (first, last) = series.span().unwrap();
            let query = first + (last - first) * frac;
            let (before, after) = series.neighbors(query).unwrap();

            prop_assert!(before.time <= after.time);
            if query > first && query < last {
                prop_assert!(before.time < query);
                prop_assert!(after.time >= query);
            }
        }
    }
}
