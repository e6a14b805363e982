//! Gaussian-weighted resampling of the rating series around a playback
//! instant.
//!
//! For every offset of the window the swing series is read at
//! `beat + offset` and the accuracy series at `seconds + offset`. The
//! interpolated triples are folded with weights `exp(-offset² / 2σ²)` and the
//! averages go through the composer once. The fold is a convex combination
//! so each average stays within the range of the values that contributed.

use serde::{Deserialize, Serialize};

use crate::{
    composer::{RatingComposer, RatingValues},
    config::WindowParams,
    interpolate::InterpolatedPoint,
    series::{NoteAccSample, SampleSeries, SwingSample},
    timeline::PlaybackInstant,
};

/// Windows whose weights sum to at most this carry no data.
const MIN_WEIGHT_SUM: f64 = 1e-6;

/// Unnormalised Gaussian bell.
pub fn gaussian(x: f64, sigma: f64) -> f64 {
    (-(x * x) / (2.0 * sigma * sigma)).exp()
}

/// Interpolated pass, tech and accuracy at a single instant.
///
/// Returns `None` unless both series hold at least two samples.
pub fn ratings_at(
    swings: &SampleSeries<SwingSample>,
    notes: &SampleSeries<NoteAccSample>,
    beat: f64,
    seconds: f64,
) -> Option<InterpolatedPoint> {
    if !swings.has_interval() || !notes.has_interval() {
        return None;
    }

    let swing_pair = swings.neighbors(beat)?;
    let note_pair = notes.neighbors(seconds)?;

    Some(InterpolatedPoint::between(swing_pair, note_pair, beat, seconds))
}

/// Weighted averages of one window before composition.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindowedAverage {
    pub pass: f64,
    pub tech: f64,
    pub acc: f64,
    pub weight_sum: f64,
    /// Offsets that contributed to the fold.
    pub samples: usize,
}

/// Rating of the neighbourhood of one playback instant.
///
/// Kept apart from the whole-map result of a recompute; the two must not be
/// shown in each other's place.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindowedRatings {
    pub instant: PlaybackInstant,
    pub values: RatingValues,
    pub samples: usize,
}

#[derive(Default)]
struct WeightedSum {
    pass: f64,
    tech: f64,
    acc: f64,
    weight: f64,
    samples: usize,
}

impl WeightedSum {
    fn add(&mut self, point: InterpolatedPoint, weight: f64) {
        self.pass += point.pass * weight;
        self.tech += point.tech * weight;
        self.acc += point.acc * weight;
        self.weight += weight;
        self.samples += 1;
    }

    fn finish(self) -> Option<WindowedAverage> {
        if self.weight <= MIN_WEIGHT_SUM {
            return None;
        }

        Some(WindowedAverage {
            pass: self.pass / self.weight,
            tech: self.tech / self.weight,
            acc: self.acc / self.weight,
            weight_sum: self.weight,
            samples: self.samples,
        })
    }
}

/// Folds the rating series over a Gaussian window. Stateless apart from the
/// window shape, so equal inputs give bit-identical outputs.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TemporalAggregator {
    params: WindowParams,
}

impl TemporalAggregator {
    pub fn new(params: WindowParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &WindowParams {
        &self.params
    }

    /// Weighted pass, tech and accuracy around `instant`.
    ///
    /// `None` means "no data": a series with fewer than two samples, or no
    /// offset contributing any weight.
    pub fn average(
        &self,
        swings: &SampleSeries<SwingSample>,
        notes: &SampleSeries<NoteAccSample>,
        instant: PlaybackInstant,
    ) -> Option<WindowedAverage> {
        if !swings.has_interval() || !notes.has_interval() {
            tracing::trace!(
                swings = swings.len(),
                notes = notes.len(),
                "series too short for a window"
            );

            return None;
        }

        let mut sum = WeightedSum::default();

        for offset in self.params.offsets() {
            let sample = instant.offset(offset);
            let point = ratings_at(swings, notes, sample.beat, sample.seconds)?;

            // * all-zero triples read as "outside of the data"
            if point.is_blank() {
                continue;
            }

            sum.add(point, gaussian(offset, self.params.sigma));
        }

        sum.finish()
    }

    /// Composes the windowed average into displayable ratings.
    pub fn ratings<C: RatingComposer + ?Sized>(
        &self,
        swings: &SampleSeries<SwingSample>,
        notes: &SampleSeries<NoteAccSample>,
        instant: PlaybackInstant,
        composer: &C,
        star_accuracy: f64,
    ) -> Option<WindowedRatings> {
        let average = self.average(swings, notes, instant)?;

        let values = RatingValues::compose(
            composer,
            star_accuracy,
            average.acc,
            average.pass,
            average.tech,
            1.0,
        );

        tracing::trace!(
            beat = instant.beat,
            seconds = instant.seconds,
            samples = average.samples,
            stars = values.stars,
            "windowed ratings"
        );

        Some(WindowedRatings {
            instant,
            values,
            samples: average.samples,
        })
    }
}
