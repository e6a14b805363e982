use std::{
    fmt,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};

use crate::{
    aggregator::{TemporalAggregator, WindowedRatings},
    composer::{RatingComposer, RatingValues},
    config::RatingsConfig,
    series::{NoteAccSample, SampleSeries, SwingSample},
    timeline::PlaybackInstant,
    RatingsError, Result,
};

/// Maps with fewer notes are not rated.
pub const MIN_NOTES: usize = 20;

/// The analyzer reports whole-map tech on a tenth of the displayed scale.
pub const STATIC_TECH_SCALE: f64 = 10.0;

/// Characteristic and difficulty name of the loaded beatmap.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MapIdentity {
    pub characteristic: String,
    pub difficulty: String,
}

impl MapIdentity {
    pub fn new(characteristic: impl Into<String>, difficulty: impl Into<String>) -> Self {
        Self {
            characteristic: characteristic.into(),
            difficulty: difficulty.into(),
        }
    }
}

impl fmt::Display for MapIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.characteristic, self.difficulty)
    }
}

/// Parsed difficulty plus the metadata the providers need.
///
/// `data` is whatever the host's map parser produces; the core only hands it
/// to the providers.
#[derive(Debug, Clone)]
pub struct MapLoad<D> {
    pub identity: MapIdentity,
    pub data: D,
    pub bpm: f64,
    pub note_jump_speed: f64,
    pub note_count: usize,
}

/// One analysis of the swing analyzer.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AnalyzedResult {
    pub tech: f64,
    pub pass: f64,
    pub nerf: f64,
    #[serde(default)]
    pub swings: Vec<SwingSample>,
}

/// Per-swing pass/tech analyzer.
pub trait SwingRatingProvider<D: ?Sized> {
    type Error: fmt::Display;

    fn rate(
        &self,
        data: &D,
        characteristic: &str,
        difficulty: &str,
        bpm: f64,
        timescale: f64,
    ) -> std::result::Result<Vec<AnalyzedResult>, Self::Error>;
}

/// Accuracy prediction model.
pub trait AccuracyProvider<D: ?Sized> {
    type Error: fmt::Display;

    /// Predicted accuracy for the whole map.
    fn predicted_acc(
        &self,
        data: &D,
        bpm: f64,
        timescale: f64,
    ) -> std::result::Result<f64, Self::Error>;

    /// Predicted accuracy of every note, positioned in seconds.
    fn predict_note_hits(
        &self,
        data: &D,
        bpm: f64,
        note_jump_speed: f64,
        timescale: f64,
    ) -> std::result::Result<Vec<NoteAccSample>, Self::Error>;
}

/// Whole-map ratings of the last successful recompute.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StaticRatings {
    pub values: RatingValues,
    pub nerf: f64,
}

/// Everything one recompute produced for a map.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesPair {
    pub identity: MapIdentity,
    pub generation: u64,
    pub swings: SampleSeries<SwingSample>,
    pub notes: SampleSeries<NoteAccSample>,
    pub predicted_acc: f64,
    pub nerf: f64,
    pub ratings: StaticRatings,
}

impl SeriesPair {
    /// Runs both providers once and composes the whole-map ratings.
    ///
    /// The first analysis returned by the swing analyzer is used.
    pub fn compute<D, S, A, C>(
        map: &MapLoad<D>,
        swing_provider: &S,
        accuracy_provider: &A,
        composer: &C,
        config: &RatingsConfig,
        generation: u64,
    ) -> Result<Self>
    where
        S: SwingRatingProvider<D> + ?Sized,
        A: AccuracyProvider<D> + ?Sized,
        C: RatingComposer + ?Sized,
    {
        if map.note_count < MIN_NOTES {
            return Err(RatingsError::InsufficientData {
                notes: map.note_count,
                required: MIN_NOTES,
            });
        }

        let MapIdentity {
            characteristic,
            difficulty,
        } = &map.identity;

        let analysis = swing_provider
            .rate(&map.data, characteristic, difficulty, map.bpm, config.timescale)
            .map_err(|err| RatingsError::provider("swing", err))?
            .into_iter()
            .next()
            .ok_or_else(|| RatingsError::MissingDifficulty {
                characteristic: characteristic.clone(),
                difficulty: difficulty.clone(),
            })?;

        let predicted_acc = accuracy_provider
            .predicted_acc(&map.data, map.bpm, config.timescale)
            .map_err(|err| RatingsError::provider("accuracy", err))?;

        let notes = accuracy_provider
            .predict_note_hits(&map.data, map.bpm, map.note_jump_speed, config.timescale)
            .map_err(|err| RatingsError::provider("accuracy", err))?;

        let AnalyzedResult {
            tech,
            pass,
            nerf,
            swings,
        } = analysis;

        let values = RatingValues::compose(
            composer,
            config.star_accuracy,
            predicted_acc,
            pass,
            tech * STATIC_TECH_SCALE,
            nerf,
        );

        Ok(Self {
            identity: map.identity.clone(),
            generation,
            swings: SampleSeries::new(swings),
            notes: SampleSeries::new(notes),
            predicted_acc,
            nerf,
            ratings: StaticRatings { values, nerf },
        })
    }

    /// Windowed ratings read from this pair's own two series.
    pub fn windowed<C: RatingComposer + ?Sized>(
        &self,
        aggregator: &TemporalAggregator,
        instant: PlaybackInstant,
        composer: &C,
        star_accuracy: f64,
    ) -> Option<WindowedRatings> {
        aggregator.ratings(&self.swings, &self.notes, instant, composer, star_accuracy)
    }
}

/// Issued per recompute request; only the newest ticket may publish.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RecomputeTicket(u64);

impl RecomputeTicket {
    pub fn generation(self) -> u64 {
        self.0
    }
}

/// Holds the published [`SeriesPair`].
///
/// Readers clone the `Arc` and keep a consistent pair for as long as they
/// need it. Recomputes are serialised and publish by swapping the `Arc`, so a
/// reader never sees the swings of one map with the notes of another.
#[derive(Debug, Default)]
pub struct RatingSnapshot {
    current: RwLock<Option<Arc<SeriesPair>>>,
    recompute: Mutex<()>,
    issued: AtomicU64,
}

impl RatingSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// The pair published by the last successful recompute.
    pub fn current(&self) -> Option<Arc<SeriesPair>> {
        self.current.read().clone()
    }

    /// Registers a new recompute request, superseding all earlier ones.
    pub fn begin(&self) -> RecomputeTicket {
        RecomputeTicket(self.issued.fetch_add(1, Ordering::AcqRel) + 1)
    }

    pub fn is_latest(&self, ticket: RecomputeTicket) -> bool {
        self.issued.load(Ordering::Acquire) == ticket.0
    }

    /// Recomputes and publishes the pair for `map`.
    ///
    /// On any error the published pair is left untouched.
    pub fn recompute<D, S, A, C>(
        &self,
        ticket: RecomputeTicket,
        map: &MapLoad<D>,
        swing_provider: &S,
        accuracy_provider: &A,
        composer: &C,
        config: &RatingsConfig,
    ) -> Result<Arc<SeriesPair>>
    where
        S: SwingRatingProvider<D> + ?Sized,
        A: AccuracyProvider<D> + ?Sized,
        C: RatingComposer + ?Sized,
    {
        let _guard = self.recompute.lock();

        self.ensure_latest(ticket)?;

        let pair = SeriesPair::compute(
            map,
            swing_provider,
            accuracy_provider,
            composer,
            config,
            ticket.0,
        )
        .map_err(|err| {
            tracing::warn!(map = %map.identity, error = %err, "recompute failed");

            err
        })?;

        self.ensure_latest(ticket)?;

        let pair = Arc::new(pair);
        *self.current.write() = Some(Arc::clone(&pair));

        tracing::info!(
            map = %pair.identity,
            generation = pair.generation,
            swings = pair.swings.len(),
            notes = pair.notes.len(),
            stars = pair.ratings.values.stars,
            "published ratings"
        );

        Ok(pair)
    }

    /// Drops the published pair, e.g. when the editor closes the map.
    pub fn clear(&self) {
        let _guard = self.recompute.lock();
        *self.current.write() = None;
    }

    fn ensure_latest(&self, ticket: RecomputeTicket) -> Result<()> {
        if self.is_latest(ticket) {
            Ok(())
        } else {
            tracing::debug!(generation = ticket.0, "dropping superseded recompute");

            Err(RatingsError::Superseded {
                generation: ticket.0,
            })
        }
    }
}
