//! Core library for live Beat Saber difficulty ratings.
//!
//! While a map is open in the editor the core keeps two rating series: raw
//! pass/tech per swing (in beats) and predicted accuracy per note (in
//! seconds). A full recompute replaces both whenever the map is loaded or
//! saved. On every playback tick the series are resampled under a Gaussian
//! window around the current position and composed into tech, pass,
//! accuracy and star ratings for the overlay.
//!
//! Map parsing, the analyzers, the accuracy model and the star curve are
//! external; they plug in through [`SwingRatingProvider`],
//! [`AccuracyProvider`] and [`RatingComposer`].

pub mod aggregator;
pub mod composer;
pub mod config;
pub mod display;
pub mod error;
pub mod interpolate;
pub mod reload;
pub mod series;
pub mod session;
pub mod snapshot;
pub mod timeline;

pub use aggregator::{TemporalAggregator, WindowedAverage, WindowedRatings};
pub use composer::{BlendComposer, ComposedRating, CurvePoint, RatingComposer, RatingValues};
pub use config::{RatingsConfig, WindowParams, MAX_WINDOW_SAMPLES};
pub use display::{
    DisplaySink, NullSink, PanelValues, TriangleLabels, TriangleReadout, DEFAULT_MAX_RATING,
};
pub use error::{RatingsError, Result};
pub use interpolate::{interpolate, InterpolatedPoint};
pub use reload::{DebounceWindow, ReloadDebouncer, ReloadTrigger};
pub use series::{NoteAccSample, SampleSeries, SwingSample, TimedSample};
pub use session::RatingsSession;
pub use snapshot::{
    AccuracyProvider, AnalyzedResult, MapIdentity, MapLoad, RatingSnapshot, RecomputeTicket,
    SeriesPair, StaticRatings, SwingRatingProvider, MIN_NOTES,
};
pub use timeline::{PlaybackClock, PlaybackInstant};
