use std::sync::Arc;

use crate::{
    aggregator::{TemporalAggregator, WindowedRatings},
    composer::RatingComposer,
    config::RatingsConfig,
    display::{DisplaySink, PanelValues, TriangleReadout, DEFAULT_MAX_RATING},
    snapshot::{AccuracyProvider, MapLoad, RatingSnapshot, StaticRatings, SwingRatingProvider},
    timeline::PlaybackInstant,
    Result,
};

/// Ratings state of one open map editor.
///
/// Built when the editor opens a map and dropped when it closes. The host
/// forwards map loads and playback ticks; the session pushes results into
/// its [`DisplaySink`].
#[derive(Debug)]
pub struct RatingsSession<S, A, C, K> {
    config: RatingsConfig,
    aggregator: TemporalAggregator,
    swing_provider: S,
    accuracy_provider: A,
    composer: C,
    sink: K,
    snapshot: Arc<RatingSnapshot>,
    last_instant: Option<PlaybackInstant>,
    max_rating: f64,
}

impl<S, A, C, K> RatingsSession<S, A, C, K>
where
    C: RatingComposer,
    K: DisplaySink,
{
    pub fn new(
        config: RatingsConfig,
        swing_provider: S,
        accuracy_provider: A,
        composer: C,
        sink: K,
    ) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            aggregator: TemporalAggregator::new(config.window),
            config,
            swing_provider,
            accuracy_provider,
            composer,
            sink,
            snapshot: Arc::new(RatingSnapshot::new()),
            last_instant: None,
            max_rating: DEFAULT_MAX_RATING,
        })
    }

    pub fn config(&self) -> &RatingsConfig {
        &self.config
    }

    /// Replaces the configuration. Takes effect on the next tick; provider
    /// knobs apply from the next recompute.
    pub fn set_config(&mut self, config: RatingsConfig) -> Result<()> {
        config.validate()?;

        self.aggregator = TemporalAggregator::new(config.window);
        self.config = config;

        Ok(())
    }

    pub fn set_max_rating(&mut self, max_rating: f64) {
        self.max_rating = max_rating;
    }

    pub fn sink(&self) -> &K {
        &self.sink
    }

    /// Shared store, for hosts that recompute off the tick thread.
    pub fn snapshot(&self) -> &Arc<RatingSnapshot> {
        &self.snapshot
    }

    /// Whole-map ratings of the last successful recompute.
    pub fn static_ratings(&self) -> Option<StaticRatings> {
        self.snapshot.current().map(|pair| pair.ratings)
    }

    /// Recomputes the ratings of a freshly loaded or saved map.
    ///
    /// On failure the previous ratings stay published and displayed and
    /// the error is returned for the host to surface.
    pub fn on_map_loaded<D>(&mut self, map: &MapLoad<D>) -> Result<StaticRatings>
    where
        S: SwingRatingProvider<D>,
        A: AccuracyProvider<D>,
    {
        let ticket = self.snapshot.begin();

        let pair = self.snapshot.recompute(
            ticket,
            map,
            &self.swing_provider,
            &self.accuracy_provider,
            &self.composer,
            &self.config,
        )?;

        self.sink.show_static(&PanelValues::from(&pair.ratings));

        if let Some(instant) = self.last_instant.filter(|_| self.config.enabled) {
            self.refresh(instant);
        }

        Ok(pair.ratings)
    }

    /// Updates the live display for the current playback position.
    ///
    /// Nothing is shown while disabled or before the first recompute. A
    /// window without data resets the display to zero.
    pub fn on_playback_tick(&mut self, instant: PlaybackInstant) -> Option<WindowedRatings> {
        self.last_instant = Some(instant);

        if !self.config.enabled {
            return None;
        }

        self.refresh(instant)
    }

    fn refresh(&mut self, instant: PlaybackInstant) -> Option<WindowedRatings> {
        let pair = self.snapshot.current()?;

        let rated = pair.windowed(
            &self.aggregator,
            instant,
            &self.composer,
            self.config.star_accuracy,
        );

        let readout = match rated {
            Some(ref rated) => TriangleReadout::new(&rated.values, self.max_rating),
            None => {
                tracing::debug!(
                    beat = instant.beat,
                    seconds = instant.seconds,
                    "no rating data around playback position"
                );

                TriangleReadout::zeroed(self.max_rating)
            }
        };

        self.sink.show_live(&readout);

        rated
    }

    /// Ends the session, returning the sink.
    pub fn close(self) -> K {
        self.snapshot.clear();

        self.sink
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        composer::BlendComposer,
        snapshot::tests::{map, sampled_map, FakeAccuracy, FakeAnalyzer},
        RatingsError,
    };

    #[derive(Debug, Default)]
    struct RecordingSink {
        panels: Vec<PanelValues>,
        live: Vec<TriangleReadout>,
    }

    impl DisplaySink for RecordingSink {
        fn show_static(&mut self, panel: &PanelValues) {
            self.panels.push(*panel);
        }

        fn show_live(&mut self, readout: &TriangleReadout) {
            self.live.push(*readout);
        }
    }

    type TestSession = RatingsSession<FakeAnalyzer, FakeAccuracy, BlendComposer, RecordingSink>;

    fn session(config: RatingsConfig) -> TestSession {
        RatingsSession::new(
            config,
            FakeAnalyzer::default(),
            FakeAccuracy::default(),
            BlendComposer::default(),
            RecordingSink::default(),
        )
        .unwrap()
    }

    #[test]
    fn ticks_before_first_load_show_nothing() {
        let mut session = session(RatingsConfig::default());

        assert!(session.on_playback_tick(PlaybackInstant::new(4.0, 2.0)).is_none());
        assert!(session.sink().live.is_empty());
    }

    #[test]
    fn load_then_scrub() {
        let mut session = session(RatingsConfig::default());

        let ratings = session.on_map_loaded(&map(6.0, 40)).unwrap();
        assert_eq!(ratings.values.pass, 6.0);
        assert_eq!(session.sink().panels.len(), 1);
        assert_eq!(session.sink().panels[0].predicted_acc, 60.0);

        let rated = session
            .on_playback_tick(PlaybackInstant::new(10.0, 5.0))
            .unwrap();
        assert!((rated.values.pass - 6.0).abs() < 1e-9);
        assert!((rated.values.tech - 12.0).abs() < 1e-9);

        let shown = session.sink().live.last().unwrap();
        assert_eq!(shown.pass, rated.values.pass);
        assert_eq!(shown.max_rating, DEFAULT_MAX_RATING);
    }

    #[test]
    fn reload_refreshes_live_display() {
        let mut session = session(RatingsConfig::default());
        session.on_map_loaded(&map(2.0, 40)).unwrap();
        session.on_playback_tick(PlaybackInstant::new(10.0, 5.0));
        assert_eq!(session.sink().live.len(), 1);

        session.on_map_loaded(&map(4.0, 40)).unwrap();
        assert_eq!(session.sink().live.len(), 2);
        assert!((session.sink().live[1].pass - 4.0).abs() < 1e-9);
    }

    #[test]
    fn window_without_data_resets_display() {
        let mut session = session(RatingsConfig::default());
        session.on_map_loaded(&sampled_map(5.0, 40, 1)).unwrap();

        assert!(session.on_playback_tick(PlaybackInstant::new(0.0, 0.0)).is_none());
        assert_eq!(session.sink().live.len(), 1);
        assert!(session.sink().live[0].is_zeroed());
    }

    #[test]
    fn reload_without_data_clears_previous_values() {
        let mut session = session(RatingsConfig::default());
        session.on_map_loaded(&map(4.0, 40)).unwrap();
        session.on_playback_tick(PlaybackInstant::new(10.0, 5.0)).unwrap();
        assert!(!session.sink().live[0].is_zeroed());

        session.on_map_loaded(&sampled_map(7.0, 40, 1)).unwrap();
        assert_eq!(session.sink().live.len(), 2);
        assert!(session.sink().live.last().unwrap().is_zeroed());
        assert_eq!(session.static_ratings().unwrap().values.pass, 7.0);
    }

    #[test]
    fn max_rating_rescales_triangle() {
        let mut session = session(RatingsConfig::default());
        session.on_map_loaded(&map(6.0, 40)).unwrap();

        session.set_max_rating(24.0);
        session.on_playback_tick(PlaybackInstant::new(10.0, 5.0)).unwrap();

        let shown = session.sink().live.last().unwrap();
        assert_eq!(shown.max_rating, 24.0);
        let (tech, _, pass) = shown.normalized();
        assert!((tech - 0.5).abs() < 1e-9);
        assert!((pass - 0.25).abs() < 1e-9);

        session.set_max_rating(6.0);
        session.on_playback_tick(PlaybackInstant::new(10.0, 5.0)).unwrap();

        let (tech, _, pass) = session.sink().live.last().unwrap().normalized();
        assert_eq!(tech, 1.0);
        assert!((pass - 1.0).abs() < 1e-9);
    }

    #[test]
    fn refused_reload_keeps_previous_ratings() {
        let mut session = session(RatingsConfig::default());
        let first = session.on_map_loaded(&map(2.0, 40)).unwrap();

        let err = session.on_map_loaded(&map(9.0, 10)).unwrap_err();
        assert!(matches!(err, RatingsError::InsufficientData { .. }));
        assert_eq!(session.static_ratings(), Some(first));
        assert_eq!(session.sink().panels.len(), 1);
    }

    #[test]
    fn disabled_session_ignores_ticks() {
        let config = RatingsConfig {
            enabled: false,
            ..Default::default()
        };
        let mut session = session(config);
        session.on_map_loaded(&map(2.0, 40)).unwrap();

        assert!(session.on_playback_tick(PlaybackInstant::new(1.0, 1.0)).is_none());
        assert!(session.sink().live.is_empty());

        session.set_config(RatingsConfig::default()).unwrap();
        assert!(session.on_playback_tick(PlaybackInstant::new(1.0, 1.0)).is_some());
    }

    #[test]
    fn rejects_invalid_config() {
        let mut session = session(RatingsConfig::default());

        let mut config = RatingsConfig::default();
        config.window.sigma = 0.0;
        assert!(session.set_config(config).is_err());
        assert_eq!(session.config(), &RatingsConfig::default());
    }

    #[test]
    fn close_clears_published_pair() {
        let mut session = session(RatingsConfig::default());
        session.on_map_loaded(&map(2.0, 40)).unwrap();

        let snapshot = Arc::clone(session.snapshot());
        let sink = session.close();

        assert!(snapshot.current().is_none());
        assert_eq!(sink.panels.len(), 1);
    }
}
