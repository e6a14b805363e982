use serde::{Deserialize, Serialize};

/// One playback moment expressed on both time axes of a map.
///
/// Swing samples are positioned in beats and note accuracy samples in
/// seconds, so every query carries both coordinates of the same moment.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PlaybackInstant {
    pub beat: f64,
    pub seconds: f64,
}

impl PlaybackInstant {
    pub fn new(beat: f64, seconds: f64) -> Self {
        Self { beat, seconds }
    }

    /// Converts seconds into beats assuming a constant tempo.
    pub fn from_seconds(seconds: f64, bpm: f64) -> Self {
        Self {
            beat: seconds * bpm / 60.0,
            seconds,
        }
    }

    /// Shifts both coordinates by the same amount.
    pub fn offset(self, delta: f64) -> Self {
        Self {
            beat: self.beat + delta,
            seconds: self.seconds + delta,
        }
    }
}

/// Constant-tempo playback clock used by hosts without their own editor
/// clock.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackClock {
    bpm: f64,
    time_seconds: f64,
}

impl PlaybackClock {
    pub fn new(bpm: f64) -> Self {
        Self {
            bpm,
            time_seconds: 0.0,
        }
    }

    pub fn bpm(&self) -> f64 {
        self.bpm
    }

    pub fn time_seconds(&self) -> f64 {
        self.time_seconds
    }

    pub fn reset(&mut self) {
        self.time_seconds = 0.0;
    }

    pub fn seek(&mut self, seconds: f64) {
        self.time_seconds = seconds.max(0.0);
    }

    pub fn advance(&mut self, delta: f64) {
        self.time_seconds = (self.time_seconds + delta).max(0.0);
    }

    pub fn instant(&self) -> PlaybackInstant {
        PlaybackInstant::from_seconds(self.time_seconds, self.bpm)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_seconds_to_beats() {
        let instant = PlaybackInstant::from_seconds(30.0, 120.0);
        assert_eq!(instant, PlaybackInstant::new(60.0, 30.0));
        assert_eq!(instant.offset(-1.5), PlaybackInstant::new(58.5, 28.5));
    }

    #[test]
    fn clock_never_rewinds_past_zero() {
        let mut clock = PlaybackClock::new(150.0);
        clock.advance(2.0);
        assert_eq!(clock.instant(), PlaybackInstant::new(5.0, 2.0));

        clock.advance(-5.0);
        assert_eq!(clock.time_seconds(), 0.0);

        clock.seek(-3.0);
        assert_eq!(clock.time_seconds(), 0.0);

        clock.seek(4.0);
        clock.reset();
        assert_eq!(clock.instant(), PlaybackInstant::default());
    }
}
