use std::path::Path;

use ratings_core::{
    AccuracyProvider, AnalyzedResult, MapIdentity, MapLoad, NoteAccSample, RatingsError,
    SwingRatingProvider,
};
use serde::{Deserialize, Serialize};

fn default_timescale() -> f64 {
    1.0
}

/// Analyzer and accuracy-model output for one difficulty, captured ahead of
/// time so the ratings can be replayed without the editor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RatingDump {
    pub characteristic: String,
    pub difficulty: String,
    pub bpm: f64,
    pub note_jump_speed: f64,
    pub note_count: usize,
    /// Timescale the analyses were produced with.
    #[serde(default = "default_timescale")]
    pub timescale: f64,
    pub analyses: Vec<AnalyzedResult>,
    pub predicted_acc: f64,
    #[serde(default)]
    pub notes: Vec<NoteAccSample>,
}

impl RatingDump {
    pub fn load(path: &Path) -> ratings_core::Result<Self> {
        let json = std::fs::read_to_string(path)?;

        serde_json::from_str(&json).map_err(|err| {
            RatingsError::msg(format!("failed to parse dump `{}`: {err}", path.display()))
        })
    }

    pub fn into_map_load(self) -> MapLoad<RatingDump> {
        MapLoad {
            identity: MapIdentity::new(self.characteristic.clone(), self.difficulty.clone()),
            bpm: self.bpm,
            note_jump_speed: self.note_jump_speed,
            note_count: self.note_count,
            data: self,
        }
    }

    fn check_timescale(&self, timescale: f64) -> Result<(), String> {
        if (self.timescale - timescale).abs() > 1e-9 {
            return Err(format!(
                "dump was analysed at timescale {}, config asks for {timescale}",
                self.timescale
            ));
        }

        Ok(())
    }
}

/// Replays the swing analyses stored in a dump.
#[derive(Debug, Default, Clone, Copy)]
pub struct DumpAnalyzer;

impl SwingRatingProvider<RatingDump> for DumpAnalyzer {
    type Error = String;

    fn rate(
        &self,
        dump: &RatingDump,
        characteristic: &str,
        difficulty: &str,
        _bpm: f64,
        timescale: f64,
    ) -> Result<Vec<AnalyzedResult>, String> {
        dump.check_timescale(timescale)?;

        if dump.characteristic != characteristic || dump.difficulty != difficulty {
            return Ok(Vec::new());
        }

        Ok(dump.analyses.clone())
    }
}

/// Replays the accuracy predictions stored in a dump.
#[derive(Debug, Default, Clone, Copy)]
pub struct DumpAccuracy;

impl AccuracyProvider<RatingDump> for DumpAccuracy {
    type Error = String;

    fn predicted_acc(&self, dump: &RatingDump, _bpm: f64, timescale: f64) -> Result<f64, String> {
        dump.check_timescale(timescale)?;

        Ok(dump.predicted_acc)
    }

    fn predict_note_hits(
        &self,
        dump: &RatingDump,
        _bpm: f64,
        _note_jump_speed: f64,
        timescale: f64,
    ) -> Result<Vec<NoteAccSample>, String> {
        dump.check_timescale(timescale)?;

        Ok(dump.notes.clone())
    }
}
