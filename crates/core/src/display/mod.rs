use serde::{Deserialize, Serialize};

use crate::{composer::RatingValues, snapshot::StaticRatings};

/// Largest rating the triangle can show before an axis saturates.
pub const DEFAULT_MAX_RATING: f64 = 15.0;

/// Receives everything the overlay shows. Implementations own the drawing.
pub trait DisplaySink {
    /// Whole-map values for the text panel after a recompute.
    fn show_static(&mut self, panel: &PanelValues);

    /// Live values for the triangle while scrubbing.
    fn show_live(&mut self, readout: &TriangleReadout);
}

impl<K: DisplaySink + ?Sized> DisplaySink for &mut K {
    fn show_static(&mut self, panel: &PanelValues) {
        (**self).show_static(panel)
    }

    fn show_live(&mut self, readout: &TriangleReadout) {
        (**self).show_live(readout)
    }
}

impl<K: DisplaySink + ?Sized> DisplaySink for Box<K> {
    fn show_static(&mut self, panel: &PanelValues) {
        (**self).show_static(panel)
    }

    fn show_live(&mut self, readout: &TriangleReadout) {
        (**self).show_live(readout)
    }
}

/// Sink that drops every update.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl DisplaySink for NullSink {
    fn show_static(&mut self, _panel: &PanelValues) {}

    fn show_live(&mut self, _readout: &TriangleReadout) {}
}

/// Rounds to three decimals, ties to even.
fn round3(value: f64) -> f64 {
    (value * 1000.0).round_ties_even() / 1000.0
}

/// Whole-map values as listed in the text panel.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PanelValues {
    /// Predicted accuracy in percent.
    pub predicted_acc: f64,
    pub acc_rating: f64,
    pub stars: f64,
    pub tech: f64,
    pub pass: f64,
}

impl From<&StaticRatings> for PanelValues {
    fn from(ratings: &StaticRatings) -> Self {
        let values = &ratings.values;

        Self {
            predicted_acc: round3(values.acc * 100.0),
            acc_rating: round3(values.acc_rating),
            stars: round3(values.stars),
            tech: round3(values.tech),
            pass: round3(values.pass),
        }
    }
}

/// Live triangle state: one axis per rating plus the star label.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TriangleReadout {
    pub tech: f64,
    pub pass: f64,
    pub acc_rating: f64,
    /// Negative values hide the star label.
    pub stars: f64,
    pub max_rating: f64,
}

/// Text of the four triangle labels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriangleLabels {
    pub tech: String,
    pub pass: String,
    pub acc: String,
    pub star: String,
}

impl TriangleReadout {
    pub fn new(values: &RatingValues, max_rating: f64) -> Self {
        Self {
            tech: values.tech,
            pass: values.pass,
            acc_rating: values.acc_rating,
            stars: values.stars,
            max_rating,
        }
    }

    /// Shown when the window holds no data.
    pub fn zeroed(max_rating: f64) -> Self {
        Self::new(&RatingValues::zeroed(), max_rating)
    }

    pub fn is_zeroed(&self) -> bool {
        self.tech == 0.0 && self.pass == 0.0 && self.acc_rating == 0.0 && self.stars == 0.0
    }

    /// Axis lengths in `[0, 1]` as `(tech, acc, pass)`.
    pub fn normalized(&self) -> (f64, f64, f64) {
        let scale = |value: f64| {
            if self.max_rating > 0.0 {
                (value / self.max_rating).clamp(0.0, 1.0)
            } else {
                0.0
            }
        };

        (scale(self.tech), scale(self.acc_rating), scale(self.pass))
    }

    pub fn labels(&self) -> TriangleLabels {
        TriangleLabels {
            tech: format!("{:.1}", self.tech),
            pass: format!("{:.1}", self.pass),
            acc: format!("{:.1}", self.acc_rating),
            star: if self.stars >= 0.0 {
                format!("{:.1}", self.stars)
            } else {
                String::new()
            },
        }
    }
}
