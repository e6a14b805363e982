//! Boundary to the analyzer's rating and star-curve functions.
//!
//! The real formulas live in the external analyzer; the core only calls them
//! in a fixed order: accuracy → rating → curve → stars. [`compose`] is the
//! single place where that order is encoded.

use serde::{Deserialize, Serialize};

use crate::{
    interpolate::interpolate,
    series::{SampleSeries, TimedSample},
};

/// One point of an accuracy curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurvePoint {
    pub acc: f64,
    pub value: f64,
}

impl CurvePoint {
    pub const fn new(acc: f64, value: f64) -> Self {
        Self { acc, value }
    }
}

impl TimedSample for CurvePoint {
    fn time(&self) -> f64 {
        self.acc
    }
}

/// Pure rating functions supplied by the analyzer.
pub trait RatingComposer {
    /// Combines predicted accuracy, pass and tech into the accuracy rating.
    fn rating(&self, acc: f64, pass: f64, tech: f64) -> f64;

    /// Builds the accuracy curve for a given accuracy and rating.
    fn curve(&self, acc: f64, rating: f64) -> Vec<CurvePoint>;

    /// Derives the star rating from the curve.
    fn stars(
        &self,
        star_accuracy: f64,
        rating: f64,
        pass: f64,
        tech: f64,
        curve: &[CurvePoint],
    ) -> f64;
}

impl<C: RatingComposer + ?Sized> RatingComposer for &C {
    fn rating(&self, acc: f64, pass: f64, tech: f64) -> f64 {
        (**self).rating(acc, pass, tech)
    }

    fn curve(&self, acc: f64, rating: f64) -> Vec<CurvePoint> {
        (**self).curve(acc, rating)
    }

    fn stars(
        &self,
        star_accuracy: f64,
        rating: f64,
        pass: f64,
        tech: f64,
        curve: &[CurvePoint],
    ) -> f64 {
        (**self).stars(star_accuracy, rating, pass, tech, curve)
    }
}

/// Accuracy rating and stars produced by one composition.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ComposedRating {
    pub acc_rating: f64,
    pub stars: f64,
}

/// Runs the composer in its fixed order.
///
/// `nerf` scales the rating before the curve is built; windowed queries
/// pass `1.0`.
pub fn compose<C: RatingComposer + ?Sized>(
    composer: &C,
    star_accuracy: f64,
    acc: f64,
    pass: f64,
    tech: f64,
    nerf: f64,
) -> ComposedRating {
    let acc_rating = composer.rating(acc, pass, tech) * nerf;
    let curve = composer.curve(acc, acc_rating);
    let stars = composer.stars(star_accuracy, acc_rating, pass, tech, &curve);

    ComposedRating { acc_rating, stars }
}

/// The rating axes shown to the mapper.
///
/// `acc` is the predicted accuracy fraction the composition was fed with,
/// `acc_rating` the composed accuracy rating.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RatingValues {
    pub tech: f64,
    pub pass: f64,
    pub acc: f64,
    pub acc_rating: f64,
    pub stars: f64,
}

impl RatingValues {
    /// Composes accuracy rating and stars for the given axes.
    pub fn compose<C: RatingComposer + ?Sized>(
        composer: &C,
        star_accuracy: f64,
        acc: f64,
        pass: f64,
        tech: f64,
        nerf: f64,
    ) -> Self {
        let ComposedRating { acc_rating, stars } =
            compose(composer, star_accuracy, acc, pass, tech, nerf);

        Self {
            tech,
            pass,
            acc,
            acc_rating,
            stars,
        }
    }

    /// Values displayed when there is nothing to rate.
    pub fn zeroed() -> Self {
        Self::default()
    }

    pub fn is_zeroed(&self) -> bool {
        *self == Self::zeroed()
    }
}

/// Accuracy/multiplier pairs of the stand-in star curve.
const BLEND_CURVE: [CurvePoint; 7] = [
    CurvePoint::new(0.0, 0.0),
    CurvePoint::new(0.6, 0.25),
    CurvePoint::new(0.8, 0.5),
    CurvePoint::new(0.9, 0.7),
    CurvePoint::new(0.95, 0.85),
    CurvePoint::new(0.97, 1.0),
    CurvePoint::new(1.0, 1.5),
];

/// Stand-in composer for hosts without the analyzer's curve: the rating is an
/// accuracy-scaled blend of pass and tech and stars read the rating off a
/// fixed multiplier curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BlendComposer {
    pub pass_weight: f64,
    pub tech_weight: f64,
}

impl Default for BlendComposer {
    fn default() -> Self {
        Self {
            pass_weight: 0.5,
            tech_weight: 0.5,
        }
    }
}

impl RatingComposer for BlendComposer {
    fn rating(&self, acc: f64, pass: f64, tech: f64) -> f64 {
        let blend = pass * self.pass_weight + tech * self.tech_weight;

        blend * acc.clamp(0.0, 1.0)
    }

    fn curve(&self, _acc: f64, _rating: f64) -> Vec<CurvePoint> {
        BLEND_CURVE.to_vec()
    }

    fn stars(
        &self,
        star_accuracy: f64,
        rating: f64,
        _pass: f64,
        _tech: f64,
        curve: &[CurvePoint],
    ) -> f64 {
        let curve = SampleSeries::new(curve.to_vec());

        let multiplier = match curve.neighbors(star_accuracy) {
            Some((lo, hi)) => interpolate(lo.acc, lo.value, hi.acc, hi.value, star_accuracy),
            None => 0.0,
        };

        rating * multiplier
    }
}
