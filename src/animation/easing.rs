// Copyright (c) 2019-present Dmitry Stepanov and Fyrox Engine contributors.
//
// Permission is hereby granted, free of charge, to any person obtaining a copy
// of this software and associated documentation files (the "Software"), to deal
// in the Software without restriction, including without limitation the rights
// to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
// copies of the Software, and to permit persons to whom the Software is
// furnished to do so, subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in all
// copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
// FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
// AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
// LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
// OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
// SOFTWARE.

//! A library of scalar easing curves used to shape tween interpolation.
//!
//! Every curve is a pure function mapping normalized time `t` in `[0; 1]` to a
//! progress value, with `ease(0) == 0` and `ease(1) == 1`. `Back` and `Elastic`
//! curves intentionally over- and undershoot in between.

use crate::animation::TweenError;
use std::f32::consts::PI;
use std::str::FromStr;
use strum_macros::{AsRefStr, EnumString};

const BACK_C1: f32 = 1.70158;
const BACK_C2: f32 = BACK_C1 * 1.525;
const BACK_C3: f32 = BACK_C1 + 1.0;
const ELASTIC_C4: f32 = (2.0 * PI) / 3.0;
const ELASTIC_C5: f32 = (2.0 * PI) / 4.5;

/// A named easing curve, or a user-supplied pure function.
#[derive(Copy, Clone, Debug, PartialEq, AsRefStr, EnumString)]
pub enum Easing {
    #[strum(serialize = "linear")]
    Linear,
    #[strum(serialize = "quadIn")]
    QuadIn,
    #[strum(serialize = "quadOut")]
    QuadOut,
    #[strum(serialize = "quadInOut")]
    QuadInOut,
    #[strum(serialize = "cubicIn")]
    CubicIn,
    #[strum(serialize = "cubicOut")]
    CubicOut,
    #[strum(serialize = "cubicInOut")]
    CubicInOut,
    #[strum(serialize = "quartIn")]
    QuartIn,
    #[strum(serialize = "quartOut")]
    QuartOut,
    #[strum(serialize = "quartInOut")]
    QuartInOut,
    #[strum(serialize = "quintIn")]
    QuintIn,
    #[strum(serialize = "quintOut")]
    QuintOut,
    #[strum(serialize = "quintInOut")]
    QuintInOut,
    #[strum(serialize = "sineIn")]
    SineIn,
    #[strum(serialize = "sineOut")]
    SineOut,
    #[strum(serialize = "sineInOut")]
    SineInOut,
    #[strum(serialize = "expoIn")]
    ExpoIn,
    #[strum(serialize = "expoOut")]
    ExpoOut,
    #[strum(serialize = "expoInOut")]
    ExpoInOut,
    #[strum(serialize = "circIn")]
    CircIn,
    #[strum(serialize = "circOut")]
    CircOut,
    #[strum(serialize = "circInOut")]
    CircInOut,
    #[strum(serialize = "backIn")]
    BackIn,
    #[strum(serialize = "backOut")]
    BackOut,
    #[strum(serialize = "backInOut")]
    BackInOut,
    #[strum(serialize = "elasticIn")]
    ElasticIn,
    #[strum(serialize = "elasticOut")]
    ElasticOut,
    #[strum(serialize = "elasticInOut")]
    ElasticInOut,
    #[strum(serialize = "bounceIn")]
    BounceIn,
    #[strum(serialize = "bounceOut")]
    BounceOut,
    #[strum(serialize = "bounceInOut")]
    BounceInOut,
    /// A user-supplied curve. Must map 0 to 0 and 1 to 1 to blend correctly
    /// with property interpolation.
    #[strum(disabled)]
    Custom(fn(f32) -> f32),
}

impl Default for Easing {
    fn default() -> Self {
        Self::Linear
    }
}

fn bounce_out(t: f32) -> f32 {
    const N1: f32 = 7.5625;
    const D1: f32 = 2.75;

    if t < 1.0 / D1 {
        N1 * t * t
    } else if t < 2.0 / D1 {
        let t = t - 1.5 / D1;
        N1 * t * t + 0.75
    } else if t < 2.5 / D1 {
        let t = t - 2.25 / D1;
        N1 * t * t + 0.9375
    } else {
        let t = t - 2.625 / D1;
        N1 * t * t + 0.984375
    }
}

impl Easing {
    /// Looks an easing curve up by its documented name, e.g. `"bounceOut"`.
    pub fn from_name(name: &str) -> Result<Self, TweenError> {
        Self::from_str(name).map_err(|_| TweenError::UnknownEasing(name.to_owned()))
    }

    /// Maps normalized time `t` in `[0; 1]` to eased progress.
    pub fn ease(self, t: f32) -> f32 {
        match self {
            Easing::Linear => t,
            Easing::QuadIn => t * t,
            Easing::QuadOut => 1.0 - (1.0 - t) * (1.0 - t),
            Easing::QuadInOut => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
                }
            }
            Easing::CubicIn => t * t * t,
            Easing::CubicOut => 1.0 - (1.0 - t).powi(3),
            Easing::CubicInOut => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
                }
            }
            Easing::QuartIn => t.powi(4),
            Easing::QuartOut => 1.0 - (1.0 - t).powi(4),
            Easing::QuartInOut => {
                if t < 0.5 {
                    8.0 * t.powi(4)
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(4) / 2.0
                }
            }
            Easing::QuintIn => t.powi(5),
            Easing::QuintOut => 1.0 - (1.0 - t).powi(5),
            Easing::QuintInOut => {
                if t < 0.5 {
                    16.0 * t.powi(5)
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(5) / 2.0
                }
            }
            Easing::SineIn => 1.0 - (t * PI / 2.0).cos(),
            Easing::SineOut => (t * PI / 2.0).sin(),
            Easing::SineInOut => -((PI * t).cos() - 1.0) / 2.0,
            Easing::ExpoIn => {
                if t == 0.0 {
                    0.0
                } else {
                    2.0f32.powf(10.0 * t - 10.0)
                }
            }
            Easing::ExpoOut => {
                if t == 1.0 {
                    1.0
                } else {
                    1.0 - 2.0f32.powf(-10.0 * t)
                }
            }
            Easing::ExpoInOut => {
                if t == 0.0 {
                    0.0
                } else if t == 1.0 {
                    1.0
                } else if t < 0.5 {
                    2.0f32.powf(20.0 * t - 10.0) / 2.0
                } else {
                    (2.0 - 2.0f32.powf(-20.0 * t + 10.0)) / 2.0
                }
            }
            Easing::CircIn => 1.0 - (1.0 - t * t).max(0.0).sqrt(),
            Easing::CircOut => (1.0 - (t - 1.0) * (t - 1.0)).max(0.0).sqrt(),
            Easing::CircInOut => {
                if t < 0.5 {
                    (1.0 - (1.0 - (2.0 * t).powi(2)).max(0.0).sqrt()) / 2.0
                } else {
                    ((1.0 - (-2.0 * t + 2.0).powi(2)).max(0.0).sqrt() + 1.0) / 2.0
                }
            }
            Easing::BackIn => BACK_C3 * t * t * t - BACK_C1 * t * t,
            Easing::BackOut => {
                let t = t - 1.0;
                1.0 + BACK_C3 * t * t * t + BACK_C1 * t * t
            }
            Easing::BackInOut => {
                if t < 0.5 {
                    ((2.0 * t).powi(2) * ((BACK_C2 + 1.0) * 2.0 * t - BACK_C2)) / 2.0
                } else {
                    ((2.0 * t - 2.0).powi(2) * ((BACK_C2 + 1.0) * (t * 2.0 - 2.0) + BACK_C2)
                        + 2.0)
                        / 2.0
                }
            }
            Easing::ElasticIn => {
                if t == 0.0 {
                    0.0
                } else if t == 1.0 {
                    1.0
                } else {
                    -(2.0f32.powf(10.0 * t - 10.0)) * ((t * 10.0 - 10.75) * ELASTIC_C4).sin()
                }
            }
            Easing::ElasticOut => {
                if t == 0.0 {
                    0.0
                } else if t == 1.0 {
                    1.0
                } else {
                    2.0f32.powf(-10.0 * t) * ((t * 10.0 - 0.75) * ELASTIC_C4).sin() + 1.0
                }
            }
            Easing::ElasticInOut => {
                if t == 0.0 {
                    0.0
                } else if t == 1.0 {
                    1.0
                } else if t < 0.5 {
                    -(2.0f32.powf(20.0 * t - 10.0) * ((20.0 * t - 11.125) * ELASTIC_C5).sin())
                        / 2.0
                } else {
                    (2.0f32.powf(-20.0 * t + 10.0) * ((20.0 * t - 11.125) * ELASTIC_C5).sin())
                        / 2.0
                        + 1.0
                }
            }
            Easing::BounceIn => 1.0 - bounce_out(1.0 - t),
            Easing::BounceOut => bounce_out(t),
            Easing::BounceInOut => {
                if t < 0.5 {
                    (1.0 - bounce_out(1.0 - 2.0 * t)) / 2.0
                } else {
                    (1.0 + bounce_out(2.0 * t - 1.0)) / 2.0
                }
            }
            Easing::Custom(f) => f(t),
        }
    }
}

#[cfg(test)]
mod test {
    use super::Easing;
    use approx::assert_relative_eq;

    const ALL_NAMED: [Easing; 31] = [
        Easing::Linear,
        Easing::QuadIn,
        Easing::QuadOut,
        Easing::QuadInOut,
        Easing::CubicIn,
        Easing::CubicOut,
        Easing::CubicInOut,
        Easing::QuartIn,
        Easing::QuartOut,
        Easing::QuartInOut,
        Easing::QuintIn,
        Easing::QuintOut,
        Easing::QuintInOut,
        Easing::SineIn,
        Easing::SineOut,
        Easing::SineInOut,
        Easing::ExpoIn,
        Easing::ExpoOut,
        Easing::ExpoInOut,
        Easing::CircIn,
        Easing::CircOut,
        Easing::CircInOut,
        Easing::BackIn,
        Easing::BackOut,
        Easing::BackInOut,
        Easing::ElasticIn,
        Easing::ElasticOut,
        Easing::ElasticInOut,
        Easing::BounceIn,
        Easing::BounceOut,
        Easing::BounceInOut,
    ];

    #[test]
    fn endpoints_are_fixed() {
        for curve in ALL_NAMED {
            assert_relative_eq!(curve.ease(0.0), 0.0, epsilon = 1e-5);
            assert_relative_eq!(curve.ease(1.0), 1.0, epsilon = 1e-5);
        }
    }

    #[test]
    fn midpoint_sanity() {
        assert_relative_eq!(Easing::Linear.ease(0.25), 0.25);
        assert_relative_eq!(Easing::QuadIn.ease(0.5), 0.25);
        assert_relative_eq!(Easing::QuadOut.ease(0.5), 0.75);
        assert_relative_eq!(Easing::QuadInOut.ease(0.5), 0.5);
        assert_relative_eq!(Easing::SineInOut.ease(0.5), 0.5, epsilon = 1e-6);
    }

    #[test]
    fn back_in_undershoots() {
        assert!(Easing::BackIn.ease(0.3) < 0.0);
        assert!(Easing::BackOut.ease(0.7) > 1.0);
    }

    #[test]
    fn lookup_by_name() {
        assert_eq!(Easing::from_name("bounceOut").unwrap(), Easing::BounceOut);
        assert_eq!(Easing::from_name("linear").unwrap(), Easing::Linear);
        assert!(Easing::from_name("wobble").is_err());
    }

    #[test]
    fn custom_curve() {
        let curve = Easing::Custom(|t| t * t);
        assert_relative_eq!(curve.ease(0.5), 0.25);
    }
}
