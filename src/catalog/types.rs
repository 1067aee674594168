//! Type definitions for the audio codec catalog.
//!
//! These types mirror the structure of `acodecs.toml`: codecs own an ordered
//! list of encoders, encoders own their rate-control modes and detail
//! parameters. Slider-backed entries carry their conversion rules as data
//! (`SliderFields`) instead of callbacks.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::selection::DetailValue;

/// Rate-control strategy of an encoder.
///
/// The set is closed: a catalog naming any other mode fails to load, so every
/// mode that reaches the UI has a display label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum RateControlKind {
    /// Constant / average bitrate
    CbrAbr,
    /// Quality target (VBR quality scale)
    Q,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown rate-control mode '{0}' (expected one of: CBR/ABR, Q)")]
pub struct UnknownRateControl(pub String);

impl RateControlKind {
    pub const ALL: [RateControlKind; 2] = [RateControlKind::CbrAbr, RateControlKind::Q];

    /// Identifier stored in the selection (`ratecontrol` field)
    pub fn id(self) -> &'static str {
        match self {
            Self::CbrAbr => "CBR/ABR",
            Self::Q => "Q",
        }
    }

    /// Label of the slider bound to `ratevalue` while this mode is active
    pub fn display(self) -> &'static str {
        match self {
            Self::CbrAbr => "码率",
            Self::Q => "质量参数",
        }
    }
}

impl fmt::Display for RateControlKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for RateControlKind {
    type Err = UnknownRateControl;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.id() == s)
            .ok_or_else(|| UnknownRateControl(s.to_string()))
    }
}

impl TryFrom<String> for RateControlKind {
    type Error = UnknownRateControl;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<RateControlKind> for String {
    fn from(kind: RateControlKind) -> Self {
        kind.id().to_string()
    }
}

/// Mapping from the normalized slider position (0..=1) to the encoder value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Scale {
    /// Evenly spaced between `min` and `max`, rounded to `decimals`
    Linear {
        min: f64,
        max: f64,
        #[serde(default)]
        decimals: u8,
    },
    /// Discrete ladder; the slider position picks the nearest rung
    Stepped {
        values: Vec<f64>,
        #[serde(default)]
        decimals: u8,
    },
}

impl Scale {
    pub fn decimals(&self) -> usize {
        match self {
            Scale::Linear { decimals, .. } | Scale::Stepped { decimals, .. } => *decimals as usize,
        }
    }

    /// Encoder value at a normalized slider position
    pub fn to_actual(&self, position: f64) -> f64 {
        let position = clamp_unit(position);
        match self {
            Scale::Linear { min, max, decimals } => {
                round_to(min + (max - min) * position, *decimals)
            }
            Scale::Stepped { values, .. } => {
                if values.is_empty() {
                    return 0.0;
                }
                let last = values.len() - 1;
                let idx = (position * last as f64).round() as usize;
                values[idx.min(last)]
            }
        }
    }

    /// Normalized slider position of an encoder value (clamped to the scale)
    pub fn to_normalized(&self, actual: f64) -> f64 {
        match self {
            Scale::Linear { min, max, .. } => {
                if max <= min {
                    return 0.0;
                }
                clamp_unit((actual - min) / (max - min))
            }
            Scale::Stepped { values, .. } => {
                if values.len() <= 1 {
                    return 0.0;
                }
                let nearest = values
                    .iter()
                    .enumerate()
                    .min_by(|(_, a), (_, b)| {
                        (*a - actual)
                            .abs()
                            .total_cmp(&(*b - actual).abs())
                    })
                    .map(|(idx, _)| idx)
                    .unwrap_or(0);
                nearest as f64 / (values.len() - 1) as f64
            }
        }
    }
}

/// A labeled point on a slider track
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    /// Normalized position (0..=1)
    pub at: f64,
    pub label: String,
}

/// Numeric control definition shared by rate-control modes, slider
/// parameters and the volume slider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SliderFields {
    /// Snap increment on the normalized scale
    pub step: f64,
    #[serde(default)]
    pub tags: Vec<Tag>,
    pub scale: Scale,
    /// Appended to the display text ("128 kbps")
    #[serde(default)]
    pub unit: String,
    /// Appended to the raw encoder argument ("128k")
    #[serde(default)]
    pub param_suffix: String,
}

impl SliderFields {
    /// Clamp a raw slider position into 0..=1 and snap it to `step`
    pub fn value_process(&self, raw: f64) -> f64 {
        if !raw.is_finite() {
            return 0.0;
        }
        let value = clamp_unit(raw);
        if self.step > 0.0 {
            clamp_unit((value / self.step).round() * self.step)
        } else {
            value
        }
    }

    fn format_actual(&self, position: f64) -> String {
        let actual = self.scale.to_actual(position);
        format!("{:.*}", self.scale.decimals(), actual)
    }

    pub fn value_to_text(&self, position: f64) -> String {
        let number = self.format_actual(position);
        if self.unit.is_empty() {
            number
        } else {
            format!("{} {}", number, self.unit)
        }
    }

    /// Encoder argument value for a slider position
    pub fn value_to_param(&self, position: f64) -> String {
        format!("{}{}", self.format_actual(position), self.param_suffix)
    }

    /// Parse display text or a raw argument back into a slider position.
    /// Returns `None` when no number can be read.
    pub fn string_to_number(&self, text: &str) -> Option<f64> {
        let mut text = text.trim();
        for suffix in [self.unit.as_str(), self.param_suffix.as_str()] {
            if !suffix.is_empty() {
                if let Some(stripped) = text.strip_suffix(suffix) {
                    text = stripped.trim_end();
                }
            }
        }
        let actual: f64 = text.parse().ok()?;
        if !actual.is_finite() {
            return None;
        }
        Some(self.value_process(self.scale.to_normalized(actual)))
    }
}

/// A rate-control mode offered by an encoder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateControlMode {
    pub id: RateControlKind,
    /// ffmpeg option receiving `value_to_param(ratevalue)`, e.g. `-b:a`
    pub flag: String,
    pub slider: SliderFields,
}

/// One selectable entry of a combo parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComboItem {
    pub value: String,
    #[serde(default)]
    pub display: Option<String>,
}

impl ComboItem {
    pub fn label(&self) -> &str {
        self.display.as_deref().unwrap_or(&self.value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterMode {
    Slider,
    Combo,
}

impl fmt::Display for ParameterMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterMode::Slider => write!(f, "slider"),
            ParameterMode::Combo => write!(f, "combo"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ParameterControl {
    Slider {
        slider: SliderFields,
        default: Option<f64>,
    },
    Combo {
        items: Vec<ComboItem>,
        default: Option<String>,
    },
}

/// Encoder-specific tunable
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawParameter")]
pub struct DetailParameter {
    /// Key in `Selection::detail`
    pub parameter: String,
    pub display: String,
    pub flag: String,
    pub control: ParameterControl,
}

impl DetailParameter {
    pub fn mode(&self) -> ParameterMode {
        match self.control {
            ParameterControl::Slider { .. } => ParameterMode::Slider,
            ParameterControl::Combo { .. } => ParameterMode::Combo,
        }
    }

    /// Encoder argument value for a stored detail value
    pub fn value_to_param(&self, value: &DetailValue) -> String {
        match (&self.control, value) {
            (ParameterControl::Slider { slider, .. }, DetailValue::Number(n)) => {
                slider.value_to_param(*n)
            }
            (ParameterControl::Slider { slider, .. }, DetailValue::Text(text)) => slider
                .string_to_number(text)
                .map(|n| slider.value_to_param(n))
                .unwrap_or_else(|| text.clone()),
            (ParameterControl::Combo { .. }, value) => value.to_string(),
        }
    }
}

/// Flat on-disk shape of a detail parameter; `mode` decides which fields apply
#[derive(Debug, Deserialize)]
struct RawParameter {
    parameter: String,
    display: String,
    flag: String,
    mode: ParameterMode,
    #[serde(default)]
    slider: Option<SliderFields>,
    #[serde(default)]
    items: Vec<ComboItem>,
    #[serde(default)]
    default: Option<DetailValue>,
}

impl TryFrom<RawParameter> for DetailParameter {
    type Error = String;

    fn try_from(raw: RawParameter) -> Result<Self, Self::Error> {
        let control = match raw.mode {
            ParameterMode::Slider => {
                let slider = raw.slider.ok_or_else(|| {
                    format!("slider parameter '{}' has no [slider] table", raw.parameter)
                })?;
                let default = match raw.default {
                    None => None,
                    Some(DetailValue::Number(n)) => Some(n),
                    Some(DetailValue::Text(t)) => {
                        return Err(format!(
                            "slider parameter '{}' has non-numeric default '{}'",
                            raw.parameter, t
                        ));
                    }
                };
                ParameterControl::Slider { slider, default }
            }
            ParameterMode::Combo => ParameterControl::Combo {
                items: raw.items,
                default: raw.default.map(|d| d.to_string()),
            },
        };
        Ok(DetailParameter {
            parameter: raw.parameter,
            display: raw.display,
            flag: raw.flag,
            control,
        })
    }
}

/// A concrete encoder backend producing a codec's bitstream
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Encoder {
    pub id: String,
    /// Value passed to `-c:a`; defaults to `id`
    #[serde(default)]
    pub ffmpeg: Option<String>,
    #[serde(default)]
    pub ratecontrol: Vec<RateControlMode>,
    #[serde(default)]
    pub parameters: Vec<DetailParameter>,
}

impl Encoder {
    pub fn ffmpeg_name(&self) -> &str {
        self.ffmpeg.as_deref().unwrap_or(&self.id)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Codec {
    pub id: String,
    pub encoders: Vec<Encoder>,
}

/// The volume slider shown for every re-encoding mode
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct VolumeSlider {
    /// ffmpeg audio filter name
    #[serde(default = "default_volume_filter")]
    pub filter: String,
    /// Slider position that leaves the signal untouched
    #[serde(default = "default_neutral")]
    pub neutral: f64,
    pub slider: SliderFields,
}

fn default_volume_filter() -> String {
    "volume".to_string()
}

fn default_neutral() -> f64 {
    0.5
}

fn clamp_unit(value: f64) -> f64 {
    value.clamp(0.0, 1.0)
}

fn round_to(value: f64, decimals: u8) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}
