//! Option resolution for the audio panel.
//!
//! Everything here is a pure function of the catalog and the current
//! selection. Derived lists borrow from the catalog; the one state repair the
//! panel needs (a rate-control mode that the selected encoder does not offer)
//! is returned as a [`Correction`] for the caller to persist.

use tracing::debug;

use crate::catalog::{
    Catalog, DetailParameter, Encoder, ParameterControl, RateControlKind, RateControlMode,
    SliderFields,
};
use crate::selection::{DetailValue, NEUTRAL_POSITION, Selection};

/// Codec selection that drops the audio stream
pub const CODEC_DISABLED: &str = "禁用音频";
/// Codec selection that leaves the choice to ffmpeg
pub const CODEC_AUTO: &str = "自动";
/// Codec selection that copies the source stream
pub const CODEC_PASSTHROUGH: &str = "不重新编码";
/// Encoder a codec falls back to when the previous encoder does not belong to it
pub const ENCODER_AUTO: &str = "自动";
/// Selection field the rate-control slider is bound to
pub const RATE_VALUE_PARAMETER: &str = "ratevalue";

/// Which part of the panel is live, decided by the codec selection alone
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioMode {
    Disabled,
    Auto,
    PassThrough,
    Configured,
}

impl AudioMode {
    /// Codec ids that never reach the catalog
    pub const SENTINELS: [&'static str; 3] = [CODEC_DISABLED, CODEC_AUTO, CODEC_PASSTHROUGH];

    pub fn of(codec_id: &str) -> Self {
        match codec_id {
            CODEC_DISABLED => AudioMode::Disabled,
            CODEC_AUTO => AudioMode::Auto,
            CODEC_PASSTHROUGH => AudioMode::PassThrough,
            _ => AudioMode::Configured,
        }
    }

    /// Audio is re-encoded (volume and rate-control controls apply)
    pub fn reencodes(self) -> bool {
        matches!(self, AudioMode::Auto | AudioMode::Configured)
    }

    pub fn shows_encoder(self) -> bool {
        self == AudioMode::Configured
    }
}

/// Encoders offered for a codec; empty for the no-encoding selections and
/// for codecs the catalog does not know.
pub fn derive_encoders<'c>(catalog: &'c Catalog, codec_id: &str) -> &'c [Encoder] {
    if AudioMode::of(codec_id) != AudioMode::Configured {
        return &[];
    }
    catalog
        .find(codec_id)
        .map(|codec| codec.encoders.as_slice())
        .unwrap_or(&[])
}

pub fn find_encoder<'c>(encoders: &'c [Encoder], encoder_id: &str) -> Option<&'c Encoder> {
    encoders.iter().find(|encoder| encoder.id == encoder_id)
}

pub fn derive_rate_control_modes<'c>(
    encoders: &'c [Encoder],
    encoder_id: &str,
) -> &'c [RateControlMode] {
    find_encoder(encoders, encoder_id)
        .map(|encoder| encoder.ratecontrol.as_slice())
        .unwrap_or(&[])
}

pub fn derive_detail_parameters<'c>(
    encoders: &'c [Encoder],
    encoder_id: &str,
) -> &'c [DetailParameter] {
    find_encoder(encoders, encoder_id)
        .map(|encoder| encoder.parameters.as_slice())
        .unwrap_or(&[])
}

/// Slider bound to `ratevalue` for the active rate-control mode
#[derive(Debug, Clone, PartialEq)]
pub struct SliderSpec<'c> {
    pub kind: RateControlKind,
    pub display: &'static str,
    pub parameter: &'static str,
    /// ffmpeg option the slider value is passed with
    pub flag: &'c str,
    pub slider: &'c SliderFields,
}

impl<'c> SliderSpec<'c> {
    fn from_mode(mode: &'c RateControlMode) -> Self {
        Self {
            kind: mode.id,
            display: mode.id.display(),
            parameter: RATE_VALUE_PARAMETER,
            flag: &mode.flag,
            slider: &mode.slider,
        }
    }
}

/// Rate-control repair: the stored id is not offered by the encoder
#[derive(Debug, Clone, PartialEq)]
pub struct Correction {
    pub stale: String,
    pub corrected: RateControlKind,
}

impl Correction {
    pub fn apply(&self, selection: &mut Selection) {
        selection.ratecontrol = self.corrected.id().to_string();
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SliderResolution<'c> {
    pub spec: SliderSpec<'c>,
    pub correction: Option<Correction>,
}

/// Pick the slider for `current`, falling back to the first mode.
///
/// `None` when the encoder has no rate-control modes. A fallback carries the
/// correction that has to be written back before the slider is shown.
pub fn resolve_rate_control_slider<'c>(
    modes: &'c [RateControlMode],
    current: &str,
) -> Option<SliderResolution<'c>> {
    let first = modes.first()?;

    if let Some(mode) = modes.iter().find(|mode| mode.id.id() == current) {
        return Some(SliderResolution {
            spec: SliderSpec::from_mode(mode),
            correction: None,
        });
    }

    debug!(
        "Rate control '{}' not offered, falling back to '{}'",
        current, first.id
    );
    Some(SliderResolution {
        spec: SliderSpec::from_mode(first),
        correction: Some(Correction {
            stale: current.to_string(),
            corrected: first.id,
        }),
    })
}

/// Value a detail parameter is reset to after a codec or encoder change
pub fn reset_value(parameter: &DetailParameter) -> Option<DetailValue> {
    match &parameter.control {
        ParameterControl::Combo { items, default } => default
            .clone()
            .or_else(|| items.first().map(|item| item.value.clone()))
            .map(DetailValue::Text),
        ParameterControl::Slider { default, .. } => {
            Some(DetailValue::Number(default.unwrap_or(NEUTRAL_POSITION)))
        }
    }
}

/// Ordered resets the cascade writes, one per parameter
pub fn cascade_resets(parameters: &[DetailParameter]) -> Vec<(&str, DetailValue)> {
    parameters
        .iter()
        .filter_map(|parameter| {
            reset_value(parameter).map(|value| (parameter.parameter.as_str(), value))
        })
        .collect()
}

/// Every list the panel derives from one selection
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution<'c> {
    pub mode: AudioMode,
    pub encoders: &'c [Encoder],
    pub rate_controls: &'c [RateControlMode],
    pub slider: Option<SliderResolution<'c>>,
    pub parameters: &'c [DetailParameter],
}

impl Resolution<'_> {
    pub fn correction(&self) -> Option<&Correction> {
        self.slider.as_ref().and_then(|s| s.correction.as_ref())
    }
}

pub fn resolve<'c>(catalog: &'c Catalog, selection: &Selection) -> Resolution<'c> {
    let encoders = derive_encoders(catalog, &selection.acodec);
    let rate_controls = derive_rate_control_modes(encoders, &selection.aencoder);
    Resolution {
        mode: AudioMode::of(&selection.acodec),
        encoders,
        rate_controls,
        slider: resolve_rate_control_slider(rate_controls, &selection.ratecontrol),
        parameters: derive_detail_parameters(encoders, &selection.aencoder),
    }
}
