//! Audio codec catalog.
//!
//! The catalog is the read-only registry the option resolver derives its
//! lists from. The built-in catalog lives in `acodecs.toml`, is checked by
//! `build.rs` and embedded into the binary; users may point the config file at
//! a replacement catalog with the same schema.

pub mod types;

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::resolver::AudioMode;

pub use types::{
    Codec, ComboItem, DetailParameter, Encoder, ParameterControl, ParameterMode, RateControlKind,
    RateControlMode, Scale, SliderFields, Tag, UnknownRateControl, VolumeSlider,
};

const BUILTIN_CATALOG: &str = include_str!("acodecs.toml");

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Failed to read catalog file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse catalog: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Catalog defines no codecs")]
    NoCodecs,

    #[error("Duplicate codec '{0}'")]
    DuplicateCodec(String),

    #[error("Codec id '{0}' is reserved for a no-encoding selection")]
    ReservedCodecId(String),

    #[error("Duplicate encoder '{encoder}' in codec '{codec}'")]
    DuplicateEncoder { codec: String, encoder: String },

    #[error("Encoder '{encoder}' lists rate-control mode '{mode}' twice")]
    DuplicateRateControl {
        encoder: String,
        mode: RateControlKind,
    },

    #[error("Encoder '{encoder}' defines parameter '{parameter}' twice")]
    DuplicateParameter { encoder: String, parameter: String },

    #[error("Invalid slider for '{owner}': {reason}")]
    InvalidSlider { owner: String, reason: String },

    #[error("Combo parameter '{0}' has no items")]
    EmptyCombo(String),

    #[error("Combo parameter '{parameter}' default '{value}' is not one of its items")]
    UnknownComboDefault { parameter: String, value: String },
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Catalog {
    codecs: Vec<Codec>,
    volume: VolumeSlider,
}

impl Catalog {
    /// The embedded catalog, parsed on first use and shared for the process lifetime
    pub fn builtin() -> &'static Catalog {
        static BUILTIN: OnceLock<Catalog> = OnceLock::new();
        BUILTIN.get_or_init(|| {
            Catalog::from_toml_str(BUILTIN_CATALOG)
                .expect("built-in acodecs.toml is validated by build.rs")
        })
    }

    /// Parse and validate a catalog document
    pub fn from_toml_str(content: &str) -> Result<Self, CatalogError> {
        let catalog: Catalog = toml::from_str(content)?;
        catalog.validate()?;
        debug!("Catalog parsed: {} codecs", catalog.codecs.len());
        Ok(catalog)
    }

    /// Load a catalog file from disk
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let content = fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let catalog = Self::from_toml_str(&content)?;
        info!("Loaded catalog from {}", path.display());
        Ok(catalog)
    }

    pub fn codecs(&self) -> &[Codec] {
        &self.codecs
    }

    pub fn volume(&self) -> &VolumeSlider {
        &self.volume
    }

    /// Look up a codec by id
    pub fn find(&self, codec_id: &str) -> Option<&Codec> {
        self.codecs.iter().find(|codec| codec.id == codec_id)
    }

    /// Check structural invariants the resolver relies on
    pub fn validate(&self) -> Result<(), CatalogError> {
        if self.codecs.is_empty() {
            return Err(CatalogError::NoCodecs);
        }

        validate_slider("volume", &self.volume.slider)?;
        validate_position("volume", self.volume.neutral)?;

        let mut codec_ids = HashSet::new();
        for codec in &self.codecs {
            if AudioMode::of(&codec.id) != AudioMode::Configured {
                return Err(CatalogError::ReservedCodecId(codec.id.clone()));
            }
            if !codec_ids.insert(codec.id.as_str()) {
                return Err(CatalogError::DuplicateCodec(codec.id.clone()));
            }

            let mut encoder_ids = HashSet::new();
            for encoder in &codec.encoders {
                if !encoder_ids.insert(encoder.id.as_str()) {
                    return Err(CatalogError::DuplicateEncoder {
                        codec: codec.id.clone(),
                        encoder: encoder.id.clone(),
                    });
                }
                validate_encoder(encoder)?;
            }
        }

        Ok(())
    }
}

fn validate_encoder(encoder: &Encoder) -> Result<(), CatalogError> {
    let mut modes = HashSet::new();
    for mode in &encoder.ratecontrol {
        if !modes.insert(mode.id) {
            return Err(CatalogError::DuplicateRateControl {
                encoder: encoder.id.clone(),
                mode: mode.id,
            });
        }
        validate_slider(&format!("{}/{}", encoder.id, mode.id), &mode.slider)?;
    }

    let mut parameters = HashSet::new();
    for parameter in &encoder.parameters {
        if !parameters.insert(parameter.parameter.as_str()) {
            return Err(CatalogError::DuplicateParameter {
                encoder: encoder.id.clone(),
                parameter: parameter.parameter.clone(),
            });
        }

        match &parameter.control {
            ParameterControl::Slider { slider, default } => {
                validate_slider(&parameter.parameter, slider)?;
                if let Some(default) = default {
                    validate_position(&parameter.parameter, *default)?;
                }
            }
            ParameterControl::Combo { items, default } => {
                if items.is_empty() {
                    return Err(CatalogError::EmptyCombo(parameter.parameter.clone()));
                }
                if let Some(default) = default {
                    if !items.iter().any(|item| &item.value == default) {
                        return Err(CatalogError::UnknownComboDefault {
                            parameter: parameter.parameter.clone(),
                            value: default.clone(),
                        });
                    }
                }
            }
        }
    }

    Ok(())
}

fn validate_slider(owner: &str, slider: &SliderFields) -> Result<(), CatalogError> {
    let invalid = |reason: String| CatalogError::InvalidSlider {
        owner: owner.to_string(),
        reason,
    };

    if !(slider.step > 0.0 && slider.step <= 1.0) {
        return Err(invalid(format!("step {} must be in (0, 1]", slider.step)));
    }
    match &slider.scale {
        Scale::Linear { min, max, .. } => {
            if !(min < max) {
                return Err(invalid(format!("linear scale min {} >= max {}", min, max)));
            }
        }
        Scale::Stepped { values, .. } => {
            if values.is_empty() {
                return Err(invalid("stepped scale has no values".to_string()));
            }
        }
    }
    for tag in &slider.tags {
        if !(0.0..=1.0).contains(&tag.at) {
            return Err(invalid(format!("tag '{}' at {} is outside 0..1", tag.label, tag.at)));
        }
    }
    Ok(())
}

fn validate_position(owner: &str, position: f64) -> Result<(), CatalogError> {
    if (0.0..=1.0).contains(&position) {
        Ok(())
    } else {
        Err(CatalogError::InvalidSlider {
            owner: owner.to_string(),
            reason: format!("default {} is outside 0..1", position),
        })
    }
}
