// Audio selection state (the settings store's audio subtree)

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;
use tracing::info;

use crate::catalog::DetailParameter;
use crate::resolver::{CODEC_AUTO, ENCODER_AUTO};

/// Neutral slider position used for `ratevalue`, `vol` and slider resets
pub const NEUTRAL_POSITION: f64 = 0.5;

/// Stored value of a detail parameter: slider position or combo item value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DetailValue {
    Number(f64),
    Text(String),
}

impl DetailValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            DetailValue::Number(n) => Some(*n),
            DetailValue::Text(_) => None,
        }
    }
}

impl fmt::Display for DetailValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DetailValue::Number(n) => write!(f, "{}", n),
            DetailValue::Text(t) => f.write_str(t),
        }
    }
}

impl From<f64> for DetailValue {
    fn from(value: f64) -> Self {
        DetailValue::Number(value)
    }
}

impl From<&str> for DetailValue {
    fn from(value: &str) -> Self {
        DetailValue::Text(value.to_string())
    }
}

impl From<String> for DetailValue {
    fn from(value: String) -> Self {
        DetailValue::Text(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
    #[error("Unknown field '{0}' (expected one of: acodec, aencoder, ratecontrol, ratevalue, vol, custom)")]
    UnknownField(String),

    #[error("Field '{field}' expects a number, got '{value}'")]
    NotANumber { field: Field, value: String },

    #[error("Parameter '{parameter}' cannot take value '{value}'")]
    InvalidDetail { parameter: String, value: String },
}

/// Top-level paths of the audio selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    Acodec,
    Aencoder,
    Ratecontrol,
    Ratevalue,
    Vol,
    Custom,
}

impl Field {
    pub const ALL: [Field; 6] = [
        Field::Acodec,
        Field::Aencoder,
        Field::Ratecontrol,
        Field::Ratevalue,
        Field::Vol,
        Field::Custom,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Field::Acodec => "acodec",
            Field::Aencoder => "aencoder",
            Field::Ratecontrol => "ratecontrol",
            Field::Ratevalue => "ratevalue",
            Field::Vol => "vol",
            Field::Custom => "custom",
        }
    }

    pub fn is_numeric(self) -> bool {
        matches!(self, Field::Ratevalue | Field::Vol)
    }

    /// Whether changing this field re-derives the detail parameter list
    pub fn triggers_cascade(self) -> bool {
        matches!(self, Field::Acodec | Field::Aencoder)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Field {
    type Err = EditError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Field::ALL
            .into_iter()
            .find(|field| field.name() == s)
            .ok_or_else(|| EditError::UnknownField(s.to_string()))
    }
}

/// A typed write to one top-level field
#[derive(Debug, Clone, PartialEq)]
pub enum Edit {
    Codec(String),
    Encoder(String),
    RateControl(String),
    RateValue(f64),
    Volume(f64),
    Custom(String),
}

impl Edit {
    pub fn field(&self) -> Field {
        match self {
            Edit::Codec(_) => Field::Acodec,
            Edit::Encoder(_) => Field::Aencoder,
            Edit::RateControl(_) => Field::Ratecontrol,
            Edit::RateValue(_) => Field::Ratevalue,
            Edit::Volume(_) => Field::Vol,
            Edit::Custom(_) => Field::Custom,
        }
    }

    /// Build an edit from a field path and its textual value
    pub fn parse(field: &str, value: &str) -> Result<Self, EditError> {
        let field: Field = field.parse()?;
        let number = || {
            value
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|n| n.is_finite())
                .ok_or_else(|| EditError::NotANumber {
                    field,
                    value: value.to_string(),
                })
        };

        Ok(match field {
            Field::Acodec => Edit::Codec(value.to_string()),
            Field::Aencoder => Edit::Encoder(value.to_string()),
            Field::Ratecontrol => Edit::RateControl(value.to_string()),
            Field::Ratevalue => Edit::RateValue(number()?),
            Field::Vol => Edit::Volume(number()?),
            Field::Custom => Edit::Custom(value.to_string()),
        })
    }
}

/// Current audio selections
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Selection {
    pub acodec: String,
    pub aencoder: String,
    pub ratecontrol: String,
    /// Normalized rate slider position
    pub ratevalue: f64,
    /// Detail parameter id -> value. May hold entries of encoders that are no
    /// longer selected; consumers only read ids of the current encoder.
    pub detail: BTreeMap<String, DetailValue>,
    /// Normalized volume slider position
    pub vol: f64,
    /// Extra ffmpeg arguments, shell-quoted
    pub custom: String,
}

impl Default for Selection {
    fn default() -> Self {
        Self {
            acodec: CODEC_AUTO.to_string(),
            aencoder: ENCODER_AUTO.to_string(),
            ratecontrol: "CBR/ABR".to_string(),
            ratevalue: NEUTRAL_POSITION,
            detail: BTreeMap::new(),
            vol: NEUTRAL_POSITION,
            custom: String::new(),
        }
    }
}

impl Selection {
    /// `set(path, value)` for a top-level field
    pub fn write(&mut self, edit: &Edit) {
        match edit {
            Edit::Codec(v) => self.acodec = v.clone(),
            Edit::Encoder(v) => self.aencoder = v.clone(),
            Edit::RateControl(v) => self.ratecontrol = v.clone(),
            Edit::RateValue(v) => self.ratevalue = *v,
            Edit::Volume(v) => self.vol = *v,
            Edit::Custom(v) => self.custom = v.clone(),
        }
    }

    /// `get(path)` for a top-level field
    pub fn get(&self, field: Field) -> DetailValue {
        match field {
            Field::Acodec => DetailValue::from(self.acodec.as_str()),
            Field::Aencoder => DetailValue::from(self.aencoder.as_str()),
            Field::Ratecontrol => DetailValue::from(self.ratecontrol.as_str()),
            Field::Ratevalue => DetailValue::Number(self.ratevalue),
            Field::Vol => DetailValue::Number(self.vol),
            Field::Custom => DetailValue::from(self.custom.as_str()),
        }
    }

    pub fn detail(&self, parameter: &str) -> Option<&DetailValue> {
        self.detail.get(parameter)
    }

    pub fn set_detail(&mut self, parameter: &str, value: DetailValue) {
        self.detail.insert(parameter.to_string(), value);
    }

    /// Detail entries not belonging to `parameters` (left behind by an
    /// earlier encoder)
    pub fn orphaned_details<'a>(
        &'a self,
        parameters: &'a [DetailParameter],
    ) -> impl Iterator<Item = &'a str> + 'a {
        self.detail
            .keys()
            .filter(move |id| !parameters.iter().any(|p| &p.parameter == *id))
            .map(String::as_str)
    }

    /// Drop orphaned detail entries, returning how many were removed
    pub fn prune_details(&mut self, parameters: &[DetailParameter]) -> usize {
        let before = self.detail.len();
        self.detail
            .retain(|id, _| parameters.iter().any(|p| &p.parameter == id));
        before - self.detail.len()
    }

    /// Load a saved selection; a missing file yields the defaults
    pub fn load(path: &Path) -> io::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let json = fs::read_to_string(path)?;
        let selection: Self = serde_json::from_str(&json)?;
        Ok(selection)
    }

    /// Save selection as pretty JSON, creating parent directories
    pub fn save(&self, path: &Path) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        info!("Saved selection to {}", path.display());
        Ok(())
    }
}
