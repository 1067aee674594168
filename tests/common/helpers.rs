#![allow(dead_code)] // Not every test binary uses every helper

use audioparams::catalog::Catalog;
use audioparams::form::{ApplySink, AudioForm};
use audioparams::selection::{Edit, Selection};

/// Small catalog exercising rate-control correction and slider resets
pub const SCENARIO_CATALOG: &str = r#"
[volume.slider]
step = 0.05
unit = "dB"
param_suffix = "dB"
scale = { kind = "linear", min = -10.0, max = 10.0, decimals = 1 }

[[codecs]]
id = "AAC"

[[codecs.encoders]]
id = "fdk_aac"
ffmpeg = "libfdk_aac"

[[codecs.encoders.ratecontrol]]
id = "CBR/ABR"
flag = "-b:a"

[codecs.encoders.ratecontrol.slider]
step = 0.25
unit = "kbps"
param_suffix = "k"
scale = { kind = "stepped", values = [64.0, 96.0, 128.0, 192.0, 256.0] }

[[codecs]]
id = "Lab"

[[codecs.encoders]]
id = "E1"
ffmpeg = "lab_e1"

[[codecs.encoders.parameters]]
parameter = "q"
display = "Q"
flag = "-q"
mode = "slider"
default = 0.3

[codecs.encoders.parameters.slider]
step = 0.1
scale = { kind = "linear", min = 0.0, max = 10.0 }

[[codecs.encoders]]
id = "E2"
ffmpeg = "lab_e2"

[[codecs.encoders.parameters]]
parameter = "q"
display = "Q"
flag = "-q"
mode = "slider"

[codecs.encoders.parameters.slider]
step = 0.1
scale = { kind = "linear", min = 0.0, max = 10.0 }
"#;

pub fn scenario_catalog() -> Catalog {
    Catalog::from_toml_str(SCENARIO_CATALOG).expect("scenario catalog must be valid")
}

/// Apply sink that keeps a copy of every applied selection
#[derive(Debug, Default)]
pub struct Recorder {
    pub applied: Vec<Selection>,
}

impl Recorder {
    pub fn count(&self) -> usize {
        self.applied.len()
    }

    pub fn last(&self) -> Option<&Selection> {
        self.applied.last()
    }
}

impl ApplySink for Recorder {
    fn apply_parameters(&mut self, selection: &Selection) {
        self.applied.push(selection.clone());
    }
}

pub fn selection(acodec: &str, aencoder: &str) -> Selection {
    Selection {
        acodec: acodec.to_string(),
        aencoder: aencoder.to_string(),
        ..Selection::default()
    }
}

pub fn recording_form(catalog: &Catalog, selection: Selection) -> AudioForm<'_, Recorder> {
    AudioForm::new(catalog, selection, Recorder::default())
}

/// Pick a codec and then an encoder, the way the panel is driven
pub fn choose(form: &mut AudioForm<'_, Recorder>, acodec: &str, aencoder: &str) {
    form.on_selection_changed(Edit::Codec(acodec.to_string()));
    form.on_selection_changed(Edit::Encoder(aencoder.to_string()));
}
