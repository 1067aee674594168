// ffmpeg audio argument derivation

use tracing::debug;

use crate::catalog::Catalog;
use crate::form::ApplySink;
use crate::resolver::{
    AudioMode, derive_encoders, find_encoder, reset_value, resolve_rate_control_slider,
};
use crate::selection::Selection;

/// Build the audio part of an ffmpeg command line for a selection.
///
/// Detail entries of other encoders are ignored; a detail the selection has
/// no value for yet contributes its reset value. A rate-control id the encoder
/// does not offer contributes the encoder's first mode, matching what the
/// panel shows after its correction.
pub fn audio_args(catalog: &Catalog, selection: &Selection) -> Vec<String> {
    let mode = AudioMode::of(&selection.acodec);
    let mut args: Vec<String> = Vec::new();

    match mode {
        AudioMode::Disabled => args.push("-an".to_string()),
        AudioMode::PassThrough => {
            args.push("-c:a".to_string());
            args.push("copy".to_string());
        }
        AudioMode::Auto => {}
        AudioMode::Configured => {
            let encoders = derive_encoders(catalog, &selection.acodec);
            if let Some(encoder) = find_encoder(encoders, &selection.aencoder) {
                args.push("-c:a".to_string());
                args.push(encoder.ffmpeg_name().to_string());

                if let Some(resolved) =
                    resolve_rate_control_slider(&encoder.ratecontrol, &selection.ratecontrol)
                {
                    let slider = resolved.spec.slider;
                    args.push(resolved.spec.flag.to_string());
                    args.push(slider.value_to_param(slider.value_process(selection.ratevalue)));
                }

                for parameter in &encoder.parameters {
                    let value = selection
                        .detail(&parameter.parameter)
                        .cloned()
                        .or_else(|| reset_value(parameter));
                    if let Some(value) = value {
                        args.push(parameter.flag.clone());
                        args.push(parameter.value_to_param(&value));
                    }
                }
            }
        }
    }

    if mode.reencodes() {
        // saved selections may hold positions between slider steps
        let volume = catalog.volume();
        let position = volume.slider.value_process(selection.vol);
        if (position - volume.neutral).abs() > f64::EPSILON {
            args.push("-af".to_string());
            args.push(format!(
                "{}={}",
                volume.filter,
                volume.slider.value_to_param(position)
            ));
        }
    }

    apply_custom_args(&mut args, &selection.custom);
    args
}

/// Append user-provided arguments with shell-style splitting so quoted
/// values keep their spaces.
fn apply_custom_args(args: &mut Vec<String>, custom: &str) {
    if custom.trim().is_empty() {
        return;
    }

    if let Some(split) = shlex::split(custom) {
        args.extend(split);
    } else {
        // Unbalanced quotes: fall back to whitespace splitting
        args.extend(custom.split_whitespace().map(str::to_string));
    }
}

/// Render arguments as a copy-pasteable shell fragment
pub fn to_command_line(args: &[String]) -> String {
    shlex::try_join(args.iter().map(String::as_str)).unwrap_or_else(|_| args.join(" "))
}

/// Apply sink that re-derives the ffmpeg arguments on every apply
pub struct ArgsPreview<'c> {
    catalog: &'c Catalog,
    args: Vec<String>,
    applies: usize,
}

impl<'c> ArgsPreview<'c> {
    pub fn new(catalog: &'c Catalog) -> Self {
        Self {
            catalog,
            args: Vec::new(),
            applies: 0,
        }
    }

    /// Arguments derived at the most recent apply
    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn applies(&self) -> usize {
        self.applies
    }
}

impl ApplySink for ArgsPreview<'_> {
    fn apply_parameters(&mut self, selection: &Selection) {
        self.args = audio_args(self.catalog, selection);
        self.applies += 1;
        debug!("Apply #{}: {}", self.applies, to_command_line(&self.args));
    }
}
