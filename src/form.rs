//! The audio parameter panel.
//!
//! `AudioForm` is the caller side of the resolver: it owns the selection,
//! persists the corrections the resolver reports, runs the reset cascade after
//! codec or encoder edits, and signals the apply sink after every write. It
//! also produces the list of visible controls (the widget contract a front end
//! renders).

use serde::Serialize;
use tracing::debug;

use crate::catalog::{Catalog, DetailParameter, ParameterControl, SliderFields, Tag};
use crate::resolver::{
    self, AudioMode, ENCODER_AUTO, SliderSpec, derive_detail_parameters, derive_encoders,
    derive_rate_control_modes, find_encoder, resolve_rate_control_slider,
};
use crate::selection::{DetailValue, Edit, EditError, Field, NEUTRAL_POSITION, Selection};

/// Receiver of the "apply" signal: re-derive whatever depends on the selection
pub trait ApplySink {
    fn apply_parameters(&mut self, selection: &Selection);
}

impl<F: FnMut(&Selection)> ApplySink for F {
    fn apply_parameters(&mut self, selection: &Selection) {
        self(selection)
    }
}

/// What a control writes to when it changes
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "name", rename_all = "snake_case")]
pub enum ControlTarget {
    Field(Field),
    Detail(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComboOption {
    pub value: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "widget", rename_all = "snake_case")]
pub enum Widget {
    Combo {
        value: String,
        options: Vec<ComboOption>,
    },
    Slider {
        position: f64,
        text: String,
        step: f64,
        tags: Vec<Tag>,
    },
    Input {
        value: String,
    },
}

/// One visible control: label, current value, choices, and where edits go
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Control {
    pub label: String,
    pub target: ControlTarget,
    #[serde(flatten)]
    pub widget: Widget,
}

pub struct AudioForm<'c, S> {
    catalog: &'c Catalog,
    selection: Selection,
    sink: S,
}

impl<'c, S: ApplySink> AudioForm<'c, S> {
    pub fn new(catalog: &'c Catalog, selection: Selection, sink: S) -> Self {
        Self {
            catalog,
            selection,
            sink,
        }
    }

    pub fn catalog(&self) -> &'c Catalog {
        self.catalog
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_parts(self) -> (Selection, S) {
        (self.selection, self.sink)
    }

    fn apply(&mut self) {
        self.sink.apply_parameters(&self.selection);
    }

    /// Detail parameters of the selected encoder
    pub fn parameters(&self) -> &'c [DetailParameter] {
        let encoders = derive_encoders(self.catalog, &self.selection.acodec);
        derive_detail_parameters(encoders, &self.selection.aencoder)
    }

    /// Write a top-level field and apply.
    ///
    /// A codec edit is written and applied twice; the second pass also puts
    /// the encoder back to `自动` when it does not belong to the new codec.
    /// Codec and encoder edits then reset every detail parameter of the
    /// newly derived list, applying after each reset.
    pub fn on_selection_changed(&mut self, edit: Edit) {
        let edit = self.snap(edit);
        self.selection.write(&edit);
        self.apply();

        if edit.field() == Field::Acodec {
            self.selection.write(&edit);
            let encoders = derive_encoders(self.catalog, &self.selection.acodec);
            if find_encoder(encoders, &self.selection.aencoder).is_none() {
                debug!(
                    "Encoder '{}' not offered by '{}', restoring {}",
                    self.selection.aencoder, self.selection.acodec, ENCODER_AUTO
                );
                self.selection.aencoder = ENCODER_AUTO.to_string();
            }
            self.apply();
        }

        if edit.field().triggers_cascade() {
            self.cascade();
        }
    }

    /// Slider edits are stored at the position the slider shows
    fn snap(&self, edit: Edit) -> Edit {
        match edit {
            Edit::RateValue(position) => {
                let encoders = derive_encoders(self.catalog, &self.selection.acodec);
                let modes = derive_rate_control_modes(encoders, &self.selection.aencoder);
                match resolve_rate_control_slider(modes, &self.selection.ratecontrol) {
                    Some(resolved) => Edit::RateValue(resolved.spec.slider.value_process(position)),
                    None => Edit::RateValue(position),
                }
            }
            Edit::Volume(position) => {
                Edit::Volume(self.catalog.volume().slider.value_process(position))
            }
            other => other,
        }
    }

    fn cascade(&mut self) {
        for (parameter, value) in resolver::cascade_resets(self.parameters()) {
            debug!("Parameter {} reset to {}", parameter, value);
            self.selection.set_detail(parameter, value);
            self.apply();
        }
    }

    pub fn on_detail_changed(&mut self, parameter: &str, value: DetailValue) {
        self.selection.set_detail(parameter, value);
        self.apply();
    }

    /// Route a textual edit from a rendered control
    pub fn change(&mut self, target: &ControlTarget, value: &str) -> Result<(), EditError> {
        match target {
            ControlTarget::Field(field) => {
                let edit = Edit::parse(field.name(), value)?;
                self.on_selection_changed(edit);
            }
            ControlTarget::Detail(parameter) => {
                let value = self.parse_detail(parameter, value)?;
                self.on_detail_changed(parameter, value);
            }
        }
        Ok(())
    }

    fn parse_detail(&self, parameter: &str, value: &str) -> Result<DetailValue, EditError> {
        let slider = self
            .parameters()
            .iter()
            .find(|p| p.parameter == parameter)
            .and_then(|p| match &p.control {
                ParameterControl::Slider { slider, .. } => Some(slider),
                ParameterControl::Combo { .. } => None,
            });

        let Some(slider) = slider else {
            return Ok(DetailValue::from(value));
        };

        // plain numbers are slider positions, anything else is display text
        match value.trim().parse::<f64>() {
            Ok(n) if n.is_finite() => Ok(DetailValue::Number(slider.value_process(n))),
            _ => slider
                .string_to_number(value)
                .map(DetailValue::Number)
                .ok_or_else(|| EditError::InvalidDetail {
                    parameter: parameter.to_string(),
                    value: value.to_string(),
                }),
        }
    }

    /// Resolve the rate-control slider, persisting and applying a fallback
    /// before returning it
    pub fn rate_control_slider(&mut self) -> Option<SliderSpec<'c>> {
        let encoders = derive_encoders(self.catalog, &self.selection.acodec);
        let modes = derive_rate_control_modes(encoders, &self.selection.aencoder);
        let resolved = resolve_rate_control_slider(modes, &self.selection.ratecontrol)?;

        if let Some(correction) = &resolved.correction {
            debug!(
                "Correcting rate control '{}' -> '{}'",
                correction.stale, correction.corrected
            );
            correction.apply(&mut self.selection);
            self.apply();
        }

        Some(resolved.spec)
    }

    /// Visible controls in render order
    pub fn controls(&mut self) -> Vec<Control> {
        let slider = self.rate_control_slider();
        let mode = AudioMode::of(&self.selection.acodec);
        let mut controls = vec![self.codec_control()];

        if mode.reencodes() {
            let encoders = derive_encoders(self.catalog, &self.selection.acodec);

            if mode.shows_encoder() {
                controls.push(Control {
                    label: "编码器".to_string(),
                    target: ControlTarget::Field(Field::Aencoder),
                    widget: Widget::Combo {
                        value: self.selection.aencoder.clone(),
                        options: encoders
                            .iter()
                            .map(|e| ComboOption {
                                value: e.id.clone(),
                                label: e.id.clone(),
                            })
                            .collect(),
                    },
                });
            }

            let modes = derive_rate_control_modes(encoders, &self.selection.aencoder);
            controls.push(Control {
                label: "码率控制".to_string(),
                target: ControlTarget::Field(Field::Ratecontrol),
                widget: Widget::Combo {
                    value: self.selection.ratecontrol.clone(),
                    options: modes
                        .iter()
                        .map(|m| ComboOption {
                            value: m.id.id().to_string(),
                            label: m.id.id().to_string(),
                        })
                        .collect(),
                },
            });

            if let Some(spec) = slider {
                controls.push(Control {
                    label: spec.display.to_string(),
                    target: ControlTarget::Field(Field::Ratevalue),
                    widget: slider_widget(spec.slider, self.selection.ratevalue),
                });
            }

            for parameter in self.parameters() {
                controls.push(self.parameter_control(parameter));
            }

            let volume = self.catalog.volume();
            controls.push(Control {
                label: "音量".to_string(),
                target: ControlTarget::Field(Field::Vol),
                widget: slider_widget(&volume.slider, self.selection.vol),
            });
        }

        controls.push(Control {
            label: "自定义参数".to_string(),
            target: ControlTarget::Field(Field::Custom),
            widget: Widget::Input {
                value: self.selection.custom.clone(),
            },
        });

        controls
    }

    fn codec_control(&self) -> Control {
        let options = AudioMode::SENTINELS
            .iter()
            .map(|id| id.to_string())
            .chain(self.catalog.codecs().iter().map(|c| c.id.clone()))
            .map(|id| ComboOption {
                label: id.clone(),
                value: id,
            })
            .collect();

        Control {
            label: "音频编码".to_string(),
            target: ControlTarget::Field(Field::Acodec),
            widget: Widget::Combo {
                value: self.selection.acodec.clone(),
                options,
            },
        }
    }

    fn parameter_control(&self, parameter: &DetailParameter) -> Control {
        let stored = self.selection.detail(&parameter.parameter);
        let widget = match &parameter.control {
            ParameterControl::Slider { slider, default } => {
                let position = match stored {
                    Some(DetailValue::Number(n)) => *n,
                    Some(DetailValue::Text(t)) => slider
                        .string_to_number(t)
                        .unwrap_or(NEUTRAL_POSITION),
                    None => default.unwrap_or(NEUTRAL_POSITION),
                };
                slider_widget(slider, position)
            }
            ParameterControl::Combo { items, .. } => Widget::Combo {
                value: stored
                    .map(|v| v.to_string())
                    .or_else(|| resolver::reset_value(parameter).map(|v| v.to_string()))
                    .unwrap_or_default(),
                options: items
                    .iter()
                    .map(|item| ComboOption {
                        value: item.value.clone(),
                        label: item.label().to_string(),
                    })
                    .collect(),
            },
        };

        Control {
            label: parameter.display.clone(),
            target: ControlTarget::Detail(parameter.parameter.clone()),
            widget,
        }
    }
}

fn slider_widget(slider: &SliderFields, position: f64) -> Widget {
    let position = slider.value_process(position);
    Widget::Slider {
        position,
        text: slider.value_to_text(position),
        step: slider.step,
        tags: slider.tags.clone(),
    }
}
