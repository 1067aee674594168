use std::collections::HashSet;
use std::fs;

const CATALOG_PATH: &str = "src/catalog/acodecs.toml";
const RESERVED_CODECS: [&str; 3] = ["禁用音频", "自动", "不重新编码"];
const RATE_CONTROL_KINDS: [&str; 2] = ["CBR/ABR", "Q"];

fn main() {
    // Tell Cargo to rerun if the built-in catalog changes
    println!("cargo:rerun-if-changed={}", CATALOG_PATH);

    let toml_content = fs::read_to_string(CATALOG_PATH).expect("Failed to read acodecs.toml");
    let catalog: toml::Value = toml::from_str(&toml_content).expect("Failed to parse acodecs.toml");

    validate_catalog(&catalog);
}

/// Validate the built-in catalog structure at build time
pub(crate) fn validate_catalog(catalog: &toml::Value) {
    let volume = catalog
        .get("volume")
        .and_then(|v| v.as_table())
        .expect("Catalog must have [volume] section");
    validate_slider(volume.get("slider"), "volume");
    if let Some(neutral) = volume.get("neutral") {
        validate_position(neutral, "volume neutral");
    }

    let codecs = catalog
        .get("codecs")
        .and_then(|c| c.as_array())
        .expect("Catalog must have [[codecs]] array");

    assert!(!codecs.is_empty(), "Must have at least one codec defined");

    let mut codec_ids = HashSet::new();
    let mut total_encoders = 0;
    let mut total_params = 0;

    for codec in codecs {
        let codec_table = codec.as_table().expect("Codec must be a table");

        let id = codec_table
            .get("id")
            .and_then(|v| v.as_str())
            .expect("Codec must have 'id' field");

        assert!(
            !RESERVED_CODECS.contains(&id),
            "Codec id '{}' is reserved for a built-in selection",
            id
        );
        assert!(codec_ids.insert(id), "Duplicate codec ID: {}", id);

        let encoders = codec_table
            .get("encoders")
            .and_then(|e| e.as_array())
            .unwrap_or_else(|| panic!("Codec '{}' has no encoders defined", id));

        let mut encoder_ids = HashSet::new();
        for encoder in encoders {
            let encoder_table = encoder
                .as_table()
                .unwrap_or_else(|| panic!("Encoder in codec '{}' must be a table", id));

            let encoder_id = encoder_table
                .get("id")
                .and_then(|v| v.as_str())
                .unwrap_or_else(|| panic!("Encoder in codec '{}' must have 'id' field", id));

            assert!(
                encoder_ids.insert(encoder_id),
                "Duplicate encoder '{}' in codec '{}'",
                encoder_id,
                id
            );

            let owner = format!("{}/{}", id, encoder_id);

            if let Some(modes) = encoder_table.get("ratecontrol").and_then(|r| r.as_array()) {
                let mut mode_ids = HashSet::new();
                for mode in modes {
                    let mode_id = mode
                        .get("id")
                        .and_then(|v| v.as_str())
                        .unwrap_or_else(|| panic!("Rate control in '{}' must have 'id'", owner));

                    assert!(
                        RATE_CONTROL_KINDS.contains(&mode_id),
                        "Unknown rate control '{}' in '{}' (expected CBR/ABR or Q)",
                        mode_id,
                        owner
                    );
                    assert!(
                        mode_ids.insert(mode_id),
                        "Duplicate rate control '{}' in '{}'",
                        mode_id,
                        owner
                    );
                    validate_flag(mode.get("flag"), &format!("{} {}", owner, mode_id));
                    validate_slider(mode.get("slider"), &format!("{} {}", owner, mode_id));
                }
            }

            if let Some(params) = encoder_table.get("parameters").and_then(|p| p.as_array()) {
                let mut param_ids = HashSet::new();
                for param in params {
                    let param_id = param
                        .get("parameter")
                        .and_then(|v| v.as_str())
                        .unwrap_or_else(|| panic!("Parameter in '{}' must have 'parameter'", owner));

                    assert!(
                        param_ids.insert(param_id),
                        "Duplicate parameter '{}' in '{}'",
                        param_id,
                        owner
                    );

                    let name = format!("{} {}", owner, param_id);
                    validate_flag(param.get("flag"), &name);

                    match param.get("mode").and_then(|v| v.as_str()) {
                        Some("slider") => {
                            validate_slider(param.get("slider"), &name);
                            if let Some(default) = param.get("default") {
                                validate_position(default, &format!("{} default", name));
                            }
                        }
                        Some("combo") => {
                            let items = param
                                .get("items")
                                .and_then(|i| i.as_array())
                                .unwrap_or_else(|| panic!("Combo '{}' must have items", name));
                            assert!(!items.is_empty(), "Combo '{}' has no items", name);

                            if let Some(default) = param.get("default") {
                                let default = default
                                    .as_str()
                                    .unwrap_or_else(|| panic!("Combo '{}' default must be a string", name));
                                assert!(
                                    items
                                        .iter()
                                        .any(|item| item.get("value").and_then(|v| v.as_str()) == Some(default)),
                                    "Combo '{}' default '{}' is not one of its items",
                                    name,
                                    default
                                );
                            }
                        }
                        other => panic!("Parameter '{}' has unknown mode {:?}", name, other),
                    }

                    total_params += 1;
                }
            }

            total_encoders += 1;
        }
    }

    println!(
        "cargo:warning=Catalog validation passed: {} codecs, {} encoders, {} parameter definitions",
        codec_ids.len(),
        total_encoders,
        total_params
    );
}

fn validate_flag(flag: Option<&toml::Value>, name: &str) {
    let flag = flag
        .and_then(|v| v.as_str())
        .unwrap_or_else(|| panic!("'{}' missing 'flag' field", name));
    assert!(
        flag.starts_with('-'),
        "Flag '{}' for '{}' must start with '-'",
        flag,
        name
    );
}

fn validate_slider(slider: Option<&toml::Value>, name: &str) {
    let slider = slider
        .and_then(|s| s.as_table())
        .unwrap_or_else(|| panic!("'{}' must have a slider table", name));

    let step = slider
        .get("step")
        .and_then(number)
        .unwrap_or_else(|| panic!("Slider of '{}' must have a numeric 'step'", name));
    assert!(step > 0.0 && step <= 1.0, "Slider of '{}' has invalid step {}", name, step);

    let scale = slider
        .get("scale")
        .and_then(|s| s.as_table())
        .unwrap_or_else(|| panic!("Slider of '{}' must have a scale", name));

    match scale.get("kind").and_then(|v| v.as_str()) {
        Some("linear") => {
            let min = scale.get("min").and_then(number);
            let max = scale.get("max").and_then(number);
            if let (Some(min), Some(max)) = (min, max) {
                assert!(min < max, "Slider of '{}' has invalid range: min ({}) >= max ({})", name, min, max);
            } else {
                panic!("Linear slider of '{}' needs numeric min and max", name);
            }
        }
        Some("stepped") => {
            let values = scale
                .get("values")
                .and_then(|v| v.as_array())
                .unwrap_or_else(|| panic!("Stepped slider of '{}' needs values", name));
            assert!(!values.is_empty(), "Stepped slider of '{}' has no values", name);
        }
        other => panic!("Slider of '{}' has unknown scale kind {:?}", name, other),
    }

    if let Some(tags) = slider.get("tags").and_then(|t| t.as_array()) {
        for tag in tags {
            let at = tag
                .get("at")
                .unwrap_or_else(|| panic!("Tag of '{}' must have 'at'", name));
            validate_position(at, &format!("{} tag", name));
        }
    }
}

/// Slider positions are normalized to 0..1
fn validate_position(value: &toml::Value, name: &str) {
    let position = number(value).unwrap_or_else(|| panic!("'{}' must be a number", name));
    assert!(
        (0.0..=1.0).contains(&position),
        "'{}' position {} is outside 0..1",
        name,
        position
    );
}

fn number(value: &toml::Value) -> Option<f64> {
    value.as_float().or_else(|| value.as_integer().map(|i| i as f64))
}
