// Integration tests for the rendered control list
//
// These tests check which controls the panel shows for a selection, in what
// order, and what routing an edit through a control does.

use audioparams::catalog::Catalog;
use audioparams::command::audio_args;
use audioparams::form::{Control, ControlTarget, Widget};
use audioparams::selection::{DetailValue, Edit, Field};
use serde_json::json;

use crate::common::helpers::*;

fn labels(controls: &[Control]) -> Vec<&str> {
    controls.iter().map(|c| c.label.as_str()).collect()
}

fn find<'a>(controls: &'a [Control], label: &str) -> &'a Control {
    controls
        .iter()
        .find(|c| c.label == label)
        .unwrap_or_else(|| panic!("no control labelled {}", label))
}

#[test]
fn test_configured_encoder_render_order() {
    let mut form = recording_form(Catalog::builtin(), selection("自动", "自动"));
    choose(&mut form, "Opus", "libopus");

    let controls = form.controls();
    assert_eq!(
        labels(&controls),
        vec![
            "音频编码",
            "编码器",
            "码率控制",
            "码率",
            "VBR 模式",
            "应用场景",
            "压缩等级",
            "音量",
            "自定义参数",
        ]
    );
}

#[test]
fn test_codec_combo_lists_sentinels_first() {
    let mut form = recording_form(Catalog::builtin(), selection("自动", "自动"));
    let controls = form.controls();

    let Widget::Combo { value, options } = &controls[0].widget else {
        panic!("codec control must be a combo");
    };
    assert_eq!(value, "自动");
    let values: Vec<_> = options.iter().map(|o| o.value.as_str()).collect();
    assert_eq!(
        values,
        vec!["禁用音频", "自动", "不重新编码", "AAC", "Opus", "MP3", "Vorbis", "FLAC", "AC3"]
    );
}

#[test]
fn test_passthrough_shows_no_encoding_controls() {
    let mut form = recording_form(Catalog::builtin(), selection("不重新编码", "自动"));
    let controls = form.controls();
    assert_eq!(labels(&controls), vec!["音频编码", "自定义参数"]);
}

#[test]
fn test_rate_slider_text_and_label_follow_mode() {
    let mut form = recording_form(Catalog::builtin(), selection("自动", "自动"));
    choose(&mut form, "Vorbis", "libvorbis");

    let controls = form.controls();
    let Widget::Slider { text, .. } = &find(&controls, "码率").widget else {
        panic!("rate control must be a slider");
    };
    assert_eq!(text, "128 kbps");

    form.on_selection_changed(Edit::RateControl("Q".to_string()));
    let controls = form.controls();
    let slider = find(&controls, "质量参数");
    assert_eq!(slider.target, ControlTarget::Field(Field::Ratevalue));
    assert!(controls.iter().all(|c| c.label != "码率"));
}

#[test]
fn test_lossless_encoder_has_no_rate_slider() {
    let mut form = recording_form(Catalog::builtin(), selection("自动", "自动"));
    choose(&mut form, "FLAC", "flac");

    let controls = form.controls();
    assert_eq!(
        labels(&controls),
        vec!["音频编码", "编码器", "码率控制", "压缩等级", "音量", "自定义参数"]
    );

    let Widget::Combo { options, .. } = &find(&controls, "码率控制").widget else {
        panic!("rate control selector must be a combo");
    };
    assert!(options.is_empty());

    let Widget::Slider { text, .. } = &find(&controls, "压缩等级").widget else {
        panic!("compression level must be a slider");
    };
    assert_eq!(text, "5");
}

#[test]
fn test_combo_parameter_uses_display_labels() {
    let mut form = recording_form(Catalog::builtin(), selection("自动", "自动"));
    choose(&mut form, "AAC", "libfdk_aac");

    let controls = form.controls();
    let Widget::Combo { value, options } = &find(&controls, "配置").widget else {
        panic!("profile must be a combo");
    };
    assert_eq!(value, "aac_low");
    let shown: Vec<_> = options.iter().map(|o| o.label.as_str()).collect();
    assert_eq!(shown, vec!["LC", "HE-AAC", "HE-AAC v2"]);
}

#[test]
fn test_change_through_control_targets() {
    let mut form = recording_form(Catalog::builtin(), selection("自动", "自动"));
    choose(&mut form, "AAC", "aac");

    let controls = form.controls();
    let rate_control = find(&controls, "码率控制").target.clone();
    form.change(&rate_control, "Q").unwrap();
    assert_eq!(form.selection().ratecontrol, "Q");

    let coder = find(&controls, "编码算法").target.clone();
    form.change(&coder, "fast").unwrap();
    assert_eq!(form.selection().detail("aac_coder"), Some(&DetailValue::from("fast")));
}

#[test]
fn test_detail_slider_reads_numbers_as_positions() {
    let mut form = recording_form(Catalog::builtin(), selection("自动", "自动"));
    choose(&mut form, "Opus", "libopus");

    form.change(&ControlTarget::Detail("compression_level".to_string()), "7")
        .unwrap();
    // "7" is read as a slider position first, so it clamps to the top
    assert_eq!(
        form.selection().detail("compression_level"),
        Some(&DetailValue::Number(1.0))
    );

    form.change(
        &ControlTarget::Detail("compression_level".to_string()),
        "0.7",
    )
    .unwrap();
    let stored = form.selection().detail("compression_level").unwrap();
    assert!((stored.as_number().unwrap() - 0.7).abs() < 1e-9);
}

#[test]
fn test_controls_serialize_with_widget_tag() {
    let mut form = recording_form(Catalog::builtin(), selection("禁用音频", "自动"));
    let controls = form.controls();

    let custom = serde_json::to_value(&controls[1]).unwrap();
    assert_eq!(
        custom,
        json!({
            "label": "自定义参数",
            "target": { "kind": "field", "name": "custom" },
            "widget": "input",
            "value": ""
        })
    );

    let codec = serde_json::to_value(&controls[0]).unwrap();
    assert_eq!(codec["widget"], "combo");
    assert_eq!(codec["target"], json!({ "kind": "field", "name": "acodec" }));
    assert_eq!(codec["options"][0], json!({ "value": "禁用音频", "label": "禁用音频" }));
}

#[test]
fn test_showing_controls_persists_correction() {
    let mut stale = selection("Opus", "libopus");
    stale.ratecontrol = "Q".to_string();
    let mut form = recording_form(Catalog::builtin(), stale);

    let controls = form.controls();
    let Widget::Combo { value, .. } = &find(&controls, "码率控制").widget else {
        panic!("rate control selector must be a combo");
    };
    assert_eq!(value, "CBR/ABR");
    assert_eq!(form.sink().count(), 1);
}

#[test]
fn test_off_step_slider_edits_emit_what_is_shown() {
    let mut form = recording_form(Catalog::builtin(), selection("自动", "自动"));
    choose(&mut form, "AAC", "aac");
    form.on_selection_changed(Edit::RateControl("Q".to_string()));
    form.on_selection_changed(Edit::RateValue(0.285));
    form.on_selection_changed(Edit::Volume(0.51));

    let controls = form.controls();
    let Widget::Slider { text: quality, .. } = &find(&controls, "质量参数").widget else {
        panic!("quality must be a slider");
    };
    let Widget::Slider { text: volume, .. } = &find(&controls, "音量").widget else {
        panic!("volume must be a slider");
    };
    assert_eq!(volume, "0.0 dB");

    let args = audio_args(form.catalog(), form.selection());
    let flag = args.iter().position(|a| a == "-q:a").expect("-q:a emitted");
    assert_eq!(&args[flag + 1], quality);
    assert!(!args.iter().any(|a| a == "-af"), "neutral volume emitted: {:?}", args);
}
