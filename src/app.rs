use crate::cli::{Cli, Commands};
use anyhow::{Context, Result};
use audioparams::catalog::{Catalog, ParameterControl};
use audioparams::command::{self, ArgsPreview};
use audioparams::config::Config;
use audioparams::form::{AudioForm, Control, ControlTarget, Widget};
use audioparams::logging;
use audioparams::selection::{Edit, Selection};
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use std::process;
use tracing::info;

struct Session {
    catalog: Cow<'static, Catalog>,
    state_path: PathBuf,
    prune_orphans: bool,
}

impl Session {
    fn open(cli: &Cli, config: &Config) -> Result<Self> {
        let catalog = match &cli.catalog {
            Some(path) => Cow::Owned(
                Catalog::load(path)
                    .with_context(|| format!("Failed to load catalog: {}", path.display()))?,
            ),
            None => config.catalog()?,
        };
        let state_path = match &cli.state {
            Some(path) => path.clone(),
            None => config.state_file()?,
        };

        Ok(Self {
            catalog,
            state_path,
            prune_orphans: config.session.prune_orphans,
        })
    }

    fn form(&self) -> Result<AudioForm<'_, ArgsPreview<'_>>> {
        let selection = Selection::load(&self.state_path).with_context(|| {
            format!("Failed to load selection: {}", self.state_path.display())
        })?;
        Ok(AudioForm::new(&self.catalog, selection, ArgsPreview::new(&self.catalog)))
    }

    /// Persist the selection if anything was applied. Returns the report
    /// line for the caller to print.
    fn finish(&self, form: AudioForm<'_, ArgsPreview<'_>>) -> Result<Option<String>> {
        let parameters = form.parameters();
        let (mut selection, preview) = form.into_parts();
        if preview.applies() == 0 {
            return Ok(None);
        }

        if self.prune_orphans {
            let removed = selection.prune_details(parameters);
            if removed > 0 {
                info!("Pruned {} detail value(s) of other encoders", removed);
            }
        }

        selection.save(&self.state_path).with_context(|| {
            format!("Failed to save selection: {}", self.state_path.display())
        })?;
        Ok(Some(format!(
            "Applied {} time(s): {}",
            preview.applies(),
            command::to_command_line(preview.args())
        )))
    }
}

pub fn run(cli: Cli) {
    if let Commands::InitConfig = cli.command {
        handle_init_config();
        return;
    }

    let config = Config::load().unwrap_or_default();
    let level = if cli.verbose {
        "debug"
    } else {
        config.logging.level.as_str()
    };
    logging::init(level);

    let result = Session::open(&cli, &config).and_then(|session| match cli.command {
        Commands::Codecs => handle_codecs(&session.catalog),
        Commands::Show { json } => handle_show(&session, json),
        Commands::Set { field, value } => handle_set(&session, &field, &value),
        Commands::Detail { parameter, value } => handle_detail(&session, &parameter, &value),
        Commands::Args => handle_args(&session),
        Commands::Reset => handle_reset(&session.state_path),
        Commands::InitConfig => Ok(()),
    });

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

fn handle_codecs(catalog: &Catalog) -> Result<()> {
    for codec in catalog.codecs() {
        println!("{}", codec.id);
        for encoder in &codec.encoders {
            println!("  {} (-c:a {})", encoder.id, encoder.ffmpeg_name());
            for mode in &encoder.ratecontrol {
                println!("    rate control {} [{}] {}", mode.id, mode.id.display(), mode.flag);
            }
            for parameter in &encoder.parameters {
                match &parameter.control {
                    ParameterControl::Slider { slider, default } => println!(
                        "    {} {} slider, default {}",
                        parameter.parameter,
                        parameter.flag,
                        slider.value_to_text(default.unwrap_or(0.5))
                    ),
                    ParameterControl::Combo { items, .. } => println!(
                        "    {} {} combo: {}",
                        parameter.parameter,
                        parameter.flag,
                        items
                            .iter()
                            .map(|item| item.value.as_str())
                            .collect::<Vec<_>>()
                            .join(" | ")
                    ),
                }
            }
        }
    }
    Ok(())
}

fn handle_show(session: &Session, json: bool) -> Result<()> {
    print!("{}", show(session, json)?);
    Ok(())
}

/// Render the visible controls. A rate-control correction made while
/// resolving is saved but only logged, so `--json` output stays parseable.
fn show(session: &Session, json: bool) -> Result<String> {
    let mut form = session.form()?;
    let controls = form.controls();

    let mut out = String::new();
    if json {
        let json = serde_json::to_string_pretty(&controls).context("Failed to serialize controls")?;
        out.push_str(&json);
        out.push('\n');
    } else {
        for control in &controls {
            out.push_str(&render_control(control));
            out.push('\n');
        }
    }

    if let Some(report) = session.finish(form)? {
        info!("{}", report);
    }
    Ok(out)
}

fn handle_set(session: &Session, field: &str, value: &str) -> Result<()> {
    let edit = Edit::parse(field, value)?;
    let mut form = session.form()?;
    form.on_selection_changed(edit);
    form.rate_control_slider();
    report(session.finish(form)?);
    Ok(())
}

fn handle_detail(session: &Session, parameter: &str, value: &str) -> Result<()> {
    let mut form = session.form()?;
    if !form.parameters().iter().any(|p| p.parameter == parameter) {
        anyhow::bail!(
            "Parameter '{}' does not belong to encoder '{}'",
            parameter,
            form.selection().aencoder
        );
    }
    form.change(&ControlTarget::Detail(parameter.to_string()), value)?;
    report(session.finish(form)?);
    Ok(())
}

fn report(line: Option<String>) {
    if let Some(line) = line {
        println!("{}", line);
    }
}

fn handle_args(session: &Session) -> Result<()> {
    let form = session.form()?;
    let args = command::audio_args(form.catalog(), form.selection());
    println!("{}", command::to_command_line(&args));
    Ok(())
}

fn handle_reset(state_path: &Path) -> Result<()> {
    Selection::default()
        .save(state_path)
        .with_context(|| format!("Failed to save selection: {}", state_path.display()))?;
    println!("Selection reset ({})", state_path.display());
    Ok(())
}

fn handle_init_config() {
    match Config::load() {
        Ok(cfg) => {
            match Config::config_path() {
                Ok(path) => println!("Config loaded successfully from {}", path.display()),
                Err(e) => println!("Config loaded, but config path unknown: {:#}", e),
            }
            println!("{:#?}", cfg);
        }
        Err(e) => {
            println!("Config missing or invalid: {:#}", e);
            println!("Creating default config...");

            let cfg = Config::default();
            if let Err(err) = cfg.save() {
                eprintln!("Failed to save default config: {:#}", err);
                process::exit(1);
            } else {
                match Config::config_path() {
                    Ok(path) => println!("Default config saved to {}", path.display()),
                    Err(e) => println!("Default config saved (path unknown): {:#}", e),
                }
            }
        }
    }
}

fn render_control(control: &Control) -> String {
    match &control.widget {
        Widget::Combo { value, options } => {
            let choices = options
                .iter()
                .map(|o| {
                    if &o.value == value {
                        format!("*{}", o.label)
                    } else {
                        o.label.clone()
                    }
                })
                .collect::<Vec<_>>()
                .join(" | ");
            format!("{}: {}  [{}]", control.label, value, choices)
        }
        Widget::Slider {
            position, text, tags, ..
        } => {
            let marks = tags
                .iter()
                .map(|t| t.label.as_str())
                .collect::<Vec<_>>()
                .join(" ");
            if marks.is_empty() {
                format!("{}: {} ({:.3})", control.label, text, position)
            } else {
                format!("{}: {} ({:.3})  <{}>", control.label, text, position, marks)
            }
        }
        Widget::Input { value } => format!("{}: \"{}\"", control.label, value),
    }
}
