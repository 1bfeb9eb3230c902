use crate::domain::form::Preset;
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub form: FormSettings,
    #[serde(default)]
    pub export: ExportSettings,
    #[serde(default)]
    pub clipboard: ClipboardSettings,
    #[serde(default = "default_presets")]
    pub presets: Vec<Preset>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    #[serde(default = "default_bind")]
    pub bind: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct FormSettings {
    #[serde(default = "default_system_id")]
    pub default_system_id: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ExportSettings {
    #[serde(default = "default_staging_dir")]
    pub staging_dir: PathBuf,
    #[serde(default = "default_filename_template")]
    pub filename_template: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ClipboardSettings {
    /// Programs tried in order; each is `[program, args...]` and reads the text on stdin
    #[serde(default = "default_clipboard_commands")]
    pub commands: Vec<Vec<String>>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

impl Default for FormSettings {
    fn default() -> Self {
        Self {
            default_system_id: default_system_id(),
        }
    }
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            staging_dir: default_staging_dir(),
            filename_template: default_filename_template(),
        }
    }
}

impl Default for ClipboardSettings {
    fn default() -> Self {
        Self {
            commands: default_clipboard_commands(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:8080".to_string()
}

fn default_system_id() -> String {
    "1".to_string()
}

fn default_staging_dir() -> PathBuf {
    std::env::temp_dir().join("setpoint-exporter")
}

fn default_filename_template() -> String {
    "calibration_setpoints_system_${system_id}.json".to_string()
}

fn default_clipboard_commands() -> Vec<Vec<String>> {
    [
        vec!["wl-copy"],
        vec!["xclip", "-selection", "clipboard"],
        vec!["pbcopy"],
    ]
    .into_iter()
    .map(|command| command.into_iter().map(String::from).collect())
    .collect()
}

fn default_presets() -> Vec<Preset> {
    let preset = |name: &str, temperature: &str, humidities: &[&str]| Preset {
        name: name.to_string(),
        temperature: temperature.to_string(),
        humidities: humidities.iter().map(|h| h.to_string()).collect(),
    };
    vec![
        preset("cold", "-95.0", &[]),
        preset("freezing", "0.0", &[]),
        preset("ambient", "25.0", &["50.0"]),
        preset("damp_heat", "40.0", &["33.0", "80.0"]),
    ]
}

/// Load `config/calibrator.{toml,yaml,json}` if present, overridden by
/// `CALIBRATOR__SECTION__KEY` environment variables.
pub fn load_app_config() -> anyhow::Result<AppConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/calibrator").required(false))
        .add_source(config::Environment::with_prefix("CALIBRATOR").separator("__"))
        .build()?;

    Ok(settings.try_deserialize()?)
}

/// Placeholder in `export.filename_template` for the form's system id
pub const SYSTEM_ID_PLACEHOLDER: &str = "${system_id}";

/// Download filename for a system id. A blank id leaves `unset` in its place
/// so the name never ends up with a dangling separator.
pub fn export_filename(template: &str, system_id: &str) -> String {
    let system_id = if system_id.is_empty() { "unset" } else { system_id };
    template.replace(SYSTEM_ID_PLACEHOLDER, system_id)
}
