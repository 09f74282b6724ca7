use std::path::Path;

use json::JsonValue;

use crate::error::{GreenStrainError, GreenStrainResult};

/// Settings file looked up in the working directory
pub const SETTINGS_FILE: &str = "greenstrain.json";

pub const DEFAULT_SOURCE_FIELD: &str = "NE";
pub const DEFAULT_TARGET_FIELD: &str = "GE";
pub const DEFAULT_DESCRIPTION: &str = "Green strain components";

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Name of the Nominal strain field output to read
    pub source_field: String,
    /// Name of the Green strain field output to write
    pub target_field: String,
    /// Description attached to the written field output
    pub description: String,
    /// Carry local coordinate systems from the source values
    pub local_coord_system: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            source_field: DEFAULT_SOURCE_FIELD.to_owned(),
            target_field: DEFAULT_TARGET_FIELD.to_owned(),
            description: DEFAULT_DESCRIPTION.to_owned(),
            local_coord_system: true,
        }
    }
}

impl Settings {
    /// Loads settings from [SETTINGS_FILE] in the working directory, falling
    /// back to defaults when there is none
    pub fn discover() -> GreenStrainResult<Settings> {
        Settings::discover_in(Path::new("."))
    }

    /// Loads settings from [SETTINGS_FILE] inside `dir`, falling back to defaults
    pub fn discover_in(dir: &Path) -> GreenStrainResult<Settings> {
        let path = dir.join(SETTINGS_FILE);
        if path.is_file() {
            log::info!("loading settings from {}", path.display());
            Settings::load(&path)
        } else {
            Ok(Settings::default())
        }
    }

    /// Parses a settings file
    ///
    /// # Arguments
    /// * `path` - The path to the settings json
    pub fn load(path: &Path) -> GreenStrainResult<Settings> {
        let file_string = match std::fs::read_to_string(path) {
            Ok(f) => f,
            Err(err) => {
                return Err(GreenStrainError::Input(format!(
                    "Unable to open settings file {}: {err}",
                    path.display()
                )))
            }
        };

        let settings_json = match json::parse(&file_string) {
            Ok(j) => j,
            Err(err) => {
                return Err(GreenStrainError::Input(format!(
                    "Error in settings file json: {err}"
                )))
            }
        };

        Settings::from_json(&settings_json)
    }

    fn from_json(settings_json: &JsonValue) -> GreenStrainResult<Settings> {
        if !settings_json.is_object() {
            return Err(GreenStrainError::Input(
                "Settings json must be an object".to_owned(),
            ));
        }

        let mut settings = Settings::default();

        if let Some(source_field) = read_string(settings_json, "source_field")? {
            settings.source_field = source_field;
        }
        if let Some(target_field) = read_string(settings_json, "target_field")? {
            settings.target_field = target_field;
        }
        if let Some(description) = read_string(settings_json, "description")? {
            settings.description = description;
        }
        if settings_json.has_key("local_coord_system") {
            settings.local_coord_system = match settings_json["local_coord_system"].as_bool() {
                Some(b) => b,
                None => {
                    return Err(GreenStrainError::Input(
                        "Settings field local_coord_system must be a boolean".to_owned(),
                    ))
                }
            };
        }

        for (name, value) in settings_json.entries() {
            if !["source_field", "target_field", "description", "local_coord_system"]
                .contains(&name)
            {
                log::warn!("ignoring unknown settings field {name} = {value}");
            }
        }

        if settings.source_field == settings.target_field {
            return Err(GreenStrainError::Input(format!(
                "Settings source_field and target_field are both {}",
                settings.source_field
            )));
        }

        Ok(settings)
    }
}

fn read_string(settings_json: &JsonValue, key: &str) -> GreenStrainResult<Option<String>> {
    if !settings_json.has_key(key) {
        return Ok(None);
    }

    match settings_json[key].as_str() {
        Some(s) if !s.trim().is_empty() => Ok(Some(s.trim().to_owned())),
        _ => Err(GreenStrainError::Input(format!(
            "Settings field {key} must be a non-empty string"
        ))),
    }
}
