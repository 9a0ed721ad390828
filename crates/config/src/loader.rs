use std::path::{Path, PathBuf};

use {
    secrecy::Secret,
    tracing::{debug, warn},
};

use crate::{
    env_subst::substitute_env,
    error::{Context, Error, Result},
    schema::ParleyConfig,
    validate::{Diagnostic, Severity, validate_config, validate_toml_str},
};

/// Standard config file names, checked in order.
const CONFIG_FILENAMES: &[&str] = &[
    "parley.toml",
    "parley.yaml",
    "parley.yml",
    "parley.json",
];

/// Load config from the given path (any supported format).
pub fn load_config(path: &Path) -> Result<ParleyConfig> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let raw = substitute_env(&raw);
    parse_config(&raw, path)
}

/// Discover and load config from standard locations.
///
/// Search order:
/// 1. `./parley.{toml,yaml,yml,json}` (project-local)
/// 2. `~/.config/parley/parley.{toml,yaml,yml,json}` (user-global)
///
/// Returns `ParleyConfig::default()` if no config file is found; a file that
/// exists but does not parse is an error.
pub fn discover_and_load() -> Result<ParleyConfig> {
    match find_config_file() {
        Some(path) => {
            debug!(path = %path.display(), "loading config");
            load_config(&path)
        },
        None => {
            debug!("no config file found, using defaults");
            Ok(ParleyConfig::default())
        },
    }
}

/// Load a config file and report unknown or misspelled keys.
///
/// Only TOML files are checked for unknown keys; other formats come back
/// with no warnings.
pub fn load_config_with_warnings(path: &Path) -> Result<(ParleyConfig, Vec<Diagnostic>)> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let raw = substitute_env(&raw);
    let warnings = match path.extension().and_then(|e| e.to_str()) {
        Some("toml") | None => validate_toml_str(&raw)
            .diagnostics
            .into_iter()
            .filter(|d| d.severity == Severity::Warning)
            .collect(),
        Some(_) => Vec::new(),
    };
    let config = parse_config(&raw, path)?;
    Ok((config, warnings))
}

/// Full startup pipeline: file (explicit or discovered), then environment
/// overrides, then validation. Unknown keys are logged; any validation error
/// is fatal.
pub fn load_resolved(path: Option<&Path>) -> Result<ParleyConfig> {
    let path = path.map(Path::to_path_buf).or_else(find_config_file);
    let mut config = match &path {
        Some(path) => {
            debug!(path = %path.display(), "loading config");
            let (config, warnings) = load_config_with_warnings(path)?;
            for diagnostic in &warnings {
                warn!(
                    file = %path.display(),
                    path = %diagnostic.path,
                    "{}",
                    diagnostic.message
                );
            }
            config
        },
        None => {
            debug!("no config file found, using defaults");
            ParleyConfig::default()
        },
    };
    apply_env_overrides(&mut config, |name| std::env::var(name).ok());

    let result = validate_config(&config);
    for diagnostic in &result.diagnostics {
        if diagnostic.severity == Severity::Warning {
            warn!(path = %diagnostic.path, "{}", diagnostic.message);
        }
    }
    if result.has_errors() {
        return Err(Error::Invalid(result));
    }
    Ok(config)
}

/// Find the first config file in standard locations.
pub fn find_config_file() -> Option<PathBuf> {
    for name in CONFIG_FILENAMES {
        let p = PathBuf::from(name);
        if p.exists() {
            return Some(p);
        }
    }

    let config_dir = config_dir()?;
    CONFIG_FILENAMES
        .iter()
        .map(|name| config_dir.join(name))
        .find(|p| p.exists())
}

/// Returns the user-global config directory (`~/.config/parley/`).
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "parley").map(|d| d.config_dir().to_path_buf())
}

/// Overlay the deployment environment variables on top of file values.
///
/// Blank variables are ignored. `PORT` must parse as a port number; anything
/// else is logged and skipped.
pub fn apply_env_overrides(config: &mut ParleyConfig, lookup: impl Fn(&str) -> Option<String>) {
    let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

    if let Some(v) = var("WHATSAPP_TOKEN") {
        config.whatsapp.token = Some(Secret::new(v));
    }
    if let Some(v) = var("WHATSAPP_API_URL") {
        config.whatsapp.api_url = Some(v);
    }
    if let Some(v) = var("PHONE_NUMBER_ID") {
        config.whatsapp.phone_number_id = Some(v);
    }
    if let Some(v) = var("VERIFY_TOKEN") {
        config.whatsapp.verify_token = Some(Secret::new(v));
    }
    if let Some(v) = var("OPENAI_API_KEY") {
        config.openai.api_key = Some(Secret::new(v));
    }
    if let Some(v) = var("OPENAI_BASE_URL") {
        config.openai.base_url = v;
    }
    if let Some(v) = var("OPENAI_MODEL") {
        config.openai.model = v;
    }
    if let Some(v) = var("VECTOR_STORE_ID") {
        config.openai.vector_store_id = Some(v);
    }
    if let Some(v) = var("DATABASE_URL") {
        config.database.url = Some(v);
    }
    if let Some(v) = var("PORT") {
        match v.trim().parse() {
            Ok(port) => config.server.port = port,
            Err(e) => warn!(value = %v, error = %e, "ignoring invalid PORT"),
        }
    }
}

fn parse_config(raw: &str, path: &Path) -> Result<ParleyConfig> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match ext {
        "toml" => Ok(toml::from_str(raw)?),
        "yaml" | "yml" => Ok(serde_yaml::from_str(raw)?),
        "json" => Ok(serde_json::from_str(raw)?),
        _ => Err(Error::UnsupportedFormat {
            extension: ext.to_string(),
        }),
    }
}
