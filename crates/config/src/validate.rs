//! Configuration validation.
//!
//! Two passes: a structural pass over the raw TOML (syntax, unknown or
//! misspelled keys, type errors) and a semantic pass over the resolved
//! [`ParleyConfig`] (required credentials, nonsensical limits).

use std::{collections::HashMap, path::Path};

use secrecy::{ExposeSecret, Secret};

use crate::schema::ParleyConfig;

/// Severity level for a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
            Self::Info => write!(f, "info"),
        }
    }
}

/// A single validation diagnostic.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Category: "syntax", "unknown-field", "type-error", "missing", "value".
    pub category: &'static str,
    /// Dotted path, e.g. "whatsapp.token".
    pub path: String,
    pub message: String,
}

/// Result of validating a configuration.
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub diagnostics: Vec<Diagnostic>,
    pub config_path: Option<std::path::PathBuf>,
}

impl ValidationResult {
    /// Returns `true` if any diagnostic is an error.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    /// Count diagnostics by severity.
    #[must_use]
    pub fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }

    /// One line per error-level diagnostic.
    #[must_use]
    pub fn summary(&self) -> String {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Error)
            .map(|d| format!("  {}: {}", d.path, d.message))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn push(
        &mut self,
        severity: Severity,
        category: &'static str,
        path: impl Into<String>,
        message: impl Into<String>,
    ) {
        self.diagnostics.push(Diagnostic {
            severity,
            category,
            path: path.into(),
            message: message.into(),
        });
    }
}

// ── Known keys ──────────────────────────────────────────────────────────────

const SERVER_KEYS: &[&str] = &["bind", "port"];
const WHATSAPP_KEYS: &[&str] = &[
    "token",
    "api_url",
    "phone_number_id",
    "verify_token",
    "request_timeout_secs",
];
const OPENAI_KEYS: &[&str] = &[
    "api_key",
    "base_url",
    "model",
    "vector_store_id",
    "max_num_results",
    "web_search",
    "request_timeout_secs",
];
const DATABASE_KEYS: &[&str] = &["url", "max_connections"];
const CHAT_KEYS: &[&str] = &["history_limit", "default_display_name"];

fn known_sections() -> HashMap<&'static str, &'static [&'static str]> {
    HashMap::from([
        ("server", SERVER_KEYS),
        ("whatsapp", WHATSAPP_KEYS),
        ("openai", OPENAI_KEYS),
        ("database", DATABASE_KEYS),
        ("chat", CHAT_KEYS),
    ])
}

// ── Levenshtein distance ────────────────────────────────────────────────────

fn levenshtein(a: &str, b: &str) -> usize {
    let b_chars: Vec<char> = b.chars().collect();
    let mut prev: Vec<usize> = (0..=b_chars.len()).collect();

    for (i, ca) in a.chars().enumerate() {
        let mut curr = Vec::with_capacity(b_chars.len() + 1);
        curr.push(i + 1);
        for (j, cb) in b_chars.iter().enumerate() {
            let substitution = prev[j] + usize::from(ca != *cb);
            curr.push(substitution.min(prev[j + 1] + 1).min(curr[j] + 1));
        }
        prev = curr;
    }
    prev[b_chars.len()]
}

/// Closest candidate within `max_distance` edits, if any.
fn suggest<'a>(needle: &str, candidates: &[&'a str], max_distance: usize) -> Option<&'a str> {
    candidates
        .iter()
        .map(|&c| (c, levenshtein(needle, c)))
        .filter(|&(_, d)| d > 0 && d <= max_distance)
        .min_by_key(|&(_, d)| d)
        .map(|(c, _)| c)
}

// ── Structural pass ─────────────────────────────────────────────────────────

/// Validate raw TOML text: syntax, unknown keys and field types.
///
/// Missing credentials are not reported here since they may come from the
/// environment; see [`validate_config`].
#[must_use]
pub fn validate_toml_str(toml_str: &str) -> ValidationResult {
    let mut result = ValidationResult::default();

    let value: toml::Value = match toml::from_str(toml_str) {
        Ok(v) => v,
        Err(e) => {
            result.push(
                Severity::Error,
                "syntax",
                "",
                format!("TOML syntax error: {e}"),
            );
            return result;
        },
    };

    if let Some(table) = value.as_table() {
        check_unknown_fields(table, &mut result);
    }

    if let Err(e) = toml::from_str::<ParleyConfig>(toml_str) {
        result.push(
            Severity::Error,
            "type-error",
            "",
            format!("type error: {e}"),
        );
    }

    result
}

fn check_unknown_fields(table: &toml::map::Map<String, toml::Value>, result: &mut ValidationResult) {
    let sections = known_sections();
    let mut section_names: Vec<&str> = sections.keys().copied().collect();
    section_names.sort_unstable();

    for (key, child) in table {
        let Some(fields) = sections.get(key.as_str()) else {
            let message = match suggest(key, &section_names, 3) {
                Some(s) => format!("unknown section (did you mean \"{s}\"?)"),
                None => "unknown section".to_string(),
            };
            result.push(Severity::Warning, "unknown-field", key.clone(), message);
            continue;
        };
        let Some(child_table) = child.as_table() else {
            continue;
        };
        for field in child_table.keys() {
            if fields.contains(&field.as_str()) {
                continue;
            }
            let message = match suggest(field, fields, 3) {
                Some(s) => format!("unknown field (did you mean \"{s}\"?)"),
                None => "unknown field".to_string(),
            };
            result.push(
                Severity::Warning,
                "unknown-field",
                format!("{key}.{field}"),
                message,
            );
        }
    }
}

// ── Semantic pass ───────────────────────────────────────────────────────────

/// Validate a resolved config (file + environment overrides).
#[must_use]
pub fn validate_config(config: &ParleyConfig) -> ValidationResult {
    let mut result = ValidationResult::default();

    require_secret(&mut result, "whatsapp.token", "WHATSAPP_TOKEN", &config.whatsapp.token);
    require_str(
        &mut result,
        "whatsapp.api_url",
        "WHATSAPP_API_URL",
        config.whatsapp.api_url.as_deref(),
    );
    require_str(
        &mut result,
        "whatsapp.phone_number_id",
        "PHONE_NUMBER_ID",
        config.whatsapp.phone_number_id.as_deref(),
    );
    require_secret(
        &mut result,
        "whatsapp.verify_token",
        "VERIFY_TOKEN",
        &config.whatsapp.verify_token,
    );
    require_secret(&mut result, "openai.api_key", "OPENAI_API_KEY", &config.openai.api_key);
    require_str(
        &mut result,
        "openai.vector_store_id",
        "VECTOR_STORE_ID",
        config.openai.vector_store_id.as_deref(),
    );
    require_str(
        &mut result,
        "database.url",
        "DATABASE_URL",
        config.database.url.as_deref(),
    );

    if let Some(url) = config.whatsapp.api_url.as_deref()
        && !url.is_empty()
        && !url.starts_with("http://")
        && !url.starts_with("https://")
    {
        result.push(
            Severity::Error,
            "value",
            "whatsapp.api_url",
            "must be an http(s) URL",
        );
    }
    if config.chat.history_limit == 0 {
        result.push(
            Severity::Error,
            "value",
            "chat.history_limit",
            "must be at least 1",
        );
    }
    if !(1..=50).contains(&config.openai.max_num_results) {
        result.push(
            Severity::Warning,
            "value",
            "openai.max_num_results",
            "file search accepts between 1 and 50 results",
        );
    }
    if config.server.port == 0 {
        result.push(
            Severity::Info,
            "value",
            "server.port",
            "port 0 binds a random free port",
        );
    }

    result
}

/// Validate a config file on disk (or the discovered one) merged with the
/// current environment. Used by `parley doctor`.
#[must_use]
pub fn validate_file(path: Option<&Path>) -> ValidationResult {
    let config_path = path
        .map(Path::to_path_buf)
        .or_else(crate::loader::find_config_file);

    let mut result = ValidationResult::default();
    let mut config = ParleyConfig::default();

    if let Some(ref actual) = config_path {
        match std::fs::read_to_string(actual) {
            Ok(raw) => {
                let raw = crate::env_subst::substitute_env(&raw);
                let is_toml = actual
                    .extension()
                    .and_then(|e| e.to_str())
                    .is_none_or(|e| e == "toml");
                if is_toml {
                    result.diagnostics.extend(validate_toml_str(&raw).diagnostics);
                }
                match crate::loader::load_config(actual) {
                    Ok(loaded) => config = loaded,
                    Err(e) if !is_toml => {
                        result.push(Severity::Error, "syntax", "", e.to_string());
                    },
                    // Already reported by the structural pass.
                    Err(_) => {},
                }
            },
            Err(e) => result.push(
                Severity::Error,
                "syntax",
                "",
                format!("failed to read config file: {e}"),
            ),
        }
    } else {
        result.push(
            Severity::Info,
            "file-ref",
            "",
            "no config file found; using defaults and environment",
        );
    }

    crate::loader::apply_env_overrides(&mut config, |name| std::env::var(name).ok());
    result
        .diagnostics
        .extend(validate_config(&config).diagnostics);
    result.config_path = config_path;
    result
}

fn require_str(result: &mut ValidationResult, path: &str, env: &str, value: Option<&str>) {
    if value.is_none_or(|v| v.trim().is_empty()) {
        result.push(
            Severity::Error,
            "missing",
            path,
            format!("required value is not set (set it in the config file or via {env})"),
        );
    }
}

fn require_secret(
    result: &mut ValidationResult,
    path: &str,
    env: &str,
    value: &Option<Secret<String>>,
) {
    let exposed = value.as_ref().map(|s| s.expose_secret().as_str());
    require_str(result, path, env, exposed);
}
