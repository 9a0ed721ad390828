//! Configuration loading, env substitution, env overrides and validation.
//!
//! Config files: `parley.toml`, `parley.yaml`, `parley.yml` or `parley.json`,
//! searched in `./` then `~/.config/parley/`.
//!
//! String values support `${ENV_VAR}` substitution. The well-known deployment
//! variables (`WHATSAPP_TOKEN`, `OPENAI_API_KEY`, `DATABASE_URL`, ...) override
//! whatever the file says.

pub mod env_subst;
pub mod error;
pub mod loader;
pub mod schema;
pub mod validate;

pub use {
    error::{Error, Result},
    loader::{
        apply_env_overrides, config_dir, discover_and_load, find_config_file, load_config,
        load_config_with_warnings, load_resolved,
    },
    schema::{
        ChatConfig, DatabaseConfig, OpenAiConfig, ParleyConfig, ServerConfig, WhatsAppConfig,
    },
    validate::{Diagnostic, Severity, ValidationResult},
};
