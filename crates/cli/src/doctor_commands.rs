//! `parley doctor`: config validation and database check.
//!
//! Prints a report with `[ok]`, `[warn]`, `[fail]` or `[info]` per item and
//! exits non-zero when anything failed.

use std::path::Path;

use {
    anyhow::Result,
    parley_config::{ParleyConfig, Severity, ValidationResult, validate::validate_file},
};

const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Status {
    Ok,
    Warn,
    Fail,
    Info,
}

impl Status {
    fn label(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Warn => "warn",
            Self::Fail => "fail",
            Self::Info => "info",
        }
    }

    fn color(self) -> &'static str {
        match self {
            Self::Ok => GREEN,
            Self::Warn => YELLOW,
            Self::Fail => RED,
            Self::Info => CYAN,
        }
    }
}

impl From<Severity> for Status {
    fn from(severity: Severity) -> Self {
        match severity {
            Severity::Error => Self::Fail,
            Severity::Warning => Self::Warn,
            Severity::Info => Self::Info,
        }
    }
}

struct CheckItem {
    status: Status,
    message: String,
}

struct Section {
    title: String,
    items: Vec<CheckItem>,
}

impl Section {
    fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            items: Vec::new(),
        }
    }

    fn push(&mut self, status: Status, message: impl Into<String>) {
        self.items.push(CheckItem {
            status,
            message: message.into(),
        });
    }
}

fn print_report(sections: &[Section]) -> (usize, usize) {
    let mut errors = 0usize;
    let mut warnings = 0usize;

    for section in sections {
        eprintln!("{BOLD}{}{RESET}", section.title);
        for item in &section.items {
            let color = item.status.color();
            let label = item.status.label();
            eprintln!("  [{color}{label}{RESET}]  {}", item.message);
            match item.status {
                Status::Fail => errors += 1,
                Status::Warn => warnings += 1,
                Status::Ok | Status::Info => {},
            }
        }
        eprintln!();
    }

    (errors, warnings)
}

pub async fn handle_doctor(config_path: Option<&Path>) -> Result<()> {
    eprintln!("{BOLD}parley doctor{RESET}");
    eprintln!("{BOLD}============={RESET}\n");

    let result = validate_file(config_path);
    let mut sections = vec![check_config(&result)];

    // Best-effort load for the database check; failures were reported above.
    let mut config = match result.config_path.as_deref() {
        Some(path) => parley_config::load_config(path).unwrap_or_default(),
        None => ParleyConfig::default(),
    };
    parley_config::apply_env_overrides(&mut config, |name| std::env::var(name).ok());
    sections.push(check_database(&config).await);

    let (errors, warnings) = print_report(&sections);
    eprintln!("{BOLD}Summary:{RESET} {errors} error(s), {warnings} warning(s)");

    if errors > 0 {
        std::process::exit(1);
    }
    Ok(())
}

fn check_config(result: &ValidationResult) -> Section {
    let label = result
        .config_path
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "no config file".into());
    let mut section = Section::new(format!("Config ({label})"));

    for d in &result.diagnostics {
        let message = if d.path.is_empty() {
            d.message.clone()
        } else {
            format!("{}: {}", d.path, d.message)
        };
        section.push(d.severity.into(), message);
    }
    if !result.has_errors() {
        section.push(Status::Ok, "configuration is complete");
    }
    section
}

async fn check_database(config: &ParleyConfig) -> Section {
    let mut section = Section::new("Database");
    let Some(url) = config.database.url.as_deref() else {
        section.push(Status::Fail, "database.url is not set");
        return section;
    };

    match parley_store::connect(url, 1).await {
        Ok(pool) => match parley_store::run_migrations(&pool).await {
            Ok(()) => section.push(Status::Ok, format!("connected, schema up to date ({url})")),
            Err(e) => section.push(Status::Fail, format!("migrations failed: {e}")),
        },
        Err(e) => section.push(Status::Fail, format!("cannot open {url}: {e}")),
    }
    section
}
