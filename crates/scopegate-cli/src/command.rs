//! Command line interface and subcommand execution

use std::io::Write;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use scopegate_common::error::SERVER_ERROR;
use scopegate_common::{ErrorCode, ScopegateError};
use scopegate_control::{AdminCommand, AdminOutcome, ControlRegistry, Scope, execute};
use serde_json::json;

/// Administer per-scope service toggles
#[derive(Debug, Parser)]
#[command(name = "scopegate", version, about)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Options shared by every subcommand
#[derive(Debug, Clone, Default, Args)]
pub struct GlobalArgs {
    /// Configuration file (default: conf/scopegate.yml, optional)
    #[arg(short = 'c', long = "config", global = true)]
    pub config: Option<PathBuf>,

    /// Storage backend: memory, file or embedded
    #[arg(long, global = true)]
    pub storage: Option<String>,

    /// Storage directory
    #[arg(long = "data-dir", global = true)]
    pub data_dir: Option<PathBuf>,

    /// Log level used when RUST_LOG is unset
    #[arg(long = "log-level", global = true)]
    pub log_level: Option<String>,
}

/// Target scope of enable/disable
#[derive(Debug, Clone, Args)]
#[group(required = true, multiple = false)]
pub struct ToggleScope {
    /// Group id
    #[arg(long)]
    pub group: Option<i64>,

    /// User id (private conversations)
    #[arg(long)]
    pub user: Option<i64>,

    /// Every scope, through the global override
    #[arg(long)]
    pub all: bool,
}

impl ToggleScope {
    pub fn scope(&self) -> Result<Scope, ScopegateError> {
        scope_from(self.group, self.user)
    }
}

/// Scope a listing is resolved in; global when omitted
#[derive(Debug, Clone, Default, Args)]
#[group(required = false, multiple = false)]
pub struct ListScope {
    #[arg(long)]
    pub group: Option<i64>,

    #[arg(long)]
    pub user: Option<i64>,
}

impl ListScope {
    pub fn scope(&self) -> Result<Scope, ScopegateError> {
        scope_from(self.group, self.user)
    }
}

// Neither id given means `--all` for toggles, and a global listing otherwise
fn scope_from(group: Option<i64>, user: Option<i64>) -> Result<Scope, ScopegateError> {
    match (group, user) {
        (Some(id), _) => Scope::group(id),
        (None, Some(id)) => Scope::individual(id),
        (None, None) => Ok(Scope::Global),
    }
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Enable a service in a scope
    Enable {
        service: String,
        #[command(flatten)]
        scope: ToggleScope,
    },
    /// Disable a service in a scope
    Disable {
        service: String,
        #[command(flatten)]
        scope: ToggleScope,
    },
    /// Resolve whether a service is enabled in a scope (global, group:ID, user:ID)
    Status {
        service: String,
        scope: Option<Scope>,
    },
    /// Show the help text of a service
    Usage { service: String },
    /// List registered services and their state in a scope
    List {
        #[command(flatten)]
        scope: ListScope,
    },
    /// Dump the stored rows of a service
    Rows { service: String },
}

/// Execute `command`, writing human or JSON output to `out`
pub async fn run(
    registry: &ControlRegistry,
    command: Command,
    json_output: bool,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    match command {
        Command::Enable { service, scope } => {
            let command = AdminCommand::Enable {
                service,
                scope: scope.scope()?,
            };
            render(execute(registry, command).await?, json_output, out)
        }
        Command::Disable { service, scope } => {
            let command = AdminCommand::Disable {
                service,
                scope: scope.scope()?,
            };
            render(execute(registry, command).await?, json_output, out)
        }
        Command::Usage { service } => {
            render(execute(registry, AdminCommand::Usage { service }).await?, json_output, out)
        }
        Command::List { scope } => {
            let command = AdminCommand::ListServices {
                scope: scope.scope()?,
            };
            render(execute(registry, command).await?, json_output, out)
        }
        Command::Status { service, scope } => {
            let control = registry
                .lookup(&service)
                .ok_or_else(|| ScopegateError::ServiceNotFound(service.clone()))?;
            let scope = scope.unwrap_or(Scope::Global);
            let global_disabled =
                !scope.is_global() && control.state_in(Scope::Global).await == Some(false);
            let explicit = control.state_in(scope).await.is_some();
            let enabled = control.is_enabled_in(scope).await;
            let source = if global_disabled {
                "global"
            } else if explicit {
                "scope"
            } else {
                "default"
            };

            if json_output {
                let value = json!({
                    "service": service,
                    "scope": scope,
                    "enabled": enabled,
                    "explicit": explicit,
                    "source": source,
                });
                writeln!(out, "{}", value)?;
            } else {
                let note = match source {
                    "global" => " (global override)",
                    "default" => " (default)",
                    _ => "",
                };
                writeln!(out, "{} {}: {}{}", service, scope, on_off(enabled), note)?;
            }
            Ok(())
        }
        Command::Rows { service } => {
            let control = registry
                .lookup(&service)
                .ok_or_else(|| ScopegateError::ServiceNotFound(service.clone()))?;
            let rows = control.rows().await.map_err(ScopegateError::storage)?;

            if json_output {
                let rows: Vec<_> = rows
                    .into_iter()
                    .map(|(scope, enabled)| json!({ "scope": scope, "enabled": enabled }))
                    .collect();
                writeln!(out, "{}", json!({ "service": service, "rows": rows }))?;
            } else if rows.is_empty() {
                writeln!(out, "{}: no stored rows", service)?;
            } else {
                for (scope, enabled) in rows {
                    writeln!(out, "{}\t{}", scope, on_off(enabled))?;
                }
            }
            Ok(())
        }
    }
}

/// Code reported for a failed command; failures outside the toggle engine
/// report `SERVER_ERROR`
pub fn error_code(err: &anyhow::Error) -> ErrorCode<'static> {
    err.downcast_ref::<ScopegateError>()
        .map(ScopegateError::code)
        .unwrap_or(SERVER_ERROR)
}

/// JSON report of a failed command: `{code, message, error}`
pub fn render_error(err: &anyhow::Error, out: &mut dyn Write) -> anyhow::Result<()> {
    let code = error_code(err);
    let value = json!({
        "code": code.code,
        "message": code.message,
        "error": format!("{:#}", err),
    });
    writeln!(out, "{}", value)?;
    Ok(())
}

fn render(outcome: AdminOutcome, json_output: bool, out: &mut dyn Write) -> anyhow::Result<()> {
    match outcome {
        AdminOutcome::Enabled { service, scope } => {
            if json_output {
                writeln!(out, "{}", json!({ "service": service, "scope": scope, "enabled": true }))?;
            } else {
                writeln!(out, "Enabled {} in {}", service, scope)?;
            }
        }
        AdminOutcome::Disabled { service, scope } => {
            if json_output {
                writeln!(out, "{}", json!({ "service": service, "scope": scope, "enabled": false }))?;
            } else {
                writeln!(out, "Disabled {} in {}", service, scope)?;
            }
        }
        AdminOutcome::Usage { service, help } => {
            if json_output {
                writeln!(out, "{}", json!({ "service": service, "help": help }))?;
            } else {
                match help {
                    Some(help) => writeln!(out, "{}\n{}", service, help)?,
                    None => writeln!(out, "{}: no usage available", service)?,
                }
            }
        }
        AdminOutcome::Services { scope, services } => {
            if json_output {
                writeln!(out, "{}", json!({ "scope": scope, "services": services }))?;
            } else {
                writeln!(out, "Services in {}:", scope)?;
                for status in services {
                    let mark = if status.enabled { "o" } else { "x" };
                    writeln!(out, "| {} | {}", mark, status.service)?;
                }
            }
        }
    }
    Ok(())
}

fn on_off(enabled: bool) -> &'static str {
    if enabled { "enabled" } else { "disabled" }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use scopegate_control::ControlOptions;
    use scopegate_persistence::MemoryScopeStore;

    async fn registry() -> ControlRegistry {
        let registry = ControlRegistry::new(Arc::new(MemoryScopeStore::new()));
        registry
            .register(
                "weather",
                ControlOptions::new()
                    .disabled_by_default()
                    .with_help("- weather <city>"),
            )
            .await
            .unwrap();
        registry.register("music", ControlOptions::new()).await.unwrap();
        registry
    }

    async fn run_to_string(registry: &ControlRegistry, args: &[&str]) -> anyhow::Result<String> {
        let cli = Cli::try_parse_from(std::iter::once("scopegate").chain(args.iter().copied()))?;
        let mut out = Vec::new();
        run(registry, cli.command, cli.json, &mut out).await?;
        Ok(String::from_utf8(out)?)
    }

    #[test]
    fn test_parse_global_args() {
        let cli = Cli::try_parse_from([
            "scopegate",
            "list",
            "--storage",
            "memory",
            "--data-dir",
            "/tmp/x",
            "--log-level",
            "debug",
        ])
        .unwrap();
        assert_eq!(cli.global.storage.as_deref(), Some("memory"));
        assert_eq!(cli.global.data_dir, Some(PathBuf::from("/tmp/x")));
        assert_eq!(cli.global.log_level.as_deref(), Some("debug"));
    }

    #[test]
    fn test_toggle_requires_exactly_one_scope() {
        assert!(Cli::try_parse_from(["scopegate", "enable", "weather"]).is_err());
        assert!(
            Cli::try_parse_from(["scopegate", "enable", "weather", "--group", "1", "--all"])
                .is_err()
        );
        assert!(Cli::try_parse_from(["scopegate", "enable", "weather", "--all"]).is_ok());
    }

    #[test]
    fn test_status_scope_parses() {
        let cli = Cli::try_parse_from(["scopegate", "status", "weather", "group:555"]).unwrap();
        let Command::Status { scope, .. } = cli.command else {
            panic!("expected status");
        };
        assert_eq!(scope, Some(Scope::Group(555)));

        assert!(Cli::try_parse_from(["scopegate", "status", "weather", "room:1"]).is_err());
    }

    #[tokio::test]
    async fn test_enable_then_status() {
        let registry = registry().await;

        let output = run_to_string(&registry, &["status", "weather", "group:555"])
            .await
            .unwrap();
        assert_eq!(output, "weather group:555: disabled (default)\n");

        let output = run_to_string(&registry, &["enable", "weather", "--group", "555"])
            .await
            .unwrap();
        assert_eq!(output, "Enabled weather in group:555\n");

        let output = run_to_string(&registry, &["status", "weather", "group:555"])
            .await
            .unwrap();
        assert_eq!(output, "weather group:555: enabled\n");
    }

    #[tokio::test]
    async fn test_disable_all() {
        let registry = registry().await;
        run_to_string(&registry, &["enable", "music", "--user", "42"])
            .await
            .unwrap();
        let output = run_to_string(&registry, &["disable", "music", "--all"])
            .await
            .unwrap();
        assert_eq!(output, "Disabled music in global\n");

        let output = run_to_string(&registry, &["status", "music", "user:42"])
            .await
            .unwrap();
        assert_eq!(output, "music user:42: disabled (global override)\n");

        // Never-seen scopes are also reported as overridden, not defaulted
        let output = run_to_string(&registry, &["status", "music", "group:9", "--json"])
            .await
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["enabled"], false);
        assert_eq!(value["source"], "global");

        let output = run_to_string(&registry, &["status", "music", "global"])
            .await
            .unwrap();
        assert_eq!(output, "music global: disabled\n");
    }

    #[tokio::test]
    async fn test_failed_command_reports_error_code() {
        let registry = registry().await;

        let err = run_to_string(&registry, &["usage", "nope", "--json"])
            .await
            .unwrap_err();
        assert_eq!(error_code(&err).code, 21008);

        let mut out = Vec::new();
        render_error(&err, &mut out).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["code"], 21008);
        assert_eq!(value["message"], "service not exist");
        assert_eq!(value["error"], "service 'nope' not found");

        let err = run_to_string(&registry, &["enable", "music", "--user=-3"])
            .await
            .unwrap_err();
        assert_eq!(error_code(&err).code, 22000);

        let err = anyhow::anyhow!("broken pipe");
        assert_eq!(error_code(&err).code, 30000);
    }

    #[tokio::test]
    async fn test_list_and_rows_json() {
        let registry = registry().await;

        let output = run_to_string(&registry, &["list", "--group", "7", "--json"])
            .await
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["services"][0]["service"], "music");
        assert_eq!(value["services"][0]["enabled"], true);
        assert_eq!(value["services"][1]["service"], "weather");
        assert_eq!(value["services"][1]["enabled"], false);

        let output = run_to_string(&registry, &["rows", "weather", "--json"])
            .await
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["rows"][0]["scope"], json!({"kind": "group", "id": 7}));
        assert_eq!(value["rows"][0]["enabled"], false);
    }

    #[tokio::test]
    async fn test_usage_and_rows_text() {
        let registry = registry().await;

        let output = run_to_string(&registry, &["usage", "weather"]).await.unwrap();
        assert_eq!(output, "weather\n- weather <city>\n");
        let output = run_to_string(&registry, &["usage", "music"]).await.unwrap();
        assert_eq!(output, "music: no usage available\n");

        let output = run_to_string(&registry, &["rows", "music"]).await.unwrap();
        assert_eq!(output, "music: no stored rows\n");
    }

    #[tokio::test]
    async fn test_unknown_service() {
        let registry = registry().await;
        let err = run_to_string(&registry, &["rows", "nope"]).await.unwrap_err();
        assert!(err.to_string().contains("nope"));
    }

    #[tokio::test]
    async fn test_invalid_id_is_rejected() {
        let registry = registry().await;
        assert!(run_to_string(&registry, &["enable", "music", "--group", "0"])
            .await
            .is_err());
    }
}
