//! Main entry point for the scopegate command line tool.

use clap::Parser;
use scopegate_cli::{
    Cli, Configuration,
    command::{render_error, run},
    startup::{self, LoggingConfig},
};
use tracing::error;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let configuration = Configuration::new(&cli.global)?;
    let _logging_guard = startup::init_logging(&LoggingConfig::from_configuration(&configuration))?;

    let registry = match startup::build_registry(&configuration).await {
        Ok(registry) => registry,
        Err(e) => {
            error!("Startup failed: {:#}", e);
            return Err(e);
        }
    };

    let json_output = cli.json;
    let mut stdout = std::io::stdout();
    let result = run(&registry, cli.command, json_output, &mut stdout).await;
    if let Err(e) = &result
        && json_output
    {
        render_error(e, &mut stdout)?;
    }
    result
}
