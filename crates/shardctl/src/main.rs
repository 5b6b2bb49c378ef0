//! shardctl binary entrypoint.

use std::io;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use shardctl::cli::{
    Cli, Commands, GetCommands, GetShardsCommands, ListCommands, ToggleCommands,
    ToggleShardsCommands,
};
use shardctl::commands::{AllocationAction, AllocationCommand, ShardsCommand};
use shardctl::output::OutputFormat;
use shardctl::{AllocationFlag, CliError, HttpClusterClient};

fn main() -> ExitCode {
    // Logs go to stderr so stdout stays pipeable
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to create async runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let format = OutputFormat::new(cli.format);
    let client = HttpClusterClient::new(cli.client_config()?)?;
    let mut stdout = io::stdout().lock();

    match cli.command {
        Commands::List {
            command: ListCommands::Shards(args),
        } => {
            let cmd = ShardsCommand::new(client);
            cmd.execute(&mut stdout, &format, &args).await?;
        }
        Commands::Get {
            command:
                GetCommands::Shards {
                    command: GetShardsCommands::Allocations,
                },
        } => {
            let cmd = AllocationCommand::new(client);
            cmd.execute(&mut stdout, &format, AllocationAction::Show).await?;
        }
        Commands::Disable { command } => {
            let cmd = AllocationCommand::new(client);
            cmd.execute(&mut stdout, &format, toggle_action(&command, AllocationFlag::None))
                .await?;
        }
        Commands::Enable { command } => {
            let cmd = AllocationCommand::new(client);
            cmd.execute(&mut stdout, &format, toggle_action(&command, AllocationFlag::All))
                .await?;
        }
    }

    Ok(())
}

fn toggle_action(command: &ToggleCommands, flag: AllocationFlag) -> AllocationAction {
    match command {
        ToggleCommands::Shards {
            command: ToggleShardsCommands::Allocations,
        } => AllocationAction::Set(flag),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disable_maps_to_none() {
        let cli = Cli::parse_from(["shardctl", "disable", "shards", "allocations"]);
        match cli.command {
            Commands::Disable { command } => assert_eq!(
                toggle_action(&command, AllocationFlag::None),
                AllocationAction::Set(AllocationFlag::None)
            ),
            other => panic!("expected disable command, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn run_with_invalid_url_fails() {
        let cli = Cli::parse_from(["shardctl", "-u", "ftp://invalid", "list", "shards"]);
        let result = run(cli).await;
        assert!(matches!(result, Err(CliError::Config(_))));
    }

    #[tokio::test]
    async fn run_without_cluster_fails() {
        let addr = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
            listener.local_addr().expect("local addr")
        };
        let url = format!("http://{addr}");
        let cli = Cli::parse_from(["shardctl", "-u", &url, "get", "shards", "allocations"]);
        let result = run(cli).await;
        assert!(matches!(result, Err(CliError::Transport(_))));
    }
}
