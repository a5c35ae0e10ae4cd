use clap::{Parser, Subcommand, ValueEnum};
use govgate::workflow::OperationType;
use std::path::PathBuf;

pub mod bootstrap;
pub mod config;
pub mod init;
pub mod propose;
pub mod version;
pub mod vote;

#[derive(Parser)]
#[command(name = "govgate")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Ledger-gated governance steps for release pipelines", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Proposal operation selector shared by the propose and vote roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OperationArg {
    /// Gate a software version, identified by its commit hash
    Version,
    /// Record a deployment, identified by the deployed address
    Deployment,
}

impl From<OperationArg> for OperationType {
    fn from(op: OperationArg) -> Self {
        match op {
            OperationArg::Version => OperationType::VersionProposal,
            OperationArg::Deployment => OperationType::DeploymentProposal,
        }
    }
}

/// Vote decision, taken verbatim from the step configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DecisionArg {
    Accept,
    Reject,
}

impl DecisionArg {
    pub fn accept(self) -> bool {
        matches!(self, Self::Accept)
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a default configuration file
    Init {
        /// Path for the config file (default: user config directory)
        #[arg(long)]
        config: Option<String>,
    },

    /// Submit a governance proposal; version proposals then block until
    /// the ledger records a decision
    Propose {
        /// Proposal operation to perform
        #[arg(long, value_enum)]
        operation: OperationArg,

        /// Credential id to resolve the signing identity from
        #[arg(long)]
        credential: String,

        /// Path to config file (default: user config directory)
        #[arg(long)]
        config: Option<String>,

        /// Registry address (overrides the configured one)
        #[arg(long)]
        registry: Option<String>,

        /// Comma-separated webhook targets (overrides the configured list)
        #[arg(long)]
        webhook_targets: Option<String>,

        /// Wait between decision polls, e.g. "60s" (overrides config)
        #[arg(long)]
        poll_interval: Option<String>,

        /// Bound on total polling time, e.g. "24h" (overrides config)
        #[arg(long)]
        deadline: Option<String>,
    },

    /// Cast a vote on an open proposal
    Vote {
        /// Proposal operation being voted on
        #[arg(long, value_enum)]
        operation: OperationArg,

        /// Credential id to resolve the signing identity from
        #[arg(long)]
        credential: String,

        /// The vote to cast
        #[arg(long, value_enum)]
        decision: DecisionArg,

        /// Path to config file (default: user config directory)
        #[arg(long)]
        config: Option<String>,

        /// Registry address (overrides the configured one)
        #[arg(long)]
        registry: Option<String>,
    },

    /// Deploy a fresh governance registry and record its address in the
    /// configuration
    DeployRegistry {
        /// Credential id to resolve the signing identity from
        #[arg(long)]
        credential: String,

        /// Comma-separated initial voter addresses
        #[arg(long)]
        voters: String,

        /// Version-proposal quorum percentage (0-100)
        #[arg(long)]
        version_quorum: u8,

        /// Role-binding quorum percentage (0-100)
        #[arg(long)]
        role_binding_quorum: u8,

        /// Path to config file (default: user config directory)
        #[arg(long)]
        config: Option<String>,

        /// Do not write the deployed address back to the config file
        #[arg(long)]
        no_save: bool,
    },

    /// Display version information
    Version,
}

/// Resolve the config file path from an optional CLI override.
pub fn config_path(flag: Option<String>) -> PathBuf {
    flag.map(PathBuf::from)
        .unwrap_or_else(config::default_config_path)
}

/// Dispatch a parsed command. Returns the process exit code.
pub async fn execute(cli: Cli) -> Result<i32, Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Init { config } => init::execute(config),
        Commands::Propose {
            operation,
            credential,
            config,
            registry,
            webhook_targets,
            poll_interval,
            deadline,
        } => {
            propose::execute(
                operation,
                credential,
                config,
                registry,
                webhook_targets,
                poll_interval,
                deadline,
            )
            .await
        }
        Commands::Vote {
            operation,
            credential,
            decision,
            config,
            registry,
        } => vote::execute(operation, credential, decision, config, registry).await,
        Commands::DeployRegistry {
            credential,
            voters,
            version_quorum,
            role_binding_quorum,
            config,
            no_save,
        } => {
            bootstrap::execute(
                credential,
                voters,
                version_quorum,
                role_binding_quorum,
                config,
                no_save,
            )
            .await
        }
        Commands::Version => {
            version::execute();
            Ok(0)
        }
    }
}
