pub mod init;
pub mod interactive;
pub mod message;
pub mod queue;
pub mod resume;
pub mod start;
pub mod status;

use anyhow::Result;
use clap::{Parser, Subcommand};

#[derive(Debug, Subcommand)]
enum Commands {
    #[command(about = "Configure the Jira connection")]
    Init(init::InitArgs),
    #[command(about = "Start a timer for an issue")]
    Start(start::StartArgs),
    #[command(about = "Return to the running timer")]
    Resume,
    #[command(about = "Show the active timer")]
    Status,
    #[command(about = "Inspect or replay worklogs that failed to post")]
    Queue(queue::QueueArgs),
    #[command(about = "Show or change the default worklog description")]
    Message(message::MessageArgs),
}

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
#[command(arg_required_else_help(true))]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    pub async fn menu() -> Result<()> {
        let cli = Self::parse();
        match cli.command {
            Commands::Init(args) => init::cmd(args).await,
            Commands::Start(args) => start::cmd(args).await,
            Commands::Resume => resume::cmd().await,
            Commands::Status => status::cmd(),
            Commands::Queue(args) => queue::cmd(args).await,
            Commands::Message(args) => message::cmd(args),
        }
    }
}
