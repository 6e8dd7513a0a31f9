use super::interactive;
use crate::{
    libs::{config::FileStore, messages::Message, queue::OfflineQueue, view::View},
    msg_error, msg_info, msg_print, msg_success,
};
use anyhow::Result;
use clap::{Args, Subcommand};
use dialoguer::{theme::ColorfulTheme, Confirm};

#[derive(Debug, Args)]
pub struct QueueArgs {
    #[command(subcommand)]
    command: Option<QueueCommand>,
}

#[derive(Debug, Subcommand)]
enum QueueCommand {
    /// List worklogs waiting to be posted
    List,
    /// Post every queued worklog again
    Retry,
    /// Drop one queued worklog
    Remove {
        /// Position shown by `queue list`
        index: usize,
    },
    /// Drop all queued worklogs
    Clear {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

pub async fn cmd(args: QueueArgs) -> Result<()> {
    match args.command.unwrap_or(QueueCommand::List) {
        QueueCommand::List => handle_list(),
        QueueCommand::Retry => handle_retry().await,
        QueueCommand::Remove { index } => handle_remove(index),
        QueueCommand::Clear { yes } => handle_clear(yes),
    }
}

fn handle_list() -> Result<()> {
    let entries = OfflineQueue::new(FileStore::new()?).list();
    if entries.is_empty() {
        msg_info!(Message::QueueEmpty);
        return Ok(());
    }

    msg_print!(Message::QueueHeader(entries.len()), true);
    View::queue(&entries)?;
    Ok(())
}

async fn handle_retry() -> Result<()> {
    let mut session = interactive::open_session()?;
    if session.queue().is_empty() {
        msg_info!(Message::QueueEmpty);
        return Ok(());
    }
    interactive::drain_queue(&mut session).await
}

fn handle_remove(index: usize) -> Result<()> {
    let queue = OfflineQueue::new(FileStore::new()?);
    match queue.remove_at(index)? {
        Some(_) => msg_success!(Message::QueueEntryRemoved(index)),
        None => msg_error!(Message::QueueIndexOutOfRange { index, len: queue.len() }),
    }
    Ok(())
}

fn handle_clear(yes: bool) -> Result<()> {
    let queue = OfflineQueue::new(FileStore::new()?);
    let count = queue.len();
    if count == 0 {
        msg_info!(Message::QueueEmpty);
        return Ok(());
    }

    let confirmed = yes
        || Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt(Message::ConfirmQueueClear(count).to_string())
            .default(false)
            .interact()?;
    if confirmed {
        msg_success!(Message::QueueCleared(queue.clear()?));
    }
    Ok(())
}
