//! Jira connection setup.
//!
//! Walks through host, email and API token, checks that Jira accepts them
//! and only then stores them.

use super::interactive::api_error_message;
use crate::{
    api::{CurrentUser, IssueService, Jira, JiraConfig},
    libs::{
        config::{ConfigStore, FileStore},
        messages::Message,
    },
    msg_bail_anyhow, msg_error, msg_error_anyhow, msg_success,
};
use anyhow::Result;
use clap::Args;

#[derive(Debug, Args)]
pub struct InitArgs {
    /// Remove the stored Jira credentials instead
    #[arg(short, long)]
    delete: bool,
}

pub async fn cmd(init_args: InitArgs) -> Result<()> {
    let store = FileStore::new()?;

    if init_args.delete {
        store.delete_jira()?;
        msg_success!(Message::CredentialsRemoved);
        return Ok(());
    }

    let config = JiraConfig::init(&store.jira().ok().flatten())?;
    let jira = Jira::new(&config)?;
    match verify_connection(&jira).await {
        Ok(user) => {
            store.set_jira(&config)?;
            msg_success!(Message::ConfigSaved);
            msg_success!(Message::ConnectionOk {
                display_name: user.display_name,
                email: user.email,
            });
        }
        Err(e) => msg_error!(e),
    }
    Ok(())
}

/// Checks that `service` accepts its credentials and returns their owner.
pub async fn verify_connection<S: IssueService>(service: &S) -> Result<CurrentUser> {
    if !service.test_connection().await {
        msg_bail_anyhow!(Message::ConnectionFailed);
    }
    service
        .get_current_user()
        .await
        .map_err(|e| msg_error_anyhow!(api_error_message(&e)))
}
