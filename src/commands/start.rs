use super::interactive::{self, normalize_issue_key};
use crate::{
    libs::messages::Message,
    msg_bail_anyhow, msg_success,
};
use anyhow::Result;
use clap::Args;

#[derive(Debug, Args)]
pub struct StartArgs {
    /// Issue key, e.g. PROJ-123; pick from assigned issues when omitted
    issue: Option<String>,
    /// Initial worklog description
    #[arg(short, long)]
    message: Option<String>,
}

pub async fn cmd(start_args: StartArgs) -> Result<()> {
    let mut session = interactive::open_session()?;
    if let Some(existing) = session.active_timer()? {
        msg_bail_anyhow!(Message::ActiveTimerExists(existing.issue_key));
    }

    interactive::drain_queue(&mut session).await?;

    let key = match start_args.issue {
        Some(key) => normalize_issue_key(&key),
        None => match interactive::select_issue(&mut session).await? {
            Some(key) => key,
            None => return Ok(()),
        },
    };
    let Some(issue) = interactive::fetch_issue(&mut session, &key).await? else {
        return Ok(());
    };

    let timer = session.begin(&issue.key, start_args.message.as_deref().unwrap_or_default())?;
    msg_success!(Message::TimerStarted {
        issue_key: timer.issue_key,
        summary: issue.summary,
    });
    interactive::track(&mut session).await
}
