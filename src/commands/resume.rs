use super::interactive;
use crate::{libs::messages::Message, msg_info};
use anyhow::Result;

/// Reattaches to the persisted timer, replaying queued worklogs first.
pub async fn cmd() -> Result<()> {
    let mut session = interactive::open_session()?;
    interactive::drain_queue(&mut session).await?;

    let timer = session.attach()?;
    msg_info!(Message::TimerReattached(timer.issue_key));
    interactive::track(&mut session).await
}
