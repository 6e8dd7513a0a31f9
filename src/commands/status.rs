use crate::{
    libs::{
        clock::SystemClock,
        config::FileStore,
        formatter::format_time,
        messages::Message,
        queue::OfflineQueue,
        timer::{TimerMachine, TimerStatus},
    },
    msg_info, msg_print,
};
use anyhow::Result;

pub fn cmd() -> Result<()> {
    let store = FileStore::new()?;
    let timers = TimerMachine::new(&store, SystemClock);

    match timers.active_timer()?.filter(|timer| timer.is_running) {
        Some(timer) => {
            let state = match timer.status() {
                TimerStatus::Paused => Message::TimerStatePaused,
                _ => Message::TimerStateRunning,
            };
            msg_print!(Message::TimerStatus {
                elapsed: format_time(timers.get_elapsed_seconds(&timer)),
                issue_key: timer.issue_key,
                state: state.to_string(),
            });
        }
        None => msg_info!(Message::NoActiveTimer),
    }

    let queued = OfflineQueue::new(&store).len();
    if queued > 0 {
        msg_info!(Message::QueueHeader(queued));
    }
    Ok(())
}
