use crate::{
    libs::{
        config::{ConfigStore, FileStore},
        messages::Message,
    },
    msg_info, msg_print, msg_success,
};
use anyhow::Result;
use clap::Args;

#[derive(Debug, Args)]
pub struct MessageArgs {
    /// New default worklog description
    text: Option<String>,
    /// Remove the default worklog description
    #[arg(long, conflicts_with = "text")]
    clear: bool,
}

pub fn cmd(args: MessageArgs) -> Result<()> {
    let store = FileStore::new()?;

    if args.clear {
        store.delete_default_message()?;
        msg_success!(Message::DefaultMessageCleared);
        return Ok(());
    }

    match args.text.as_deref().map(str::trim).filter(|text| !text.is_empty()) {
        Some(text) => {
            store.set_default_message(text)?;
            msg_success!(Message::DefaultMessageSaved);
        }
        None => match store.default_message()? {
            Some(text) => msg_print!(Message::DefaultMessage(text)),
            None => msg_info!(Message::DefaultMessageNotSet),
        },
    }
    Ok(())
}
