//! Core of jtimer.
//!
//! - [`timer`], [`clock`]: the active timer and its elapsed-time arithmetic
//! - [`segmenter`], [`poster`], [`queue`]: from a stopped timer to worklogs,
//!   with failures kept for later
//! - [`session`]: one tracking run, driven by intents from the front end
//! - [`config`], [`data_storage`], [`secret`]: persistence and sealed credentials
//! - [`messages`], [`formatter`], [`view`]: everything the user reads

pub mod clock;
pub mod config;
pub mod data_storage;
pub mod formatter;
pub mod messages;
pub mod poster;
pub mod queue;
pub mod secret;
pub mod segmenter;
pub mod session;
pub mod timer;
pub mod view;
