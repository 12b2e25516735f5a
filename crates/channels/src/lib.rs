//! Channel runners.
//!
//! Each optional downstream channel (captcha gate, Slack and Discord
//! webhooks, email, record storage) implements the [`ChannelRunner`]
//! contract: configured once per invocation, run once per request, with
//! the first failure short-circuiting everything after it.

pub mod captcha;
pub mod discord;
pub mod email;
pub mod runner;
pub mod slack;
pub mod storage;
pub mod validate;

pub use {
    captcha::CaptchaRunner,
    discord::DiscordRunner,
    email::EmailRunner,
    runner::{ChannelRunner, NOTIFICATION_SERVICE_ERROR, RunOutcome},
    slack::SlackRunner,
    storage::StorageRunner,
    validate::ValidationRunner,
};
