//! Dispatch gates - the checks an invocation passes before its handler runs
//!
//! Order is fixed: context, cooldown, maintenance, developer-only. Only the
//! cooldown and maintenance gates notify the user.

use std::fmt;

use chrono::Utc;

use crate::application::cooldown::{CooldownPatch, CooldownStore};
use crate::domain::entities::{ContextFlags, Gated, ReplyTarget};
use crate::domain::traits::Bot;
use crate::infrastructure::config::HandlerConfig;

/// Throttle applied to attempts rejected by maintenance, in seconds
pub const MAINTENANCE_THROTTLE_SECS: f64 = 5.0;

/// Why an invocation did not reach its handler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// Sent by an automated account
    BotSender,
    /// Content does not start with the prefix
    NoPrefix,
    /// Nothing follows the prefix
    EmptyCommand,
    /// Interaction is not a chat-input command
    NotChatInput,
    NotFound,
    /// Guild-only used outside a guild, or DM-only inside one
    Context,
    /// Still cooling down; `notified` is true if a notice was sent this time
    Cooldown { notified: bool },
    Maintenance,
    DeveloperOnly,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::BotSender => write!(f, "sender is a bot"),
            Rejection::NoPrefix => write!(f, "missing prefix"),
            Rejection::EmptyCommand => write!(f, "no command name"),
            Rejection::NotChatInput => write!(f, "not a chat input command"),
            Rejection::NotFound => write!(f, "command not found"),
            Rejection::Context => write!(f, "not available in this context"),
            Rejection::Cooldown { notified } => {
                write!(f, "on cooldown (notified: {})", notified)
            }
            Rejection::Maintenance => write!(f, "under maintenance"),
            Rejection::DeveloperOnly => write!(f, "developer only"),
        }
    }
}

/// Outcome of one dispatch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// Handler ran and returned Ok
    Executed,
    /// Handler ran and failed or panicked
    Failed(String),
    Rejected(Rejection),
}

impl Dispatch {
    pub fn is_executed(&self) -> bool {
        matches!(self, Dispatch::Executed)
    }

    pub fn rejection(&self) -> Option<Rejection> {
        match self {
            Dispatch::Rejected(r) => Some(*r),
            _ => None,
        }
    }
}

impl From<Rejection> for Dispatch {
    fn from(rejection: Rejection) -> Self {
        Dispatch::Rejected(rejection)
    }
}

pub type GateResult = Result<(), Rejection>;

/// Everything the gates read or write for one invocation
pub struct Gates<'a> {
    pub cooldowns: &'a CooldownStore,
    pub config: &'a HandlerConfig,
    pub bot: &'a dyn Bot,
    pub user_id: &'a str,
    pub target: &'a ReplyTarget,
}

impl Gates<'_> {
    pub fn context(&self, flags: ContextFlags, in_guild: bool) -> GateResult {
        if flags.allows(in_guild) {
            Ok(())
        } else {
            Err(Rejection::Context)
        }
    }

    pub async fn cooldown(&self, unit: &dyn Gated) -> GateResult {
        let (entry, allowed) = self.cooldowns.check(self.user_id, unit);
        let Some(entry) = entry.filter(|_| !allowed) else {
            return Ok(());
        };

        if entry.message_shown {
            return Err(Rejection::Cooldown { notified: false });
        }

        // flagged before sending; a concurrent attempt sees it set
        self.cooldowns
            .edit(self.user_id, unit, CooldownPatch::message_shown());
        let notice = self.config.messages.cooldown(entry.seconds_left(Utc::now()));
        self.notify(&notice).await;

        Err(Rejection::Cooldown { notified: true })
    }

    pub async fn maintenance(&self, unit: &dyn Gated) -> GateResult {
        let active = self.config.maintenance || unit.maintenance();
        if !active || self.config.is_developer(self.user_id) {
            return Ok(());
        }

        self.cooldowns
            .add(self.user_id, unit, Some(MAINTENANCE_THROTTLE_SECS));
        self.notify(self.config.messages.maintenance()).await;

        Err(Rejection::Maintenance)
    }

    pub fn developer_only(&self, unit: &dyn Gated) -> GateResult {
        if unit.developer_only() && !self.config.is_developer(self.user_id) {
            Err(Rejection::DeveloperOnly)
        } else {
            Ok(())
        }
    }

    async fn notify(&self, text: &str) {
        if let Err(e) = self.bot.reply(self.target, text).await {
            tracing::warn!("Failed to send notice to {}: {}", self.target.channel(), e);
        }
    }
}
