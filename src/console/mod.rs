//! Administrative console commands.
//!
//! Parses operator command lines and applies them to a borrowed [`NetBan`].
//! Replies are returned as lines; the host decides where they go.
//!
//! - [`command`]: tokenizer and [`Command`] parsing
//! - [`persistence`]: ban list save and replay

pub mod command;
pub mod persistence;

pub use command::{Command, Origin, UnbanTarget, quote, tokenize};
pub use persistence::{save_bans, write_bans};

use crate::ban::{BanData, BanMessage, BanOutcome, Clock, NetBan, PunishOutcome};
use crate::config::Config;
use crate::error::ConsoleError;
use crate::metrics;
use crate::net::NetAddr;
use crate::telemetry::spans;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

/// Console command executor.
#[derive(Debug, Clone)]
pub struct Console {
    bans_file: PathBuf,
    escalation_minutes: u64,
}

impl Console {
    pub fn new(config: &Config) -> Self {
        Self {
            bans_file: config.bans.file.clone(),
            escalation_minutes: config.punish.escalation_ban_minutes,
        }
    }

    /// Default target of `bans_save`.
    pub fn bans_file(&self) -> &std::path::Path {
        &self.bans_file
    }

    /// Parse and run one operator line, returning the reply lines.
    pub fn execute<C: Clock>(
        &self,
        netban: &mut NetBan<C>,
        line: &str,
    ) -> Result<Vec<String>, ConsoleError> {
        self.execute_from(netban, line, Origin::Operator)
    }

    /// Parse and run one line read from `origin`.
    pub fn execute_from<C: Clock>(
        &self,
        netban: &mut NetBan<C>,
        line: &str,
        origin: Origin,
    ) -> Result<Vec<String>, ConsoleError> {
        if persistence::is_ignorable(line) {
            return Ok(Vec::new());
        }
        let command = Command::parse_from(&tokenize(line)?, origin)?;
        let source = match origin {
            Origin::Operator => "console",
            Origin::Saved => "ban_list",
        };
        let _span = spans::console_command(command.name(), source).entered();
        self.run(netban, command)
    }

    /// Run an already parsed command.
    pub fn run<C: Clock>(
        &self,
        netban: &mut NetBan<C>,
        command: Command,
    ) -> Result<Vec<String>, ConsoleError> {
        let reply = match command {
            Command::Ban {
                addr,
                duration,
                reason,
            } => {
                let outcome = netban.ban_addr(&addr, duration, &reason)?;
                vec![describe_addr_ban(netban, outcome)]
            }
            Command::BanRange {
                range,
                duration,
                reason,
            } => {
                let outcome = netban.ban_range(&range, duration, &reason)?;
                let kind = outcome_kind(outcome);
                let line = netban
                    .range_bans()
                    .get(outcome.id())
                    .map(|ban| netban.describe(ban, kind));
                vec![line.unwrap_or_default()]
            }
            Command::Unban(UnbanTarget::Addr(addr)) => vec![netban.unban_addr(&addr)?],
            Command::Unban(UnbanTarget::Index(index)) => vec![netban.unban_index(index)?],
            Command::UnbanRange(range) => vec![netban.unban_range(&range)?],
            Command::UnbanAll => {
                netban.unban_all();
                vec!["unbanned all entries".to_string()]
            }
            Command::Bans => list_bans(netban),
            Command::BansSave(path) => {
                let path = path.unwrap_or_else(|| self.bans_file.clone());
                let count = save_bans(netban, &path)?;
                vec![format!("saved {count} ban(s) to '{}'", path.display())]
            }
            Command::Punish {
                addr,
                seconds,
                reason,
            } => self.punish(netban, &addr, seconds, &reason)?,
            Command::Check(addr) => match netban.is_banned(&addr) {
                Some(msg) => vec![msg],
                None => vec![format!("{} not banned", addr.host().quoted())],
            },
            Command::Metrics => metrics::gather_metrics()
                .lines()
                .map(str::to_string)
                .collect(),
        };
        Ok(reply)
    }

    fn punish<C: Clock>(
        &self,
        netban: &mut NetBan<C>,
        addr: &NetAddr,
        seconds: u64,
        reason: &str,
    ) -> Result<Vec<String>, ConsoleError> {
        match netban.punish_addr(addr, seconds, reason)? {
            PunishOutcome::Created(_) | PunishOutcome::Updated(_) => Ok(vec![format!(
                "punished {} for {seconds} seconds ({reason})",
                addr.host().quoted()
            )]),
            PunishOutcome::EscalationDue => {
                let minutes = self.escalation_minutes;
                info!(addr = %addr.host(), minutes, "Escalating punishment to ban");
                let duration = Some(Duration::from_secs(minutes.saturating_mul(60)));
                let outcome = netban.ban_addr(addr, duration, reason)?;
                Ok(vec![describe_addr_ban(netban, outcome)])
            }
        }
    }
}

fn outcome_kind(outcome: BanOutcome) -> BanMessage {
    match outcome {
        BanOutcome::Created(_) => BanMessage::Added,
        BanOutcome::Updated(_) => BanMessage::List,
    }
}

fn describe_addr_ban<C: Clock>(netban: &NetBan<C>, outcome: BanOutcome) -> String {
    netban
        .addr_bans()
        .get(outcome.id())
        .map(|ban| netban.describe(ban, outcome_kind(outcome)))
        .unwrap_or_default()
}

/// `#<i> '<x>' banned for ...` per entry, address bans first, then a count.
fn list_bans<C: Clock>(netban: &NetBan<C>) -> Vec<String> {
    let addr_lines = netban
        .addr_bans()
        .iter()
        .map(|(_, ban)| netban.describe(ban, BanMessage::List));
    let range_lines = netban
        .range_bans()
        .iter()
        .map(|(_, ban)| netban.describe(ban, BanMessage::List));

    let mut lines: Vec<String> = addr_lines
        .chain(range_lines)
        .enumerate()
        .map(|(i, line)| format!("#{i} {line}"))
        .collect();
    lines.push(format!("{} ban(s)", lines.len()));
    lines
}
