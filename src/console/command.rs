//! Console line tokenizing and command parsing.

use crate::error::ConsoleError;
use crate::net::{NetAddr, NetRange};
use ipnet::IpNet;
use std::path::PathBuf;
use std::time::Duration;

/// Ban length used when a command gives none.
pub const DEFAULT_BAN_MINUTES: i64 = 30;

/// Longest ban the console accepts, in minutes (31 days).
pub const MAX_BAN_MINUTES: i64 = 44640;

/// Reason used when a command gives none.
pub const DEFAULT_REASON: &str = "No reason given";

/// Where a command line came from.
///
/// Operator input has its ban length clamped to [`MAX_BAN_MINUTES`]; saved
/// ban lists carry the exact remaining time and are not clamped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Operator,
    Saved,
}

/// Target of an `unban` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnbanTarget {
    Addr(NetAddr),
    /// Listing position as printed by `bans`.
    Index(usize),
}

/// A parsed console command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Ban {
        addr: NetAddr,
        duration: Option<Duration>,
        reason: String,
    },
    BanRange {
        range: NetRange,
        duration: Option<Duration>,
        reason: String,
    },
    Unban(UnbanTarget),
    UnbanRange(NetRange),
    UnbanAll,
    Bans,
    BansSave(Option<PathBuf>),
    Punish {
        addr: NetAddr,
        seconds: u64,
        reason: String,
    },
    Check(NetAddr),
    Metrics,
}

impl Command {
    /// Command name as typed at the console.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Ban { .. } => "ban",
            Self::BanRange { .. } => "ban_range",
            Self::Unban(_) => "unban",
            Self::UnbanRange(_) => "unban_range",
            Self::UnbanAll => "unban_all",
            Self::Bans => "bans",
            Self::BansSave(_) => "bans_save",
            Self::Punish { .. } => "punish",
            Self::Check(_) => "check",
            Self::Metrics => "metrics",
        }
    }

    /// Parse a tokenized operator line. `tokens[0]` is the command name.
    pub fn parse(tokens: &[String]) -> Result<Self, ConsoleError> {
        Self::parse_from(tokens, Origin::Operator)
    }

    /// Parse a tokenized line from a saved ban list.
    pub fn parse_saved(tokens: &[String]) -> Result<Self, ConsoleError> {
        Self::parse_from(tokens, Origin::Saved)
    }

    pub fn parse_from(tokens: &[String], origin: Origin) -> Result<Self, ConsoleError> {
        let Some((name, args)) = tokens.split_first() else {
            return Err(ConsoleError::UnknownCommand(String::new()));
        };
        let mut args = Args::new(args, origin);

        let command = match name.as_str() {
            "ban" => {
                let addr = args.addr("ban")?;
                let duration = args.duration("ban")?;
                Self::Ban {
                    addr,
                    duration,
                    reason: args.reason(),
                }
            }
            "ban_range" => {
                let range = args.range("ban_range")?;
                let duration = args.duration("ban_range")?;
                Self::BanRange {
                    range,
                    duration,
                    reason: args.reason(),
                }
            }
            "unban" => {
                let arg = args.required("unban")?;
                let digits = arg.strip_prefix('#').unwrap_or(arg);
                if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
                    let index = digits
                        .parse()
                        .map_err(|_| invalid("unban", arg))?;
                    Self::Unban(UnbanTarget::Index(index))
                } else {
                    Self::Unban(UnbanTarget::Addr(parse_addr("unban", arg)?))
                }
            }
            "unban_range" => Self::UnbanRange(args.range("unban_range")?),
            "unban_all" => Self::UnbanAll,
            "bans" => Self::Bans,
            "bans_save" => Self::BansSave(args.next_arg().map(PathBuf::from)),
            "punish" => {
                let addr = args.addr("punish")?;
                let arg = args.required("punish")?;
                let seconds = arg.parse().map_err(|_| invalid("punish", arg))?;
                Self::Punish {
                    addr,
                    seconds,
                    reason: args.reason(),
                }
            }
            "check" => Self::Check(args.addr("check")?),
            "metrics" => Self::Metrics,
            other => return Err(ConsoleError::UnknownCommand(other.to_string())),
        };
        Ok(command)
    }
}

/// Cursor over a command's arguments.
struct Args<'a> {
    tokens: &'a [String],
    pos: usize,
    origin: Origin,
}

impl<'a> Args<'a> {
    fn new(tokens: &'a [String], origin: Origin) -> Self {
        Self {
            tokens,
            pos: 0,
            origin,
        }
    }

    fn peek(&self) -> Option<&'a str> {
        self.tokens.get(self.pos).map(String::as_str)
    }

    fn next_arg(&mut self) -> Option<&'a str> {
        let token = self.peek()?;
        self.pos += 1;
        Some(token)
    }

    fn required(&mut self, command: &'static str) -> Result<&'a str, ConsoleError> {
        self.next_arg().ok_or(ConsoleError::NeedMoreParams(command))
    }

    fn addr(&mut self, command: &'static str) -> Result<NetAddr, ConsoleError> {
        parse_addr(command, self.required(command)?)
    }

    /// `<cidr>` or `<lb> <ub>`.
    fn range(&mut self, command: &'static str) -> Result<NetRange, ConsoleError> {
        let first = self.required(command)?;
        if first.contains('/') {
            let net: IpNet = first.parse().map_err(|_| invalid(command, first))?;
            return Ok(NetRange::from_cidr(net)?);
        }
        let lb = parse_addr(command, first)?;
        let ub = self.addr(command)?;
        Ok(NetRange::new(lb, ub)?)
    }

    /// Optional `[minutes|perm]`; `None` is permanent.
    fn duration(&mut self, command: &'static str) -> Result<Option<Duration>, ConsoleError> {
        let Some(arg) = self.next_arg() else {
            return Ok(minutes_to_duration(DEFAULT_BAN_MINUTES));
        };
        if arg.eq_ignore_ascii_case("perm") {
            return Ok(None);
        }
        let minutes: i64 = arg.parse().map_err(|_| invalid(command, arg))?;
        Ok(match self.origin {
            Origin::Operator => minutes_to_duration(minutes),
            Origin::Saved => saved_minutes_to_duration(minutes),
        })
    }

    /// Remaining tokens joined by spaces, or the default reason.
    fn reason(&mut self) -> String {
        let rest = &self.tokens[self.pos.min(self.tokens.len())..];
        self.pos = self.tokens.len();
        if rest.is_empty() {
            DEFAULT_REASON.to_string()
        } else {
            rest.join(" ")
        }
    }
}

/// Clamp console minutes to `0..=MAX_BAN_MINUTES`; zero is permanent.
pub fn minutes_to_duration(minutes: i64) -> Option<Duration> {
    match minutes.clamp(0, MAX_BAN_MINUTES) {
        0 => None,
        m => Some(Duration::from_secs(m as u64 * 60)),
    }
}

/// Saved minutes are taken as is; zero or less is permanent.
fn saved_minutes_to_duration(minutes: i64) -> Option<Duration> {
    match u64::try_from(minutes) {
        Ok(0) | Err(_) => None,
        Ok(m) => Some(Duration::from_secs(m.saturating_mul(60))),
    }
}

fn parse_addr(command: &'static str, arg: &str) -> Result<NetAddr, ConsoleError> {
    arg.parse().map_err(|_| invalid(command, arg))
}

fn invalid(command: &'static str, value: &str) -> ConsoleError {
    ConsoleError::InvalidArgument {
        command,
        value: value.to_string(),
    }
}

// ============================================================================
// Tokenizer
// ============================================================================

/// Split a console line into arguments.
///
/// Whitespace separates arguments; double quotes group, and inside quotes
/// `\"`, `\\`, `\n`, `\r` and `\t` escape.
pub fn tokenize(line: &str) -> Result<Vec<String>, ConsoleError> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut in_quotes = false;
    let mut chars = line.chars();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' => in_quotes = false,
                '\\' => match chars.next() {
                    Some(next @ ('"' | '\\')) => current.push(next),
                    Some('n') => current.push('\n'),
                    Some('r') => current.push('\r'),
                    Some('t') => current.push('\t'),
                    Some(next) => {
                        current.push('\\');
                        current.push(next);
                    }
                    None => return Err(ConsoleError::UnterminatedQuote),
                },
                _ => current.push(c),
            }
            continue;
        }
        match c {
            '"' => {
                in_quotes = true;
                in_token = true;
            }
            c if c.is_whitespace() => {
                if in_token {
                    tokens.push(std::mem::take(&mut current));
                    in_token = false;
                }
            }
            _ => {
                current.push(c);
                in_token = true;
            }
        }
    }

    if in_quotes {
        return Err(ConsoleError::UnterminatedQuote);
    }
    if in_token {
        tokens.push(current);
    }
    Ok(tokens)
}

/// Quote an argument so [`tokenize`] reads it back as a single token.
///
/// Line breaks are escaped so the result always fits on one line.
pub fn quote(arg: &str) -> String {
    let mut out = String::with_capacity(arg.len() + 2);
    out.push('"');
    for c in arg.chars() {
        match c {
            '"' | '\\' => {
                out.push('\\');
                out.push(c);
            }
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            _ => out.push(c),
        }
    }
    out.push('"');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> Result<Command, ConsoleError> {
        Command::parse(&tokenize(line)?)
    }

    fn addr(s: &str) -> NetAddr {
        s.parse().unwrap()
    }

    // ========================================================================
    // Tokenizer tests
    // ========================================================================

    #[test]
    fn test_tokenize_plain_and_quoted() {
        let tokens = tokenize(r#"ban  "10.0.0.1" 60 "two words""#).unwrap();
        assert_eq!(tokens, vec!["ban", "10.0.0.1", "60", "two words"]);
        assert!(tokenize("   ").unwrap().is_empty());
        assert_eq!(tokenize(r#"a """#).unwrap(), vec!["a", ""]);
    }

    #[test]
    fn test_tokenize_escapes() {
        let tokens = tokenize(r#""say \"hi\" \\ \n\t\x""#).unwrap();
        assert_eq!(tokens, vec!["say \"hi\" \\ \n\t\\x"]);
    }

    #[test]
    fn test_tokenize_unterminated() {
        assert!(matches!(
            tokenize(r#"ban "10.0.0.1"#),
            Err(ConsoleError::UnterminatedQuote)
        ));
    }

    #[test]
    fn test_quote_reads_back() {
        for text in ["plain", "with space", r#"q"uote"#, r"back\slash", ""] {
            assert_eq!(tokenize(&quote(text)).unwrap(), vec![text.to_string()]);
        }
    }

    #[test]
    fn test_quote_keeps_line_breaks_on_one_line() {
        let text = "first line\nsecond\r\nthird\ttabbed \\n";
        let quoted = quote(text);
        assert!(!quoted.contains('\n'));
        assert!(!quoted.contains('\r'));
        assert_eq!(tokenize(&quoted).unwrap(), vec![text.to_string()]);
    }

    #[test]
    fn test_saved_minutes_not_clamped() {
        let tokens = tokenize(r#"ban 10.0.0.1 86400 "long""#).unwrap();
        match Command::parse_saved(&tokens).unwrap() {
            Command::Ban { duration, .. } => {
                assert_eq!(duration, Some(Duration::from_secs(86_400 * 60)));
            }
            other => panic!("unexpected {other:?}"),
        }
        match Command::parse(&tokens).unwrap() {
            Command::Ban { duration, .. } => {
                assert_eq!(duration, Some(Duration::from_secs(MAX_BAN_MINUTES as u64 * 60)));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    // ========================================================================
    // Command tests
    // ========================================================================

    #[test]
    fn test_ban_defaults() {
        assert_eq!(
            parse("ban 10.0.0.1").unwrap(),
            Command::Ban {
                addr: addr("10.0.0.1"),
                duration: Some(Duration::from_secs(30 * 60)),
                reason: DEFAULT_REASON.to_string(),
            }
        );
    }

    #[test]
    fn test_ban_minutes_clamped() {
        let Command::Ban { duration, reason, .. } =
            parse("ban 10.0.0.1 99999 too long").unwrap()
        else {
            panic!("expected ban");
        };
        assert_eq!(duration, Some(Duration::from_secs(44640 * 60)));
        assert_eq!(reason, "too long");

        for perm in ["ban ::1 0", "ban ::1 -5", "ban ::1 perm"] {
            let Command::Ban { duration, .. } = parse(perm).unwrap() else {
                panic!("expected ban");
            };
            assert_eq!(duration, None, "{perm}");
        }
    }

    #[test]
    fn test_ban_range_forms() {
        let expected = NetRange::new(addr("1.2.3.0"), addr("1.2.3.255")).unwrap();
        for line in [
            r#"ban_range "1.2.3.0" "1.2.3.255" perm "spam""#,
            "ban_range 1.2.3.0/24 perm spam",
        ] {
            assert_eq!(
                parse(line).unwrap(),
                Command::BanRange {
                    range: expected,
                    duration: None,
                    reason: "spam".to_string(),
                }
            );
        }
        assert!(matches!(
            parse("ban_range 1.2.3.255 1.2.3.0"),
            Err(ConsoleError::Ban(crate::error::BanError::InvalidRange))
        ));
        assert!(matches!(
            parse("ban_range 1.2.3.4/32"),
            Err(ConsoleError::Ban(crate::error::BanError::InvalidRange))
        ));
    }

    #[test]
    fn test_unban_targets() {
        assert_eq!(
            parse("unban 3").unwrap(),
            Command::Unban(UnbanTarget::Index(3))
        );
        assert_eq!(
            parse("unban #12").unwrap(),
            Command::Unban(UnbanTarget::Index(12))
        );
        assert_eq!(
            parse("unban 10.0.0.1").unwrap(),
            Command::Unban(UnbanTarget::Addr(addr("10.0.0.1")))
        );
        assert_eq!(
            parse("unban_range 10.0.0.0/8").unwrap(),
            Command::UnbanRange(NetRange::new(addr("10.0.0.0"), addr("10.255.255.255")).unwrap())
        );
    }

    #[test]
    fn test_simple_commands() {
        assert_eq!(parse("unban_all").unwrap(), Command::UnbanAll);
        assert_eq!(parse("bans").unwrap(), Command::Bans);
        assert_eq!(parse("metrics").unwrap(), Command::Metrics);
        assert_eq!(parse("bans_save").unwrap(), Command::BansSave(None));
        assert_eq!(
            parse("bans_save other.cfg").unwrap(),
            Command::BansSave(Some(PathBuf::from("other.cfg")))
        );
        assert_eq!(
            parse("punish 10.0.0.1 60 flood").unwrap(),
            Command::Punish {
                addr: addr("10.0.0.1"),
                seconds: 60,
                reason: "flood".to_string(),
            }
        );
        assert_eq!(parse("check ::1").unwrap(), Command::Check(addr("::1")));
    }

    #[test]
    fn test_bad_input() {
        assert!(matches!(parse("frobnicate"), Err(ConsoleError::UnknownCommand(c)) if c == "frobnicate"));
        assert!(matches!(parse("ban"), Err(ConsoleError::NeedMoreParams("ban"))));
        assert!(matches!(parse("punish 10.0.0.1"), Err(ConsoleError::NeedMoreParams("punish"))));
        assert!(matches!(
            parse("ban not-an-ip"),
            Err(ConsoleError::InvalidArgument { command: "ban", .. })
        ));
        assert!(matches!(
            parse("ban 10.0.0.1 soon"),
            Err(ConsoleError::InvalidArgument { command: "ban", .. })
        ));
        assert!(matches!(
            parse("punish 10.0.0.1 -1"),
            Err(ConsoleError::InvalidArgument { command: "punish", .. })
        ));
    }
}
