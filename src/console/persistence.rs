//! Ban list persistence as replayable console commands.
//!
//! One command per line:
//!
//! ```text
//! ban "10.0.0.1" 60 "reason"
//! ban_range "1.2.3.0" "1.2.3.255" perm "reason"
//! ```
//!
//! Punishments are transient and never written.

use super::Console;
use super::command::{Origin, quote};
use crate::ban::{Ban, BanData, Clock, NetBan};
use crate::net::{NetAddr, NetRange};
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

/// Write every live address and range ban to `writer`. Returns the line
/// count. Entries that have lapsed but were not swept yet are left out.
pub fn write_bans<C: Clock, W: Write>(netban: &NetBan<C>, mut writer: W) -> io::Result<usize> {
    let now = netban.now();
    let mut count = 0;

    for (_, ban) in netban.addr_bans().iter() {
        if ban.info().expires.has_passed(now) {
            continue;
        }
        writeln!(writer, "ban {}", ban_line(ban, now, addr_args))?;
        count += 1;
    }
    for (_, ban) in netban.range_bans().iter() {
        if ban.info().expires.has_passed(now) {
            continue;
        }
        writeln!(writer, "ban_range {}", ban_line(ban, now, range_args))?;
        count += 1;
    }
    writer.flush()?;
    Ok(count)
}

/// Save the ban list to `path`.
///
/// Uses atomic write (temp file + rename) to prevent corruption. The temp
/// file is unique per save and removed if any step fails.
pub fn save_bans<C: Clock>(netban: &NetBan<C>, path: &Path) -> io::Result<usize> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let mut temp = NamedTempFile::new_in(dir)?;
    let count = write_bans(netban, BufWriter::new(temp.as_file_mut()))?;

    temp.persist(path).map_err(|e| e.error)?;

    debug!(path = %path.display(), count, "Ban list saved");
    Ok(count)
}

fn ban_line<T: BanData>(ban: &Ban<T>, now: i64, args: fn(&T) -> String) -> String {
    let minutes = match ban.info().expires.remaining_minutes(now) {
        Some(m) => m.max(1).to_string(),
        None => "perm".to_string(),
    };
    format!(
        "{} {} {}",
        args(ban.data()),
        minutes,
        quote(ban.info().reason.as_str())
    )
}

fn addr_args(addr: &NetAddr) -> String {
    quote(&addr.to_string())
}

fn range_args(range: &NetRange) -> String {
    format!(
        "{} {}",
        quote(&range.lb().to_string()),
        quote(&range.ub().to_string())
    )
}

impl Console {
    /// Execute saved commands line by line.
    ///
    /// Bad lines are logged and skipped. Returns the number of commands
    /// applied; blank lines and comments are not counted.
    pub fn replay<C: Clock, R: BufRead>(
        &self,
        netban: &mut NetBan<C>,
        reader: R,
    ) -> io::Result<usize> {
        let mut applied = 0;
        for (lineno, line) in reader.lines().enumerate() {
            let line = line?;
            if is_ignorable(&line) {
                continue;
            }
            match self.execute_from(netban, &line, Origin::Saved) {
                Ok(_) => applied += 1,
                Err(e) => {
                    warn!(line = lineno + 1, error = %e, code = e.error_code(), "Skipping bad ban list line");
                }
            }
        }
        Ok(applied)
    }

    /// Replay the ban list at `path`. A missing file is an empty list.
    pub fn load<C: Clock>(&self, netban: &mut NetBan<C>, path: &Path) -> io::Result<usize> {
        let file = match File::open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!(path = %path.display(), "No ban list found, starting empty");
                return Ok(0);
            }
            Err(e) => return Err(e),
        };
        let count = self.replay(netban, BufReader::new(file))?;
        info!(path = %path.display(), count, "Loaded ban list");
        Ok(count)
    }
}

pub(super) fn is_ignorable(line: &str) -> bool {
    let line = line.trim();
    line.is_empty() || line.starts_with('#')
}
