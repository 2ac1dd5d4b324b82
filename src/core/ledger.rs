//! EXPECTED_UPSTREAM ledger store.
//!
//! The ledger is a flat UTF-8 file of `destination,ref,source` records. Blank
//! lines and lines starting with `#` form a comment block that belongs to the
//! record below it. The block above the first record is the file header and is
//! kept apart from the entries so sorting never moves it.

use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use camino::{Utf8Path, Utf8PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, instrument};

use crate::core::error::{LedgerError, LedgerResult};

/// Field separator of a record line
pub const DELIMITER: char = ',';

/// Comment marker
pub const COMMENT_MARKER: char = '#';

/// One provenance record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerEntry
{
    /// Path in the destination (ojluni) tree; unique in a ledger
    pub destination: String,
    /// Tag or commit in the upstream repository
    pub upstream_ref: String,
    /// Path of the file in the upstream commit
    pub upstream_path: String,
    /// Comment/blank lines emitted verbatim above the record
    pub comment: String,
}

impl LedgerEntry
{
    pub fn new(
        destination: impl Into<String>,
        upstream_ref: impl Into<String>,
        upstream_path: impl Into<String>,
    ) -> Self
    {
        Self {
            destination: destination.into(),
            upstream_ref: upstream_ref.into(),
            upstream_path: upstream_path.into(),
            comment: String::new(),
        }
    }

    /// Parse a record line (already trimmed) with the comment block above it.
    pub fn parse(
        line: &str,
        line_number: usize,
        comment: String,
    ) -> LedgerResult<Self>
    {
        let fields: Vec<&str> = line
            .split(DELIMITER)
            .collect();

        match fields.as_slice()
        {
            [destination, upstream_ref, upstream_path]
                if !destination.is_empty()
                    && !upstream_ref.is_empty()
                    && !upstream_path.is_empty() =>
            {
                Ok(Self {
                    destination: destination.to_string(),
                    upstream_ref: upstream_ref.to_string(),
                    upstream_path: upstream_path.to_string(),
                    comment,
                })
            }
            _ => Err(LedgerError::MalformedLedgerLine {
                line_number,
                fields: fields.len(),
                line: line.to_string(),
            }),
        }
    }
}

/// Renders the record line without its comment block.
impl fmt::Display for LedgerEntry
{
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result
    {
        write!(
            f,
            "{}{DELIMITER}{}{DELIMITER}{}",
            self.destination, self.upstream_ref, self.upstream_path
        )
    }
}

/// In-memory ledger: file header, ordered entries, trailing comments
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ledger
{
    pub header: String,
    pub entries: Vec<LedgerEntry>,
    pub trailer: String,
}

impl Ledger
{
    /// Parse ledger text.
    pub fn parse(text: &str) -> LedgerResult<Self>
    {
        let mut ledger = Ledger::default();
        let mut pending = String::new();

        for (idx, raw) in text
            .split_inclusive('\n')
            .enumerate()
        {
            let stripped = raw.trim();
            if stripped.is_empty() || stripped.starts_with(COMMENT_MARKER)
            {
                pending.push_str(raw);
                if !raw.ends_with('\n')
                {
                    pending.push('\n');
                }
                continue;
            }

            let mut comment = std::mem::take(&mut pending);
            if ledger
                .entries
                .is_empty()
            {
                // The block above the first record is the file header
                ledger.header = std::mem::take(&mut comment);
            }
            ledger
                .entries
                .push(LedgerEntry::parse(stripped, idx + 1, comment)?);
        }

        if ledger
            .entries
            .is_empty()
        {
            ledger.header = pending;
        }
        else
        {
            ledger.trailer = pending;
        }

        Ok(ledger)
    }

    /// Render the ledger in file order.
    pub fn render(&self) -> String
    {
        let mut out = String::with_capacity(self.entries.len() * 96 + self.header.len());
        out.push_str(&self.header);
        for entry in &self.entries
        {
            out.push_str(&entry.comment);
            out.push_str(&entry.to_string());
            out.push('\n');
        }
        out.push_str(&self.trailer);
        out
    }

    /// Sort entries by destination path (byte order). The header stays on top.
    pub fn sort(&mut self)
    {
        self.entries
            .sort_by(|a, b| {
                a.destination
                    .cmp(&b.destination)
            });
    }

    pub fn find(
        &self,
        destination: &str,
    ) -> Option<&LedgerEntry>
    {
        self.entries
            .iter()
            .find(|e| e.destination == destination)
    }

    pub fn find_mut(
        &mut self,
        destination: &str,
    ) -> Option<&mut LedgerEntry>
    {
        self.entries
            .iter_mut()
            .find(|e| e.destination == destination)
    }

    pub fn destinations(&self) -> impl Iterator<Item = &str> + Clone
    {
        self.entries
            .iter()
            .map(|e| e.destination.as_str())
    }

    pub fn upstream_paths(&self) -> impl Iterator<Item = &str> + Clone
    {
        self.entries
            .iter()
            .map(|e| e.upstream_path.as_str())
    }
}

/// The ledger file on disk
#[derive(Debug, Clone)]
pub struct LedgerFile
{
    path: Utf8PathBuf,
}

impl LedgerFile
{
    pub fn new(path: impl Into<Utf8PathBuf>) -> Self
    {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Utf8Path
    {
        &self.path
    }

    /// Read and parse every entry.
    #[instrument(skip(self), fields(path = %self.path))]
    pub fn read_all(&self) -> LedgerResult<Ledger>
    {
        let text = fs::read_to_string(&self.path)
            .map_err(|e| LedgerError::io(self.path.as_std_path(), e))?;
        let ledger = Ledger::parse(&text)?;
        debug!(entries = ledger.entries.len(), "read ledger");
        Ok(ledger)
    }

    /// Overwrite the file with `ledger` in its current order.
    ///
    /// The new content lands next to the real file (symlinks are followed)
    /// and keeps that file's permissions.
    #[instrument(skip_all, fields(path = %self.path, entries = ledger.entries.len()))]
    pub fn write_all(
        &self,
        ledger: &Ledger,
    ) -> LedgerResult<()>
    {
        let target = self.write_target();
        let dir = match target.parent()
        {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let perms = existing_permissions(&target);

        let mut tmp = NamedTempFile::new_in(dir).map_err(|e| LedgerError::io(dir, e))?;
        tmp.write_all(
            ledger
                .render()
                .as_bytes(),
        )
        .map_err(|e| LedgerError::io(tmp.path(), e))?;
        if let Some(perms) = perms
        {
            fs::set_permissions(tmp.path(), perms).map_err(|e| LedgerError::io(tmp.path(), e))?;
        }
        tmp.persist(&target)
            .map_err(|e| LedgerError::io(&target, e.error))?;

        debug!(file = %target.display(), "wrote ledger");
        Ok(())
    }

    /// The file actually replaced on write: the symlink target when the
    /// ledger is a link, the ledger path otherwise.
    fn write_target(&self) -> PathBuf
    {
        fs::canonicalize(&self.path).unwrap_or_else(|_| {
            self.path
                .as_std_path()
                .to_path_buf()
        })
    }

    /// Append `entry` (reading the file when `existing` is None), then sort and write.
    pub fn append_and_resort(
        &self,
        entry: LedgerEntry,
        existing: Option<Ledger>,
    ) -> LedgerResult<Ledger>
    {
        let mut ledger = match existing
        {
            Some(ledger) => ledger,
            None => self.read_all()?,
        };
        ledger
            .entries
            .push(entry);
        self.sort_and_write(ledger)
    }

    /// Sort by destination path and write; returns the sorted ledger.
    pub fn sort_and_write(
        &self,
        mut ledger: Ledger,
    ) -> LedgerResult<Ledger>
    {
        ledger.sort();
        self.write_all(&ledger)?;
        Ok(ledger)
    }
}

/// Permissions to give the replacement file; new ledgers get 0644 on unix.
fn existing_permissions(target: &Path) -> Option<fs::Permissions>
{
    let current = fs::metadata(target)
        .map(|m| m.permissions())
        .ok();

    #[cfg(unix)]
    let current = current.or_else(|| {
        use std::os::unix::fs::PermissionsExt;
        Some(fs::Permissions::from_mode(0o644))
    });

    current
}
