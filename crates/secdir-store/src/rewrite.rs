//! The rewrite protocol.
//!
//! Tables are never edited in place. A mutation streams the source table
//! into the scratch file, passing every line through a [`LineEdit`]
//! transform, then deletes the source and renames the scratch file over it.
//!
//! The delete and the rename are two steps: a crash between them leaves the
//! table only in the scratch file. There is no lock; one writer at a time.

use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use secdir_types::{DirectoryError, DirectoryResult};

use crate::edit::LineEdit;

/// Rewrite `source` through `scratch`, returning how many lines `edit`
/// replaced or removed.
///
/// Fails with [`DirectoryError::Database`] if either file cannot be opened,
/// and with whatever `edit` returns if a transform fails. On any failure
/// the scratch file is removed and `source` is left untouched.
pub(crate) fn rewrite_table<F>(source: &Path, scratch: &Path, edit: F) -> DirectoryResult<usize>
where
    F: FnMut(&str) -> DirectoryResult<LineEdit>,
{
    let input = File::open(source).map_err(|e| {
        DirectoryError::database(format!("cannot open {}: {e}", source.display()))
    })?;
    let output = File::create(scratch).map_err(|e| {
        DirectoryError::database(format!("cannot create {}: {e}", scratch.display()))
    })?;

    let edited = match stream(BufReader::new(input), BufWriter::new(output), edit) {
        Ok(edited) => edited,
        Err(e) => {
            discard(scratch);
            return Err(e);
        }
    };

    if let Err(e) = fs::remove_file(source) {
        discard(scratch);
        return Err(DirectoryError::database(format!(
            "cannot replace {}: {e}",
            source.display()
        )));
    }
    fs::rename(scratch, source).map_err(|e| {
        tracing::error!(
            source = %source.display(),
            scratch = %scratch.display(),
            error = %e,
            "table deleted but scratch file could not be renamed over it"
        );
        DirectoryError::database(format!("cannot rename {}: {e}", scratch.display()))
    })?;

    tracing::debug!(table = %source.display(), edited, "table rewritten");
    Ok(edited)
}

fn stream<R, W, F>(reader: R, mut writer: W, mut edit: F) -> DirectoryResult<usize>
where
    R: BufRead,
    W: Write,
    F: FnMut(&str) -> DirectoryResult<LineEdit>,
{
    let mut edited = 0;
    for line in reader.lines() {
        let line = line?;
        match edit(&line)? {
            LineEdit::Keep => writeln!(writer, "{line}")?,
            LineEdit::Replace(new) => {
                edited += 1;
                writeln!(writer, "{new}")?;
            }
            LineEdit::Remove => edited += 1,
        }
    }
    writer.flush()?;
    Ok(edited)
}

fn discard(scratch: &Path) {
    if let Err(e) = fs::remove_file(scratch) {
        tracing::warn!(scratch = %scratch.display(), error = %e, "failed to remove scratch file");
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
