#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Per-MLS annotation loading.
//!
//! The notes file is hand-maintained, one listing per line:
//!
//! ```text
//! 26295500, no, dark kitchen and bad_internet
//! 26301234, yes
//! 26309999
//! ```
//!
//! A bare MLS number is the legacy blocklist form and means
//! `keep = false`. The keep column is negative only for
//! `n` / `no` / `false` / `f` (case-insensitive); anything else keeps the
//! listing. Everything after the second comma is the note, verbatim.
//!
//! Malformed lines are logged and skipped, never guessed at.

use std::collections::BTreeMap;
use std::path::Path;

use property_map_listings_models::Annotation;

/// Keep-column values that mark a listing as discarded.
const NEGATIVE_KEEP: &[&str] = &["n", "no", "false", "f"];

/// Errors from annotation loading.
#[derive(Debug, thiserror::Error)]
pub enum AnnotationError {
    /// I/O error reading the notes file.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path that caused the error.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

/// Loads the notes file into a per-MLS annotation lookup.
///
/// # Errors
///
/// Returns [`AnnotationError`] if the file cannot be read. Individual
/// malformed lines are logged and skipped instead.
pub fn load_notes_file(path: &Path) -> Result<BTreeMap<i64, Annotation>, AnnotationError> {
    let content = std::fs::read_to_string(path).map_err(|e| AnnotationError::Io {
        path: path.display().to_string(),
        source: e,
    })?;

    let annotations = parse_notes(&content);
    log::info!(
        "Loaded {} annotations from {}",
        annotations.len(),
        path.display()
    );

    Ok(annotations)
}

/// Parses notes-file content. Later lines win on duplicate MLS numbers.
#[must_use]
pub fn parse_notes(content: &str) -> BTreeMap<i64, Annotation> {
    let mut annotations = BTreeMap::new();

    for (line_no, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let mut fields = line.splitn(3, ',');
        let mls_field = fields.next().unwrap_or_default().trim();

        let Ok(mls_number) = mls_field.parse::<i64>() else {
            log::warn!("notes line {}: unparseable MLS number {mls_field:?}, skipping", line_no + 1);
            continue;
        };

        let keep = fields
            .next()
            .is_some_and(|field| !NEGATIVE_KEEP.contains(&field.trim().to_lowercase().as_str()));

        let note = fields
            .next()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(ToString::to_string);

        annotations.insert(mls_number, Annotation { keep, note });
    }

    annotations
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_mls_number_means_discard() {
        let notes = parse_notes("26295500\n");
        assert!(!notes[&26_295_500].keep);
        assert_eq!(notes[&26_295_500].note, None);
    }

    #[test]
    fn explicit_yes_keeps() {
        let notes = parse_notes("26295500, yes\n");
        assert!(notes[&26_295_500].keep);
    }

    #[test]
    fn negative_forms_discard_case_insensitively() {
        for form in ["n", "No", "FALSE", "f"] {
            let notes = parse_notes(&format!("1, {form}\n"));
            assert!(!notes[&1].keep, "{form} should discard");
        }
    }

    #[test]
    fn unrecognized_keep_value_keeps() {
        let notes = parse_notes("1, maybe\n");
        assert!(notes[&1].keep);
    }

    #[test]
    fn note_preserves_embedded_commas() {
        let notes = parse_notes("1, no, dark kitchen, bad_internet\n");
        assert_eq!(
            notes[&1].note.as_deref(),
            Some("dark kitchen, bad_internet")
        );
    }

    #[test]
    fn malformed_mls_lines_are_skipped() {
        let notes = parse_notes("not-a-number, yes, hmm\n2, yes\n");
        assert_eq!(notes.len(), 1);
        assert!(notes.contains_key(&2));
    }

    #[test]
    fn blank_lines_are_ignored() {
        let notes = parse_notes("\n\n1, yes\n\n");
        assert_eq!(notes.len(), 1);
    }

    #[test]
    fn later_duplicate_wins() {
        let notes = parse_notes("1, yes\n1, no, changed my mind\n");
        assert!(!notes[&1].keep);
        assert_eq!(notes[&1].note.as_deref(), Some("changed my mind"));
    }
}
