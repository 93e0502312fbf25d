//! Line rewriting and file injection.
//!
//! Lines are compared against each [`Field`] marker in [`Field::ALL`] order.
//! A hit replaces the whole line with the canonical assignment, and later
//! fields are checked against that replacement rather than the original
//! text. Since no marker contains another, a line carrying several markers
//! ends up stamped with the first of them in check order.

use std::borrow::Cow;
use std::fs;
use std::path::Path;

use crate::error::StampError;
use crate::field::Field;
use crate::timestamp::Timestamp;

/// One rewritten line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rewrite {
    /// 1-based line number in the source.
    pub line: usize,
    /// Field written on that line.
    pub field: Field,
    /// Value written.
    pub value: i32,
}

/// What an injection pass changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InjectReport {
    lines: usize,
    rewrites: Vec<Rewrite>,
}

impl InjectReport {
    /// Number of lines in the source.
    #[must_use]
    pub fn lines(&self) -> usize {
        self.lines
    }

    /// Every rewritten line, in source order.
    #[must_use]
    pub fn rewrites(&self) -> &[Rewrite] {
        &self.rewrites
    }

    /// True when no marker was found.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rewrites.is_empty()
    }

    /// How many lines were stamped with `field`.
    #[must_use]
    pub fn count(&self, field: Field) -> usize {
        self.rewrites.iter().filter(|r| r.field == field).count()
    }

    /// Fields that had no marker line at all.
    #[must_use]
    pub fn missing(&self) -> Vec<Field> {
        Field::ALL
            .into_iter()
            .filter(|f| self.count(*f) == 0)
            .collect()
    }
}

/// Rewrite a single line.
///
/// Returns the line unchanged (borrowed) when no marker matches, otherwise
/// the canonical assignment for the field that ended up on the line.
#[must_use]
pub fn rewrite_line<'a>(line: &'a str, ts: Timestamp) -> (Cow<'a, str>, Option<Field>) {
    let mut current = Cow::Borrowed(line);
    let mut stamped = None;
    for field in Field::ALL {
        if field.matches(&current) {
            current = Cow::Owned(field.assignment(ts.value(field)));
            stamped = Some(field);
        }
    }
    (current, stamped)
}

/// Rewrite every marker line in `contents`.
///
/// Line terminators of untouched lines are preserved byte for byte; a
/// rewritten line always ends in `\n`.
#[must_use]
pub fn inject_str(contents: &str, ts: Timestamp) -> (String, InjectReport) {
    let mut out = String::with_capacity(contents.len());
    let mut report = InjectReport::default();

    for (idx, line) in contents.split_inclusive('\n').enumerate() {
        let number = idx.saturating_add(1);
        report.lines = number;
        let (text, stamped) = rewrite_line(line, ts);
        if let Some(field) = stamped {
            let value = ts.value(field);
            tracing::debug!(line = number, %field, value, "stamped");
            report.rewrites.push(Rewrite {
                line: number,
                field,
                value,
            });
        }
        out.push_str(&text);
    }

    (out, report)
}

/// Report what [`inject_file`] would change without touching the file.
///
/// # Errors
///
/// [`StampError::Read`] if the file cannot be read as UTF-8 text.
pub fn preview_file(path: &Path, ts: Timestamp) -> Result<InjectReport, StampError> {
    let contents = read(path)?;
    Ok(inject_str(&contents, ts).1)
}

/// Stamp `path` in place.
///
/// The whole file is read and transformed before anything is written, so a
/// read failure leaves it untouched. A file without markers is still
/// rewritten (with identical content).
///
/// # Errors
///
/// [`StampError::Read`] if the file cannot be read as UTF-8 text,
/// [`StampError::Write`] if the result cannot be written back.
pub fn inject_file(path: &Path, ts: Timestamp) -> Result<InjectReport, StampError> {
    let contents = read(path)?;
    let (updated, report) = inject_str(&contents, ts);

    fs::write(path, updated).map_err(|source| StampError::Write {
        path: path.to_path_buf(),
        source,
    })?;

    tracing::info!(
        path = %path.display(),
        stamp = %ts,
        rewritten = report.rewrites.len(),
        "build stamp injected"
    );
    Ok(report)
}

fn read(path: &Path) -> Result<String, StampError> {
    fs::read_to_string(path).map_err(|source| StampError::Read {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn reference() -> Timestamp {
        let dt = NaiveDate::from_ymd_opt(2024, 3, 15)
            .unwrap()
            .and_hms_opt(14, 7, 0)
            .unwrap();
        Timestamp::from_datetime(&dt)
    }

    #[test]
    fn year_line_is_offset_from_2020() {
        let (out, field) = rewrite_line("        date_time.unit.year = 23;\n", reference());
        assert_eq!(out, "        date_time.unit.year = 4;\n");
        assert_eq!(field, Some(Field::Year));
    }

    #[test]
    fn month_line_takes_current_month() {
        let (out, _) = rewrite_line("        date_time.unit.month = 1;\n", reference());
        assert_eq!(out, "        date_time.unit.month = 3;\n");
    }

    #[test]
    fn comment_line_is_borrowed_unchanged() {
        let (out, field) = rewrite_line("// comment\n", reference());
        assert!(matches!(out, Cow::Borrowed("// comment\n")));
        assert_eq!(field, None);
    }

    #[test]
    fn indentation_is_normalised() {
        let (out, _) = rewrite_line("\tdate_time.unit.hour=1; // old\n", reference());
        assert_eq!(out, "        date_time.unit.hour = 14;\n");
    }

    #[test]
    fn last_line_without_newline_gains_one() {
        let (out, report) = inject_str("x\ndate_time.unit.minute = 0;", reference());
        assert_eq!(out, "x\n        date_time.unit.minute = 7;\n");
        assert_eq!(report.lines(), 2);
    }

    #[test]
    fn line_with_two_markers_keeps_first_in_check_order() {
        let (out, field) = rewrite_line(
            "date_time.unit.minute = date_time.unit.day;\n",
            reference(),
        );
        assert_eq!(field, Some(Field::Day));
        assert_eq!(out, "        date_time.unit.day = 15;\n");
    }

    #[test]
    fn marker_inside_comment_still_matches() {
        let (out, field) = rewrite_line("// see date_time.unit.year\n", reference());
        assert_eq!(field, Some(Field::Year));
        assert_eq!(out, "        date_time.unit.year = 4;\n");
    }

    #[test]
    fn empty_input_gives_empty_output() {
        let (out, report) = inject_str("", reference());
        assert!(out.is_empty());
        assert!(report.is_empty());
        assert_eq!(report.lines(), 0);
    }

    #[test]
    fn crlf_is_kept_on_untouched_lines() {
        let (out, _) = inject_str("a\r\ndate_time.unit.day = 1;\r\nb\r\n", reference());
        assert_eq!(out, "a\r\n        date_time.unit.day = 15;\nb\r\n");
    }

    #[test]
    fn report_counts_and_missing() {
        let src = "\
int main(void) {
        date_time.unit.year = 0;
        date_time.unit.month = 1;
        date_time.unit.day = 1;
}
";
        let (_, report) = inject_str(src, reference());
        assert_eq!(report.rewrites().len(), 3);
        assert_eq!(report.rewrites()[0].line, 2);
        assert_eq!(report.count(Field::Month), 1);
        assert_eq!(report.missing(), vec![Field::Hour, Field::Minute]);
    }
}
