//! Field delimiter detection for raw text samples.

use log::debug;

use crate::printable_delimiter;

pub const CANDIDATE_DELIMITERS: &[u8] = b",|;:\t/";
pub const SNIFF_SAMPLE_LINES: usize = 10;

/// Guesses the delimiter of `sample` among [`CANDIDATE_DELIMITERS`].
///
/// A candidate qualifies when it splits every sampled line into the same
/// number of fields (at least two), honoring quoted cells. A single qualifier
/// wins; no qualifier or several of them fall back to the comma.
pub fn detect_delimiter(sample: &str) -> u8 {
    let qualifying = CANDIDATE_DELIMITERS
        .iter()
        .copied()
        .filter(|&delimiter| uniform_field_count(sample, delimiter).is_some())
        .collect::<Vec<_>>();
    match qualifying.as_slice() {
        [single] => *single,
        [] => {
            debug!("No consistent delimiter found in sample; defaulting to ','");
            b','
        }
        several => {
            debug!(
                "Ambiguous delimiter candidates {:?}; defaulting to ','",
                several
                    .iter()
                    .map(|d| printable_delimiter(*d))
                    .collect::<Vec<_>>()
            );
            b','
        }
    }
}

/// The iCSV output keeps the input delimiter, except that a comma becomes a
/// pipe.
pub fn output_delimiter(input: u8) -> u8 {
    if input == b',' { b'|' } else { input }
}

/// Returns the leading `lines` lines of `text`, line terminators included.
pub fn sample_lines(text: &str, lines: usize) -> &str {
    let end = text
        .match_indices('\n')
        .nth(lines.saturating_sub(1))
        .map(|(idx, _)| idx + 1)
        .unwrap_or(text.len());
    if lines == 0 { "" } else { &text[..end] }
}

fn uniform_field_count(sample: &str, delimiter: u8) -> Option<usize> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(sample.as_bytes());
    let mut expected: Option<usize> = None;
    for record in reader.records() {
        let record = record.ok()?;
        let width = record.len();
        match expected {
            None if width < 2 => return None,
            None => expected = Some(width),
            Some(count) if count != width => return None,
            Some(_) => {}
        }
    }
    expected
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comma_sample_with_times_is_comma() {
        let sample = "timestamp,ta,rh\n2020-01-01T00:00:00,10,0.5\n2020-01-01T01:00:00,12,0.55\n";
        assert_eq!(detect_delimiter(sample), b',');
    }

    #[test]
    fn semicolon_sample_is_detected() {
        let sample = "id;name;value\n1;a;2,5\n2;b;3,5\n";
        assert_eq!(detect_delimiter(sample), b';');
    }

    #[test]
    fn tab_and_pipe_samples_are_detected() {
        assert_eq!(detect_delimiter("a\tb\n1\t2\n"), b'\t');
        assert_eq!(detect_delimiter("a|b|c\n1|2|3\n"), b'|');
    }

    #[test]
    fn quoted_delimiters_do_not_split() {
        let sample = "name;note\n\"x;y\";1\nz;2\n";
        assert_eq!(detect_delimiter(sample), b';');
    }

    #[test]
    fn single_column_defaults_to_comma() {
        assert_eq!(detect_delimiter("value\n1\n2\n"), b',');
        assert_eq!(detect_delimiter(""), b',');
    }

    #[test]
    fn ambiguity_defaults_to_comma() {
        assert_eq!(detect_delimiter("a;b|c\n1;2|3\n"), b',');
    }

    #[test]
    fn comma_output_switches_to_pipe() {
        assert_eq!(output_delimiter(b','), b'|');
        assert_eq!(output_delimiter(b';'), b';');
        assert_eq!(output_delimiter(b'\t'), b'\t');
    }

    #[test]
    fn sample_lines_keeps_requested_prefix() {
        let text = "a\nb\nc\n";
        assert_eq!(sample_lines(text, 2), "a\nb\n");
        assert_eq!(sample_lines(text, 10), text);
        assert_eq!(sample_lines(text, 0), "");
    }
}
