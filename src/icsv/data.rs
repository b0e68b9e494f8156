use anyhow::{Context, Result};

use super::DATA_MARKER;
use crate::io_utils;

/// Header and rows found after `# [DATA]`, as written (not length-normalized).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DataSection {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Reads every non-blank, non-comment line after the DATA marker. The first
/// such line is the header; the rest are rows split quote-aware on
/// `delimiter`.
pub fn read_data_section(text: &str, delimiter: u8) -> Result<DataSection> {
    let mut section = DataSection::default();
    let mut header_seen = false;
    let lines = text
        .lines()
        .enumerate()
        .skip_while(|(_, line)| line.trim() != DATA_MARKER)
        .skip(1);
    for (idx, line) in lines {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let cells = io_utils::split_line(line.trim_end_matches('\r'), delimiter)
            .with_context(|| format!("Reading DATA line {}", idx + 1))?;
        if header_seen {
            section.rows.push(cells);
        } else {
            section.header = cells.iter().map(|c| c.trim().to_string()).collect();
            header_seen = true;
        }
    }
    Ok(section)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_and_rows_follow_the_marker() {
        let text = "# [METADATA]\n# a = b\n# [DATA]\n ts | ta \n\n1|2\n# note\n\"3|4\"|5\n";
        let data = read_data_section(text, b'|').expect("read data");
        assert_eq!(data.header, vec!["ts", "ta"]);
        assert_eq!(
            data.rows,
            vec![vec!["1".to_string(), "2".to_string()], vec!["3|4".into(), "5".into()]]
        );
    }

    #[test]
    fn missing_marker_yields_empty_section() {
        let data = read_data_section("a|b\n1|2\n", b'|').expect("read data");
        assert!(data.header.is_empty());
        assert!(data.rows.is_empty());
    }

    #[test]
    fn crlf_lines_are_accepted() {
        let data = read_data_section("# [DATA]\r\na;b\r\n1;2\r\n", b';').expect("read data");
        assert_eq!(data.header, vec!["a", "b"]);
        assert_eq!(data.rows[0], vec!["1", "2"]);
    }

    #[test]
    fn rows_keep_their_own_width() {
        let data = read_data_section("# [DATA]\na,b\n1,2,3\n4\n", b',').expect("read data");
        assert_eq!(data.rows[0].len(), 3);
        assert_eq!(data.rows[1].len(), 1);
    }
}
