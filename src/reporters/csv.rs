//! CSV reporter
//!
//! Header row plus one row per package. Non-ASCII characters are replaced
//! with spaces and cells are trimmed, so the file opens cleanly in any
//! spreadsheet. Fields are quoted only when needed (RFC 4180).

use crate::ranking::Report;
use anyhow::Result;

const LINE_END: &str = "\r\n";

pub fn render(report: &Report) -> Result<String> {
    let mut out = String::new();
    write_record(&mut out, report.headers.iter().map(String::as_str));
    for row in &report.rows {
        write_record(&mut out, row.cells.iter().map(String::as_str));
    }
    Ok(out)
}

fn write_record<'a>(out: &mut String, cells: impl Iterator<Item = &'a str>) {
    for (i, cell) in cells.enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(&quote(&ascii_fold(cell)));
    }
    out.push_str(LINE_END);
}

/// Replace every non-ASCII character with a space, then trim.
pub(crate) fn ascii_fold(value: &str) -> String {
    value
        .chars()
        .map(|c| if c.is_ascii() { c } else { ' ' })
        .collect::<String>()
        .trim()
        .to_string()
}

fn quote(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reporters::tests::test_report;

    #[test]
    fn test_header_and_rows() {
        let out = render(&test_report()).unwrap();
        let lines: Vec<&str> = out.split(LINE_END).collect();
        // header, two rows, trailing empty piece
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("project_name,debian_source,debian_version,"));
        assert!(lines[0].contains(",cve_since_2010,"));
        assert!(lines[0].contains(",risk_index(max = 15),risk_index components,"));
        assert!(lines[1].starts_with("openssh-server,openssh,1:9.2p1-2,"));
        assert!(lines[2].starts_with("python3-doc,"));
        assert_eq!(lines[3], "");
    }

    #[test]
    fn test_cells_with_commas_are_quoted() {
        let out = render(&test_report()).unwrap();
        assert!(out.contains("\"secure shell (SSH) server, for secure access\""));
        assert!(out.contains(
            "\"Website points: 1, CVE: 2, 12-month contributor: 4, Popularity: 2, \
             Language: 2, Exposure: 2, Data only: 0\""
        ));
    }

    #[test]
    fn test_non_ascii_replaced() {
        let out = render(&test_report()).unwrap();
        assert!(out.contains("Caf  | remote login"));
        assert!(out.is_ascii());
    }

    #[test]
    fn test_quote_and_fold() {
        assert_eq!(quote("plain"), "plain");
        assert_eq!(quote("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(quote("a\nb"), "\"a\nb\"");
        assert_eq!(ascii_fold("  naïve  "), "na ve");
        assert_eq!(ascii_fold("ünï"), "n");
    }
}
