//! Operator roster reader
//!
//! Reads the list of packages to examine from a CSV file with a header row:
//!
//! ```text
//! Debian_Package,openhub_lookup_name,direct_network_exposure,process_network_data,potential_privilege_escalation,comment_on_priority
//! openssh-server,openssh,1,1,1,"remote login, always on"
//! ```
//!
//! Only `Debian_Package` is required. Keys are normalized; blank keys are
//! dropped and later duplicates are dropped with a warning.

use crate::models::{LookupKey, OperatorFlags, RosterEntry};
use anyhow::{bail, Context, Result};
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, warn};

pub const KEY_COLUMN: &str = "Debian_Package";
pub const ALIAS_COLUMN: &str = "openhub_lookup_name";
pub const DIRECT_EXPOSURE_COLUMN: &str = "direct_network_exposure";
pub const NETWORK_DATA_COLUMN: &str = "process_network_data";
pub const PRIVILEGE_COLUMN: &str = "potential_privilege_escalation";
pub const COMMENT_COLUMN: &str = "comment_on_priority";

pub fn load(path: &Path) -> Result<Vec<RosterEntry>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read roster {}", path.display()))?;
    let entries = parse(&content).with_context(|| format!("Invalid roster {}", path.display()))?;
    debug!("Loaded {} roster entries from {}", entries.len(), path.display());
    Ok(entries)
}

pub fn parse(content: &str) -> Result<Vec<RosterEntry>> {
    let mut records = read_records(content)?.into_iter();
    let Some(header) = records.next() else {
        bail!("roster is empty; expected a header row with a {} column", KEY_COLUMN);
    };

    let position = |name: &str| {
        header
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(name))
    };
    let Some(key_col) = position(KEY_COLUMN) else {
        bail!(
            "roster header has no {} column (found: {})",
            KEY_COLUMN,
            header.join(", ")
        );
    };
    let alias_col = position(ALIAS_COLUMN);
    let direct_col = position(DIRECT_EXPOSURE_COLUMN);
    let data_col = position(NETWORK_DATA_COLUMN);
    let privilege_col = position(PRIVILEGE_COLUMN);
    let comment_col = position(COMMENT_COLUMN);

    let mut seen = HashSet::new();
    let mut entries = Vec::new();

    for (line, record) in records.enumerate() {
        let cell = |col: Option<usize>| col.and_then(|c| record.get(c)).map_or("", String::as_str);

        let key = LookupKey::normalize(cell(Some(key_col)));
        if key.is_empty() {
            continue;
        }
        if !seen.insert(key.clone()) {
            warn!("Duplicate roster entry '{}' (row {}) ignored", key, line + 2);
            continue;
        }

        let flags = OperatorFlags {
            direct_network_exposure: is_truthy(cell(direct_col)),
            processes_network_data: is_truthy(cell(data_col)),
            privilege_escalation: is_truthy(cell(privilege_col)),
        };
        entries.push(
            RosterEntry::new(key)
                .with_alias(cell(alias_col))
                .with_flags(flags)
                .with_comment(cell(comment_col).trim()),
        );
    }

    Ok(entries)
}

fn is_truthy(cell: &str) -> bool {
    matches!(
        cell.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "y"
    )
}

/// Split CSV text into records. Handles quoted fields with embedded commas,
/// doubled quotes and line breaks. Blank lines are skipped.
fn read_records(content: &str) -> Result<Vec<Vec<String>>> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let mut records = Vec::new();
    let mut record: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = content.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => in_quotes = false,
                _ => field.push(c),
            }
            continue;
        }
        match c {
            '"' => in_quotes = true,
            ',' => record.push(std::mem::take(&mut field)),
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' | '\r' => end_record(&mut records, &mut record, &mut field),
            _ => field.push(c),
        }
    }
    if in_quotes {
        bail!("unterminated quoted field");
    }
    end_record(&mut records, &mut record, &mut field);
    Ok(records)
}

fn end_record(records: &mut Vec<Vec<String>>, record: &mut Vec<String>, field: &mut String) {
    record.push(std::mem::take(field));
    let record = std::mem::take(record);
    if record.len() == 1 && record[0].trim().is_empty() {
        return;
    }
    records.push(record);
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROSTER: &str = "\
Debian_Package,openhub_lookup_name,direct_network_exposure,process_network_data,potential_privilege_escalation,comment_on_priority
openssh-server,openssh,1,1,1,\"remote login, always on\"
  Bash ,bash,0,0,0,
libxml2,libxml2,0,yes,0,\"parses \"\"untrusted\"\" XML\"
,,1,1,1,blank key
bash,,1,1,1,duplicate
";

    #[test]
    fn test_parse_full_roster() {
        let entries = parse(ROSTER).unwrap();
        assert_eq!(entries.len(), 3);

        assert_eq!(entries[0].key.as_str(), "openssh-server");
        assert_eq!(entries[0].analytics_alias, "openssh");
        assert!(entries[0].flags.direct_network_exposure);
        assert!(entries[0].flags.privilege_escalation);
        assert_eq!(entries[0].comment, "remote login, always on");

        assert_eq!(entries[1].key.as_str(), "bash");
        assert_eq!(entries[1].flags, OperatorFlags::default());

        assert!(entries[2].flags.processes_network_data);
        assert!(!entries[2].flags.direct_network_exposure);
        assert_eq!(entries[2].comment, "parses \"untrusted\" XML");
    }

    #[test]
    fn test_only_key_column_required() {
        let entries = parse("debian_package\r\ncurl\r\nzlib1g\r\n").unwrap();
        let keys: Vec<&str> = entries.iter().map(|e| e.key.as_str()).collect();
        assert_eq!(keys, vec!["curl", "zlib1g"]);
        assert_eq!(entries[0].analytics_alias, "");
        assert_eq!(entries[0].comment, "");
    }

    #[test]
    fn test_columns_found_by_name_in_any_order() {
        let entries = parse("comment_on_priority,Debian_Package\nnote,curl\n").unwrap();
        assert_eq!(entries[0].key.as_str(), "curl");
        assert_eq!(entries[0].comment, "note");
    }

    #[test]
    fn test_missing_key_column_is_error() {
        let err = parse("package,alias\ncurl,curl\n").unwrap_err();
        assert!(err.to_string().contains("Debian_Package"));
        assert!(parse("").is_err());
    }

    #[test]
    fn test_quoted_newline_and_unterminated_quote() {
        let entries = parse("Debian_Package,comment_on_priority\ncurl,\"two\nlines\"\n").unwrap();
        assert_eq!(entries[0].comment, "two\nlines");
        assert!(parse("Debian_Package\n\"curl\n").is_err());
    }

    #[test]
    fn test_truthy_values() {
        for v in ["1", "true", "TRUE", "yes", "Y", " y "] {
            assert!(is_truthy(v), "{v}");
        }
        for v in ["", "0", "no", "false", "2", "x"] {
            assert!(!is_truthy(v), "{v}");
        }
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("projects_to_examine.csv");
        std::fs::write(&path, "\u{feff}Debian_Package\nsudo\n").unwrap();
        let entries = load(&path).unwrap();
        assert_eq!(entries[0].key.as_str(), "sudo");
        assert!(load(&dir.path().join("missing.csv")).is_err());
    }
}
