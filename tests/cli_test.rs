//! CLI contract tests
//!
//! Runs the binary offline against a small workspace: roster, distribution
//! dump, popularity table and a pre-seeded document cache.

use pkgrisk::adapters::{openhub, security_tracker};
use pkgrisk::cache::{DocumentCache, DocumentRequest};
use std::path::Path;
use std::process::{Command, Output};

const ROSTER: &str = "\
Debian_Package,openhub_lookup_name,direct_network_exposure,process_network_data,potential_privilege_escalation,comment_on_priority
openssh-server,openssh,1,1,1,\"remote login, always on\"
python3-doc,,0,0,0,docs only
";

const DUMP: &str = "\
Package: openssh-server
Source: openssh
Version: 1:9.2p1-2
Description: secure shell (SSH) server, for secure access from remote machines
Tag: implemented-in::c, interface::daemon, network::server, role::program

Package: python3-doc
Source: python3-defaults
Version: 3.11.2-1
Description: documentation for the high-level object-oriented language Python 3
Homepage: https://www.python.org/
Tag: made-of::html, role::documentation
";

const BY_INST: &str = "\
#rank name                            inst  vote   old recent no-files (maintainer)
1     dpkg                            190    180     5     5     0 (Dpkg Developers)
2     openssh-server                  150    120    10    20     0 (Debian OpenSSH Maintainers)
5     python3-doc                      40     10    20    10     0 (Matthias Klose)
--------------------------------------------------------------------------------
200   Total                          1000    500   200   300     0
";

const OPENSSH_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<response>
  <status>success</status>
  <result>
    <project>
      <name>OpenSSH</name>
      <homepage_url></homepage_url>
      <analysis>
        <twelve_month_contributor_count>0</twelve_month_contributor_count>
        <main_language_name>C</main_language_name>
      </analysis>
      <licenses><license><name>BSD-2-Clause</name></license></licenses>
    </project>
  </result>
</response>"#;

const OPENSSH_TRACKER: &str = r#"<html><body><table>
<tr><td><a href="/tracker/CVE-2023-38408">CVE-2023-38408</a></td></tr>
<tr><td><a href="/tracker/CVE-2021-41617">CVE-2021-41617</a></td></tr>
<tr><td><a href="/tracker/CVE-2016-10009">CVE-2016-10009</a></td></tr>
<tr><td><a href="/tracker/CVE-2006-5051">CVE-2006-5051</a></td></tr>
</table></body></html>"#;

fn pkgrisk_bin() -> &'static str {
    env!("CARGO_BIN_EXE_pkgrisk")
}

fn setup_workspace() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("projects_to_examine.csv"), ROSTER).unwrap();
    std::fs::write(dir.path().join("apt_cache_dumpavail.txt"), DUMP).unwrap();
    std::fs::write(dir.path().join("by_inst"), BY_INST).unwrap();

    let cache = DocumentCache::offline(dir.path().join("cache"));
    cache
        .store(
            &DocumentRequest::new(
                openhub::NAMESPACE,
                format!("{}/openssh.xml", openhub::DEFAULT_BASE_URL),
                "xml",
            ),
            OPENSSH_XML,
        )
        .unwrap();
    cache
        .store(
            &DocumentRequest::new(
                security_tracker::NAMESPACE,
                format!("{}/openssh", security_tracker::DEFAULT_BASE_URL),
                "html",
            ),
            OPENSSH_TRACKER,
        )
        .unwrap();
    dir
}

fn run_analyze(dir: &Path, extra_args: &[&str]) -> Output {
    Command::new(pkgrisk_bin())
        .args(["analyze", "-q", "--offline", "--cache-dir", "cache"])
        .args(extra_args)
        .current_dir(dir)
        .env_remove("OPENHUB_API_KEY")
        .env_remove("RUST_LOG")
        .output()
        .unwrap()
}

fn json_rows(output: &Output) -> Vec<serde_json::Value> {
    let stdout = String::from_utf8_lossy(&output.stdout);
    serde_json::from_str(&stdout).unwrap()
}

#[test]
fn test_default_run_writes_results_csv() {
    let dir = setup_workspace();
    let output = run_analyze(dir.path(), &[]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let csv = std::fs::read_to_string(dir.path().join("results.csv")).unwrap();
    let lines: Vec<&str> = csv.split("\r\n").collect();
    assert!(lines[0].starts_with("project_name,debian_source,"));
    assert!(lines[0].contains("cve_since_2010"));
    assert!(lines[1].starts_with("openssh-server,openssh,"));
    assert!(lines[1].contains("\"remote login, always on\""));
    assert!(lines[2].starts_with("python3-doc,python3-defaults,"));
}

#[test]
fn test_json_scores_from_cached_documents() {
    let dir = setup_workspace();
    let output = run_analyze(dir.path(), &["-f", "json"]);
    assert!(output.status.success());

    let rows = json_rows(&output);
    assert_eq!(rows.len(), 2);
    let sshd = &rows[0];
    assert_eq!(sshd["project_name"], "openssh-server");
    assert_eq!(sshd["cve_since_2010"], "3");
    assert_eq!(sshd["twelve_month_contributor_count"], "0");
    assert_eq!(sshd["licenses"], "BSD-2-Clause");
    assert_eq!(sshd["popularity_rank"], "2");
    // website 1, language 2, CVE 2, contributors 5, popularity 2, exposure 2
    assert_eq!(sshd["risk_index(max = 15)"], "14");

    let docs = &rows[1];
    assert_eq!(docs["project_name"], "python3-doc");
    // tracker page not cached: CVE 3, contributors 2, popularity 1, data only -3
    assert_eq!(docs["cve_since_2010"], "");
    assert_eq!(docs["risk_index(max = 15)"], "3");
}

#[test]
fn test_cve_since_changes_epoch() {
    let dir = setup_workspace();
    let output = run_analyze(dir.path(), &["-f", "json", "--cve-since", "2023"]);
    assert!(output.status.success());

    let rows = json_rows(&output);
    assert_eq!(rows[0]["cve_since_2023"], "1");
    assert_eq!(rows[0]["risk_index(max = 15)"], "13");
}

#[test]
fn test_fail_on_threshold() {
    let dir = setup_workspace();
    let output = run_analyze(dir.path(), &["-o", "out.csv", "--fail-on", "14"]);
    assert_eq!(output.status.code(), Some(1));
    // The report is still written before failing
    assert!(dir.path().join("out.csv").exists());

    let output = run_analyze(dir.path(), &["-o", "out.csv", "--fail-on", "15"]);
    assert_eq!(output.status.code(), Some(0));
}

#[test]
fn test_missing_total_fails_the_run() {
    let dir = setup_workspace();
    let without_total: String = BY_INST
        .lines()
        .filter(|l| !l.contains("Total"))
        .map(|l| format!("{}\n", l))
        .collect();
    std::fs::write(dir.path().join("by_inst"), without_total).unwrap();

    let output = run_analyze(dir.path(), &[]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Total"));
    assert!(!dir.path().join("results.csv").exists());
}

#[test]
fn test_missing_roster_points_to_doctor() {
    let dir = setup_workspace();
    std::fs::remove_file(dir.path().join("projects_to_examine.csv")).unwrap();

    let output = run_analyze(dir.path(), &[]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("pkgrisk doctor"));
}

#[test]
fn test_text_top_limits_rows() {
    let dir = setup_workspace();
    let output = run_analyze(dir.path(), &["-f", "text", "--top", "1"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("openssh-server"));
    assert!(!stdout.contains("python3-doc"));
}

#[test]
fn test_thresholds_command() {
    let dir = setup_workspace();
    let output = Command::new(pkgrisk_bin())
        .arg("thresholds")
        .current_dir(dir.path())
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stdout = console::strip_ansi_codes(&stdout);
    assert!(stdout.contains("200"));
    assert!(stdout.contains("rank <= 2 "));
    assert!(stdout.contains("rank <= 10 "));
}

