//! Ranking and report assembly
//!
//! Orders scored packages by risk index and projects them into flat report
//! rows. No I/O happens here; the reporters consume the [`Report`].

use crate::profile::PackageProfile;
use crate::scoring::{ScoreBreakdown, MAX_RISK_INDEX};
use serde::Serialize;
use std::sync::OnceLock;

/// A profile with its breakdown attached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoredPackage {
    pub profile: PackageProfile,
    pub breakdown: ScoreBreakdown,
}

impl ScoredPackage {
    pub fn risk_index(&self) -> u32 {
        self.breakdown.risk_index
    }
}

/// Descending by risk index. Equal scores keep their input order.
pub fn rank(mut packages: Vec<ScoredPackage>) -> Vec<ScoredPackage> {
    // slice::sort_by is stable
    packages.sort_by(|a, b| b.risk_index().cmp(&a.risk_index()));
    packages
}

/// Risk index column; the name carries the rubric maximum.
pub fn risk_index_column() -> &'static str {
    static COLUMN: OnceLock<String> = OnceLock::new();
    COLUMN.get_or_init(|| format!("risk_index(max = {})", MAX_RISK_INDEX))
}

pub const COMPONENTS_COLUMN: &str = "risk_index components";

/// Column names in report order. The vulnerability column carries the
/// epoch year the counts were taken from.
pub fn headers(epoch_year: u16) -> Vec<String> {
    [
        "project_name",
        "debian_source",
        "debian_version",
        "debian_desc",
        "debian_home",
    ]
    .into_iter()
    .map(str::to_string)
    .chain(std::iter::once(format!("cve_since_{}", epoch_year)))
    .chain(
        [
            "cve_page",
            "openhub_page",
            "openhub_name",
            "openhub_desc",
            "openhub_home",
            "openhub_download",
            "twelve_month_contributor_count",
            "total_contributor_count",
            "total_code_lines",
            "main_language_name",
            "licenses",
            "fact_activity",
            "fact_age",
            "fact_comments",
            "fact_team_size",
            "package_popularity",
            "popularity_rank",
            "implemented_in",
            "role",
            "direct_network_exposure",
            "process_network_data",
            "potential_privilege_escalation",
            risk_index_column(),
            COMPONENTS_COLUMN,
            "comment_on_priority",
        ]
        .into_iter()
        .map(str::to_string),
    )
    .collect()
}

/// One output line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRow {
    pub cells: Vec<String>,
}

impl ReportRow {
    pub fn project(package: &ScoredPackage) -> Self {
        let p = &package.profile;
        let flag = |set: bool| if set { "1" } else { "0" }.to_string();
        let rank = if p.popularity.is_ranked() {
            p.popularity.rank.to_string()
        } else {
            String::new()
        };

        let cells = vec![
            p.key.to_string(),
            p.distribution.source.clone(),
            p.distribution.version.clone(),
            p.distribution.description.clone(),
            p.distribution.homepage.clone(),
            p.vulnerabilities.count.clone(),
            p.vulnerabilities.page.clone(),
            p.analytics.page.clone(),
            p.analytics.name.clone(),
            p.analytics.description.clone(),
            p.analytics.homepage.clone(),
            p.analytics.download_url.clone(),
            p.analytics.twelve_month_contributors.clone(),
            p.analytics.total_contributors.clone(),
            p.analytics.total_code_lines.clone(),
            p.analytics.main_language.clone(),
            p.analytics.licenses.join(" "),
            p.analytics.activity_note.clone(),
            p.analytics.age_note.clone(),
            p.analytics.comment_note.clone(),
            p.analytics.team_size_note.clone(),
            p.popularity.count.clone(),
            rank,
            p.distribution.implemented_in.clone(),
            p.distribution.role.clone(),
            flag(p.flags.direct_network_exposure),
            flag(p.flags.processes_network_data),
            flag(p.flags.privilege_escalation),
            package.risk_index().to_string(),
            package.breakdown.components(),
            p.comment.clone(),
        ];
        Self { cells }
    }
}

/// Ranked rows plus their column names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub headers: Vec<String>,
    pub rows: Vec<ReportRow>,
}

impl Report {
    /// Project already-ranked packages, keeping their order.
    pub fn assemble(ranked: &[ScoredPackage], epoch_year: u16) -> Self {
        Self {
            headers: headers(epoch_year),
            rows: ranked.iter().map(ReportRow::project).collect(),
        }
    }

    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Cell of `row` under column `name`, empty when the column is unknown.
    pub fn cell<'a>(&self, row: &'a ReportRow, name: &str) -> &'a str {
        self.column(name)
            .and_then(|i| row.cells.get(i))
            .map_or("", String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
