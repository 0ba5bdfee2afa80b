//! Rubric rules and the score breakdown

use crate::models::OperatorFlags;
use crate::population::PopulationStatistics;
use crate::profile::PackageProfile;
use serde::Serialize;

/// Highest risk index the rubric can produce.
pub const MAX_RISK_INDEX: u32 = 15;

const ROLE_PENALTY: i32 = -3;

/// Itemized points for one package
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScoreBreakdown {
    pub website: i32,
    pub language: i32,
    pub vulnerabilities: i32,
    pub contributors: i32,
    pub popularity: i32,
    /// Zero or negative
    pub role_penalty: i32,
    pub exposure: i32,
    /// Sum of the above, floored at zero
    pub risk_index: u32,
}

impl ScoreBreakdown {
    fn from_parts(
        website: i32,
        language: i32,
        vulnerabilities: i32,
        contributors: i32,
        popularity: i32,
        role_penalty: i32,
        exposure: i32,
    ) -> Self {
        let mut breakdown = Self {
            website,
            language,
            vulnerabilities,
            contributors,
            popularity,
            role_penalty,
            exposure,
            risk_index: 0,
        };
        breakdown.risk_index = breakdown.raw_sum().max(0) as u32;
        breakdown
    }

    /// Sum before the zero floor.
    pub fn raw_sum(&self) -> i32 {
        self.website
            + self.language
            + self.vulnerabilities
            + self.contributors
            + self.popularity
            + self.role_penalty
            + self.exposure
    }

    /// Human-readable component string for reports.
    pub fn components(&self) -> String {
        format!(
            "Website points: {}, CVE: {}, 12-month contributor: {}, Popularity: {}, \
             Language: {}, Exposure: {}, Data only: {}",
            self.website,
            self.vulnerabilities,
            self.contributors,
            self.popularity,
            self.language,
            self.exposure,
            self.role_penalty
        )
    }
}

/// Score one profile against the run's population statistics. Pure.
pub fn score(profile: &PackageProfile, stats: &PopulationStatistics) -> ScoreBreakdown {
    ScoreBreakdown::from_parts(
        website_points(&profile.distribution.homepage, &profile.analytics.homepage),
        language_points(
            &profile.analytics.main_language,
            &profile.distribution.implemented_in,
        ),
        vulnerability_points(&profile.vulnerabilities.count),
        contributor_points(&profile.analytics.twelve_month_contributors),
        popularity_points(profile.popularity.rank, stats),
        role_penalty(&profile.distribution.role),
        exposure_points(&profile.flags),
    )
}

pub fn website_points(distribution_homepage: &str, analytics_homepage: &str) -> i32 {
    if distribution_homepage.is_empty() && analytics_homepage.is_empty() {
        1
    } else {
        0
    }
}

pub fn language_points(main_language: &str, implemented_in: &str) -> i32 {
    let is_c_family = |lang: &str| matches!(lang.trim().to_uppercase().as_str(), "C" | "C++");
    if is_c_family(main_language) || is_c_family(implemented_in) {
        2
    } else {
        0
    }
}

/// Keyed by the exact count string; anything else is the worst case.
pub fn vulnerability_points(count: &str) -> i32 {
    match count {
        "0" => 0,
        "1" => 1,
        "2" | "3" => 2,
        _ => 3,
    }
}

/// Keyed by the exact twelve-month contributor string.
pub fn contributor_points(twelve_month: &str) -> i32 {
    match twelve_month {
        "0" => 5,
        "1" | "2" | "3" => 4,
        "" => 2,
        _ => 0,
    }
}

pub fn popularity_points(rank: u64, stats: &PopulationStatistics) -> i32 {
    if rank <= stats.one_percent() {
        2
    } else if rank <= stats.five_percent() {
        1
    } else {
        0
    }
}

pub fn role_penalty(role: &str) -> i32 {
    let role = role.to_lowercase();
    if role.contains("data") || role.contains("documentation") {
        ROLE_PENALTY
    } else {
        0
    }
}

/// First matching flag wins; flags never add up.
pub fn exposure_points(flags: &OperatorFlags) -> i32 {
    if flags.direct_network_exposure {
        2
    } else if flags.processes_network_data || flags.privilege_escalation {
        1
    } else {
        0
    }
}
