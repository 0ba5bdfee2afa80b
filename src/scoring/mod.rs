//! Risk Scoring
//!
//! Reduces a [`PackageProfile`](crate::profile::PackageProfile) to an
//! itemized point breakdown and a single risk index.
//!
//! # Rubric
//!
//! ```text
//! Website presence      both homepages empty                     +1
//! Language              C or C++ (analytics or distribution)     +2
//! Vulnerabilities       "0"→0  "1"→1  "2"→2  "3"→2  other→3     0..3
//! Recent contributors   "0"→5  "1".."3"→4  ""→2  other→0        0..5
//! Popularity tier       rank ≤ 1% cut-off → 2, ≤ 5% → 1           0..2
//! Role penalty          role mentions data/documentation         -3
//! Exposure              direct 2, else network data 1,
//!                       else privilege escalation 1             0..2
//!
//! Risk index = max(0, sum)
//! ```
//!
//! The lookup tables route every unexpected value, including a missing one,
//! to their fallback branch. An unknown CVE count scores as the worst case.
//!
//! # Example
//!
//! A C++ library with no homepage, 2 CVEs, one active contributor, ranked at
//! the 1% cut-off and directly network exposed:
//!
//! 1 + 2 + 2 + 4 + 2 + 0 + 2 = 13

mod rubric;

pub use rubric::{
    contributor_points, exposure_points, language_points, popularity_points, role_penalty, score,
    vulnerability_points, website_points, ScoreBreakdown, MAX_RISK_INDEX,
};
