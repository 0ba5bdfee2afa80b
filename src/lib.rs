//! pkgrisk - rank distribution packages by security review priority
//!
//! Each roster entry is enriched from four sources (distribution metadata,
//! popularity, project analytics, vulnerability history), reduced to a risk
//! index between 0 and 15 with a fixed rubric, and ranked highest first.
//!
//! The scoring core (`profile`, `population`, `scoring`, `ranking`) is pure;
//! all I/O lives in `adapters`, `cache` and the `roster` reader.

pub mod adapters;
pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod population;
pub mod profile;
pub mod ranking;
pub mod reporters;
pub mod roster;
pub mod scoring;

pub use error::{RiskError, RiskResult};
