//! Analyze command implementation
//!
//! 1. Resolve settings and load the local inputs  (setup.rs)
//! 2. Wire the remote adapters onto the document cache
//! 3. Run the pipeline with a progress bar
//! 4. Assemble the report and write it            (output.rs)

mod output;
mod setup;

use output::{check_fail_threshold, format_and_output, print_run_summary};
use setup::{apply_config_defaults, create_bar_style, load_inputs, print_header};

use crate::adapters::{OpenHubClient, SecurityTracker, Sources};
use crate::cache::DocumentCache;
use crate::cli::AnalyzeArgs;
use crate::config::{load_project_config, UserConfig};
use crate::pipeline::Pipeline;
use crate::ranking::Report;

use anyhow::Result;
use indicatif::ProgressBar;
use std::path::Path;
use std::time::Instant;
use tracing::info;

/// Run the analyze command.
pub fn run(workdir: &Path, args: &AnalyzeArgs, workers: usize, quiet: bool) -> Result<()> {
    let start = Instant::now();
    let project_config = load_project_config(workdir);
    let user = UserConfig::load(workdir)?;
    let config = apply_config_defaults(workdir, args, workers, quiet, &project_config)?;

    let inputs = load_inputs(&config)?;
    print_header(&config, &user, inputs.roster.len());

    let cache = if config.offline {
        DocumentCache::offline(&config.cache_dir)
    } else {
        DocumentCache::new(&config.cache_dir, config.timeout)
    };
    let analytics = OpenHubClient::new(cache.clone(), user.api_key().map(str::to_string));
    if !analytics.has_api_key() {
        info!("No OpenHub API key; project analytics come from the cache only");
    }
    let vulnerabilities = SecurityTracker::new(cache, config.epoch_year);

    let sources = Sources {
        distribution: &inputs.distribution,
        popularity: &inputs.popularity,
        analytics: &analytics,
        vulnerabilities: &vulnerabilities,
    };

    let bar = if config.quiet {
        ProgressBar::hidden()
    } else {
        let bar = ProgressBar::new(inputs.roster.len() as u64);
        bar.set_style(create_bar_style());
        bar
    };
    let progress = bar.clone();
    let pipeline = Pipeline::new(sources)
        .with_workers(config.workers)
        .on_progress(Box::new(move |package, done, _total| {
            progress.set_position(done as u64);
            progress.set_message(package.to_string());
        }));

    let outcome = pipeline.run(&inputs.roster);
    bar.finish_and_clear();
    let outcome = outcome?;
    print_run_summary(&outcome, config.quiet);

    let report = Report::assemble(&outcome.ranked, config.epoch_year);
    format_and_output(&report, &config)?;

    info!("Analysis finished in {:?}", start.elapsed());
    check_fail_threshold(config.fail_on, &outcome)
}
