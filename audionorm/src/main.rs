mod cli;

use std::num::NonZeroUsize;
use std::path::PathBuf;

use anyhow::{anyhow, Context};
use audionorm_core::{
    plan_outputs, run_with_progress, Config, ProgressEvent, DEFAULT_TARGET_PEAK,
};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

use crate::cli::build_cli;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let matches = build_cli().get_matches();

    let input_dir = matches
        .get_one::<PathBuf>("input_dir")
        .expect("required argument");
    if !input_dir.is_dir() {
        return Err(anyhow!(
            "input path is not a valid directory: {}",
            input_dir.display()
        ));
    }

    let output_dir = matches
        .get_one::<PathBuf>("output_dir")
        .expect("required argument");
    let target_peak = matches
        .get_one::<f32>("target_peak")
        .copied()
        .unwrap_or(DEFAULT_TARGET_PEAK);
    if target_peak > 1.0 {
        log::warn!(
            "target peak {target_peak} exceeds full scale; converting the output back to PCM will clip"
        );
    }

    let jobs = *matches
        .get_one::<NonZeroUsize>("jobs")
        .expect("defaulted argument");
    let extensions: Vec<String> = matches
        .get_one::<String>("extensions")
        .expect("defaulted argument")
        .split(',')
        .map(|ext| ext.trim().to_owned())
        .filter(|ext| !ext.is_empty())
        .collect();

    let mut builder = Config::builder(input_dir, output_dir)
        .target_peak(target_peak)
        .workers(jobs)
        .extensions(extensions);
    if let Some(log_path) = matches.get_one::<PathBuf>("log") {
        builder = builder.log_path(log_path);
    }
    let config = builder.build().with_context(|| {
        format!(
            "failed to create configuration for '{}'",
            input_dir.display()
        )
    })?;

    if matches.get_flag("dry-run") {
        let plan = plan_outputs(&config)
            .with_context(|| format!("failed to plan outputs for '{}'", input_dir.display()))?;

        if plan.is_empty() {
            println!("Dry run: no files would be processed.");
        } else {
            println!("Dry run: would write {} file(s):", plan.len());
            for path in plan {
                println!("  {}", path.display());
            }
        }

        return Ok(());
    }

    println!("Processing audio files from: {}", config.input_dir.display());
    println!("Saving normalized files to: {}", config.output_dir.display());
    println!("Target peak level: {target_peak}");

    let progress = ProgressBar::new(0);
    progress.set_draw_target(ProgressDrawTarget::stderr());
    progress.set_style(
        ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );

    let progress_handle = progress.clone();
    let report = run_with_progress(config, move |event| match event {
        ProgressEvent::Start { total } => {
            progress_handle.set_length(total as u64);
        }
        ProgressEvent::Advance { completed, .. } => {
            progress_handle.set_position(completed as u64);
        }
        ProgressEvent::Finish => {
            progress_handle.set_message("Completed");
        }
    })
    .with_context(|| format!("failed to normalize '{}'", input_dir.display()))?;

    progress.finish_and_clear();

    if report.total == 0 {
        println!("No audio files found to process.");
        return Ok(());
    }

    println!(
        "Processed {} file(s): {} succeeded, {} failed.",
        report.total, report.succeeded, report.failed
    );
    if report.failed > 0 {
        eprintln!(
            "{} file(s) could not be processed; see the batch log for details.",
            report.failed
        );
    }

    Ok(())
}
