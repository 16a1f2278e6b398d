//! Console front-end: runs an experiment in the terminal.
//!
//! Each trial's factor levels are printed in place of a rendered stimulus;
//! responses are typed as a category number or label, one per line.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::thread;

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use tracing::warn;
use tracing_subscriber::EnvFilter;

use factorial_trials::presentation::{ExperimentRunner, PresentationSurface, RunnerEvent, SystemClock};
use factorial_trials::{Error, ExperimentConfig, Trial, TrialSession};

#[derive(Parser)]
#[command(name = "factorial-trials", version, about = "Run a factorial perceptual experiment")]
struct Cli {
    /// Experiment configuration (JSON)
    config: Option<PathBuf>,

    /// Built-in experiment to run when no configuration is given
    #[arg(long, value_enum, default_value = "mass")]
    preset: Preset,

    /// Clip names for the paired presets
    #[arg(long, value_delimiter = ',', default_value = "tap,thud,clank")]
    clips: Vec<String>,

    /// Trial cap for the paired-capped preset
    #[arg(long, default_value_t = 50)]
    max_trials: usize,

    /// Override the output path
    #[arg(long)]
    output: Option<PathBuf>,

    /// Give this run its own identifier-suffixed output file
    #[arg(long)]
    run_ids: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Preset {
    #[value(name = "mass")]
    Mass,
    #[value(name = "paired")]
    Paired,
    #[value(name = "paired-capped")]
    PairedCapped,
}

/// Prints trials and prompts to stdout.
struct ConsoleSurface {
    columns: Vec<String>,
    labels: Vec<String>,
}

impl PresentationSurface for ConsoleSurface {
    fn configure(&mut self, trial: &Trial) {
        let levels: Vec<String> = self
            .columns
            .iter()
            .zip(trial.levels())
            .map(|(column, level)| format!("{column}={level}"))
            .collect();
        println!("\n  stimulus: {}", levels.join("  "));
    }

    fn set_prompt_visible(&mut self, visible: bool) {
        if visible {
            let options: Vec<String> = self
                .labels
                .iter()
                .enumerate()
                .map(|(i, label)| format!("{i}={label}"))
                .collect();
            print!("  respond [{}]: ", options.join(", "));
            if let Err(e) = io::stdout().flush() {
                warn!("failed to flush prompt: {e}");
            }
        }
    }

    fn set_status_text(&mut self, text: &str) {
        println!("{text}");
    }
}

fn load_config(cli: &Cli) -> Result<ExperimentConfig> {
    let mut config = match &cli.config {
        Some(path) => ExperimentConfig::from_json_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => match cli.preset {
            Preset::Mass => ExperimentConfig::mass_discrimination(),
            Preset::Paired => ExperimentConfig::paired_mass_audio(cli.clips.iter().cloned()),
            Preset::PairedCapped => {
                ExperimentConfig::paired_mass_audio_capped(cli.clips.iter().cloned(), cli.max_trials)
            }
        },
    };

    if let Some(output) = &cli.output {
        config.output.clone_from(output);
    }
    config.run_ids |= cli.run_ids;
    Ok(config)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if cli.verbose { "debug" } else { "info" })
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let config = load_config(&cli)?;
    let scale = config.response_scale()?;
    let sequence = config.design().build().context("building trial sequence")?;

    let surface = ConsoleSurface {
        columns: sequence.columns().to_vec(),
        labels: scale.labels().to_vec(),
    };
    let session = TrialSession::new(sequence, config.store())
        .context("starting session")?
        .with_response_scale(scale);

    let mut runner = ExperimentRunner::new(session, surface, SystemClock)
        .with_prompt(config.prompt.clone())
        .with_prompt_delay(config.prompt_delay());
    runner.start()?;

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        if let Some(wait) = runner.remaining_delay() {
            thread::sleep(wait);
        }
        runner.poll();

        let Some(line) = lines.next() else {
            bail!("input closed before the experiment finished");
        };
        let line = line?;

        let Some(category) = runner.session().response_scale().parse(&line) else {
            println!("  unrecognized response '{}'", line.trim());
            runner.surface_mut().set_prompt_visible(true);
            continue;
        };

        match runner.on_response(category) {
            Ok(RunnerEvent::Complete { .. }) => return Ok(()),
            Ok(RunnerEvent::Next { .. } | RunnerEvent::Ignored) => {}
            Err(e @ Error::StorageWriteFailed { .. }) => return Err(e.into()),
            Err(e) => println!("  {e}"),
        }
    }
}
