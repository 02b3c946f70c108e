// Copyright (c) The pantest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{
    errors::{ExpectedError, Result},
    output::{OutputContext, OutputOpts, OutputWriter, clap_styles},
};
use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};
use pantest_metadata::PantestExitCode;
use pantest_runner::{
    config::{PantestConfig, decide_max_workers, init_config_file},
    corpus::TestCorpus,
    helpers::plural,
    reporter::TestReporterBuilder,
    runner::{TestRunner, TestRunnerBuilder},
};
use std::{io::Write, num::NonZeroUsize};
use supports_color::Stream;
use tracing::info;

/// A concurrent test harness.
///
/// Runs candidate executables against a corpus of `<name>.in`/`<name>.ref` pairs, or compares two
/// candidates against each other on generated inputs.
#[derive(Debug, Parser)]
#[command(
    version,
    name = "pantest",
    styles = clap_styles::style(),
    max_term_width = 100
)]
pub struct PantestApp {
    #[command(flatten)]
    output: OutputOpts,

    #[command(subcommand)]
    command: Command,
}

impl PantestApp {
    /// Initializes logging and color support, returning the output context.
    pub fn init_output(&self) -> OutputContext {
        self.output.init()
    }

    /// Executes the app, returning the exit code of the process.
    pub fn exec(self, output: OutputContext, output_writer: &mut OutputWriter) -> Result<i32> {
        match self.command {
            Command::Init { path } => {
                init_config_file(&path)?;
                info!("wrote config file to {path}");
                Ok(PantestExitCode::OK)
            }
            Command::Run { config_opts } => {
                let config = config_opts.make_config()?;
                let corpus = TestCorpus::discover(config.input_dir(), config.ref_dir())?;
                let runner = make_runner(&config)?;

                let mut writer = output_writer.stdout_writer();
                writeln!(
                    writer,
                    "Using {} {}.",
                    corpus.len(),
                    plural::tests_str(corpus.len())
                )
                .map_err(ExpectedError::write_output_error)?;
                writeln!(
                    writer,
                    "Using {} max {}.",
                    runner.workers(),
                    plural::workers_str(runner.workers())
                )
                .map_err(ExpectedError::write_output_error)?;
                if output.verbose {
                    for candidate in config.candidates() {
                        writeln!(
                            writer,
                            "  {}: {}",
                            candidate.name(),
                            candidate.command().join(" ")
                        )
                        .map_err(ExpectedError::write_output_error)?;
                    }
                }
                writeln!(writer).map_err(ExpectedError::write_output_error)?;
                writer.flush().map_err(ExpectedError::write_output_error)?;
                drop(writer);

                let mut reporter = make_reporter(output).build(output_writer.reporter_output());
                runner
                    .try_execute_run(&corpus, config.candidates(), |event| {
                        reporter.report_event(event)
                    })
                    .map_err(ExpectedError::from_execute_errors)?;
                Ok(PantestExitCode::OK)
            }
            Command::Same {
                config_opts,
                rounds,
                candidate1,
                candidate2,
            } => {
                let config = config_opts.make_config()?;
                let generator = config.generator()?;
                let candidates = [
                    config.find_candidate(&candidate1)?,
                    config.find_candidate(&candidate2)?,
                ];
                generator.create_scratch_dir()?;
                let runner = make_runner(&config)?;

                let mut writer = output_writer.stdout_writer();
                writeln!(
                    writer,
                    "Running {rounds} {} with {} {}.",
                    plural::rounds_str(rounds),
                    runner.workers(),
                    plural::workers_str(runner.workers()),
                )
                .map_err(ExpectedError::write_output_error)?;
                for (i, candidate) in candidates.iter().enumerate() {
                    writeln!(
                        writer,
                        "{}. {}\t({:.2}s timeout)",
                        i + 1,
                        candidate.name(),
                        candidate.timeout().as_secs_f64()
                    )
                    .map_err(ExpectedError::write_output_error)?;
                }
                writeln!(writer).map_err(ExpectedError::write_output_error)?;
                writer.flush().map_err(ExpectedError::write_output_error)?;
                drop(writer);

                let mut reporter = make_reporter(output).build(output_writer.reporter_output());
                runner
                    .try_execute_same(rounds, candidates, generator, |event| {
                        reporter.report_event(event)
                    })
                    .map_err(ExpectedError::from_execute_errors)?;
                Ok(PantestExitCode::OK)
            }
        }
    }
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Create a commented config file
    Init {
        /// Where to write the config file
        #[arg(default_value = PantestConfig::CONFIG_PATH, value_name = "PATH")]
        path: Utf8PathBuf,
    },
    /// Run every candidate against the test corpus
    ///
    /// Every `<name>.in` file in the input directory is fed to each candidate, and the output is
    /// compared against `<name>.ref` in the reference directory. Tests without a reference file
    /// are skipped.
    Run {
        #[command(flatten)]
        config_opts: ConfigOpts,
    },
    /// Compare two candidates on generated inputs
    ///
    /// Every round, the configured generator writes a fresh input, both candidates are run on it
    /// and their outputs are compared. Inputs the candidates disagree on are kept in the scratch
    /// directory for inspection.
    Same {
        #[command(flatten)]
        config_opts: ConfigOpts,

        /// Number of inputs to generate
        #[arg(value_name = "ROUNDS")]
        rounds: usize,

        /// Name of the first candidate
        #[arg(value_name = "CANDIDATE1")]
        candidate1: String,

        /// Name of the second candidate
        #[arg(value_name = "CANDIDATE2")]
        candidate2: String,
    },
}

#[derive(Debug, Args)]
struct ConfigOpts {
    /// Config file
    #[arg(
        long,
        short = 'f',
        default_value = PantestConfig::CONFIG_PATH,
        value_name = "PATH"
    )]
    config_file: Utf8PathBuf,

    /// Maximum number of child processes to run at once [default: from config]
    #[arg(long, short = 'j', visible_alias = "jobs", value_name = "N")]
    workers: Option<NonZeroUsize>,
}

impl ConfigOpts {
    /// Loads the config, applying command-line overrides.
    fn make_config(&self) -> Result<PantestConfig> {
        let mut config = PantestConfig::from_file(&self.config_file)?;
        if let Some(workers) = self.workers {
            config.set_max_workers(workers.get());
        }
        Ok(config)
    }
}

fn make_runner(config: &PantestConfig) -> Result<TestRunner> {
    let mut builder = TestRunnerBuilder::default();
    builder
        .set_workers(decide_max_workers(config.max_workers()))
        .set_timeout_program(config.timeout_program());
    Ok(builder.build()?)
}

fn make_reporter(output: OutputContext) -> TestReporterBuilder {
    let mut builder = TestReporterBuilder::default();
    builder.set_colorize(output.color.should_colorize(Stream::Stdout));
    builder
}
