/*
   Copyright 2026 The si5351-atari Developers

   Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
   http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
   http://opensource.org/licenses/MIT>, at your option. This file may not be
   copied, modified, or distributed except according to those terms.
*/
use std::io::{self, Write};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::error;
use tracing_subscriber::fmt;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use si5351_atari::app::{self, EXIT_FAILURE};
use si5351_atari::bring_up_sequence;
use si5351_atari::config::Cli;
use si5351_atari::transport::I2cBus;

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cli.log_filter()));
    let stderr_layer = fmt::layer().with_writer(io::stderr).with_target(false);
    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .try_init()
        .context("failed to install the log subscriber")?;

    let mut stdout = io::stdout().lock();
    if cli.list {
        app::write_profile_table(&mut stdout)?;
        stdout.flush()?;
        return Ok(ExitCode::SUCCESS);
    }

    let settings = match cli.settings() {
        Ok(settings) => settings,
        Err(e) => {
            error!("{}", e);
            return Ok(ExitCode::from(EXIT_FAILURE));
        }
    };

    if cli.dry_run {
        let plan = bring_up_sequence(settings.profile.data(), &settings.output)?;
        app::write_plan(&mut stdout, settings.address, &plan)?;
        stdout.flush()?;
        return Ok(ExitCode::SUCCESS);
    }
    drop(stdout);

    let outcome = app::run(&settings, |path, address| I2cBus::open(path, address));
    Ok(ExitCode::from(outcome.exit_code()))
}
