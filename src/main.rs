// Copyright 2025 Chris Custine
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

mod acquisition;
mod band_table;
mod config;
mod control_loop;
mod detector;
mod error;
mod frequency_plan;
mod psd;
mod result;
mod sample_loader;
mod sdr;
mod signals;

use clap::Parser;

use band_table::load_band_table;
use config::{CliArgs, PathConfig};
use control_loop::RunParams;
use error::CoreError;
use frequency_plan::FrequencyPlan;
use sdr::{RtlSdrDevice, SyntheticDevice};
use signals::ShutdownSignal;

fn main() {
    let args = CliArgs::parse();

    let log_level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    if let Err(e) = run(&args) {
        log::error!("fatal: {e}");
        std::process::exit(1);
    }
}

fn run(args: &CliArgs) -> Result<(), CoreError> {
    let paths = PathConfig::load(&args.env_file)?;
    log::info!("root path: {}", paths.root_path.display());
    log::info!("samples path: {}", paths.samples_path.display());
    log::info!("json path: {}", paths.json_path.display());

    let shutdown = ShutdownSignal::new();
    shutdown
        .install()
        .map_err(|e| CoreError::Config(format!("failed to install signal handler: {e}")))?;

    let channels = load_band_table(&paths.bands_path)?;
    log::info!("loaded {} channels from band table", channels.len());

    let plan = FrequencyPlan::new(args.lo_freq_hz, args.hi_freq_hz, args.sample_rate_hz);
    log::info!(
        "scanning {:.3}-{:.3} MHz in {} tile(s)",
        args.lo_freq_hz / 1e6,
        args.hi_freq_hz / 1e6,
        plan.len()
    );

    let params = RunParams {
        sample_rate_hz: args.sample_rate_hz,
        threshold_db: args.threshold_db,
        passes: args.passes,
        fmin_mhz: format!("{:.0}", args.lo_freq_hz / 1e6),
        fmax_mhz: format!("{:.0}", args.hi_freq_hz / 1e6),
    };

    if args.synthetic {
        let mut device = SyntheticDevice::new(1_000_000.0);
        control_loop::run(&mut device, &paths, &plan, &channels, &params, &shutdown)
    } else {
        let mut device = RtlSdrDevice::new(args.device_index);
        control_loop::run(&mut device, &paths, &plan, &channels, &params, &shutdown)
    }
}
