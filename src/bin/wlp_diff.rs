//! Differential test of simulated output against ground truth.

use std::env;
use std::process;
use wlp_harness::cli;
use wlp_harness::ProcessExecutor;

fn main() {
    env_logger::init();
    process::exit(cli::diff_main(env::args_os(), || ProcessExecutor));
}
