//! Ground-truth output for a WLP4 program, compiled natively.

use std::env;
use std::process;
use wlp_harness::cli;
use wlp_harness::ProcessExecutor;

fn main() {
    env_logger::init();
    process::exit(cli::ground_truth_main(env::args_os(), ProcessExecutor));
}
