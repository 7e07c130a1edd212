//! Compile, link and simulate a WLP4 program inside an I/O harness.

use std::env;
use std::process;
use wlp_harness::cli;
use wlp_harness::ProcessExecutor;

fn main() {
    env_logger::init();
    process::exit(cli::run_main(env::args_os(), ProcessExecutor));
}
