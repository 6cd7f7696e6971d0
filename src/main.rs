use clap::Parser;
use git_brief::commands::{execute_list, ListArgs};
use git_brief::core::print_error;
use std::env;

#[derive(Parser)]
#[command(name = "git-brief")]
#[command(about = "List local branches with their merge, upstream, pull request and CI status")]
#[command(version)]
struct Cli {
    /// Enable debug logging
    #[arg(long)]
    debug: bool,

    #[command(flatten)]
    list: ListArgs,
}

fn main() {
    let cli = Cli::parse();

    // Configure logging based on --debug flag
    if cli.debug {
        env::set_var("RUST_LOG", "debug");
    } else {
        env::set_var("RUST_LOG", "info");
    }
    env_logger::init();

    if let Err(e) = execute_list(cli.list) {
        print_error(&e.to_string());
        std::process::exit(1);
    }
}
