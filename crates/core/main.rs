#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::perf,
    clippy::style,
    clippy::missing_safety_doc,
    clippy::missing_const_for_fn
)]
#![allow(clippy::as_conversions, clippy::mod_module_files)]

use std::process;

mod app;
mod commands;

use commands::Commands;

use bookinfo::cache::{DEFAULT_RECORD_CAPACITY, DEFAULT_SEARCH_CAPACITY};
use clap::{Args, Parser};
use log::{error, trace};

fn main() {
    if let Err(err) = try_main() {
        error!("{:#}", err);
        process::exit(2);
    }
}

fn try_main() -> eyre::Result<()> {
    let Cli {
        command,
        global_opts,
    } = Cli::parse();

    // if quiet then ignore verbosity but still show errors
    let verbosity = if global_opts.quiet {
        1
    } else {
        global_opts.verbosity as usize + 1
    };

    stderrlog::new().verbosity(verbosity).init()?;

    let lookup = app::lookup_service(&global_opts)?;
    let output = command.execute(&lookup)?;

    app::log_cache_stats(&lookup);

    if global_opts.quiet {
        trace!("quiet flag used - results are not printed");
    } else {
        println!("{output}");
    }
    Ok(())
}

#[derive(Parser)]
#[clap(name = "bookinfo")]
#[clap(about = "Look up book metadata by search term or ISBN in the Google Books catalog")]
#[clap(version, author)]
struct Cli {
    #[clap(subcommand)]
    command: Commands,

    #[clap(flatten)]
    global_opts: GlobalOpts,
}

#[derive(Debug, Args)]
pub(crate) struct GlobalOpts {
    /// The user agent sent to the catalog, must contain 'gzip'
    #[clap(long, global = true)]
    user_agent: Option<String>,

    /// Always ask the catalog instead of remembering earlier answers
    #[clap(long, global = true)]
    no_cache: bool,

    /// How many search terms are remembered
    #[clap(long, default_value_t = DEFAULT_SEARCH_CAPACITY, global = true)]
    search_cache_capacity: usize,

    /// How many ISBNs are remembered
    #[clap(long, default_value_t = DEFAULT_RECORD_CAPACITY, global = true)]
    record_cache_capacity: usize,

    /// How chatty the program is when performing commands
    ///
    /// The number of times this flag is used will increase how chatty
    /// the program is.
    #[clap(short, long, parse(from_occurrences), global = true)]
    verbosity: u8,

    /// Prevents the program from writing to stdout, errors will still be printed to stderr.
    #[clap(short, long, global = true)]
    quiet: bool,
}
