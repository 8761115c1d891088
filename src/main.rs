//! shelfdb CLI entry point
//!
//! Parses arguments and dispatches via `cli::run`. Errors are printed to
//! stderr with a non-zero exit status.

use shelfdb::cli;

fn main() {
    if let Err(e) = cli::run() {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}
