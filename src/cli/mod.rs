//! CLI module for shelfdb
//!
//! Provides command-line access to the catalog (list, create, drop and
//! inspect databases) and to single collections (insert, get, delete,
//! index management, find, explain and demo seeding).

mod args;
mod commands;
mod errors;
mod io;
mod seed;

pub use args::{Cli, Command, DbAction};
pub use commands::{execute, resolve_config, run, run_command};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{read_json_arg, write_response};
pub use seed::{generate_document, seed_collection, SEED_INDEXES};
