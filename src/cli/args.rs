//! CLI argument definitions using clap
//!
//! Commands:
//! - shelfdb list
//! - shelfdb create <name>
//! - shelfdb drop <name>
//! - shelfdb collections <name>
//! - shelfdb db <database>/<collection> <action>

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// shelfdb - an embedded JSON document store with B-tree secondary indexes
#[derive(Parser, Debug)]
#[command(name = "shelfdb")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Root directory holding the databases (overrides the config file)
    #[arg(long, global = true)]
    pub storage_path: Option<PathBuf>,

    /// Path to a JSON configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List databases
    List,

    /// Create a database
    Create {
        /// Database name
        name: String,
    },

    /// Delete a database and all of its collections
    Drop {
        /// Database name
        name: String,
    },

    /// List the collections of a database
    Collections {
        /// Database name
        name: String,
    },

    /// Operate on one collection
    Db {
        /// Target as <database>/<collection>
        target: String,

        #[command(subcommand)]
        action: DbAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum DbAction {
    /// Insert a document given as JSON ("-" reads it from stdin)
    Insert {
        document: String,
    },

    /// Print one document
    Get {
        id: String,
    },

    /// Delete one document
    Delete {
        id: String,
    },

    /// Create an index on a field path
    Index {
        field: String,
    },

    /// Drop the index on a field path
    DropIndex {
        field: String,
    },

    /// List indexed fields
    Indexes,

    /// Print documents matching a JSON filter ("-" reads it from stdin)
    Find {
        filter: String,
    },

    /// Print the plan for a JSON filter
    Explain {
        filter: String,
    },

    /// Print every document
    List,

    /// Insert generated demo documents and index a few of their fields
    Seed {
        /// Number of documents to generate
        #[arg(default_value_t = 100)]
        count: usize,

        /// Random seed for reproducible data
        #[arg(long)]
        seed: Option<u64>,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
