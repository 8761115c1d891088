//! CLI command implementations
//!
//! Each command resolves the configuration, performs one operation and
//! returns its result as JSON. Printing happens only in `run_command`.

use serde_json::{json, Value};

use crate::collection::Collection;
use crate::config::Config;
use crate::database::Database;
use crate::error::DbError;
use crate::storage::{FileStore, StorageError};

use super::args::{Cli, Command, DbAction};
use super::errors::{CliError, CliResult};
use super::io::{read_json_arg, write_response};
use super::seed::{seed_collection, SEED_INDEXES};

/// Parse arguments and run the selected command
pub fn run() -> CliResult<()> {
    run_command(Cli::parse_args())
}

/// Run a parsed command and print its result
pub fn run_command(cli: Cli) -> CliResult<()> {
    let config = resolve_config(&cli)?;
    config.apply_logging()?;
    let result = execute(&config, cli.command)?;
    write_response(result)
}

/// Config file (if any), then command-line overrides
pub fn resolve_config(cli: &Cli) -> CliResult<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    if let Some(path) = &cli.storage_path {
        config.storage_path = path.clone();
    }
    config
        .validate()
        .map_err(|e| CliError::config_error(e.to_string()))?;
    Ok(config)
}

/// Executes one command against the storage root in `config`.
pub fn execute(config: &Config, command: Command) -> CliResult<Value> {
    let root = config.storage_path.as_path();

    match command {
        Command::List => Ok(json!(Database::list(root)?)),
        Command::Create { name } => {
            Database::create(root, &name)?;
            Ok(json!({ "created": name }))
        }
        Command::Drop { name } => {
            Database::destroy(root, &name)?;
            Ok(json!({ "dropped": name }))
        }
        Command::Collections { name } => {
            let db = Database::open(root, &name)?;
            Ok(json!(db.list_collections()?))
        }
        Command::Db { target, action } => {
            let mut collection = open_target(config, &target)?;
            let result = execute_action(&mut collection, action);
            collection.close();
            result
        }
    }
}

fn execute_action(collection: &mut Collection<FileStore>, action: DbAction) -> CliResult<Value> {
    match action {
        DbAction::Insert { document } => {
            let id = collection.insert(read_json_arg(&document)?)?;
            Ok(json!({ "_id": id }))
        }
        DbAction::Get { id } => match collection.get(&id)? {
            Some(document) => Ok(document),
            None => Err(DbError::from(StorageError::NotFound(id)).into()),
        },
        DbAction::Delete { id } => {
            collection.delete(&id)?;
            Ok(json!({ "deleted": id }))
        }
        DbAction::Index { field } => {
            let pairs = collection.create_index(&field)?;
            Ok(json!({ "field": field, "pairs": pairs }))
        }
        DbAction::DropIndex { field } => {
            collection.drop_index(&field)?;
            Ok(json!({ "dropped_index": field }))
        }
        DbAction::Indexes => Ok(json!(collection.list_indexes())),
        DbAction::Find { filter } => Ok(json!(collection.find(&read_json_arg(&filter)?)?)),
        DbAction::Explain { filter } => Ok(collection.explain(&read_json_arg(&filter)?)?.explain()),
        DbAction::List => Ok(json!(collection.all()?)),
        DbAction::Seed { count, seed } => {
            let ids = seed_collection(collection, count, seed)?;
            Ok(json!({ "inserted": ids.len(), "indexes": SEED_INDEXES }))
        }
    }
}

/// Opens `<database>/<collection>`; the database must already exist.
fn open_target(config: &Config, target: &str) -> CliResult<Collection<FileStore>> {
    let (db_name, coll_name) = target.split_once('/').ok_or_else(|| {
        CliError::invalid_argument(format!(
            "target '{}' must be <database>/<collection>",
            target
        ))
    })?;
    let db = Database::open(&config.storage_path, db_name)?;
    Ok(db.collection(coll_name, config.btree_degree)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn config_in(dir: &TempDir) -> Config {
        Config {
            storage_path: dir.path().to_path_buf(),
            ..Default::default()
        }
    }

    fn db(target: &str, action: DbAction) -> Command {
        Command::Db {
            target: target.to_string(),
            action,
        }
    }

    #[test]
    fn test_database_lifecycle() {
        let dir = TempDir::new().unwrap();
        let config = config_in(&dir);

        execute(&config, Command::Create { name: "shop".into() }).unwrap();
        assert_eq!(execute(&config, Command::List).unwrap(), json!(["shop"]));

        execute(&config, Command::Drop { name: "shop".into() }).unwrap();
        assert_eq!(execute(&config, Command::List).unwrap(), json!([]));
    }

    #[test]
    fn test_insert_index_find() {
        let dir = TempDir::new().unwrap();
        let config = config_in(&dir);
        execute(&config, Command::Create { name: "shop".into() }).unwrap();

        for doc in [r#"{"name":"Ann","age":30}"#, r#"{"name":"Ben","age":25}"#] {
            execute(&config, db("shop/users", DbAction::Insert { document: doc.into() })).unwrap();
        }
        let created = execute(&config, db("shop/users", DbAction::Index { field: "age".into() })).unwrap();
        assert_eq!(created["pairs"], 2);

        let found = execute(
            &config,
            db("shop/users", DbAction::Find { filter: r#"{"age": {"@gt": 26}}"#.into() }),
        )
        .unwrap();
        assert_eq!(found.as_array().unwrap().len(), 1);
        assert_eq!(found[0]["name"], "Ann");

        let plan = execute(
            &config,
            db("shop/users", DbAction::Explain { filter: r#"{"age": 25}"#.into() }),
        )
        .unwrap();
        assert_eq!(plan["scan_type"], "INDEX_EQ");

        assert_eq!(
            execute(&config, db("shop/users", DbAction::Indexes)).unwrap(),
            json!(["age"])
        );
        assert_eq!(
            execute(&config, Command::Collections { name: "shop".into() }).unwrap(),
            json!(["users"])
        );
    }

    #[test]
    fn test_get_and_delete() {
        let dir = TempDir::new().unwrap();
        let config = config_in(&dir);
        execute(&config, Command::Create { name: "shop".into() }).unwrap();

        let inserted =
            execute(&config, db("shop/items", DbAction::Insert { document: r#"{"sku":"A"}"#.into() }))
                .unwrap();
        let id = inserted["_id"].as_str().unwrap().to_string();

        let doc = execute(&config, db("shop/items", DbAction::Get { id: id.clone() })).unwrap();
        assert_eq!(doc["sku"], "A");

        execute(&config, db("shop/items", DbAction::Delete { id: id.clone() })).unwrap();
        let err = execute(&config, db("shop/items", DbAction::Get { id })).unwrap_err();
        assert_eq!(err.code_str(), "SHELF_DOCUMENT_NOT_FOUND");
    }

    #[test]
    fn test_bad_target_and_missing_database() {
        let dir = TempDir::new().unwrap();
        let config = config_in(&dir);

        let err = execute(&config, db("no-slash", DbAction::List)).unwrap_err();
        assert_eq!(err.code_str(), "SHELF_CLI_INVALID_ARGUMENT");

        let err = execute(&config, db("ghost/users", DbAction::List)).unwrap_err();
        assert_eq!(err.code_str(), "SHELF_DATABASE_NOT_FOUND");
    }

    #[test]
    fn test_invalid_filter_reported() {
        let dir = TempDir::new().unwrap();
        let config = config_in(&dir);
        execute(&config, Command::Create { name: "shop".into() }).unwrap();

        let err = execute(
            &config,
            db("shop/users", DbAction::Find { filter: r#"{"@not": [1]}"#.into() }),
        )
        .unwrap_err();
        assert_eq!(err.code_str(), "SHELF_QUERY_INVALID");
    }

    #[test]
    fn test_seed_action() {
        let dir = TempDir::new().unwrap();
        let config = config_in(&dir);
        execute(&config, Command::Create { name: "shop".into() }).unwrap();

        let seeded = execute(&config, db("shop/products", DbAction::Seed { count: 12, seed: Some(5) })).unwrap();
        assert_eq!(seeded["inserted"], 12);

        let listed = execute(&config, db("shop/products", DbAction::List)).unwrap();
        assert_eq!(listed.as_array().unwrap().len(), 12);
        assert!(listed[0]["price"].is_number());
        assert_eq!(
            execute(&config, db("shop/products", DbAction::Indexes)).unwrap(),
            json!(["datetime", "nested.nested_number", "number"])
        );
    }
}
