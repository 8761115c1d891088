//! Demo data generation
//!
//! Fills a collection with random documents that exercise every JSON type
//! and nesting level, then indexes a few of their fields. Collections named
//! `users` or `products` get extra domain-shaped fields.

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde_json::{json, Map, Value};

use crate::collection::Collection;
use crate::error::DbResult;
use crate::storage::DocumentStore;

/// Fields indexed after seeding
pub const SEED_INDEXES: [&str; 3] = ["number", "datetime", "nested.nested_number"];

const WORDS: &[&str] = &[
    "amber", "basalt", "cedar", "delta", "ember", "fjord", "granite", "harbor", "indigo",
    "juniper", "kelp", "lumen", "meadow", "nectar", "onyx", "prairie", "quartz", "river",
    "summit", "tundra",
];
const FIRST_NAMES: &[&str] = &["Ada", "Boris", "Chloe", "Dmitri", "Elena", "Farid", "Greta", "Hugo"];
const LAST_NAMES: &[&str] = &["Ivanova", "Jensen", "Kowalski", "Larsen", "Moreau", "Novak", "Okafor"];
const CITIES: &[&str] = &["Lisbon", "Oslo", "Tallinn", "Kyoto", "Porto", "Tbilisi", "Quito"];
const COUNTRIES: &[&str] = &["PT", "NO", "EE", "JP", "GE", "EC", "DE"];

// 2020-01-01T00:00:00Z and ten years of seconds
const DECADE_START: i64 = 1_577_836_800;
const DECADE_SECONDS: i64 = 315_360_000;

/// Inserts `count` generated documents and creates [`SEED_INDEXES`].
///
/// The same `seed` always produces the same documents (ids aside).
/// Returns the ids of the inserted documents.
pub fn seed_collection<S: DocumentStore>(
    collection: &mut Collection<S>,
    count: usize,
    seed: Option<u64>,
) -> DbResult<Vec<String>> {
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let kind = collection.name().to_string();

    let mut ids = Vec::with_capacity(count);
    for _ in 0..count {
        ids.push(collection.insert(generate_document(&mut rng, &kind))?);
    }
    for field in SEED_INDEXES {
        collection.create_index(field)?;
    }
    Ok(ids)
}

/// One random document for a collection named `kind`
pub fn generate_document<R: Rng>(rng: &mut R, kind: &str) -> Value {
    let mut doc = Map::new();
    doc.insert("string".into(), json!(sentence(rng)));
    doc.insert("number".into(), json!(rng.gen_range(1..=1000)));
    doc.insert("float".into(), json!(round2(rng.gen_range(1.0..100.0))));
    doc.insert("boolean".into(), json!(rng.gen_bool(0.5)));
    doc.insert("datetime".into(), json!(timestamp(rng)));
    let array_len = rng.gen_range(1..=5);
    doc.insert("array".into(), json!(words(rng, array_len)));
    doc.insert(
        "nested".into(),
        json!({
            "nested_string": pick(rng, CITIES),
            "nested_number": rng.gen_range(100..=200),
            "nested_array": [rng.gen::<f64>(), rng.gen::<f64>(), rng.gen::<f64>()],
        }),
    );

    match kind {
        "users" => {
            let first = pick(rng, FIRST_NAMES);
            let last = pick(rng, LAST_NAMES);
            doc.insert("name".into(), json!(format!("{} {}", first, last)));
            doc.insert(
                "email".into(),
                json!(format!("{}.{}@example.com", first, last).to_lowercase()),
            );
            doc.insert(
                "phone".into(),
                json!(format!("+1-555-{:04}", rng.gen_range(0..10_000))),
            );
            doc.insert(
                "address".into(),
                json!({
                    "street": format!("{} {} St", rng.gen_range(1..=999), pick(rng, WORDS)),
                    "city": pick(rng, CITIES),
                    "zipcode": format!("{:05}", rng.gen_range(0..100_000)),
                }),
            );
            doc.insert(
                "metadata".into(),
                json!({
                    "created_at": timestamp(rng),
                    "updated_at": timestamp(rng),
                    "login_count": rng.gen_range(0..=100),
                }),
            );
        }
        "products" => {
            doc.insert("product_name".into(), json!(words(rng, 2).join(" ")));
            doc.insert("price".into(), json!(round2(rng.gen_range(10.0..1000.0))));
            doc.insert("in_stock".into(), json!(rng.gen_bool(0.5)));
            doc.insert("categories".into(), json!(words(rng, 3)));
            doc.insert(
                "manufacturer".into(),
                json!({
                    "name": format!("{} Ltd", pick(rng, LAST_NAMES)),
                    "country": pick(rng, COUNTRIES),
                }),
            );
        }
        _ => {}
    }

    Value::Object(doc)
}

fn pick<R: Rng>(rng: &mut R, items: &[&'static str]) -> &'static str {
    items.choose(rng).copied().unwrap_or_default()
}

fn words<R: Rng>(rng: &mut R, n: usize) -> Vec<&'static str> {
    (0..n).map(|_| pick(rng, WORDS)).collect()
}

fn sentence<R: Rng>(rng: &mut R) -> String {
    let len = rng.gen_range(3..=8);
    let mut text = words(rng, len).join(" ");
    if let Some(first) = text.get_mut(0..1) {
        first.make_ascii_uppercase();
    }
    text.push('.');
    text
}

fn timestamp<R: Rng>(rng: &mut R) -> String {
    let secs = DECADE_START + rng.gen_range(0..DECADE_SECONDS);
    DateTime::<Utc>::from_timestamp(secs, 0)
        .map(|dt| dt.naive_utc().format("%Y-%m-%dT%H:%M:%S").to_string())
        .unwrap_or_default()
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::QueryCompiler;
    use crate::storage::MemoryStore;
    use tempfile::TempDir;

    #[test]
    fn test_document_shapes() {
        let mut rng = StdRng::seed_from_u64(7);
        let user = generate_document(&mut rng, "users");
        assert!(user["email"].as_str().unwrap().ends_with("@example.com"));
        assert!(user["address"]["zipcode"].is_string());

        let product = generate_document(&mut rng, "products");
        assert_eq!(product["categories"].as_array().unwrap().len(), 3);
        assert!(product.get("email").is_none());

        let plain = generate_document(&mut rng, "posts");
        let n = plain["nested"]["nested_number"].as_i64().unwrap();
        assert!((100..=200).contains(&n));
        assert!(plain.get("name").is_none() && plain.get("price").is_none());
    }

    #[test]
    fn test_same_seed_same_documents() {
        let a = generate_document(&mut StdRng::seed_from_u64(42), "users");
        let b = generate_document(&mut StdRng::seed_from_u64(42), "users");
        assert_eq!(a, b);
    }

    #[test]
    fn test_datetimes_parse_as_dates() {
        let mut rng = StdRng::seed_from_u64(1);
        let doc = generate_document(&mut rng, "posts");
        let year: i64 = doc["datetime"].as_str().unwrap()[..4].parse().unwrap();
        assert!((2020..2030).contains(&year));
        let query = QueryCompiler::compile(&json!({"datetime": {"@year": year}})).unwrap();
        assert!(query.matches(&doc));
    }

    #[test]
    fn test_seed_collection_inserts_and_indexes() {
        let dir = TempDir::new().unwrap();
        let mut coll =
            Collection::with_store("users", MemoryStore::new(), dir.path().join("indexes"), 3)
                .unwrap();

        let ids = seed_collection(&mut coll, 25, Some(9)).unwrap();
        assert_eq!(ids.len(), 25);
        assert_eq!(coll.ids().unwrap().len(), 25);
        assert_eq!(coll.list_indexes(), vec!["datetime", "nested.nested_number", "number"]);

        let filter = json!({"number": {"@gte": 1}});
        assert_eq!(coll.explain(&filter).unwrap().scan_type.as_str(), "INDEX_RANGE");
        assert_eq!(coll.find(&filter).unwrap().len(), 25);
    }
}
