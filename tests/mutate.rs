mod common;

use common::TestWorkspace;
use rosterbase::{
    data::Value,
    error::StoreError,
    mutate::{KeyMode, Mutator},
    record::Record,
    schema::Schema,
    store::RecordStore,
};

fn field(schema: &Schema, record: &Record, name: &str) -> Value {
    let index = schema.column_index(name).expect("known column");
    record.values()[index].clone()
}

fn sets(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
    pairs
        .iter()
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect()
}

fn empty_store(ws: &TestWorkspace, schema: Schema) -> RecordStore {
    RecordStore::new(ws.path().join("records.csv"), schema)
}

#[test]
fn create_assigns_identity_one_on_empty_collection() {
    let ws = TestWorkspace::new();
    let schema = Schema::students();
    let store = empty_store(&ws, schema.clone());
    let mutator = Mutator::new(&store, KeyMode::Identity);

    let record = mutator
        .create(&sets(&[("name", "Ana"), ("age", "16")]))
        .expect("create");
    assert_eq!(field(&schema, &record, "id"), Value::Integer(1));
}

#[test]
fn create_never_reuses_deleted_identities_below_the_maximum() {
    let ws = TestWorkspace::new();
    let schema = Schema::students();
    let store = empty_store(&ws, schema.clone());
    let mutator = Mutator::new(&store, KeyMode::Identity);

    for name in ["Ana", "Binh", "Chi"] {
        mutator.create(&sets(&[("name", name)])).expect("create");
    }
    mutator.delete(1).expect("delete id 1");

    let record = mutator.create(&sets(&[("name", "Dung")])).expect("create");
    assert_eq!(field(&schema, &record, "id"), Value::Integer(4));
}

#[test]
fn create_ignores_caller_supplied_identity() {
    let ws = TestWorkspace::new();
    let schema = Schema::students();
    let store = empty_store(&ws, schema.clone());
    let mutator = Mutator::new(&store, KeyMode::Identity);

    let record = mutator
        .create(&sets(&[("id", "99"), ("name", "Ana")]))
        .expect("create");
    assert_eq!(field(&schema, &record, "id"), Value::Integer(1));
}

#[test]
fn update_touches_only_supplied_fields() {
    let ws = TestWorkspace::new();
    let schema = Schema::roster();
    let store = empty_store(&ws, schema.clone());
    let mutator = Mutator::new(&store, KeyMode::Identity);

    mutator
        .create(&sets(&[("name", "A"), ("goals", "3")]))
        .expect("create A");
    mutator
        .create(&sets(&[("name", "B"), ("goals", "5")]))
        .expect("create B");

    let updated = mutator.update(2, &sets(&[("goals", "9")])).expect("update");
    assert_eq!(field(&schema, &updated, "goals"), Value::Integer(9));
    assert_eq!(field(&schema, &updated, "name"), Value::String("B".into()));
    assert_eq!(field(&schema, &updated, "id"), Value::Integer(2));
}

#[test]
fn update_preserves_identity_even_when_caller_rewrites_it() {
    let ws = TestWorkspace::new();
    let schema = Schema::students();
    let store = empty_store(&ws, schema.clone());
    let mutator = Mutator::new(&store, KeyMode::Identity);

    mutator.create(&sets(&[("name", "Ana")])).expect("create");
    let updated = mutator
        .update(1, &sets(&[("id", "7"), ("grade", "12A3")]))
        .expect("update");
    assert_eq!(field(&schema, &updated, "id"), Value::Integer(1));
    assert_eq!(field(&schema, &updated, "grade"), Value::String("12A3".into()));
}

#[test]
fn update_ignores_fields_outside_the_schema() {
    let ws = TestWorkspace::new();
    let schema = Schema::students();
    let store = empty_store(&ws, schema.clone());
    let mutator = Mutator::new(&store, KeyMode::Identity);

    mutator.create(&sets(&[("name", "Ana")])).expect("create");
    let updated = mutator
        .update(1, &sets(&[("nickname", "A"), ("age", "17")]))
        .expect("update");
    assert_eq!(field(&schema, &updated, "age"), Value::Integer(17));
}

#[test]
fn missing_identity_key_is_a_not_found_error() {
    let ws = TestWorkspace::new();
    let store = empty_store(&ws, Schema::students());
    let mutator = Mutator::new(&store, KeyMode::Identity);

    let err = mutator.update(42, &sets(&[("age", "17")])).unwrap_err();
    assert_eq!(
        err.downcast_ref::<StoreError>(),
        Some(&StoreError::IdNotFound(42))
    );
}

#[test]
fn positional_delete_shifts_later_records_down() {
    let ws = TestWorkspace::new();
    let schema = Schema::students();
    let store = empty_store(&ws, schema.clone());
    let mutator = Mutator::new(&store, KeyMode::Position);

    for name in ["Ana", "Binh", "Chi"] {
        mutator.create(&sets(&[("name", name)])).expect("create");
    }

    let removed = mutator.delete(0).expect("delete position 0");
    assert_eq!(field(&schema, &removed, "name"), Value::String("Ana".into()));

    // the formerly-second record now occupies position 0
    let removed = mutator.delete(0).expect("delete position 0 again");
    assert_eq!(field(&schema, &removed, "name"), Value::String("Binh".into()));

    let remaining = store.load().expect("load");
    assert_eq!(remaining.len(), 1);
    assert_eq!(
        field(&schema, &remaining.records[0], "name"),
        Value::String("Chi".into())
    );
}

#[test]
fn positional_key_out_of_range_is_a_not_found_error() {
    let ws = TestWorkspace::new();
    let store = empty_store(&ws, Schema::students());
    let mutator = Mutator::new(&store, KeyMode::Position);

    let err = mutator.fetch(0).unwrap_err();
    assert_eq!(
        err.downcast_ref::<StoreError>(),
        Some(&StoreError::PositionNotFound(0))
    );
}

#[test]
fn identityless_schema_appends_without_assigning_ids() {
    use rosterbase::schema::{ColumnMeta, ColumnType};

    let ws = TestWorkspace::new();
    let schema = Schema {
        columns: vec![
            ColumnMeta {
                name: "name".to_string(),
                datatype: ColumnType::String,
                default: None,
            },
            ColumnMeta {
                name: "goals".to_string(),
                datatype: ColumnType::Integer,
                default: None,
            },
        ],
        identity: None,
    };
    let store = empty_store(&ws, schema.clone());
    let mutator = Mutator::new(&store, KeyMode::Position);

    mutator.create(&sets(&[("name", "Ana")])).expect("create");
    mutator.create(&sets(&[("name", "Binh")])).expect("create");

    let collection = store.load().expect("load");
    assert_eq!(collection.len(), 2);
    assert_eq!(collection.max_identity(&schema), None);
    assert_eq!(
        field(&schema, &collection.records[1], "name"),
        Value::String("Binh".into())
    );
}

#[test]
fn every_mutation_persists_to_disk() {
    let ws = TestWorkspace::new();
    let schema = Schema::students();
    let store = empty_store(&ws, schema.clone());
    let mutator = Mutator::new(&store, KeyMode::Identity);

    mutator.create(&sets(&[("name", "Ana")])).expect("create");
    let on_disk = ws.read("records.csv");
    assert!(on_disk.contains("Ana"));

    mutator.delete(1).expect("delete");
    let on_disk = ws.read("records.csv");
    assert!(!on_disk.contains("Ana"));
}
