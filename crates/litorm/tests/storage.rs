//! File-backed storage, configuration and typed column round-trips.

use chrono::{DateTime, NaiveDate, Utc};
use litorm::qb::{self, MutationQb};
use litorm::{
    Connection, ConnectionConfig, Database, FromRow, GenericClient, Json, OrmError, Record, Storage,
    Value,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Orbit {
    period_days: f64,
    moons: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, FromRow, Record)]
#[orm(table = "observations")]
struct Observation {
    #[orm(autoincrement)]
    id: Option<i64>,
    #[orm(unique)]
    tag: uuid::Uuid,
    observed_at: DateTime<Utc>,
    night_of: NaiveDate,
    orbit: Json<Orbit>,
    note: Option<String>,
    confirmed: bool,
    magnitude: f64,
    #[orm(default_expr = "CURRENT_TIMESTAMP")]
    recorded: Option<String>,
}

fn observation(note: Option<&str>) -> Observation {
    Observation {
        id: None,
        tag: uuid::Uuid::new_v4(),
        observed_at: DateTime::parse_from_rfc3339("2024-03-01T21:15:00Z")
            .unwrap()
            .with_timezone(&Utc),
        night_of: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
        orbit: Json(Orbit {
            period_days: 686.98,
            moons: vec!["Phobos".into(), "Deimos".into()],
        }),
        note: note.map(str::to_string),
        confirmed: true,
        magnitude: -2.94,
        recorded: None,
    }
}

#[test]
fn file_storage_is_shared_between_connections() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("observatory.db");
    let db = Database::open(&path);
    assert_eq!(db.config().storage, Storage::File(path.clone()));

    let writer = db.connect().unwrap();
    qb::create::<Observation>()
        .all_fields()
        .run(&writer)
        .unwrap();
    qb::insert::<Observation>()
        .value(&observation(Some("clear sky")))
        .run(&writer)
        .unwrap();
    drop(writer);

    let reader = Connection::open(&path).unwrap();
    let rows = qb::select()
        .all()
        .from::<Observation>()
        .run_decoding::<Observation>(&reader)
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].note.as_deref(), Some("clear sky"));
}

#[test]
fn typed_columns_round_trip() {
    let conn = Connection::open_in_memory().unwrap();
    qb::create::<Observation>()
        .all_fields()
        .run(&conn)
        .unwrap();

    let original = observation(None);
    qb::insert::<Observation>()
        .value(&original)
        .run(&conn)
        .unwrap();
    let id = conn.last_insert_id();

    let stored = qb::select()
        .all()
        .from::<Observation>()
        .filter(Observation::ID.eq(id))
        .first_decoding::<Observation>(&conn)
        .unwrap()
        .unwrap();
    assert_eq!(stored.id, id);
    assert_eq!(stored.tag, original.tag);
    assert_eq!(stored.observed_at, original.observed_at);
    assert_eq!(stored.night_of, original.night_of);
    assert_eq!(stored.orbit, original.orbit);
    assert_eq!(stored.note, None);
    assert!(stored.confirmed);
    assert_eq!(stored.magnitude, original.magnitude);
    // Encoded NULL is inserted as such; the computed default only fills omitted columns.
    assert_eq!(stored.recorded, None);

    let raw = conn
        .query_one("SELECT orbit, confirmed FROM observations", &[])
        .unwrap();
    assert_eq!(
        raw.first_value("orbit"),
        Some(&Value::Text(
            r#"{"period_days":686.98,"moons":["Phobos","Deimos"]}"#.into()
        ))
    );
    assert_eq!(raw.first_value("confirmed"), Some(&Value::Integer(1)));
}

#[test]
fn computed_default_fills_omitted_columns() {
    let conn = Connection::open_in_memory().unwrap();
    qb::create::<Observation>()
        .all_fields()
        .run(&conn)
        .unwrap();
    conn.execute(
        "INSERT INTO observations (tag, observed_at, night_of, orbit, confirmed, magnitude) \
         VALUES (?1, '2024-03-01T21:15:00+00:00', '2024-03-01', '{\"period_days\":1.0,\"moons\":[]}', 0, 1.5)",
        &[Value::encode(&uuid::Uuid::new_v4()).unwrap()],
    )
    .unwrap();

    let stored = qb::select()
        .all()
        .from::<Observation>()
        .first_decoding::<Observation>(&conn)
        .unwrap()
        .unwrap();
    assert!(stored.recorded.is_some());
    assert!(!stored.confirmed);
    assert!(stored.orbit.0.moons.is_empty());
}

#[test]
fn unique_columns_reject_duplicates() {
    let conn = Connection::open_in_memory().unwrap();
    qb::create::<Observation>()
        .all_fields()
        .run(&conn)
        .unwrap();

    let first = observation(None);
    let mut second = observation(None);
    second.tag = first.tag;
    qb::insert::<Observation>().value(&first).run(&conn).unwrap();
    let err = qb::insert::<Observation>()
        .value(&second)
        .run(&conn)
        .unwrap_err();
    assert!(err.is_constraint_violation());
}

#[test]
fn malformed_stored_values_fail_to_decode() {
    let conn = Connection::open_in_memory().unwrap();
    qb::create::<Observation>()
        .all_fields()
        .run(&conn)
        .unwrap();
    conn.execute(
        "INSERT INTO observations (tag, observed_at, night_of, orbit, confirmed, magnitude) \
         VALUES ('not-a-uuid', 'yesterday', '2024-03-01', '{}', 1, 1.0)",
        &[],
    )
    .unwrap();

    let err = qb::select()
        .all()
        .from::<Observation>()
        .run_decoding::<Observation>(&conn)
        .unwrap_err();
    match err {
        OrmError::Decode { column, .. } => assert_eq!(column, "observations.tag"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn configuration_is_applied() {
    let config = ConnectionConfig::memory()
        .with_busy_timeout(Duration::from_millis(50))
        .with_slow_query_threshold(Duration::ZERO)
        .max_sql_length(16)
        .with_stats(true);
    let conn = Connection::with_config(&config).unwrap();

    conn.execute_batch("CREATE TABLE t (v INTEGER); INSERT INTO t VALUES (1);")
        .unwrap();
    conn.query("SELECT v FROM t WHERE v > ?1", &[Value::Integer(0)])
        .unwrap();
    let _ = conn.query("SELECT nope FROM t", &[]);

    let stats = conn.stats();
    assert_eq!(stats.total_queries, 3);
    assert_eq!(stats.failed_queries, 1);
    assert_eq!(stats.select_count, 2);
    assert_eq!(stats.ddl_count, 1);
    assert!(stats.max_duration >= stats.avg_duration());
    assert!(stats.slowest_query.is_some());
}
