//! Hand-written SQL through the connection facade: value fidelity, engine errors,
//! column addressing and per-thread connections.

use litorm::{
    ColumnRef, Connection, ConnectionConfig, Database, FromRow, GenericClient, OrmResult, Row,
    RowDecoder, Value,
};
use std::thread;

fn conn() -> Connection {
    Connection::open_in_memory().unwrap()
}

fn first(conn: &Connection, sql: &str) -> Row {
    conn.query_one(sql, &[]).unwrap()
}

#[test]
fn tables_round_trip_by_column_name() {
    let db = conn();
    db.execute("DROP TABLE IF EXISTS foo", &[]).unwrap();
    db.execute(
        "CREATE TABLE foo (bar INT(4), baz VARCHAR(16), biz FLOAT)",
        &[],
    )
    .unwrap();
    db.execute("INSERT INTO foo VALUES (42, 'Life', 0.44)", &[]).unwrap();
    db.execute("INSERT INTO foo VALUES (1337, 'Elite', 209.234)", &[])
        .unwrap();
    db.execute("INSERT INTO foo VALUES (9, NULL, 34.567)", &[]).unwrap();

    let row = first(&db, "SELECT * FROM foo WHERE bar = 42");
    assert_eq!(row.first_value("bar"), Some(&Value::Integer(42)));
    assert_eq!(row.first_value("baz"), Some(&Value::Text("Life".into())));
    assert_eq!(row.first_value("biz"), Some(&Value::Float(0.44)));

    let row = first(&db, "SELECT * FROM foo where baz = 'Elite'");
    assert_eq!(row.first_value("bar"), Some(&Value::Integer(1337)));
    assert_eq!(row.first_value("baz"), Some(&Value::Text("Elite".into())));

    let row = first(&db, "SELECT * FROM foo where bar = 9");
    assert_eq!(row.first_value("bar"), Some(&Value::Integer(9)));
    assert_eq!(row.first_value("baz"), Some(&Value::Null));
}

#[test]
fn unicode_text_survives_binding_and_literals() {
    let db = conn();
    let unicode = "®¿ÐØ×ĞƋƢǂǊǕǮȐȘȢȱȵẀˍΔῴЖ♆";
    db.execute("DROP TABLE IF EXISTS `foo`", &[]).unwrap();
    db.execute("CREATE TABLE `foo` (bar TEXT)", &[]).unwrap();
    db.execute("INSERT INTO `foo` VALUES(?1)", &[Value::from(unicode)])
        .unwrap();

    let row = first(&db, "SELECT * FROM `foo`");
    assert_eq!(row.first_value("bar"), Some(&Value::Text(unicode.into())));

    let literal = Value::Text(unicode.into()).to_sql_literal();
    let row = first(&db, &format!("SELECT * FROM `foo` WHERE bar = {literal}"));
    assert_eq!(row.first_value("bar"), Some(&Value::Text(unicode.into())));
}

#[test]
fn full_width_integers_round_trip() {
    let db = conn();
    db.execute("CREATE TABLE foo (max INT, min INT)", &[]).unwrap();
    db.execute(
        "INSERT INTO foo VALUES (?1, ?2)",
        &[Value::from(i64::MAX), Value::from(i64::MIN)],
    )
    .unwrap();

    let row = first(&db, "SELECT * FROM foo");
    assert_eq!(row.first_value("max"), Some(&Value::Integer(i64::MAX)));
    assert_eq!(row.first_value("min"), Some(&Value::Integer(i64::MIN)));
}

#[test]
fn blobs_round_trip() {
    let db = conn();
    db.execute("CREATE TABLE foo (bar BLOB(4))", &[]).unwrap();
    db.execute("INSERT INTO foo VALUES (?1)", &[Value::Blob(vec![0, 1, 2])])
        .unwrap();

    let row = first(&db, "SELECT * FROM foo");
    assert_eq!(row.first_value("bar"), Some(&Value::Blob(vec![0, 1, 2])));
}

#[test]
fn syntax_errors_carry_the_engine_reason() {
    let db = conn();
    let err = db.query("asdf", &[]).unwrap_err();
    let reason = err.engine_reason().unwrap();
    assert!(reason.contains("syntax error"), "{reason}");
}

#[test]
fn dropping_a_missing_table_surfaces_the_engine_error() {
    let db = conn();
    let err = db.execute("DROP TABLE nothing_here", &[]).unwrap_err();
    assert!(err.engine_reason().unwrap().contains("no such table"));
}

#[derive(Debug)]
struct User {
    id: String,
}

impl FromRow for User {
    fn from_row(row: &RowDecoder<'_>) -> OrmResult<Self> {
        Ok(Self { id: row.get("id")? })
    }
}

#[test]
fn same_column_name_decodes_by_table() {
    let row = Row::from_pairs([
        (ColumnRef::new("foo", "id"), Value::Text("foo".into())),
        (ColumnRef::new("bar", "id"), Value::Text("bar".into())),
    ]);
    assert_eq!(row.decode_as::<User>("foo").unwrap().id, "foo");
    assert_eq!(row.decode_as::<User>("bar").unwrap().id, "bar");
    assert!(row.decode_as::<User>("baz").unwrap_err().is_decode());
}

#[test]
fn connections_on_separate_threads() {
    let db = Database::new(ConnectionConfig::memory());
    db.connect()
        .unwrap()
        .execute_batch("CREATE TABLE seen (v INTEGER); INSERT INTO seen VALUES (42);")
        .unwrap();

    let handles: Vec<_> = ["a", "b"]
        .into_iter()
        .map(|alias| {
            let db = db.clone();
            thread::spawn(move || {
                let conn = db.connect().unwrap();
                let sql = format!("SELECT (1 + 1) as {alias};");
                for _ in 0..100 {
                    let row = conn.query_one(&sql, &[]).unwrap();
                    assert_eq!(row.first_value(alias), Some(&Value::Integer(2)));
                }
                let row = conn.query_one("SELECT v FROM seen", &[]).unwrap();
                assert_eq!(row.first_value("v"), Some(&Value::Integer(42)));
                conn.stats().total_queries
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), 101);
    }
}
