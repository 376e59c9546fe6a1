use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::Connection;

use crate::batch::{BatchReport, Summary};
use crate::feed::CommitteeMeta;
use crate::record::{Field, NormalizedRecord, Schema};

pub fn connect(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let conn = Connection::open(path)
        .with_context(|| format!("Failed to open database {}", path.display()))?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

pub fn table(schema: Schema) -> &'static str {
    match schema {
        Schema::Legislator => "legislators",
        Schema::Committee => "committees",
    }
}

/// Record tables get one TEXT column per schema column. List columns hold
/// a JSON array.
fn record_table_sql(schema: Schema) -> String {
    let columns: String = schema
        .columns()
        .iter()
        .map(|c| format!("            {c:<22} TEXT,\n"))
        .collect();
    format!(
        "CREATE TABLE IF NOT EXISTS {table} (
            subject                TEXT PRIMARY KEY,
            run_id                 TEXT NOT NULL,
{columns}            processed_at           TEXT NOT NULL DEFAULT (datetime('now'))
        );",
        table = table(schema),
    )
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(&record_table_sql(Schema::Legislator))?;
    conn.execute_batch(&record_table_sql(Schema::Committee))?;
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS committee_feed (
            link        TEXT PRIMARY KEY,
            name        TEXT NOT NULL,
            kind        TEXT NOT NULL CHECK(kind IN ('Senate','Assembly','Joint','Other')),
            created_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );
        CREATE INDEX IF NOT EXISTS idx_feed_kind ON committee_feed(kind);

        CREATE TABLE IF NOT EXISTS runs (
            run_id      TEXT PRIMARY KEY,
            schema      TEXT NOT NULL CHECK(schema IN ('legislator','committee')),
            ok          INTEGER NOT NULL,
            failed      INTEGER NOT NULL,
            warnings    INTEGER NOT NULL,
            started_at  TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS diagnostics (
            id          INTEGER PRIMARY KEY,
            run_id      TEXT NOT NULL REFERENCES runs(run_id),
            subject     TEXT NOT NULL,
            kind        TEXT NOT NULL,
            message     TEXT NOT NULL,
            detail      TEXT
        );
        CREATE INDEX IF NOT EXISTS idx_diag_run ON diagnostics(run_id);
        CREATE INDEX IF NOT EXISTS idx_diag_kind ON diagnostics(kind);
        ",
    )?;
    Ok(())
}

pub fn new_run_id(now: DateTime<Utc>) -> String {
    now.format("run-%Y%m%dT%H%M%S%.3f").to_string()
}

// ── Records ──

fn encode(field: &Field) -> Result<Option<String>> {
    Ok(match field {
        Field::Null => None,
        Field::Text(t) => Some(t.clone()),
        Field::List(items) => Some(serde_json::to_string(items)?),
    })
}

fn decode(schema: Schema, column: &str, value: Option<String>) -> Result<Field> {
    Ok(match value {
        None => Field::Null,
        Some(v) if schema.is_list_column(column) => Field::List(
            serde_json::from_str(&v)
                .with_context(|| format!("Bad list in column {column}: {v:?}"))?,
        ),
        Some(v) => Field::Text(v),
    })
}

/// Insert or replace one row per subject. Returns rows written.
pub fn save_records<'a>(
    conn: &Connection,
    schema: Schema,
    run_id: &str,
    records: impl IntoIterator<Item = (&'a str, &'a NormalizedRecord)>,
) -> Result<usize> {
    let columns = schema.columns();
    let placeholders = (1..=columns.len() + 2)
        .map(|i| format!("?{i}"))
        .collect::<Vec<_>>()
        .join(",");
    let sql = format!(
        "INSERT OR REPLACE INTO {} (subject, run_id, {}) VALUES ({})",
        table(schema),
        columns.join(", "),
        placeholders
    );

    let tx = conn.unchecked_transaction()?;
    let mut count = 0;
    {
        let mut stmt = tx.prepare(&sql)?;
        for (subject, record) in records {
            anyhow::ensure!(
                record.schema() == schema,
                "{} record {} saved to {} table",
                record.schema(),
                subject,
                table(schema)
            );
            let mut values: Vec<Option<String>> =
                vec![Some(subject.to_string()), Some(run_id.to_string())];
            for field in record.fields() {
                values.push(encode(field)?);
            }
            count += stmt.execute(rusqlite::params_from_iter(values))?;
        }
    }
    tx.commit()?;
    Ok(count)
}

/// Stored records ordered by subject.
pub fn fetch_records(conn: &Connection, schema: Schema) -> Result<Vec<(String, NormalizedRecord)>> {
    let columns = schema.columns();
    let sql = format!(
        "SELECT subject, {} FROM {} ORDER BY subject",
        columns.join(", "),
        table(schema)
    );
    let mut stmt = conn.prepare(&sql)?;
    let raw = stmt
        .query_map([], |row| {
            let subject: String = row.get(0)?;
            let values = (0..columns.len())
                .map(|i| row.get::<_, Option<String>>(i + 1))
                .collect::<Result<Vec<_>, _>>()?;
            Ok((subject, values))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    raw.into_iter()
        .map(|(subject, values)| {
            let fields = columns
                .iter()
                .zip(values)
                .map(|(col, v)| decode(schema, col, v))
                .collect::<Result<Vec<_>>>()?;
            Ok((subject, NormalizedRecord::new(schema, fields)))
        })
        .collect()
}

// ── Feed ──

pub fn save_feed(conn: &Connection, rows: &[CommitteeMeta]) -> Result<usize> {
    let tx = conn.unchecked_transaction()?;
    let mut count = 0;
    {
        let mut stmt = tx.prepare(
            "INSERT OR REPLACE INTO committee_feed (link, name, kind) VALUES (?1, ?2, ?3)",
        )?;
        for r in rows {
            count += stmt.execute(rusqlite::params![r.link, r.name, r.kind.name()])?;
        }
    }
    tx.commit()?;
    Ok(count)
}

// ── Runs ──

pub struct RunRow {
    pub run_id: String,
    pub schema: String,
    pub summary: Summary,
    pub started_at: String,
}

pub fn save_run(conn: &Connection, run: &RunRow) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO runs (run_id, schema, ok, failed, warnings, started_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        rusqlite::params![
            run.run_id,
            run.schema,
            run.summary.ok,
            run.summary.failed,
            run.summary.warnings,
            run.started_at,
        ],
    )?;
    Ok(())
}

/// One row per warning and per skipped subject.
pub fn save_diagnostics(conn: &Connection, run_id: &str, report: &BatchReport) -> Result<usize> {
    let tx = conn.unchecked_transaction()?;
    let mut count = 0;
    {
        let mut stmt = tx.prepare(
            "INSERT INTO diagnostics (run_id, subject, kind, message, detail)
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )?;
        for r in &report.results {
            for w in &r.warnings {
                let detail = serde_json::to_string(w)?;
                count += stmt.execute(rusqlite::params![
                    run_id,
                    r.id,
                    w.kind(),
                    w.to_string(),
                    detail
                ])?;
            }
            if let Err(e) = &r.outcome {
                count += stmt.execute(rusqlite::params![
                    run_id,
                    r.id,
                    e.kind(),
                    e.to_string(),
                    None::<String>
                ])?;
            }
        }
    }
    tx.commit()?;
    Ok(count)
}

pub fn fetch_recent_runs(conn: &Connection, limit: usize) -> Result<Vec<RunRow>> {
    let mut stmt = conn.prepare(
        "SELECT run_id, schema, ok, failed, warnings, started_at
         FROM runs ORDER BY started_at DESC, run_id DESC LIMIT ?1",
    )?;
    let rows = stmt
        .query_map([limit], |row| {
            Ok(RunRow {
                run_id: row.get(0)?,
                schema: row.get(1)?,
                summary: Summary {
                    ok: row.get(2)?,
                    failed: row.get(3)?,
                    warnings: row.get(4)?,
                },
                started_at: row.get(5)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

// ── Stats ──

pub struct Stats {
    pub legislators: usize,
    pub committees: usize,
    pub feed: usize,
    pub runs: usize,
    pub diagnostics: usize,
}

pub fn get_stats(conn: &Connection) -> Result<Stats> {
    let count = |sql: &str| -> Result<usize> { Ok(conn.query_row(sql, [], |r| r.get(0))?) };
    Ok(Stats {
        legislators: count("SELECT COUNT(*) FROM legislators")?,
        committees: count("SELECT COUNT(*) FROM committees")?,
        feed: count("SELECT COUNT(*) FROM committee_feed")?,
        runs: count("SELECT COUNT(*) FROM runs")?,
        diagnostics: count("SELECT COUNT(*) FROM diagnostics")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::{self, Subject};
    use crate::config::Settings;
    use crate::feed::CommitteeKind;

    fn open(dir: &tempfile::TempDir) -> Connection {
        let conn = connect(&dir.path().join("nested/legis.sqlite")).unwrap();
        init_schema(&conn).unwrap();
        conn
    }

    #[test]
    fn schema_init_is_repeatable() {
        let dir = tempfile::tempdir().unwrap();
        let conn = open(&dir);
        init_schema(&conn).unwrap();
        let s = get_stats(&conn).unwrap();
        assert_eq!((s.legislators, s.committees, s.runs), (0, 0, 0));
    }

    #[test]
    fn records_survive_a_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let conn = open(&dir);
        let subjects = batch::load_dir(Path::new("tests/fixtures/committees"), None).unwrap();
        let settings = Settings {
            name_exceptions: vec!["VanderMeer".into()],
            ..Settings::default()
        };
        let report = batch::run(&subjects, Schema::Committee, &settings);
        let saved = save_records(&conn, Schema::Committee, "run-1", report.records()).unwrap();
        assert_eq!(saved, 1);

        let stored = fetch_records(&conn, Schema::Committee).unwrap();
        assert_eq!(stored.len(), 1);
        let (subject, record) = &stored[0];
        assert_eq!(subject, "health");
        let original = report.records().next().unwrap().1;
        assert_eq!(record, original);
        assert!(record.get("co_chair").unwrap().is_null());
    }

    #[test]
    fn wrong_table_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let conn = open(&dir);
        let subjects = vec![Subject {
            id: "x".into(),
            text: std::fs::read_to_string("tests/fixtures/legislator.txt").unwrap(),
        }];
        let report = batch::run(&subjects, Schema::Legislator, &Settings::default());
        assert!(save_records(&conn, Schema::Committee, "run-1", report.records()).is_err());
    }

    #[test]
    fn runs_and_diagnostics() {
        let dir = tempfile::tempdir().unwrap();
        let conn = open(&dir);
        let subjects = batch::load_dir(Path::new("tests/fixtures/legislators"), None).unwrap();
        let report = batch::run(&subjects, Schema::Legislator, &Settings::default());
        let run = RunRow {
            run_id: "run-a".into(),
            schema: Schema::Legislator.name().into(),
            summary: report.summary(),
            started_at: "2016-12-17T07:35:58Z".into(),
        };
        save_run(&conn, &run).unwrap();
        assert_eq!(save_diagnostics(&conn, "run-a", &report).unwrap(), 1);

        let kind: String = conn
            .query_row("SELECT kind FROM diagnostics WHERE subject = 'broken'", [], |r| r.get(0))
            .unwrap();
        assert_eq!(kind, "no_pattern_match");

        let runs = fetch_recent_runs(&conn, 5).unwrap();
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].summary.ok, 2);
    }

    #[test]
    fn feed_rows_keyed_by_link() {
        let dir = tempfile::tempdir().unwrap();
        let conn = open(&dir);
        let meta = CommitteeMeta {
            name: "Joint Committee on Finance".into(),
            kind: CommitteeKind::Joint,
            link: "https://docs.legis.wisconsin.gov/2015/committees/joint/jcf".into(),
        };
        save_feed(&conn, &[meta.clone(), meta]).unwrap();
        assert_eq!(get_stats(&conn).unwrap().feed, 1);
    }

    #[test]
    fn run_ids_sort_by_time() {
        let a = new_run_id("2016-12-17T07:35:58Z".parse().unwrap());
        let b = new_run_id("2016-12-17T07:36:00Z".parse().unwrap());
        assert_eq!(a, "run-20161217T073558.000");
        assert!(a < b);
    }
}
