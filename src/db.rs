use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension};

pub fn connect(path: &str) -> Result<Connection> {
    if let Some(dir) = Path::new(path).parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
    }
    let conn = Connection::open(path).with_context(|| format!("Failed to open {}", path))?;
    conn.execute_batch("PRAGMA journal_mode=WAL;")?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS resume (
            id           INTEGER PRIMARY KEY CHECK (id = 1),
            text         TEXT NOT NULL,
            file_name    TEXT NOT NULL,
            document_id  TEXT,
            stored_at    TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS extractions (
            id           INTEGER PRIMARY KEY,
            source       TEXT NOT NULL,
            tier         TEXT,
            text         TEXT NOT NULL,
            error        TEXT,
            latency_ms   INTEGER,
            extracted_at TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_extractions_source ON extractions(source);
        ",
    )?;
    Ok(())
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoredResume {
    pub text: String,
    pub file_name: String,
    pub document_id: Option<String>,
    pub stored_at: DateTime<Utc>,
}

/// Store résumé text, replacing any previous one. A linked document is forgotten.
pub fn save_resume(conn: &Connection, text: &str, file_name: &str) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO resume (id, text, file_name, document_id, stored_at)
         VALUES (1, ?1, ?2, NULL, ?3)",
        rusqlite::params![text, file_name, Utc::now().to_rfc3339()],
    )?;
    Ok(())
}

pub fn load_resume(conn: &Connection) -> Result<Option<StoredResume>> {
    let row = conn
        .query_row(
            "SELECT text, file_name, document_id, stored_at FROM resume WHERE id = 1",
            [],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, Option<String>>(2)?,
                    row.get::<_, String>(3)?,
                ))
            },
        )
        .optional()?;

    let Some((text, file_name, document_id, stored_at)) = row else {
        return Ok(None);
    };
    let stored_at = DateTime::parse_from_rfc3339(&stored_at)
        .with_context(|| format!("Corrupt timestamp in resume table: {}", stored_at))?
        .with_timezone(&Utc);

    Ok(Some(StoredResume {
        text,
        file_name,
        document_id,
        stored_at,
    }))
}

/// Returns whether anything was removed.
pub fn clear_resume(conn: &Connection) -> Result<bool> {
    Ok(conn.execute("DELETE FROM resume", [])? > 0)
}

/// Attach a cloud document id to the stored résumé. `false` when no résumé is stored.
pub fn link_document(conn: &Connection, document_id: &str) -> Result<bool> {
    let updated = conn.execute(
        "UPDATE resume SET document_id = ?1 WHERE id = 1",
        rusqlite::params![document_id],
    )?;
    Ok(updated > 0)
}

pub struct ExtractionRow {
    pub source: String,
    pub tier: Option<String>,
    pub text: String,
    pub error: Option<String>,
    pub latency_ms: Option<i64>,
}

pub fn log_extractions(conn: &Connection, rows: &[ExtractionRow]) -> Result<usize> {
    let tx = conn.unchecked_transaction()?;
    let now = Utc::now().to_rfc3339();
    let mut count = 0;
    {
        let mut stmt = tx.prepare(
            "INSERT INTO extractions (source, tier, text, error, latency_ms, extracted_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )?;
        for row in rows {
            count += stmt.execute(rusqlite::params![
                row.source,
                row.tier,
                row.text,
                row.error,
                row.latency_ms,
                now
            ])?;
        }
    }
    tx.commit()?;
    Ok(count)
}

pub struct HistoryRow {
    pub source: String,
    pub tier: Option<String>,
    pub chars: usize,
    pub error: Option<String>,
    pub extracted_at: String,
}

/// Most recent first.
pub fn recent_extractions(conn: &Connection, limit: usize) -> Result<Vec<HistoryRow>> {
    let mut stmt = conn.prepare(
        "SELECT source, tier, text, error, extracted_at FROM extractions
         ORDER BY id DESC LIMIT ?1",
    )?;
    let rows = stmt
        .query_map(rusqlite::params![limit as i64], |row| {
            let text: String = row.get(2)?;
            Ok(HistoryRow {
                source: row.get(0)?,
                tier: row.get(1)?,
                chars: text.chars().count(),
                error: row.get(3)?,
                extracted_at: row.get(4)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        conn
    }

    #[test]
    fn resume_roundtrip() {
        let conn = memory();
        assert!(load_resume(&conn).unwrap().is_none());

        save_resume(&conn, "Jane Doe", "jane.pdf").unwrap();
        let stored = load_resume(&conn).unwrap().unwrap();
        assert_eq!(stored.text, "Jane Doe");
        assert_eq!(stored.file_name, "jane.pdf");
        assert!(stored.document_id.is_none());
    }

    #[test]
    fn saving_replaces_and_unlinks() {
        let conn = memory();
        save_resume(&conn, "v1", "a.pdf").unwrap();
        assert!(link_document(&conn, "doc-123").unwrap());
        assert_eq!(load_resume(&conn).unwrap().unwrap().document_id.as_deref(), Some("doc-123"));

        save_resume(&conn, "v2", "b.pdf").unwrap();
        let stored = load_resume(&conn).unwrap().unwrap();
        assert_eq!(stored.text, "v2");
        assert!(stored.document_id.is_none());
    }

    #[test]
    fn link_without_resume() {
        let conn = memory();
        assert!(!link_document(&conn, "doc").unwrap());
    }

    #[test]
    fn clear() {
        let conn = memory();
        assert!(!clear_resume(&conn).unwrap());
        save_resume(&conn, "x", "x.pdf").unwrap();
        assert!(clear_resume(&conn).unwrap());
        assert!(load_resume(&conn).unwrap().is_none());
    }

    #[test]
    fn history_newest_first() {
        let conn = memory();
        let rows = vec![
            ExtractionRow { source: "a.html".into(), tier: Some("heading".into()), text: "abc".into(), error: None, latency_ms: Some(12) },
            ExtractionRow { source: "b.html".into(), tier: None, text: String::new(), error: Some("404".into()), latency_ms: None },
        ];
        assert_eq!(log_extractions(&conn, &rows).unwrap(), 2);

        let history = recent_extractions(&conn, 10).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].source, "b.html");
        assert_eq!(history[0].error.as_deref(), Some("404"));
        assert_eq!(history[1].tier.as_deref(), Some("heading"));
        assert_eq!(history[1].chars, 3);

        assert_eq!(recent_extractions(&conn, 1).unwrap().len(), 1);
    }

    #[test]
    fn connect_creates_parent_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/store.sqlite");
        let conn = connect(path.to_str().unwrap()).unwrap();
        init_schema(&conn).unwrap();
        assert!(path.exists());
    }
}
