/// DDL to create the schema_version tracking table.
///
/// Applied unconditionally on every DB open (before checking the version),
/// using `IF NOT EXISTS` so it is safe to run multiple times.
pub const SCHEMA_VERSION_DDL: &str = "
    CREATE TABLE IF NOT EXISTS schema_version (
        version INTEGER NOT NULL
    ) STRICT;
";

/// DDL for the v1 schema.
///
/// - `segments`: OCR regions awaiting review. `claimed_at` marks a segment handed to a
///   reviewer; the claim expires after the configured lease.
/// - `reviews`: numbered revisions of a segment's text. The newest `rev` is the best text.
///
/// All tables use `STRICT` mode for type enforcement.
pub const SCHEMA_V1_SQL: &str = "
    CREATE TABLE IF NOT EXISTS segments (
        id          INTEGER PRIMARY KEY,
        doc_id      INTEGER NOT NULL,
        page        INTEGER NOT NULL,
        x1          INTEGER NOT NULL,
        y1          INTEGER NOT NULL,
        x2          INTEGER NOT NULL,
        y2          INTEGER NOT NULL,
        ocr_text    TEXT,
        view_count  INTEGER NOT NULL DEFAULT 0,
        claimed_at  INTEGER,
        UNIQUE (doc_id, page, x1, y1, x2, y2)
    ) STRICT;

    CREATE INDEX IF NOT EXISTS idx_segments_view_count ON segments(view_count);

    CREATE TABLE IF NOT EXISTS reviews (
        id          INTEGER PRIMARY KEY,
        segment_id  INTEGER NOT NULL REFERENCES segments(id) ON DELETE CASCADE,
        rev         INTEGER NOT NULL,
        text        TEXT    NOT NULL,
        created_at  INTEGER NOT NULL,
        UNIQUE (segment_id, rev)
    ) STRICT;
";

/// Runs forward-only schema migration to bring the DB to the latest version.
///
/// Idempotent: safe to call on every startup.
///
/// # Errors
///
/// Returns `rusqlite::Error` if the DDL fails or the version row cannot be read.
pub fn migrate(db: &mut rusqlite::Connection) -> rusqlite::Result<()> {
    db.execute_batch(SCHEMA_VERSION_DDL)?;

    let version: i64 = db.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |r| r.get(0),
    )?;

    if version < 1 {
        let tx = db.transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)?;
        tx.execute_batch(SCHEMA_V1_SQL)?;
        tx.execute("INSERT INTO schema_version (version) VALUES (1)", [])?;
        tx.commit()?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migrate_is_idempotent() {
        let mut db = rusqlite::Connection::open_in_memory().unwrap();
        migrate(&mut db).unwrap();
        migrate(&mut db).unwrap();
        let rows: i64 = db
            .query_row("SELECT COUNT(*) FROM schema_version", [], |r| r.get(0))
            .unwrap();
        assert_eq!(rows, 1);
    }

    #[test]
    fn review_revisions_are_unique_per_segment() {
        let mut db = rusqlite::Connection::open_in_memory().unwrap();
        migrate(&mut db).unwrap();
        db.execute(
            "INSERT INTO segments (id, doc_id, page, x1, y1, x2, y2, ocr_text)
             VALUES (1, 1, 1, 0, 0, 1, 1, 'x')",
            [],
        )
        .unwrap();
        let insert = "INSERT INTO reviews (segment_id, rev, text, created_at) VALUES (1, 1, 'a', 0)";
        db.execute(insert, []).unwrap();
        assert!(db.execute(insert, []).is_err());
    }
}
