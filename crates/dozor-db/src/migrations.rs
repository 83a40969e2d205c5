use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub const CURRENT_VERSION: i64 = 2;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version = current_version(conn)?;

    if version < 1 {
        info!("Running migration v1 (profiles, codes, answers)");
        conn.execute_batch(
            "
            CREATE TABLE profiles (
                player_id   INTEGER PRIMARY KEY,
                username    TEXT NOT NULL,
                team        TEXT,
                is_admin    INTEGER NOT NULL DEFAULT 0
            );

            CREATE TABLE codes (
                code        TEXT PRIMARY KEY,
                room        TEXT NOT NULL,
                note        TEXT,
                hint        TEXT,
                finder_id   INTEGER
            );

            CREATE INDEX idx_codes_finder ON codes(finder_id);

            CREATE TABLE answers (
                group_id    TEXT NOT NULL,
                answer      TEXT NOT NULL,
                finder_id   INTEGER,
                PRIMARY KEY (group_id, answer)
            );

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
    }

    if version < 2 {
        info!("Running migration v2 (pending conversations)");
        conn.execute_batch(
            "
            CREATE TABLE pending_conversations (
                player_id   INTEGER PRIMARY KEY,
                command     TEXT NOT NULL,
                issued_at   INTEGER NOT NULL
            );

            CREATE INDEX idx_pending_issued ON pending_conversations(issued_at);

            INSERT INTO schema_version (version) VALUES (2);
            ",
        )?;
    }

    info!("Database migrations complete (schema v{})", CURRENT_VERSION);
    Ok(())
}

pub fn current_version(conn: &Connection) -> Result<i64> {
    let version = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |r| r.get(0),
    )?;
    Ok(version)
}
