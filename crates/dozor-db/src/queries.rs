use crate::Database;
use crate::models::{AnswerRow, CodeRow, PendingRow, ProfileRow};
use anyhow::Result;
use dozor_types::models::{
    AnswerPair, PendingConversation, PlayerId, PlayerProfile, RedeemableCode,
};
use rusqlite::{Connection, Row};

impl Database {
    // -- Profiles --

    pub fn get_profile(&self, player_id: PlayerId) -> Result<Option<PlayerProfile>> {
        self.with_conn(|conn| query_profile(conn, player_id))
    }

    /// Creates the profile or renames it. Team and admin flag are left alone.
    pub fn upsert_username(&self, player_id: PlayerId, username: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO profiles (player_id, username) VALUES (?1, ?2)
                 ON CONFLICT(player_id) DO UPDATE SET username = excluded.username",
                rusqlite::params![player_id, username],
            )?;
            Ok(())
        })
    }

    /// Returns false when no such profile exists.
    pub fn set_team(&self, player_id: PlayerId, team: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE profiles SET team = ?1 WHERE player_id = ?2",
                rusqlite::params![team, player_id],
            )?;
            Ok(changed == 1)
        })
    }

    /// Returns false when no such profile exists.
    pub fn set_admin(&self, player_id: PlayerId, enabled: bool) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE profiles SET is_admin = ?1 WHERE player_id = ?2",
                rusqlite::params![enabled, player_id],
            )?;
            Ok(changed == 1)
        })
    }

    // -- Codes --

    pub fn get_code(&self, code: &str) -> Result<Option<RedeemableCode>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT code, room, note, hint, finder_id FROM codes WHERE code = ?1",
            )?;
            let row = stmt.query_row([code], code_row).optional()?;
            Ok(row.map(Into::into))
        })
    }

    /// Inserts a fresh, unfound code. Returns false if the code already exists.
    pub fn insert_code(
        &self,
        code: &str,
        room: &str,
        note: Option<&str>,
        hint: Option<&str>,
    ) -> Result<bool> {
        self.with_conn(|conn| {
            let inserted = conn.execute(
                "INSERT INTO codes (code, room, note, hint) VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(code) DO NOTHING",
                rusqlite::params![code, room, note, hint],
            )?;
            Ok(inserted == 1)
        })
    }

    /// Replaces room, note and hint. The finder is never touched here.
    pub fn update_code_details(
        &self,
        code: &str,
        room: &str,
        note: Option<&str>,
        hint: Option<&str>,
    ) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE codes SET room = ?2, note = ?3, hint = ?4 WHERE code = ?1",
                rusqlite::params![code, room, note, hint],
            )?;
            Ok(changed == 1)
        })
    }

    /// Sets the finder only if nobody holds the code yet. True means this call won.
    pub fn claim_code(&self, code: &str, player_id: PlayerId) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE codes SET finder_id = ?1 WHERE code = ?2 AND finder_id IS NULL",
                rusqlite::params![player_id, code],
            )?;
            Ok(changed == 1)
        })
    }

    pub fn delete_code(&self, code: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let deleted = conn.execute("DELETE FROM codes WHERE code = ?1", [code])?;
            Ok(deleted == 1)
        })
    }

    pub fn list_codes(&self) -> Result<Vec<RedeemableCode>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT code, room, note, hint, finder_id FROM codes ORDER BY room, code",
            )?;
            let rows = stmt
                .query_map([], code_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows.into_iter().map(Into::into).collect())
        })
    }

    // -- Answers --

    /// Returns false if the answer is already in the group.
    pub fn insert_answer(&self, group_id: &str, answer: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let inserted = conn.execute(
                "INSERT OR IGNORE INTO answers (group_id, answer) VALUES (?1, ?2)",
                rusqlite::params![group_id, answer],
            )?;
            Ok(inserted == 1)
        })
    }

    pub fn get_answer(&self, group_id: &str, answer: &str) -> Result<Option<AnswerPair>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT group_id, answer, finder_id FROM answers WHERE group_id = ?1 AND answer = ?2",
            )?;
            let row = stmt
                .query_row(rusqlite::params![group_id, answer], answer_row)
                .optional()?;
            Ok(row.map(Into::into))
        })
    }

    /// Same first-writer-wins shape as [`Database::claim_code`].
    pub fn claim_answer(&self, group_id: &str, answer: &str, player_id: PlayerId) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE answers SET finder_id = ?1
                 WHERE group_id = ?2 AND answer = ?3 AND finder_id IS NULL",
                rusqlite::params![player_id, group_id, answer],
            )?;
            Ok(changed == 1)
        })
    }

    pub fn list_answers(&self, group_id: &str) -> Result<Vec<AnswerPair>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT group_id, answer, finder_id FROM answers WHERE group_id = ?1 ORDER BY answer",
            )?;
            let rows = stmt
                .query_map([group_id], answer_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows.into_iter().map(Into::into).collect())
        })
    }

    // -- Pending conversations --

    /// Last write wins: any earlier follow-up for the player is replaced.
    pub fn put_pending(&self, pending: &PendingConversation) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT OR REPLACE INTO pending_conversations (player_id, command, issued_at)
                 VALUES (?1, ?2, ?3)",
                rusqlite::params![pending.player_id, pending.command.tag(), pending.issued_at],
            )?;
            Ok(())
        })
    }

    /// Atomically reads and deletes the pending row, so only one message can consume it.
    pub fn take_pending(&self, player_id: PlayerId) -> Result<Option<PendingConversation>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "DELETE FROM pending_conversations WHERE player_id = ?1
                     RETURNING player_id, command, issued_at",
                    [player_id],
                    |row| {
                        Ok(PendingRow {
                            player_id: row.get(0)?,
                            command: row.get(1)?,
                            issued_at: row.get(2)?,
                        })
                    },
                )
                .optional()?;
            row.map(PendingConversation::try_from).transpose()
        })
    }

    /// Drops rows issued strictly before `cutoff`. Returns how many went.
    pub fn purge_pending_before(&self, cutoff: i64) -> Result<usize> {
        self.with_conn(|conn| {
            let purged = conn.execute(
                "DELETE FROM pending_conversations WHERE issued_at < ?1",
                [cutoff],
            )?;
            Ok(purged)
        })
    }
}

fn query_profile(conn: &Connection, player_id: PlayerId) -> Result<Option<PlayerProfile>> {
    let mut stmt = conn
        .prepare("SELECT player_id, username, team, is_admin FROM profiles WHERE player_id = ?1")?;

    let row = stmt
        .query_row([player_id], |row| {
            Ok(ProfileRow {
                player_id: row.get(0)?,
                username: row.get(1)?,
                team: row.get(2)?,
                is_admin: row.get(3)?,
            })
        })
        .optional()?;

    Ok(row.map(Into::into))
}

fn code_row(row: &Row<'_>) -> rusqlite::Result<CodeRow> {
    Ok(CodeRow {
        code: row.get(0)?,
        room: row.get(1)?,
        note: row.get(2)?,
        hint: row.get(3)?,
        finder_id: row.get(4)?,
    })
}

fn answer_row(row: &Row<'_>) -> rusqlite::Result<AnswerRow> {
    Ok(AnswerRow {
        group_id: row.get(0)?,
        answer: row.get(1)?,
        finder_id: row.get(2)?,
    })
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dozor_types::models::ExpectedCommand;

    fn db() -> Database {
        Database::open_in_memory().unwrap()
    }

    /// Threads each open their own connection on one file, as separate invocations would.
    #[test]
    fn concurrent_claims_have_exactly_one_winner() {
        use std::sync::{Arc, Barrier};
        use std::time::{Duration, SystemTime, UNIX_EPOCH};

        const PLAYERS: i64 = 8;
        const CODES: usize = 20;

        let nanos = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_nanos();
        let path = std::env::temp_dir().join(format!("dozor-claims-{}-{}.db", std::process::id(), nanos));
        let timeout = Duration::from_secs(10);

        {
            let setup = Database::open(&path, timeout).unwrap();
            for i in 0..CODES {
                setup.insert_code(&format!("c{}", i), "hall", None, None).unwrap();
            }
            setup.insert_answer("PairA", "cat").unwrap();
        }

        let barrier = Arc::new(Barrier::new(PLAYERS as usize));
        let handles: Vec<_> = (1..=PLAYERS)
            .map(|player| {
                let path = path.clone();
                let barrier = barrier.clone();
                std::thread::spawn(move || {
                    let db = Database::open(&path, timeout).unwrap();
                    barrier.wait();
                    let codes_won = (0..CODES)
                        .filter(|i| db.claim_code(&format!("c{}", i), player).unwrap())
                        .count();
                    let answer_won = db.claim_answer("PairA", "cat", player).unwrap();
                    (codes_won, answer_won)
                })
            })
            .collect();
        let results: Vec<(usize, bool)> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert_eq!(results.iter().map(|r| r.0).sum::<usize>(), CODES);
        assert_eq!(results.iter().filter(|r| r.1).count(), 1);

        let db = Database::open(&path, timeout).unwrap();
        assert!(db.list_codes().unwrap().iter().all(|c| c.finder.is_some()));
        let winner = results.iter().position(|r| r.1).unwrap() as i64 + 1;
        assert_eq!(db.get_answer("PairA", "cat").unwrap().unwrap().finder, Some(winner));
        drop(db);

        for suffix in ["", "-wal", "-shm"] {
            let _ = std::fs::remove_file(format!("{}{}", path.display(), suffix));
        }
    }

    #[test]
    fn rename_keeps_team_and_admin() {
        let db = db();
        db.upsert_username(1, "alice").unwrap();
        assert!(db.set_team(1, "B").unwrap());
        assert!(db.set_admin(1, true).unwrap());

        db.upsert_username(1, "alicia").unwrap();
        let profile = db.get_profile(1).unwrap().unwrap();
        assert_eq!(profile.username, "alicia");
        assert_eq!(profile.team.as_deref(), Some("B"));
        assert!(profile.is_admin);
    }

    #[test]
    fn updates_on_missing_profile_report_false() {
        let db = db();
        assert!(!db.set_team(9, "A").unwrap());
        assert!(!db.set_admin(9, true).unwrap());
        assert_eq!(db.get_profile(9).unwrap(), None);
    }

    #[test]
    fn code_claim_is_first_writer_wins() {
        let db = db();
        assert!(db.insert_code("X1", "hall", None, Some("look up")).unwrap());
        assert!(!db.insert_code("X1", "attic", None, None).unwrap());

        assert!(db.claim_code("X1", 1).unwrap());
        assert!(!db.claim_code("X1", 2).unwrap());
        assert!(!db.claim_code("nope", 2).unwrap());

        let code = db.get_code("X1").unwrap().unwrap();
        assert_eq!(code.finder, Some(1));
        assert_eq!(code.room, "hall");
    }

    #[test]
    fn detail_update_preserves_finder() {
        let db = db();
        db.insert_code("X1", "hall", None, None).unwrap();
        db.claim_code("X1", 5).unwrap();
        assert!(db.update_code_details("X1", "attic", Some("behind box"), None).unwrap());

        let code = db.get_code("X1").unwrap().unwrap();
        assert_eq!(code.room, "attic");
        assert_eq!(code.note.as_deref(), Some("behind box"));
        assert_eq!(code.finder, Some(5));
    }

    #[test]
    fn answers_are_unique_per_group() {
        let db = db();
        assert!(db.insert_answer("PairA", "cat").unwrap());
        assert!(!db.insert_answer("PairA", "cat").unwrap());
        assert!(db.insert_answer("PairB", "cat").unwrap());

        assert!(db.claim_answer("PairA", "cat", 3).unwrap());
        assert!(!db.claim_answer("PairA", "cat", 4).unwrap());
        assert_eq!(db.list_answers("PairA").unwrap()[0].finder, Some(3));
        assert_eq!(db.list_answers("PairB").unwrap()[0].finder, None);
    }

    #[test]
    fn pending_is_consumed_once() {
        let db = db();
        db.put_pending(&PendingConversation {
            player_id: 1,
            command: ExpectedCommand::Code,
            issued_at: 10,
        })
        .unwrap();
        db.put_pending(&PendingConversation {
            player_id: 1,
            command: ExpectedCommand::Answer("a3".into()),
            issued_at: 20,
        })
        .unwrap();

        let taken = db.take_pending(1).unwrap().unwrap();
        assert_eq!(taken.command, ExpectedCommand::Answer("a3".into()));
        assert_eq!(taken.issued_at, 20);
        assert_eq!(db.take_pending(1).unwrap(), None);
    }

    #[test]
    fn purge_drops_only_old_rows() {
        let db = db();
        for (player_id, issued_at) in [(1, 100), (2, 500)] {
            db.put_pending(&PendingConversation {
                player_id,
                command: ExpectedCommand::Register,
                issued_at,
            })
            .unwrap();
        }
        assert_eq!(db.purge_pending_before(200).unwrap(), 1);
        assert!(db.take_pending(1).unwrap().is_none());
        assert!(db.take_pending(2).unwrap().is_some());
    }
}
