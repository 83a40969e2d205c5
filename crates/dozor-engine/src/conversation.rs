use dozor_types::models::{ExpectedCommand, PendingConversation, PlayerId};
use tracing::debug;

use crate::Engine;
use crate::error::Result;

impl Engine {
    /// Remembers that the player's next plain message completes `command`.
    /// Replaces whatever was pending before.
    pub fn arm(&self, player_id: PlayerId, command: ExpectedCommand, issued_at: i64) -> Result<()> {
        debug!(player_id, command = %command, issued_at, "Arming follow-up");
        self.db.put_pending(&PendingConversation {
            player_id,
            command,
            issued_at,
        })?;
        Ok(())
    }

    /// Takes the pending follow-up, if any. An expired one is deleted all the same
    /// and reported as absent.
    pub fn consume(&self, player_id: PlayerId, now: i64) -> Result<Option<ExpectedCommand>> {
        let Some(pending) = self.db.take_pending(player_id)? else {
            return Ok(None);
        };

        if pending.is_expired(now, self.config.pending_window_secs) {
            debug!(
                player_id,
                command = %pending.command,
                age = now.saturating_sub(pending.issued_at),
                "Discarding expired follow-up"
            );
            return Ok(None);
        }
        Ok(Some(pending.command))
    }

    /// Deletes follow-ups nobody can answer any more. Returns how many went.
    pub fn purge_expired(&self, now: i64) -> Result<usize> {
        let cutoff = now.saturating_sub(self.config.pending_window_secs);
        Ok(self.db.purge_pending_before(cutoff)?)
    }
}
