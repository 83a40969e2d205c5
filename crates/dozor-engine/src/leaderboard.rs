use std::collections::HashMap;

use dozor_types::models::PlayerId;

use crate::Engine;
use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaderboardEntry {
    pub player_id: PlayerId,
    pub username: String,
    pub team: Option<String>,
    pub count: usize,
}

impl Engine {
    /// Players ranked by how many codes they found, most first.
    /// Empty until somebody redeems a code.
    pub fn top(&self) -> Result<Vec<LeaderboardEntry>> {
        let mut counts: HashMap<PlayerId, usize> = HashMap::new();
        for code in self.db.list_codes()? {
            if let Some(finder) = code.finder {
                *counts.entry(finder).or_default() += 1;
            }
        }

        let mut ranked: Vec<(PlayerId, usize)> = counts.into_iter().collect();
        // ties broken by id only so the output is repeatable
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

        ranked
            .into_iter()
            .map(|(player_id, count)| -> Result<LeaderboardEntry> {
                let summary = self.describe(player_id)?;
                Ok(LeaderboardEntry {
                    player_id,
                    username: summary
                        .as_ref()
                        .map(|s| s.username.clone())
                        .unwrap_or_else(|| player_id.to_string()),
                    team: summary.and_then(|s| s.team),
                    count,
                })
            })
            .collect()
    }
}
