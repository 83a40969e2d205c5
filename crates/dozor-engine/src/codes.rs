use std::collections::{BTreeMap, HashMap};

use anyhow::anyhow;
use dozor_types::models::{PlayerId, RedeemableCode};
use tracing::{info, warn};

use crate::Engine;
use crate::error::Result;

const CLAIM_ATTEMPTS: usize = 3;

/// Admin input for `/addcode`: `code - room - note - hint`, note and hint optional.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeSpec {
    pub code: String,
    pub room: String,
    pub note: Option<String>,
    pub hint: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeSpecError {
    MissingCode,
    MissingRoom,
}

impl CodeSpec {
    pub fn parse(input: &str) -> std::result::Result<Self, CodeSpecError> {
        let mut parts = input.splitn(4, '-').map(str::trim);
        let field = |part: Option<&str>| part.filter(|p| !p.is_empty()).map(str::to_string);

        let code = field(parts.next()).ok_or(CodeSpecError::MissingCode)?;
        let room = field(parts.next()).ok_or(CodeSpecError::MissingRoom)?;
        Ok(Self {
            code,
            room,
            note: field(parts.next()),
            hint: field(parts.next()),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Created,
    Updated,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedeemOutcome {
    /// This call attributed the code to the player
    Redeemed { hint: Option<String> },
    /// Someone (possibly the same player) got there first; nothing changed
    AlreadyFound { finder: PlayerId },
    NoSuchCode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveOutcome {
    Removed,
    NoSuchCode,
}

/// One code line as the viewer is allowed to see it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListedCode {
    pub code: String,
    pub finder: Option<String>,
    /// Only ever filled for admins
    pub note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomListing {
    pub room: String,
    /// Found codes first. Unfound codes appear here only for admins.
    pub entries: Vec<ListedCode>,
    pub unfound: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeListing {
    pub found: usize,
    pub total: usize,
    pub rooms: Vec<RoomListing>,
}

impl CodeListing {
    pub fn left(&self) -> usize {
        self.total - self.found
    }
}

impl Engine {
    /// Adds a code or replaces its room, note and hint. The finder survives updates.
    pub fn upsert_code(&self, spec: &CodeSpec) -> Result<UpsertOutcome> {
        let note = spec.note.as_deref();
        let hint = spec.hint.as_deref();

        if self.db.insert_code(&spec.code, &spec.room, note, hint)? {
            info!(code = %spec.code, room = %spec.room, "Code added");
            return Ok(UpsertOutcome::Created);
        }

        if !self.db.update_code_details(&spec.code, &spec.room, note, hint)? {
            // Removed between the two statements; put it back as new.
            self.db.insert_code(&spec.code, &spec.room, note, hint)?;
            return Ok(UpsertOutcome::Created);
        }
        info!(code = %spec.code, room = %spec.room, "Code updated");
        Ok(UpsertOutcome::Updated)
    }

    pub fn redeem(&self, code: &str, player_id: PlayerId) -> Result<RedeemOutcome> {
        let code = code.trim();

        for _ in 0..CLAIM_ATTEMPTS {
            if self.db.claim_code(code, player_id)? {
                let hint = self.db.get_code(code)?.and_then(|c| c.hint);
                info!(code, player_id, "Code redeemed");
                return Ok(RedeemOutcome::Redeemed { hint });
            }

            match self.db.get_code(code)? {
                None => return Ok(RedeemOutcome::NoSuchCode),
                Some(RedeemableCode {
                    finder: Some(finder),
                    ..
                }) => return Ok(RedeemOutcome::AlreadyFound { finder }),
                // Re-created unfound between our claim and read; claim again.
                Some(_) => warn!(code, player_id, "Code changed mid-redeem, retrying claim"),
            }
        }
        Err(anyhow!("code {} kept changing while being redeemed", code).into())
    }

    pub fn remove_code(&self, code: &str) -> Result<RemoveOutcome> {
        if self.db.delete_code(code.trim())? {
            info!(code, "Code removed");
            Ok(RemoveOutcome::Removed)
        } else {
            Ok(RemoveOutcome::NoSuchCode)
        }
    }

    /// Codes grouped by room. Non-admins only see found codes plus an unfound count.
    pub fn list_codes(&self, viewer: PlayerId) -> Result<CodeListing> {
        let as_admin = self.is_admin(viewer)?;
        let codes = self.db.list_codes()?;

        let mut names: HashMap<PlayerId, String> = HashMap::new();
        let mut rooms: BTreeMap<String, RoomListing> = BTreeMap::new();

        for code in &codes {
            let room = rooms.entry(code.room.clone()).or_insert_with(|| RoomListing {
                room: code.room.clone(),
                entries: Vec::new(),
                unfound: 0,
            });

            let finder = match code.finder {
                Some(id) => {
                    if !names.contains_key(&id) {
                        names.insert(id, self.display_name(id)?);
                    }
                    names.get(&id).cloned()
                }
                None => {
                    room.unfound += 1;
                    if !as_admin {
                        continue;
                    }
                    None
                }
            };

            room.entries.push(ListedCode {
                code: code.code.clone(),
                finder,
                note: if as_admin { code.note.clone() } else { None },
            });
        }

        let rooms = rooms
            .into_values()
            .map(|mut r| {
                // stable: keeps code order inside each half
                r.entries.sort_by_key(|e| e.finder.is_none());
                r
            })
            .collect();

        Ok(CodeListing {
            found: codes.iter().filter(|c| c.is_found()).count(),
            total: codes.len(),
            rooms,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::engine;

    fn spec(input: &str) -> CodeSpec {
        CodeSpec::parse(input).unwrap()
    }

    #[test]
    fn parses_spec_fields() {
        assert_eq!(
            spec(" X1 - hall - under the rug - check the - sign"),
            CodeSpec {
                code: "X1".into(),
                room: "hall".into(),
                note: Some("under the rug".into()),
                hint: Some("check the - sign".into()),
            }
        );
        assert_eq!(spec("X1-hall").note, None);
        assert_eq!(CodeSpec::parse(""), Err(CodeSpecError::MissingCode));
        assert_eq!(CodeSpec::parse("X1 - "), Err(CodeSpecError::MissingRoom));
    }

    #[test]
    fn redeem_once_then_report_first_finder() {
        let engine = engine();
        engine.register(1, "alice").unwrap();
        engine.register(2, "bob").unwrap();
        engine.upsert_code(&spec("X1 - hall - - look up")).unwrap();

        assert_eq!(
            engine.redeem("X1", 1).unwrap(),
            RedeemOutcome::Redeemed {
                hint: Some("look up".into())
            }
        );
        assert_eq!(engine.redeem("X1", 2).unwrap(), RedeemOutcome::AlreadyFound { finder: 1 });
        // re-delivery of the same message does not double count
        assert_eq!(engine.redeem("X1", 1).unwrap(), RedeemOutcome::AlreadyFound { finder: 1 });
        assert_eq!(engine.db().get_code("X1").unwrap().unwrap().finder, Some(1));
    }

    #[test]
    fn redeem_unknown_code() {
        let engine = engine();
        assert_eq!(engine.redeem("nope", 1).unwrap(), RedeemOutcome::NoSuchCode);
    }

    #[test]
    fn upsert_reports_created_then_updated_and_keeps_finder() {
        let engine = engine();
        assert_eq!(engine.upsert_code(&spec("X1 - hall")).unwrap(), UpsertOutcome::Created);
        engine.redeem("X1", 1).unwrap();
        assert_eq!(
            engine.upsert_code(&spec("X1 - attic - moved")).unwrap(),
            UpsertOutcome::Updated
        );
        let code = engine.db().get_code("X1").unwrap().unwrap();
        assert_eq!(code.room, "attic");
        assert_eq!(code.finder, Some(1));
    }

    #[test]
    fn remove_code() {
        let engine = engine();
        engine.upsert_code(&spec("X1 - hall")).unwrap();
        assert_eq!(engine.remove_code("X1").unwrap(), RemoveOutcome::Removed);
        assert_eq!(engine.remove_code("X1").unwrap(), RemoveOutcome::NoSuchCode);
    }

    fn seeded() -> Engine {
        let engine = engine();
        engine.register(1, "alice").unwrap();
        engine.register(9, "root").unwrap();
        engine.db().set_admin(9, true).unwrap();
        engine.upsert_code(&spec("H1 - hall - taped under chair")).unwrap();
        engine.upsert_code(&spec("H2 - hall - behind the clock")).unwrap();
        engine.upsert_code(&spec("K1 - kitchen - in the fridge")).unwrap();
        engine.redeem("H2", 1).unwrap();
        engine
    }

    #[test]
    fn player_listing_hides_unfound_codes_and_notes() {
        let listing = seeded().list_codes(1).unwrap();
        assert_eq!((listing.found, listing.left(), listing.total), (1, 2, 3));

        let hall = &listing.rooms[0];
        assert_eq!(hall.room, "hall");
        assert_eq!(hall.unfound, 1);
        assert_eq!(
            hall.entries,
            vec![ListedCode {
                code: "H2".into(),
                finder: Some("alice".into()),
                note: None,
            }]
        );

        let kitchen = &listing.rooms[1];
        assert!(kitchen.entries.is_empty());
        assert_eq!(kitchen.unfound, 1);
    }

    #[test]
    fn admin_listing_shows_everything_found_first() {
        let listing = seeded().list_codes(9).unwrap();
        let hall = &listing.rooms[0];
        let codes: Vec<_> = hall.entries.iter().map(|e| e.code.as_str()).collect();
        assert_eq!(codes, vec!["H2", "H1"]);
        assert_eq!(hall.entries[1].note.as_deref(), Some("taped under chair"));
        assert_eq!(hall.unfound, 1);
    }
}
