use dozor_types::models::{AnswerPair, PlayerId};
use tracing::info;

use crate::Engine;
use crate::config::AnswerGroup;
use crate::error::Result;

/// Answers compare trimmed and lowercased.
pub fn normalize_answer(raw: &str) -> String {
    raw.trim().to_lowercase()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The group was already fully solved; the submission was not even checked
    AlreadyAllSolved,
    Wrong,
    /// Correct, but another submission claimed this answer first
    AlreadyFound { answer: String, finder: PlayerId },
    FirstSolve { answer: String },
    /// This submission found the last missing answer of the group
    AllSolvedNow { answer: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddAnswerOutcome {
    Added { answer: String },
    Duplicate { answer: String },
    Empty,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListedAnswer {
    pub answer: String,
    pub finder: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerListing {
    pub found: usize,
    pub left: usize,
    /// Unresolved answers first
    pub entries: Vec<ListedAnswer>,
}

/// An empty group counts as solved: there is nothing left to find.
fn all_found(answers: &[AnswerPair]) -> bool {
    answers.iter().all(AnswerPair::is_found)
}

impl Engine {
    pub fn submit_answer(
        &self,
        group: &AnswerGroup,
        player_id: PlayerId,
        raw_answer: &str,
    ) -> Result<SubmitOutcome> {
        if all_found(&self.db.list_answers(&group.table)?) {
            return Ok(SubmitOutcome::AlreadyAllSolved);
        }

        let answer = normalize_answer(raw_answer);

        if !self.db.claim_answer(&group.table, &answer, player_id)? {
            return Ok(match self.db.get_answer(&group.table, &answer)? {
                Some(AnswerPair {
                    finder: Some(finder),
                    ..
                }) => SubmitOutcome::AlreadyFound { answer, finder },
                _ => SubmitOutcome::Wrong,
            });
        }

        info!(group = %group.table, answer = %answer, player_id, "Answer found");
        if all_found(&self.db.list_answers(&group.table)?) {
            info!(group = %group.table, "All answers found");
            Ok(SubmitOutcome::AllSolvedNow { answer })
        } else {
            Ok(SubmitOutcome::FirstSolve { answer })
        }
    }

    pub fn add_answer(&self, group: &AnswerGroup, raw_answer: &str) -> Result<AddAnswerOutcome> {
        let answer = normalize_answer(raw_answer);
        if answer.is_empty() {
            return Ok(AddAnswerOutcome::Empty);
        }

        if self.db.insert_answer(&group.table, &answer)? {
            info!(group = %group.table, answer = %answer, "Answer added");
            Ok(AddAnswerOutcome::Added { answer })
        } else {
            Ok(AddAnswerOutcome::Duplicate { answer })
        }
    }

    pub fn list_answers(&self, group: &AnswerGroup) -> Result<AnswerListing> {
        let answers = self.db.list_answers(&group.table)?;

        let mut unresolved = Vec::new();
        let mut resolved = Vec::new();
        for pair in answers {
            match pair.finder {
                Some(id) => resolved.push(ListedAnswer {
                    answer: pair.answer,
                    finder: Some(self.display_name(id)?),
                }),
                None => unresolved.push(ListedAnswer {
                    answer: pair.answer,
                    finder: None,
                }),
            }
        }

        let found = resolved.len();
        let left = unresolved.len();
        unresolved.extend(resolved);
        Ok(AnswerListing {
            found,
            left,
            entries: unresolved,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::engine;

    fn pair_a() -> AnswerGroup {
        AnswerGroup::new("a3", "PairA")
    }

    #[test]
    fn normalizes_case_and_whitespace() {
        assert_eq!(normalize_answer("  Blue Whale \n"), "blue whale");
    }

    #[test]
    fn correct_answer_marks_entry_and_attributes_submitter() {
        let engine = engine();
        engine.add_answer(&pair_a(), "Cat").unwrap();
        engine.add_answer(&pair_a(), "dog").unwrap();

        assert_eq!(engine.submit_answer(&pair_a(), 1, "bird").unwrap(), SubmitOutcome::Wrong);
        assert_eq!(
            engine.submit_answer(&pair_a(), 1, "  CAT ").unwrap(),
            SubmitOutcome::FirstSolve {
                answer: "cat".into()
            }
        );
        assert_eq!(
            engine.submit_answer(&pair_a(), 2, "cat").unwrap(),
            SubmitOutcome::AlreadyFound {
                answer: "cat".into(),
                finder: 1
            }
        );
        assert_eq!(
            engine.submit_answer(&pair_a(), 2, "Dog").unwrap(),
            SubmitOutcome::AllSolvedNow {
                answer: "dog".into()
            }
        );
    }

    #[test]
    fn solved_group_rejects_even_correct_answers() {
        let engine = engine();
        engine.add_answer(&pair_a(), "cat").unwrap();
        engine.submit_answer(&pair_a(), 1, "cat").unwrap();

        assert_eq!(
            engine.submit_answer(&pair_a(), 2, "cat").unwrap(),
            SubmitOutcome::AlreadyAllSolved
        );
        assert_eq!(
            engine.submit_answer(&pair_a(), 2, "nonsense").unwrap(),
            SubmitOutcome::AlreadyAllSolved
        );
    }

    #[test]
    fn empty_group_counts_as_solved() {
        let engine = engine();
        assert_eq!(
            engine.submit_answer(&pair_a(), 1, "cat").unwrap(),
            SubmitOutcome::AlreadyAllSolved
        );
    }

    #[test]
    fn duplicate_check_uses_normalized_form() {
        let engine = engine();
        assert_eq!(
            engine.add_answer(&pair_a(), "Cat").unwrap(),
            AddAnswerOutcome::Added {
                answer: "cat".into()
            }
        );
        assert_eq!(
            engine.add_answer(&pair_a(), " CAT").unwrap(),
            AddAnswerOutcome::Duplicate {
                answer: "cat".into()
            }
        );
        assert_eq!(engine.add_answer(&pair_a(), "  ").unwrap(), AddAnswerOutcome::Empty);
    }

    #[test]
    fn listing_puts_unresolved_first_and_falls_back_to_id() {
        let engine = engine();
        engine.register(1, "alice").unwrap();
        for answer in ["ant", "bee", "cow"] {
            engine.add_answer(&pair_a(), answer).unwrap();
        }
        engine.submit_answer(&pair_a(), 1, "ant").unwrap();
        engine.submit_answer(&pair_a(), 77, "cow").unwrap();

        let listing = engine.list_answers(&pair_a()).unwrap();
        assert_eq!((listing.found, listing.left), (2, 1));
        assert_eq!(
            listing.entries,
            vec![
                ListedAnswer {
                    answer: "bee".into(),
                    finder: None
                },
                ListedAnswer {
                    answer: "ant".into(),
                    finder: Some("alice".into())
                },
                ListedAnswer {
                    answer: "cow".into(),
                    finder: Some("77".into())
                },
            ]
        );
    }
}
