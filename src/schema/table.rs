/// Table configuration: team sizes and allegiance splits per player count.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use thiserror::Error;

use super::role::Allegiance;

pub const MIN_PLAYERS: usize = 5;
pub const MAX_PLAYERS: usize = 10;
/// Quests per game.
pub const QUEST_COUNT: usize = 5;
/// Successes (or failures) that decide the quest phase.
pub const QUESTS_TO_WIN: usize = 3;
/// Consecutive rejected proposals that hand evil the game.
pub const MAX_REJECTIONS: u8 = 5;

#[derive(Debug, Error)]
pub enum RulesetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON deserialization error: {0}")]
    Ron(#[from] ron::error::SpannedError),
    #[error("invalid ruleset: {0}")]
    Invalid(String),
}

/// Requirements of a single quest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QuestSpec {
    pub team_size: usize,
    /// Fail cards needed to fail the quest.
    pub fails_required: usize,
}

impl QuestSpec {
    pub const fn single(team_size: usize) -> Self {
        Self {
            team_size,
            fails_required: 1,
        }
    }

    pub const fn double(team_size: usize) -> Self {
        Self {
            team_size,
            fails_required: 2,
        }
    }

    /// Returns true if `fail_cards` are enough to sink this quest.
    pub fn is_failed_by(&self, fail_cards: usize) -> bool {
        fail_cards >= self.fails_required
    }
}

/// Everything the game needs to know about one player count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableRow {
    pub player_count: usize,
    pub good: usize,
    pub evil: usize,
    pub quests: [QuestSpec; QUEST_COUNT],
}

impl TableRow {
    pub fn quest(&self, index: usize) -> Option<&QuestSpec> {
        self.quests.get(index)
    }

    /// Check the row on its own: a supported player count, both teams
    /// seated, and every quest within reach of the table.
    pub fn validate(&self) -> Result<(), RulesetError> {
        let count = self.player_count;
        if !(MIN_PLAYERS..=MAX_PLAYERS).contains(&count) {
            return Err(RulesetError::Invalid(format!(
                "unsupported player count {} (expected {}..={})",
                count, MIN_PLAYERS, MAX_PLAYERS
            )));
        }
        if self.good + self.evil != count {
            return Err(RulesetError::Invalid(format!(
                "{} players: {} good + {} evil does not fill the table",
                count, self.good, self.evil
            )));
        }
        // Merlin and the Assassin are always dealt.
        if self.good == 0 || self.evil == 0 {
            return Err(RulesetError::Invalid(format!(
                "{} players: both teams need at least one seat",
                count
            )));
        }
        for (i, quest) in self.quests.iter().enumerate() {
            if quest.team_size == 0 || quest.team_size > count {
                return Err(RulesetError::Invalid(format!(
                    "{} players: quest {} team size {} out of range",
                    count,
                    i + 1,
                    quest.team_size
                )));
            }
            if quest.fails_required == 0 || quest.fails_required > quest.team_size {
                return Err(RulesetError::Invalid(format!(
                    "{} players: quest {} needs {} fails from a team of {}",
                    count,
                    i + 1,
                    quest.fails_required,
                    quest.team_size
                )));
            }
        }
        Ok(())
    }

    /// Seats available to roles of the given allegiance.
    pub fn slots(&self, allegiance: Allegiance) -> usize {
        match allegiance {
            Allegiance::Good => self.good,
            Allegiance::Evil => self.evil,
        }
    }
}

/// A named set of table rows, one per supported player count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Ruleset {
    pub name: String,
    rows: BTreeMap<usize, TableRow>,
}

// RON layout: team sizes as a plain list plus the 1-based quest numbers
// that need two fail cards.

#[derive(Debug, Deserialize)]
struct RonRow {
    good: usize,
    evil: usize,
    team_sizes: Vec<usize>,
    #[serde(default)]
    two_fail_quests: Vec<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(rename = "Ruleset")]
struct RonRuleset {
    name: String,
    tables: HashMap<usize, RonRow>,
}

const fn standard_row(player_count: usize, good: usize, evil: usize, sizes: [usize; 5]) -> TableRow {
    TableRow {
        player_count,
        good,
        evil,
        quests: [
            QuestSpec::single(sizes[0]),
            QuestSpec::single(sizes[1]),
            QuestSpec::single(sizes[2]),
            QuestSpec::single(sizes[3]),
            QuestSpec::single(sizes[4]),
        ],
    }
}

impl Ruleset {
    /// The shipped tables. Every quest fails on a single fail card.
    pub fn standard() -> Ruleset {
        let rows = [
            standard_row(5, 3, 2, [2, 3, 2, 3, 3]),
            standard_row(6, 4, 2, [2, 3, 4, 3, 4]),
            standard_row(7, 4, 3, [2, 3, 3, 4, 4]),
            standard_row(8, 5, 3, [3, 4, 4, 5, 5]),
            standard_row(9, 6, 3, [3, 4, 4, 5, 5]),
            standard_row(10, 6, 4, [3, 4, 4, 5, 5]),
        ];
        Ruleset {
            name: "standard".to_string(),
            rows: rows.into_iter().map(|r| (r.player_count, r)).collect(),
        }
    }

    /// Load a ruleset from a RON file.
    pub fn load_from_ron(path: &Path) -> Result<Ruleset, RulesetError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse_ron(&contents)
    }

    /// Parse and validate a ruleset from a RON string.
    pub fn parse_ron(input: &str) -> Result<Ruleset, RulesetError> {
        let raw: RonRuleset = ron::from_str(input)?;
        let mut rows = BTreeMap::new();

        for (player_count, row) in raw.tables {
            if row.team_sizes.len() != QUEST_COUNT {
                return Err(RulesetError::Invalid(format!(
                    "{} players: expected {} team sizes, found {}",
                    player_count,
                    QUEST_COUNT,
                    row.team_sizes.len()
                )));
            }
            let mut quests = [QuestSpec::single(0); QUEST_COUNT];
            for (i, size) in row.team_sizes.iter().enumerate() {
                quests[i] = QuestSpec::single(*size);
            }
            for number in row.two_fail_quests {
                if !(1..=QUEST_COUNT).contains(&number) {
                    return Err(RulesetError::Invalid(format!(
                        "{} players: quest {} does not exist",
                        player_count, number
                    )));
                }
                quests[number - 1].fails_required = 2;
            }
            rows.insert(
                player_count,
                TableRow {
                    player_count,
                    good: row.good,
                    evil: row.evil,
                    quests,
                },
            );
        }

        let ruleset = Ruleset {
            name: raw.name,
            rows,
        };
        ruleset.validate()?;
        Ok(ruleset)
    }

    /// Check every structural rule a ruleset must satisfy.
    pub fn validate(&self) -> Result<(), RulesetError> {
        for count in MIN_PLAYERS..=MAX_PLAYERS {
            if !self.rows.contains_key(&count) {
                return Err(RulesetError::Invalid(format!("missing table for {} players", count)));
            }
        }

        for (count, row) in &self.rows {
            if row.player_count != *count {
                return Err(RulesetError::Invalid(format!(
                    "table for {} players filed under {}",
                    row.player_count, count
                )));
            }
            row.validate()?;
        }
        Ok(())
    }

    pub fn row(&self, player_count: usize) -> Option<&TableRow> {
        self.rows.get(&player_count)
    }

    pub fn rows(&self) -> impl Iterator<Item = &TableRow> {
        self.rows.values()
    }
}

impl Default for Ruleset {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_is_valid() {
        let rules = Ruleset::standard();
        rules.validate().unwrap();
        assert_eq!(rules.rows().count(), 6);
    }

    #[test]
    fn standard_five_player_row() {
        let rules = Ruleset::standard();
        let row = rules.row(5).unwrap();
        let sizes: Vec<usize> = row.quests.iter().map(|q| q.team_size).collect();
        assert_eq!(sizes, vec![2, 3, 2, 3, 3]);
        assert_eq!((row.good, row.evil), (3, 2));
        assert_eq!(row.slots(Allegiance::Evil), 2);
        assert!(row.quests.iter().all(|q| q.fails_required == 1));
    }

    #[test]
    fn standard_ten_player_row() {
        let rules = Ruleset::standard();
        let row = rules.row(10).unwrap();
        assert_eq!((row.good, row.evil), (6, 4));
        assert_eq!(row.quest(4).unwrap().team_size, 5);
        assert!(row.quest(5).is_none());
    }

    #[test]
    fn unsupported_counts() {
        let rules = Ruleset::standard();
        assert!(rules.row(4).is_none());
        assert!(rules.row(11).is_none());
    }

    #[test]
    fn row_validation() {
        for row in Ruleset::standard().rows() {
            row.validate().unwrap();
        }

        let mut small = Ruleset::standard().row(5).unwrap().clone();
        small.player_count = 3;
        small.good = 2;
        small.evil = 1;
        small.quests = [QuestSpec::single(2); QUEST_COUNT];
        let err = small.validate().unwrap_err();
        assert!(err.to_string().contains("unsupported player count 3"));

        let mut oversized = Ruleset::standard().row(5).unwrap().clone();
        oversized.quests[2] = QuestSpec::single(6);
        assert!(oversized.validate().is_err());

        let mut impossible = Ruleset::standard().row(5).unwrap().clone();
        impossible.quests[0] = QuestSpec {
            team_size: 2,
            fails_required: 3,
        };
        assert!(impossible.validate().is_err());
    }

    #[test]
    fn quest_failure_threshold() {
        assert!(QuestSpec::single(2).is_failed_by(1));
        assert!(!QuestSpec::single(2).is_failed_by(0));
        assert!(!QuestSpec::double(4).is_failed_by(1));
        assert!(QuestSpec::double(4).is_failed_by(2));
    }

    fn ron_with_row_seven(row_seven: &str) -> String {
        format!(
            r#"Ruleset(
                name: "test",
                tables: {{
                    5: (good: 3, evil: 2, team_sizes: [2, 3, 2, 3, 3]),
                    6: (good: 4, evil: 2, team_sizes: [2, 3, 4, 3, 4]),
                    7: {},
                    8: (good: 5, evil: 3, team_sizes: [3, 4, 4, 5, 5]),
                    9: (good: 6, evil: 3, team_sizes: [3, 4, 4, 5, 5]),
                    10: (good: 6, evil: 4, team_sizes: [3, 4, 4, 5, 5]),
                }},
            )"#,
            row_seven
        )
    }

    #[test]
    fn parse_two_fail_quest() {
        let input = ron_with_row_seven(
            "(good: 4, evil: 3, team_sizes: [2, 3, 3, 4, 4], two_fail_quests: [4])",
        );
        let rules = Ruleset::parse_ron(&input).unwrap();
        assert_eq!(rules.name, "test");
        let row = rules.row(7).unwrap();
        assert_eq!(row.quests[3], QuestSpec::double(4));
        assert_eq!(row.quests[4], QuestSpec::single(4));
        assert_eq!(rules.row(5).unwrap(), Ruleset::standard().row(5).unwrap());
    }

    #[test]
    fn parse_rejects_unbalanced_row() {
        let input = ron_with_row_seven("(good: 4, evil: 2, team_sizes: [2, 3, 3, 4, 4])");
        assert!(matches!(
            Ruleset::parse_ron(&input),
            Err(RulesetError::Invalid(_))
        ));
    }

    #[test]
    fn parse_rejects_short_quest_list() {
        let input = ron_with_row_seven("(good: 4, evil: 3, team_sizes: [2, 3, 3, 4])");
        assert!(matches!(
            Ruleset::parse_ron(&input),
            Err(RulesetError::Invalid(_))
        ));
    }

    #[test]
    fn parse_rejects_missing_quest_number() {
        let input = ron_with_row_seven(
            "(good: 4, evil: 3, team_sizes: [2, 3, 3, 4, 4], two_fail_quests: [6])",
        );
        assert!(Ruleset::parse_ron(&input).is_err());
    }

    #[test]
    fn parse_rejects_two_fails_on_solo_quest() {
        let input = ron_with_row_seven(
            "(good: 4, evil: 3, team_sizes: [1, 3, 3, 4, 4], two_fail_quests: [1])",
        );
        assert!(Ruleset::parse_ron(&input).is_err());
    }

    #[test]
    fn parse_rejects_missing_player_count() {
        let input = r#"Ruleset(
            name: "partial",
            tables: {
                5: (good: 3, evil: 2, team_sizes: [2, 3, 2, 3, 3]),
            },
        )"#;
        let err = Ruleset::parse_ron(input).unwrap_err();
        assert!(err.to_string().contains("missing table for 6 players"));
    }

    #[test]
    fn parse_syntax_error() {
        assert!(matches!(
            Ruleset::parse_ron("Ruleset(name: "),
            Err(RulesetError::Ron(_))
        ));
    }
}
