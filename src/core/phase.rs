/// Phase state machine: proposals, votes, quests, and the endgame.
///
/// `advance` is a pure transition function: it never touches its input and
/// either returns the next state or the precondition the action violated.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::ops::Bound;
use thiserror::Error;

use crate::core::deck::Deck;
use crate::core::knowledge::{resolve_knowledge, LabeledPlayer};
use crate::schema::player::{Player, Seat};
use crate::schema::role::{catalog, Allegiance};
use crate::schema::table::{QuestSpec, TableRow, MAX_REJECTIONS, QUESTS_TO_WIN, QUEST_COUNT};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PreconditionViolation {
    #[error("{action} is not allowed during {phase}")]
    WrongPhase {
        action: &'static str,
        phase: &'static str,
    },
    #[error("no game is in progress")]
    NotStarted,
    #[error("malformed deck: {0}")]
    MalformedDeck(String),
    #[error("{0} is not at the table")]
    UnknownSeat(Seat),
    #[error("{0} is listed more than once")]
    DuplicateSeat(Seat),
    #[error("quest team needs {required} members, got {actual}")]
    WrongTeamSize { required: usize, actual: usize },
    #[error("quest team is already full ({0} members)")]
    TeamFull(usize),
    #[error("{0} is not on the quest team")]
    NotOnTeam(Seat),
    #[error("it is {expected}'s turn to play a quest card, not {actual}'s")]
    OutOfTurn { expected: Seat, actual: Seat },
    #[error("{0} is good and can only play success")]
    GoodCannotFail(Seat),
    #[error("{0} is not a good player and cannot be assassinated")]
    InvalidTarget(Seat),
    #[error("no assassination target has been chosen")]
    NoTarget,
}

/// Result of a finished quest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QuestOutcome {
    Success,
    Fail,
}

/// The public approve/reject vote on a proposed team.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Verdict {
    Approve,
    Reject,
}

/// Why the game ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EndReason {
    /// Three quests failed.
    QuestsFailed,
    /// Five proposals in a row were rejected.
    Gridlock,
    /// The assassin found the assassination target.
    MerlinAssassinated { target: Seat },
    /// The assassin picked the wrong good player.
    AssassinationMissed { target: Seat },
    /// Good completed three quests and nobody could assassinate.
    NoAssassin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GameOutcome {
    pub winner: Allegiance,
    pub reason: EndReason,
}

impl GameOutcome {
    /// Closing line for the end screen.
    pub fn message(&self, players: &[Player]) -> String {
        let name_of = |seat: Seat| {
            players
                .get(seat.0)
                .map(|p| p.name.clone())
                .unwrap_or_else(|| seat.default_name())
        };
        let target_role = catalog()
            .iter()
            .find(|r| r.is_assassination_target())
            .map(|r| r.name)
            .unwrap_or("the target");

        match self.reason {
            EndReason::QuestsFailed => "Three quests have failed. Evil wins.".to_string(),
            EndReason::Gridlock => {
                "Five proposals in a row were rejected. Evil wins.".to_string()
            }
            EndReason::MerlinAssassinated { .. } => {
                format!("Assassination succeeded! {} has fallen.", target_role)
            }
            EndReason::AssassinationMissed { target } => {
                format!("Assassination failed! {} is not {}.", name_of(target), target_role)
            }
            EndReason::NoAssassin => {
                "Three quests succeeded and no assassin stands in the way. Good wins.".to_string()
            }
        }
    }
}

/// Summary of the most recently resolved quest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QuestReport {
    /// 0-based quest index.
    pub quest: usize,
    pub fail_cards: usize,
    pub outcome: QuestOutcome,
}

impl QuestReport {
    /// e.g. "Quest 2: failed (1 fail card)".
    pub fn message(&self) -> String {
        let verdict = match self.outcome {
            QuestOutcome::Success => "succeeded",
            QuestOutcome::Fail => "failed",
        };
        let plural = if self.fail_cards == 1 { "" } else { "s" };
        format!(
            "Quest {}: {} ({} fail card{})",
            self.quest + 1,
            verdict,
            self.fail_cards,
            plural
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    Setup,
    /// Showing `seat` their card; waits for acknowledgement.
    Reveal { seat: Seat },
    RoundStart,
    TeamProposal,
    TeamVote,
    /// `seat` is playing their secret quest card.
    QuestExecution { seat: Seat },
    QuestResult,
    Assassination,
    GameEnd(GameOutcome),
}

impl Phase {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Setup => "setup",
            Self::Reveal { .. } => "reveal",
            Self::RoundStart => "round start",
            Self::TeamProposal => "team proposal",
            Self::TeamVote => "team vote",
            Self::QuestExecution { .. } => "quest execution",
            Self::QuestResult => "quest result",
            Self::Assassination => "assassination",
            Self::GameEnd(_) => "game end",
        }
    }

    /// Phases between the first round start and the end of the quests.
    /// The assassin may reveal themselves from any of these.
    pub fn is_in_round(&self) -> bool {
        matches!(
            self,
            Self::RoundStart
                | Self::TeamProposal
                | Self::TeamVote
                | Self::QuestExecution { .. }
                | Self::QuestResult
        )
    }
}

/// Everything a player can do to the state machine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    /// Seat a dealt deck and begin the reveal.
    BeginGame(Deck),
    AcknowledgeReveal,
    StartRound,
    /// Add or remove one seat from the proposal.
    ToggleTeamMember(Seat),
    /// Propose a complete team and call the vote.
    ProposeTeam(Vec<Seat>),
    /// Call the vote on the team built with `ToggleTeamMember`.
    SubmitProposal,
    SubmitVote(Verdict),
    CastQuestVote { seat: Seat, success: bool },
    ConfirmQuestResult,
    NominateTarget(Seat),
    ConfirmAssassination,
    /// The assassin reveals themselves mid-round and skips to the assassination.
    ForceAssassination,
    /// Discard the game and return to setup.
    StartNewLegend,
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Self::BeginGame(_) => "begin game",
            Self::AcknowledgeReveal => "acknowledge reveal",
            Self::StartRound => "start round",
            Self::ToggleTeamMember(_) => "toggle team member",
            Self::ProposeTeam(_) => "propose team",
            Self::SubmitProposal => "submit proposal",
            Self::SubmitVote(_) => "submit vote",
            Self::CastQuestVote { .. } => "cast quest vote",
            Self::ConfirmQuestResult => "confirm quest result",
            Self::NominateTarget(_) => "nominate target",
            Self::ConfirmAssassination => "confirm assassination",
            Self::ForceAssassination => "force assassination",
            Self::StartNewLegend => "start new legend",
        }
    }
}

/// What a seat is shown during the reveal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleReveal {
    pub player: Player,
    pub knowledge: Vec<LabeledPlayer>,
}

/// The whole mutable progress of one game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameState {
    pub phase: Phase,
    pub players: Vec<Player>,
    /// Table row for this player count; `None` until the game begins.
    pub table: Option<TableRow>,
    pub leader: Seat,
    pub quest_index: usize,
    pub quest_history: [Option<QuestOutcome>; QUEST_COUNT],
    /// Consecutive rejected proposals on the current quest.
    pub rejections: u8,
    pub proposed_team: BTreeSet<Seat>,
    /// Quest cards in the order they were played.
    pub quest_votes: Vec<bool>,
    pub assassination_target: Option<Seat>,
    pub last_report: Option<QuestReport>,
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}

/// Apply `action` to `state`, returning the next state.
///
/// On a violation the input state is untouched and remains current.
pub fn advance(state: &GameState, action: Action) -> Result<GameState, PreconditionViolation> {
    let mut next = state.clone();
    next.apply(action)?;
    Ok(next)
}

impl GameState {
    /// A fresh state waiting in setup.
    pub fn new() -> Self {
        Self {
            phase: Phase::Setup,
            players: Vec::new(),
            table: None,
            leader: Seat(0),
            quest_index: 0,
            quest_history: [None; QUEST_COUNT],
            rejections: 0,
            proposed_team: BTreeSet::new(),
            quest_votes: Vec::new(),
            assassination_target: None,
            last_report: None,
        }
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn player(&self, seat: Seat) -> Option<&Player> {
        self.players.get(seat.0)
    }

    pub fn leader_player(&self) -> Option<&Player> {
        self.player(self.leader)
    }

    /// Requirements of the active quest.
    pub fn current_quest(&self) -> Option<&QuestSpec> {
        self.table.as_ref()?.quest(self.quest_index)
    }

    /// (successes, failures) recorded so far.
    pub fn quest_tally(&self) -> (usize, usize) {
        let count = |outcome| {
            self.quest_history
                .iter()
                .filter(|slot| **slot == Some(outcome))
                .count()
        };
        (count(QuestOutcome::Success), count(QuestOutcome::Fail))
    }

    pub fn outcome(&self) -> Option<&GameOutcome> {
        match &self.phase {
            Phase::GameEnd(outcome) => Some(outcome),
            _ => None,
        }
    }

    pub fn is_over(&self) -> bool {
        self.outcome().is_some()
    }

    /// Closing line for the end screen, once the game is over.
    pub fn end_message(&self) -> Option<String> {
        self.outcome().map(|o| o.message(&self.players))
    }

    /// The seat's card and what it knows, for the reveal screen.
    ///
    /// Only the seat whose turn it is to look may see its card. Once the
    /// game is over every card is open.
    pub fn reveal(&self, seat: Seat) -> Option<RoleReveal> {
        if self.phase != (Phase::Reveal { seat }) && !self.is_over() {
            return None;
        }
        let player = self.player(seat)?;
        Some(RoleReveal {
            player: player.clone(),
            knowledge: resolve_knowledge(player, &self.players),
        })
    }

    /// Seats the assassin may nominate.
    pub fn assassination_candidates(&self) -> Vec<&Player> {
        self.players.iter().filter(|p| p.is_good()).collect()
    }

    /// Whether `seat` may play a fail card. Good players never can.
    pub fn can_fail(&self, seat: Seat) -> bool {
        self.player(seat).map(Player::is_evil).unwrap_or(false)
    }

    fn wrong_phase(&self, action: &Action) -> PreconditionViolation {
        PreconditionViolation::WrongPhase {
            action: action.name(),
            phase: self.phase.name(),
        }
    }

    fn require_seat(&self, seat: Seat) -> Result<&Player, PreconditionViolation> {
        self.player(seat)
            .ok_or(PreconditionViolation::UnknownSeat(seat))
    }

    fn required_team_size(&self) -> Result<usize, PreconditionViolation> {
        self.current_quest()
            .map(|q| q.team_size)
            .ok_or(PreconditionViolation::NotStarted)
    }

    fn apply(&mut self, action: Action) -> Result<(), PreconditionViolation> {
        match (self.phase, action) {
            (_, Action::StartNewLegend) => {
                *self = GameState::new();
            }
            (Phase::Setup, Action::BeginGame(deck)) => self.begin(deck)?,
            (Phase::Reveal { seat }, Action::AcknowledgeReveal) => {
                let next = Seat(seat.0 + 1);
                self.phase = if next.0 < self.player_count() {
                    Phase::Reveal { seat: next }
                } else {
                    Phase::RoundStart
                };
            }
            (Phase::RoundStart, Action::StartRound) => {
                self.proposed_team.clear();
                self.quest_votes.clear();
                self.phase = Phase::TeamProposal;
            }
            (Phase::TeamProposal, Action::ToggleTeamMember(seat)) => {
                self.require_seat(seat)?;
                if !self.proposed_team.remove(&seat) {
                    let limit = self.required_team_size()?;
                    if self.proposed_team.len() >= limit {
                        return Err(PreconditionViolation::TeamFull(limit));
                    }
                    self.proposed_team.insert(seat);
                }
            }
            (Phase::TeamProposal, Action::ProposeTeam(seats)) => {
                let mut team = BTreeSet::new();
                for seat in seats {
                    self.require_seat(seat)?;
                    if !team.insert(seat) {
                        return Err(PreconditionViolation::DuplicateSeat(seat));
                    }
                }
                self.check_team_size(team.len())?;
                self.proposed_team = team;
                self.phase = Phase::TeamVote;
            }
            (Phase::TeamProposal, Action::SubmitProposal) => {
                self.check_team_size(self.proposed_team.len())?;
                self.phase = Phase::TeamVote;
            }
            (Phase::TeamVote, Action::SubmitVote(Verdict::Approve)) => {
                let Some(first) = self.proposed_team.first().copied() else {
                    return Err(PreconditionViolation::WrongTeamSize {
                        required: self.required_team_size()?,
                        actual: 0,
                    });
                };
                self.rejections = 0;
                self.quest_votes.clear();
                self.phase = Phase::QuestExecution { seat: first };
            }
            (Phase::TeamVote, Action::SubmitVote(Verdict::Reject)) => {
                self.rejections += 1;
                if self.rejections >= MAX_REJECTIONS {
                    self.finish(Allegiance::Evil, EndReason::Gridlock);
                } else {
                    self.leader = self.leader.next(self.player_count());
                    self.phase = Phase::RoundStart;
                }
            }
            (Phase::QuestExecution { seat: expected }, Action::CastQuestVote { seat, success }) => {
                let player = self.require_seat(seat)?;
                if !self.proposed_team.contains(&seat) {
                    return Err(PreconditionViolation::NotOnTeam(seat));
                }
                if seat != expected {
                    return Err(PreconditionViolation::OutOfTurn {
                        expected,
                        actual: seat,
                    });
                }
                if !success && player.is_good() {
                    return Err(PreconditionViolation::GoodCannotFail(seat));
                }
                self.quest_votes.push(success);
                let next = self
                    .proposed_team
                    .range((Bound::Excluded(seat), Bound::Unbounded))
                    .next()
                    .copied();
                self.phase = match next {
                    Some(seat) => Phase::QuestExecution { seat },
                    None => Phase::QuestResult,
                };
            }
            (Phase::QuestResult, Action::ConfirmQuestResult) => self.resolve_quest()?,
            (Phase::Assassination, Action::NominateTarget(seat)) => {
                if !self.require_seat(seat)?.is_good() {
                    return Err(PreconditionViolation::InvalidTarget(seat));
                }
                self.assassination_target = Some(seat);
            }
            (Phase::Assassination, Action::ConfirmAssassination) => {
                let target = self
                    .assassination_target
                    .ok_or(PreconditionViolation::NoTarget)?;
                let hit = self.require_seat(target)?.role_card().is_assassination_target();
                if hit {
                    self.finish(Allegiance::Evil, EndReason::MerlinAssassinated { target });
                } else {
                    self.finish(Allegiance::Good, EndReason::AssassinationMissed { target });
                }
            }
            (phase, Action::ForceAssassination) if phase.is_in_round() => {
                self.quest_votes.clear();
                self.enter_assassination();
            }
            (_, action) => return Err(self.wrong_phase(&action)),
        }
        Ok(())
    }

    fn begin(&mut self, deck: Deck) -> Result<(), PreconditionViolation> {
        let Deck {
            players,
            leader,
            table,
        } = deck;

        table
            .validate()
            .map_err(|e| PreconditionViolation::MalformedDeck(e.to_string()))?;
        if players.len() != table.player_count {
            return Err(PreconditionViolation::MalformedDeck(format!(
                "{} players dealt for a table of {}",
                players.len(),
                table.player_count
            )));
        }
        if let Some((_, p)) = players.iter().enumerate().find(|(i, p)| p.seat != Seat(*i)) {
            return Err(PreconditionViolation::MalformedDeck(format!(
                "{} dealt out of order",
                p.seat
            )));
        }
        if let Some(p) = players.iter().find(|p| p.allegiance != p.role.allegiance()) {
            return Err(PreconditionViolation::MalformedDeck(format!(
                "{} holds {} but is marked {}",
                p.seat,
                p.role.name(),
                p.allegiance.label()
            )));
        }
        let evil = players.iter().filter(|p| p.is_evil()).count();
        if evil != table.evil {
            return Err(PreconditionViolation::MalformedDeck(format!(
                "{} evil players dealt, table needs {}",
                evil, table.evil
            )));
        }
        if leader.0 >= players.len() {
            return Err(PreconditionViolation::UnknownSeat(leader));
        }

        *self = GameState {
            phase: Phase::Reveal { seat: Seat(0) },
            players,
            table: Some(table),
            leader,
            ..GameState::new()
        };
        Ok(())
    }

    fn check_team_size(&self, actual: usize) -> Result<(), PreconditionViolation> {
        let required = self.required_team_size()?;
        if actual != required {
            return Err(PreconditionViolation::WrongTeamSize { required, actual });
        }
        Ok(())
    }

    fn resolve_quest(&mut self) -> Result<(), PreconditionViolation> {
        let quest = *self.current_quest().ok_or(PreconditionViolation::NotStarted)?;
        let fail_cards = self.quest_votes.iter().filter(|v| !**v).count();
        let outcome = if quest.is_failed_by(fail_cards) {
            QuestOutcome::Fail
        } else {
            QuestOutcome::Success
        };

        self.quest_history[self.quest_index] = Some(outcome);
        self.last_report = Some(QuestReport {
            quest: self.quest_index,
            fail_cards,
            outcome,
        });

        let (successes, failures) = self.quest_tally();
        if failures >= QUESTS_TO_WIN {
            self.finish(Allegiance::Evil, EndReason::QuestsFailed);
        } else if successes >= QUESTS_TO_WIN {
            self.enter_assassination();
        } else {
            self.quest_index += 1;
            self.leader = self.leader.next(self.player_count());
            self.phase = Phase::RoundStart;
        }
        Ok(())
    }

    fn enter_assassination(&mut self) {
        self.assassination_target = None;
        let has_assassin = self.players.iter().any(|p| p.role_card().can_assassinate());
        if has_assassin {
            self.phase = Phase::Assassination;
        } else {
            self.finish(Allegiance::Good, EndReason::NoAssassin);
        }
    }

    fn finish(&mut self, winner: Allegiance, reason: EndReason) {
        self.phase = Phase::GameEnd(GameOutcome { winner, reason });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::role::RoleId;
    use crate::schema::table::Ruleset;

    // Seats: 0 Merlin, 1 Servant, 2 Assassin, 3 Servant, 4 Minion.
    fn five_player_deck() -> Deck {
        let roles = [
            RoleId::Merlin,
            RoleId::Servant,
            RoleId::Assassin,
            RoleId::Servant,
            RoleId::Minion,
        ];
        Deck {
            players: roles
                .iter()
                .enumerate()
                .map(|(i, &role)| Player {
                    seat: Seat(i),
                    name: Seat(i).default_name(),
                    role,
                    allegiance: role.allegiance(),
                    description: role.role().description.resolve(&roles).to_string(),
                })
                .collect(),
            leader: Seat(0),
            table: Ruleset::standard().row(5).unwrap().clone(),
        }
    }

    fn step(state: &GameState, action: Action) -> GameState {
        advance(state, action).unwrap()
    }

    fn started() -> GameState {
        let mut state = step(&GameState::new(), Action::BeginGame(five_player_deck()));
        for _ in 0..5 {
            state = step(&state, Action::AcknowledgeReveal);
        }
        state
    }

    fn play_quest(state: &GameState, team: &[usize], fails: &[usize]) -> GameState {
        let mut state = step(state, Action::StartRound);
        state = step(
            &state,
            Action::ProposeTeam(team.iter().map(|&s| Seat(s)).collect()),
        );
        state = step(&state, Action::SubmitVote(Verdict::Approve));
        let mut seats: Vec<usize> = team.to_vec();
        seats.sort();
        for s in seats {
            state = step(
                &state,
                Action::CastQuestVote {
                    seat: Seat(s),
                    success: !fails.contains(&s),
                },
            );
        }
        step(&state, Action::ConfirmQuestResult)
    }

    #[test]
    fn new_state_is_setup() {
        let state = GameState::new();
        assert_eq!(state.phase, Phase::Setup);
        assert!(state.players.is_empty());
        assert_eq!(state.quest_tally(), (0, 0));
    }

    #[test]
    fn reveal_walks_every_seat() {
        let mut state = step(&GameState::new(), Action::BeginGame(five_player_deck()));
        for i in 0..5 {
            assert_eq!(state.phase, Phase::Reveal { seat: Seat(i) });
            state = step(&state, Action::AcknowledgeReveal);
        }
        assert_eq!(state.phase, Phase::RoundStart);
        assert_eq!(state.quest_index, 0);
        assert_eq!(state.rejections, 0);
        assert_eq!(state.quest_history, [None; QUEST_COUNT]);
    }

    #[test]
    fn reveal_contents() {
        let state = step(&GameState::new(), Action::BeginGame(five_player_deck()));
        let reveal = state.reveal(Seat(0)).unwrap();
        assert_eq!(reveal.player.role, RoleId::Merlin);
        assert_eq!(reveal.knowledge.len(), 5);
        assert!(state.reveal(Seat(5)).is_none());
        // Seat 1 waits its turn.
        assert!(state.reveal(Seat(1)).is_none());
        let state = step(&state, Action::AcknowledgeReveal);
        assert!(state.reveal(Seat(0)).is_none());
        assert_eq!(state.reveal(Seat(1)).unwrap().player.seat, Seat(1));
    }

    #[test]
    fn cards_stay_hidden_mid_round() {
        let state = step(&started(), Action::StartRound);
        let state = step(&state, Action::ProposeTeam(vec![Seat(1), Seat(2)]));
        let state = step(&state, Action::SubmitVote(Verdict::Reject));
        assert_eq!(state.phase, Phase::RoundStart);
        assert!((0..5).all(|i| state.reveal(Seat(i)).is_none()));
    }

    #[test]
    fn cards_open_once_over() {
        let mut state = play_quest(&started(), &[1, 4], &[4]);
        state = play_quest(&state, &[1, 3, 4], &[4]);
        state = play_quest(&state, &[1, 4], &[4]);
        assert!(state.is_over());
        assert_eq!(state.reveal(Seat(4)).unwrap().player.role, RoleId::Assassin);
    }

    #[test]
    fn begin_rejects_bad_deck() {
        let mut deck = five_player_deck();
        deck.players.pop();
        let err = advance(&GameState::new(), Action::BeginGame(deck)).unwrap_err();
        assert!(matches!(err, PreconditionViolation::MalformedDeck(_)));

        let mut deck = five_player_deck();
        deck.players[1].role = RoleId::Minion;
        deck.players[1].allegiance = Allegiance::Evil;
        assert!(advance(&GameState::new(), Action::BeginGame(deck)).is_err());

        // A three seat table, consistent with itself.
        let mut deck = five_player_deck();
        deck.players.truncate(3);
        deck.players[2].role = RoleId::Assassin;
        deck.players[2].allegiance = Allegiance::Evil;
        deck.table.player_count = 3;
        deck.table.good = 2;
        deck.table.evil = 1;
        deck.table.quests = [QuestSpec::single(2); QUEST_COUNT];
        let err = advance(&GameState::new(), Action::BeginGame(deck)).unwrap_err();
        assert!(matches!(err, PreconditionViolation::MalformedDeck(_)));

        // Evil count still matches, but the cards disagree with their roles.
        let mut deck = five_player_deck();
        let servant = deck.players.iter().position(|p| p.role == RoleId::Servant).unwrap();
        let assassin = deck.players.iter().position(|p| p.role == RoleId::Assassin).unwrap();
        deck.players[servant].allegiance = Allegiance::Evil;
        deck.players[assassin].allegiance = Allegiance::Good;
        let err = advance(&GameState::new(), Action::BeginGame(deck)).unwrap_err();
        assert!(matches!(err, PreconditionViolation::MalformedDeck(_)));
    }

    #[test]
    fn wrong_phase_is_rejected_without_change() {
        let state = GameState::new();
        let err = advance(&state, Action::StartRound).unwrap_err();
        assert_eq!(
            err,
            PreconditionViolation::WrongPhase {
                action: "start round",
                phase: "setup"
            }
        );
        assert_eq!(state, GameState::new());
    }

    #[test]
    fn toggle_clamps_team_size() {
        let state = step(&started(), Action::StartRound);
        let state = step(&state, Action::ToggleTeamMember(Seat(1)));
        let state = step(&state, Action::ToggleTeamMember(Seat(3)));
        assert_eq!(
            advance(&state, Action::ToggleTeamMember(Seat(4))),
            Err(PreconditionViolation::TeamFull(2))
        );
        let state = step(&state, Action::ToggleTeamMember(Seat(1)));
        assert_eq!(state.proposed_team.len(), 1);
        assert_eq!(
            advance(&state, Action::SubmitProposal),
            Err(PreconditionViolation::WrongTeamSize {
                required: 2,
                actual: 1
            })
        );
        let state = step(&state, Action::ToggleTeamMember(Seat(4)));
        let state = step(&state, Action::SubmitProposal);
        assert_eq!(state.phase, Phase::TeamVote);
    }

    #[test]
    fn propose_team_validation() {
        let state = step(&started(), Action::StartRound);
        assert_eq!(
            advance(&state, Action::ProposeTeam(vec![Seat(1), Seat(2), Seat(3)])),
            Err(PreconditionViolation::WrongTeamSize {
                required: 2,
                actual: 3
            })
        );
        assert_eq!(
            advance(&state, Action::ProposeTeam(vec![Seat(1), Seat(1)])),
            Err(PreconditionViolation::DuplicateSeat(Seat(1)))
        );
        assert_eq!(
            advance(&state, Action::ProposeTeam(vec![Seat(1), Seat(7)])),
            Err(PreconditionViolation::UnknownSeat(Seat(7)))
        );
    }

    #[test]
    fn rejection_rotates_leader() {
        let state = step(&started(), Action::StartRound);
        let state = step(&state, Action::ProposeTeam(vec![Seat(0), Seat(1)]));
        let state = step(&state, Action::SubmitVote(Verdict::Reject));
        assert_eq!(state.phase, Phase::RoundStart);
        assert_eq!(state.rejections, 1);
        assert_eq!(state.leader, Seat(1));
    }

    #[test]
    fn approval_resets_rejections() {
        let mut state = started();
        for _ in 0..3 {
            state = step(&state, Action::StartRound);
            state = step(&state, Action::ProposeTeam(vec![Seat(0), Seat(1)]));
            state = step(&state, Action::SubmitVote(Verdict::Reject));
        }
        assert_eq!(state.rejections, 3);
        state = step(&state, Action::StartRound);
        assert!(state.proposed_team.is_empty());
        state = step(&state, Action::ProposeTeam(vec![Seat(3), Seat(1)]));
        state = step(&state, Action::SubmitVote(Verdict::Approve));
        assert_eq!(state.rejections, 0);
        assert_eq!(state.phase, Phase::QuestExecution { seat: Seat(1) });
    }

    #[test]
    fn quest_votes_in_seat_order() {
        let state = step(&started(), Action::StartRound);
        let state = step(&state, Action::ProposeTeam(vec![Seat(4), Seat(1)]));
        let state = step(&state, Action::SubmitVote(Verdict::Approve));
        assert_eq!(
            advance(
                &state,
                Action::CastQuestVote {
                    seat: Seat(4),
                    success: false
                }
            ),
            Err(PreconditionViolation::OutOfTurn {
                expected: Seat(1),
                actual: Seat(4)
            })
        );
        assert_eq!(
            advance(
                &state,
                Action::CastQuestVote {
                    seat: Seat(2),
                    success: false
                }
            ),
            Err(PreconditionViolation::NotOnTeam(Seat(2)))
        );
        assert_eq!(
            advance(
                &state,
                Action::CastQuestVote {
                    seat: Seat(1),
                    success: false
                }
            ),
            Err(PreconditionViolation::GoodCannotFail(Seat(1)))
        );
        let state = step(
            &state,
            Action::CastQuestVote {
                seat: Seat(1),
                success: true,
            },
        );
        assert_eq!(state.phase, Phase::QuestExecution { seat: Seat(4) });
        let state = step(
            &state,
            Action::CastQuestVote {
                seat: Seat(4),
                success: false,
            },
        );
        assert_eq!(state.phase, Phase::QuestResult);
        assert_eq!(state.quest_votes, vec![true, false]);
    }

    #[test]
    fn single_fail_sinks_quest() {
        let state = play_quest(&started(), &[1, 4], &[4]);
        assert_eq!(state.quest_history[0], Some(QuestOutcome::Fail));
        assert_eq!(state.quest_index, 1);
        assert_eq!(state.leader, Seat(1));
        let report = state.last_report.unwrap();
        assert_eq!(report.fail_cards, 1);
        assert_eq!(report.message(), "Quest 1: failed (1 fail card)");
    }

    #[test]
    fn evil_may_play_success() {
        let state = play_quest(&started(), &[2, 4], &[]);
        assert_eq!(state.quest_history[0], Some(QuestOutcome::Success));
        assert_eq!(
            state.last_report.unwrap().message(),
            "Quest 1: succeeded (0 fail cards)"
        );
    }

    #[test]
    fn two_fail_quest_survives_one_fail() {
        let mut deck = five_player_deck();
        deck.table.quests[0] = QuestSpec::double(2);
        let mut state = step(&GameState::new(), Action::BeginGame(deck));
        for _ in 0..5 {
            state = step(&state, Action::AcknowledgeReveal);
        }
        let after_one = play_quest(&state, &[1, 4], &[4]);
        assert_eq!(after_one.quest_history[0], Some(QuestOutcome::Success));
        let after_two = play_quest(&state, &[2, 4], &[2, 4]);
        assert_eq!(after_two.quest_history[0], Some(QuestOutcome::Fail));
    }

    #[test]
    fn third_success_goes_to_assassination() {
        let mut state = started();
        state = play_quest(&state, &[0, 1], &[]);
        state = play_quest(&state, &[0, 1, 3], &[]);
        assert_eq!(state.phase, Phase::RoundStart);
        state = play_quest(&state, &[0, 1], &[]);
        assert_eq!(state.phase, Phase::Assassination);
        assert_eq!(state.quest_tally(), (3, 0));
        assert_eq!(state.quest_history[3], None);
    }

    #[test]
    fn nominate_only_good_players() {
        let mut state = started();
        state = step(&state, Action::ForceAssassination);
        assert_eq!(
            advance(&state, Action::NominateTarget(Seat(4))),
            Err(PreconditionViolation::InvalidTarget(Seat(4)))
        );
        assert_eq!(
            advance(&state, Action::ConfirmAssassination),
            Err(PreconditionViolation::NoTarget)
        );
        let candidates: Vec<Seat> = state
            .assassination_candidates()
            .iter()
            .map(|p| p.seat)
            .collect();
        assert_eq!(candidates, vec![Seat(0), Seat(1), Seat(3)]);
    }

    #[test]
    fn force_assassination_from_mid_round() {
        let state = step(&started(), Action::StartRound);
        let state = step(&state, Action::ProposeTeam(vec![Seat(0), Seat(2)]));
        let state = step(&state, Action::SubmitVote(Verdict::Approve));
        let state = step(
            &state,
            Action::CastQuestVote {
                seat: Seat(0),
                success: true,
            },
        );
        let state = step(&state, Action::ForceAssassination);
        assert_eq!(state.phase, Phase::Assassination);
        assert!(state.quest_votes.is_empty());
        let state = step(&state, Action::NominateTarget(Seat(1)));
        let state = step(&state, Action::ConfirmAssassination);
        assert_eq!(
            state.outcome(),
            Some(&GameOutcome {
                winner: Allegiance::Good,
                reason: EndReason::AssassinationMissed { target: Seat(1) }
            })
        );
        assert_eq!(
            state.end_message().unwrap(),
            "Assassination failed! Player 2 is not Merlin."
        );
    }

    #[test]
    fn force_assassination_outside_round_is_rejected() {
        let state = step(&GameState::new(), Action::BeginGame(five_player_deck()));
        assert!(matches!(
            advance(&state, Action::ForceAssassination),
            Err(PreconditionViolation::WrongPhase { .. })
        ));
    }

    #[test]
    fn no_assassin_means_good_wins() {
        let mut deck = five_player_deck();
        deck.players[2].role = RoleId::Minion;
        let state = step(&GameState::new(), Action::BeginGame(deck));
        let mut state = state;
        for _ in 0..5 {
            state = step(&state, Action::AcknowledgeReveal);
        }
        let state = step(&state, Action::ForceAssassination);
        assert_eq!(
            state.outcome().map(|o| o.reason),
            Some(EndReason::NoAssassin)
        );
    }

    #[test]
    fn new_legend_from_anywhere() {
        let state = play_quest(&started(), &[1, 4], &[4]);
        let state = step(&state, Action::StartNewLegend);
        assert_eq!(state, GameState::new());
    }

    #[test]
    fn game_end_is_terminal() {
        let mut state = started();
        state = step(&state, Action::ForceAssassination);
        state = step(&state, Action::NominateTarget(Seat(0)));
        state = step(&state, Action::ConfirmAssassination);
        assert!(state.is_over());
        assert!(advance(&state, Action::StartRound).is_err());
        assert!(advance(&state, Action::ForceAssassination).is_err());
    }

    #[test]
    fn can_fail_by_allegiance() {
        let state = started();
        assert!(!state.can_fail(Seat(0)));
        assert!(state.can_fail(Seat(2)));
        assert!(!state.can_fail(Seat(9)));
    }
}
