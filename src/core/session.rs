/// Game session: the setup form, the session RNG, and the live game state.
///
/// Owns everything a presentation layer needs between screens. All rule
/// checks are delegated to the deck builder and the phase state machine.

use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::core::deck::{build_deck, ConfigurationError, DeckRequest};
use crate::core::phase::{advance, Action, GameState, Phase, PreconditionViolation};
use crate::schema::player::Seat;
use crate::schema::role::{Allegiance, RoleId, RoleKind};
use crate::schema::table::{Ruleset, RulesetError, MIN_PLAYERS};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigurationError),
    #[error("illegal action: {0}")]
    Precondition(#[from] PreconditionViolation),
    #[error("ruleset error: {0}")]
    Ruleset(#[from] RulesetError),
    #[error("setup cannot change while a game is in progress")]
    GameInProgress,
    #[error("{0:?} is always dealt and cannot be toggled")]
    MandatoryRole(RoleId),
    #[error("every {allegiance:?} seat is already taken ({slots} seats)")]
    NoSlotsLeft { allegiance: Allegiance, slots: usize },
}

/// A table of players working through setup, a game, and new legends.
pub struct GameSession {
    ruleset: Ruleset,
    request: DeckRequest,
    state: GameState,
    rng: StdRng,
    seed: u64,
}

/// Builder for constructing a `GameSession`.
pub struct GameSessionBuilder {
    seed: u64,
    ruleset: Option<Ruleset>,
    ruleset_path: Option<String>,
}

impl GameSession {
    pub fn builder() -> GameSessionBuilder {
        GameSessionBuilder {
            seed: 0,
            ruleset: None,
            ruleset_path: None,
        }
    }

    pub fn ruleset(&self) -> &Ruleset {
        &self.ruleset
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// The setup form as it currently stands.
    pub fn setup(&self) -> &DeckRequest {
        &self.request
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn phase(&self) -> &Phase {
        &self.state.phase
    }

    fn ensure_setup(&self) -> Result<(), SessionError> {
        if self.state.phase != Phase::Setup {
            return Err(SessionError::GameInProgress);
        }
        Ok(())
    }

    /// Change the table size. Clears the optional role selection and
    /// drops names for seats that no longer exist.
    pub fn set_player_count(&mut self, player_count: usize) -> Result<(), SessionError> {
        self.ensure_setup()?;
        if self.ruleset.row(player_count).is_none() {
            return Err(ConfigurationError::UnsupportedPlayerCount(player_count).into());
        }
        self.request.player_count = player_count;
        self.request.optional_roles.clear();
        self.request.names.retain(|seat, _| seat.0 < player_count);
        debug!(player_count, "Player count changed");
        Ok(())
    }

    /// Switch an optional role on or off. Returns whether it is now selected.
    pub fn toggle_role(&mut self, role: RoleId) -> Result<bool, SessionError> {
        self.ensure_setup()?;
        match role.kind() {
            RoleKind::Mandatory => return Err(SessionError::MandatoryRole(role)),
            RoleKind::Filler => return Err(ConfigurationError::NotSelectable(role).into()),
            RoleKind::Optional => {}
        }

        if self.request.optional_roles.remove(&role) {
            debug!(role = role.name(), "Role deselected");
            return Ok(false);
        }

        let row = self
            .ruleset
            .row(self.request.player_count)
            .ok_or(ConfigurationError::UnsupportedPlayerCount(self.request.player_count))?;
        let allegiance = role.allegiance();
        let slots = row.slots(allegiance);
        let taken = self
            .request
            .selected_roles()
            .iter()
            .filter(|r| r.allegiance() == allegiance)
            .count();
        if taken >= slots {
            return Err(SessionError::NoSlotsLeft { allegiance, slots });
        }

        self.request.optional_roles.insert(role);
        debug!(role = role.name(), "Role selected");
        Ok(true)
    }

    /// Override a seat's display name. A blank name restores the default.
    pub fn set_name(&mut self, seat: Seat, name: &str) -> Result<(), SessionError> {
        self.ensure_setup()?;
        if seat.0 >= self.request.player_count {
            return Err(ConfigurationError::UnknownSeat {
                seat,
                player_count: self.request.player_count,
            }
            .into());
        }
        let name = name.trim();
        if name.is_empty() {
            self.request.names.remove(&seat);
        } else {
            self.request.names.insert(seat, name.to_string());
        }
        Ok(())
    }

    /// Deal a deck from the setup form and begin the reveal.
    pub fn start_game(&mut self) -> Result<&GameState, SessionError> {
        self.ensure_setup()?;
        let deck = build_deck(&self.ruleset, &self.request, &mut self.rng)?;
        info!(
            player_count = deck.players.len(),
            roles = ?self.request.selected_roles(),
            "Starting game"
        );
        self.apply(Action::BeginGame(deck))
    }

    /// Commit the next state for `action`, or keep the current one and
    /// report why the action was refused.
    pub fn apply(&mut self, action: Action) -> Result<&GameState, SessionError> {
        let name = action.name();
        match advance(&self.state, action) {
            Ok(next) => {
                if next.phase.name() != self.state.phase.name() {
                    debug!(
                        action = name,
                        from = self.state.phase.name(),
                        to = next.phase.name(),
                        "Phase changed"
                    );
                }
                if let Some(report) = next.last_report.filter(|r| Some(*r) != self.state.last_report) {
                    info!("{}", report.message());
                }
                self.state = next;
                if let Some(outcome) = self.state.outcome() {
                    info!(
                        winner = outcome.winner.label(),
                        "{}",
                        outcome.message(&self.state.players)
                    );
                }
                Ok(&self.state)
            }
            Err(violation) => {
                warn!(action = name, phase = self.state.phase.name(), %violation, "Action refused");
                Err(violation.into())
            }
        }
    }

    /// Throw the current game away and return to setup. The setup form is kept.
    pub fn start_new_legend(&mut self) -> &GameState {
        info!("Starting a new legend");
        self.state = GameState::new();
        &self.state
    }
}

impl GameSessionBuilder {
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn ruleset(mut self, ruleset: Ruleset) -> Self {
        self.ruleset = Some(ruleset);
        self
    }

    /// Load the ruleset from a RON file. Takes precedence over `ruleset`.
    pub fn ruleset_path(mut self, path: &str) -> Self {
        self.ruleset_path = Some(path.to_string());
        self
    }

    pub fn build(self) -> Result<GameSession, SessionError> {
        let ruleset = match self.ruleset_path {
            Some(ref path) => Ruleset::load_from_ron(Path::new(path))?,
            None => self.ruleset.unwrap_or_default(),
        };
        ruleset.validate()?;
        debug!(ruleset = %ruleset.name, seed = self.seed, "Session created");

        Ok(GameSession {
            ruleset,
            request: DeckRequest::new(MIN_PLAYERS),
            state: GameState::new(),
            rng: StdRng::seed_from_u64(self.seed),
            seed: self.seed,
        })
    }
}
