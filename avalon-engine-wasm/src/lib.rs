//! WASM bindings for avalon-engine: powers the browser table.

use wasm_bindgen::prelude::*;

use avalon_engine::core::knowledge::Knowledge;
use avalon_engine::core::phase::{Action, GameState, Phase, QuestOutcome};
use avalon_engine::core::session::GameSession;
use avalon_engine::schema::player::Seat;
use avalon_engine::schema::role::RoleId;
use avalon_engine::schema::table::Ruleset;

// ---------------------------------------------------------------------------
// Embedded rulesets: compiled into the WASM binary
// ---------------------------------------------------------------------------
mod data {
    pub const STANDARD: &str = include_str!("../../rulesets/standard.ron");
    pub const CLASSIC: &str = include_str!("../../rulesets/classic.ron");
}

// ---------------------------------------------------------------------------
// JSON helper types for communication across the WASM boundary
// ---------------------------------------------------------------------------
#[derive(serde::Serialize)]
struct SetupInfo {
    ruleset: String,
    player_count: usize,
    roles: Vec<&'static str>,
    names: Vec<String>,
}

#[derive(serde::Serialize)]
struct SeatInfo {
    seat: usize,
    name: String,
    /// Only filled in once the game is over.
    role: Option<&'static str>,
}

#[derive(serde::Serialize)]
struct TableInfo {
    phase: &'static str,
    /// Seat waiting on the device during reveal and quest execution.
    active_seat: Option<usize>,
    leader: usize,
    quest: usize,
    team_size: Option<usize>,
    fails_required: Option<usize>,
    quest_history: Vec<Option<&'static str>>,
    rejections: u8,
    proposed_team: Vec<usize>,
    assassination_target: Option<usize>,
    last_report: Option<String>,
    winner: Option<&'static str>,
    end_message: Option<String>,
    players: Vec<SeatInfo>,
}

#[derive(serde::Serialize)]
struct RevealInfo {
    name: String,
    role: &'static str,
    allegiance: &'static str,
    description: String,
    sees: Vec<SeenInfo>,
}

#[derive(serde::Serialize)]
struct SeenInfo {
    seat: usize,
    name: String,
    label: &'static str,
}

fn table_info(state: &GameState) -> TableInfo {
    let over = state.is_over();
    let active_seat = match state.phase {
        Phase::Reveal { seat } | Phase::QuestExecution { seat } => Some(seat.0),
        _ => None,
    };
    let quest = state.current_quest();

    TableInfo {
        phase: state.phase.name(),
        active_seat,
        leader: state.leader.0,
        quest: state.quest_index,
        team_size: quest.map(|q| q.team_size),
        fails_required: quest.map(|q| q.fails_required),
        quest_history: state
            .quest_history
            .iter()
            .map(|q| {
                q.map(|o| match o {
                    QuestOutcome::Success => "success",
                    QuestOutcome::Fail => "fail",
                })
            })
            .collect(),
        rejections: state.rejections,
        proposed_team: state.proposed_team.iter().map(|s| s.0).collect(),
        assassination_target: state.assassination_target.map(|s| s.0),
        last_report: state.last_report.map(|r| r.message()),
        winner: state.outcome().map(|o| o.winner.label()),
        end_message: state.end_message(),
        players: state
            .players
            .iter()
            .map(|p| SeatInfo {
                seat: p.seat.0,
                name: p.name.clone(),
                role: over.then(|| p.role.name()),
            })
            .collect(),
    }
}

fn load_ruleset(name: &str) -> Result<Ruleset, JsError> {
    let source = match name {
        "standard" => data::STANDARD,
        "classic" => data::CLASSIC,
        _ => return Err(JsError::new(&format!("Unknown ruleset: {name}"))),
    };
    Ruleset::parse_ron(source).map_err(|e| JsError::new(&format!("Ruleset parse error: {e}")))
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, JsError> {
    serde_json::to_string(value).map_err(|e| JsError::new(&format!("Serialization error: {e}")))
}

// ---------------------------------------------------------------------------
// AvalonTable: the main exported struct
// ---------------------------------------------------------------------------
#[wasm_bindgen]
pub struct AvalonTable {
    session: GameSession,
}

#[wasm_bindgen]
impl AvalonTable {
    /// Create a table for the named ruleset, seeded for reproducible deals.
    #[wasm_bindgen(constructor)]
    pub fn new(ruleset: &str, seed: u64) -> Result<AvalonTable, JsError> {
        let session = GameSession::builder()
            .seed(seed)
            .ruleset(load_ruleset(ruleset)?)
            .build()
            .map_err(|e| JsError::new(&format!("Session build error: {e}")))?;
        Ok(AvalonTable { session })
    }

    /// Return JSON array of available ruleset identifiers.
    pub fn available_rulesets() -> String {
        serde_json::to_string(&["standard", "classic"]).unwrap_or_else(|_| "[]".to_string())
    }

    /// Return JSON array of the roles that can be toggled during setup.
    pub fn optional_roles() -> String {
        let names: Vec<&str> = RoleId::OPTIONAL.iter().map(|r| r.name()).collect();
        serde_json::to_string(&names).unwrap_or_else(|_| "[]".to_string())
    }

    pub fn set_player_count(&mut self, player_count: usize) -> Result<(), JsError> {
        self.session
            .set_player_count(player_count)
            .map_err(|e| JsError::new(&e.to_string()))
    }

    /// Toggle an optional role by name. Returns whether it is now selected.
    pub fn toggle_role(&mut self, role: &str) -> Result<bool, JsError> {
        let role =
            RoleId::parse(role).ok_or_else(|| JsError::new(&format!("Unknown role: {role}")))?;
        self.session
            .toggle_role(role)
            .map_err(|e| JsError::new(&e.to_string()))
    }

    pub fn set_name(&mut self, seat: usize, name: &str) -> Result<(), JsError> {
        self.session
            .set_name(Seat(seat), name)
            .map_err(|e| JsError::new(&e.to_string()))
    }

    /// Return a JSON description of the setup form.
    pub fn setup(&self) -> Result<String, JsError> {
        let setup = self.session.setup();
        let info = SetupInfo {
            ruleset: self.session.ruleset().name.clone(),
            player_count: setup.player_count,
            roles: setup.selected_roles().iter().map(|r| r.name()).collect(),
            names: (0..setup.player_count)
                .map(|i| {
                    let seat = Seat(i);
                    setup
                        .names
                        .get(&seat)
                        .cloned()
                        .unwrap_or_else(|| seat.default_name())
                })
                .collect(),
        };
        to_json(&info)
    }

    /// Deal the deck and begin the reveal. Returns the table JSON.
    pub fn start_game(&mut self) -> Result<String, JsError> {
        let state = self
            .session
            .start_game()
            .map_err(|e| JsError::new(&e.to_string()))?;
        to_json(&table_info(state))
    }

    /// Apply an action given as JSON and return the table JSON.
    ///
    /// Actions use serde's external tagging:
    /// ```json
    /// "StartRound"
    /// {"ProposeTeam": [0, 2]}
    /// {"CastQuestVote": {"seat": 2, "success": false}}
    /// ```
    pub fn apply(&mut self, action_json: &str) -> Result<String, JsError> {
        let action: Action = serde_json::from_str(action_json)
            .map_err(|e| JsError::new(&format!("Invalid action JSON: {e}")))?;
        if matches!(action, Action::BeginGame(_)) {
            return Err(JsError::new("Use start_game to deal a deck"));
        }
        let state = self
            .session
            .apply(action)
            .map_err(|e| JsError::new(&e.to_string()))?;
        to_json(&table_info(state))
    }

    /// Return the public table JSON. Roles stay hidden until the game ends.
    pub fn table(&self) -> Result<String, JsError> {
        to_json(&table_info(self.session.state()))
    }

    /// Return what `seat` is shown on the reveal screen. Only the seat
    /// holding the device during the reveal may look, until the game ends.
    pub fn reveal(&self, seat: usize) -> Result<String, JsError> {
        let reveal = self
            .session
            .state()
            .reveal(Seat(seat))
            .ok_or_else(|| JsError::new(&format!("Seat {seat} may not look at a card now")))?;
        let info = RevealInfo {
            name: reveal.player.name.clone(),
            role: reveal.player.role.name(),
            allegiance: reveal.player.allegiance.label(),
            description: reveal.player.description.clone(),
            sees: reveal
                .knowledge
                .iter()
                .filter(|k| !matches!(k.knowledge, Knowledge::Unknown | Knowledge::Yourself))
                .map(|k| SeenInfo {
                    seat: k.seat.0,
                    name: k.name.clone(),
                    label: k.knowledge.label(),
                })
                .collect(),
        };
        to_json(&info)
    }

    /// Throw the current game away and return to setup.
    pub fn new_legend(&mut self) -> Result<String, JsError> {
        let state = self.session.start_new_legend();
        to_json(&table_info(state))
    }
}
