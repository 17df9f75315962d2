/// Deck builder: validates a setup, pads it with fillers, and deals seats.

use rand::seq::SliceRandom;
use rand::Rng;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;
use tracing::debug;

use crate::schema::player::{Player, Seat};
use crate::schema::role::{Allegiance, RoleId, RoleKind};
use crate::schema::table::{Ruleset, TableRow, MAX_PLAYERS, MIN_PLAYERS};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    #[error("unsupported player count {0} (expected {min}..={max})", min = MIN_PLAYERS, max = MAX_PLAYERS)]
    UnsupportedPlayerCount(usize),
    #[error("too many evil roles selected: {selected} for {allowed} evil seats")]
    TooManyEvil { selected: usize, allowed: usize },
    #[error("too many good roles selected: {selected} for {allowed} good seats")]
    TooManyGood { selected: usize, allowed: usize },
    #[error("{0:?} fills empty seats and cannot be selected")]
    NotSelectable(RoleId),
    #[error("name given for {seat}, but the table only has {player_count} seats")]
    UnknownSeat { seat: Seat, player_count: usize },
}

/// Everything the setup screen collects before a game starts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeckRequest {
    pub player_count: usize,
    /// Optional roles switched on. Mandatory roles are always dealt and
    /// may be listed here without effect.
    pub optional_roles: FxHashSet<RoleId>,
    /// Display-name overrides by seat.
    pub names: HashMap<Seat, String>,
}

impl DeckRequest {
    pub fn new(player_count: usize) -> Self {
        Self {
            player_count,
            ..Default::default()
        }
    }

    pub fn with_role(mut self, role: RoleId) -> Self {
        self.optional_roles.insert(role);
        self
    }

    pub fn with_name(mut self, seat: Seat, name: &str) -> Self {
        self.names.insert(seat, name.to_string());
        self
    }

    /// Mandatory roles followed by the selected optional roles, in catalog order.
    pub fn selected_roles(&self) -> Vec<RoleId> {
        let mut roles: Vec<RoleId> = RoleId::MANDATORY.to_vec();
        let mut optional: Vec<RoleId> = self
            .optional_roles
            .iter()
            .copied()
            .filter(|r| !RoleId::MANDATORY.contains(r))
            .collect();
        optional.sort();
        roles.extend(optional);
        roles
    }
}

/// A dealt table: seated players, the first leader, and the table row the
/// game will be played with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deck {
    pub players: Vec<Player>,
    pub leader: Seat,
    pub table: TableRow,
}

/// Validate a request and expand it into the full, unshuffled role multiset.
///
/// Unfilled evil seats are padded with the evil filler, then the rest of
/// the table with the good filler.
pub fn compose_roles(row: &TableRow, request: &DeckRequest) -> Result<Vec<RoleId>, ConfigurationError> {
    if let Some(filler) = request
        .optional_roles
        .iter()
        .copied()
        .filter(|r| r.kind() == RoleKind::Filler)
        .min()
    {
        return Err(ConfigurationError::NotSelectable(filler));
    }

    let mut roles = request.selected_roles();
    let count_of = |roles: &[RoleId], side: Allegiance| {
        roles.iter().filter(|r| r.allegiance() == side).count()
    };

    let evil = count_of(&roles, Allegiance::Evil);
    if evil > row.evil {
        return Err(ConfigurationError::TooManyEvil {
            selected: evil,
            allowed: row.evil,
        });
    }
    let good = count_of(&roles, Allegiance::Good);
    if good > row.good {
        return Err(ConfigurationError::TooManyGood {
            selected: good,
            allowed: row.good,
        });
    }

    roles.extend(std::iter::repeat(RoleId::filler(Allegiance::Evil)).take(row.evil - evil));
    while roles.len() < row.player_count {
        roles.push(RoleId::filler(Allegiance::Good));
    }
    Ok(roles)
}

/// Build a shuffled deck for `request` under `ruleset`.
///
/// Every permutation of the role multiset is equally likely, and the first
/// leader is drawn uniformly over the seats.
pub fn build_deck<R: Rng + ?Sized>(
    ruleset: &Ruleset,
    request: &DeckRequest,
    rng: &mut R,
) -> Result<Deck, ConfigurationError> {
    let row = ruleset
        .row(request.player_count)
        .ok_or(ConfigurationError::UnsupportedPlayerCount(request.player_count))?;

    if let Some(seat) = request
        .names
        .keys()
        .copied()
        .filter(|s| s.0 >= row.player_count)
        .min()
    {
        return Err(ConfigurationError::UnknownSeat {
            seat,
            player_count: row.player_count,
        });
    }

    let mut roles = compose_roles(row, request)?;
    roles.shuffle(rng);

    let players: Vec<Player> = roles
        .iter()
        .enumerate()
        .map(|(index, &role)| {
            let seat = Seat(index);
            let name = request
                .names
                .get(&seat)
                .map(|n| n.trim())
                .filter(|n| !n.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| seat.default_name());
            Player {
                seat,
                name,
                role,
                allegiance: role.allegiance(),
                description: role.role().description.resolve(&roles).to_string(),
            }
        })
        .collect();

    let leader = Seat(rng.gen_range(0..row.player_count));
    debug!(
        player_count = row.player_count,
        ruleset = %ruleset.name,
        leader = leader.0,
        "Dealt deck"
    );

    Ok(Deck {
        players,
        leader,
        table: row.clone(),
    })
}
