/// Knowledge resolver: what each seat is shown about the others at reveal.

use serde::{Deserialize, Serialize};

use crate::schema::player::{Player, Seat};
use crate::schema::role::{Allegiance, Capability, RoleId};

/// The label a viewer sees on another seat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Knowledge {
    /// The viewer's own seat.
    Yourself,
    /// Known to belong to this allegiance.
    Allegiance(Allegiance),
    /// Could be this leader role. Genuine leader and decoy look the same.
    Leader(RoleId),
    /// Fellow member of the viewer's team.
    Teammate,
    Unknown,
}

impl Knowledge {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Yourself => "You",
            Self::Allegiance(side) => side.label(),
            Self::Leader(role) => role.name(),
            Self::Teammate => "Teammate",
            Self::Unknown => "Unknown",
        }
    }
}

/// Another seat as seen by a viewer. Never carries the target's role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabeledPlayer {
    pub seat: Seat,
    pub name: String,
    pub knowledge: Knowledge,
}

/// Label every seat at the table from `viewer`'s point of view.
///
/// Output follows the order of `players`. The viewer must be seated at the table.
pub fn resolve_knowledge(viewer: &Player, players: &[Player]) -> Vec<LabeledPlayer> {
    players
        .iter()
        .map(|target| LabeledPlayer {
            seat: target.seat,
            name: target.name.clone(),
            knowledge: knowledge_of(viewer, target),
        })
        .collect()
}

/// Label a single target. The first of the viewer's capabilities that
/// reveals anything about the target wins.
pub fn knowledge_of(viewer: &Player, target: &Player) -> Knowledge {
    if viewer.seat == target.seat {
        return Knowledge::Yourself;
    }

    viewer
        .role_card()
        .capabilities
        .iter()
        .find_map(|capability| reveal(capability, viewer, target))
        .unwrap_or(Knowledge::Unknown)
}

fn reveal(capability: &Capability, viewer: &Player, target: &Player) -> Option<Knowledge> {
    match *capability {
        Capability::SeesAllegianceExcept { allegiance, hidden } => {
            (target.allegiance == allegiance && target.role != hidden)
                .then_some(Knowledge::Allegiance(allegiance))
        }
        Capability::SeesLeaderCandidates { leader, decoy } => {
            (target.role == leader || target.role == decoy).then_some(Knowledge::Leader(leader))
        }
        Capability::MutualTeamVisibility { excluded } => {
            let in_group = target.role_card().team_visibility() == Some(excluded);
            (in_group && viewer.role != excluded && target.role != excluded)
                .then_some(Knowledge::Teammate)
        }
        Capability::CanAssassinate | Capability::AssassinationTarget => None,
    }
}
