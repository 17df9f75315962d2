use serde::{Deserialize, Serialize};

/// The team a role plays for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Allegiance {
    Good,
    Evil,
}

impl Allegiance {
    /// Display label: "Good" or "Evil".
    pub fn label(&self) -> &'static str {
        match self {
            Self::Good => "Good",
            Self::Evil => "Evil",
        }
    }
}

/// Identity of a role in the catalog.
///
/// Declaration order matches the order of `CATALOG`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RoleId {
    Merlin,
    Percival,
    Servant,
    Assassin,
    Morgana,
    Mordred,
    Oberon,
    Minion,
}

impl RoleId {
    pub const ALL: [RoleId; 8] = [
        Self::Merlin,
        Self::Percival,
        Self::Servant,
        Self::Assassin,
        Self::Morgana,
        Self::Mordred,
        Self::Oberon,
        Self::Minion,
    ];

    /// Roles that are always in the deck and cannot be toggled off.
    pub const MANDATORY: [RoleId; 2] = [Self::Merlin, Self::Assassin];

    /// Roles the table may toggle on during setup.
    pub const OPTIONAL: [RoleId; 4] = [Self::Percival, Self::Morgana, Self::Mordred, Self::Oberon];

    /// Static catalog record for this role.
    pub fn role(self) -> &'static Role {
        &CATALOG[self as usize]
    }

    pub fn name(self) -> &'static str {
        self.role().name
    }

    pub fn allegiance(self) -> Allegiance {
        self.role().allegiance
    }

    pub fn kind(self) -> RoleKind {
        self.role().kind
    }

    /// The filler role used to pad unfilled seats of the given allegiance.
    pub fn filler(allegiance: Allegiance) -> RoleId {
        match allegiance {
            Allegiance::Good => Self::Servant,
            Allegiance::Evil => Self::Minion,
        }
    }

    /// Parse a role from its identifier, case-insensitively ("merlin", "Oberon").
    pub fn parse(input: &str) -> Option<RoleId> {
        let wanted = input.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|id| format!("{:?}", id).to_lowercase() == wanted)
    }
}

/// How a role enters the deck.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoleKind {
    /// Always dealt, never toggleable.
    Mandatory,
    /// Dealt only when selected during setup.
    Optional,
    /// Pads the seats left over once selections are applied.
    Filler,
}

/// What a role is able to perceive or do. The knowledge resolver and the
/// assassination phase dispatch on these, never on `RoleId` directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Capability {
    /// Sees every player of `allegiance`, except holders of `hidden`.
    SeesAllegianceExcept { allegiance: Allegiance, hidden: RoleId },
    /// Sees `leader` and `decoy` under the same label, unable to tell them apart.
    SeesLeaderCandidates { leader: RoleId, decoy: RoleId },
    /// Sees every other holder of this capability as a teammate.
    /// Holders of `excluded` are invisible to the group and blind to it.
    MutualTeamVisibility { excluded: RoleId },
    /// May nominate the assassination target at the end of the game.
    CanAssassinate,
    /// Killing this role during the assassination wins the game for evil.
    AssassinationTarget,
}

/// Description text shown on a role card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Description {
    Fixed(&'static str),
    /// Text that depends on whether another role is in play.
    DependsOn {
        role: RoleId,
        present: &'static str,
        absent: &'static str,
    },
}

impl Description {
    /// Pick the text for a deck containing `in_play`.
    pub fn resolve(&self, in_play: &[RoleId]) -> &'static str {
        match *self {
            Self::Fixed(text) => text,
            Self::DependsOn {
                role,
                present,
                absent,
            } => {
                if in_play.contains(&role) {
                    present
                } else {
                    absent
                }
            }
        }
    }
}

/// A static catalog record.
#[derive(Debug, PartialEq, Serialize)]
pub struct Role {
    pub id: RoleId,
    pub name: &'static str,
    pub allegiance: Allegiance,
    pub kind: RoleKind,
    pub description: Description,
    pub capabilities: &'static [Capability],
}

impl Role {
    pub fn has(&self, capability: &Capability) -> bool {
        self.capabilities.contains(capability)
    }

    pub fn can_assassinate(&self) -> bool {
        self.has(&Capability::CanAssassinate)
    }

    pub fn is_assassination_target(&self) -> bool {
        self.has(&Capability::AssassinationTarget)
    }

    /// The exclusion of this role's mutual team visibility, if it has one.
    pub fn team_visibility(&self) -> Option<RoleId> {
        self.capabilities.iter().find_map(|c| match c {
            Capability::MutualTeamVisibility { excluded } => Some(*excluded),
            _ => None,
        })
    }
}

const EVIL_TEAM: Capability = Capability::MutualTeamVisibility {
    excluded: RoleId::Oberon,
};

static CATALOG: [Role; 8] = [
    Role {
        id: RoleId::Merlin,
        name: "Merlin",
        allegiance: Allegiance::Good,
        kind: RoleKind::Mandatory,
        description: Description::DependsOn {
            role: RoleId::Mordred,
            present: "You know who is evil, but Mordred is hidden from you.",
            absent: "You know who is evil.",
        },
        capabilities: &[
            Capability::SeesAllegianceExcept {
                allegiance: Allegiance::Evil,
                hidden: RoleId::Mordred,
            },
            Capability::AssassinationTarget,
        ],
    },
    Role {
        id: RoleId::Percival,
        name: "Percival",
        allegiance: Allegiance::Good,
        kind: RoleKind::Optional,
        description: Description::DependsOn {
            role: RoleId::Morgana,
            present: "You know who Merlin is, though Morgana may appear as Merlin too.",
            absent: "You know who Merlin is.",
        },
        capabilities: &[Capability::SeesLeaderCandidates {
            leader: RoleId::Merlin,
            decoy: RoleId::Morgana,
        }],
    },
    Role {
        id: RoleId::Servant,
        name: "Loyal Servant of Arthur",
        allegiance: Allegiance::Good,
        kind: RoleKind::Filler,
        description: Description::Fixed("You know no one's identity. Fight for the good."),
        capabilities: &[],
    },
    Role {
        id: RoleId::Assassin,
        name: "Assassin",
        allegiance: Allegiance::Evil,
        kind: RoleKind::Mandatory,
        description: Description::Fixed(
            "If good completes three quests, you get one chance to assassinate Merlin and steal the win.",
        ),
        capabilities: &[EVIL_TEAM, Capability::CanAssassinate],
    },
    Role {
        id: RoleId::Morgana,
        name: "Morgana",
        allegiance: Allegiance::Evil,
        kind: RoleKind::Optional,
        description: Description::Fixed("You pose as Merlin to mislead Percival."),
        capabilities: &[EVIL_TEAM],
    },
    Role {
        id: RoleId::Mordred,
        name: "Mordred",
        allegiance: Allegiance::Evil,
        kind: RoleKind::Optional,
        description: Description::Fixed("Merlin cannot see that you are evil."),
        capabilities: &[EVIL_TEAM],
    },
    Role {
        id: RoleId::Oberon,
        name: "Oberon",
        allegiance: Allegiance::Evil,
        kind: RoleKind::Optional,
        description: Description::Fixed("You cannot see your teammates, and they cannot see you."),
        capabilities: &[],
    },
    Role {
        id: RoleId::Minion,
        name: "Minion of Mordred",
        allegiance: Allegiance::Evil,
        kind: RoleKind::Filler,
        description: Description::DependsOn {
            role: RoleId::Oberon,
            present: "You know who is evil, except Oberon.",
            absent: "You know who is evil.",
        },
        capabilities: &[EVIL_TEAM],
    },
];

/// Every role in the catalog, in `RoleId` order.
pub fn catalog() -> &'static [Role] {
    &CATALOG
}
