//! Avalon Engine: rules engine for pass-the-device hidden-role games.
//!
//! Builds validated role decks, computes what each seat is allowed to know
//! about the others, and drives a game through proposals, votes, quests and
//! the final assassination with a pure `advance(state, action)` function.

pub mod core;
pub mod schema;
