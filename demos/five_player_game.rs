/// Five player example: a scripted game from setup to the assassination.
///
/// Percival and Morgana join the mandatory roles. Good wins three of four
/// quests and the assassin, fooled by Morgana's cover, strikes Percival.
///
/// Run with: cargo run --example five_player_game

use avalon_engine::core::knowledge::Knowledge;
use avalon_engine::core::phase::{Action, Phase, Verdict};
use avalon_engine::core::session::GameSession;
use avalon_engine::schema::player::Seat;
use avalon_engine::schema::role::{Allegiance, RoleId};

fn main() {
    let mut session = GameSession::builder()
        .seed(2026)
        .build()
        .expect("Failed to build session");

    // --- Setup ---
    for (i, name) in ["Arthur", "Guinevere", "Lancelot", "Gawain", "Morgause"]
        .iter()
        .enumerate()
    {
        session.set_name(Seat(i), name).expect("Failed to name seat");
    }
    session.toggle_role(RoleId::Percival).expect("Percival");
    session.toggle_role(RoleId::Morgana).expect("Morgana");

    session.start_game().expect("Failed to deal");

    // --- Reveal ---
    println!("=== The Reveal ===\n");
    while let Phase::Reveal { seat } = *session.phase() {
        let reveal = session.state().reveal(seat).expect("seat is dealt");
        println!(
            "{} is {} ({})",
            reveal.player.name,
            reveal.player.role.name(),
            reveal.player.allegiance.label()
        );
        println!("  \"{}\"", reveal.player.description);
        for other in &reveal.knowledge {
            if !matches!(other.knowledge, Knowledge::Unknown | Knowledge::Yourself) {
                println!("  sees {} as {}", other.name, other.knowledge.label());
            }
        }
        session
            .apply(Action::AcknowledgeReveal)
            .expect("Failed to acknowledge");
    }

    let seats_of = |session: &GameSession, side: Allegiance| -> Vec<Seat> {
        session
            .state()
            .players
            .iter()
            .filter(|p| p.allegiance == side)
            .map(|p| p.seat)
            .collect()
    };
    let good = seats_of(&session, Allegiance::Good);
    let evil = seats_of(&session, Allegiance::Evil);

    // --- Quests ---
    // Quest 2 carries an evil player who sabotages it.
    println!("\n=== The Quests ===\n");
    for quest in 0..4 {
        if session.state().is_over() || *session.phase() == Phase::Assassination {
            break;
        }
        session.apply(Action::StartRound).expect("round");

        let size = session.state().current_quest().expect("quest").team_size;
        let mut team: Vec<Seat> = if quest == 1 {
            let mut t = vec![evil[0]];
            t.extend(good.iter().copied().take(size - 1));
            t
        } else {
            good.iter().copied().take(size).collect()
        };

        let leader = session.state().leader_player().expect("leader").name.clone();
        println!("Quest {}: {} proposes a team of {}", quest + 1, leader, size);

        // The first proposal of quest 3 is turned down.
        if quest == 2 {
            session.apply(Action::ProposeTeam(team.clone())).expect("propose");
            session
                .apply(Action::SubmitVote(Verdict::Reject))
                .expect("reject");
            println!("  The table rejects it.");
            session.apply(Action::StartRound).expect("round");
        }

        for seat in &team {
            session
                .apply(Action::ToggleTeamMember(*seat))
                .expect("toggle");
        }
        session.apply(Action::SubmitProposal).expect("submit");
        session
            .apply(Action::SubmitVote(Verdict::Approve))
            .expect("approve");

        team.sort();
        for seat in team {
            let success = !(quest == 1 && evil.contains(&seat));
            session
                .apply(Action::CastQuestVote { seat, success })
                .expect("quest card");
        }
        session
            .apply(Action::ConfirmQuestResult)
            .expect("quest result");
        if let Some(report) = session.state().last_report {
            println!("  {}", report.message());
        }
    }

    // --- Assassination ---
    println!("\n=== The Assassination ===\n");
    let percival = session
        .state()
        .players
        .iter()
        .find(|p| p.role == RoleId::Percival)
        .map(|p| p.seat)
        .expect("Percival is dealt");
    session
        .apply(Action::NominateTarget(percival))
        .expect("nominate");
    session
        .apply(Action::ConfirmAssassination)
        .expect("confirm");

    let state = session.state();
    println!("{}", state.end_message().expect("game is over"));
    println!("\nThe roles were:");
    for player in &state.players {
        println!("  {:<10} {}", player.name, player.role.name());
    }
}
