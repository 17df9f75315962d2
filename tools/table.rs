/// Table: interactive pass-the-device shell for playing a game in a terminal.
///
/// Usage: table [--players <n>] [--roles <r1,r2>] [--seed <n>] [--ruleset <file.ron>] [--verbose]
///
/// Commands:
///   players <n>           : set the player count (setup only)
///   role <name>           : toggle an optional role (setup only)
///   name <seat> <name>    : name a seat (setup only)
///   start                 : deal the deck and begin the reveal
///   ok                    : acknowledge the current reveal
///   round                 : start the next round
///   pick <seat>           : add or remove a seat from the proposal
///   propose [seats..]     : call the vote (optionally on a full team)
///   approve | reject      : record the team vote
///   success | fail        : play the current quest card
///   result                : confirm the quest result
///   force                 : the assassin reveals themselves
///   target <seat>         : nominate an assassination target
///   confirm               : confirm the assassination
///   show                  : print the table
///   new                   : start a new legend
///   help                  : list commands
///   quit                  : exit
///
/// Seats are numbered from 1 on the command line.

use avalon_engine::core::knowledge::Knowledge;
use avalon_engine::core::phase::{Action, GameState, Phase, QuestOutcome, Verdict};
use avalon_engine::core::session::{GameSession, SessionError};
use avalon_engine::schema::player::Seat;
use avalon_engine::schema::role::RoleId;
use std::io::{self, BufRead, Write};

fn main() {
    let args: Vec<String> = std::env::args().collect();

    let mut player_count = 5usize;
    let mut roles: Vec<RoleId> = Vec::new();
    let mut seed: u64 = 42;
    let mut ruleset_path = None;
    let mut verbose = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--players" if i + 1 < args.len() => {
                i += 1;
                player_count = args[i].parse().unwrap_or(player_count);
            }
            "--roles" if i + 1 < args.len() => {
                i += 1;
                for name in args[i].split(',').filter(|s| !s.is_empty()) {
                    match RoleId::parse(name) {
                        Some(role) => roles.push(role),
                        None => {
                            eprintln!("Unknown role: {}", name);
                            std::process::exit(1);
                        }
                    }
                }
            }
            "--seed" if i + 1 < args.len() => {
                i += 1;
                seed = args[i].parse().unwrap_or(42);
            }
            "--ruleset" if i + 1 < args.len() => {
                i += 1;
                ruleset_path = Some(args[i].clone());
            }
            "--verbose" | "-v" => verbose = true,
            "--help" | "-h" => {
                print_usage();
                return;
            }
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
                print_usage();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    if verbose {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_target(false)
            .init();
    }

    let mut builder = GameSession::builder().seed(seed);
    if let Some(ref path) = ruleset_path {
        builder = builder.ruleset_path(path);
    }
    let mut session = match builder.build() {
        Ok(session) => session,
        Err(e) => {
            eprintln!("ERROR: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = session.set_player_count(player_count) {
        eprintln!("ERROR: {}", e);
        std::process::exit(1);
    }
    for role in roles {
        if let Err(e) = session.toggle_role(role) {
            eprintln!("ERROR: {}", e);
            std::process::exit(1);
        }
    }

    println!("Ruleset: {}", session.ruleset().name);
    println!("Seed: {}", seed);
    println!("Type 'help' for commands.\n");
    print_setup(&session);

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("{}> ", session.phase().name());
        stdout.flush().ok();

        let mut line = String::new();
        if stdin.lock().read_line(&mut line).is_err() || line.is_empty() {
            break;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let parts: Vec<&str> = line.split_whitespace().collect();
        let cmd = parts[0].to_lowercase();

        let result = match cmd.as_str() {
            "quit" | "exit" | "q" => {
                println!("Goodbye.");
                break;
            }
            "help" | "h" | "?" => {
                print_help();
                continue;
            }
            "show" => {
                if *session.phase() == Phase::Setup {
                    print_setup(&session);
                } else {
                    print_table(session.state());
                }
                continue;
            }
            "players" => match parts.get(1).and_then(|s| s.parse().ok()) {
                Some(n) => session.set_player_count(n).map(|_| print_setup(&session)),
                None => {
                    println!("Usage: players <n>");
                    continue;
                }
            },
            "role" => match parts.get(1).and_then(|s| RoleId::parse(s)) {
                Some(role) => session.toggle_role(role).map(|on| {
                    println!("{} {}", role.name(), if on { "added" } else { "removed" });
                }),
                None => {
                    println!("Usage: role <percival|morgana|mordred|oberon>");
                    continue;
                }
            },
            "name" => match (parts.get(1).and_then(|s| parse_seat(s)), parts.get(2..)) {
                (Some(seat), Some(rest)) => session.set_name(seat, &rest.join(" ")),
                _ => {
                    println!("Usage: name <seat> <name>");
                    continue;
                }
            },
            "start" => session.start_game().map(|_| ()),
            "new" => {
                session.start_new_legend();
                print_setup(&session);
                continue;
            }
            other => match parse_action(other, &parts[1..], session.state()) {
                Some(action) => session.apply(action).map(|_| ()),
                None => {
                    println!("Unknown command: {}. Type 'help' for commands.", other);
                    continue;
                }
            },
        };

        match result {
            Ok(()) => print_phase(session.state()),
            Err(SessionError::Precondition(violation)) => println!("Not now: {}", violation),
            Err(e) => println!("ERROR: {}", e),
        }
    }
}

fn parse_seat(input: &str) -> Option<Seat> {
    match input.parse::<usize>() {
        Ok(n) if n >= 1 => Some(Seat(n - 1)),
        _ => None,
    }
}

fn parse_action(cmd: &str, args: &[&str], state: &GameState) -> Option<Action> {
    let action = match cmd {
        "ok" | "next" => Action::AcknowledgeReveal,
        "round" => Action::StartRound,
        "pick" => Action::ToggleTeamMember(parse_seat(args.first()?)?),
        "propose" if args.is_empty() => Action::SubmitProposal,
        "propose" => Action::ProposeTeam(
            args.iter()
                .map(|s| parse_seat(s))
                .collect::<Option<Vec<Seat>>>()?,
        ),
        "approve" | "yes" => Action::SubmitVote(Verdict::Approve),
        "reject" | "no" => Action::SubmitVote(Verdict::Reject),
        "success" | "fail" => {
            let seat = match state.phase {
                Phase::QuestExecution { seat } => seat,
                // Let the state machine report the wrong phase.
                _ => Seat(0),
            };
            Action::CastQuestVote {
                seat,
                success: cmd == "success",
            }
        }
        "result" => Action::ConfirmQuestResult,
        "force" => Action::ForceAssassination,
        "target" => Action::NominateTarget(parse_seat(args.first()?)?),
        "confirm" => Action::ConfirmAssassination,
        _ => return None,
    };
    Some(action)
}

fn print_setup(session: &GameSession) {
    let setup = session.setup();
    println!("--- Setup ---");
    println!("Players: {}", setup.player_count);
    let roles: Vec<&str> = setup.selected_roles().iter().map(|r| r.name()).collect();
    println!("Roles:   {}", roles.join(", "));
    let mut names: Vec<(&Seat, &String)> = setup.names.iter().collect();
    names.sort();
    for (seat, name) in names {
        println!("  {} is {}", seat, name);
    }
    println!();
}

fn print_phase(state: &GameState) {
    match state.phase {
        Phase::Setup => println!("Back at setup."),
        Phase::Reveal { seat } => {
            if let Some(reveal) = state.reveal(seat) {
                println!("\n=== Pass the device to {} ===", reveal.player.name);
                println!(
                    "You are {} ({})",
                    reveal.player.role.name(),
                    reveal.player.allegiance.label()
                );
                println!("{}", reveal.player.description);
                for other in reveal.knowledge {
                    if other.knowledge != Knowledge::Unknown && other.knowledge != Knowledge::Yourself {
                        println!("  {:<12} {}", other.name, other.knowledge.label());
                    }
                }
                println!("Type 'ok' when done.");
            }
        }
        Phase::RoundStart => {
            if let Some(report) = state.last_report {
                println!("{}", report.message());
            }
            print_table(state);
            println!("Type 'round' to begin.");
        }
        Phase::TeamProposal => {
            let size = state.current_quest().map(|q| q.team_size).unwrap_or(0);
            let leader = state.leader_player().map(|p| p.name.as_str()).unwrap_or("?");
            let team: Vec<String> = state.proposed_team.iter().map(|s| (s.0 + 1).to_string()).collect();
            println!(
                "{} picks {} for quest {} (picked: [{}])",
                leader,
                size,
                state.quest_index + 1,
                team.join(", ")
            );
        }
        Phase::TeamVote => {
            let team: Vec<&str> = state
                .proposed_team
                .iter()
                .filter_map(|s| state.player(*s))
                .map(|p| p.name.as_str())
                .collect();
            println!("Vote on the team: {} (approve/reject)", team.join(", "));
            println!("Rejections so far: {}", state.rejections);
        }
        Phase::QuestExecution { seat } => {
            if let Some(player) = state.player(seat) {
                let choices = if state.can_fail(seat) { "success/fail" } else { "success" };
                println!("Pass the device to {} and play a card ({})", player.name, choices);
            }
        }
        Phase::QuestResult => println!("All cards are in. Type 'result' to reveal."),
        Phase::Assassination => {
            let candidates: Vec<String> = state
                .assassination_candidates()
                .iter()
                .map(|p| format!("{} ({})", p.name, p.seat.0 + 1))
                .collect();
            println!("Assassin, choose your target: {}", candidates.join(", "));
            if let Some(target) = state.assassination_target.and_then(|s| state.player(s)) {
                println!("Current target: {}. Type 'confirm' to strike.", target.name);
            }
        }
        Phase::GameEnd(_) => {
            if let Some(report) = state.last_report {
                println!("{}", report.message());
            }
            if let Some(message) = state.end_message() {
                println!("\n*** {} ***\n", message);
            }
            for player in &state.players {
                println!("  {:<12} {}", player.name, player.role.name());
            }
            println!("Type 'new' for a new legend.");
        }
    }
}

fn print_table(state: &GameState) {
    let history: Vec<&str> = state
        .quest_history
        .iter()
        .map(|q| match q {
            Some(QuestOutcome::Success) => "S",
            Some(QuestOutcome::Fail) => "F",
            None => "-",
        })
        .collect();
    println!("Quests: [{}]  Rejections: {}", history.join(" "), state.rejections);
    for player in &state.players {
        let marker = if player.seat == state.leader { "*" } else { " " };
        println!("  {}{:>2} {}", marker, player.seat.0 + 1, player.name);
    }
}

fn print_usage() {
    println!("Usage: table [--players <n>] [--roles <r1,r2>] [--seed <n>] [--ruleset <file.ron>] [--verbose]");
}

fn print_help() {
    println!("Setup:   players <n> | role <name> | name <seat> <name> | start");
    println!("Reveal:  ok");
    println!("Round:   round | pick <seat> | propose [seats..] | approve | reject");
    println!("Quest:   success | fail | result");
    println!("Endgame: force | target <seat> | confirm | new");
    println!("Other:   show | help | quit");
}
