/// Deck Stats: deals many decks and reports how roles spread over seats.
///
/// Usage: deck_stats --players <5-10> [--roles <r1,r2>] [--trials <n>] [--seed <n>] [--ruleset <file.ron>]
use avalon_engine::core::deck::{build_deck, DeckRequest};
use avalon_engine::schema::role::RoleId;
use avalon_engine::schema::table::Ruleset;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::BTreeMap;
use std::env;
use std::path::Path;
use std::process;

const USAGE: &str =
    "Usage: deck_stats --players <5-10> [--roles <r1,r2>] [--trials <n>] [--seed <n>] [--ruleset <file.ron>]";

fn main() {
    let args: Vec<String> = env::args().collect();

    let mut players = None;
    let mut roles: Vec<RoleId> = Vec::new();
    let mut trials = 10_000usize;
    let mut seed = 42u64;
    let mut ruleset_path = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--players" if i + 1 < args.len() => {
                i += 1;
                players = Some(args[i].parse::<usize>().unwrap_or_else(|_| {
                    eprintln!("Error: --players must be a number");
                    process::exit(1);
                }));
            }
            "--roles" if i + 1 < args.len() => {
                i += 1;
                for name in args[i].split(',').filter(|s| !s.is_empty()) {
                    let role = RoleId::parse(name).unwrap_or_else(|| {
                        eprintln!("Error: unknown role '{}'", name);
                        process::exit(1);
                    });
                    roles.push(role);
                }
            }
            "--trials" if i + 1 < args.len() => {
                i += 1;
                trials = args[i].parse().unwrap_or(trials);
            }
            "--seed" if i + 1 < args.len() => {
                i += 1;
                seed = args[i].parse().unwrap_or(seed);
            }
            "--ruleset" if i + 1 < args.len() => {
                i += 1;
                ruleset_path = Some(args[i].clone());
            }
            "--help" | "-h" => {
                println!("{}", USAGE);
                process::exit(0);
            }
            other => {
                eprintln!("Unknown argument: {}", other);
                process::exit(1);
            }
        }
        i += 1;
    }

    let player_count = players.unwrap_or_else(|| {
        eprintln!("Error: --players is required");
        eprintln!("{}", USAGE);
        process::exit(1);
    });

    let ruleset = match ruleset_path {
        Some(ref path) => Ruleset::load_from_ron(Path::new(path)).unwrap_or_else(|e| {
            eprintln!("Error loading ruleset '{}': {}", path, e);
            process::exit(1);
        }),
        None => Ruleset::standard(),
    };

    let request = roles
        .into_iter()
        .fold(DeckRequest::new(player_count), |req, role| req.with_role(role));

    let mut rng = StdRng::seed_from_u64(seed);
    let mut by_role: BTreeMap<RoleId, Vec<usize>> = BTreeMap::new();
    let mut leaders = vec![0usize; player_count];

    for _ in 0..trials {
        let deck = build_deck(&ruleset, &request, &mut rng).unwrap_or_else(|e| {
            eprintln!("Error: {}", e);
            process::exit(1);
        });
        for player in &deck.players {
            by_role
                .entry(player.role)
                .or_insert_with(|| vec![0; player_count])[player.seat.0] += 1;
        }
        leaders[deck.leader.0] += 1;
    }

    println!(
        "Dealt {} decks for {} players (ruleset '{}', seed {})\n",
        trials, player_count, ruleset.name, seed
    );

    print!("{:<10}", "role");
    for seat in 1..=player_count {
        print!("{:>8}", format!("P{}", seat));
    }
    println!("{:>10}", "max dev");

    for (role, counts) in &by_role {
        print_row(role.name(), counts, trials);
    }
    print_row("leader", &leaders, trials);
}

/// One line of seat shares, plus the largest relative deviation from an
/// even spread over the seats.
fn print_row(label: &str, counts: &[usize], trials: usize) {
    let copies: usize = counts.iter().sum::<usize>() / trials.max(1);
    let expected = (trials * copies) as f64 / counts.len() as f64;

    print!("{:<10}", label);
    for &n in counts {
        print!("{:>7.1}%", 100.0 * n as f64 / trials.max(1) as f64);
    }
    let max_dev = counts
        .iter()
        .map(|&n| ((n as f64 - expected) / expected.max(1.0)).abs())
        .fold(0.0f64, f64::max);
    println!("{:>9.1}%", 100.0 * max_dev);
}
