/// Ruleset Linter: validates table rulesets and flags lopsided tables.
///
/// Usage: ruleset_linter <ruleset.ron | ruleset_dir>

use avalon_engine::schema::table::{Ruleset, TableRow};
use std::path::{Path, PathBuf};
use std::process;

fn main() {
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        println!("Usage: ruleset_linter <ruleset.ron | ruleset_dir>");
        process::exit(0);
    }

    let target = Path::new(&args[1]);
    let files = if target.is_file() {
        vec![target.to_path_buf()]
    } else if target.is_dir() {
        collect_ron_files(target)
    } else {
        eprintln!("ERROR: Path '{}' does not exist", args[1]);
        process::exit(1);
    };

    if files.is_empty() {
        eprintln!("ERROR: No .ron files found in '{}'", args[1]);
        process::exit(1);
    }

    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    for path in &files {
        match Ruleset::load_from_ron(path) {
            Ok(ruleset) => {
                println!("  Loaded: {} ({})", path.display(), ruleset.name);
                for row in ruleset.rows() {
                    for warning in lint_row(row) {
                        warnings.push(format!("{}: {}", ruleset.name, warning));
                    }
                }
            }
            Err(e) => errors.push(format!("{}: {}", path.display(), e)),
        }
    }

    println!("\n=== Ruleset Lint Report ===\n");

    if errors.is_empty() && warnings.is_empty() {
        println!("All checks passed!");
    }

    for warning in &warnings {
        println!("WARNING: {}", warning);
    }

    for error in &errors {
        println!("ERROR: {}", error);
    }

    println!(
        "\nSummary: {} files, {} errors, {} warnings",
        files.len(),
        errors.len(),
        warnings.len()
    );

    if errors.is_empty() {
        process::exit(0);
    } else {
        process::exit(1);
    }
}

fn collect_ron_files(dir: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    if let Ok(entries) = std::fs::read_dir(dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                files.extend(collect_ron_files(&path));
            } else if path.extension().and_then(|s| s.to_str()) == Some("ron") {
                files.push(path);
            }
        }
    }
    files.sort();
    files
}

/// Balance checks for a row that already passed validation.
fn lint_row(row: &TableRow) -> Vec<String> {
    let mut warnings = Vec::new();
    let count = row.player_count;

    if row.evil * 2 >= count {
        warnings.push(format!(
            "{} players: evil holds {} of {} seats",
            count, row.evil, count
        ));
    }

    for (i, quest) in row.quests.iter().enumerate() {
        if quest.team_size > row.good {
            warnings.push(format!(
                "{} players: quest {} team of {} always includes an evil player",
                count,
                i + 1,
                quest.team_size
            ));
        }
        if quest.fails_required > 1 && quest.team_size < 4 {
            warnings.push(format!(
                "{} players: quest {} needs {} fails from only {} members",
                count,
                i + 1,
                quest.fails_required,
                quest.team_size
            ));
        }
    }

    let double = row.quests.iter().filter(|q| q.fails_required > 1).count();
    if double > 1 {
        warnings.push(format!(
            "{} players: {} quests need more than one fail card",
            count, double
        ));
    }

    warnings
}
