use std::time::Instant;

use shapes_core::puzzle::Board;
use shapes_gen::{default_config, generate, optimize_constraints};
use shapes_solver::{Context, solve_ex};

#[cfg(feature = "telemetry-subscriber")]
fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("shapes_solver=info,shapes_gen=info,shapes_cli=info"));

    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

#[cfg(not(feature = "telemetry-subscriber"))]
fn init_tracing() {}

fn usage() -> &'static str {
    "shapes-cli\n\
\n\
USAGE:\n\
  shapes-cli generate --level <1-5> [--seed <S>] [--no-optimize]\n\
  shapes-cli solve --level <1-5> [--seed <S>]\n\
  shapes-cli batch --level <1-5> --count <C> [--seed <S>]\n\
\n\
EXAMPLES:\n\
  shapes-cli generate --level 3 --seed 42\n\
  shapes-cli solve --level 2\n\
  shapes-cli batch --level 4 --count 25 --seed 100\n"
}

fn parse_arg_value(args: &[String], i: &mut usize) -> Result<String, String> {
    *i += 1;
    args.get(*i)
        .cloned()
        .ok_or_else(|| "missing value".to_string())
}

fn main() {
    init_tracing();
    if let Err(err) = run() {
        eprintln!("{err}\n\n{}", usage());
        std::process::exit(2);
    }
}

fn run() -> Result<(), String> {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        return Err("missing command".to_string());
    }

    let cmd = args[1].as_str();
    let mut level: Option<u8> = None;
    let mut seed: u64 = 0;
    let mut count: u32 = 1;
    let mut optimize = true;

    let mut i = 2usize;
    while i < args.len() {
        match args[i].as_str() {
            "--level" | "-l" => {
                let v = parse_arg_value(&args, &mut i)?;
                level = Some(v.parse::<u8>().map_err(|_| "invalid --level".to_string())?);
            }
            "--seed" | "-s" => {
                let v = parse_arg_value(&args, &mut i)?;
                seed = v.parse::<u64>().map_err(|_| "invalid --seed".to_string())?;
            }
            "--count" | "-c" => {
                let v = parse_arg_value(&args, &mut i)?;
                count = v.parse::<u32>().map_err(|_| "invalid --count".to_string())?;
            }
            "--no-optimize" => {
                optimize = false;
            }
            "--help" | "-h" => {
                println!("{}", usage());
                return Ok(());
            }
            other => {
                return Err(format!("unknown arg: {other}"));
            }
        }
        i += 1;
    }

    let Some(level) = level else {
        return Err("missing required flag: --level".to_string());
    };

    match cmd {
        "generate" => generate_one(level, seed, optimize),
        "solve" => solve_one(level, seed),
        "batch" => batch(level, seed, count),
        _ => Err(format!("unknown command: {cmd}")),
    }
}

fn generate_one(level: u8, seed: u64, optimize: bool) -> Result<(), String> {
    let cfg = default_config(level);
    let mut generated =
        generate(&cfg, seed).map_err(|e| format!("generation failed: {e}"))?;

    if optimize {
        optimize_constraints(&mut generated.puzzle, seed);
    }

    let p = &generated.puzzle;
    println!("{p}");
    if optimize {
        println!("Display constraints ({}):", p.display_constraints.len());
        for (i, c) in p.display_constraints.iter().enumerate() {
            println!("  {}. {c}", i + 1);
        }
    }
    println!("\nSolution:");
    print_board(&generated.solution, p.width);
    println!(
        "\ngenerated in {} candidate board(s), seed {seed}",
        generated.attempts
    );
    Ok(())
}

fn solve_one(level: u8, seed: u64) -> Result<(), String> {
    let cfg = default_config(level);
    let generated = generate(&cfg, seed).map_err(|e| format!("generation failed: {e}"))?;

    let mut p = generated.puzzle;
    println!("{p}");

    let mut ctx = Context::new();
    let result = solve_ex(&mut ctx, &mut p, 0).map_err(|e| format!("solve failed: {e}"))?;

    println!(
        "solutions={} states={} time={:.3}ms solvable={}",
        result.solution_count, result.states_explored, result.time_ms, result.is_solvable
    );
    if let Some(solution) = result.solution {
        println!("First solution:");
        print_board(&solution, p.width);
    }
    Ok(())
}

fn batch(level: u8, base_seed: u64, count: u32) -> Result<(), String> {
    let cfg = default_config(level);
    let start = Instant::now();
    let mut generated = 0u32;
    let mut unique = 0u32;

    for offset in 0..count {
        let seed = base_seed + offset as u64;
        let Ok(g) = generate(&cfg, seed) else {
            println!("seed {seed}: FAILED");
            continue;
        };
        generated += 1;
        let mut p = g.puzzle;
        match shapes_gen::validate_unique(&mut p) {
            Ok(true) => unique += 1,
            Ok(false) => println!("seed {seed}: NOT UNIQUE"),
            Err(e) => println!("seed {seed}: solver error: {e}"),
        }
    }

    let elapsed = start.elapsed().as_secs_f64();
    println!(
        "level {level}: {generated}/{count} generated, {unique} unique, {elapsed:.2}s total"
    );
    if generated != unique {
        return Err("some generated puzzles were not unique".to_string());
    }
    Ok(())
}

fn print_board(board: &Board, width: u8) {
    for (idx, shape) in board.iter().enumerate() {
        if idx > 0 && idx % width as usize == 0 {
            println!();
        }
        print!(" {} ", shape.glyph());
    }
    println!();
}
