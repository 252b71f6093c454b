use anyhow::Context;
use clap::{Args, ColorChoice, CommandFactory, FromArgMatches, Parser, Subcommand};
use colored::Colorize;
use colorsense::aggregate::{ReferenceFile, load_reference};
use colorsense::config::CliConfig;
use colorsense::engine::ScoringEngine;
use colorsense::mapping::{UserMapping, parse_pair};
use colorsense::palette::{PALETTE, Rgb, closest_color_name};
use colorsense::report::{self, RenderOptions};
use colorsense::scorer::compare;
use is_terminal::IsTerminal;
use serde_json::{Value, json};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(
    name = "colorsense",
    about = "Score object/color assertions against reference detections",
    arg_required_else_help = true
)]
struct Cli {
    /// Disable color
    #[arg(long = "no-color", global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Score a mapping against every reference file in a directory
    Score(ScoreArgs),
    /// Compare a mapping against a single reference file
    Compare(CompareArgs),
    /// Name the palette color closest to an RGB value
    Nearest(NearestArgs),
    /// List the known color palette
    Palette(PaletteArgs),
    /// Print the JSON schema of reference files
    Schema,
}

#[derive(Args, Clone)]
struct MappingArgs {
    /// label=color pairs
    #[arg(value_name = "LABEL=COLOR")]
    pairs: Vec<String>,

    /// JSON file with a label to color object
    #[arg(long, value_name = "FILE")]
    user: Option<PathBuf>,
}

#[derive(Args, Clone)]
struct ScoreArgs {
    #[command(flatten)]
    mapping: MappingArgs,

    /// Directory of reference files
    #[arg(long, value_name = "DIR")]
    dir: Option<PathBuf>,

    /// File name suffix of reference files
    #[arg(long)]
    suffix: Option<String>,

    /// Output JSON
    #[arg(long)]
    json: bool,

    /// Explain every entry of every reference
    #[arg(short, long)]
    verbose: bool,

    /// Decimal places for scores
    #[arg(long)]
    precision: Option<usize>,
}

#[derive(Args, Clone)]
struct CompareArgs {
    #[command(flatten)]
    mapping: MappingArgs,

    /// Reference file to compare against
    #[arg(long, value_name = "FILE")]
    reference: PathBuf,

    /// Output JSON
    #[arg(long)]
    json: bool,

    /// Show score internals
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Args, Clone)]
struct NearestArgs {
    r: u8,
    g: u8,
    b: u8,

    /// Output JSON
    #[arg(long)]
    json: bool,
}

#[derive(Args, Clone)]
struct PaletteArgs {
    /// Output JSON
    #[arg(long)]
    json: bool,
}

fn read_user_file(path: &Path) -> anyhow::Result<UserMapping> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading user mapping {}", path.display()))?;
    UserMapping::from_json_str(&content)
        .with_context(|| format!("parsing user mapping {}", path.display()))
}

fn build_user_mapping(args: &MappingArgs) -> Result<UserMapping, i32> {
    let mut user = match &args.user {
        Some(path) => match read_user_file(path) {
            Ok(user) => user,
            Err(e) => {
                eprintln!("Error: {:#}", e);
                return Err(2);
            }
        },
        None => UserMapping::new(),
    };

    for raw in &args.pairs {
        let inserted = parse_pair(raw).and_then(|(label, color)| user.insert(label, color));
        if let Err(e) = inserted {
            eprintln!("Error: {}", e);
            return Err(2);
        }
    }

    if user.is_empty() {
        eprintln!("Error: no mapping specified");
        eprintln!("Usage: colorsense score <label=color>... [--user <file>]");
        eprintln!("Example: colorsense score skyscraper=red lantern=red");
        return Err(1);
    }
    Ok(user)
}

fn print_json(v: &Value) -> Result<(), i32> {
    match serde_json::to_string_pretty(v) {
        Ok(s) => {
            println!("{}", s);
            Ok(())
        }
        Err(_) => Err(3),
    }
}

fn run_score(args: ScoreArgs, config: &CliConfig, color: bool) -> Result<(), i32> {
    let user = build_user_mapping(&args.mapping)?;
    let dir = args
        .dir
        .unwrap_or_else(|| config.sources.directory.clone());
    let suffix = args
        .suffix
        .unwrap_or_else(|| config.sources.suffix.clone());
    let verbose = args.verbose || config.output.verbose;

    let engine = match ScoringEngine::from_directory(&dir, &suffix) {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("Error: {}", e);
            return Err(2);
        }
    };
    let report = engine.run(&user);

    if args.json {
        print_json(&report::report_json(&report, &user, verbose))
    } else {
        let options = RenderOptions {
            color,
            verbose,
            precision: args.precision.unwrap_or(config.output.precision),
        };
        println!("{}", report::render_human(&report, &user, options));
        Ok(())
    }
}

fn run_compare(args: CompareArgs, config: &CliConfig, color: bool) -> Result<(), i32> {
    let user = build_user_mapping(&args.mapping)?;
    let reference = match load_reference(&args.reference) {
        Ok(reference) => reference,
        Err(e) => {
            eprintln!("Error: {}: {}", args.reference.display(), e);
            return Err(2);
        }
    };
    let comparison = compare(&user, &reference.colors);

    if args.json {
        let v = json!({
            "score": comparison.score,
            "similarities": comparison.similarities(),
            "comparison": comparison,
        });
        print_json(&v)
    } else {
        let options = RenderOptions {
            color,
            verbose: args.verbose || config.output.verbose,
            precision: config.output.precision,
        };
        println!("{}", report::render_comparison(&comparison, options));
        Ok(())
    }
}

fn run_nearest(args: NearestArgs) -> Result<(), i32> {
    let rgb = Rgb::new(args.r, args.g, args.b);
    let name = closest_color_name(rgb);
    if args.json {
        print_json(&json!({ "rgb": rgb, "name": name }))
    } else {
        println!("{}", name);
        Ok(())
    }
}

fn run_palette(args: PaletteArgs, color: bool) -> Result<(), i32> {
    if args.json {
        let entries: Vec<Value> = PALETTE
            .iter()
            .map(|(name, rgb)| json!({ "name": name, "rgb": rgb }))
            .collect();
        return print_json(&Value::Array(entries));
    }
    for (name, rgb) in PALETTE {
        if color {
            let swatch = "  ".on_truecolor(rgb.r, rgb.g, rgb.b);
            println!("{} {:<8} {}", swatch, name, rgb);
        } else {
            println!("{:<8} {}", name, rgb);
        }
    }
    Ok(())
}

fn run_schema() -> Result<(), i32> {
    let schema = schemars::schema_for!(ReferenceFile);
    match serde_json::to_value(&schema) {
        Ok(v) => print_json(&v),
        Err(_) => Err(3),
    }
}

/// Color choice for clap itself, decided before parsing so help and usage
/// errors are plain when `--no-color` or `NO_COLOR` is set.
fn detect_color_choice() -> ColorChoice {
    let no_color_env = std::env::var_os("NO_COLOR").is_some_and(|v| !v.is_empty());
    color_choice_from(std::env::args_os().skip(1), no_color_env)
}

fn color_choice_from<I>(args: I, no_color_env: bool) -> ColorChoice
where
    I: IntoIterator<Item = std::ffi::OsString>,
{
    // Anything after `--` is positional.
    let flagged = args
        .into_iter()
        .take_while(|arg| arg != "--")
        .any(|arg| arg == "--no-color");
    if flagged || no_color_env {
        ColorChoice::Never
    } else {
        ColorChoice::Auto
    }
}

fn init_logging(verbose: bool, color: bool) {
    let default_level = if verbose { "info" } else { "warn" };
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level));
    if !color {
        builder.write_style(env_logger::WriteStyle::Never);
    }
    builder.init();
}

fn main() {
    let color_choice = detect_color_choice();
    let matches = Cli::command().color(color_choice).get_matches();
    let cli = Cli::from_arg_matches(&matches).unwrap_or_else(|e| e.exit());
    let config = CliConfig::load();

    let color = !cli.no_color
        && !matches!(color_choice, ColorChoice::Never)
        && config.output.color
        && std::io::stdout().is_terminal();
    if !color {
        colored::control::set_override(false);
    }

    let verbose = match &cli.command {
        Some(Commands::Score(args)) => args.verbose,
        Some(Commands::Compare(args)) => args.verbose,
        _ => false,
    } || config.output.verbose;
    init_logging(verbose, color);

    let result = match cli.command {
        Some(Commands::Score(args)) => run_score(args, &config, color),
        Some(Commands::Compare(args)) => run_compare(args, &config, color),
        Some(Commands::Nearest(args)) => run_nearest(args),
        Some(Commands::Palette(args)) => run_palette(args, color),
        Some(Commands::Schema) => run_schema(),
        None => Ok(()),
    };
    if let Err(code) = result {
        std::process::exit(code);
    }
}
