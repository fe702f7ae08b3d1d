//! Ambient Score - explain how colors would be ranked
//!
//! Scores each color given on the command line and prints the breakdown
//! the discrete engine would use to pick a winner.
//!
//! # Usage
//!
//! ```bash
//! ambient-score "#ff0000:12.5" "#3050b0:30" "#808080:50"
//! ambient-score --json "#00aacc"
//! ```

use ambient_engine::{AmbientScorer, BrightnessFalloff, DecisionSelector, Rgb};

/// Screen share assumed when a color has no `:PERCENT` suffix
const DEFAULT_PERCENTAGE: f64 = 10.0;

#[derive(Debug, Default)]
struct Args {
    json: bool,
    falloff: BrightnessFalloff,
    colors: Vec<(String, f64)>,
}

/// Parse `HEX[:PERCENT]`
fn parse_color_arg(arg: &str) -> Result<(String, f64), String> {
    let (hex, percentage) = match arg.split_once(':') {
        Some((hex, pct)) => {
            let pct: f64 = pct
                .trim_end_matches('%')
                .parse()
                .map_err(|_| format!("Invalid percentage in {:?}", arg))?;
            if !pct.is_finite() || pct < 0.0 {
                return Err(format!("Percentage must be non-negative in {:?}", arg));
            }
            (hex, pct)
        }
        None => (arg, DEFAULT_PERCENTAGE),
    };

    let hex = if hex.starts_with('#') {
        hex.to_string()
    } else {
        format!("#{}", hex)
    };
    Rgb::from_hex(&hex).map_err(|e| e.to_string())?;
    Ok((hex.to_lowercase(), percentage))
}

fn parse_args() -> Args {
    let args: Vec<String> = std::env::args().collect();
    let mut parsed = Args::default();

    for arg in &args[1..] {
        match arg.as_str() {
            "--help" | "-h" => {
                print_help();
                std::process::exit(0);
            }
            "--json" => parsed.json = true,
            "--smooth" => parsed.falloff = BrightnessFalloff::Smooth,
            _ if arg.starts_with("--") => {
                eprintln!("Unknown argument: {}", arg);
                eprintln!("Use --help for usage information.");
                std::process::exit(1);
            }
            _ => match parse_color_arg(arg) {
                Ok(color) => parsed.colors.push(color),
                Err(e) => {
                    eprintln!("{}", e);
                    std::process::exit(1);
                }
            },
        }
    }

    parsed
}

fn print_help() {
    println!(
        r##"Ambient Score - Explain ambient color choices

USAGE:
    ambient-score [OPTIONS] <HEX[:PERCENT]>...

OPTIONS:
    -h, --help      Show this help message
    --json          Print the full decision report as JSON
    --smooth        Use smooth brightness falloff at the edges

PERCENT is the share of the screen the color covers (default: 10).

EXAMPLES:
    ambient-score "#ff0000:12.5" "#3050b0:30" "#808080:50"
    ambient-score --smooth 330000:20
"##
    );
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = parse_args();
    if args.colors.is_empty() {
        print_help();
        std::process::exit(1);
    }

    let selector = DecisionSelector::new(AmbientScorer::new(args.falloff));
    let report = selector.decide(args.colors.iter().map(|(hex, pct)| (hex.as_str(), *pct)));

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    for candidate in &report.candidates {
        let marker = if candidate.is_winner { "*" } else { " " };
        let b = &candidate.score_breakdown;
        println!(
            "{} {} ({:.1}% of screen)  {}",
            marker,
            candidate.hex,
            candidate.screen_percentage,
            b.summary()
        );
        println!(
            "    hue {:.0}°  saturation {:.0}%  brightness {:.0}%",
            candidate.hue_degrees(),
            candidate.saturation_percent(),
            candidate.brightness_percent()
        );
        println!("    saturation: {}", b.saturation_reason);
        if !b.saturation_rejected {
            println!("    brightness: {}", b.brightness_reason);
            println!("    prevalence: {}", b.prevalence_reason);
            println!("    hue:        {}", b.hue_reason);
        }
        for reason in &b.penalty_reasons {
            println!("    penalty:    {}", reason);
        }
        if let Some(reason) = &candidate.rejection_reason {
            println!("    rejected:   {}", reason);
        }
    }

    println!();
    println!("{}", report.summary);
    Ok(())
}
