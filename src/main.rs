mod commands;
mod core;
mod graph;
mod loader;

use clap::Parser;
use core::error::{RippleError, print_error};
use std::path::PathBuf;

/// Find the crates affected by a set of changed files
#[derive(Parser)]
#[command(name = "cargo")]
#[command(bin_name = "cargo")]
#[command(styles = get_styles())]
enum CargoCli {
  Ripple(RippleCli),
}

#[derive(Parser)]
#[command(name = "ripple")]
#[command(version, about, long_about = None)]
#[command(styles = get_styles())]
struct RippleCli {
  /// Git ref to diff against (default: origin/main, or ripple.toml `base`)
  #[arg(long)]
  since: Option<String>,

  /// Diff the latest merge commit instead of a ref
  #[arg(long, conflicts_with = "changed_files")]
  merge: bool,

  /// Path to a newline-separated list of absolute changed file paths
  /// (bypasses git entirely)
  #[arg(long, value_name = "FILE")]
  changed_files: Option<PathBuf>,

  /// Restrict loaded roots to packages with one of these name prefixes
  #[arg(long, value_delimiter = ',')]
  include: Vec<String>,

  /// Features handed to cargo metadata (conditional compilation)
  #[arg(long, value_delimiter = ',')]
  features: Vec<String>,

  /// Output format: text (default), json, names
  #[arg(long, default_value = "text")]
  format: String,

  /// List changed files without running the analysis
  #[arg(long)]
  dry_run: bool,
}

fn get_styles() -> clap::builder::Styles {
  clap::builder::Styles::styled()
    .usage(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
    )
    .header(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
    )
    .literal(anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))))
    .invalid(
      anstyle::Style::new()
        .bold()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
    )
    .error(
      anstyle::Style::new()
        .bold()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
    )
    .valid(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))),
    )
    .placeholder(anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::White))))
}

fn main() {
  let CargoCli::Ripple(cli) = CargoCli::parse();

  let result = commands::run_impact(
    cli.since,
    cli.merge,
    cli.changed_files,
    cli.include,
    cli.features,
    cli.format,
    cli.dry_run,
  );

  if let Err(err) = result {
    handle_error(err);
  }
}

fn handle_error(err: RippleError) -> ! {
  print_error(&err);
  std::process::exit(err.exit_code().as_i32());
}
