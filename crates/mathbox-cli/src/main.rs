use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use mathbox_layout::{
    Align, BoxStyle, RenderMode, RenderOptions, StaticInteraction, DEFAULT_COLOR,
    DEFAULT_FONT_SIZE,
};
use mathbox_syntax::{lexer, parse_with, Mode, TokenKind};
use serde::Deserialize;
use serde_json::json;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "mathbox")]
#[command(about = "Typeset math notation markup to JSON", long_about = None)]
struct Cli {
    /// Log parse recoveries (same as RUST_LOG=debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the token stream of notation markup
    Tokens(Notation),
    /// Print the parsed tree and its recoveries
    Ast(Notation),
    /// Print the size and box tree of markup
    Measure {
        #[command(flatten)]
        input: Markup,
    },
    /// Print the drawing primitives of markup
    Render {
        #[command(flatten)]
        input: Markup,

        #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
        x: f64,

        /// Baseline position
        #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
        y: f64,

        #[arg(long, default_value = DEFAULT_COLOR)]
        color: String,

        #[arg(long, value_enum, default_value_t = AlignArg::Start)]
        align: AlignArg,

        /// Emit a translucent backing rectangle
        #[arg(long)]
        background: bool,

        /// Outline every box
        #[arg(long)]
        debug: bool,

        /// Blank-box style for every box, e.g. `widthScale=1.5,thickness=2`
        #[arg(long, value_name = "KEY=VALUE,...")]
        style: Option<BoxStyle>,

        /// JSON file with `block`, per-index `boxes` and `selected` indices
        #[arg(long, value_name = "FILE")]
        overrides: Option<PathBuf>,
    },
}

#[derive(Args)]
struct Notation {
    /// Notation markup, or `-` to read stdin
    #[arg(value_name = "MARKUP")]
    markup: String,

    /// Tokenize in text mode (no scripts)
    #[arg(long)]
    text: bool,
}

#[derive(Args)]
struct Markup {
    /// Markup with `$...$` notation, or `-` to read stdin
    #[arg(value_name = "MARKUP")]
    markup: String,

    #[arg(long, default_value_t = DEFAULT_FONT_SIZE)]
    font_size: f64,

    #[arg(long, value_enum, default_value_t = ModeArg::Mixed)]
    mode: ModeArg,
}

#[derive(Clone, Copy, ValueEnum)]
enum ModeArg {
    Mixed,
    Math,
    Text,
}

impl From<ModeArg> for RenderMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Mixed => RenderMode::Mixed,
            ModeArg::Math => RenderMode::Math,
            ModeArg::Text => RenderMode::Text,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum AlignArg {
    Start,
    Middle,
    End,
}

impl From<AlignArg> for Align {
    fn from(align: AlignArg) -> Self {
        match align {
            AlignArg::Start => Align::Start,
            AlignArg::Middle => Align::Middle,
            AlignArg::End => Align::End,
        }
    }
}

#[derive(Default, Deserialize)]
#[serde(default)]
struct Overrides {
    block: BoxStyle,
    boxes: BTreeMap<usize, BoxStyle>,
    selected: BTreeSet<usize>,
}

fn read_markup(markup: &str) -> anyhow::Result<String> {
    if markup != "-" {
        return Ok(markup.to_string());
    }
    let mut buffer = String::new();
    io::stdin()
        .read_to_string(&mut buffer)
        .context("reading markup from stdin")?;
    Ok(buffer.trim_end_matches(['\r', '\n']).to_string())
}

fn token_kind(kind: TokenKind) -> &'static str {
    match kind {
        TokenKind::Command => "command",
        TokenKind::GroupOpen => "group-open",
        TokenKind::GroupClose => "group-close",
        TokenKind::ScriptUp => "script-up",
        TokenKind::ScriptDown => "script-down",
        TokenKind::ColSep => "col-sep",
        TokenKind::RowSep => "row-sep",
        TokenKind::Literal => "literal",
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    match cli.command {
        Commands::Tokens(notation) => {
            let markup = read_markup(&notation.markup)?;
            let mode = if notation.text { Mode::Text } else { Mode::Math };
            let tokens: Vec<_> = lexer::tokenize(&markup, mode)
                .iter()
                .map(|token| {
                    json!({
                        "kind": token_kind(token.kind),
                        "value": token.value,
                        "offset": u32::from(token.offset),
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&tokens)?);
        }
        Commands::Ast(notation) => {
            let markup = read_markup(&notation.markup)?;
            let mode = if notation.text { Mode::Text } else { Mode::Math };
            let result = parse_with(&markup, mode, 0);
            let errors: Vec<_> = result
                .errors
                .iter()
                .map(|error| {
                    json!({
                        "message": error.message,
                        "start": u32::from(error.range.start()),
                        "end": u32::from(error.range.end()),
                    })
                })
                .collect();
            let output = json!({
                "tree": result.root.to_string(),
                "placeholders": result.root.placeholders(),
                "errors": errors,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        Commands::Measure { input } => {
            let markup = read_markup(&input.markup)?;
            let measurement =
                mathbox_layout::measure_with(&markup, input.font_size, input.mode.into());
            println!("{}", serde_json::to_string_pretty(&measurement)?);
        }
        Commands::Render {
            input,
            x,
            y,
            color,
            align,
            background,
            debug,
            style,
            overrides,
        } => {
            let markup = read_markup(&input.markup)?;
            let file = match overrides {
                Some(path) => {
                    let content = fs::read_to_string(&path)
                        .with_context(|| format!("reading {}", path.display()))?;
                    serde_json::from_str(&content)
                        .with_context(|| format!("parsing {}", path.display()))?
                }
                None => Overrides::default(),
            };
            let interaction = StaticInteraction::new(file.boxes, file.selected);

            let options = RenderOptions {
                x,
                y,
                font_size: input.font_size,
                color: &color,
                align: align.into(),
                background,
                mode: input.mode.into(),
                debug,
                overrides: style.unwrap_or_default().or(file.block),
                interaction: Some(&interaction),
            };
            let primitives = mathbox_layout::render(&markup, &options);
            println!("{}", serde_json::to_string_pretty(&primitives)?);
        }
    }
    Ok(())
}
