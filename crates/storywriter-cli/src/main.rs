//! # storywriter
//!
//! Interactive terminal client for a StoryWriter generation server:
//! streams each turn's prose to the terminal, shows the choices the
//! server offers, and sends the player's pick back for the next turn.

#![deny(unsafe_code)]

use std::io::Write as _;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use storywriter_client::{
    ClientConfig, ClientResult, GenerationClient, GenerationParams, TurnRequest,
};
use storywriter_core::{Choice, StreamEvent};
use storywriter_session::{PARAGRAPH_SEPARATOR, StorySession, TurnPhase};
use storywriter_settings::StorywriterSettings;

/// Interactive StoryWriter client.
#[derive(Parser, Debug)]
#[command(name = "storywriter", about = "Interactive story generation client")]
struct Cli {
    /// Path to the settings file (defaults to `~/.storywriter/settings.json`).
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Generation server base URL (overrides settings).
    #[arg(long)]
    base_url: Option<String>,

    /// Bearer token for the generation server (overrides settings).
    #[arg(long)]
    auth_token: Option<String>,

    /// Model identifier to request (overrides settings).
    #[arg(long)]
    model: Option<String>,

    /// Direction to steer the opening turn with.
    #[arg(long)]
    premise: Option<String>,

    /// Paragraphs to request per turn (overrides settings).
    #[arg(long)]
    paragraphs: Option<u8>,

    /// Choices to offer per turn (overrides settings).
    #[arg(long)]
    choices: Option<u8>,

    /// Wait for complete turns instead of streaming fragments.
    #[arg(long)]
    no_stream: bool,
}

/// Load settings. A malformed file named with `--settings` is an error;
/// any other load problem falls back to defaults.
fn resolve_settings(cli: &Cli) -> Result<StorywriterSettings> {
    match &cli.settings {
        Some(path) => storywriter_settings::load_settings_from_path(path)
            .with_context(|| format!("failed to load settings from {}", path.display())),
        None => Ok(storywriter_settings::load_settings().unwrap_or_default()),
    }
}

/// Initialize the global tracing subscriber with stderr output.
///
/// `RUST_LOG` wins over the configured level when set.
fn init_logging(level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .compact();
    // try_init is a no-op if a subscriber is already set
    let _ = subscriber.try_init();
}

/// Build the client configuration, flags winning over settings.
fn client_config(cli: &Cli, settings: &StorywriterSettings) -> ClientConfig {
    let generation = &settings.generation;
    let params = GenerationParams {
        model: cli.model.clone().or_else(|| generation.model.clone()),
        temperature: generation.temperature,
        max_tokens: generation.max_tokens,
        seed: generation.seed,
    };
    ClientConfig {
        base_url: cli
            .base_url
            .clone()
            .unwrap_or_else(|| settings.server.base_url.clone()),
        auth_token: cli
            .auth_token
            .clone()
            .or_else(|| settings.server.auth_token.clone())
            .unwrap_or_default(),
        params,
    }
}

/// Map the player's input to the action sent with the next turn.
///
/// A number picks from the offered choices; any other non-empty input
/// becomes a free-form action. Empty input lets the story run on its own.
fn resolve_choice(input: &str, choices: &[Choice]) -> Option<Choice> {
    if input.is_empty() {
        return None;
    }
    if let Ok(number) = input.parse::<usize>() {
        if let Some(choice) = number.checked_sub(1).and_then(|index| choices.get(index)) {
            return Some(choice.clone());
        }
    }
    Some(Choice::new(input, ""))
}

/// Print a streamed event's visible part as it arrives.
fn print_fragment(event: &StreamEvent) {
    match event {
        StreamEvent::Token { content } | StreamEvent::Content { content } => {
            print!("{content}");
            let _ = std::io::stdout().flush();
        }
        StreamEvent::ParagraphEnd { content } => {
            print!("{content}");
            if !content.ends_with(PARAGRAPH_SEPARATOR) {
                print!("{PARAGRAPH_SEPARATOR}");
            }
            let _ = std::io::stdout().flush();
        }
        StreamEvent::Status { message } => {
            eprintln!("· {message}");
        }
        _ => {}
    }
}

/// Run one turn, letting Ctrl-C cancel it without ending the program.
async fn take_turn(
    client: &GenerationClient,
    session: &mut StorySession,
    request: &TurnRequest,
    streaming: bool,
) -> ClientResult<()> {
    let cancel = session.begin_turn();
    let interrupt = cancel.clone();

    let turn = async {
        if streaming {
            session.drive_turn(client, request, cancel, print_fragment).await
        } else {
            session.drive_blocking_turn(client, request, cancel).await
        }
    };
    tokio::pin!(turn);

    tokio::select! {
        result = &mut turn => result,
        signal = tokio::signal::ctrl_c() => match signal {
            Ok(()) => {
                interrupt.cancel();
                // The stream notices the token and winds down on its own.
                (&mut turn).await
            }
            Err(error) => {
                tracing::warn!(%error, "ctrl-c handler unavailable");
                (&mut turn).await
            }
        },
    }
}

fn show_choices(choices: &[Choice]) {
    if choices.is_empty() {
        return;
    }
    println!("What happens next?");
    for (index, choice) in choices.iter().enumerate() {
        println!("  {}. {}: {}", index + 1, choice.label, choice.description);
    }
}

/// Read one trimmed line from the player; `None` means end of input.
fn prompt(stdin: &std::io::Stdin) -> Result<Option<String>> {
    print!("> ");
    std::io::stdout().flush().context("failed to flush stdout")?;
    let mut line = String::new();
    let read = stdin
        .read_line(&mut line)
        .context("failed to read from stdin")?;
    if read == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_owned()))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();

    let settings = resolve_settings(&args)?;
    init_logging(&settings.logging.level);

    let config = client_config(&args, &settings);
    tracing::debug!(base_url = %config.base_url, "starting client");
    let client = GenerationClient::new(config);

    let streaming = settings.story.streaming && !args.no_stream;
    let paragraph_count = args.paragraphs.unwrap_or(settings.story.paragraph_count);
    let choice_count = args.choices.unwrap_or(settings.story.choice_count);

    let mut session = StorySession::new();
    let mut influence = args.premise.clone();
    let mut chosen: Option<Choice> = None;

    println!("StoryWriter");
    println!(
        "Pick a numbered choice, type your own action, press Enter to let the \
         story run, or \"quit\" to stop. Ctrl-C interrupts a turn in progress."
    );
    println!();

    let stdin = std::io::stdin();
    loop {
        let mut request = session.next_request(chosen.take());
        request.storyline_influence = influence.take();
        request.paragraph_count = Some(paragraph_count);
        request.choice_count = Some(choice_count);

        let seen = session.paragraphs().len();
        if let Err(error) = take_turn(&client, &mut session, &request, streaming).await {
            tracing::debug!(%error, "turn aborted");
        }

        if streaming {
            println!();
        } else {
            for paragraph in &session.paragraphs()[seen..] {
                println!("{paragraph}");
                println!();
            }
        }

        match session.phase() {
            // A settled turn only lands back in Idle when it was cancelled.
            TurnPhase::Idle => println!("(turn interrupted)"),
            TurnPhase::Failed => {
                if let Some(error) = session.last_error() {
                    eprintln!("The storyteller faltered: {error}");
                }
            }
            TurnPhase::Complete | TurnPhase::Streaming => {}
        }

        show_choices(session.choices());
        let Some(line) = prompt(&stdin)? else { break };
        if line.eq_ignore_ascii_case("quit") || line.eq_ignore_ascii_case("exit") {
            break;
        }
        chosen = resolve_choice(&line, session.choices());
    }

    println!("The story rests here.");
    Ok(())
}
