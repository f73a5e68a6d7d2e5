//! voicekey - drive the focused application with spoken phrases
//!
//! Utterances come in from a speech source (stdin stands in for a
//! recognizer), the matcher resolves them against the phrasebook, and the
//! dispatcher replays the resulting key presses, chords, and text
//! insertions into whatever has input focus.

mod config;
mod dispatch;
mod keyboard;
mod matcher;
mod phrasebook;
mod session;
mod speech;
mod tokenize;

use clap::{Parser, Subcommand};
use std::error::Error;
use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::time::Duration;

use config::Config;
use dispatch::Dispatcher;
use keyboard::{DeviceKeyboard, InputMethod, Keyboard, LogKeyboard};
use matcher::Matcher;
use phrasebook::Phrasebook;
use session::Session;
use speech::StdinSource;

#[derive(Parser)]
#[command(
    name = "voicekey",
    about = "Turn spoken phrases into keystrokes in the focused application"
)]
struct Cli {
    /// Config file path
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,

    /// Log intended actions instead of driving the keyboard
    #[arg(long)]
    demo: bool,

    /// Trace matching and dispatch
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Print the registered phrases and exit
    Phrases,
}

fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let cli = Cli::parse();
    let config = Config::load(&cli.config);

    let step_delay = Duration::from_millis(config.dispatch.step_delay_ms);
    let phrasebook = Phrasebook::build(&config.commands, step_delay)?;

    if matches!(cli.command, Some(Command::Phrases)) {
        print_phrases(&phrasebook);
        return Ok(());
    }

    let matcher = Matcher::new(phrasebook, &config.commands);
    let settle_delay = Duration::from_millis(config.dispatch.settle_delay_ms);

    if cli.demo {
        return listen(matcher, Dispatcher::new(LogKeyboard, settle_delay), cli.verbose);
    }

    let method = InputMethod::from_str(&config.input.method);
    match DeviceKeyboard::new(method) {
        Ok(device) => listen(matcher, Dispatcher::new(device, settle_delay), cli.verbose),
        Err(e) => {
            eprintln!(
                "Keyboard automation unavailable ({}), falling back to demo mode",
                e
            );
            listen(matcher, Dispatcher::new(LogKeyboard, settle_delay), cli.verbose)
        }
    }
}

fn listen<K: Keyboard>(
    matcher: Matcher,
    dispatcher: Dispatcher<K>,
    verbose: bool,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let dispatcher = dispatcher.with_verbose(verbose);
    let mut session = Session::new(matcher, dispatcher).with_verbose(verbose);

    let stop = session.stop_flag();
    ctrlc::set_handler(move || stop.store(true, Ordering::SeqCst))?;

    eprintln!("Listening. One utterance per line; say \"stop listening\" (or Ctrl-C) to end.");
    let mut source = StdinSource::new(true);
    session.run(&mut source);
    Ok(())
}

fn print_phrases(phrasebook: &Phrasebook) {
    println!("{} phrases registered\n", phrasebook.len());
    for (phrase, action) in phrasebook.phrases() {
        println!("  {:22} {}", phrase, action);
    }
    println!("\nSay \"capital <word>\" to capitalize the next word.");
    println!("Anything unmatched is typed as literal text.");
    println!("Say \"stop listening\" to end the session.");
}
