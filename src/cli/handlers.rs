//! Subcommand handlers. Each returns the process exit code.

use anyhow::{Context, Result};
use std::io::{self, Write};
use tokio::io::BufReader;
use tracing::{debug, error, info};

use super::commands::{
    AskArgs, ChatArgs, CliArgs, ConfigArgs, PrefsArgs, PrefsCommand, SpeakArgs, TranscribeArgs,
};
use super::output::{format_preference_line, OutputFormat, OutputFormatter};
use super::repl::{ChatMode, Session, VoiceReplies};
use crate::companion::{Companion, StoryPrompter};
use crate::config::CompanionConfig;
use crate::preferences::{self, PreferenceSource, PreferenceStore};
use crate::speech;

/// Environment configuration with command-line overrides applied
pub fn resolve_config(args: &CliArgs) -> CompanionConfig {
    let defaults = CompanionConfig::default();
    let config = CompanionConfig {
        provider: args.backend.unwrap_or(defaults.provider),
        model: args.model.clone().unwrap_or(defaults.model),
        preferences_file: args
            .preferences_file
            .clone()
            .unwrap_or(defaults.preferences_file),
        ..defaults
    };

    if args.backend.is_some() {
        debug!("Provider explicitly set to: {}", config.provider.as_str());
    }
    if args.model.is_some() {
        debug!("Model overridden to: {}", config.model);
    }
    config
}

fn config_is_valid(config: &CompanionConfig) -> bool {
    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        eprintln!("\nPlease check your environment variables and command-line arguments.");
        return false;
    }
    true
}

fn exit_code(result: Result<()>) -> i32 {
    match result {
        Ok(()) => 0,
        Err(e) => {
            error!("{:#}", e);
            1
        }
    }
}

fn open_companion(config: &CompanionConfig) -> Result<Companion> {
    let store = PreferenceStore::open(&config.preferences_file).with_context(|| {
        format!(
            "Failed to open preferences file {}",
            config.preferences_file.display()
        )
    })?;

    info!(
        "Using {} model {} with {} stored preferences",
        config.provider.as_str(),
        config.model,
        store.len()
    );

    Ok(Companion::with_options(
        config.create_client(),
        store,
        config.generation_options(),
    ))
}

pub async fn handle_chat(args: &ChatArgs, config: &CompanionConfig) -> i32 {
    if !config_is_valid(config) {
        return 1;
    }
    exit_code(run_chat(args, config).await)
}

async fn run_chat(args: &ChatArgs, config: &CompanionConfig) -> Result<()> {
    let mut companion = open_companion(config)?;
    let speech_client = config.create_speech_client();

    let voice = if args.voice {
        let name = args.voice_name.as_deref().unwrap_or(&config.voice);
        let name = speech::validate_voice(name)?;
        if !speech_client.is_available() {
            anyhow::bail!("Voice replies need OPENAI_API_KEY to be set");
        }
        Some(VoiceReplies::new(name, args.audio_dir.clone()))
    } else {
        None
    };

    let mode = ChatMode::Elicitation {
        user_id: args.user.clone(),
    };
    let stdin = BufReader::new(tokio::io::stdin());
    let mut stdout = io::stdout();

    Session::new(&mut companion, mode)
        .with_speech(&speech_client, voice)
        .run(stdin, &mut stdout)
        .await?;
    Ok(())
}

pub async fn handle_ask(args: &AskArgs, config: &CompanionConfig) -> i32 {
    if !config_is_valid(config) {
        return 1;
    }
    exit_code(run_ask(args, config).await)
}

async fn run_ask(args: &AskArgs, config: &CompanionConfig) -> Result<()> {
    let mut companion = open_companion(config)?;

    match args.question() {
        Some(question) => {
            let answer = companion.process_inference_message(&question).await?;
            println!("{}", answer);
        }
        None => {
            let speech_client = config.create_speech_client();
            let stdin = BufReader::new(tokio::io::stdin());
            let mut stdout = io::stdout();
            Session::new(&mut companion, ChatMode::Inference)
                .with_speech(&speech_client, None)
                .run(stdin, &mut stdout)
                .await?;
        }
    }
    Ok(())
}

pub fn handle_prefs(args: &PrefsArgs, config: &CompanionConfig) -> i32 {
    exit_code(run_prefs(args, config))
}

fn run_prefs(args: &PrefsArgs, config: &CompanionConfig) -> Result<()> {
    let path = &config.preferences_file;
    let mut stdout = io::stdout();

    match &args.action {
        PrefsCommand::List { format } => {
            let store = PreferenceStore::open(path)?;
            let formatter = OutputFormatter::new(OutputFormat::from(*format));
            writeln!(stdout, "{}", formatter.format_preferences(store.list())?)?;
        }
        PrefsCommand::Add { text } => {
            let mut store = PreferenceStore::open(path)?;
            match store.add(text.join(" ").trim(), PreferenceSource::ManualInput)? {
                Some(pref) => writeln!(stdout, "Saved {}", format_preference_line(&pref))?,
                None => anyhow::bail!("Preference text must be at least 3 characters"),
            }
        }
        PrefsCommand::Delete { id } => {
            let mut store = PreferenceStore::open(path)?;
            if !store.delete(id)? {
                anyhow::bail!("No preference with id {}", id);
            }
            writeln!(stdout, "Deleted preference {}", id)?;
        }
        PrefsCommand::Check { format, add_test } => {
            let formatter = OutputFormatter::new(OutputFormat::from(*format));
            let report = preferences::check(path)?;
            writeln!(stdout, "{}", formatter.format_report(&report)?)?;

            if *add_test {
                let mut store = PreferenceStore::open(path)?;
                let text = format!("Test preference {}", store.len() + 1);
                if let Some(pref) = store.add(&text, PreferenceSource::TestScript)? {
                    writeln!(stdout, "Added test preference: {}", pref.text)?;
                    writeln!(stdout, "Total preferences: {}", store.len())?;
                }
                let report = preferences::check(path)?;
                writeln!(stdout, "{}", formatter.format_report(&report)?)?;
            }

            if !report.is_healthy() {
                anyhow::bail!("Preferences file {} is not valid JSON", path.display());
            }
        }
    }
    Ok(())
}

pub fn handle_story() -> i32 {
    println!("{}", StoryPrompter::new().next_prompt());
    0
}

pub async fn handle_transcribe(args: &TranscribeArgs, config: &CompanionConfig) -> i32 {
    let client = config.create_speech_client();
    match client.transcribe(&args.file).await {
        Ok(text) => {
            println!("{}", text);
            0
        }
        Err(e) => {
            error!("Transcription failed: {}", e);
            1
        }
    }
}

pub async fn handle_speak(args: &SpeakArgs, config: &CompanionConfig) -> i32 {
    let client = config.create_speech_client();
    let voice = args.voice.as_deref().unwrap_or(&config.voice);
    let text = args.text.join(" ");

    match client.synthesize_to_file(&text, voice, &args.output).await {
        Ok(()) => {
            println!("Wrote {}", args.output.display());
            0
        }
        Err(e) => {
            error!("Speech synthesis failed: {}", e);
            1
        }
    }
}

pub fn handle_config(args: &ConfigArgs, config: &CompanionConfig) -> i32 {
    let formatter = OutputFormatter::new(OutputFormat::from(args.format));
    let result = formatter.format_config(config).map(|rendered| {
        println!("{}", rendered.trim_end());
    });

    let code = exit_code(result);
    if code == 0 && !config_is_valid(config) {
        return 1;
    }
    code
}
