use clap::{Args, Parser, Subcommand, ValueEnum};
use genai::adapter::AdapterKind;
use std::path::PathBuf;

use crate::config::parse_provider;

/// A conversational companion that learns your preferences from your stories
#[derive(Parser, Debug)]
#[command(
    name = "companion",
    about = "A conversational companion that learns your preferences from your stories",
    version,
    long_about = "companion listens to the stories you tell, picks out the preferences in them, \
                  and keeps them in a JSON file. Its 'ask' mode then uses everything it has \
                  learned to personalize its answers."
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(long, global = true, value_name = "LEVEL", help = "Set logging level")]
    pub log_level: Option<String>,

    #[arg(short = 'v', long, global = true, help = "Enable debug logging")]
    pub verbose: bool,

    #[arg(
        short = 'q',
        long,
        global = true,
        conflicts_with = "verbose",
        help = "Quiet mode - only log errors"
    )]
    pub quiet: bool,

    #[arg(
        short = 'p',
        long,
        global = true,
        value_name = "FILE",
        help = "Preferences file (overrides COMPANION_PREFERENCES_FILE)"
    )]
    pub preferences_file: Option<PathBuf>,

    #[arg(
        short = 'b',
        long,
        global = true,
        value_parser = parse_adapter_kind,
        help = "LLM provider (overrides COMPANION_PROVIDER)"
    )]
    pub backend: Option<AdapterKind>,

    #[arg(
        short = 'm',
        long,
        global = true,
        value_name = "MODEL",
        help = "Model name (overrides COMPANION_MODEL)"
    )]
    pub model: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(
        about = "Tell me about you: story-driven chat that learns preferences",
        long_about = "Starts an interactive chat. Share stories and experiences; preferences \
                      you mention are saved as you go.\n\n\
                      Examples:\n  \
                      companion chat\n  \
                      companion chat --voice --voice-name echo"
    )]
    Chat(ChatArgs),

    #[command(
        about = "Ask me anything: answers personalized with what I've learned",
        long_about = "Answers a single question, or starts an interactive session when no \
                      question is given.\n\n\
                      Examples:\n  \
                      companion ask \"What should I cook tonight?\"\n  \
                      companion ask"
    )]
    Ask(AskArgs),

    #[command(about = "Inspect and edit stored preferences")]
    Prefs(PrefsArgs),

    #[command(about = "Print a story prompt to get the conversation going")]
    Story,

    #[command(about = "Transcribe an audio file to text")]
    Transcribe(TranscribeArgs),

    #[command(about = "Synthesize speech for a piece of text")]
    Speak(SpeakArgs),

    #[command(about = "Show the effective configuration")]
    Config(ConfigArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ChatArgs {
    #[arg(
        short = 'u',
        long,
        value_name = "ID",
        default_value = "user1",
        help = "Conversation identifier"
    )]
    pub user: String,

    #[arg(long, help = "Speak replies aloud (writes MP3 files)")]
    pub voice: bool,

    #[arg(long, value_name = "NAME", help = "Voice for spoken replies")]
    pub voice_name: Option<String>,

    #[arg(
        long,
        value_name = "DIR",
        default_value = "data/audio",
        help = "Directory for spoken reply audio"
    )]
    pub audio_dir: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct AskArgs {
    #[arg(value_name = "QUESTION", help = "Question to answer (omit for interactive mode)")]
    pub question: Vec<String>,
}

impl AskArgs {
    pub fn question(&self) -> Option<String> {
        let joined = self.question.join(" ");
        let trimmed = joined.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    }
}

#[derive(Args, Debug, Clone)]
pub struct PrefsArgs {
    #[command(subcommand)]
    pub action: PrefsCommand,
}

#[derive(Subcommand, Debug, Clone)]
pub enum PrefsCommand {
    #[command(about = "List stored preferences")]
    List {
        #[arg(short = 'f', long, value_enum, default_value = "human")]
        format: OutputFormatArg,
    },

    #[command(about = "Add a preference by hand")]
    Add {
        #[arg(value_name = "TEXT", required = true)]
        text: Vec<String>,
    },

    #[command(about = "Delete a preference by id")]
    Delete {
        #[arg(value_name = "ID")]
        id: String,
    },

    #[command(about = "Check that the preferences file is readable")]
    Check {
        #[arg(short = 'f', long, value_enum, default_value = "human")]
        format: OutputFormatArg,

        #[arg(long, help = "Append a numbered test preference after checking")]
        add_test: bool,
    },
}

#[derive(Args, Debug, Clone)]
pub struct TranscribeArgs {
    #[arg(value_name = "FILE")]
    pub file: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct SpeakArgs {
    #[arg(value_name = "TEXT", required = true)]
    pub text: Vec<String>,

    #[arg(short = 'o', long, value_name = "FILE", help = "Where to write the MP3")]
    pub output: PathBuf,

    #[arg(long, value_name = "NAME", help = "Voice to use")]
    pub voice: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    #[arg(short = 'f', long, value_enum, default_value = "human")]
    pub format: OutputFormatArg,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormatArg {
    Json,
    Human,
}

impl From<OutputFormatArg> for super::output::OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Json => super::output::OutputFormat::Json,
            OutputFormatArg::Human => super::output::OutputFormat::Human,
        }
    }
}

fn parse_adapter_kind(s: &str) -> Result<AdapterKind, String> {
    parse_provider(s).map_err(|e| e.to_string())
}
