use companion::cli::handlers::{
    handle_ask, handle_chat, handle_config, handle_prefs, handle_speak, handle_story,
    handle_transcribe, resolve_config,
};
use companion::cli::{CliArgs, Commands};
use companion::{init_logging, LoggingConfig, NAME, VERSION};

use clap::Parser;
use std::process;
use tracing::debug;

#[tokio::main]
async fn main() {
    let args = CliArgs::parse();
    init_logging(LoggingConfig::from_cli(
        args.log_level.as_deref(),
        args.verbose,
        args.quiet,
    ));

    debug!("{} v{} starting", NAME, VERSION);
    debug!("Arguments: {:?}", args);

    let config = resolve_config(&args);

    let exit_code = match &args.command {
        Commands::Chat(chat_args) => handle_chat(chat_args, &config).await,
        Commands::Ask(ask_args) => handle_ask(ask_args, &config).await,
        Commands::Prefs(prefs_args) => handle_prefs(prefs_args, &config),
        Commands::Story => handle_story(),
        Commands::Transcribe(transcribe_args) => handle_transcribe(transcribe_args, &config).await,
        Commands::Speak(speak_args) => handle_speak(speak_args, &config).await,
        Commands::Config(config_args) => handle_config(config_args, &config),
    };

    process::exit(exit_code);
}
