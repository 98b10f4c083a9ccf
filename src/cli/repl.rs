//! Interactive chat sessions
//!
//! Reads one line at a time. Lines starting with `/` are session commands;
//! everything else is a message for the companion.

use anyhow::Result;
use std::io::Write;
use std::path::PathBuf;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, warn};

use super::output::format_preference_line;
use crate::companion::Companion;
use crate::speech::SpeechClient;

const HELP: &str = "Commands:
  /help           show this help
  /prefs          list what I've learned about you
  /add TEXT       save a preference yourself
  /forget ID      delete a preference
  /story          get a story prompt
  /listen FILE    transcribe an audio file and send it as your message
  /clear          forget this conversation (preferences are kept)
  /quit           end the session";

/// Which conversation a session runs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatMode {
    /// "Tell me about you": stories in, preferences out
    Elicitation { user_id: String },
    /// "Ask me anything": preferences in, personalized answers out
    Inference,
}

/// A parsed input line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    Empty,
    Help,
    Quit,
    Clear,
    Prefs,
    Story,
    Add(String),
    Forget(String),
    Listen(PathBuf),
    Message(String),
    Unknown(String),
}

pub fn parse_line(line: &str) -> ReplCommand {
    let line = line.trim();
    if line.is_empty() {
        return ReplCommand::Empty;
    }
    let Some(command) = line.strip_prefix('/') else {
        return ReplCommand::Message(line.to_string());
    };

    let (name, rest) = match command.split_once(char::is_whitespace) {
        Some((name, rest)) => (name, rest.trim()),
        None => (command, ""),
    };

    match (name.to_lowercase().as_str(), rest.is_empty()) {
        ("help" | "?", _) => ReplCommand::Help,
        ("quit" | "exit", _) => ReplCommand::Quit,
        ("clear", _) => ReplCommand::Clear,
        ("prefs", _) => ReplCommand::Prefs,
        ("story", _) => ReplCommand::Story,
        ("add", false) => ReplCommand::Add(rest.to_string()),
        ("forget", false) => ReplCommand::Forget(rest.to_string()),
        ("listen", false) => ReplCommand::Listen(PathBuf::from(rest)),
        _ => ReplCommand::Unknown(line.to_string()),
    }
}

/// Spoken replies: each reply is written to its own MP3 file
#[derive(Debug, Clone)]
pub struct VoiceReplies {
    pub voice: String,
    pub audio_dir: PathBuf,
    spoken: usize,
}

impl VoiceReplies {
    pub fn new(voice: impl Into<String>, audio_dir: impl Into<PathBuf>) -> Self {
        Self {
            voice: voice.into(),
            audio_dir: audio_dir.into(),
            spoken: 0,
        }
    }

    fn next_path(&mut self) -> PathBuf {
        self.spoken += 1;
        self.audio_dir
            .join(format!("reply-{}-{:03}.mp3", std::process::id(), self.spoken))
    }
}

/// What happened during a session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionSummary {
    pub turns: usize,
    pub preferences_learned: usize,
}

pub struct Session<'a> {
    companion: &'a mut Companion,
    mode: ChatMode,
    speech: Option<&'a SpeechClient>,
    voice: Option<VoiceReplies>,
}

impl<'a> Session<'a> {
    pub fn new(companion: &'a mut Companion, mode: ChatMode) -> Self {
        Self {
            companion,
            mode,
            speech: None,
            voice: None,
        }
    }

    /// Enables `/listen`, and spoken replies when `voice` is given
    pub fn with_speech(mut self, speech: &'a SpeechClient, voice: Option<VoiceReplies>) -> Self {
        self.speech = Some(speech);
        self.voice = voice;
        self
    }

    pub async fn run<R, W>(&mut self, input: R, out: &mut W) -> Result<SessionSummary>
    where
        R: AsyncBufRead + Unpin,
        W: Write,
    {
        let starting_count = self.companion.store().len();
        let mut summary = SessionSummary::default();

        self.greet(out)?;

        let mut lines = input.lines();
        loop {
            write!(out, "you> ")?;
            out.flush()?;

            let Some(line) = lines.next_line().await? else {
                writeln!(out)?;
                break;
            };

            match parse_line(&line) {
                ReplCommand::Empty => {}
                ReplCommand::Quit => break,
                ReplCommand::Help => writeln!(out, "{}", HELP)?,
                ReplCommand::Clear => self.clear(out)?,
                ReplCommand::Prefs => self.list_preferences(out)?,
                ReplCommand::Story => {
                    writeln!(out, "companion> {}", self.companion.story_prompt())?
                }
                ReplCommand::Add(text) => match self.companion.add_manual(&text) {
                    Ok(Some(pref)) => writeln!(out, "  saved: {}", format_preference_line(&pref))?,
                    Ok(None) => writeln!(out, "  That's too short to save as a preference.")?,
                    Err(e) => writeln!(out, "  Could not save preference: {}", e)?,
                },
                ReplCommand::Forget(id) => match self.companion.delete_preference(&id) {
                    Ok(true) => writeln!(out, "  Forgot preference {}", id)?,
                    Ok(false) => writeln!(out, "  No preference with id {}", id)?,
                    Err(e) => writeln!(out, "  Could not delete preference: {}", e)?,
                },
                ReplCommand::Listen(path) => {
                    if let Some(text) = self.transcribe(&path, out).await? {
                        writeln!(out, "you (transcribed)> {}", text)?;
                        self.respond(&text, out).await?;
                        summary.turns += 1;
                    }
                }
                ReplCommand::Message(text) => {
                    self.respond(&text, out).await?;
                    summary.turns += 1;
                }
                ReplCommand::Unknown(raw) => {
                    writeln!(out, "  Unknown command {}. Type /help for a list.", raw)?
                }
            }
        }

        summary.preferences_learned = self
            .companion
            .store()
            .len()
            .saturating_sub(starting_count);
        writeln!(
            out,
            "Goodbye! I learned {} new {} this session.",
            summary.preferences_learned,
            if summary.preferences_learned == 1 {
                "preference"
            } else {
                "preferences"
            }
        )?;

        debug!("Session ended: {:?}", summary);
        Ok(summary)
    }

    fn greet<W: Write>(&mut self, out: &mut W) -> Result<()> {
        match &self.mode {
            ChatMode::Elicitation { .. } => {
                writeln!(
                    out,
                    "Let's chat! I'd love to hear your stories and experiences. Type /help for commands."
                )?;
                writeln!(out, "companion> {}", self.companion.story_prompt())?;
            }
            ChatMode::Inference => {
                writeln!(
                    out,
                    "Ask me anything. I'll use what I've learned about you ({} preferences). Type /help for commands.",
                    self.companion.store().len()
                )?;
            }
        }
        Ok(())
    }

    fn clear<W: Write>(&mut self, out: &mut W) -> Result<()> {
        if let ChatMode::Elicitation { user_id } = &self.mode {
            self.companion.clear_conversation(user_id);
        }
        writeln!(out, "  Conversation cleared.")?;
        Ok(())
    }

    fn list_preferences<W: Write>(&self, out: &mut W) -> Result<()> {
        let preferences = self.companion.preferences();
        if preferences.is_empty() {
            writeln!(out, "  I haven't learned any preferences yet. Let's chat more!")?;
            return Ok(());
        }
        for pref in preferences {
            writeln!(out, "  {}", format_preference_line(pref))?;
        }
        Ok(())
    }

    async fn transcribe<W: Write>(
        &self,
        path: &std::path::Path,
        out: &mut W,
    ) -> Result<Option<String>> {
        let Some(speech) = self.speech else {
            writeln!(out, "  Voice input is not available in this session.")?;
            return Ok(None);
        };

        match speech.transcribe(path).await {
            Ok(text) if text.trim().is_empty() => {
                writeln!(out, "  I couldn't hear anything in {}.", path.display())?;
                Ok(None)
            }
            Ok(text) => Ok(Some(text.trim().to_string())),
            Err(e) => {
                warn!("Transcription failed: {}", e);
                writeln!(out, "  Could not transcribe {}: {}", path.display(), e)?;
                Ok(None)
            }
        }
    }

    async fn respond<W: Write>(&mut self, text: &str, out: &mut W) -> Result<()> {
        let reply = match &self.mode {
            ChatMode::Elicitation { user_id } => {
                match self.companion.process_message(user_id, text).await {
                    Ok(turn) => {
                        writeln!(out, "companion> {}", turn.reply)?;
                        if let Some(detected) = &turn.detected {
                            writeln!(out, "  (noted: {})", detected)?;
                        }
                        Some(turn.reply)
                    }
                    Err(e) => {
                        warn!("Elicitation turn failed: {}", e);
                        writeln!(out, "  Sorry, I couldn't respond just now: {}", e)?;
                        None
                    }
                }
            }
            ChatMode::Inference => match self.companion.process_inference_message(text).await {
                Ok(answer) => {
                    writeln!(out, "companion> {}", answer)?;
                    Some(answer)
                }
                Err(e) => {
                    warn!("Inference turn failed: {}", e);
                    writeln!(out, "  Sorry, I couldn't respond just now: {}", e)?;
                    None
                }
            },
        };

        if let Some(reply) = reply {
            self.speak(&reply, out).await?;
        }
        Ok(())
    }

    async fn speak<W: Write>(&mut self, reply: &str, out: &mut W) -> Result<()> {
        let (Some(speech), Some(voice)) = (self.speech, self.voice.as_mut()) else {
            return Ok(());
        };

        let path = voice.next_path();
        match speech.synthesize_to_file(reply, &voice.voice, &path).await {
            Ok(()) => writeln!(out, "  (audio: {})", path.display())?,
            Err(e) => {
                warn!("Speech synthesis failed: {}", e);
                writeln!(out, "  (could not speak reply: {})", e)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{BackendError, MockLLMClient, MockResponse};
    use crate::preferences::PreferenceStore;
    use std::sync::Arc;
    use std::time::Duration;
    use tempfile::TempDir;

    fn companion(dir: &TempDir, mock: Arc<MockLLMClient>) -> Companion {
        let store = PreferenceStore::open(dir.path().join("preferences.json")).unwrap();
        Companion::new(mock, store)
    }

    async fn run(companion: &mut Companion, mode: ChatMode, input: &str) -> (SessionSummary, String) {
        let mut out = Vec::new();
        let summary = Session::new(companion, mode)
            .run(input.as_bytes(), &mut out)
            .await
            .unwrap();
        (summary, String::from_utf8(out).unwrap())
    }

    fn elicitation() -> ChatMode {
        ChatMode::Elicitation {
            user_id: "user1".to_string(),
        }
    }

    #[test]
    fn test_parse_line() {
        assert_eq!(parse_line("   "), ReplCommand::Empty);
        assert_eq!(parse_line("/quit"), ReplCommand::Quit);
        assert_eq!(parse_line("/EXIT"), ReplCommand::Quit);
        assert_eq!(parse_line("/help"), ReplCommand::Help);
        assert_eq!(
            parse_line("/add  spicy food "),
            ReplCommand::Add("spicy food".to_string())
        );
        assert_eq!(parse_line("/forget abc-123"), ReplCommand::Forget("abc-123".to_string()));
        assert_eq!(
            parse_line("/listen clip.mp3"),
            ReplCommand::Listen(PathBuf::from("clip.mp3"))
        );
        assert_eq!(parse_line("/add"), ReplCommand::Unknown("/add".to_string()));
        assert_eq!(parse_line("/dance"), ReplCommand::Unknown("/dance".to_string()));
        assert_eq!(
            parse_line(" I love the sea "),
            ReplCommand::Message("I love the sea".to_string())
        );
    }

    #[tokio::test]
    async fn test_elicitation_session() {
        let dir = TempDir::new().unwrap();
        let mock = Arc::new(MockLLMClient::new());
        mock.add_responses(vec![
            MockResponse::text("PREFERENCE: Loves the sea"),
            MockResponse::text("The sea is lovely. Did you grow up near it?"),
        ]);
        let mut companion = companion(&dir, mock);

        let (summary, output) = run(
            &mut companion,
            elicitation(),
            "I love the sea and its sounds\n/prefs\n/quit\n",
        )
        .await;

        assert_eq!(summary.turns, 1);
        assert_eq!(summary.preferences_learned, 2);
        assert!(output.contains("companion> The sea is lovely."));
        assert!(output.contains("(noted: Loves the sea)"));
        assert!(output.contains("📝 the sea and its sounds"));
        assert!(output.contains("I learned 2 new preferences"));
    }

    #[tokio::test]
    async fn test_failed_reply_keeps_session_alive() {
        let dir = TempDir::new().unwrap();
        let mock = Arc::new(MockLLMClient::new());
        mock.add_responses(vec![
            MockResponse::text("PREFERENCE: NONE"),
            MockResponse::error(BackendError::TimeoutError { seconds: 60 }),
            MockResponse::text("PREFERENCE: NONE"),
            MockResponse::text("Welcome back!"),
        ]);
        let mut companion = companion(&dir, mock);

        let (summary, output) = run(&mut companion, elicitation(), "hello\nhello again\n").await;

        assert_eq!(summary.turns, 2);
        assert!(output.contains("Sorry, I couldn't respond just now"));
        assert!(output.contains("companion> Welcome back!"));
    }

    #[tokio::test]
    async fn test_manual_commands() {
        let dir = TempDir::new().unwrap();
        let mut companion = companion(&dir, Arc::new(MockLLMClient::new()));

        let (summary, output) = run(
            &mut companion,
            ChatMode::Inference,
            "/add early morning runs\n/add ok\n/forget missing-id\n/listen clip.mp3\n/dance\n",
        )
        .await;

        assert_eq!(summary.turns, 0);
        assert_eq!(summary.preferences_learned, 1);
        assert!(output.contains("saved: ✍️ early morning runs"));
        assert!(output.contains("too short"));
        assert!(output.contains("No preference with id missing-id"));
        assert!(output.contains("Voice input is not available"));
        assert!(output.contains("Unknown command /dance"));
    }

    #[tokio::test]
    async fn test_inference_session() {
        let dir = TempDir::new().unwrap();
        let mock = Arc::new(MockLLMClient::new());
        mock.add_responses(vec![
            MockResponse::text("PREFERENCE: NONE"),
            MockResponse::text("Since you like mountains, try the Dolomites."),
        ]);
        let mut companion = companion(&dir, mock);
        companion.add_manual("mountains over beaches").unwrap();

        let (summary, output) = run(
            &mut companion,
            ChatMode::Inference,
            "Where should we travel?\n",
        )
        .await;

        assert_eq!(summary.turns, 1);
        assert!(output.contains("(1 preferences)"));
        assert!(output.contains("companion> Since you like mountains"));
    }

    #[tokio::test]
    async fn test_clear_resets_history() {
        let dir = TempDir::new().unwrap();
        let mock = Arc::new(MockLLMClient::new());
        mock.add_responses(vec![
            MockResponse::text("PREFERENCE: NONE"),
            MockResponse::text("Nice."),
        ]);
        let mut companion = companion(&dir, mock);

        run(&mut companion, elicitation(), "we went camping\n/clear\n").await;

        assert!(companion.history("user1").is_empty());
    }

    #[tokio::test]
    async fn test_voice_without_key_reports_and_continues() {
        let dir = TempDir::new().unwrap();
        let mock = Arc::new(MockLLMClient::new());
        mock.add_responses(vec![
            MockResponse::text("PREFERENCE: NONE"),
            MockResponse::text("Sounds fun!"),
        ]);
        let mut companion = companion(&dir, mock);
        let speech = SpeechClient::new("http://127.0.0.1:9", None, Duration::from_secs(1));

        let mut out = Vec::new();
        Session::new(&mut companion, elicitation())
            .with_speech(&speech, Some(VoiceReplies::new("nova", dir.path().join("audio"))))
            .run("we went camping\n".as_bytes(), &mut out)
            .await
            .unwrap();

        let output = String::from_utf8(out).unwrap();
        assert!(output.contains("companion> Sounds fun!"));
        assert!(output.contains("could not speak reply"));
    }
}
