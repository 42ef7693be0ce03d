//! Reading answers aloud.

use std::io;
use std::process::Stdio;
use std::sync::Mutex;

use tokio::process::{Child, Command};
use tracing::{debug, warn};

use crate::core::conversation::Language;

pub const DEFAULT_SPEECH_COMMAND: &str = "espeak-ng";

pub trait SpeechPort: Send + Sync {
    fn speak(&self, text: &str, language: Language) -> io::Result<()>;
    fn stop(&self);
}

/// Pipes text into an external synthesizer (`espeak-ng` by default).
///
/// Only one utterance plays at a time; speaking again stops the previous one.
pub struct CommandSpeech {
    program: String,
    child: Mutex<Option<Child>>,
}

impl CommandSpeech {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            child: Mutex::new(None),
        }
    }

    fn args(language: Language) -> Vec<String> {
        // Slightly slower than the default rate, like a careful reader.
        vec![
            "-v".to_string(),
            language.as_str().to_string(),
            "-s".to_string(),
            "140".to_string(),
            "--stdin".to_string(),
        ]
    }

    /// Waits for the current utterance, if any, to end.
    pub async fn wait(&self) -> io::Result<()> {
        let child = self.child.lock().ok().and_then(|mut guard| guard.take());
        if let Some(mut child) = child {
            child.wait().await?;
        }
        Ok(())
    }
}

impl SpeechPort for CommandSpeech {
    fn speak(&self, text: &str, language: Language) -> io::Result<()> {
        self.stop();
        debug!(program = %self.program, lang = language.speech_tag(), "speaking answer");
        let mut child = Command::new(&self.program)
            .args(Self::args(language))
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()?;

        if let Some(mut stdin) = child.stdin.take() {
            let text = text.to_string();
            tokio::spawn(async move {
                use tokio::io::AsyncWriteExt;
                if let Err(err) = stdin.write_all(text.as_bytes()).await {
                    warn!(error = %err, "failed to feed speech synthesizer");
                }
            });
        }
        if let Ok(mut guard) = self.child.lock() {
            *guard = Some(child);
        }
        Ok(())
    }

    fn stop(&self) {
        if let Ok(mut guard) = self.child.lock() {
            if let Some(mut child) = guard.take() {
                if let Err(err) = child.start_kill() {
                    debug!(error = %err, "speech process already gone");
                }
            }
        }
    }
}

/// Discards speech; records what would have been said.
#[derive(Debug, Default)]
pub struct SilentSpeech {
    spoken: Mutex<Vec<(String, Language)>>,
}

impl SilentSpeech {
    pub fn spoken(&self) -> Vec<(String, Language)> {
        self.spoken
            .lock()
            .map(|spoken| spoken.clone())
            .unwrap_or_default()
    }
}

impl SpeechPort for SilentSpeech {
    fn speak(&self, text: &str, language: Language) -> io::Result<()> {
        if let Ok(mut spoken) = self.spoken.lock() {
            spoken.push((text.to_string(), language));
        }
        Ok(())
    }

    fn stop(&self) {}
}
