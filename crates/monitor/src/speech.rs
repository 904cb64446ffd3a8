//! Speech capture ports available to the service

use std::io::BufRead;
use std::sync::Mutex;

use tracing::info;

use sobriety::{CaptureTimings, SpeechCapture, SpeechError};

/// Operator types what the driver said; an empty line is unintelligible
///
/// The read cannot be interrupted, so an abandoned capture keeps its
/// blocking thread until the next line arrives.
#[derive(Debug, Default)]
pub struct ConsoleTranscriber {
    stdin: Mutex<()>,
}

impl SpeechCapture for ConsoleTranscriber {
    fn capture(&self, timings: &CaptureTimings) -> Result<String, SpeechError> {
        let _guard = self
            .stdin
            .lock()
            .map_err(|_| SpeechError::Device("console capture poisoned".to_string()))?;
        info!(
            "Type the spoken phrase (listening up to {:?})",
            timings.listen_timeout + timings.phrase_limit
        );

        let mut line = String::new();
        let read = std::io::stdin()
            .lock()
            .read_line(&mut line)
            .map_err(|e| SpeechError::Device(e.to_string()))?;
        if read == 0 {
            return Err(SpeechError::Device("console closed".to_string()));
        }
        transcription(&line)
    }
}

/// Speech port that always answers with the same text; handy for demos
#[derive(Debug, Clone)]
pub struct FixedTranscriber(pub String);

impl SpeechCapture for FixedTranscriber {
    fn capture(&self, _timings: &CaptureTimings) -> Result<String, SpeechError> {
        transcription(&self.0)
    }
}

fn transcription(text: &str) -> Result<String, SpeechError> {
    let text = text.trim();
    if text.is_empty() {
        Err(SpeechError::Unintelligible)
    } else {
        Ok(text.to_string())
    }
}
