//! Romanization of broadcast text.
//!
//! Broadcasts only survive in single-byte characters, so Japanese names are
//! read with `mecab` and transliterated with `uconv -x latin` before sending.

use std::io;
use std::process::Stdio;

use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::error;

/// Text-to-ASCII transform. Must return the input unchanged on failure.
#[allow(async_fn_in_trait)]
pub trait Romanizer {
    async fn romanize(&self, text: &str) -> String;
}

/// Pipes text through `mecab` and then `uconv -x latin`.
#[derive(Debug, Clone)]
pub struct ShellRomanizer {
    mecab: String,
    uconv: String,
}

impl Default for ShellRomanizer {
    fn default() -> Self {
        Self {
            mecab: "mecab".to_string(),
            uconv: "uconv".to_string(),
        }
    }
}

impl ShellRomanizer {
    /// Use other executables, e.g. absolute paths.
    pub fn with_programs(mecab: impl Into<String>, uconv: impl Into<String>) -> Self {
        Self {
            mecab: mecab.into(),
            uconv: uconv.into(),
        }
    }

    async fn reading(&self, text: &str) -> String {
        match run_filter(&self.mecab, &[], text).await {
            Ok(output) => reading_from_mecab(&output),
            Err(e) => {
                error!(error = %e, "failed to run mecab");
                text.to_string()
            }
        }
    }

    async fn latin(&self, text: &str) -> String {
        match run_filter(&self.uconv, &["-x", "latin"], text).await {
            Ok(output) => output,
            Err(e) => {
                error!(error = %e, "failed to run uconv");
                text.to_string()
            }
        }
    }
}

impl Romanizer for ShellRomanizer {
    async fn romanize(&self, text: &str) -> String {
        let reading = self.reading(text).await;
        self.latin(&reading).await
    }
}

/// Run `program` with `input` on stdin and return its stdout.
async fn run_filter(program: &str, args: &[&str], input: &str) -> io::Result<String> {
    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit())
        .kill_on_drop(true)
        .spawn()?;

    if let Some(mut stdin) = child.stdin.take() {
        stdin.write_all(input.as_bytes()).await?;
    }

    let output = child.wait_with_output().await?;
    if !output.status.success() {
        return Err(io::Error::other(format!(
            "{} exited with {}",
            program, output.status
        )));
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Rebuild text from mecab output, replacing each token by its reading.
///
/// Tokens without a reading (unknown words, latin text) keep their surface
/// form. Readings are katakana and get converted to hiragana.
pub fn reading_from_mecab(output: &str) -> String {
    let mut reading = String::new();

    for line in output.lines() {
        if line.is_empty() {
            continue;
        }

        let mut parts = line.split('\t').filter(|p| !p.is_empty());
        let (Some(surface), Some(features)) = (parts.next(), parts.next()) else {
            continue;
        };

        match features.split(',').nth(7) {
            Some(kana) if !kana.is_empty() && kana != "*" => {
                reading.push_str(&katakana_to_hiragana(kana));
            }
            _ => reading.push_str(surface),
        }
    }

    reading
}

/// Map katakana ァ..ン onto hiragana ぁ..ん; everything else is kept.
pub fn katakana_to_hiragana(text: &str) -> String {
    const OFFSET: u32 = 0x30A1 - 0x3041;
    text.chars()
        .map(|c| match c {
            '\u{30A1}'..='\u{30F3}' => char::from_u32(c as u32 - OFFSET).unwrap_or(c),
            _ => c,
        })
        .collect()
}
