//! Machine translation of recognized text.
//!
//! Translation failures never abort a run. Instead, the failure is written
//! into the output where the translation would have gone, so whoever reads
//! the results can see exactly which pages need another pass.

use clap::Args;

use crate::prelude::*;

pub mod chunks;
pub mod google;

pub use self::chunks::split_into_chunks;

/// Default chunk size, in characters. The free translation endpoint rejects
/// requests of around 5000 characters.
pub const DEFAULT_MAX_CHUNK_SIZE: usize = 4500;

/// Written in place of a chunk which could not be translated.
pub const CHUNK_FAILED_MARKER: &str = "[Translation failed]";

/// Translation options.
#[derive(Args, Clone, Debug)]
pub struct TranslationOpts {
    /// Maximum number of characters to send in one translation request.
    /// Longer text is split between lines.
    #[clap(long, default_value_t = DEFAULT_MAX_CHUNK_SIZE)]
    pub chunk_size: usize,

    /// Language code of the text being translated.
    #[clap(long, default_value = "th")]
    pub source_language: String,

    /// Language code to translate into.
    #[clap(long, default_value = "en")]
    pub target_language: String,

    /// A timeout, in seconds, for each translation request. Requests which
    /// time out are retried.
    #[clap(long)]
    pub timeout: Option<u64>,
}

/// Interface to a translation service.
#[async_trait]
pub trait Translator: Send + Sync + 'static {
    /// Translate a single request's worth of text.
    async fn translate(&self, text: &str) -> Result<String>;
}

/// Translate `text`, splitting it into chunks if it is too long for a single
/// request.
///
/// Chunks are translated one after another, with no context shared between
/// them, and the translations are joined with newlines.
#[instrument(level = "debug", skip_all, fields(len = text.len()))]
pub async fn translate_text(
    translator: &dyn Translator,
    text: &str,
    max_chunk_size: usize,
) -> String {
    if text.trim().is_empty() {
        return String::new();
    }

    if text.chars().count() <= max_chunk_size {
        return match translator.translate(text).await {
            Ok(translated) => translated,
            Err(err) => {
                warn!("Translation failed: {:?}", err);
                format!("[Translation failed: {}]", err)
            }
        };
    }

    let chunks = split_into_chunks(text, max_chunk_size);
    debug!(chunk_count = chunks.len(), "Translating in chunks");
    let mut translated = Vec::with_capacity(chunks.len());
    for (chunk_idx, chunk) in chunks.iter().enumerate() {
        // Runs of blank lines make blank chunks. Don't spend requests on them.
        if chunk.trim().is_empty() {
            translated.push(String::new());
            continue;
        }
        match translator.translate(chunk).await {
            Ok(text) => translated.push(text),
            Err(err) => {
                warn!(chunk_idx, "Translation failed for chunk: {:?}", err);
                translated.push(CHUNK_FAILED_MARKER.to_owned());
            }
        }
    }
    translated.join("\n")
}
