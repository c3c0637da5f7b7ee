//! Google Translate, via the public `translate_a/single` endpoint.
//!
//! This is the same endpoint the translate.google.com web client uses. It
//! needs no API key, but it throttles heavy users with 429s and the odd 503,
//! so requests are retried with exponential backoff.

use std::{env, sync::Mutex, time::Duration};

use keen_retry::{ExponentialJitter, ResolvedResult};
use serde_json::Value;

use super::{TranslationOpts, Translator};
use crate::{
    prelude::*,
    retry::{ServiceRetryResult, retry_result_ok, try_fatal, try_potentially_transient},
};

/// Where to send requests unless `TRANSLATE_API_BASE` says otherwise.
const DEFAULT_API_BASE: &str = "https://translate.googleapis.com";

/// Translator backed by Google Translate.
#[derive(Debug)]
pub struct GoogleTranslator {
    client: reqwest::Client,
    url: String,
    source_language: String,
    target_language: String,
}

impl GoogleTranslator {
    /// Create a new translator.
    pub fn new(opts: &TranslationOpts) -> Result<Self> {
        let api_base =
            env::var("TRANSLATE_API_BASE").unwrap_or_else(|_| DEFAULT_API_BASE.to_owned());
        let mut builder = reqwest::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")));
        if let Some(timeout) = opts.timeout {
            builder = builder.timeout(Duration::from_secs(timeout));
        }
        let client = builder.build().context("failed to create HTTP client")?;
        Ok(Self {
            client,
            url: format!("{}/translate_a/single", api_base.trim_end_matches('/')),
            source_language: opts.source_language.clone(),
            target_language: opts.target_language.clone(),
        })
    }

    /// Make a single translation request.
    #[instrument(level = "debug", skip_all, fields(attempt_number = %*attempt_number.lock().expect("lock poisoned")))]
    async fn translate_once(
        &self,
        attempt_number: &Mutex<u64>,
        text: &str,
    ) -> ServiceRetryResult<String> {
        *attempt_number.lock().expect("lock poisoned") += 1;

        // Send the text in the body, because a few thousand Thai characters
        // percent-encode to far more than any server will take in a URL.
        let response = try_potentially_transient!(
            self.client
                .post(&self.url)
                .query(&[
                    ("client", "gtx"),
                    ("sl", self.source_language.as_str()),
                    ("tl", self.target_language.as_str()),
                    ("dt", "t"),
                ])
                .form(&[("q", text)])
                .send()
                .await
        );
        let response = try_potentially_transient!(response.error_for_status());
        let body = try_potentially_transient!(response.text().await);
        trace!(%body, "Translation response");
        let translated = try_fatal!(parse_translation_response(&body));
        retry_result_ok(translated)
    }
}

#[async_trait]
impl Translator for GoogleTranslator {
    #[instrument(level = "debug", skip_all, fields(len = text.len()))]
    async fn translate(&self, text: &str) -> Result<String> {
        let jitter = ExponentialJitter::FromBackoffRange {
            backoff_range_millis: 250..=10_000,
            re_attempts: 4,
            jitter_ratio: 0.2,
        };

        let attempt_number = Mutex::new(0);
        let result = self
            .translate_once(&attempt_number, text)
            .await
            .retry_with_async(|_| async { self.translate_once(&attempt_number, text).await })
            .with_exponential_jitter(|| jitter)
            .await
            .inspect_recovered(|_, _, retry_errors_list| {
                warn!(
                    "translation succeeded after retrying {} times (failed attempts: [{}])",
                    retry_errors_list.len(),
                    keen_retry::loggable_retry_errors(retry_errors_list)
                )
            })
            .inspect_given_up(|_, retry_errors_list, fatal_error| {
                error!(
                    "translation FAILED after exhausting all {} retrying attempts with error {fatal_error:?}. Previous transient failures: [{}]",
                    retry_errors_list.len(),
                    keen_retry::loggable_retry_errors(retry_errors_list)
                )
            });

        match result {
            ResolvedResult::Ok { output, .. } | ResolvedResult::Recovered { output, .. } => {
                Ok(output)
            }
            ResolvedResult::Fatal { error, .. } => Err(error),
            ResolvedResult::GivenUp { fatal_error, .. }
            | ResolvedResult::Unrecoverable { fatal_error, .. } => Err(fatal_error),
        }
    }
}

/// Extract the translated text from a response.
///
/// The response is an array whose first element holds one
/// `[translated, original, ...]` array per sentence. Everything else is
/// metadata we don't need.
fn parse_translation_response(body: &str) -> Result<String> {
    let value = serde_json::from_str::<Value>(body)
        .with_context(|| format!("translation response was not JSON: {:?}", body))?;
    let sentences = match value.get(0) {
        Some(Value::Array(sentences)) => sentences,
        // Nothing to translate, nothing returned.
        Some(Value::Null) => return Ok(String::new()),
        _ => return Err(anyhow!("unexpected translation response: {}", value)),
    };
    let mut translated = String::new();
    for sentence in sentences {
        match sentence.get(0) {
            Some(Value::String(text)) => translated.push_str(text),
            Some(Value::Null) => {}
            _ => return Err(anyhow!("unexpected sentence in translation response: {}", sentence)),
        }
    }
    Ok(translated)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_translated_sentences() {
        let body = r#"[[["Hello. ","สวัสดี",null,null,10],["The mind arises.","จิตเกิดขึ้น",null,null,3]],null,"th",null,null,null,1]"#;
        assert_eq!(
            parse_translation_response(body).unwrap(),
            "Hello. The mind arises."
        );
    }

    #[test]
    fn empty_response_is_empty_text() {
        assert_eq!(parse_translation_response(r#"[null,null,"th"]"#).unwrap(), "");
    }

    #[test]
    fn rejects_malformed_responses() {
        assert!(parse_translation_response("<html>rate limited</html>").is_err());
        assert!(parse_translation_response(r#"{"error": "nope"}"#).is_err());
        assert!(parse_translation_response(r#"[[[42]]]"#).is_err());
    }

    #[tokio::test]
    #[ignore = "Needs network access"]
    async fn translates_thai_to_english() -> Result<()> {
        let translator = GoogleTranslator::new(&TranslationOpts {
            chunk_size: 4500,
            source_language: "th".to_owned(),
            target_language: "en".to_owned(),
            timeout: Some(30),
        })?;
        let english = translator.translate("สวัสดี").await?;
        assert!(!english.trim().is_empty());
        Ok(())
    }
}
