//! Text recognition for rendered pages.

use tokio::process::Command;

use crate::{
    command::{StderrPolicy, check_for_command_failure},
    prelude::*,
    rasterize::PageImage,
};

/// Tesseract language models used by default: Thai first, with English as a
/// fallback so romanized Pali terms come through intact.
pub const DEFAULT_OCR_LANGUAGES: &str = "tha+eng";

/// Interface to an OCR engine.
#[async_trait]
pub trait TextExtractor: Send + Sync + 'static {
    /// Recognize the text in a rendered page.
    async fn extract(&self, image: &PageImage) -> Result<String>;
}

/// OCR a page, degrading to an empty string if the engine fails.
///
/// One unreadable page shouldn't cost us the rest of a 300-page book, so
/// failures are logged and then treated like a blank page.
pub async fn extract_or_empty(extractor: &dyn TextExtractor, image: &PageImage) -> String {
    match extractor.extract(image).await {
        Ok(text) => text.trim().to_owned(),
        Err(err) => {
            warn!(page = image.page_idx + 1, "OCR failed: {:?}", err);
            String::new()
        }
    }
}

/// OCR engine wrapping the `tesseract` CLI tool.
#[derive(Debug, Clone)]
pub struct TesseractExtractor {
    /// Languages to pass to `tesseract -l`, like `tha+eng`.
    languages: String,
}

impl TesseractExtractor {
    /// Create a new `tesseract` engine.
    pub fn new(languages: impl Into<String>) -> Self {
        Self {
            languages: languages.into(),
        }
    }
}

#[async_trait]
impl TextExtractor for TesseractExtractor {
    #[instrument(level = "debug", skip_all, fields(page = image.page_idx + 1, languages = %self.languages))]
    async fn extract(&self, image: &PageImage) -> Result<String> {
        // Tesseract wants files, so give it some.
        let tmpdir = tempfile::TempDir::with_prefix("tesseract")?;
        let input_path = tmpdir.path().join("input.png");
        let output_base = tmpdir.path().join("output");
        tokio::fs::write(&input_path, &image.png)
            .await
            .context("cannot write tesseract input file")?;

        // Tesseract appends `.txt` to the output base itself.
        let output = Command::new("tesseract")
            .arg(&input_path)
            .arg(&output_base)
            .arg("-l")
            .arg(&self.languages)
            .output()
            .await
            .context("cannot run tesseract")?;
        // Tesseract reports progress on stderr for every page.
        check_for_command_failure("tesseract", &output, StderrPolicy::Chatter)?;

        tokio::fs::read_to_string(output_base.with_extension("txt"))
            .await
            .context("cannot read tesseract output file")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedExtractor(Result<&'static str, &'static str>);

    #[async_trait]
    impl TextExtractor for FixedExtractor {
        async fn extract(&self, _image: &PageImage) -> Result<String> {
            self.0.map(str::to_owned).map_err(|msg| anyhow!(msg))
        }
    }

    fn page() -> PageImage {
        PageImage {
            page_idx: 0,
            png: vec![],
        }
    }

    #[tokio::test]
    async fn trims_recognized_text() {
        let extractor = FixedExtractor(Ok("\n  จิต citta  \n\n"));
        assert_eq!(extract_or_empty(&extractor, &page()).await, "จิต citta");
    }

    #[tokio::test]
    async fn engine_failure_becomes_empty_text() {
        let extractor = FixedExtractor(Err("tesseract exploded"));
        assert_eq!(extract_or_empty(&extractor, &page()).await, "");
    }
}
