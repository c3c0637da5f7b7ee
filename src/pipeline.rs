//! Render, OCR, spot terms, and translate, one page at a time.

use std::{collections::BTreeSet, fmt, sync::Arc};

use crate::{
    ocr::{TextExtractor, extract_or_empty},
    prelude::*,
    rasterize::{PageSource, Rasterizer},
    translate::{Translator, translate_text},
    ui::{ProgressConfig, Ui},
    vocabulary::Vocabulary,
};

/// Everything we learned about one page.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq, Serialize)]
pub struct PageRecord {
    /// 1-based page number.
    pub page: usize,

    /// Text recognized by OCR. Empty if nothing could be read.
    pub thai_text: String,

    /// The English translation, or a `[Translation failed...]` marker.
    pub english_text: String,

    /// Pali terms spotted on this page.
    pub pali_terms: Vec<String>,
}

impl PageRecord {
    /// A page on which OCR found nothing.
    fn blank(page: usize) -> Self {
        Self {
            page,
            ..Self::default()
        }
    }
}

/// The result of processing one document.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq, Serialize)]
pub struct DocumentResult {
    /// File name of the source PDF.
    pub source_file: String,

    /// Number of pages in the PDF.
    pub total_pages: usize,

    /// Number of pages we actually processed.
    pub processed_pages: usize,

    /// One record per processed page, in order.
    pub pages: Vec<PageRecord>,

    /// Every Pali term found in the document, sorted.
    pub all_pali_terms: Vec<String>,
}

/// A document which could not be opened at all.
#[derive(Clone, Debug)]
pub struct OpenFailure {
    /// File name of the source PDF.
    pub source_file: String,

    /// What went wrong.
    pub error: String,
}

impl fmt::Display for OpenFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "could not open {}: {}", self.source_file, self.error)
    }
}

impl std::error::Error for OpenFailure {}

/// The external services a [`Pipeline`] drives.
pub struct Pipeline {
    rasterizer: Arc<dyn Rasterizer>,
    extractor: Arc<dyn TextExtractor>,
    translator: Arc<dyn Translator>,
    vocabulary: &'static Vocabulary,
    max_chunk_size: usize,
    ui: Ui,
}

impl Pipeline {
    /// Create a new pipeline.
    pub fn new(
        rasterizer: Arc<dyn Rasterizer>,
        extractor: Arc<dyn TextExtractor>,
        translator: Arc<dyn Translator>,
        vocabulary: &'static Vocabulary,
        max_chunk_size: usize,
        ui: Ui,
    ) -> Self {
        Self {
            rasterizer,
            extractor,
            translator,
            vocabulary,
            max_chunk_size,
            ui,
        }
    }

    /// Process the first `max_pages` pages of a document, or all of them.
    ///
    /// Only failing to open the document is an error. Pages which can't be
    /// rendered or read come back blank, and failed translations are marked
    /// in the text.
    #[instrument(level = "debug", skip_all, fields(path = %path.display()))]
    pub async fn process(
        &self,
        path: &Path,
        max_pages: Option<usize>,
    ) -> Result<DocumentResult, OpenFailure> {
        let source_file = display_name(path);
        let document = match self.rasterizer.open(path).await {
            Ok(document) => document,
            Err(err) => {
                error!("Error opening PDF: {:?}", err);
                return Err(OpenFailure {
                    source_file,
                    error: format!("{:#}", err),
                });
            }
        };

        let total_pages = document.page_count();
        let pages_to_process = max_pages.map_or(total_pages, |max| max.min(total_pages));
        self.ui.report(&format!(
            "Processing {}: {} of {} pages",
            source_file, pages_to_process, total_pages
        ));

        let pb = self.ui.new_progress_bar(
            &ProgressConfig {
                emoji: "📄",
                msg: "Translating pages",
                done_msg: "Translated pages",
            },
            pages_to_process as u64,
        );

        let mut pages = Vec::with_capacity(pages_to_process);
        let mut all_terms = BTreeSet::new();
        for page_idx in 0..pages_to_process {
            let record = self
                .process_page(document.as_ref(), page_idx, pages_to_process)
                .await;
            all_terms.extend(record.pali_terms.iter().cloned());
            pages.push(record);
            pb.inc(1);
        }
        pb.finish();

        // Release the document (and its scratch files) before we return.
        drop(document);

        Ok(DocumentResult {
            source_file,
            total_pages,
            processed_pages: pages_to_process,
            pages,
            all_pali_terms: all_terms.into_iter().collect(),
        })
    }

    /// Process a single page. This never fails.
    #[instrument(level = "debug", skip(self, document))]
    async fn process_page(
        &self,
        document: &dyn PageSource,
        page_idx: usize,
        page_total: usize,
    ) -> PageRecord {
        let page = page_idx + 1;
        let thai_text = match document.render(page_idx).await {
            Ok(image) => extract_or_empty(self.extractor.as_ref(), &image).await,
            Err(err) => {
                warn!(page, "Could not render page: {:?}", err);
                String::new()
            }
        };

        if thai_text.is_empty() {
            info!(page, "No text extracted");
            self.ui
                .report(&format!("Page {}/{}: no text extracted", page, page_total));
            return PageRecord::blank(page);
        }

        let pali_terms = self.vocabulary.find_terms(&thai_text);
        let english_text =
            translate_text(self.translator.as_ref(), &thai_text, self.max_chunk_size).await;
        let char_count = thai_text.chars().count();
        info!(
            page,
            "Extracted {} chars, found {} Pali terms",
            char_count,
            pali_terms.len()
        );
        self.ui.report(&format!(
            "Page {}/{}: extracted {} chars, found {} Pali terms",
            page,
            page_total,
            char_count,
            pali_terms.len()
        ));
        PageRecord {
            page,
            thai_text,
            english_text,
            pali_terms,
        }
    }
}

/// The file name of `path`, for display and for the output records.
pub fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
