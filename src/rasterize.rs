//! Render PDF pages to PNG images using Poppler's CLI tools.
//!
//! We render at twice the PDF's native resolution. Tesseract is noticeably
//! better at Thai when the glyphs are large, and the tone marks and vowel
//! signs above and below the line survive upsampling much better than they
//! survive the default 72 DPI.

use std::{collections::BTreeMap, error, fmt};

use tokio::process::Command;

use crate::{
    command::{StderrPolicy, check_for_command_failure, is_error_line},
    prelude::*,
};

/// PDF user space has 72 points per inch.
const PDF_POINTS_PER_INCH: u32 = 72;

/// Linear scale factor applied to each page before OCR.
pub const RENDER_SCALE: u32 = 2;

/// The only MIME type we accept as input.
const PDF_MIME_TYPE: &str = "application/pdf";

/// A rendered page, ready for OCR.
#[derive(Debug, Clone)]
pub struct PageImage {
    /// The zero-based index of this page.
    pub page_idx: usize,
    /// PNG-encoded image data.
    pub png: Vec<u8>,
}

/// Returned when asked to render a page the document doesn't have.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageOutOfRange {
    pub page_idx: usize,
    pub page_count: usize,
}

impl fmt::Display for PageOutOfRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "page index {} is out of range for a document with {} pages",
            self.page_idx, self.page_count
        )
    }
}

impl error::Error for PageOutOfRange {}

/// Something that can open documents for rendering.
#[async_trait]
pub trait Rasterizer: Send + Sync + 'static {
    /// Open a document. Failure here is fatal for the document.
    async fn open(&self, path: &Path) -> Result<Box<dyn PageSource>>;
}

/// An open document whose pages can be rendered one at a time.
///
/// Any resources held by the document are released when it is dropped.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// The number of pages in the document.
    fn page_count(&self) -> usize;

    /// Render a single page. Fails with [`PageOutOfRange`] if `page_idx` is
    /// not less than [`PageSource::page_count`].
    async fn render(&self, page_idx: usize) -> Result<PageImage>;
}

/// Check a page index against a page count.
pub fn check_page_idx(page_idx: usize, page_count: usize) -> Result<()> {
    if page_idx < page_count {
        Ok(())
    } else {
        Err(PageOutOfRange {
            page_idx,
            page_count,
        }
        .into())
    }
}

/// Rasterizer backed by `pdfinfo` and `pdftocairo`.
#[derive(Debug, Clone)]
pub struct PopplerRasterizer {
    dpi: u32,
}

impl PopplerRasterizer {
    /// Create a rasterizer using our standard scale factor.
    pub fn new() -> Self {
        Self {
            dpi: PDF_POINTS_PER_INCH * RENDER_SCALE,
        }
    }
}

impl Default for PopplerRasterizer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Rasterizer for PopplerRasterizer {
    #[instrument(level = "debug", skip_all, fields(path = %path.display()))]
    async fn open(&self, path: &Path) -> Result<Box<dyn PageSource>> {
        let mime_type = get_mime_type(path)?;
        if mime_type != PDF_MIME_TYPE {
            return Err(anyhow!(
                "{:?} is not a PDF file (detected {})",
                path.display(),
                mime_type
            ));
        }
        let page_count = get_pdf_page_count(path).await?;
        let tmpdir = tempfile::TempDir::with_prefix("pages")
            .context("failed to create temporary directory for page images")?;
        Ok(Box::new(PopplerDocument {
            path: path.to_owned(),
            page_count,
            dpi: self.dpi,
            tmpdir: Some(tmpdir),
        }))
    }
}

/// A PDF opened by [`PopplerRasterizer`].
struct PopplerDocument {
    path: PathBuf,
    page_count: usize,
    dpi: u32,
    /// Scratch space for rendered pages. Released by [`Drop`].
    tmpdir: Option<tempfile::TempDir>,
}

#[async_trait]
impl PageSource for PopplerDocument {
    fn page_count(&self) -> usize {
        self.page_count
    }

    #[instrument(level = "debug", skip(self), fields(path = %self.path.display()))]
    async fn render(&self, page_idx: usize) -> Result<PageImage> {
        check_page_idx(page_idx, self.page_count)?;
        let tmpdir = self
            .tmpdir
            .as_ref()
            .context("document has already been closed")?;

        // Poppler numbers pages from 1, and `-singlefile` stops it from
        // appending the page number to our output prefix.
        let page_number = (page_idx + 1).to_string();
        let prefix = tmpdir.path().join(format!("page-{}", page_number));
        let output = Command::new("pdftocairo")
            .arg("-png")
            .arg("-singlefile")
            .arg("-r")
            .arg(self.dpi.to_string())
            .arg("-f")
            .arg(&page_number)
            .arg("-l")
            .arg(&page_number)
            .arg(&self.path)
            .arg(&prefix)
            .output()
            .await
            .with_context(|| format!("failed to run pdftocairo on {:?}", self.path.display()))?;
        check_for_command_failure("pdftocairo", &output, StderrPolicy::FailOn(is_error_line))?;

        let png_path = prefix.with_extension("png");
        let png = tokio::fs::read(&png_path)
            .await
            .with_context(|| format!("failed to read rendered page {:?}", png_path.display()))?;

        // Delete the file to recover space a bit early.
        if let Err(err) = tokio::fs::remove_file(&png_path).await {
            warn!(path = %png_path.display(), "failed to delete rendered page: {}", err);
        }

        Ok(PageImage { page_idx, png })
    }
}

impl Drop for PopplerDocument {
    fn drop(&mut self) {
        if let Some(tmpdir) = self.tmpdir.take() {
            let tmpdir_path = tmpdir.path().to_owned();
            if let Err(err) = tmpdir.close() {
                error!(
                    directory = ?tmpdir_path.display(),
                    "failed to delete temporary directory: {}",
                    err
                );
            }
        }
    }
}

/// Get the number of pages in a PDF file.
#[instrument(level = "debug", skip_all, fields(path = %path.display()))]
pub async fn get_pdf_page_count(path: &Path) -> Result<usize> {
    let output = Command::new("pdfinfo")
        .arg(path)
        .output()
        .await
        .with_context(|| format!("failed to run pdfinfo on {:?}", path.display()))?;
    check_for_command_failure("pdfinfo", &output, StderrPolicy::Warn)?;

    let output =
        String::from_utf8(output.stdout).context("pdfinfo output was not valid UTF-8")?;
    parse_pdfinfo_page_count(&output).with_context(|| {
        format!("failed to get page count for {:?} from pdfinfo", path.display())
    })
}

/// Pull the `Pages:` property out of `pdfinfo` output.
fn parse_pdfinfo_page_count(output: &str) -> Result<usize> {
    let properties = output
        .lines()
        .filter_map(|line| line.split_once(':'))
        .map(|(key, value)| (key.trim(), value.trim()))
        .collect::<BTreeMap<_, _>>();
    let pages = properties
        .get("Pages")
        .ok_or_else(|| anyhow!("no page count in pdfinfo output"))?;
    pages
        .parse::<usize>()
        .with_context(|| format!("invalid page count {:?}", pages))
}

/// Get the MIME type of a file from its magic bytes.
pub fn get_mime_type(path: &Path) -> Result<String> {
    Ok(infer::get_from_path(path)
        .with_context(|| format!("failed to open {:?}", path.display()))?
        .ok_or_else(|| anyhow!("unknown file type for {:?}", path.display()))?
        .mime_type()
        .to_string())
}
