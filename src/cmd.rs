//! Deciding what to translate, and translating it.

use std::sync::Arc;

use clap::Args;

use crate::{
    ocr::{DEFAULT_OCR_LANGUAGES, TesseractExtractor},
    output::{DEFAULT_OUTPUT_DIR, write_results},
    pipeline::Pipeline,
    prelude::*,
    rasterize::PopplerRasterizer,
    tools::check_required_tools,
    translate::{TranslationOpts, google::GoogleTranslator},
    ui::Ui,
    vocabulary::Vocabulary,
};

/// The books we translate when no file is named on the command line.
pub const KNOWN_INPUT_FILES: &[&str] = &[
    "Kammacatukka & Maraṇuppatticatukka.pdf",
    "Vithisangaha.pdf",
    "Bhumicatukka & Patisandhicatukka,.pdf",
];

/// How many pages of each known file to translate without `--all-pages`.
pub const DEFAULT_BATCH_PAGES: usize = 5;

/// Options for a translation run.
#[derive(Args, Clone, Debug)]
pub struct RunOpts {
    /// The PDF to translate. If omitted, translate whichever of the known
    /// Abhidhamma PDFs are in the current directory.
    pub path: Option<PathBuf>,

    /// Translate at most this many pages of PATH.
    pub max_pages: Option<usize>,

    /// When translating the known PDFs, translate every page instead of the
    /// first 5.
    #[clap(long, conflicts_with = "path")]
    pub all_pages: bool,

    /// Directory to write output files to.
    #[clap(short = 'o', long, default_value = DEFAULT_OUTPUT_DIR)]
    pub output_dir: PathBuf,

    /// Tesseract languages to use for OCR.
    #[clap(long, default_value = DEFAULT_OCR_LANGUAGES)]
    pub ocr_languages: String,

    #[clap(flatten)]
    pub translation: TranslationOpts,
}

/// A document to process.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Job {
    pub path: PathBuf,
    pub max_pages: Option<usize>,
}

/// Work out which documents to process. Known files are looked for in
/// `search_dir`, and any that are missing are skipped with a warning.
pub fn resolve_jobs(ui: &Ui, opts: &RunOpts, search_dir: &Path) -> Result<Vec<Job>> {
    if let Some(path) = &opts.path {
        if !path.is_file() {
            return Err(anyhow!("input file {:?} not found", path.display()));
        }
        return Ok(vec![Job {
            path: path.clone(),
            max_pages: opts.max_pages,
        }]);
    }

    let max_pages = if opts.all_pages {
        None
    } else {
        Some(DEFAULT_BATCH_PAGES)
    };
    let mut jobs = vec![];
    for name in KNOWN_INPUT_FILES {
        let path = search_dir.join(name);
        if path.is_file() {
            jobs.push(Job { path, max_pages });
        } else {
            warn!(path = %path.display(), "Input file not found, skipping");
            ui.report(&format!("Skipping {}: not found", name));
        }
    }
    Ok(jobs)
}

/// The base name for a document's output files: its file name without the
/// extension.
pub fn output_base_name(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_owned())
}

/// Run the translation pipeline over every requested document.
#[instrument(level = "debug", skip_all)]
pub async fn cmd_run(ui: Ui, opts: &RunOpts) -> Result<()> {
    let jobs = resolve_jobs(&ui, opts, Path::new("."))?;
    if jobs.is_empty() {
        ui.report("No PDF files to translate.");
        return Ok(());
    }

    check_required_tools(&opts.ocr_languages).await?;
    let vocabulary = Vocabulary::pali();
    debug!(term_count = vocabulary.len(), "Loaded Pali vocabulary");
    let pipeline = Pipeline::new(
        Arc::new(PopplerRasterizer::new()),
        Arc::new(TesseractExtractor::new(opts.ocr_languages.clone())),
        Arc::new(GoogleTranslator::new(&opts.translation)?),
        vocabulary,
        opts.translation.chunk_size,
        ui.clone(),
    );

    let mut failures = 0;
    for job in &jobs {
        let result = match pipeline.process(&job.path, job.max_pages).await {
            Ok(result) => result,
            // If the user asked for one specific file, not being able to open
            // it is an error.
            Err(failure) if opts.path.is_some() => return Err(failure.into()),
            Err(failure) => {
                ui.report(&format!("Skipping {}", failure));
                failures += 1;
                continue;
            }
        };

        let paths =
            write_results(&result, &opts.output_dir, &output_base_name(&job.path)).await?;
        ui.report(&format!("Saved JSON: {}", paths.json.display()));
        ui.report(&format!("Saved Text: {}", paths.combined_text.display()));
        ui.report(&format!("Saved English: {}", paths.english_text.display()));
    }

    if failures > 0 {
        warn!("{} of {} documents could not be opened", failures, jobs.len());
    }
    ui.report(&format!(
        "Translation complete! Output saved in: {}",
        opts.output_dir.display()
    ));
    Ok(())
}
