use std::str::FromStr;

use clap::Parser;
use tracing_subscriber::{
    EnvFilter, Layer as _, filter::Directive, layer::SubscriberExt,
    util::SubscriberInitExt as _,
};

use self::{prelude::*, ui::Ui};

mod cmd;
mod command;
mod ocr;
mod output;
mod pipeline;
mod prelude;
mod rasterize;
mod retry;
mod tools;
mod translate;
mod ui;
mod vocabulary;

/// OCR scanned Thai PDFs, flag Pali terms, and translate the text to English.
///
/// Pages are rendered with Poppler, read with Tesseract, and translated with
/// Google Translate. For each PDF, three files are written to the output
/// directory: `<name>_translation.json`, `<name>_translation.txt` (Thai and
/// English side by side) and `<name>_english.txt`.
#[derive(Debug, Parser)]
#[clap(
    version,
    author,
    after_help = r#"
Requirements:
  - poppler-utils (pdfinfo, pdftocairo)
  - tesseract-ocr, with the tesseract-ocr-tha language pack

Environment Variables:
  - RUST_LOG (optional): Log filter, like `debug` or `thai_scan_translator=trace`.
  - TRANSLATE_API_BASE (optional): Override the translation server URL.

  These variables may be set in a standard `.env` file.
"#
)]
struct Opts {
    #[clap(flatten)]
    run: cmd::RunOpts,
}

/// Our entry point, which can return an error. [`anyhow::Result`] will
/// automatically print a nice error message with optional backtrace.
#[tokio::main]
async fn main() -> Result<()> {
    let ui = Ui::init();

    // Initialize tracing.
    let directive =
        Directive::from_str("info").expect("built-in directive should be valid");
    let env_filter = EnvFilter::builder()
        .with_default_directive(directive)
        .from_env_lossy();

    let subscriber = tracing_subscriber::fmt::layer()
        .with_writer(ui.get_stderr_writer())
        .with_filter(env_filter);
    tracing_subscriber::registry().with(subscriber).init();

    // Call our real `main` function now that logging is set up.
    real_main(ui).await
}

/// Our real entry point.
#[instrument(level = "debug", name = "main", skip_all)]
async fn real_main(ui: Ui) -> Result<()> {
    // Load environment variables from a `.env` file, if it exists.
    dotenvy::dotenv().ok();

    let opts = Opts::parse();
    debug!("Parsed options: {:?}", opts);

    cmd::cmd_run(ui, &opts.run).await
}
