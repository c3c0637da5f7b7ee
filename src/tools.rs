//! Make sure the external tools we need are installed, before we start.
//!
//! Discovering a missing Thai language pack 40 pages into a book is no fun,
//! so we check everything up front and say exactly what's missing.

use tokio::process::Command;

use crate::{
    command::{StderrPolicy, check_for_command_failure},
    prelude::*,
};

/// Tools we shell out to, and the package that provides them on Debian.
const REQUIRED_TOOLS: &[(&str, &str, &str)] = &[
    ("pdfinfo", "-v", "poppler-utils"),
    ("pdftocairo", "-v", "poppler-utils"),
    ("tesseract", "--version", "tesseract-ocr"),
];

/// Check that all required tools run, and that `tesseract` has every
/// language in `ocr_languages` (a `+`-separated list like `tha+eng`).
#[instrument(level = "debug")]
pub async fn check_required_tools(ocr_languages: &str) -> Result<()> {
    for &(tool, version_arg, package) in REQUIRED_TOOLS {
        let output = Command::new(tool).arg(version_arg).output().await;
        if let Err(err) = output {
            return Err(anyhow!(
                "could not run `{}` ({}). Please install {} (for example, `apt-get install {}`)",
                tool,
                err,
                package,
                package
            ));
        }
    }

    let output = Command::new("tesseract")
        .arg("--list-langs")
        .output()
        .await
        .context("cannot run tesseract")?;
    check_for_command_failure("tesseract", &output, StderrPolicy::Warn)?;
    let installed = String::from_utf8_lossy(&output.stdout);
    let missing = missing_languages(&installed, ocr_languages);
    if !missing.is_empty() {
        return Err(anyhow!(
            "tesseract is missing language data for: {}. Please install {}",
            missing.join(", "),
            missing
                .iter()
                .map(|lang| format!("tesseract-ocr-{}", lang))
                .collect::<Vec<_>>()
                .join(" "),
        ));
    }
    debug!("All required tools are installed");
    Ok(())
}

/// Which of `requested` (like `tha+eng`) are absent from the output of
/// `tesseract --list-langs`?
fn missing_languages<'a>(list_langs_output: &str, requested: &'a str) -> Vec<&'a str> {
    let installed = list_langs_output
        .lines()
        // The first line is a header like `List of available languages in "/usr/share/...":`.
        .filter(|line| !line.contains(' '))
        .map(str::trim)
        .collect::<Vec<_>>();
    requested
        .split('+')
        .map(str::trim)
        .filter(|lang| !lang.is_empty() && !installed.contains(lang))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIST_LANGS: &str = "List of available languages in \"/usr/share/tesseract-ocr/5/tessdata/\" (3):\neng\nosd\ntha\n";

    #[test]
    fn finds_installed_languages() {
        assert!(missing_languages(LIST_LANGS, "tha+eng").is_empty());
    }

    #[test]
    fn reports_missing_languages() {
        assert_eq!(missing_languages(LIST_LANGS, "tha+pli+eng"), vec!["pli"]);
        assert_eq!(missing_languages("List of available languages (1):\neng\n", "tha"), vec!["tha"]);
    }

    #[tokio::test]
    #[ignore = "Requires poppler-utils and tesseract-ocr-tha to be installed"]
    async fn required_tools_are_installed() -> Result<()> {
        check_required_tools("tha+eng").await
    }
}
