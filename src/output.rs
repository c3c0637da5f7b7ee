//! Writing results to disk.
//!
//! Each document produces three files: the full result as JSON, a combined
//! Thai/English transcript, and the English on its own.

use crate::{pipeline::DocumentResult, prelude::*};

/// Directory we write to unless told otherwise.
pub const DEFAULT_OUTPUT_DIR: &str = "translations";

/// Width of the rules separating sections of the text files.
const RULE_WIDTH: usize = 70;

/// The files written by [`write_results`].
#[derive(Debug, Clone)]
pub struct OutputPaths {
    pub json: PathBuf,
    pub combined_text: PathBuf,
    pub english_text: PathBuf,
}

impl OutputPaths {
    /// Where the outputs for `base_name` go inside `output_dir`.
    pub fn new(output_dir: &Path, base_name: &str) -> Self {
        Self {
            json: output_dir.join(format!("{}_translation.json", base_name)),
            combined_text: output_dir.join(format!("{}_translation.txt", base_name)),
            english_text: output_dir.join(format!("{}_english.txt", base_name)),
        }
    }
}

/// Write all three output files for a document, creating `output_dir` if
/// needed.
#[instrument(level = "debug", skip(result), fields(source_file = %result.source_file))]
pub async fn write_results(
    result: &DocumentResult,
    output_dir: &Path,
    base_name: &str,
) -> Result<OutputPaths> {
    tokio::fs::create_dir_all(output_dir).await.with_context(|| {
        format!("failed to create output directory {:?}", output_dir.display())
    })?;
    let paths = OutputPaths::new(output_dir, base_name);

    let json = serde_json::to_string_pretty(result).context("failed to serialize result")?;
    write_file(&paths.json, &json).await?;
    write_file(&paths.combined_text, &render_combined_text(result)).await?;
    write_file(&paths.english_text, &render_english_text(result)).await?;
    Ok(paths)
}

async fn write_file(path: &Path, contents: &str) -> Result<()> {
    tokio::fs::write(path, contents)
        .await
        .with_context(|| format!("failed to write {:?}", path.display()))?;
    debug!(path = %path.display(), "Wrote output");
    Ok(())
}

/// Thai and English side by side, page by page, with Pali terms noted.
pub fn render_combined_text(result: &DocumentResult) -> String {
    let double_rule = "=".repeat(RULE_WIDTH);
    let single_rule = "-".repeat(RULE_WIDTH);

    let mut out = format!("Translation of: {}\n{}\n\n", result.source_file, double_rule);
    if !result.all_pali_terms.is_empty() {
        out.push_str(&format!(
            "Pali Terms Found:\n{}\n\n{}\n\n",
            result.all_pali_terms.join(", "),
            double_rule
        ));
    }

    for page in &result.pages {
        out.push_str(&format!("\n--- Page {} ---\n\n", page.page));
        if !page.pali_terms.is_empty() {
            out.push_str(&format!(
                "[Pali terms on this page: {}]\n\n",
                page.pali_terms.join(", ")
            ));
        }
        out.push_str(&format!(
            "THAI TEXT:\n{}\n\nENGLISH TRANSLATION:\n{}\n\n{}\n",
            page.thai_text, page.english_text, single_rule
        ));
    }
    out
}

/// Just the English, skipping pages with no translation.
pub fn render_english_text(result: &DocumentResult) -> String {
    let mut out = format!(
        "English Translation of: {}\n{}\n\n",
        result.source_file,
        "=".repeat(RULE_WIDTH)
    );
    for page in result.pages.iter().filter(|p| !p.english_text.trim().is_empty()) {
        out.push_str(&format!("[Page {}]\n{}\n\n", page.page, page.english_text));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::PageRecord;

    fn sample() -> DocumentResult {
        DocumentResult {
            source_file: "Vithisangaha.pdf".to_owned(),
            total_pages: 10,
            processed_pages: 2,
            pages: vec![
                PageRecord {
                    page: 1,
                    thai_text: "จิตและเวทนา citta vedana".to_owned(),
                    english_text: "Mind and feeling".to_owned(),
                    pali_terms: vec!["citta".to_owned(), "vedana".to_owned()],
                },
                PageRecord {
                    page: 2,
                    thai_text: "หน้าว่าง".to_owned(),
                    english_text: "  \n".to_owned(),
                    pali_terms: vec![],
                },
            ],
            all_pali_terms: vec!["citta".to_owned(), "vedana".to_owned()],
        }
    }

    #[test]
    fn output_names_come_from_base_name() {
        let paths = OutputPaths::new(Path::new("translations"), "Bhumicatukka & Patisandhicatukka,");
        assert_eq!(
            paths.json,
            Path::new("translations/Bhumicatukka & Patisandhicatukka,_translation.json")
        );
        assert_eq!(
            paths.combined_text,
            Path::new("translations/Bhumicatukka & Patisandhicatukka,_translation.txt")
        );
        assert_eq!(
            paths.english_text,
            Path::new("translations/Bhumicatukka & Patisandhicatukka,_english.txt")
        );
    }

    #[test]
    fn combined_text_has_every_page() {
        let rule = "=".repeat(70);
        let dash = "-".repeat(70);
        let expected = format!(
            "Translation of: Vithisangaha.pdf\n{rule}\n\n\
             Pali Terms Found:\ncitta, vedana\n\n{rule}\n\n\
             \n--- Page 1 ---\n\n\
             [Pali terms on this page: citta, vedana]\n\n\
             THAI TEXT:\nจิตและเวทนา citta vedana\n\n\
             ENGLISH TRANSLATION:\nMind and feeling\n\n{dash}\n\
             \n--- Page 2 ---\n\n\
             THAI TEXT:\nหน้าว่าง\n\n\
             ENGLISH TRANSLATION:\n  \n\n\n{dash}\n"
        );
        assert_eq!(render_combined_text(&sample()), expected);
    }

    #[test]
    fn combined_text_omits_empty_term_list() {
        let mut result = sample();
        result.all_pali_terms.clear();
        assert!(!render_combined_text(&result).contains("Pali Terms Found"));
    }

    #[test]
    fn english_text_skips_blank_translations() {
        let expected = format!(
            "English Translation of: Vithisangaha.pdf\n{}\n\n[Page 1]\nMind and feeling\n\n",
            "=".repeat(70)
        );
        assert_eq!(render_english_text(&sample()), expected);
    }

    #[tokio::test]
    async fn blank_page_is_missing_only_from_english_text() -> Result<()> {
        let result = DocumentResult {
            source_file: "blank.pdf".to_owned(),
            total_pages: 1,
            processed_pages: 1,
            pages: vec![PageRecord {
                page: 1,
                thai_text: String::new(),
                english_text: String::new(),
                pali_terms: vec![],
            }],
            all_pali_terms: vec![],
        };
        let tmpdir = tempfile::TempDir::new()?;
        let paths = write_results(&result, tmpdir.path(), "blank").await?;

        let english = std::fs::read_to_string(&paths.english_text)?;
        assert!(!english.contains("[Page"));
        let combined = std::fs::read_to_string(&paths.combined_text)?;
        assert!(combined.contains("--- Page 1 ---"));
        assert!(combined.contains("THAI TEXT:\n\n\nENGLISH TRANSLATION:\n\n\n"));
        Ok(())
    }

    #[tokio::test]
    async fn writes_pretty_unescaped_json() -> Result<()> {
        let tmpdir = tempfile::TempDir::new()?;
        let output_dir = tmpdir.path().join("translations");
        let paths = write_results(&sample(), &output_dir, "Vithisangaha").await?;
        // Writing twice is fine.
        write_results(&sample(), &output_dir, "Vithisangaha").await?;

        let json = std::fs::read_to_string(&paths.json)?;
        assert!(json.starts_with("{\n  \"source_file\": \"Vithisangaha.pdf\",\n"));
        assert!(json.contains("จิตและเวทนา"));
        let parsed = serde_json::from_str::<DocumentResult>(&json)?;
        assert_eq!(parsed, sample());
        Ok(())
    }
}
