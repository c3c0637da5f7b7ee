//! Pali technical vocabulary, and spotting it in recognized text.
//!
//! Abhidhamma commentaries written in Thai still drop romanized Pali terms
//! into the text, and those terms should survive into the English output
//! untranslated. We flag them per page so a reader can check them.

use std::sync::LazyLock;

/// Romanized Pali terms commonly found in Abhidhamma texts, in lower case.
const PALI_TERMS: &[&str] = &[
    "citta", "cetasika", "rupa", "nibbana", "kamma", "vipaka", "kiriya",
    "kusala", "akusala", "abyakata", "sobhana", "asobhana",
    "kamavacara", "rupavacara", "arupavacara", "lokuttara",
    "vedana", "sanna", "sankhara", "vinnana", "phassa",
    "lobha", "dosa", "moha", "alobha", "adosa", "amoha",
    "vithi", "javana", "tadalarammana", "bhavanga", "avajjana",
    "patisandhi", "bhumi", "catukka", "sangaha",
    "dhamma", "anicca", "dukkha", "anatta", "sati",
    "samadhi", "panna", "sila", "ariya", "magga", "phala",
    "sotapanna", "sakadagami", "anagami", "arahant",
    "jhana", "samapatti", "arupa", "metta", "karuna",
    "mudita", "upekkha", "raga", "ditthi", "mana",
    "vicikiccha", "thina", "middha", "uddhacca", "kukkucca",
    "ahirika", "anottappa", "viriya", "adhimokkha",
    "khandha", "ayatana", "dhatu", "sacca", "indriya",
    "paramattha", "sammuti", "pannatti", "nana", "vijja",
    "samatha", "vipassana", "sankappa", "vacca", "kammanta",
    "ajiva", "vayama", "smrti", "paccaya", "hetu",
    "nama", "namarupa", "arammana", "dvara", "vipallasa",
    "marana", "upapatti", "cuti", "abhidhamma", "sutta", "vinaya",
];

static PALI: LazyLock<Vocabulary> = LazyLock::new(|| Vocabulary::new(PALI_TERMS));

/// A fixed list of terms to look for.
#[derive(Debug, Clone)]
pub struct Vocabulary {
    /// Terms as given, paired with their lower-case form.
    terms: Vec<(String, String)>,
}

impl Vocabulary {
    /// Build a vocabulary. Duplicate terms (ignoring case) are dropped.
    pub fn new<S: AsRef<str>>(terms: &[S]) -> Self {
        let mut seen = Vec::<(String, String)>::with_capacity(terms.len());
        for term in terms {
            let term = term.as_ref();
            let lower = term.to_lowercase();
            if !seen.iter().any(|(_, l)| *l == lower) {
                seen.push((term.to_owned(), lower));
            }
        }
        Self { terms: seen }
    }

    /// The built-in Pali vocabulary.
    pub fn pali() -> &'static Vocabulary {
        &PALI
    }

    /// How many terms we know.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    /// Find every term that occurs anywhere in `text`, ignoring case.
    ///
    /// This is plain substring matching, so `nama` also matches inside
    /// `namarupa`. OCR output splits and merges words unpredictably, which
    /// makes word boundaries unreliable anyway. Results are in vocabulary
    /// order, without duplicates.
    pub fn find_terms(&self, text: &str) -> Vec<String> {
        let text = text.to_lowercase();
        self.terms
            .iter()
            .filter(|(_, lower)| text.contains(lower.as_str()))
            .map(|(term, _)| term.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_regardless_of_case() {
        let vocab = Vocabulary::new(&["citta", "vedana", "rupa"]);
        assert_eq!(
            vocab.find_terms("Citta arises with VEDANA"),
            vec!["citta", "vedana"]
        );
        assert!(vocab.find_terms("no matches here").is_empty());
    }

    #[test]
    fn matches_inside_longer_tokens() {
        let vocab = Vocabulary::new(&["nama", "rupa"]);
        assert_eq!(vocab.find_terms("จิตและnamarupaเกิด"), vec!["nama", "rupa"]);
    }

    #[test]
    fn reports_each_term_once() {
        let vocab = Vocabulary::new(&["dhamma", "Dhamma", "sati"]);
        assert_eq!(vocab.len(), 2);
        assert_eq!(
            vocab.find_terms("dhamma dhamma DHAMMA sati sati"),
            vec!["dhamma", "sati"]
        );
    }

    #[test]
    fn builtin_vocabulary_is_loaded() {
        let vocab = Vocabulary::pali();
        assert!(vocab.len() > 90);
        assert_eq!(
            vocab.find_terms("The abhidhamma explains javana."),
            vec!["javana", "dhamma", "abhidhamma"]
        );
    }
}
