use std::{collections::HashMap, path::Path};

use super::{language::Language, ServiceError};

const SECTION_SEPARATOR: &str = "\n__SPLIT__\n";

/// Documentation sections per language, read once at startup.
#[derive(Debug, Clone, Default)]
pub struct DocProvider {
    sections: HashMap<Language, Vec<String>>,
}

impl DocProvider {
    /// Reads `{dir}/{code}.txt` for every supported language; a missing file is an error.
    pub async fn load(dir: &Path) -> Result<Self, ServiceError> {
        let mut sections = HashMap::new();
        for language in Language::ALL {
            let path = dir.join(format!("{}.txt", language.code()));
            let raw = tokio::fs::read_to_string(&path)
                .await
                .map_err(|source| ServiceError::MissingDoc {
                    path: path.display().to_string(),
                    source,
                })?;
            sections.insert(language, split_sections(&raw));
        }
        info!("Documentation loaded from {}", dir.display());
        Ok(Self { sections })
    }

    pub fn from_sections(sections: HashMap<Language, Vec<String>>) -> Self {
        Self { sections }
    }

    pub fn sections(&self, language: Language) -> &[String] {
        self.sections.get(&language).map(Vec::as_slice).unwrap_or(&[])
    }
}

fn split_sections(raw: &str) -> Vec<String> {
    raw.replace("\r\n", "\n")
        .split(SECTION_SEPARATOR)
        .map(str::trim)
        .filter(|section| !section.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_sections() {
        let raw = "<b>Intro</b>\n__SPLIT__\nSecond\r\n__SPLIT__\r\n\n__SPLIT__\nThird\n";
        assert_eq!(split_sections(raw), vec!["<b>Intro</b>", "Second", "Third"]);
    }

    #[tokio::test]
    async fn test_bundled_docs_cover_every_language() {
        let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("docs");
        let docs = DocProvider::load(&dir).await.unwrap();
        for language in Language::ALL {
            assert!(!docs.sections(language).is_empty(), "{} has no sections", language);
        }
    }

    #[tokio::test]
    async fn test_missing_directory_fails() {
        let err = DocProvider::load(Path::new("/nonexistent/docs")).await.unwrap_err();
        assert!(matches!(err, ServiceError::MissingDoc { .. }));
    }
}
