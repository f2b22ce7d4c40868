use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Score a mapping must carry to be trusted without review.
pub const EXACT_MATCH_SCORE: f64 = 1.0;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProductMapping {
    #[serde(default)]
    pub product_name: Option<String>,
    pub api_code: String,
    #[serde(default)]
    pub match_score: f64,
}

impl ProductMapping {
    pub fn is_exact_match(&self) -> bool {
        self.match_score == EXACT_MATCH_SCORE
    }

    pub fn label(&self) -> &str {
        self.product_name.as_deref().unwrap_or(&self.api_code)
    }
}

pub fn load_mapping(path: &Path) -> Result<Vec<ProductMapping>> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("failed reading product mapping: {}", path.display()))?;
    parse_mapping(&data)
        .with_context(|| format!("failed parsing product mapping: {}", path.display()))
}

pub fn parse_mapping(data: &str) -> Result<Vec<ProductMapping>> {
    Ok(serde_json::from_str(data)?)
}

pub fn api_codes(mappings: &[ProductMapping]) -> Vec<String> {
    mappings.iter().map(|m| m.api_code.clone()).collect()
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::{api_codes, load_mapping, parse_mapping};

    #[test]
    fn parses_mapping_with_extra_keys_and_defaults() {
        let parsed = parse_mapping(
            r#"[
                {"productName": "1 oz Gold Eagle", "apiCode": "GE1", "matchScore": 1, "metal": "gold"},
                {"apiCode": "SR10", "matchScore": 0.92},
                {"productName": "Kilo Bar", "apiCode": "KB"}
            ]"#,
        )
        .expect("mapping should parse");

        assert_eq!(parsed.len(), 3);
        assert!(parsed[0].is_exact_match());
        assert!(!parsed[1].is_exact_match());
        assert_eq!(parsed[1].label(), "SR10");
        assert_eq!(parsed[2].match_score, 0.0);
        assert_eq!(api_codes(&parsed), vec!["GE1", "SR10", "KB"]);
    }

    #[test]
    fn loads_mapping_from_disk() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(file, r#"[{{"productName": "A", "apiCode": "A1", "matchScore": 1}}]"#)
            .expect("write mapping");
        let loaded = load_mapping(file.path()).expect("load mapping");
        assert_eq!(loaded[0].api_code, "A1");
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        let err = load_mapping(&dir.path().join("nope.json")).unwrap_err();
        assert!(err.to_string().contains("failed reading product mapping"));
    }
}
