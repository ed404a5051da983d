//! Extra writing guidance appended to the drafting system prompt.
//!
//! The guidance lives in a document the user points the config at: a Word
//! `.docx` file, or any plain text file.

use std::fs::{self, File};
use std::io::Read;
use std::path::Path;
use std::sync::OnceLock;

use anyhow::{Context, Result};
use regex::Regex;
use zip::ZipArchive;

const DOCUMENT_XML: &str = "word/document.xml";

fn text_run() -> Option<&'static Regex> {
    static TEXT_RUN: OnceLock<Option<Regex>> = OnceLock::new();
    TEXT_RUN
        .get_or_init(|| Regex::new(r"(?s)<w:t(?:\s[^>]*)?>(.*?)</w:t>").ok())
        .as_ref()
}

/// Read the guidance text from `path`.
pub fn load(path: &Path) -> Result<String> {
    let is_docx = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("docx"));

    let text = if is_docx {
        extract_docx_text(path)?
    } else {
        fs::read_to_string(path)
            .with_context(|| format!("Failed to read guidance file: {}", path.display()))?
    };
    Ok(text.trim().to_string())
}

/// Text of every run in a Word document's body, joined with spaces.
pub fn extract_docx_text(path: &Path) -> Result<String> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open guidance file: {}", path.display()))?;
    let mut archive =
        ZipArchive::new(file).context("Failed to read .docx file as zip archive")?;
    let mut document = archive
        .by_name(DOCUMENT_XML)
        .context("Failed to find document.xml in .docx file")?;

    let mut xml = String::new();
    document
        .read_to_string(&mut xml)
        .context("Failed to read document.xml contents")?;
    Ok(text_from_document_xml(&xml))
}

fn text_from_document_xml(xml: &str) -> String {
    let Some(re) = text_run() else {
        return String::new();
    };
    re.captures_iter(xml)
        .filter_map(|caps| caps.get(1))
        .map(|m| unescape_xml(m.as_str()))
        .collect::<Vec<_>>()
        .join(" ")
        .trim()
        .to_string()
}

fn unescape_xml(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;
    use zip::write::SimpleFileOptions;

    fn write_docx(path: &Path, document_xml: &str) {
        let file = File::create(path).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        zip.start_file(DOCUMENT_XML, SimpleFileOptions::default())
            .unwrap();
        zip.write_all(document_xml.as_bytes()).unwrap();
        zip.finish().unwrap();
    }

    #[test]
    fn test_text_runs_are_joined() {
        let xml = r#"<w:body><w:p><w:r><w:t>Mention</w:t></w:r><w:r><w:t xml:space="preserve">the trial &amp; pricing</w:t></w:r></w:p><w:tbl/></w:body>"#;
        assert_eq!(text_from_document_xml(xml), "Mention the trial & pricing");
        assert_eq!(text_from_document_xml("<w:body/>"), "");
    }

    #[test]
    fn test_load_docx() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("guide.DOCX");
        write_docx(
            &path,
            "<w:document><w:p><w:r><w:t>Keep it under 80 words.</w:t></w:r></w:p></w:document>",
        );
        assert_eq!(load(&path).unwrap(), "Keep it under 80 words.");
    }

    #[test]
    fn test_load_plain_text() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("guide.txt");
        fs::write(&path, "\n  Sign off as Sam.\n").unwrap();
        assert_eq!(load(&path).unwrap(), "Sign off as Sam.");
    }

    #[test]
    fn test_load_errors() {
        let dir = tempdir().unwrap();
        assert!(load(&dir.path().join("missing.txt")).is_err());

        let not_zip = dir.path().join("broken.docx");
        fs::write(&not_zip, "plain text").unwrap();
        assert!(load(&not_zip).is_err());
    }
}
