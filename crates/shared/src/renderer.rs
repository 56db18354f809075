use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::process::Command;

use crate::models::{Artifact, Bookmark, ExtractedDocument};
use crate::pipeline::Renderer;

/// A5 page geometry and typography tuned for e-reader screens.
const EREADER_CSS: &str = "\
@page {
    size: A5;
    margin: 1.5cm;
}
body {
    font-family: Georgia, 'Times New Roman', serif;
    font-size: 11pt;
    line-height: 1.6;
    color: #000;
}
h1 { font-size: 16pt; margin-bottom: 0.5em; }
h2 { font-size: 14pt; }
h3 { font-size: 12pt; }
img { max-width: 100%; height: auto; }
a { color: #000; text-decoration: underline; }
pre, code { font-size: 9pt; overflow-wrap: break-word; }
blockquote { border-left: 2px solid #666; padding-left: 0.8em; margin-left: 0; }
";

/// Renders extracted markup to a paginated PDF via the external
/// `weasyprint` binary.
pub struct WeasyPrintRenderer {
    binary_path: PathBuf,
}

impl WeasyPrintRenderer {
    pub fn new(binary_path: PathBuf) -> Self {
        Self { binary_path }
    }

    /// Locate `weasyprint` in PATH, failing fast before any network work.
    pub fn from_path() -> Result<Self> {
        which::which("weasyprint").map(Self::new).map_err(|_| {
            anyhow!("weasyprint not found in PATH. Install via: pip install weasyprint")
        })
    }
}

#[async_trait]
impl Renderer for WeasyPrintRenderer {
    async fn render(
        &self,
        item: &Bookmark,
        doc: &ExtractedDocument,
        out_dir: &Path,
    ) -> Result<Artifact> {
        let name = artifact_name(&item.title);
        let html_path = out_dir.join(format!("{}.html", item.id));
        let pdf_path = out_dir.join(&name);

        tokio::fs::write(&html_path, wrap_document(&doc.html))
            .await
            .context("Failed to write intermediate HTML")?;

        // --base-url lets relative images and stylesheets resolve against
        // the article's original location.
        let output = Command::new(&self.binary_path)
            .arg("--base-url")
            .arg(&item.link)
            .arg(&html_path)
            .arg(&pdf_path)
            .output()
            .await
            .context("Failed to execute weasyprint")?;

        if !output.status.success() {
            anyhow::bail!(
                "weasyprint failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        Ok(Artifact {
            path: pdf_path,
            name,
        })
    }
}

/// Wrap an extracted fragment into a self-contained printable document.
fn wrap_document(content: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n\
         <style>{EREADER_CSS}</style>\n</head>\n<body>\n{content}\n</body>\n</html>\n"
    )
}

/// Derive the delivered document name from the title alone, so rendering
/// the same item twice targets the same remote name. Filesystem-hostile
/// characters are stripped, whitespace collapsed, and the result capped
/// at 120 characters.
pub fn artifact_name(title: &str) -> String {
    let stripped: String = title
        .chars()
        .filter(|c| !matches!(c, '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*'))
        .collect();

    let mut name: String = stripped
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .chars()
        .take(120)
        .collect();

    if name.is_empty() {
        name = "untitled".to_string();
    }
    format!("{name}.pdf")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_hostile_characters_and_collapses_whitespace() {
        assert_eq!(
            artifact_name("What?  A \"Story\": Part 1/2"),
            "What A Story Part 12.pdf"
        );
    }

    #[test]
    fn caps_long_titles_at_120_characters() {
        let long = "x".repeat(400);
        let name = artifact_name(&long);
        assert_eq!(name.len(), 124); // 120 + ".pdf"
    }

    #[test]
    fn empty_titles_fall_back_to_untitled() {
        assert_eq!(artifact_name("///"), "untitled.pdf");
        assert_eq!(artifact_name("   "), "untitled.pdf");
    }

    #[test]
    fn same_title_always_yields_the_same_name() {
        let a = artifact_name("Weekly Review: Notes");
        let b = artifact_name("Weekly Review: Notes");
        assert_eq!(a, b);
    }

    #[test]
    fn wrapped_document_embeds_fragment_and_stylesheet() {
        let out = wrap_document("<p>hello</p>");
        assert!(out.contains("<p>hello</p>"));
        assert!(out.contains("size: A5"));
        assert!(out.starts_with("<!DOCTYPE html>"));
    }
}
