//! Markdown assembly for outlines and articles.

use crate::types::{ArticleContent, Outline};

/// Title used when a markdown document has no usable first line
pub const UNTITLED_MARKDOWN: &str = "Untitled markdown";

/// Render an outline as a markdown skeleton
///
/// `# title`, then per section an `## heading` followed by one `- bullet`
/// line per bullet and a blank line.
pub fn render_outline_markdown(outline: &Outline) -> String {
    let mut md = format!("# {}\n\n", outline.title);
    for section in &outline.sections {
        md.push_str(&format!("## {}\n\n", section.heading));
        for bullet in &section.bullets {
            md.push_str(&format!("- {bullet}\n"));
        }
        md.push('\n');
    }
    md
}

/// Render an article: outline headings with each section's generated body
///
/// Sections without content render with an empty body.
pub fn render_article_markdown(outline: &Outline, content: &ArticleContent) -> String {
    let mut md = format!("# {}\n\n", outline.title);
    for section in &outline.sections {
        md.push_str(&format!("## {}\n\n", section.heading));
        md.push_str(content.get(&section.heading).unwrap_or_default());
        md.push_str("\n\n");
    }
    md
}

/// Derive a document title from its first non-blank line, minus heading marks
pub fn markdown_title(document: &str) -> String {
    let first_line = document.trim().lines().next().unwrap_or_default();
    let title = first_line.trim_start_matches('#').trim();
    if title.is_empty() {
        UNTITLED_MARKDOWN.to_string()
    } else {
        title.to_string()
    }
}
