//! Prompt construction for outline and section requests

use crate::types::Section;

/// Prompt asking for an outline of `topic` as a bare JSON document
///
/// The JSON example embedded in the prompt uses the same field names the
/// outline parser expects (`title`, `outline`, `section`, `subsections`).
pub fn outline_prompt(topic: &str, language: &str) -> String {
    let example = serde_json::json!({
        "title": "An engaging, search-friendly title for the topic",
        "outline": [
            {
                "section": "Section heading (e.g. \"1. Introduction\")",
                "subsections": ["Specific points the section should cover"]
            }
        ]
    });
    let example = serde_json::to_string_pretty(&example).unwrap_or_default();

    format!(
        "You are a professional content strategist and SEO specialist.\n\
         Research the following topic and study how the best-ranking articles about it are structured.\n\
         \n\
         Topic: \"{topic}\"\n\
         \n\
         Produce a blog article outline that is more thorough and more useful to readers than what already exists. \
         It needs a clear introduction, several main sections each with concrete sub-points, and a strong conclusion.\n\
         Write the title, headings and sub-points in {language}.\n\
         \n\
         Respond with the JSON object only, following this shape exactly. Do not add any explanation before or after it.\n\
         \n\
         ```json\n{example}\n```\n"
    )
}

/// Prompt asking for the body of one section
///
/// The model is told not to repeat the heading, since the assembler emits it.
pub fn section_prompt(article_title: &str, section: &Section, language: &str) -> String {
    format!(
        "Write the body of one section of a blog article.\n\
         \n\
         Article title: {article_title}\n\
         Section to write: {heading}\n\
         Points and keywords this section should cover: {points}\n\
         \n\
         Write the section body in {language}. \
         Do not repeat the section heading and do not add any introduction or closing remarks. \
         Output the body text only.",
        heading = section.heading,
        points = section.bullets.join(", "),
    )
}
