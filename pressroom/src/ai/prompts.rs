//! Prompt assembly for the four content tools.
//!
//! Each builder turns the validated form input into the user prompt sent to
//! the provider, ending with an explicit description of the JSON shape the
//! tool expects back. The system prompt comes from tool settings and is not
//! assembled here.

use crate::api::models::tools::{LieDetectorRequest, NewsletterRequest, SummaryRequest, ThreadRequest};

/// Default number of posts for a thread when the form leaves it open
const DEFAULT_THREAD_POSTS: u32 = 5;

pub fn newsletter_prompt(request: &NewsletterRequest) -> String {
    let mut prompt = format!("Write a newsletter issue about: {}\n", request.topic.trim());

    if let Some(audience) = request.audience.as_deref().filter(|a| !a.trim().is_empty()) {
        prompt.push_str(&format!("The audience is: {}\n", audience.trim()));
    }
    if let Some(notes) = request.notes.as_deref().filter(|n| !n.trim().is_empty()) {
        prompt.push_str(&format!("\nSource material and notes:\n{}\n", notes.trim()));
    }

    prompt.push_str(
        "\nRespond with a JSON object of the shape \
         {\"subject\": string, \"sections\": [{\"heading\": string, \"body\": string}]}.",
    );
    prompt
}

pub fn thread_prompt(request: &ThreadRequest) -> String {
    let posts = request.post_count.unwrap_or(DEFAULT_THREAD_POSTS);

    format!(
        "Turn the following content into a social media thread of about {} posts. \
         Each post must stand on its own and stay under 280 characters.\n\n\
         Content:\n{}\n\n\
         Respond with a JSON object of the shape {{\"threads\": [string]}}.",
        posts,
        request.content.trim(),
    )
}

pub fn lie_detector_prompt(request: &LieDetectorRequest) -> String {
    format!(
        "Identify the factual claims in the following content and assess each one.\n\n\
         Content:\n{}\n\n\
         Respond with a JSON object of the shape \
         {{\"verdict\": string, \"confidence\": number, \
         \"claims\": [{{\"claim\": string, \"assessment\": string, \"explanation\": string}}]}}. \
         The verdict summarizes the overall reliability; confidence is between 0 and 1.",
        request.content.trim(),
    )
}

pub fn summary_prompt(request: &SummaryRequest) -> String {
    let mut prompt = String::from("Summarize the following content");
    if let Some(length) = request.length.as_deref().filter(|l| !l.trim().is_empty()) {
        prompt.push_str(&format!(" in {}", length.trim()));
    }
    prompt.push_str(&format!(
        ".\n\nContent:\n{}\n\n\
         Respond with a JSON object of the shape {{\"summary\": string, \"key_points\": [string]}}.",
        request.content.trim(),
    ));
    prompt
}

/// Title under which a tool result is stored: the topic for newsletters, a
/// truncated slice of the source content otherwise.
pub fn content_title(source: &str) -> String {
    const MAX_TITLE: usize = 80;
    let trimmed = source.trim();
    if trimmed.chars().count() <= MAX_TITLE {
        trimmed.to_string()
    } else {
        let truncated: String = trimmed.chars().take(MAX_TITLE).collect();
        format!("{truncated}...")
    }
}
