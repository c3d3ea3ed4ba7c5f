//! Prompt templates for each model call in the pipeline.

use topicpress_shared::SearchResult;

/// Summary text used when research produced nothing. No model call is made.
pub const NO_RESULTS_SUMMARY: &str = "No search results found.";

/// Research summary prompt. Sources are numbered from 1 in result order.
pub fn summarize(results: &[SearchResult]) -> String {
    let sources = results
        .iter()
        .enumerate()
        .map(|(i, r)| format!("Source {}: {}\n{}", i + 1, r.title, r.snippet))
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        "You are an AI research assistant. Analyze the following web search results and \
extract the key insights and important information:

{sources}

Provide a concise summary of the main points, trends, and important facts found in these sources."
    )
}

/// Long-form article prompt.
pub fn draft(topic: &str, research_summary: &str) -> String {
    format!(
        "You are a professional blog writer. Write a comprehensive, engaging, and \
well-structured blog article on the following topic:

**Topic:** {topic}

**Research Insights:**
{research_summary}

Requirements:
- Write a detailed, professional blog article (800-1200 words)
- Include an engaging introduction
- Use clear headings and subheadings
- Provide in-depth analysis and insights
- Include practical examples where relevant
- End with a thoughtful conclusion
- Use a conversational yet professional tone
- Make it informative and valuable to readers

Write the complete blog article now:"
    )
}

/// Editing pass over a finished draft.
pub fn polish(topic: &str, draft: &str) -> String {
    format!(
        "You are a senior editor. Polish the following blog article about \"{topic}\". \
Fix grammar and awkward phrasing, tighten repetitive passages, and keep the headings, \
structure, facts, and length intact. Return only the revised article in Markdown.

---

{draft}"
    )
}

/// Short reply to a greeting.
pub fn greeting(topic: &str) -> String {
    format!(
        "The user said: '{topic}'. Act as a friendly AI Blog Agent. Respond briefly and \
politely. If they ask how you are, say you are fine and ready to help with a blog topic."
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summarize_numbers_sources_in_order() {
        let results = vec![
            SearchResult {
                title: "First".into(),
                snippet: "one".into(),
                link: String::new(),
            },
            SearchResult {
                title: "Second".into(),
                snippet: "two".into(),
                link: String::new(),
            },
        ];
        let prompt = summarize(&results);
        assert!(prompt.contains("Source 1: First\none\n\nSource 2: Second\ntwo"));
    }

    #[test]
    fn draft_embeds_topic_and_summary() {
        let prompt = draft("Benefits of AI", "AI helps.");
        assert!(prompt.contains("**Topic:** Benefits of AI"));
        assert!(prompt.contains("**Research Insights:**\nAI helps."));
    }

    #[test]
    fn greeting_quotes_user_text() {
        assert!(greeting("hello").starts_with("The user said: 'hello'."));
    }
}
