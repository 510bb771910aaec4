use crate::GenerationRequest;

const FLASHCARD_CUE: &str = "question and answer pairs";

/// Deterministic stand-in for a hosted model.
///
/// Flashcard prompts get one `Q:`/`A:` pair built from the fenced notes; any
/// other prompt gets the first words of its last fenced block.
pub(crate) fn synthesize_local_response(req: &GenerationRequest) -> String {
    let body = last_fenced_block(&req.user).unwrap_or(&req.user);
    if req.user.to_lowercase().contains(FLASHCARD_CUE) {
        let topic = summarize_text(body, 6);
        let answer = summarize_text(body, 60);
        if topic.is_empty() {
            return String::new();
        }
        return format!("Q: What do the notes say about \"{topic}\"?\nA: {answer}");
    }
    summarize_text(body, 80)
}

fn last_fenced_block(text: &str) -> Option<&str> {
    let end = text.rfind("```")?;
    let start = text[..end].rfind("```")? + 3;
    let block = text[start..end].trim();
    (!block.is_empty()).then_some(block)
}

fn summarize_text(text: &str, max_words: usize) -> String {
    text.split_whitespace()
        .take(max_words)
        .collect::<Vec<&str>>()
        .join(" ")
}
