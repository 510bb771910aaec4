//! Prompt builders. Inputs are fenced in triple backticks so the model can
//! tell instructions from material.

use memora_llm::GenerationRequest;

pub fn flashcard_request(subject: &str, notes: &str) -> GenerationRequest {
    GenerationRequest::user(format!(
        "Write question and answer pairs that test a university student on the notes below, \
         which belong to the subject ```{subject}```.\n\
         Mix recall questions with ones that ask the student to explain or apply an idea. \
         Ask about concepts, not about layout, figures or section numbers. \
         Cover everything in the notes and give complete answers; fill gaps from general \
         knowledge only when the notes are silent. The notes were extracted from documents \
         and may contain garbled symbols or equations: repair them rather than copying them.\n\
         Output format: every pair as `Q: <question>` on one line and `A: <answer>` on the \
         next, with a blank line between pairs and nothing else.\n\
         Notes: ```{notes}```"
    ))
}

pub fn answer_request(context: &str, question: &str) -> GenerationRequest {
    GenerationRequest::user(question.trim()).with_system(format!(
        "Answer the student's question using the study material below, fenced in triple \
         backticks. Where the material does not state the answer directly, infer it from the \
         material with sound reasoning. Define the terms of any equation you use and keep \
         equations mathematically correct. Replace corrupted characters with the intended \
         symbol when you can tell what it is. Reply in markdown.\n\
         Material: ```{context}```"
    ))
}

pub fn rewrite_request(answer: &str, detail_level: u8) -> GenerationRequest {
    GenerationRequest::user(format!("```{answer}```")).with_system(format!(
        "Rewrite the answer the user sends with more detail. Detail level: {detail_level} out \
         of 10, where 10 means the most thorough explanation possible of every idea involved. \
         Explain the terms of every equation and keep them mathematically sound. Reply in \
         markdown with equations in LaTeX."
    ))
}

pub fn explain_request(answer: &str, question: Option<&str>) -> GenerationRequest {
    let task = match question {
        Some(question) => format!(
            "First respond in detail to the student's question ```{question}```, using the \
             flashcard answer for context. Then expand on the flashcard answer itself."
        ),
        None => "Expand on the flashcard answer and explain every idea in it clearly."
            .to_string(),
    };
    GenerationRequest::user(format!(
        "{task} Stay factually accurate, reply in markdown and do not repeat the question.\n\
         Flashcard answer: ```{answer}```"
    ))
}
