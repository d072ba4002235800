//! Prompt construction for the study flows.

use lectern_core::types::Chunk;

/// First `max_chars` characters of `text`, never splitting a UTF-8 sequence.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

/// Retrieved chunks as numbered context blocks: `[Chunk 1]\n...`, separated by blank lines.
pub fn context_blocks(chunks: &[Chunk]) -> String {
    chunks
        .iter()
        .enumerate()
        .map(|(i, c)| format!("[Chunk {}]\n{}", i + 1, c.content))
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn chat(question: &str, chunks: &[Chunk]) -> String {
    format!(
        "You are a helpful study assistant. Answer the question using only the provided context. \
If the context does not contain the answer, say so.\n\n\
Context:\n{}\n\n\
Question:\n{}\n\n\
Answer:\n",
        context_blocks(chunks),
        question.trim()
    )
}

pub fn explain(concept: &str, chunks: &[Chunk], max_chars: usize) -> String {
    let context = context_blocks(chunks);
    format!(
        "Explain the concept of \"{}\" based on the following context.\n\
Give a clear, structured explanation that is easy to understand, \
with relevant examples or real-world applications.\n\n\
Context:\n{}\n\n\
Explanation:\n",
        concept.trim(),
        truncate_chars(&context, max_chars)
    )
}

pub fn flashcards(text: &str, count: usize, max_chars: usize) -> String {
    format!(
        "Generate {count} educational flashcards from the following text.\n\
Format each flashcard as:\n\
Q: [Clear, specific question]\n\
A: [Clear, specific answer]\n\
D: [Difficulty level: easy, medium, hard]\n\n\
Separate each flashcard with \"---\".\n\n\
Text:\n{}\n",
        truncate_chars(text, max_chars)
    )
}

pub fn quiz(text: &str, questions: usize, max_chars: usize) -> String {
    format!(
        "Generate exactly {questions} multiple choice questions from the following text.\n\
Format each question as:\n\
Q: [Question]\n\
01: [Option]\n\
02: [Option]\n\
03: [Option]\n\
04: [Option]\n\
C: [Correct option, exactly as written above]\n\
E: [Brief explanation of why this is the correct answer]\n\
D: [Difficulty: easy, medium, hard]\n\n\
Separate each question with \"---\".\n\n\
Text:\n{}\n",
        truncate_chars(text, max_chars)
    )
}

pub fn summary(text: &str, max_chars: usize) -> String {
    format!(
        "Provide a concise summary of the following text, highlighting the key concepts, \
main ideas and important details. Keep the summary clear and structured.\n\n\
Text:\n{}\n",
        truncate_chars(text, max_chars)
    )
}
