//! Parsing of the line-prefixed blocks the provider is asked to produce.
//!
//! Blocks are separated by `---`. Within a block each field sits on its own
//! line behind a fixed prefix (`Q:`, `A:`, `D:` ...). Blocks missing a required
//! field are dropped with a warning rather than failing the whole response.

use lectern_core::types::{Difficulty, Flashcard, QuizQuestion};

const SEPARATOR: &str = "---";

fn blocks(text: &str) -> impl Iterator<Item = &str> {
    text.split(SEPARATOR).map(str::trim).filter(|b| !b.is_empty())
}

/// Value after `prefix` on a trimmed line, if the line starts with it.
fn field<'a>(line: &'a str, prefix: &str) -> Option<&'a str> {
    line.strip_prefix(prefix).map(str::trim)
}

/// Parse up to `count` flashcards. Cards need both a question and an answer.
pub fn parse_flashcards(text: &str, count: usize) -> Vec<Flashcard> {
    let mut cards = Vec::new();
    if count == 0 {
        return cards;
    }
    for block in blocks(text) {
        let mut question = "";
        let mut answer = "";
        let mut difficulty = Difficulty::default();

        for line in block.lines().map(str::trim) {
            if let Some(v) = field(line, "Q:") {
                question = v;
            } else if let Some(v) = field(line, "A:") {
                answer = v;
            } else if let Some(v) = field(line, "D:") {
                difficulty = Difficulty::from_label(v);
            }
        }

        if question.is_empty() || answer.is_empty() {
            tracing::warn!("⚠️ Skipping flashcard block without question or answer");
            continue;
        }
        cards.push(Flashcard::new(question, answer, difficulty));
        if cards.len() == count {
            break;
        }
    }
    cards
}

/// Parse up to `count` quiz questions.
///
/// A question needs exactly four options and a correct answer that resolves
/// to one of them, either verbatim (case-insensitive) or by its label
/// (`01`..`04`).
pub fn parse_quiz(text: &str, count: usize) -> Vec<QuizQuestion> {
    const OPTION_PREFIXES: [&str; 4] = ["01:", "02:", "03:", "04:"];

    let mut questions = Vec::new();
    if count == 0 {
        return questions;
    }
    for block in blocks(text) {
        let mut question = "";
        let mut options: Vec<String> = Vec::with_capacity(4);
        let mut correct = "";
        let mut explanation = "";
        let mut difficulty = Difficulty::default();

        for line in block.lines().map(str::trim) {
            if let Some(v) = field(line, "Q:") {
                question = v;
            } else if let Some(v) = OPTION_PREFIXES.iter().find_map(|p| field(line, p)) {
                options.push(v.to_string());
            } else if let Some(v) = field(line, "C:") {
                correct = v;
            } else if let Some(v) = field(line, "E:") {
                explanation = v;
            } else if let Some(v) = field(line, "D:") {
                difficulty = Difficulty::from_label(v);
            }
        }

        if question.is_empty() || options.len() != 4 || correct.is_empty() {
            tracing::warn!("⚠️ Skipping malformed quiz block ({} options)", options.len());
            continue;
        }
        let Some(correct_answer) = resolve_option(&options, correct) else {
            tracing::warn!("⚠️ Skipping quiz question whose answer matches no option");
            continue;
        };

        questions.push(QuizQuestion {
            question: question.to_string(),
            options,
            correct_answer,
            explanation: explanation.to_string(),
            difficulty,
        });
        if questions.len() == count {
            break;
        }
    }
    questions
}

fn resolve_option(options: &[String], answer: &str) -> Option<String> {
    let answer = answer.trim();
    if let Some(opt) = options.iter().find(|o| o.eq_ignore_ascii_case(answer)) {
        return Some(opt.clone());
    }
    let label = answer.trim_end_matches(':');
    ["01", "02", "03", "04"]
        .iter()
        .position(|l| *l == label)
        .and_then(|i| options.get(i).cloned())
}
