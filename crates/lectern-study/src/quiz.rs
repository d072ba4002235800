//! Quiz grading and results.

use chrono::Utc;
use lectern_core::error::{LecternError, Result};
use lectern_core::types::{Quiz, QuizQuestion, UserAnswer};
use serde::Serialize;

use crate::assistant::StudyAssistant;

/// One submitted answer, before grading.
#[derive(Debug, Clone)]
pub struct AnswerInput {
    pub question_index: usize,
    pub selected_answer: String,
}

impl AnswerInput {
    pub fn new(question_index: usize, selected_answer: impl Into<String>) -> Self {
        Self {
            question_index,
            selected_answer: selected_answer.into(),
        }
    }
}

/// Grade `answers` and record them on `quiz`.
///
/// Rejects a quiz that is already completed, out-of-range indices and
/// duplicate answers for the same question. Unanswered questions count as
/// wrong. `score` is the rounded percentage of correct answers.
pub fn grade(quiz: &mut Quiz, answers: &[AnswerInput]) -> Result<()> {
    if quiz.is_completed() {
        return Err(LecternError::invalid(format!(
            "quiz {} has already been submitted",
            quiz.id
        )));
    }
    if answers.is_empty() {
        return Err(LecternError::invalid("no answers submitted"));
    }

    let mut seen = vec![false; quiz.questions.len()];
    let now = Utc::now();
    let mut graded = Vec::with_capacity(answers.len());

    for answer in answers {
        let Some(question) = quiz.questions.get(answer.question_index) else {
            return Err(LecternError::InvalidArgument(format!(
                "question index {} out of range (quiz has {})",
                answer.question_index,
                quiz.questions.len()
            )));
        };
        if std::mem::replace(&mut seen[answer.question_index], true) {
            return Err(LecternError::InvalidArgument(format!(
                "question {} answered twice",
                answer.question_index
            )));
        }
        graded.push(UserAnswer {
            question_index: answer.question_index,
            selected_answer: answer.selected_answer.trim().to_string(),
            is_correct: is_correct(question, &answer.selected_answer),
            answered_at: now,
        });
    }

    let correct = graded.iter().filter(|a| a.is_correct).count();
    quiz.score = percentage(correct, quiz.questions.len());
    quiz.user_answers = graded;
    quiz.completed_at = Some(now);
    Ok(())
}

fn is_correct(question: &QuizQuestion, selected: &str) -> bool {
    question.correct_answer.trim().eq_ignore_ascii_case(selected.trim())
}

fn percentage(correct: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    ((correct as f64 / total as f64) * 100.0).round() as u32
}

/// One row of a graded quiz.
#[derive(Debug, Clone, Serialize)]
pub struct QuestionResult {
    pub question_index: usize,
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer: String,
    pub selected_answer: Option<String>,
    pub is_correct: bool,
    pub explanation: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct QuizResults {
    pub quiz_id: String,
    pub title: String,
    pub score: u32,
    pub correct_count: usize,
    pub total_questions: usize,
    pub questions: Vec<QuestionResult>,
}

/// Pair each question with the submitted answer. Fails if the quiz is not completed.
pub fn results(quiz: &Quiz) -> Result<QuizResults> {
    if !quiz.is_completed() {
        return Err(LecternError::invalid(format!(
            "quiz {} has not been submitted",
            quiz.id
        )));
    }

    let questions: Vec<QuestionResult> = quiz
        .questions
        .iter()
        .enumerate()
        .map(|(i, q)| {
            let answer = quiz.user_answers.iter().find(|a| a.question_index == i);
            QuestionResult {
                question_index: i,
                question: q.question.clone(),
                options: q.options.clone(),
                correct_answer: q.correct_answer.clone(),
                selected_answer: answer.map(|a| a.selected_answer.clone()),
                is_correct: answer.is_some_and(|a| a.is_correct),
                explanation: q.explanation.clone(),
            }
        })
        .collect();

    Ok(QuizResults {
        quiz_id: quiz.id.clone(),
        title: quiz.title.clone(),
        score: quiz.score,
        correct_count: questions.iter().filter(|q| q.is_correct).count(),
        total_questions: quiz.total_questions,
        questions,
    })
}

impl StudyAssistant {
    pub async fn quizzes(&self, document_id: &str) -> Result<Vec<Quiz>> {
        self.document(document_id).await?;
        self.study.list_quizzes(document_id).await
    }

    pub async fn quiz(&self, quiz_id: &str) -> Result<Quiz> {
        self.study
            .get_quiz(quiz_id)
            .await?
            .ok_or_else(|| LecternError::NotFound(format!("quiz {quiz_id}")))
    }

    /// Grade and persist a submission.
    pub async fn submit_quiz(&self, quiz_id: &str, answers: &[AnswerInput]) -> Result<Quiz> {
        let mut quiz = self.quiz(quiz_id).await?;
        grade(&mut quiz, answers)?;
        self.study.save_quiz(&quiz).await?;
        tracing::info!("✅ Quiz {quiz_id} submitted: {}%", quiz.score);
        Ok(quiz)
    }

    pub async fn quiz_results(&self, quiz_id: &str) -> Result<QuizResults> {
        results(&self.quiz(quiz_id).await?)
    }
}
