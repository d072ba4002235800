//! Flashcard review, starring and set management.

use chrono::Utc;
use lectern_core::error::{LecternError, Result};
use lectern_core::types::{Flashcard, FlashcardSet};

use crate::assistant::StudyAssistant;

/// Count one review of `card`.
pub fn review(card: &mut Flashcard) {
    card.review_count = card.review_count.saturating_add(1);
    card.last_reviewed_at = Some(Utc::now());
}

/// Flip the star on `card`; returns the new state.
pub fn toggle_star(card: &mut Flashcard) -> bool {
    card.is_starred = !card.is_starred;
    card.is_starred
}

impl StudyAssistant {
    pub async fn flashcard_sets(&self, document_id: &str) -> Result<Vec<FlashcardSet>> {
        self.document(document_id).await?;
        self.study.list_flashcard_sets(document_id).await
    }

    pub async fn flashcard_set(&self, set_id: &str) -> Result<FlashcardSet> {
        self.study
            .get_flashcard_set(set_id)
            .await?
            .ok_or_else(|| LecternError::NotFound(format!("flashcard set {set_id}")))
    }

    pub async fn review_flashcard(&self, set_id: &str, card_id: &str) -> Result<Flashcard> {
        self.update_card(set_id, card_id, |card| review(card)).await
    }

    pub async fn toggle_flashcard_star(&self, set_id: &str, card_id: &str) -> Result<Flashcard> {
        self.update_card(set_id, card_id, |card| {
            toggle_star(card);
        })
        .await
    }

    pub async fn delete_flashcard_set(&self, set_id: &str) -> Result<()> {
        if !self.study.delete_flashcard_set(set_id).await? {
            return Err(LecternError::NotFound(format!("flashcard set {set_id}")));
        }
        Ok(())
    }

    async fn update_card<F>(&self, set_id: &str, card_id: &str, apply: F) -> Result<Flashcard>
    where
        F: FnOnce(&mut Flashcard) + Send,
    {
        let mut set = self.flashcard_set(set_id).await?;
        let card = set
            .card_mut(card_id)
            .ok_or_else(|| LecternError::NotFound(format!("card {card_id} in set {set_id}")))?;
        apply(card);
        let updated = card.clone();
        self.study.save_flashcard_set(&set).await?;
        Ok(updated)
    }
}
