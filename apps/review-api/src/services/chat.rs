//! Follow-up questions about a stored review.

use std::sync::Arc;

use review_engine::ChatQueryEngine;
use shared_types::{ChatTurn, LiveEvent};
use tracing::{instrument, warn};

use super::ServiceError;
use crate::presence::Notifier;
use crate::repository::{ChatRepository, ContractRepository, ReviewContext};

#[derive(Clone)]
pub struct ChatService {
    reviews: ContractRepository,
    chats: ChatRepository,
    engine: ChatQueryEngine,
    notifier: Arc<Notifier>,
}

impl ChatService {
    pub fn new(
        reviews: ContractRepository,
        chats: ChatRepository,
        engine: ChatQueryEngine,
        notifier: Arc<Notifier>,
    ) -> Self {
        Self {
            reviews,
            chats,
            engine,
            notifier,
        }
    }

    /// Answer `question` from the stored contract text, record the turn and
    /// push it to the asker's live connection.
    #[instrument(skip(self, question))]
    pub async fn ask(
        &self,
        acting_user: &str,
        contract_id: &str,
        question: &str,
    ) -> Result<ChatTurn, ServiceError> {
        let review = self.owned_review(acting_user, contract_id).await?;
        let answer = self
            .engine
            .ask(&review.contract_text, &review.category, question)
            .await?;

        let turn = self
            .chats
            .append(&review.id, question.trim(), &answer.answer)
            .await?;

        match serde_json::to_value(&turn) {
            Ok(payload) => {
                self.notifier
                    .push(acting_user, LiveEvent::NEW_MESSAGE, payload);
            }
            Err(e) => warn!(error = %e, "Failed to encode chat turn for push"),
        }
        Ok(turn)
    }

    pub async fn history(
        &self,
        acting_user: &str,
        contract_id: &str,
    ) -> Result<Vec<ChatTurn>, ServiceError> {
        let review = self.owned_review(acting_user, contract_id).await?;
        Ok(self.chats.list_by_contract(&review.id).await?)
    }

    async fn owned_review(
        &self,
        acting_user: &str,
        contract_id: &str,
    ) -> Result<ReviewContext, ServiceError> {
        let review = self.reviews.find_context(contract_id).await?;
        if review.owner_id != acting_user {
            return Err(ServiceError::Forbidden(contract_id.to_string()));
        }
        Ok(review)
    }
}
