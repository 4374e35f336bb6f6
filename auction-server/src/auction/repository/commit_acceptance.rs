use {
    super::{
        models,
        Repository,
    },
    crate::{
        api::RestError,
        auction::entities,
        relationship::{
            entities as relationship_entities,
            repository::models as relationship_models,
        },
    },
};

impl Repository {
    /// Commits the acceptance transaction and brings the in-memory working
    /// set in line with it. Callers hold the ask lock, so readers taking the
    /// row locks observe either none or all of the mutation.
    pub async fn commit_acceptance(
        &self,
        ask_id: entities::AskId,
        bid_id: entities::BidId,
        relationship: &relationship_entities::Relationship,
        contact_reveal: &relationship_entities::ContactReveal,
    ) -> Result<(), RestError> {
        self.db
            .commit_acceptance(&models::Acceptance {
                ask_id,
                bid_id,
                relationship: relationship_models::Relationship::new(relationship),
                contact_reveal: relationship_models::ContactReveal::new(contact_reveal),
            })
            .await?;

        if let Some(ask) = self.in_memory_store.asks.write().await.get_mut(&ask_id) {
            ask.status = entities::AskStatus::Completed;
        }
        if let Some(bids) = self.in_memory_store.bids.write().await.get_mut(&ask_id) {
            for bid in bids.iter_mut() {
                bid.status = if bid.id == bid_id {
                    entities::BidStatus::Accepted {
                        relationship_id: relationship.id,
                    }
                } else {
                    entities::BidStatus::Rejected
                };
            }
        }
        Ok(())
    }
}
