use {
    super::{
        models,
        Repository,
    },
    crate::{
        api::RestError,
        auction::entities,
    },
    time::OffsetDateTime,
};

impl Repository {
    /// Persists the bid and, when the anti-snipe rule fired, the pushed end
    /// time, as one transaction. Callers hold the ask lock.
    pub async fn add_bid(
        &self,
        bid: entities::Bid,
        new_end_time: Option<OffsetDateTime>,
    ) -> Result<entities::Bid, RestError> {
        // Make sure the ledger entry holds the full bid set before pushing.
        self.get_bids(bid.ask_id).await?;

        self.db
            .add_bid(&models::Bid::new(&bid), new_end_time.map(models::primitive))
            .await?;

        self.in_memory_store
            .bids
            .write()
            .await
            .entry(bid.ask_id)
            .or_default()
            .push(bid.clone());

        if let Some(end) = new_end_time {
            if let Some(ask) = self.in_memory_store.asks.write().await.get_mut(&bid.ask_id) {
                ask.auction_ends_at = Some(end);
            }
        }

        Ok(bid)
    }
}
