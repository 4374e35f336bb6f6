use {
    super::Repository,
    crate::{
        api::RestError,
        auction::entities,
        kernel::entities::UserId,
    },
};

impl Repository {
    /// The bidder's most recent bid on the ask, whatever its status. Earlier
    /// ones are superseded for display.
    pub async fn get_active_bid(
        &self,
        ask_id: entities::AskId,
        bidder: UserId,
    ) -> Result<Option<entities::Bid>, RestError> {
        let bids = self.get_bids(ask_id).await?;
        Ok(entities::active_bid_of(&bids, bidder).cloned())
    }
}
