use {
    super::Repository,
    crate::{
        api::RestError,
        auction::entities,
    },
};

impl Repository {
    pub async fn get_bid_statistics(
        &self,
        ask_id: entities::AskId,
    ) -> Result<entities::BidStatistics, RestError> {
        let bids = self.get_bids(ask_id).await?;
        Ok(entities::BidStatistics::over_pending(&bids))
    }
}
