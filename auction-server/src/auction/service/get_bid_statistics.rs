use {
    super::Service,
    crate::{
        api::RestError,
        auction::entities,
    },
};

pub struct GetBidStatisticsInput {
    pub ask_id: entities::AskId,
}

impl Service {
    pub async fn get_bid_statistics(
        &self,
        input: GetBidStatisticsInput,
    ) -> Result<entities::BidStatistics, RestError> {
        self.repo
            .get_ask(input.ask_id)
            .await?
            .ok_or(RestError::AskNotFound)?;
        self.repo.get_bid_statistics(input.ask_id).await
    }
}
