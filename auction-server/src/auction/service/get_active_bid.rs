use {
    super::Service,
    crate::{
        api::RestError,
        auction::entities,
        kernel::entities::UserId,
    },
};

pub struct GetActiveBidInput {
    pub ask_id: entities::AskId,
    pub bidder: UserId,
}

impl Service {
    pub async fn get_active_bid(
        &self,
        input: GetActiveBidInput,
    ) -> Result<Option<entities::Bid>, RestError> {
        self.repo
            .get_ask(input.ask_id)
            .await?
            .ok_or(RestError::AskNotFound)?;
        self.repo.get_active_bid(input.ask_id, input.bidder).await
    }
}
