use {
    super::Service,
    crate::{
        api::RestError,
        auction::entities,
    },
};

pub struct GetBidsInput {
    pub ask_id: entities::AskId,
}

impl Service {
    /// The full ledger of an ask, newest first. Fails with `AskNotFound`
    /// rather than returning an empty ledger for an ask that never existed.
    pub async fn get_bids(&self, input: GetBidsInput) -> Result<Vec<entities::Bid>, RestError> {
        self.repo
            .get_ask(input.ask_id)
            .await?
            .ok_or(RestError::AskNotFound)?;
        let mut bids = self.repo.get_bids(input.ask_id).await?;
        bids.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at));
        Ok(bids)
    }
}
