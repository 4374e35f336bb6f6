use {
    super::Service,
    crate::{
        api::RestError,
        auction::entities,
    },
};

pub struct GetAskInput {
    pub ask_id: entities::AskId,
}

impl Service {
    pub async fn get_ask(&self, input: GetAskInput) -> Result<entities::Ask, RestError> {
        self.repo
            .get_ask(input.ask_id)
            .await?
            .ok_or(RestError::AskNotFound)
    }
}
