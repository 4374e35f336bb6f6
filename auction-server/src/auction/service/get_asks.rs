use {
    super::Service,
    crate::{
        api::RestError,
        auction::entities,
    },
};

impl Service {
    pub async fn get_asks(&self) -> Result<Vec<entities::Ask>, RestError> {
        self.repo.get_asks().await
    }
}
