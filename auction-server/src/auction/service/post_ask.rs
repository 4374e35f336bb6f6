use {
    super::Service,
    crate::{
        api::{
            ws::UpdateEvent,
            RestError,
        },
        auction::{
            api::to_api_ask,
            entities,
        },
        kernel::entities::UserId,
    },
    time::OffsetDateTime,
    uuid::Uuid,
};

pub struct PostAskInput {
    pub owner:        UserId,
    pub compensation: entities::Compensation,
    pub schedule:     entities::Schedule,
    pub requirements: String,
    pub auction_ends_at: Option<OffsetDateTime>,
}

impl Service {
    #[tracing::instrument(skip_all, fields(ask_id, owner = ?input.owner))]
    pub async fn post_ask(&self, input: PostAskInput) -> Result<entities::Ask, RestError> {
        self.verify_ask_terms(&input.compensation, &input.schedule)?;

        let now = self.clock.now();
        if let Some(end) = input.auction_ends_at {
            if end <= now {
                return Err(RestError::BadParameters(
                    "auction window already lapsed".to_string(),
                ));
            }
        }

        let ask = entities::Ask {
            id: Uuid::new_v4(),
            owner: input.owner,
            compensation: input.compensation,
            schedule: input.schedule,
            requirements: input.requirements,
            auction_ends_at: input.auction_ends_at,
            status: entities::AskStatus::Active,
            archived_at: None,
            created_at: now,
        };
        tracing::Span::current().record("ask_id", ask.id.to_string());

        let ask = self.repo.add_ask(ask).await?;
        self.send_event(UpdateEvent::NewAsk(to_api_ask(&ask, now)));
        Ok(ask)
    }
}
