use {
    super::Service,
    crate::{
        api::RestError,
        auction::entities::AskId,
        kernel::entities::UserId,
        relationship::entities,
    },
};

pub struct GetContactRevealInput {
    pub ask_id: AskId,
    pub actor:  UserId,
}

impl Service {
    /// The reveal is disclosed to the requester who owns the ask and nobody
    /// else; the bid records themselves never carry contact data.
    pub async fn get_contact_reveal(
        &self,
        input: GetContactRevealInput,
    ) -> Result<entities::ContactReveal, RestError> {
        let reveal = self
            .repo
            .get_contact_reveal(input.ask_id)
            .await?
            .ok_or(RestError::RevealNotFound)?;
        if reveal.requester != input.actor {
            return Err(RestError::NotOwner);
        }
        Ok(reveal)
    }
}
