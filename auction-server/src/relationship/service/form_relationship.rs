use {
    super::Service,
    crate::{
        auction::entities as auction_entities,
        models::Profile,
        relationship::entities,
    },
    uuid::Uuid,
};

pub struct FormRelationshipInput<'a> {
    pub ask:       &'a auction_entities::Ask,
    pub bid:       &'a auction_entities::Bid,
    pub requester: Profile,
    pub provider:  Profile,
}

impl Service {
    /// Builds the durable match record and the contact snapshot for an
    /// acceptance. Infallible on purpose: a sequence-lookup outage falls
    /// back to the first sequence rather than blocking the acceptance, and
    /// the possible duplicate code is logged for later reconciliation.
    #[tracing::instrument(skip_all, fields(ask_id = ?input.ask.id, bid_id = ?input.bid.id, code))]
    pub async fn form_relationship(
        &self,
        input: FormRelationshipInput<'_>,
    ) -> (entities::Relationship, entities::ContactReveal) {
        let pair_sequence = match self
            .repo
            .get_highest_pair_sequence(input.provider.id, input.requester.id)
            .await
        {
            Ok(highest) => highest.unwrap_or(0) + 1,
            Err(e) => {
                tracing::error!(
                    error = e.to_string(),
                    defect = "duplicate_collaboration_code",
                    "Sequence lookup failed; defaulting to the first sequence. \
                     The generated code may collide and needs reconciliation."
                );
                1
            }
        };
        let code = entities::collaboration_code(
            &input.provider.name,
            &input.requester.name,
            pair_sequence,
        );
        tracing::Span::current().record("code", code.as_str());

        let now = self.clock.now();
        let relationship = entities::Relationship {
            id: Uuid::new_v4(),
            code,
            requester: input.requester.id,
            requester_name: input.requester.name.clone(),
            provider: input.provider.id,
            provider_name: input.provider.name.clone(),
            ask_id: input.ask.id,
            bid_id: input.bid.id,
            status: entities::RelationshipStatus::Active,
            payment: entities::PaymentTerms {
                kind:   input.ask.compensation.kind,
                amount: input.bid.amount,
            },
            pair_sequence,
            expires_at: input.ask.schedule.derived_expiry(),
            created_at: now,
            last_activity_at: now,
            unread_requester: 0,
            unread_provider: 0,
        };
        let contact_reveal = entities::ContactReveal {
            id: Uuid::new_v4(),
            ask_id: input.ask.id,
            bid_id: input.bid.id,
            requester: input.requester.id,
            provider: input.provider.id,
            name: input.provider.name,
            email: input.provider.email,
            phone: input.provider.phone,
            revealed_at: now,
        };
        (relationship, contact_reveal)
    }
}
