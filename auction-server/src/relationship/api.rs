use {
    super::{
        entities,
        service::{
            get_contact_reveal::GetContactRevealInput,
            get_relationships::GetRelationshipsInput,
        },
    },
    crate::{
        api::{
            Auth,
            RestError,
            WrappedRouter,
        },
        state::StoreNew,
    },
    ask_auction_api_types::{
        ask::{
            AskPathParams,
            Route as AskRoute,
        },
        relationship::{
            ContactReveal,
            PaymentTerms,
            Relationship,
            RelationshipStatus,
            Relationships,
            Route as RelationshipRoute,
        },
        ErrorBodyResponse,
    },
    axum::{
        extract::{
            Path,
            State,
        },
        Json,
        Router,
    },
    std::sync::Arc,
};

pub fn to_api_relationship(relationship: &entities::Relationship) -> Relationship {
    Relationship {
        id: relationship.id,
        code: relationship.code.clone(),
        requester: relationship.requester,
        requester_name: relationship.requester_name.clone(),
        provider: relationship.provider,
        provider_name: relationship.provider_name.clone(),
        ask_id: relationship.ask_id,
        bid_id: relationship.bid_id,
        status: match relationship.status {
            entities::RelationshipStatus::Active => RelationshipStatus::Active,
            entities::RelationshipStatus::Completed => RelationshipStatus::Completed,
            entities::RelationshipStatus::Expired => RelationshipStatus::Expired,
            entities::RelationshipStatus::Cancelled => RelationshipStatus::Cancelled,
        },
        payment: PaymentTerms {
            kind:   relationship.payment.kind.into(),
            amount: relationship.payment.amount,
        },
        expires_at: relationship.expires_at,
        created_at: relationship.created_at,
    }
}

pub fn to_api_contact_reveal(reveal: &entities::ContactReveal) -> ContactReveal {
    ContactReveal {
        id:          reveal.id,
        ask_id:      reveal.ask_id,
        bid_id:      reveal.bid_id,
        name:        reveal.name.clone(),
        email:       reveal.email.clone(),
        phone:       reveal.phone.clone(),
        revealed_at: reveal.revealed_at,
    }
}

/// The caller's relationships, most recent first.
#[utoipa::path(get, path = "/v1/relationships", responses(
    (status = 200, description = "The relationships the caller is a party of", body = Relationships),
),)]
pub async fn get_relationships(
    auth: Auth,
    State(store): State<Arc<StoreNew>>,
) -> Result<Json<Relationships>, RestError> {
    let user = auth.user_id()?;
    let relationships = store
        .relationship_service
        .get_relationships(GetRelationshipsInput { user })
        .await?;
    Ok(Json(Relationships {
        items: relationships.iter().map(to_api_relationship).collect(),
    }))
}

/// The winning bidder's contact card for an ask you own.
///
/// Contact data flows only through this reveal; bid records never carry it.
#[utoipa::path(get, path = "/v1/asks/{ask_id}/reveal", params(AskPathParams), responses(
    (status = 200, description = "The contact snapshot taken at acceptance", body = ContactReveal),
    (status = 403, description = "Only the ask owner sees the reveal", body = ErrorBodyResponse),
    (status = 404, description = "No reveal exists for this ask", body = ErrorBodyResponse),
),)]
pub async fn get_contact_reveal(
    auth: Auth,
    State(store): State<Arc<StoreNew>>,
    Path(params): Path<AskPathParams>,
) -> Result<Json<ContactReveal>, RestError> {
    let actor = auth.user_id()?;
    let reveal = store
        .relationship_service
        .get_contact_reveal(GetContactRevealInput {
            ask_id: params.ask_id,
            actor,
        })
        .await?;
    Ok(Json(to_api_contact_reveal(&reveal)))
}

pub fn get_routes(store: Arc<StoreNew>) -> Router<Arc<StoreNew>> {
    WrappedRouter::new(store)
        .route(RelationshipRoute::GetRelationships, get_relationships)
        .route(AskRoute::GetContactReveal, get_contact_reveal)
        .router
}
