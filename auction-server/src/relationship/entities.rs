use {
    crate::{
        auction::entities::{
            AskId,
            BidId,
            CompensationKind,
        },
        kernel::entities::UserId,
    },
    email_address::EmailAddress,
    time::OffsetDateTime,
    uuid::Uuid,
};

pub type RelationshipId = Uuid;
pub type ContactRevealId = Uuid;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RelationshipStatus {
    Active,
    Completed,
    Expired,
    Cancelled,
}

/// Payment terms frozen at acceptance time; later ask edits never reach here.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PaymentTerms {
    pub kind:   CompensationKind,
    pub amount: i64,
}

/// The durable record of a successful match, created exactly once per
/// accepted (ask, bid) pair. The message bookkeeping fields are mutated by
/// the messaging subsystem, not by this engine.
#[derive(Clone, Debug, PartialEq)]
pub struct Relationship {
    pub id:             RelationshipId,
    pub code:           String,
    pub requester:      UserId,
    pub requester_name: String,
    pub provider:       UserId,
    pub provider_name:  String,
    pub ask_id:         AskId,
    pub bid_id:         BidId,
    pub status:         RelationshipStatus,
    pub payment:        PaymentTerms,
    pub pair_sequence:  i32,
    pub expires_at:     Option<OffsetDateTime>,
    pub created_at:     OffsetDateTime,
    pub last_activity_at: OffsetDateTime,
    pub unread_requester: i32,
    pub unread_provider:  i32,
}

/// One-time disclosure of the winning bidder's contact card to the
/// requester. A snapshot: later profile edits never alter it.
#[derive(Clone, Debug, PartialEq)]
pub struct ContactReveal {
    pub id:          ContactRevealId,
    pub ask_id:      AskId,
    pub bid_id:      BidId,
    pub requester:   UserId,
    pub provider:    UserId,
    pub name:        String,
    pub email:       EmailAddress,
    pub phone:       String,
    pub revealed_at: OffsetDateTime,
}

/// Two-letter block for a collaboration code: the initials of the first two
/// space-separated name tokens, padded with `X` for single-token names.
pub fn name_block(name: &str) -> String {
    let mut initials: Vec<char> = name
        .split_whitespace()
        .take(2)
        .filter_map(|token| token.chars().next())
        .flat_map(|c| c.to_uppercase())
        .collect();
    initials.truncate(2);
    while initials.len() < 2 {
        initials.push('X');
    }
    initials.into_iter().collect()
}

/// `BLOCK1 BLOCK2 NNNN` with the provider block first and a zero-padded
/// per-pair sequence.
pub fn collaboration_code(provider_name: &str, requester_name: &str, sequence: i32) -> String {
    format!(
        "{}{}{:04}",
        name_block(provider_name),
        name_block(requester_name),
        sequence
    )
}
