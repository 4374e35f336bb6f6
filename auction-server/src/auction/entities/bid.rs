use {
    super::AskId,
    crate::{
        kernel::entities::UserId,
        relationship::entities::RelationshipId,
    },
    time::OffsetDateTime,
    uuid::Uuid,
};

pub type BidId = Uuid;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BidStatus {
    Pending,
    Accepted { relationship_id: RelationshipId },
    Rejected,
}

impl BidStatus {
    pub fn is_pending(&self) -> bool {
        matches!(self, BidStatus::Pending)
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, BidStatus::Accepted { .. })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Bid {
    pub id:          BidId,
    pub ask_id:      AskId,
    pub bidder:      UserId,
    /// Display name snapshot taken at submission time.
    pub bidder_name: String,
    pub amount:      i64,
    pub pitch:       String,
    pub status:      BidStatus,
    pub submitted_at: OffsetDateTime,
}

impl Bid {
    /// A later bid by the same bidder logically replaces this one for
    /// acceptance and statistics. Display-level only; the stored status
    /// never changes on supersession.
    pub fn is_superseded_by(&self, other: &Bid) -> bool {
        other.id != self.id
            && other.bidder == self.bidder
            && other.submitted_at > self.submitted_at
    }
}

/// The most recent bid by `bidder`, any status.
pub fn active_bid_of<'a>(bids: &'a [Bid], bidder: UserId) -> Option<&'a Bid> {
    bids.iter()
        .filter(|bid| bid.bidder == bidder)
        .max_by_key(|bid| bid.submitted_at)
}

pub fn is_superseded(bids: &[Bid], bid: &Bid) -> bool {
    bids.iter().any(|other| bid.is_superseded_by(other))
}

/// Aggregates over pending bids only.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BidStatistics {
    pub count:   u64,
    pub lowest:  Option<i64>,
    pub average: Option<f64>,
}

impl BidStatistics {
    pub fn over_pending(bids: &[Bid]) -> Self {
        let amounts: Vec<i64> = bids
            .iter()
            .filter(|bid| bid.status.is_pending())
            .map(|bid| bid.amount)
            .collect();
        let count = amounts.len() as u64;
        Self {
            count,
            lowest: amounts.iter().copied().min(),
            average: (count > 0)
                .then(|| amounts.iter().sum::<i64>() as f64 / count as f64),
        }
    }
}
