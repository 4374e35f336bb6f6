use {
    crate::kernel::{
        clock,
        entities::UserId,
    },
    std::{
        sync::Arc,
        time::Duration,
    },
    time::{
        Date,
        OffsetDateTime,
    },
    tokio::sync::Mutex,
    uuid::Uuid,
};

pub type AskId = Uuid;
pub type AskLock = Arc<Mutex<()>>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AskStatus {
    Active,
    Completed,
    Expired,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompensationKind {
    Hourly,
    PerUnit,
    Flat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Compensation {
    pub kind:   CompensationKind,
    pub amount: i64,
}

/// Exactly one scheduling shape per ask; the enum makes the "one of three"
/// invariant structural.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Schedule {
    SingleDate(Date),
    DateRange { start: Date, end: Date },
    Term(String),
}

impl Schedule {
    /// The calendar instant after which a relationship formed from this ask
    /// lapses: the end of the last scheduled day. Named terms carry no
    /// calendar bound.
    pub fn derived_expiry(&self) -> Option<OffsetDateTime> {
        let last_day = match self {
            Schedule::SingleDate(date) => *date,
            Schedule::DateRange { end, .. } => *end,
            Schedule::Term(_) => return None,
        };
        last_day
            .next_day()
            .map(|day_after| day_after.midnight().assume_utc())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Ask {
    pub id:           AskId,
    pub owner:        UserId,
    pub compensation: Compensation,
    pub schedule:     Schedule,
    pub requirements: String,
    /// End of the bidding window. `None` means the ask stays open until a
    /// bid is accepted; such asks are never extended and never expire.
    pub auction_ends_at: Option<OffsetDateTime>,
    pub status:       AskStatus,
    pub archived_at:  Option<OffsetDateTime>,
    pub created_at:   OffsetDateTime,
}

impl Ask {
    /// The window has a bound and it has passed.
    pub fn has_lapsed(&self, now: OffsetDateTime) -> bool {
        self.auction_ends_at
            .map(|end| clock::is_expired(now, end))
            .unwrap_or(false)
    }

    /// Bids can still land on this ask.
    pub fn is_open(&self, now: OffsetDateTime) -> bool {
        self.status == AskStatus::Active && self.archived_at.is_none() && !self.has_lapsed(now)
    }

    pub fn is_last_day(&self, now: OffsetDateTime) -> bool {
        self.auction_ends_at
            .map(|end| clock::is_last_day(now, end))
            .unwrap_or(false)
    }

    /// The new end time mandated by the anti-snipe rule for a bid arriving at
    /// `now`, if any. The push is measured from the previous end time, never
    /// from the bid's arrival, so back-to-back closing bids compound.
    pub fn anti_snipe_extension(
        &self,
        now: OffsetDateTime,
        window: Duration,
        extension: Duration,
    ) -> Option<OffsetDateTime> {
        let end = self.auction_ends_at?;
        let remaining = clock::remaining(now, end);
        if remaining > Duration::ZERO && remaining < window {
            Some(end + extension)
        } else {
            None
        }
    }

    /// Archival is owner-initiated and only legal once the auction completed.
    pub fn can_archive(&self) -> bool {
        self.status == AskStatus::Completed && self.archived_at.is_none()
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        time::macros::{
            date,
            datetime,
        },
    };

    const WINDOW: Duration = Duration::from_secs(60);
    const EXTENSION: Duration = Duration::from_secs(60);

    fn ask_ending_at(end: Option<OffsetDateTime>) -> Ask {
        Ask {
            id: Uuid::new_v4(),
            owner: Uuid::new_v4(),
            compensation: Compensation {
                kind:   CompensationKind::PerUnit,
                amount: 100,
            },
            schedule: Schedule::SingleDate(date!(2025 - 06 - 01)),
            requirements: String::new(),
            auction_ends_at: end,
            status: AskStatus::Active,
            archived_at: None,
            created_at: datetime!(2025-05-01 00:00:00 UTC),
        }
    }

    #[test]
    fn extension_is_measured_from_the_previous_end() {
        let end = datetime!(2025-06-01 12:00:00 UTC);
        let ask = ask_ending_at(Some(end));

        // 50 seconds remaining: inside the window.
        let now = datetime!(2025-06-01 11:59:10 UTC);
        assert_eq!(
            ask.anti_snipe_extension(now, WINDOW, EXTENSION),
            Some(datetime!(2025-06-01 12:01:00 UTC))
        );
    }

    #[test]
    fn consecutive_closing_bids_compound() {
        let first_end = datetime!(2025-06-01 12:00:00 UTC);
        let mut ask = ask_ending_at(Some(first_end));

        let now = datetime!(2025-06-01 11:59:10 UTC);
        let extended = ask.anti_snipe_extension(now, WINDOW, EXTENSION).unwrap();
        ask.auction_ends_at = Some(extended);

        // Ten seconds later the second bid extends from the updated end.
        let now = datetime!(2025-06-01 11:59:20 UTC);
        assert_eq!(
            ask.anti_snipe_extension(now, WINDOW, EXTENSION),
            Some(datetime!(2025-06-01 12:02:00 UTC))
        );
    }

    #[test]
    fn no_extension_outside_the_window_or_after_lapse() {
        let end = datetime!(2025-06-01 12:00:00 UTC);
        let ask = ask_ending_at(Some(end));

        // Exactly sixty seconds out is not inside the window.
        let now = datetime!(2025-06-01 11:59:00 UTC);
        assert_eq!(ask.anti_snipe_extension(now, WINDOW, EXTENSION), None);

        // Lapsed: no extension either; the caller must reject the bid.
        let now = datetime!(2025-06-01 12:00:00 UTC);
        assert_eq!(ask.anti_snipe_extension(now, WINDOW, EXTENSION), None);
        assert!(ask.has_lapsed(now));
    }

    #[test]
    fn unbounded_asks_never_extend_or_lapse() {
        let ask = ask_ending_at(None);
        let now = datetime!(2030-01-01 00:00:00 UTC);
        assert_eq!(ask.anti_snipe_extension(now, WINDOW, EXTENSION), None);
        assert!(!ask.has_lapsed(now));
        assert!(ask.is_open(now));
    }

    #[test]
    fn schedule_expiry_is_the_end_of_the_last_day() {
        assert_eq!(
            Schedule::SingleDate(date!(2025 - 06 - 01)).derived_expiry(),
            Some(datetime!(2025-06-02 00:00:00 UTC))
        );
        assert_eq!(
            Schedule::DateRange {
                start: date!(2025 - 06 - 01),
                end:   date!(2025 - 06 - 14),
            }
            .derived_expiry(),
            Some(datetime!(2025-06-15 00:00:00 UTC))
        );
        assert_eq!(Schedule::Term("Summer 2025".to_string()).derived_expiry(), None);
    }

    #[test]
    fn only_completed_asks_can_be_archived() {
        let mut ask = ask_ending_at(None);
        assert!(!ask.can_archive());
        ask.status = AskStatus::Completed;
        assert!(ask.can_archive());
        ask.archived_at = Some(datetime!(2025-07-01 00:00:00 UTC));
        assert!(!ask.can_archive());
    }
}
