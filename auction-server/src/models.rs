use {
    email_address::EmailAddress,
    uuid::Uuid,
};

pub type ProfileId = Uuid;

/// A row of the externally managed profile table. The engine only ever reads
/// it, for bid display names and contact reveal snapshots.
#[derive(Clone, Debug, PartialEq)]
pub struct Profile {
    pub id:    ProfileId,
    pub name:  String,
    pub email: EmailAddress,
    pub phone: String,
}
