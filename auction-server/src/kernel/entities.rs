use uuid::Uuid;

pub type UserId = Uuid;
