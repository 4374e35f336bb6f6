mod expire_relationships;
mod get_contact_reveal;
mod get_highest_pair_sequence;
mod get_relationships;
pub mod models;

pub use models::Database;

#[derive(Debug)]
pub struct Repository {
    db: Box<dyn Database>,
}

impl Repository {
    pub fn new(db: impl Database) -> Self {
        Self { db: Box::new(db) }
    }
}
