use {
    super::repository::{
        Database,
        Repository,
    },
    crate::kernel::clock::SharedClock,
    std::sync::Arc,
};

pub mod expire_relationships;
pub mod form_relationship;
pub mod get_contact_reveal;
pub mod get_relationships;
pub mod workers;

pub struct ServiceInner {
    repo:  Arc<Repository>,
    clock: SharedClock,
}

#[derive(Clone)]
pub struct Service(Arc<ServiceInner>);
impl std::ops::Deref for Service {
    type Target = ServiceInner;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Service {
    pub fn new(db: impl Database, clock: SharedClock) -> Self {
        Self(Arc::new(ServiceInner {
            repo: Arc::new(Repository::new(db)),
            clock,
        }))
    }
}

#[cfg(test)]
pub mod tests {
    use {
        super::*,
        crate::{
            kernel::clock::test::ManualClock,
            relationship::repository::models::MockDatabase,
        },
        time::macros::datetime,
    };

    impl Service {
        pub fn new_with_mocks(db: MockDatabase) -> Self {
            let clock = ManualClock::new(datetime!(2025-06-01 11:59:10 UTC));
            Service::new(db, clock)
        }
    }
}
