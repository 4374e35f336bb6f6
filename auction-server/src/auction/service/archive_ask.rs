use {
    super::Service,
    crate::{
        api::RestError,
        auction::entities,
        kernel::entities::UserId,
    },
};

pub struct ArchiveAskInput {
    pub ask_id: entities::AskId,
    pub actor:  UserId,
}

impl Service {
    /// Owner-only, and only once the auction completed. Archived asks are
    /// frozen: every later mutation path refuses them.
    #[tracing::instrument(skip_all, fields(ask_id = ?input.ask_id))]
    pub async fn archive_ask(&self, input: ArchiveAskInput) -> Result<(), RestError> {
        let lock = self.repo.get_or_create_in_memory_ask_lock(input.ask_id).await;
        let _guard = lock.lock().await;

        let ask = self
            .repo
            .get_ask(input.ask_id)
            .await?
            .ok_or(RestError::AskNotFound)?;
        if ask.owner != input.actor {
            return Err(RestError::NotOwner);
        }
        if ask.archived_at.is_some() {
            return Ok(());
        }
        if !ask.can_archive() {
            return Err(RestError::BadParameters(
                "only completed asks can be archived".to_string(),
            ));
        }

        self.repo
            .archive_ask(input.ask_id, self.clock.now())
            .await
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::auction::service::tests::test_clock,
        crate::{
            auction::{
                repository::{
                    models,
                    MockDatabase,
                },
                service::Config,
            },
            relationship::repository::models::MockDatabase as MockRelationshipDatabase,
        },
        time::macros::{
            date,
            datetime,
        },
        tokio::sync::broadcast,
        uuid::Uuid,
    };

    fn ask_row(owner: Uuid, status: models::AskStatus) -> models::Ask {
        let mut row = models::Ask::new(&entities::Ask {
            id: Uuid::new_v4(),
            owner,
            compensation: entities::Compensation {
                kind:   entities::CompensationKind::Flat,
                amount: 100,
            },
            schedule: entities::Schedule::SingleDate(date!(2025 - 06 - 01)),
            requirements: String::new(),
            auction_ends_at: None,
            status: entities::AskStatus::Active,
            archived_at: None,
            created_at: datetime!(2025-05-01 00:00:00 UTC),
        });
        row.status = status;
        row
    }

    fn service_with(db: MockDatabase) -> Service {
        Service::new_with_mocks(
            db,
            MockRelationshipDatabase::new(),
            Config::for_tests(),
            test_clock(),
            broadcast::channel(16).0,
        )
    }

    #[tokio::test]
    async fn completed_asks_archive() {
        let owner = Uuid::new_v4();
        let row = ask_row(owner, models::AskStatus::Completed);
        let ask_id = row.id;

        let mut db = MockDatabase::new();
        db.expect_get_ask().returning(move |_| Ok(Some(row.clone())));
        db.expect_archive_ask().times(1).returning(|_, _| Ok(()));

        let service = service_with(db);
        service
            .archive_ask(ArchiveAskInput { ask_id, actor: owner })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn active_asks_do_not() {
        let owner = Uuid::new_v4();
        let row = ask_row(owner, models::AskStatus::Active);
        let ask_id = row.id;

        let mut db = MockDatabase::new();
        db.expect_get_ask().returning(move |_| Ok(Some(row.clone())));
        db.expect_archive_ask().never();

        let service = service_with(db);
        let result = service
            .archive_ask(ArchiveAskInput { ask_id, actor: owner })
            .await;
        assert!(matches!(result, Err(RestError::BadParameters(_))));
    }

    #[tokio::test]
    async fn strangers_do_not_archive() {
        let row = ask_row(Uuid::new_v4(), models::AskStatus::Completed);
        let ask_id = row.id;

        let mut db = MockDatabase::new();
        db.expect_get_ask().returning(move |_| Ok(Some(row.clone())));
        db.expect_archive_ask().never();

        let service = service_with(db);
        let result = service
            .archive_ask(ArchiveAskInput {
                ask_id,
                actor: Uuid::new_v4(),
            })
            .await;
        assert!(matches!(result, Err(RestError::NotOwner)));
    }
}
