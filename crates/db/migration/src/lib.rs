use sea_orm_migration::prelude::*;

mod m20260101000000_baseline;
mod m20260115000000_notification_outbox;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260101000000_baseline::Migration),
            Box::new(m20260115000000_notification_outbox::Migration),
        ]
    }
}
