use herdbook::migration::{Migrator, MigratorTrait};

use crate::commands::shared::{database_url, CommandResult};
use crate::config::Config;
use crate::MigrateAction;

pub(crate) async fn handle_migrate(action: MigrateAction, config: &Config) -> CommandResult {
    let url = database_url(config)?;
    let db = herdbook::connect(&url).await?;

    match action {
        MigrateAction::Up => {
            println!("Applying migrations...");
            Migrator::up(&db, None).await?;
            println!("Migrations applied successfully.");
        }
        MigrateAction::Down => {
            println!("Rolling back last migration...");
            Migrator::down(&db, Some(1)).await?;
            println!("Rollback complete.");
        }
        MigrateAction::Status => {
            println!("Migration status:");
            Migrator::status(&db).await?;
        }
        MigrateAction::Fresh => {
            println!("Dropping all tables and reapplying migrations...");
            Migrator::fresh(&db).await?;
            println!("Fresh migration complete.");
        }
    }

    Ok(())
}
