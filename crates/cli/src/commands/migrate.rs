use crate::commands::storage::{connect_and_migrate, load_config, runtime, Failure};
use crate::commands::CommandResult;

/// Exit codes: 2 config, 3 runtime, 4 connectivity, 5 migration.
pub fn run() -> CommandResult {
    match apply_pending() {
        Ok(url) => {
            CommandResult::success("migrate", format!("applied pending migrations to `{url}`"))
        }
        Err(failure) => failure.into_result("migrate"),
    }
}

fn apply_pending() -> Result<String, Failure> {
    let config = load_config()?;

    runtime()?.block_on(async {
        let pool = connect_and_migrate(&config).await?;
        pool.close().await;
        Ok::<_, Failure>(())
    })?;

    Ok(config.database.url)
}
