use std::time::Duration;

use mongodb::{Client, Database, bson::doc, options::ClientOptions};
use tokio::time::sleep;

use super::error::{MongoDaoError, MongoResult};

/// Ping attempts before the initial connection is declared failed. The outer
/// supervisor keeps retrying with its own backoff, so this budget only covers
/// one connection round.
const MAX_PING_ATTEMPTS: u32 = 8;
/// Delay before the second ping; doubled after every failed attempt.
const FIRST_RETRY_DELAY: Duration = Duration::from_millis(200);
/// Upper bound on the doubling retry delay.
const MAX_RETRY_DELAY: Duration = Duration::from_secs(4);

/// Build a client from the parsed options and ping the target database until
/// it answers or the attempt budget runs out.
pub async fn establish_connection(
    options: &ClientOptions,
    database_name: &str,
) -> MongoResult<(Client, Database)> {
    let client = Client::with_options(options.clone())
        .map_err(|source| MongoDaoError::ClientConstruction { source })?;
    let database = client.database(database_name);

    let mut attempt = 1;
    let mut delay = FIRST_RETRY_DELAY;
    loop {
        match database.run_command(doc! { "ping": 1 }).await {
            Ok(_) => return Ok((client, database)),
            Err(source) => {
                if attempt >= MAX_PING_ATTEMPTS {
                    return Err(MongoDaoError::InitialPing {
                        attempts: attempt,
                        source,
                    });
                }
                attempt += 1;
                sleep(delay).await;
                delay = (delay * 2).min(MAX_RETRY_DELAY);
            }
        }
    }
}
