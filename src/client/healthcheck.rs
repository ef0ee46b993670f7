use std::sync::Arc;

use anyhow::anyhow;
use database::DbConnectionPoolV2;

use crate::views;

use super::SearchConfig;

pub async fn healthcheck_cmd(
    db_pool: Arc<DbConnectionPoolV2>,
    search_config: SearchConfig,
) -> anyhow::Result<()> {
    let search_client = Arc::new(search_config.into_client()?);

    views::check_health(db_pool, search_client)
        .await
        .map_err(|e| anyhow!("healthcheck failed: {e}"))?;

    tracing::info!("✅ Healthcheck passed");
    Ok(())
}
