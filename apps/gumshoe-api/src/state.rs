use std::sync::Arc;

use gumshoe_service::GumshoeService;
use gumshoe_storage::db::Db;

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<GumshoeService>,
}
impl AppState {
	pub async fn new(config: gumshoe_config::Config) -> color_eyre::Result<Self> {
		let db = Db::connect(&config.storage.postgres).await?;

		db.ensure_schema().await?;

		let service = GumshoeService::new(config, db);

		Ok(Self { service: Arc::new(service) })
	}
}
