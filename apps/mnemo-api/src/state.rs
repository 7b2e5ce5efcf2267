use std::sync::Arc;

use mnemo_service::MnemoService;

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<MnemoService>,
}
impl AppState {
	pub fn new(config: mnemo_config::Config) -> color_eyre::Result<Self> {
		let service = MnemoService::new(config)?;

		Ok(Self::from_service(service))
	}

	pub fn from_service(service: MnemoService) -> Self {
		Self { service: Arc::new(service) }
	}
}
