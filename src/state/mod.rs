// state module: AppState, the API gateway client, and one submodule per API resource.

use tracing::info;

use crate::config::AppConfig;
use crate::workspace::ViewRegistry;

mod accounts;
mod client;
mod companies;
mod compliance;
mod error;
mod reports;
mod settings;
mod templates;
mod users;
mod works;

pub use accounts::*;
pub use client::*;
pub use companies::*;
pub use compliance::*;
pub use error::ApiError;
pub use reports::*;
pub use settings::*;
pub use templates::*;
pub use users::*;
pub use works::*;

pub struct AppState {
    pub config: AppConfig,
    /// Shared transport without credentials; see [`ApiClient::with_credential`].
    pub api: ApiClient,
    pub views: ViewRegistry,
}

pub fn init_state(config: AppConfig) -> Result<AppState, ApiError> {
    let api = ApiClient::new(&config.api_base_url)?;
    info!(api = %api.base_url(), "api gateway client ready");
    Ok(AppState {
        config,
        api,
        views: ViewRegistry::default(),
    })
}
