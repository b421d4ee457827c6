use std::sync::Arc;

use crate::config::Config;
use crate::database::Database;
use crate::services::auth::AuthService;
use crate::services::netease::client::NeteaseHttpAdapter;

pub struct AppState {
    pub db: Arc<Database>,
    pub netease: NeteaseHttpAdapter,
    pub auth: AuthService,
    pub config: Config,
}
