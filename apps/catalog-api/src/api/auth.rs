//! Auth routes backing

use domain_users::{AuthService, PgTokenRepository, PgUserRepository};

use crate::state::AppState;

pub fn service(state: &AppState) -> AuthService<PgUserRepository, PgTokenRepository> {
    AuthService::new(
        PgUserRepository::new(state.db.clone()),
        PgTokenRepository::new(state.db.clone()),
    )
}
