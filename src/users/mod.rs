use crate::state::AppState;
use axum::Router;

mod dto;
mod error;
pub mod handlers;
pub mod jwt;
pub mod password;
pub mod repo;
pub(crate) mod repo_types;
pub mod reset;
pub mod services;

pub fn router() -> Router<AppState> {
    handlers::user_routes()
}
