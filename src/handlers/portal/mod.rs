// Citizen self-service, mounted under /portal. Every handler resolves the
// caller's citizen profile first; reads are scoped to it and writes run
// through the observer pipeline as a portal actor.

pub mod dashboard;
pub mod documents;
pub mod events;
pub mod payments;
pub mod profile;
pub mod records;

use serde_json::{json, Value};

use crate::auth::Actor;
use crate::domain::Citizen;
use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::server::AppState;
use crate::services::portal_service::{citizen_actor, find_citizen};

/// The caller's profile and the actor its writes run as; 404 NEEDS_ONBOARDING
/// when the account has no profile yet
pub async fn current_citizen(state: &AppState, user: &AuthUser) -> Result<(Citizen, Actor), ApiError> {
    let citizen = find_citizen(state.store.as_ref(), user.id).await??;
    let actor = citizen_actor(user, &citizen);
    Ok((citizen, actor))
}

pub fn owned_by(citizen: &Citizen) -> Value {
    json!({ "citizen_id": citizen.id })
}
