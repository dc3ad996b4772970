/*
 * Responsibility
 * - /admin 系 handler (ADMIN のみ。guard は routes.rs 側で適用)
 */
use crate::api::v1::extractors::CurrentIdentity;

pub async fn list_users(CurrentIdentity(identity): CurrentIdentity) -> &'static str {
    tracing::info!(subject = %identity.subject, "admin panel accessed");
    "Access to admin panel granted"
}

pub async fn update_system_config(CurrentIdentity(identity): CurrentIdentity) -> &'static str {
    tracing::info!(subject = %identity.subject, "system configuration updated");
    "System configuration updated"
}
