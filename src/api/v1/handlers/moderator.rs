/*
 * Responsibility
 * - /mod 系 handler (MODERATOR または ADMIN)
 */

pub async fn reports() -> &'static str {
    "Access to moderator panel granted"
}

pub async fn review_content() -> &'static str {
    "Content review completed"
}
