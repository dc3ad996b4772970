/*!
 * Request extractors
 *
 * - CurrentIdentity: 認証済み Identity (なければ 401)
 * - JsonBody: JSON body (失敗時は AppError の 400)
 */
mod current_identity;
mod json_body;

pub use current_identity::CurrentIdentity;
pub use json_body::JsonBody;
