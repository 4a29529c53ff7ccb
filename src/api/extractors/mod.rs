/*!
 * Request extractors
 *
 * Public API:
 * - Claims: gate を通過したリクエストの VerifiedClaims
 */
mod claims;

pub use claims::Claims;
