//! Token-based authentication.
//!
//! Short-lived stateless access tokens travel as bearer tokens. Long-lived
//! refresh tokens travel in an HttpOnly cookie and are bound to the single
//! value stored in the user's credential record, rotated on every use.

mod cookie;
mod errors;
mod extractors;
mod flow;
mod ip;
mod state;
mod types;

pub use cookie::{CookieJar, REFRESH_COOKIE_NAME, refresh_cookie};
pub use errors::{AuthError, ResultExt};
pub use extractors::{Auth, bearer_token};
pub use flow::{AuthFlow, MAX_USERNAME_LEN, authenticate_access_token};
pub use ip::{HasHeadersAndExtensions, extract_client_ip};
pub use state::HasAuthBackend;
pub use types::{AuthenticatedUser, Identity, IssuedTokens};
