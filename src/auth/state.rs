//! Authentication state trait and macro.

use crate::jwt::TokenService;

/// Trait for state types that provide the token service for authentication.
pub trait HasAuthBackend {
    fn tokens(&self) -> &TokenService;
}

/// Macro to implement `HasAuthBackend` for state structs with the standard fields.
///
/// The struct must have a `tokens: Arc<TokenService>` field.
///
/// # Example
/// ```ignore
/// use crate::impl_has_auth_backend;
///
/// #[derive(Clone)]
/// pub struct MyState {
///     pub tokens: Arc<TokenService>,
/// }
///
/// impl_has_auth_backend!(MyState);
/// ```
#[macro_export]
macro_rules! impl_has_auth_backend {
    ($state_type:ty) => {
        impl $crate::auth::HasAuthBackend for $state_type {
            fn tokens(&self) -> &$crate::jwt::TokenService {
                &self.tokens
            }
        }
    };
}
