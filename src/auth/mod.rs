pub mod oauth;
pub mod source;
pub mod token;
pub mod token_store;

pub use oauth::{AuthLoginResult, AuthService, AuthStatus};
pub use source::{ProfileTokenSource, StaticToken, TokenSource};
pub use token::TokenSet;
pub use token_store::{FileTokenStore, TokenStore};
