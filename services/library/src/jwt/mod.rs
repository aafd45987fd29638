//! Bearer token minting and validation (HS256).

pub mod claims;
pub mod expiry;
pub mod issuer;
pub mod token;
pub mod validator;

pub use claims::Claims;
pub use expiry::TokenWindow;
pub use issuer::TokenIssuer;
pub use token::{SignatureValidated, Token, TokenState, Unvalidated, Validated};
pub use validator::TokenValidator;
