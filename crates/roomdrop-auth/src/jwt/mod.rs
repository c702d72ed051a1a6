//! Room-scoped JWT bearer tokens.

mod claims;
mod service;

pub use claims::Claims;
pub use service::JwtTokenService;
