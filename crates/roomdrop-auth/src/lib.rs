//! # roomdrop-auth
//!
//! Security collaborators: Argon2id password hashing and JWT bearer
//! tokens scoped to a single room.

pub mod jwt;
pub mod password;

pub use jwt::JwtTokenService;
pub use password::Argon2PasswordHasher;
