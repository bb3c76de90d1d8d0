//! # herald-auth
//!
//! Bearer credential handling for Herald. Credentials are HS256 JWTs whose
//! subject is the user id; the real-time handshake and the REST extractor
//! both verify through [`JwtDecoder`].

pub mod jwt;

pub use jwt::{Claims, JwtDecoder, JwtEncoder};
