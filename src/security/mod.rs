//! Authentication and request protection.
//!
//! Identity is delegated to an external provider; this service only validates
//! the bearer JWTs it mints. Authorization is claim-based: the admin surface
//! requires an explicit `admin` role, never a pattern match on the login
//! identifier.

pub mod claims;
pub mod middleware;
pub mod rate_limit;
