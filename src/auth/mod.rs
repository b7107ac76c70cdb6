//! Authentication: email/password credentials, Google OAuth, and JWTs
//!
//! - `jwt`: token issuance and verification
//! - `password`: bcrypt registration and login
//! - `google` / `state`: OAuth authorization code flow and its state cookie
//! - `reconcile`: mapping a Google identity onto an internal user
//! - `middleware` / `extractor`: the Bearer gate for protected routes

pub mod extractor;
pub mod google;
pub mod jwt;
pub mod middleware;
pub mod password;
pub mod reconcile;
pub mod session;
pub mod state;
