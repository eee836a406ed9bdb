/// Router Module Index
///
/// Routes are split by access level. The split is what decides whether the auth gate
/// runs: `lib.rs` mounts `private` behind it and `public` without it.

/// Registration, login and token validation. No credentials needed.
pub mod public;

/// User and notification management. Every request passes the auth gate first.
pub mod private;
