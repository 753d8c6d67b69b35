// ==============
// crates/backend-lib/src/metrics.rs

//! Central place for metric keys
pub const SIGNUP: &str = "auth.signup";
pub const SIGNIN: &str = "auth.signin";
pub const SIGNIN_FAILED: &str = "auth.signin.failed";
pub const SIGNOUT: &str = "auth.signout";
pub const SECURITY_DENIED: &str = "security.denied";
