pub mod password;
/// Signed bearer tokens.
pub mod token;
