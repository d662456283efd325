//! Upstream authentication: token grants, the credential file and the
//! interactive authorization bootstrap.

pub mod authorization;
pub mod credential_file;
pub mod oauth;

pub use authorization::{authorize_interactively, CallbackServer};
pub use credential_file::CredentialFile;
pub use oauth::{SourceApOAuth, TargetCrmOAuth, TokenResponse};
