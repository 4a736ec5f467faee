//! Renders ForgeRock AM callback authentication as a plain HTML login form,
//! and feeds whatever the user submits back to the server.
//!
//! ```no_run
//! use forgerock_login::{FormSubmission, LoginConfig, LoginSession, MemoryTarget};
//!
//! # async fn run() -> Result<(), forgerock_login::ForgeRockError> {
//! let config = LoginConfig::for_realm("https://login.example.com/am", "customers")?
//!     .with_auth_index("service", "Login");
//! let mut session = LoginSession::new(config, MemoryTarget::default())?;
//!
//! session.start_login().await?;
//! println!("{}", session.target().html().unwrap_or_default());
//!
//! let submission = FormSubmission::from_urlencoded("callback_0=alice&callback_1=hunter2");
//! let outcome = session.submit_form(&submission).await?;
//! println!("{outcome:?}");
//! # Ok(())
//! # }
//! ```

mod forgerock;

pub use forgerock::*;
