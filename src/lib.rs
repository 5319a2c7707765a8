//! # Ferrapi - fluent, typed API handlers
//!
//! Ferrapi builds typed consumers for HTTP APIs on top of `reqwest`. A handler
//! owns the connection settings for one resource; requests are assembled with
//! a staged fluent builder and executed through a pipeline that retries timed
//! out attempts, classifies responses and reports failures as structured
//! [`ApiResponse`]s instead of errors.
//!
//! ## Quick Start
//!
//! ```no_run
//! use ferrapi::ApiHandler;
//! use serde::{Deserialize, Serialize};
//! use std::time::Duration;
//!
//! #[derive(Serialize)]
//! struct CreateUser {
//!     name: String,
//!     email: String,
//! }
//!
//! #[derive(Deserialize)]
//! struct User {
//!     id: u64,
//!     name: String,
//!     email: String,
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), ferrapi::Error> {
//!     let handler = ApiHandler::builder()
//!         .base_address("https://api.example.com")?
//!         .resource_path("api")
//!         .resource("Users")
//!         .timeout(Duration::from_secs(30))
//!         .retry_attempts(3)
//!         .build()?;
//!
//!     // GET api/Users/123
//!     let user = handler
//!         .request()
//!         .get()
//!         .with_parameter(123)
//!         .responds_with::<User>()
//!         .execute()
//!         .await?;
//!
//!     match user.data {
//!         Some(user) => println!("User: {} <{}>", user.name, user.email),
//!         None => eprintln!("{}: {:?}", user.status, user.message),
//!     }
//!
//!     // POST api/Users
//!     let new_user = CreateUser {
//!         name: "Alice".to_string(),
//!         email: "alice@example.com".to_string(),
//!     };
//!     let created = handler
//!         .request()
//!         .post()
//!         .with_content(&new_user)?
//!         .responds_with::<User>()
//!         .execute()
//!         .await?;
//!     if let Some(user) = created.data {
//!         println!("Created user with ID: {}", user.id);
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Staged fluent requests** - method, endpoint template, parameters, query and content
//! - **Timeout retries** - a per-handler attempt budget for timed-out requests
//! - **Structured results** - every call yields one [`ApiResponse`] with status, message and error
//! - **Failure envelopes** - `{ "message": ... }` bodies become the response message
//! - **Dual error mode** - failures as responses by default, or `Err` with `throw_exceptions`
//! - **Pluggable collaborators** - serializers, authenticators, client factories, wire dialects
//! - **Mocking** - serve canned responses from [`mock::MockTransport`]
//! - **Events** - request, retry, response and disposal notifications via [`ApiHandler::subscribe`]
//!
//! ## Error Handling
//!
//! ```no_run
//! use ferrapi::{ApiHandler, ApiStatus};
//!
//! # async fn example() -> Result<(), ferrapi::Error> {
//! # let handler = ApiHandler::builder().base_address("https://api.example.com")?.build()?;
//! let response = handler.request().delete().with_parameter(7).execute().await?;
//!
//! match response.status {
//!     _ if response.was_successful => println!("Deleted"),
//!     ApiStatus::TimedOut => eprintln!("Timed out: {:?}", response.message),
//!     ApiStatus::NotFound => eprintln!("Nothing to delete"),
//!     status => eprintln!("Failed with {}: {:?}", status, response.error),
//! }
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod classify;
pub mod dialect;
mod error;
pub mod events;
mod executor;
pub mod factory;
mod fluent;
mod handler;
pub mod mock;
mod request;
mod response;
pub mod route;
pub mod serializer;
mod settings;
mod status;
pub mod transport;

pub use auth::{Authenticator, AuthorizationHeader, BasicAuthenticator, BearerTokenAuthenticator};
pub use error::{BoxError, Error, Result};
pub use events::ApiEvent;
pub use fluent::{ApiRequest, MethodRequest, TypedRequest};
pub use handler::{ApiHandler, HandlerBuilder, UNEXPECTED_FAILURE_MESSAGE};
pub use request::{ApiMethod, RequestContent, RequestDescriptor};
pub use response::ApiResponse;
pub use serializer::{JsonSerializer, Serializer};
pub use settings::{ConnectionSettings, HandlerConfiguration, DEFAULT_TIMEOUT};
pub use status::ApiStatus;
pub use tokio_util::sync::CancellationToken;
