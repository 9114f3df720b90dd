//! Client for the e-signature provider's REST API.
//!
//! - [`auth`]: access tokens via JWT-bearer grant or a token proxy, cached
//! - [`envelopes`]: validated envelope submission
//! - [`status`]: envelope status queries
//! - [`transport`]: the HTTP seam ([`ReqwestTransport`] in production)
//! - [`testing`]: scripted transport and signer doubles
//!
//! Every network call runs through a [`signflow_util::RetryPolicy`] drawn from
//! the configured budget for its operation class. Errors that cannot improve
//! on retry (4xx other than 401/408/429) stop immediately.

pub mod auth;
pub mod envelopes;
pub mod error;
pub mod status;
pub mod testing;
pub mod transport;

pub use auth::{AssertionClaims, AssertionSigner, Authenticator, JwtGrantSource, ProxyTokenSource, RsaPemSigner, TokenSource};
pub use envelopes::{EnvelopeSender, SubmittedEnvelope, account_for, build_envelope_definition};
pub use error::{AuthError, QueryError, SendError, SubmissionError};
pub use status::StatusQuery;
pub use transport::{HttpRequest, HttpResponse, HttpTransport, ReqwestTransport, TransportError};
