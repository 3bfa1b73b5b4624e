//! Configuration core for an ngrok-backed listener
//!
//! Reads listener configuration from block syntax or JSON, substitutes
//! placeholders, validates it and assembles the ordered session and endpoint
//! options a tunnel client needs.
//!
//! ```no_run
//! use ngrok_listener::{EnvReplacer, SessionConfig, TunnelRegistry};
//!
//! # fn main() -> ngrok_listener::Result<()> {
//! let registry = TunnelRegistry::new();
//! let config = SessionConfig::from_caddyfile(
//!     "ngrok {\n    tunnel http {\n        domain foo.ngrok.app\n    }\n}",
//!     &registry,
//! )?;
//! let plan = config.provision(&EnvReplacer::from_process_env())?;
//! println!("{plan}");
//! # Ok(())
//! # }
//! ```

pub mod caddyfile;
pub mod error;
pub mod options;
pub mod registry;
pub mod replace;
pub mod session;
#[cfg(feature = "cli")]
pub mod settings;
pub mod tunnel;

pub use error::{ListenerError, ResourceError, Result, SyntaxError, SyntaxErrorKind};
pub use options::{
    EndpointOption, HeaderOption, IdentityOption, ListenPlan, Scheme, SessionOption, TunnelSpec,
};
pub use registry::{TunnelParser, TunnelRegistry};
pub use replace::{EnvReplacer, IdentityReplacer, Replace, Replacer};
pub use session::{InputFormat, SessionConfig, provision};
pub use tunnel::http::{
    BasicAuthCredential, HeaderEdit, OAuthConfig, OidcConfig, WebhookVerificationConfig,
};
pub use tunnel::{
    HttpTunnel, LabeledTunnel, TcpTunnel, TlsTunnel, TunnelConfig, TunnelKind, TunnelOptions,
};
