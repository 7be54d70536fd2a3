pub mod credentials;
pub mod fingerprint;
pub mod issuer;
pub mod password;
pub mod resolver;
pub mod store;
pub mod sweeper;
pub mod types;

pub use fingerprint::TokenHasher;
pub use issuer::TokenIssuer;
pub use resolver::AuthenticationResolver;
pub use store::UserRepository;
pub use types::{AuthenticatedPrincipal, User};
