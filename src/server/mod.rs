//! HTTP surface
//!
//! The tower layer for embedding the engine in an axum application, the
//! forward-auth gateway router, and the pieces they share: path
//! normalization, token extraction and denial rendering.

pub mod gateway;
pub mod layer;
pub mod path;
pub mod response;
pub mod token;

pub use gateway::{GatewayState, gateway_router};
pub use layer::{AuthzLayer, AuthzMiddleware};
pub use path::normalize_path;
pub use response::DenialBody;
pub use token::TokenExtractor;
