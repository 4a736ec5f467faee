mod authenticate;
mod config;
mod error;
mod form;
pub mod html;
mod http_client;
mod render;
mod session;

pub use authenticate::{
    value_text, AuthExchange, CallbackDescriptor, CallbackKind, Classification, ValuePair,
};
pub use config::{AuthIndex, LoginConfig, DEFAULT_API_VERSION};
pub use error::ForgeRockError;
pub use form::{callback_index, FormBinder, FormSubmission, MemoryTarget, RenderTarget};
pub use http_client::AuthenticateClient;
pub use render::{
    render_callbacks, DefaultRenderer, PollingWait, RedirectForm, RenderedForm, RenderedPage,
    RenderedUnit, Renderer,
};
pub use session::{LoginHandler, LoginOutcome, LoginSession, NoopHandler};
