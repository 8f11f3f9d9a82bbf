/// HTTP surface of the wiki
pub mod error;
pub mod handlers;
pub mod router;
pub mod state;

pub use error::{WikiError, WikiResult};
pub use router::wiki_router;
pub use state::WikiState;
