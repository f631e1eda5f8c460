pub mod error;
pub mod lens;
pub mod types;

pub use error::CritiqueError;
pub use lens::Lens;
pub use types::{CritiqueReply, CritiqueRequest, ErrorReply};
