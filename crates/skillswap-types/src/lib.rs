pub mod api;
pub mod models;
pub mod status;

pub use models::{Interaction, InteractionUpdate, SwapRequest, User};
pub use status::{Decision, InteractionStatus, ParseStatusError, SwapRequestStatus, TransitionError};
