//! Domain models for the dental lab hub.

mod case;
mod tooth;
mod user;
mod vocab;

pub use case::*;
pub use tooth::*;
pub use user::*;
pub use vocab::*;
