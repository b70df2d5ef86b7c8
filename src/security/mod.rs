//! Share tokens, edit PINs, edit sessions and the gate composing them

pub mod gate;
pub mod pin;
pub mod session;
pub mod token;

pub use gate::{AuthorizationGate, PinPolicy, Unlocked};
pub use pin::{hash_pin, hash_pin_with_cost, is_well_formed, verify_pin};
pub use session::{EditCredential, SessionIssuer};
pub use token::ShareToken;
