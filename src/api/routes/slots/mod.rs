pub mod public;
pub mod router;
