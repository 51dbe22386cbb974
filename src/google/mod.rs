pub mod gcal;
pub mod gmail;
pub mod oauth;
