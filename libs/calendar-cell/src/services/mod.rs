pub mod credentials;
pub mod gateway;
pub mod google;
