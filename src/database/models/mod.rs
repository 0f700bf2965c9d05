pub mod category;
pub mod petition;
pub mod support_tier;
pub mod supporter;
pub mod user;
