pub mod scan;
pub mod user;
