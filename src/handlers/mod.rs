pub mod analytics;
pub mod redirect;
pub mod shorten;
