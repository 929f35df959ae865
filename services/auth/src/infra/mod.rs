pub mod cache;
pub mod db;
pub mod email;
pub mod relay;
