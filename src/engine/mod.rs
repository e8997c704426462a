pub mod booking;
pub mod pricing;
pub mod refresh;
pub mod resolver;
pub mod search;
