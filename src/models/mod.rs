pub mod category;
pub mod interval;
pub mod search;
pub mod unit;
