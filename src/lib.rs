pub mod fetch;
pub mod listing;
pub mod normalize;
pub mod output;
pub mod query;
pub mod sheet;
pub mod standards;
pub mod time;
