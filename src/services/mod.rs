pub mod catalog;
pub mod ratings;
pub mod related;

pub use catalog::Catalog;
pub use ratings::RatingAggregator;
pub use related::RelationGraphResolver;
