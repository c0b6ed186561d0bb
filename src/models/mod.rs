mod ids;
mod movie;
mod rating;
mod relation;

pub use ids::{ItemId, UserId};
pub use movie::{Movie, MovieDetails};
pub use rating::{average_rating, AggregateResult, Rating, RatingValue};
pub use relation::RelationEdge;
