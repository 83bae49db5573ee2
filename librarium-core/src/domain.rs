pub mod book;
pub mod ids;
pub mod library;
pub mod rating;
pub mod reservation;

pub use book::*;
pub use ids::*;
pub use library::*;
pub use rating::*;
pub use reservation::*;
