pub mod favorites;
pub mod synchronizer;

pub use favorites::{FavoriteToggler, FavoritesPager};
pub use synchronizer::{ListingsSync, QueryState};
