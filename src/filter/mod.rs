pub mod bind;
pub mod petition;
pub mod sort;

pub use petition::{PetitionFilter, SqlResult};
pub use sort::PetitionSort;
