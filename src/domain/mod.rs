pub mod catalog;
pub mod cycle;
pub mod facility;
pub mod limits;
pub mod scenario;
pub mod supercycle;
pub mod utils;
