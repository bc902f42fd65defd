mod catalog;
mod decomiso;
mod faena;
mod tropa;

pub use catalog::*;
pub use decomiso::*;
pub use faena::*;
pub use tropa::*;
