pub mod load;
pub mod model;

pub use load::{load_settings, CONFIG_FILE};
pub use model::{Binaries, Settings};
