pub mod settings;
pub mod staff;

pub use settings::*;
pub use staff::*;
