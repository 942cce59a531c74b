pub mod errors;
pub mod level;
pub mod physics;
pub mod result;
pub mod stage;

pub use errors::*;
pub use level::*;
pub use physics::*;
pub use result::*;
pub use stage::*;
