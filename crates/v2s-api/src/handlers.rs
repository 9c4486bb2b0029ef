//! Request handlers.

pub mod health;
pub mod outputs;
pub mod process;
pub mod status;
pub mod upload;

pub use health::*;
pub use outputs::*;
pub use process::*;
pub use status::*;
pub use upload::*;
