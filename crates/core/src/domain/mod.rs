mod connection;
mod run;
mod task;

pub use connection::*;
pub use run::*;
pub use task::*;
