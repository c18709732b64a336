pub mod ev;
pub mod station;
pub mod trip;

pub use ev::*;
pub use station::*;
pub use trip::*;
