pub mod stock;
pub mod dashboard;
pub mod response;

pub use stock::*;
pub use dashboard::*;
pub use response::*;
