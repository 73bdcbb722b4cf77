mod counter;
mod snowflake;
mod status;

pub use counter::*;
pub use snowflake::*;
pub use status::*;
