pub mod config;
pub mod quit;
pub mod stats;
pub mod strict;
pub mod timer;
