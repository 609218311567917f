pub mod cli;
pub mod config;
pub mod error;
pub mod extract;
pub mod marking;
pub mod model;
pub mod pipeline;
pub mod postprocess;
pub mod report;
pub mod util;
