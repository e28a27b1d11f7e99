pub mod analyzers;
pub mod chart;
pub mod output;
pub mod parser;
