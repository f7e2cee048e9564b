pub mod agents;
pub mod compiler;
pub mod context;
pub mod outlet;
pub mod parser;
pub mod stage_agent;
pub mod synthesizer;
pub mod types;
pub mod workflow;
