pub mod args;
pub mod content;
pub mod db;
pub mod email;
pub mod payments;
pub mod randomize;
pub mod selection;
pub mod server;
pub mod telemetry;
pub mod tour;
