pub mod classify;
pub mod cli;
pub mod ctx;
pub mod io;
pub mod join;
pub mod panel;
pub mod pipeline;
pub mod schema;
pub mod scores;
pub mod session;
