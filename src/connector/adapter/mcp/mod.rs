mod server;
mod tools;

pub use server::TsIndexToolServer;
