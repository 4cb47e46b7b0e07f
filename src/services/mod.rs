pub mod autodraft;
pub mod captains;
pub mod connections;
pub mod directory;
pub mod export;
pub mod pool;
pub mod scheduler;
pub mod session;
pub mod websocket;
