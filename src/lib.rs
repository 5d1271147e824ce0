pub mod logger;
pub mod sedes;
pub mod fs;
pub mod server;
mod services;

pub use server::{SdReq, SdRes, PORT};
