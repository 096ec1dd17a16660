mod account;
mod config_file;
mod key;
mod media_config;
mod session;
mod trial;

pub use account::*;
pub use config_file::*;
pub use key::*;
pub use media_config::*;
pub use session::*;
pub use trial::*;
