mod utils;

mod login;
pub use login::login;

mod info;
pub use info::info;

mod cd;
pub use cd::cd;

mod ls;
pub use ls::ls;

mod mkdir;
pub use mkdir::mkdir;

mod touch;
pub use touch::touch;

mod cat;
pub use cat::cat;

mod echo;
pub use echo::echo;

mod cp;
pub use cp::cp;

mod rm;
pub use rm::rm;

mod chmod;
pub use chmod::chmod;

mod check;
pub use check::check;

mod output;
pub use output::output;

use std::sync::mpsc::Sender;
use super::fs::{FsReq, Principal};

/// Per-command state: the identity the command runs as, its working
/// directory, and a sender to the fs thread.
#[derive(Clone)]
pub struct Context {
    pub user: Principal,
    pub wd: String,
    pub tx: Sender<FsReq>,
}
