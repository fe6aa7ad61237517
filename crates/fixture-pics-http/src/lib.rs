pub mod avatar;

pub use avatar::{PravatarClient, PravatarConfig};
