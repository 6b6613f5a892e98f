pub mod client;
pub mod config;
pub mod dir;
pub mod form;
pub mod session;
pub mod state;
pub mod validation;

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

pub const VERSION: Version = Version {
    major: 0,
    minor: 1,
    patch: 0,
};
