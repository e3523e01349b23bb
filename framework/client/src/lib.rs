mod dispatcher;
mod payload;

pub mod prelude {
    pub use crate::dispatcher::Dispatcher;
    pub use crate::payload::{FilePart, Payload};
    pub use reqwest::Method;
}

pub use dispatcher::Dispatcher;
pub use payload::{FilePart, Payload};
