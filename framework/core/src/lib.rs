mod bail;
mod clock;
mod shutdown;

pub mod prelude {
    pub use crate::bail::VuBailError;
    pub use crate::clock::{Clock, SystemClock};
    pub use crate::shutdown::{ShutdownHandle, ShutdownListener, ShutdownSignalError};
}
