mod eof;
mod err;
mod local_infile;
mod ok;
mod status;

pub(crate) use eof::EofPacket;
pub(crate) use err::ErrPacket;
pub(crate) use local_infile::LocalInfileRequest;
pub(crate) use ok::OkPacket;
pub use status::Status;
