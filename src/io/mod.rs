mod buf;
mod buf_mut;
mod decode;
mod encode;

pub(crate) use buf::{BufExt, MySqlBufExt};
pub(crate) use buf_mut::{BufMutExt, MySqlBufMutExt};
pub(crate) use decode::ProtocolDecode;
pub(crate) use encode::ProtocolEncode;
