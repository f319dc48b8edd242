/// Sự kiện trạng thái kết nối gửi lên UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetworkEvent {
    /// The namespace accepted us; `sid` is the Socket.IO session id.
    Connected { sid: String },
    Disconnected { reason: String },
    /// A packet could not be understood or sent; the session keeps running.
    ProtocolError(String),
}
