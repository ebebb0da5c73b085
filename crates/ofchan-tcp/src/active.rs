//! 主动 TCP 传输：`tcp:<host>[:<port>]`。

use std::io;

use ofchan_core::{Connection, Role, TransportError, TransportProvider};
use ofchan_stream::{StreamConnection, sock};
use socket2::Socket;
use tracing::error;

use crate::DEFAULT_PORT;

/// 为控制通道禁用发送合并，保证小消息低延迟送达。
pub(crate) fn tune_nodelay(socket: &Socket) -> io::Result<()> {
    socket.set_tcp_nodelay(true)
}

/// `tcp` 令牌的主动传输描述符。
///
/// # 教案式说明
/// - **契约 (What)**：`open` 委托底层例程拿到
///   `(句柄, 进度)`；彻底失败（无句柄）立即带名称上抛；拿到句柄后
///   经调优与通用包装构造连接对象，进度标签决定初始状态是
///   `Connected` 还是 `Connecting`；
/// - **不变式 (How)**：句柄存在之后的所有提前返回都经
///   [`StreamConnection::new`] 的关闭纪律，本层不裸持句柄。
pub struct TcpTransport;

impl TransportProvider for TcpTransport {
    fn token(&self) -> &'static str {
        "tcp"
    }

    fn default_port(&self) -> Option<u16> {
        Some(DEFAULT_PORT)
    }

    fn open(&self, name: &str, suffix: &str) -> Result<Box<dyn Connection>, TransportError> {
        let (socket, progress) = match sock::tcp_open_active(suffix, DEFAULT_PORT) {
            Ok(opened) => opened,
            Err(source) => {
                error!(name = %name, error = %source, "connect failed");
                return Err(TransportError::OpenFailure {
                    name: name.to_string(),
                    source,
                });
            }
        };
        let conn =
            StreamConnection::new(name.to_string(), socket, progress, Role::Active, tune_nodelay)?;
        Ok(Box::new(conn))
    }
}
