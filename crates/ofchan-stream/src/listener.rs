//! # listener 模块说明
//!
//! ## 角色定位（Why）
//! - 被动侧的公共骨架：持有监听句柄、驱动 accept、把新句柄交给介质
//!   特有的包装策略。介质 crate 只需实现 [`AcceptHandler`]，即可获得
//!   与主动侧完全一致的句柄交接纪律。

use std::io;
use std::os::fd::{AsFd, BorrowedFd};

use ofchan_core::{Connection, Listener, TransportError};
use socket2::{SockAddr, Socket};
use tracing::warn;

/// 介质特有的 accept 包装策略。
///
/// # 教案式说明
/// - **契约 (What)**：`wrap` 接收一个已完成握手、已切换为非阻塞的
///   新句柄与对端地址记录，负责命名、调优并构造连接对象；句柄所有
///   权随调用移交，失败路径的释放由 [`StreamConnection::new`] 的纪律
///   保证；
/// - **角色 (Why)**：对端名称的渲染规则因传输而异（网络地址带端口
///   规则、本地传输的裸令牌回退），因此留给介质实现。
///
/// [`StreamConnection::new`]: crate::conn::StreamConnection::new
pub trait AcceptHandler: Send {
    /// 把 accept 得到的句柄包装为连接对象。
    fn wrap(&self, socket: Socket, peer: SockAddr) -> Result<Box<dyn Connection>, TransportError>;
}

/// 基于字节流套接字的通用监听句柄。
///
/// # 教案式说明
/// - **契约 (What)**：
///   - 监听句柄为非阻塞模式；无在队连接时 `accept` 以可重试的
///     [`TransportError::AcceptFailure`] 返回，句柄保持可用；
///   - 单次 accept 的其他失败同样不作废监听句柄，调用方按
///     [`TransportError::is_retryable`] 决定去留；
///   - `close` 消费对象，内核随句柄回收所有未取走的在队连接；
/// - **逻辑 (How)**：accept 成功后先把新句柄切为非阻塞，再交给
///   [`AcceptHandler::wrap`]；切换失败时句柄经 RAII 释放，不泄漏。
pub struct StreamListener<H: AcceptHandler> {
    name: String,
    socket: Socket,
    handler: H,
}

impl<H: AcceptHandler> StreamListener<H> {
    /// 以监听名称、已监听的句柄与包装策略构造。
    pub fn new(name: String, socket: Socket, handler: H) -> Self {
        Self {
            name,
            socket,
            handler,
        }
    }
}

impl<H: AcceptHandler> Listener for StreamListener<H> {
    fn name(&self) -> &str {
        &self.name
    }

    fn accept(&mut self) -> Result<Box<dyn Connection>, TransportError> {
        let (socket, peer) = match self.socket.accept() {
            Ok(pair) => pair,
            Err(source) => {
                if source.kind() != io::ErrorKind::WouldBlock {
                    warn!(name = %self.name, error = %source, "accept failed");
                }
                return Err(TransportError::AcceptFailure { source });
            }
        };
        if let Err(source) = socket.set_nonblocking(true) {
            // 新句柄在此分支经 RAII 释放。
            warn!(name = %self.name, error = %source, "failed to prepare accepted handle");
            return Err(TransportError::AcceptFailure { source });
        }
        self.handler.wrap(socket, peer)
    }

    fn wait(&self) -> BorrowedFd<'_> {
        self.socket.as_fd()
    }

    fn close(self: Box<Self>) {
        // Socket 的 RAII 负责句柄释放。
    }
}
