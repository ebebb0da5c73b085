//! # conn 模块说明
//!
//! ## 角色定位（Why）
//! - [`StreamConnection`] 是“裸句柄 + 元数据 → 连接对象”的落地点：
//!   介质 crate 把打开得到的套接字、进度标签、角色与名称交到这里，
//!   换回一个满足 [`Connection`] 契约的对象；
//! - 句柄交接与调优的先后顺序是本模块最关键的不变式：调优失败时
//!   句柄必须先关闭再浮出错误，任何路径都不得泄漏。

use std::io::{self, Read, Write};
use std::os::fd::{AsFd, BorrowedFd};

use bytes::BytesMut;
use ofchan_core::{ConnState, Connection, Role, TransportError, WaitOp};
use socket2::Socket;
use tracing::{debug, error, warn};

use crate::sock::ConnectProgress;

/// 基于字节流套接字的通用连接对象。
///
/// # 教案式说明
/// - **意图 (Why)**：TCP 与本地域套接字在完成打开之后的行为完全
///   同构，统一在此实现状态机、收发与等待钩子，介质 crate 仅注入
///   调优策略与命名；
/// - **契约 (What)**：
///   - 套接字必须已处于非阻塞模式，且所有权独占地移交进来；
///   - `progress` 为 [`ConnectProgress::InProgress`] 时状态落为
///     `Connecting`，数据面操作在 [`StreamConnection::connect`] 推进到
///     `Connected` 之前一律拒绝；
///   - accept 路径按定义传入 `Connected`，状态不可能是 `Connecting`；
/// - **资源 (How)**：`socket2::Socket` 的 RAII 即“恰好释放一次”；
///   `close` 消费 `Box<Self>`，重复关闭无法表达。
pub struct StreamConnection {
    name: String,
    role: Role,
    state: ConnState,
    socket: Socket,
    backlog: BytesMut,
}

impl StreamConnection {
    /// 包装一个已打开的字节流套接字。
    ///
    /// # 教案式说明
    /// - **契约 (What)**：`tune` 为介质特有的套接字调优（如 TCP 的
    ///   `TCP_NODELAY`）；调优失败时句柄在错误浮出前关闭，返回
    ///   [`TransportError::TuningFailure`]；
    /// - **顺序 (How)**：先调优、后交接——这是打开路径上最容易出错
    ///   的一段：句柄一旦存在，所有提前返回都必须先经它的释放。
    pub fn new(
        name: String,
        socket: Socket,
        progress: ConnectProgress,
        role: Role,
        tune: impl FnOnce(&Socket) -> io::Result<()>,
    ) -> Result<Self, TransportError> {
        if let Err(source) = tune(&socket) {
            error!(name = %name, error = %source, "socket tuning failed, closing handle");
            drop(socket);
            return Err(TransportError::TuningFailure { name, source });
        }
        let state = match progress {
            ConnectProgress::Connected => ConnState::Connected,
            ConnectProgress::InProgress => ConnState::Connecting,
        };
        Ok(Self {
            name,
            role,
            state,
            socket,
            backlog: BytesMut::new(),
        })
    }

    /// 滞留发送缓冲中尚未写入内核的字节数。
    pub fn backlog_len(&self) -> usize {
        self.backlog.len()
    }

    fn fail(&mut self, source: io::Error) -> TransportError {
        self.state = ConnState::Failed(source.raw_os_error().unwrap_or(libc::EIO));
        warn!(name = %self.name, error = %source, "connect failed");
        TransportError::OpenFailure {
            name: self.name.clone(),
            source,
        }
    }

    fn flush_backlog(&mut self) -> Result<(), TransportError> {
        while !self.backlog.is_empty() {
            match (&self.socket).write(&self.backlog) {
                Ok(written) => {
                    let _ = self.backlog.split_to(written);
                }
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(source) => {
                    return Err(TransportError::Io {
                        op: "stream send",
                        source,
                    });
                }
            }
        }
        Ok(())
    }
}

impl Connection for StreamConnection {
    fn name(&self) -> &str {
        &self.name
    }

    fn role(&self) -> Role {
        self.role
    }

    fn state(&self) -> ConnState {
        self.state
    }

    /// 以 `SO_ERROR` 探测在途拨号的完成情况。
    ///
    /// 内核把异步失败记录在套接字错误槽里；槽为空且对端地址可取时
    /// 即握手完成，取不到（`ENOTCONN`）则继续在途。
    fn connect(&mut self) -> Result<ConnState, TransportError> {
        match self.state {
            ConnState::Connected => Ok(ConnState::Connected),
            ConnState::Failed(errno) => Err(TransportError::OpenFailure {
                name: self.name.clone(),
                source: io::Error::from_raw_os_error(errno),
            }),
            ConnState::Connecting => {
                match self.socket.take_error() {
                    Ok(Some(source)) => return Err(self.fail(source)),
                    Ok(None) => {}
                    Err(source) => return Err(self.fail(source)),
                }
                match self.socket.peer_addr() {
                    Ok(_) => {
                        self.state = ConnState::Connected;
                        debug!(name = %self.name, "connect completed");
                        Ok(ConnState::Connected)
                    }
                    Err(err) if err.raw_os_error() == Some(libc::ENOTCONN) => {
                        Ok(ConnState::Connecting)
                    }
                    Err(source) => Err(self.fail(source)),
                }
            }
        }
    }

    fn recv(&mut self, buf: &mut [u8]) -> Result<usize, TransportError> {
        if !self.state.is_connected() {
            return Err(TransportError::NotReady);
        }
        (&self.socket).read(buf).map_err(|source| TransportError::Io {
            op: "stream recv",
            source,
        })
    }

    /// 发送字节；内核只收下一部分时，剩余字节进入滞留缓冲。
    ///
    /// 滞留缓冲非空期间的新发送会先尝试冲刷；冲刷不净时以可重试的
    /// `WouldBlock` 拒绝本次数据，避免无界堆积。
    fn send(&mut self, buf: &[u8]) -> Result<usize, TransportError> {
        if !self.state.is_connected() {
            return Err(TransportError::NotReady);
        }
        if !self.backlog.is_empty() {
            self.flush_backlog()?;
        }
        match (&self.socket).write(buf) {
            Ok(written) => {
                if written < buf.len() {
                    self.backlog.extend_from_slice(&buf[written..]);
                }
                Ok(buf.len())
            }
            Err(source) => Err(TransportError::Io {
                op: "stream send",
                source,
            }),
        }
    }

    fn wait(&self, _op: WaitOp) -> BorrowedFd<'_> {
        self.socket.as_fd()
    }

    fn close(self: Box<Self>) {
        if !self.backlog.is_empty() {
            warn!(
                name = %self.name,
                discarded = self.backlog.len(),
                "closing with unsent bytes in backlog"
            );
        }
        // Socket 的 RAII 负责句柄释放。
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use socket2::{Domain, Type};

    fn stream_pair() -> (Socket, Socket) {
        let (a, b) = Socket::pair(Domain::UNIX, Type::STREAM, None).expect("socketpair");
        a.set_nonblocking(true).expect("nonblocking a");
        b.set_nonblocking(true).expect("nonblocking b");
        (a, b)
    }

    /// 验证调优失败时句柄恰好关闭一次：对端读到有序 EOF。
    #[test]
    fn tuning_failure_closes_the_handle() {
        let (local, peer) = stream_pair();
        let result = StreamConnection::new(
            "tcp:192.0.2.7".to_string(),
            local,
            ConnectProgress::Connected,
            Role::Active,
            |_| Err(io::Error::from(io::ErrorKind::InvalidInput)),
        );

        let err = result.err().expect("tuning must fail");
        assert!(matches!(err, TransportError::TuningFailure { .. }));

        // 句柄已被关闭，对端立即观察到 EOF 而非 WouldBlock。
        let mut buf = [0u8; 8];
        peer.set_nonblocking(false).expect("blocking peer");
        let read = (&peer).read(&mut buf).expect("peer read");
        assert_eq!(read, 0);
    }

    /// 验证在途进度落成 `Connecting` 状态，且数据面操作被拒绝。
    #[test]
    fn in_progress_dial_starts_connecting() {
        let (local, _peer) = stream_pair();
        let mut conn = StreamConnection::new(
            "tcp:192.0.2.7".to_string(),
            local,
            ConnectProgress::InProgress,
            Role::Active,
            |_| Ok(()),
        )
        .expect("wrap socket");

        assert_eq!(conn.state(), ConnState::Connecting);
        let mut buf = [0u8; 8];
        assert!(matches!(conn.recv(&mut buf), Err(TransportError::NotReady)));
        assert!(matches!(conn.send(b"hi"), Err(TransportError::NotReady)));
    }

    /// 验证已连通句柄的收发往返与有序关闭语义。
    #[test]
    fn connected_pair_round_trips_bytes() {
        let (local, peer) = stream_pair();
        let mut conn = StreamConnection::new(
            "unix".to_string(),
            local,
            ConnectProgress::Connected,
            Role::Passive,
            |_| Ok(()),
        )
        .expect("wrap socket");

        assert_eq!(conn.state(), ConnState::Connected);
        assert_eq!(conn.send(b"hello").expect("send"), 5);

        let mut buf = [0u8; 16];
        peer.set_nonblocking(false).expect("blocking peer");
        let read = (&peer).read(&mut buf).expect("peer read");
        assert_eq!(&buf[..read], b"hello");

        (&peer).write_all(b"pong").expect("peer write");
        let read = conn.recv(&mut buf).expect("recv");
        assert_eq!(&buf[..read], b"pong");

        drop(peer);
        // 对端关闭后收到有序 EOF。
        loop {
            match conn.recv(&mut buf) {
                Ok(0) => break,
                Ok(_) => continue,
                Err(err) if err.is_retryable() => continue,
                Err(err) => panic!("unexpected recv error: {err}"),
            }
        }
    }

    /// 验证对已连通套接字调用 `connect` 幂等返回 `Connected`。
    #[test]
    fn connect_on_connected_socket_is_idempotent() {
        let (local, _peer) = stream_pair();
        let mut conn = StreamConnection::new(
            "unix".to_string(),
            local,
            ConnectProgress::Connected,
            Role::Active,
            |_| Ok(()),
        )
        .expect("wrap socket");

        assert_eq!(conn.connect().expect("connect"), ConnState::Connected);
        assert_eq!(conn.connect().expect("connect again"), ConnState::Connected);
    }

    /// 验证 `close` 消费对象并释放句柄（对端观察 EOF）。
    #[test]
    fn close_releases_the_handle() {
        let (local, peer) = stream_pair();
        let conn: Box<dyn Connection> = Box::new(
            StreamConnection::new(
                "unix".to_string(),
                local,
                ConnectProgress::Connected,
                Role::Active,
                |_| Ok(()),
            )
            .expect("wrap socket"),
        );

        conn.close();

        let mut buf = [0u8; 4];
        peer.set_nonblocking(false).expect("blocking peer");
        assert_eq!((&peer).read(&mut buf).expect("peer read"), 0);
    }
}
