//! 被动 TCP 传输：`ptcp:[<port>][:<bind_ip>]`。

use std::net::SocketAddr;

use ofchan_core::{Connection, Listener, PassiveProvider, Role, TransportError};
use ofchan_stream::{AcceptHandler, ConnectProgress, StreamConnection, StreamListener, sock};
use socket2::{SockAddr, Socket};
use tracing::{debug, error};

use crate::DEFAULT_PORT;
use crate::active::tune_nodelay;

/// 渲染 accept 得到的对端名称。
///
/// # 教案式说明
/// - **契约 (What)**：对端地址可识别为网络地址时渲染为
///   `"tcp:<地址>"`，端口与默认控制端口不同才追加 `":<端口>"`；
///   地址记录不符合预期（零长、族不匹配）时回退为裸令牌 `"tcp"`。
///   该输出被运维与日志逐字依赖，不得改动；
/// - **取舍 (Trade-offs)**：回退是诊断性降级而非硬错误——名称只
///   影响可读性，不影响连接本身的可用性。
fn peer_name(peer: &SockAddr) -> String {
    match peer.as_socket() {
        Some(SocketAddr::V4(v4)) => {
            let mut name = format!("tcp:{}", v4.ip());
            if v4.port() != DEFAULT_PORT {
                name.push_str(&format!(":{}", v4.port()));
            }
            name
        }
        Some(SocketAddr::V6(v6)) => {
            let mut name = format!("tcp:[{}]", v6.ip());
            if v6.port() != DEFAULT_PORT {
                name.push_str(&format!(":{}", v6.port()));
            }
            name
        }
        None => {
            debug!("peer address record not recognized, using bare token");
            "tcp".to_string()
        }
    }
}

struct TcpAcceptHandler;

impl AcceptHandler for TcpAcceptHandler {
    fn wrap(&self, socket: Socket, peer: SockAddr) -> Result<Box<dyn Connection>, TransportError> {
        // accept 拿到的句柄按定义已完成握手。
        let conn = StreamConnection::new(
            peer_name(&peer),
            socket,
            ConnectProgress::Connected,
            Role::Passive,
            tune_nodelay,
        )?;
        Ok(Box::new(conn))
    }
}

/// `ptcp` 令牌的被动传输描述符。
///
/// # 教案式说明
/// - **契约 (What)**：`listen` 委托底层例程产出监听句柄，失败带名称
///   上抛；成功后套上通用监听骨架，accept 路径由
///   [`TcpAcceptHandler`] 完成命名、调优与包装；
/// - **并发 (How)**：监听句柄非阻塞，accept 由调用方的就绪循环驱动。
pub struct PtcpTransport;

impl PassiveProvider for PtcpTransport {
    fn token(&self) -> &'static str {
        "ptcp"
    }

    fn listen(&self, name: &str, suffix: &str) -> Result<Box<dyn Listener>, TransportError> {
        let socket = match sock::tcp_open_passive(suffix, DEFAULT_PORT) {
            Ok(socket) => socket,
            Err(source) => {
                error!(name = %name, error = %source, "listen failed");
                return Err(TransportError::OpenFailure {
                    name: name.to_string(),
                    source,
                });
            }
        };
        Ok(Box::new(StreamListener::new(
            name.to_string(),
            socket,
            TcpAcceptHandler,
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{Ipv4Addr, SocketAddrV4};

    /// 验证非默认端口的对端渲染为 `tcp:<地址>:<端口>`。
    #[test]
    fn peer_on_non_default_port_includes_port() {
        let peer = SockAddr::from(SocketAddrV4::new(Ipv4Addr::new(203, 0, 113, 5), 6634));
        assert_eq!(peer_name(&peer), "tcp:203.0.113.5:6634");
    }

    /// 验证默认端口的对端省略端口段。
    #[test]
    fn peer_on_default_port_omits_port() {
        let peer = SockAddr::from(SocketAddrV4::new(Ipv4Addr::new(203, 0, 113, 5), DEFAULT_PORT));
        assert_eq!(peer_name(&peer), "tcp:203.0.113.5");
    }

    /// 验证无法识别的地址记录回退为裸传输令牌。
    #[test]
    fn unrecognized_peer_falls_back_to_bare_token() {
        let unix = SockAddr::unix("/tmp/ofchan-peer-name-test.sock").expect("unix sockaddr");
        assert_eq!(peer_name(&unix), "tcp");
    }

    /// 验证监听失败（端口非法）携带监听名称上抛。
    #[test]
    fn listen_failure_carries_name() {
        let err = PtcpTransport
            .listen("ptcp:70000", "70000")
            .err()
            .expect("invalid port must fail");
        match err {
            TransportError::OpenFailure { name, .. } => assert_eq!(name, "ptcp:70000"),
            other => panic!("expected OpenFailure, got {other:?}"),
        }
    }

    /// 验证 accept 产出的连接状态恒为 `Connected` 且名称符合契约。
    #[test]
    fn accepted_connection_is_connected_and_named() {
        let mut listener = PtcpTransport
            .listen("ptcp:0:127.0.0.1", "0:127.0.0.1")
            .expect("listen");

        let fd = listener.wait();
        let local = socket2::SockRef::from(&fd)
            .local_addr()
            .expect("local addr")
            .as_socket()
            .expect("inet addr");

        let dial = std::net::TcpStream::connect(local).expect("dial");
        let conn = loop {
            match listener.accept() {
                Ok(conn) => break conn,
                Err(err) if err.is_retryable() => std::thread::yield_now(),
                Err(err) => panic!("accept failed: {err}"),
            }
        };

        assert_eq!(conn.state(), ofchan_core::ConnState::Connected);
        assert_eq!(conn.role(), Role::Passive);
        // 对端使用系统分配的临时端口，名称必然带端口段。
        assert!(conn.name().starts_with("tcp:127.0.0.1:"));
        drop(dial);
    }
}
