#![doc = r#"
# ofchan-unix

## 设计动机（Why）
- **定位**：同机部署下交换机与控制器之间的本地域套接字传输。主动
  角色注册为 `unix`，被动角色注册为 `punix`，后缀即套接字文件路径。
- **架构角色**：与 TCP 传输共享 `ofchan-stream` 的全部公共骨架；
  本地传输没有端口概念，也无需网络调优，描述符的默认方法（不提供
  默认端口、空调优）恰好覆盖这两个空位。

## 核心契约（What）
- accept 得到的对端通常是匿名地址（未绑定路径的客户端），名称按
  约定回退为裸令牌 `"unix"`；
- 被动打开在绑定前清理遗留的套接字文件，使异常退出后可直接重启。
"#]

use ofchan_core::{Connection, Listener, PassiveProvider, Role, TransportError, TransportProvider};
use ofchan_stream::{AcceptHandler, ConnectProgress, StreamConnection, StreamListener, sock};
use socket2::{SockAddr, Socket};
use tracing::error;

/// `unix` 令牌的主动传输描述符。
///
/// 后缀即目标套接字文件路径；本地传输无默认端口、无套接字调优。
pub struct UnixTransport;

impl TransportProvider for UnixTransport {
    fn token(&self) -> &'static str {
        "unix"
    }

    fn open(&self, name: &str, suffix: &str) -> Result<Box<dyn Connection>, TransportError> {
        let (socket, progress) = match sock::unix_open_active(suffix) {
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
            StreamConnection::new(name.to_string(), socket, progress, Role::Active, |_| Ok(()))?;
        Ok(Box::new(conn))
    }
}

struct UnixAcceptHandler;

impl AcceptHandler for UnixAcceptHandler {
    fn wrap(&self, socket: Socket, peer: SockAddr) -> Result<Box<dyn Connection>, TransportError> {
        // 本地客户端通常未绑定路径，对端地址记录为匿名，回退裸令牌。
        let name = match peer.as_pathname() {
            Some(path) => format!("unix:{}", path.display()),
            None => "unix".to_string(),
        };
        let conn = StreamConnection::new(
            name,
            socket,
            ConnectProgress::Connected,
            Role::Passive,
            |_| Ok(()),
        )?;
        Ok(Box::new(conn))
    }
}

/// `punix` 令牌的被动传输描述符，后缀即绑定路径。
pub struct PunixTransport;

impl PassiveProvider for PunixTransport {
    fn token(&self) -> &'static str {
        "punix"
    }

    fn listen(&self, name: &str, suffix: &str) -> Result<Box<dyn Listener>, TransportError> {
        let socket = match sock::unix_open_passive(suffix) {
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
            UnixAcceptHandler,
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ofchan_core::ConnState;

    fn temp_path(tag: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("ofchan-unix-{tag}-{}.sock", std::process::id()))
    }

    /// 验证本地传输端到端：监听、拨号、accept、对端名称回退裸令牌。
    #[test]
    fn local_round_trip_uses_bare_token_name() {
        let path = temp_path("round-trip");
        let path_text = path.to_str().expect("utf-8 temp path");

        let mut listener = PunixTransport
            .listen(&format!("punix:{path_text}"), path_text)
            .expect("listen");

        let mut dialed = UnixTransport
            .open(&format!("unix:{path_text}"), path_text)
            .expect("dial");

        let accepted = loop {
            match listener.accept() {
                Ok(conn) => break conn,
                Err(err) if err.is_retryable() => std::thread::yield_now(),
                Err(err) => panic!("accept failed: {err}"),
            }
        };

        // 匿名对端回退为裸令牌。
        assert_eq!(accepted.name(), "unix");
        assert_eq!(accepted.state(), ConnState::Connected);

        // 本地拨号通常立即完成；在途时推进到完成。
        loop {
            match dialed.connect() {
                Ok(ConnState::Connected) => break,
                Ok(ConnState::Connecting) => std::thread::yield_now(),
                Ok(other) => panic!("unexpected state {other:?}"),
                Err(err) => panic!("dial failed: {err}"),
            }
        }

        listener.close();
        let _ = std::fs::remove_file(&path);
    }

    /// 验证拨向不存在路径的失败携带完整连接名称。
    #[test]
    fn dial_to_missing_path_fails_with_name() {
        let err = UnixTransport
            .open("unix:/nonexistent/ofchan.sock", "/nonexistent/ofchan.sock")
            .err()
            .expect("dial must fail");
        match err {
            TransportError::OpenFailure { name, .. } => {
                assert_eq!(name, "unix:/nonexistent/ofchan.sock");
            }
            other => panic!("expected OpenFailure, got {other:?}"),
        }
    }

    /// 验证遗留套接字文件不会阻止重新监听。
    #[test]
    fn stale_socket_file_is_cleaned_before_bind() {
        let path = temp_path("stale");
        let path_text = path.to_str().expect("utf-8 temp path");

        let first = PunixTransport
            .listen(&format!("punix:{path_text}"), path_text)
            .expect("first listen");
        first.close();

        // 套接字文件仍然在盘上，重新监听必须成功。
        let second = PunixTransport
            .listen(&format!("punix:{path_text}"), path_text)
            .expect("second listen");
        second.close();
        let _ = std::fs::remove_file(&path);
    }
}
