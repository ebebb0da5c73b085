//! # sock 模块说明
//!
//! ## 角色定位（Why）
//! - 建连协议依赖的系统调用级打开例程：主动打开返回
//!   `(句柄, 进度)`，被动打开返回监听句柄。介质 crate 基于它们拼装
//!   各自的描述符实现；
//! - 地址解析（含同步域名解析）也发生在这里，调用是同步且可能阻塞
//!   的，与建连路径的整体并发模型一致。

use std::io;
use std::net::{SocketAddr, ToSocketAddrs};
use std::path::Path;

use socket2::{Domain, Protocol, SockAddr, Socket, Type};

/// 主动打开的结果进度。
///
/// # 教案式说明
/// - **意图 (Why)**：非阻塞 `connect(2)` 用 `EINPROGRESS` 这一带内
///   错误码兼任“尚未完成”的信号。此处把它提升为显式标签，使
///   “已连通 / 在途”成为类型层面可检查的条件，错误通道只留给真正
///   的失败；
/// - **契约 (What)**：`InProgress` 仅出现在主动打开；accept 产出的
///   句柄按定义已完成握手，对应路径恒为 `Connected`。
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ConnectProgress {
    /// 打开返回时连接已建立。
    Connected,
    /// 拨号已发起，完成情况需后续轮询。
    InProgress,
}

/// 判断 `connect(2)` 的错误是否表示“已发起、未完成”。
///
/// Linux 上网络套接字报 `EINPROGRESS`，域套接字在队列满时报
/// `EAGAIN`；两者都不是致命错误。
fn connect_in_progress(err: &io::Error) -> bool {
    err.raw_os_error() == Some(libc::EINPROGRESS) || err.kind() == io::ErrorKind::WouldBlock
}

/// 解析 `host[:port]` 形式的后缀，端口缺省时代入传输默认端口。
///
/// 域名通过系统解析器同步解析，取第一个结果。
fn parse_inet_suffix(suffix: &str, default_port: u16) -> io::Result<SocketAddr> {
    let (host, port) = match suffix.rsplit_once(':') {
        Some((host, port_text)) => match port_text.parse::<u16>() {
            Ok(port) => (host, port),
            Err(_) => (suffix, default_port),
        },
        None => (suffix, default_port),
    };
    (host, port)
        .to_socket_addrs()?
        .next()
        .ok_or_else(|| io::Error::new(io::ErrorKind::AddrNotAvailable, "address resolved to nothing"))
}

/// 主动打开一条 TCP 连接。
///
/// # 教案式说明
/// - **契约 (What)**：成功返回非阻塞句柄与 [`ConnectProgress`]；失败
///   返回 `Err` 时不存在任何句柄（已创建的套接字经 RAII 关闭）；
/// - **逻辑 (How)**：解析地址 → 建非阻塞流套接字 → 发起
///   `connect(2)`；`EINPROGRESS` 类结果落为 `InProgress`，其余非零
///   结果视为致命。
pub fn tcp_open_active(suffix: &str, default_port: u16) -> io::Result<(Socket, ConnectProgress)> {
    let addr = parse_inet_suffix(suffix, default_port)?;
    let socket = Socket::new(Domain::for_address(addr), Type::STREAM, Some(Protocol::TCP))?;
    socket.set_nonblocking(true)?;
    match socket.connect(&SockAddr::from(addr)) {
        Ok(()) => Ok((socket, ConnectProgress::Connected)),
        Err(err) if connect_in_progress(&err) => Ok((socket, ConnectProgress::InProgress)),
        Err(err) => Err(err),
    }
}

/// 被动打开一个 TCP 监听句柄。
///
/// 后缀形式：空（默认端口、任意本地地址）、`port`、`port:bind_ip`。
/// 监听句柄为非阻塞模式，`SO_REUSEADDR` 置位以支持快速重启。
pub fn tcp_open_passive(suffix: &str, default_port: u16) -> io::Result<Socket> {
    let addr = parse_passive_suffix(suffix, default_port)?;
    let socket = Socket::new(Domain::for_address(addr), Type::STREAM, Some(Protocol::TCP))?;
    socket.set_reuse_address(true)?;
    socket.set_nonblocking(true)?;
    socket.bind(&SockAddr::from(addr))?;
    socket.listen(10)?;
    Ok(socket)
}

/// 解析被动后缀 `[port][:bind_ip]`。
fn parse_passive_suffix(suffix: &str, default_port: u16) -> io::Result<SocketAddr> {
    if suffix.is_empty() {
        return Ok(SocketAddr::from(([0, 0, 0, 0], default_port)));
    }
    let (port_text, host) = match suffix.split_once(':') {
        Some((port_text, host)) => (port_text, host),
        None => (suffix, ""),
    };
    let port = if port_text.is_empty() {
        default_port
    } else {
        port_text
            .parse::<u16>()
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "invalid listen port"))?
    };
    if host.is_empty() {
        return Ok(SocketAddr::from(([0, 0, 0, 0], port)));
    }
    (host, port)
        .to_socket_addrs()?
        .next()
        .ok_or_else(|| io::Error::new(io::ErrorKind::AddrNotAvailable, "address resolved to nothing"))
}

/// 主动打开一条本地域套接字连接，后缀即目标路径。
pub fn unix_open_active(path: &str) -> io::Result<(Socket, ConnectProgress)> {
    let socket = Socket::new(Domain::UNIX, Type::STREAM, None)?;
    socket.set_nonblocking(true)?;
    match socket.connect(&SockAddr::unix(path)?) {
        Ok(()) => Ok((socket, ConnectProgress::Connected)),
        Err(err) if connect_in_progress(&err) => Ok((socket, ConnectProgress::InProgress)),
        Err(err) => Err(err),
    }
}

/// 被动打开一个本地域监听句柄，后缀即绑定路径。
///
/// 上次异常退出可能遗留套接字文件，绑定前先清理；清理失败不致命，
/// 真正的问题会在 `bind` 阶段以原始错误浮出。
pub fn unix_open_passive(path: &str) -> io::Result<Socket> {
    if Path::new(path).exists() {
        let _ = std::fs::remove_file(path);
    }
    let socket = Socket::new(Domain::UNIX, Type::STREAM, None)?;
    socket.set_nonblocking(true)?;
    socket.bind(&SockAddr::unix(path)?)?;
    socket.listen(10)?;
    Ok(socket)
}
