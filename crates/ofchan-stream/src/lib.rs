#![doc = r#"
# ofchan-stream

## 设计动机（Why）
- **定位**：所有基于字节流套接字的传输（TCP、本地域套接字）共享同一
  套“裸句柄 → 连接对象”的包装逻辑。本 crate 把这段公共路径收敛到
  [`StreamConnection`] 与 [`StreamListener`]，介质 crate 只需提供打开
  例程与各自的调优/命名策略。
- **架构角色**：处于契约层（`ofchan-core`）与介质实现之间；同时收容
  底层打开例程（[`sock`] 模块），它们是建连协议所依赖的系统调用级
  协作者。

## 核心契约（What）
- **句柄独占**：`socket2::Socket` 自身即“恰好释放一次”的所有权载体。
  句柄在构造时移交给连接对象，此后所有提前返回路径（含构造失败）
  都经由 RAII 释放，不存在泄漏窗口；
- **调优先行**：[`StreamConnection::new`] 先应用介质调优闭包，失败则
  关闭句柄后才浮出 [`TransportError::TuningFailure`]；
- **在途拨号**：主动打开以 [`sock::ConnectProgress`] 显式区分
  “已连通”与“已发起未完成”，后者落成 `Connecting` 状态，由
  `connect` 以 `SO_ERROR` 探测推进。

## 实现策略（How）
- 全部套接字均为非阻塞模式，数据面 `WouldBlock` 以可重试错误上抛，
  由调用方的就绪循环决定何时重来；
- 发送路径带一个滞留缓冲：内核只收下一部分时，剩余字节暂存
  `BytesMut`，下次发送前优先冲刷，保证调用方视角的“整段接受”。
"#]

pub mod conn;
pub mod listener;
pub mod sock;

pub use conn::StreamConnection;
pub use listener::{AcceptHandler, StreamListener};
pub use sock::ConnectProgress;
