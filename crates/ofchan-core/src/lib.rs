#![deny(unsafe_code)]
#![doc = r#"
# ofchan-core

## 设计动机（Why）
- **定位**：为交换机与控制器之间的管理通道提供可插拔的传输契约层。
  协议栈的其余部分通过统一的连接对象收发字节，无需关心底层是明文
  TCP、本地域套接字还是未来新增的传输介质。
- **架构角色**：本 crate 只定义“语言”——连接与监听的对象安全 trait、
  传输描述符 trait、连接状态机与错误域、以及按前缀解析传输的注册表。
  具体介质实现（`ofchan-tcp`、`ofchan-unix` 等）各自成 crate，向上
  只暴露这里定义的契约。

## 核心契约（What）
- **地址串**：`"<prefix>[:<suffix>]"`，前缀选择传输描述符，后缀由
  具体传输自行解释；主动与被动角色使用互不相同的前缀令牌
  （如 `tcp` 与 `ptcp`）。
- **连接对象**：[`Connection`]，携带人类可读名称、主/被动角色与
  `Connecting | Connected | Failed` 三态；裸句柄由连接对象独占持有，
  `close` 消费对象，确保句柄恰好释放一次。
- **注册表**：[`TransportRegistry`] 在进程启动期一次性装配，之后只读，
  可跨线程共享而无需加锁。

## 实现策略（How）
- 描述符以 trait 对象分发（[`TransportProvider`] / [`PassiveProvider`]），
  trait 默认方法充当“使用通用行为”的空位；
- 建立连接的全部调用均为同步、可能阻塞的操作，唯一显式建模的异步
  状态是“拨号已发起但尚未完成”（[`ConnState::Connecting`]），由
  [`Connection::connect`] 推进；
- 多路复用交由调用方：每个连接通过 [`Connection::wait`] 暴露可轮询的
  描述符与关注方向，本层不规定事件循环形态。
"#]

pub mod conn;
pub mod error;
pub mod provider;
pub mod registry;
pub mod target;

pub use conn::{ConnState, Connection, Listener, Readiness, Role, WaitOp};
pub use error::TransportError;
pub use provider::{PassiveProvider, TransportProvider};
pub use registry::{RegistryBuilder, TransportRegistry};
pub use target::split_target;
