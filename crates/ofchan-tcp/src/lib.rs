#![doc = r#"
# ofchan-tcp

## 设计动机（Why）
- **定位**：管理通道最常用的传输介质——明文 TCP。主动角色注册为
  `tcp`，被动角色注册为 `ptcp`，两者共享默认控制端口与
  `TCP_NODELAY` 调优策略。
- **架构角色**：建连细节（非阻塞拨号、监听、accept）委托给
  `ofchan-stream` 的公共骨架，本 crate 只贡献介质特有的三件事：
  打开例程的选取、低延迟调优、以及 accept 时对端名称的渲染规则。

## 核心契约（What）
- 控制消息对时延敏感，主动与被动两侧的每个句柄都禁用发送合并
  （Nagle），调优失败的句柄先关闭再报错；
- accept 渲染的对端名称为 `"tcp:<地址>[:<端口>]"`，端口段仅在与
  默认控制端口不同的情况下出现——该格式被运维与日志逐字依赖。
"#]

mod active;
mod passive;

pub use active::TcpTransport;
pub use passive::PtcpTransport;

/// 管理通道的公认默认控制端口。
pub const DEFAULT_PORT: u16 = 6633;
