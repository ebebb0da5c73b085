#![deny(unsafe_code)]
#![doc = r#"
# ofchan

## 设计动机（Why）
- **定位**：协议栈其余部分使用的唯一入口。给定
  `"tcp:192.0.2.1:6633"` 这样的地址串，本 crate 负责切分前缀、在
  注册表中解析传输描述符，并代为调用主动打开或被动监听。
- **架构角色**：注册表通过参数显式注入而非环境全局查找，核心逻辑
  可以在测试中用假描述符隔离验证；[`default_registry`] 提供内建
  传输（`tcp`/`ptcp`/`unix`/`punix`）的标准装配。

## 核心契约（What）
- 前缀未命中注册表时返回
  [`TransportError::UnknownTransport`]，这是配置错误，调用方不应
  重试；
- 打开成功后返回的连接/监听对象与具体介质无关，后续驱动方式见
  `ofchan-core` 的契约。
"#]

use std::sync::Arc;

use ofchan_core::split_target;
use tracing::debug;

pub use ofchan_core::{
    ConnState, Connection, Listener, PassiveProvider, Readiness, RegistryBuilder, Role,
    TransportError, TransportProvider, TransportRegistry, WaitOp,
};
pub use ofchan_tcp::{DEFAULT_PORT, PtcpTransport, TcpTransport};
pub use ofchan_unix::{PunixTransport, UnixTransport};

/// 装配全部内建传输的注册表。
///
/// # 教案式说明
/// - **意图 (Why)**：进程启动期调用一次，此后注册表只读共享；
/// - **契约 (What)**：内建令牌互不冲突，装配不可能失败，故直接
///   返回注册表本体；调用方若需追加自定义传输，应从
///   [`TransportRegistry::builder`] 自行装配。
pub fn default_registry() -> TransportRegistry {
    TransportRegistry::builder()
        .register_active(Arc::new(TcpTransport))
        .and_then(|builder| builder.register_passive(Arc::new(PtcpTransport)))
        .and_then(|builder| builder.register_active(Arc::new(UnixTransport)))
        .and_then(|builder| builder.register_passive(Arc::new(PunixTransport)))
        .map(RegistryBuilder::build)
        .unwrap_or_else(|_| unreachable!("built-in transport tokens are distinct"))
}

/// 按地址串发起主动连接。
///
/// `target` 形如 `"<prefix>:<suffix>"`；前缀选择传输，后缀原样交给
/// 该传输解释。完整地址串同时作为连接的诊断名称。
pub fn open(
    registry: &TransportRegistry,
    target: &str,
) -> Result<Box<dyn Connection>, TransportError> {
    let (prefix, suffix) = split_target(target);
    let provider = registry.resolve_active(prefix)?;
    debug!(target = %target, transport = provider.token(), "opening active connection");
    provider.open(target, suffix)
}

/// 按地址串开始被动监听。
pub fn listen(
    registry: &TransportRegistry,
    target: &str,
) -> Result<Box<dyn Listener>, TransportError> {
    let (prefix, suffix) = split_target(target);
    let provider = registry.resolve_passive(prefix)?;
    debug!(target = %target, transport = provider.token(), "opening passive listener");
    provider.listen(target, suffix)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 验证内建注册表包含全部四个令牌且主动/被动各归其位。
    #[test]
    fn default_registry_has_builtin_tokens() {
        let registry = default_registry();
        assert_eq!(
            registry.active_tokens().collect::<Vec<_>>(),
            vec!["tcp", "unix"]
        );
        assert_eq!(
            registry.passive_tokens().collect::<Vec<_>>(),
            vec!["ptcp", "punix"]
        );
    }

    /// 验证未知前缀以配置错误拒绝，不会触达任何传输。
    #[test]
    fn unknown_prefix_is_rejected_up_front() {
        let registry = default_registry();
        let err = open(&registry, "sctp:192.0.2.1")
            .err()
            .expect("unknown prefix must fail");
        match err {
            TransportError::UnknownTransport { prefix } => assert_eq!(prefix, "sctp"),
            other => panic!("expected UnknownTransport, got {other:?}"),
        }
    }

    /// 验证主动前缀不能用于监听，反之亦然。
    #[test]
    fn role_tokens_are_not_interchangeable() {
        let registry = default_registry();
        assert!(matches!(
            listen(&registry, "tcp:6633"),
            Err(TransportError::UnknownTransport { .. })
        ));
        assert!(matches!(
            open(&registry, "ptcp:6633"),
            Err(TransportError::UnknownTransport { .. })
        ));
    }
}
