//! # provider 模块说明
//!
//! ## 角色定位（Why）
//! - 传输描述符：每种传输介质一个不可变实例，捆绑令牌、默认端口与
//!   主动/被动打开入口。注册进 [`TransportRegistry`] 后终生不再变化，
//!   属于装配期构建的分发表，而非运行期可变对象。
//! - 主动与被动角色刻意拆成两个 trait：地址串里它们本就使用不同的
//!   令牌（`tcp` 对 `ptcp`），拆开后注册表无需在描述符上携带角色标记。
//!
//! [`TransportRegistry`]: crate::registry::TransportRegistry

use crate::conn::{Connection, Listener};
use crate::error::TransportError;

/// 主动（拨出）传输描述符。
///
/// # 教案式说明
/// - **契约 (What)**：
///   - `token` 返回地址串前缀（小写裸令牌，如 `"tcp"`），在注册表内
///     必须唯一；
///   - `default_port` 对网络传输返回公认默认端口，供后缀省略端口时
///     替换；路径寻址的传输没有端口概念，返回 `None` 即可（trait
///     默认实现充当“无此能力”的空位）；
///   - `open` 接收完整地址串 `name`（用于诊断与连接命名）与去掉前缀
///     的 `suffix`，成功时返回已完成句柄交接的连接对象；
/// - **错误语义**：底层打开失败返回
///   [`TransportError::OpenFailure`]；打开成功但调优失败时实现方必须
///   先关闭句柄再返回 [`TransportError::TuningFailure`]。
pub trait TransportProvider: Send + Sync {
    /// 地址串前缀令牌。
    fn token(&self) -> &'static str;

    /// 网络传输的公认默认端口。
    fn default_port(&self) -> Option<u16> {
        None
    }

    /// 对 `suffix` 指定的目标发起主动连接。
    fn open(&self, name: &str, suffix: &str) -> Result<Box<dyn Connection>, TransportError>;
}

/// 被动（监听）传输描述符。
///
/// 与 [`TransportProvider`] 对称，`listen` 产出监听句柄；后续的
/// accept 驱动由 [`Listener`] 契约约定。
pub trait PassiveProvider: Send + Sync {
    /// 地址串前缀令牌（如 `"ptcp"`）。
    fn token(&self) -> &'static str;

    /// 在 `suffix` 指定的地址上开始监听。
    fn listen(&self, name: &str, suffix: &str) -> Result<Box<dyn Listener>, TransportError>;
}
