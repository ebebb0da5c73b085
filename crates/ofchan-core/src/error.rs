//! # error 模块说明
//!
//! ## 角色定位（Why）
//! - 集中定义传输层对外的错误语义：配置错误、建连失败、套接字调优
//!   失败、单次 accept 失败与数据面 IO 失败各自独立成变体，方便调用
//!   方按类别决定重试或告警策略；
//! - 本层不做任何自动重试，所有错误同步上抛，由上层掌握退避节奏。
//!
//! ## 设计要求（What）
//! - 所有变体实现 `thiserror::Error`，与 `std::error::Error` 生态兼容；
//! - 凡携带底层 `io::Error` 的变体都保留 `#[source]` 链，排障时可以
//!   追溯原始 errno；
//! - 建连类失败必须携带当时尝试的连接名，保证日志可定位到具体目标。

use std::io;

use thiserror::Error;

/// 传输层统一错误域。
///
/// # 教案式说明
/// - **意图 (Why)**：把异构介质（TCP、域套接字等）在建立与收发阶段
///   的失败归一到一个枚举，调用方无需针对具体传输写分支；
/// - **契约 (What)**：
///   - `UnknownTransport` 与 `DuplicateToken` 属于配置错误，出现即说明
///     装配阶段有误，不应重试；
///   - `OpenFailure` 表示底层打开调用失败且没有产生句柄；
///   - `TuningFailure` 表示句柄已产生但调优失败——约定错误浮出时
///     句柄已经被关闭，绝不泄漏；
///   - `AcceptFailure` 只代表一次失败的 accept，监听句柄本身仍可用；
/// - **风险 (Trade-offs)**：`io::Error` 不可克隆，因此枚举整体不派生
///   `Clone`；需要跨线程广播错误时应先转为字符串表示。
#[derive(Debug, Error)]
pub enum TransportError {
    /// 地址串前缀未命中任何已注册的传输令牌。
    #[error("unknown transport prefix `{prefix}`")]
    UnknownTransport { prefix: String },

    /// 同一令牌被注册了两次，装配期即拒绝。
    #[error("transport token `{token}` registered twice")]
    DuplicateToken { token: &'static str },

    /// 底层主动/被动打开调用失败，未产生任何句柄。
    #[error("{name}: open failed: {source}")]
    OpenFailure {
        name: String,
        #[source]
        source: io::Error,
    },

    /// 打开成功后套接字调优失败；错误浮出前句柄已被关闭。
    #[error("{name}: socket tuning failed: {source}")]
    TuningFailure {
        name: String,
        #[source]
        source: io::Error,
    },

    /// 一次 accept 失败；监听句柄保持可用。
    #[error("accept failed: {source}")]
    AcceptFailure {
        #[source]
        source: io::Error,
    },

    /// 连接尚未进入 `Connected` 状态，数据面操作被拒绝。
    #[error("connection is not ready for data transfer")]
    NotReady,

    /// 建立完成之后的数据面 IO 失败。
    #[error("{op} failed: {source}")]
    Io {
        op: &'static str,
        #[source]
        source: io::Error,
    },
}

impl TransportError {
    /// 判断错误是否属于“稍后重试即可”的瞬态条件。
    ///
    /// # 教案式说明
    /// - **意图 (Why)**：非阻塞句柄上的 `WouldBlock` 与被信号打断的
    ///   `Interrupted` 不代表对端或配置有问题，轮询循环应当把它们与
    ///   硬错误区分开；
    /// - **契约 (What)**：仅当底层 `io::Error` 为上述两类时返回
    ///   `true`；配置错误与无底层来源的变体一律返回 `false`。
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.io_source().map(io::Error::kind),
            Some(io::ErrorKind::WouldBlock) | Some(io::ErrorKind::Interrupted)
        )
    }

    /// 取出底层 `io::Error`（若有）。
    pub fn io_source(&self) -> Option<&io::Error> {
        match self {
            TransportError::OpenFailure { source, .. }
            | TransportError::TuningFailure { source, .. }
            | TransportError::AcceptFailure { source }
            | TransportError::Io { source, .. } => Some(source),
            TransportError::UnknownTransport { .. }
            | TransportError::DuplicateToken { .. }
            | TransportError::NotReady => None,
        }
    }
}
