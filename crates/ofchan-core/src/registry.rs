//! # registry 模块说明
//!
//! ## 角色定位（Why）
//! - 把地址串前缀解析为传输描述符的唯一通道。注册表在进程启动期由
//!   调用方显式装配（依赖注入，而非环境全局表），`build` 之后只读，
//!   因此跨线程共享不需要任何同步原语。
//!
//! ## 设计要求（What）
//! - 查找按令牌精确匹配；
//! - 两个描述符不得共用同一令牌，重复注册在装配期即失败，绝不静默
//!   覆盖；
//! - 未命中返回 [`TransportError::UnknownTransport`]，属配置错误，
//!   调用方不应重试。

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::TransportError;
use crate::provider::{PassiveProvider, TransportProvider};

/// 进程级不可变传输注册表。
///
/// # 教案式说明
/// - **意图 (Why)**：主动与被动令牌各居一张表，使 `tcp` 与 `ptcp`
///   可以由同一介质 crate 注册而互不干扰；
/// - **契约 (What)**：`resolve_*` 的 `Ok` 分支返回描述符引用，其
///   `token()` 恒等于查询前缀；`Err` 分支仅有 `UnknownTransport`；
/// - **并发 (How)**：构建完成后内部映射不再变化，`Arc` 包装描述符
///   即可被任意多个连接器共享。
pub struct TransportRegistry {
    active: BTreeMap<&'static str, Arc<dyn TransportProvider>>,
    passive: BTreeMap<&'static str, Arc<dyn PassiveProvider>>,
}

impl TransportRegistry {
    /// 创建空的装配器。
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder {
            active: BTreeMap::new(),
            passive: BTreeMap::new(),
        }
    }

    /// 解析主动传输前缀。
    pub fn resolve_active(&self, prefix: &str) -> Result<&dyn TransportProvider, TransportError> {
        self.active
            .get(prefix)
            .map(Arc::as_ref)
            .ok_or_else(|| TransportError::UnknownTransport {
                prefix: prefix.to_string(),
            })
    }

    /// 解析被动传输前缀。
    pub fn resolve_passive(&self, prefix: &str) -> Result<&dyn PassiveProvider, TransportError> {
        self.passive
            .get(prefix)
            .map(Arc::as_ref)
            .ok_or_else(|| TransportError::UnknownTransport {
                prefix: prefix.to_string(),
            })
    }

    /// 枚举全部主动令牌（字典序），用于诊断输出。
    pub fn active_tokens(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.active.keys().copied()
    }

    /// 枚举全部被动令牌（字典序）。
    pub fn passive_tokens(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.passive.keys().copied()
    }
}

/// [`TransportRegistry`] 的装配器。
///
/// 注册方法消费并返回装配器自身，失败即整体失败：
///
/// ```ignore
/// let registry = TransportRegistry::builder()
///     .register_active(Arc::new(TcpTransport))?
///     .register_passive(Arc::new(PtcpTransport))?
///     .build();
/// ```
pub struct RegistryBuilder {
    active: BTreeMap<&'static str, Arc<dyn TransportProvider>>,
    passive: BTreeMap<&'static str, Arc<dyn PassiveProvider>>,
}

impl RegistryBuilder {
    /// 注册一个主动传输描述符；令牌冲突返回
    /// [`TransportError::DuplicateToken`]。
    pub fn register_active(
        mut self,
        provider: Arc<dyn TransportProvider>,
    ) -> Result<Self, TransportError> {
        let token = provider.token();
        if self.active.insert(token, provider).is_some() {
            return Err(TransportError::DuplicateToken { token });
        }
        Ok(self)
    }

    /// 注册一个被动传输描述符；令牌冲突返回
    /// [`TransportError::DuplicateToken`]。
    pub fn register_passive(
        mut self,
        provider: Arc<dyn PassiveProvider>,
    ) -> Result<Self, TransportError> {
        let token = provider.token();
        if self.passive.insert(token, provider).is_some() {
            return Err(TransportError::DuplicateToken { token });
        }
        Ok(self)
    }

    /// 固化为只读注册表。
    pub fn build(self) -> TransportRegistry {
        TransportRegistry {
            active: self.active,
            passive: self.passive,
        }
    }
}
