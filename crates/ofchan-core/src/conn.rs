//! # conn 模块说明
//!
//! ## 角色定位（Why）
//! - 定义协议栈其余部分唯一接触的两个对象安全 trait：[`Connection`]
//!   与 [`Listener`]，以及它们的状态与轮询语义；
//! - 连接建立阶段的异构细节（非阻塞拨号、accept、调优）全部被具体
//!   传输收敛到这两个 trait 之后，上层代码与介质彻底解耦。

use std::os::fd::BorrowedFd;

use crate::error::TransportError;

/// 连接的发起角色。
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Role {
    /// 主动拨出建立。
    Active,
    /// 监听端 accept 产生。
    Passive,
}

/// 连接对象的就绪状态。
///
/// # 教案式说明
/// - **意图 (Why)**：底层 `connect(2)` 在非阻塞句柄上会以
///   `EINPROGRESS` 表示“已发起、尚未完成”。与其让错误码兼任信号，
///   不如把它提升为一等状态，使测试与调用方都能直接断言；
/// - **契约 (What)**：
///   - `Connecting` 仅源于主动打开时的在途信号，其余任何非零结果都是
///     致命错误，不会构造出连接对象；
///   - 被动 accept 得到的句柄天然已完成握手，状态恒为 `Connected`；
///   - `Failed` 携带导致失败的原始 errno，供日志与观测使用。
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ConnState {
    /// 拨号已发起，完成与否需要后续轮询推进。
    Connecting,
    /// 可以进行数据面收发。
    Connected,
    /// 连接已不可用，携带原始 errno。
    Failed(i32),
}

impl ConnState {
    /// 是否允许数据面收发。
    pub fn is_connected(self) -> bool {
        matches!(self, ConnState::Connected)
    }
}

/// 调用方希望等待的操作类别。
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum WaitOp {
    /// 等待可读（有数据可收）。
    Recv,
    /// 等待可写（发送缓冲有空间）。
    Send,
    /// 等待在途拨号完成。
    Connect,
}

/// 描述符应当以哪个方向注册进轮询器。
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Readiness {
    Readable,
    Writable,
}

impl WaitOp {
    /// 将操作类别映射为轮询方向。
    ///
    /// 在途拨号的完成由内核以“可写”上报，因此 `Connect` 与 `Send`
    /// 同属写方向。
    pub fn readiness(self) -> Readiness {
        match self {
            WaitOp::Recv => Readiness::Readable,
            WaitOp::Send | WaitOp::Connect => Readiness::Writable,
        }
    }
}

/// 传输无关的连接对象。
///
/// # 教案式说明
/// - **意图 (Why)**：无论底层介质如何，协议栈都以同一套
///   名称/状态/收发/等待操作驱动连接，热插拔新传输无需改动调用方；
/// - **契约 (What)**：
///   - `name` 返回带传输前缀的人类可读名称（如 `tcp:192.0.2.1:6634`），
///     该格式被运维与日志依赖，实现方必须逐字保持；
///   - 连接对象独占持有裸句柄；`close` 消费 `Box<Self>`，句柄随之恰好
///     释放一次——重复关闭在类型层面即不可表达；
///   - `state() == Connecting` 时必须先以 [`Connection::connect`] 推进，
///     `recv`/`send` 才会被接受；
/// - **并发 (How)**：单个连接不被并发驱动，本 trait 不要求内部加锁；
///   跨连接的并发由调用方的就绪循环负责。
pub trait Connection: Send {
    /// 带传输前缀的连接名称。
    fn name(&self) -> &str;

    /// 连接由哪一侧发起。
    fn role(&self) -> Role;

    /// 当前就绪状态。
    fn state(&self) -> ConnState;

    /// 推进一次在途拨号。
    ///
    /// 返回 `Ok(Connecting)` 表示仍在途，应继续等待
    /// [`WaitOp::Connect`] 后重试；返回 `Ok(Connected)` 表示握手完成；
    /// 硬错误时状态转入 [`ConnState::Failed`] 并返回 `Err`。
    fn connect(&mut self) -> Result<ConnState, TransportError>;

    /// 接收字节。返回 `Ok(0)` 表示对端有序关闭。
    fn recv(&mut self, buf: &mut [u8]) -> Result<usize, TransportError>;

    /// 发送字节，返回本次接受的字节数。
    fn send(&mut self, buf: &[u8]) -> Result<usize, TransportError>;

    /// 暴露用于多路复用的描述符；关注方向由 [`WaitOp::readiness`] 给出。
    fn wait(&self, op: WaitOp) -> BorrowedFd<'_>;

    /// 关闭连接并释放底层句柄。
    fn close(self: Box<Self>);
}

/// 传输无关的监听句柄。
///
/// # 教案式说明
/// - **意图 (Why)**：被动传输在生命周期内产出零个或多个连接对象；
///   监听句柄与连接对象一样由调用方的就绪循环驱动；
/// - **契约 (What)**：
///   - 单次 accept 失败（含 `WouldBlock`）以
///     [`TransportError::AcceptFailure`] 上抛，监听句柄保持可用，
///     调用方可用 [`TransportError::is_retryable`] 区分瞬态与致命；
///   - `close` 消费对象并释放监听句柄；尚未取走的在队连接由内核随
///     句柄一并回收。
pub trait Listener: Send {
    /// 带传输前缀的监听名称（如 `ptcp:6633`）。
    fn name(&self) -> &str;

    /// 取出一个已完成握手的入站连接。
    fn accept(&mut self) -> Result<Box<dyn Connection>, TransportError>;

    /// 暴露监听句柄的可轮询描述符（就绪方向恒为可读）。
    fn wait(&self) -> BorrowedFd<'_>;

    /// 停止监听并释放底层句柄。
    fn close(self: Box<Self>);
}
