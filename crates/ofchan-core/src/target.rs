//! 地址串的前缀/后缀切分。
//!
//! 外部表示为 `"<prefix>[:<suffix>]"`：前缀选择传输描述符，后缀对
//! 注册表完全不透明（主机端口、路径等均由具体传输解释）。

/// 按第一个 `:` 切分地址串。
///
/// 不含 `:` 的地址串整体视为前缀、后缀为空——形如 `"ptcp"` 的写法
/// 合法，表示使用该传输的全部默认值（如默认端口、任意本地地址）。
pub fn split_target(target: &str) -> (&str, &str) {
    match target.split_once(':') {
        Some((prefix, suffix)) => (prefix, suffix),
        None => (target, ""),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 验证常规地址串只在第一个冒号处切分，后缀保留其余冒号。
    #[test]
    fn splits_on_first_colon_only() {
        assert_eq!(split_target("tcp:192.0.2.1:6633"), ("tcp", "192.0.2.1:6633"));
        assert_eq!(split_target("unix:/var/run/ofchan.sock"), ("unix", "/var/run/ofchan.sock"));
    }

    /// 验证纯前缀地址串得到空后缀。
    #[test]
    fn bare_prefix_yields_empty_suffix() {
        assert_eq!(split_target("ptcp"), ("ptcp", ""));
    }

    /// 验证空串不会 panic，按空前缀处理并交由注册表报未知传输。
    #[test]
    fn empty_target_is_passed_through() {
        assert_eq!(split_target(""), ("", ""));
    }
}
