//! 核心宏定义
//!
//! 提供统一的宏来减少配置结构体的样板代码

/// 为结构体实现Default trait的宏
///
/// 使用示例:
/// ```rust
/// use character_deform::impl_default;
///
/// struct ChainLimits {
///     iterations: u32,
///     label: String,
/// }
///
/// impl_default!(ChainLimits {
///     iterations: 1,
///     label: String::new(),
/// });
///
/// assert_eq!(ChainLimits::default().iterations, 1);
/// ```
#[macro_export]
macro_rules! impl_default {
    ($struct_name:ident {
        $($field:ident: $value:expr),* $(,)?
    }) => {
        impl Default for $struct_name {
            fn default() -> Self {
                Self {
                    $($field: $value),*
                }
            }
        }
    };
}
