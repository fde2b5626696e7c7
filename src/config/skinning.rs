use super::{ConfigError, ConfigResult};
use crate::impl_default;
use serde::{Deserialize, Serialize};

/// 蒙皮配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkinningConfig {
    /// 是否启用多线程蒙皮
    pub parallel: bool,

    /// 工作线程数（0表示使用全局线程池）
    pub worker_threads: usize,

    /// 每个任务块的最小顶点数
    pub min_chunk_size: usize,
}

impl_default!(SkinningConfig {
    parallel: true,
    worker_threads: 0, // 自动
    min_chunk_size: 1024,
});

impl SkinningConfig {
    /// 验证配置
    pub fn validate(&self) -> ConfigResult<()> {
        if self.min_chunk_size == 0 {
            return Err(ConfigError::ValidationError(
                "Skinning chunk size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// 获取实际使用的线程数
    pub fn get_num_threads(&self) -> usize {
        if self.worker_threads == 0 {
            num_cpus::get()
        } else {
            self.worker_threads
        }
    }

    /// 计算连续分块大小
    pub fn chunk_size(&self, vertex_count: usize) -> usize {
        let threads = self.get_num_threads().max(1);
        vertex_count.div_ceil(threads).max(self.min_chunk_size)
    }
}
