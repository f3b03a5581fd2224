//! 生成文件写入

use registry_common::{EmitError, EmitResult, ExistingArtifactPolicy};
use serde::Serialize;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// 生成文件的写入结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactStatus {
    /// 已写入新内容
    Written,
    /// 已存在且内容相同，未改动
    Unchanged,
    /// 已存在，按策略跳过
    Skipped,
}

/// 一次写入的结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactOutcome {
    pub path: PathBuf,
    pub status: ArtifactStatus,
}

/// 生成文件写入器
///
/// 生成文件已存在时从不报错：按策略覆盖或跳过。只有写不进去才是错误。
#[derive(Debug, Clone)]
pub struct ArtifactWriter {
    out_dir: PathBuf,
    policy: ExistingArtifactPolicy,
}

impl ArtifactWriter {
    /// 创建写入器
    pub fn new<P: AsRef<Path>>(out_dir: P, policy: ExistingArtifactPolicy) -> Self {
        Self {
            out_dir: out_dir.as_ref().to_path_buf(),
            policy,
        }
    }

    /// 输出目录
    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    /// 写入生成文件
    pub fn write(&self, file_name: &str, content: &str) -> EmitResult<ArtifactOutcome> {
        let path = self.out_dir.join(file_name);

        let status = match fs::read_to_string(&path) {
            Ok(_) if self.policy == ExistingArtifactPolicy::Skip => {
                warn!("生成文件已存在，按配置跳过: {}", path.display());
                ArtifactStatus::Skipped
            }
            Ok(existing) if existing == content => ArtifactStatus::Unchanged,
            Ok(_) => self.write_file(&path, content)?,
            Err(e) if e.kind() == ErrorKind::NotFound => self.write_file(&path, content)?,
            Err(e) => {
                // 读不到旧文件时直接尝试覆盖，写失败才算错误
                warn!("无法读取已有生成文件 {}: {}", path.display(), e);
                self.write_file(&path, content)?
            }
        };

        info!("生成文件 {}: {:?}", path.display(), status);
        Ok(ArtifactOutcome { path, status })
    }

    fn write_file(&self, path: &Path, content: &str) -> EmitResult<ArtifactStatus> {
        let write_failed = |source| EmitError::WriteFailed {
            path: path.to_path_buf(),
            source,
        };
        fs::create_dir_all(&self.out_dir).map_err(write_failed)?;
        fs::write(path, content).map_err(write_failed)?;
        Ok(ArtifactStatus::Written)
    }
}
