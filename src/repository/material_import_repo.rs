// ==========================================
// 考试材料发放追踪系统 - 材料导入 Repository Trait
// ==========================================
// 职责: 定义导入批次的数据访问接口（不包含业务逻辑）
// 红线: 一次导入 = 一个事务；预清理与全部插入同生共死
// ==========================================

use crate::domain::material::NewMaterial;
use crate::domain::types::StageScope;
use crate::repository::error::{RepositoryError, RepositoryResult};

// ==========================================
// ImportSink - 事务内写入句柄
// ==========================================
// 仅在 run_in_transaction 的闭包内可见
pub trait ImportSink {
    /// 删除阶段范围内的全部记录
    ///
    /// # 返回
    /// - Ok(usize): 删除的记录数
    fn delete_by_stage_scope(&mut self, scope: &StageScope) -> RepositoryResult<usize>;

    /// 插入一条新材料记录（received = false）
    ///
    /// # 返回
    /// - Ok(i64): 新记录 id
    fn insert_material(&mut self, material: &NewMaterial) -> RepositoryResult<i64>;
}

// ==========================================
// MaterialImportRepository Trait
// ==========================================
// 用途: 导入批次的事务边界
// 实现者: MaterialImportRepositoryImpl（使用 rusqlite）
pub trait MaterialImportRepository: Send + Sync {
    /// 在单个事务中执行 work
    ///
    /// # 说明
    /// - work 返回 Ok → 提交
    /// - work 返回 Err → 回滚（包括已执行的预清理）
    /// - 并发导入在此处串行化
    fn run_in_transaction<T, E, F>(&self, work: F) -> Result<T, E>
    where
        F: FnOnce(&mut dyn ImportSink) -> Result<T, E>,
        E: From<RepositoryError>;
}
