// ============================================================================
// 追踪器 Commands
// 作为展示层与 Store 之间的薄接口层，仅负责：
// 1. 接收展示层参数并做非空校验
// 2. 获取写锁调用 Store 变更，或读取已发布的快照
// 3. 返回结果（错误统一转为 String）
// ⛔ 禁止：包含业务逻辑
// ============================================================================

use std::sync::{Arc, Mutex, RwLock};

use crate::models::dtos::{DashboardStats, ProjectWithStats, TestCaseFilter};
use crate::models::entities::{NewTestCase, Project, TestCase};
use crate::services::store::{Snapshot, Store};
use crate::utils::error::{AppError, AppResult};

// ============================================================================
// 共享状态
// ============================================================================

/// 追踪器共享状态
///
/// 变更通过 `Mutex<Store>` 串行执行；每次变更成功后发布新的快照，
/// 读操作只克隆快照的 Arc，不会被写操作阻塞。
pub struct TrackerState {
    writer: Mutex<Store>,
    published: RwLock<Arc<Snapshot>>,
    recent_limit: usize,
}

impl TrackerState {
    pub fn new(store: Store, recent_limit: usize) -> Self {
        let snapshot = Arc::new(store.snapshot());
        TrackerState {
            writer: Mutex::new(store),
            published: RwLock::new(snapshot),
            recent_limit,
        }
    }

    /// 在写锁内执行变更，成功后发布新快照
    fn mutate<T>(&self, op: impl FnOnce(&mut Store) -> AppResult<T>) -> AppResult<T> {
        let mut store = self.writer.lock().map_err(|_| AppError::LockPoisoned)?;
        let out = op(&mut store)?;
        let snapshot = Arc::new(store.snapshot());
        *self.published.write().map_err(|_| AppError::LockPoisoned)? = snapshot;
        Ok(out)
    }

    /// 获取当前已发布的快照
    pub fn snapshot(&self) -> AppResult<Arc<Snapshot>> {
        let published = self.published.read().map_err(|_| AppError::LockPoisoned)?;
        Ok(Arc::clone(&published))
    }

    /// 关闭：将两个集合写回存储
    pub fn shutdown(&self) -> AppResult<()> {
        let mut store = self.writer.lock().map_err(|_| AppError::LockPoisoned)?;
        store.flush()?;
        log::info!("追踪器已关闭，数据已落盘");
        Ok(())
    }
}

// ============================================================================
// 输入校验
// ============================================================================

/// 收集为空的字段名，全部非空时返回 Ok
fn require_non_blank(fields: &[(&str, &str)]) -> AppResult<()> {
    let missing: Vec<&str> = fields
        .iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(label, _)| *label)
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(AppError::ValidationError(format!(
            "{}不能为空",
            missing.join("、")
        )))
    }
}

/// 校验项目表单：名称与描述均不能为空
pub fn validate_project_input(name: &str, description: &str) -> AppResult<()> {
    require_non_blank(&[("项目名称", name), ("项目描述", description)])
}

/// 校验用例表单：名称、描述、期望输出、实际输出均不能为空
pub fn validate_test_case_input(
    name: &str,
    description: &str,
    expected_output: &str,
    actual_output: &str,
) -> AppResult<()> {
    require_non_blank(&[
        ("用例名称", name),
        ("用例描述", description),
        ("期望输出", expected_output),
        ("实际输出", actual_output),
    ])
}

// ============================================================================
// 项目 Commands
// ============================================================================

/// 创建项目
pub fn add_project(
    state: &TrackerState,
    name: String,
    description: String,
) -> Result<Project, String> {
    validate_project_input(&name, &description)?;
    Ok(state.mutate(|store| store.add_project(&name, &description))?)
}

/// 更新项目
pub fn update_project(state: &TrackerState, project: Project) -> Result<(), String> {
    validate_project_input(&project.name, &project.description)?;
    Ok(state.mutate(|store| store.update_project(project))?)
}

/// 删除项目（级联删除其用例）
///
/// 确认对话框由展示层负责，这里无条件执行。
pub fn delete_project(state: &TrackerState, id: String) -> Result<(), String> {
    Ok(state.mutate(|store| store.delete_project(&id))?)
}

/// 查询单个项目
pub fn get_project(state: &TrackerState, id: String) -> Result<Option<Project>, String> {
    let snapshot = state.snapshot()?;
    Ok(snapshot.get_project_by_id(&id).cloned())
}

/// 查询所有项目及其统计
pub fn list_projects_with_stats(state: &TrackerState) -> Result<Vec<ProjectWithStats>, String> {
    Ok(state.snapshot()?.get_projects_with_stats())
}

// ============================================================================
// 测试用例 Commands
// ============================================================================

/// 创建测试用例
pub fn add_test_case(state: &TrackerState, data: NewTestCase) -> Result<TestCase, String> {
    validate_test_case_input(
        &data.name,
        &data.description,
        &data.expected_output,
        &data.actual_output,
    )?;
    Ok(state.mutate(|store| store.add_test_case(data))?)
}

/// 更新测试用例，返回重新推导状态后的用例
pub fn update_test_case(state: &TrackerState, test_case: TestCase) -> Result<TestCase, String> {
    validate_test_case_input(
        &test_case.name,
        &test_case.description,
        &test_case.expected_output,
        &test_case.actual_output,
    )?;
    Ok(state.mutate(|store| store.update_test_case(test_case))?)
}

/// 删除测试用例
pub fn delete_test_case(state: &TrackerState, id: String) -> Result<(), String> {
    Ok(state.mutate(|store| store.delete_test_case(&id))?)
}

/// 查询单个测试用例
pub fn get_test_case(state: &TrackerState, id: String) -> Result<Option<TestCase>, String> {
    let snapshot = state.snapshot()?;
    Ok(snapshot.get_test_case_by_id(&id).cloned())
}

/// 查询项目下的测试用例，可按关键字与状态筛选
pub fn list_test_cases(
    state: &TrackerState,
    project_id: String,
    filter: Option<TestCaseFilter>,
) -> Result<Vec<TestCase>, String> {
    let snapshot = state.snapshot()?;
    Ok(match filter {
        Some(filter) => snapshot.filter_test_cases(&project_id, &filter),
        None => snapshot.get_test_cases_by_project_id(&project_id),
    })
}

// ============================================================================
// 仪表盘 Commands
// ============================================================================

/// 仪表盘汇总统计
pub fn get_dashboard_stats(state: &TrackerState) -> Result<DashboardStats, String> {
    Ok(state.snapshot()?.dashboard_stats())
}

/// 最近更新的测试用例
pub fn list_recent_test_cases(state: &TrackerState) -> Result<Vec<TestCase>, String> {
    Ok(state.snapshot()?.recent_test_cases(state.recent_limit))
}

// ============================================================================
// 单元测试
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::dtos::StatusFilter;
    use crate::models::entities::TestStatus;
    use crate::services::persistence::MemoryKv;
    use std::thread;

    fn state() -> TrackerState {
        TrackerState::new(Store::open(Box::new(MemoryKv::new())), 5)
    }

    fn draft(project_id: &str, name: &str, expected: &str, actual: &str) -> NewTestCase {
        NewTestCase {
            project_id: project_id.to_string(),
            name: name.to_string(),
            description: "desc".to_string(),
            expected_output: expected.to_string(),
            actual_output: actual.to_string(),
        }
    }

    #[test]
    fn test_add_project_rejects_blank_fields() {
        let state = state();
        let err = add_project(&state, "  ".to_string(), "d".to_string()).unwrap_err();
        assert!(err.contains("项目名称"));

        let err = add_project(&state, "".to_string(), "".to_string()).unwrap_err();
        assert!(err.contains("项目名称"));
        assert!(err.contains("项目描述"));

        assert!(list_projects_with_stats(&state).unwrap().is_empty());
    }

    #[test]
    fn test_add_test_case_rejects_blank_outputs() {
        let state = state();
        let project = add_project(&state, "p".to_string(), "d".to_string()).unwrap();
        let err = add_test_case(&state, draft(&project.id, "t", "5", " ")).unwrap_err();
        assert!(err.contains("实际输出"));
        assert!(list_test_cases(&state, project.id, None)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_mutations_publish_snapshot() {
        let state = state();
        let before = state.snapshot().unwrap();

        let project = add_project(&state, "p".to_string(), "d".to_string()).unwrap();
        add_test_case(&state, draft(&project.id, "t", "5", "5")).unwrap();

        // 旧快照不受影响，新快照可见变更
        assert!(before.projects.is_empty());
        let stats = list_projects_with_stats(&state).unwrap();
        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].passed_tests, 1);
    }

    #[test]
    fn test_update_and_lookup_test_case() {
        let state = state();
        let project = add_project(&state, "p".to_string(), "d".to_string()).unwrap();
        let created = add_test_case(&state, draft(&project.id, "t", "5", "5")).unwrap();

        let mut edited = created.clone();
        edited.actual_output = "6".to_string();
        let updated = update_test_case(&state, edited).unwrap();
        assert_eq!(updated.status(), TestStatus::Fail);

        let fetched = get_test_case(&state, created.id.clone()).unwrap().unwrap();
        assert_eq!(fetched, updated);
    }

    #[test]
    fn test_not_found_is_reported_as_string() {
        let state = state();
        let err = delete_test_case(&state, "missing".to_string()).unwrap_err();
        assert!(err.contains("missing"));
        assert!(get_project(&state, "missing".to_string())
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_delete_project_cascades_through_commands() {
        let state = state();
        let p1 = add_project(&state, "p1".to_string(), "d".to_string()).unwrap();
        let p2 = add_project(&state, "p2".to_string(), "d".to_string()).unwrap();
        add_test_case(&state, draft(&p1.id, "a", "1", "1")).unwrap();
        let kept = add_test_case(&state, draft(&p2.id, "b", "1", "2")).unwrap();

        delete_project(&state, p1.id.clone()).unwrap();

        assert!(list_test_cases(&state, p1.id, None).unwrap().is_empty());
        assert_eq!(list_test_cases(&state, p2.id, None).unwrap(), vec![kept]);
        assert_eq!(get_dashboard_stats(&state).unwrap().total_test_cases, 1);
    }

    #[test]
    fn test_list_test_cases_with_filter() {
        let state = state();
        let project = add_project(&state, "p".to_string(), "d".to_string()).unwrap();
        add_test_case(&state, draft(&project.id, "alpha", "1", "1")).unwrap();
        add_test_case(&state, draft(&project.id, "beta", "1", "2")).unwrap();

        let filter = TestCaseFilter {
            search: String::new(),
            status: StatusFilter::Fail,
        };
        let failed = list_test_cases(&state, project.id, Some(filter)).unwrap();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].name, "beta");
    }

    #[test]
    fn test_recent_respects_configured_limit() {
        let state = TrackerState::new(Store::open(Box::new(MemoryKv::new())), 2);
        let project = add_project(&state, "p".to_string(), "d".to_string()).unwrap();
        for i in 0..4 {
            add_test_case(&state, draft(&project.id, &format!("t{}", i), "1", "1")).unwrap();
        }
        assert_eq!(list_recent_test_cases(&state).unwrap().len(), 2);
    }

    #[test]
    fn test_concurrent_writers_are_serialized() {
        let state = Arc::new(state());
        let project = add_project(&state, "p".to_string(), "d".to_string()).unwrap();

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let state = Arc::clone(&state);
                let project_id = project.id.clone();
                thread::spawn(move || {
                    for j in 0..10 {
                        let name = format!("t{}-{}", i, j);
                        add_test_case(&state, draft(&project_id, &name, "1", "1")).unwrap();
                        // 读取不会阻塞也不会看到半完成的状态
                        let stats = list_projects_with_stats(&state).unwrap();
                        assert_eq!(stats[0].total_tests, stats[0].passed_tests);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let stats = get_dashboard_stats(&state).unwrap();
        assert_eq!(stats.total_test_cases, 80);
        assert_eq!(stats.pass_rate, 100.0);
    }

    #[test]
    fn test_shutdown_flushes() {
        let state = state();
        add_project(&state, "p".to_string(), "d".to_string()).unwrap();
        assert!(state.shutdown().is_ok());
    }
}
