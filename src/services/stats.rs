// ============================================================================
// 派生统计：项目汇总、仪表盘、最近用例、列表筛选
// ✅ 特点：纯函数，每次调用都基于当前集合重新计算，不做缓存
// ============================================================================

use std::cmp::Reverse;

use time::OffsetDateTime;

use crate::models::dtos::{DashboardStats, ProjectWithStats, TestCaseFilter};
use crate::models::entities::{Project, TestCase, TestStatus};
use crate::utils::clock::parse_timestamp;

/// 最近用例视图的默认条数
pub const DEFAULT_RECENT_LIMIT: usize = 5;

/// 按项目 ID 筛选用例，保持集合原有顺序
pub fn test_cases_for_project<'a>(
    test_cases: &'a [TestCase],
    project_id: &'a str,
) -> impl Iterator<Item = &'a TestCase> + 'a {
    test_cases.iter().filter(move |t| t.project_id == project_id)
}

/// 计算单个项目的统计
pub fn project_stats(project: &Project, test_cases: &[TestCase]) -> ProjectWithStats {
    let mut stats = ProjectWithStats {
        project: project.clone(),
        total_tests: 0,
        passed_tests: 0,
        failed_tests: 0,
        pending_tests: 0,
    };

    for test_case in test_cases_for_project(test_cases, &project.id) {
        stats.total_tests += 1;
        match test_case.status() {
            TestStatus::Pass => stats.passed_tests += 1,
            TestStatus::Fail => stats.failed_tests += 1,
            TestStatus::Pending => stats.pending_tests += 1,
        }
    }

    stats
}

/// 计算所有项目的统计，顺序与项目集合一致
///
/// 孤立用例（projectId 指向不存在的项目）不会计入任何项目。
pub fn projects_with_stats(projects: &[Project], test_cases: &[TestCase]) -> Vec<ProjectWithStats> {
    projects
        .iter()
        .map(|project| project_stats(project, test_cases))
        .collect()
}

/// 仪表盘汇总：基于逐项目统计累加
pub fn dashboard_stats(projects: &[Project], test_cases: &[TestCase]) -> DashboardStats {
    let per_project = projects_with_stats(projects, test_cases);

    let total_test_cases: usize = per_project.iter().map(|p| p.total_tests).sum();
    let total_passed: usize = per_project.iter().map(|p| p.passed_tests).sum();
    let total_failed: usize = per_project.iter().map(|p| p.failed_tests).sum();
    let total_pending: usize = per_project.iter().map(|p| p.pending_tests).sum();

    // 没有用例时通过率定义为 0，避免除零
    let pass_rate = if total_test_cases > 0 {
        total_passed as f64 / total_test_cases as f64 * 100.0
    } else {
        0.0
    };

    DashboardStats {
        total_projects: per_project.len(),
        total_test_cases,
        total_passed,
        total_failed,
        total_pending,
        pass_rate,
    }
}

/// 最近更新的用例：按 updatedAt 降序，时间相同保持原顺序，最多 `limit` 条
///
/// 无法解析的时间戳视为最早。
pub fn recent_test_cases(test_cases: &[TestCase], limit: usize) -> Vec<TestCase> {
    let mut sorted: Vec<&TestCase> = test_cases.iter().collect();
    // sort_by_key 是稳定排序
    sorted.sort_by_key(|t| {
        Reverse(parse_timestamp(&t.updated_at).unwrap_or(OffsetDateTime::UNIX_EPOCH))
    });
    sorted.into_iter().take(limit).cloned().collect()
}

/// 按筛选条件过滤某个项目的用例
pub fn filter_test_cases(
    test_cases: &[TestCase],
    project_id: &str,
    filter: &TestCaseFilter,
) -> Vec<TestCase> {
    test_cases_for_project(test_cases, project_id)
        .filter(|t| filter.matches(t))
        .cloned()
        .collect()
}

// ============================================================================
// 单元测试
// ============================================================================
